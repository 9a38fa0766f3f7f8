//! CHIP-8 core.
//!
//! The bytecode interpreter: memory, registers, stack, timers, framebuffer,
//! keypad latch, and the fetch/decode/execute engine for the standard
//! instruction set. Hosts plug in a display sink, a beeper and a key source
//! through the driver traits and drive the machine at 60 Hz.

#![warn(missing_docs)]

pub mod core;
pub mod drivers;
pub mod emulator;
pub mod errors;
pub mod peripherals;
