//! Drivers.
//!
//! The VM core names its external collaborators by capability only: a display
//! sink, a beeper, a key source, and a random byte generator. Hosts implement
//! these traits; the core never links against windowing, terminal, or audio
//! code.

use crate::core::types::C8Byte;
use crate::emulator::{Emulator, EmulatorContext};
use crate::errors::CResult;
use crate::peripherals::input::KeyEventQueue;

/// Display sink.
pub trait DisplayInterface {
    /// Present one frame.
    ///
    /// `pixels` is the 64x32 framebuffer, row-major, one byte per pixel
    /// (0 or 1). Called at most once per tick, only when the framebuffer was
    /// mutated since the last call.
    fn present(&mut self, pixels: &[C8Byte]);
}

/// Beeper.
pub trait AudioInterface {
    /// Told once per tick whether the sound timer is nonzero.
    fn beep(&mut self, sound_on: bool);
}

/// Uniform random byte generator, used by the RND opcode.
///
/// Parameterized so tests can inject a deterministic sequence.
pub trait RandomInterface {
    /// Produce the next byte.
    fn random_byte(&mut self) -> C8Byte;
}

/// Key source poll outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputPoll {
    /// Keep running.
    Continue,
    /// The user asked to quit.
    Quit,
}

/// Key source.
///
/// Maps host keys to CHIP-8 keys 0..F and publishes press/release edges into
/// the machine's event queue.
pub trait InputInterface {
    /// Poll the host input device once, publishing any edges to `queue`.
    fn poll_input(&mut self, queue: &KeyEventQueue) -> CResult<InputPoll>;
}

/// Frontend interface.
///
/// A frontend owns the 60 Hz loop: it polls its key source, drives
/// [`Emulator::frame`], and paces wall-clock time.
pub trait FrontendInterface {
    /// Run the emulator until the user quits or the machine faults.
    fn run_emulator(&mut self, emulator: Emulator, ctx: EmulatorContext) -> CResult;
}

/// Default random driver, backed by quad-rand.
#[derive(Default)]
pub struct QuadRandDriver;

impl RandomInterface for QuadRandDriver {
    fn random_byte(&mut self) -> C8Byte {
        (quad_rand::rand() % 0x100) as C8Byte
    }
}

/// Driver set attached to the machine.
pub struct Drivers {
    /// Display sink, if any.
    pub display: Option<Box<dyn DisplayInterface>>,
    /// Beeper, if any.
    pub audio: Option<Box<dyn AudioInterface>>,
    /// Random byte generator.
    pub random: Box<dyn RandomInterface>,
}

impl Drivers {
    /// Create the default driver set: no display, no beeper, quad-rand RNG.
    pub fn new() -> Self {
        Drivers {
            display: None,
            audio: None,
            random: Box::new(QuadRandDriver),
        }
    }

    /// Set display driver.
    pub fn set_display_driver(&mut self, driver: Box<dyn DisplayInterface>) {
        self.display = Some(driver);
    }

    /// Set audio driver.
    pub fn set_audio_driver(&mut self, driver: Box<dyn AudioInterface>) {
        self.audio = Some(driver);
    }

    /// Set random driver.
    pub fn set_random_driver(&mut self, driver: Box<dyn RandomInterface>) {
        self.random = driver;
    }
}

impl Default for Drivers {
    fn default() -> Self {
        Self::new()
    }
}
