//! Host drivers for the CHIP-8 core.
//!
//! Implementations of the core's driver traits: a terminal frontend (display
//! sink + key source) and two beepers. The rodio beeper is behind the
//! `audio` feature so headless builds stay free of native audio
//! dependencies.

mod bell_driver;
#[cfg(feature = "audio")]
mod rodio_driver;
mod termion_driver;

pub use bell_driver::BellAudioDriver;
#[cfg(feature = "audio")]
pub use rodio_driver::RodioAudioDriver;
pub use termion_driver::TermionFrontend;
