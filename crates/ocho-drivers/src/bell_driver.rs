//! Terminal bell beeper.

use std::io::{stdout, Write};

use ocho_core::drivers::AudioInterface;

/// Beeper ringing the terminal bell (BEL).
///
/// Rings only on the rising edge of the sound line; the terminal decides what
/// a "beep" sounds like.
#[derive(Default)]
pub struct BellAudioDriver {
    was_on: bool,
}

impl BellAudioDriver {
    /// Create new bell driver.
    pub fn new() -> Self {
        Self::default()
    }
}

impl AudioInterface for BellAudioDriver {
    fn beep(&mut self, sound_on: bool) {
        if sound_on && !self.was_on {
            print!("\x07");
            stdout().flush().ok();
        }

        self.was_on = sound_on;
    }
}
