//! Rodio beeper.

use rodio::source::{SineWave, Source};
use rodio::{OutputStream, Sink};

use ocho_core::drivers::AudioInterface;
use ocho_core::errors::CResult;

// F4 pure tone.
const BEEP_FREQUENCY: f32 = 349.23;

/// Beeper playing a sine tone on the default audio output device.
pub struct RodioAudioDriver {
    // Keeps the output stream alive for the sink's lifetime.
    _stream: OutputStream,
    sink: Sink,
}

impl RodioAudioDriver {
    /// Open the default output device and queue a paused beep tone.
    pub fn new() -> CResult<Self> {
        let (stream, handle) = OutputStream::try_default()?;
        let sink = Sink::try_new(&handle)?;

        sink.append(SineWave::new(BEEP_FREQUENCY).amplify(0.10));
        sink.pause();

        Ok(RodioAudioDriver {
            _stream: stream,
            sink,
        })
    }
}

impl AudioInterface for RodioAudioDriver {
    fn beep(&mut self, sound_on: bool) {
        if sound_on {
            self.sink.play();
        } else {
            self.sink.pause();
        }
    }
}
