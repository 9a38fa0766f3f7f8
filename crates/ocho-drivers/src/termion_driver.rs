//! Termion frontend.
//!
//! Renders the framebuffer as ANSI block characters on an alternate screen
//! and reads the keypad from raw-mode stdin. Terminals report no key-release
//! edges, so a press is considered held for a fixed window and released when
//! it stops repeating.

use std::collections::HashMap;
use std::fmt::Write as _;
use std::io::{stdout, Read, Stdout, Write};
use std::thread;
use std::time::{Duration, Instant};

use once_cell::sync::Lazy;
use termion::raw::{IntoRawMode, RawTerminal};
use termion::screen::{AlternateScreen, IntoAlternateScreen};

use ocho_core::core::types::C8Byte;
use ocho_core::drivers::{DisplayInterface, FrontendInterface, InputInterface, InputPoll};
use ocho_core::emulator::{Emulator, EmulatorContext, TIMER_FREQUENCY};
use ocho_core::errors::CResult;
use ocho_core::peripherals::input::KeyEventQueue;
use ocho_core::peripherals::screen::{VIDEO_MEMORY_HEIGHT, VIDEO_MEMORY_WIDTH};

/// How long a press stays held without the terminal repeating it.
const KEY_HOLD: Duration = Duration::from_millis(100);

//    Keyboard                   CHIP-8
//    +---+---+---+---+          +---+---+---+---+
//    | 1 | 2 | 3 | 4 |          | 1 | 2 | 3 | C |
//    +---+---+---+---+          +---+---+---+---+
//    | Q | W | E | R |          | 4 | 5 | 6 | D |
//    +---+---+---+---+    =>    +---+---+---+---+
//    | A | S | D | F |          | 7 | 8 | 9 | E |
//    +---+---+---+---+          +---+---+---+---+
//    | Z | X | C | V |          | A | 0 | B | F |
//    +---+---+---+---+          +---+---+---+---+
static KEY_MAP: Lazy<HashMap<u8, C8Byte>> = Lazy::new(|| {
    let mut m = HashMap::new();
    m.insert(b'1', 0x1);
    m.insert(b'2', 0x2);
    m.insert(b'3', 0x3);
    m.insert(b'4', 0xC);
    m.insert(b'q', 0x4);
    m.insert(b'w', 0x5);
    m.insert(b'e', 0x6);
    m.insert(b'r', 0xD);
    m.insert(b'a', 0x7);
    m.insert(b's', 0x8);
    m.insert(b'd', 0x9);
    m.insert(b'f', 0xE);
    m.insert(b'z', 0xA);
    m.insert(b'x', 0x0);
    m.insert(b'c', 0xB);
    m.insert(b'v', 0xF);

    m
});

/// Display sink writing ANSI blocks to the alternate screen.
struct TermionDisplay {
    screen: AlternateScreen<RawTerminal<Stdout>>,
    term_size: (u16, u16),
    // Reused between frames so its allocation stays warm.
    framebuf: String,
}

impl TermionDisplay {
    fn new() -> CResult<Self> {
        let mut screen = stdout().into_raw_mode()?.into_alternate_screen()?;
        write!(screen, "{}{}", termion::clear::All, termion::cursor::Hide)?;
        screen.flush()?;

        Ok(TermionDisplay {
            screen,
            term_size: termion::terminal_size()?,
            framebuf: String::new(),
        })
    }
}

impl DisplayInterface for TermionDisplay {
    fn present(&mut self, pixels: &[C8Byte]) {
        // Recenter and clear when the terminal was resized.
        if let Ok(term_size) = termion::terminal_size() {
            if self.term_size != term_size {
                self.term_size = term_size;
                write!(self.screen, "{}", termion::clear::All).ok();
            }
        }

        let x_offset = self.term_size.0.saturating_sub(VIDEO_MEMORY_WIDTH as u16) / 2;
        let y_offset = self.term_size.1.saturating_sub(VIDEO_MEMORY_HEIGHT as u16) / 2;

        self.framebuf.clear();
        for (idx, px) in pixels.iter().enumerate() {
            if idx % VIDEO_MEMORY_WIDTH == 0 {
                let row = (idx / VIDEO_MEMORY_WIDTH) as u16;
                write!(
                    self.framebuf,
                    "{}",
                    termion::cursor::Goto(x_offset + 1, y_offset + row + 1)
                )
                .ok();
            }

            if *px == 1 {
                write!(self.framebuf, "{}█", termion::color::Fg(termion::color::White)).ok();
            } else {
                write!(self.framebuf, "{}█", termion::color::Fg(termion::color::Black)).ok();
            }
        }

        write!(self.screen, "{}", self.framebuf).ok();
        self.screen.flush().ok();
    }
}

impl Drop for TermionDisplay {
    fn drop(&mut self) {
        write!(self.screen, "{}", termion::cursor::Show).ok();
        self.screen.flush().ok();
    }
}

/// Key source reading raw-mode stdin.
struct TermionInput {
    stdin: termion::AsyncReader,
    held: [Option<Instant>; 16],
}

impl TermionInput {
    fn new() -> Self {
        TermionInput {
            stdin: termion::async_stdin(),
            held: [None; 16],
        }
    }
}

impl InputInterface for TermionInput {
    fn poll_input(&mut self, queue: &KeyEventQueue) -> CResult<InputPoll> {
        let mut inputs = Vec::new();
        self.stdin.read_to_end(&mut inputs)?;
        inputs.dedup();

        for byte in inputs {
            match byte {
                // Esc (0x1B) and ^C (0x03) quit; raw mode swallows the
                // usual signals.
                0x03 | 0x1B => return Ok(InputPoll::Quit),
                b => {
                    if let Some(&key) = KEY_MAP.get(&b.to_ascii_lowercase()) {
                        if self.held[usize::from(key)].is_none() {
                            queue.press(key);
                        }
                        self.held[usize::from(key)] = Some(Instant::now());
                    }
                }
            }
        }

        // Emit release edges for keys the terminal stopped repeating.
        for (key, slot) in self.held.iter_mut().enumerate() {
            if let Some(last_seen) = *slot {
                if last_seen.elapsed() >= KEY_HOLD {
                    queue.release(key as C8Byte);
                    *slot = None;
                }
            }
        }

        Ok(InputPoll::Continue)
    }
}

/// Terminal frontend: owns the 60 Hz loop.
#[derive(Default)]
pub struct TermionFrontend;

impl TermionFrontend {
    /// Create new frontend.
    pub fn new() -> Self {
        Self::default()
    }
}

impl FrontendInterface for TermionFrontend {
    fn run_emulator(&mut self, mut emulator: Emulator, mut ctx: EmulatorContext) -> CResult {
        let queue = emulator.cpu.peripherals.input.queue_handle();
        let mut input = TermionInput::new();
        emulator
            .cpu
            .drivers
            .set_display_driver(Box::new(TermionDisplay::new()?));

        let frame_duration = Duration::from_micros(1_000_000 / u64::from(TIMER_FREQUENCY));

        loop {
            let frame_start = Instant::now();

            if input.poll_input(&queue)? == InputPoll::Quit {
                break;
            }

            emulator.frame(&mut ctx)?;

            if let Some(remaining) = frame_duration.checked_sub(frame_start.elapsed()) {
                thread::sleep(remaining);
            }
        }

        Ok(())
    }
}
