//! CHIP-8 emulator.

use std::{
    fs::{File, OpenOptions},
    io::Write,
};

use super::{
    core::{cpu::CPU, opcodes},
    errors::{CResult, Fault},
    peripherals::cartridge::Cartridge,
    trace_exec,
};

/// Timer frequency, in Hz. Timers decrement once per frame regardless of how
/// many instructions a frame executes.
pub const TIMER_FREQUENCY: u32 = 60;
/// Default instructions per 60 Hz frame.
pub const DEFAULT_CYCLES_PER_FRAME: u32 = 8;

/// CHIP-8 emulator.
#[derive(Default)]
pub struct Emulator {
    /// CPU handle.
    pub cpu: CPU,
}

/// Emulation state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmulationState {
    /// Normal.
    Normal,
    /// Wait for input.
    WaitForInput,
}

/// Reaction to an unknown opcode, chosen by the embedder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IllegalOpcodePolicy {
    /// Surface the fault and halt.
    Halt,
    /// Log a warning and step over the word.
    Skip,
}

/// Tracefile handle.
#[derive(Debug)]
pub enum TracefileHandle {
    /// File.
    File(File),
    /// Stdout.
    Stdout,
}

/// Emulator context.
///
/// Embedder-owned configuration for the tick driver.
pub struct EmulatorContext {
    tracefile_handle: Option<TracefileHandle>,

    /// Instructions executed per frame.
    pub cycles_per_frame: u32,
    /// Unknown opcode policy.
    pub illegal_opcode_policy: IllegalOpcodePolicy,
}

impl Default for EmulatorContext {
    fn default() -> Self {
        Self {
            tracefile_handle: None,
            cycles_per_frame: DEFAULT_CYCLES_PER_FRAME,
            illegal_opcode_policy: IllegalOpcodePolicy::Halt,
        }
    }
}

impl EmulatorContext {
    /// Create new emulator context.
    pub fn new() -> Self {
        Default::default()
    }

    /// Attach an execution tracefile (`-` for stdout).
    pub fn prepare_tracefile(&mut self, tracefile: &Option<String>) -> CResult {
        self.tracefile_handle = match tracefile {
            Some(path) if path == "-" => Some(TracefileHandle::Stdout),
            Some(path) => Some(TracefileHandle::File(
                OpenOptions::new().write(true).create(true).truncate(true).open(path)?,
            )),
            None => None,
        };

        Ok(())
    }
}

impl Emulator {
    /// Create new CHIP-8 emulator.
    pub fn new() -> Self {
        Default::default()
    }

    /// Load game.
    pub fn load_game(&mut self, cartridge: &Cartridge) {
        self.cpu.load_cartridge_data(cartridge);
    }

    /// Reset the machine and reload the cartridge.
    pub fn reset(&mut self, cartridge: &Cartridge) {
        self.cpu.reset();
        self.cpu.load_cartridge_data(cartridge);

        tracing::info!("machine reset, cartridge {:?} reloaded", cartridge.get_title());
    }

    /// Execute one instruction.
    ///
    /// Services a pending wait-for-key first: a captured press deposits the
    /// key and advances PC, otherwise the machine yields without fetching.
    /// Timers are not touched here; they belong to [`Emulator::frame`].
    pub fn step(&mut self, ctx: &mut EmulatorContext) -> Result<EmulationState, Fault> {
        if self.cpu.peripherals.input.is_locked() {
            match self.cpu.peripherals.input.complete_wait() {
                Some((register, key)) => {
                    self.cpu.registers.set_register(register, key);
                    self.cpu.advance_pc();
                }
                None => return Ok(EmulationState::WaitForInput),
            }
        }

        let pc = self.cpu.pc;
        let word = self.cpu.fetch();

        match opcodes::decode(word) {
            Some(opcode) => {
                if ctx.tracefile_handle.is_some() {
                    let (assembly, verbose) = opcodes::get_opcode_str(&opcode);
                    trace_exec!(
                        ctx.tracefile_handle,
                        "{:04X}| ({:04X})  {:<24} ; {}",
                        pc,
                        word,
                        assembly,
                        verbose
                    );
                }

                self.cpu.execute_instruction(&opcode)?;
            }
            None => match ctx.illegal_opcode_policy {
                IllegalOpcodePolicy::Halt => {
                    return Err(Fault::IllegalInstruction(word, pc));
                }
                IllegalOpcodePolicy::Skip => {
                    tracing::warn!("skipping illegal instruction {:04X} at {:04X}", word, pc);
                    self.cpu.advance_pc();
                }
            },
        }

        Ok(EmulationState::Normal)
    }

    /// Run one 60 Hz tick.
    ///
    /// In order: drain queued key events, execute up to `cycles_per_frame`
    /// instructions (stopping early on wait-for-key), decrement both timers
    /// once, hand the framebuffer to the display sink when it was mutated,
    /// and tell the beeper whether the sound timer is live.
    pub fn frame(&mut self, ctx: &mut EmulatorContext) -> Result<EmulationState, Fault> {
        self.cpu.peripherals.input.drain_events();

        let mut state = EmulationState::Normal;
        for _ in 0..ctx.cycles_per_frame {
            state = self.step(ctx)?;

            if state == EmulationState::WaitForInput {
                break;
            }
        }

        self.cpu.decrement_timers();

        if self.cpu.peripherals.screen.is_dirty() {
            if let Some(display) = self.cpu.drivers.display.as_deref_mut() {
                display.present(self.cpu.peripherals.screen.get_data());
                self.cpu.peripherals.screen.clear_dirty();
            }
        }

        if let Some(audio) = self.cpu.drivers.audio.as_deref_mut() {
            audio.beep(self.cpu.sound_timer.get_value() > 0);
        }

        Ok(state)
    }
}
