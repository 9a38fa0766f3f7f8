//! CPU.

use std::fmt;

use super::{
    font::{self, FONT_DATA, FONT_DATA_ADDR},
    math,
    opcodes::OpCode,
    registers::Registers,
    stack::Stack,
    timer::Timer,
    types::{C8Addr, C8Byte},
};
use crate::{
    drivers::Drivers,
    errors::Fault,
    peripherals::{cartridge::Cartridge, memory::PROGRAM_START, Peripherals},
};

/// Maximum sprite height in rows.
const SPRITE_MAX_HEIGHT: usize = 15;

/// CHIP-8 CPU.
///
/// Owns the whole machine state by value: memory, framebuffer and keypad
/// latch (via [`Peripherals`]), registers, stack, timers and the program
/// counter. Every instruction is applied atomically; a fault leaves state
/// consistent up to the failing instruction.
pub struct CPU {
    /// Peripherals.
    pub peripherals: Peripherals,
    /// Drivers.
    pub drivers: Drivers,

    /// Registers.
    pub registers: Registers,
    /// Stack.
    pub stack: Stack,

    /// Delay timer.
    pub delay_timer: Timer,
    /// Sound timer.
    pub sound_timer: Timer,

    /// Program counter.
    pub pc: C8Addr,
}

impl CPU {
    /// Create CHIP-8 CPU.
    ///
    /// Fonts are seeded into low memory and the PC points at the program
    /// start; everything else is zeroed.
    pub fn new() -> Self {
        let mut cpu = CPU {
            peripherals: Peripherals::new(),
            drivers: Drivers::new(),

            registers: Registers::new(),
            stack: Stack::new(),

            delay_timer: Timer::new("delay".to_string()),
            sound_timer: Timer::new("sound".to_string()),

            pc: PROGRAM_START,
        };

        cpu.load_font_in_memory();
        cpu
    }

    /// Load font in memory.
    pub fn load_font_in_memory(&mut self) {
        self.peripherals
            .memory
            .write_data_at_offset(FONT_DATA_ADDR, &FONT_DATA);
    }

    /// Load cartridge data at the program start address.
    pub fn load_cartridge_data(&mut self, cartridge: &Cartridge) {
        self.peripherals
            .memory
            .write_data_at_offset(PROGRAM_START, cartridge.get_data());
    }

    /// Fetch the instruction word at PC.
    pub fn fetch(&self) -> C8Addr {
        self.peripherals.memory.read_word(self.pc)
    }

    /// Advance PC to the next instruction.
    pub fn advance_pc(&mut self) {
        self.pc = self.pc.wrapping_add(2);
    }

    /// Decrement timers.
    pub fn decrement_timers(&mut self) {
        self.delay_timer.decrement();
        self.sound_timer.decrement();
    }

    /// Reset CPU.
    pub fn reset(&mut self) {
        self.peripherals.reset();

        self.registers.reset();
        self.stack.reset();
        self.delay_timer.reset(0);
        self.sound_timer.reset(0);
        self.pc = PROGRAM_START;

        // Memory was zeroed; reseed the fonts.
        self.load_font_in_memory();
    }

    /// Execute instruction.
    ///
    /// Mutates machine state per the opcode contract. PC advances by 2 after
    /// most instructions, by 4 for taken skips; jumps and calls set it
    /// directly, and wait-for-key leaves it in place.
    pub fn execute_instruction(&mut self, opcode: &OpCode) -> Result<(), Fault> {
        let mut advance_pc = true;

        match *opcode {
            OpCode::CLS => {
                // Clear screen and raise the repaint signal.
                self.peripherals.screen.clear_screen();
            }
            OpCode::RET => {
                // Return to the caller; the final advance steps over the
                // CALL instruction itself.
                self.pc = self.stack.pop()?;
            }
            OpCode::JP(addr) => {
                self.pc = addr;
                advance_pc = false;
            }
            OpCode::CALL(addr) => {
                // Store the CALL's own address; RET advances past it.
                self.stack.push(self.pc)?;
                self.pc = addr;
                advance_pc = false;
            }
            OpCode::SEByte(reg, byte) => {
                if self.registers.get_register(reg) == byte {
                    self.advance_pc();
                }
            }
            OpCode::SNEByte(reg, byte) => {
                if self.registers.get_register(reg) != byte {
                    self.advance_pc();
                }
            }
            OpCode::SE(reg1, reg2) => {
                let r1 = self.registers.get_register(reg1);
                let r2 = self.registers.get_register(reg2);

                if r1 == r2 {
                    self.advance_pc();
                }
            }
            OpCode::LDByte(reg, byte) => {
                self.registers.set_register(reg, byte);
            }
            OpCode::ADDByte(reg, byte) => {
                // Wrapping add; VF is untouched.
                let r = self.registers.get_register(reg);
                self.registers.set_register(reg, r.wrapping_add(byte));
            }
            OpCode::LD(reg1, reg2) => {
                let r2 = self.registers.get_register(reg2);
                self.registers.set_register(reg1, r2);
            }
            OpCode::OR(reg1, reg2) => {
                let r1 = self.registers.get_register(reg1);
                let r2 = self.registers.get_register(reg2);

                self.registers.set_register(reg1, r1 | r2);
            }
            OpCode::AND(reg1, reg2) => {
                let r1 = self.registers.get_register(reg1);
                let r2 = self.registers.get_register(reg2);

                self.registers.set_register(reg1, r1 & r2);
            }
            OpCode::XOR(reg1, reg2) => {
                let r1 = self.registers.get_register(reg1);
                let r2 = self.registers.get_register(reg2);

                self.registers.set_register(reg1, r1 ^ r2);
            }
            OpCode::ADD(reg1, reg2) => {
                let r1 = self.registers.get_register(reg1);
                let r2 = self.registers.get_register(reg2);
                let (res, overflow) = r1.overflowing_add(r2);

                self.registers.set_carry_register(overflow as C8Byte);
                self.registers.set_register(reg1, res);
            }
            OpCode::SUB(reg1, reg2) => {
                // VF = NOT borrow, i.e. 1 when Vx >= Vy. The wrapped
                // difference is stored either way.
                let r1 = self.registers.get_register(reg1);
                let r2 = self.registers.get_register(reg2);

                self.registers.set_carry_register((r1 >= r2) as C8Byte);
                self.registers.set_register(reg1, r1.wrapping_sub(r2));
            }
            OpCode::SHR(reg) => {
                // Vx is the shift source; the shifted-out bit lands in VF.
                let r = self.registers.get_register(reg);

                self.registers.set_carry_register(r & 1);
                self.registers.set_register(reg, r >> 1);
            }
            OpCode::SUBN(reg1, reg2) => {
                // VF = NOT borrow, i.e. 1 when Vy >= Vx.
                let r1 = self.registers.get_register(reg1);
                let r2 = self.registers.get_register(reg2);

                self.registers.set_carry_register((r2 >= r1) as C8Byte);
                self.registers.set_register(reg1, r2.wrapping_sub(r1));
            }
            OpCode::SHL(reg) => {
                let r = self.registers.get_register(reg);

                self.registers.set_carry_register((r >> 7) & 1);
                self.registers.set_register(reg, r << 1);
            }
            OpCode::SNE(reg1, reg2) => {
                let r1 = self.registers.get_register(reg1);
                let r2 = self.registers.get_register(reg2);

                if r1 != r2 {
                    self.advance_pc();
                }
            }
            OpCode::LDI(addr) => {
                self.registers.set_i_register(addr);
            }
            OpCode::JP0(addr) => {
                let v0 = self.registers.get_register(0);

                self.pc = math::modulo(addr + C8Addr::from(v0), 0x1000);
                advance_pc = false;
            }
            OpCode::RND(reg, byte) => {
                let value = self.drivers.random.random_byte() & byte;
                self.registers.set_register(reg, value);
            }
            OpCode::DRW(reg1, reg2, byte) => {
                // Sprite rows are read through the 12-bit address mask, so a
                // sprite stored near the top of memory wraps instead of
                // faulting.
                let x = self.registers.get_register(reg1);
                let y = self.registers.get_register(reg2);
                let ri = self.registers.get_i_register();
                let rows = usize::from(byte);

                let mut sprite = [0; SPRITE_MAX_HEIGHT];
                for (idx, row) in sprite.iter_mut().enumerate().take(rows) {
                    *row = self.peripherals.memory.read_byte(ri.wrapping_add(idx as C8Addr));
                }

                let collision = self.peripherals.screen.draw_sprite(x, y, &sprite[..rows]);
                self.registers.set_carry_register(collision as C8Byte);
            }
            OpCode::SKP(reg) => {
                let key = self.registers.get_register(reg) & 0x0F;

                if self.peripherals.input.get(key) == 1 {
                    self.advance_pc();
                }
            }
            OpCode::SKNP(reg) => {
                let key = self.registers.get_register(reg) & 0x0F;

                if self.peripherals.input.get(key) == 0 {
                    self.advance_pc();
                }
            }
            OpCode::LDGetDelayTimer(reg) => {
                let dt = self.delay_timer.get_value();
                self.registers.set_register(reg, dt);
            }
            OpCode::LDGetKey(reg) => {
                // Enter the wait state. PC stays on this instruction until a
                // fresh press arrives; the tick driver completes the wait.
                self.peripherals.input.wait_for_input(reg);
                advance_pc = false;
            }
            OpCode::LDSetDelayTimer(reg) => {
                let r = self.registers.get_register(reg);
                self.delay_timer.reset(r);
            }
            OpCode::LDSetSoundTimer(reg) => {
                let r = self.registers.get_register(reg);
                self.sound_timer.reset(r);
            }
            OpCode::ADDI(reg) => {
                let i = self.registers.get_i_register();
                let r = self.registers.get_register(reg);

                self.registers.set_i_register(i.wrapping_add(C8Addr::from(r)));
            }
            OpCode::LDSprite(reg) => {
                let r = self.registers.get_register(reg);
                self.registers.set_i_register(font::glyph_addr(r));
            }
            OpCode::LDBCD(reg) => {
                let i = self.registers.get_i_register();
                if usize::from(i) + 2 > 0xFFF {
                    return Err(Fault::MemoryOutOfRange(i));
                }

                let r = self.registers.get_register(reg);
                self.peripherals.memory.write_byte(i, r / 100);
                self.peripherals.memory.write_byte(i + 1, (r / 10) % 10);
                self.peripherals.memory.write_byte(i + 2, r % 10);
            }
            OpCode::LDS(reg) => {
                let i = self.registers.get_i_register();
                if usize::from(i) + usize::from(reg) > 0xFFF {
                    return Err(Fault::MemoryOutOfRange(i));
                }

                for ridx in 0..=reg {
                    let r = self.registers.get_register(ridx);
                    self.peripherals.memory.write_byte(i + C8Addr::from(ridx), r);
                }
            }
            OpCode::LDR(reg) => {
                let i = self.registers.get_i_register();
                if usize::from(i) + usize::from(reg) > 0xFFF {
                    return Err(Fault::MemoryOutOfRange(i));
                }

                for ridx in 0..=reg {
                    let byte = self.peripherals.memory.read_byte(i + C8Addr::from(ridx));
                    self.registers.set_register(ridx, byte);
                }
            }
        };

        if advance_pc {
            self.advance_pc();
        }

        Ok(())
    }
}

impl Default for CPU {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CPU {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "CPU {{")?;

        writeln!(f, "  memory: {{")?;
        write!(f, "{:?}", self.peripherals.memory)?;
        writeln!(f, "  }},")?;

        writeln!(f, "  screen: {{")?;
        write!(f, "{:?}", self.peripherals.screen)?;
        writeln!(f, "  }},")?;

        writeln!(f, "  registers: {{")?;
        write!(f, "{:?}", self.registers)?;
        writeln!(f, "  }},")?;

        writeln!(f, "  stack: {{")?;
        write!(f, "{:?}", self.stack)?;
        writeln!(f, "  }},")?;

        writeln!(f, "  input: {{")?;
        write!(f, "{:?}", self.peripherals.input)?;
        writeln!(f, "  }},")?;

        writeln!(f, "  pc: {:04X},", self.pc)?;
        writeln!(f, "  delay_timer: {:?},", self.delay_timer)?;
        writeln!(f, "  sound_timer: {:?}", self.sound_timer)?;

        writeln!(f, "}}")
    }
}
