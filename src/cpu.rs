use std::convert::TryFrom;
use std::time::Duration;

use rand::random;
use thiserror::Error;
use tracing::warn;

use crate::font::{FONT, FONT_LEN, GLYPH_LEN};
use crate::instruction::Instruction;
use crate::screen::Screen;

mod call_stack;
mod key;
mod reg;
mod runner;

pub use call_stack::CallStack;
pub use key::{Key, KeyState};
pub use reg::Reg;
pub use runner::{ControlEvent, CpuEvent};

/// A structural violation while executing an instruction.
///
/// All of these are fatal for the running program: `step` returns the error
/// without corrupting unrelated state, and the run loop stops.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CpuError {
    #[error("an out of bounds memory access was requested at {program_counter:X}")]
    OutOfBoundsMemoryAccess { program_counter: u16 },
    #[error(
        "the call at {program_counter:X} would exceed the {} slot call stack",
        CallStack::CAPACITY
    )]
    CallStackOverflow { program_counter: u16 },
    #[error("return was requested at {program_counter:X} with an empty call stack")]
    CallStackUnderflow { program_counter: u16 },
    #[error("a key with an invalid (greater than 0xF) id {key_id:X} was referenced at {program_counter:X}")]
    InvalidKey { program_counter: u16, key_id: u8 },
    #[error("the glyph address of a non hex digit value {value:X} was requested at {program_counter:X}")]
    InvalidGlyph { program_counter: u16, value: u8 },
}

#[derive(Debug, PartialEq, Eq, Error)]
pub enum LoadError {
    #[error(
        "program length {program_len} exceeds the {} bytes of memory after the reserved region",
        Cpu::MAX_PROGRAM_LEN
    )]
    ProgramTooLarge { program_len: usize },
}

/// The complete CHIP-8 machine state.
///
/// There is no hidden mode: the only transitions are [`Cpu::step`] (one
/// fetch/decode/execute cycle) and [`Cpu::tick_timers`] (one 60 Hz tick),
/// and both are memoryless given the current state. A new program means a
/// new `Cpu` built via [`Cpu::builder`]; a live machine is never reloaded
/// in place.
#[derive(Debug, PartialEq, Eq)]
pub struct Cpu {
    regs: [u8; 16],
    index: u16,
    memory: [u8; Self::MEMORY_LEN],
    pc: u16,
    call_stack: CallStack,
    delay_timer: u8,
    sound_timer: u8,
    screen: Screen,
    screen_dirty: bool,
    key_states: [KeyState; 16],
    cycle_interval: Duration,
}

impl Default for Cpu {
    fn default() -> Self {
        CpuBuilder::new().build()
    }
}

impl Cpu {
    /// Total addressable memory.
    pub const MEMORY_LEN: usize = 4096;

    /// Where program images are loaded; everything below is reserved for
    /// the interpreter (the font lives in the low 80 bytes).
    pub const PROGRAM_START: u16 = 0x200;

    /// The largest program image that fits after the reserved region.
    pub const MAX_PROGRAM_LEN: usize = Self::MEMORY_LEN - Self::PROGRAM_START as usize;

    /// Default pacing of the instruction loop: one instruction every 2 ms.
    ///
    /// A tunable, not an architectural constant; the historical machines
    /// ran at wildly different speeds.
    pub const DEFAULT_CYCLE_INTERVAL: Duration = Duration::from_millis(2);

    pub fn builder() -> CpuBuilder {
        CpuBuilder::new()
    }

    const fn reg(&self, reg: Reg) -> u8 {
        self.regs[reg as u8 as usize]
    }

    fn set_reg(&mut self, reg: Reg, val: u8) {
        self.regs[reg as u8 as usize] = val;
    }

    pub const fn key_state(&self, key: Key) -> KeyState {
        self.key_states[key as u8 as usize]
    }

    /// Record a key-down or key-up event from the input collaborator.
    pub fn set_key_state(&mut self, key: Key, state: KeyState) {
        self.key_states[key as u8 as usize] = state;
    }

    pub const fn screen(&self) -> &Screen {
        &self.screen
    }

    /// Whether the framebuffer changed since the renderer last observed it.
    pub const fn screen_dirty(&self) -> bool {
        self.screen_dirty
    }

    /// Hand the framebuffer to the renderer if it is dirty, clearing the
    /// dirty flag. Returns `None` when nothing changed since the last take.
    pub fn take_frame(&mut self) -> Option<Screen> {
        if self.screen_dirty {
            self.screen_dirty = false;
            Some(self.screen)
        } else {
            None
        }
    }

    /// Decimal digits of a byte value, hundreds first.
    fn decimal_digits(num: u8) -> [u8; 3] {
        [num / 100, num / 10 % 10, num % 10]
    }

    fn checked_index_span(&self, last_offset: usize) -> Result<usize, CpuError> {
        let start = self.index as usize;
        if start + last_offset < Self::MEMORY_LEN {
            Ok(start)
        } else {
            Err(CpuError::OutOfBoundsMemoryAccess {
                program_counter: self.pc,
            })
        }
    }

    /// Execute exactly one instruction.
    ///
    /// Words that decode to no defined instruction are reported as a
    /// diagnostic and skipped without any state change other than the
    /// program counter advancing by one word, so malformed input cannot
    /// livelock the machine.
    pub fn step(&mut self) -> Result<(), CpuError> {
        if self.pc as usize + 1 >= Self::MEMORY_LEN {
            return Err(CpuError::OutOfBoundsMemoryAccess {
                program_counter: self.pc,
            });
        }
        let word = [
            self.memory[self.pc as usize],
            self.memory[self.pc as usize + 1],
        ];

        let instruction = match Instruction::try_from(word) {
            Ok(instruction) => instruction,
            Err(error) => {
                warn!(program_counter = self.pc, %error, "skipping unknown opcode");
                self.pc = self.pc.wrapping_add(2);
                return Ok(());
            }
        };

        // Set by every instruction that assigns the program counter itself;
        // all others fall through to the +2 at the bottom.
        let mut pc_assigned = false;

        match instruction {
            Instruction::ClearScreen => {
                self.screen.clear();
                self.screen_dirty = true;
            }
            Instruction::Return => {
                let return_to =
                    self.call_stack
                        .pop()
                        .ok_or(CpuError::CallStackUnderflow {
                            program_counter: self.pc,
                        })?;
                // The call pushed the address of the call instruction
                // itself, so resume one word past it.
                self.pc = return_to.wrapping_add(2);
                pc_assigned = true;
            }
            Instruction::Jump { addr } => {
                self.pc = addr.into_u16();
                pc_assigned = true;
            }
            Instruction::Call { addr } => {
                self.call_stack
                    .push(self.pc)
                    .map_err(|_| CpuError::CallStackOverflow {
                        program_counter: self.pc,
                    })?;
                self.pc = addr.into_u16();
                pc_assigned = true;
            }
            Instruction::SkipEqImm { x, imm } => {
                if self.reg(x) == imm {
                    self.pc = self.pc.wrapping_add(4);
                    pc_assigned = true;
                }
            }
            Instruction::SkipNeImm { x, imm } => {
                if self.reg(x) != imm {
                    self.pc = self.pc.wrapping_add(4);
                    pc_assigned = true;
                }
            }
            Instruction::SkipEqReg { x, y } => {
                if self.reg(x) == self.reg(y) {
                    self.pc = self.pc.wrapping_add(4);
                    pc_assigned = true;
                }
            }
            Instruction::LoadImm { x, imm } => self.set_reg(x, imm),
            Instruction::AddImm { x, imm } => self.set_reg(x, self.reg(x).wrapping_add(imm)),
            Instruction::Move { x, y } => self.set_reg(x, self.reg(y)),
            Instruction::Or { x, y } => self.set_reg(x, self.reg(x) | self.reg(y)),
            Instruction::And { x, y } => self.set_reg(x, self.reg(x) & self.reg(y)),
            Instruction::Xor { x, y } => self.set_reg(x, self.reg(x) ^ self.reg(y)),
            Instruction::AddReg { x, y } => {
                let (res, carry) = self.reg(x).overflowing_add(self.reg(y));
                self.set_reg(Reg::VF, carry as u8);
                self.set_reg(x, res);
            }
            Instruction::SubReg { x, y } => {
                let (res, borrow) = self.reg(x).overflowing_sub(self.reg(y));
                self.set_reg(Reg::VF, 1 - borrow as u8);
                self.set_reg(x, res);
            }
            Instruction::Shr { x } => {
                self.set_reg(Reg::VF, self.reg(x) & 0b1);
                self.set_reg(x, self.reg(x) >> 1);
            }
            Instruction::SubFrom { x, y } => {
                let (res, borrow) = self.reg(y).overflowing_sub(self.reg(x));
                self.set_reg(Reg::VF, 1 - borrow as u8);
                self.set_reg(x, res);
            }
            Instruction::Shl { x } => {
                self.set_reg(Reg::VF, self.reg(x) >> 7);
                // The result is masked to 8 bits, which the historical
                // interpreter left unspecified.
                self.set_reg(x, self.reg(x) << 1);
            }
            Instruction::SkipNeReg { x, y } => {
                if self.reg(x) != self.reg(y) {
                    self.pc = self.pc.wrapping_add(4);
                    pc_assigned = true;
                }
            }
            Instruction::LoadIndex { addr } => self.index = addr.into_u16(),
            Instruction::JumpV0 { addr } => {
                self.pc = addr.into_u16().wrapping_add(self.reg(Reg::V0) as u16);
                pc_assigned = true;
            }
            Instruction::Random { x, mask } => self.set_reg(x, random::<u8>() & mask),
            Instruction::Draw { x, y, height } => {
                let height = height.into_u8() as usize;
                let sprite = if height == 0 {
                    // Zero-row draw reads nothing but still clears VF.
                    &[][..]
                } else {
                    let start = self.checked_index_span(height - 1)?;
                    &self.memory[start..start + height]
                };
                let vx = self.reg(x);
                let vy = self.reg(y);
                let collision = self.screen.draw_sprite(vx, vy, sprite);
                self.set_reg(Reg::VF, collision as u8);
                self.screen_dirty = true;
            }
            Instruction::SkipKeyPressed { x } => {
                let key_id = self.reg(x);
                if key_id as usize >= self.key_states.len() {
                    return Err(CpuError::InvalidKey {
                        program_counter: self.pc,
                        key_id,
                    });
                }
                if self.key_states[key_id as usize] == KeyState::Pressed {
                    self.pc = self.pc.wrapping_add(4);
                    pc_assigned = true;
                }
            }
            Instruction::SkipKeyReleased { x } => {
                let key_id = self.reg(x);
                if key_id as usize >= self.key_states.len() {
                    return Err(CpuError::InvalidKey {
                        program_counter: self.pc,
                        key_id,
                    });
                }
                if self.key_states[key_id as usize] == KeyState::Released {
                    self.pc = self.pc.wrapping_add(4);
                    pc_assigned = true;
                }
            }
            Instruction::ReadDelay { x } => self.set_reg(x, self.delay_timer),
            Instruction::WaitKey { x } => {
                // A blocking poll: when no key is down the program counter
                // stays put and the instruction re-runs next cycle. The
                // timer loop keeps ticking meanwhile.
                let pressed = (0..self.key_states.len())
                    .find(|&i| self.key_states[i] == KeyState::Pressed);
                match pressed {
                    Some(i) => {
                        self.set_reg(x, i as u8);
                        self.key_states[i] = KeyState::Released;
                    }
                    None => pc_assigned = true,
                }
            }
            Instruction::SetDelay { x } => self.delay_timer = self.reg(x),
            Instruction::SetSound { x } => self.sound_timer = self.reg(x),
            Instruction::AddIndex { x } => {
                self.index = self.index.wrapping_add(self.reg(x) as u16)
            }
            Instruction::LoadGlyph { x } => {
                let value = self.reg(x);
                if value as usize * GLYPH_LEN >= FONT_LEN {
                    return Err(CpuError::InvalidGlyph {
                        program_counter: self.pc,
                        value,
                    });
                }
                // Glyphs start at 0x000 and are GLYPH_LEN bytes each.
                self.index = value as u16 * GLYPH_LEN as u16;
            }
            Instruction::StoreBcd { x } => {
                let start = self.checked_index_span(2)?;
                let digits = Self::decimal_digits(self.reg(x));
                self.memory[start..start + 3].copy_from_slice(&digits);
            }
            Instruction::StoreRegisters { last } => {
                let start = self.checked_index_span(last as u8 as usize)?;
                for i in 0..=last as u8 as usize {
                    self.memory[start + i] = self.regs[i];
                }
            }
            Instruction::LoadRegisters { last } => {
                let start = self.checked_index_span(last as u8 as usize)?;
                for i in 0..=last as u8 as usize {
                    self.regs[i] = self.memory[start + i];
                }
            }
        }

        if !pc_assigned {
            self.pc = self.pc.wrapping_add(2);
        }

        Ok(())
    }

    /// Advance both countdown timers by one 60 Hz tick.
    ///
    /// Returns `true` when the sound timer was exactly 1 before this tick,
    /// i.e. the single moment the audio collaborator should emit its beep.
    pub fn tick_timers(&mut self) -> bool {
        if self.delay_timer > 0 {
            self.delay_timer -= 1;
        }

        let beep = self.sound_timer == 1;
        if self.sound_timer > 0 {
            self.sound_timer -= 1;
        }
        beep
    }
}

/// Builds a fully initialized machine: font in low memory, program at
/// [`Cpu::PROGRAM_START`], everything else zeroed, PC at the program start.
pub struct CpuBuilder {
    cpu: Cpu,
}

impl CpuBuilder {
    pub fn new() -> Self {
        Self {
            cpu: Cpu {
                regs: [0; 16],
                index: 0,
                memory: [0; Cpu::MEMORY_LEN],
                pc: Cpu::PROGRAM_START,
                call_stack: CallStack::default(),
                delay_timer: 0,
                sound_timer: 0,
                screen: Screen::default(),
                screen_dirty: false,
                key_states: [KeyState::Released; 16],
                cycle_interval: Cpu::DEFAULT_CYCLE_INTERVAL,
            },
        }
    }

    /// Copy a program image verbatim to [`Cpu::PROGRAM_START`].
    ///
    /// Images longer than the memory after the reserved region are rejected
    /// whole; no partial state is left behind.
    pub fn program(mut self, program: &[u8]) -> Result<Self, LoadError> {
        if program.len() > Cpu::MAX_PROGRAM_LEN {
            return Err(LoadError::ProgramTooLarge {
                program_len: program.len(),
            });
        }

        let start = Cpu::PROGRAM_START as usize;
        self.cpu.memory[start..start + program.len()].copy_from_slice(program);

        Ok(self)
    }

    /// Pacing of the instruction loop. See [`Cpu::DEFAULT_CYCLE_INTERVAL`].
    pub fn cycle_interval(mut self, interval: Duration) -> Self {
        self.cpu.cycle_interval = interval;
        self
    }

    pub fn build(mut self) -> Cpu {
        self.cpu.memory[..FONT_LEN].copy_from_slice(&FONT);
        self.cpu
    }
}

impl Default for CpuBuilder {
    fn default() -> Self {
        Self::new()
    }
}
