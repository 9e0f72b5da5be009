use std::convert::TryFrom;

use thiserror::Error;

use crate::cpu::Reg;
use crate::nibbles::{U12, U4};

/// The two opcode bytes matched no defined instruction.
///
/// This is a diagnostic, not a machine fault: the interpreter reports it
/// and skips the word without touching any state.
#[derive(Debug, PartialEq, Eq, Error)]
#[error("unknown opcode {:02X}{:02X}", .0[0], .0[1])]
pub struct UnknownOpcodeError(pub [u8; 2]);

/// A decoded CHIP-8 instruction.
///
/// Register operands are typed [`Reg`] and addresses [`U12`], so every field
/// is in range by construction once decoding has succeeded.
///
/// References: <https://github.com/mattmikolay/chip-8/wiki/CHIP%E2%80%908-Instruction-Set>
/// and <https://en.wikipedia.org/wiki/CHIP-8#Opcode_table>.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Instruction {
    /// `00E0`: clear the screen.
    ClearScreen,
    /// `00EE`: return from a subroutine.
    Return,
    /// `1NNN`: jump to `addr`.
    Jump { addr: U12 },
    /// `2NNN`: call the subroutine at `addr`.
    Call { addr: U12 },
    /// `3XNN`: skip the next instruction if `V[x] == imm`.
    SkipEqImm { x: Reg, imm: u8 },
    /// `4XNN`: skip the next instruction if `V[x] != imm`.
    SkipNeImm { x: Reg, imm: u8 },
    /// `5XY0`: skip the next instruction if `V[x] == V[y]`.
    SkipEqReg { x: Reg, y: Reg },
    /// `6XNN`: `V[x] = imm`.
    LoadImm { x: Reg, imm: u8 },
    /// `7XNN`: `V[x] += imm`, wrapping; `VF` untouched.
    AddImm { x: Reg, imm: u8 },
    /// `8XY0`: `V[x] = V[y]`.
    Move { x: Reg, y: Reg },
    /// `8XY1`: `V[x] |= V[y]`.
    Or { x: Reg, y: Reg },
    /// `8XY2`: `V[x] &= V[y]`.
    And { x: Reg, y: Reg },
    /// `8XY3`: `V[x] ^= V[y]`.
    Xor { x: Reg, y: Reg },
    /// `8XY4`: `V[x] += V[y]`; `VF` = 1 on carry, else 0.
    AddReg { x: Reg, y: Reg },
    /// `8XY5`: `V[x] -= V[y]`; `VF` = 0 on borrow, else 1.
    SubReg { x: Reg, y: Reg },
    /// `8XY6`: `VF` = low bit of `V[x]`, then `V[x] >>= 1`.
    Shr { x: Reg },
    /// `8XY7`: `V[x] = V[y] - V[x]`; `VF` = 0 on borrow, else 1.
    SubFrom { x: Reg, y: Reg },
    /// `8XYE`: `VF` = high bit of `V[x]`, then `V[x] <<= 1`.
    Shl { x: Reg },
    /// `9XY0`: skip the next instruction if `V[x] != V[y]`.
    SkipNeReg { x: Reg, y: Reg },
    /// `ANNN`: `I = addr`.
    LoadIndex { addr: U12 },
    /// `BNNN`: jump to `addr + V[0]`.
    JumpV0 { addr: U12 },
    /// `CXNN`: `V[x]` = random byte AND `mask`.
    Random { x: Reg, mask: u8 },
    /// `DXYN`: draw the `height`-row sprite at `I` at `(V[x], V[y])`;
    /// `VF` = 1 if any pixel was erased, else 0.
    Draw { x: Reg, y: Reg, height: U4 },
    /// `EX9E`: skip the next instruction if key `V[x]` is pressed.
    SkipKeyPressed { x: Reg },
    /// `EXA1`: skip the next instruction if key `V[x]` is not pressed.
    SkipKeyReleased { x: Reg },
    /// `FX07`: `V[x]` = delay timer.
    ReadDelay { x: Reg },
    /// `FX0A`: block until a key is pressed, then store its index in `V[x]`.
    WaitKey { x: Reg },
    /// `FX15`: delay timer = `V[x]`.
    SetDelay { x: Reg },
    /// `FX18`: sound timer = `V[x]`.
    SetSound { x: Reg },
    /// `FX1E`: `I += V[x]`, wrapping at 16 bits; no flag.
    AddIndex { x: Reg },
    /// `FX29`: `I` = address of the built-in glyph for hex digit `V[x]`.
    LoadGlyph { x: Reg },
    /// `FX33`: store the decimal digits of `V[x]` at `I`, `I+1`, `I+2`.
    StoreBcd { x: Reg },
    /// `FX55`: store `V[0]..=V[last]` to memory at `I`.
    StoreRegisters { last: Reg },
    /// `FX65`: load `V[0]..=V[last]` from memory at `I`, masked to 8 bits.
    LoadRegisters { last: Reg },
}

impl TryFrom<[u8; 2]> for Instruction {
    type Error = UnknownOpcodeError;

    /// Decode a big-endian opcode word.
    ///
    /// One flat match over the four nibbles serves as the dispatch table:
    /// literal positions carry the primary (top nibble) and secondary
    /// (low nibble or low byte) selectors, wildcards carry operands.
    fn try_from(word: [u8; 2]) -> Result<Self, Self::Error> {
        let x = Reg::from(U4::lo(word[0]));
        let y = Reg::from(U4::hi(word[1]));
        let imm = word[1];
        let addr = U12::from_opcode_bytes(word[0], word[1]);

        let nibbles = (
            U4::hi(word[0]).into_u8(),
            U4::lo(word[0]).into_u8(),
            U4::hi(word[1]).into_u8(),
            U4::lo(word[1]).into_u8(),
        );

        Ok(match nibbles {
            (0x0, 0x0, 0xE, 0x0) => Self::ClearScreen,
            (0x0, 0x0, 0xE, 0xE) => Self::Return,
            (0x1, ..) => Self::Jump { addr },
            (0x2, ..) => Self::Call { addr },
            (0x3, ..) => Self::SkipEqImm { x, imm },
            (0x4, ..) => Self::SkipNeImm { x, imm },
            (0x5, _, _, 0x0) => Self::SkipEqReg { x, y },
            (0x6, ..) => Self::LoadImm { x, imm },
            (0x7, ..) => Self::AddImm { x, imm },
            (0x8, _, _, 0x0) => Self::Move { x, y },
            (0x8, _, _, 0x1) => Self::Or { x, y },
            (0x8, _, _, 0x2) => Self::And { x, y },
            (0x8, _, _, 0x3) => Self::Xor { x, y },
            (0x8, _, _, 0x4) => Self::AddReg { x, y },
            (0x8, _, _, 0x5) => Self::SubReg { x, y },
            (0x8, _, _, 0x6) => Self::Shr { x },
            (0x8, _, _, 0x7) => Self::SubFrom { x, y },
            (0x8, _, _, 0xE) => Self::Shl { x },
            (0x9, _, _, 0x0) => Self::SkipNeReg { x, y },
            (0xA, ..) => Self::LoadIndex { addr },
            (0xB, ..) => Self::JumpV0 { addr },
            (0xC, ..) => Self::Random { x, mask: imm },
            (0xD, _, _, height) => Self::Draw {
                x,
                y,
                height: U4::lo(height),
            },
            (0xE, _, 0x9, 0xE) => Self::SkipKeyPressed { x },
            (0xE, _, 0xA, 0x1) => Self::SkipKeyReleased { x },
            (0xF, _, 0x0, 0x7) => Self::ReadDelay { x },
            (0xF, _, 0x0, 0xA) => Self::WaitKey { x },
            (0xF, _, 0x1, 0x5) => Self::SetDelay { x },
            (0xF, _, 0x1, 0x8) => Self::SetSound { x },
            (0xF, _, 0x1, 0xE) => Self::AddIndex { x },
            (0xF, _, 0x2, 0x9) => Self::LoadGlyph { x },
            (0xF, _, 0x3, 0x3) => Self::StoreBcd { x },
            (0xF, _, 0x5, 0x5) => Self::StoreRegisters { last: x },
            (0xF, _, 0x6, 0x5) => Self::LoadRegisters { last: x },
            _ => return Err(UnknownOpcodeError(word)),
        })
    }
}

impl From<Instruction> for [u8; 2] {
    /// Encode back to the big-endian opcode word. Used to assemble test
    /// programs; the inverse of the decoder for every defined instruction.
    fn from(instruction: Instruction) -> Self {
        use Instruction::*;

        fn word(n0: u8, n1: u8, n2: u8, n3: u8) -> [u8; 2] {
            [n0 << 4 | n1, n2 << 4 | n3]
        }
        fn with_imm(n0: u8, x: Reg, imm: u8) -> [u8; 2] {
            [n0 << 4 | x as u8, imm]
        }
        fn with_addr(n0: u8, addr: U12) -> [u8; 2] {
            let addr = addr.into_u16();
            [n0 << 4 | (addr >> 8) as u8, addr as u8]
        }

        match instruction {
            ClearScreen => [0x00, 0xE0],
            Return => [0x00, 0xEE],
            Jump { addr } => with_addr(0x1, addr),
            Call { addr } => with_addr(0x2, addr),
            SkipEqImm { x, imm } => with_imm(0x3, x, imm),
            SkipNeImm { x, imm } => with_imm(0x4, x, imm),
            SkipEqReg { x, y } => word(0x5, x as u8, y as u8, 0x0),
            LoadImm { x, imm } => with_imm(0x6, x, imm),
            AddImm { x, imm } => with_imm(0x7, x, imm),
            Move { x, y } => word(0x8, x as u8, y as u8, 0x0),
            Or { x, y } => word(0x8, x as u8, y as u8, 0x1),
            And { x, y } => word(0x8, x as u8, y as u8, 0x2),
            Xor { x, y } => word(0x8, x as u8, y as u8, 0x3),
            AddReg { x, y } => word(0x8, x as u8, y as u8, 0x4),
            SubReg { x, y } => word(0x8, x as u8, y as u8, 0x5),
            Shr { x } => word(0x8, x as u8, 0x0, 0x6),
            SubFrom { x, y } => word(0x8, x as u8, y as u8, 0x7),
            Shl { x } => word(0x8, x as u8, 0x0, 0xE),
            SkipNeReg { x, y } => word(0x9, x as u8, y as u8, 0x0),
            LoadIndex { addr } => with_addr(0xA, addr),
            JumpV0 { addr } => with_addr(0xB, addr),
            Random { x, mask } => with_imm(0xC, x, mask),
            Draw { x, y, height } => word(0xD, x as u8, y as u8, height.into_u8()),
            SkipKeyPressed { x } => word(0xE, x as u8, 0x9, 0xE),
            SkipKeyReleased { x } => word(0xE, x as u8, 0xA, 0x1),
            ReadDelay { x } => word(0xF, x as u8, 0x0, 0x7),
            WaitKey { x } => word(0xF, x as u8, 0x0, 0xA),
            SetDelay { x } => word(0xF, x as u8, 0x1, 0x5),
            SetSound { x } => word(0xF, x as u8, 0x1, 0x8),
            AddIndex { x } => word(0xF, x as u8, 0x1, 0xE),
            LoadGlyph { x } => word(0xF, x as u8, 0x2, 0x9),
            StoreBcd { x } => word(0xF, x as u8, 0x3, 0x3),
            StoreRegisters { last } => word(0xF, last as u8, 0x5, 0x5),
            LoadRegisters { last } => word(0xF, last as u8, 0x6, 0x5),
        }
    }
}
