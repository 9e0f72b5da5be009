use num_enum::{IntoPrimitive, TryFromPrimitive, UnsafeFromPrimitive};
use static_assertions::const_assert;

use crate::nibbles::U4;

/// Index of a general-purpose data register.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    TryFromPrimitive,
    IntoPrimitive,
    UnsafeFromPrimitive,
)]
#[repr(u8)]
pub enum Reg {
    /// Used as the jump offset in [`Instruction::JumpV0`][crate::instruction::Instruction::JumpV0].
    V0,
    V1,
    V2,
    V3,
    V4,
    V5,
    V6,
    V7,
    V8,
    V9,
    VA,
    VB,
    VC,
    VD,
    VE,
    /// Doubles as the carry/borrow/collision flag, overwritten as a side
    /// effect of the arithmetic, shift and draw instructions.
    VF,
}

// One variant per nibble value, so the unchecked conversion below is total.
const_assert!(Reg::VF as u8 == U4::MAX.into_u8());

impl From<U4> for Reg {
    fn from(val: U4) -> Self {
        // SAFETY: Reg has a variant for every U4 value, asserted above.
        unsafe { Reg::from_unchecked(val.into_u8()) }
    }
}
