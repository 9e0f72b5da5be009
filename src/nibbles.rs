use std::convert::TryFrom;

use derive_more::{Display, Into};
use thiserror::Error;

#[derive(Debug, PartialEq, Eq, Error)]
#[error("value {value} does not fit into {bits} bits")]
pub struct ValueTooWideError {
    value: usize,
    bits: u32,
}

/// A 4-bit integer, as extracted from an opcode nibble.
///
/// Only supports what the decoder needs; stored in a full byte.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Into, Display)]
#[repr(transparent)]
pub struct U4(u8);

impl U4 {
    pub const MAX: Self = Self(0b1111);

    /// The low nibble of `val`.
    pub const fn lo(val: u8) -> Self {
        U4(val & 0b1111)
    }

    /// The high nibble of `val`.
    pub const fn hi(val: u8) -> Self {
        U4(val >> 4)
    }

    pub const fn into_u8(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for U4 {
    type Error = ValueTooWideError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        if value <= U4::MAX.0 {
            Ok(U4(value))
        } else {
            Err(ValueTooWideError {
                value: value as usize,
                bits: 4,
            })
        }
    }
}

/// A 12-bit integer, as extracted from the address field of an opcode.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Into, Display)]
#[repr(transparent)]
pub struct U12(u16);

impl U12 {
    pub const MAX: Self = Self(0b1111_1111_1111);

    /// The low 12 bits of an opcode word: the low nibble of `hi` followed by `lo`.
    pub const fn from_opcode_bytes(hi: u8, lo: u8) -> Self {
        U12((((hi & 0b1111) as u16) << 8) | lo as u16)
    }

    pub const fn into_u16(self) -> u16 {
        self.0
    }
}

impl TryFrom<u16> for U12 {
    type Error = ValueTooWideError;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        if value <= U12::MAX.0 {
            Ok(U12(value))
        } else {
            Err(ValueTooWideError {
                value: value as usize,
                bits: 12,
            })
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn u4_from_byte_halves() {
        assert_eq!(U4::hi(0xAB).into_u8(), 0xA);
        assert_eq!(U4::lo(0xAB).into_u8(), 0xB);
    }

    #[test]
    fn u4_try_from_bounds() {
        assert_eq!(U4::try_from(0xF), Ok(U4::MAX));
        assert!(U4::try_from(0x10).is_err());
    }

    #[test]
    fn u12_from_opcode_bytes_masks_high_nibble() {
        assert_eq!(U12::from_opcode_bytes(0x2A, 0xBC).into_u16(), 0xABC);
    }
}
