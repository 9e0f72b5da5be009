use num_enum::{IntoPrimitive, TryFromPrimitive, UnsafeFromPrimitive};
use static_assertions::const_assert;

use crate::nibbles::U4;

/// One of the sixteen keypad keys.
///
/// How physical keys map onto these indices is entirely up to the input
/// collaborator; the interpreter only ever sees the indices.
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
pub enum Key {
    K0,
    K1,
    K2,
    K3,
    K4,
    K5,
    K6,
    K7,
    K8,
    K9,
    KA,
    KB,
    KC,
    KD,
    KE,
    KF,
}

const_assert!(Key::KF as u8 == U4::MAX.into_u8());

impl From<U4> for Key {
    fn from(val: U4) -> Self {
        // SAFETY: Key has a variant for every U4 value, asserted above.
        unsafe { Key::from_unchecked(val.into_u8()) }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyState {
    Pressed,
    Released,
}

impl Default for KeyState {
    fn default() -> Self {
        Self::Released
    }
}
