//! The built-in hexadecimal sprite font.
//!
//! Copied into memory at `0x000` on initialization. The bit patterns are the
//! historical CHIP-8 ones; ROMs that draw digit glyphs depend on them exactly.

use static_assertions::const_assert;

macro_rules! pixel_to_bit {
    (#) => {
        1
    };
    (,) => {
        0
    };
}

/// Build the font byte table from sprite pixel art.
///
/// Each glyph row is one byte; the four pixels sit in the high nibble,
/// since a CHIP-8 sprite row is always eight pixels wide.
macro_rules! hex_glyphs {
    (
        $(
            $(
                ($pixel0:tt $pixel1:tt $pixel2:tt $pixel3:tt)
            )*
            ------
        )*
    ) => {
        [
            $(
                $(
                    (pixel_to_bit!($pixel0) << 7
                        | pixel_to_bit!($pixel1) << 6
                        | pixel_to_bit!($pixel2) << 5
                        | pixel_to_bit!($pixel3) << 4),
                )*
            )*
        ]
    };
}

/// Height of one glyph in bytes, and therefore the stride between glyphs.
pub const GLYPH_LEN: usize = 5;

/// Total length of the font table: 16 glyphs, `0x0` through `0xF`.
pub const FONT_LEN: usize = GLYPH_LEN * 16;

/// The classic CHIP-8 4x5 hexadecimal digit sprites.
pub const FONT: [u8; FONT_LEN] = hex_glyphs![
    (####)
    (#,,#)
    (#,,#)
    (#,,#)
    (####)
    ------
    (,,#,)
    (,##,)
    (,,#,)
    (,,#,)
    (,###)
    ------
    (####)
    (,,,#)
    (####)
    (#,,,)
    (####)
    ------
    (####)
    (,,,#)
    (####)
    (,,,#)
    (####)
    ------
    (#,,#)
    (#,,#)
    (####)
    (,,,#)
    (,,,#)
    ------
    (####)
    (#,,,)
    (####)
    (,,,#)
    (####)
    ------
    (####)
    (#,,,)
    (####)
    (#,,#)
    (####)
    ------
    (####)
    (,,,#)
    (,,#,)
    (,#,,)
    (,#,,)
    ------
    (####)
    (#,,#)
    (####)
    (#,,#)
    (####)
    ------
    (####)
    (#,,#)
    (####)
    (,,,#)
    (####)
    ------
    (####)
    (#,,#)
    (####)
    (#,,#)
    (#,,#)
    ------
    (###,)
    (#,,#)
    (###,)
    (#,,#)
    (###,)
    ------
    (####)
    (#,,,)
    (#,,,)
    (#,,,)
    (####)
    ------
    (###,)
    (#,,#)
    (#,,#)
    (#,,#)
    (###,)
    ------
    (####)
    (#,,,)
    (####)
    (#,,,)
    (####)
    ------
    (####)
    (#,,,)
    (####)
    (#,,,)
    (#,,,)
    ------
];

const_assert!(FONT.len() == GLYPH_LEN * 16);
