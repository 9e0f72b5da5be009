use std::fmt::{Debug, Write};

/// The monochrome 64x32 framebuffer.
///
/// Pixels are packed eight to a byte, most significant bit leftmost, rows
/// stored top to bottom. Only [`Screen::clear`] and [`Screen::draw_sprite`]
/// mutate it; the dirty flag signalling the renderer lives on the `Cpu`,
/// which knows when those run.
#[derive(PartialEq, Eq, Clone, Copy)]
pub struct Screen {
    pub pixel_data: [u8; Self::WIDTH_BYTES * Self::HEIGHT as usize],
}

impl Screen {
    /// Screen width in bytes of packed pixels.
    pub const WIDTH_BYTES: usize = 8;
    /// Screen width in pixels.
    pub const WIDTH: u8 = (Self::WIDTH_BYTES * 8) as u8;
    /// Screen height in pixels.
    pub const HEIGHT: u8 = 32;

    /// Whether the pixel at `(x, y)` is on.
    ///
    /// Coordinates must be in bounds; this is only ever called with
    /// clipped coordinates.
    pub fn pixel(&self, x: u8, y: u8) -> bool {
        let byte = self.pixel_data[x as usize / 8 + y as usize * Self::WIDTH_BYTES];
        byte & (0x80 >> (x % 8)) != 0
    }

    /// XOR the pixel at `(x, y)`.
    ///
    /// Returns `true` if a set pixel was unset, i.e. a sprite collision.
    fn flip_pixel(&mut self, x: usize, y: usize) -> bool {
        let mask = 0x80 >> (x % 8);
        let byte = &mut self.pixel_data[x / 8 + y * Self::WIDTH_BYTES];
        let was_set = *byte & mask != 0;
        *byte ^= mask;
        was_set
    }

    /// Draw a sprite with its top-left corner at `(x, y)`, one byte per row.
    ///
    /// Set sprite bits are XORed into the framebuffer. Rows and columns that
    /// fall outside the screen are dropped; nothing wraps around, and the
    /// start coordinate is taken as-is.
    ///
    /// Returns `true` if any set pixel was unset by the draw.
    pub fn draw_sprite(&mut self, x: u8, y: u8, sprite: &[u8]) -> bool {
        let mut collision = false;

        for (row, sprite_byte) in sprite.iter().copied().enumerate() {
            let y = y as usize + row;
            if y >= Self::HEIGHT as usize {
                break;
            }
            for col in 0..8 {
                if sprite_byte & (0x80 >> col) == 0 {
                    continue;
                }
                let x = x as usize + col;
                if x >= Self::WIDTH as usize {
                    continue;
                }
                collision |= self.flip_pixel(x, y);
            }
        }

        collision
    }

    pub fn clear(&mut self) {
        self.pixel_data.fill(0);
    }
}

impl Default for Screen {
    fn default() -> Self {
        Self {
            pixel_data: [0; Self::WIDTH_BYTES * Self::HEIGHT as usize],
        }
    }
}

impl Debug for Screen {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if f.alternate() {
            writeln!(f, "Screen(")?;
            for c in self
                .pixel_data
                .chunks_exact(Self::WIDTH_BYTES)
                .flat_map(|row| {
                    row.iter()
                        .copied()
                        .flat_map(|screen_byte| {
                            (0..8)
                                .rev()
                                .map(move |i| if screen_byte >> i & 1 > 0 { '#' } else { '_' })
                        })
                        .chain(['\n'])
                })
            {
                f.write_char(c)?;
            }
            write!(f, ")")
        } else {
            f.debug_tuple("Screen").field(&self.pixel_data).finish()
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn draw_reports_collision_and_xors() {
        let mut screen = Screen::default();

        assert!(!screen.draw_sprite(10, 4, &[0b1111_0000]));
        assert!(screen.pixel(10, 4));
        assert!(screen.pixel(13, 4));
        assert!(!screen.pixel(14, 4));

        // Overlapping draw collides and erases the overlap.
        assert!(screen.draw_sprite(12, 4, &[0b1100_0000]));
        assert!(!screen.pixel(12, 4));
        assert!(!screen.pixel(13, 4));
        assert!(screen.pixel(10, 4));
    }

    #[test]
    fn draw_straddles_byte_boundary() {
        let mut screen = Screen::default();

        screen.draw_sprite(6, 0, &[0b1111_1111]);
        for x in 6..14 {
            assert!(screen.pixel(x, 0), "pixel {} should be set", x);
        }
        assert!(!screen.pixel(5, 0));
        assert!(!screen.pixel(14, 0));
    }

    #[test]
    fn draw_clips_at_right_and_bottom_edges() {
        let mut screen = Screen::default();

        screen.draw_sprite(60, 30, &[0xFF, 0xFF, 0xFF]);

        // Only the 4x2 on-screen corner is drawn, nothing wraps.
        let lit: usize = (0..Screen::WIDTH)
            .flat_map(|x| (0..Screen::HEIGHT).map(move |y| (x, y)))
            .filter(|&(x, y)| screen.pixel(x, y))
            .count();
        assert_eq!(lit, 8);
        assert!(screen.pixel(63, 31));
        assert!(!screen.pixel(0, 0));
    }

    #[test]
    fn clear_unsets_every_pixel() {
        let mut screen = Screen::default();
        screen.draw_sprite(0, 0, &[0xFF; 15]);

        screen.clear();

        assert_eq!(screen, Screen::default());
    }

    #[test]
    fn redraw_is_self_inverse() {
        let mut screen = Screen::default();
        let sprite = [0x3C, 0x42, 0x81, 0x81, 0x42, 0x3C];

        screen.draw_sprite(20, 9, &sprite);
        let collision = screen.draw_sprite(20, 9, &sprite);

        assert!(collision);
        assert_eq!(screen, Screen::default());
    }
}
