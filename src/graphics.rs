//! A wrapper around the 64x32 monochrome screen and the matching dirty mask.
//! Both are stored row-major in bit sets, so pixel (x, y) lives at bit
//! `y * WIDTH + x`
use fixedbitset::FixedBitSet;
use std::fmt;

pub const WIDTH: usize = 64;
pub const HEIGHT: usize = 32;

pub const NUM_BYTES_IN_FONT_CHAR: usize = 5;

/// The 16 4x5 hex digit glyphs, loaded at address 0x000
pub const FONT_SET: [u8; 16 * NUM_BYTES_IN_FONT_CHAR] = [
    0xF0, 0x90, 0x90, 0x90, 0xF0, // 0
    0x20, 0x60, 0x20, 0x20, 0x70, // 1
    0xF0, 0x10, 0xF0, 0x80, 0xF0, // 2
    0xF0, 0x10, 0xF0, 0x10, 0xF0, // 3
    0x90, 0x90, 0xF0, 0x10, 0x10, // 4
    0xF0, 0x80, 0xF0, 0x10, 0xF0, // 5
    0xF0, 0x80, 0xF0, 0x90, 0xF0, // 6
    0xF0, 0x10, 0x20, 0x40, 0x40, // 7
    0xF0, 0x90, 0xF0, 0x90, 0xF0, // 8
    0xF0, 0x90, 0xF0, 0x10, 0xF0, // 9
    0xF0, 0x90, 0xF0, 0x90, 0x90, // A
    0xE0, 0x90, 0xE0, 0x90, 0xE0, // B
    0xF0, 0x80, 0x80, 0x80, 0xF0, // C
    0xE0, 0x90, 0x90, 0x90, 0xE0, // D
    0xF0, 0x80, 0xF0, 0x80, 0xF0, // E
    0xF0, 0x80, 0xF0, 0x80, 0x80, // F
];

/// Something that can show the screen. `update` is handed the whole buffer
/// along with the cells touched since the previous update
pub trait AsDisplay {
    /// true once the host has been closed by the user
    fn closed(&self) -> bool;
    fn update(&mut self, graphics: &Graphics);
}

#[derive(Debug, Clone, PartialEq)]
pub struct Graphics {
    buffer: FixedBitSet,
    dirty: FixedBitSet,
}

impl Default for Graphics {
    fn default() -> Self {
        Graphics::new()
    }
}

impl Graphics {
    pub fn new() -> Self {
        Graphics {
            buffer: FixedBitSet::with_capacity(WIDTH * HEIGHT),
            dirty: FixedBitSet::with_capacity(WIDTH * HEIGHT),
        }
    }

    pub fn len(&self) -> usize {
        WIDTH * HEIGHT
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.ones().next().is_none()
    }

    /// Given x and y coordinate for a pixel, return the corresponding
    /// index of that bit in the buffer. Coordinates wrap around the screen
    pub fn get_graphics_idx(x: usize, y: usize) -> usize {
        (y % HEIGHT) * WIDTH + (x % WIDTH)
    }

    pub fn get(&self, x: usize, y: usize) -> bool {
        self.buffer[Self::get_graphics_idx(x, y)]
    }

    pub fn is_dirty(&self, x: usize, y: usize) -> bool {
        self.dirty[Self::get_graphics_idx(x, y)]
    }

    /// Returns true if any cell has been touched since the dirty mask was last cleared
    pub fn has_dirty(&self) -> bool {
        self.dirty.ones().next().is_some()
    }

    /// (x, y) of every touched cell, row by row
    pub fn dirty_cells(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.dirty.ones().map(|idx| (idx % WIDTH, idx / WIDTH))
    }

    pub fn clear_dirty(&mut self) {
        self.dirty.clear();
    }

    /// Turn every pixel off. The whole screen counts as touched
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.dirty.insert_range(..);
    }

    /// XOR a sprite onto the screen with its top left corner at (x, y). Each
    /// byte of `rows` is one 8 pixel row, most significant bit leftmost.
    /// Pixels falling off an edge wrap around to the opposite one.
    ///
    /// Returns true if any pixel went from on to off
    pub fn draw_sprite(&mut self, x: u8, y: u8, rows: &[u8]) -> bool {
        let mut collision = false;

        for (i, byte) in rows.iter().enumerate() {
            for j in 0..8 {
                if *byte & (0x80u8 >> j) == 0 {
                    continue;
                }

                let idx = Self::get_graphics_idx(x as usize + j, y as usize + i);
                let was_set = self.buffer[idx];
                if was_set {
                    collision = true;
                }
                self.buffer.set(idx, !was_set);
                self.dirty.insert(idx);
            }
        }

        collision
    }

    /// Row-major pixel buffer for renderers that take one u32 per pixel
    pub fn to_pixels(&self, on: u32, off: u32) -> Vec<u32> {
        (0..self.len())
            .map(|idx| if self.buffer[idx] { on } else { off })
            .collect()
    }
}

impl fmt::Display for Graphics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for y in 0..HEIGHT {
            let line: String = (0..WIDTH)
                .map(|x| if self.get(x, y) { '█' } else { ' ' })
                .collect();
            writeln!(f, "{}", line.trim_end())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draw_without_collision() {
        let mut graphics = Graphics::new();

        let collision = graphics.draw_sprite(1, 2, &[0b1010_1010, 0b1010_1010]);

        assert!(!collision);
        for y in 2..4 {
            for x in 1..9 {
                let expected = (x - 1) % 2 == 0;
                assert_eq!(graphics.get(x, y), expected, "({}, {})", x, y);
                assert_eq!(graphics.is_dirty(x, y), expected, "({}, {})", x, y);
            }
        }
    }

    #[test]
    fn draw_twice_erases_and_collides() {
        let mut graphics = Graphics::new();
        let sprite = [0xF0, 0x90, 0x90, 0x90, 0xF0];

        assert!(!graphics.draw_sprite(10, 10, &sprite));
        assert!(graphics.draw_sprite(10, 10, &sprite));

        assert!(graphics.is_empty());
        // still dirty even though the pixels ended up where they started
        assert!(graphics.is_dirty(10, 10));
        assert!(!graphics.is_dirty(11, 11));
    }

    #[test]
    fn draw_wraps_bottom_to_top() {
        let mut graphics = Graphics::new();

        graphics.draw_sprite(0, (HEIGHT - 1) as u8, &[0xFF, 0xFF]);

        for x in 0..8 {
            assert!(graphics.get(x, HEIGHT - 1));
            assert!(graphics.get(x, 0));
        }
        assert!(!graphics.get(0, 1));
    }

    #[test]
    fn draw_wraps_right_to_left() {
        let mut graphics = Graphics::new();

        graphics.draw_sprite((WIDTH - 1) as u8, 0, &[0xFF]);

        assert!(graphics.get(WIDTH - 1, 0));
        for x in 0..7 {
            assert!(graphics.get(x, 0));
        }
        assert!(!graphics.get(7, 0));
    }

    #[test]
    fn coordinates_past_the_screen_wrap() {
        let mut graphics = Graphics::new();

        graphics.draw_sprite(200, 100, &[0x80]);

        assert!(graphics.get(200 % WIDTH, 100 % HEIGHT));
    }

    #[test]
    fn clear_marks_everything_dirty() {
        let mut graphics = Graphics::new();
        graphics.draw_sprite(0, 0, &[0xFF]);
        graphics.clear_dirty();

        graphics.clear();

        assert!(graphics.is_empty());
        assert_eq!(graphics.dirty_cells().count(), WIDTH * HEIGHT);

        graphics.clear_dirty();
        assert!(!graphics.has_dirty());
    }

    #[test]
    fn dirty_cells_are_reported_as_coordinates() {
        let mut graphics = Graphics::new();
        graphics.draw_sprite(62, 5, &[0b1110_0000]);

        let cells: Vec<_> = graphics.dirty_cells().collect();

        assert_eq!(cells, vec![(0, 5), (62, 5), (63, 5)]);
    }

    #[test]
    fn pixel_buffer() {
        let mut graphics = Graphics::new();
        graphics.draw_sprite(1, 0, &[0x80]);

        let pixels = graphics.to_pixels(0xFFFFFF, 0);

        assert_eq!(pixels.len(), WIDTH * HEIGHT);
        assert_eq!(pixels[0], 0);
        assert_eq!(pixels[1], 0xFFFFFF);
    }

    #[test]
    fn text_rendering() {
        let mut graphics = Graphics::new();
        graphics.draw_sprite(0, 0, &[0b1010_0000]);

        let text = graphics.to_string();
        let first = text.lines().next().unwrap();

        assert_eq!(first, "█ █");
        assert_eq!(text.lines().count(), HEIGHT);
    }
}
