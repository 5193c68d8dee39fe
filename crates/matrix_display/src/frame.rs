//! Back buffer holding one full matrix of pixel colours.

use common::Rgb;

use crate::{HEIGHT, WIDTH};

/// A full matrix of pixel colours, indexed `[y][x]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Frame {
    pixels: [[Rgb; WIDTH]; HEIGHT],
}

impl Frame {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, x: usize, y: usize) -> Rgb {
        self.pixels[y][x]
    }

    pub fn set(&mut self, x: usize, y: usize, color: Rgb) {
        self.pixels[y][x] = color;
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn row(&self, y: usize) -> &[Rgb; WIDTH] {
        &self.pixels[y]
    }

    pub fn rows(&self) -> impl Iterator<Item = &[Rgb; WIDTH]> {
        self.pixels.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rows_are_indexed_by_y() {
        let mut frame = Frame::new();
        frame.set(WIDTH - 1, 2, Rgb::new(1, 2, 3));

        assert_eq!(frame.get(WIDTH - 1, 2), Rgb::new(1, 2, 3));
        assert_eq!(frame.row(2)[WIDTH - 1], Rgb::new(1, 2, 3));
        assert_eq!(frame.rows().count(), HEIGHT);

        frame.clear();
        assert_eq!(frame, Frame::new());
    }
}
