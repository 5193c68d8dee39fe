//! Drifting-cloud grayscale diffusion.

use common::Rgb;
use matrix_display::{HEIGHT, WIDTH};
use rand::Rng;

pub const CLOUD_ROWS: usize = HEIGHT - 1;
pub const GRAY_MIN: u8 = 120;
/// Exclusive upper bound for new targets.
pub const GRAY_MAX: u8 = 230;
pub const START_GRAY: u8 = 175;

#[derive(Debug, Clone)]
pub struct CloudField {
    current: [[u8; CLOUD_ROWS]; WIDTH],
    target: [[u8; CLOUD_ROWS]; WIDTH],
}

impl Default for CloudField {
    fn default() -> Self {
        Self::new()
    }
}

impl CloudField {
    pub fn new() -> Self {
        Self {
            current: [[START_GRAY; CLOUD_ROWS]; WIDTH],
            target: [[START_GRAY; CLOUD_ROWS]; WIDTH],
        }
    }

    pub fn gray_at(&self, x: usize, y: usize) -> u8 {
        self.current[x][y]
    }

    pub fn target_at(&self, x: usize, y: usize) -> u8 {
        self.target[x][y]
    }

    /// Move every pixel one shade toward its target, drawing a new target
    /// for pixels that have arrived.
    pub fn advance<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        for x in 0..WIDTH {
            for y in 0..CLOUD_ROWS {
                let current = &mut self.current[x][y];
                let target = &mut self.target[x][y];
                if *current == *target {
                    *target = rng.gen_range(GRAY_MIN..GRAY_MAX);
                } else if *current > *target {
                    *current -= 1;
                } else {
                    *current += 1;
                }
            }
        }
    }

    pub fn pixels(&self) -> impl Iterator<Item = (usize, usize, Rgb)> + '_ {
        (0..WIDTH).flat_map(move |x| {
            (0..CLOUD_ROWS).map(move |y| (x, y, Rgb::gray(self.current[x][y])))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_first_step_draws_targets_without_moving() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut field = CloudField::new();
        field.advance(&mut rng);

        for x in 0..WIDTH {
            for y in 0..CLOUD_ROWS {
                assert_eq!(field.gray_at(x, y), START_GRAY);
                assert!((GRAY_MIN..GRAY_MAX).contains(&field.target_at(x, y)));
            }
        }
    }

    #[test]
    fn test_diffusion_is_gradual_and_bounded() {
        let mut rng = StdRng::seed_from_u64(99);
        let mut field = CloudField::new();

        for _ in 0..5000 {
            let before = field.clone();
            field.advance(&mut rng);

            for x in 0..WIDTH {
                for y in 0..CLOUD_ROWS {
                    let prev = before.gray_at(x, y);
                    let next = field.gray_at(x, y);
                    assert!(prev.abs_diff(next) <= 1);
                    assert!((GRAY_MIN..=GRAY_MAX).contains(&next));

                    // A new target is only drawn once the old one was reached.
                    if field.target_at(x, y) != before.target_at(x, y) {
                        assert_eq!(prev, before.target_at(x, y));
                        assert_eq!(next, prev);
                    }
                }
            }
        }
    }

    #[test]
    fn test_pixels_are_gray() {
        let field = CloudField::new();
        assert!(field.pixels().all(|(_, _, c)| c == Rgb::gray(START_GRAY)));
        assert_eq!(field.pixels().count(), WIDTH * CLOUD_ROWS);
    }
}
