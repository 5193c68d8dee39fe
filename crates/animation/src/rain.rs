//! Falling-rain simulation.
//!
//! Each column carries one droplet that wanders between random target rows.
//! Rows at or above the droplet are wet (full blue); rows below it fade.

use common::Rgb;
use matrix_display::{HEIGHT, WIDTH};
use rand::Rng;

use crate::visual::RainIntensity;

/// Rows used by the animation; the bottom row holds the temperature bar.
pub const RAIN_ROWS: usize = HEIGHT - 1;
/// Lowest row a droplet can reach.
pub const MAX_POSITION: u8 = (RAIN_ROWS - 1) as u8;
/// Blue lost per simulation step by rows below the droplet.
pub const TRAIL_DECAY: u8 = 10;
pub const WET: u8 = 255;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RainColumn {
    pub position: u8,
    pub target: u8,
    /// -1, 0 or +1.
    pub direction: i8,
}

impl RainColumn {
    fn retarget(&mut self, target: u8) {
        self.target = target;
        self.direction = (target as i8 - self.position as i8).signum();
    }

    fn step(&mut self) {
        self.position = (self.position as i8 + self.direction) as u8;
    }
}

#[derive(Debug, Clone)]
pub struct RainField {
    intensity: RainIntensity,
    columns: [RainColumn; WIDTH],
    /// Blue level per cell, `[x][y]`.
    trails: [[u8; RAIN_ROWS]; WIDTH],
}

impl RainField {
    pub fn new(intensity: RainIntensity) -> Self {
        Self {
            intensity,
            columns: [RainColumn::default(); WIDTH],
            trails: [[0; RAIN_ROWS]; WIDTH],
        }
    }

    pub fn intensity(&self) -> RainIntensity {
        self.intensity
    }

    pub fn columns(&self) -> &[RainColumn; WIDTH] {
        &self.columns
    }

    pub fn blue_at(&self, x: usize, y: usize) -> u8 {
        self.trails[x][y]
    }

    /// Advance if `tick` lands on this intensity's stride. Returns whether
    /// the field changed.
    pub fn tick<R: Rng + ?Sized>(&mut self, tick: u64, rng: &mut R) -> bool {
        if tick % self.intensity.stride() != 0 {
            return false;
        }
        self.advance(rng);
        true
    }

    /// One simulation step over every column.
    pub fn advance<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        for (x, column) in self.columns.iter_mut().enumerate() {
            if column.position == column.target {
                column.retarget(rng.gen_range(0..=MAX_POSITION));
                continue;
            }

            column.step();
            for cell in &mut self.trails[x][..=column.position as usize] {
                *cell = WET;
            }
        }

        for (x, column) in self.columns.iter().enumerate() {
            for cell in &mut self.trails[x][column.position as usize + 1..] {
                *cell = cell.saturating_sub(TRAIL_DECAY);
            }
        }
    }

    /// Every animation cell as `(x, y, colour)`, column by column.
    pub fn pixels(&self) -> impl Iterator<Item = (usize, usize, Rgb)> + '_ {
        (0..WIDTH).flat_map(move |x| {
            (0..RAIN_ROWS).map(move |y| (x, y, Rgb::new(0, 0, self.trails[x][y])))
        })
    }
}
