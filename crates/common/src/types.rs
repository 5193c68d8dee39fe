//! Domain types shared across the workspace.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ── Location ──────────────────────────────────────────────────────────

/// A place within the United States, identified the way the weather
/// provider's hourly endpoint expects it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Location {
    /// Two-letter state code, e.g. "PA".
    pub state: String,
    /// City name with underscores for spaces, e.g. "San_Francisco".
    pub city: String,
}

impl Location {
    pub fn new(state: impl Into<String>, city: impl Into<String>) -> Self {
        Self {
            state: state.into(),
            city: city.into(),
        }
    }
}

impl Default for Location {
    fn default() -> Self {
        Self::new("NY", "Binghamton")
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.state, self.city)
    }
}

// ── Weather Types ─────────────────────────────────────────────────────

/// Coarse weather condition reported by the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Condition {
    LightRain,
    HeavyRain,
    Snow,
    Clouds,
    Sun,
}

/// One point observation for a location.
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherReading {
    /// Chance of precipitation, 0-100.
    pub precipitation_chance: u8,
    /// Temperature in °F.
    pub temperature_f: i32,
    pub condition: Condition,
    /// When this reading was fetched.
    pub fetched_at: DateTime<Utc>,
}

// ── Colour ────────────────────────────────────────────────────────────

/// 8-bit RGB triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub const fn gray(level: u8) -> Self {
        Self::new(level, level, level)
    }

    /// Scale every channel by `factor` (clamped to 0..=1).
    pub fn scaled(self, factor: f32) -> Self {
        let f = factor.clamp(0.0, 1.0);
        let scale = |c: u8| (c as f32 * f).round() as u8;
        Self::new(scale(self.r), scale(self.g), scale(self.b))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_display() {
        let loc = Location::new("CA", "San_Francisco");
        assert_eq!(loc.to_string(), "CA/San_Francisco");
    }

    #[test]
    fn test_rgb_scaled_clamps() {
        let c = Rgb::new(200, 100, 0);
        assert_eq!(c.scaled(0.5), Rgb::new(100, 50, 0));
        assert_eq!(c.scaled(2.0), c);
        assert_eq!(c.scaled(-1.0), Rgb::BLACK);
    }

    #[test]
    fn test_condition_serde_snake_case() {
        let json = serde_json::to_string(&Condition::HeavyRain).expect("serialize");
        assert_eq!(json, "\"heavy_rain\"");
    }
}
