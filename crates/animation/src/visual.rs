//! Visual state derivation: weather readings to render mode and
//! temperature bar.

use common::{Condition, Result, Rgb};
use tracing::info;
use weather_client::WeatherSource;

use crate::cache::WeatherCache;

/// Precipitation chance at or above which heavy rain is shown.
pub const HEAVY_RAIN_THRESHOLD: u8 = 80;
/// Precipitation chance at or above which light rain is shown.
pub const LIGHT_RAIN_THRESHOLD: u8 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RainIntensity {
    Light,
    Heavy,
}

impl RainIntensity {
    /// The rain simulation advances on every `stride`-th tick.
    pub fn stride(self) -> u64 {
        match self {
            RainIntensity::Light => 5,
            RainIntensity::Heavy => 2,
        }
    }
}

/// Animation family for one display session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    Rain(RainIntensity),
    Clouds,
    /// No animation defined for the condition; nothing is drawn.
    Idle,
}

/// Bottom-row temperature bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TempIndicator {
    pub color: Rgb,
    /// Lit columns, 1 to 8.
    pub bar_width: usize,
}

pub const WHITE: Rgb = Rgb::new(255, 255, 255);
pub const PURPLE: Rgb = Rgb::new(139, 0, 204);
pub const LIGHT_BLUE: Rgb = Rgb::new(0, 180, 235);
pub const BLUE: Rgb = Rgb::new(0, 57, 214);
pub const GREEN: Rgb = Rgb::new(0, 214, 50);
pub const YELLOW: Rgb = Rgb::new(255, 251, 5);
pub const ORANGE: Rgb = Rgb::new(255, 147, 5);
pub const RED: Rgb = Rgb::new(255, 5, 5);

/// Upper bounds (°F, inclusive) of the first seven bands; anything warmer
/// is red.
const TEMPERATURE_BANDS: [(i32, Rgb); 7] = [
    (5, WHITE),
    (20, PURPLE),
    (32, LIGHT_BLUE),
    (48, BLUE),
    (60, GREEN),
    (70, YELLOW),
    (85, ORANGE),
];

impl TempIndicator {
    pub fn for_temperature(temperature_f: i32) -> Self {
        let band = TEMPERATURE_BANDS
            .iter()
            .position(|(max, _)| temperature_f <= *max)
            .unwrap_or(TEMPERATURE_BANDS.len());
        let color = TEMPERATURE_BANDS.get(band).map_or(RED, |(_, c)| *c);

        Self {
            color,
            bar_width: band + 1,
        }
    }
}

/// Rain mode from precipitation chance alone, if it is high enough.
pub fn rain_for_precipitation(chance: u8) -> Option<RenderMode> {
    if chance >= HEAVY_RAIN_THRESHOLD {
        Some(RenderMode::Rain(RainIntensity::Heavy))
    } else if chance >= LIGHT_RAIN_THRESHOLD {
        Some(RenderMode::Rain(RainIntensity::Light))
    } else {
        None
    }
}

pub fn mode_for_condition(condition: Condition) -> RenderMode {
    match condition {
        Condition::Clouds => RenderMode::Clouds,
        _ => RenderMode::Idle,
    }
}

/// Mode and indicator chosen for a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisualState {
    pub mode: RenderMode,
    pub indicator: TempIndicator,
}

/// Derive the session's visual state from the cache.
///
/// The condition is only consulted when precipitation is below the rain
/// threshold. Any failed read aborts the derivation.
pub async fn derive<S: WeatherSource>(cache: &WeatherCache<S>) -> Result<VisualState> {
    let precipitation = cache.precipitation().await?;
    let mode = match rain_for_precipitation(precipitation) {
        Some(mode) => mode,
        None => mode_for_condition(cache.condition().await?),
    };

    let temperature = cache.temperature().await?;
    let indicator = TempIndicator::for_temperature(temperature);

    info!(
        "Visual state: mode={:?} (precip={}%), temp={}°F -> bar width {}",
        mode, precipitation, temperature, indicator.bar_width
    );

    Ok(VisualState { mode, indicator })
}
