//! Weather-driven animation engine.
//!
//! Caches readings from a [`weather_client::WeatherSource`], derives the
//! render mode and temperature bar for a session, and drives a
//! [`matrix_display::DisplaySink`] at a fixed tick rate.

pub mod cache;
pub mod clouds;
pub mod engine;
pub mod rain;
pub mod session;
pub mod visual;

#[cfg(test)]
pub(crate) mod testing;

pub use cache::{Metric, MetricValue, WeatherCache};
pub use engine::{AnimationEngine, SessionSummary, TICK_INTERVAL, TICK_RATE};
pub use session::{run_weather_display, DisplaySession, SessionPhase};
pub use visual::{derive, RainIntensity, RenderMode, TempIndicator, VisualState};
