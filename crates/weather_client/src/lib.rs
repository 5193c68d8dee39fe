//! Weather source abstraction and the Weather Underground client.
//!
//! The animation engine only depends on [`WeatherSource`]; concrete
//! providers are picked when the binary wires everything together.

pub mod wunderground;

use async_trait::async_trait;
use common::{Location, Result, WeatherReading};

pub use wunderground::{WundergroundClient, WUNDERGROUND_CREDENTIALS_KEY};

/// A provider of point weather readings.
#[async_trait]
pub trait WeatherSource: Send + Sync {
    /// Fetch precipitation chance, temperature and condition for `location`
    /// in one upstream query.
    async fn fetch_reading(&self, location: &Location) -> Result<WeatherReading>;
}

#[async_trait]
impl<T: WeatherSource + ?Sized> WeatherSource for std::sync::Arc<T> {
    async fn fetch_reading(&self, location: &Location) -> Result<WeatherReading> {
        (**self).fetch_reading(location).await
    }
}
