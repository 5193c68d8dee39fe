//! Time-windowed cache in front of the weather source.
//!
//! One entry per metric family. A single upstream fetch refreshes all
//! three families, and the lock is held across that fetch so at most one
//! refresh is in flight per expiry window.

use std::time::Duration;

use common::{Condition, DisplayConfig, Error, Location, Result, WeatherReading};
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, info, warn};
use weather_client::WeatherSource;

/// Metric families served by the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Metric {
    Precipitation,
    Temperature,
    Condition,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricValue {
    /// Chance of precipitation, 0-100.
    Precipitation(u8),
    /// Temperature in °F.
    Temperature(i32),
    Condition(Condition),
}

#[derive(Debug, Clone, Copy)]
struct CacheEntry<T> {
    value: T,
    expires_at: Instant,
}

impl<T: Copy> CacheEntry<T> {
    fn fresh(&self, now: Instant) -> Option<T> {
        (now < self.expires_at).then_some(self.value)
    }
}

#[derive(Debug, Default)]
struct Entries {
    precipitation: Option<CacheEntry<u8>>,
    temperature: Option<CacheEntry<i32>>,
    condition: Option<CacheEntry<Condition>>,
}

impl Entries {
    fn store(&mut self, reading: &WeatherReading, expires_at: Instant) {
        self.precipitation = Some(CacheEntry {
            value: reading.precipitation_chance,
            expires_at,
        });
        self.temperature = Some(CacheEntry {
            value: reading.temperature_f,
            expires_at,
        });
        self.condition = Some(CacheEntry {
            value: reading.condition,
            expires_at,
        });
    }

    fn lookup(&self, metric: Metric) -> Option<(MetricValue, Instant)> {
        match metric {
            Metric::Precipitation => self
                .precipitation
                .map(|e| (MetricValue::Precipitation(e.value), e.expires_at)),
            Metric::Temperature => self
                .temperature
                .map(|e| (MetricValue::Temperature(e.value), e.expires_at)),
            Metric::Condition => self
                .condition
                .map(|e| (MetricValue::Condition(e.value), e.expires_at)),
        }
    }
}

/// Weather cache for one location.
pub struct WeatherCache<S> {
    source: S,
    location: Location,
    refresh_interval: Duration,
    entries: Mutex<Entries>,
}

impl<S: WeatherSource> WeatherCache<S> {
    pub fn new(source: S, location: Location, refresh_interval: Duration) -> Self {
        Self {
            source,
            location,
            refresh_interval,
            entries: Mutex::new(Entries::default()),
        }
    }

    pub fn from_config(source: S, config: &DisplayConfig) -> Self {
        Self::new(
            source,
            config.location.clone(),
            Duration::from_secs(config.weather_cache.refresh_rate),
        )
    }

    pub fn location(&self) -> &Location {
        &self.location
    }

    pub fn refresh_interval(&self) -> Duration {
        self.refresh_interval
    }

    /// Read a metric, refreshing every family from the source if the entry
    /// is missing or expired.
    pub async fn get(&self, metric: Metric) -> Result<MetricValue> {
        let mut entries = self.entries.lock().await;
        let now = Instant::now();

        if let Some((value, expires_at)) = entries.lookup(metric) {
            if now < expires_at {
                debug!("Cache hit for {:?}: {:?}", metric, value);
                return Ok(value);
            }
        }

        info!("Refreshing weather cache for {} ({:?} expired)", self.location, metric);
        let reading = match self.source.fetch_reading(&self.location).await {
            Ok(r) => r,
            Err(e) => {
                // Expiry stays as it was: the next read retries straight away.
                warn!("Weather refresh failed for {}: {}", self.location, e);
                return Err(e);
            }
        };

        // The window starts when the refresh was issued, not when it returned.
        entries.store(&reading, now + self.refresh_interval);
        info!(
            "Weather cache refreshed: precip={}% temp={}°F condition={:?}, next refresh in {:?}",
            reading.precipitation_chance,
            reading.temperature_f,
            reading.condition,
            self.refresh_interval
        );

        entries
            .lookup(metric)
            .map(|(value, _)| value)
            .ok_or_else(|| Error::SourceUnavailable(format!("no cached {metric:?} after refresh")))
    }

    pub async fn precipitation(&self) -> Result<u8> {
        match self.get(Metric::Precipitation).await? {
            MetricValue::Precipitation(v) => Ok(v),
            other => Err(mismatch(Metric::Precipitation, other)),
        }
    }

    pub async fn temperature(&self) -> Result<i32> {
        match self.get(Metric::Temperature).await? {
            MetricValue::Temperature(v) => Ok(v),
            other => Err(mismatch(Metric::Temperature, other)),
        }
    }

    pub async fn condition(&self) -> Result<Condition> {
        match self.get(Metric::Condition).await? {
            MetricValue::Condition(v) => Ok(v),
            other => Err(mismatch(Metric::Condition, other)),
        }
    }

    /// Last stored value, fresh or stale, without contacting the source.
    pub async fn peek(&self, metric: Metric) -> Option<MetricValue> {
        self.entries.lock().await.lookup(metric).map(|(value, _)| value)
    }

    /// Whether a read of `metric` right now would be served from the cache.
    pub async fn is_fresh(&self, metric: Metric) -> bool {
        let entries = self.entries.lock().await;
        let now = Instant::now();
        match metric {
            Metric::Precipitation => entries.precipitation.and_then(|e| e.fresh(now)).is_some(),
            Metric::Temperature => entries.temperature.and_then(|e| e.fresh(now)).is_some(),
            Metric::Condition => entries.condition.and_then(|e| e.fresh(now)).is_some(),
        }
    }
}

fn mismatch(metric: Metric, value: MetricValue) -> Error {
    Error::SourceUnavailable(format!("cache returned {value:?} for {metric:?}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{reading, ScriptedSource};
    use std::sync::Arc;
    use tokio::time::advance;

    fn cache_with(source: Arc<ScriptedSource>, secs: u64) -> WeatherCache<Arc<ScriptedSource>> {
        WeatherCache::new(source, Location::default(), Duration::from_secs(secs))
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_read_always_queries() {
        let source = Arc::new(ScriptedSource::returning(reading(30, 55, Condition::Sun)));
        let cache = cache_with(source.clone(), 3600);

        assert!(!cache.is_fresh(Metric::Condition).await);
        assert_eq!(cache.condition().await.expect("condition"), Condition::Sun);
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_one_fetch_fills_every_family() {
        let source = Arc::new(ScriptedSource::returning(reading(30, 55, Condition::Clouds)));
        let cache = cache_with(source.clone(), 3600);

        assert_eq!(cache.precipitation().await.expect("precip"), 30);
        assert_eq!(cache.temperature().await.expect("temp"), 55);
        assert_eq!(cache.condition().await.expect("condition"), Condition::Clouds);
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_window() {
        let source = Arc::new(ScriptedSource::returning(reading(40, 60, Condition::Clouds)));
        let cache = cache_with(source.clone(), 60);

        let first = cache.temperature().await.expect("first read");
        advance(Duration::from_secs(30)).await;
        let second = cache.temperature().await.expect("second read");
        assert_eq!(first, second);
        assert_eq!(source.calls(), 1);

        source.push_ok(reading(40, 62, Condition::Clouds));
        advance(Duration::from_secs(31)).await;
        assert_eq!(cache.temperature().await.expect("third read"), 62);
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_read_at_expiry_is_a_miss() {
        let source = Arc::new(ScriptedSource::returning(reading(40, 60, Condition::Clouds)));
        let cache = cache_with(source.clone(), 60);

        cache.precipitation().await.expect("first read");
        advance(Duration::from_secs(59)).await;
        cache.precipitation().await.expect("hit");
        assert_eq!(source.calls(), 1);

        advance(Duration::from_secs(1)).await;
        cache.precipitation().await.expect("miss");
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_keeps_stale_value_and_retries_immediately() {
        let source = Arc::new(ScriptedSource::returning(reading(20, 48, Condition::Clouds)));
        let cache = cache_with(source.clone(), 60);
        cache.temperature().await.expect("initial read");

        advance(Duration::from_secs(61)).await;
        source.push_err("provider down");
        let err = cache.temperature().await.unwrap_err();
        assert!(matches!(err, Error::SourceUnavailable(_)));
        assert_eq!(cache.peek(Metric::Temperature).await, Some(MetricValue::Temperature(48)));
        assert!(!cache.is_fresh(Metric::Temperature).await);

        source.push_ok(reading(20, 50, Condition::Clouds));
        assert_eq!(cache.temperature().await.expect("retry"), 50);
        assert_eq!(source.calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_read_failure_surfaces_error() {
        let source = Arc::new(ScriptedSource::default());
        source.push_err("no network");
        let cache = cache_with(source.clone(), 60);

        assert!(cache.precipitation().await.is_err());
        assert_eq!(cache.peek(Metric::Precipitation).await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_misses_share_one_fetch() {
        let source = Arc::new(
            ScriptedSource::returning(reading(70, 80, Condition::LightRain))
                .with_delay(Duration::from_secs(2)),
        );
        let cache = cache_with(source.clone(), 3600);

        let (a, b, c) = tokio::join!(
            cache.precipitation(),
            cache.temperature(),
            cache.condition()
        );
        assert_eq!(a.expect("precip"), 70);
        assert_eq!(b.expect("temp"), 80);
        assert_eq!(c.expect("condition"), Condition::LightRain);
        assert_eq!(source.calls(), 1);
    }
}
