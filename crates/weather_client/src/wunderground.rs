//! Weather Underground hourly forecast client.
//!
//! Reads the first row of `/api/{key}/hourly/q/{state}/{city}.json`. The
//! provider is quota-limited, so every request also passes through a
//! `governor` limiter sized from the configured requests per minute.

use std::collections::HashMap;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use common::config::WeatherApiConfig;
use common::{Condition, Error, Location, Result, WeatherReading};
use governor::{clock::DefaultClock, state::InMemoryState, state::NotKeyed, Quota, RateLimiter};
use serde::Deserialize;
use tracing::{debug, info};

use crate::WeatherSource;

/// Key under which the API key is stored in the credentials file.
pub const WUNDERGROUND_CREDENTIALS_KEY: &str = "WEATHER_PROVIDER_WUNDERGROUND_KEY";

type DirectLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Weather Underground API client.
#[derive(Debug, Clone)]
pub struct WundergroundClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    limiter: Arc<DirectLimiter>,
}

// ── Response types ────────────────────────────────────────────────────

/// Response from the hourly endpoint.
#[derive(Debug, Deserialize)]
pub struct HourlyResponse {
    #[serde(default)]
    pub hourly_forecast: Vec<HourlyRow>,
}

/// One forecast hour. Numeric fields arrive as strings.
#[derive(Debug, Deserialize)]
pub struct HourlyRow {
    pub temp: Measure,
    pub pop: String,
    #[serde(default)]
    pub fctcode: Option<String>,
    #[serde(default)]
    pub condition: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Measure {
    pub english: String,
}

// ── Implementation ────────────────────────────────────────────────────

impl WundergroundClient {
    pub fn new(api_key: String, api: &WeatherApiConfig) -> Result<Self> {
        if api_key.trim().is_empty() {
            return Err(Error::MissingCredential(format!(
                "Weather Underground API key is empty (set WUNDERGROUND_API_KEY or '{}')",
                WUNDERGROUND_CREDENTIALS_KEY
            )));
        }

        let per_minute = NonZeroU32::new(api.requests_per_minute).ok_or_else(|| {
            Error::Config("weather_api.requests_per_minute must be > 0".into())
        })?;

        let client = reqwest::Client::builder()
            .user_agent("weather-matrix/0.1")
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| Error::SourceUnavailable(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key,
            base_url: api.base_url.trim_end_matches('/').to_string(),
            limiter: Arc::new(RateLimiter::direct(Quota::per_minute(per_minute))),
        })
    }

    /// Build a client from a credentials map, as loaded from the
    /// credentials JSON file.
    pub fn from_credentials(
        credentials: &HashMap<String, String>,
        api: &WeatherApiConfig,
    ) -> Result<Self> {
        let key = credentials.get(WUNDERGROUND_CREDENTIALS_KEY).ok_or_else(|| {
            Error::MissingCredential(format!(
                "unable to find Weather Underground API key within credentials (must have key '{}')",
                WUNDERGROUND_CREDENTIALS_KEY
            ))
        })?;
        Self::new(key.clone(), api)
    }

    fn endpoint(&self, location: &Location) -> String {
        format!(
            "{}/{}/hourly/q/{}/{}.json",
            self.base_url, self.api_key, location.state, location.city
        )
    }

    /// Fetch the raw hourly forecast for a location.
    pub async fn fetch_hourly(&self, location: &Location) -> Result<HourlyResponse> {
        self.limiter.until_ready().await;

        debug!("Fetching Weather Underground hourly forecast for {}", location);

        let resp = self
            .client
            .get(self.endpoint(location))
            .send()
            .await
            .map_err(|e| {
                // reqwest errors embed the URL, which carries the key.
                Error::SourceUnavailable(format!(
                    "HTTP error for {}: {}",
                    location,
                    e.without_url()
                ))
            })?;

        let status = resp.status().as_u16();
        if status != 200 {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::SourceUnavailable(format!(
                "Weather Underground returned {} for {}: {}",
                status,
                location,
                truncate(&body, 500)
            )));
        }

        resp.json()
            .await
            .map_err(|e| Error::SourceUnavailable(format!("JSON parse error for {location}: {e}")))
    }
}

#[async_trait]
impl WeatherSource for WundergroundClient {
    async fn fetch_reading(&self, location: &Location) -> Result<WeatherReading> {
        let hourly = self.fetch_hourly(location).await?;
        let reading = reading_from_response(location, &hourly)?;

        info!(
            "Weather for {}: precip={}% temp={}°F condition={:?}",
            location, reading.precipitation_chance, reading.temperature_f, reading.condition
        );

        Ok(reading)
    }
}

fn truncate(body: &str, max: usize) -> &str {
    let mut end = body.len().min(max);
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    &body[..end]
}

/// Map a Weather Underground forecast code to a [`Condition`].
///
/// Missing or unknown codes map to `Clouds`.
pub fn condition_from_fctcode(code: Option<&str>) -> Condition {
    match code.and_then(|c| c.trim().parse::<u8>().ok()) {
        Some(1 | 5 | 7 | 8) => Condition::Sun,
        Some(2 | 3 | 4 | 6) => Condition::Clouds,
        Some(10 | 12 | 14) => Condition::LightRain,
        Some(11 | 13 | 15) => Condition::HeavyRain,
        Some(9 | 16 | 18..=24) => Condition::Snow,
        _ => Condition::Clouds,
    }
}

/// Turn the first forecast hour into a [`WeatherReading`].
pub fn reading_from_response(location: &Location, hourly: &HourlyResponse) -> Result<WeatherReading> {
    let first = hourly.hourly_forecast.first().ok_or_else(|| {
        Error::SourceUnavailable(format!("No hourly forecast rows for {location}"))
    })?;

    let pop = first.pop.trim().parse::<i64>().map_err(|_| {
        Error::SourceUnavailable(format!(
            "Invalid precipitation chance {:?} for {}",
            first.pop, location
        ))
    })?;

    let temperature_f = first.temp.english.trim().parse::<i32>().map_err(|_| {
        Error::SourceUnavailable(format!(
            "Invalid temperature {:?} for {}",
            first.temp.english, location
        ))
    })?;

    let condition = condition_from_fctcode(first.fctcode.as_deref());
    debug!(
        "{}: fctcode={:?} ({:?}) -> {:?}",
        location, first.fctcode, first.condition, condition
    );

    Ok(WeatherReading {
        precipitation_chance: pop.clamp(0, 100) as u8,
        temperature_f,
        condition,
        fetched_at: Utc::now(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_response() -> &'static str {
        r#"{
            "response": {"version": "0.1"},
            "hourly_forecast": [
                {
                    "FCTTIME": {"hour": "14"},
                    "temp": {"english": "75", "metric": "24"},
                    "condition": "Chance of Rain",
                    "fctcode": "12",
                    "pop": "85"
                },
                {
                    "FCTTIME": {"hour": "15"},
                    "temp": {"english": "73", "metric": "23"},
                    "condition": "Rain",
                    "fctcode": "13",
                    "pop": "90"
                }
            ]
        }"#
    }

    fn api() -> WeatherApiConfig {
        WeatherApiConfig::default()
    }

    #[test]
    fn test_reading_uses_first_hour() {
        let parsed: HourlyResponse =
            serde_json::from_str(sample_response()).expect("response should deserialize");
        let reading =
            reading_from_response(&Location::default(), &parsed).expect("reading should build");

        assert_eq!(reading.precipitation_chance, 85);
        assert_eq!(reading.temperature_f, 75);
        assert_eq!(reading.condition, Condition::LightRain);
    }

    #[test]
    fn test_empty_forecast_is_source_unavailable() {
        let parsed: HourlyResponse =
            serde_json::from_str(r#"{"hourly_forecast": []}"#).expect("should deserialize");
        let err = reading_from_response(&Location::default(), &parsed).unwrap_err();
        assert!(matches!(err, Error::SourceUnavailable(_)));
    }

    #[test]
    fn test_non_numeric_pop_is_source_unavailable() {
        let raw = r#"{"hourly_forecast": [{"temp": {"english": "40"}, "pop": "n/a"}]}"#;
        let parsed: HourlyResponse = serde_json::from_str(raw).expect("should deserialize");
        let err = reading_from_response(&Location::default(), &parsed).unwrap_err();
        assert!(matches!(err, Error::SourceUnavailable(_)));
    }

    #[test]
    fn test_negative_temperature_and_clamped_pop() {
        let raw = r#"{"hourly_forecast": [{"temp": {"english": "-7"}, "pop": "140"}]}"#;
        let parsed: HourlyResponse = serde_json::from_str(raw).expect("should deserialize");
        let reading = reading_from_response(&Location::default(), &parsed).expect("reading");
        assert_eq!(reading.temperature_f, -7);
        assert_eq!(reading.precipitation_chance, 100);
        assert_eq!(reading.condition, Condition::Clouds);
    }

    #[test]
    fn test_fctcode_mapping() {
        assert_eq!(condition_from_fctcode(Some("1")), Condition::Sun);
        assert_eq!(condition_from_fctcode(Some("4")), Condition::Clouds);
        assert_eq!(condition_from_fctcode(Some("6")), Condition::Clouds);
        assert_eq!(condition_from_fctcode(Some("10")), Condition::LightRain);
        assert_eq!(condition_from_fctcode(Some("15")), Condition::HeavyRain);
        assert_eq!(condition_from_fctcode(Some("21")), Condition::Snow);
        assert_eq!(condition_from_fctcode(Some("99")), Condition::Clouds);
        assert_eq!(condition_from_fctcode(None), Condition::Clouds);
    }

    #[test]
    fn test_missing_credential() {
        let err = WundergroundClient::from_credentials(&HashMap::new(), &api()).unwrap_err();
        assert!(matches!(err, Error::MissingCredential(_)));

        let err = WundergroundClient::new("  ".into(), &api()).unwrap_err();
        assert!(matches!(err, Error::MissingCredential(_)));
    }

    #[test]
    fn test_zero_quota_rejected() {
        let api = WeatherApiConfig {
            requests_per_minute: 0,
            ..WeatherApiConfig::default()
        };
        let err = WundergroundClient::new("key".into(), &api).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_endpoint_format() {
        let api = WeatherApiConfig {
            base_url: "http://localhost:9000/api/".into(),
            ..WeatherApiConfig::default()
        };
        let client = WundergroundClient::new("abc123".into(), &api).expect("client");
        let url = client.endpoint(&Location::new("CA", "San_Francisco"));
        assert_eq!(url, "http://localhost:9000/api/abc123/hourly/q/CA/San_Francisco.json");
    }

    #[tokio::test]
    async fn test_unreachable_provider_is_source_unavailable() {
        let api = WeatherApiConfig {
            base_url: "http://127.0.0.1:1/api".into(),
            ..WeatherApiConfig::default()
        };
        let client = WundergroundClient::new("abc123".into(), &api).expect("client");
        let err = client.fetch_reading(&Location::default()).await.unwrap_err();
        assert!(matches!(err, Error::SourceUnavailable(_)));
        assert!(!err.to_string().contains("abc123"));
    }
}
