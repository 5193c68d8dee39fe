//! Display configuration types.

use serde::{Deserialize, Serialize};

use crate::types::Location;

/// Top-level configuration.
///
/// Every field has a serde default, so a config file only needs to name
/// the values it overrides.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// Display brightness, 0.0 to 1.0.
    #[serde(default = "default_brightness")]
    pub brightness: f32,

    /// Weather cache settings.
    #[serde(default)]
    pub weather_cache: WeatherCacheConfig,

    /// Location used for weather queries.
    #[serde(default)]
    pub location: Location,

    /// Display session settings.
    #[serde(default)]
    pub session: SessionConfig,

    /// Display backend selection.
    #[serde(default)]
    pub sink: SinkConfig,

    /// Weather provider endpoint settings.
    #[serde(default)]
    pub weather_api: WeatherApiConfig,

    /// Weather Underground API key. Never read from the config file.
    #[serde(skip)]
    pub api_key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherCacheConfig {
    /// Seconds between weather cache refreshes.
    #[serde(default = "default_refresh_rate")]
    pub refresh_rate: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Length of one display session in seconds.
    #[serde(default = "default_duration")]
    pub duration_secs: u64,

    /// Number of back-to-back sessions; 0 repeats until interrupted.
    #[serde(default = "default_sessions")]
    pub sessions: u32,

    /// What to do when an animation pixel write fails.
    #[serde(default)]
    pub write_failures: WriteFailurePolicy,
}

/// Handling of pixel-write failures inside the rain and cloud renderers.
///
/// Temperature bar writes and presents always end the session on failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteFailurePolicy {
    /// End the session with `SinkWriteFailure`.
    #[default]
    Abort,
    /// Log a warning and keep rendering.
    Log,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SinkKind {
    /// Network emulator reached over UDP.
    #[default]
    Emulator,
    /// ANSI colour blocks on stdout.
    Terminal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SinkConfig {
    #[serde(default)]
    pub kind: SinkKind,

    /// Address the emulator listens on.
    #[serde(default = "default_emulator_addr")]
    pub emulator_addr: String,

    /// Seconds to wait for the emulator's handshake reply.
    #[serde(default = "default_handshake_timeout")]
    pub handshake_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Provider quota; requests beyond it wait for a free slot.
    #[serde(default = "default_requests_per_minute")]
    pub requests_per_minute: u32,
}

// ── Defaults ──────────────────────────────────────────────────────────

fn default_brightness() -> f32 {
    0.5
}

fn default_refresh_rate() -> u64 {
    3600
}

fn default_duration() -> u64 {
    20
}
fn default_sessions() -> u32 {
    1
}

fn default_emulator_addr() -> String {
    "127.0.0.1:5005".into()
}
fn default_handshake_timeout() -> u64 {
    10
}

fn default_base_url() -> String {
    "http://api.wunderground.com/api".into()
}
fn default_requests_per_minute() -> u32 {
    10
}

impl Default for WeatherCacheConfig {
    fn default() -> Self {
        Self {
            refresh_rate: default_refresh_rate(),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            duration_secs: default_duration(),
            sessions: default_sessions(),
            write_failures: WriteFailurePolicy::default(),
        }
    }
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            kind: SinkKind::default(),
            emulator_addr: default_emulator_addr(),
            handshake_timeout_secs: default_handshake_timeout(),
        }
    }
}

impl Default for WeatherApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            requests_per_minute: default_requests_per_minute(),
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            brightness: default_brightness(),
            weather_cache: WeatherCacheConfig::default(),
            location: Location::default(),
            session: SessionConfig::default(),
            sink: SinkConfig::default(),
            weather_api: WeatherApiConfig::default(),
            api_key: String::new(),
        }
    }
}
