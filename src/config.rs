//! Configuration loader: merges the .env file, config.toml and env vars,
//! then resolves the weather API key.

use std::collections::HashMap;
use std::path::Path;

use common::config::{DisplayConfig, SinkKind};
use common::Error;
use weather_client::WUNDERGROUND_CREDENTIALS_KEY;

pub const DEFAULT_CONFIG_PATH: &str = "config.toml";
pub const DEFAULT_CREDENTIALS_PATH: &str = "/opt/weather-matrix/credentials.json";
const API_KEY_ENV: &str = "WUNDERGROUND_API_KEY";

pub fn parse_sink_kind(raw: &str) -> Result<SinkKind, Error> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "emulator" => Ok(SinkKind::Emulator),
        "terminal" => Ok(SinkKind::Terminal),
        _ => Err(Error::Config("sink must be one of: emulator, terminal".into())),
    }
}

fn parse_positive_u64(raw: &str, env_name: &str) -> Result<u64, Error> {
    match raw.trim().parse::<u64>() {
        Ok(v) if v > 0 => Ok(v),
        _ => Err(Error::Config(format!("{env_name} must be an integer > 0"))),
    }
}

fn parse_unit_f32(raw: &str, env_name: &str) -> Result<f32, Error> {
    match raw.trim().parse::<f32>() {
        Ok(v) if (0.0..=1.0).contains(&v) => Ok(v),
        _ => Err(Error::Config(format!("{env_name} must be a number in [0,1]"))),
    }
}

pub fn validate_config(config: &DisplayConfig) -> Result<(), Error> {
    let mut issues: Vec<String> = Vec::new();

    if !(0.0..=1.0).contains(&config.brightness) {
        issues.push("brightness must be in [0,1]".into());
    }
    if config.weather_cache.refresh_rate == 0 {
        issues.push("weather_cache.refresh_rate must be > 0".into());
    }
    if config.location.state.trim().is_empty() {
        issues.push("location.state must not be empty".into());
    }
    if config.location.city.trim().is_empty() {
        issues.push("location.city must not be empty".into());
    }
    if config.session.duration_secs == 0 {
        issues.push("session.duration_secs must be > 0".into());
    }
    if config.sink.kind == SinkKind::Emulator && config.sink.emulator_addr.trim().is_empty() {
        issues.push("sink.emulator_addr is required for the emulator sink".into());
    }
    if config.sink.handshake_timeout_secs == 0 {
        issues.push("sink.handshake_timeout_secs must be > 0".into());
    }
    if config.weather_api.base_url.trim().is_empty() {
        issues.push("weather_api.base_url must not be empty".into());
    }
    if config.weather_api.requests_per_minute == 0 {
        issues.push("weather_api.requests_per_minute must be > 0".into());
    }

    if issues.is_empty() {
        Ok(())
    } else {
        Err(Error::Config(format!(
            "Invalid config:\n - {}",
            issues.join("\n - ")
        )))
    }
}

/// Apply environment overrides, reading variables through `var`.
fn apply_env_overrides<F>(config: &mut DisplayConfig, var: F) -> Result<(), Error>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(raw) = var("MATRIX_BRIGHTNESS") {
        config.brightness = parse_unit_f32(&raw, "MATRIX_BRIGHTNESS")?;
    }
    if let Some(raw) = var("WEATHER_CACHE_REFRESH_SECS") {
        config.weather_cache.refresh_rate = parse_positive_u64(&raw, "WEATHER_CACHE_REFRESH_SECS")?;
    }
    if let Some(state) = var("WEATHER_STATE") {
        config.location.state = state.trim().to_string();
    }
    if let Some(city) = var("WEATHER_CITY") {
        config.location.city = city.trim().to_string();
    }
    if let Some(raw) = var("MATRIX_SINK") {
        config.sink.kind = parse_sink_kind(&raw)?;
    }
    if let Some(addr) = var("MATRIX_EMULATOR_ADDR") {
        config.sink.emulator_addr = addr.trim().to_string();
    }
    Ok(())
}

/// Load display configuration from environment and an optional config file.
///
/// An explicitly named file must exist; the default `config.toml` is
/// optional.
pub fn load_config(path: Option<&Path>) -> Result<DisplayConfig, Error> {
    // 1. Load .env file from project root or parent directories.
    if let Err(e) = dotenvy::dotenv() {
        tracing::debug!("No .env file loaded: {}", e);
    }

    // 2. Start with defaults.
    let mut config = DisplayConfig::default();

    // 3. Config file.
    let config_path = path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_PATH));
    if config_path.exists() {
        let contents = std::fs::read_to_string(config_path).map_err(|e| {
            Error::Config(format!("Failed to read {}: {}", config_path.display(), e))
        })?;
        config = toml::from_str(&contents).map_err(|e| {
            Error::Config(format!("Failed to parse {}: {}", config_path.display(), e))
        })?;
    } else if path.is_some() {
        return Err(Error::Config(format!(
            "Config file {} not found",
            config_path.display()
        )));
    }

    // 4. Environment variables (highest priority).
    apply_env_overrides(&mut config, |name| std::env::var(name).ok())?;

    validate_config(&config)?;

    Ok(config)
}

/// Read the `string -> string` credentials JSON file.
pub fn load_credentials(path: &Path) -> Result<HashMap<String, String>, Error> {
    let contents = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&contents)?)
}

fn api_key_from(env_key: Option<String>, credentials: Option<&HashMap<String, String>>) -> Option<String> {
    env_key
        .or_else(|| credentials.and_then(|c| c.get(WUNDERGROUND_CREDENTIALS_KEY).cloned()))
        .map(|k| k.trim().to_string())
        .filter(|k| !k.is_empty())
}

/// Fill `config.api_key` from `WUNDERGROUND_API_KEY`, falling back to the
/// credentials file.
pub fn resolve_api_key(config: &mut DisplayConfig, credentials_path: &Path) -> Result<(), Error> {
    let env_key = std::env::var(API_KEY_ENV).ok();
    let credentials = if env_key.is_none() {
        match load_credentials(credentials_path) {
            Ok(c) => Some(c),
            Err(e) => {
                tracing::debug!(
                    "No credentials read from {}: {}",
                    credentials_path.display(),
                    e
                );
                None
            }
        }
    } else {
        None
    };

    config.api_key = api_key_from(env_key, credentials.as_ref()).ok_or_else(|| {
        Error::MissingCredential(format!(
            "{} is not set and {} has no '{}' entry",
            API_KEY_ENV,
            credentials_path.display(),
            WUNDERGROUND_CREDENTIALS_KEY
        ))
    })?;
    Ok(())
}
