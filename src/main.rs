//! weather-matrix: animates the local forecast on an 8x8 RGB matrix.
//!
//! Single-binary Tokio application that:
//! 1. Loads config and the Weather Underground key
//! 2. Opens the configured display sink
//! 3. Runs display sessions against a shared weather cache
//! 4. Clears the matrix on exit

mod config;

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use animation::{run_weather_display, WeatherCache};
use common::config::{DisplayConfig, SinkKind};
use common::Error;
use matrix_display::{DisplaySink, EmulatorSink, TerminalSink};
use weather_client::{WeatherSource, WundergroundClient};

/// Weather animation for an 8x8 LED matrix
#[derive(Parser)]
#[command(name = "weather-matrix", about = "Weather animation for an 8x8 LED matrix")]
struct Cli {
    /// Config file (defaults to ./config.toml when present).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Credentials JSON holding the Weather Underground key.
    #[arg(long, default_value = config::DEFAULT_CREDENTIALS_PATH)]
    credentials: PathBuf,

    /// Length of each display session in seconds.
    #[arg(long)]
    seconds: Option<u64>,

    /// Number of sessions to run; 0 repeats until Ctrl+C.
    #[arg(long)]
    sessions: Option<u32>,

    /// Display backend: emulator or terminal.
    #[arg(long, value_parser = config::parse_sink_kind)]
    sink: Option<SinkKind>,
}

fn open_sink(cfg: &DisplayConfig) -> Box<dyn DisplaySink> {
    match cfg.sink.kind {
        SinkKind::Emulator => Box::new(EmulatorSink::new(
            cfg.sink.emulator_addr.clone(),
            Duration::from_secs(cfg.sink.handshake_timeout_secs),
        )),
        SinkKind::Terminal => Box::new(TerminalSink::stdout()),
    }
}

/// How the session slots of one run were spent.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct SessionTally {
    completed: u32,
    /// Slots where the weather lookup failed and nothing was drawn.
    skipped: u32,
}

impl SessionTally {
    fn slots(&self) -> u32 {
        self.completed + self.skipped
    }
}

async fn run_sessions<S: WeatherSource>(
    cfg: &DisplayConfig,
    cache: &WeatherCache<S>,
    sink: &mut dyn DisplaySink,
    cancel: &CancellationToken,
) -> Result<SessionTally, Error> {
    let limit = cfg.session.sessions;
    let duration = cfg.session.duration_secs;
    let mut tally = SessionTally::default();

    while limit == 0 || tally.slots() < limit {
        if cancel.is_cancelled() {
            break;
        }

        match run_weather_display(cache, &mut *sink, cfg, duration, cancel).await {
            Ok(summary) if summary.cancelled => break,
            Ok(_) => tally.completed += 1,
            Err(e) if e.is_sink_error() => return Err(e),
            Err(e) => {
                tally.skipped += 1;
                // Nothing was drawn; wait out the slot before asking the cache again.
                warn!("Session {} skipped: {}", tally.slots(), e);
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = sleep(Duration::from_secs(duration)) => {}
                }
            }
        }
    }

    info!(
        "{} session(s) completed, {} skipped",
        tally.completed, tally.skipped
    );
    Ok(tally)
}

#[tokio::main]
async fn main() {
    // Initialize logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "weather_matrix=info,animation=info,weather_client=info,matrix_display=info".into()
            }),
        )
        .with_target(true)
        .init();

    let cli = Cli::parse();

    info!("🌦️  weather-matrix starting up...");

    // Load configuration.
    let mut cfg = match config::load_config(cli.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            error!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };
    if let Some(seconds) = cli.seconds {
        cfg.session.duration_secs = seconds;
    }
    if let Some(sessions) = cli.sessions {
        cfg.session.sessions = sessions;
    }
    if let Some(kind) = cli.sink {
        cfg.sink.kind = kind;
    }
    if let Err(e) = config::validate_config(&cfg) {
        error!("Configuration error: {}", e);
        std::process::exit(1);
    }
    if let Err(e) = config::resolve_api_key(&mut cfg, &cli.credentials) {
        error!("{}", e);
        std::process::exit(1);
    }

    info!("Location: {}", cfg.location);
    info!(
        "Sessions: {} x {}s, cache refresh every {}s, brightness {:.2}",
        if cfg.session.sessions == 0 {
            "unlimited".to_string()
        } else {
            cfg.session.sessions.to_string()
        },
        cfg.session.duration_secs,
        cfg.weather_cache.refresh_rate,
        cfg.brightness,
    );
    info!("Sink: {:?}", cfg.sink.kind);

    let client = match WundergroundClient::new(cfg.api_key.clone(), &cfg.weather_api) {
        Ok(c) => c,
        Err(e) => {
            error!("Weather client error: {}", e);
            std::process::exit(1);
        }
    };
    let cache = WeatherCache::from_config(client, &cfg);

    let mut sink = open_sink(&cfg);
    if let Err(e) = sink.init().await {
        error!("Display unavailable: {}", e);
        std::process::exit(1);
    }

    let cancel = CancellationToken::new();
    let signal_token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Shutdown signal received");
            signal_token.cancel();
        }
    });

    info!("🚀 weather-matrix is running. Press Ctrl+C to stop.");
    let outcome = run_sessions(&cfg, &cache, sink.as_mut(), &cancel).await;

    if let Err(e) = sink.shutdown().await {
        warn!("Display shutdown failed: {}", e);
    }

    match outcome {
        Ok(_) => info!("👋 weather-matrix stopped."),
        Err(e) => {
            error!("Display session failed: {}", e);
            std::process::exit(1);
        }
    }
}
