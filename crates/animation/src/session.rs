//! Display session lifecycle: `Created -> Initialized -> Running -> Finished`.

use common::{DisplayConfig, Error, Result};
use matrix_display::DisplaySink;
use rand::Rng;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use weather_client::WeatherSource;

use crate::cache::WeatherCache;
use crate::engine::{AnimationEngine, SessionSummary};
use crate::visual::{self, VisualState};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Created,
    /// Visual state derived; ready to run.
    Initialized,
    Running,
    /// Terminal.
    Finished,
}

/// One display session. Its visual state is fixed at initialization and
/// discarded with the session.
#[derive(Debug)]
pub struct DisplaySession {
    phase: SessionPhase,
    visual: Option<VisualState>,
}

impl Default for DisplaySession {
    fn default() -> Self {
        Self::new()
    }
}

impl DisplaySession {
    pub fn new() -> Self {
        Self {
            phase: SessionPhase::Created,
            visual: None,
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn visual(&self) -> Option<&VisualState> {
        self.visual.as_ref()
    }

    /// Derive the visual state. On failure the session stays `Created`.
    pub async fn initialize<S: WeatherSource>(&mut self, cache: &WeatherCache<S>) -> Result<()> {
        if self.phase != SessionPhase::Created {
            return Err(Error::Session(format!("cannot initialize a {:?} session", self.phase)));
        }
        self.visual = Some(visual::derive(cache).await?);
        self.phase = SessionPhase::Initialized;
        Ok(())
    }

    /// Run the tick loop. The session is `Finished` afterwards whatever the
    /// outcome and cannot be run again.
    pub async fn run<R, D>(
        &mut self,
        engine: &mut AnimationEngine<R>,
        sink: &mut D,
        duration_secs: u64,
        cancel: &CancellationToken,
    ) -> Result<SessionSummary>
    where
        R: Rng + Send,
        D: DisplaySink + ?Sized,
    {
        let state = match (self.phase, self.visual) {
            (SessionPhase::Initialized, Some(state)) => state,
            (phase, _) => {
                return Err(Error::Session(format!("cannot run a {phase:?} session")));
            }
        };

        self.phase = SessionPhase::Running;
        let result = engine
            .run(state.mode, state.indicator, sink, duration_secs, cancel)
            .await;
        self.phase = SessionPhase::Finished;
        result
    }
}

/// Derive the visual state from `cache` and animate `sink` for
/// `duration_secs`.
pub async fn run_weather_display<S, D>(
    cache: &WeatherCache<S>,
    sink: &mut D,
    config: &DisplayConfig,
    duration_secs: u64,
    cancel: &CancellationToken,
) -> Result<SessionSummary>
where
    S: WeatherSource,
    D: DisplaySink + ?Sized,
{
    let mut session = DisplaySession::new();
    if let Err(e) = session.initialize(cache).await {
        error!("Session for {} not started: {}", cache.location(), e);
        return Err(e);
    }

    let mut engine = AnimationEngine::new(config.brightness, config.session.write_failures);
    let summary = session.run(&mut engine, sink, duration_secs, cancel).await?;
    info!(
        "Session for {} finished: {:?}, {} ticks, {} presents{}",
        cache.location(),
        summary.mode,
        summary.ticks,
        summary.presents,
        if summary.cancelled { " (cancelled)" } else { "" }
    );
    Ok(summary)
}
