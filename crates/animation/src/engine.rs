//! Fixed-rate frame loop.
//!
//! Each tick updates the active scene, draws the temperature bar on the
//! bottom row, presents the frame, then sleeps one tick interval. The loop
//! stops early when the cancellation token fires.

use std::time::Duration;

use common::config::WriteFailurePolicy;
use common::{Result, Rgb};
use matrix_display::{DisplaySink, HEIGHT, WIDTH};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::clouds::CloudField;
use crate::rain::RainField;
use crate::visual::{RenderMode, TempIndicator};

/// Ticks per second.
pub const TICK_RATE: u64 = 50;
pub const TICK_INTERVAL: Duration = Duration::from_millis(1000 / TICK_RATE);
/// Row holding the temperature bar.
pub const BAR_ROW: usize = HEIGHT - 1;

/// Outcome of one engine run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSummary {
    pub mode: RenderMode,
    /// Ticks that ran to completion.
    pub ticks: u64,
    pub presents: u64,
    pub cancelled: bool,
}

enum Scene {
    Idle,
    Rain(RainField),
    Clouds(CloudField),
}

impl Scene {
    fn for_mode(mode: RenderMode) -> Self {
        match mode {
            RenderMode::Rain(intensity) => Scene::Rain(RainField::new(intensity)),
            RenderMode::Clouds => Scene::Clouds(CloudField::new()),
            RenderMode::Idle => Scene::Idle,
        }
    }
}

pub struct AnimationEngine<R = StdRng> {
    rng: R,
    brightness: f32,
    write_failures: WriteFailurePolicy,
}

impl AnimationEngine<StdRng> {
    pub fn new(brightness: f32, write_failures: WriteFailurePolicy) -> Self {
        Self::with_rng(StdRng::from_entropy(), brightness, write_failures)
    }
}

impl<R: Rng + Send> AnimationEngine<R> {
    pub fn with_rng(rng: R, brightness: f32, write_failures: WriteFailurePolicy) -> Self {
        Self {
            rng,
            brightness,
            write_failures,
        }
    }

    /// Run `mode` for `duration_secs` seconds at [`TICK_RATE`].
    ///
    /// Idle sessions write nothing but still wait out the full duration.
    pub async fn run<S: DisplaySink + ?Sized>(
        &mut self,
        mode: RenderMode,
        indicator: TempIndicator,
        sink: &mut S,
        duration_secs: u64,
        cancel: &CancellationToken,
    ) -> Result<SessionSummary> {
        let total_ticks = duration_secs.saturating_mul(TICK_RATE);
        let mut summary = SessionSummary {
            mode,
            ticks: 0,
            presents: 0,
            cancelled: false,
        };

        sink.set_brightness(self.brightness).await?;
        let mut scene = Scene::for_mode(mode);
        info!("Animating {:?} for {}s ({} ticks)", mode, duration_secs, total_ticks);

        for tick in 0..total_ticks {
            if cancel.is_cancelled() {
                summary.cancelled = true;
                break;
            }

            let draws = match &mut scene {
                Scene::Idle => false,
                Scene::Rain(field) => {
                    if field.tick(tick, &mut self.rng) {
                        draw_cells(sink, field.pixels(), self.write_failures).await?;
                    }
                    true
                }
                Scene::Clouds(field) => {
                    field.advance(&mut self.rng);
                    draw_cells(sink, field.pixels(), self.write_failures).await?;
                    true
                }
            };

            if draws {
                draw_temperature_bar(sink, &indicator).await?;
                sink.present().await?;
                summary.presents += 1;
            }
            summary.ticks += 1;

            tokio::select! {
                _ = cancel.cancelled() => {
                    summary.cancelled = true;
                    break;
                }
                _ = sleep(TICK_INTERVAL) => {}
            }
        }

        if summary.cancelled {
            info!("Animation cancelled after {} of {} ticks", summary.ticks, total_ticks);
        } else {
            debug!("Animation finished: {:?}", summary);
        }
        Ok(summary)
    }
}

async fn draw_cells<S, I>(sink: &mut S, cells: I, policy: WriteFailurePolicy) -> Result<()>
where
    S: DisplaySink + ?Sized,
    I: Iterator<Item = (usize, usize, Rgb)>,
{
    for (x, y, color) in cells {
        if let Err(e) = sink.set_pixel(x, y, color).await {
            match policy {
                WriteFailurePolicy::Abort => return Err(e),
                WriteFailurePolicy::Log => warn!("Pixel write ({},{}) failed: {}", x, y, e),
            }
        }
    }
    Ok(())
}

/// Columns `0..bar_width` in the indicator colour, the rest black.
pub async fn draw_temperature_bar<S: DisplaySink + ?Sized>(
    sink: &mut S,
    indicator: &TempIndicator,
) -> Result<()> {
    for x in 0..WIDTH {
        let color = if x < indicator.bar_width {
            indicator.color
        } else {
            Rgb::BLACK
        };
        sink.set_pixel(x, BAR_ROW, color).await?;
    }
    Ok(())
}
