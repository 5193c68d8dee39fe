//! In-memory sink that records every command.
//!
//! Keeps the back buffer and a snapshot of each presented frame, and can be
//! told to fail pixel writes or presents.

use std::ops::Range;

use async_trait::async_trait;
use common::{Error, Result, Rgb};

use crate::{check_bounds, DisplaySink, Frame};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SinkEvent {
    Init,
    Shutdown,
    Brightness(f32),
    Pixel { x: usize, y: usize, color: Rgb },
    Present,
}

#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Vec<SinkEvent>,
    frame: Frame,
    presented: Vec<Frame>,
    failing_rows: Option<Range<usize>>,
    present_limit: Option<usize>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every pixel write whose row falls in `rows`.
    pub fn failing_rows(mut self, rows: Range<usize>) -> Self {
        self.failing_rows = Some(rows);
        self
    }

    /// Fail every present after the first `n`.
    pub fn fail_presents_after(mut self, n: usize) -> Self {
        self.present_limit = Some(n);
        self
    }

    pub fn events(&self) -> &[SinkEvent] {
        &self.events
    }

    /// Current back buffer.
    pub fn frame(&self) -> &Frame {
        &self.frame
    }

    /// Snapshot of the back buffer at every successful present.
    pub fn presented(&self) -> &[Frame] {
        &self.presented
    }

    pub fn present_count(&self) -> usize {
        self.presented.len()
    }

    pub fn pixel_writes(&self) -> impl Iterator<Item = (usize, usize, Rgb)> + '_ {
        self.events.iter().filter_map(|e| match *e {
            SinkEvent::Pixel { x, y, color } => Some((x, y, color)),
            _ => None,
        })
    }
}

#[async_trait]
impl DisplaySink for RecordingSink {
    async fn init(&mut self) -> Result<()> {
        self.events.push(SinkEvent::Init);
        Ok(())
    }

    async fn shutdown(&mut self) -> Result<()> {
        self.frame.clear();
        self.events.push(SinkEvent::Shutdown);
        Ok(())
    }

    async fn set_brightness(&mut self, level: f32) -> Result<()> {
        self.events.push(SinkEvent::Brightness(level));
        Ok(())
    }

    async fn set_pixel(&mut self, x: usize, y: usize, color: Rgb) -> Result<()> {
        check_bounds(x, y)?;
        if self.failing_rows.as_ref().is_some_and(|rows| rows.contains(&y)) {
            return Err(Error::SinkWriteFailure(format!("injected failure at ({x},{y})")));
        }
        self.frame.set(x, y, color);
        self.events.push(SinkEvent::Pixel { x, y, color });
        Ok(())
    }

    async fn present(&mut self) -> Result<()> {
        if self.present_limit.is_some_and(|n| self.presented.len() >= n) {
            return Err(Error::SinkWriteFailure("injected present failure".into()));
        }
        self.presented.push(self.frame);
        self.events.push(SinkEvent::Present);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_records_frames_on_present() {
        let mut sink = RecordingSink::new();
        sink.set_pixel(2, 3, Rgb::new(1, 2, 3)).await.expect("pixel");
        sink.present().await.expect("present");
        sink.set_pixel(2, 3, Rgb::BLACK).await.expect("pixel");

        assert_eq!(sink.present_count(), 1);
        assert_eq!(sink.presented()[0].get(2, 3), Rgb::new(1, 2, 3));
        assert_eq!(sink.frame().get(2, 3), Rgb::BLACK);
        assert_eq!(sink.pixel_writes().count(), 2);
    }

    #[tokio::test]
    async fn test_injected_failures() {
        let mut sink = RecordingSink::new().failing_rows(0..7).fail_presents_after(1);
        assert!(sink.set_pixel(0, 6, Rgb::BLACK).await.is_err());
        assert!(sink.set_pixel(0, 7, Rgb::BLACK).await.is_ok());
        assert!(sink.present().await.is_ok());
        assert!(matches!(
            sink.present().await,
            Err(Error::SinkWriteFailure(_))
        ));
    }

    #[tokio::test]
    async fn test_clear_blanks_every_pixel() {
        let mut sink = RecordingSink::new();
        sink.set_pixel(7, 7, Rgb::new(9, 9, 9)).await.expect("pixel");
        crate::clear(&mut sink).await.expect("clear");
        assert_eq!(*sink.frame(), Frame::new());
        assert_eq!(sink.present_count(), 1);
    }
}
