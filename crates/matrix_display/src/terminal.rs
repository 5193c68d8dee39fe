//! Terminal sink: draws the matrix with 24-bit ANSI background colours.

use std::io::{self, Stdout, Write};

use async_trait::async_trait;
use common::{Error, Result, Rgb};

use crate::{check_bounds, DisplaySink, Frame, HEIGHT};

pub struct TerminalSink<W = Stdout> {
    out: W,
    frame: Frame,
    brightness: f32,
    drawn: bool,
}

impl TerminalSink<Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write + Send> TerminalSink<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            frame: Frame::new(),
            brightness: 1.0,
            drawn: false,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn draw(&mut self) -> io::Result<()> {
        let mut buf = String::new();
        if self.drawn {
            // Move back to the top of the previous frame.
            buf.push_str(&format!("\x1b[{HEIGHT}A"));
        }
        for row in self.frame.rows() {
            for px in row {
                let c = px.scaled(self.brightness);
                buf.push_str(&format!("\x1b[48;2;{};{};{}m  ", c.r, c.g, c.b));
            }
            buf.push_str("\x1b[0m\n");
        }
        self.out.write_all(buf.as_bytes())?;
        self.out.flush()?;
        self.drawn = true;
        Ok(())
    }
}

#[async_trait]
impl<W: Write + Send> DisplaySink for TerminalSink<W> {
    async fn init(&mut self) -> Result<()> {
        self.out
            .write_all(b"\x1b[?25l")
            .and_then(|_| self.out.flush())
            .map_err(|e| Error::SinkUnavailable(format!("terminal not writable: {e}")))
    }

    async fn shutdown(&mut self) -> Result<()> {
        self.frame.clear();
        self.draw()
            .and_then(|_| self.out.write_all(b"\x1b[?25h"))
            .and_then(|_| self.out.flush())
            .map_err(|e| Error::SinkWriteFailure(format!("terminal shutdown: {e}")))
    }

    async fn set_brightness(&mut self, level: f32) -> Result<()> {
        self.brightness = level.clamp(0.0, 1.0);
        Ok(())
    }

    async fn set_pixel(&mut self, x: usize, y: usize, color: Rgb) -> Result<()> {
        check_bounds(x, y)?;
        self.frame.set(x, y, color);
        Ok(())
    }

    async fn present(&mut self) -> Result<()> {
        self.draw()
            .map_err(|e| Error::SinkWriteFailure(format!("terminal present: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_present_draws_one_line_per_row() {
        let mut sink = TerminalSink::new(Vec::new());
        sink.set_pixel(0, 0, Rgb::new(255, 0, 0)).await.expect("pixel");
        sink.present().await.expect("present");

        let out = String::from_utf8(sink.into_inner()).expect("utf8");
        assert_eq!(out.lines().count(), HEIGHT);
        assert!(out.starts_with("\x1b[48;2;255;0;0m  "));
    }

    #[tokio::test]
    async fn test_brightness_scales_output() {
        let mut sink = TerminalSink::new(Vec::new());
        sink.set_brightness(0.5).await.expect("brightness");
        sink.set_pixel(0, 0, Rgb::new(200, 100, 0)).await.expect("pixel");
        sink.present().await.expect("present");
        sink.present().await.expect("second present");

        let out = String::from_utf8(sink.into_inner()).expect("utf8");
        assert!(out.starts_with("\x1b[48;2;100;50;0m"));
        assert!(out.contains(&format!("\x1b[{HEIGHT}A")));
    }
}
