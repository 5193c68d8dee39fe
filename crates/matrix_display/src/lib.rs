//! Display sinks for an 8×8 RGB matrix.
//!
//! The animation engine talks to a [`DisplaySink`]; the backend is chosen
//! when the binary is wired up and passed in explicitly.

pub mod emulator;
pub mod frame;
pub mod protocol;
pub mod recording;
pub mod terminal;

use async_trait::async_trait;
use common::{Error, Result, Rgb};

pub use emulator::EmulatorSink;
pub use frame::Frame;
pub use recording::{RecordingSink, SinkEvent};
pub use terminal::TerminalSink;

/// Matrix width in pixels.
pub const WIDTH: usize = 8;
/// Matrix height in pixels.
pub const HEIGHT: usize = 8;

/// Command interface shared by every matrix backend.
///
/// Pixel writes go to a back buffer; nothing is visible until `present`.
#[async_trait]
pub trait DisplaySink: Send {
    async fn init(&mut self) -> Result<()>;

    /// Clear the matrix and release the device.
    async fn shutdown(&mut self) -> Result<()>;

    /// Set brightness, 0.0 to 1.0.
    async fn set_brightness(&mut self, level: f32) -> Result<()>;

    async fn set_pixel(&mut self, x: usize, y: usize, color: Rgb) -> Result<()>;

    async fn present(&mut self) -> Result<()>;
}

#[async_trait]
impl<S: DisplaySink + ?Sized> DisplaySink for Box<S> {
    async fn init(&mut self) -> Result<()> {
        (**self).init().await
    }

    async fn shutdown(&mut self) -> Result<()> {
        (**self).shutdown().await
    }

    async fn set_brightness(&mut self, level: f32) -> Result<()> {
        (**self).set_brightness(level).await
    }

    async fn set_pixel(&mut self, x: usize, y: usize, color: Rgb) -> Result<()> {
        (**self).set_pixel(x, y, color).await
    }

    async fn present(&mut self) -> Result<()> {
        (**self).present().await
    }
}

/// Reject coordinates outside the matrix.
pub fn check_bounds(x: usize, y: usize) -> Result<()> {
    if x >= WIDTH || y >= HEIGHT {
        return Err(Error::SinkWriteFailure(format!(
            "pixel ({x},{y}) outside {WIDTH}x{HEIGHT} matrix"
        )));
    }
    Ok(())
}

/// Blank the back buffer and show it.
pub async fn clear<S: DisplaySink + ?Sized>(sink: &mut S) -> Result<()> {
    for y in 0..HEIGHT {
        for x in 0..WIDTH {
            sink.set_pixel(x, y, Rgb::BLACK).await?;
        }
    }
    sink.present().await
}
