//! Unified error type for weather-matrix.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Weather query transport or payload failure.
    #[error("Weather source unavailable: {0}")]
    SourceUnavailable(String),

    #[error("Missing credential: {0}")]
    MissingCredential(String),

    /// Display could not be opened or did not answer the handshake.
    #[error("Display sink unavailable: {0}")]
    SinkUnavailable(String),

    /// A pixel write or present failed mid-session.
    #[error("Display write failed: {0}")]
    SinkWriteFailure(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Session error: {0}")]
    Session(String),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// True for errors raised by the display backend.
    pub fn is_sink_error(&self) -> bool {
        matches!(self, Error::SinkUnavailable(_) | Error::SinkWriteFailure(_))
    }
}
