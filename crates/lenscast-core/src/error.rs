//! Error types for LensCast

use thiserror::Error;

/// Main error type for LensCast operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("no camera devices detected")]
    NoCamera,

    #[error("camera probe failed: {0}")]
    Probe(String),

    #[error("camera configuration failed: {0}")]
    Configure(String),

    #[error("camera start failed: {0}")]
    Start(String),

    #[error("frame capture failed: {0}")]
    Capture(String),

    #[error("camera handle is closed")]
    CameraClosed,

    #[error("JPEG encoding failed: {0}")]
    Encode(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias using LensCast's Error
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// True for errors that abort server startup rather than a single frame or session.
    pub fn is_startup_fatal(&self) -> bool {
        matches!(
            self,
            Error::NoCamera | Error::Probe(_) | Error::Configure(_) | Error::Start(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn startup_errors_are_fatal() {
        assert!(Error::NoCamera.is_startup_fatal());
        assert!(Error::Probe("ioctl failed".into()).is_startup_fatal());
        assert!(Error::Start("streamon failed".into()).is_startup_fatal());
    }

    #[test]
    fn per_frame_and_session_errors_are_not_fatal() {
        assert!(!Error::Capture("timeout".into()).is_startup_fatal());
        assert!(!Error::Encode("bad buffer".into()).is_startup_fatal());
        assert!(!Error::CameraClosed.is_startup_fatal());
    }
}
