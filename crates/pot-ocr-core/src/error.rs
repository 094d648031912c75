//! Error types for pot-ocr.

use std::time::Duration;
use thiserror::Error;

/// The host could not start a process.
#[derive(Error, Debug)]
pub enum LaunchError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors from bringing the background service up.
#[derive(Error, Debug)]
pub enum SupervisorError {
    /// The interpreter could not even be spawned
    #[error("failed to start service `{command}`: {source}")]
    Launch {
        command: String,
        #[source]
        source: LaunchError,
    },

    /// The process was launched but never answered `/health`
    #[error("service startup timeout after {}ms", .0.as_millis())]
    StartupTimeout(Duration),
}

/// Underlying cause of a failed recognition.
#[derive(Error, Debug)]
pub enum ErrorKind {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error(transparent)]
    Supervisor(#[from] SupervisorError),

    /// Connection refused, timeout, or the body could not be read
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Non-success HTTP status
    #[error("OCR service error: {status} - {message}")]
    Http { status: u16, message: String },

    /// HTTP success, but the body is not the expected JSON
    #[error("invalid OCR service response: {0}")]
    InvalidResponse(#[from] serde_json::Error),

    /// HTTP success, but the payload status is not `success`
    #[error("{0}")]
    Processing(String),
}

/// The single outward error of a recognition call.
#[derive(Error, Debug)]
#[error("recognition failed: {kind}")]
pub struct RecognitionError {
    #[source]
    kind: ErrorKind,
}

impl RecognitionError {
    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }
}

impl From<ErrorKind> for RecognitionError {
    fn from(kind: ErrorKind) -> Self {
        Self { kind }
    }
}

impl From<SupervisorError> for RecognitionError {
    fn from(err: SupervisorError) -> Self {
        ErrorKind::from(err).into()
    }
}

impl From<serde_json::Error> for RecognitionError {
    fn from(err: serde_json::Error) -> Self {
        ErrorKind::from(err).into()
    }
}

impl From<reqwest::Error> for RecognitionError {
    fn from(err: reqwest::Error) -> Self {
        ErrorKind::from(err).into()
    }
}

/// Result type alias for recognition operations.
pub type Result<T> = std::result::Result<T, RecognitionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outward_message_nests_cause() {
        let err: RecognitionError = ErrorKind::Http {
            status: 500,
            message: "bad image".to_string(),
        }
        .into();
        assert_eq!(
            err.to_string(),
            "recognition failed: OCR service error: 500 - bad image"
        );
    }

    #[test]
    fn supervisor_errors_convert() {
        let err: RecognitionError = SupervisorError::StartupTimeout(Duration::from_secs(15)).into();
        assert!(matches!(
            err.kind(),
            ErrorKind::Supervisor(SupervisorError::StartupTimeout(_))
        ));
        assert_eq!(
            err.to_string(),
            "recognition failed: service startup timeout after 15000ms"
        );
    }

    #[test]
    fn launch_error_names_command() {
        let err = SupervisorError::Launch {
            command: "python3".to_string(),
            source: LaunchError::Io(std::io::Error::new(std::io::ErrorKind::NotFound, "not found")),
        };
        assert_eq!(err.to_string(), "failed to start service `python3`: IO error: not found");
    }
}
