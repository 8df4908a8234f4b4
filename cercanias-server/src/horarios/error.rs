//! Horarios client error types.

use crate::events::FailureKind;
use crate::stations::UnknownStation;

/// Errors from a single timetable fetch.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// A route station is not in the directory; no request was sent.
    #[error(transparent)]
    UnknownStation(#[from] UnknownStation),

    /// The request never produced a response (timeout, DNS, reset, ...).
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("HTTP error {status}: {body}")]
    HttpStatus { status: u16, body: String },

    /// The response body was empty or not a timetable.
    #[error("decode error: {message}")]
    Decode {
        message: String,
        body: Option<String>,
    },
}

impl FetchError {
    /// Classify this error for retry and reporting.
    pub fn kind(&self) -> FailureKind {
        match self {
            FetchError::UnknownStation(_) => FailureKind::Config,
            FetchError::Transport(_) => FailureKind::Transport,
            FetchError::HttpStatus { .. } | FetchError::Decode { .. } => FailureKind::Protocol,
        }
    }

    /// Whether a later attempt could succeed where this one failed.
    pub fn is_retryable(&self) -> bool {
        self.kind() != FailureKind::Config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = FetchError::UnknownStation(UnknownStation {
            name: "Atocha".into(),
        });
        assert_eq!(err.to_string(), "unknown station: \"Atocha\"");

        let err = FetchError::HttpStatus {
            status: 503,
            body: "Service Unavailable".into(),
        };
        assert_eq!(err.to_string(), "HTTP error 503: Service Unavailable");

        let err = FetchError::Decode {
            message: "expected value".into(),
            body: Some("<html>".into()),
        };
        assert!(err.to_string().contains("expected value"));
    }

    #[test]
    fn classification() {
        let config = FetchError::UnknownStation(UnknownStation { name: String::new() });
        assert_eq!(config.kind(), FailureKind::Config);
        assert!(!config.is_retryable());

        let status = FetchError::HttpStatus {
            status: 500,
            body: String::new(),
        };
        assert_eq!(status.kind(), FailureKind::Protocol);
        assert!(status.is_retryable());

        let decode = FetchError::Decode {
            message: String::new(),
            body: None,
        };
        assert_eq!(decode.kind(), FailureKind::Protocol);
        assert!(decode.is_retryable());
    }
}
