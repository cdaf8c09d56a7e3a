//! labelscan error types

use std::time::Duration;

/// labelscan error types
#[derive(Debug, thiserror::Error)]
pub enum LabelScanError {
    // Service/network errors
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("rate limited, retry after {retry_after:?}")]
    RateLimited { retry_after: Option<Duration> },

    #[error("authentication failed")]
    AuthenticationFailed,

    // Soft errors
    #[error("empty response from vision service")]
    EmptyResponse,

    // Input errors
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("no image path for: {0}")]
    MissingPath(String),

    // Data errors
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    // Configuration errors
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The batch deadline elapsed before this image's extraction finished.
    #[error("extraction timed out")]
    Timeout,

    /// The extraction task itself died (panic or pool shutdown).
    #[error("extraction task failed: {0}")]
    TaskFailed(String),
}

impl LabelScanError {
    /// Whether a retry of the same request may succeed.
    ///
    /// Network failures, rate limiting, request timeouts (408) and server-side
    /// errors (5xx) are transient. Everything else is permanent.
    pub fn is_transient(&self) -> bool {
        match self {
            LabelScanError::Http(_) | LabelScanError::RateLimited { .. } => true,
            LabelScanError::Api { status, .. } => *status == 408 || *status >= 500,
            _ => false,
        }
    }

    /// Server-provided delay hint, if any.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            LabelScanError::RateLimited { retry_after } => *retry_after,
            _ => None,
        }
    }

    pub(crate) fn io(path: impl AsRef<std::path::Path>, source: std::io::Error) -> Self {
        LabelScanError::Io {
            path: path.as_ref().display().to_string(),
            source,
        }
    }
}

impl From<reqwest::Error> for LabelScanError {
    fn from(err: reqwest::Error) -> Self {
        // URLs can carry credentials; keep them out of messages and logs.
        LabelScanError::Http(err.without_url().to_string())
    }
}

/// Result type alias for labelscan operations
pub type Result<T> = std::result::Result<T, LabelScanError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_classification() {
        assert!(LabelScanError::Http("connection reset".into()).is_transient());
        assert!(LabelScanError::RateLimited { retry_after: None }.is_transient());
        assert!(
            LabelScanError::Api {
                status: 503,
                message: "unavailable".into()
            }
            .is_transient()
        );
        assert!(
            LabelScanError::Api {
                status: 408,
                message: "timeout".into()
            }
            .is_transient()
        );

        assert!(
            !LabelScanError::Api {
                status: 400,
                message: "bad request".into()
            }
            .is_transient()
        );
        assert!(!LabelScanError::AuthenticationFailed.is_transient());
        assert!(!LabelScanError::MissingPath("x.jpg".into()).is_transient());
        assert!(!LabelScanError::EmptyResponse.is_transient());
    }

    #[test]
    fn retry_after_only_from_rate_limit() {
        let hint = Duration::from_secs(2);
        assert_eq!(
            LabelScanError::RateLimited {
                retry_after: Some(hint)
            }
            .retry_after(),
            Some(hint)
        );
        assert_eq!(LabelScanError::Http("x".into()).retry_after(), None);
    }
}
