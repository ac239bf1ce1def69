//! Error types for polling, control requests and configuration

use thiserror::Error;

/// A single `/status` poll that did not produce a report.
///
/// Never fatal: the poller keeps ticking and the next poll retries.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Connection refused, timeout, broken body...
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The status source answered with a non-success code
    #[error("status source returned {0}")]
    Status(reqwest::StatusCode),

    /// Body was not a valid status report
    #[error("malformed status body: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Failure of a target or sensitivity update
#[derive(Debug, Error)]
pub enum ControlError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("backend returned {0}")]
    Status(reqwest::StatusCode),

    #[error("malformed response: {0}")]
    Decode(#[from] serde_json::Error),

    /// Backend understood the request and refused it
    #[error("{0}")]
    Rejected(String),
}

/// Invalid dashboard configuration
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("API URL must be a plain http:// URL with a host, got {0:?}")]
    InvalidUrl(String),

    #[error("poll interval must be greater than zero")]
    ZeroPollInterval,

    #[error("trail length must be greater than zero")]
    ZeroTrailLength,

    #[error("{var} is not a number: {value:?}")]
    InvalidNumber { var: &'static str, value: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = FetchError::Status(reqwest::StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(err.to_string(), "status source returned 503 Service Unavailable");

        let err = ControlError::Rejected("Could not identify color".into());
        assert_eq!(err.to_string(), "Could not identify color");

        let err = ConfigError::InvalidNumber { var: "TRACKER_POLL_MS", value: "fast".into() };
        assert_eq!(err.to_string(), "TRACKER_POLL_MS is not a number: \"fast\"");

        let err = ConfigError::InvalidUrl("https://tracker".into());
        assert_eq!(
            err.to_string(),
            "API URL must be a plain http:// URL with a host, got \"https://tracker\""
        );
    }

    #[test]
    fn test_decode_error_converts() {
        let parse = serde_json::from_str::<serde_json::Value>("{not json");
        let err: FetchError = parse.unwrap_err().into();
        assert!(matches!(err, FetchError::Decode(_)));
    }
}
