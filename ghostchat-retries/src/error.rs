//! Network error types.

use thiserror::Error;

/// Failures of an outbound HTTP call.
#[derive(Debug, Error)]
pub enum NetworkError {
    /// HTTP 429 after the retry budget was spent.
    #[error("Rate limited after {attempts} attempts")]
    RateLimited {
        /// Attempts made, including the first one.
        attempts: u32,
    },

    /// Any other non-2xx status.
    #[error("HTTP error {status}: {body}")]
    Http {
        /// HTTP status code.
        status: u16,
        /// Response body.
        body: String,
    },

    /// Request timed out.
    #[error("Timeout")]
    Timeout,

    /// Connection error.
    #[error("Connection error: {0}")]
    Connection(String),

    /// The body could not be decoded.
    #[error("Malformed response: {0}")]
    Decode(String),

    /// Other error.
    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl NetworkError {
    /// Create an HTTP error.
    pub fn http(status: u16, body: impl Into<String>) -> Self {
        Self::Http {
            status,
            body: body.into(),
        }
    }

    /// A single 429 response, before any retry accounting.
    pub fn rate_limited() -> Self {
        Self::RateLimited { attempts: 1 }
    }

    /// Create a connection error.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// Create a decode error.
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    /// Whether this is a rate-limit failure.
    pub fn is_rate_limit(&self) -> bool {
        matches!(self, Self::RateLimited { .. } | Self::Http { status: 429, .. })
    }

    /// Get the HTTP status if one is known.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            Self::RateLimited { .. } => Some(429),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for NetworkError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            NetworkError::Timeout
        } else if err.is_connect() {
            NetworkError::Connection(err.to_string())
        } else if err.is_decode() {
            NetworkError::Decode(err.to_string())
        } else {
            NetworkError::Other(err.into())
        }
    }
}

/// Result type for network operations.
pub type NetworkResult<T> = Result<T, NetworkError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limit_detection() {
        assert!(NetworkError::rate_limited().is_rate_limit());
        assert!(NetworkError::http(429, "").is_rate_limit());
        assert!(!NetworkError::http(500, "").is_rate_limit());
        assert!(!NetworkError::Timeout.is_rate_limit());
    }

    #[test]
    fn test_status() {
        assert_eq!(NetworkError::http(503, "unavailable").status(), Some(503));
        assert_eq!(NetworkError::RateLimited { attempts: 3 }.status(), Some(429));
        assert_eq!(NetworkError::decode("bad json").status(), None);
    }

    #[test]
    fn test_display() {
        let err = NetworkError::RateLimited { attempts: 3 };
        assert_eq!(err.to_string(), "Rate limited after 3 attempts");
    }
}
