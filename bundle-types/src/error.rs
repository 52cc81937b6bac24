//! Page request fault classification.

use thiserror::Error;

/// Why a single page request failed.
///
/// Each variant is one fault class; the retry policy switches on the
/// variant rather than on error types.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PageError {
    /// The upstream asked us to slow down (HTTP 429).
    #[error("rate limited (HTTP {status})")]
    RateLimited {
        /// HTTP status code.
        status: u16,
    },

    /// Server-side fault (5xx).
    #[error("server error (HTTP {status})")]
    Server {
        /// HTTP status code.
        status: u16,
    },

    /// Connection reset, timeout, DNS failure or a broken response body.
    #[error("transport error: {0}")]
    Transport(String),

    /// Client-side fault (4xx other than 429). Never retried.
    #[error("client error (HTTP {status})")]
    Client {
        /// HTTP status code.
        status: u16,
    },
}

impl PageError {
    /// Classify a non-success HTTP status.
    pub fn from_status(status: u16) -> Self {
        match status {
            429 => Self::RateLimited { status },
            500..=599 => Self::Server { status },
            _ => Self::Client { status },
        }
    }

    /// Whether the request may be retried.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::Client { .. })
    }
}
