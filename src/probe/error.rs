//! Error types for candidate probes.
//!
//! Probe errors never leave the fetch stage: a failed candidate is logged
//! at debug level and dropped without retry.

use thiserror::Error;

/// Errors that can occur while probing a candidate URL.
#[derive(Debug, Error)]
pub enum ProbeError {
    /// The HTTP client could not be constructed.
    #[error("failed to build probe client: {0}")]
    Build(#[source] reqwest::Error),

    /// The candidate is not a valid absolute URL.
    #[error("invalid URL: {url}")]
    InvalidUrl {
        /// The rejected URL.
        url: String,
    },

    /// Network-level error (DNS, connect, TLS, reset).
    #[error("network error probing {url}: {source}")]
    Network {
        /// The URL that failed.
        url: String,
        /// The underlying network error.
        #[source]
        source: reqwest::Error,
    },

    /// The request did not finish within the configured timeout.
    #[error("timeout probing {url}")]
    Timeout {
        /// The URL that timed out.
        url: String,
    },

    /// The body exceeded the buffering limit.
    #[error("response from {url} exceeds {limit} bytes")]
    TooLarge {
        /// The offending URL.
        url: String,
        /// The configured limit.
        limit: u64,
    },

    /// The run was cancelled while the probe was in flight.
    #[error("probe of {url} cancelled")]
    Cancelled {
        /// The URL being probed.
        url: String,
    },
}

impl ProbeError {
    /// Creates an invalid URL error.
    pub fn invalid_url(url: impl Into<String>) -> Self {
        Self::InvalidUrl { url: url.into() }
    }

    /// Maps a reqwest error to `Timeout` or `Network`.
    pub fn from_reqwest(url: impl Into<String>, source: reqwest::Error) -> Self {
        if source.is_timeout() {
            Self::Timeout { url: url.into() }
        } else {
            Self::Network {
                url: url.into(),
                source,
            }
        }
    }

    /// Creates a too-large error.
    pub fn too_large(url: impl Into<String>, limit: u64) -> Self {
        Self::TooLarge {
            url: url.into(),
            limit,
        }
    }

    /// Creates a cancellation error.
    pub fn cancelled(url: impl Into<String>) -> Self {
        Self::Cancelled { url: url.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_too_large_display() {
        let msg = ProbeError::too_large("http://kit.test/a.zip", 1024).to_string();
        assert!(msg.contains("1024"), "Expected limit in: {msg}");
        assert!(msg.contains("http://kit.test/a.zip"));
    }

    #[test]
    fn test_cancelled_display() {
        let msg = ProbeError::cancelled("http://kit.test/").to_string();
        assert!(msg.contains("cancelled"));
    }

    #[test]
    fn test_invalid_url_display() {
        let msg = ProbeError::invalid_url("not-a-url").to_string();
        assert!(msg.contains("invalid URL"));
        assert!(msg.contains("not-a-url"));
    }
}
