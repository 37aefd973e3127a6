//! Error types for seed acquisition.
//!
//! Seed errors are the only failures that abort a run: without seeds the
//! pipeline has nothing to do, so they surface before any stage starts.

use thiserror::Error;

/// Errors that can occur while obtaining seed URLs.
#[derive(Debug, Error)]
pub enum SeedError {
    /// The feed could not be reached (DNS, connect, TLS, timeout).
    #[error("failed to fetch seed feed {url}: {source}")]
    Fetch {
        /// Feed endpoint.
        url: String,
        /// The underlying network error.
        #[source]
        source: reqwest::Error,
    },

    /// The feed answered with a non-success status.
    #[error("seed feed {url} returned HTTP {status}")]
    Status {
        /// Feed endpoint.
        url: String,
        /// HTTP status code.
        status: u16,
    },

    /// The feed body did not match its expected format.
    #[error("failed to decode seed feed {url}: {reason}")]
    Decode {
        /// Feed endpoint.
        url: String,
        /// What went wrong.
        reason: String,
    },

    /// The feed HTTP client could not be constructed.
    #[error("failed to build feed client: {0}")]
    Client(#[source] reqwest::Error),

    /// Reading seeds from a local stream failed.
    #[error("failed to read seeds: {0}")]
    Io(#[from] std::io::Error),
}

impl SeedError {
    /// Creates a fetch error from a reqwest error.
    pub fn fetch(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Fetch {
            url: url.into(),
            source,
        }
    }

    /// Creates a status error.
    pub fn status(url: impl Into<String>, status: u16) -> Self {
        Self::Status {
            url: url.into(),
            status,
        }
    }

    /// Creates a decode error.
    pub fn decode(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Decode {
            url: url.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_error_display() {
        let msg = SeedError::status("http://feed.test/online-valid.json", 503).to_string();
        assert!(msg.contains("503"), "Expected status in: {msg}");
        assert!(msg.contains("http://feed.test/online-valid.json"));
    }

    #[test]
    fn test_decode_error_display() {
        let msg = SeedError::decode("http://feed.test/x", "expected value at line 1").to_string();
        assert!(msg.contains("decode"));
        assert!(msg.contains("expected value"));
    }
}
