//! HTTP probing of candidate URLs.
//!
//! A [`Prober`] issues one GET per candidate and buffers the whole body (up
//! to a hard limit) into a [`ProbeResponse`]. Non-2xx statuses are ordinary
//! responses, not errors; only transport failures, timeouts, oversized
//! bodies and cancellation produce a [`ProbeError`].
//!
//! Client policy:
//! - fixed browser User-Agent
//! - `Connection: close` and no idle pooling; every probe is a fresh handshake
//! - certificate validation disabled (kit hosts are hostile, certs are junk)
//! - redirects are never followed; a 3xx is returned as-is
//! - no transparent decompression, so declared lengths match the wire body

mod error;

pub use error::ProbeError;

use std::borrow::Cow;
use std::time::Duration;

use futures_util::StreamExt;
use reqwest::Client;
use reqwest::header::{CONNECTION, CONTENT_LENGTH, CONTENT_TYPE};
use reqwest::redirect::Policy;
use tracing::{debug, instrument};
use url::Url;

use crate::pipeline::Shutdown;
use crate::user_agent::PROBE_USER_AGENT;

/// Upper bound on the initial body allocation, regardless of Content-Length.
const INITIAL_BODY_CAPACITY: usize = 1024 * 1024;

/// One fully buffered HTTP response.
///
/// Owned by whichever stage currently holds it; moved between stages, never
/// shared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeResponse {
    /// The requested URL (redirects are not followed, so also the final URL).
    pub url: String,
    /// HTTP status code.
    pub status: u16,
    /// Declared `Content-Length`, when present and numeric.
    pub content_length: Option<u64>,
    /// Declared `Content-Type`, when present.
    pub content_type: Option<String>,
    /// The full response body.
    pub body: Vec<u8>,
}

impl ProbeResponse {
    /// Returns true for a 2xx status.
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Body decoded as UTF-8, replacing invalid sequences.
    #[must_use]
    pub fn body_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }
}

/// HTTP client configured for probing untrusted hosts.
///
/// Cheap to clone; clones share the underlying client.
#[derive(Debug, Clone)]
pub struct Prober {
    client: Client,
    max_body_bytes: u64,
}

impl Prober {
    /// Creates a prober with a total per-request timeout and body limit.
    ///
    /// # Errors
    ///
    /// Returns [`ProbeError::Build`] if the TLS backend cannot be initialized.
    pub fn new(timeout: Duration, max_body_bytes: u64) -> Result<Self, ProbeError> {
        let client = Client::builder()
            .user_agent(PROBE_USER_AGENT)
            .timeout(timeout)
            .redirect(Policy::none())
            .danger_accept_invalid_certs(true)
            .pool_max_idle_per_host(0)
            .no_gzip()
            .build()
            .map_err(ProbeError::Build)?;
        Ok(Self {
            client,
            max_body_bytes,
        })
    }

    /// Returns the configured body limit.
    #[must_use]
    pub fn max_body_bytes(&self) -> u64 {
        self.max_body_bytes
    }

    /// Fetches `url`, giving up early if `shutdown` fires.
    ///
    /// # Errors
    ///
    /// Returns [`ProbeError`] on transport failure, timeout, an oversized
    /// body, or cancellation. HTTP error statuses are returned as responses.
    #[instrument(level = "debug", skip(self, shutdown), fields(url = %url))]
    pub async fn fetch(&self, url: &str, shutdown: &Shutdown) -> Result<ProbeResponse, ProbeError> {
        tokio::select! {
            biased;
            () = shutdown.cancelled() => Err(ProbeError::cancelled(url)),
            result = self.fetch_inner(url) => result,
        }
    }

    async fn fetch_inner(&self, url: &str) -> Result<ProbeResponse, ProbeError> {
        let parsed = Url::parse(url).map_err(|_| ProbeError::invalid_url(url))?;

        let response = self
            .client
            .get(parsed)
            .header(CONNECTION, "close")
            .send()
            .await
            .map_err(|e| ProbeError::from_reqwest(url, e))?;

        let status = response.status().as_u16();
        let content_length = response
            .headers()
            .get(CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok());
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        if content_length.is_some_and(|len| len > self.max_body_bytes) {
            return Err(ProbeError::too_large(url, self.max_body_bytes));
        }

        let body = read_body(response, url, content_length, self.max_body_bytes).await?;
        debug!(status, bytes = body.len(), "probe complete");

        Ok(ProbeResponse {
            url: url.to_string(),
            status,
            content_length,
            content_type,
            body,
        })
    }
}

/// Drains a response body into memory, failing once it passes `limit`.
async fn read_body(
    response: reqwest::Response,
    url: &str,
    content_length: Option<u64>,
    limit: u64,
) -> Result<Vec<u8>, ProbeError> {
    let capacity = content_length
        .and_then(|len| usize::try_from(len).ok())
        .unwrap_or(0)
        .min(INITIAL_BODY_CAPACITY);
    let mut body = Vec::with_capacity(capacity);
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| ProbeError::from_reqwest(url, e))?;
        if (body.len() + chunk.len()) as u64 > limit {
            return Err(ProbeError::too_large(url, limit));
        }
        body.extend_from_slice(&chunk);
    }

    Ok(body)
}
