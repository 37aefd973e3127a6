//! Seed URL sources.
//!
//! A seed is a known phishing URL. Seeds come either from public phishing
//! feeds or from newline-delimited input piped in by an operator. Every
//! source yields an ordered, finite list; the target generator takes it from
//! there.
//!
//! # Example
//!
//! ```
//! use kitscan_core::seed::{FeedKind, parse_feed};
//!
//! let seeds = parse_feed(FeedKind::OpenPhish, "http://bad.test/a\nhttp://bad.test/b\n").unwrap();
//! assert_eq!(seeds.len(), 2);
//! ```

mod error;
mod feed;

pub use error::SeedError;
pub use feed::{FeedKind, parse_feed};

use async_trait::async_trait;
use reqwest::Client;
use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::{debug, instrument};

/// A producer of seed URLs.
///
/// Implementations return all seeds at once, in source order. A failure here
/// is fatal for the run.
#[async_trait]
pub trait SeedSource: Send {
    /// Short name for logging.
    fn name(&self) -> &'static str;

    /// Reads every seed from the source.
    ///
    /// # Errors
    ///
    /// Returns [`SeedError`] if the source cannot be read or decoded.
    async fn seeds(&mut self) -> Result<Vec<String>, SeedError>;
}

/// Seeds fetched from one or more remote feeds, concatenated in order.
#[derive(Debug)]
pub struct FeedSource {
    client: Client,
    feeds: Vec<(FeedKind, String)>,
}

impl FeedSource {
    /// Creates a source for the given feeds at their default endpoints.
    ///
    /// # Errors
    ///
    /// Returns [`SeedError::Client`] if the HTTP client cannot be built.
    pub fn new(kinds: &[FeedKind], api_key: Option<&str>) -> Result<Self, SeedError> {
        let feeds = kinds
            .iter()
            .map(|kind| (*kind, kind.endpoint(api_key)))
            .collect();
        Self::with_endpoints(feeds)
    }

    /// Creates a source with explicit `(format, endpoint)` pairs.
    ///
    /// # Errors
    ///
    /// Returns [`SeedError::Client`] if the HTTP client cannot be built.
    pub fn with_endpoints(feeds: Vec<(FeedKind, String)>) -> Result<Self, SeedError> {
        Ok(Self {
            client: feed::build_feed_client()?,
            feeds,
        })
    }
}

#[async_trait]
impl SeedSource for FeedSource {
    fn name(&self) -> &'static str {
        "feed"
    }

    #[instrument(skip(self), fields(feeds = self.feeds.len()))]
    async fn seeds(&mut self) -> Result<Vec<String>, SeedError> {
        let mut seeds = Vec::new();
        for (kind, url) in &self.feeds {
            seeds.extend(feed::fetch_feed(&self.client, *kind, url).await?);
        }
        Ok(seeds)
    }
}

/// Seeds read line by line from any async reader, typically stdin.
pub struct ReaderSource<R> {
    reader: Option<R>,
}

impl<R> ReaderSource<R>
where
    R: AsyncRead + Unpin + Send,
{
    /// Wraps a reader. The reader is consumed by the first call to `seeds`.
    pub fn new(reader: R) -> Self {
        Self {
            reader: Some(reader),
        }
    }
}

#[async_trait]
impl<R> SeedSource for ReaderSource<R>
where
    R: AsyncRead + Unpin + Send,
{
    fn name(&self) -> &'static str {
        "reader"
    }

    async fn seeds(&mut self) -> Result<Vec<String>, SeedError> {
        let Some(mut reader) = self.reader.take() else {
            return Ok(Vec::new());
        };

        let mut body = String::new();
        reader.read_to_string(&mut body).await?;
        let seeds = feed::parse_lines(&body);

        debug!(seeds = seeds.len(), "read seeds from input");
        Ok(seeds)
    }
}
