//! Phishing URL feeds and their wire formats.

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info, instrument};

use super::SeedError;
use crate::user_agent;

/// Timeout for a whole feed download. Feeds run to tens of megabytes.
const FEED_TIMEOUT_SECS: u64 = 120;

/// Zero-based URL column in URLhaus CSV dumps.
const URLHAUS_URL_COLUMN: usize = 2;

/// Known phishing URL feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeedKind {
    /// PhishTank verified-online dump: JSON array of `{"url": ...}` objects.
    PhishTank,
    /// OpenPhish community feed: one URL per line.
    OpenPhish,
    /// URLhaus recent dump: CSV with `#` comments, URL in the third column.
    UrlHaus,
}

impl FeedKind {
    /// Returns the default endpoint for this feed.
    ///
    /// `api_key` only affects PhishTank, where a registered key selects the
    /// per-user dump instead of the shared, heavily rate-limited one.
    #[must_use]
    pub fn endpoint(self, api_key: Option<&str>) -> String {
        match self {
            Self::PhishTank => match api_key.map(str::trim).filter(|k| !k.is_empty()) {
                Some(key) => format!("http://data.phishtank.com/data/{key}/online-valid.json"),
                None => "http://data.phishtank.com/data/online-valid.json".to_string(),
            },
            Self::OpenPhish => "https://openphish.com/feed.txt".to_string(),
            Self::UrlHaus => "https://urlhaus.abuse.ch/downloads/csv_recent/".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct PhishTankEntry {
    url: String,
}

/// Parses a feed body into seed URLs, in feed order.
///
/// Blank entries are skipped. URL validity is not checked here; the target
/// generator drops seeds it cannot parse.
///
/// # Errors
///
/// Returns a description of the problem when a JSON feed is not an array of
/// objects carrying a `url` string, or when a CSV record is malformed. Text
/// feeds never fail.
pub fn parse_feed(kind: FeedKind, body: &str) -> Result<Vec<String>, String> {
    match kind {
        FeedKind::PhishTank => {
            let entries: Vec<PhishTankEntry> =
                serde_json::from_str(body).map_err(|e| e.to_string())?;
            Ok(entries
                .into_iter()
                .map(|entry| entry.url.trim().to_string())
                .filter(|url| !url.is_empty())
                .collect())
        }
        FeedKind::OpenPhish => Ok(parse_lines(body)),
        FeedKind::UrlHaus => parse_urlhaus_csv(body),
    }
}

/// Splits newline-delimited text into trimmed, non-empty entries.
pub(crate) fn parse_lines(body: &str) -> Vec<String> {
    body.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Takes the URL column (the third) from a URLhaus CSV dump.
fn parse_urlhaus_csv(body: &str) -> Result<Vec<String>, String> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .comment(Some(b'#'))
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(body.as_bytes());

    let mut urls = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| e.to_string())?;
        if let Some(url) = record.get(URLHAUS_URL_COLUMN).filter(|url| !url.is_empty()) {
            urls.push(url.to_string());
        }
    }
    Ok(urls)
}

/// Downloads and decodes one feed.
#[instrument(skip(client), fields(feed = ?kind))]
pub(crate) async fn fetch_feed(
    client: &Client,
    kind: FeedKind,
    url: &str,
) -> Result<Vec<String>, SeedError> {
    debug!(url, "fetching seed feed");

    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| SeedError::fetch(url, e))?;

    let status = response.status();
    if !status.is_success() {
        return Err(SeedError::status(url, status.as_u16()));
    }

    let body = response
        .text()
        .await
        .map_err(|e| SeedError::fetch(url, e))?;
    let seeds = parse_feed(kind, &body).map_err(|reason| SeedError::decode(url, reason))?;

    info!(url, seeds = seeds.len(), "fetched seed feed");
    Ok(seeds)
}

pub(crate) fn build_feed_client() -> Result<Client, SeedError> {
    Client::builder()
        .user_agent(user_agent::feed_user_agent())
        .timeout(Duration::from_secs(FEED_TIMEOUT_SECS))
        .gzip(true)
        .build()
        .map_err(SeedError::Client)
}
