//! Response classification.
//!
//! Each [`ProbeResponse`] lands in exactly one bucket:
//!
//! 1. anything other than `200` is a miss;
//! 2. a `.zip` URL with a plausible length and a zip content type is a
//!    **direct archive** (no body parsing);
//! 3. any other non-empty body is parsed as HTML, whatever its declared
//!    content type; a page whose title carries the `Index of /` listing
//!    marker and which links to `.zip` files is a **directory archive**, one
//!    match per linked archive;
//! 4. everything else is a miss.
//!
//! Classification is pure: it never touches the network.

use scraper::{Html, Selector};
use tracing::trace;
use url::Url;

use crate::probe::ProbeResponse;

/// Title marker emitted by Apache, nginx and friends for autoindex pages.
const LISTING_MARKER: &str = "Index of /";

const ARCHIVE_EXTENSION: &str = ".zip";

/// One archive found by the classifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Match {
    /// The candidate URL itself serves an archive.
    DirectArchive {
        /// The archive URL.
        url: String,
    },
    /// The candidate URL is a directory listing that links to an archive.
    DirectoryArchive {
        /// The listing page URL.
        base_url: String,
        /// Absolute URL of the linked archive.
        resolved_url: String,
    },
}

impl Match {
    /// URL of the archive itself.
    #[must_use]
    pub fn archive_url(&self) -> &str {
        match self {
            Self::DirectArchive { url } => url,
            Self::DirectoryArchive { resolved_url, .. } => resolved_url,
        }
    }
}

/// The outcome of classifying one response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// Nothing of interest.
    Miss,
    /// The response body is the archive.
    DirectArchive {
        /// The archive URL.
        url: String,
    },
    /// The response is a listing with one or more archive links.
    DirectoryArchive {
        /// The listing page URL.
        base_url: String,
        /// Resolved archive URLs, in page order, without duplicates.
        archives: Vec<String>,
    },
}

impl Verdict {
    /// Returns true for [`Verdict::Miss`].
    #[must_use]
    pub fn is_miss(&self) -> bool {
        matches!(self, Self::Miss)
    }

    /// Flattens the verdict into individual matches.
    #[must_use]
    pub fn matches(&self) -> Vec<Match> {
        match self {
            Self::Miss => Vec::new(),
            Self::DirectArchive { url } => vec![Match::DirectArchive { url: url.clone() }],
            Self::DirectoryArchive { base_url, archives } => archives
                .iter()
                .map(|resolved| Match::DirectoryArchive {
                    base_url: base_url.clone(),
                    resolved_url: resolved.clone(),
                })
                .collect(),
        }
    }
}

/// Classifies a response. `max_size` bounds the accepted declared length of
/// a direct archive.
#[must_use]
pub fn classify(response: &ProbeResponse, max_size: u64) -> Verdict {
    if response.status != 200 {
        return Verdict::Miss;
    }

    if is_direct_archive(response, max_size) {
        return Verdict::DirectArchive {
            url: response.url.clone(),
        };
    }

    if response.body.is_empty() {
        return Verdict::Miss;
    }

    let archives: Vec<String> = listing_archive_hrefs(&response.body_text())
        .into_iter()
        .filter_map(|href| resolve_href(&response.url, &href))
        .fold(Vec::new(), |mut acc, url| {
            if !acc.contains(&url) {
                acc.push(url);
            }
            acc
        });

    if archives.is_empty() {
        Verdict::Miss
    } else {
        Verdict::DirectoryArchive {
            base_url: response.url.clone(),
            archives,
        }
    }
}

fn is_direct_archive(response: &ProbeResponse, max_size: u64) -> bool {
    response.url.ends_with(ARCHIVE_EXTENSION)
        && response
            .content_length
            .is_some_and(|len| len > 0 && len < max_size)
        && response
            .content_type
            .as_deref()
            .is_some_and(|ct| ct.to_ascii_lowercase().contains("zip"))
}

/// Returns the raw hrefs of every archive anchor on a directory listing page,
/// or nothing when the page is not a listing.
fn listing_archive_hrefs(html: &str) -> Vec<String> {
    let (Ok(title_selector), Ok(anchor_selector)) =
        (Selector::parse("title"), Selector::parse("a"))
    else {
        return Vec::new();
    };

    let document = Html::parse_document(html);
    let title: String = document
        .select(&title_selector)
        .flat_map(|el| el.text())
        .collect();
    if !title.contains(LISTING_MARKER) {
        return Vec::new();
    }

    document
        .select(&anchor_selector)
        .filter_map(|anchor| {
            let href = anchor.value().attr("href")?.trim();
            let text: String = anchor.text().collect();
            (text.contains(ARCHIVE_EXTENSION) || href.contains(ARCHIVE_EXTENSION))
                .then(|| href.to_string())
        })
        .filter(|href| !href.is_empty())
        .inspect(|href| trace!(href, "listing links archive"))
        .collect()
}

/// Resolves a listing href against the listing URL.
///
/// Absolute hrefs are kept, root-relative hrefs hang off the origin, and
/// everything else is appended to the base, inserting `/` unless the base
/// already ends with one.
pub(crate) fn resolve_href(base: &str, href: &str) -> Option<String> {
    let lower = href.to_ascii_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") {
        return Some(href.to_string());
    }

    if href.starts_with("//") {
        let scheme = Url::parse(base).ok()?.scheme().to_string();
        return Some(format!("{scheme}:{href}"));
    }

    if href.starts_with('/') {
        let origin = Url::parse(base).ok()?.origin().ascii_serialization();
        return Some(format!("{origin}{href}"));
    }

    let href = href.strip_prefix("./").unwrap_or(href);
    if base.ends_with('/') {
        Some(format!("{base}{href}"))
    } else {
        Some(format!("{base}/{href}"))
    }
}
