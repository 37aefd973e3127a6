//! Filename derivation for saved archives.
//!
//! A saved archive is named after its full source URL so the name alone
//! tells an analyst where the kit came from. The mapping is deterministic:
//! the same URL always yields the same filename, which is what makes the
//! store's never-overwrite rule detect repeat downloads.

use std::path::{Component, Path};

use sha2::{Digest, Sha256};

/// Conservative filename length limit (bytes) shared by ext4, NTFS, APFS.
pub const MAX_FILENAME_BYTES: usize = 255;

/// Bytes kept from the end of an over-long name (covers the extension).
const TAIL_BYTES: usize = 48;

/// Hex digits of the full-name digest spliced into truncated names.
const DIGEST_HEX_CHARS: usize = 12;

/// Derives a filesystem-safe filename from a source URL.
///
/// Separators and shell-hostile characters (`/`, `:`, `&`, `<`, `>`,
/// whitespace, parentheses, and the usual Windows reserved set) become `_`.
/// Names longer than [`MAX_FILENAME_BYTES`] keep their head and tail and get
/// a digest of the full name in the middle, so two long URLs sharing a
/// prefix and an extension still map to different files.
#[must_use]
pub fn derive_filename(source_url: &str) -> String {
    let sanitized: String = source_url
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '&' | '<' | '>' | '(' | ')' | '*' | '?' | '"' | '|' => '_',
            c if c.is_whitespace() || c.is_control() => '_',
            c => c,
        })
        .collect();

    let sanitized = if sanitized.is_empty() || !is_safe_filename_segment(&sanitized) {
        sanitized.replace('.', "_")
    } else {
        sanitized
    };
    let sanitized = if sanitized.is_empty() {
        "_".to_string()
    } else {
        sanitized
    };

    truncate_middle(&sanitized)
}

fn truncate_middle(name: &str) -> String {
    if name.len() <= MAX_FILENAME_BYTES {
        return name.to_string();
    }

    let digest = hex_digest(name.as_bytes());
    let marker = format!("~{}~", &digest[..DIGEST_HEX_CHARS]);
    let head_budget = MAX_FILENAME_BYTES - TAIL_BYTES - marker.len();

    let head = prefix_within(name, head_budget);
    let tail = suffix_within(name, TAIL_BYTES);
    format!("{head}{marker}{tail}")
}

/// Lowercase hex SHA-256 of `bytes`.
pub(crate) fn hex_digest(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

fn prefix_within(s: &str, max_bytes: usize) -> &str {
    let mut end = max_bytes.min(s.len());
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

fn suffix_within(s: &str, max_bytes: usize) -> &str {
    let mut start = s.len().saturating_sub(max_bytes);
    while !s.is_char_boundary(start) {
        start += 1;
    }
    &s[start..]
}

fn is_safe_filename_segment(name: &str) -> bool {
    !Path::new(name).components().any(|component| {
        matches!(
            component,
            Component::CurDir | Component::ParentDir | Component::RootDir | Component::Prefix(_)
        )
    })
}
