//! Candidate URL generation.
//!
//! Every seed URL is walked from its full path up to the host root. Each
//! level becomes a candidate, immediately followed by a `.zip` guess for that
//! level:
//!
//! ```text
//! http://example.com/foo/bar
//! http://example.com/foo/bar.zip
//! http://example.com/foo/
//! http://example.com/foo.zip
//! http://example.com/
//! ```
//!
//! A single dedup set spans the whole run, so a URL reachable from several
//! seeds is emitted only at its first occurrence.
//!
//! # Example
//!
//! ```
//! use kitscan_core::target::TargetGenerator;
//!
//! let targets: Vec<String> =
//!     TargetGenerator::targets(vec!["http://example.com/kit/".to_string()]).collect();
//! assert_eq!(targets, vec![
//!     "http://example.com/kit/",
//!     "http://example.com/kit.zip",
//!     "http://example.com/",
//! ]);
//! ```

use std::collections::{HashSet, VecDeque};

use tracing::debug;
use url::Url;

/// Suffix appended to every path level to guess a sibling archive.
const ZIP_SUFFIX: &str = ".zip";

/// Expands seeds into deduplicated candidate URLs.
///
/// The generator owns its dedup set exclusively; share a generator by moving
/// it into the single producer task, never by locking it.
#[derive(Debug, Default)]
pub struct TargetGenerator {
    seen: HashSet<String>,
}

impl TargetGenerator {
    /// Creates a generator with an empty dedup set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a lazy iterator of candidates for the given seeds.
    pub fn targets<I>(seeds: I) -> Targets<I::IntoIter>
    where
        I: IntoIterator<Item = String>,
    {
        Targets {
            generator: Self::new(),
            seeds: seeds.into_iter(),
            pending: VecDeque::new(),
        }
    }

    /// Number of distinct URLs seen so far in this run.
    #[must_use]
    pub fn seen_count(&self) -> usize {
        self.seen.len()
    }

    /// Expands one seed into the candidates not yet emitted in this run.
    ///
    /// Malformed seeds, and seeds without an http(s) scheme or host, yield
    /// nothing.
    pub fn expand(&mut self, seed: &str) -> Vec<String> {
        let Some((origin, path)) = split_seed(seed) else {
            debug!(seed, "skipping unparseable seed");
            return Vec::new();
        };

        let segments: Vec<&str> = path
            .strip_prefix('/')
            .unwrap_or(path.as_str())
            .split('/')
            .collect();
        let mut out = Vec::new();

        for depth in (0..=segments.len()).rev() {
            let level_path = if depth == segments.len() {
                path.clone()
            } else if depth == 0 {
                "/".to_string()
            } else {
                format!("/{}/", segments[..depth].join("/"))
            };

            let level_url = format!("{origin}{level_path}");
            if !self.seen.insert(level_url.clone()) {
                continue;
            }
            out.push(level_url);

            if let Some(zip_url) = zip_guess(&origin, &level_path)
                && self.seen.insert(zip_url.clone())
            {
                out.push(zip_url);
            }
        }

        out
    }
}

/// Lazy candidate stream produced by [`TargetGenerator::targets`].
///
/// Seeds are expanded one at a time as the consumer pulls, so a slow
/// consumer holds back seed expansion.
#[derive(Debug)]
pub struct Targets<I> {
    generator: TargetGenerator,
    seeds: I,
    pending: VecDeque<String>,
}

impl<I> Iterator for Targets<I>
where
    I: Iterator<Item = String>,
{
    type Item = String;

    fn next(&mut self) -> Option<String> {
        loop {
            if let Some(next) = self.pending.pop_front() {
                return Some(next);
            }
            let seed = self.seeds.next()?;
            self.pending.extend(self.generator.expand(&seed));
        }
    }
}

/// Splits a seed into `scheme://host[:port]` and its path.
///
/// Query, fragment and credentials are dropped.
fn split_seed(seed: &str) -> Option<(String, String)> {
    let parsed = Url::parse(seed.trim()).ok()?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return None;
    }
    let host = parsed.host_str()?;
    let origin = match parsed.port() {
        Some(port) => format!("{}://{host}:{port}", parsed.scheme()),
        None => format!("{}://{host}", parsed.scheme()),
    };
    Some((origin, parsed.path().to_string()))
}

/// Builds the `.zip` guess for one path level, if it is worth probing.
///
/// Guesses off the host root (`http://host/.zip`, `http://host.zip`) are
/// suppressed.
fn zip_guess(origin: &str, level_path: &str) -> Option<String> {
    let trimmed = level_path.trim_end_matches('/');
    if trimmed.is_empty() {
        return None;
    }
    let guess = format!("{origin}{trimmed}{ZIP_SUFFIX}");
    if guess.ends_with("/.zip") || guess.matches('/').count() < 3 {
        return None;
    }
    Some(guess)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn expand_all(seeds: &[&str]) -> Vec<String> {
        TargetGenerator::targets(seeds.iter().map(|s| (*s).to_string())).collect()
    }

    #[test]
    fn test_expand_two_level_path() {
        assert_eq!(
            expand_all(&["http://example.com/foo/bar"]),
            vec![
                "http://example.com/foo/bar",
                "http://example.com/foo/bar.zip",
                "http://example.com/foo/",
                "http://example.com/foo.zip",
                "http://example.com/",
            ]
        );
    }

    #[test]
    fn test_root_seed_has_no_zip_guess() {
        assert_eq!(
            expand_all(&["http://example.com/"]),
            vec!["http://example.com/"]
        );
        assert_eq!(
            expand_all(&["http://example.com"]),
            vec!["http://example.com/"]
        );
    }

    #[test]
    fn test_trailing_slash_seed() {
        assert_eq!(
            expand_all(&["https://bad.test/secure/login/"]),
            vec![
                "https://bad.test/secure/login/",
                "https://bad.test/secure/login.zip",
                "https://bad.test/secure/",
                "https://bad.test/secure.zip",
                "https://bad.test/",
            ]
        );
    }

    #[test]
    fn test_never_emits_host_level_zip() {
        let targets = expand_all(&["http://example.com/a/b/c/d.php", "http://x.test/"]);
        for target in &targets {
            assert!(!target.ends_with("/.zip"), "host-level guess: {target}");
            assert!(!target.ends_with(".com.zip"), "host-level guess: {target}");
            if target.ends_with(".zip") {
                assert!(target.matches('/').count() >= 3);
            }
        }
    }

    #[test]
    fn test_dedup_is_run_scoped() {
        let targets = expand_all(&[
            "http://example.com/foo/bar",
            "http://example.com/foo/baz",
        ]);
        assert_eq!(
            targets,
            vec![
                "http://example.com/foo/bar",
                "http://example.com/foo/bar.zip",
                "http://example.com/foo/",
                "http://example.com/foo.zip",
                "http://example.com/",
                "http://example.com/foo/baz",
                "http://example.com/foo/baz.zip",
            ]
        );
    }

    #[test]
    fn test_no_duplicates_across_many_seeds() {
        let seeds = [
            "http://a.test/x/y/z",
            "http://a.test/x/y",
            "http://a.test/x/y/",
            "http://a.test/x/y/z?session=1",
            "http://b.test/x/y",
            "http://a.test/x/y/z#frag",
        ];
        let targets = expand_all(&seeds);
        let unique: HashSet<&String> = targets.iter().collect();
        assert_eq!(unique.len(), targets.len(), "duplicates in {targets:?}");
    }

    #[test]
    fn test_malformed_seeds_are_skipped() {
        assert_eq!(
            expand_all(&["not a url", "ftp://files.test/kit", "http://ok.test/a"]),
            vec!["http://ok.test/a", "http://ok.test/a.zip", "http://ok.test/"]
        );
    }

    #[test]
    fn test_port_is_preserved_and_query_dropped() {
        let targets = expand_all(&["http://127.0.0.1:8080/kit/index.php?id=4"]);
        assert_eq!(targets[0], "http://127.0.0.1:8080/kit/index.php");
        assert!(targets.contains(&"http://127.0.0.1:8080/kit.zip".to_string()));
        assert_eq!(targets.last().unwrap(), "http://127.0.0.1:8080/");
    }

    #[test]
    fn test_seed_order_is_preserved() {
        let targets = expand_all(&["http://one.test/a", "http://two.test/b"]);
        let first_two = targets.iter().position(|t| t.contains("two.test")).unwrap();
        let last_one = targets.iter().rposition(|t| t.contains("one.test")).unwrap();
        assert!(last_one < first_two);
    }

    #[test]
    fn test_expand_reports_seen_count() {
        let mut generator = TargetGenerator::new();
        let first = generator.expand("http://example.com/foo/bar");
        assert_eq!(first.len(), 5);
        assert_eq!(generator.seen_count(), 5);
        assert!(generator.expand("http://example.com/foo/bar").is_empty());
    }
}
