//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use kitscan_core::{DEFAULT_OUTPUT_DIR, DEFAULT_TIMEOUT_SECS, FeedKind};

/// Default `--concurrency`; mirrors `kitscan_core::DEFAULT_CONCURRENCY`.
const DEFAULT_CONCURRENCY_ARG: u16 = 20;

/// Hunt for phishing-kit archives left behind on phishing hosts.
///
/// Seed URLs come from public phishing feeds, or from standard input when it
/// is not a terminal. Every archive found is printed to stdout.
#[derive(Parser, Debug)]
#[command(name = "kitscan")]
#[command(author, version, about)]
pub struct Args {
    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,

    /// Number of concurrent fetch workers (1-200)
    #[arg(short = 'c', long, default_value_t = DEFAULT_CONCURRENCY_ARG, value_parser = clap::value_parser!(u16).range(1..=200))]
    pub concurrency: u16,

    /// Per-request timeout in seconds (1-3600)
    #[arg(short = 't', long, default_value_t = DEFAULT_TIMEOUT_SECS, value_parser = clap::value_parser!(u64).range(1..=3600))]
    pub timeout: u64,

    /// Save every archive found
    #[arg(short = 'd', long)]
    pub download: bool,

    /// Directory receiving saved archives and the index log
    #[arg(short = 'o', long, default_value = DEFAULT_OUTPUT_DIR)]
    pub output_dir: PathBuf,

    /// Seed feed to pull when stdin is a terminal (repeatable)
    #[arg(short = 'f', long = "feed", value_enum, default_values_t = [FeedArg::Phishtank])]
    pub feeds: Vec<FeedArg>,
}

/// Feed names accepted on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FeedArg {
    Phishtank,
    Openphish,
    Urlhaus,
}

impl From<FeedArg> for FeedKind {
    fn from(arg: FeedArg) -> Self {
        match arg {
            FeedArg::Phishtank => Self::PhishTank,
            FeedArg::Openphish => Self::OpenPhish,
            FeedArg::Urlhaus => Self::UrlHaus,
        }
    }
}

impl Args {
    /// Selected feeds, deduplicated in the order given.
    pub fn feed_kinds(&self) -> Vec<FeedKind> {
        let mut kinds: Vec<FeedKind> = Vec::new();
        for kind in self.feeds.iter().copied().map(FeedKind::from) {
            if !kinds.contains(&kind) {
                kinds.push(kind);
            }
        }
        kinds
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_default_args_parses_successfully() {
        let args = Args::try_parse_from(["kitscan"]).unwrap();
        assert_eq!(args.verbose, 0);
        assert!(!args.quiet);
        assert!(!args.download);
        assert_eq!(args.concurrency, 20); // DEFAULT_CONCURRENCY
        assert_eq!(args.timeout, 30); // DEFAULT_TIMEOUT_SECS
        assert_eq!(args.output_dir, PathBuf::from("./out"));
        assert_eq!(args.feeds, vec![FeedArg::Phishtank]);
    }

    #[test]
    fn test_cli_verbose_flag_increments_count() {
        let args = Args::try_parse_from(["kitscan", "-v"]).unwrap();
        assert_eq!(args.verbose, 1);

        let args = Args::try_parse_from(["kitscan", "-vv"]).unwrap();
        assert_eq!(args.verbose, 2);

        let args = Args::try_parse_from(["kitscan", "--verbose", "--verbose"]).unwrap();
        assert_eq!(args.verbose, 2);
    }

    #[test]
    fn test_cli_quiet_flag_sets_quiet() {
        let args = Args::try_parse_from(["kitscan", "-q"]).unwrap();
        assert!(args.quiet);

        let args = Args::try_parse_from(["kitscan", "--quiet"]).unwrap();
        assert!(args.quiet);
    }

    #[test]
    fn test_cli_help_flag_shows_usage() {
        let err = Args::try_parse_from(["kitscan", "--help"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
    }

    #[test]
    fn test_cli_version_flag_shows_version() {
        let err = Args::try_parse_from(["kitscan", "--version"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayVersion);
    }

    #[test]
    fn test_cli_invalid_flag_returns_error() {
        let err = Args::try_parse_from(["kitscan", "--invalid-flag"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::UnknownArgument);
    }

    // ==================== Concurrency Tests ====================

    #[test]
    fn test_cli_concurrency_short_and_long_flags() {
        let args = Args::try_parse_from(["kitscan", "-c", "5"]).unwrap();
        assert_eq!(args.concurrency, 5);

        let args = Args::try_parse_from(["kitscan", "--concurrency", "200"]).unwrap();
        assert_eq!(args.concurrency, 200);
    }

    #[test]
    fn test_cli_concurrency_default_matches_library() {
        assert_eq!(
            usize::from(DEFAULT_CONCURRENCY_ARG),
            kitscan_core::DEFAULT_CONCURRENCY
        );
        let args = Args::try_parse_from(["kitscan"]).unwrap();
        assert_eq!(usize::from(args.concurrency), kitscan_core::DEFAULT_CONCURRENCY);
    }

    #[test]
    fn test_cli_concurrency_zero_rejected() {
        let err = Args::try_parse_from(["kitscan", "-c", "0"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn test_cli_concurrency_over_max_rejected() {
        let err = Args::try_parse_from(["kitscan", "-c", "201"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    // ==================== Timeout Tests ====================

    #[test]
    fn test_cli_timeout_flag() {
        let args = Args::try_parse_from(["kitscan", "-t", "5"]).unwrap();
        assert_eq!(args.timeout, 5);

        let args = Args::try_parse_from(["kitscan", "--timeout", "120"]).unwrap();
        assert_eq!(args.timeout, 120);
    }

    #[test]
    fn test_cli_timeout_zero_rejected() {
        let err = Args::try_parse_from(["kitscan", "-t", "0"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    // ==================== Download Tests ====================

    #[test]
    fn test_cli_download_and_output_dir() {
        let args = Args::try_parse_from(["kitscan", "-d", "-o", "/tmp/kits"]).unwrap();
        assert!(args.download);
        assert_eq!(args.output_dir, PathBuf::from("/tmp/kits"));

        let args = Args::try_parse_from(["kitscan", "--download", "--output-dir", "kits"]).unwrap();
        assert!(args.download);
        assert_eq!(args.output_dir, PathBuf::from("kits"));
    }

    // ==================== Feed Tests ====================

    #[test]
    fn test_cli_feed_repeatable() {
        let args = Args::try_parse_from(["kitscan", "-f", "openphish", "--feed", "urlhaus"]).unwrap();
        assert_eq!(args.feeds, vec![FeedArg::Openphish, FeedArg::Urlhaus]);
        assert_eq!(args.feed_kinds(), vec![FeedKind::OpenPhish, FeedKind::UrlHaus]);
    }

    #[test]
    fn test_cli_feed_kinds_deduplicated() {
        let args =
            Args::try_parse_from(["kitscan", "-f", "urlhaus", "-f", "phishtank", "-f", "urlhaus"])
                .unwrap();
        assert_eq!(args.feed_kinds(), vec![FeedKind::UrlHaus, FeedKind::PhishTank]);
    }

    #[test]
    fn test_cli_unknown_feed_rejected() {
        let err = Args::try_parse_from(["kitscan", "-f", "nosuchfeed"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::InvalidValue);
    }
}
