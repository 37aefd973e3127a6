//! Kitscan Core Library
//!
//! This library hunts for phishing-kit archives left exposed on the hosts
//! that serve known phishing pages. Seed URLs are expanded into candidate
//! paths, probed concurrently, and every response is classified as a direct
//! archive, an open directory listing that links to an archive, or a miss.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`seed`] - Seed URL sources (feeds and piped input)
//! - [`target`] - Candidate URL generation with run-scoped deduplication
//! - [`probe`] - HTTP probing with bounded body buffering
//! - [`classify`] - Direct/open-directory archive classification
//! - [`save`] - Collision-safe persistence and the index log
//! - [`pipeline`] - Bounded multi-stage worker pipeline

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod classify;
pub mod config;
pub mod pipeline;
pub mod probe;
pub mod save;
pub mod seed;
pub mod target;
mod user_agent;

// Re-export commonly used types
pub use classify::{Match, Verdict, classify};
pub use config::{
    ConfigError, DEFAULT_CONCURRENCY, DEFAULT_OUTPUT_DIR, DEFAULT_TIMEOUT_SECS, MAX_BODY_BYTES,
    ScanConfig,
};
pub use pipeline::{
    MatchSink, Pipeline, PipelineError, ScanStats, Shutdown, ShutdownTrigger, shutdown_channel,
};
pub use probe::{ProbeError, ProbeResponse, Prober};
pub use save::{ArtifactStore, SaveError, SavedArtifact, derive_filename};
pub use seed::{FeedKind, FeedSource, ReaderSource, SeedError, SeedSource, parse_feed};
pub use target::TargetGenerator;
