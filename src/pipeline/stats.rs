//! Counters for a scan run.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Statistics from a scan run.
///
/// Updated concurrently by every stage; read by the progress display while
/// the run is in flight and by the entry point afterwards.
#[derive(Debug, Default)]
pub struct ScanStats {
    generated: AtomicUsize,
    probed: AtomicUsize,
    failed: AtomicUsize,
    direct_hits: AtomicUsize,
    directory_hits: AtomicUsize,
    saved: AtomicUsize,
    save_failed: AtomicUsize,
    interrupted: AtomicBool,
}

impl ScanStats {
    /// Creates a stats tracker with zero counts.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Candidates emitted by the generator.
    #[must_use]
    pub fn generated(&self) -> usize {
        self.generated.load(Ordering::SeqCst)
    }

    /// Candidates that produced a response.
    #[must_use]
    pub fn probed(&self) -> usize {
        self.probed.load(Ordering::SeqCst)
    }

    /// Candidates dropped on a network error.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.failed.load(Ordering::SeqCst)
    }

    /// Direct archive matches.
    #[must_use]
    pub fn direct_hits(&self) -> usize {
        self.direct_hits.load(Ordering::SeqCst)
    }

    /// Archives found through directory listings.
    #[must_use]
    pub fn directory_hits(&self) -> usize {
        self.directory_hits.load(Ordering::SeqCst)
    }

    /// All matches.
    #[must_use]
    pub fn matched(&self) -> usize {
        self.direct_hits() + self.directory_hits()
    }

    /// Archives written to disk.
    #[must_use]
    pub fn saved(&self) -> usize {
        self.saved.load(Ordering::SeqCst)
    }

    /// Archives that could not be fetched or written.
    #[must_use]
    pub fn save_failed(&self) -> usize {
        self.save_failed.load(Ordering::SeqCst)
    }

    /// Whether the run stopped on a shutdown signal.
    #[must_use]
    pub fn was_interrupted(&self) -> bool {
        self.interrupted.load(Ordering::SeqCst)
    }

    pub(crate) fn increment_generated(&self) {
        self.generated.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn increment_probed(&self) {
        self.probed.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn increment_failed(&self) {
        self.failed.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn increment_direct_hits(&self) {
        self.direct_hits.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn increment_directory_hits(&self) {
        self.directory_hits.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn increment_saved(&self) {
        self.saved.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn increment_save_failed(&self) {
        self.save_failed.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn mark_interrupted(&self) {
        self.interrupted.store(true, Ordering::SeqCst);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[test]
    fn test_scan_stats_default() {
        let stats = ScanStats::default();
        assert_eq!(stats.generated(), 0);
        assert_eq!(stats.matched(), 0);
        assert!(!stats.was_interrupted());
    }

    #[test]
    fn test_matched_sums_both_kinds() {
        let stats = ScanStats::new();
        stats.increment_direct_hits();
        stats.increment_directory_hits();
        stats.increment_directory_hits();
        assert_eq!(stats.matched(), 3);
    }

    #[test]
    fn test_scan_stats_thread_safe() {
        use std::thread;

        let stats = Arc::new(ScanStats::new());
        let mut handles = Vec::new();

        for _ in 0..8 {
            let stats = Arc::clone(&stats);
            handles.push(thread::spawn(move || {
                for _ in 0..100 {
                    stats.increment_probed();
                    stats.increment_saved();
                }
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(stats.probed(), 800);
        assert_eq!(stats.saved(), 800);
    }
}
