//! The staged discovery pipeline.
//!
//! ```text
//! seeds ─▶ generator ─▶ [fetch × N] ─▶ [classify × N/2] ─▶ [save × S]
//!             (1)          probe          verdicts           disk
//! ```
//!
//! Stages are joined by bounded channels (capacity 1 by default), so a
//! saturated stage blocks its upstream sender and the back-pressure reaches
//! the generator. A stage ends when its input channel closes and its workers
//! exit; closure then propagates downstream. Errors never cross a channel:
//! a failed item is logged and dropped where it failed.
//!
//! A [`Shutdown`] signal stops the generator and aborts in-flight probes so
//! the remaining stages drain quickly.

mod shutdown;
mod stats;

pub use shutdown::{Shutdown, ShutdownTrigger, shutdown_channel};
pub use stats::ScanStats;

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::Mutex;
use tokio::sync::mpsc::{self, Receiver, Sender};
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use crate::classify::{Match, Verdict, classify};
use crate::config::{ConfigError, ScanConfig};
use crate::probe::{ProbeError, ProbeResponse, Prober};
use crate::save::{ArtifactStore, SaveError};
use crate::target::TargetGenerator;

/// Callback invoked once per match, from classify workers.
pub type MatchSink = Arc<dyn Fn(&Match) + Send + Sync>;

/// Errors raised while building a pipeline. A running pipeline never fails.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The configuration was rejected.
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// The probe client could not be built.
    #[error(transparent)]
    Client(#[from] ProbeError),
}

/// An archive body waiting to be written.
#[derive(Debug)]
struct SaveJob {
    source_url: String,
    body: Vec<u8>,
}

type SharedReceiver<T> = Arc<Mutex<Receiver<T>>>;

/// A configured scan, ready to run.
pub struct Pipeline {
    config: ScanConfig,
    prober: Prober,
    store: Arc<ArtifactStore>,
    sink: MatchSink,
    stats: Arc<ScanStats>,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("config", &self.config)
            .field("store", &self.store)
            .finish_non_exhaustive()
    }
}

impl Pipeline {
    /// Validates `config` and builds the probe client.
    ///
    /// Matches are discarded until a sink is attached with
    /// [`with_sink`](Self::with_sink).
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError`] for an invalid configuration or if the HTTP
    /// client cannot be constructed.
    #[instrument(level = "debug", skip(config), fields(concurrency = config.concurrency))]
    pub fn new(config: ScanConfig) -> Result<Self, PipelineError> {
        config.validate()?;
        let prober = Prober::new(config.timeout, config.max_body_bytes)?;
        let store = Arc::new(ArtifactStore::new(config.output_dir.clone()));

        debug!(
            concurrency = config.concurrency,
            classify_workers = config.classify_workers(),
            save_workers = config.save_workers,
            download = config.download,
            timeout_secs = config.timeout.as_secs(),
            "creating pipeline"
        );

        Ok(Self {
            config,
            prober,
            store,
            sink: Arc::new(|_: &Match| {}),
            stats: Arc::new(ScanStats::new()),
        })
    }

    /// Attaches the callback receiving every match.
    #[must_use]
    pub fn with_sink<F>(mut self, sink: F) -> Self
    where
        F: Fn(&Match) + Send + Sync + 'static,
    {
        self.sink = Arc::new(sink);
        self
    }

    /// Live counters for this pipeline.
    #[must_use]
    pub fn stats(&self) -> Arc<ScanStats> {
        Arc::clone(&self.stats)
    }

    /// Runs every stage to completion and returns the final counters.
    ///
    /// Returns once all seeds have been expanded, probed, classified and
    /// saved, or once `shutdown` fires and the stages have drained.
    #[instrument(skip(self, seeds, shutdown), fields(seeds = seeds.len()))]
    pub async fn run(&self, seeds: Vec<String>, shutdown: Shutdown) -> Arc<ScanStats> {
        let capacity = self.config.channel_capacity;
        let (target_tx, target_rx) = mpsc::channel::<String>(capacity);
        let (response_tx, response_rx) = mpsc::channel::<ProbeResponse>(capacity);

        let mut handles: Vec<JoinHandle<()>> = Vec::new();

        info!("starting scan");

        handles.push(tokio::spawn(generate(
            seeds,
            target_tx,
            Arc::clone(&self.stats),
            shutdown.clone(),
        )));

        let target_rx = Arc::new(Mutex::new(target_rx));
        for worker in 0..self.config.concurrency {
            handles.push(tokio::spawn(fetch_worker(
                worker,
                Arc::clone(&target_rx),
                response_tx.clone(),
                self.prober.clone(),
                Arc::clone(&self.stats),
                shutdown.clone(),
            )));
        }
        drop(response_tx);

        let save_tx = if self.config.download {
            let (save_tx, save_rx) = mpsc::channel::<SaveJob>(capacity);
            let save_rx = Arc::new(Mutex::new(save_rx));
            for worker in 0..self.config.save_workers {
                handles.push(tokio::spawn(save_worker(
                    worker,
                    Arc::clone(&save_rx),
                    Arc::clone(&self.store),
                    Arc::clone(&self.stats),
                )));
            }
            Some(save_tx)
        } else {
            None
        };

        let response_rx = Arc::new(Mutex::new(response_rx));
        for worker in 0..self.config.classify_workers() {
            let stage = ClassifyStage {
                prober: self.prober.clone(),
                save_tx: save_tx.clone(),
                sink: Arc::clone(&self.sink),
                stats: Arc::clone(&self.stats),
                max_body_bytes: self.config.max_body_bytes,
                shutdown: shutdown.clone(),
            };
            handles.push(tokio::spawn(stage.run(worker, Arc::clone(&response_rx))));
        }
        drop(save_tx);

        debug!(task_count = handles.len(), "waiting for stages to drain");
        for handle in handles {
            if let Err(e) = handle.await {
                warn!(error = %e, "pipeline task panicked");
            }
        }

        if shutdown.is_triggered() {
            self.stats.mark_interrupted();
        }

        info!(
            generated = self.stats.generated(),
            probed = self.stats.probed(),
            failed = self.stats.failed(),
            matched = self.stats.matched(),
            saved = self.stats.saved(),
            interrupted = self.stats.was_interrupted(),
            "scan complete"
        );

        Arc::clone(&self.stats)
    }
}

/// Sends `item`, giving up if the receiver is gone or shutdown fires first.
async fn send_or_cancel<T>(tx: &Sender<T>, item: T, shutdown: &Shutdown) -> bool {
    tokio::select! {
        biased;
        () = shutdown.cancelled() => false,
        result = tx.send(item) => result.is_ok(),
    }
}

/// Takes the next item from a receiver shared by several workers.
async fn next_item<T>(rx: &SharedReceiver<T>) -> Option<T> {
    rx.lock().await.recv().await
}

/// Single producer: owns the dedup set, so it needs no lock.
async fn generate(
    seeds: Vec<String>,
    tx: Sender<String>,
    stats: Arc<ScanStats>,
    shutdown: Shutdown,
) {
    for target in TargetGenerator::targets(seeds) {
        if shutdown.is_triggered() || !send_or_cancel(&tx, target, &shutdown).await {
            debug!("generator stopping early");
            break;
        }
        stats.increment_generated();
    }
    debug!(generated = stats.generated(), "generator finished");
}

async fn fetch_worker(
    worker: usize,
    targets: SharedReceiver<String>,
    tx: Sender<ProbeResponse>,
    prober: Prober,
    stats: Arc<ScanStats>,
    shutdown: Shutdown,
) {
    while let Some(url) = next_item(&targets).await {
        debug!(worker, url = %url, "attempting");
        match prober.fetch(&url, &shutdown).await {
            Ok(response) => {
                stats.increment_probed();
                if !send_or_cancel(&tx, response, &shutdown).await {
                    break;
                }
            }
            Err(ProbeError::Cancelled { .. }) => break,
            Err(e) => {
                stats.increment_failed();
                debug!(worker, error = %e, "probe failed");
            }
        }
    }
}

struct ClassifyStage {
    prober: Prober,
    save_tx: Option<Sender<SaveJob>>,
    sink: MatchSink,
    stats: Arc<ScanStats>,
    max_body_bytes: u64,
    shutdown: Shutdown,
}

impl ClassifyStage {
    async fn run(self, worker: usize, responses: SharedReceiver<ProbeResponse>) {
        while let Some(response) = next_item(&responses).await {
            let max_size = self.max_body_bytes;
            // HTML parsing of large bodies is CPU-bound.
            let joined = tokio::task::spawn_blocking(move || {
                let verdict = classify(&response, max_size);
                (response, verdict)
            })
            .await;
            let (response, verdict) = match joined {
                Ok(pair) => pair,
                Err(e) => {
                    warn!(worker, error = %e, "classifier task failed");
                    continue;
                }
            };

            if !self.handle(worker, response, verdict).await {
                break;
            }
        }
    }

    /// Reports and forwards one verdict. Returns false once the pipeline is
    /// shutting down.
    async fn handle(&self, worker: usize, response: ProbeResponse, verdict: Verdict) -> bool {
        match verdict {
            Verdict::Miss => {
                debug!(worker, url = %response.url, status = response.status, "miss");
                true
            }
            Verdict::DirectArchive { url } => {
                self.stats.increment_direct_hits();
                info!(url = %url, "found archive");
                (self.sink)(&Match::DirectArchive { url: url.clone() });
                self.forward(url, response.body).await
            }
            Verdict::DirectoryArchive { base_url, archives } => {
                for resolved_url in archives {
                    self.stats.increment_directory_hits();
                    info!(base = %base_url, url = %resolved_url, "found archive in open directory");
                    (self.sink)(&Match::DirectoryArchive {
                        base_url: base_url.clone(),
                        resolved_url: resolved_url.clone(),
                    });
                    if self.save_tx.is_some() && !self.follow_up(&resolved_url).await {
                        return false;
                    }
                }
                true
            }
        }
    }

    /// Fetches an archive linked from a listing and queues it for saving.
    async fn follow_up(&self, url: &str) -> bool {
        match self.prober.fetch(url, &self.shutdown).await {
            Ok(response) if response.is_success() => {
                self.forward(response.url, response.body).await
            }
            Ok(response) => {
                self.stats.increment_save_failed();
                debug!(url, status = response.status, "listed archive not downloadable");
                true
            }
            Err(ProbeError::Cancelled { .. }) => false,
            Err(e) => {
                self.stats.increment_save_failed();
                debug!(url, error = %e, "listed archive fetch failed");
                true
            }
        }
    }

    async fn forward(&self, source_url: String, body: Vec<u8>) -> bool {
        match &self.save_tx {
            Some(tx) => send_or_cancel(tx, SaveJob { source_url, body }, &self.shutdown).await,
            None => true,
        }
    }
}

async fn save_worker(
    worker: usize,
    jobs: SharedReceiver<SaveJob>,
    store: Arc<ArtifactStore>,
    stats: Arc<ScanStats>,
) {
    while let Some(job) = next_item(&jobs).await {
        match store.save(&job.source_url, &job.body).await {
            Ok(_) => stats.increment_saved(),
            Err(SaveError::Conflict { path }) => {
                stats.increment_save_failed();
                debug!(worker, url = %job.source_url, path = %path.display(), "archive already saved");
            }
            Err(e) => {
                stats.increment_save_failed();
                warn!(worker, url = %job.source_url, error = %e, "failed to save archive");
            }
        }
    }
}
