//! Run-wide cancellation signal.

use tokio::sync::watch;

/// Creates a linked trigger/listener pair.
#[must_use]
pub fn shutdown_channel() -> (ShutdownTrigger, Shutdown) {
    let (tx, rx) = watch::channel(false);
    (ShutdownTrigger { tx }, Shutdown { rx })
}

/// Fires the shutdown signal. Held by the entry point (e.g. Ctrl-C handler).
#[derive(Debug)]
pub struct ShutdownTrigger {
    tx: watch::Sender<bool>,
}

impl ShutdownTrigger {
    /// Signals every listener. Idempotent.
    pub fn trigger(&self) {
        self.tx.send_replace(true);
    }
}

/// Listener side of the shutdown signal; clone one into every task.
#[derive(Debug, Clone)]
pub struct Shutdown {
    rx: watch::Receiver<bool>,
}

impl Shutdown {
    /// A listener that never fires.
    #[must_use]
    pub fn never() -> Self {
        let (_trigger, shutdown) = shutdown_channel();
        shutdown
    }

    /// Returns true once the signal has fired.
    #[must_use]
    pub fn is_triggered(&self) -> bool {
        *self.rx.borrow()
    }

    /// Completes when the signal fires. Pends forever if the trigger was
    /// dropped without firing.
    pub async fn cancelled(&self) {
        let mut rx = self.rx.clone();
        if rx.wait_for(|fired| *fired).await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}
