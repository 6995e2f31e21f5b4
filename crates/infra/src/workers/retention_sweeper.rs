use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::job_store::{JobStore, StoreError};

/// How long records live and how often expired ones are swept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionPolicy {
    /// Records whose `created_at` is older than `now - window` are removed.
    pub window: chrono::Duration,
    pub sweep_interval: Duration,
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self {
            window: jobboard_core::retention_window(),
            sweep_interval: Duration::from_secs(60),
        }
    }
}

impl RetentionPolicy {
    pub fn with_sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = interval;
        self
    }

    /// Oldest `created_at` still inside the window at `now`.
    pub fn cutoff(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now - self.window
    }
}

/// Handle to stop and join a background worker.
#[derive(Debug)]
pub struct WorkerHandle {
    shutdown: oneshot::Sender<()>,
    join: JoinHandle<()>,
}

impl WorkerHandle {
    /// Request graceful shutdown and wait for the worker to stop.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(());
        if let Err(err) = self.join.await {
            if err.is_panic() {
                warn!(error = %err, "retention sweeper panicked");
            }
        }
    }
}

/// Periodic purge of records older than the retention window.
///
/// - Runs on its own tokio task; list/insert never wait on it
/// - First sweep happens immediately, then every `sweep_interval`
/// - A failed sweep is logged and retried on the next tick
#[derive(Debug)]
pub struct RetentionSweeper;

impl RetentionSweeper {
    /// Spawn the sweep loop. Must be called from within a tokio runtime.
    pub fn spawn<S>(store: S, policy: RetentionPolicy) -> WorkerHandle
    where
        S: JobStore + 'static,
    {
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let join = tokio::spawn(sweep_loop(store, policy, shutdown_rx));

        WorkerHandle {
            shutdown: shutdown_tx,
            join,
        }
    }

    /// Run a single sweep relative to `now`.
    pub async fn sweep_once<S>(store: &S, policy: &RetentionPolicy, now: DateTime<Utc>) -> Result<u64, StoreError>
    where
        S: JobStore + ?Sized,
    {
        store.purge_expired(policy.cutoff(now)).await
    }
}

async fn sweep_loop<S: JobStore>(store: S, policy: RetentionPolicy, mut shutdown_rx: oneshot::Receiver<()>) {
    info!(
        window_days = policy.window.num_days(),
        interval_secs = policy.sweep_interval.as_secs(),
        "retention sweeper started"
    );

    let mut ticker = tokio::time::interval(policy.sweep_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = &mut shutdown_rx => break,
            _ = ticker.tick() => {
                match RetentionSweeper::sweep_once(&store, &policy, Utc::now()).await {
                    Ok(0) => debug!("retention sweep found nothing to remove"),
                    Ok(removed) => info!(removed, "retention sweep removed expired jobs"),
                    Err(err) => warn!(error = %err, "retention sweep failed"),
                }
            }
        }
    }

    info!("retention sweeper stopped");
}
