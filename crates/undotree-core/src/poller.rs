//! Periodic pull driver for every tracked file.

use crate::error::SyncError;
use crate::sync::PullOutcome;
use crate::tracker::FileTracker;
use futures::future::join_all;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

pub struct Poller {
    tracker: FileTracker,
    interval: Duration,
}

impl Poller {
    pub fn new(tracker: FileTracker, interval: Duration) -> Self {
        Self { tracker, interval }
    }

    /// Pull every file tracked at the start of the tick.
    ///
    /// Files are polled concurrently and a failure on one never stops the
    /// others. Files closed mid-tick are skipped quietly.
    pub async fn tick(&self) -> Vec<(String, Result<PullOutcome, SyncError>)> {
        let files = self.tracker.tracked_files();
        let pulls = files.iter().map(|file_id| self.tracker.pull(file_id));
        let results = join_all(pulls).await;

        let mut report = Vec::with_capacity(files.len());
        for (file_id, result) in files.into_iter().zip(results) {
            match &result {
                Ok(outcome) if !outcome.applied.is_empty() || !outcome.skipped.is_empty() => {
                    debug!(
                        "[Poller] {}: {} applied, {} skipped",
                        file_id,
                        outcome.applied.len(),
                        outcome.skipped.len()
                    );
                }
                Ok(_) => {}
                Err(SyncError::NotTracked(_)) => {
                    debug!("[Poller] {} closed during tick", file_id);
                }
                Err(e) => warn!("[Poller] Error pulling {}: {}", file_id, e),
            }
            report.push((file_id, result));
        }
        report
    }

    /// Run [`Poller::tick`] on a fixed interval until the handle is shut down.
    pub fn spawn(self) -> PollerHandle {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(async move {
            let mut ticker = interval(self.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            info!("[Poller] Polling every {:?}", self.interval);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        self.tick().await;
                    }
                    _ = shutdown_rx.changed() => break,
                }
            }
            info!("[Poller] Stopped");
        });

        PollerHandle {
            shutdown: shutdown_tx,
            task,
        }
    }
}

pub struct PollerHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl PollerHandle {
    /// Stop polling and wait for an in-progress tick to finish.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        if let Err(e) = self.task.await {
            warn!("[Poller] Task ended abnormally: {}", e);
        }
    }
}
