//! Refresh Poller: re-runs the aggregation on a fixed cadence.
//!
//! The latest result lives in a `watch` channel. Timer passes and manual
//! refreshes publish through the same channel, so whichever resolves last
//! wins. Once the token is cancelled nothing more is published, even by a
//! pass that was already in flight.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::racks::AggregationResult;
use crate::DashboardEngine;

pub type Snapshot = Option<Arc<AggregationResult>>;

#[derive(Clone)]
pub struct RefreshPoller {
    engine: DashboardEngine,
    tx: Arc<watch::Sender<Snapshot>>,
    token: CancellationToken,
}

impl RefreshPoller {
    /// Creates the poller without starting the timer.
    pub fn new(engine: DashboardEngine, token: CancellationToken) -> Self {
        let (tx, _rx) = watch::channel(None);
        Self {
            engine,
            tx: Arc::new(tx),
            token,
        }
    }

    /// Starts the timer task. The first pass runs immediately.
    pub fn spawn(engine: DashboardEngine, every: Duration, token: CancellationToken) -> (Self, JoinHandle<()>) {
        let poller = Self::new(engine, token);
        let task = poller.clone();

        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = task.token.cancelled() => break,
                    _ = interval.tick() => {}
                }
                task.run_pass().await;
            }
            tracing::debug!("[Poller] Stopped");
        });

        (poller, handle)
    }

    /// Runs a pass now and publishes it. `None` once cancelled.
    pub async fn trigger(&self) -> Snapshot {
        self.run_pass().await
    }

    pub fn latest(&self) -> Snapshot {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.tx.subscribe()
    }

    pub fn is_stopped(&self) -> bool {
        self.token.is_cancelled()
    }

    async fn run_pass(&self) -> Snapshot {
        let result = tokio::select! {
            _ = self.token.cancelled() => None,
            result = self.engine.refresh_message_paths() => Some(result),
        };

        if self.token.is_cancelled() {
            tracing::debug!("[Poller] Discarding pass that finished after shutdown");
            return None;
        }
        let result = Arc::new(result?);
        tracing::debug!(
            records = result.records.len(),
            failures = result.failures.len(),
            "[Poller] Published aggregation"
        );
        self.tx.send_replace(Some(result.clone()));
        Some(result)
    }
}
