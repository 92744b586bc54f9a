//! Deadline-bounded, concurrency-limited broadcaster.
//!
//! Saturation policy: a broadcaster admits at most `workers + queue_capacity`
//! peer calls at once, across all broadcasts sharing it. Admitted calls beyond
//! `workers` wait for a worker slot, and that wait counts against the caller's
//! deadline. Calls that cannot be admitted are not attempted and are recorded
//! as failures.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, warn};

use crate::broadcast::outcome::{BroadcastResult, PeerOutcome};
use crate::broadcast::peer::PeerTarget;

pub const SATURATED_MESSAGE: &str = "worker pool saturated";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BroadcasterConfig {
    /// Peer calls running at the same time
    pub workers: usize,
    /// Admitted peer calls waiting for a worker
    pub queue_capacity: usize,
}

impl Default for BroadcasterConfig {
    fn default() -> Self {
        BroadcasterConfig {
            workers: 20,
            queue_capacity: 200,
        }
    }
}

/// Fans a command out to peers and aggregates the outcomes.
///
/// Cloning is cheap; clones share the same worker pool.
#[derive(Debug, Clone)]
pub struct PeerBroadcaster {
    workers: Arc<Semaphore>,
    admission: Arc<Semaphore>,
    config: BroadcasterConfig,
}

impl PeerBroadcaster {
    pub fn new(config: BroadcasterConfig) -> Self {
        let workers = config.workers.max(1);
        PeerBroadcaster {
            workers: Arc::new(Semaphore::new(workers)),
            admission: Arc::new(Semaphore::new(workers + config.queue_capacity)),
            config,
        }
    }

    pub fn config(&self) -> BroadcasterConfig {
        self.config
    }

    /// Worker slots not currently running a peer call.
    pub fn idle_workers(&self) -> usize {
        self.workers.available_permits()
    }

    /// Runs `action` against every peer and waits up to `timeout`.
    ///
    /// Outcomes are folded in completion order, which is not submission
    /// order: with several failing peers, whichever failure was collected
    /// first is reported. When the deadline passes the result is
    /// [`BroadcastResult::TimedOut`] and every unfinished peer call is
    /// cancelled.
    pub async fn broadcast<F, Fut>(
        &self,
        peers: Vec<PeerTarget>,
        action: F,
        timeout: Duration,
    ) -> BroadcastResult
    where
        F: Fn(PeerTarget) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = PeerOutcome> + Send + 'static,
    {
        if peers.is_empty() {
            return BroadcastResult::Success;
        }

        let action = Arc::new(action);
        let total = peers.len();
        let mut tasks = JoinSet::new();
        let mut outcomes = Vec::with_capacity(total);

        for peer in peers {
            let Ok(slot) = self.admission.clone().try_acquire_owned() else {
                error!(peer = %peer, "broadcast rejected, {}", SATURATED_MESSAGE);
                outcomes.push(PeerOutcome::Failed(SATURATED_MESSAGE.to_string()));
                continue;
            };

            let workers = self.workers.clone();
            let action = action.clone();
            tasks.spawn(async move {
                let _slot = slot;
                let outcome = match workers.acquire_owned().await {
                    Ok(_permit) => (*action)(peer.clone()).await,
                    Err(_) => PeerOutcome::Failed("worker pool closed".to_string()),
                };
                (peer, outcome)
            });
        }

        let collected = tokio::time::timeout(timeout, async {
            while let Some(joined) = tasks.join_next().await {
                let outcome = match joined {
                    Ok((peer, outcome)) => {
                        match &outcome {
                            PeerOutcome::Success => {
                                debug!(peer = %peer, "peer applied command")
                            }
                            PeerOutcome::Ignored(reason) => {
                                debug!(peer = %peer, %reason, "peer unreachable, ignoring")
                            }
                            PeerOutcome::Failed(message) => {
                                error!(peer = %peer, error = %message, "peer failed command")
                            }
                        }
                        outcome
                    }
                    Err(err) => {
                        error!(error = %err, "peer task did not complete");
                        PeerOutcome::Failed(format!("peer task aborted: {}", err))
                    }
                };
                outcomes.push(outcome);
            }
        })
        .await;

        match collected {
            Ok(()) => BroadcastResult::from_outcomes(&outcomes),
            Err(_) => {
                let pending = tasks.len();
                tasks.abort_all();
                warn!(
                    pending,
                    total,
                    timeout_ms = timeout.as_millis() as u64,
                    "broadcast timed out, cancelled unfinished peer calls"
                );
                BroadcastResult::TimedOut
            }
        }
    }
}

impl Default for PeerBroadcaster {
    fn default() -> Self {
        Self::new(BroadcasterConfig::default())
    }
}
