//! Background job: evict expired token mappings.
//!
//! Runs on a fixed interval, minutes by default. The spawner gets a handle
//! back so shutdown can stop the loop instead of abandoning it.

use std::time::Duration;

use tokio::sync::watch;
use tokio::time;

use crate::store::TokenStore;

/// Handle to a running sweeper. Dropping it also stops the task; `stop`
/// additionally waits for the loop to exit.
pub struct SweeperHandle {
    shutdown: watch::Sender<bool>,
    task: tokio::task::JoinHandle<()>,
}

impl SweeperHandle {
    /// Signal the sweeper and wait for it to exit.
    pub async fn stop(self) {
        let _ = self.shutdown.send(true);
        let _ = self.task.await;
    }
}

/// Spawn the background sweep task. Call this once at startup.
pub fn spawn(store: TokenStore, ttl: Duration, interval: Duration) -> SweeperHandle {
    let (shutdown, mut signal) = watch::channel(false);

    let task = tokio::spawn(async move {
        let mut ticker = time::interval(interval);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let evicted = store.sweep(ttl);
                    if evicted > 0 {
                        tracing::debug!(
                            evicted,
                            remaining = store.len(),
                            "swept expired token mappings"
                        );
                    }
                }
                _ = signal.changed() => {
                    tracing::debug!("token sweeper stopped");
                    break;
                }
            }
        }
    });

    SweeperHandle { shutdown, task }
}
