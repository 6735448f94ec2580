//! Periodic trending-keyword refresh tied to a mounted dashboard.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use crate::controller::Dashboard;

/// Handle to the running refresh task.
///
/// [`KeywordRefresh::stop`] consumes the handle, so teardown happens once.
/// A handle dropped without `stop` aborts the task instead.
#[derive(Debug)]
pub struct KeywordRefresh {
    cancel_tx: Option<oneshot::Sender<()>>,
    join: Option<JoinHandle<()>>,
}

impl KeywordRefresh {
    /// Starts refreshing every `period`. The first refresh happens one full
    /// period from now; the mount itself already loaded keywords.
    pub(crate) fn spawn(dashboard: Arc<Dashboard>, period: Duration) -> Self {
        let (cancel_tx, mut cancel_rx) = oneshot::channel::<()>();
        let join = tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = &mut cancel_rx => {
                        tracing::debug!("keyword refresh stopped");
                        break;
                    }
                    _ = ticker.tick() => {
                        tracing::debug!("refreshing trending keywords");
                        // An in-flight load is dropped on cancel so it never
                        // writes after teardown.
                        tokio::select! {
                            _ = &mut cancel_rx => {
                                tracing::debug!("keyword refresh stopped mid-load");
                                break;
                            }
                            () = dashboard.load_keywords() => {}
                        }
                    }
                }
            }
        });

        Self {
            cancel_tx: Some(cancel_tx),
            join: Some(join),
        }
    }

    /// Cancels the timer and any in-flight load, then waits for the
    /// task to exit.
    pub async fn stop(mut self) {
        if let Some(tx) = self.cancel_tx.take() {
            let _ = tx.send(());
        }
        if let Some(join) = self.join.take() {
            if let Err(e) = join.await {
                tracing::warn!(error = %e, "keyword refresh task ended abnormally");
            }
        }
    }
}

impl Drop for KeywordRefresh {
    fn drop(&mut self) {
        if let Some(join) = self.join.take() {
            join.abort();
        }
    }
}
