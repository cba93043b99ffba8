//! User-triggered commands.
//!
//! Every action reports back through the activity log and never fails the
//! caller: a refused or unreachable routing server ends up as a log entry.

use std::sync::Arc;
use std::time::Instant;

use futures_util::future::join_all;
use log::warn;

use crate::backend::Backend;
use crate::poller::{refresh, Refresh, Shared};
use crate::types::WorkReceipt;
use crate::view::Trigger;

/// Tally of a bulk submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BulkSummary {
    pub succeeded: usize,
    pub total: usize,
}

impl BulkSummary {
    pub fn ratio(&self) -> String {
        format!("{}/{}", self.succeeded, self.total)
    }
}

/// Cheap to clone, so key handlers can move a copy into a spawned task.
#[derive(Clone)]
pub struct Actions {
    backend: Arc<dyn Backend>,
    shared: Shared,
}

impl Actions {
    pub fn new(backend: Arc<dyn Backend>, shared: Shared) -> Self {
        Self { backend, shared }
    }

    pub fn shared(&self) -> &Shared {
        &self.shared
    }

    async fn ensure_connected(&self, what: &str) -> bool {
        if self.shared.view.read().await.is_connected() {
            return true;
        }
        self.shared
            .activity
            .write()
            .await
            .error(format!("Cannot send {}: not connected to server", what));
        false
    }

    /// One sequenced poll outside the auto-refresh timer.
    pub async fn refresh_now(&self) -> Refresh {
        refresh(self.backend.as_ref(), &self.shared, Trigger::Manual).await
    }

    pub async fn send_work(&self, intensity: u32) -> Option<WorkReceipt> {
        if !self.ensure_connected("request").await {
            return None;
        }
        self.shared
            .activity
            .write()
            .await
            .info(format!("Sending work request (intensity: {})...", intensity));

        let started = Instant::now();
        match self.backend.submit_work(intensity).await {
            Ok(receipt) => {
                {
                    let mut activity = self.shared.activity.write().await;
                    activity.success(format!(
                        "Request completed in {:.2}s (round trip {:.2}s)",
                        receipt.time_taken,
                        started.elapsed().as_secs_f64()
                    ));
                    activity.info(format!("Container: {}", short_id(&receipt.container_id)));
                }
                self.refresh_now().await;
                Some(receipt)
            }
            Err(e) => {
                self.shared
                    .activity
                    .write()
                    .await
                    .error(format!("Request failed: {}", e.user_message()));
                None
            }
        }
    }

    /// Submits `count` requests concurrently and waits for all of them; a
    /// failed request never cancels its siblings.
    pub async fn send_bulk_work(&self, intensity: u32, count: usize) -> BulkSummary {
        if !self.ensure_connected("requests").await {
            return BulkSummary {
                succeeded: 0,
                total: count,
            };
        }
        self.shared.activity.write().await.info(format!(
            "Sending {} bulk requests (intensity: {})...",
            count, intensity
        ));

        let results = join_all((0..count).map(|_| self.backend.submit_work(intensity))).await;
        let mut succeeded = 0;
        for result in results {
            match result {
                Ok(_) => succeeded += 1,
                Err(e) => warn!("Bulk request failed: {}", e),
            }
        }
        let summary = BulkSummary {
            succeeded,
            total: count,
        };

        {
            let mut activity = self.shared.activity.write().await;
            let message = format!(
                "{} bulk requests completed successfully",
                summary.ratio()
            );
            if succeeded == count {
                activity.success(message);
            } else {
                activity.error(message);
            }
        }
        self.refresh_now().await;
        summary
    }

    pub async fn fit_view(&self) {
        self.shared.view.write().await.fit_view();
    }

    pub async fn reset_layout(&self) {
        self.shared.view.write().await.reset_layout();
    }

    pub async fn clear_log(&self) {
        let mut activity = self.shared.activity.write().await;
        activity.clear();
        activity.info("Logs cleared");
    }
}

/// First 12 characters of a container id, the way `docker ps` shows them.
fn short_id(id: &str) -> String {
    match id.char_indices().nth(12) {
        Some((end, _)) => format!("{}...", &id[..end]),
        None => id.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_id_truncates_long_ids() {
        assert_eq!(short_id("0123456789abcdef"), "0123456789ab...");
        assert_eq!(short_id("abc"), "abc");
    }

    #[test]
    fn ratio_format() {
        let summary = BulkSummary {
            succeeded: 7,
            total: 10,
        };
        assert_eq!(summary.ratio(), "7/10");
    }
}
