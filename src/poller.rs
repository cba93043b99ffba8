//! Periodic snapshot refresh.

use std::sync::Arc;
use std::time::Duration;

use log::{debug, warn};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

use crate::activity::ActivityLog;
use crate::backend::Backend;
use crate::view::{Applied, Connection, GraphView, Trigger};

/// State shared between the poller task, user actions and the UI loop.
#[derive(Clone)]
pub struct Shared {
    pub view: Arc<RwLock<GraphView>>,
    pub activity: Arc<RwLock<ActivityLog>>,
}

impl Shared {
    pub fn new(view: GraphView, activity: ActivityLog) -> Self {
        Self {
            view: Arc::new(RwLock::new(view)),
            activity: Arc::new(RwLock::new(activity)),
        }
    }
}

/// Outcome of one refresh attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum Refresh {
    /// A timer poll arrived after auto-refresh was stopped; nothing was sent.
    Skipped,
    /// `GET /health` failed while disconnected; no snapshot was requested.
    Unreachable,
    Applied(Applied),
}

/// Runs one sequenced poll: health check when disconnected, snapshot fetch,
/// then hand the result to the view.
pub async fn refresh(backend: &dyn Backend, shared: &Shared, trigger: Trigger) -> Refresh {
    let (ticket, connected) = {
        let mut view = shared.view.write().await;
        match view.begin_poll(trigger) {
            Some(ticket) => (ticket, view.is_connected()),
            None => return Refresh::Skipped,
        }
    };

    if !connected {
        if let Err(e) = backend.health().await {
            debug!("Health check failed: {}", e);
            shared
                .view
                .write()
                .await
                .set_connection(Connection::Disconnected);
            return Refresh::Unreachable;
        }
        shared
            .view
            .write()
            .await
            .set_connection(Connection::Connected);
        shared
            .activity
            .write()
            .await
            .success("Connected to routing server");
    }

    let result = backend.fetch_snapshot().await;
    let applied = shared.view.write().await.apply(ticket, result);
    match &applied {
        Applied::Rendered { nodes, edges } => {
            debug!("Graph update: {} nodes, {} edges", nodes, edges);
        }
        Applied::Failed(message) => {
            shared
                .activity
                .write()
                .await
                .error(format!("Error updating status: {}", message));
        }
        Applied::Stale => debug!("Discarded stale poll #{}", ticket.seq()),
        Applied::Cancelled => debug!("Discarded poll #{} issued before stop", ticket.seq()),
    }
    Refresh::Applied(applied)
}

/// Owns the auto-refresh timer task.
pub struct Poller {
    backend: Arc<dyn Backend>,
    shared: Shared,
    interval: Duration,
    handle: Option<JoinHandle<()>>,
}

impl Poller {
    pub fn new(backend: Arc<dyn Backend>, shared: Shared, interval: Duration) -> Self {
        Self {
            backend,
            shared,
            interval,
            handle: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }

    /// Starts (or restarts) the timer.  The first poll fires immediately.
    pub async fn start(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
        self.shared.view.write().await.start_refresh();

        let backend = Arc::clone(&self.backend);
        let shared = self.shared.clone();
        let period = self.interval;
        debug!("Starting poller task every {:?}", period);
        self.handle = Some(tokio::spawn(async move {
            let mut ticker = interval(period);
            // A slow poll swallows the ticks it overlaps instead of queueing them.
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                if refresh(backend.as_ref(), &shared, Trigger::Timer).await == Refresh::Skipped {
                    break;
                }
            }
        }));
    }

    /// Cancels the timer.  A poll still in flight is aborted and, should it
    /// complete anyway, its result is discarded by the view.
    pub async fn stop(&mut self) {
        self.shared.view.write().await.stop_refresh();
        if let Some(handle) = self.handle.take() {
            handle.abort();
            debug!("Poller task aborted");
        }
    }

    pub async fn set_interval(&mut self, interval: Duration) {
        if interval.is_zero() {
            warn!("Ignoring zero refresh interval");
            return;
        }
        self.interval = interval;
        if self.is_running() {
            self.start().await;
        }
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}
