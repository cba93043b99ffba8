//! Dashboard behaviour against an in-process fake routing server.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use loadgraph::config::Config;
use loadgraph::poller::Refresh;
use loadgraph::types::{ContainerNode, WorkReceipt};
use loadgraph::view::{Applied, Connection};
use loadgraph::{Backend, BackendError, Dashboard, Snapshot};
use tokio::sync::Notify;
use tokio::time::{sleep, timeout};

fn snapshot(ids: &[&str]) -> Snapshot {
    let nodes = ids
        .iter()
        .map(|id| ContainerNode {
            id: id.to_string(),
            label: format!("Container worker-{}", id),
            load: Some(10.0),
            port: Some(5000),
            created_at: None,
            color_hint: None,
        })
        .collect();
    Snapshot::new(nodes, Vec::new(), ids.len() as u64, 10.0 * ids.len() as f64)
}

fn refused(message: &str) -> BackendError {
    BackendError::Api {
        status: 500,
        message: Some(message.to_string()),
    }
}

#[derive(Default)]
struct FakeBackend {
    healthy: AtomicBool,
    fetch_fails: AtomicBool,
    fetches: AtomicUsize,
    work_calls: AtomicUsize,
    /// The first `work_successes` submissions succeed, the rest fail.
    work_successes: usize,
    /// When set, every fetch parks here until released.
    gate: Option<Arc<Notify>>,
    fetch_started: Arc<Notify>,
}

impl FakeBackend {
    fn healthy() -> Self {
        Self {
            healthy: AtomicBool::new(true),
            ..Self::default()
        }
    }
}

#[async_trait]
impl Backend for FakeBackend {
    async fn health(&self) -> Result<(), BackendError> {
        if self.healthy.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(BackendError::Api {
                status: 503,
                message: None,
            })
        }
    }

    async fn fetch_snapshot(&self) -> Result<Snapshot, BackendError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.fetch_started.notify_one();
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        if self.fetch_fails.load(Ordering::SeqCst) {
            return Err(refused("status unavailable"));
        }
        Ok(snapshot(&["c1", "c2", "c3"]))
    }

    async fn submit_work(&self, _intensity: u32) -> Result<WorkReceipt, BackendError> {
        let n = self.work_calls.fetch_add(1, Ordering::SeqCst);
        if n < self.work_successes {
            Ok(WorkReceipt {
                time_taken: 0.5,
                container_id: format!("container{:08}", n),
                container_url: None,
            })
        } else {
            Err(refused("container overloaded"))
        }
    }
}

fn config() -> Config {
    Config {
        refresh_interval_ms: 20,
        ..Config::default()
    }
}

async fn messages(dashboard: &Dashboard) -> Vec<String> {
    dashboard
        .shared()
        .activity
        .read()
        .await
        .entries()
        .map(|e| e.message.clone())
        .collect()
}

#[tokio::test]
async fn test_manual_refresh_renders_snapshot() {
    let backend = Arc::new(FakeBackend::healthy());
    let dashboard = Dashboard::new(backend.clone(), &config());

    let outcome = dashboard.actions().refresh_now().await;
    assert_eq!(
        outcome,
        Refresh::Applied(Applied::Rendered { nodes: 3, edges: 0 })
    );

    let view = dashboard.shared().view.read().await;
    assert!(view.is_connected());
    assert_eq!(view.scene().nodes.len(), 3);
    assert_eq!(view.positions().len(), 3);
}

#[tokio::test]
async fn test_unhealthy_server_skips_fetch() {
    let backend = Arc::new(FakeBackend::default());
    let dashboard = Dashboard::new(backend.clone(), &config());

    assert_eq!(dashboard.actions().refresh_now().await, Refresh::Unreachable);
    assert_eq!(backend.fetches.load(Ordering::SeqCst), 0);
    assert_eq!(
        dashboard.shared().view.read().await.connection(),
        Connection::Disconnected
    );
}

#[tokio::test]
async fn test_healthy_server_marks_connected_before_fetch_resolves() {
    let gate = Arc::new(Notify::new());
    let backend = Arc::new(FakeBackend {
        gate: Some(gate.clone()),
        ..FakeBackend::healthy()
    });
    let dashboard = Dashboard::new(backend.clone(), &config());

    let started = backend.fetch_started.clone();
    let actions = dashboard.actions().clone();
    let pending = tokio::spawn(async move { actions.refresh_now().await });
    timeout(Duration::from_secs(5), started.notified())
        .await
        .expect("refresh never fetched");

    assert!(dashboard.shared().view.read().await.is_connected());
    let log = messages(&dashboard).await;
    assert_eq!(
        log.last().map(String::as_str),
        Some("Connected to routing server")
    );

    gate.notify_one();
    pending.await.unwrap();
}

#[tokio::test]
async fn test_failed_poll_keeps_last_snapshot() {
    let backend = Arc::new(FakeBackend::healthy());
    let dashboard = Dashboard::new(backend.clone(), &config());
    dashboard.actions().refresh_now().await;

    backend.fetch_fails.store(true, Ordering::SeqCst);
    let outcome = dashboard.actions().refresh_now().await;
    assert_eq!(
        outcome,
        Refresh::Applied(Applied::Failed("status unavailable".into()))
    );

    let view = dashboard.shared().view.read().await;
    assert!(!view.is_connected());
    assert_eq!(view.snapshot().unwrap().nodes.len(), 3);
    drop(view);

    let log = messages(&dashboard).await;
    assert!(log.iter().any(|m| m == "Error updating status: status unavailable"));
}

#[tokio::test]
async fn test_auto_refresh_polls_until_stopped() {
    let backend = Arc::new(FakeBackend::healthy());
    let mut dashboard = Dashboard::new(backend.clone(), &config());

    dashboard.start_auto_refresh().await;
    timeout(Duration::from_secs(5), async {
        while backend.fetches.load(Ordering::SeqCst) < 3 {
            sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("poller never fetched");

    dashboard.stop_auto_refresh().await;
    assert!(!dashboard.is_auto_refreshing());
    let after_stop = backend.fetches.load(Ordering::SeqCst);
    sleep(Duration::from_millis(100)).await;
    assert_eq!(backend.fetches.load(Ordering::SeqCst), after_stop);

    let log = messages(&dashboard).await;
    assert!(log.iter().any(|m| m.starts_with("Auto-refresh started")));
    assert_eq!(log.last().map(String::as_str), Some("Auto-refresh stopped"));
}

#[tokio::test]
async fn test_stop_discards_in_flight_fetch() {
    let gate = Arc::new(Notify::new());
    let backend = Arc::new(FakeBackend {
        gate: Some(gate.clone()),
        ..FakeBackend::healthy()
    });
    let mut dashboard = Dashboard::new(backend.clone(), &config());

    let started = backend.fetch_started.clone();
    dashboard.start_auto_refresh().await;
    timeout(Duration::from_secs(5), started.notified())
        .await
        .expect("poller never fetched");

    dashboard.stop_auto_refresh().await;
    gate.notify_waiters();
    sleep(Duration::from_millis(100)).await;

    assert_eq!(backend.fetches.load(Ordering::SeqCst), 1);
    assert!(dashboard.shared().view.read().await.snapshot().is_none());
}

#[tokio::test]
async fn test_send_work_logs_receipt() {
    let backend = Arc::new(FakeBackend {
        work_successes: 1,
        ..FakeBackend::healthy()
    });
    let dashboard = Dashboard::new(backend.clone(), &config());
    dashboard.actions().refresh_now().await;

    let receipt = dashboard.actions().send_work(3).await.unwrap();
    assert_eq!(receipt.container_id, "container00000000");

    let log = messages(&dashboard).await;
    assert!(log.iter().any(|m| m.starts_with("Request completed in 0.50s")));
    assert!(log.iter().any(|m| m == "Container: container000..."));
    // The follow-up refresh counts as a second fetch.
    assert_eq!(backend.fetches.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_send_work_failure_logs_server_error() {
    let backend = Arc::new(FakeBackend::healthy());
    let dashboard = Dashboard::new(backend.clone(), &config());
    dashboard.actions().refresh_now().await;

    assert!(dashboard.actions().send_work(3).await.is_none());
    let log = messages(&dashboard).await;
    assert_eq!(
        log.last().map(String::as_str),
        Some("Request failed: container overloaded")
    );
}

#[tokio::test]
async fn test_send_work_requires_connection() {
    let backend = Arc::new(FakeBackend::default());
    let dashboard = Dashboard::new(backend.clone(), &config());

    assert!(dashboard.actions().send_work(3).await.is_none());
    assert_eq!(backend.work_calls.load(Ordering::SeqCst), 0);
    let log = messages(&dashboard).await;
    assert_eq!(
        log.last().map(String::as_str),
        Some("Cannot send request: not connected to server")
    );
}

#[tokio::test]
async fn test_bulk_work_reports_ratio() {
    let backend = Arc::new(FakeBackend {
        work_successes: 7,
        ..FakeBackend::healthy()
    });
    let dashboard = Dashboard::new(backend.clone(), &config());
    dashboard.actions().refresh_now().await;

    let summary = dashboard.actions().send_bulk_work(5, 10).await;
    assert_eq!(summary.succeeded, 7);
    assert_eq!(summary.total, 10);
    assert_eq!(backend.work_calls.load(Ordering::SeqCst), 10);

    let log = messages(&dashboard).await;
    assert!(log
        .iter()
        .any(|m| m == "7/10 bulk requests completed successfully"));
}

#[tokio::test]
async fn test_clear_log_leaves_single_entry() {
    let backend = Arc::new(FakeBackend::healthy());
    let dashboard = Dashboard::new(backend, &config());
    dashboard.actions().refresh_now().await;

    dashboard.actions().clear_log().await;
    assert_eq!(messages(&dashboard).await, vec!["Logs cleared".to_string()]);
}

#[tokio::test]
async fn test_interval_change_restarts_timer() {
    let backend = Arc::new(FakeBackend::healthy());
    let mut dashboard = Dashboard::new(backend, &config());

    dashboard.start_auto_refresh().await;
    dashboard
        .set_refresh_interval(Duration::from_millis(40))
        .await;
    assert!(dashboard.is_auto_refreshing());
    assert_eq!(dashboard.refresh_interval(), Duration::from_millis(40));
    dashboard.stop_auto_refresh().await;
}
