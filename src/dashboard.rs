use std::sync::Arc;
use std::time::Duration;

use crate::actions::Actions;
use crate::activity::ActivityLog;
use crate::backend::Backend;
use crate::config::Config;
use crate::layout::CircularLayout;
use crate::poller::{Poller, Shared};
use crate::view::GraphView;

/// One dashboard session: the shared view, the actions bound to it and the
/// auto-refresh timer.  Owned by the entry point and passed to whatever
/// drives it.
pub struct Dashboard {
    actions: Actions,
    poller: Poller,
    intensity: u32,
    bulk_count: usize,
}

impl Dashboard {
    pub fn new(backend: Arc<dyn Backend>, config: &Config) -> Self {
        let view = GraphView::new(
            config.viewport(),
            CircularLayout::new(config.layout_margin),
            config.color_policy(),
        );
        let shared = Shared::new(view, ActivityLog::new(config.log_capacity));
        let poller = Poller::new(
            Arc::clone(&backend),
            shared.clone(),
            config.refresh_interval(),
        );
        Self {
            actions: Actions::new(backend, shared),
            poller,
            intensity: config.default_intensity,
            bulk_count: config.default_bulk_count,
        }
    }

    pub fn actions(&self) -> &Actions {
        &self.actions
    }

    pub fn shared(&self) -> &Shared {
        self.actions.shared()
    }

    pub fn is_auto_refreshing(&self) -> bool {
        self.poller.is_running()
    }

    pub fn refresh_interval(&self) -> Duration {
        self.poller.interval()
    }

    pub async fn start_auto_refresh(&mut self) {
        self.poller.start().await;
        self.shared().activity.write().await.info(format!(
            "Auto-refresh started ({}s interval)",
            self.poller.interval().as_secs_f64()
        ));
    }

    pub async fn stop_auto_refresh(&mut self) {
        if !self.poller.is_running() {
            return;
        }
        self.poller.stop().await;
        self.shared()
            .activity
            .write()
            .await
            .info("Auto-refresh stopped");
    }

    pub async fn toggle_auto_refresh(&mut self) {
        if self.poller.is_running() {
            self.stop_auto_refresh().await;
        } else {
            self.start_auto_refresh().await;
        }
    }

    /// Changes the cadence; a running timer restarts with it.
    pub async fn set_refresh_interval(&mut self, interval: Duration) {
        let was_running = self.poller.is_running();
        self.poller.set_interval(interval).await;
        if was_running {
            self.shared().activity.write().await.info(format!(
                "Auto-refresh restarted ({}s interval)",
                self.poller.interval().as_secs_f64()
            ));
        }
    }

    pub fn intensity(&self) -> u32 {
        self.intensity
    }

    pub fn set_intensity(&mut self, intensity: u32) {
        self.intensity = intensity.clamp(1, 10);
    }

    pub fn bulk_count(&self) -> usize {
        self.bulk_count
    }

    pub fn set_bulk_count(&mut self, count: usize) {
        self.bulk_count = count.clamp(1, 100);
    }
}
