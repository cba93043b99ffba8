use figment::{
    providers::{Env, Format, Json, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::layout::Viewport;
use crate::scene::ColorPolicy;

/// Which endpoint the poller reads snapshots from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SnapshotSource {
    /// `GET /status`: containers keyed by id, edges synthesized as a complete graph.
    Status,
    /// `GET /graph`: nodes and edges as the routing server lays them out.
    Graph,
}

impl SnapshotSource {
    pub fn path(self) -> &'static str {
        match self {
            SnapshotSource::Status => "/status",
            SnapshotSource::Graph => "/graph",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PolicyKind {
    Percentage,
    Discrete,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub base_url: String,
    pub source: SnapshotSource,
    pub refresh_interval_ms: u64,
    pub request_timeout_ms: u64,
    pub health_timeout_ms: u64,
    pub work_timeout_ms: u64,
    pub auto_refresh: bool,
    pub color_policy: PolicyKind,
    pub low_threshold: f64,
    pub high_threshold: f64,
    pub viewport_width: f64,
    pub viewport_height: f64,
    pub layout_margin: f64,
    pub log_capacity: usize,
    pub default_intensity: u32,
    pub default_bulk_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".into(),
            source: SnapshotSource::Status,
            refresh_interval_ms: 1000,
            request_timeout_ms: 5000,
            health_timeout_ms: 5000,
            work_timeout_ms: 30_000,
            auto_refresh: true,
            color_policy: PolicyKind::Percentage,
            low_threshold: 25.0,
            high_threshold: 75.0,
            // Matches the 900x700 graph area of the web dashboards.
            viewport_width: 900.0,
            viewport_height: 700.0,
            layout_margin: 100.0,
            log_capacity: 50,
            default_intensity: 5,
            default_bulk_count: 10,
            log_file: Some(PathBuf::from("loadgraph.log")),
        }
    }
}

impl Config {
    pub fn figment() -> Figment {
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file("loadgraph.toml"))
            .merge(Json::file("loadgraph.json"))
            .merge(Env::prefixed("LOADGRAPH_"))
    }

    pub fn load() -> anyhow::Result<Self> {
        let mut config: Config = Self::figment()
            .extract()
            .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;
        config.normalize()?;
        Ok(config)
    }

    /// Validates the merged values and strips a trailing slash from `base_url`.
    pub fn normalize(&mut self) -> anyhow::Result<()> {
        let trimmed = self.base_url.trim().trim_end_matches('/');
        if trimmed.is_empty() {
            anyhow::bail!("base_url must not be empty");
        }
        self.base_url = trimmed.to_string();

        if self.refresh_interval_ms == 0 {
            anyhow::bail!("refresh_interval_ms must be positive");
        }
        if self.request_timeout_ms == 0 || self.health_timeout_ms == 0 || self.work_timeout_ms == 0
        {
            anyhow::bail!("request timeouts must be positive");
        }
        if self.viewport_width <= 0.0 || self.viewport_height <= 0.0 {
            anyhow::bail!(
                "Invalid viewport {}x{}",
                self.viewport_width,
                self.viewport_height
            );
        }
        if self.layout_margin < 0.0 {
            anyhow::bail!("layout_margin must not be negative");
        }
        if self.viewport_width.min(self.viewport_height) / 2.0 <= self.layout_margin {
            anyhow::bail!(
                "layout_margin {} leaves no room for the circle in a {}x{} viewport",
                self.layout_margin,
                self.viewport_width,
                self.viewport_height
            );
        }
        if self.low_threshold > self.high_threshold {
            anyhow::bail!(
                "low_threshold ({}) exceeds high_threshold ({})",
                self.low_threshold,
                self.high_threshold
            );
        }
        if self.log_capacity == 0 {
            anyhow::bail!("log_capacity must be at least 1");
        }
        Ok(())
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_interval_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn health_timeout(&self) -> Duration {
        Duration::from_millis(self.health_timeout_ms)
    }

    pub fn work_timeout(&self) -> Duration {
        Duration::from_millis(self.work_timeout_ms)
    }

    pub fn viewport(&self) -> Viewport {
        Viewport::new(self.viewport_width, self.viewport_height)
    }

    pub fn color_policy(&self) -> ColorPolicy {
        match self.color_policy {
            PolicyKind::Percentage => ColorPolicy::Percentage {
                low_max: self.low_threshold,
                medium_max: self.high_threshold,
            },
            PolicyKind::Discrete => ColorPolicy::Discrete,
        }
    }
}
