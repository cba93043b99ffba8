//! Toolkit-independent scene description.
//!
//! [`render`] turns a snapshot and its layout into plain data: edges, nodes,
//! an info panel and a legend.  Adapters (the terminal UI, the `snapshot`
//! JSON dump) only ever draw a [`Scene`]; none of the color or label rules
//! live in them.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::layout::{LayoutPosition, Viewport};
use crate::types::{ContainerNode, Snapshot};

/// Radius of a node shape, in layout units.
pub const NODE_RADIUS: f64 = 30.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadCategory {
    Low,
    Medium,
    High,
}

impl LoadCategory {
    pub fn rgb(self) -> (u8, u8, u8) {
        match self {
            LoadCategory::Low => (0x27, 0xae, 0x60),
            LoadCategory::Medium => (0xf3, 0x9c, 0x12),
            LoadCategory::High => (0xc0, 0x39, 0x2b),
        }
    }

    pub fn color_name(self) -> &'static str {
        match self {
            LoadCategory::Low => "green",
            LoadCategory::Medium => "yellow",
            LoadCategory::High => "red",
        }
    }

    fn from_color_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "green" => Some(LoadCategory::Low),
            "yellow" | "orange" => Some(LoadCategory::Medium),
            "red" => Some(LoadCategory::High),
            _ => None,
        }
    }
}

/// Maps a container load to a color category.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ColorPolicy {
    /// `load <= low_max` is low, `load <= medium_max` is medium, above is high.
    Percentage { low_max: f64, medium_max: f64 },
    /// Load counted in outstanding requests: 0 is low, 1-2 medium, 3+ high.
    Discrete,
}

impl Default for ColorPolicy {
    fn default() -> Self {
        ColorPolicy::Percentage {
            low_max: 25.0,
            medium_max: 75.0,
        }
    }
}

impl ColorPolicy {
    pub fn classify(&self, load: f64) -> LoadCategory {
        match *self {
            ColorPolicy::Percentage {
                low_max,
                medium_max,
            } => {
                if load <= low_max {
                    LoadCategory::Low
                } else if load <= medium_max {
                    LoadCategory::Medium
                } else {
                    LoadCategory::High
                }
            }
            ColorPolicy::Discrete => {
                if load <= 0.0 {
                    LoadCategory::Low
                } else if load < 3.0 {
                    LoadCategory::Medium
                } else {
                    LoadCategory::High
                }
            }
        }
    }

    /// Category for `node`: its load when reported, else the server's color
    /// hint, else low.
    pub fn categorize(&self, node: &ContainerNode) -> LoadCategory {
        node.load
            .map(|load| self.classify(load))
            .or_else(|| {
                node.color_hint
                    .as_deref()
                    .and_then(LoadCategory::from_color_name)
            })
            .unwrap_or(LoadCategory::Low)
    }

    pub fn legend(&self) -> Vec<LegendEntry> {
        let labels = match *self {
            ColorPolicy::Percentage {
                low_max,
                medium_max,
            } => [
                format!("Low (0-{}%)", low_max),
                format!("Medium (>{}-{}%)", low_max, medium_max),
                format!("High (>{}-100%)", medium_max),
            ],
            ColorPolicy::Discrete => [
                "Idle (0)".to_string(),
                "Busy (1-2)".to_string(),
                "Saturated (3+)".to_string(),
            ],
        };
        [LoadCategory::Low, LoadCategory::Medium, LoadCategory::High]
            .into_iter()
            .zip(labels)
            .map(|(category, label)| LegendEntry { category, label })
            .collect()
    }

    fn is_percentage(&self) -> bool {
        matches!(self, ColorPolicy::Percentage { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegendEntry {
    pub category: LoadCategory,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneNode {
    pub id: String,
    pub x: f64,
    pub y: f64,
    pub radius: f64,
    pub label: String,
    pub category: LoadCategory,
    pub tooltip: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneEdge {
    pub source: String,
    pub target: String,
    pub from: (f64, f64),
    pub to: (f64, f64),
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct InfoPanel {
    pub total_containers: u64,
    pub total_load: String,
}

/// Everything an adapter needs to draw one frame.  Edges come first and are
/// meant to be drawn beneath the nodes.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Scene {
    pub edges: Vec<SceneEdge>,
    pub nodes: Vec<SceneNode>,
    pub info: InfoPanel,
    pub legend: Vec<LegendEntry>,
}

impl Scene {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }

    pub fn node(&self, id: &str) -> Option<&SceneNode> {
        self.nodes.iter().find(|n| n.id == id)
    }
}

pub fn render(snapshot: &Snapshot, positions: &[LayoutPosition], policy: &ColorPolicy) -> Scene {
    let by_id: HashMap<&str, &LayoutPosition> =
        positions.iter().map(|p| (p.id.as_str(), p)).collect();

    let edges = snapshot
        .edges
        .iter()
        .filter_map(|edge| {
            let from = by_id.get(edge.source.as_str())?;
            let to = by_id.get(edge.target.as_str())?;
            Some(SceneEdge {
                source: edge.source.clone(),
                target: edge.target.clone(),
                from: (from.x, from.y),
                to: (to.x, to.y),
            })
        })
        .collect();

    let nodes = snapshot
        .nodes
        .iter()
        .filter_map(|node| {
            let pos = by_id.get(node.id.as_str())?;
            Some(SceneNode {
                id: node.id.clone(),
                x: pos.x,
                y: pos.y,
                radius: NODE_RADIUS,
                label: node.short_label().to_string(),
                category: policy.categorize(node),
                tooltip: tooltip(node),
            })
        })
        .collect();

    let total_load = if policy.is_percentage() {
        format!("{}%", snapshot.total_load)
    } else {
        snapshot.total_load.to_string()
    };

    Scene {
        edges,
        nodes,
        info: InfoPanel {
            total_containers: snapshot.total_containers,
            total_load,
        },
        legend: policy.legend(),
    }
}

fn tooltip(node: &ContainerNode) -> String {
    let mut lines = vec![format!("Container: {}", node.label)];
    match node.load {
        Some(load) => lines.push(format!("Load: {}", load)),
        None => lines.push("Load: n/a".to_string()),
    }
    if let Some(port) = node.port {
        lines.push(format!("Port: {}", port));
    }
    if let Some(created) = &node.created_at {
        lines.push(format!("Created: {}", created));
    }
    lines.join("\n")
}

/// Visible region of the layout plane, as `[min, max]` per axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub x: [f64; 2],
    pub y: [f64; 2],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Camera {
    /// Show the whole viewport.
    #[default]
    Viewport,
    /// Zoom to the bounding box of the current nodes.
    Fitted,
}

impl Camera {
    pub fn bounds(&self, scene: &Scene, viewport: Viewport) -> Bounds {
        let full = Bounds {
            x: [0.0, viewport.width],
            y: [0.0, viewport.height],
        };
        if *self == Camera::Viewport || scene.nodes.is_empty() {
            return full;
        }

        let pad = NODE_RADIUS * 2.0;
        let (mut min_x, mut max_x) = (f64::INFINITY, f64::NEG_INFINITY);
        let (mut min_y, mut max_y) = (f64::INFINITY, f64::NEG_INFINITY);
        for n in &scene.nodes {
            min_x = min_x.min(n.x);
            max_x = max_x.max(n.x);
            min_y = min_y.min(n.y);
            max_y = max_y.max(n.y);
        }
        Bounds {
            x: [min_x - pad, max_x + pad],
            y: [min_y - pad, max_y + pad],
        }
    }
}
