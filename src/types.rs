//! Data structures shared by the poller, the layout engine and the renderer.
//!
//! The `*Response` types mirror the JSON bodies served by the routing
//! server.  They are converted into a [`Snapshot`] as soon as they are
//! decoded so the rest of the crate never sees a partially valid payload:
//! a snapshot always has edges that point at its own nodes.

use std::collections::{BTreeMap, HashSet};

use log::debug;
use serde::{Deserialize, Serialize};

/// A container as it appears in one snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContainerNode {
    pub id: String,
    pub label: String,
    /// Utilization reported by the routing server, if any.
    pub load: Option<f64>,
    pub port: Option<u16>,
    pub created_at: Option<String>,
    /// Color name chosen by the server (`/graph` only).
    pub color_hint: Option<String>,
}

impl ContainerNode {
    /// The trailing `-`-separated segment of the label, e.g. `a1b2` for
    /// `Container web-a1b2`.
    pub fn short_label(&self) -> &str {
        self.label.rsplit('-').next().unwrap_or(&self.label)
    }
}

/// An unordered connection between two containers of the same snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Edge {
    pub source: String,
    pub target: String,
}

impl Edge {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
        }
    }
}

/// Connects every pair of nodes exactly once, in node order.
pub fn complete_edges(nodes: &[ContainerNode]) -> Vec<Edge> {
    let mut edges = Vec::with_capacity(nodes.len() * nodes.len().saturating_sub(1) / 2);
    for (i, a) in nodes.iter().enumerate() {
        for b in &nodes[i + 1..] {
            edges.push(Edge::new(a.id.clone(), b.id.clone()));
        }
    }
    edges
}

/// One atomic poll result.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Snapshot {
    pub nodes: Vec<ContainerNode>,
    pub edges: Vec<Edge>,
    pub total_containers: u64,
    pub total_load: f64,
}

impl Snapshot {
    /// Builds a snapshot, dropping edges that do not connect two distinct
    /// nodes of `nodes`.
    pub fn new(
        nodes: Vec<ContainerNode>,
        edges: Vec<Edge>,
        total_containers: u64,
        total_load: f64,
    ) -> Self {
        let ids: HashSet<&str> = nodes.iter().map(|n| n.id.as_str()).collect();
        let edges = edges
            .into_iter()
            .filter(|e| {
                let keep = e.source != e.target
                    && ids.contains(e.source.as_str())
                    && ids.contains(e.target.as_str());
                if !keep {
                    debug!("Dropping dangling edge {} -> {}", e.source, e.target);
                }
                keep
            })
            .collect();

        Self {
            nodes,
            edges,
            total_containers,
            total_load,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: &str) -> Option<&ContainerNode> {
        self.nodes.iter().find(|n| n.id == id)
    }
}

/// Body of `GET /graph`.
#[derive(Debug, Clone, Deserialize)]
pub struct GraphResponse {
    #[serde(default)]
    pub nodes: Vec<GraphNode>,
    #[serde(default)]
    pub edges: Vec<GraphEdge>,
    #[serde(default)]
    pub total_containers: u64,
    #[serde(default)]
    pub total_load: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GraphNode {
    pub id: String,
    pub label: String,
    pub color: Option<String>,
    pub load: Option<f64>,
    pub port: Option<u16>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GraphEdge {
    pub source: String,
    pub target: String,
}

impl From<GraphResponse> for Snapshot {
    fn from(resp: GraphResponse) -> Self {
        let nodes = resp
            .nodes
            .into_iter()
            .map(|n| ContainerNode {
                id: n.id,
                label: n.label,
                load: n.load,
                port: n.port,
                created_at: None,
                color_hint: n.color,
            })
            .collect();
        let edges = resp
            .edges
            .into_iter()
            .map(|e| Edge::new(e.source, e.target))
            .collect();
        Snapshot::new(nodes, edges, resp.total_containers, resp.total_load)
    }
}

/// Body of `GET /status`.
#[derive(Debug, Clone, Deserialize)]
pub struct StatusResponse {
    #[serde(default)]
    pub total_containers: u64,
    #[serde(default)]
    pub total_load: f64,
    /// Keyed by container id.  A `BTreeMap` keeps node order stable between
    /// polls regardless of how the server orders its JSON object.
    #[serde(default)]
    pub containers: BTreeMap<String, ContainerStatus>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContainerStatus {
    pub name: String,
    #[serde(default)]
    pub load: f64,
    pub port: Option<u16>,
    pub created_at: Option<String>,
}

impl From<StatusResponse> for Snapshot {
    fn from(resp: StatusResponse) -> Self {
        let nodes: Vec<ContainerNode> = resp
            .containers
            .into_iter()
            .map(|(id, info)| ContainerNode {
                id,
                label: info.name,
                load: Some(info.load),
                port: info.port,
                created_at: info.created_at,
                color_hint: None,
            })
            .collect();
        let edges = complete_edges(&nodes);
        Snapshot::new(nodes, edges, resp.total_containers, resp.total_load)
    }
}

/// Body of `POST /work`.
#[derive(Debug, Clone, Serialize)]
pub struct WorkRequest {
    pub intensity: u32,
}

/// Successful reply to `POST /work`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WorkReceipt {
    /// Seconds spent by the container on the request.
    pub time_taken: f64,
    pub container_id: String,
    pub container_url: Option<String>,
}

/// Error body returned by the routing server on failure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorBody {
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: &str) -> ContainerNode {
        ContainerNode {
            id: id.to_string(),
            label: format!("Container {}", id),
            load: Some(0.0),
            port: None,
            created_at: None,
            color_hint: None,
        }
    }

    #[test]
    fn complete_graph_over_three_nodes() {
        let nodes = vec![node("c1"), node("c2"), node("c3")];
        assert_eq!(
            complete_edges(&nodes),
            vec![
                Edge::new("c1", "c2"),
                Edge::new("c1", "c3"),
                Edge::new("c2", "c3"),
            ]
        );
    }

    #[test]
    fn complete_graph_degenerate_sizes() {
        assert!(complete_edges(&[]).is_empty());
        assert!(complete_edges(&[node("solo")]).is_empty());
    }

    #[test]
    fn short_label_takes_last_segment() {
        let mut n = node("x");
        n.label = "Container web-server-a1b2".into();
        assert_eq!(n.short_label(), "a1b2");
        n.label = "plain".into();
        assert_eq!(n.short_label(), "plain");
    }

    #[test]
    fn status_response_becomes_complete_graph() {
        let body = r#"{
            "total_containers": 3,
            "total_load": 4,
            "timestamp": "2024-05-01T10:00:00",
            "containers": {
                "c3": {"name": "worker-c3", "load": 1, "port": 5003, "created_at": "t3"},
                "c1": {"name": "worker-c1", "load": 0, "port": 5001, "created_at": "t1"},
                "c2": {"name": "worker-c2", "load": 3, "port": 5002, "created_at": "t2"}
            }
        }"#;
        let resp: StatusResponse = serde_json::from_str(body).unwrap();
        let snapshot = Snapshot::from(resp);

        let ids: Vec<&str> = snapshot.nodes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, ["c1", "c2", "c3"]);
        assert_eq!(snapshot.edges.len(), 3);
        assert_eq!(snapshot.total_containers, 3);
        assert_eq!(snapshot.total_load, 4.0);
        assert_eq!(snapshot.node("c2").unwrap().port, Some(5002));
    }

    #[test]
    fn graph_response_drops_dangling_edges() {
        let body = r#"{
            "nodes": [
                {"id": "a", "label": "Container a", "color": "green", "load": 0, "port": 5001},
                {"id": "b", "label": "Container b", "color": "red"}
            ],
            "edges": [
                {"source": "a", "target": "b"},
                {"source": "a", "target": "ghost"},
                {"source": "b", "target": "b"}
            ],
            "total_containers": 2,
            "total_load": 0
        }"#;
        let resp: GraphResponse = serde_json::from_str(body).unwrap();
        let snapshot = Snapshot::from(resp);

        assert_eq!(snapshot.edges, vec![Edge::new("a", "b")]);
        let b = snapshot.node("b").unwrap();
        assert_eq!(b.load, None);
        assert_eq!(b.color_hint.as_deref(), Some("red"));
    }
}
