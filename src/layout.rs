//! Circular placement of snapshot nodes.

use std::f64::consts::TAU;

use serde::{Deserialize, Serialize};

use crate::types::ContainerNode;

/// Logical drawing area, in the same units as [`LayoutPosition`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn center(&self) -> (f64, f64) {
        (self.width / 2.0, self.height / 2.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutPosition {
    pub id: String,
    pub x: f64,
    pub y: f64,
}

/// Evenly spaces nodes on a circle centered in the viewport.
#[derive(Debug, Clone, Copy)]
pub struct CircularLayout {
    margin: f64,
}

impl Default for CircularLayout {
    fn default() -> Self {
        Self { margin: 100.0 }
    }
}

impl CircularLayout {
    pub fn new(margin: f64) -> Self {
        Self { margin }
    }

    pub fn margin(&self) -> f64 {
        self.margin
    }

    /// Circle radius for `viewport`; zero when the margin eats the whole area.
    pub fn radius(&self, viewport: Viewport) -> f64 {
        let (cx, cy) = viewport.center();
        (cx.min(cy) - self.margin).max(0.0)
    }

    pub fn arrange(&self, nodes: &[ContainerNode], viewport: Viewport) -> Vec<LayoutPosition> {
        let (cx, cy) = viewport.center();
        match nodes {
            [] => Vec::new(),
            [only] => vec![LayoutPosition {
                id: only.id.clone(),
                x: cx,
                y: cy,
            }],
            _ => {
                let radius = self.radius(viewport);
                let n = nodes.len() as f64;
                nodes
                    .iter()
                    .enumerate()
                    .map(|(i, node)| {
                        let angle = i as f64 * TAU / n;
                        LayoutPosition {
                            id: node.id.clone(),
                            x: cx + radius * angle.cos(),
                            y: cy + radius * angle.sin(),
                        }
                    })
                    .collect()
            }
        }
    }
}
