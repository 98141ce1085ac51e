use std::collections::BTreeMap;

use crate::ir::Direction;

#[derive(Debug, Clone, PartialEq)]
pub struct TextBlock {
    pub lines: Vec<String>,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NodeLayout {
    pub id: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub rank: usize,
    pub order: usize,
    pub label: TextBlock,
}

impl NodeLayout {
    pub fn center(&self) -> (f64, f64) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EdgeLayout {
    pub from: String,
    pub to: String,
    pub points: Vec<(f64, f64)>,
}

impl EdgeLayout {
    /// The point edge labels are anchored on.
    pub fn label_anchor(&self) -> Option<(f64, f64)> {
        self.points.get(self.points.len() / 2).copied()
    }
}

/// Output of the layout engine. `edges` is index-aligned with the input edges.
#[derive(Debug, Clone, PartialEq)]
pub struct Layout {
    pub direction: Direction,
    pub nodes: BTreeMap<String, NodeLayout>,
    pub edges: Vec<EdgeLayout>,
    pub width: f64,
    pub height: f64,
    /// Font size the node labels were measured with.
    pub font_size: f64,
}

/// A box in flow/cross coordinates: `flow` runs along the rank axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(super) struct RankBox {
    pub flow: f64,
    pub cross: f64,
    pub flow_len: f64,
    pub cross_len: f64,
}

impl RankBox {
    pub fn center(&self) -> (f64, f64) {
        (
            self.flow + self.flow_len / 2.0,
            self.cross + self.cross_len / 2.0,
        )
    }

    pub fn flow_end(&self) -> f64 {
        self.flow + self.flow_len
    }

    pub fn cross_end(&self) -> f64 {
        self.cross + self.cross_len
    }
}
