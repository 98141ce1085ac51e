use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Direction {
    #[default]
    #[serde(rename = "LR")]
    LeftRight,
    #[serde(rename = "TB", alias = "TD")]
    TopBottom,
    #[serde(rename = "RL")]
    RightLeft,
    #[serde(rename = "BT")]
    BottomTop,
}

impl Direction {
    /// True when ranks advance along the x axis.
    pub fn is_horizontal(self) -> bool {
        matches!(self, Self::LeftRight | Self::RightLeft)
    }

    /// True when ranks advance towards smaller coordinates.
    pub fn is_reversed(self) -> bool {
        matches!(self, Self::RightLeft | Self::BottomTop)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorScheme {
    #[default]
    Light,
    Dark,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeShape {
    #[default]
    Rectangle,
    Ellipse,
    Diamond,
    Cylinder,
    Parallelogram,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeStyle {
    #[default]
    Solid,
    Dashed,
    Dotted,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    pub label: String,
    #[serde(rename = "type", default)]
    pub shape: NodeShape,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke: Option<String>,
}

impl Node {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            shape: NodeShape::Rectangle,
            color: None,
            stroke: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub from: String,
    pub to: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default)]
    pub style: EdgeStyle,
}

impl Edge {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            label: None,
            style: EdgeStyle::Solid,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn is_self_loop(&self) -> bool {
        self.from == self.to
    }
}

/// Caller-facing diagram description.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DiagramInput {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
    #[serde(default)]
    pub layout: Direction,
    #[serde(default)]
    pub theme: ColorScheme,
}

impl DiagramInput {
    pub fn new(direction: Direction) -> Self {
        Self {
            layout: direction,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direction_axes() {
        assert!(Direction::RightLeft.is_horizontal());
        assert!(Direction::BottomTop.is_reversed());
        assert!(!Direction::TopBottom.is_horizontal());
    }

    #[test]
    fn deserializes_defaults() {
        let input: DiagramInput = serde_json::from_str(
            r#"{"nodes":[{"id":"a","label":"A"}],"edges":[{"from":"a","to":"a"}]}"#,
        )
        .unwrap();
        assert_eq!(input.layout, Direction::LeftRight);
        assert_eq!(input.theme, ColorScheme::Light);
        assert_eq!(input.nodes[0].shape, NodeShape::Rectangle);
        assert_eq!(input.edges[0].style, EdgeStyle::Solid);
        assert!(input.edges[0].is_self_loop());
    }

    #[test]
    fn accepts_td_alias() {
        let input: DiagramInput =
            serde_json::from_str(r#"{"nodes":[],"edges":[],"layout":"TD"}"#).unwrap();
        assert_eq!(input.layout, Direction::TopBottom);
    }
}
