use crate::layout::Layout;
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

/// Serializable snapshot of a computed layout, for debugging placement.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutDump {
    pub direction: String,
    pub width: f64,
    pub height: f64,
    pub nodes: Vec<NodeDump>,
    pub edges: Vec<EdgeDump>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeDump {
    pub id: String,
    pub rank: usize,
    pub order: usize,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub label_width: f64,
    pub label_height: f64,
    pub label_lines: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct EdgeDump {
    pub from: String,
    pub to: String,
    pub points: Vec<[f64; 2]>,
}

impl LayoutDump {
    pub fn from_layout(layout: &Layout) -> Self {
        let nodes = layout
            .nodes
            .values()
            .map(|node| NodeDump {
                id: node.id.clone(),
                rank: node.rank,
                order: node.order,
                x: node.x,
                y: node.y,
                width: node.width,
                height: node.height,
                label_width: node.label.width,
                label_height: node.label.height,
                label_lines: node.label.lines.clone(),
            })
            .collect();

        let edges = layout
            .edges
            .iter()
            .map(|edge| EdgeDump {
                from: edge.from.clone(),
                to: edge.to.clone(),
                points: edge.points.iter().map(|(x, y)| [*x, *y]).collect(),
            })
            .collect();

        let direction = serde_json::to_value(layout.direction)
            .ok()
            .and_then(|value| value.as_str().map(str::to_string))
            .unwrap_or_else(|| format!("{:?}", layout.direction));

        LayoutDump {
            direction,
            width: layout.width,
            height: layout.height,
            nodes,
            edges,
        }
    }
}

pub fn write_layout_dump(path: &Path, layout: &Layout) -> anyhow::Result<()> {
    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    let dump = LayoutDump::from_layout(layout);
    serde_json::to_writer_pretty(writer, &dump)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LayoutConfig;
    use crate::ir::{DiagramInput, Direction, Edge, Node};
    use crate::layout::compute_layout;

    #[test]
    fn dump_lists_nodes_and_routes() {
        let mut input = DiagramInput::new(Direction::BottomTop);
        input.nodes = vec![Node::new("a", "A"), Node::new("b", "B")];
        input.edges = vec![Edge::new("a", "b")];
        let layout = compute_layout(&input, &LayoutConfig::default());

        let dump = LayoutDump::from_layout(&layout);
        assert_eq!(dump.direction, "BT");
        assert_eq!(dump.nodes.len(), 2);
        assert_eq!(dump.nodes[1].rank, 1);
        assert_eq!(dump.edges[0].points.len(), 2);

        let value = serde_json::to_value(&dump).unwrap();
        assert!(value["nodes"][0].get("labelLines").is_some());
    }

    #[test]
    fn dump_is_written_as_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("layout.json");
        let layout = compute_layout(&DiagramInput::default(), &LayoutConfig::default());
        write_layout_dump(&path, &layout).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["direction"], "LR");
    }
}
