use crate::error::ValidationError;
use crate::ir::{DiagramInput, Edge, Node};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::collections::HashSet;

static HEX_COLOR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^#(?:[0-9a-fA-F]{3,4}|[0-9a-fA-F]{6}|[0-9a-fA-F]{8})$").unwrap()
});

/// Parses and validates diagram JSON. Nothing is laid out unless this succeeds.
pub fn parse_diagram(text: &str) -> Result<DiagramInput, ValidationError> {
    let value: Value = serde_json::from_str(text).map_err(|err| ValidationError::InvalidJson {
        message: err.to_string(),
    })?;
    let empty = Map::new();
    let root = value.as_object().unwrap_or(&empty);

    let raw_nodes = root
        .get("nodes")
        .and_then(Value::as_array)
        .ok_or(ValidationError::MissingArray { field: "nodes" })?;
    let raw_edges = root
        .get("edges")
        .and_then(Value::as_array)
        .ok_or(ValidationError::MissingArray { field: "edges" })?;

    let nodes = raw_nodes
        .iter()
        .enumerate()
        .map(|(index, raw)| parse_node(index, raw))
        .collect::<Result<Vec<_>, _>>()?;
    let edges = raw_edges
        .iter()
        .enumerate()
        .map(|(index, raw)| parse_edge(index, raw))
        .collect::<Result<Vec<_>, _>>()?;

    let input = DiagramInput {
        nodes,
        edges,
        layout: enum_field(root, "layout", "layout")?,
        theme: enum_field(root, "theme", "theme")?,
    };
    validate(&input)?;
    tracing::debug!(
        nodes = input.nodes.len(),
        edges = input.edges.len(),
        "parsed diagram input"
    );
    Ok(input)
}

/// Checks the invariants serde cannot: unique ids, labels, colors and edge
/// endpoints. Also used for inputs built in code.
pub fn validate(input: &DiagramInput) -> Result<(), ValidationError> {
    let mut ids = HashSet::with_capacity(input.nodes.len());
    for node in &input.nodes {
        if !ids.insert(node.id.as_str()) {
            return Err(ValidationError::DuplicateNodeId {
                id: node.id.clone(),
            });
        }
        if node.label.trim().is_empty() {
            return Err(ValidationError::EmptyLabel {
                id: node.id.clone(),
            });
        }
        for (field, color) in [("background", &node.color), ("stroke", &node.stroke)] {
            if let Some(value) = color.as_ref().filter(|value| !HEX_COLOR_RE.is_match(value)) {
                return Err(ValidationError::InvalidColor {
                    id: node.id.clone(),
                    field,
                    value: value.clone(),
                });
            }
        }
    }

    for edge in &input.edges {
        for end in [&edge.from, &edge.to] {
            if !ids.contains(end.as_str()) {
                return Err(ValidationError::UnknownNode { id: end.clone() });
            }
        }
    }
    Ok(())
}

fn parse_node(index: usize, raw: &Value) -> Result<Node, ValidationError> {
    let empty = Map::new();
    let obj = raw.as_object().unwrap_or(&empty);
    let id = required_str(obj, "id")
        .ok_or(ValidationError::MissingNodeField { index, field: "id" })?;
    let label = required_str(obj, "label").ok_or(ValidationError::MissingNodeField {
        index,
        field: "label",
    })?;

    Ok(Node {
        id,
        label,
        shape: enum_field(obj, "type", &format!("nodes[{index}].type"))?,
        color: optional_str(obj, "color", &format!("nodes[{index}].color"))?,
        stroke: optional_str(obj, "stroke", &format!("nodes[{index}].stroke"))?,
    })
}

fn parse_edge(index: usize, raw: &Value) -> Result<Edge, ValidationError> {
    let empty = Map::new();
    let obj = raw.as_object().unwrap_or(&empty);
    let from = required_str(obj, "from")
        .ok_or(ValidationError::MissingEdgeField { index, field: "from" })?;
    let to = required_str(obj, "to")
        .ok_or(ValidationError::MissingEdgeField { index, field: "to" })?;

    Ok(Edge {
        from,
        to,
        label: optional_str(obj, "label", &format!("edges[{index}].label"))?
            .filter(|label| !label.is_empty()),
        style: enum_field(obj, "style", &format!("edges[{index}].style"))?,
    })
}

fn required_str(obj: &Map<String, Value>, key: &str) -> Option<String> {
    obj.get(key)
        .and_then(Value::as_str)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

fn optional_str(
    obj: &Map<String, Value>,
    key: &str,
    field: &str,
) -> Result<Option<String>, ValidationError> {
    match obj.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(value)) => Ok(Some(value.clone())),
        Some(other) => Err(ValidationError::InvalidValue {
            field: field.to_string(),
            message: format!("expected a string, got {other}"),
        }),
    }
}

fn enum_field<T: DeserializeOwned + Default>(
    obj: &Map<String, Value>,
    key: &str,
    field: &str,
) -> Result<T, ValidationError> {
    match obj.get(key) {
        None | Some(Value::Null) => Ok(T::default()),
        Some(value) => {
            serde_json::from_value(value.clone()).map_err(|_| ValidationError::InvalidValue {
                field: field.to_string(),
                message: format!("unsupported value {value}"),
            })
        }
    }
}
