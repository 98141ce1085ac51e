use serde::Serialize;

use crate::assemble::build_scene;
use crate::config::Config;
use crate::document::{ensure_extension, format_document, is_diagram_path, parse_document};
use crate::error::Result;
use crate::ir::DiagramInput;
use crate::merge::merge_scenes;
use crate::parser::validate;
use crate::scene::Scene;
use crate::store::DocumentStore;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSummary {
    pub path: String,
    pub node_count: usize,
    pub edge_count: usize,
    pub element_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagram {
    pub path: String,
    pub scene: Scene,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PatchSummary {
    pub path: String,
    pub added_nodes: usize,
    pub added_edges: usize,
    pub total_elements: usize,
}

/// Builds a new diagram document from `input` and writes it.
/// The path is normalised to carry the `.excalidraw.md` suffix.
pub fn create(
    store: &mut dyn DocumentStore,
    path: &str,
    input: &DiagramInput,
    config: &Config,
) -> Result<CreateSummary> {
    validate(input)?;
    let scene = build_scene(input, config);
    let text = format_document(&scene, &config.document)?;
    let path = ensure_extension(path);
    store.write(&path, &text)?;
    tracing::info!(path = %path, elements = scene.elements.len(), "created diagram");

    Ok(CreateSummary {
        path,
        node_count: input.nodes.len(),
        edge_count: input.edges.len(),
        element_count: scene.elements.len(),
    })
}

pub fn get(store: &dyn DocumentStore, path: &str) -> Result<Diagram> {
    let text = store.read(path)?;
    let scene = parse_document(&text)?;
    Ok(Diagram {
        path: path.to_string(),
        scene,
    })
}

/// Appends `additions` to the right of an existing diagram.
pub fn patch(
    store: &mut dyn DocumentStore,
    path: &str,
    additions: &DiagramInput,
    config: &Config,
) -> Result<PatchSummary> {
    validate(additions)?;
    if !is_diagram_path(path) {
        tracing::warn!(path = %path, "patching a document without a drawing suffix");
    }
    let existing = parse_document(&store.read(path)?)?;
    let merged = merge_scenes(&existing, additions, config);
    let text = format_document(&merged, &config.document)?;
    store.write(path, &text)?;
    tracing::info!(path = %path, total = merged.elements.len(), "patched diagram");

    Ok(PatchSummary {
        path: path.to_string(),
        added_nodes: additions.nodes.len(),
        added_edges: additions.edges.len(),
        total_elements: merged.elements.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, StorageError, ValidationError};
    use crate::ir::{Edge, Node};
    use crate::store::MemoryStore;

    fn user_server() -> DiagramInput {
        let mut input = DiagramInput::default();
        input.nodes = vec![Node::new("u", "User"), Node::new("s", "Server")];
        input.edges = vec![Edge::new("u", "s").with_label("HTTP")];
        input
    }

    #[test]
    fn create_writes_a_normalised_document() {
        let mut store = MemoryStore::new();
        let summary = create(&mut store, "docs/flow.md", &user_server(), &Config::default()).unwrap();
        assert_eq!(
            summary,
            CreateSummary {
                path: "docs/flow.excalidraw.md".to_string(),
                node_count: 2,
                edge_count: 1,
                element_count: 6,
            }
        );
        assert!(store.read("docs/flow.excalidraw.md").unwrap().contains("```compressed-json"));
    }

    #[test]
    fn get_returns_the_stored_scene() {
        let mut store = MemoryStore::new();
        create(&mut store, "flow", &user_server(), &Config::default()).unwrap();
        let diagram = get(&store, "flow.excalidraw.md").unwrap();
        assert_eq!(diagram.path, "flow.excalidraw.md");
        assert_eq!(diagram.scene.elements.len(), 6);
    }

    #[test]
    fn patch_appends_and_rewrites() {
        let mut store = MemoryStore::new();
        let config = Config::default();
        create(&mut store, "flow", &user_server(), &config).unwrap();

        let mut extra = DiagramInput::default();
        extra.nodes = vec![Node::new("db", "Database")];
        let summary = patch(&mut store, "flow.excalidraw.md", &extra, &config).unwrap();
        assert_eq!(summary.added_nodes, 1);
        assert_eq!(summary.added_edges, 0);
        assert_eq!(summary.total_elements, 8);

        let scene = get(&store, "flow.excalidraw.md").unwrap().scene;
        assert_eq!(scene.elements.len(), 8);
        assert_eq!(scene.element("db").unwrap().base().x, 500.0);
    }

    #[test]
    fn invalid_input_writes_nothing() {
        let mut store = MemoryStore::new();
        let mut input = user_server();
        input.edges.push(Edge::new("u", "ghost"));
        let err = create(&mut store, "flow", &input, &Config::default()).unwrap_err();
        assert!(matches!(err, Error::Validation(ValidationError::UnknownNode { .. })));
        assert_eq!(store.paths().count(), 0);
    }

    #[test]
    fn missing_documents_are_not_found() {
        let store = MemoryStore::new();
        let err = get(&store, "nope.excalidraw.md").unwrap_err();
        assert!(matches!(err, Error::Storage(StorageError::NotFound { .. })));
        assert_eq!(err.code(), "NOT_FOUND");
    }

    #[test]
    fn plain_notes_are_format_errors() {
        let mut store = MemoryStore::new();
        store.write("note.md", "# Not a drawing\n").unwrap();
        let err = patch(&mut store, "note.md", &user_server(), &Config::default()).unwrap_err();
        assert_eq!(err.code(), "FORMAT_ERROR");
        assert_eq!(store.read("note.md").unwrap(), "# Not a drawing\n");
    }
}
