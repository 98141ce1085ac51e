pub mod assemble;
#[cfg(feature = "cli")]
pub mod cli;
pub mod codec;
pub mod commands;
pub mod config;
pub mod document;
pub mod error;
pub mod ir;
pub mod layout;
pub mod layout_dump;
pub mod merge;
pub mod parser;
pub mod scene;
pub mod store;
pub mod theme;

pub use assemble::{assemble, build_scene};
#[cfg(feature = "cli")]
pub use cli::run;
pub use config::{Config, DocumentConfig, LayoutConfig, StyleConfig, load_config, parse_config};
pub use document::{format_document, parse_document};
pub use error::{Error, Result};
pub use ir::{DiagramInput, Direction};
pub use layout::compute_layout;
pub use parser::parse_diagram;
pub use scene::Scene;
pub use store::{DirStore, DocumentStore, MemoryStore};

/// Diagram JSON in, `.excalidraw.md` document text out.
pub fn create_document(json: &str, config: &Config) -> Result<String> {
    let input = parse_diagram(json)?;
    let scene = build_scene(&input, config);
    format_document(&scene, &config.document)
}

/// Extracts the scene from document text.
pub fn read_document(text: &str) -> Result<Scene> {
    parse_document(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_round_trip_through_the_facade() {
        let json = r#"{"nodes":[{"id":"a","label":"A"},{"id":"b","label":"B"}],"edges":[{"from":"a","to":"b"}]}"#;
        let text = create_document(json, &Config::default()).unwrap();
        assert!(text.starts_with("---\n"));
        let scene = read_document(&text).unwrap();
        assert_eq!(scene.elements.len(), 5);
        assert!(scene.element("a").is_some());
    }

    #[test]
    fn facade_reports_validation_errors() {
        let err = create_document(r#"{"nodes": []}"#, &Config::default()).unwrap_err();
        assert_eq!(err.code(), "VALIDATION_ERROR");
    }
}
