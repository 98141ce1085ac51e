use excalidraw_md::{Config, create_document, read_document};
use serde::Deserialize;
use wasm_bindgen::prelude::*;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DocumentOptions {
    font_size: Option<f64>,
    node_spacing: Option<f64>,
    rank_spacing: Option<f64>,
    seed: Option<u64>,
}

/// `updated` stamps every element; the host clock is read by the caller.
fn build_config(options: DocumentOptions, updated: u64) -> Config {
    let mut config = Config::default();
    config.style.updated = Some(updated);
    if let Some(font_size) = options.font_size {
        config.layout.font_size = font_size;
    }
    if let Some(node_spacing) = options.node_spacing {
        config.layout.node_spacing = node_spacing;
    }
    if let Some(rank_spacing) = options.rank_spacing {
        config.layout.rank_spacing = rank_spacing;
    }
    if options.seed.is_some() {
        config.style.seed = options.seed;
    }
    config
}

/// Diagram JSON to `.excalidraw.md` text.
#[wasm_bindgen]
pub fn create_diagram_document(json: &str, options_json: Option<String>) -> Result<String, JsValue> {
    let options = if let Some(raw_options) = options_json {
        serde_json::from_str::<DocumentOptions>(&raw_options)
            .map_err(|error| JsValue::from_str(&error.to_string()))?
    } else {
        DocumentOptions::default()
    };

    let updated = js_sys::Date::now() as u64;
    create_document(json, &build_config(options, updated)).map_err(|error| JsValue::from_str(&error.to_string()))
}

/// The scene JSON stored in a document.
#[wasm_bindgen]
pub fn read_diagram_scene(document: &str) -> Result<String, JsValue> {
    let scene = read_document(document).map_err(|error| JsValue::from_str(&error.to_string()))?;
    serde_json::to_string(&scene).map_err(|error| JsValue::from_str(&error.to_string()))
}
