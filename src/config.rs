use crate::ir::ColorScheme;
use crate::theme::Theme;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LayoutConfig {
    pub node_spacing: f64,
    pub rank_spacing: f64,
    pub margin: f64,
    pub min_node_width: f64,
    pub min_node_height: f64,
    pub font_size: f64,
    pub char_width_ratio: f64,
    pub line_height_ratio: f64,
    pub node_padding_x: f64,
    pub node_padding_y: f64,
    pub order_passes: usize,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            node_spacing: 50.0,
            rank_spacing: 80.0,
            margin: 20.0,
            min_node_width: 150.0,
            min_node_height: 60.0,
            font_size: 16.0,
            char_width_ratio: 0.6,
            line_height_ratio: 1.4,
            node_padding_x: 40.0,
            node_padding_y: 30.0,
            order_passes: 4,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StyleConfig {
    /// Written to the scene's `source` field.
    pub source: String,
    /// Node labels use `LayoutConfig::font_size`, the size they were measured with.
    pub edge_label_font_size: f64,
    pub font_family: u8,
    pub text_line_height: f64,
    pub label_padding: f64,
    pub edge_label_char_width: f64,
    pub edge_label_padding: f64,
    pub edge_label_height: f64,
    pub edge_label_lift: f64,
    pub binding_gap: f64,
    pub stroke_width: f64,
    pub text_stroke_width: f64,
    pub roughness: u8,
    pub opacity: u8,
    /// Fixes render seeds for reproducible output; fresh entropy otherwise.
    pub seed: Option<u64>,
    /// Fixed `updated` timestamp in milliseconds; the system clock otherwise.
    pub updated: Option<u64>,
    pub light: Theme,
    pub dark: Theme,
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            source: "excalidraw-md".to_string(),
            edge_label_font_size: 14.0,
            font_family: 1,
            text_line_height: 1.25,
            label_padding: 10.0,
            edge_label_char_width: 8.0,
            edge_label_padding: 20.0,
            edge_label_height: 20.0,
            edge_label_lift: 10.0,
            binding_gap: 5.0,
            stroke_width: 2.0,
            text_stroke_width: 1.0,
            roughness: 1,
            opacity: 100,
            seed: None,
            updated: None,
            light: Theme::light(),
            dark: Theme::dark(),
        }
    }
}

impl StyleConfig {
    pub fn theme(&self, scheme: ColorScheme) -> &Theme {
        match scheme {
            ColorScheme::Light => &self.light,
            ColorScheme::Dark => &self.dark,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DocumentConfig {
    /// Width of the lines the compressed payload is split into.
    pub chunk_width: usize,
}

impl Default for DocumentConfig {
    fn default() -> Self {
        Self { chunk_width: 256 }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub layout: LayoutConfig,
    pub style: StyleConfig,
    pub document: DocumentConfig,
}

/// Reads a JSON5 config file. Missing sections and keys keep their defaults.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let Some(path) = path else {
        return Ok(Config::default());
    };

    let contents = std::fs::read_to_string(path)
        .map_err(|err| anyhow::anyhow!("Failed to read config {}: {err}", path.display()))?;
    parse_config(&contents)
        .map_err(|err| anyhow::anyhow!("Failed to load configuration {}: {err}", path.display()))
}

pub fn parse_config(contents: &str) -> anyhow::Result<Config> {
    let config: Config = json5::from_str(contents)?;
    if config.document.chunk_width == 0 {
        return Err(anyhow::anyhow!("document.chunkWidth must be greater than zero"));
    }
    if config.layout.order_passes == 0 {
        tracing::warn!("layout.orderPasses is 0; rank ordering keeps input order");
    }
    Ok(config)
}
