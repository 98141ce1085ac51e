use crate::config::LayoutConfig;

use super::TextBlock;

/// Estimates the node box for a label from character counts; no font metrics.
pub(super) fn measure_label(text: &str, config: &LayoutConfig) -> TextBlock {
    let lines = split_lines(text);
    let max_chars = lines
        .iter()
        .map(|line| line.chars().count())
        .max()
        .unwrap_or(0);
    let text_width = max_chars as f64 * config.font_size * config.char_width_ratio;
    let text_height = lines.len() as f64 * config.font_size * config.line_height_ratio;

    TextBlock {
        width: (text_width + config.node_padding_x).max(config.min_node_width),
        height: (text_height + config.node_padding_y).max(config.min_node_height),
        lines,
    }
}

pub(super) fn split_lines(text: &str) -> Vec<String> {
    let lines: Vec<String> = text
        .split('\n')
        .map(|line| line.trim_end_matches('\r').to_string())
        .collect();
    if lines.is_empty() {
        return vec![String::new()];
    }
    lines
}
