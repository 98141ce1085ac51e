use once_cell::sync::Lazy;
use regex::Regex;

use crate::codec;
use crate::config::DocumentConfig;
use crate::error::{CodecError, FormatError, Result};
use crate::scene::{Element, Scene};

pub const DIAGRAM_EXTENSION: &str = ".excalidraw.md";
const BARE_EXTENSION: &str = ".excalidraw";

const FRONTMATTER: &str = "---\nexcalidraw-plugin: parsed\ntags:\n  - excalidraw\n---\n";
const VIEWER_NOTICE: &str = "==⚠  Switch to EXCALIDRAW VIEW in the MORE OPTIONS menu of this document. ⚠== You can decompress Drawing data with the command palette: 'Decompress current Excalidraw file'. For more info check in plugin settings under 'Saving'";

static DRAWING_HEADER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^## Drawing[ \t]*\r?$").unwrap());
static COMPRESSED_OPEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^```compressed-json[ \t]*\r?$").unwrap());
static JSON_OPEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^```json[ \t]*\r?$").unwrap());
static FENCE_CLOSE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^```[ \t]*\r?$").unwrap());
static FILE_EXTENSION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(.+)\.[A-Za-z0-9]+$").unwrap());

/// Renders `scene` as an Obsidian Excalidraw markdown document.
pub fn format_document(scene: &Scene, config: &DocumentConfig) -> Result<String> {
    let compressed = codec::compress(scene)?;

    let texts: Vec<String> = scene
        .elements
        .iter()
        .filter_map(Element::as_text)
        .filter(|text| !text.text.is_empty())
        .map(|text| format!("{} ^{}", text.text, text.base.id))
        .collect();

    let mut out = String::with_capacity(compressed.len() + 1024);
    out.push_str(FRONTMATTER);
    out.push('\n');
    out.push_str(VIEWER_NOTICE);
    out.push_str("\n\n\n# Excalidraw Data\n\n");
    if !texts.is_empty() {
        out.push_str("## Text Elements\n");
        out.push_str(&texts.join("\n\n"));
        out.push_str("\n\n");
    }
    out.push_str("%%\n## Drawing\n```compressed-json\n");
    out.push_str(&chunk(&compressed, config.chunk_width));
    out.push_str("\n```\n\n## Element Links\n\n%%\n");
    Ok(out)
}

/// Extracts the scene from a document's drawing block.
///
/// Only the text after the last `## Drawing` header is searched, so fences
/// quoted in text element labels are not mistaken for the drawing. A
/// `compressed-json` block is preferred; a plain `json` block, as left
/// behind by decompressing the file in Obsidian, is read as well.
pub fn parse_document(text: &str) -> Result<Scene> {
    let section_start = DRAWING_HEADER
        .find_iter(text)
        .last()
        .map_or(0, |header| header.end());
    if let Some(body) = drawing_block(text, section_start, &COMPRESSED_OPEN)? {
        let payload: String = body.chars().filter(|ch| !ch.is_whitespace()).collect();
        return Ok(codec::decompress(&payload)?);
    }
    if let Some(body) = drawing_block(text, section_start, &JSON_OPEN)? {
        let scene = serde_json::from_str(body).map_err(CodecError::from)?;
        return Ok(scene);
    }
    Err(FormatError::MissingDrawingBlock.into())
}

fn drawing_block<'a>(
    text: &'a str,
    from: usize,
    opening: &Regex,
) -> std::result::Result<Option<&'a str>, FormatError> {
    let Some(open) = opening.find_at(text, from) else {
        return Ok(None);
    };
    let body_start = text[open.end()..]
        .find('\n')
        .map(|idx| open.end() + idx + 1)
        .unwrap_or(text.len());
    let Some(close) = FENCE_CLOSE.find(&text[body_start..]) else {
        let line = text[..open.start()].matches('\n').count() + 1;
        return Err(FormatError::UnterminatedBlock { line });
    };
    Ok(Some(&text[body_start..body_start + close.start()]))
}

fn chunk(payload: &str, width: usize) -> String {
    // The payload is pure ASCII, so byte offsets are char offsets.
    let width = width.max(1);
    let mut out = String::with_capacity(payload.len() + payload.len() / width + 1);
    let mut rest = payload;
    while rest.len() > width {
        let (line, tail) = rest.split_at(width);
        out.push_str(line);
        out.push('\n');
        rest = tail;
    }
    out.push_str(rest);
    out
}

/// Gives `path` the `.excalidraw.md` suffix.
///
/// `.excalidraw` gains `.md`; any other single extension on the file name is
/// replaced; a bare name gets the full suffix.
pub fn ensure_extension(path: &str) -> String {
    if path.ends_with(DIAGRAM_EXTENSION) {
        return path.to_string();
    }
    if path.ends_with(BARE_EXTENSION) {
        return format!("{path}.md");
    }

    let (dir, file) = match path.rfind('/') {
        Some(idx) => path.split_at(idx + 1),
        None => ("", path),
    };
    let stem = FILE_EXTENSION
        .captures(file)
        .and_then(|caps| caps.get(1))
        .map(|stem| stem.as_str())
        .filter(|stem| !stem.is_empty() && *stem != ".")
        .unwrap_or(file);
    format!("{dir}{stem}{DIAGRAM_EXTENSION}")
}

pub fn is_diagram_path(path: &str) -> bool {
    path.ends_with(DIAGRAM_EXTENSION) || path.ends_with(BARE_EXTENSION)
}
