use std::collections::{HashMap, HashSet};
use std::time::{SystemTime, UNIX_EPOCH};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::Map;

use crate::config::{Config, StyleConfig};
use crate::ir::{DiagramInput, Edge, Node, NodeShape};
use crate::layout::{EdgeLayout, Layout, NodeLayout, compute_layout};
use crate::scene::{
    AppState, Arrowhead, Binding, BoundElement, Element, ElementBase, FillStyle, LinearElement,
    Roundness, Scene, ShapeElement, StrokeStyle, TextAlign, TextElement, VerticalAlign,
};
use crate::theme::Theme;

// ── Element styling ─────────────────────────────────────────────────
/// Exclusive upper bound for render seeds and version nonces.
const SEED_LIMIT: i64 = 2_000_000_000;
const ARROW_ROUNDNESS: u8 = 2;
const SHAPE_ROUNDNESS: u8 = 3;
const TRANSPARENT: &str = "transparent";

/// Lays out `input` and assembles the result into a scene.
pub fn build_scene(input: &DiagramInput, config: &Config) -> Scene {
    let layout = compute_layout(input, &config.layout);
    assemble(input, &layout, &config.style)
}

/// Turns a laid-out diagram into Excalidraw elements.
///
/// Arrows and edge labels come first, then each shape followed by its label,
/// so shapes stack above the connectors that touch them. Edges whose
/// endpoints have no layout are left out.
pub fn assemble(input: &DiagramInput, layout: &Layout, style: &StyleConfig) -> Scene {
    let theme = style.theme(input.theme);
    let mut stamps = Stamps::new(style);
    let mut elements = Vec::with_capacity(input.edges.len() * 2 + input.nodes.len() * 2);
    let mut attached: HashMap<&str, Vec<BoundElement>> = HashMap::new();
    let mut arrow_ids = HashSet::new();

    for (idx, edge) in input.edges.iter().enumerate() {
        let route = layout.edges.get(idx);
        let resolved = layout.nodes.get(&edge.from).zip(layout.nodes.get(&edge.to));
        let (Some(route), Some(_)) = (route, resolved) else {
            tracing::debug!(from = %edge.from, to = %edge.to, "skipping edge without layout");
            continue;
        };
        if route.points.len() < 2 {
            tracing::debug!(from = %edge.from, to = %edge.to, "skipping edge without route");
            continue;
        }

        let arrow = arrow_element(edge, route, style, theme, &mut stamps);
        let arrow_id = arrow.base.id.clone();
        if !arrow_ids.insert(arrow_id.clone()) {
            tracing::warn!(id = %arrow_id, "parallel edges share an arrow id");
        }
        elements.push(Element::Arrow(arrow));

        attached
            .entry(edge.from.as_str())
            .or_default()
            .push(BoundElement::arrow(arrow_id.clone()));
        if !edge.is_self_loop() {
            attached
                .entry(edge.to.as_str())
                .or_default()
                .push(BoundElement::arrow(arrow_id.clone()));
        }

        if let Some(label) = edge_label_element(edge, route, style, theme, &mut stamps) {
            elements.push(Element::Text(label));
        }
    }

    for node in &input.nodes {
        let Some(node_layout) = layout.nodes.get(&node.id) else {
            tracing::debug!(id = %node.id, "skipping node without layout");
            continue;
        };
        let mut bound = attached.remove(node.id.as_str()).unwrap_or_default();
        bound.push(BoundElement::text(label_id(&node.id)));

        elements.push(shape_element(node, node_layout, bound, style, theme, &mut stamps));
        elements.push(Element::Text(node_label_element(
            node,
            node_layout,
            layout.font_size,
            style,
            theme,
            &mut stamps,
        )));
    }

    tracing::debug!(elements = elements.len(), "assembled scene");

    let mut scene = Scene::new(style.source.clone(), AppState::new(theme.view_background.clone()));
    scene.elements = elements;
    scene
}

pub fn label_id(node_id: &str) -> String {
    format!("{node_id}-text")
}

pub fn arrow_id(from: &str, to: &str) -> String {
    format!("arrow-{from}-{to}")
}

pub fn edge_label_id(from: &str, to: &str) -> String {
    format!("label-{from}-{to}")
}

/// Per-scene source of seeds, nonces and the `updated` timestamp.
struct Stamps {
    rng: StdRng,
    updated: u64,
}

impl Stamps {
    fn new(style: &StyleConfig) -> Self {
        let rng = match style.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let updated = style.updated.unwrap_or_else(now_millis);
        Self { rng, updated }
    }

    fn next(&mut self) -> i64 {
        self.rng.random_range(0..SEED_LIMIT)
    }

    fn base(&mut self, id: String, rect: (f64, f64, f64, f64), style: &StyleConfig) -> ElementBase {
        let (x, y, width, height) = rect;
        ElementBase {
            id,
            x,
            y,
            width,
            height,
            angle: 0.0,
            stroke_color: String::new(),
            background_color: TRANSPARENT.to_string(),
            fill_style: FillStyle::Solid,
            stroke_width: style.stroke_width,
            stroke_style: StrokeStyle::Solid,
            roughness: style.roughness,
            opacity: style.opacity,
            group_ids: Vec::new(),
            frame_id: None,
            roundness: None,
            seed: self.next(),
            version: 1,
            version_nonce: self.next(),
            is_deleted: false,
            bound_elements: None,
            updated: self.updated,
            link: None,
            locked: false,
            extra: Map::new(),
        }
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or(0)
}

fn arrow_element(
    edge: &Edge,
    route: &EdgeLayout,
    style: &StyleConfig,
    theme: &Theme,
    stamps: &mut Stamps,
) -> LinearElement {
    let (origin_x, origin_y) = route.points[0];
    let points: Vec<[f64; 2]> = route
        .points
        .iter()
        .map(|(x, y)| [x - origin_x, y - origin_y])
        .collect();
    let (min_x, max_x) = span(points.iter().map(|point| point[0]));
    let (min_y, max_y) = span(points.iter().map(|point| point[1]));

    let mut base = stamps.base(
        arrow_id(&edge.from, &edge.to),
        (origin_x, origin_y, max_x - min_x, max_y - min_y),
        style,
    );
    base.stroke_color = theme.line_color.clone();
    base.stroke_style = edge.style.into();
    base.roundness = Some(Roundness::of(ARROW_ROUNDNESS));

    LinearElement {
        base,
        points,
        last_committed_point: None,
        start_binding: Some(Binding::new(edge.from.clone(), style.binding_gap)),
        end_binding: Some(Binding::new(edge.to.clone(), style.binding_gap)),
        start_arrowhead: None,
        end_arrowhead: Some(Arrowhead::Arrow),
    }
}

fn edge_label_element(
    edge: &Edge,
    route: &EdgeLayout,
    style: &StyleConfig,
    theme: &Theme,
    stamps: &mut Stamps,
) -> Option<TextElement> {
    let label = edge.label.as_deref()?;
    let (anchor_x, anchor_y) = route.label_anchor()?;
    let width = label.chars().count() as f64 * style.edge_label_char_width + style.edge_label_padding;
    let height = style.edge_label_height;

    let mut base = stamps.base(
        edge_label_id(&edge.from, &edge.to),
        (
            anchor_x - width / 2.0,
            anchor_y - height / 2.0 - style.edge_label_lift,
            width,
            height,
        ),
        style,
    );
    base.stroke_color = theme.text_color.clone();
    base.background_color = theme.label_background.clone();
    base.stroke_width = style.text_stroke_width;

    Some(text_element(base, label, style.edge_label_font_size, None, style))
}

fn shape_element(
    node: &Node,
    layout: &NodeLayout,
    bound: Vec<BoundElement>,
    style: &StyleConfig,
    theme: &Theme,
    stamps: &mut Stamps,
) -> Element {
    let mut base = stamps.base(
        node.id.clone(),
        (layout.x, layout.y, layout.width, layout.height),
        style,
    );
    base.stroke_color = node
        .stroke
        .clone()
        .unwrap_or_else(|| theme.stroke_color.clone());
    base.background_color = node
        .color
        .clone()
        .unwrap_or_else(|| theme.node_background.clone());
    base.roundness = Some(Roundness::of(SHAPE_ROUNDNESS));
    base.bound_elements = Some(bound);

    let shape = ShapeElement { base };
    match node.shape {
        NodeShape::Ellipse => Element::Ellipse(shape),
        NodeShape::Diamond => Element::Diamond(shape),
        NodeShape::Rectangle | NodeShape::Cylinder | NodeShape::Parallelogram => {
            Element::Rectangle(shape)
        }
    }
}

fn node_label_element(
    node: &Node,
    layout: &NodeLayout,
    font_size: f64,
    style: &StyleConfig,
    theme: &Theme,
    stamps: &mut Stamps,
) -> TextElement {
    let pad = style.label_padding;
    let mut base = stamps.base(
        label_id(&node.id),
        (
            layout.x + pad,
            layout.y + layout.height / 2.0 - font_size / 2.0,
            layout.width - pad * 2.0,
            font_size * 1.4,
        ),
        style,
    );
    base.stroke_color = theme.text_color.clone();
    base.stroke_width = style.text_stroke_width;

    text_element(base, &node.label, font_size, Some(node.id.clone()), style)
}

fn text_element(
    base: ElementBase,
    text: &str,
    font_size: f64,
    container_id: Option<String>,
    style: &StyleConfig,
) -> TextElement {
    TextElement {
        base,
        text: text.to_string(),
        font_size,
        font_family: u32::from(style.font_family),
        text_align: TextAlign::Center,
        vertical_align: VerticalAlign::Middle,
        baseline: Some(font_size),
        container_id,
        original_text: text.to_string(),
        auto_resize: true,
        line_height: style.text_line_height,
    }
}

fn span(values: impl Iterator<Item = f64>) -> (f64, f64) {
    values.fold((0.0_f64, 0.0_f64), |(min, max), value| {
        (min.min(value), max.max(value))
    })
}
