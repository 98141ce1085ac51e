use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const SCENE_TYPE: &str = "excalidraw";
pub const SCENE_VERSION: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FillStyle {
    #[default]
    Solid,
    Hachure,
    CrossHatch,
    Zigzag,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrokeStyle {
    #[default]
    Solid,
    Dashed,
    Dotted,
}

impl From<crate::ir::EdgeStyle> for StrokeStyle {
    fn from(style: crate::ir::EdgeStyle) -> Self {
        match style {
            crate::ir::EdgeStyle::Solid => Self::Solid,
            crate::ir::EdgeStyle::Dashed => Self::Dashed,
            crate::ir::EdgeStyle::Dotted => Self::Dotted,
        }
    }
}

/// Corner rounding. Type 2 is used for arrows, type 3 for shapes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Roundness {
    #[serde(rename = "type")]
    pub kind: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
}

impl Roundness {
    pub fn of(kind: u8) -> Self {
        Self { kind, value: None }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BoundKind {
    Arrow,
    Text,
}

/// Back-reference from a shape to an element attached to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundElement {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: BoundKind,
}

impl BoundElement {
    pub fn arrow(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: BoundKind::Arrow,
        }
    }

    pub fn text(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: BoundKind::Text,
        }
    }
}

/// Attachment of an arrow end to a shape, by id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Binding {
    pub element_id: String,
    pub focus: f64,
    pub gap: f64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Binding {
    pub fn new(element_id: impl Into<String>, gap: f64) -> Self {
        Self {
            element_id: element_id.into(),
            focus: 0.0,
            gap,
            extra: Map::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Arrowhead {
    Arrow,
    Bar,
    Dot,
    Circle,
    CircleOutline,
    Triangle,
    TriangleOutline,
    Diamond,
    DiamondOutline,
    /// Any other head name (e.g. `crowfoot_many`), written back as-is.
    #[serde(untagged)]
    Other(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    Left,
    #[default]
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerticalAlign {
    Top,
    #[default]
    Middle,
    Bottom,
}

/// Fields shared by every element. Keys this model does not know are kept in
/// `extra` so documents written by other tools survive a patch.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ElementBase {
    pub id: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub angle: f64,
    pub stroke_color: String,
    pub background_color: String,
    pub fill_style: FillStyle,
    pub stroke_width: f64,
    pub stroke_style: StrokeStyle,
    pub roughness: u8,
    pub opacity: u8,
    pub group_ids: Vec<String>,
    pub frame_id: Option<String>,
    pub roundness: Option<Roundness>,
    pub seed: i64,
    pub version: u64,
    pub version_nonce: i64,
    pub is_deleted: bool,
    pub bound_elements: Option<Vec<BoundElement>>,
    pub updated: u64,
    pub link: Option<String>,
    pub locked: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapeElement {
    #[serde(flatten)]
    pub base: ElementBase,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextElement {
    #[serde(flatten)]
    pub base: ElementBase,
    pub text: String,
    pub font_size: f64,
    pub font_family: u32,
    #[serde(default)]
    pub text_align: TextAlign,
    #[serde(default)]
    pub vertical_align: VerticalAlign,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub baseline: Option<f64>,
    #[serde(default)]
    pub container_id: Option<String>,
    #[serde(default)]
    pub original_text: String,
    #[serde(default = "default_auto_resize")]
    pub auto_resize: bool,
    #[serde(default = "default_line_height")]
    pub line_height: f64,
}

fn default_auto_resize() -> bool {
    true
}

fn default_line_height() -> f64 {
    1.25
}

/// Arrows and plain lines: a polyline relative to the element origin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinearElement {
    #[serde(flatten)]
    pub base: ElementBase,
    pub points: Vec<[f64; 2]>,
    #[serde(default)]
    pub last_committed_point: Option<[f64; 2]>,
    #[serde(default)]
    pub start_binding: Option<Binding>,
    #[serde(default)]
    pub end_binding: Option<Binding>,
    #[serde(default)]
    pub start_arrowhead: Option<Arrowhead>,
    #[serde(default)]
    pub end_arrowhead: Option<Arrowhead>,
}

impl LinearElement {
    /// Absolute x range covered by the points.
    fn x_extent(&self) -> (f64, f64) {
        let xs = self.points.iter().map(|point| self.base.x + point[0]);
        let min = xs.clone().fold(f64::INFINITY, f64::min);
        let max = xs.fold(f64::NEG_INFINITY, f64::max);
        if min.is_finite() && max.is_finite() {
            (min, max)
        } else {
            (self.base.x, self.base.x + self.base.width)
        }
    }

    fn y_extent(&self) -> (f64, f64) {
        let ys = self.points.iter().map(|point| self.base.y + point[1]);
        let min = ys.clone().fold(f64::INFINITY, f64::min);
        let max = ys.fold(f64::NEG_INFINITY, f64::max);
        if min.is_finite() && max.is_finite() {
            (min, max)
        } else {
            (self.base.y, self.base.y + self.base.height)
        }
    }
}

/// Element kinds, tagged by `type` on the wire.
///
/// Kinds this crate does not draw (`freedraw`, `frame`, `image`, ...) land in
/// `Other` with their `type` and remaining keys in `extra`, so they can be
/// moved and written back untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Element {
    Rectangle(ShapeElement),
    Ellipse(ShapeElement),
    Diamond(ShapeElement),
    Text(TextElement),
    Arrow(LinearElement),
    Line(LinearElement),
    #[serde(untagged)]
    Other(ElementBase),
}

impl Element {
    pub fn base(&self) -> &ElementBase {
        match self {
            Self::Rectangle(shape) | Self::Ellipse(shape) | Self::Diamond(shape) => &shape.base,
            Self::Text(text) => &text.base,
            Self::Arrow(linear) | Self::Line(linear) => &linear.base,
            Self::Other(base) => base,
        }
    }

    pub fn base_mut(&mut self) -> &mut ElementBase {
        match self {
            Self::Rectangle(shape) | Self::Ellipse(shape) | Self::Diamond(shape) => &mut shape.base,
            Self::Text(text) => &mut text.base,
            Self::Arrow(linear) | Self::Line(linear) => &mut linear.base,
            Self::Other(base) => base,
        }
    }

    pub fn id(&self) -> &str {
        &self.base().id
    }

    pub fn type_name(&self) -> &str {
        match self {
            Self::Rectangle(_) => "rectangle",
            Self::Ellipse(_) => "ellipse",
            Self::Diamond(_) => "diamond",
            Self::Text(_) => "text",
            Self::Arrow(_) => "arrow",
            Self::Line(_) => "line",
            Self::Other(base) => base
                .extra
                .get("type")
                .and_then(Value::as_str)
                .unwrap_or("unknown"),
        }
    }

    pub fn is_shape(&self) -> bool {
        matches!(self, Self::Rectangle(_) | Self::Ellipse(_) | Self::Diamond(_))
    }

    pub fn as_text(&self) -> Option<&TextElement> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_arrow(&self) -> Option<&LinearElement> {
        match self {
            Self::Arrow(arrow) => Some(arrow),
            _ => None,
        }
    }

    /// `(min_x, min_y, max_x, max_y)` in scene coordinates.
    pub fn bounds(&self) -> (f64, f64, f64, f64) {
        match self {
            Self::Arrow(linear) | Self::Line(linear) => {
                let (min_x, max_x) = linear.x_extent();
                let (min_y, max_y) = linear.y_extent();
                (min_x, min_y, max_x, max_y)
            }
            Self::Rectangle(_)
            | Self::Ellipse(_)
            | Self::Diamond(_)
            | Self::Text(_)
            | Self::Other(_) => {
                let base = self.base();
                (base.x, base.y, base.x + base.width, base.y + base.height)
            }
        }
    }

    pub fn translate(&mut self, dx: f64, dy: f64) {
        let base = self.base_mut();
        base.x += dx;
        base.y += dy;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppState {
    pub view_background_color: String,
    #[serde(default)]
    pub grid_size: Option<f64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AppState {
    pub fn new(view_background_color: impl Into<String>) -> Self {
        Self {
            view_background_color: view_background_color.into(),
            grid_size: None,
            extra: Map::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scene {
    #[serde(rename = "type")]
    pub kind: String,
    pub version: u32,
    pub source: String,
    pub elements: Vec<Element>,
    pub app_state: AppState,
    #[serde(default)]
    pub files: Map<String, Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Scene {
    pub fn new(source: impl Into<String>, app_state: AppState) -> Self {
        Self {
            kind: SCENE_TYPE.to_string(),
            version: SCENE_VERSION,
            source: source.into(),
            elements: Vec::new(),
            app_state,
            files: Map::new(),
            extra: Map::new(),
        }
    }

    pub fn element(&self, id: &str) -> Option<&Element> {
        self.elements.iter().find(|element| element.id() == id)
    }

    /// Bounding box over all elements; all zeros for an empty scene.
    pub fn bounds(&self) -> (f64, f64, f64, f64) {
        let mut iter = self.elements.iter().map(Element::bounds);
        let Some(first) = iter.next() else {
            return (0.0, 0.0, 0.0, 0.0);
        };
        iter.fold(first, |acc, b| {
            (acc.0.min(b.0), acc.1.min(b.1), acc.2.max(b.2), acc.3.max(b.3))
        })
    }
}
