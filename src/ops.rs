//! Output model: a Document is an ordered list of Pages, a Page an ordered
//! list of draw operations in page space.
//!
//! Page space is millimetres with the origin at the top-left corner of the
//! page and y growing downwards. Font sizes are in points.

use std::sync::Arc;

use crate::assets::RasterImage;
use crate::font_metrics::FontFace;

// ============================================================================
// PRIMITIVES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f32,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Color { r, g, b, a: 1.0 }
    }

    pub fn black() -> Self {
        Color::rgb(0, 0, 0)
    }

    pub fn white() -> Self {
        Color::rgb(255, 255, 255)
    }

    pub fn with_opacity(self, opacity: f32) -> Self {
        Color {
            a: (self.a * opacity).clamp(0.0, 1.0),
            ..self
        }
    }

    pub fn is_transparent(&self) -> bool {
        self.a <= 0.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Point { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Rect { x, y, width, height }
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Shrinks the rectangle by `amount` on every side, never below zero size.
    pub fn inset(&self, amount: f32) -> Rect {
        let dx = amount.min(self.width / 2.0).max(0.0);
        let dy = amount.min(self.height / 2.0).max(0.0);
        Rect::new(
            self.x + dx,
            self.y + dy,
            self.width - 2.0 * dx,
            self.height - 2.0 * dy,
        )
    }
}

// ============================================================================
// DRAW OPERATIONS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathSegment {
    MoveTo(Point),
    LineTo(Point),
    /// Cubic bezier: two control points, then the end point.
    CurveTo(Point, Point, Point),
    Close,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stroke {
    pub color: Color,
    /// Line width in millimetres.
    pub width: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PathOp {
    pub segments: Vec<PathSegment>,
    pub fill: Option<Color>,
    pub stroke: Option<Stroke>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    pub x: f32,
    /// Baseline position, page space.
    pub baseline: f32,
    pub text: String,
    pub font: FontFace,
    pub size_pt: f32,
    pub color: Color,
}

#[derive(Debug, Clone)]
pub struct ImageBlit {
    /// Where the whole image lands; may extend past `clip` for `cover`.
    pub dest: Rect,
    pub clip: Rect,
    pub image: Arc<RasterImage>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rotation {
    /// Rotation origin: the centre of the component's box, in page mm.
    pub center: Point,
    /// Clockwise on the page, in degrees.
    pub degrees: f32,
}

#[derive(Debug, Clone)]
pub enum DrawOp {
    Text(TextRun),
    Path(PathOp),
    Image(ImageBlit),
    /// The operations produced by one template component.
    Component {
        id: String,
        rotation: Option<Rotation>,
        ops: Vec<DrawOp>,
    },
}

// ============================================================================
// PAGE / DOCUMENT
// ============================================================================

#[derive(Debug, Clone)]
pub struct Page {
    pub width_mm: f32,
    pub height_mm: f32,
    pub ops: Vec<DrawOp>,
}

impl Page {
    pub fn new(width_mm: f32, height_mm: f32) -> Self {
        Page {
            width_mm,
            height_mm,
            ops: Vec::new(),
        }
    }

    /// Ids of the components drawn on this page, in paint order.
    pub fn component_ids(&self) -> Vec<&str> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::Component { id, .. } => Some(id.as_str()),
                _ => None,
            })
            .collect()
    }

    /// The operations of one component, if it was drawn.
    pub fn component(&self, id: &str) -> Option<&[DrawOp]> {
        self.ops.iter().find_map(|op| match op {
            DrawOp::Component { id: op_id, ops, .. } if op_id == id => Some(ops.as_slice()),
            _ => None,
        })
    }

    /// All primitive operations in paint order, component groups flattened.
    pub fn primitives(&self) -> Vec<&DrawOp> {
        fn walk<'a>(ops: &'a [DrawOp], out: &mut Vec<&'a DrawOp>) {
            for op in ops {
                match op {
                    DrawOp::Component { ops, .. } => walk(ops, out),
                    other => out.push(other),
                }
            }
        }
        let mut out = Vec::new();
        walk(&self.ops, &mut out);
        out
    }

    pub fn text_runs(&self) -> Vec<&TextRun> {
        self.primitives()
            .into_iter()
            .filter_map(|op| match op {
                DrawOp::Text(run) => Some(run),
                _ => None,
            })
            .collect()
    }
}

#[derive(Debug, Clone, Default)]
pub struct Document {
    pub pages: Vec<Page>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, page: Page) {
        self.pages.push(page);
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}
