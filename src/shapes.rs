//! Vector primitives: shapes, lines, icons and QR modules.
//!
//! Everything here works in page millimetres. `px` arguments are the page
//! length of one logical canvas pixel.

use qrcode::{EcLevel, QrCode};
use std::f32::consts::PI;

use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::ops::{Color, DrawOp, PathOp, PathSegment, Point, Rect, Stroke};
use crate::style::parse_color;
use crate::svg;
use crate::template::{
    ArrowDirection, IconContent, LineContent, LineStyle, Orientation, ShapeContent, ShapeKind,
};

// Control point distance for a quarter circle drawn as one cubic.
const KAPPA: f32 = 0.552_284_8;

const DEFAULT_LINE_WIDTH_PX: f32 = 1.0;

// Dash, gap and dot spacing never go below this page length (mm).
const MIN_PATTERN_MM: f32 = 0.1;
// Dashes or dots in one patterned line.
const MAX_PATTERN_MARKS: usize = 5_000;

// ============================================================================
// PATHS
// ============================================================================

/// Rectangle, with corners rounded by `radius` clamped to half the shorter
/// side.
pub fn rect_path(rect: Rect, radius: f32) -> Vec<PathSegment> {
    let Rect { x, y, width: w, height: h } = rect;
    let r = radius.min(w / 2.0).min(h / 2.0).max(0.0);
    if r == 0.0 {
        return vec![
            PathSegment::MoveTo(Point::new(x, y)),
            PathSegment::LineTo(Point::new(x + w, y)),
            PathSegment::LineTo(Point::new(x + w, y + h)),
            PathSegment::LineTo(Point::new(x, y + h)),
            PathSegment::Close,
        ];
    }

    let k = r * KAPPA;
    let (right, bottom) = (x + w, y + h);
    vec![
        PathSegment::MoveTo(Point::new(x + r, y)),
        PathSegment::LineTo(Point::new(right - r, y)),
        PathSegment::CurveTo(
            Point::new(right - r + k, y),
            Point::new(right, y + r - k),
            Point::new(right, y + r),
        ),
        PathSegment::LineTo(Point::new(right, bottom - r)),
        PathSegment::CurveTo(
            Point::new(right, bottom - r + k),
            Point::new(right - r + k, bottom),
            Point::new(right - r, bottom),
        ),
        PathSegment::LineTo(Point::new(x + r, bottom)),
        PathSegment::CurveTo(
            Point::new(x + r - k, bottom),
            Point::new(x, bottom - r + k),
            Point::new(x, bottom - r),
        ),
        PathSegment::LineTo(Point::new(x, y + r)),
        PathSegment::CurveTo(Point::new(x, y + r - k), Point::new(x + r - k, y), Point::new(x + r, y)),
        PathSegment::Close,
    ]
}

/// Ellipse inscribed in `rect`, four cubic arcs.
pub fn ellipse_path(rect: Rect) -> Vec<PathSegment> {
    let c = rect.center();
    let (rx, ry) = (rect.width / 2.0, rect.height / 2.0);
    let (kx, ky) = (rx * KAPPA, ry * KAPPA);
    vec![
        PathSegment::MoveTo(Point::new(c.x + rx, c.y)),
        PathSegment::CurveTo(
            Point::new(c.x + rx, c.y + ky),
            Point::new(c.x + kx, c.y + ry),
            Point::new(c.x, c.y + ry),
        ),
        PathSegment::CurveTo(
            Point::new(c.x - kx, c.y + ry),
            Point::new(c.x - rx, c.y + ky),
            Point::new(c.x - rx, c.y),
        ),
        PathSegment::CurveTo(
            Point::new(c.x - rx, c.y - ky),
            Point::new(c.x - kx, c.y - ry),
            Point::new(c.x, c.y - ry),
        ),
        PathSegment::CurveTo(
            Point::new(c.x + kx, c.y - ry),
            Point::new(c.x + rx, c.y - ky),
            Point::new(c.x + rx, c.y),
        ),
        PathSegment::Close,
    ]
}

/// Isosceles triangle, apex at the top centre.
pub fn triangle_path(rect: Rect) -> Vec<PathSegment> {
    vec![
        PathSegment::MoveTo(Point::new(rect.center().x, rect.y)),
        PathSegment::LineTo(Point::new(rect.right(), rect.bottom())),
        PathSegment::LineTo(Point::new(rect.x, rect.bottom())),
        PathSegment::Close,
    ]
}

fn polygon(points: &[Point]) -> Vec<PathSegment> {
    let mut segments = Vec::with_capacity(points.len() + 1);
    for (i, p) in points.iter().enumerate() {
        segments.push(if i == 0 {
            PathSegment::MoveTo(*p)
        } else {
            PathSegment::LineTo(*p)
        });
    }
    segments.push(PathSegment::Close);
    segments
}

// ============================================================================
// SHAPES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaintMode {
    Fill,
    Stroke,
    FillStroke,
    None,
}

pub fn paint_mode(fill: Option<Color>, stroke: Option<Stroke>) -> PaintMode {
    match (fill.is_some(), stroke.is_some()) {
        (true, true) => PaintMode::FillStroke,
        (true, false) => PaintMode::Fill,
        (false, true) => PaintMode::Stroke,
        (false, false) => PaintMode::None,
    }
}

/// Rectangle, circle or triangle. With neither fill nor stroke nothing is
/// drawn; the component still occupies its box.
pub fn shape_ops(content: &ShapeContent, rect: Rect, radius: f32, px: f32, opacity: f32) -> Vec<DrawOp> {
    let fill = content
        .fill
        .as_deref()
        .and_then(parse_color)
        .map(|c| c.with_opacity(opacity))
        .filter(|c| !c.is_transparent());
    let stroke = content
        .stroke_width
        .filter(|w| w.is_finite() && *w > 0.0)
        .map(|w| Stroke {
            color: content
                .stroke
                .as_deref()
                .and_then(parse_color)
                .unwrap_or_else(Color::black)
                .with_opacity(opacity),
            width: w * px,
        });

    if paint_mode(fill, stroke) == PaintMode::None {
        return Vec::new();
    }

    let segments = match content.shape {
        ShapeKind::Rectangle => rect_path(rect, radius),
        ShapeKind::Circle => ellipse_path(rect),
        ShapeKind::Triangle => triangle_path(rect),
    };
    vec![DrawOp::Path(PathOp {
        segments,
        fill,
        stroke,
    })]
}

// ============================================================================
// LINES
// ============================================================================

/// A straight rule along the centre of the box. Orientation defaults to the
/// longer side. A dash or dot pattern that would need more than
/// `MAX_PATTERN_MARKS` marks is skipped with a render diagnostic.
pub fn line_ops(
    content: &LineContent,
    rect: Rect,
    px: f32,
    color: Color,
    diag: &mut Diagnostics,
) -> Vec<DrawOp> {
    let color = content.color.as_deref().and_then(parse_color).unwrap_or(color);
    let width = content
        .thickness
        .filter(|t| t.is_finite() && *t > 0.0)
        .unwrap_or(DEFAULT_LINE_WIDTH_PX)
        * px;
    let orientation = content.orientation.unwrap_or(if rect.width >= rect.height {
        Orientation::Horizontal
    } else {
        Orientation::Vertical
    });

    // Start, unit direction, length, unit normal.
    let c = rect.center();
    let (start, dir, length, normal) = match orientation {
        Orientation::Horizontal => (Point::new(rect.x, c.y), (1.0, 0.0), rect.width, (0.0, 1.0)),
        Orientation::Vertical => (Point::new(c.x, rect.y), (0.0, 1.0), rect.height, (1.0, 0.0)),
    };
    let at = |t: f32, offset: f32| {
        Point::new(
            start.x + dir.0 * t + normal.0 * offset,
            start.y + dir.1 * t + normal.1 * offset,
        )
    };
    let stroke = Some(Stroke { color, width });

    let segments = match content.style {
        LineStyle::Solid => vec![PathSegment::MoveTo(at(0.0, 0.0)), PathSegment::LineTo(at(length, 0.0))],
        LineStyle::Double => vec![
            PathSegment::MoveTo(at(0.0, -width)),
            PathSegment::LineTo(at(length, -width)),
            PathSegment::MoveTo(at(0.0, width)),
            PathSegment::LineTo(at(length, width)),
        ],
        LineStyle::Dashed => {
            let dash = content
                .dash_length
                .filter(|d| d.is_finite() && *d > 0.0)
                .map(|d| d * px)
                .unwrap_or(width * 4.0)
                .max(MIN_PATTERN_MM);
            let gap = content
                .gap_length
                .filter(|g| g.is_finite() && *g > 0.0)
                .map(|g| g * px)
                .unwrap_or(width * 2.0)
                .max(MIN_PATTERN_MM);
            let period = dash + gap;
            let Some(marks) = pattern_marks((length / period).ceil(), diag) else {
                return Vec::new();
            };
            let mut segments = Vec::with_capacity(marks * 2);
            for i in 0..marks {
                let t = i as f32 * period;
                if t >= length {
                    break;
                }
                segments.push(PathSegment::MoveTo(at(t, 0.0)));
                segments.push(PathSegment::LineTo(at((t + dash).min(length), 0.0)));
            }
            segments
        }
        LineStyle::Dotted => {
            let radius = width / 2.0;
            let spacing = content
                .gap_length
                .filter(|g| g.is_finite() && *g > 0.0)
                .map(|g| g * px + width)
                .unwrap_or(width * 2.0)
                .max(MIN_PATTERN_MM);
            let fitting = if length >= width {
                ((length - width) / spacing + 1e-4).floor() + 1.0
            } else {
                0.0
            };
            let Some(marks) = pattern_marks(fitting, diag) else {
                return Vec::new();
            };
            let mut segments = Vec::new();
            for i in 0..marks {
                let p = at(radius + i as f32 * spacing, 0.0);
                segments.extend(ellipse_path(Rect::new(p.x - radius, p.y - radius, width, width)));
            }
            return vec![DrawOp::Path(PathOp {
                segments,
                fill: Some(color),
                stroke: None,
            })];
        }
    };

    vec![DrawOp::Path(PathOp {
        segments,
        fill: None,
        stroke,
    })]
}

fn pattern_marks(count: f32, diag: &mut Diagnostics) -> Option<usize> {
    if count.is_finite() && count <= MAX_PATTERN_MARKS as f32 {
        Some(count.max(0.0) as usize)
    } else {
        diag.warn(
            DiagnosticKind::Render,
            format!("line pattern needs {} marks, more than {}", count, MAX_PATTERN_MARKS),
        );
        None
    }
}

// ============================================================================
// ICONS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Icon {
    Star,
    Heart,
    Check,
    Arrow(ArrowDirection),
    Custom,
}

impl Icon {
    pub fn parse(name: &str, direction: ArrowDirection) -> Option<Icon> {
        match name.trim().to_ascii_lowercase().as_str() {
            "star" => Some(Icon::Star),
            "heart" => Some(Icon::Heart),
            "check" | "checkmark" | "check-mark" => Some(Icon::Check),
            "arrow" => Some(Icon::Arrow(direction)),
            "arrow-right" => Some(Icon::Arrow(ArrowDirection::Right)),
            "arrow-left" => Some(Icon::Arrow(ArrowDirection::Left)),
            "arrow-up" => Some(Icon::Arrow(ArrowDirection::Up)),
            "arrow-down" => Some(Icon::Arrow(ArrowDirection::Down)),
            "custom" | "svg" => Some(Icon::Custom),
            _ => None,
        }
    }
}

// Icons are drawn in a unit square fitted into the box.
fn unit_square(rect: Rect) -> Rect {
    let side = rect.width.min(rect.height);
    Rect::new(
        rect.x + (rect.width - side) / 2.0,
        rect.y + (rect.height - side) / 2.0,
        side,
        side,
    )
}

fn star_points() -> Vec<Point> {
    let inner = 0.5 * 0.382;
    (0..10)
        .map(|i| {
            let angle = -PI / 2.0 + i as f32 * PI / 5.0;
            let r = if i % 2 == 0 { 0.5 } else { inner };
            Point::new(0.5 + r * angle.cos(), 0.5 + r * angle.sin())
        })
        .collect()
}

fn heart_segments() -> Vec<PathSegment> {
    let p = Point::new;
    vec![
        PathSegment::MoveTo(p(0.5, 0.9)),
        PathSegment::CurveTo(p(0.5, 0.9), p(0.05, 0.6), p(0.05, 0.32)),
        PathSegment::CurveTo(p(0.05, 0.15), p(0.2, 0.05), p(0.32, 0.05)),
        PathSegment::CurveTo(p(0.42, 0.05), p(0.5, 0.12), p(0.5, 0.2)),
        PathSegment::CurveTo(p(0.5, 0.12), p(0.58, 0.05), p(0.68, 0.05)),
        PathSegment::CurveTo(p(0.8, 0.05), p(0.95, 0.15), p(0.95, 0.32)),
        PathSegment::CurveTo(p(0.95, 0.6), p(0.5, 0.9), p(0.5, 0.9)),
        PathSegment::Close,
    ]
}

fn arrow_points(direction: ArrowDirection) -> Vec<Point> {
    let degrees: f32 = match direction {
        ArrowDirection::Right => 0.0,
        ArrowDirection::Down => 90.0,
        ArrowDirection::Left => 180.0,
        ArrowDirection::Up => 270.0,
    };
    let (sin, cos) = degrees.to_radians().sin_cos();
    [
        (0.05, 0.4),
        (0.55, 0.4),
        (0.55, 0.15),
        (0.95, 0.5),
        (0.55, 0.85),
        (0.55, 0.6),
        (0.05, 0.6),
    ]
    .iter()
    .map(|&(x, y)| {
        let (dx, dy) = (x - 0.5, y - 0.5);
        Point::new(0.5 + dx * cos - dy * sin, 0.5 + dx * sin + dy * cos)
    })
    .collect()
}

/// Draws a named icon, or custom SVG path data, in `color`. Unknown names and
/// unusable custom sources are skipped with a render diagnostic.
pub fn icon_ops(content: &IconContent, rect: Rect, color: Color, diag: &mut Diagnostics) -> Vec<DrawOp> {
    let color = content.color.as_deref().and_then(parse_color).unwrap_or(color);
    let Some(icon) = Icon::parse(&content.icon, content.direction) else {
        diag.warn(DiagnosticKind::Render, format!("unknown icon '{}'", content.icon));
        return Vec::new();
    };

    let unit = [0.0, 0.0, 1.0, 1.0];
    let square = unit_square(rect);
    let filled = |segments: Vec<PathSegment>| {
        vec![DrawOp::Path(PathOp {
            segments: svg::fit_to_rect(&segments, unit, square),
            fill: Some(color),
            stroke: None,
        })]
    };

    match icon {
        Icon::Star => filled(polygon(&star_points())),
        Icon::Heart => filled(heart_segments()),
        Icon::Arrow(direction) => filled(polygon(&arrow_points(direction))),
        Icon::Check => {
            let segments = vec![
                PathSegment::MoveTo(Point::new(0.15, 0.55)),
                PathSegment::LineTo(Point::new(0.4, 0.8)),
                PathSegment::LineTo(Point::new(0.85, 0.25)),
            ];
            vec![DrawOp::Path(PathOp {
                segments: svg::fit_to_rect(&segments, unit, square),
                fill: None,
                stroke: Some(Stroke {
                    color,
                    width: square.width * 0.12,
                }),
            })]
        }
        Icon::Custom => custom_icon(content, rect, color, diag),
    }
}

fn custom_icon(content: &IconContent, rect: Rect, color: Color, diag: &mut Diagnostics) -> Vec<DrawOp> {
    let Some(source) = content.path.as_deref().and_then(svg::parse_icon_source) else {
        diag.warn(DiagnosticKind::Render, "custom icon has no usable path data");
        return Vec::new();
    };
    let view_box = content
        .view_box
        .filter(|vb| vb[2] > 0.0 && vb[3] > 0.0)
        .or(source.view_box)
        .unwrap_or(svg::DEFAULT_VIEW_BOX);

    let segments: Vec<PathSegment> = source
        .paths
        .iter()
        .flat_map(|d| svg::parse_path_data(d))
        .collect();
    if segments.is_empty() {
        diag.warn(DiagnosticKind::Render, "custom icon path data is empty or malformed");
        return Vec::new();
    }

    vec![DrawOp::Path(PathOp {
        segments: svg::fit_to_rect(&segments, view_box, rect),
        fill: Some(color),
        stroke: None,
    })]
}

// ============================================================================
// QR
// ============================================================================

/// Dark modules of a QR code as one filled path, square and centered in
/// the box, over an optional background.
pub fn qr_ops(
    data: &str,
    rect: Rect,
    foreground: Color,
    background: Option<Color>,
) -> Result<Vec<DrawOp>, qrcode::types::QrError> {
    let code = QrCode::with_error_correction_level(data.as_bytes(), EcLevel::M)?;
    let modules = code.width();
    let square = unit_square(rect);
    let module = square.width / modules as f32;

    let mut ops = Vec::new();
    if let Some(bg) = background {
        ops.push(DrawOp::Path(PathOp {
            segments: rect_path(square, 0.0),
            fill: Some(bg),
            stroke: None,
        }));
    }

    // Horizontal runs of dark modules become one rectangle each.
    let mut segments = Vec::new();
    for qy in 0..modules {
        let mut qx = 0;
        while qx < modules {
            if code[(qx, qy)] != qrcode::Color::Dark {
                qx += 1;
                continue;
            }
            let run_start = qx;
            while qx < modules && code[(qx, qy)] == qrcode::Color::Dark {
                qx += 1;
            }
            segments.extend(rect_path(
                Rect::new(
                    square.x + run_start as f32 * module,
                    square.y + qy as f32 * module,
                    (qx - run_start) as f32 * module,
                    module,
                ),
                0.0,
            ));
        }
    }
    ops.push(DrawOp::Path(PathOp {
        segments,
        fill: Some(foreground),
        stroke: None,
    }));
    Ok(ops)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(ops: &[DrawOp]) -> &PathOp {
        match ops {
            [DrawOp::Path(p)] => p,
            other => panic!("expected a single path, got {:?}", other),
        }
    }

    fn subpaths(op: &PathOp) -> usize {
        op.segments
            .iter()
            .filter(|s| matches!(s, PathSegment::MoveTo(_)))
            .count()
    }

    #[test]
    fn test_paint_modes() {
        let stroke = Some(Stroke {
            color: Color::black(),
            width: 1.0,
        });
        assert_eq!(paint_mode(Some(Color::black()), stroke), PaintMode::FillStroke);
        assert_eq!(paint_mode(Some(Color::black()), None), PaintMode::Fill);
        assert_eq!(paint_mode(None, stroke), PaintMode::Stroke);
        assert_eq!(paint_mode(None, None), PaintMode::None);
    }

    #[test]
    fn test_shape_without_paint_draws_nothing() {
        let rect = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert!(shape_ops(&ShapeContent::default(), rect, 0.0, 1.0, 1.0).is_empty());

        let stroked = ShapeContent {
            shape: ShapeKind::Circle,
            stroke_width: Some(2.0),
            ..Default::default()
        };
        let ops = shape_ops(&stroked, rect, 0.0, 0.5, 1.0);
        let op = path(&ops);
        assert_eq!(op.fill, None);
        assert_eq!(op.stroke.map(|s| s.width), Some(1.0));
    }

    #[test]
    fn test_rounded_rect_clamps_radius() {
        let segments = rect_path(Rect::new(0.0, 0.0, 10.0, 4.0), 50.0);
        assert_eq!(segments[0], PathSegment::MoveTo(Point::new(2.0, 0.0)));
        assert_eq!(segments.iter().filter(|s| matches!(s, PathSegment::CurveTo(..))).count(), 4);
        assert_eq!(rect_path(Rect::new(0.0, 0.0, 10.0, 4.0), 0.0).len(), 5);
    }

    #[test]
    fn test_line_styles() {
        let rect = Rect::new(0.0, 0.0, 100.0, 4.0);
        let solid = line_ops(&LineContent::default(), rect, 1.0, Color::black(), &mut Diagnostics::new());
        assert_eq!(path(&solid).segments.len(), 2);
        assert!(path(&solid).fill.is_none());

        let dashed = LineContent {
            style: LineStyle::Dashed,
            thickness: Some(2.0),
            dash_length: Some(6.0),
            gap_length: Some(4.0),
            ..Default::default()
        };
        // 100 / (6 + 4) dashes.
        assert_eq!(subpaths(path(&line_ops(&dashed, rect, 1.0, Color::black(), &mut Diagnostics::new()))), 10);

        let dotted = LineContent {
            style: LineStyle::Dotted,
            thickness: Some(2.0),
            ..Default::default()
        };
        let dots = line_ops(&dotted, rect, 1.0, Color::black(), &mut Diagnostics::new());
        let op = path(&dots);
        assert!(op.fill.is_some() && op.stroke.is_none());
        // Radius 1, centres 4 apart from 1 to 97.
        assert_eq!(subpaths(op), 25);

        let double = LineContent {
            style: LineStyle::Double,
            thickness: Some(1.0),
            ..Default::default()
        };
        let op = line_ops(&double, rect, 1.0, Color::black(), &mut Diagnostics::new());
        let segments = &path(&op).segments;
        assert_eq!(segments[0], PathSegment::MoveTo(Point::new(0.0, 1.0)));
        assert_eq!(segments[2], PathSegment::MoveTo(Point::new(0.0, 3.0)));
    }

    #[test]
    fn test_tiny_dash_pattern_is_bounded() {
        let rect = Rect::new(0.0, 0.0, 100.0, 4.0);
        let mut diag = Diagnostics::new();
        let dashed = LineContent {
            style: LineStyle::Dashed,
            dash_length: Some(1e-7),
            gap_length: Some(1e-7),
            ..Default::default()
        };
        // Clamped to 0.1 + 0.1 mm: about 500 dashes.
        let ops = line_ops(&dashed, rect, 1.0, Color::black(), &mut diag);
        let dashes = subpaths(path(&ops));
        assert!((499..=501).contains(&dashes), "{} dashes", dashes);
        assert!(diag.is_empty());

        let dotted = LineContent {
            style: LineStyle::Dotted,
            thickness: Some(1e-7),
            gap_length: Some(1e-7),
            ..Default::default()
        };
        let ops = line_ops(&dotted, rect, 1.0, Color::black(), &mut diag);
        assert_eq!(ops.len(), 1);
    }

    #[test]
    fn test_oversized_pattern_is_skipped() {
        let rect = Rect::new(0.0, 0.0, 10_000.0, 4.0);
        let mut diag = Diagnostics::new();
        let dashed = LineContent {
            style: LineStyle::Dashed,
            dash_length: Some(1e-7),
            gap_length: Some(1e-7),
            ..Default::default()
        };
        assert!(line_ops(&dashed, rect, 1.0, Color::black(), &mut diag).is_empty());
        assert_eq!(diag.count(DiagnosticKind::Render), 1);
    }

    #[test]
    fn test_vertical_line_for_tall_box() {
        let rect = Rect::new(10.0, 0.0, 2.0, 50.0);
        let ops = line_ops(&LineContent::default(), rect, 1.0, Color::black(), &mut Diagnostics::new());
        assert_eq!(
            path(&ops).segments,
            vec![
                PathSegment::MoveTo(Point::new(11.0, 0.0)),
                PathSegment::LineTo(Point::new(11.0, 50.0)),
            ]
        );
    }

    #[test]
    fn test_named_icons() {
        let rect = Rect::new(0.0, 0.0, 20.0, 10.0);
        let mut diag = Diagnostics::new();
        for name in ["star", "heart", "check", "arrow"] {
            let content = IconContent {
                icon: name.into(),
                ..Default::default()
            };
            assert_eq!(icon_ops(&content, rect, Color::black(), &mut diag).len(), 1, "{}", name);
        }
        assert!(diag.is_empty());

        let unknown = IconContent {
            icon: "unicorn".into(),
            ..Default::default()
        };
        assert!(icon_ops(&unknown, rect, Color::black(), &mut diag).is_empty());
        assert_eq!(diag.count(DiagnosticKind::Render), 1);
    }

    #[test]
    fn test_arrow_direction_rotates_tip() {
        let tip = |direction| arrow_points(direction)[3];
        let up = tip(ArrowDirection::Up);
        assert!((up.x - 0.5).abs() < 1e-5 && (up.y - 0.05).abs() < 1e-5);
        let left = tip(ArrowDirection::Left);
        assert!((left.x - 0.05).abs() < 1e-5 && (left.y - 0.5).abs() < 1e-5);
    }

    #[test]
    fn test_custom_icon_from_path_data() {
        let content = IconContent {
            icon: "custom".into(),
            path: Some("M0 0H24V24H0Z".into()),
            ..Default::default()
        };
        let mut diag = Diagnostics::new();
        let ops = icon_ops(&content, Rect::new(0.0, 0.0, 12.0, 12.0), Color::black(), &mut diag);
        assert_eq!(path(&ops).segments.len(), 5);

        let missing = IconContent {
            icon: "custom".into(),
            ..Default::default()
        };
        assert!(icon_ops(&missing, Rect::new(0.0, 0.0, 12.0, 12.0), Color::black(), &mut diag).is_empty());
        assert_eq!(diag.count(DiagnosticKind::Render), 1);
    }

    #[test]
    fn test_qr_is_square_and_centered() {
        let rect = Rect::new(0.0, 0.0, 60.0, 40.0);
        let ops = qr_ops("https://example.com/p/123", rect, Color::black(), Some(Color::white())).unwrap();
        assert_eq!(ops.len(), 2);
        match &ops[0] {
            DrawOp::Path(bg) => assert_eq!(bg.segments[0], PathSegment::MoveTo(Point::new(10.0, 0.0))),
            other => panic!("expected background, got {:?}", other),
        }
        match &ops[1] {
            DrawOp::Path(modules) => assert!(subpaths(modules) > 20),
            other => panic!("expected modules, got {:?}", other),
        }
    }
}
