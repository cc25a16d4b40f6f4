// SVG path data for custom icons.
// Accepts a bare `d` string, inline <svg> markup, or an svg data URL.

use base64::Engine;
use std::f32::consts::PI;

use crate::ops::{PathSegment, Point, Rect};

/// Icon coordinate space used when the source does not declare one.
pub const DEFAULT_VIEW_BOX: [f32; 4] = [0.0, 0.0, 24.0, 24.0];

#[derive(Debug, Clone, PartialEq)]
pub struct IconSource {
    pub view_box: Option<[f32; 4]>,
    /// One entry per `<path>` element, in document order.
    pub paths: Vec<String>,
}

/// Reads the path data out of whatever an icon component carries.
pub fn parse_icon_source(source: &str) -> Option<IconSource> {
    let source = source.trim();
    if source.is_empty() {
        return None;
    }

    if let Some(rest) = source.strip_prefix("data:") {
        let (meta, payload) = rest.split_once(',')?;
        if !meta.starts_with("image/svg+xml") {
            return None;
        }
        let markup = if meta.ends_with(";base64") {
            let bytes = base64::engine::general_purpose::STANDARD.decode(payload.trim()).ok()?;
            String::from_utf8(bytes).ok()?
        } else {
            urlencoding::decode(payload).ok()?.into_owned()
        };
        return parse_markup(&markup);
    }

    if source.contains('<') {
        return parse_markup(source);
    }

    Some(IconSource {
        view_box: None,
        paths: vec![source.to_string()],
    })
}

fn parse_markup(markup: &str) -> Option<IconSource> {
    let view_box = extract_tag(markup, "svg")
        .and_then(|tag| extract_attr(&tag, "viewBox"))
        .and_then(|vb| parse_view_box(&vb));
    let paths: Vec<String> = extract_all_tags(markup, "path")
        .iter()
        .filter_map(|tag| extract_attr(tag, "d"))
        .collect();
    if paths.is_empty() {
        return None;
    }
    Some(IconSource { view_box, paths })
}

fn parse_view_box(value: &str) -> Option<[f32; 4]> {
    let parts: Vec<f32> = value
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|s| !s.is_empty())
        .filter_map(|s| s.parse().ok())
        .collect();
    match parts.as_slice() {
        [x, y, w, h] if *w > 0.0 && *h > 0.0 => Some([*x, *y, *w, *h]),
        _ => None,
    }
}

// ============================================================================
// PATH DATA
// ============================================================================

struct Lexer<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Lexer<'a> {
    fn new(d: &'a str) -> Self {
        Lexer { bytes: d.as_bytes(), pos: 0 }
    }

    fn skip_separators(&mut self) {
        while let Some(&b) = self.bytes.get(self.pos) {
            if b.is_ascii_whitespace() || b == b',' {
                self.pos += 1;
            } else {
                break;
            }
        }
    }

    fn command(&mut self) -> Option<u8> {
        self.skip_separators();
        let b = *self.bytes.get(self.pos)?;
        if b.is_ascii_alphabetic() && b != b'e' && b != b'E' {
            self.pos += 1;
            Some(b)
        } else {
            None
        }
    }

    fn at_number(&mut self) -> bool {
        self.skip_separators();
        matches!(self.bytes.get(self.pos), Some(b) if b.is_ascii_digit() || matches!(b, b'-' | b'+' | b'.'))
    }

    fn number(&mut self) -> Option<f32> {
        self.skip_separators();
        let start = self.pos;
        let mut seen_dot = false;
        let mut seen_exp = false;
        if matches!(self.bytes.get(self.pos), Some(b'-' | b'+')) {
            self.pos += 1;
        }
        while let Some(&b) = self.bytes.get(self.pos) {
            match b {
                b'0'..=b'9' => self.pos += 1,
                // "1.5.5" is two numbers.
                b'.' if !seen_dot && !seen_exp => {
                    seen_dot = true;
                    self.pos += 1;
                }
                b'e' | b'E' if !seen_exp => {
                    seen_exp = true;
                    self.pos += 1;
                    if matches!(self.bytes.get(self.pos), Some(b'-' | b'+')) {
                        self.pos += 1;
                    }
                }
                _ => break,
            }
        }
        std::str::from_utf8(&self.bytes[start..self.pos]).ok()?.parse().ok()
    }

    // Arc flags may be written without separators: "a1 1 0 00 1 1".
    fn flag(&mut self) -> Option<bool> {
        self.skip_separators();
        let b = *self.bytes.get(self.pos)?;
        self.pos += 1;
        match b {
            b'0' => Some(false),
            b'1' => Some(true),
            _ => None,
        }
    }

    fn pair(&mut self) -> Option<Point> {
        Some(Point::new(self.number()?, self.number()?))
    }

    fn two_pairs(&mut self) -> Option<(Point, Point)> {
        Some((self.pair()?, self.pair()?))
    }

    fn three_pairs(&mut self) -> Option<(Point, Point, Point)> {
        Some((self.pair()?, self.pair()?, self.pair()?))
    }

    fn arc(&mut self) -> Option<Arc> {
        Some(Arc {
            rx: self.number()?,
            ry: self.number()?,
            rotation: self.number()?,
            large_arc: self.flag()?,
            sweep: self.flag()?,
            end: self.pair()?,
        })
    }
}

struct Arc {
    rx: f32,
    ry: f32,
    rotation: f32,
    large_arc: bool,
    sweep: bool,
    end: Point,
}

/// Parses path data into absolute segments. Quadratics and arcs become
/// cubics; parsing stops at the first malformed command.
pub fn parse_path_data(d: &str) -> Vec<PathSegment> {
    let mut lexer = Lexer::new(d);
    let mut segments = Vec::new();
    let mut current = Point::default();
    let mut start = Point::default();
    // Reflected control points for S/s and T/t.
    let mut last_cubic: Option<Point> = None;
    let mut last_quad: Option<Point> = None;
    let mut command: Option<u8> = None;

    loop {
        let cmd = match lexer.command() {
            Some(c) => c,
            None if lexer.at_number() => match command {
                // Extra coordinates after a moveto are linetos.
                Some(b'M') => b'L',
                Some(b'm') => b'l',
                Some(c) if !matches!(c, b'Z' | b'z') => c,
                _ => break,
            },
            None => break,
        };
        command = Some(cmd);
        let relative = cmd.is_ascii_lowercase();
        let origin = if relative { current } else { Point::default() };
        let offset = |p: Point| Point::new(origin.x + p.x, origin.y + p.y);

        let parsed = match cmd.to_ascii_uppercase() {
            b'M' => lexer.pair().map(|p| {
                current = offset(p);
                start = current;
                segments.push(PathSegment::MoveTo(current));
            }),
            b'L' => lexer.pair().map(|p| {
                current = offset(p);
                segments.push(PathSegment::LineTo(current));
            }),
            b'H' => lexer.number().map(|x| {
                current.x = if relative { current.x + x } else { x };
                segments.push(PathSegment::LineTo(current));
            }),
            b'V' => lexer.number().map(|y| {
                current.y = if relative { current.y + y } else { y };
                segments.push(PathSegment::LineTo(current));
            }),
            b'C' => lexer.three_pairs().map(|(c1, c2, end)| {
                let (c1, c2, end) = (offset(c1), offset(c2), offset(end));
                segments.push(PathSegment::CurveTo(c1, c2, end));
                last_cubic = Some(c2);
                current = end;
            }),
            b'S' => lexer.two_pairs().map(|(c2, end)| {
                let c1 = reflect(last_cubic, current);
                let (c2, end) = (offset(c2), offset(end));
                segments.push(PathSegment::CurveTo(c1, c2, end));
                last_cubic = Some(c2);
                current = end;
            }),
            b'Q' => lexer.two_pairs().map(|(control, end)| {
                let (control, end) = (offset(control), offset(end));
                segments.push(quad_to_cubic(current, control, end));
                last_quad = Some(control);
                current = end;
            }),
            b'T' => lexer.pair().map(|end| {
                let control = reflect(last_quad, current);
                let end = offset(end);
                segments.push(quad_to_cubic(current, control, end));
                last_quad = Some(control);
                current = end;
            }),
            b'A' => lexer.arc().map(|arc| {
                let end = offset(arc.end);
                segments.extend(arc_to_cubics(current, Arc { end, ..arc }));
                current = end;
            }),
            b'Z' => {
                segments.push(PathSegment::Close);
                current = start;
                Some(())
            }
            _ => None,
        };

        if parsed.is_none() {
            break;
        }
        if !matches!(cmd.to_ascii_uppercase(), b'C' | b'S') {
            last_cubic = None;
        }
        if !matches!(cmd.to_ascii_uppercase(), b'Q' | b'T') {
            last_quad = None;
        }
    }

    segments
}

fn reflect(control: Option<Point>, current: Point) -> Point {
    match control {
        Some(c) => Point::new(2.0 * current.x - c.x, 2.0 * current.y - c.y),
        None => current,
    }
}

fn quad_to_cubic(from: Point, control: Point, to: Point) -> PathSegment {
    let c1 = Point::new(
        from.x + 2.0 / 3.0 * (control.x - from.x),
        from.y + 2.0 / 3.0 * (control.y - from.y),
    );
    let c2 = Point::new(
        to.x + 2.0 / 3.0 * (control.x - to.x),
        to.y + 2.0 / 3.0 * (control.y - to.y),
    );
    PathSegment::CurveTo(c1, c2, to)
}

// Endpoint to center parameterization, then one cubic per quarter turn.
fn arc_to_cubics(from: Point, arc: Arc) -> Vec<PathSegment> {
    let Arc {
        rx,
        ry,
        rotation,
        large_arc,
        sweep,
        end: to,
    } = arc;
    let (mut rx, mut ry) = (rx.abs(), ry.abs());
    if rx == 0.0 || ry == 0.0 || (from.x == to.x && from.y == to.y) {
        return vec![PathSegment::LineTo(to)];
    }

    let phi = rotation.to_radians();
    let (sin_phi, cos_phi) = phi.sin_cos();
    let dx = (from.x - to.x) / 2.0;
    let dy = (from.y - to.y) / 2.0;
    let x1 = cos_phi * dx + sin_phi * dy;
    let y1 = -sin_phi * dx + cos_phi * dy;

    let lambda = (x1 * x1) / (rx * rx) + (y1 * y1) / (ry * ry);
    if lambda > 1.0 {
        let s = lambda.sqrt();
        rx *= s;
        ry *= s;
    }

    let num = rx * rx * ry * ry - rx * rx * y1 * y1 - ry * ry * x1 * x1;
    let den = rx * rx * y1 * y1 + ry * ry * x1 * x1;
    let mut coef = (num / den).max(0.0).sqrt();
    if large_arc == sweep {
        coef = -coef;
    }
    let cx1 = coef * rx * y1 / ry;
    let cy1 = -coef * ry * x1 / rx;
    let cx = cos_phi * cx1 - sin_phi * cy1 + (from.x + to.x) / 2.0;
    let cy = sin_phi * cx1 + cos_phi * cy1 + (from.y + to.y) / 2.0;

    let angle = |ux: f32, uy: f32, vx: f32, vy: f32| {
        let sign = if ux * vy - uy * vx < 0.0 { -1.0 } else { 1.0 };
        let dot = (ux * vx + uy * vy) / ((ux * ux + uy * uy).sqrt() * (vx * vx + vy * vy).sqrt());
        sign * dot.clamp(-1.0, 1.0).acos()
    };
    let theta1 = angle(1.0, 0.0, (x1 - cx1) / rx, (y1 - cy1) / ry);
    let mut delta = angle((x1 - cx1) / rx, (y1 - cy1) / ry, (-x1 - cx1) / rx, (-y1 - cy1) / ry);
    if !sweep && delta > 0.0 {
        delta -= 2.0 * PI;
    } else if sweep && delta < 0.0 {
        delta += 2.0 * PI;
    }

    let pieces = (delta.abs() / (PI / 2.0)).ceil().max(1.0) as usize;
    let step = delta / pieces as f32;
    let k = 4.0 / 3.0 * (step / 4.0).tan();
    let map = |x: f32, y: f32| {
        Point::new(
            cx + rx * cos_phi * x - ry * sin_phi * y,
            cy + rx * sin_phi * x + ry * cos_phi * y,
        )
    };

    let mut out = Vec::with_capacity(pieces);
    let mut theta = theta1;
    for i in 0..pieces {
        let next = theta + step;
        let (s1, c1) = theta.sin_cos();
        let (s2, c2) = next.sin_cos();
        let end = if i + 1 == pieces { to } else { map(c2, s2) };
        out.push(PathSegment::CurveTo(
            map(c1 - k * s1, s1 + k * c1),
            map(c2 + k * s2, s2 - k * c2),
            end,
        ));
        theta = next;
    }
    out
}

/// Scales `segments` from `view_box` into `rect`, preserving aspect ratio and
/// centering.
pub fn fit_to_rect(segments: &[PathSegment], view_box: [f32; 4], rect: Rect) -> Vec<PathSegment> {
    let [vx, vy, vw, vh] = view_box;
    let scale = (rect.width / vw).min(rect.height / vh);
    let ox = rect.x + (rect.width - vw * scale) / 2.0;
    let oy = rect.y + (rect.height - vh * scale) / 2.0;
    let map = |p: Point| Point::new(ox + (p.x - vx) * scale, oy + (p.y - vy) * scale);

    segments
        .iter()
        .map(|segment| match *segment {
            PathSegment::MoveTo(p) => PathSegment::MoveTo(map(p)),
            PathSegment::LineTo(p) => PathSegment::LineTo(map(p)),
            PathSegment::CurveTo(c1, c2, p) => PathSegment::CurveTo(map(c1), map(c2), map(p)),
            PathSegment::Close => PathSegment::Close,
        })
        .collect()
}

// Simple XML helpers (not a full parser)

fn extract_tag(content: &str, tag_name: &str) -> Option<String> {
    let open = format!("<{}", tag_name);
    let start = content.find(&open)?;
    let rest = &content[start..];
    let end = rest.find('>')?;
    Some(rest[..=end].to_string())
}

fn extract_all_tags(content: &str, tag_name: &str) -> Vec<String> {
    let mut tags = Vec::new();
    let open = format!("<{}", tag_name);
    let mut search_start = 0;

    while let Some(start) = content[search_start..].find(&open) {
        let abs_start = search_start + start;
        let rest = &content[abs_start..];
        let Some(close_bracket) = rest.find('>') else {
            break;
        };
        tags.push(rest[..=close_bracket].to_string());
        search_start = abs_start + close_bracket + 1;
    }

    tags
}

fn extract_attr(tag: &str, attr_name: &str) -> Option<String> {
    for quote in ['"', '\''] {
        let pattern = format!(" {}={}", attr_name, quote);
        if let Some(start) = tag.find(&pattern) {
            let rest = &tag[start + pattern.len()..];
            if let Some(end) = rest.find(quote) {
                return Some(rest[..end].to_string());
            }
        }
    }
    None
}
