use printpdf::path::{PaintMode, WindingOrder};
use printpdf::*;
use std::io::{BufWriter, Cursor};

use crate::config::PT_TO_MM;
use crate::font_metrics::{FontFace, FontFamily, FontVariant};
use crate::format::{from_superscript, is_superscript_digit};
use crate::ops::{self, Color, DrawOp, ImageBlit, PathOp, PathSegment, Rotation, TextRun};
use crate::error::PdfError;

// ============================================================================
// CONSTANTS
// ============================================================================

// Superscript digits are drawn as regular digits, reduced and raised.
const SUPERSCRIPT_SCALE: f32 = 0.6;
const SUPERSCRIPT_RISE: f32 = 0.4;

// Segments per cubic when flattening curves.
const CURVE_STEPS: usize = 12;

// ============================================================================
// PUBLIC API
// ============================================================================

/// Writes a rendered document as PDF bytes, one PDF page per document page.
pub fn write_pdf(document: &ops::Document, title: &str) -> Result<Vec<u8>, PdfError> {
    let first = document.pages.first().ok_or(PdfError::EmptyDocument)?;

    let (doc, page1, layer1) = PdfDocument::new(
        title,
        Mm(first.width_mm),
        Mm(first.height_mm),
        "Layer 1",
    );
    let fonts = Fonts::load(&doc)?;

    for (i, page) in document.pages.iter().enumerate() {
        let layer = if i == 0 {
            doc.get_page(page1).get_layer(layer1)
        } else {
            let (new_page, new_layer) = doc.add_page(Mm(page.width_mm), Mm(page.height_mm), "Layer 1");
            doc.get_page(new_page).get_layer(new_layer)
        };

        let canvas = Canvas {
            layer: &layer,
            fonts: &fonts,
            page_height: page.height_mm,
        };
        canvas.draw_all(&page.ops);
        log::debug!("wrote page {} ({} ops)", i + 1, page.ops.len());
    }

    let mut buf = Vec::new();
    {
        let cursor = Cursor::new(&mut buf);
        let mut writer = BufWriter::new(cursor);
        doc.save(&mut writer)?;
    }
    Ok(buf)
}

// ============================================================================
// FONTS
// ============================================================================

struct Fonts {
    helvetica: [IndirectFontRef; 4],
    times: [IndirectFontRef; 4],
    courier: [IndirectFontRef; 4],
}

impl Fonts {
    fn load(doc: &PdfDocumentReference) -> Result<Self, PdfError> {
        let add = |fonts: [BuiltinFont; 4]| -> Result<[IndirectFontRef; 4], PdfError> {
            let [regular, bold, italic, bold_italic] = fonts;
            Ok([
                doc.add_builtin_font(regular)?,
                doc.add_builtin_font(bold)?,
                doc.add_builtin_font(italic)?,
                doc.add_builtin_font(bold_italic)?,
            ])
        };
        Ok(Fonts {
            helvetica: add([
                BuiltinFont::Helvetica,
                BuiltinFont::HelveticaBold,
                BuiltinFont::HelveticaOblique,
                BuiltinFont::HelveticaBoldOblique,
            ])?,
            times: add([
                BuiltinFont::TimesRoman,
                BuiltinFont::TimesBold,
                BuiltinFont::TimesItalic,
                BuiltinFont::TimesBoldItalic,
            ])?,
            courier: add([
                BuiltinFont::Courier,
                BuiltinFont::CourierBold,
                BuiltinFont::CourierOblique,
                BuiltinFont::CourierBoldOblique,
            ])?,
        })
    }

    fn get(&self, face: FontFace) -> &IndirectFontRef {
        let family = match face.family {
            FontFamily::Helvetica => &self.helvetica,
            FontFamily::Times => &self.times,
            FontFamily::Courier => &self.courier,
        };
        match face.variant {
            FontVariant::Normal => &family[0],
            FontVariant::Bold => &family[1],
            FontVariant::Italic => &family[2],
            FontVariant::BoldItalic => &family[3],
        }
    }
}

// ============================================================================
// DRAWING
// ============================================================================

struct Canvas<'a> {
    layer: &'a PdfLayerReference,
    fonts: &'a Fonts,
    page_height: f32,
}

impl Canvas<'_> {
    // Page space is top-left origin, y down; PDF is bottom-left, y up.
    fn point(&self, p: ops::Point) -> Point {
        Point::new(Mm(p.x), Mm(self.page_height - p.y))
    }

    fn draw_all(&self, ops: &[DrawOp]) {
        for op in ops {
            match op {
                DrawOp::Text(run) => self.draw_text(run),
                DrawOp::Path(path) => self.draw_path(path),
                DrawOp::Image(blit) => self.draw_image(blit),
                DrawOp::Component { id, rotation, ops } => {
                    log::trace!("component {}", id);
                    match rotation {
                        Some(rotation) => {
                            self.layer.save_graphics_state();
                            self.layer.set_ctm(rotation_matrix(*rotation, self.page_height));
                            self.draw_all(ops);
                            self.layer.restore_graphics_state();
                        }
                        None => self.draw_all(ops),
                    }
                }
            }
        }
    }

    fn draw_path(&self, path: &PathOp) {
        let subpaths = flatten(&path.segments);
        if subpaths.is_empty() {
            return;
        }

        if let Some(fill) = path.fill.filter(|c| !c.is_transparent()) {
            set_fill_color(self.layer, &fill);
            let rings = subpaths
                .iter()
                .filter(|s| s.points.len() > 2)
                .map(|s| self.ring(&s.points))
                .collect::<Vec<_>>();
            if !rings.is_empty() {
                self.layer.add_polygon(Polygon {
                    rings,
                    mode: PaintMode::Fill,
                    winding_order: WindingOrder::NonZero,
                });
            }
        }

        if let Some(stroke) = path.stroke.filter(|s| s.width > 0.0 && !s.color.is_transparent()) {
            set_stroke_color(self.layer, &stroke.color);
            self.layer.set_outline_thickness(stroke.width / PT_TO_MM);
            for subpath in subpaths.iter().filter(|s| s.points.len() > 1) {
                self.layer.add_line(Line {
                    points: self.ring(&subpath.points),
                    is_closed: subpath.closed,
                });
            }
        }
    }

    fn ring(&self, points: &[ops::Point]) -> Vec<(Point, bool)> {
        points.iter().map(|p| (self.point(*p), false)).collect()
    }

    fn draw_text(&self, run: &TextRun) {
        if run.text.is_empty() || run.color.is_transparent() {
            return;
        }
        let font = self.fonts.get(run.font);
        let metrics = run.font.metrics();
        set_fill_color(self.layer, &run.color);

        let baseline = self.page_height - run.baseline;
        let mut x = run.x;
        for (text, raised) in split_superscript(&run.text) {
            let width_mm = metrics.string_width(&text, run.size_pt) * PT_TO_MM;
            if raised {
                let digits: String = text.chars().filter_map(from_superscript).collect();
                let rise = run.size_pt * SUPERSCRIPT_RISE * PT_TO_MM;
                self.layer.use_text(
                    digits,
                    run.size_pt * SUPERSCRIPT_SCALE,
                    Mm(x),
                    Mm(baseline + rise),
                    font,
                );
            } else {
                self.layer.use_text(text, run.size_pt, Mm(x), Mm(baseline), font);
            }
            x += width_mm;
        }
    }

    fn draw_image(&self, blit: &ImageBlit) {
        let image = &blit.image;
        if image.width == 0 || image.height == 0 {
            return;
        }

        let xobject = Image::from(ImageXObject {
            width: Px(image.width as usize),
            height: Px(image.height as usize),
            color_space: ColorSpace::Rgb,
            bits_per_component: ColorBits::Bit8,
            interpolate: true,
            image_data: image.pixels.clone(),
            image_filter: None,
            clipping_bbox: None,
            smask: None,
        });

        // At 72 dpi one pixel is one point; scale from there to the destination.
        let dpi = 72.0;
        let dest = blit.dest;
        let scale_x = dest.width / (image.width as f32 * PT_TO_MM);
        let scale_y = dest.height / (image.height as f32 * PT_TO_MM);

        self.layer.save_graphics_state();
        let clip = rect_points(blit.clip);
        self.layer.add_polygon(Polygon {
            rings: vec![self.ring(&clip)],
            mode: PaintMode::Clip,
            winding_order: WindingOrder::NonZero,
        });
        xobject.add_to_layer(
            self.layer.clone(),
            ImageTransform {
                translate_x: Some(Mm(dest.x)),
                translate_y: Some(Mm(self.page_height - dest.bottom())),
                scale_x: Some(scale_x),
                scale_y: Some(scale_y),
                dpi: Some(dpi),
                ..Default::default()
            },
        );
        self.layer.restore_graphics_state();
    }
}

/// Clockwise page rotation around a point, as a PDF transformation matrix in
/// points.
fn rotation_matrix(rotation: Rotation, page_height: f32) -> CurTransMat {
    // Clockwise on a y-down page is a negative angle once y points up.
    let theta = (-rotation.degrees).to_radians();
    let (sin, cos) = theta.sin_cos();
    let cx = rotation.center.x / PT_TO_MM;
    let cy = (page_height - rotation.center.y) / PT_TO_MM;
    CurTransMat::Raw([
        cos,
        sin,
        -sin,
        cos,
        cx - cos * cx + sin * cy,
        cy - sin * cx - cos * cy,
    ])
}

// ============================================================================
// GEOMETRY HELPERS
// ============================================================================

struct Subpath {
    points: Vec<ops::Point>,
    closed: bool,
}

/// Splits path segments into polylines, approximating cubics with line
/// segments.
fn flatten(segments: &[PathSegment]) -> Vec<Subpath> {
    let mut out: Vec<Subpath> = Vec::new();
    let mut current: Option<Subpath> = None;
    let mut cursor = ops::Point::default();

    for segment in segments {
        match *segment {
            PathSegment::MoveTo(p) => {
                out.extend(current.take());
                current = Some(Subpath {
                    points: vec![p],
                    closed: false,
                });
                cursor = p;
            }
            PathSegment::LineTo(p) => {
                current
                    .get_or_insert_with(|| Subpath {
                        points: vec![cursor],
                        closed: false,
                    })
                    .points
                    .push(p);
                cursor = p;
            }
            PathSegment::CurveTo(c1, c2, end) => {
                let start = cursor;
                let sub = current.get_or_insert_with(|| Subpath {
                    points: vec![start],
                    closed: false,
                });
                for i in 1..=CURVE_STEPS {
                    let t = i as f32 / CURVE_STEPS as f32;
                    let mt = 1.0 - t;
                    let a = mt * mt * mt;
                    let b = 3.0 * mt * mt * t;
                    let c = 3.0 * mt * t * t;
                    let d = t * t * t;
                    sub.points.push(ops::Point::new(
                        a * start.x + b * c1.x + c * c2.x + d * end.x,
                        a * start.y + b * c1.y + c * c2.y + d * end.y,
                    ));
                }
                cursor = end;
            }
            PathSegment::Close => {
                if let Some(mut sub) = current.take() {
                    sub.closed = true;
                    if let Some(first) = sub.points.first().copied() {
                        cursor = first;
                    }
                    out.push(sub);
                }
            }
        }
    }
    out.extend(current);
    out
}

fn rect_points(rect: ops::Rect) -> Vec<ops::Point> {
    vec![
        ops::Point::new(rect.x, rect.y),
        ops::Point::new(rect.right(), rect.y),
        ops::Point::new(rect.right(), rect.bottom()),
        ops::Point::new(rect.x, rect.bottom()),
    ]
}

/// Splits text into alternating plain and superscript-digit pieces.
fn split_superscript(text: &str) -> Vec<(String, bool)> {
    let mut pieces: Vec<(String, bool)> = Vec::new();
    for c in text.chars() {
        let raised = is_superscript_digit(c);
        match pieces.last_mut() {
            Some((piece, kind)) if *kind == raised => piece.push(c),
            _ => pieces.push((c.to_string(), raised)),
        }
    }
    pieces
}

// ============================================================================
// COLOR HELPERS
// ============================================================================

// Builtin PDF paint has no alpha here; translucent colors are composited over
// white paper.
fn rgb(color: &Color) -> printpdf::Color {
    let a = color.a.clamp(0.0, 1.0);
    let channel = |v: u8| (v as f32 / 255.0) * a + (1.0 - a);
    printpdf::Color::Rgb(Rgb::new(channel(color.r), channel(color.g), channel(color.b), None))
}

fn set_fill_color(layer: &PdfLayerReference, color: &Color) {
    layer.set_fill_color(rgb(color));
}

fn set_stroke_color(layer: &PdfLayerReference, color: &Color) {
    layer.set_outline_color(rgb(color));
}
