//! Style resolution: authored component style (CSS-like, canvas pixels) to
//! renderer primitives (built-in font face, points, millimetres, RGB).

use crate::config::{EngineConfig, PT_TO_MM};
use crate::font_metrics::{FontFace, FontFamily, FontVariant};
use crate::geometry::PageTransform;
use crate::ops::{Color, Rect};
use crate::template::{ComponentStyle, TextAlign};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedBorder {
    pub width: f32,
    pub color: Color,
    pub radius: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedStyle {
    pub font: FontFace,
    /// Effective size after page scaling and the box-height clamp.
    pub font_size_pt: f32,
    pub line_height: f32,
    pub color: Color,
    pub text_align: TextAlign,
    pub auto_fit: bool,
    pub background: Option<Color>,
    pub border: Option<ResolvedBorder>,
    /// Corner radius in mm, also used when there is no visible border.
    pub radius: f32,
    pub padding: f32,
    pub opacity: f32,
}

// ============================================================================
// FONT FAMILY FALLBACK
// ============================================================================

// Authored families mapped onto the three families the backend can draw.
// Anything not listed falls back to sans-serif.
const FAMILY_FALLBACKS: &[(&str, FontFamily)] = &[
    ("helvetica", FontFamily::Helvetica),
    ("arial", FontFamily::Helvetica),
    ("inter", FontFamily::Helvetica),
    ("roboto", FontFamily::Helvetica),
    ("open sans", FontFamily::Helvetica),
    ("montserrat", FontFamily::Helvetica),
    ("poppins", FontFamily::Helvetica),
    ("sans-serif", FontFamily::Helvetica),
    ("times", FontFamily::Times),
    ("times new roman", FontFamily::Times),
    ("georgia", FontFamily::Times),
    ("garamond", FontFamily::Times),
    ("playfair display", FontFamily::Times),
    ("merriweather", FontFamily::Times),
    ("serif", FontFamily::Times),
    ("courier", FontFamily::Courier),
    ("courier new", FontFamily::Courier),
    ("consolas", FontFamily::Courier),
    ("roboto mono", FontFamily::Courier),
    ("monospace", FontFamily::Courier),
];

/// Picks the first family in a CSS font-family list that has a mapping.
pub fn map_font_family(name: Option<&str>) -> FontFamily {
    let Some(list) = name else {
        return FontFamily::Helvetica;
    };
    list.split(',')
        .map(|candidate| {
            candidate
                .trim()
                .trim_matches(|c| c == '"' || c == '\'')
                .to_ascii_lowercase()
        })
        .find_map(|candidate| {
            FAMILY_FALLBACKS
                .iter()
                .find(|(known, _)| *known == candidate)
                .map(|(_, family)| *family)
        })
        .unwrap_or(FontFamily::Helvetica)
}

pub fn resolve_variant(style: &ComponentStyle) -> FontVariant {
    let typography = &style.typography;
    let bold = typography
        .font_weight
        .as_ref()
        .map(|w| w.is_bold())
        .unwrap_or(false);
    let italic = typography
        .font_style
        .as_deref()
        .map(|s| matches!(s.trim().to_ascii_lowercase().as_str(), "italic" | "oblique"))
        .unwrap_or(false);
    FontVariant::from_flags(bold, italic)
}

// ============================================================================
// SIZES
// ============================================================================

/// `max(min, px · scale · pxToPt)`, then clamped so a single line fits the
/// box height. Never below `min`.
pub fn effective_font_size(
    size_px: f32,
    page_scale: f32,
    px_to_pt: f32,
    min_size: f32,
    line_height: f32,
    box_height_mm: f32,
) -> f32 {
    let scaled = (size_px * page_scale * px_to_pt).max(min_size);
    let box_height_pt = box_height_mm / PT_TO_MM;
    let fits_box = box_height_pt / line_height;
    scaled.min(fits_box).max(min_size)
}

pub fn resolve_style(
    style: &ComponentStyle,
    rect: Rect,
    transform: &PageTransform,
    config: &EngineConfig,
) -> ResolvedStyle {
    let typography = &style.typography;
    let opacity = style.opacity();
    let line_height = typography
        .line_height
        .filter(|lh| lh.is_finite() && *lh > 0.0)
        .unwrap_or(config.line_height);
    let size_px = typography
        .font_size
        .filter(|s| s.is_finite() && *s > 0.0)
        .unwrap_or(config.default_font_size_px);

    let font_size_pt = effective_font_size(
        size_px,
        transform.scale,
        config.px_to_pt,
        config.min_font_size,
        line_height,
        rect.height,
    );

    let color = style
        .color
        .as_deref()
        .and_then(parse_color)
        .unwrap_or_else(Color::black)
        .with_opacity(opacity);

    let background = style
        .background_color
        .as_deref()
        .and_then(parse_color)
        .map(|c| c.with_opacity(opacity))
        .filter(|c| !c.is_transparent());

    let radius = style
        .border
        .as_ref()
        .and_then(|b| b.radius)
        .map(|r| transform.length(r.max(0.0)))
        .unwrap_or(0.0);

    let border = style.border.as_ref().and_then(|b| {
        let width = b.width.filter(|w| *w > 0.0)?;
        let color = b
            .color
            .as_deref()
            .and_then(parse_color)
            .unwrap_or_else(Color::black)
            .with_opacity(opacity);
        Some(ResolvedBorder {
            width: transform.length(width),
            color,
            radius,
        })
    });

    ResolvedStyle {
        font: FontFace::new(
            map_font_family(typography.font_family.as_deref()),
            resolve_variant(style),
        ),
        font_size_pt,
        line_height,
        color,
        text_align: typography.text_align.unwrap_or(TextAlign::Left),
        auto_fit: typography.auto_fit.unwrap_or(true),
        background,
        border,
        radius,
        padding: style
            .spacing
            .padding
            .map(|p| transform.length(p.max(0.0)))
            .unwrap_or(0.0),
        opacity,
    }
}

// ============================================================================
// COLORS
// ============================================================================

/// Parses `#rgb`, `#rrggbb`, `#rrggbbaa`, `rgb()`, `rgba()` and a few names.
pub fn parse_color(color_str: &str) -> Option<Color> {
    let color_str = color_str.trim();

    if let Some(hex) = color_str.strip_prefix('#') {
        if !hex.is_ascii() {
            return None;
        }
        let channel = |s: &str| u8::from_str_radix(s, 16).ok();
        return match hex.len() {
            3 => Some(Color::rgb(
                channel(&hex[0..1].repeat(2))?,
                channel(&hex[1..2].repeat(2))?,
                channel(&hex[2..3].repeat(2))?,
            )),
            6 => Some(Color::rgb(
                channel(&hex[0..2])?,
                channel(&hex[2..4])?,
                channel(&hex[4..6])?,
            )),
            8 => Some(Color {
                a: channel(&hex[6..8])? as f32 / 255.0,
                ..Color::rgb(channel(&hex[0..2])?, channel(&hex[2..4])?, channel(&hex[4..6])?)
            }),
            _ => None,
        };
    }

    let lower = color_str.to_ascii_lowercase();
    if let Some(inner) = lower
        .strip_prefix("rgba(")
        .or_else(|| lower.strip_prefix("rgb("))
        .and_then(|rest| rest.strip_suffix(')'))
    {
        let parts: Vec<&str> = inner.split(',').map(|s| s.trim()).collect();
        let channel = |s: &str| s.parse::<f32>().ok().map(|v| v.clamp(0.0, 255.0).round() as u8);
        return match parts.as_slice() {
            [r, g, b] => Some(Color::rgb(channel(r)?, channel(g)?, channel(b)?)),
            [r, g, b, a] => Some(Color {
                a: a.parse::<f32>().ok()?.clamp(0.0, 1.0),
                ..Color::rgb(channel(r)?, channel(g)?, channel(b)?)
            }),
            _ => None,
        };
    }

    match lower.as_str() {
        "black" => Some(Color::rgb(0, 0, 0)),
        "white" => Some(Color::rgb(255, 255, 255)),
        "red" => Some(Color::rgb(255, 0, 0)),
        "green" => Some(Color::rgb(0, 128, 0)),
        "blue" => Some(Color::rgb(0, 0, 255)),
        "yellow" => Some(Color::rgb(255, 255, 0)),
        "orange" => Some(Color::rgb(255, 165, 0)),
        "gray" | "grey" => Some(Color::rgb(128, 128, 128)),
        "transparent" => Some(Color { a: 0.0, ..Color::black() }),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{PageSize, PX_TO_MM};
    use crate::template::{Border, CanvasSize, FontWeight, Typography};

    #[test]
    fn test_family_fallback() {
        assert_eq!(map_font_family(Some("Georgia, serif")), FontFamily::Times);
        assert_eq!(map_font_family(Some("'Courier New'")), FontFamily::Courier);
        assert_eq!(map_font_family(Some("Comic Neue, Papyrus")), FontFamily::Helvetica);
        assert_eq!(map_font_family(Some("Bebas, Arial")), FontFamily::Helvetica);
        assert_eq!(map_font_family(None), FontFamily::Helvetica);
    }

    #[test]
    fn test_variant_from_weight_and_style() {
        let style = ComponentStyle {
            typography: Typography {
                font_weight: Some(FontWeight::Numeric(800)),
                font_style: Some("oblique".into()),
                ..Default::default()
            },
            ..Default::default()
        };
        assert_eq!(resolve_variant(&style), FontVariant::BoldItalic);
        assert_eq!(resolve_variant(&ComponentStyle::default()), FontVariant::Normal);
    }

    #[test]
    fn test_font_size_floor_and_box_clamp() {
        // 40px at scale 1 is 30pt, but a 10mm box only holds ~28.3pt / 1.2.
        let size = effective_font_size(40.0, 1.0, 0.75, 6.0, 1.2, 10.0);
        assert!((size - 10.0 / PT_TO_MM / 1.2).abs() < 1e-3);
        // Tiny text is lifted to the minimum.
        assert_eq!(effective_font_size(2.0, 0.5, 0.75, 6.0, 1.2, 100.0), 6.0);
        // A box too small for the minimum still yields the minimum.
        assert_eq!(effective_font_size(40.0, 1.0, 0.75, 6.0, 1.2, 1.0), 6.0);
    }

    #[test]
    fn test_parse_colors() {
        assert_eq!(parse_color("#f00"), Some(Color::rgb(255, 0, 0)));
        assert_eq!(parse_color("#1a2B3c"), Some(Color::rgb(0x1a, 0x2b, 0x3c)));
        assert_eq!(parse_color("rgb(10, 20, 30)"), Some(Color::rgb(10, 20, 30)));
        assert_eq!(parse_color("rgba(0,0,0,0.5)").map(|c| c.a), Some(0.5));
        assert_eq!(parse_color("#12345"), None);
        assert_eq!(parse_color("chartreuse-ish"), None);
    }

    #[test]
    fn test_border_and_radius_scale_with_page() {
        let canvas = CanvasSize { width: 800.0, height: 600.0 };
        let transform = PageTransform::fit(canvas, PageSize::a4_landscape(), PX_TO_MM).unwrap();
        let style = ComponentStyle {
            border: Some(Border {
                width: Some(2.0),
                color: Some("#000".into()),
                radius: Some(8.0),
            }),
            ..Default::default()
        };
        let rect = transform.rect(0.0, 0.0, 100.0, 100.0);
        let resolved = resolve_style(&style, rect, &transform, &EngineConfig::default());
        let border = resolved.border.unwrap();
        assert!((border.width - transform.length(2.0)).abs() < 1e-6);
        assert!((border.radius - transform.length(8.0)).abs() < 1e-6);
        assert_eq!(resolved.font.family, FontFamily::Helvetica);
    }
}
