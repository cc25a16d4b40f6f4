//! Font metrics for text measurement.
//!
//! Width tables for the built-in PDF font families the output backend can
//! draw without embedding. Widths are in 1/1000 of the em square.

use std::collections::HashMap;
use std::sync::OnceLock;

// ============================================================================
// FACES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FontFamily {
    #[default]
    Helvetica,
    Times,
    Courier,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FontVariant {
    #[default]
    Normal,
    Bold,
    Italic,
    BoldItalic,
}

impl FontVariant {
    pub fn from_flags(bold: bool, italic: bool) -> Self {
        match (bold, italic) {
            (true, true) => FontVariant::BoldItalic,
            (true, false) => FontVariant::Bold,
            (false, true) => FontVariant::Italic,
            (false, false) => FontVariant::Normal,
        }
    }

    pub fn is_bold(self) -> bool {
        matches!(self, FontVariant::Bold | FontVariant::BoldItalic)
    }

    pub fn is_italic(self) -> bool {
        matches!(self, FontVariant::Italic | FontVariant::BoldItalic)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct FontFace {
    pub family: FontFamily,
    pub variant: FontVariant,
}

impl FontFace {
    pub fn new(family: FontFamily, variant: FontVariant) -> Self {
        FontFace { family, variant }
    }

    pub fn metrics(&self) -> &'static FontMetrics {
        get_metrics(*self)
    }
}

// ============================================================================
// METRICS
// ============================================================================

#[derive(Debug, Clone)]
pub struct FontMetrics {
    widths: HashMap<char, u16>,
    default_width: u16,
    pub units_per_em: u16,
    pub ascender: i16,
    pub descender: i16,
}

impl FontMetrics {
    pub fn char_width(&self, c: char) -> u16 {
        *self.widths.get(&c).unwrap_or(&self.default_width)
    }

    /// Width of a string in points at `font_size` points.
    pub fn string_width(&self, text: &str, font_size: f32) -> f32 {
        let total_units: u32 = text.chars().map(|c| self.char_width(c) as u32).sum();
        (total_units as f32 / self.units_per_em as f32) * font_size
    }

    pub fn char_width_pt(&self, c: char, font_size: f32) -> f32 {
        (self.char_width(c) as f32 / self.units_per_em as f32) * font_size
    }

    pub fn ascent_pt(&self, font_size: f32) -> f32 {
        self.ascender as f32 / self.units_per_em as f32 * font_size
    }
}

// Shared by every family: superscript digits are drawn at roughly 60% of a
// regular digit, so they measure narrower than their base glyph.
const SUPERSCRIPT_WIDTH: u16 = 333;
const SUPERSCRIPTS: [char; 10] = ['⁰', '¹', '²', '³', '⁴', '⁵', '⁶', '⁷', '⁸', '⁹'];

// Adobe Helvetica AFM, printable ASCII from ' ' (0x20) to '~' (0x7e).
const HELVETICA_ASCII: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' ' - '/'
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // '0' - '9'
    278, 278, 584, 584, 584, 556, 1015, // ':' - '@'
    667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, // 'A' - 'M'
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, // 'N' - 'Z'
    278, 278, 278, 469, 556, 333, // '[' - '`'
    556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, // 'a' - 'm'
    556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, // 'n' - 'z'
    334, 260, 334, 584, // '{' - '~'
];

const HELVETICA_BOLD_ASCII: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278, // ' ' - '/'
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // '0' - '9'
    333, 333, 584, 584, 584, 611, 975, // ':' - '@'
    722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, // 'A' - 'M'
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, // 'N' - 'Z'
    333, 278, 333, 584, 556, 333, // '[' - '`'
    556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, // 'a' - 'm'
    611, 611, 611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, // 'n' - 'z'
    389, 280, 389, 584, // '{' - '~'
];

const LATIN_EXTRAS: [(char, u16); 17] = [
    ('–', 556),
    ('—', 1000),
    ('\u{2018}', 222),
    ('\u{2019}', 222),
    ('\u{201C}', 333),
    ('\u{201D}', 333),
    ('…', 1000),
    ('€', 556),
    ('£', 556),
    ('¥', 556),
    ('©', 737),
    ('®', 737),
    ('™', 1000),
    ('°', 400),
    ('±', 584),
    ('×', 584),
    ('\u{a0}', 278),
];

// Times is narrower than Helvetica on average; scaling the Helvetica table is
// close enough for fitting decisions.
const TIMES_SCALE: f32 = 0.9;
const COURIER_WIDTH: u16 = 600;

fn build_widths(ascii: &[u16; 95], scale: f32) -> HashMap<char, u16> {
    let scaled = |w: u16| (w as f32 * scale).round() as u16;
    let mut m = HashMap::with_capacity(ascii.len() + LATIN_EXTRAS.len() + SUPERSCRIPTS.len());
    for (offset, width) in ascii.iter().enumerate() {
        if let Some(c) = char::from_u32(0x20 + offset as u32) {
            m.insert(c, scaled(*width));
        }
    }
    for (c, width) in LATIN_EXTRAS {
        m.insert(c, scaled(width));
    }
    for c in SUPERSCRIPTS {
        m.insert(c, scaled(SUPERSCRIPT_WIDTH));
    }
    m
}

fn proportional(ascii: &[u16; 95], scale: f32) -> FontMetrics {
    FontMetrics {
        widths: build_widths(ascii, scale),
        default_width: (556.0 * scale).round() as u16,
        units_per_em: 1000,
        ascender: 718,
        descender: -207,
    }
}

fn monospace() -> FontMetrics {
    let mut widths = HashMap::new();
    for c in SUPERSCRIPTS {
        widths.insert(c, SUPERSCRIPT_WIDTH);
    }
    FontMetrics {
        widths,
        default_width: COURIER_WIDTH,
        units_per_em: 1000,
        ascender: 629,
        descender: -157,
    }
}

// ============================================================================
// GLOBAL METRICS CACHE
// ============================================================================

static HELVETICA: OnceLock<FontMetrics> = OnceLock::new();
static HELVETICA_BOLD: OnceLock<FontMetrics> = OnceLock::new();
static TIMES: OnceLock<FontMetrics> = OnceLock::new();
static TIMES_BOLD: OnceLock<FontMetrics> = OnceLock::new();
static COURIER: OnceLock<FontMetrics> = OnceLock::new();

/// Metrics for a face. Oblique/italic variants share the upright widths.
pub fn get_metrics(face: FontFace) -> &'static FontMetrics {
    let bold = face.variant.is_bold();
    match (face.family, bold) {
        (FontFamily::Helvetica, false) => {
            HELVETICA.get_or_init(|| proportional(&HELVETICA_ASCII, 1.0))
        }
        (FontFamily::Helvetica, true) => {
            HELVETICA_BOLD.get_or_init(|| proportional(&HELVETICA_BOLD_ASCII, 1.0))
        }
        (FontFamily::Times, false) => {
            TIMES.get_or_init(|| proportional(&HELVETICA_ASCII, TIMES_SCALE))
        }
        (FontFamily::Times, true) => {
            TIMES_BOLD.get_or_init(|| proportional(&HELVETICA_BOLD_ASCII, TIMES_SCALE))
        }
        (FontFamily::Courier, _) => COURIER.get_or_init(monospace),
    }
}
