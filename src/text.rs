//! Text layout: interactive autofit and static print layout.
//!
//! Boxes come in page millimetres, font sizes are points. Measurement goes
//! through [`TextMeasure`] so that layout is independent of the font tables.

use regex::Regex;
use std::sync::OnceLock;

use crate::config::PT_TO_MM;
use crate::font_metrics::{FontFace, FontMetrics};
use crate::format::NumberLocale;
use crate::ops::{Color, Rect, TextRun};
use crate::template::TextAlign;

/// Approximate ascent as a fraction of the font size.
pub const ASCENT_RATIO: f32 = 0.8;

pub trait TextMeasure {
    /// Advance width of `text` in points at `size_pt`.
    fn width_pt(&self, text: &str, size_pt: f32) -> f32;
}

impl TextMeasure for FontMetrics {
    fn width_pt(&self, text: &str, size_pt: f32) -> f32 {
        self.string_width(text, size_pt)
    }
}

// ============================================================================
// NUMERIC LABELS
// ============================================================================

fn numeric_label_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(
            r"^(?:(?:R\$|US\$|\$|€|£)\s?)?-?\d[\d.,\s]*[⁰¹²³⁴⁵⁶⁷⁸⁹]*%?(?:\s?(?:R\$|€))?$",
        )
        .expect("numeric label pattern is valid")
    })
}

/// Prices, percentages and counts: an optional currency symbol, digits and
/// separators, optional superscript decimals, no letters. The locale's own
/// symbol is accepted on either side.
pub fn is_numeric_label(text: &str, locale: &NumberLocale) -> bool {
    let text = text.trim();
    let symbol = locale.currency_symbol.as_str();
    let amount = if symbol.is_empty() {
        text
    } else {
        text.strip_prefix(symbol)
            .or_else(|| text.strip_suffix(symbol))
            .map(str::trim)
            .unwrap_or(text)
    };
    numeric_label_pattern().is_match(amount)
}

// ============================================================================
// WRAPPING
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    pub text: String,
    /// Last line of its paragraph; never justified.
    pub ends_paragraph: bool,
}

/// Greedy word wrap. `\n` always breaks; a single word wider than the box
/// gets a line of its own.
pub fn wrap_lines(text: &str, measure: &dyn TextMeasure, size_pt: f32, max_width_pt: f32) -> Vec<Line> {
    let mut lines = Vec::new();

    for paragraph in text.split('\n') {
        let mut current = String::new();
        for word in paragraph.split_whitespace() {
            let tentative = if current.is_empty() {
                word.to_string()
            } else {
                format!("{} {}", current, word)
            };

            if measure.width_pt(&tentative, size_pt) > max_width_pt && !current.is_empty() {
                lines.push(Line {
                    text: current,
                    ends_paragraph: false,
                });
                current = word.to_string();
            } else {
                current = tentative;
            }
        }
        lines.push(Line {
            text: current,
            ends_paragraph: true,
        });
    }

    lines
}

fn fits(
    text: &str,
    measure: &dyn TextMeasure,
    size_pt: f32,
    width_pt: f32,
    height_pt: f32,
    line_height: f32,
) -> bool {
    let lines = wrap_lines(text, measure, size_pt, width_pt);
    let widest = lines
        .iter()
        .map(|line| measure.width_pt(&line.text, size_pt))
        .fold(0.0, f32::max);
    widest <= width_pt && lines.len() as f32 * size_pt * line_height <= height_pt
}

// ============================================================================
// AUTOFIT
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Autofit {
    pub size_pt: f32,
    /// Binary-search steps taken; zero when the initial size already fits.
    pub iterations: u32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AutofitLimits {
    pub min_size: f32,
    pub max_iterations: u32,
    pub line_height: f32,
}

/// Largest integer size in `[min, max(initial, min)]` at which the wrapped
/// text fits the box. Text that fits at `initial` keeps it; text is never
/// grown. Falls back to `min` when nothing fits.
pub fn autofit_font_size(
    text: &str,
    measure: &dyn TextMeasure,
    width_pt: f32,
    height_pt: f32,
    initial: f32,
    limits: AutofitLimits,
) -> Autofit {
    let min = limits.min_size;
    if initial >= min && fits(text, measure, initial, width_pt, height_pt, limits.line_height) {
        return Autofit {
            size_pt: initial,
            iterations: 0,
        };
    }

    let mut low = min.ceil() as i64;
    let mut high = initial.max(min).floor() as i64;
    let mut best = min;
    let mut iterations = 0;

    while low <= high && iterations < limits.max_iterations {
        iterations += 1;
        let mid = (low + high).div_euclid(2);
        if fits(text, measure, mid as f32, width_pt, height_pt, limits.line_height) {
            best = mid as f32;
            low = mid + 1;
        } else {
            high = mid - 1;
        }
    }

    log::debug!(
        "autofit '{}': {} -> {} pt in {} iterations",
        text,
        initial,
        best,
        iterations
    );
    Autofit {
        size_pt: best,
        iterations,
    }
}

// ============================================================================
// PLACEMENT
// ============================================================================

/// A block of text to place inside a box.
#[derive(Debug, Clone, Copy)]
pub struct TextBox<'a> {
    pub text: &'a str,
    /// Content box in page millimetres, padding already removed.
    pub rect: Rect,
    pub font: FontFace,
    pub size_pt: f32,
    pub line_height: f32,
    pub align: TextAlign,
    pub color: Color,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextBlock {
    pub size_pt: f32,
    pub runs: Vec<TextRun>,
}

fn mm(pt: f32) -> f32 {
    pt * PT_TO_MM
}

fn pt(mm: f32) -> f32 {
    mm / PT_TO_MM
}

/// Baseline of line `index` from the top of the box, in points.
fn baseline_pt(index: usize, size_pt: f32, line_height: f32) -> f32 {
    let leading = size_pt * line_height - size_pt;
    ASCENT_RATIO * size_pt + leading / 2.0 + index as f32 * size_pt * line_height
}

/// Static policy. Numeric labels stay on one line and shrink by
/// `box / measured · calibration`; other text wraps and is truncated at the
/// box bottom.
pub fn layout_static(block: &TextBox, locale: &NumberLocale, calibration: f32, min_size: f32) -> TextBlock {
    let metrics = block.font.metrics();
    let width_pt = pt(block.rect.width);

    if is_numeric_label(block.text, locale) {
        let label = block.text.trim();
        let measured = metrics.width_pt(label, block.size_pt);
        let size_pt = if measured > width_pt && measured > 0.0 {
            (block.size_pt * (width_pt / measured) * calibration).max(min_size)
        } else {
            block.size_pt
        };
        let line = Line {
            text: label.to_string(),
            ends_paragraph: true,
        };
        return place_lines(block, metrics, size_pt, &[line]);
    }

    let lines = wrap_lines(block.text, metrics, block.size_pt, width_pt);
    place_lines(block, metrics, block.size_pt, &lines)
}

/// Preview policy: autofit, then wrap at the fitted size.
pub fn layout_autofit(block: &TextBox, min_size: f32, max_iterations: u32) -> TextBlock {
    let metrics = block.font.metrics();
    let fit = autofit_font_size(
        block.text,
        metrics,
        pt(block.rect.width),
        pt(block.rect.height),
        block.size_pt,
        AutofitLimits {
            min_size,
            max_iterations,
            line_height: block.line_height,
        },
    );
    let lines = wrap_lines(block.text, metrics, fit.size_pt, pt(block.rect.width));
    place_lines(block, metrics, fit.size_pt, &lines)
}

fn place_lines(block: &TextBox, metrics: &FontMetrics, size_pt: f32, lines: &[Line]) -> TextBlock {
    let rect = block.rect;
    let height_pt = pt(rect.height);
    let mut runs = Vec::new();

    for (i, line) in lines.iter().enumerate() {
        let offset = baseline_pt(i, size_pt, block.line_height);
        if offset > height_pt {
            break;
        }
        if line.text.is_empty() {
            continue;
        }
        let baseline = rect.y + mm(offset);
        let run = |x: f32, text: &str| TextRun {
            x,
            baseline,
            text: text.to_string(),
            font: block.font,
            size_pt,
            color: block.color,
        };

        let line_width = mm(metrics.width_pt(&line.text, size_pt));
        let words: Vec<&str> = line.text.split_whitespace().collect();
        match block.align {
            TextAlign::Justify if !line.ends_paragraph && words.len() > 1 => {
                let word_widths: Vec<f32> = words
                    .iter()
                    .map(|w| mm(metrics.width_pt(w, size_pt)))
                    .collect();
                let gap = (rect.width - word_widths.iter().sum::<f32>()) / (words.len() - 1) as f32;
                let mut cursor = rect.x;
                for (word, width) in words.iter().zip(&word_widths) {
                    runs.push(run(cursor, word));
                    cursor += width + gap;
                }
            }
            TextAlign::Center => runs.push(run(rect.x + (rect.width - line_width) / 2.0, &line.text)),
            TextAlign::Right => runs.push(run(rect.right() - line_width, &line.text)),
            _ => runs.push(run(rect.x, &line.text)),
        }
    }

    TextBlock { size_pt, runs }
}
