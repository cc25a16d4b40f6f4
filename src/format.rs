//! Locale-aware number formatting for price tags.
//!
//! Formatting works on an integer count of the smallest displayed unit so that
//! rounding happens once, half away from zero, and the digits are exact.

use serde::Deserialize;

use crate::template::FormatSpec;

const SUPERSCRIPT_DIGITS: [char; 10] = ['⁰', '¹', '²', '³', '⁴', '⁵', '⁶', '⁷', '⁸', '⁹'];

// Currency symbols stripped when reading a number back.
const KNOWN_CURRENCIES: [&str; 5] = ["R$", "US$", "$", "€", "£"];

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum CurrencyPosition {
    #[default]
    Prefix,
    Suffix,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct NumberLocale {
    pub decimal_separator: char,
    pub thousands_separator: char,
    pub currency_symbol: String,
    pub currency_position: CurrencyPosition,
    /// Put a space between the symbol and the amount.
    pub currency_spacing: bool,
}

impl Default for NumberLocale {
    fn default() -> Self {
        NumberLocale {
            decimal_separator: ',',
            thousands_separator: '.',
            currency_symbol: "R$".to_string(),
            currency_position: CurrencyPosition::Prefix,
            currency_spacing: true,
        }
    }
}

// ============================================================================
// SUPERSCRIPT DIGITS
// ============================================================================

pub fn to_superscript(digit: char) -> Option<char> {
    digit
        .to_digit(10)
        .map(|d| SUPERSCRIPT_DIGITS[d as usize])
}

pub fn from_superscript(c: char) -> Option<char> {
    SUPERSCRIPT_DIGITS
        .iter()
        .position(|s| *s == c)
        .and_then(|d| char::from_digit(d as u32, 10))
}

pub fn is_superscript_digit(c: char) -> bool {
    SUPERSCRIPT_DIGITS.contains(&c)
}

/// Maps every ASCII digit in `digits` to its superscript form.
pub fn superscript(digits: &str) -> String {
    digits.chars().map(|c| to_superscript(c).unwrap_or(c)).collect()
}

// ============================================================================
// FORMAT
// ============================================================================

fn group_thousands(integer: &str, separator: char) -> String {
    let len = integer.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, c) in integer.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(separator);
        }
        out.push(c);
    }
    out
}

/// Formats `value` per `spec`. Non-finite input formats as zero.
pub fn format_number(value: f64, spec: &FormatSpec, locale: &NumberLocale) -> String {
    let value = if value.is_finite() { value } else { 0.0 };
    let digits = spec.precision.digits();
    let factor = 10u128.pow(digits);

    let scaled = (value.abs() * factor as f64).round();
    // Values beyond u128 are not prices; saturate rather than wrap.
    let scaled = if scaled >= u128::MAX as f64 { u128::MAX } else { scaled as u128 };
    let negative = value < 0.0 && scaled != 0;

    let integer = (scaled / factor).to_string();
    let integer = if spec.use_grouping {
        group_thousands(&integer, locale.thousands_separator)
    } else {
        integer
    };

    let mut amount = integer;
    if digits > 0 {
        let fraction = format!("{:0width$}", scaled % factor, width = digits as usize);
        if spec.use_superscript {
            amount.push_str(&superscript(&fraction));
        } else {
            amount.push(locale.decimal_separator);
            amount.push_str(&fraction);
        }
    }

    let amount = if spec.show_currency {
        let space = if locale.currency_spacing { " " } else { "" };
        match locale.currency_position {
            CurrencyPosition::Prefix => format!("{}{}{}", locale.currency_symbol, space, amount),
            CurrencyPosition::Suffix => format!("{}{}{}", amount, space, locale.currency_symbol),
        }
    } else {
        amount
    };

    if negative {
        format!("-{}", amount)
    } else {
        amount
    }
}

// ============================================================================
// PARSE
// ============================================================================

fn all_digits(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_digit())
}

// "1.234.567" with the thousands separator: first group 1-3 digits, the rest 3.
fn is_grouped(body: &str, separator: char) -> bool {
    let mut groups = body.split(separator);
    let first_ok = groups
        .next()
        .map(|g| all_digits(g) && g.len() <= 3)
        .unwrap_or(false);
    first_ok && body.contains(separator) && groups.all(|g| g.len() == 3 && all_digits(g))
}

/// Reads back a number written by [`format_number`] or typed into a data
/// field: currency symbols, `%`, grouping and superscript decimals allowed.
/// A lone `.` that does not look like grouping is taken as a decimal point.
pub fn parse_number(text: &str, locale: &NumberLocale) -> Option<f64> {
    let mut s: String = text
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '\u{a0}' && *c != '%')
        .collect();
    if !locale.currency_symbol.is_empty() {
        s = s.replace(locale.currency_symbol.as_str(), "");
    }
    for symbol in KNOWN_CURRENCIES {
        s = s.replace(symbol, "");
    }

    let (negative, s) = match s.strip_prefix('-') {
        Some(rest) => (true, rest.to_string()),
        None => (false, s),
    };

    let superscript_start = s
        .char_indices()
        .find(|(_, c)| is_superscript_digit(*c))
        .map(|(i, _)| i)
        .unwrap_or(s.len());
    let (body, raised) = s.split_at(superscript_start);
    let raised: Option<String> = raised.chars().map(from_superscript).collect();
    let raised = raised?;

    let dec = locale.decimal_separator;
    let grp = locale.thousands_separator;

    let (integer, fraction) = if let Some(pos) = body.rfind(dec) {
        let integer = &body[..pos];
        let fraction = &body[pos + dec.len_utf8()..];
        if !all_digits(fraction) || !raised.is_empty() {
            return None;
        }
        (integer.replace(grp, ""), fraction.to_string())
    } else if body.contains(grp) {
        if is_grouped(body, grp) {
            (body.replace(grp, ""), raised)
        } else if body.matches(grp).count() == 1 && raised.is_empty() {
            // Raw data such as "12.5" under a comma-decimal locale.
            let (integer, fraction) = body.split_once(grp)?;
            (integer.to_string(), fraction.to_string())
        } else {
            return None;
        }
    } else {
        (body.to_string(), raised)
    };

    let integer = if integer.is_empty() && !fraction.is_empty() {
        "0".to_string()
    } else {
        integer
    };
    if !all_digits(&integer) || !(fraction.is_empty() || all_digits(&fraction)) {
        return None;
    }

    let literal = if fraction.is_empty() {
        integer
    } else {
        format!("{}.{}", integer, fraction)
    };
    let value: f64 = literal.parse().ok()?;
    Some(if negative { -value } else { value })
}
