//! Dynamic value resolution: content spec + data context to display string.
//!
//! Precedence: static value, field binding, calculated expression, validity
//! period, then placeholder. Missing fields fall back to a per-field default:
//!
//! | field                                   | default when absent                      |
//! |-----------------------------------------|------------------------------------------|
//! | `installment-value`                     | `promotional-price / installments`, else 0 |
//! | `regular-price`, `promotional-price`, `*price*` | `0`                              |
//! | `discount-percentage`, `*percent*`      | `discountPercent`                        |
//! | `installment-count`, `installments`     | `financingInstallments`                  |
//! | `*date*`, `valid-from`, `valid-until`   | empty                                    |
//! | anything else                           | content placeholder, else empty          |

use crate::config::EngineConfig;
use crate::dates;
use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::expr;
use crate::format::{format_number, parse_number};
use crate::template::{DataContext, FieldSource, FieldValue, FormatSpec, Precision, TextContent, ValiditySpec};

const INSTALLMENT_VALUE: &str = "installment-value";
const PROMOTIONAL_PRICE: &str = "promotional-price";

/// How a field id is displayed and what it defaults to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Price,
    Percentage,
    Count,
    Date,
    Text,
}

impl FieldKind {
    pub fn of(field_id: &str) -> FieldKind {
        let id = field_id.to_ascii_lowercase();
        if id == INSTALLMENT_VALUE || id.contains("price") {
            FieldKind::Price
        } else if id.contains("percent") {
            FieldKind::Percentage
        } else if id == "installment-count" || id == "installments" {
            FieldKind::Count
        } else if id.contains("date") || id == "valid-from" || id == "valid-until" {
            FieldKind::Date
        } else {
            FieldKind::Text
        }
    }

    fn is_numeric(self) -> bool {
        matches!(self, FieldKind::Price | FieldKind::Percentage | FieldKind::Count)
    }

    /// Format used when the content does not carry one. Currency is never
    /// shown on percentages or counts.
    fn format_spec(self, explicit: Option<FormatSpec>) -> FormatSpec {
        match self {
            FieldKind::Percentage | FieldKind::Count => {
                let spec = explicit.unwrap_or(FormatSpec {
                    precision: Precision::Zero,
                    ..FormatSpec::default()
                });
                FormatSpec {
                    show_currency: false,
                    ..spec
                }
            }
            _ => explicit.unwrap_or_default(),
        }
    }
}

enum Raw {
    Number(f64),
    Text(String),
}

pub struct ValueResolver<'a> {
    fields: &'a dyn FieldSource,
    financing_installments: u32,
    discount_percent: f64,
    config: &'a EngineConfig,
}

impl<'a> ValueResolver<'a> {
    pub fn new(data: &'a DataContext, config: &'a EngineConfig) -> Self {
        ValueResolver {
            fields: data,
            financing_installments: data.financing_installments,
            discount_percent: data.discount_percent,
            config,
        }
    }

    /// Resolver over any field provider.
    pub fn with_source(
        fields: &'a dyn FieldSource,
        financing_installments: u32,
        discount_percent: f64,
        config: &'a EngineConfig,
    ) -> Self {
        ValueResolver {
            fields,
            financing_installments,
            discount_percent,
            config,
        }
    }

    /// Final display string for a text component.
    pub fn resolve_text(&self, content: &TextContent, diag: &mut Diagnostics) -> String {
        let text = self.resolve_unwrapped(content, diag);
        if text.is_empty() {
            return text;
        }
        format!(
            "{}{}{}",
            content.prefix.as_deref().unwrap_or(""),
            text,
            content.suffix.as_deref().unwrap_or("")
        )
    }

    fn resolve_unwrapped(&self, content: &TextContent, diag: &mut Diagnostics) -> String {
        if let Some(value) = &content.value {
            return match content.format {
                Some(spec) => self
                    .format_raw(&Raw::Text(value.clone()), FieldKind::Text, Some(spec))
                    .unwrap_or_else(|| value.clone()),
                None => value.clone(),
            };
        }

        if let Some(field_id) = content.field.as_deref() {
            return self.resolve_field(field_id, content, diag);
        }

        if let Some(expression) = content.expression.as_deref() {
            return self.resolve_expression(expression, content.format, diag);
        }

        if let Some(validity) = &content.validity {
            if let Some(period) = self.resolve_validity(validity, diag) {
                return period;
            }
        }

        content.placeholder.clone().unwrap_or_default()
    }

    // ------------------------------------------------------------------------
    // Fields
    // ------------------------------------------------------------------------

    fn resolve_field(&self, field_id: &str, content: &TextContent, diag: &mut Diagnostics) -> String {
        let kind = FieldKind::of(field_id);
        let raw = match self.fields.get(field_id) {
            Some(value) => raw_of(value),
            None => {
                let fallback = self.default_for(field_id, kind, content);
                diag.warn(
                    DiagnosticKind::DataResolution,
                    format!("field '{}' is missing; using default", field_id),
                );
                match fallback {
                    Some(raw) => raw,
                    None => return String::new(),
                }
            }
        };

        if kind.is_numeric() || content.format.is_some() {
            if let Some(formatted) = self.format_raw(&raw, kind, content.format) {
                return formatted;
            }
        }

        match raw {
            Raw::Text(text) if kind == FieldKind::Date && !text.is_empty() => {
                match dates::parse_iso_date(&text) {
                    Some(date) => dates::format_date(date),
                    None => text,
                }
            }
            Raw::Text(text) => text,
            Raw::Number(n) => FieldValue::Number(n).to_text(),
        }
    }

    fn default_for(&self, field_id: &str, kind: FieldKind, content: &TextContent) -> Option<Raw> {
        match kind {
            FieldKind::Price if field_id == INSTALLMENT_VALUE => {
                let promotional = self.fields.get(PROMOTIONAL_PRICE).and_then(|v| self.number_of(v));
                match promotional {
                    Some(price) if self.financing_installments > 0 => {
                        Some(Raw::Number(price / self.financing_installments as f64))
                    }
                    _ => Some(Raw::Number(0.0)),
                }
            }
            FieldKind::Price => Some(Raw::Number(0.0)),
            FieldKind::Percentage => Some(Raw::Number(self.discount_percent)),
            FieldKind::Count => Some(Raw::Number(self.financing_installments as f64)),
            FieldKind::Date => None,
            FieldKind::Text => content.placeholder.clone().map(Raw::Text),
        }
    }

    fn number_of(&self, value: &FieldValue) -> Option<f64> {
        match value {
            FieldValue::Number(n) => Some(*n),
            FieldValue::Text(text) => parse_number(text, &self.config.locale),
            FieldValue::Bool(_) => None,
        }
    }

    fn format_raw(&self, raw: &Raw, kind: FieldKind, explicit: Option<FormatSpec>) -> Option<String> {
        let number = match raw {
            Raw::Number(n) => Some(*n),
            Raw::Text(text) => parse_number(text, &self.config.locale),
        }
        .filter(|n| n.is_finite())?;

        let spec = kind.format_spec(explicit);
        let mut out = format_number(number, &spec, &self.config.locale);
        if kind == FieldKind::Percentage {
            out.push('%');
        }
        Some(out)
    }

    /// Raw display text of a field, without defaults or formatting. Used for
    /// image URLs and QR payloads.
    pub fn field_text(&self, field_id: &str, diag: &mut Diagnostics) -> Option<String> {
        match self.fields.get(field_id) {
            Some(value) => Some(value.to_text()),
            None => {
                diag.warn(
                    DiagnosticKind::DataResolution,
                    format!("field '{}' is missing", field_id),
                );
                None
            }
        }
    }

    // ------------------------------------------------------------------------
    // Expressions
    // ------------------------------------------------------------------------

    fn placeholder_value(&self, name: &str) -> String {
        let number = match name {
            "discount" | "discountPercent" => Some(self.discount_percent),
            "installments" | "financingInstallments" => Some(self.financing_installments as f64),
            field => self.fields.get(field).and_then(|v| self.number_of(v)),
        };
        match number {
            Some(n) if n.is_finite() => format!("({})", n),
            // Not whitelisted, so the expression is rejected.
            _ => format!("[{}]", name),
        }
    }

    fn resolve_expression(
        &self,
        expression: &str,
        format: Option<FormatSpec>,
        diag: &mut Diagnostics,
    ) -> String {
        let substituted = expr::substitute(expression, |name| self.placeholder_value(name));
        match expr::evaluate(&substituted) {
            Ok(value) => format_number(value, &format.unwrap_or_default(), &self.config.locale),
            Err(e) => {
                diag.warn(
                    DiagnosticKind::Expression,
                    format!("expression '{}' rejected: {}", expression, e),
                );
                "0".to_string()
            }
        }
    }

    // ------------------------------------------------------------------------
    // Validity period
    // ------------------------------------------------------------------------

    fn bound(&self, literal: &Option<String>, field: &Option<String>) -> Option<String> {
        literal
            .clone()
            .or_else(|| field.as_deref().and_then(|id| self.fields.get(id)).map(FieldValue::to_text))
            .filter(|s| !s.trim().is_empty())
    }

    fn resolve_validity(&self, spec: &ValiditySpec, diag: &mut Diagnostics) -> Option<String> {
        let start = self.bound(&spec.start, &spec.start_field);
        let end = self.bound(&spec.end, &spec.end_field);

        let mut display = |raw: &str| match dates::parse_iso_date(raw) {
            Some(date) => Ok(date),
            None => {
                diag.warn(
                    DiagnosticKind::DataResolution,
                    format!("'{}' is not an ISO date", raw),
                );
                Err(raw.to_string())
            }
        };

        match (start, end) {
            (Some(start), Some(end)) => Some(match (display(&start), display(&end)) {
                (Ok(s), Ok(e)) => dates::format_range(s, e, self.config.mode, &self.config.date_separator),
                (s, e) => {
                    let s = s.map(dates::format_date).unwrap_or_else(|raw| raw);
                    let e = e.map(dates::format_date).unwrap_or_else(|raw| raw);
                    format!("{}{}{}", s, self.config.date_separator, e)
                }
            }),
            (Some(single), None) | (None, Some(single)) => {
                Some(display(&single).map(dates::format_date).unwrap_or_else(|raw| raw))
            }
            (None, None) => None,
        }
    }
}

fn raw_of(value: &FieldValue) -> Raw {
    match value {
        FieldValue::Number(n) => Raw::Number(*n),
        other => Raw::Text(other.to_text()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RenderMode;
    use pretty_assertions::assert_eq;

    fn text(field: &str, format: Option<FormatSpec>) -> TextContent {
        TextContent {
            field: Some(field.to_string()),
            format,
            ..Default::default()
        }
    }

    fn resolve(content: &TextContent, data: &DataContext) -> (String, Diagnostics) {
        let config = EngineConfig::default();
        let mut diag = Diagnostics::new();
        let out = ValueResolver::new(data, &config).resolve_text(content, &mut diag);
        (out, diag)
    }

    #[test]
    fn test_field_kinds() {
        assert_eq!(FieldKind::of("regular-price"), FieldKind::Price);
        assert_eq!(FieldKind::of("installment-value"), FieldKind::Price);
        assert_eq!(FieldKind::of("discount-percentage"), FieldKind::Percentage);
        assert_eq!(FieldKind::of("installment-count"), FieldKind::Count);
        assert_eq!(FieldKind::of("start-date"), FieldKind::Date);
        assert_eq!(FieldKind::of("product-name"), FieldKind::Text);
    }

    #[test]
    fn test_static_value_wins() {
        let content = TextContent {
            value: Some("OFERTA".into()),
            field: Some("product-name".into()),
            ..Default::default()
        };
        let data = DataContext::default().with_field("product-name", FieldValue::Text("Arroz".into()));
        assert_eq!(resolve(&content, &data).0, "OFERTA");
    }

    #[test]
    fn test_percentage_rounds_without_grouping() {
        let spec = FormatSpec {
            precision: Precision::Zero,
            use_grouping: false,
            ..FormatSpec::default()
        };
        let data = DataContext::default().with_field("discount-percentage", FieldValue::Number(23.7));
        let (out, diag) = resolve(&text("discount-percentage", Some(spec)), &data);
        assert_eq!(out, "24%");
        assert!(diag.is_empty());
    }

    #[test]
    fn test_price_with_superscript_and_currency() {
        let spec = FormatSpec {
            use_superscript: true,
            show_currency: true,
            ..FormatSpec::default()
        };
        let data = DataContext::default().with_field("promotional-price", FieldValue::Text("1299.9".into()));
        assert_eq!(resolve(&text("promotional-price", Some(spec)), &data).0, "R$ 1.299⁹⁰");
    }

    #[test]
    fn test_missing_fields_use_documented_defaults() {
        let data = DataContext {
            financing_installments: 10,
            discount_percent: 15.0,
            ..Default::default()
        }
        .with_field("promotional-price", FieldValue::Number(250.0));

        let (out, diag) = resolve(&text("regular-price", None), &data);
        assert_eq!(out, "0,00");
        assert_eq!(diag.count(DiagnosticKind::DataResolution), 1);

        assert_eq!(resolve(&text("discount-percentage", None), &data).0, "15%");
        assert_eq!(resolve(&text("installment-count", None), &data).0, "10");
        assert_eq!(resolve(&text("installment-value", None), &data).0, "25,00");
        assert_eq!(resolve(&text("start-date", None), &data).0, "");

        let with_placeholder = TextContent {
            placeholder: Some("Produto".into()),
            ..text("product-name", None)
        };
        assert_eq!(resolve(&with_placeholder, &data).0, "Produto");
    }

    #[test]
    fn test_prefix_and_suffix_wrap_non_empty_values() {
        let data = DataContext::default().with_field("installment-count", FieldValue::Number(12.0));
        let content = TextContent {
            prefix: Some("em ".into()),
            suffix: Some("x".into()),
            ..text("installment-count", None)
        };
        assert_eq!(resolve(&content, &data).0, "em 12x");

        let empty = TextContent {
            prefix: Some("de ".into()),
            ..text("end-date", None)
        };
        assert_eq!(resolve(&empty, &DataContext::default()).0, "");
    }

    #[test]
    fn test_expression_substitutes_fields_and_scalars() {
        let data = DataContext {
            discount_percent: 10.0,
            financing_installments: 4,
            ..Default::default()
        }
        .with_field("regular-price", FieldValue::Text("R$ 1.000,00".into()));
        let content = TextContent {
            expression: Some("[regular-price] * (1 - [discount] / 100) / [installments]".into()),
            ..Default::default()
        };
        let (out, diag) = resolve(&content, &data);
        assert_eq!(out, "225,00");
        assert!(diag.is_empty());
    }

    #[test]
    fn test_rejected_expression_yields_zero() {
        let content = TextContent {
            expression: Some("[missing] * 2".into()),
            ..Default::default()
        };
        let (out, diag) = resolve(&content, &DataContext::default());
        assert_eq!(out, "0");
        assert_eq!(diag.count(DiagnosticKind::Expression), 1);

        let injected = TextContent {
            expression: Some("process.exit()".into()),
            ..Default::default()
        };
        assert_eq!(resolve(&injected, &DataContext::default()).0, "0");

        let division = TextContent {
            expression: Some("1 / 0".into()),
            ..Default::default()
        };
        assert_eq!(resolve(&division, &DataContext::default()).0, "0");
    }

    #[test]
    fn test_validity_period() {
        let data = DataContext::default()
            .with_field("valid-from", FieldValue::Text("2024-06-01".into()))
            .with_field("valid-until", FieldValue::Text("2024-06-30".into()));
        let content = TextContent {
            validity: Some(ValiditySpec {
                start_field: Some("valid-from".into()),
                end_field: Some("valid-until".into()),
                ..Default::default()
            }),
            prefix: Some("Válido de ".into()),
            ..Default::default()
        };
        assert_eq!(resolve(&content, &data).0, "Válido de 01/06/2024-30/06/2024");

        let same_day = TextContent {
            validity: Some(ValiditySpec {
                start: Some("2024-06-01".into()),
                end: Some("2024-06-01".into()),
                ..Default::default()
            }),
            ..Default::default()
        };
        assert_eq!(resolve(&same_day, &data).0, "01/06/2024");

        let config = EngineConfig::default().with_mode(RenderMode::Preview);
        let mut diag = Diagnostics::new();
        let preview = ValueResolver::new(&data, &config).resolve_text(&same_day, &mut diag);
        assert_eq!(preview, "01/06/2024-01/06/2024");
    }

    #[test]
    fn test_unparseable_date_is_shown_verbatim() {
        let content = TextContent {
            validity: Some(ValiditySpec {
                start: Some("amanhã".into()),
                end: Some("2024-06-30".into()),
                ..Default::default()
            }),
            ..Default::default()
        };
        let (out, diag) = resolve(&content, &DataContext::default());
        assert_eq!(out, "amanhã-30/06/2024");
        assert_eq!(diag.count(DiagnosticKind::DataResolution), 1);
    }

    #[test]
    fn test_placeholder_is_the_last_resort() {
        let content = TextContent {
            placeholder: Some("Digite o texto".into()),
            ..Default::default()
        };
        assert_eq!(resolve(&content, &DataContext::default()).0, "Digite o texto");
        assert_eq!(resolve(&TextContent::default(), &DataContext::default()).0, "");
    }
}
