//! Template, component and data-context model, deserialized from template JSON.

use serde::Deserialize;
use std::collections::HashMap;

// ============================================================================
// TEMPLATE
// ============================================================================

/// A poster template: logical canvas plus positioned components, painted in
/// z order. Read-only to the engine.
#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    #[serde(default)]
    pub id: Option<String>,
    pub canvas: CanvasSize,
    #[serde(default, alias = "background_color")]
    pub background_color: Option<String>,
    #[serde(default)]
    pub components: Vec<Component>,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
pub struct CanvasSize {
    pub width: f32,
    pub height: f32,
}

// ============================================================================
// COMPONENT
// ============================================================================

#[derive(Debug, Deserialize, Clone)]
#[serde(try_from = "RawComponent")]
pub struct Component {
    pub id: String,
    pub kind: ComponentKind,
    pub position: Position,
    pub size: Size,
    pub visible: bool,
    pub style: ComponentStyle,
}

#[derive(Debug, Clone)]
pub enum ComponentKind {
    Text(TextContent),
    Image(ImageContent),
    Shape(ShapeContent),
    Line(LineContent),
    Icon(IconContent),
    Container,
    Qr(QrContent),
    /// A type tag this engine does not know; skipped at render time.
    Unsupported(String),
}

impl ComponentKind {
    pub fn tag(&self) -> &str {
        match self {
            ComponentKind::Text(_) => "text",
            ComponentKind::Image(_) => "image",
            ComponentKind::Shape(_) => "shape",
            ComponentKind::Line(_) => "line",
            ComponentKind::Icon(_) => "icon",
            ComponentKind::Container => "container",
            ComponentKind::Qr(_) => "qr",
            ComponentKind::Unsupported(tag) => tag,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Default)]
pub struct Position {
    pub x: f32,
    pub y: f32,
    #[serde(default)]
    pub z: i32,
    #[serde(default, alias = "rotationDegrees", alias = "rotation_degrees")]
    pub rotation: f32,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Default)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

// The wire shape of a component; `type` selects how `content` is read.
#[derive(Deserialize)]
struct RawComponent {
    id: String,
    #[serde(rename = "type")]
    component_type: String,
    position: Position,
    size: Size,
    #[serde(default = "default_visible")]
    visible: bool,
    #[serde(default)]
    style: ComponentStyle,
    #[serde(default)]
    content: serde_json::Value,
}

fn default_visible() -> bool {
    true
}

fn content_of<T>(value: serde_json::Value) -> Result<T, serde_json::Error>
where
    T: for<'de> Deserialize<'de> + Default,
{
    if value.is_null() {
        Ok(T::default())
    } else {
        serde_json::from_value(value)
    }
}

impl TryFrom<RawComponent> for Component {
    type Error = String;

    fn try_from(raw: RawComponent) -> Result<Self, Self::Error> {
        let content = raw.content;
        let kind = match raw.component_type.as_str() {
            "text" => content_of(content).map(ComponentKind::Text),
            "image" => content_of(content).map(ComponentKind::Image),
            "shape" => content_of(content).map(ComponentKind::Shape),
            "line" => content_of(content).map(ComponentKind::Line),
            "icon" => content_of(content).map(ComponentKind::Icon),
            "qr" => content_of(content).map(ComponentKind::Qr),
            "container" => Ok(ComponentKind::Container),
            other => Ok(ComponentKind::Unsupported(other.to_string())),
        }
        .map_err(|e| format!("component '{}': invalid content: {}", raw.id, e))?;

        Ok(Component {
            id: raw.id,
            kind,
            position: raw.position,
            size: raw.size,
            visible: raw.visible,
            style: raw.style,
        })
    }
}

// ============================================================================
// STYLE
// ============================================================================

#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    Left,
    Center,
    Right,
    Justify,
}

/// `fontWeight` as authored: CSS numeric (100-900) or a keyword.
#[derive(Debug, Clone, PartialEq)]
pub enum FontWeight {
    Numeric(u16),
    Named(String),
}

impl FontWeight {
    pub fn is_bold(&self) -> bool {
        match self {
            FontWeight::Numeric(w) => *w >= 600,
            FontWeight::Named(name) => matches!(
                name.to_ascii_lowercase().as_str(),
                "bold" | "bolder" | "semibold" | "semi-bold" | "extrabold" | "extra-bold" | "black" | "heavy"
            ),
        }
    }
}

impl<'de> Deserialize<'de> for FontWeight {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use serde::de::{self, Visitor};

        struct FontWeightVisitor;

        impl<'de> Visitor<'de> for FontWeightVisitor {
            type Value = FontWeight;

            fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
                formatter.write_str("a numeric font weight or a keyword like \"bold\"")
            }

            fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                u16::try_from(v)
                    .map(FontWeight::Numeric)
                    .map_err(|_| de::Error::custom(format!("font weight out of range: {}", v)))
            }

            fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                u16::try_from(v)
                    .map(FontWeight::Numeric)
                    .map_err(|_| de::Error::custom(format!("font weight out of range: {}", v)))
            }

            fn visit_f64<E>(self, v: f64) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                if v.is_finite() && (0.0..=1000.0).contains(&v) {
                    Ok(FontWeight::Numeric(v.round() as u16))
                } else {
                    Err(de::Error::custom(format!("font weight out of range: {}", v)))
                }
            }

            fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                let trimmed = v.trim();
                match trimmed.parse::<u16>() {
                    Ok(n) => Ok(FontWeight::Numeric(n)),
                    Err(_) => Ok(FontWeight::Named(trimmed.to_string())),
                }
            }
        }

        deserializer.deserialize_any(FontWeightVisitor)
    }
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Typography {
    #[serde(alias = "font_family")]
    pub font_family: Option<String>,
    /// Logical canvas pixels.
    #[serde(alias = "font_size")]
    pub font_size: Option<f32>,
    #[serde(alias = "font_weight")]
    pub font_weight: Option<FontWeight>,
    /// "normal", "italic" or "oblique".
    #[serde(alias = "font_style")]
    pub font_style: Option<String>,
    #[serde(alias = "line_height")]
    pub line_height: Option<f32>,
    #[serde(alias = "text_align")]
    pub text_align: Option<TextAlign>,
    #[serde(alias = "auto_fit")]
    pub auto_fit: Option<bool>,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct Border {
    /// Logical canvas pixels.
    pub width: Option<f32>,
    pub color: Option<String>,
    pub radius: Option<f32>,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct Spacing {
    pub padding: Option<f32>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ComponentStyle {
    #[serde(default)]
    pub typography: Typography,
    pub color: Option<String>,
    #[serde(alias = "background_color")]
    pub background_color: Option<String>,
    pub opacity: Option<f32>,
    pub border: Option<Border>,
    #[serde(default)]
    pub spacing: Spacing,
}

impl ComponentStyle {
    pub fn opacity(&self) -> f32 {
        self.opacity.unwrap_or(1.0).clamp(0.0, 1.0)
    }
}

// ============================================================================
// CONTENT
// ============================================================================

/// Decimal digits of a formatted number. Only 0, 1 and 2 are meaningful on a
/// price tag.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(try_from = "u8")]
pub enum Precision {
    Zero,
    One,
    #[default]
    Two,
}

impl Precision {
    pub fn digits(self) -> u32 {
        match self {
            Precision::Zero => 0,
            Precision::One => 1,
            Precision::Two => 2,
        }
    }
}

impl TryFrom<u8> for Precision {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Precision::Zero),
            1 => Ok(Precision::One),
            2 => Ok(Precision::Two),
            other => Err(format!("precision must be 0, 1 or 2, got {}", other)),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct FormatSpec {
    pub precision: Precision,
    #[serde(alias = "use_superscript")]
    pub use_superscript: bool,
    #[serde(alias = "show_currency")]
    pub show_currency: bool,
    #[serde(alias = "use_grouping")]
    pub use_grouping: bool,
}

impl Default for FormatSpec {
    fn default() -> Self {
        FormatSpec {
            precision: Precision::Two,
            use_superscript: false,
            show_currency: false,
            use_grouping: true,
        }
    }
}

/// Bounds of a validity period: literal ISO dates, or fields holding them.
#[derive(Debug, Deserialize, Default, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ValiditySpec {
    pub start: Option<String>,
    pub end: Option<String>,
    #[serde(alias = "start_field")]
    pub start_field: Option<String>,
    #[serde(alias = "end_field")]
    pub end_field: Option<String>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(rename_all = "camelCase")]
pub struct TextContent {
    /// Static text; wins over every binding.
    #[serde(alias = "text")]
    pub value: Option<String>,
    #[serde(alias = "fieldId", alias = "field_id")]
    pub field: Option<String>,
    pub expression: Option<String>,
    #[serde(alias = "validityPeriod", alias = "validity_period")]
    pub validity: Option<ValiditySpec>,
    pub placeholder: Option<String>,
    pub format: Option<FormatSpec>,
    pub prefix: Option<String>,
    pub suffix: Option<String>,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum ObjectFit {
    /// Fill the container, cropping overflow.
    Cover,
    /// Show the whole image, letterboxed.
    Contain,
    /// Stretch to the container (distorts aspect ratio).
    Fill,
    /// Intrinsic size, centered.
    None,
    /// The smaller of `none` and `contain`.
    ScaleDown,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ImageContent {
    #[serde(alias = "src")]
    pub url: Option<String>,
    #[serde(alias = "fieldId", alias = "field_id")]
    pub field: Option<String>,
    #[serde(alias = "object_fit")]
    pub object_fit: Option<ObjectFit>,
    /// Background images cover the container by default.
    #[serde(default, alias = "isBackground")]
    pub background: bool,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ShapeKind {
    #[default]
    #[serde(alias = "rect")]
    Rectangle,
    Circle,
    Triangle,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ShapeContent {
    #[serde(default, alias = "shapeType", alias = "kind")]
    pub shape: ShapeKind,
    #[serde(alias = "fillColor")]
    pub fill: Option<String>,
    #[serde(alias = "strokeColor")]
    pub stroke: Option<String>,
    #[serde(alias = "stroke_width")]
    pub stroke_width: Option<f32>,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LineStyle {
    #[default]
    Solid,
    Dashed,
    Dotted,
    Double,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    Horizontal,
    Vertical,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(rename_all = "camelCase")]
pub struct LineContent {
    #[serde(default, alias = "lineStyle")]
    pub style: LineStyle,
    pub color: Option<String>,
    /// Stroke width in logical pixels.
    #[serde(alias = "strokeWidth")]
    pub thickness: Option<f32>,
    #[serde(alias = "dash_length")]
    pub dash_length: Option<f32>,
    #[serde(alias = "gap_length")]
    pub gap_length: Option<f32>,
    /// Defaults to the longer side of the box.
    pub orientation: Option<Orientation>,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ArrowDirection {
    #[default]
    Right,
    Left,
    Up,
    Down,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(rename_all = "camelCase")]
pub struct IconContent {
    /// star, heart, check, arrow or custom.
    #[serde(alias = "name", alias = "iconType")]
    pub icon: String,
    pub color: Option<String>,
    /// SVG path data, inline SVG markup, or an SVG data URL (custom icons).
    #[serde(alias = "svg")]
    pub path: Option<String>,
    #[serde(alias = "view_box")]
    pub view_box: Option<[f32; 4]>,
    #[serde(default)]
    pub direction: ArrowDirection,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(rename_all = "camelCase")]
pub struct QrContent {
    pub value: Option<String>,
    #[serde(alias = "fieldId", alias = "field_id")]
    pub field: Option<String>,
    pub foreground: Option<String>,
    pub background: Option<String>,
}

// ============================================================================
// DATA CONTEXT
// ============================================================================

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(untagged)]
pub enum FieldValue {
    Number(f64),
    Text(String),
    Bool(bool),
}

impl FieldValue {
    /// Display form of a raw value, before any formatting.
    pub fn to_text(&self) -> String {
        match self {
            FieldValue::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    format!("{}", *n as i64)
                } else {
                    format!("{}", n)
                }
            }
            FieldValue::Text(s) => s.clone(),
            FieldValue::Bool(b) => b.to_string(),
        }
    }
}

/// Field values for one product/promotion plus the two scalar parameters.
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct DataContext {
    #[serde(default)]
    pub fields: HashMap<String, FieldValue>,
    #[serde(default, alias = "financing_installments")]
    pub financing_installments: u32,
    #[serde(default, alias = "discount_percent")]
    pub discount_percent: f64,
}

/// Read access to product/promotion field values.
pub trait FieldSource {
    fn get(&self, field_id: &str) -> Option<&FieldValue>;
}

impl FieldSource for DataContext {
    fn get(&self, field_id: &str) -> Option<&FieldValue> {
        self.fields.get(field_id)
    }
}

impl DataContext {
    pub fn with_field(mut self, id: &str, value: FieldValue) -> Self {
        self.fields.insert(id.to_string(), value);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_component_variants() {
        let template: Template = serde_json::from_str(
            r##"{
                "canvas": {"width": 800, "height": 600},
                "backgroundColor": "#ffffff",
                "components": [
                    {"id": "t", "type": "text", "position": {"x": 1, "y": 2, "z": 3},
                     "size": {"width": 100, "height": 20},
                     "style": {"typography": {"fontSize": 24, "fontWeight": 700}},
                     "content": {"field": "promotional-price",
                                 "format": {"precision": 2, "useSuperscript": true}}},
                    {"id": "c", "type": "container", "position": {"x": 0, "y": 0},
                     "size": {"width": 10, "height": 10}, "visible": false},
                    {"id": "w", "type": "widget", "position": {"x": 0, "y": 0},
                     "size": {"width": 10, "height": 10}}
                ]
            }"##,
        )
        .unwrap();

        assert_eq!(template.components.len(), 3);
        let text = &template.components[0];
        assert_eq!(text.position.z, 3);
        assert!(text.visible);
        match &text.kind {
            ComponentKind::Text(content) => {
                assert_eq!(content.field.as_deref(), Some("promotional-price"));
                let format = content.format.unwrap();
                assert!(format.use_superscript);
                assert!(format.use_grouping);
            }
            other => panic!("expected text, got {:?}", other),
        }
        assert_eq!(
            text.style.typography.font_weight,
            Some(FontWeight::Numeric(700))
        );
        assert!(!template.components[1].visible);
        assert!(matches!(
            &template.components[2].kind,
            ComponentKind::Unsupported(tag) if tag == "widget"
        ));
    }

    #[test]
    fn test_precision_is_a_closed_set() {
        let ok: Result<FormatSpec, _> = serde_json::from_str(r#"{"precision": 1}"#);
        assert_eq!(ok.unwrap().precision, Precision::One);
        let bad: Result<FormatSpec, _> = serde_json::from_str(r#"{"precision": 3}"#);
        assert!(bad.is_err());
    }

    #[test]
    fn test_font_weight_forms() {
        let named: FontWeight = serde_json::from_str(r#""bold""#).unwrap();
        assert!(named.is_bold());
        let numeric_string: FontWeight = serde_json::from_str(r#""300""#).unwrap();
        assert_eq!(numeric_string, FontWeight::Numeric(300));
        assert!(!numeric_string.is_bold());
    }

    #[test]
    fn test_data_context_values() {
        let data: DataContext = serde_json::from_str(
            r#"{"fields": {"price": 12.9, "name": "Arroz", "qty": 3},
                "financingInstallments": 10, "discountPercent": 15}"#,
        )
        .unwrap();
        assert_eq!(data.financing_installments, 10);
        assert_eq!(data.get("price"), Some(&FieldValue::Number(12.9)));
        assert_eq!(data.get("qty").map(FieldValue::to_text), Some("3".to_string()));
        assert_eq!(data.get("missing"), None);
    }

    #[test]
    fn test_invalid_content_is_reported_with_id() {
        let err = serde_json::from_str::<Component>(
            r#"{"id": "s", "type": "shape", "position": {"x": 0, "y": 0},
                "size": {"width": 1, "height": 1}, "content": {"shape": "hexagon"}}"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("component 's'"));
    }
}
