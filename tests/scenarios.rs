//! End-to-end rendering scenarios: template JSON in, page operations out.

use pretty_assertions::assert_eq;
use std::sync::Arc;

use poster_engine::config::PT_TO_MM;
use poster_engine::font_metrics::{FontFace, FontFamily, FontVariant};
use poster_engine::format::NumberLocale;
use poster_engine::geometry::PageTransform;
use poster_engine::ops::{Color, Rect};
use poster_engine::template::TextAlign;
use poster_engine::text::{layout_static, TextBox};
use poster_engine::{
    render_document, render_page, AssetError, AssetLoader, DataContext, DiagnosticKind, Diagnostics,
    DrawOp, EngineConfig, FieldValue, PageSize, RasterImage, RenderMode, Template,
};

struct Offline;

impl AssetLoader for Offline {
    fn load(&self, url: &str) -> Result<Arc<RasterImage>, AssetError> {
        Err(AssetError::Fetch {
            url: url.to_string(),
            message: "offline".into(),
        })
    }
}

fn template(json: &str) -> Template {
    serde_json::from_str(json).unwrap()
}

fn landscape() -> EngineConfig {
    EngineConfig::default().with_page(PageSize::a4_landscape())
}

// ============================================================================
// Scenario A: canvas fitted onto a landscape page
// ============================================================================

#[test]
fn test_canvas_is_scaled_by_min_axis_and_centered() {
    let poster = template(r#"{"canvas": {"width": 800, "height": 600}, "components": []}"#);
    let config = landscape();
    let k = config.px_to_mm;

    let t = PageTransform::fit(poster.canvas, config.page, k).unwrap();
    let scale_x = 297.0 / (800.0 * k);
    let scale_y = 210.0 / (600.0 * k);
    assert_eq!(t.scale, scale_x.min(scale_y));
    assert!((t.offset_x - (297.0 - 800.0 * k * t.scale) / 2.0).abs() < 1e-4);
    assert!((t.offset_y - (210.0 - 600.0 * k * t.scale) / 2.0).abs() < 1e-4);

    // The height limits, so the canvas fills the page vertically.
    assert!(t.offset_y.abs() < 1e-3);
    assert!(t.offset_x > 0.0);

    let again = PageTransform::fit(poster.canvas, config.page, k).unwrap();
    assert_eq!(t, again);
}

#[test]
fn test_repeated_renders_are_identical() {
    let poster = template(
        r##"{
        "canvas": {"width": 800, "height": 600},
        "backgroundColor": "#ffcc00",
        "components": [
            {"id": "name", "type": "text", "position": {"x": 40, "y": 40},
             "size": {"width": 400, "height": 80},
             "style": {"typography": {"fontSize": 48, "fontWeight": 700}},
             "content": {"field": "product-name"}},
            {"id": "price", "type": "text", "position": {"x": 40, "y": 200, "z": 2},
             "size": {"width": 500, "height": 200},
             "style": {"typography": {"fontSize": 160}},
             "content": {"field": "promotional-price", "format": {"showCurrency": true, "useSuperscript": true}}},
            {"id": "badge", "type": "shape", "position": {"x": 600, "y": 40, "rotation": -12},
             "size": {"width": 150, "height": 150},
             "content": {"shape": "circle", "fill": "#d00000"}}
        ]
    }"##,
    );
    let data = DataContext::default()
        .with_field("product-name", FieldValue::Text("Café torrado 500g".into()))
        .with_field("promotional-price", FieldValue::Number(19.9));

    let render = || {
        let mut diag = Diagnostics::new();
        let page = render_page(&poster, &data, &landscape(), &Offline, &mut diag).unwrap();
        format!("{:?}", page)
    };
    assert_eq!(render(), render());
}

// ============================================================================
// Scenario B: numeric label shrunk to its box
// ============================================================================

#[test]
fn test_numeric_label_shrinks_into_box() {
    let font = FontFace::new(FontFamily::Helvetica, FontVariant::Bold);
    let label = "1234567,89";
    let initial = 72.0;
    let measured_mm = font.metrics().string_width(label, initial) * PT_TO_MM;
    assert!(measured_mm > 100.0, "label must overflow at the initial size");

    let block = TextBox {
        text: label,
        rect: Rect::new(10.0, 10.0, 100.0, 40.0),
        font,
        size_pt: initial,
        line_height: 1.2,
        align: TextAlign::Left,
        color: Color::black(),
    };
    let laid = layout_static(&block, &NumberLocale::default(), 0.96, 6.0);

    assert_eq!(laid.runs.len(), 1);
    let run = &laid.runs[0];
    assert_eq!(run.text, label);
    assert!(run.size_pt < initial);
    let width_mm = font.metrics().string_width(&run.text, run.size_pt) * PT_TO_MM;
    assert!(width_mm <= 100.0, "label is {} mm wide", width_mm);
}

#[test]
fn test_print_mode_price_stays_on_one_line() {
    let poster = template(
        r#"{
        "canvas": {"width": 400, "height": 300},
        "components": [
            {"id": "price", "type": "text", "position": {"x": 0, "y": 0},
             "size": {"width": 120, "height": 120},
             "style": {"typography": {"fontSize": 90}},
             "content": {"text": "1234567,89"}}
        ]
    }"#,
    );
    let config = landscape().with_mode(RenderMode::Print);
    let mut diag = Diagnostics::new();
    let page = render_page(&poster, &DataContext::default(), &config, &Offline, &mut diag).unwrap();

    let runs = page.text_runs();
    assert_eq!(runs.len(), 1);
    let t = PageTransform::fit(poster.canvas, config.page, config.px_to_mm).unwrap();
    let width_mm = runs[0].font.metrics().string_width(&runs[0].text, runs[0].size_pt) * PT_TO_MM;
    assert!(width_mm <= t.length(120.0));
}

// ============================================================================
// Scenario C: percentage formatting
// ============================================================================

#[test]
fn test_discount_percentage_renders_rounded() {
    let poster = template(
        r#"{
        "canvas": {"width": 400, "height": 300},
        "components": [
            {"id": "off", "type": "text", "position": {"x": 10, "y": 10},
             "size": {"width": 200, "height": 80},
             "content": {"field": "discount-percentage",
                         "format": {"precision": 0, "useGrouping": false}}}
        ]
    }"#,
    );
    let data = DataContext::default().with_field("discount-percentage", FieldValue::Number(23.7));
    let mut diag = Diagnostics::new();
    let page = render_page(&poster, &data, &landscape(), &Offline, &mut diag).unwrap();

    let texts: Vec<&str> = page.text_runs().iter().map(|r| r.text.as_str()).collect();
    assert_eq!(texts, vec!["24%"]);
    assert!(diag.is_empty());
}

#[test]
fn test_missing_percentage_falls_back_to_context_discount() {
    let poster = template(
        r#"{
        "canvas": {"width": 400, "height": 300},
        "components": [
            {"id": "off", "type": "text", "position": {"x": 10, "y": 10},
             "size": {"width": 200, "height": 80},
             "content": {"field": "discount-percentage"}}
        ]
    }"#,
    );
    let data = DataContext {
        discount_percent: 15.0,
        ..Default::default()
    };
    let mut diag = Diagnostics::new();
    let page = render_page(&poster, &data, &landscape(), &Offline, &mut diag).unwrap();
    let texts: Vec<&str> = page.text_runs().iter().map(|r| r.text.as_str()).collect();
    assert_eq!(texts, vec!["15%"]);
    assert_eq!(diag.count(DiagnosticKind::DataResolution), 1);
}

// ============================================================================
// Scenario D: hidden components
// ============================================================================

#[test]
fn test_hidden_component_never_drawn() {
    for z in [-100, 0, 3, 100] {
        let json = format!(
            r##"{{
            "canvas": {{"width": 400, "height": 300}},
            "components": [
                {{"id": "a", "type": "shape", "position": {{"x": 0, "y": 0, "z": 1}},
                 "size": {{"width": 50, "height": 50}}, "content": {{"fill": "#00ff00"}}}},
                {{"id": "ghost", "type": "shape", "visible": false,
                 "position": {{"x": 0, "y": 0, "z": {}}},
                 "size": {{"width": 50, "height": 50}}, "content": {{"fill": "#ff00ff"}}}},
                {{"id": "b", "type": "container", "position": {{"x": 0, "y": 0, "z": 2}},
                 "size": {{"width": 50, "height": 50}}}}
            ]
        }}"##,
            z
        );
        let mut diag = Diagnostics::new();
        let page = render_page(&template(&json), &DataContext::default(), &landscape(), &Offline, &mut diag).unwrap();

        assert_eq!(page.component_ids(), vec!["a", "b"]);
        let magenta = Color::rgb(255, 0, 255);
        let painted = page.primitives().into_iter().any(|op| match op {
            DrawOp::Path(p) => p.fill == Some(magenta),
            _ => false,
        });
        assert!(!painted, "hidden component drawn at z={}", z);
    }
}

// ============================================================================
// Batches
// ============================================================================

#[test]
fn test_batch_renders_one_page_per_context() {
    let poster = template(
        r#"{
        "canvas": {"width": 400, "height": 300},
        "components": [
            {"id": "name", "type": "text", "position": {"x": 10, "y": 10},
             "size": {"width": 300, "height": 60}, "content": {"field": "product-name"}},
            {"id": "photo", "type": "image", "position": {"x": 10, "y": 100},
             "size": {"width": 100, "height": 100}, "content": {"field": "image-url"}}
        ]
    }"#,
    );
    let first = DataContext::default()
        .with_field("product-name", FieldValue::Text("Arroz".into()))
        .with_field("image-url", FieldValue::Text("https://cdn.example/arroz.png".into()));
    let second = DataContext::default().with_field("product-name", FieldValue::Text("Feijão".into()));

    let rendered = render_document(&[(&poster, &first), (&poster, &second)], &landscape(), &Offline).unwrap();
    assert_eq!(rendered.document.len(), 2);

    let names: Vec<String> = rendered
        .document
        .pages
        .iter()
        .map(|p| p.text_runs().iter().map(|r| r.text.clone()).collect::<Vec<_>>().join(" "))
        .collect();
    assert_eq!(names, vec!["Arroz".to_string(), "Feijão".to_string()]);

    // Page 0 fails to fetch; page 1 has no url at all.
    let kinds: Vec<(usize, DiagnosticKind)> = rendered.diagnostics.iter().map(|d| (d.page, d.kind)).collect();
    assert!(kinds.contains(&(0, DiagnosticKind::Asset)));
    assert!(kinds.contains(&(1, DiagnosticKind::DataResolution)));
    assert!(kinds.contains(&(1, DiagnosticKind::Asset)));
}

#[test]
fn test_pdf_output_for_rendered_document() {
    let poster = template(
        r##"{
        "canvas": {"width": 400, "height": 300},
        "backgroundColor": "#ffffff",
        "components": [
            {"id": "qr", "type": "qr", "position": {"x": 10, "y": 10},
             "size": {"width": 100, "height": 100}, "content": {"value": "https://example.com/p/42"}},
            {"id": "star", "type": "icon", "position": {"x": 200, "y": 10},
             "size": {"width": 50, "height": 50}, "content": {"icon": "star", "color": "#f5b400"}}
        ]
    }"##,
    );
    let data = DataContext::default();
    let rendered = render_document(&[(&poster, &data)], &landscape(), &Offline).unwrap();
    assert!(rendered.diagnostics.is_empty());

    let bytes = poster_engine::pdf::write_pdf(&rendered.document, "scenario").unwrap();
    assert!(bytes.starts_with(b"%PDF"));
}
