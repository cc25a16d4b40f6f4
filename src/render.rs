//! Document assembly.
//!
//! One page per `(template, data)` pair: compute the page transform, paint
//! the template background, then every visible component in z order. Only a
//! [`ConfigurationError`] stops a render; every other defect becomes a
//! diagnostic and the page carries on.

use crate::assets::AssetLoader;
use crate::config::{EngineConfig, RenderMode};
use crate::diagnostics::{Diagnostic, DiagnosticKind, Diagnostics};
use crate::error::ConfigurationError;
use crate::geometry::PageTransform;
use crate::image;
use crate::ops::{DrawOp, Document, Page, PathOp, Rect, Rotation, Stroke};
use crate::shapes;
use crate::style::{parse_color, resolve_style, ResolvedStyle};
use crate::template::{Component, ComponentKind, DataContext, QrContent, Template, TextContent};
use crate::text::{layout_autofit, layout_static, TextBox};
use crate::value::ValueResolver;

/// A finished document plus everything that degraded along the way.
#[derive(Debug)]
pub struct Rendered {
    pub document: Document,
    pub diagnostics: Vec<Diagnostic>,
}

/// Checks everything that would make a render call fail, and returns the
/// page transform for the template.
pub fn validate(
    template: &Template,
    data: &DataContext,
    config: &EngineConfig,
) -> Result<PageTransform, ConfigurationError> {
    config.validate()?;
    if !(data.discount_percent.is_finite() && data.discount_percent >= 0.0) {
        return Err(ConfigurationError::Data(format!(
            "discountPercent must be a non-negative number, got {}",
            data.discount_percent
        )));
    }
    PageTransform::fit(template.canvas, config.page, config.px_to_mm)
}

/// Renders every pair in order. All pairs are validated before the first page
/// is drawn.
pub fn render_document(
    pairs: &[(&Template, &DataContext)],
    config: &EngineConfig,
    loader: &dyn AssetLoader,
) -> Result<Rendered, ConfigurationError> {
    for (template, data) in pairs {
        validate(template, data, config)?;
    }

    let mut document = Document::new();
    let mut diag = Diagnostics::new();
    for (index, (template, data)) in pairs.iter().enumerate() {
        diag.set_page(index);
        document.push(render_page(template, data, config, loader, &mut diag)?);
    }

    Ok(Rendered {
        document,
        diagnostics: diag.into_entries(),
    })
}

/// Renders one page. Pure apart from asset loading: the same inputs give the
/// same operations.
pub fn render_page(
    template: &Template,
    data: &DataContext,
    config: &EngineConfig,
    loader: &dyn AssetLoader,
    diag: &mut Diagnostics,
) -> Result<Page, ConfigurationError> {
    let transform = validate(template, data, config)?;
    let mut page = Page::new(config.page.width_mm, config.page.height_mm);

    if let Some(background) = template.background_color.as_deref() {
        match parse_color(background) {
            Some(color) if !color.is_transparent() => page.ops.push(DrawOp::Path(PathOp {
                segments: shapes::rect_path(transform.canvas_rect(template.canvas), 0.0),
                fill: Some(color),
                stroke: None,
            })),
            Some(_) => {}
            None => diag.warn(
                DiagnosticKind::Render,
                format!("unparseable background color '{}'", background),
            ),
        }
    }

    let painter = Painter {
        config,
        transform,
        resolver: ValueResolver::new(data, config),
        loader,
    };

    let mut components: Vec<&Component> = template.components.iter().collect();
    components.sort_by_key(|c| c.position.z);

    for component in components {
        if !component.visible {
            log::debug!("skipping hidden component '{}'", component.id);
            continue;
        }
        diag.enter_component(&component.id);
        if let Some(op) = painter.component(component, diag) {
            page.ops.push(op);
        }
        diag.leave_component();
    }

    log::debug!(
        "rendered template {:?}: {} of {} components drawn",
        template.id,
        page.ops.iter().filter(|op| matches!(op, DrawOp::Component { .. })).count(),
        template.components.len()
    );
    Ok(page)
}

struct Painter<'a> {
    config: &'a EngineConfig,
    transform: PageTransform,
    resolver: ValueResolver<'a>,
    loader: &'a dyn AssetLoader,
}

impl Painter<'_> {
    fn component(&self, component: &Component, diag: &mut Diagnostics) -> Option<DrawOp> {
        if let ComponentKind::Unsupported(tag) = &component.kind {
            diag.warn(
                DiagnosticKind::Render,
                format!("unsupported component type '{}'", tag),
            );
            return None;
        }

        let size = component.size;
        if !(size.width.is_finite() && size.height.is_finite() && size.width > 0.0 && size.height > 0.0) {
            diag.warn(
                DiagnosticKind::Render,
                format!("component size {}x{} is not positive", size.width, size.height),
            );
            return None;
        }

        let position = component.position;
        let rect = self.transform.rect(position.x, position.y, size.width, size.height);
        let style = resolve_style(&component.style, rect, &self.transform, self.config);
        let px = self.transform.length(1.0);

        let mut ops = box_ops(&style, rect);
        match &component.kind {
            ComponentKind::Text(content) => ops.extend(self.text(content, &style, rect, diag)),
            ComponentKind::Image(content) => {
                let url = match (&content.url, &content.field) {
                    (Some(url), _) => Some(url.clone()),
                    (None, Some(field)) => self.resolver.field_text(field, diag),
                    (None, None) => None,
                };
                ops.extend(image::render_image(
                    content,
                    url.as_deref(),
                    rect,
                    px,
                    self.loader,
                    diag,
                ));
            }
            ComponentKind::Shape(content) => {
                ops.extend(shapes::shape_ops(content, rect, style.radius, px, style.opacity))
            }
            ComponentKind::Line(content) => ops.extend(shapes::line_ops(content, rect, px, style.color, diag)),
            ComponentKind::Icon(content) => ops.extend(shapes::icon_ops(content, rect, style.color, diag)),
            ComponentKind::Container => {}
            ComponentKind::Qr(content) => ops.extend(self.qr(content, &style, rect, diag)),
            ComponentKind::Unsupported(_) => return None,
        }

        let rotation = (position.rotation.is_finite() && position.rotation % 360.0 != 0.0).then(|| Rotation {
            center: rect.center(),
            degrees: position.rotation,
        });

        Some(DrawOp::Component {
            id: component.id.clone(),
            rotation,
            ops,
        })
    }

    fn text(&self, content: &TextContent, style: &ResolvedStyle, rect: Rect, diag: &mut Diagnostics) -> Vec<DrawOp> {
        let text = self.resolver.resolve_text(content, diag);
        if text.trim().is_empty() {
            return Vec::new();
        }

        let block = TextBox {
            text: &text,
            rect: rect.inset(style.padding),
            font: style.font,
            size_pt: style.font_size_pt,
            line_height: style.line_height,
            align: style.text_align,
            color: style.color,
        };
        let laid = match self.config.mode {
            RenderMode::Preview if style.auto_fit => layout_autofit(
                &block,
                self.config.min_font_size,
                self.config.max_autofit_iterations,
            ),
            _ => layout_static(
                &block,
                &self.config.locale,
                self.config.numeric_calibration,
                self.config.min_font_size,
            ),
        };
        laid.runs.into_iter().map(DrawOp::Text).collect()
    }

    fn qr(&self, content: &QrContent, style: &ResolvedStyle, rect: Rect, diag: &mut Diagnostics) -> Vec<DrawOp> {
        let value = match (&content.value, &content.field) {
            (Some(value), _) => Some(value.clone()),
            (None, Some(field)) => self.resolver.field_text(field, diag),
            (None, None) => None,
        };
        let Some(value) = value.filter(|v| !v.is_empty()) else {
            diag.warn(DiagnosticKind::Render, "qr code has no value");
            return Vec::new();
        };

        let foreground = content
            .foreground
            .as_deref()
            .and_then(parse_color)
            .unwrap_or(style.color);
        let background = content.background.as_deref().and_then(parse_color);
        match shapes::qr_ops(&value, rect, foreground, background) {
            Ok(ops) => ops,
            Err(e) => {
                diag.warn(DiagnosticKind::Render, format!("qr encoding failed: {}", e));
                Vec::new()
            }
        }
    }
}

/// Background fill and border painted beneath a component's content.
fn box_ops(style: &ResolvedStyle, rect: Rect) -> Vec<DrawOp> {
    if style.background.is_none() && style.border.is_none() {
        return Vec::new();
    }
    vec![DrawOp::Path(PathOp {
        segments: shapes::rect_path(rect, style.radius),
        fill: style.background,
        stroke: style.border.map(|b| Stroke {
            color: b.color,
            width: b.width,
        }),
    })]
}
