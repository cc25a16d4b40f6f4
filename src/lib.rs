//! Template-to-document rendering for retail posters and price tags.
//!
//! A [`Template`] authored on a pixel canvas is combined with a
//! [`DataContext`] and rendered onto a physical page as a list of drawing
//! operations ([`Page`]). [`pdf::write_pdf`] turns a [`Document`] into bytes.

pub mod assets;
pub mod config;
pub mod dates;
pub mod diagnostics;
pub mod error;
pub mod expr;
pub mod font_metrics;
pub mod format;
pub mod geometry;
pub mod image;
pub mod ops;
pub mod pdf;
pub mod render;
pub mod shapes;
pub mod style;
pub mod svg;
pub mod template;
pub mod text;
pub mod value;

pub use assets::{AssetLoader, DefaultAssetLoader, RasterImage};
pub use config::{EngineConfig, PageSize, RenderMode};
pub use diagnostics::{Diagnostic, DiagnosticKind, Diagnostics};
pub use error::{AssetError, ConfigurationError, EngineError, ExpressionError, PdfError};
pub use ops::{Document, DrawOp, Page};
pub use render::{render_document, render_page, Rendered};
pub use template::{DataContext, FieldValue, Template};
