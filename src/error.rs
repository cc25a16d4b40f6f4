//! # Error Types
//!
//! Only [`ConfigurationError`] aborts a render call. Every other error in this
//! module is caught at the component boundary and turned into a diagnostic plus
//! placeholder output.

use thiserror::Error;

/// Invalid input dimensions or engine settings. Rejects the render call before
/// any page is produced.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigurationError {
    #[error("canvas dimensions must be positive, got {width}x{height}")]
    Canvas { width: f32, height: f32 },

    #[error("page dimensions must be positive, got {width}x{height}")]
    Page { width: f32, height: f32 },

    #[error("invalid setting '{name}': {message}")]
    Setting { name: &'static str, message: String },

    #[error("invalid data context: {0}")]
    Data(String),
}

/// A calculated expression was rejected or could not be evaluated.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExpressionError {
    #[error("expression is empty")]
    Empty,

    #[error("character '{0}' is not allowed in an expression")]
    Forbidden(char),

    #[error("invalid number literal '{0}'")]
    InvalidNumber(String),

    #[error("unexpected token at position {0}")]
    UnexpectedToken(usize),

    #[error("unexpected end of expression")]
    UnexpectedEnd,

    #[error("expression nests deeper than {0} levels")]
    TooDeep(usize),

    #[error("expression evaluated to a non-finite value")]
    NonFinite,
}

/// Image retrieval or decoding failed.
#[derive(Debug, Error)]
pub enum AssetError {
    #[error("empty image source")]
    EmptySource,

    #[error("invalid data URL")]
    InvalidDataUrl,

    #[error("base64 decode error: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("fetch failed for {url}: {message}")]
    Fetch { url: String, message: String },

    #[error("failed to read asset: {0}")]
    Io(#[from] std::io::Error),

    #[error("image data is empty")]
    EmptyData,

    #[error("failed to decode image: {0}")]
    Decode(#[from] ::image::ImageError),
}

/// Failure while writing a document through the PDF backend.
#[derive(Debug, Error)]
pub enum PdfError {
    #[error("document has no pages")]
    EmptyDocument,

    #[error("pdf backend error: {0}")]
    Backend(#[from] printpdf::Error),

    #[error("failed to save pdf: {0}")]
    Save(String),
}

/// Top-level error for the command-line front end.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    Pdf(#[from] PdfError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Usage(String),
}
