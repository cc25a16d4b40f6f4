//! Engine configuration.
//!
//! Every tunable constant of the pipeline lives here so that a render call is a
//! pure function of `(Template, DataContext, EngineConfig)`.

use serde::Deserialize;
use std::path::Path;

use crate::error::{ConfigurationError, EngineError};
use crate::format::NumberLocale;

/// Millimetres per CSS pixel at 96 dpi.
pub const PX_TO_MM: f32 = 25.4 / 96.0;
/// Points per CSS pixel at 96 dpi.
pub const PX_TO_PT: f32 = 0.75;
/// Millimetres per point.
pub const PT_TO_MM: f32 = 0.352_777_78;

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum RenderMode {
    /// Interactive preview: autofit text, date ranges never collapse.
    Preview,
    /// Print output: static text layout, equal dates collapse to one.
    #[default]
    Print,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PageSize {
    #[serde(alias = "width_mm")]
    pub width_mm: f32,
    #[serde(alias = "height_mm")]
    pub height_mm: f32,
}

impl PageSize {
    pub fn a4_portrait() -> Self {
        PageSize {
            width_mm: 210.0,
            height_mm: 297.0,
        }
    }

    pub fn a4_landscape() -> Self {
        PageSize {
            width_mm: 297.0,
            height_mm: 210.0,
        }
    }
}

impl Default for PageSize {
    fn default() -> Self {
        PageSize::a4_portrait()
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineConfig {
    pub page: PageSize,
    pub mode: RenderMode,
    #[serde(alias = "px_to_mm")]
    pub px_to_mm: f32,
    #[serde(alias = "px_to_pt")]
    pub px_to_pt: f32,
    #[serde(alias = "min_font_size")]
    pub min_font_size: f32,
    #[serde(alias = "max_autofit_iterations")]
    pub max_autofit_iterations: u32,
    #[serde(alias = "line_height")]
    pub line_height: f32,
    /// Empirical shrink applied after proportional fitting of numeric labels.
    /// Renderer and font dependent; re-measure when the backend changes.
    #[serde(alias = "numeric_calibration")]
    pub numeric_calibration: f32,
    #[serde(alias = "default_font_size_px")]
    pub default_font_size_px: f32,
    #[serde(alias = "date_separator")]
    pub date_separator: String,
    pub locale: NumberLocale,
    #[serde(alias = "asset_timeout_ms")]
    pub asset_timeout_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            page: PageSize::default(),
            mode: RenderMode::default(),
            px_to_mm: PX_TO_MM,
            px_to_pt: PX_TO_PT,
            min_font_size: 6.0,
            max_autofit_iterations: 40,
            line_height: 1.2,
            numeric_calibration: 0.96,
            default_font_size_px: 16.0,
            date_separator: "-".to_string(),
            locale: NumberLocale::default(),
            asset_timeout_ms: 5_000,
        }
    }
}

impl EngineConfig {
    pub fn from_json_str(json: &str) -> Result<Self, EngineError> {
        let config: EngineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: &Path) -> Result<Self, EngineError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn with_page(mut self, page: PageSize) -> Self {
        self.page = page;
        self
    }

    pub fn with_mode(mut self, mode: RenderMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigurationError> {
        let PageSize {
            width_mm,
            height_mm,
        } = self.page;
        if !(positive(width_mm) && positive(height_mm)) {
            return Err(ConfigurationError::Page {
                width: width_mm,
                height: height_mm,
            });
        }
        check_positive("pxToMm", self.px_to_mm)?;
        check_positive("pxToPt", self.px_to_pt)?;
        check_positive("minFontSize", self.min_font_size)?;
        check_positive("lineHeight", self.line_height)?;
        check_positive("defaultFontSizePx", self.default_font_size_px)?;
        if !(positive(self.numeric_calibration) && self.numeric_calibration <= 1.0) {
            return Err(ConfigurationError::Setting {
                name: "numericCalibration",
                message: format!("must be in (0, 1], got {}", self.numeric_calibration),
            });
        }
        if self.max_autofit_iterations == 0 {
            return Err(ConfigurationError::Setting {
                name: "maxAutofitIterations",
                message: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

fn positive(value: f32) -> bool {
    value.is_finite() && value > 0.0
}

fn check_positive(name: &'static str, value: f32) -> Result<(), ConfigurationError> {
    if positive(value) {
        Ok(())
    } else {
        Err(ConfigurationError::Setting {
            name,
            message: format!("must be a positive number, got {}", value),
        })
    }
}
