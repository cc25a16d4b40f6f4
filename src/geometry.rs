//! Logical canvas (px) to physical page (mm) mapping.
//!
//! The canvas is scaled uniformly by the largest factor that keeps it entirely
//! on the page, then centered. The transform is computed once per page and
//! applied to every component.

use crate::error::ConfigurationError;
use crate::ops::{Point, Rect};
use crate::template::CanvasSize;
use crate::config::PageSize;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageTransform {
    /// Dimensionless page scale applied on top of the unit conversion.
    pub scale: f32,
    pub offset_x: f32,
    pub offset_y: f32,
    /// Physical units per logical pixel before scaling.
    pub unit: f32,
}

impl PageTransform {
    /// `scale = min(pw / (cw·k), ph / (ch·k))`, centered on the page.
    pub fn fit(canvas: CanvasSize, page: PageSize, unit: f32) -> Result<Self, ConfigurationError> {
        if !(positive(canvas.width) && positive(canvas.height)) {
            return Err(ConfigurationError::Canvas {
                width: canvas.width,
                height: canvas.height,
            });
        }
        if !(positive(page.width_mm) && positive(page.height_mm)) {
            return Err(ConfigurationError::Page {
                width: page.width_mm,
                height: page.height_mm,
            });
        }
        if !positive(unit) {
            return Err(ConfigurationError::Setting {
                name: "pxToMm",
                message: format!("must be a positive number, got {}", unit),
            });
        }

        let scale_x = page.width_mm / (canvas.width * unit);
        let scale_y = page.height_mm / (canvas.height * unit);
        let scale = scale_x.min(scale_y);

        Ok(PageTransform {
            scale,
            offset_x: (page.width_mm - canvas.width * unit * scale) / 2.0,
            offset_y: (page.height_mm - canvas.height * unit * scale) / 2.0,
            unit,
        })
    }

    /// Physical length of `px` logical pixels.
    pub fn length(&self, px: f32) -> f32 {
        px * self.unit * self.scale
    }

    pub fn point(&self, x: f32, y: f32) -> Point {
        Point::new(self.offset_x + self.length(x), self.offset_y + self.length(y))
    }

    pub fn rect(&self, x: f32, y: f32, width: f32, height: f32) -> Rect {
        let origin = self.point(x, y);
        Rect::new(origin.x, origin.y, self.length(width), self.length(height))
    }

    /// The page-space area covered by the whole canvas.
    pub fn canvas_rect(&self, canvas: CanvasSize) -> Rect {
        self.rect(0.0, 0.0, canvas.width, canvas.height)
    }
}

fn positive(value: f32) -> bool {
    value.is_finite() && value > 0.0
}
