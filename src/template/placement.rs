//! Placement of embedded SVG fragments
//!
//! A placeholder rect is anchored at its bottom edge: the fragment is shifted
//! up by its own height so both bottoms line up. The horizontal position is
//! multiplied by the scale factor before the transform list is built.

use crate::error::TemplateError;

/// Offsets and horizontal scale applied when splicing a fragment
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    /// Added to the translate x argument
    pub dx: f64,
    /// Added to the translate y argument
    pub dy: f64,
    /// Horizontal scale factor
    pub scale_x: f64,
}

impl Default for Placement {
    fn default() -> Self {
        Self {
            dx: 0.0,
            dy: 0.0,
            scale_x: 1.0,
        }
    }
}

impl Placement {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set both offsets
    pub fn with_offset(mut self, dx: f64, dy: f64) -> Self {
        self.dx = dx;
        self.dy = dy;
        self
    }

    /// Set the horizontal scale factor
    pub fn with_scale_x(mut self, scale_x: f64) -> Self {
        self.scale_x = scale_x;
        self
    }

    pub(crate) fn validate(&self) -> Result<(), TemplateError> {
        if !self.scale_x.is_finite() || self.scale_x == 0.0 {
            return Err(TemplateError::invalid_arguments(format!(
                "scale_x must be finite and non-zero, got {}",
                self.scale_x
            )));
        }
        if !self.dx.is_finite() || !self.dy.is_finite() {
            return Err(TemplateError::invalid_arguments("offsets must be finite"));
        }
        Ok(())
    }

    /// Translate arguments for a rect at (`rect_x`, `rect_y`) and a fragment of `height`
    pub fn translation(&self, rect_x: f64, rect_y: f64, height: f64) -> (f64, f64) {
        (rect_x * self.scale_x + self.dx, rect_y - height + self.dy)
    }

    /// The `transform` attribute value for the fragment layer
    pub fn transform(&self, rect_x: f64, rect_y: f64, height: f64) -> String {
        let (x, y) = self.translation(rect_x, rect_y, height);
        format!("scale ({}, 1) translate({:?}, {:?})", self.scale_x, x, y)
    }
}

/// Read a length attribute as user units, accepting a `px` suffix
pub fn parse_length(attribute: &str, value: &str) -> Result<f64, TemplateError> {
    let trimmed = value.trim();
    let number = trimmed.strip_suffix("px").unwrap_or(trimmed);
    number
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
        .ok_or_else(|| TemplateError::InvalidNumber {
            attribute: attribute.to_string(),
            value: value.to_string(),
        })
}
