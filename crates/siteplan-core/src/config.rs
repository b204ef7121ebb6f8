//! Layout and viewport constants.
//!
//! Defaults match the stock site planner: 100 ft rows, 2 ft gaps, 5 px per
//! foot, a 600 px viewport with a 200 px buffer on each side.

use std::fmt;

/// External constants consumed by the layout engine, viewport filter, and
/// planner session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutConfig {
    /// Maximum total length per row, feet.
    pub max_row_width: f64,
    /// Horizontal gap after each unit, feet.
    pub col_gap: f64,
    /// Vertical gap between rows, feet.
    pub row_gap: f64,
    /// Pixels per foot.
    pub scale: f64,
    /// Pixel offset of the placement origin inside the canvas.
    pub canvas_padding: f64,
    /// Visible viewport height, pixels.
    pub viewport_height: f64,
    /// Extra pixels kept above and below the viewport.
    pub viewport_buffer: f64,
    /// Placement counts below this skip virtualization.
    pub virtualize_threshold: usize,
    /// Item counts at or above this force auto-pack.
    pub auto_pack_threshold: usize,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            max_row_width: 100.0,
            col_gap: 2.0,
            row_gap: 2.0,
            scale: 5.0,
            canvas_padding: 30.0,
            viewport_height: 600.0,
            viewport_buffer: 200.0,
            virtualize_threshold: 500,
            auto_pack_threshold: 1000,
        }
    }
}

impl LayoutConfig {
    #[must_use]
    pub fn with_max_row_width(mut self, max_row_width: f64) -> Self {
        self.max_row_width = max_row_width;
        self
    }

    #[must_use]
    pub fn with_gaps(mut self, col_gap: f64, row_gap: f64) -> Self {
        self.col_gap = col_gap;
        self.row_gap = row_gap;
        self
    }

    #[must_use]
    pub fn with_viewport(mut self, height: f64, buffer: f64) -> Self {
        self.viewport_height = height;
        self.viewport_buffer = buffer;
        self
    }

    #[must_use]
    pub fn with_thresholds(mut self, virtualize: usize, auto_pack: usize) -> Self {
        self.virtualize_threshold = virtualize;
        self.auto_pack_threshold = auto_pack;
        self
    }

    /// Reject values the layout math cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("max_row_width", self.max_row_width),
            ("col_gap", self.col_gap),
            ("row_gap", self.row_gap),
            ("scale", self.scale),
            ("canvas_padding", self.canvas_padding),
            ("viewport_height", self.viewport_height),
            ("viewport_buffer", self.viewport_buffer),
        ] {
            if !value.is_finite() {
                return Err(ConfigError::NonFinite { field });
            }
        }
        if self.max_row_width <= 0.0 {
            return Err(ConfigError::NonPositive {
                field: "max_row_width",
                value: self.max_row_width,
            });
        }
        if self.scale <= 0.0 {
            return Err(ConfigError::NonPositive {
                field: "scale",
                value: self.scale,
            });
        }
        for (field, value) in [
            ("col_gap", self.col_gap),
            ("row_gap", self.row_gap),
            ("viewport_buffer", self.viewport_buffer),
        ] {
            if value < 0.0 {
                return Err(ConfigError::Negative { field, value });
            }
        }
        Ok(())
    }
}

/// Invalid layout configuration.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    NonFinite { field: &'static str },
    NonPositive { field: &'static str, value: f64 },
    Negative { field: &'static str, value: f64 },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NonFinite { field } => write!(f, "{field} must be finite"),
            Self::NonPositive { field, value } => {
                write!(f, "{field} must be positive (got {value})")
            }
            Self::Negative { field, value } => {
                write!(f, "{field} must not be negative (got {value})")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = LayoutConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.max_row_width, 100.0);
        assert_eq!(config.auto_pack_threshold, 1000);
        assert_eq!(config.virtualize_threshold, 500);
    }

    #[test]
    fn builder_methods_chain() {
        let config = LayoutConfig::default()
            .with_max_row_width(30.0)
            .with_gaps(1.0, 3.0)
            .with_viewport(300.0, 50.0)
            .with_thresholds(10, 20);
        assert_eq!(config.max_row_width, 30.0);
        assert_eq!((config.col_gap, config.row_gap), (1.0, 3.0));
        assert_eq!((config.viewport_height, config.viewport_buffer), (300.0, 50.0));
        assert_eq!(
            (config.virtualize_threshold, config.auto_pack_threshold),
            (10, 20)
        );
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert_eq!(
            LayoutConfig::default().with_max_row_width(0.0).validate(),
            Err(ConfigError::NonPositive {
                field: "max_row_width",
                value: 0.0
            })
        );
        assert_eq!(
            LayoutConfig::default().with_gaps(-1.0, 2.0).validate(),
            Err(ConfigError::Negative {
                field: "col_gap",
                value: -1.0
            })
        );
        assert_eq!(
            LayoutConfig::default()
                .with_max_row_width(f64::INFINITY)
                .validate(),
            Err(ConfigError::NonFinite {
                field: "max_row_width"
            })
        );
    }
}
