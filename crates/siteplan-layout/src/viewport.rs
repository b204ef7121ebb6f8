//! Viewport virtualization for large layouts.
//!
//! Filtering is a pure read-side projection: it selects which placements to
//! draw for a scroll offset and never changes coordinates or rows. Below the
//! virtualization threshold every placement is returned.

use siteplan_core::LayoutConfig;

use crate::{Footprint, PlacedBattery};

/// Minimum canvas height in pixels.
const MIN_CANVAS_HEIGHT: f64 = 400.0;

/// Extra feet of canvas below the last row.
const CANVAS_TAIL_FEET: f64 = 10.0;

/// Pixel dimensions of the drawing canvas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CanvasSize {
    pub width: f64,
    pub height: f64,
}

/// Selects placements intersecting the viewport (plus buffer).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportFilter {
    scale: f64,
    padding: f64,
    height: f64,
    buffer: f64,
    threshold: usize,
    max_row_width: f64,
}

impl ViewportFilter {
    #[must_use]
    pub fn from_config(config: &LayoutConfig) -> Self {
        Self {
            scale: config.scale,
            padding: config.canvas_padding,
            height: config.viewport_height,
            buffer: config.viewport_buffer,
            threshold: config.virtualize_threshold,
            max_row_width: config.max_row_width,
        }
    }

    /// Whether a layout of `count` placements is filtered at all.
    #[must_use]
    pub const fn is_virtualized(&self, count: usize) -> bool {
        count >= self.threshold
    }

    /// Pixel span `(top, bottom)` of a placement.
    #[must_use]
    pub fn vertical_extent(&self, placed: &PlacedBattery) -> (f64, f64) {
        let top = self.padding + placed.y * self.scale;
        (top, top + placed.unit.width * self.scale)
    }

    /// Placements to draw at `scroll_top`, in layout order.
    #[must_use]
    pub fn visible<'a>(
        &self,
        placements: &'a [PlacedBattery],
        scroll_top: f64,
    ) -> Vec<&'a PlacedBattery> {
        if !self.is_virtualized(placements.len()) {
            return placements.iter().collect();
        }

        let window_top = scroll_top - self.buffer;
        let window_bottom = scroll_top + self.height + self.buffer;
        placements
            .iter()
            .filter(|placed| {
                let (top, bottom) = self.vertical_extent(placed);
                bottom >= window_top && top <= window_bottom
            })
            .collect()
    }

    /// Canvas needed to draw a layout with the given footprint.
    #[must_use]
    pub fn canvas_size(&self, footprint: &Footprint) -> CanvasSize {
        let height = ((footprint.length + CANVAS_TAIL_FEET) * self.scale + 2.0 * self.padding)
            .max(MIN_CANVAS_HEIGHT);
        CanvasSize {
            width: self.max_row_width * self.scale + 2.0 * self.padding,
            height,
        }
    }
}
