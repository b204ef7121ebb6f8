#![forbid(unsafe_code)]

//! Site layout: shelf packing of rectangular units into bounded rows.
//!
//! This crate provides:
//!
//! - [`LayoutEngine`] - places an ordered list of [`PlacementItem`]s into rows
//!   under one of two [`LayoutMode`]s
//! - [`sequence`] - the reorderable item order that drives manual mode
//! - [`viewport`] - read-side filtering of placements for large layouts
//!
//! # Modes
//!
//! | Mode     | Order                              | Row selection                  |
//! |----------|------------------------------------|--------------------------------|
//! | `Auto`   | Sorted by `(length, width)` desc   | First existing row that fits   |
//! | `Manual` | Sequence order, no sorting         | Current row, wrap when full    |
//!
//! Row pitch is uniform: the widest unit in the catalog plus the row gap.
//! Rows never shrink to their contents.
//!
//! # Example
//!
//! ```
//! use siteplan_core::{Catalog, LayoutConfig, QuantityConfig};
//! use siteplan_layout::{LayoutEngine, LayoutMode, sequence::ItemSequence};
//!
//! let catalog = Catalog::standard();
//! let quantities = QuantityConfig::from_pairs(&catalog, [("megapack-xl", 3)]).unwrap();
//! let sequence = ItemSequence::expand(&catalog, &quantities);
//!
//! let engine = LayoutEngine::new(&catalog, &LayoutConfig::default());
//! let placed = engine.compute(sequence.items(), LayoutMode::Manual);
//! assert_eq!(placed.len(), 4); // three batteries and one derived transformer
//! assert_eq!(placed[2].row, 1);
//! ```

pub mod sequence;
pub mod viewport;

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use siteplan_core::{Catalog, LayoutConfig, UnitType};

pub use sequence::{ItemSequence, NoopReason, SequenceOperation, SequenceOutcome};
pub use viewport::{CanvasSize, ViewportFilter};

/// Placement policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutMode {
    /// Sorted first-fit shelf packing.
    #[default]
    Auto,
    /// Order-preserving shelf packing.
    Manual,
}

impl LayoutMode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Manual => "manual",
        }
    }
}

impl fmt::Display for LayoutMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One unit instance awaiting placement.
///
/// `id` is stable across reorders; `unit` is shared with the catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacementItem {
    pub id: String,
    pub unit: Arc<UnitType>,
}

impl PlacementItem {
    #[must_use]
    pub fn new(id: impl Into<String>, unit: Arc<UnitType>) -> Self {
        Self {
            id: id.into(),
            unit,
        }
    }
}

/// A positioned unit. Coordinates are feet from the top-left origin.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedBattery {
    pub id: String,
    pub unit: Arc<UnitType>,
    pub x: f64,
    pub y: f64,
    /// Zero-based row index.
    pub row: usize,
}

/// Auto-pack scratch row.
#[derive(Debug, Clone, Copy)]
struct Row {
    /// Placed lengths plus one gap per unit.
    used_width: f64,
}

/// Shelf-packing layout engine.
///
/// Pure and deterministic: the same items and mode always produce the same
/// placements, and every input item yields exactly one output placement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutEngine {
    max_row_width: f64,
    col_gap: f64,
    row_pitch: f64,
}

impl LayoutEngine {
    /// Capture row bounds from the config and row pitch from the catalog.
    #[must_use]
    pub fn new(catalog: &Catalog, config: &LayoutConfig) -> Self {
        Self::with_params(
            config.max_row_width,
            config.col_gap,
            catalog.max_width() + config.row_gap,
        )
    }

    /// Build from raw parameters.
    #[must_use]
    pub const fn with_params(max_row_width: f64, col_gap: f64, row_pitch: f64) -> Self {
        Self {
            max_row_width,
            col_gap,
            row_pitch,
        }
    }

    #[must_use]
    pub const fn max_row_width(&self) -> f64 {
        self.max_row_width
    }

    #[must_use]
    pub const fn col_gap(&self) -> f64 {
        self.col_gap
    }

    /// Vertical distance between consecutive rows.
    #[must_use]
    pub const fn row_pitch(&self) -> f64 {
        self.row_pitch
    }

    /// Place every item under the given mode.
    #[must_use]
    pub fn compute(&self, items: &[PlacementItem], mode: LayoutMode) -> Vec<PlacedBattery> {
        #[cfg(feature = "tracing")]
        let span = tracing::debug_span!(
            "compute_layout",
            mode = mode.as_str(),
            items = items.len(),
            rows = tracing::field::Empty
        )
        .entered();

        let placed = match mode {
            LayoutMode::Auto => self.auto_pack(items),
            LayoutMode::Manual => self.manual(items),
        };

        #[cfg(feature = "tracing")]
        {
            let rows = row_count(&placed);
            let _ = span.record("rows", rows);
            tracing::trace!(rows, "layout computed");
        }

        placed
    }

    /// Sorted first-fit: longest first (ties by widest), each into the first
    /// row in creation order with room for `length + col_gap`.
    ///
    /// Output follows the sorted order.
    #[must_use]
    pub fn auto_pack(&self, items: &[PlacementItem]) -> Vec<PlacedBattery> {
        let mut sorted: Vec<&PlacementItem> = items.iter().collect();
        sorted.sort_by(|a, b| compare_footprint_desc(&a.unit, &b.unit));

        let mut rows: Vec<Row> = Vec::new();
        let mut placed = Vec::with_capacity(items.len());

        for item in sorted {
            let advance = item.unit.length + self.col_gap;
            let row_index = match rows
                .iter()
                .position(|row| row.used_width + advance <= self.max_row_width)
            {
                Some(index) => index,
                None => {
                    rows.push(Row { used_width: 0.0 });
                    rows.len() - 1
                }
            };

            let row = &mut rows[row_index];
            placed.push(PlacedBattery {
                id: item.id.clone(),
                unit: Arc::clone(&item.unit),
                x: row.used_width,
                y: row_index as f64 * self.row_pitch,
                row: row_index,
            });
            row.used_width += advance;
        }

        placed
    }

    /// Order-preserving: fill the current row left to right, wrapping when the
    /// next unit would cross `max_row_width`.
    ///
    /// A unit longer than the row is still placed at `x = 0` of its own row;
    /// wrapping only happens when the current row already holds something.
    #[must_use]
    pub fn manual(&self, items: &[PlacementItem]) -> Vec<PlacedBattery> {
        let mut placed = Vec::with_capacity(items.len());
        let mut current_x = 0.0_f64;
        let mut current_y = 0.0_f64;
        let mut current_row = 0_usize;

        for item in items {
            let length = item.unit.length;
            if current_x + length > self.max_row_width && current_x > 0.0 {
                current_row += 1;
                current_x = 0.0;
                current_y = current_row as f64 * self.row_pitch;
            }

            placed.push(PlacedBattery {
                id: item.id.clone(),
                unit: Arc::clone(&item.unit),
                x: current_x,
                y: current_y,
                row: current_row,
            });
            current_x += length + self.col_gap;
        }

        placed
    }
}

/// Compute placements with an engine built from `catalog` and `config`.
#[must_use]
pub fn compute_layout(
    catalog: &Catalog,
    config: &LayoutConfig,
    items: &[PlacementItem],
    mode: LayoutMode,
) -> Vec<PlacedBattery> {
    LayoutEngine::new(catalog, config).compute(items, mode)
}

fn compare_footprint_desc(a: &UnitType, b: &UnitType) -> Ordering {
    b.length
        .total_cmp(&a.length)
        .then_with(|| b.width.total_cmp(&a.width))
}

/// Number of rows used by a set of placements.
#[must_use]
pub fn row_count(placements: &[PlacedBattery]) -> usize {
    placements
        .iter()
        .map(|placed| placed.row + 1)
        .max()
        .unwrap_or(0)
}

/// Bounding box of a layout, in feet.
///
/// `length` is the vertical extent (`max(y + unit.width)`), `width` the
/// horizontal extent (`max(x + unit.length)`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Footprint {
    pub length: f64,
    pub width: f64,
}

impl Footprint {
    #[must_use]
    pub fn from_placements(placements: &[PlacedBattery]) -> Self {
        placements
            .iter()
            .fold(Self::default(), |acc, placed| Self {
                length: acc.length.max(placed.y + placed.unit.width),
                width: acc.width.max(placed.x + placed.unit.length),
            })
    }

    /// Land area in square feet.
    #[must_use]
    pub fn area(&self) -> f64 {
        self.length * self.width
    }
}
