#![forbid(unsafe_code)]

//! Core: unit catalog, quantity configuration, derived totals, and layout constants.
//!
//! - [`Catalog`] - immutable registry of placeable [`UnitType`]s
//! - [`QuantityConfig`] - per-unit quantities with the transformer derivation rule
//! - [`SiteTotals`] - cost and energy aggregation over a quantity mapping
//! - [`LayoutConfig`] - row width, gaps, viewport and mode thresholds

pub mod catalog;
pub mod config;
pub mod quantity;
pub mod totals;

pub use catalog::{Catalog, CatalogError, UnitKind, UnitType};
pub use config::{ConfigError, LayoutConfig};
pub use quantity::{MAX_QUANTITY_PER_UNIT, QuantityConfig, QuantityError};
pub use totals::{SiteTotals, UnitBreakdown};
