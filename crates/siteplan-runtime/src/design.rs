//! Persisted design records.
//!
//! A record carries the quantity mapping, the derived totals at save time,
//! the mode flag, and (only when manual mode was active) the explicit item
//! order so a reload reproduces the exact placement.

use serde::{Deserialize, Serialize};
use siteplan_core::QuantityConfig;

/// Current design record schema version.
pub const DESIGN_SCHEMA_VERSION: u16 = 1;

/// Stable identifier for saved designs.
///
/// `0` is reserved/invalid so IDs are always non-zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DesignId(u64);

impl DesignId {
    /// Lowest valid design ID.
    pub const MIN: Self = Self(1);

    /// Create a design ID, rejecting 0.
    #[must_use]
    pub const fn new(raw: u64) -> Option<Self> {
        if raw == 0 { None } else { Some(Self(raw)) }
    }

    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }

    #[must_use]
    pub const fn is_valid(self) -> bool {
        self.0 != 0
    }
}

impl std::fmt::Display for DesignId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Hands out monotonically increasing design IDs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DesignIdAllocator {
    next: DesignId,
}

impl DesignIdAllocator {
    #[must_use]
    pub const fn with_next(next: DesignId) -> Self {
        Self { next }
    }

    /// Continue after the largest existing ID.
    #[must_use]
    pub fn after<'a>(existing: impl IntoIterator<Item = &'a DesignId>) -> Self {
        let max = existing.into_iter().map(|id| id.0).max().unwrap_or(0);
        Self {
            next: DesignId(max.saturating_add(1).max(1)),
        }
    }

    #[must_use]
    pub const fn peek(&self) -> DesignId {
        self.next
    }

    pub fn allocate(&mut self) -> DesignId {
        let current = self.next;
        self.next = DesignId(current.0.saturating_add(1));
        current
    }

    /// Make sure future allocations stay above `id`.
    pub fn observe(&mut self, id: DesignId) {
        if id.0 >= self.next.0 {
            self.next = DesignId(id.0.saturating_add(1));
        }
    }
}

impl Default for DesignIdAllocator {
    fn default() -> Self {
        Self::with_next(DesignId::MIN)
    }
}

fn default_schema_version() -> u16 {
    DESIGN_SCHEMA_VERSION
}

/// A named, saved site design.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DesignRecord {
    #[serde(default = "default_schema_version")]
    pub schema_version: u16,
    /// Assigned by the store on first save.
    #[serde(default)]
    pub id: Option<DesignId>,
    pub name: String,
    /// Unix epoch milliseconds, set on first save.
    #[serde(default)]
    pub created_at_ms: Option<u64>,
    pub quantities: QuantityConfig,
    /// USD.
    pub cost: f64,
    /// MWh.
    pub energy: f64,
    /// Vertical extent of the layout, feet.
    pub length_occupied: f64,
    /// Horizontal extent of the layout, feet.
    pub width_occupied: f64,
    pub total_batteries: u32,
    pub total_transformers: u32,
    pub auto_pack: bool,
    /// Item ids in sequence order; present only for manual layouts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manual_order: Option<Vec<String>>,
}

impl DesignRecord {
    /// Land area in square feet.
    #[must_use]
    pub fn land_area(&self) -> f64 {
        self.length_occupied * self.width_occupied
    }
}
