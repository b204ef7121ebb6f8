//! Interactive planning session.
//!
//! A [`PlannerSession`] is the single owner of the mutable planning state:
//! the quantity mapping, the item sequence derived from it, the auto-pack
//! preference and the current placements. Every accepted mutation
//! recomputes placements synchronously before returning, so readers never
//! observe a stale layout.
//!
//! Quantity edits re-expand the sequence wholesale. Any manual order is
//! discarded.

use std::fmt;
use std::sync::Arc;

use siteplan_core::{Catalog, ConfigError, LayoutConfig, QuantityConfig, QuantityError, SiteTotals};
use siteplan_layout::{
    CanvasSize, Footprint, ItemSequence, LayoutEngine, LayoutMode, NoopReason, PlacedBattery,
    SequenceOperation, SequenceOutcome, ViewportFilter, row_count,
};

use crate::design::{DESIGN_SCHEMA_VERSION, DesignRecord};

/// Errors from session construction and edits.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionError {
    Config(ConfigError),
    Quantity(QuantityError),
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(e) => write!(f, "invalid layout config: {e}"),
            Self::Quantity(e) => write!(f, "invalid quantity: {e}"),
        }
    }
}

impl std::error::Error for SessionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Config(e) => Some(e),
            Self::Quantity(e) => Some(e),
        }
    }
}

impl From<ConfigError> for SessionError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

impl From<QuantityError> for SessionError {
    fn from(e: QuantityError) -> Self {
        Self::Quantity(e)
    }
}

/// Planning state for one site.
#[derive(Debug, Clone)]
pub struct PlannerSession {
    catalog: Arc<Catalog>,
    config: LayoutConfig,
    engine: LayoutEngine,
    viewport: ViewportFilter,
    quantities: QuantityConfig,
    sequence: ItemSequence,
    prefer_auto: bool,
    scroll_top: f64,
    placements: Vec<PlacedBattery>,
}

impl PlannerSession {
    /// Empty session with auto-pack preferred.
    pub fn new(catalog: Arc<Catalog>, config: LayoutConfig) -> Result<Self, SessionError> {
        config.validate()?;
        let engine = LayoutEngine::new(&catalog, &config);
        let viewport = ViewportFilter::from_config(&config);
        Ok(Self {
            catalog,
            config,
            engine,
            viewport,
            quantities: QuantityConfig::new(),
            sequence: ItemSequence::default(),
            prefer_auto: true,
            scroll_top: 0.0,
            placements: Vec::new(),
        })
    }

    /// Restore a saved design.
    ///
    /// A stored manual order is replayed onto the freshly expanded sequence;
    /// ids that no longer exist are skipped.
    pub fn from_design(
        catalog: Arc<Catalog>,
        config: LayoutConfig,
        record: &DesignRecord,
    ) -> Result<Self, SessionError> {
        let mut session = Self::new(catalog, config)?;
        let quantities = QuantityConfig::from_pairs(
            &session.catalog,
            record.quantities.iter().map(|(id, qty)| (id.to_string(), qty)),
        )?;
        session.prefer_auto = record.auto_pack;
        session.quantities = quantities;
        session.sequence = ItemSequence::expand(&session.catalog, &session.quantities);

        if let Some(order) = &record.manual_order {
            let matched = session.sequence.apply_order(order);
            if matched != order.len() {
                tracing::warn!(
                    design = %record.name,
                    stored = order.len(),
                    matched,
                    "stored order no longer matches quantities"
                );
            }
        }
        session.recompute();
        Ok(session)
    }

    // ── Quantities ───────────────────────────────────────────────────────

    /// Set one unit's quantity. Returns the stored (clamped, derived) value.
    pub fn set_quantity(&mut self, id: &str, quantity: u32) -> Result<u32, SessionError> {
        let stored = self.quantities.set(&self.catalog, id, quantity)?;
        self.reexpand();
        Ok(stored)
    }

    /// Replace the whole mapping. Counts are clamped and transformers
    /// re-derived.
    pub fn replace_quantities(&mut self, mut quantities: QuantityConfig) -> Result<(), SessionError> {
        if let Some((id, _)) = quantities.iter().find(|(id, _)| !self.catalog.contains(id)) {
            return Err(QuantityError::UnknownUnit { id: id.to_string() }.into());
        }
        quantities.clamp();
        quantities.derive_transformers(&self.catalog);
        self.quantities = quantities;
        self.reexpand();
        Ok(())
    }

    /// Clear every quantity.
    pub fn reset(&mut self) {
        self.quantities.clear();
        self.scroll_top = 0.0;
        self.reexpand();
    }

    #[must_use]
    pub fn quantities(&self) -> &QuantityConfig {
        &self.quantities
    }

    fn reexpand(&mut self) {
        self.sequence = ItemSequence::expand(&self.catalog, &self.quantities);
        self.recompute();
    }

    // ── Mode ─────────────────────────────────────────────────────────────

    pub fn set_auto_pack(&mut self, enabled: bool) {
        if self.prefer_auto == enabled {
            return;
        }
        self.prefer_auto = enabled;
        self.recompute();
    }

    /// The user's preference, which large layouts override.
    #[must_use]
    pub const fn auto_pack_preferred(&self) -> bool {
        self.prefer_auto
    }

    /// Auto when preferred or when the item count reaches the auto-pack
    /// threshold.
    #[must_use]
    pub fn effective_mode(&self) -> LayoutMode {
        if self.prefer_auto || self.is_auto_forced() {
            LayoutMode::Auto
        } else {
            LayoutMode::Manual
        }
    }

    /// Whether the item count alone forces auto mode.
    #[must_use]
    pub fn is_auto_forced(&self) -> bool {
        self.sequence.len() >= self.config.auto_pack_threshold
    }

    #[must_use]
    pub fn reorder_enabled(&self) -> bool {
        self.effective_mode() == LayoutMode::Manual
    }

    // ── Reordering ───────────────────────────────────────────────────────

    pub fn move_to_position(&mut self, source: &str, target: &str) -> SequenceOutcome {
        self.apply(&SequenceOperation::MoveToPosition {
            source: source.to_string(),
            target: target.to_string(),
        })
    }

    pub fn move_to_end(&mut self, source: &str) -> SequenceOutcome {
        self.apply(&SequenceOperation::MoveToEnd {
            source: source.to_string(),
        })
    }

    /// Apply a reorder, recomputing placements if anything moved.
    pub fn apply(&mut self, operation: &SequenceOperation) -> SequenceOutcome {
        if !self.reorder_enabled() {
            return SequenceOutcome::Unchanged(NoopReason::Locked);
        }
        let outcome = self.sequence.apply(operation);
        match outcome {
            SequenceOutcome::Moved { from, to } => {
                tracing::debug!(from, to, "sequence reordered");
                self.recompute();
            }
            SequenceOutcome::Unchanged(reason) => {
                tracing::debug!(?reason, ?operation, "reorder ignored");
            }
        }
        outcome
    }

    #[must_use]
    pub fn sequence(&self) -> &ItemSequence {
        &self.sequence
    }

    // ── Layout ───────────────────────────────────────────────────────────

    fn recompute(&mut self) {
        let mode = self.effective_mode();
        self.placements = self.engine.compute(self.sequence.items(), mode);
        tracing::debug!(
            mode = mode.as_str(),
            items = self.placements.len(),
            rows = row_count(&self.placements),
            "layout recomputed"
        );
    }

    #[must_use]
    pub fn placements(&self) -> &[PlacedBattery] {
        &self.placements
    }

    #[must_use]
    pub fn footprint(&self) -> Footprint {
        Footprint::from_placements(&self.placements)
    }

    #[must_use]
    pub fn row_count(&self) -> usize {
        row_count(&self.placements)
    }

    #[must_use]
    pub fn totals(&self) -> SiteTotals {
        SiteTotals::compute(&self.catalog, &self.quantities)
    }

    #[must_use]
    pub fn canvas_size(&self) -> CanvasSize {
        self.viewport.canvas_size(&self.footprint())
    }

    /// Pixel scroll offset; negative values clamp to zero.
    pub fn set_scroll_top(&mut self, scroll_top: f64) {
        self.scroll_top = if scroll_top.is_finite() {
            scroll_top.max(0.0)
        } else {
            0.0
        };
    }

    #[must_use]
    pub const fn scroll_top(&self) -> f64 {
        self.scroll_top
    }

    /// Placements to draw at the current scroll offset.
    #[must_use]
    pub fn visible(&self) -> Vec<&PlacedBattery> {
        self.viewport.visible(&self.placements, self.scroll_top)
    }

    #[must_use]
    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    #[must_use]
    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    // ── Persistence ──────────────────────────────────────────────────────

    /// Snapshot as an unsaved design record.
    #[must_use]
    pub fn to_design(&self, name: impl Into<String>) -> DesignRecord {
        let totals = self.totals();
        let footprint = self.footprint();
        let mode = self.effective_mode();
        DesignRecord {
            schema_version: DESIGN_SCHEMA_VERSION,
            id: None,
            name: name.into(),
            created_at_ms: None,
            quantities: self.quantities.clone(),
            cost: totals.cost,
            energy: totals.energy,
            length_occupied: footprint.length,
            width_occupied: footprint.width,
            total_batteries: totals.batteries,
            total_transformers: totals.transformers,
            auto_pack: mode == LayoutMode::Auto,
            manual_order: (mode == LayoutMode::Manual)
                .then(|| self.sequence.ids().map(str::to_string).collect()),
        }
    }
}
