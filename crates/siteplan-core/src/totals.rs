//! Aggregate cost and energy over a quantity mapping.

use serde::{Deserialize, Serialize};

use crate::catalog::Catalog;
use crate::quantity::QuantityConfig;

/// Derived site totals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SiteTotals {
    /// USD.
    pub cost: f64,
    /// MWh, net of transformer consumption.
    pub energy: f64,
    pub batteries: u32,
    pub transformers: u32,
}

/// One unit type's share of the totals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitBreakdown {
    pub id: String,
    pub name: String,
    pub count: u32,
    pub unit_cost: f64,
    pub unit_energy: f64,
    pub cost: f64,
    pub energy: f64,
}

impl SiteTotals {
    /// Reduce the mapping against the catalog. Unknown ids contribute nothing.
    #[must_use]
    pub fn compute(catalog: &Catalog, quantities: &QuantityConfig) -> Self {
        let mut totals = Self::default();
        for line in Self::breakdown(catalog, quantities) {
            totals.cost += line.cost;
            totals.energy += line.energy;
            if catalog.get(&line.id).is_some_and(|unit| unit.is_transformer()) {
                totals.transformers = totals.transformers.saturating_add(line.count);
            } else {
                totals.batteries = totals.batteries.saturating_add(line.count);
            }
        }
        totals
    }

    /// Per-unit lines in catalog order, skipping unit types with no units.
    #[must_use]
    pub fn breakdown(catalog: &Catalog, quantities: &QuantityConfig) -> Vec<UnitBreakdown> {
        catalog
            .iter()
            .filter_map(|unit| {
                let count = quantities.get(&unit.id);
                (count > 0).then(|| UnitBreakdown {
                    id: unit.id.clone(),
                    name: unit.name.clone(),
                    count,
                    unit_cost: unit.cost,
                    unit_energy: unit.energy,
                    cost: f64::from(count) * unit.cost,
                    energy: f64::from(count) * unit.energy,
                })
            })
            .collect()
    }
}
