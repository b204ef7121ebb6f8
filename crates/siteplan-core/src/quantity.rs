//! Per-unit quantity configuration.
//!
//! Quantities are edited one unit at a time and clamped to
//! [`MAX_QUANTITY_PER_UNIT`]. The primary transformer's quantity is never an
//! independent input: after every edit it is re-derived as half the battery
//! count, rounded down. The derived count is not capped.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::catalog::Catalog;

/// Upper bound on any single unit type's quantity.
pub const MAX_QUANTITY_PER_UNIT: u32 = 10_000;

/// Number of batteries one transformer supports.
const BATTERIES_PER_TRANSFORMER: u32 = 2;

/// Mapping from unit-type id to quantity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuantityConfig {
    counts: BTreeMap<String, u32>,
}

impl QuantityConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from raw pairs, clamping and deriving transformers.
    ///
    /// Unknown ids are rejected.
    pub fn from_pairs<I, S>(catalog: &Catalog, pairs: I) -> Result<Self, QuantityError>
    where
        I: IntoIterator<Item = (S, u32)>,
        S: Into<String>,
    {
        let mut config = Self::new();
        for (id, quantity) in pairs {
            let id = id.into();
            if !catalog.contains(&id) {
                return Err(QuantityError::UnknownUnit { id });
            }
            let _ = config.counts.insert(id, quantity);
        }
        config.clamp();
        config.derive_transformers(catalog);
        Ok(config)
    }

    /// Quantity for a unit type (0 when unset).
    #[must_use]
    pub fn get(&self, id: &str) -> u32 {
        self.counts.get(id).copied().unwrap_or(0)
    }

    /// Set one unit's quantity, then re-derive the transformer count.
    ///
    /// Returns the stored (clamped) quantity.
    pub fn set(&mut self, catalog: &Catalog, id: &str, quantity: u32) -> Result<u32, QuantityError> {
        if !catalog.contains(id) {
            return Err(QuantityError::UnknownUnit { id: id.to_string() });
        }
        let clamped = quantity.min(MAX_QUANTITY_PER_UNIT);
        let _ = self.counts.insert(id.to_string(), clamped);
        self.derive_transformers(catalog);
        Ok(self.get(id))
    }

    /// Cap every entry at [`MAX_QUANTITY_PER_UNIT`].
    ///
    /// Only user inputs are bounded; run this before
    /// [`derive_transformers`](Self::derive_transformers), whose result may
    /// exceed the cap.
    pub fn clamp(&mut self) {
        for count in self.counts.values_mut() {
            *count = (*count).min(MAX_QUANTITY_PER_UNIT);
        }
    }

    /// Recompute the primary transformer quantity from the battery total.
    pub fn derive_transformers(&mut self, catalog: &Catalog) {
        let Some(transformer) = catalog.primary_transformer() else {
            return;
        };
        let derived = self.battery_count(catalog) / BATTERIES_PER_TRANSFORMER;
        let _ = self.counts.insert(transformer.id.clone(), derived);
    }

    /// Sum of quantities over battery unit types, saturating at `u32::MAX`.
    #[must_use]
    pub fn battery_count(&self, catalog: &Catalog) -> u32 {
        catalog
            .batteries()
            .fold(0u32, |acc, unit| acc.saturating_add(self.get(&unit.id)))
    }

    /// Sum of quantities over transformer unit types, saturating at `u32::MAX`.
    #[must_use]
    pub fn transformer_count(&self, catalog: &Catalog) -> u32 {
        catalog
            .transformers()
            .fold(0u32, |acc, unit| acc.saturating_add(self.get(&unit.id)))
    }

    /// Number of placement items this configuration expands into.
    #[must_use]
    pub fn total_items(&self, catalog: &Catalog) -> usize {
        catalog
            .iter()
            .fold(0usize, |acc, unit| acc.saturating_add(self.get(&unit.id) as usize))
    }

    /// Iterate `(id, quantity)` pairs in id order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.counts.iter().map(|(id, &count)| (id.as_str(), count))
    }

    pub fn clear(&mut self) {
        self.counts.clear();
    }
}

/// Errors from quantity edits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuantityError {
    UnknownUnit { id: String },
}

impl fmt::Display for QuantityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownUnit { id } => write!(f, "unknown unit type {id:?}"),
        }
    }
}

impl std::error::Error for QuantityError {}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn transformers_follow_battery_total() {
        let catalog = Catalog::standard();
        let mut config = QuantityConfig::new();
        config.set(&catalog, "megapack-xl", 3).expect("known unit");
        assert_eq!(config.get("transformer"), 1);
        config.set(&catalog, "powerpack", 2).expect("known unit");
        assert_eq!(config.get("transformer"), 2);
        assert_eq!(config.battery_count(&catalog), 5);
        assert_eq!(config.total_items(&catalog), 7);
    }

    #[test]
    fn direct_transformer_edits_are_overridden() {
        let catalog = Catalog::standard();
        let mut config = QuantityConfig::new();
        config.set(&catalog, "megapack", 4).expect("known unit");
        let stored = config.set(&catalog, "transformer", 50).expect("known unit");
        assert_eq!(stored, 2);
    }

    #[test]
    fn quantities_are_clamped() {
        let catalog = Catalog::standard();
        let mut config = QuantityConfig::new();
        let stored = config
            .set(&catalog, "powerpack", 25_000)
            .expect("known unit");
        assert_eq!(stored, MAX_QUANTITY_PER_UNIT);
        assert_eq!(config.get("transformer"), MAX_QUANTITY_PER_UNIT / 2);
    }

    #[test]
    fn derived_transformers_are_not_capped() {
        let catalog = Catalog::standard();
        let config = QuantityConfig::from_pairs(
            &catalog,
            [
                ("megapack-xl", MAX_QUANTITY_PER_UNIT),
                ("megapack-2", MAX_QUANTITY_PER_UNIT),
                ("megapack", MAX_QUANTITY_PER_UNIT),
                ("powerpack", MAX_QUANTITY_PER_UNIT),
            ],
        )
        .expect("known units");
        assert_eq!(config.battery_count(&catalog), 40_000);
        assert_eq!(config.get("transformer"), 20_000);
        assert_eq!(config.total_items(&catalog), 60_000);
    }

    #[test]
    fn clamp_bounds_deserialized_counts() {
        let catalog = Catalog::standard();
        let mut config: QuantityConfig =
            serde_json::from_str(r#"{"powerpack":3000000000,"megapack":3000000000}"#)
                .expect("deserialize");
        assert_eq!(config.battery_count(&catalog), u32::MAX);

        config.clamp();
        config.derive_transformers(&catalog);
        assert_eq!(config.get("powerpack"), MAX_QUANTITY_PER_UNIT);
        assert_eq!(config.get("megapack"), MAX_QUANTITY_PER_UNIT);
        assert_eq!(config.get("transformer"), MAX_QUANTITY_PER_UNIT);
    }

    #[test]
    fn unknown_unit_is_rejected() {
        let catalog = Catalog::standard();
        let mut config = QuantityConfig::new();
        let err = config
            .set(&catalog, "flux-capacitor", 1)
            .expect_err("unknown id");
        assert_eq!(
            err,
            QuantityError::UnknownUnit {
                id: "flux-capacitor".into()
            }
        );
        assert!(QuantityConfig::from_pairs(&catalog, [("nope", 1)]).is_err());
    }

    #[test]
    fn from_pairs_derives_transformers() {
        let catalog = Catalog::standard();
        let config = QuantityConfig::from_pairs(&catalog, [("megapack-2", 5), ("powerpack", 4)])
            .expect("known units");
        assert_eq!(config.get("transformer"), 4);
    }

    #[test]
    fn serializes_as_plain_map() {
        let catalog = Catalog::standard();
        let config =
            QuantityConfig::from_pairs(&catalog, [("megapack", 2)]).expect("known units");
        let json = serde_json::to_string(&config).expect("serialize");
        assert_eq!(json, r#"{"megapack":2,"transformer":1}"#);
    }

    proptest! {
        #[test]
        fn transformer_count_is_half_the_batteries(
            xl in 0u32..200,
            mp2 in 0u32..200,
            mp in 0u32..200,
            pp in 0u32..200,
        ) {
            let catalog = Catalog::standard();
            let config = QuantityConfig::from_pairs(
                &catalog,
                [("megapack-xl", xl), ("megapack-2", mp2), ("megapack", mp), ("powerpack", pp)],
            ).expect("known units");
            prop_assert_eq!(config.get("transformer"), (xl + mp2 + mp + pp) / 2);
        }
    }
}
