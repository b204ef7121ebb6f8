//! Unit catalog: the fixed set of placeable equipment types.
//!
//! A [`Catalog`] is built once at startup and shared behind an [`Arc`]. Every
//! entry is validated on construction so downstream layout code can rely on
//! positive, finite footprints without re-checking.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// What role a unit plays on site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitKind {
    Battery,
    Transformer,
}

/// A catalog entry describing one kind of placeable equipment.
///
/// Dimensions are in feet, energy in MWh (negative for consumers), cost in USD.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitType {
    pub id: String,
    pub name: String,
    /// Horizontal extent along a row.
    pub length: f64,
    /// Vertical extent across rows.
    pub width: f64,
    pub energy: f64,
    pub cost: f64,
    #[serde(default)]
    pub release_date: Option<String>,
    pub kind: UnitKind,
}

impl UnitType {
    /// Build a battery entry.
    #[must_use]
    pub fn battery(
        id: impl Into<String>,
        name: impl Into<String>,
        length: f64,
        width: f64,
        energy: f64,
        cost: f64,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            length,
            width,
            energy,
            cost,
            release_date: None,
            kind: UnitKind::Battery,
        }
    }

    /// Build a transformer entry.
    #[must_use]
    pub fn transformer(
        id: impl Into<String>,
        name: impl Into<String>,
        length: f64,
        width: f64,
        energy: f64,
        cost: f64,
    ) -> Self {
        Self {
            kind: UnitKind::Transformer,
            ..Self::battery(id, name, length, width, energy, cost)
        }
    }

    /// Attach a release label.
    #[must_use]
    pub fn released(mut self, date: impl Into<String>) -> Self {
        self.release_date = Some(date.into());
        self
    }

    #[must_use]
    pub const fn is_transformer(&self) -> bool {
        matches!(self.kind, UnitKind::Transformer)
    }

    fn validate(&self) -> Result<(), CatalogError> {
        if self.id.is_empty() {
            return Err(CatalogError::EmptyId);
        }
        for (field, value) in [
            ("length", self.length),
            ("width", self.width),
            ("energy", self.energy),
            ("cost", self.cost),
        ] {
            if !value.is_finite() {
                return Err(CatalogError::NonFiniteValue {
                    id: self.id.clone(),
                    field,
                });
            }
        }
        if self.length <= 0.0 {
            return Err(CatalogError::NonPositiveDimension {
                id: self.id.clone(),
                axis: "length",
                value: self.length,
            });
        }
        if self.width <= 0.0 {
            return Err(CatalogError::NonPositiveDimension {
                id: self.id.clone(),
                axis: "width",
                value: self.width,
            });
        }
        if self.cost <= 0.0 {
            return Err(CatalogError::NonPositiveCost {
                id: self.id.clone(),
                value: self.cost,
            });
        }
        Ok(())
    }
}

/// Immutable registry of unit types, in declaration order.
#[derive(Debug, Clone)]
pub struct Catalog {
    units: Vec<Arc<UnitType>>,
    index: BTreeMap<String, usize>,
    max_width: f64,
}

impl Catalog {
    /// Validate and index a list of unit types.
    pub fn new(units: impl IntoIterator<Item = UnitType>) -> Result<Self, CatalogError> {
        let mut entries = Vec::new();
        let mut index = BTreeMap::new();
        let mut max_width = 0.0_f64;

        for unit in units {
            unit.validate()?;
            if index.contains_key(&unit.id) {
                return Err(CatalogError::DuplicateId { id: unit.id });
            }
            max_width = max_width.max(unit.width);
            let _ = index.insert(unit.id.clone(), entries.len());
            entries.push(Arc::new(unit));
        }

        Ok(Self {
            units: entries,
            index,
            max_width,
        })
    }

    /// The stock catalog: four battery models and one transformer.
    #[must_use]
    pub fn standard() -> Self {
        let units = [
            UnitType::battery("megapack-xl", "Megapack XL", 40.0, 10.0, 4.0, 120_000.0)
                .released("2022"),
            UnitType::battery("megapack-2", "Megapack 2", 30.0, 10.0, 3.0, 80_000.0)
                .released("2021"),
            UnitType::battery("megapack", "Megapack", 30.0, 10.0, 2.0, 50_000.0).released("2005"),
            UnitType::battery("powerpack", "PowerPack", 10.0, 10.0, 1.0, 10_000.0)
                .released("2000"),
            UnitType::transformer("transformer", "Transformer", 10.0, 10.0, -0.5, 10_000.0),
        ];

        Self::new(units).unwrap_or_else(|err| unreachable!("stock catalog is invalid: {err}"))
    }

    /// Look up a unit type by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Arc<UnitType>> {
        self.index.get(id).map(|&position| &self.units[position])
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// All unit types in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<UnitType>> {
        self.units.iter()
    }

    pub fn batteries(&self) -> impl Iterator<Item = &Arc<UnitType>> {
        self.units.iter().filter(|unit| !unit.is_transformer())
    }

    pub fn transformers(&self) -> impl Iterator<Item = &Arc<UnitType>> {
        self.units.iter().filter(|unit| unit.is_transformer())
    }

    /// The transformer whose quantity is derived from the battery count.
    #[must_use]
    pub fn primary_transformer(&self) -> Option<&Arc<UnitType>> {
        self.transformers().next()
    }

    /// Widest footprint across every entry; fixes the row pitch.
    #[must_use]
    pub const fn max_width(&self) -> f64 {
        self.max_width
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.units.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::standard()
    }
}

/// Validation errors for catalog construction.
#[derive(Debug, Clone, PartialEq)]
pub enum CatalogError {
    EmptyId,
    DuplicateId {
        id: String,
    },
    NonPositiveDimension {
        id: String,
        axis: &'static str,
        value: f64,
    },
    NonPositiveCost {
        id: String,
        value: f64,
    },
    NonFiniteValue {
        id: String,
        field: &'static str,
    },
}

impl fmt::Display for CatalogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyId => write!(f, "unit type id must not be empty"),
            Self::DuplicateId { id } => write!(f, "duplicate unit type id {id:?}"),
            Self::NonPositiveDimension { id, axis, value } => {
                write!(f, "unit type {id:?} has non-positive {axis} {value}")
            }
            Self::NonPositiveCost { id, value } => {
                write!(f, "unit type {id:?} has non-positive cost {value}")
            }
            Self::NonFiniteValue { id, field } => {
                write!(f, "unit type {id:?} has a non-finite {field}")
            }
        }
    }
}

impl std::error::Error for CatalogError {}
