//! Equipment/fighter catalog: read-only static game content.
//!
//! The engine never stores catalog costs itself — it reads base costs here
//! when computing a delta, then caches the propagated result on the entity.
//! The trait seam lets tests substitute a mock (`mockall`).

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{Result, WarchestError};

/// A purchasable equipment item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EquipmentItem {
    pub cost: i64,
    /// Fighter-catalog key of the child fighter this item spawns when
    /// assigned (vehicle/mount pattern), if any.
    pub spawns_fighter: Option<String>,
}

/// Read-only source of base costs.
#[cfg_attr(test, mockall::automock)]
pub trait Catalog {
    /// Intrinsic cost of a fighter type.
    fn fighter_cost(&self, key: &str) -> Result<i64>;

    /// Look up an equipment item.
    fn equipment(&self, key: &str) -> Result<EquipmentItem>;
}

/// In-memory catalog backed by plain maps.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StaticCatalog {
    fighters: HashMap<String, i64>,
    equipment: HashMap<String, EquipmentItem>,
}

impl StaticCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_fighter(mut self, key: &str, cost: i64) -> Self {
        self.fighters.insert(key.to_string(), cost);
        self
    }

    pub fn with_equipment(mut self, key: &str, cost: i64) -> Self {
        self.equipment.insert(
            key.to_string(),
            EquipmentItem { cost, spawns_fighter: None },
        );
        self
    }

    /// Register equipment that spawns a child fighter when assigned.
    pub fn with_vehicle(mut self, key: &str, cost: i64, spawned_fighter: &str) -> Self {
        self.equipment.insert(
            key.to_string(),
            EquipmentItem {
                cost,
                spawns_fighter: Some(spawned_fighter.to_string()),
            },
        );
        self
    }
}

impl Catalog for StaticCatalog {
    fn fighter_cost(&self, key: &str) -> Result<i64> {
        self.fighters
            .get(key)
            .copied()
            .ok_or_else(|| WarchestError::UnknownCatalogItem(key.to_string()))
    }

    fn equipment(&self, key: &str) -> Result<EquipmentItem> {
        self.equipment
            .get(key)
            .cloned()
            .ok_or_else(|| WarchestError::UnknownCatalogItem(key.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
