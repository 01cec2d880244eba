//! Storage location domain models.

use assetflow_core::WarehouseId;
use serde::{Deserialize, Serialize};

/// Key of a storage location: unique per `(warehouse, code)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LocationKey {
    /// Warehouse the location belongs to.
    pub warehouse_id: WarehouseId,
    /// Location code, unique within the warehouse (e.g. "A1-01").
    pub code: String,
}

impl LocationKey {
    /// Create a new location key.
    pub fn new(warehouse_id: WarehouseId, code: impl Into<String>) -> Self {
        Self {
            warehouse_id,
            code: code.into(),
        }
    }
}

impl std::fmt::Display for LocationKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.warehouse_id, self.code)
    }
}

/// An addressable storage slot within a warehouse.
///
/// Occupancy is a derived value - the sum of stock quantities resident at the
/// location - and is never stored here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Location {
    /// Warehouse the location belongs to.
    pub warehouse_id: WarehouseId,
    /// Location code, unique within the warehouse.
    pub code: String,
    /// Optional display name.
    pub name: Option<String>,
    /// Optional capacity in units; `None` means unbounded.
    pub capacity: Option<i64>,
}

impl Location {
    /// Key of this location.
    #[must_use]
    pub fn key(&self) -> LocationKey {
        LocationKey::new(self.warehouse_id, self.code.clone())
    }
}
