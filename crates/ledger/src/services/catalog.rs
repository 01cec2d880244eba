//! Location catalog: addressable storage slots and their capacity.

use std::collections::HashMap;

use assetflow_core::WarehouseId;
use tokio::sync::RwLock;
use tracing::{info, instrument};

use crate::error::LedgerError;
use crate::models::{Location, LocationKey};

/// Registry of storage locations per warehouse.
///
/// Holds only configuration (codes, capacity); occupancy is derived from the
/// stock-position projection by [`super::StockLedger`], never stored here.
#[derive(Debug, Default)]
pub struct LocationCatalog {
    locations: RwLock<HashMap<LocationKey, Location>>,
}

impl LocationCatalog {
    /// Create an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new location.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::Validation` for an empty code or non-positive
    /// capacity, and `LedgerError::Conflict` if the `(warehouse, code)` pair
    /// is already registered.
    #[instrument(skip(self))]
    pub async fn add_location(&self, location: Location) -> Result<(), LedgerError> {
        if location.code.trim().is_empty() {
            return Err(LedgerError::Validation(
                "location code must not be empty".to_string(),
            ));
        }
        if let Some(capacity) = location.capacity
            && capacity <= 0
        {
            return Err(LedgerError::Validation(format!(
                "location capacity must be positive, got {capacity}"
            )));
        }

        let key = location.key();
        let mut locations = self.locations.write().await;
        if locations.contains_key(&key) {
            return Err(LedgerError::Conflict(format!(
                "location {key} already registered"
            )));
        }
        info!(location = %key, capacity = ?location.capacity, "Registered location");
        locations.insert(key, location);
        Ok(())
    }

    /// Look up a location by warehouse and code.
    pub async fn get(&self, warehouse_id: WarehouseId, code: &str) -> Option<Location> {
        self.locations
            .read()
            .await
            .get(&LocationKey::new(warehouse_id, code))
            .cloned()
    }

    /// Look up a location, mapping absence to `UnknownLocation`.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::UnknownLocation` if the location is not
    /// registered.
    pub async fn require(
        &self,
        warehouse_id: WarehouseId,
        code: &str,
    ) -> Result<Location, LedgerError> {
        self.get(warehouse_id, code)
            .await
            .ok_or_else(|| LedgerError::UnknownLocation {
                warehouse_id,
                code: code.to_string(),
            })
    }

    /// List the locations of a warehouse, sorted by code.
    pub async fn list(&self, warehouse_id: WarehouseId) -> Vec<Location> {
        let locations = self.locations.read().await;
        let mut result: Vec<Location> = locations
            .values()
            .filter(|location| location.warehouse_id == warehouse_id)
            .cloned()
            .collect();
        result.sort_by(|a, b| a.code.cmp(&b.code));
        result
    }
}
