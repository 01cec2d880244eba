//! Integration tests for the AssetFlow warehouse ledger.
//!
//! # Test Categories
//!
//! - `stock_flow` - End-to-end movement, transfer and reporting scenarios
//! - `lot_traceability` - Lot genealogy bounds and trace code lifecycle
//! - `concurrency` - Serializability per key under parallel operators
//!
//! The harness wires a [`LocationCatalog`], a [`LotHierarchy`] and a
//! [`StockLedger`] together the way the service layer does in production,
//! minus the HTTP mapping.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::sync::Arc;

use assetflow_core::{ActorId, ArticleId, MovementType, WarehouseId};
use assetflow_ledger::models::{Location, RecordMovementInput, RecordTransferInput};
use assetflow_ledger::{LocationCatalog, LotHierarchy, StockLedger};

/// A fully wired in-memory ledger stack for tests.
pub struct Harness {
    /// Location registry shared with the ledger.
    pub catalog: Arc<LocationCatalog>,
    /// Lot hierarchy shared with the ledger.
    pub lots: Arc<LotHierarchy>,
    /// The ledger under test.
    pub ledger: Arc<StockLedger>,
}

impl Harness {
    /// Wire up an empty stack.
    #[must_use]
    pub fn new() -> Self {
        let catalog = Arc::new(LocationCatalog::new());
        let lots = Arc::new(LotHierarchy::new());
        let ledger = Arc::new(StockLedger::new(Arc::clone(&catalog), Arc::clone(&lots)));
        Self {
            catalog,
            lots,
            ledger,
        }
    }

    /// Register a location, panicking on failure (test setup).
    pub async fn add_location(&self, warehouse_id: WarehouseId, code: &str, capacity: Option<i64>) {
        self.catalog
            .add_location(Location {
                warehouse_id,
                code: code.to_string(),
                name: None,
                capacity,
            })
            .await
            .expect("failed to register test location");
    }
}

impl Default for Harness {
    fn default() -> Self {
        Self::new()
    }
}

/// Build a movement input with the common test defaults.
#[must_use]
pub fn movement(
    movement_type: MovementType,
    article_id: ArticleId,
    warehouse_id: WarehouseId,
    location_code: &str,
    quantity: i64,
) -> RecordMovementInput {
    RecordMovementInput {
        movement_type,
        article_id,
        warehouse_id,
        location_code: location_code.to_string(),
        quantity,
        lot_id: None,
        reason: None,
        created_by: ActorId::new(1),
    }
}

/// Build a transfer input with the common test defaults.
#[must_use]
pub fn transfer(
    article_id: ArticleId,
    origin: (WarehouseId, &str),
    destination: (WarehouseId, &str),
    quantity: i64,
) -> RecordTransferInput {
    RecordTransferInput {
        article_id,
        origin_warehouse_id: origin.0,
        origin_location_code: origin.1.to_string(),
        destination_warehouse_id: destination.0,
        destination_location_code: destination.1.to_string(),
        quantity,
        lot_id: None,
        reason: None,
        created_by: ActorId::new(1),
    }
}
