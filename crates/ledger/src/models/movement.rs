//! Movement log and stock position domain models.

use assetflow_core::{ActorId, ArticleId, MasterLotId, MovementId, MovementType, WarehouseId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One immutable record of inventory quantity change at a location.
///
/// Movements are append-only: never edited, never deleted. Corrections are
/// new compensating movements. A transfer is stored as two movements (an exit
/// leg and an entry leg) sharing a `transfer_id`; the exit leg carries the
/// destination fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Movement {
    /// Unique movement ID, doubling as the log sequence position.
    pub id: MovementId,
    /// Movement type; encodes the direction of the quantity.
    pub movement_type: MovementType,
    /// Article being moved.
    pub article_id: ArticleId,
    /// Warehouse where the movement happened.
    pub warehouse_id: WarehouseId,
    /// Location where the movement happened.
    pub location_code: String,
    /// Quantity moved; always a positive magnitude.
    pub quantity: i64,
    /// Master lot the stock belongs to, if lot-tracked.
    pub lot_id: Option<MasterLotId>,
    /// Correlation ID shared by the two legs of a transfer.
    pub transfer_id: Option<Uuid>,
    /// Destination warehouse (exit leg of a transfer only).
    pub destination_warehouse_id: Option<WarehouseId>,
    /// Destination location (exit leg of a transfer only).
    pub destination_location_code: Option<String>,
    /// Audit reason; required for adjustments.
    pub reason: Option<String>,
    /// Actor that submitted the movement (already authenticated upstream).
    pub created_by: ActorId,
    /// When the movement was committed.
    pub created_at: DateTime<Utc>,
}

impl Movement {
    /// Signed quantity this movement contributes to its stock position.
    #[must_use]
    pub const fn signed_quantity(&self) -> i64 {
        self.movement_type.sign() * self.quantity
    }

    /// Projection key this movement applies to.
    #[must_use]
    pub fn position_key(&self) -> PositionKey {
        PositionKey {
            article_id: self.article_id,
            warehouse_id: self.warehouse_id,
            location_code: self.location_code.clone(),
            lot_id: self.lot_id,
        }
    }
}

/// Key of a stock position: `(article, warehouse, location, lot)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PositionKey {
    /// Article on hand.
    pub article_id: ArticleId,
    /// Warehouse holding the stock.
    pub warehouse_id: WarehouseId,
    /// Location holding the stock.
    pub location_code: String,
    /// Master lot the stock belongs to, if lot-tracked.
    pub lot_id: Option<MasterLotId>,
}

/// Input for recording a single entry, exit or adjustment movement.
///
/// Transfers go through [`RecordTransferInput`] instead so both legs commit
/// atomically.
#[derive(Debug, Clone, Deserialize)]
pub struct RecordMovementInput {
    /// Movement type; must not be a transfer leg.
    pub movement_type: MovementType,
    /// Article being moved.
    pub article_id: ArticleId,
    /// Warehouse of the affected location.
    pub warehouse_id: WarehouseId,
    /// Affected location code.
    pub location_code: String,
    /// Quantity moved; must be > 0.
    pub quantity: i64,
    /// Master lot the stock belongs to, if lot-tracked.
    pub lot_id: Option<MasterLotId>,
    /// Audit reason; required (non-empty) for adjustments.
    pub reason: Option<String>,
    /// Actor submitting the movement.
    pub created_by: ActorId,
}

/// Input for recording a two-legged transfer as one atomic unit.
#[derive(Debug, Clone, Deserialize)]
pub struct RecordTransferInput {
    /// Article being moved.
    pub article_id: ArticleId,
    /// Warehouse to debit.
    pub origin_warehouse_id: WarehouseId,
    /// Location to debit.
    pub origin_location_code: String,
    /// Warehouse to credit.
    pub destination_warehouse_id: WarehouseId,
    /// Location to credit.
    pub destination_location_code: String,
    /// Quantity to move; must be > 0.
    pub quantity: i64,
    /// Master lot the stock belongs to, if lot-tracked.
    pub lot_id: Option<MasterLotId>,
    /// Optional audit reason, copied onto both legs.
    pub reason: Option<String>,
    /// Actor submitting the transfer.
    pub created_by: ActorId,
}
