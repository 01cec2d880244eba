//! Read-model rows built from the ledger and lot hierarchy.

use assetflow_core::{ArticleId, MasterLotId, WarehouseId};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::expiration::{AgingBand, ExpirationBand};

/// One row of the stock-on-hand report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionRow {
    /// Article on hand.
    pub article_id: ArticleId,
    /// Warehouse holding the stock.
    pub warehouse_id: WarehouseId,
    /// Location holding the stock.
    pub location_code: String,
    /// Master lot the stock belongs to, if lot-tracked.
    pub lot_id: Option<MasterLotId>,
    /// Current quantity on hand.
    pub quantity: i64,
}

/// One row of the aging report: a position with its residency classification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgedPositionRow {
    /// The position itself.
    pub position: PositionRow,
    /// When the stock entered its current location.
    pub entered_at: DateTime<Utc>,
    /// Whole days in place.
    pub age_days: i64,
    /// Residency classification.
    pub band: AgingBand,
}

/// Which level of the lot hierarchy an expiration row refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LotLevel {
    /// A master (production) lot.
    Master,
    /// An export lot.
    Export,
}

/// One row of the expiration calendar.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LotExpirationRow {
    /// Hierarchy level of the lot.
    pub level: LotLevel,
    /// Lot code.
    pub lot_code: String,
    /// Article under the lot.
    pub article_id: ArticleId,
    /// Lot quantity (ceiling for master lots, allocation for export lots).
    pub quantity: i64,
    /// Projected lot-linked stock on hand for the master lot, scoped to the
    /// warehouse filter when one was supplied.
    pub on_hand: i64,
    /// Expiration date driving this row.
    pub expiration_date: NaiveDate,
    /// Whole calendar days until expiration (negative once past).
    pub days_until_expiration: i64,
    /// Expiration classification.
    pub band: ExpirationBand,
}
