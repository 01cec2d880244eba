//! Lot hierarchy domain models: master lots, export lots and trace codes.

use assetflow_core::{ArticleId, ExportLotId, MasterLotId, TraceCodeId, TraceStatus, WarehouseId};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A production batch, the root of lot genealogy.
///
/// `quantity` is the total ever produced under this lot - a ceiling, not a
/// live balance. Master lots are deactivated when fully consumed or expired,
/// never deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MasterLot {
    /// Unique lot ID.
    pub id: MasterLotId,
    /// Lot code, globally unique (e.g. "LM-001").
    pub code: String,
    /// Article produced under this lot.
    pub article_id: ArticleId,
    /// Total units ever produced under this lot.
    pub quantity: i64,
    /// Date of production.
    pub production_date: Option<NaiveDate>,
    /// Expiration date, if the article expires.
    pub expiration_date: Option<NaiveDate>,
    /// Whether the lot is still active (false once consumed or expired).
    pub active: bool,
    /// When the lot was registered.
    pub created_at: DateTime<Utc>,
}

/// A quantity of a master lot earmarked for a specific shipment/destination.
///
/// Quantity is immutable after creation; corrections go through compensating
/// adjustments, never an in-place edit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportLot {
    /// Unique lot ID.
    pub id: ExportLotId,
    /// Lot code, globally unique (e.g. "LE-001").
    pub code: String,
    /// Master lot this export lot was carved out of.
    pub master_lot_id: MasterLotId,
    /// Units allocated to this export lot.
    pub quantity: i64,
    /// Optional shipment destination.
    pub destination: Option<String>,
    /// Expiration date, if it differs from the master lot's.
    pub expiration_date: Option<NaiveDate>,
    /// Whether the lot is still active.
    pub active: bool,
    /// When the lot was created.
    pub created_at: DateTime<Utc>,
}

/// A unique identifier for one physical unit (or unit-group).
///
/// Enables unit-level traceability back to the export and master lot. Status
/// transitions monotonically forward; see [`TraceStatus`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceCode {
    /// Unique trace code ID.
    pub id: TraceCodeId,
    /// Printable code, globally unique (e.g. "LE-001-000001").
    pub code: String,
    /// Export lot this code was generated for.
    pub export_lot_id: ExportLotId,
    /// Article the unit belongs to.
    pub article_id: ArticleId,
    /// Warehouse the unit was last put away in, if known.
    pub warehouse_id: Option<WarehouseId>,
    /// Location code the unit was last put away at, if known.
    pub location_code: Option<String>,
    /// Current lifecycle status.
    pub status: TraceStatus,
    /// When the code was generated.
    pub created_at: DateTime<Utc>,
}

/// Input for registering a master lot from production.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateMasterLotInput {
    /// Lot code, globally unique.
    pub code: String,
    /// Article produced under this lot.
    pub article_id: ArticleId,
    /// Total units produced; must be > 0.
    pub quantity: i64,
    /// Date of production.
    pub production_date: Option<NaiveDate>,
    /// Expiration date, if the article expires.
    pub expiration_date: Option<NaiveDate>,
}

/// Input for carving an export lot out of a master lot.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateExportLotInput {
    /// Lot code, globally unique.
    pub code: String,
    /// Master lot to carve from.
    pub master_lot_id: MasterLotId,
    /// Units to allocate; must be > 0 and fit under the master ceiling.
    pub quantity: i64,
    /// Optional shipment destination.
    pub destination: Option<String>,
    /// Expiration date, if it differs from the master lot's.
    pub expiration_date: Option<NaiveDate>,
}

/// Input for generating a batch of trace codes at packing time.
#[derive(Debug, Clone, Deserialize)]
pub struct GenerateTraceCodesInput {
    /// Export lot to generate codes for.
    pub export_lot_id: ExportLotId,
    /// Number of codes to generate; must be > 0 and fit under the export
    /// lot's quantity together with previously generated codes.
    pub count: i64,
    /// Code prefix; defaults to the export lot code.
    pub prefix: Option<String>,
}
