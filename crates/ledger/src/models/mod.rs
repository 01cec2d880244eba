//! Domain models for the warehouse ledger.

pub mod article;
pub mod location;
pub mod lot;
pub mod movement;
pub mod reporting;

pub use article::Article;
pub use location::{Location, LocationKey};
pub use lot::{
    CreateExportLotInput, CreateMasterLotInput, ExportLot, GenerateTraceCodesInput, MasterLot,
    TraceCode,
};
pub use movement::{Movement, PositionKey, RecordMovementInput, RecordTransferInput};
pub use reporting::{AgedPositionRow, LotExpirationRow, LotLevel, PositionRow};
