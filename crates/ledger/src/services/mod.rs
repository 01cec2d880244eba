//! Warehouse ledger services.
//!
//! - [`LocationCatalog`] - storage slot registry with capacity config
//! - [`LotHierarchy`] - master lots, export lots and trace codes
//! - [`StockLedger`] - movement log, projection, transfers and reports

pub mod catalog;
pub mod ledger;
mod locks;
pub mod lots;
pub mod projection;

pub use catalog::LocationCatalog;
pub use ledger::StockLedger;
pub use lots::LotHierarchy;
pub use projection::PositionState;
