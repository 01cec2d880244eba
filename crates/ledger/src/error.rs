//! Unified error handling for the warehouse ledger.

use assetflow_core::{ArticleId, InvalidTransition, WarehouseId};
use thiserror::Error;

/// Coarse classification of a [`LedgerError`].
///
/// Callers use the kind to decide how to react: validation and conflict
/// errors are surfaced verbatim and never retried, concurrency errors are
/// transient, storage errors are fatal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed input, caught before any write.
    Validation,
    /// Business-rule violation; correct the request and resubmit.
    Conflict,
    /// Referenced entity does not exist.
    NotFound,
    /// Optimistic retry budget exhausted; safe to retry later.
    Concurrency,
    /// Underlying persistence unavailable.
    Storage,
}

/// Error type for all ledger, lot-hierarchy and catalog operations.
///
/// Every rejected request leaves state unchanged; conflict variants carry the
/// figures the caller needs to correct the request.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Malformed input, rejected before any write.
    #[error("validation error: {0}")]
    Validation(String),

    /// The referenced location is not registered in the catalog.
    #[error("unknown location {code} in warehouse {warehouse_id}")]
    UnknownLocation {
        /// Warehouse the location was looked up in.
        warehouse_id: WarehouseId,
        /// Location code that was not found.
        code: String,
    },

    /// A debit would drive the stock position below zero.
    #[error(
        "insufficient stock for article {article_id} at {warehouse_id}/{location_code}: \
         available {available}, requested {requested}"
    )]
    InsufficientStock {
        /// Article being debited.
        article_id: ArticleId,
        /// Warehouse of the position.
        warehouse_id: WarehouseId,
        /// Location of the position.
        location_code: String,
        /// Quantity currently on hand for the key.
        available: i64,
        /// Quantity the request asked to remove.
        requested: i64,
    },

    /// A credit would push the destination location past its capacity.
    #[error(
        "capacity exceeded at {warehouse_id}/{location_code}: \
         capacity {capacity}, occupied {occupied}, incoming {incoming}"
    )]
    LocationCapacityExceeded {
        /// Warehouse of the destination location.
        warehouse_id: WarehouseId,
        /// Destination location code.
        location_code: String,
        /// Configured capacity of the location.
        capacity: i64,
        /// Current derived occupancy across all articles and lots.
        occupied: i64,
        /// Quantity the request would add.
        incoming: i64,
    },

    /// An operation would push a lot past its quantity ceiling.
    #[error(
        "lot quantity exceeded for {lot_code}: ceiling {ceiling}, \
         committed {committed}, requested {requested}"
    )]
    LotQuantityExceeded {
        /// Code of the lot whose ceiling would be violated.
        lot_code: String,
        /// The lot's quantity ceiling.
        ceiling: i64,
        /// Quantity already committed under the ceiling.
        committed: i64,
        /// Quantity the request asked for.
        requested: i64,
    },

    /// A trace code status change that is not the single forward step.
    #[error("trace code {code}: {source}")]
    InvalidStatusTransition {
        /// The trace code being transitioned.
        code: String,
        /// The rejected transition.
        #[source]
        source: InvalidTransition,
    },

    /// A transfer request that is structurally invalid (e.g. self-transfer).
    #[error("invalid transfer: {0}")]
    InvalidTransfer(String),

    /// Uniqueness violation (e.g. duplicate lot or location code).
    #[error("conflict: {0}")]
    Conflict(String),

    /// Referenced entity does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Optimistic concurrency retries exhausted; the request may be retried.
    ///
    /// Reserved for optimistic storage backends. The in-memory engine
    /// serializes per key and never produces it.
    #[error("concurrency conflict: gave up after {attempts} attempts")]
    ConcurrencyConflict {
        /// Number of attempts made before giving up.
        attempts: u32,
    },

    /// Underlying storage failed; never silently swallowed.
    ///
    /// Reserved for durable backends; the in-memory engine never produces it.
    #[error("storage error: {0}")]
    Storage(String),
}

impl LedgerError {
    /// Classify this error for retry/surface decisions.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::InsufficientStock { .. }
            | Self::LocationCapacityExceeded { .. }
            | Self::LotQuantityExceeded { .. }
            | Self::InvalidStatusTransition { .. }
            | Self::InvalidTransfer(_)
            | Self::Conflict(_) => ErrorKind::Conflict,
            Self::UnknownLocation { .. } | Self::NotFound(_) => ErrorKind::NotFound,
            Self::ConcurrencyConflict { .. } => ErrorKind::Concurrency,
            Self::Storage(_) => ErrorKind::Storage,
        }
    }

    /// Whether the caller may retry the request unchanged.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self.kind(), ErrorKind::Concurrency)
    }
}
