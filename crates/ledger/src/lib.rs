//! AssetFlow Ledger - Warehouse stock & lot-traceability ledger.
//!
//! This crate is the authority for physical inventory: it tracks quantity per
//! (article, warehouse, location, lot), records every mutation as an immutable
//! movement in an append-only log, and maintains the three-level lot genealogy
//! (master lot -> export lot -> trace code) used for recalls and expiration
//! management.
//!
//! # Architecture
//!
//! - [`services::LocationCatalog`] - addressable storage slots per warehouse
//!   with optional capacity; occupancy is always derived, never stored.
//! - [`services::LotHierarchy`] - master lots, export lots and trace codes
//!   with quantity ceilings enforced at every level.
//! - [`services::StockLedger`] - the append-only movement log plus the keyed
//!   stock-position projection, including the two-legged atomic transfer path.
//! - [`expiration`] - pure calendar-day expiration and aging classification.
//!
//! The HTTP/JSON mapping and authentication are external collaborators; the
//! caller supplies an already-authenticated [`assetflow_core::ActorId`].
//!
//! # Concurrency
//!
//! Movements against the same location or lot are serialized through a
//! registry of per-key async mutexes acquired in a fixed global order, so
//! concurrent operators can never both read a stale quantity and both commit.
//! Movements against disjoint keys do not block each other.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod error;
pub mod expiration;
pub mod models;
pub mod services;

pub use error::{ErrorKind, LedgerError};
pub use services::{LocationCatalog, LotHierarchy, StockLedger};
