//! AssetFlow Core - Shared types library.
//!
//! This crate provides common types used across the AssetFlow warehouse
//! components:
//! - `ledger` - Stock ledger, lot hierarchy and reporting services
//! - `integration-tests` - End-to-end scenario and concurrency tests
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no storage access, no clocks.
//! This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs and the ledger status enums

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
