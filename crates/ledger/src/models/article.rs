//! Article catalog entry.

use assetflow_core::ArticleId;
use serde::{Deserialize, Serialize};

/// An immutable catalog entry, referenced (never owned) by lots and stock.
///
/// Article existence is validated by the upstream catalog service, like actor
/// identity; the ledger only carries the reference.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Article {
    /// Unique article ID.
    pub id: ArticleId,
    /// Stock-keeping unit code.
    pub sku: String,
    /// Optional EAN barcode.
    pub ean: Option<String>,
    /// Display name.
    pub name: String,
}
