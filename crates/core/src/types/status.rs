//! Status enums for the stock ledger and lot hierarchy.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Direction of an inventory adjustment.
///
/// Adjustments are the only movement type that can go either way, so the
/// direction travels inside the movement type instead of a signed quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdjustmentDirection {
    /// Stock found during a physical count.
    Increase,
    /// Stock missing during a physical count.
    Decrease,
}

/// Movement type as stored in the append-only log.
///
/// Quantities are always stored as positive magnitudes; the type encodes the
/// direction. A transfer is stored as an `Exit` leg at the origin plus an
/// `Entry` leg at the destination sharing a correlation ID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovementType {
    /// Goods received into a location.
    Entry,
    /// Goods leaving a location.
    Exit,
    /// Correction from a physical count, signed by its direction.
    Adjustment(AdjustmentDirection),
}

impl MovementType {
    /// Whether this movement credits stock at its location.
    #[must_use]
    pub const fn is_credit(self) -> bool {
        matches!(
            self,
            Self::Entry | Self::Adjustment(AdjustmentDirection::Increase)
        )
    }

    /// Signed multiplier applied to the stored magnitude during projection.
    #[must_use]
    pub const fn sign(self) -> i64 {
        if self.is_credit() { 1 } else { -1 }
    }
}

impl std::fmt::Display for MovementType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Entry => write!(f, "entry"),
            Self::Exit => write!(f, "exit"),
            Self::Adjustment(AdjustmentDirection::Increase) => write!(f, "adjustment_increase"),
            Self::Adjustment(AdjustmentDirection::Decrease) => write!(f, "adjustment_decrease"),
        }
    }
}

/// Lifecycle status of a trace code.
///
/// Transitions are strictly monotonic: available -> assigned -> shipped ->
/// delivered, one step at a time. Reversals go through a separately-audited
/// correction, never through the normal transition path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TraceStatus {
    #[default]
    Available,
    Assigned,
    Shipped,
    Delivered,
}

/// A trace code status transition that is not the single forward step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invalid status transition: {from} -> {to}")]
pub struct InvalidTransition {
    /// Status the code currently has.
    pub from: TraceStatus,
    /// Status the caller asked for.
    pub to: TraceStatus,
}

impl TraceStatus {
    /// The next status in the forward chain, if any.
    #[must_use]
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::Available => Some(Self::Assigned),
            Self::Assigned => Some(Self::Shipped),
            Self::Shipped => Some(Self::Delivered),
            Self::Delivered => None,
        }
    }

    /// Validate a transition to `to`, allowing only the single forward step.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidTransition`] for skips, reversals and no-ops.
    pub fn transition_to(self, to: Self) -> Result<Self, InvalidTransition> {
        match self.next() {
            Some(next) if next == to => Ok(to),
            _ => Err(InvalidTransition { from: self, to }),
        }
    }
}

impl std::fmt::Display for TraceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Available => write!(f, "available"),
            Self::Assigned => write!(f, "assigned"),
            Self::Shipped => write!(f, "shipped"),
            Self::Delivered => write!(f, "delivered"),
        }
    }
}

impl std::str::FromStr for TraceStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "available" => Ok(Self::Available),
            "assigned" => Ok(Self::Assigned),
            "shipped" => Ok(Self::Shipped),
            "delivered" => Ok(Self::Delivered),
            _ => Err(format!("invalid trace status: {s}")),
        }
    }
}
