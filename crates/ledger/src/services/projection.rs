//! The stock-position projection: derived, keyed quantities.
//!
//! The movement log is the source of truth; this projection is materialized
//! for reads and must always be rebuildable by replaying the log from empty.
//! Positions that return to zero are dropped so derived occupancy sums only
//! walk live stock.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{Movement, PositionKey};

/// Projected state for one `(article, warehouse, location, lot)` key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionState {
    /// Current quantity on hand; the signed sum of all movements for the key.
    pub quantity: i64,
    /// Timestamp of the credit that most recently took the position from zero
    /// to positive. Drives the aging report.
    pub entered_at: Option<DateTime<Utc>>,
}

/// Apply one movement to the projection.
///
/// Validation happens before a movement is appended, so an accepted log never
/// drives a position negative here.
pub(crate) fn apply(positions: &mut HashMap<PositionKey, PositionState>, movement: &Movement) {
    let key = movement.position_key();
    let delta = movement.signed_quantity();
    let state = positions.entry(key.clone()).or_insert(PositionState {
        quantity: 0,
        entered_at: None,
    });
    if delta > 0 && state.quantity == 0 {
        state.entered_at = Some(movement.created_at);
    }
    state.quantity += delta;
    if state.quantity == 0 {
        positions.remove(&key);
    }
}

/// Rebuild the projection by replaying a movement log from empty state.
#[must_use]
pub fn rebuild<'a, I>(movements: I) -> HashMap<PositionKey, PositionState>
where
    I: IntoIterator<Item = &'a Movement>,
{
    let mut positions = HashMap::new();
    for movement in movements {
        apply(&mut positions, movement);
    }
    positions
}
