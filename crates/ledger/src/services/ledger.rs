//! Stock ledger: the append-only movement log and its keyed projection.
//!
//! Every mutation is validated and then appended as an immutable movement;
//! the stock-position projection is updated in the same critical section, so
//! both succeed or neither does. Per-location and per-lot key locks serialize
//! the validate-then-append step (see [`super::locks`]); the shared state
//! lock is held only for the in-memory apply, never for validation.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

use assetflow_core::{ArticleId, MasterLotId, MovementId, MovementType, WarehouseId};
use chrono::{DateTime, NaiveDate, Utc};
use tokio::sync::RwLock;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::error::LedgerError;
use crate::expiration::{AgingBand, ExpirationBand, aging_days, days_until_expiration};
use crate::models::{
    AgedPositionRow, LotExpirationRow, LotLevel, Movement, PositionKey, PositionRow,
    RecordMovementInput, RecordTransferInput,
};
use crate::services::locks::{KeyLocks, LockKey};
use crate::services::projection::{self, PositionState};
use crate::services::{LocationCatalog, LotHierarchy};

#[derive(Debug, Default)]
struct LedgerState {
    log: Vec<Movement>,
    positions: HashMap<PositionKey, PositionState>,
}

impl LedgerState {
    fn quantity(&self, key: &PositionKey) -> i64 {
        self.positions.get(key).map_or(0, |state| state.quantity)
    }

    /// Derived occupancy of a location: the sum of all resident stock.
    fn occupancy(&self, warehouse_id: WarehouseId, location_code: &str) -> i64 {
        self.positions
            .iter()
            .filter(|(key, _)| {
                key.warehouse_id == warehouse_id && key.location_code == location_code
            })
            .map(|(_, state)| state.quantity)
            .sum()
    }

    /// Lot-linked stock on hand, optionally scoped to one warehouse.
    fn lot_on_hand(&self, lot_id: MasterLotId, warehouse_id: Option<WarehouseId>) -> i64 {
        self.positions
            .iter()
            .filter(|(key, _)| {
                key.lot_id == Some(lot_id)
                    && warehouse_id.is_none_or(|warehouse| key.warehouse_id == warehouse)
            })
            .map(|(_, state)| state.quantity)
            .sum()
    }
}

/// The warehouse stock ledger.
///
/// Owns the movement log (the source of truth) and the stock-position
/// projection (rebuildable by replay). Locations come from the
/// [`LocationCatalog`]; lot ceilings come from the [`LotHierarchy`].
#[derive(Debug)]
pub struct StockLedger {
    catalog: Arc<LocationCatalog>,
    lots: Arc<LotHierarchy>,
    state: RwLock<LedgerState>,
    locks: KeyLocks,
    sequence: AtomicI64,
}

impl StockLedger {
    /// Create an empty ledger over the given catalog and lot hierarchy.
    #[must_use]
    pub fn new(catalog: Arc<LocationCatalog>, lots: Arc<LotHierarchy>) -> Self {
        Self {
            catalog,
            lots,
            state: RwLock::new(LedgerState::default()),
            locks: KeyLocks::new(),
            sequence: AtomicI64::new(1),
        }
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Record a single entry, exit or adjustment movement.
    ///
    /// Appends exactly one movement and updates the projection atomically
    /// with the append; a rejected request leaves state unchanged.
    ///
    /// # Errors
    ///
    /// - `LedgerError::Validation` - non-positive quantity, or an adjustment
    ///   without a reason
    /// - `LedgerError::UnknownLocation` - location not in the catalog
    /// - `LedgerError::NotFound` - referenced master lot does not exist
    /// - `LedgerError::InsufficientStock` - a debit would go negative
    /// - `LedgerError::LocationCapacityExceeded` - a credit would overflow
    ///   the location's configured capacity
    /// - `LedgerError::LotQuantityExceeded` - a lot-linked credit would push
    ///   on-hand stock past the master lot's ceiling
    #[instrument(
        skip(self, input),
        fields(movement_type = %input.movement_type, quantity = input.quantity)
    )]
    pub async fn record_movement(
        &self,
        input: RecordMovementInput,
    ) -> Result<MovementId, LedgerError> {
        Self::validate_movement_input(&input)?;
        let location = self
            .catalog
            .require(input.warehouse_id, &input.location_code)
            .await?;
        let lot = match input.lot_id {
            Some(lot_id) => Some(
                self.lots
                    .get_master_lot(lot_id)
                    .await
                    .ok_or_else(|| LedgerError::NotFound(format!("master lot {lot_id}")))?,
            ),
            None => None,
        };

        let mut keys = vec![LockKey::Location(
            input.warehouse_id,
            input.location_code.clone(),
        )];
        if let Some(lot_id) = input.lot_id {
            keys.push(LockKey::Lot(lot_id));
        }
        let _guards = self.locks.acquire(keys).await;

        let key = PositionKey {
            article_id: input.article_id,
            warehouse_id: input.warehouse_id,
            location_code: input.location_code.clone(),
            lot_id: input.lot_id,
        };
        let quantity = input.quantity;
        let credit = input.movement_type.is_credit();

        {
            let state = self.state.read().await;
            if credit {
                if let Some(capacity) = location.capacity {
                    let occupied = state.occupancy(input.warehouse_id, &input.location_code);
                    if occupied + quantity > capacity {
                        return Err(LedgerError::LocationCapacityExceeded {
                            warehouse_id: input.warehouse_id,
                            location_code: input.location_code,
                            capacity,
                            occupied,
                            incoming: quantity,
                        });
                    }
                }
                if let Some(master) = &lot {
                    let on_hand = state.lot_on_hand(master.id, None);
                    if on_hand + quantity > master.quantity {
                        return Err(LedgerError::LotQuantityExceeded {
                            lot_code: master.code.clone(),
                            ceiling: master.quantity,
                            committed: on_hand,
                            requested: quantity,
                        });
                    }
                }
            } else {
                let available = state.quantity(&key);
                if available < quantity {
                    return Err(LedgerError::InsufficientStock {
                        article_id: input.article_id,
                        warehouse_id: input.warehouse_id,
                        location_code: input.location_code,
                        available,
                        requested: quantity,
                    });
                }
            }
        }

        let movement = Movement {
            id: self.next_id(),
            movement_type: input.movement_type,
            article_id: input.article_id,
            warehouse_id: input.warehouse_id,
            location_code: input.location_code,
            quantity,
            lot_id: input.lot_id,
            transfer_id: None,
            destination_warehouse_id: None,
            destination_location_code: None,
            reason: input.reason,
            created_by: input.created_by,
            created_at: Utc::now(),
        };
        let id = movement.id;
        self.commit(vec![movement]).await;
        info!(movement_id = %id, "Recorded movement");
        Ok(id)
    }

    /// Record a transfer as one atomic unit: an exit leg at the origin and an
    /// entry leg at the destination sharing one correlation ID.
    ///
    /// If the destination-side capacity check fails, the origin debit is not
    /// committed; there is no partial transfer.
    ///
    /// # Errors
    ///
    /// - `LedgerError::Validation` - non-positive quantity
    /// - `LedgerError::InvalidTransfer` - origin equals destination
    /// - `LedgerError::UnknownLocation` / `LedgerError::NotFound` - unknown
    ///   location or lot
    /// - `LedgerError::InsufficientStock` - origin cannot cover the quantity
    /// - `LedgerError::LocationCapacityExceeded` - destination would overflow
    #[instrument(skip(self, input), fields(quantity = input.quantity))]
    pub async fn record_transfer(
        &self,
        input: RecordTransferInput,
    ) -> Result<(MovementId, MovementId), LedgerError> {
        if input.quantity <= 0 {
            return Err(LedgerError::Validation(format!(
                "transfer quantity must be positive, got {}",
                input.quantity
            )));
        }
        if input.origin_warehouse_id == input.destination_warehouse_id
            && input.origin_location_code == input.destination_location_code
        {
            return Err(LedgerError::InvalidTransfer(
                "origin and destination are the same location".to_string(),
            ));
        }

        let destination = self
            .catalog
            .require(input.destination_warehouse_id, &input.destination_location_code)
            .await?;
        self.catalog
            .require(input.origin_warehouse_id, &input.origin_location_code)
            .await?;
        if let Some(lot_id) = input.lot_id {
            self.lots
                .get_master_lot(lot_id)
                .await
                .ok_or_else(|| LedgerError::NotFound(format!("master lot {lot_id}")))?;
        }

        // Both location keys, acquired in the fixed global order regardless
        // of transfer direction. No lot key: a transfer moves lot stock
        // between locations without changing the lot total, so the ceiling
        // cannot be violated.
        let keys = vec![
            LockKey::Location(input.origin_warehouse_id, input.origin_location_code.clone()),
            LockKey::Location(
                input.destination_warehouse_id,
                input.destination_location_code.clone(),
            ),
        ];
        let _guards = self.locks.acquire(keys).await;

        let origin_key = PositionKey {
            article_id: input.article_id,
            warehouse_id: input.origin_warehouse_id,
            location_code: input.origin_location_code.clone(),
            lot_id: input.lot_id,
        };
        let quantity = input.quantity;

        {
            let state = self.state.read().await;
            let available = state.quantity(&origin_key);
            if available < quantity {
                return Err(LedgerError::InsufficientStock {
                    article_id: input.article_id,
                    warehouse_id: input.origin_warehouse_id,
                    location_code: input.origin_location_code,
                    available,
                    requested: quantity,
                });
            }
            if let Some(capacity) = destination.capacity {
                let occupied = state.occupancy(
                    input.destination_warehouse_id,
                    &input.destination_location_code,
                );
                if occupied + quantity > capacity {
                    return Err(LedgerError::LocationCapacityExceeded {
                        warehouse_id: input.destination_warehouse_id,
                        location_code: input.destination_location_code,
                        capacity,
                        occupied,
                        incoming: quantity,
                    });
                }
            }
        }

        let transfer_id = Uuid::new_v4();
        let created_at = Utc::now();
        let exit = Movement {
            id: self.next_id(),
            movement_type: MovementType::Exit,
            article_id: input.article_id,
            warehouse_id: input.origin_warehouse_id,
            location_code: input.origin_location_code,
            quantity,
            lot_id: input.lot_id,
            transfer_id: Some(transfer_id),
            destination_warehouse_id: Some(input.destination_warehouse_id),
            destination_location_code: Some(input.destination_location_code.clone()),
            reason: input.reason.clone(),
            created_by: input.created_by,
            created_at,
        };
        let entry = Movement {
            id: self.next_id(),
            movement_type: MovementType::Entry,
            article_id: input.article_id,
            warehouse_id: input.destination_warehouse_id,
            location_code: input.destination_location_code,
            quantity,
            lot_id: input.lot_id,
            transfer_id: Some(transfer_id),
            destination_warehouse_id: None,
            destination_location_code: None,
            reason: input.reason,
            created_by: input.created_by,
            created_at,
        };
        let ids = (exit.id, entry.id);
        self.commit(vec![exit, entry]).await;
        info!(
            transfer_id = %transfer_id,
            exit_id = %ids.0,
            entry_id = %ids.1,
            "Recorded transfer"
        );
        Ok(ids)
    }

    fn validate_movement_input(input: &RecordMovementInput) -> Result<(), LedgerError> {
        if input.quantity <= 0 {
            return Err(LedgerError::Validation(format!(
                "movement quantity must be positive, got {}",
                input.quantity
            )));
        }
        if matches!(input.movement_type, MovementType::Adjustment(_))
            && input
                .reason
                .as_deref()
                .is_none_or(|reason| reason.trim().is_empty())
        {
            return Err(LedgerError::Validation(
                "adjustment movements require a non-empty reason".to_string(),
            ));
        }
        Ok(())
    }

    fn next_id(&self) -> MovementId {
        MovementId::new(self.sequence.fetch_add(1, Ordering::Relaxed))
    }

    /// Append movements and apply them to the projection in one critical
    /// section. Callers hold the relevant key locks, so the write lock here
    /// only orders the in-memory apply against readers.
    async fn commit(&self, movements: Vec<Movement>) {
        let mut state = self.state.write().await;
        for movement in movements {
            projection::apply(&mut state.positions, &movement);
            state.log.push(movement);
        }
    }

    // =========================================================================
    // Queries & reports
    // =========================================================================

    /// Current quantity for one position key.
    pub async fn get_position(&self, key: &PositionKey) -> i64 {
        self.state.read().await.quantity(key)
    }

    /// Derived occupancy of a location: the sum of all resident stock.
    pub async fn location_occupancy(&self, warehouse_id: WarehouseId, code: &str) -> i64 {
        self.state.read().await.occupancy(warehouse_id, code)
    }

    /// Stock on hand for an article in a warehouse, one row per
    /// (location, lot), sorted by location then lot.
    pub async fn get_stock_position(
        &self,
        article_id: ArticleId,
        warehouse_id: WarehouseId,
    ) -> Vec<PositionRow> {
        let state = self.state.read().await;
        let mut rows: Vec<PositionRow> = state
            .positions
            .iter()
            .filter(|(key, _)| key.article_id == article_id && key.warehouse_id == warehouse_id)
            .map(|(key, position)| PositionRow {
                article_id: key.article_id,
                warehouse_id: key.warehouse_id,
                location_code: key.location_code.clone(),
                lot_id: key.lot_id,
                quantity: position.quantity,
            })
            .collect();
        rows.sort_by(|a, b| {
            (a.location_code.as_str(), a.lot_id).cmp(&(b.location_code.as_str(), b.lot_id))
        });
        rows
    }

    /// Movement history for a warehouse, newest first. Transfer legs count
    /// toward the warehouse they touched.
    pub async fn get_movement_history(
        &self,
        warehouse_id: WarehouseId,
        limit: usize,
    ) -> Vec<Movement> {
        let state = self.state.read().await;
        state
            .log
            .iter()
            .rev()
            .filter(|movement| movement.warehouse_id == warehouse_id)
            .take(limit)
            .cloned()
            .collect()
    }

    /// Aging report for a warehouse as of now.
    pub async fn get_aging_report(&self, warehouse_id: WarehouseId) -> Vec<AgedPositionRow> {
        self.aging_report_at(warehouse_id, Utc::now()).await
    }

    /// Aging report for a warehouse as of `now`; oldest stock first.
    ///
    /// Recomputed on every query from the projection's residency timestamps;
    /// nothing is persisted.
    pub async fn aging_report_at(
        &self,
        warehouse_id: WarehouseId,
        now: DateTime<Utc>,
    ) -> Vec<AgedPositionRow> {
        let state = self.state.read().await;
        let mut rows: Vec<AgedPositionRow> = state
            .positions
            .iter()
            .filter(|(key, _)| key.warehouse_id == warehouse_id)
            .filter_map(|(key, position)| {
                let entered_at = position.entered_at?;
                let age_days = aging_days(entered_at, now);
                Some(AgedPositionRow {
                    position: PositionRow {
                        article_id: key.article_id,
                        warehouse_id: key.warehouse_id,
                        location_code: key.location_code.clone(),
                        lot_id: key.lot_id,
                        quantity: position.quantity,
                    },
                    entered_at,
                    age_days,
                    band: AgingBand::classify(age_days),
                })
            })
            .collect();
        rows.sort_by(|a, b| {
            b.age_days
                .cmp(&a.age_days)
                .then_with(|| a.position.location_code.cmp(&b.position.location_code))
        });
        rows
    }

    /// Expiration calendar as of today, sorted ascending by expiration date.
    pub async fn get_expiration_calendar(
        &self,
        warehouse_id: Option<WarehouseId>,
    ) -> Vec<LotExpirationRow> {
        self.expiration_calendar_at(warehouse_id, Utc::now().date_naive())
            .await
    }

    /// Expiration calendar as of `today`.
    ///
    /// One row per lot (master and export) carrying an expiration date. With
    /// a warehouse filter, only lots whose master has stock on hand in that
    /// warehouse are listed, and `on_hand` is scoped to it.
    pub async fn expiration_calendar_at(
        &self,
        warehouse_id: Option<WarehouseId>,
        today: NaiveDate,
    ) -> Vec<LotExpirationRow> {
        let masters = self.lots.list_master_lots().await;
        let exports = self.lots.list_all_export_lots().await;
        let state = self.state.read().await;

        let mut rows = Vec::new();
        let mut on_hand_by_master: HashMap<MasterLotId, i64> = HashMap::new();
        for master in &masters {
            on_hand_by_master.insert(master.id, state.lot_on_hand(master.id, warehouse_id));
        }

        for master in &masters {
            let Some(expiration_date) = master.expiration_date else {
                continue;
            };
            let on_hand = on_hand_by_master.get(&master.id).copied().unwrap_or(0);
            if warehouse_id.is_some() && on_hand == 0 {
                continue;
            }
            let days = days_until_expiration(expiration_date, today);
            rows.push(LotExpirationRow {
                level: LotLevel::Master,
                lot_code: master.code.clone(),
                article_id: master.article_id,
                quantity: master.quantity,
                on_hand,
                expiration_date,
                days_until_expiration: days,
                band: ExpirationBand::classify(days),
            });
        }

        for export in &exports {
            let Some(expiration_date) = export.expiration_date else {
                continue;
            };
            let Some(master) = masters.iter().find(|m| m.id == export.master_lot_id) else {
                continue;
            };
            let on_hand = on_hand_by_master.get(&master.id).copied().unwrap_or(0);
            if warehouse_id.is_some() && on_hand == 0 {
                continue;
            }
            let days = days_until_expiration(expiration_date, today);
            rows.push(LotExpirationRow {
                level: LotLevel::Export,
                lot_code: export.code.clone(),
                article_id: master.article_id,
                quantity: export.quantity,
                on_hand,
                expiration_date,
                days_until_expiration: days,
                band: ExpirationBand::classify(days),
            });
        }

        rows.sort_by(|a, b| {
            a.expiration_date
                .cmp(&b.expiration_date)
                .then_with(|| a.lot_code.cmp(&b.lot_code))
        });
        rows
    }

    // =========================================================================
    // Projection audit
    // =========================================================================

    /// Snapshot of the full movement log, in append order.
    pub async fn movement_log(&self) -> Vec<Movement> {
        self.state.read().await.log.clone()
    }

    /// Snapshot of the live projection.
    pub async fn positions_snapshot(&self) -> HashMap<PositionKey, PositionState> {
        self.state.read().await.positions.clone()
    }

    /// Rebuild the projection by replaying the movement log from empty state.
    ///
    /// Must always equal [`Self::positions_snapshot`] at quiescence.
    pub async fn rebuild_positions(&self) -> HashMap<PositionKey, PositionState> {
        let state = self.state.read().await;
        projection::rebuild(&state.log)
    }
}
