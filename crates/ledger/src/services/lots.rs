//! Lot hierarchy service: master lots, export lots and trace codes.
//!
//! Enforces the genealogy quantity bounds: export lot quantities never sum
//! past their master lot's ceiling, and trace code counts never exceed their
//! export lot's quantity. All mutations take the
//! state write lock for the whole validate-then-insert step, so concurrent
//! shipment planning against one master lot is serialized.

use std::collections::HashMap;

use assetflow_core::{
    ActorId, ExportLotId, MasterLotId, TraceCodeId, TraceStatus, WarehouseId,
};
use chrono::Utc;
use tokio::sync::RwLock;
use tracing::{info, instrument, warn};

use crate::error::LedgerError;
use crate::models::{
    CreateExportLotInput, CreateMasterLotInput, ExportLot, GenerateTraceCodesInput, MasterLot,
    TraceCode,
};

#[derive(Debug, Default)]
struct HierarchyState {
    masters: HashMap<MasterLotId, MasterLot>,
    exports: HashMap<ExportLotId, ExportLot>,
    traces: HashMap<TraceCodeId, TraceCode>,
    master_codes: HashMap<String, MasterLotId>,
    export_codes: HashMap<String, ExportLotId>,
    trace_codes: HashMap<String, TraceCodeId>,
    next_master_id: i32,
    next_export_id: i32,
    next_trace_id: i32,
}

impl HierarchyState {
    fn export_allocated(&self, master_lot_id: MasterLotId) -> i64 {
        self.exports
            .values()
            .filter(|export| export.master_lot_id == master_lot_id)
            .map(|export| export.quantity)
            .sum()
    }

    fn trace_count(&self, export_lot_id: ExportLotId) -> i64 {
        let count = self
            .traces
            .values()
            .filter(|trace| trace.export_lot_id == export_lot_id)
            .count();
        i64::try_from(count).unwrap_or(i64::MAX)
    }
}

/// The three-level lot genealogy: master lot -> export lot -> trace code.
///
/// Lots are deactivated when consumed or expired, never deleted; the
/// genealogy is the recall audit trail.
#[derive(Debug, Default)]
pub struct LotHierarchy {
    state: RwLock<HierarchyState>,
}

impl LotHierarchy {
    /// Create an empty hierarchy.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Register a master lot from production.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::Validation` for an empty code or non-positive
    /// quantity, and `LedgerError::Conflict` for a duplicate code.
    #[instrument(skip(self, input), fields(code = %input.code))]
    pub async fn create_master_lot(
        &self,
        input: CreateMasterLotInput,
    ) -> Result<MasterLot, LedgerError> {
        if input.code.trim().is_empty() {
            return Err(LedgerError::Validation(
                "master lot code must not be empty".to_string(),
            ));
        }
        if input.quantity <= 0 {
            return Err(LedgerError::Validation(format!(
                "master lot quantity must be positive, got {}",
                input.quantity
            )));
        }

        let mut state = self.state.write().await;
        if state.master_codes.contains_key(&input.code) {
            return Err(LedgerError::Conflict(format!(
                "master lot code {} already exists",
                input.code
            )));
        }

        state.next_master_id += 1;
        let lot = MasterLot {
            id: MasterLotId::new(state.next_master_id),
            code: input.code,
            article_id: input.article_id,
            quantity: input.quantity,
            production_date: input.production_date,
            expiration_date: input.expiration_date,
            active: true,
            created_at: Utc::now(),
        };
        state.master_codes.insert(lot.code.clone(), lot.id);
        state.masters.insert(lot.id, lot.clone());
        info!(lot_id = %lot.id, quantity = lot.quantity, "Registered master lot");
        Ok(lot)
    }

    /// Carve an export lot out of a master lot.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::LotQuantityExceeded` if the new quantity plus
    /// the quantities already carved out would exceed the master ceiling.
    /// Also validates code, quantity and master liveness.
    #[instrument(skip(self, input), fields(code = %input.code, master = %input.master_lot_id))]
    pub async fn create_export_lot(
        &self,
        input: CreateExportLotInput,
    ) -> Result<ExportLot, LedgerError> {
        if input.code.trim().is_empty() {
            return Err(LedgerError::Validation(
                "export lot code must not be empty".to_string(),
            ));
        }
        if input.quantity <= 0 {
            return Err(LedgerError::Validation(format!(
                "export lot quantity must be positive, got {}",
                input.quantity
            )));
        }

        let mut state = self.state.write().await;
        let master = state
            .masters
            .get(&input.master_lot_id)
            .ok_or_else(|| LedgerError::NotFound(format!("master lot {}", input.master_lot_id)))?
            .clone();
        if !master.active {
            return Err(LedgerError::Validation(format!(
                "master lot {} is no longer active",
                master.code
            )));
        }
        if state.export_codes.contains_key(&input.code) {
            return Err(LedgerError::Conflict(format!(
                "export lot code {} already exists",
                input.code
            )));
        }

        let allocated = state.export_allocated(master.id);
        if allocated + input.quantity > master.quantity {
            return Err(LedgerError::LotQuantityExceeded {
                lot_code: master.code,
                ceiling: master.quantity,
                committed: allocated,
                requested: input.quantity,
            });
        }

        state.next_export_id += 1;
        let lot = ExportLot {
            id: ExportLotId::new(state.next_export_id),
            code: input.code,
            master_lot_id: master.id,
            quantity: input.quantity,
            destination: input.destination,
            expiration_date: input.expiration_date.or(master.expiration_date),
            active: true,
            created_at: Utc::now(),
        };
        state.export_codes.insert(lot.code.clone(), lot.id);
        state.exports.insert(lot.id, lot.clone());
        info!(lot_id = %lot.id, quantity = lot.quantity, "Created export lot");
        Ok(lot)
    }

    /// Generate a batch of trace codes for an export lot at packing time.
    ///
    /// Codes are `prefix + zero-padded sequence`, the sequence continuing
    /// from the number of codes already generated for the lot. Generation is
    /// atomic: either all `count` codes are created or none are.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::LotQuantityExceeded` if `count` plus the codes
    /// already generated would exceed the export lot quantity, and
    /// `LedgerError::Conflict` if a custom prefix collides with existing
    /// codes.
    #[instrument(skip(self, input), fields(export = %input.export_lot_id, count = input.count))]
    pub async fn generate_trace_codes(
        &self,
        input: GenerateTraceCodesInput,
    ) -> Result<Vec<TraceCode>, LedgerError> {
        if input.count <= 0 {
            return Err(LedgerError::Validation(format!(
                "trace code count must be positive, got {}",
                input.count
            )));
        }

        let mut state = self.state.write().await;
        let export = state
            .exports
            .get(&input.export_lot_id)
            .ok_or_else(|| LedgerError::NotFound(format!("export lot {}", input.export_lot_id)))?
            .clone();

        let existing = state.trace_count(export.id);
        if existing + input.count > export.quantity {
            return Err(LedgerError::LotQuantityExceeded {
                lot_code: export.code,
                ceiling: export.quantity,
                committed: existing,
                requested: input.count,
            });
        }

        let master = state
            .masters
            .get(&export.master_lot_id)
            .ok_or_else(|| LedgerError::NotFound(format!("master lot {}", export.master_lot_id)))?;
        let article_id = master.article_id;
        let prefix = input.prefix.unwrap_or_else(|| export.code.clone());

        // Pre-compute the whole batch and check collisions before inserting
        // anything, so a failure leaves no partial generation behind.
        let codes: Vec<String> = (1..=input.count)
            .map(|offset| format!("{prefix}-{:06}", existing + offset))
            .collect();
        if let Some(taken) = codes.iter().find(|code| state.trace_codes.contains_key(*code)) {
            return Err(LedgerError::Conflict(format!(
                "trace code {taken} already exists"
            )));
        }

        let created_at = Utc::now();
        let mut generated = Vec::with_capacity(codes.len());
        for code in codes {
            state.next_trace_id += 1;
            let trace = TraceCode {
                id: TraceCodeId::new(state.next_trace_id),
                code,
                export_lot_id: export.id,
                article_id,
                warehouse_id: None,
                location_code: None,
                status: TraceStatus::Available,
                created_at,
            };
            state.trace_codes.insert(trace.code.clone(), trace.id);
            state.traces.insert(trace.id, trace.clone());
            generated.push(trace);
        }
        info!(
            export_lot = %export.code,
            generated = generated.len(),
            "Generated trace codes"
        );
        Ok(generated)
    }

    /// Advance a trace code one step along its lifecycle.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::InvalidStatusTransition` for anything other than
    /// the single forward step, and `LedgerError::NotFound` for an unknown
    /// code.
    #[instrument(skip(self))]
    pub async fn transition_trace_code(
        &self,
        code: &str,
        to: TraceStatus,
    ) -> Result<TraceCode, LedgerError> {
        let mut state = self.state.write().await;
        let id = *state
            .trace_codes
            .get(code)
            .ok_or_else(|| LedgerError::NotFound(format!("trace code {code}")))?;
        let trace = state
            .traces
            .get_mut(&id)
            .ok_or_else(|| LedgerError::NotFound(format!("trace code {code}")))?;

        trace.status = trace.status.transition_to(to).map_err(|source| {
            LedgerError::InvalidStatusTransition {
                code: code.to_string(),
                source,
            }
        })?;
        info!(code, status = %trace.status, "Trace code transitioned");
        Ok(trace.clone())
    }

    /// Force a trace code to an arbitrary status, outside the monotonic path.
    ///
    /// This is the separately-audited correction used for recall processing;
    /// it requires a reason and is logged at warn level. It is never reached
    /// through [`Self::transition_trace_code`].
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::Validation` for an empty reason and
    /// `LedgerError::NotFound` for an unknown code.
    #[instrument(skip(self, reason))]
    pub async fn correct_trace_code_status(
        &self,
        code: &str,
        to: TraceStatus,
        reason: &str,
        actor: ActorId,
    ) -> Result<TraceCode, LedgerError> {
        if reason.trim().is_empty() {
            return Err(LedgerError::Validation(
                "trace code correction requires a reason".to_string(),
            ));
        }
        let mut state = self.state.write().await;
        let id = *state
            .trace_codes
            .get(code)
            .ok_or_else(|| LedgerError::NotFound(format!("trace code {code}")))?;
        let trace = state
            .traces
            .get_mut(&id)
            .ok_or_else(|| LedgerError::NotFound(format!("trace code {code}")))?;

        warn!(
            code,
            from = %trace.status,
            to = %to,
            actor = %actor,
            reason,
            "Trace code status forcibly corrected"
        );
        trace.status = to;
        Ok(trace.clone())
    }

    /// Record where a unit was put away.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::NotFound` for an unknown code.
    pub async fn assign_trace_location(
        &self,
        code: &str,
        warehouse_id: WarehouseId,
        location_code: &str,
    ) -> Result<TraceCode, LedgerError> {
        let mut state = self.state.write().await;
        let id = *state
            .trace_codes
            .get(code)
            .ok_or_else(|| LedgerError::NotFound(format!("trace code {code}")))?;
        let trace = state
            .traces
            .get_mut(&id)
            .ok_or_else(|| LedgerError::NotFound(format!("trace code {code}")))?;
        trace.warehouse_id = Some(warehouse_id);
        trace.location_code = Some(location_code.to_string());
        Ok(trace.clone())
    }

    /// Mark a master lot inactive (fully consumed or expired). Never deletes.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::NotFound` for an unknown lot.
    pub async fn deactivate_master_lot(&self, id: MasterLotId) -> Result<MasterLot, LedgerError> {
        let mut state = self.state.write().await;
        let lot = state
            .masters
            .get_mut(&id)
            .ok_or_else(|| LedgerError::NotFound(format!("master lot {id}")))?;
        lot.active = false;
        info!(code = %lot.code, "Deactivated master lot");
        Ok(lot.clone())
    }

    /// Mark an export lot inactive. Never deletes.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::NotFound` for an unknown lot.
    pub async fn deactivate_export_lot(&self, id: ExportLotId) -> Result<ExportLot, LedgerError> {
        let mut state = self.state.write().await;
        let lot = state
            .exports
            .get_mut(&id)
            .ok_or_else(|| LedgerError::NotFound(format!("export lot {id}")))?;
        lot.active = false;
        info!(code = %lot.code, "Deactivated export lot");
        Ok(lot.clone())
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Get a master lot by ID.
    pub async fn get_master_lot(&self, id: MasterLotId) -> Option<MasterLot> {
        self.state.read().await.masters.get(&id).cloned()
    }

    /// Get a master lot by code.
    pub async fn get_master_lot_by_code(&self, code: &str) -> Option<MasterLot> {
        let state = self.state.read().await;
        let id = state.master_codes.get(code)?;
        state.masters.get(id).cloned()
    }

    /// Get an export lot by ID.
    pub async fn get_export_lot(&self, id: ExportLotId) -> Option<ExportLot> {
        self.state.read().await.exports.get(&id).cloned()
    }

    /// Get a trace code by its printable code.
    pub async fn get_trace_code(&self, code: &str) -> Option<TraceCode> {
        let state = self.state.read().await;
        let id = state.trace_codes.get(code)?;
        state.traces.get(id).cloned()
    }

    /// List all master lots, sorted by code.
    pub async fn list_master_lots(&self) -> Vec<MasterLot> {
        let state = self.state.read().await;
        let mut lots: Vec<MasterLot> = state.masters.values().cloned().collect();
        lots.sort_by(|a, b| a.code.cmp(&b.code));
        lots
    }

    /// List the export lots of a master lot, sorted by code.
    pub async fn list_export_lots(&self, master_lot_id: MasterLotId) -> Vec<ExportLot> {
        let state = self.state.read().await;
        let mut lots: Vec<ExportLot> = state
            .exports
            .values()
            .filter(|export| export.master_lot_id == master_lot_id)
            .cloned()
            .collect();
        lots.sort_by(|a, b| a.code.cmp(&b.code));
        lots
    }

    /// List all export lots, sorted by code.
    pub async fn list_all_export_lots(&self) -> Vec<ExportLot> {
        let state = self.state.read().await;
        let mut lots: Vec<ExportLot> = state.exports.values().cloned().collect();
        lots.sort_by(|a, b| a.code.cmp(&b.code));
        lots
    }

    /// List the trace codes of an export lot, sorted by code.
    pub async fn list_trace_codes(&self, export_lot_id: ExportLotId) -> Vec<TraceCode> {
        let state = self.state.read().await;
        let mut traces: Vec<TraceCode> = state
            .traces
            .values()
            .filter(|trace| trace.export_lot_id == export_lot_id)
            .cloned()
            .collect();
        traces.sort_by(|a, b| a.code.cmp(&b.code));
        traces
    }

    /// Total export-lot quantity already carved out of a master lot.
    pub async fn export_allocated(&self, master_lot_id: MasterLotId) -> i64 {
        self.state.read().await.export_allocated(master_lot_id)
    }

    /// Number of trace codes already generated for an export lot.
    pub async fn trace_count(&self, export_lot_id: ExportLotId) -> i64 {
        self.state.read().await.trace_count(export_lot_id)
    }
}
