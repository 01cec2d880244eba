//! End-to-end stock flow scenarios: the full lot-to-ledger path, conservation
//! and the reporting projections.

use assetflow_core::{ArticleId, MovementType, WarehouseId};
use assetflow_integration_tests::{Harness, movement, transfer};
use assetflow_ledger::LedgerError;
use assetflow_ledger::expiration::ExpirationBand;
use assetflow_ledger::models::{
    CreateExportLotInput, CreateMasterLotInput, GenerateTraceCodesInput, Movement, PositionKey,
};
use chrono::{NaiveDate, TimeDelta, Utc};

const SKU_1: ArticleId = ArticleId::new(1);
const WH_A: WarehouseId = WarehouseId::new(1);

fn position(location: &str) -> PositionKey {
    PositionKey {
        article_id: SKU_1,
        warehouse_id: WH_A,
        location_code: location.to_string(),
        lot_id: None,
    }
}

// =============================================================================
// The worked scenario: master lot to final positions
// =============================================================================

#[tokio::test]
async fn test_master_lot_to_final_positions() {
    let harness = Harness::new();
    harness.add_location(WH_A, "A1-01", None).await;
    harness.add_location(WH_A, "A1-02", None).await;

    // MasterLot LM-001, quantity 100.
    let master = harness
        .lots
        .create_master_lot(CreateMasterLotInput {
            code: "LM-001".to_string(),
            article_id: SKU_1,
            quantity: 100,
            production_date: None,
            expiration_date: None,
        })
        .await
        .unwrap();

    // ExportLot LE-001 quantity 40 fits; a second one of 70 does not.
    let export = harness
        .lots
        .create_export_lot(CreateExportLotInput {
            code: "LE-001".to_string(),
            master_lot_id: master.id,
            quantity: 40,
            destination: Some("Rotterdam".to_string()),
            expiration_date: None,
        })
        .await
        .unwrap();
    let err = harness
        .lots
        .create_export_lot(CreateExportLotInput {
            code: "LE-002".to_string(),
            master_lot_id: master.id,
            quantity: 70,
            destination: None,
            expiration_date: None,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::LotQuantityExceeded { .. }));

    // 40 trace codes fit; one more does not.
    let codes = harness
        .lots
        .generate_trace_codes(GenerateTraceCodesInput {
            export_lot_id: export.id,
            count: 40,
            prefix: None,
        })
        .await
        .unwrap();
    assert_eq!(codes.len(), 40);
    let err = harness
        .lots
        .generate_trace_codes(GenerateTraceCodesInput {
            export_lot_id: export.id,
            count: 1,
            prefix: None,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::LotQuantityExceeded { .. }));

    // Entry 40 at A1-01, transfer 10 to A1-02, exit 5.
    harness
        .ledger
        .record_movement(movement(MovementType::Entry, SKU_1, WH_A, "A1-01", 40))
        .await
        .unwrap();
    harness
        .ledger
        .record_transfer(transfer(SKU_1, (WH_A, "A1-01"), (WH_A, "A1-02"), 10))
        .await
        .unwrap();
    harness
        .ledger
        .record_movement(movement(MovementType::Exit, SKU_1, WH_A, "A1-01", 5))
        .await
        .unwrap();

    assert_eq!(harness.ledger.get_position(&position("A1-01")).await, 25);
    assert_eq!(harness.ledger.get_position(&position("A1-02")).await, 10);

    // Conservation: the projection equals a replay of the log from empty.
    assert_eq!(
        harness.ledger.rebuild_positions().await,
        harness.ledger.positions_snapshot().await
    );

    // Stock-on-hand report covers both locations.
    let rows = harness.ledger.get_stock_position(SKU_1, WH_A).await;
    let by_location: Vec<(&str, i64)> = rows
        .iter()
        .map(|row| (row.location_code.as_str(), row.quantity))
        .collect();
    assert_eq!(by_location, vec![("A1-01", 25), ("A1-02", 10)]);
}

// =============================================================================
// Conservation across movement types
// =============================================================================

#[tokio::test]
async fn test_signed_sum_conservation_per_key() {
    let harness = Harness::new();
    harness.add_location(WH_A, "A1-01", None).await;
    harness.add_location(WH_A, "A1-02", None).await;

    harness
        .ledger
        .record_movement(movement(MovementType::Entry, SKU_1, WH_A, "A1-01", 30))
        .await
        .unwrap();
    harness
        .ledger
        .record_transfer(transfer(SKU_1, (WH_A, "A1-01"), (WH_A, "A1-02"), 12))
        .await
        .unwrap();

    let mut adjustment = movement(
        MovementType::Adjustment(assetflow_core::AdjustmentDirection::Decrease),
        SKU_1,
        WH_A,
        "A1-02",
        2,
    );
    adjustment.reason = Some("damaged in putaway".to_string());
    harness.ledger.record_movement(adjustment).await.unwrap();

    // Per-key signed sums.
    assert_eq!(harness.ledger.get_position(&position("A1-01")).await, 18);
    assert_eq!(harness.ledger.get_position(&position("A1-02")).await, 10);

    // Warehouse total = entries - exits + signed adjustments. The transfer
    // legs cancel out.
    let log = harness.ledger.movement_log().await;
    let total: i64 = log.iter().map(Movement::signed_quantity).sum();
    assert_eq!(total, 28);
    assert_eq!(harness.ledger.location_occupancy(WH_A, "A1-01").await, 18);
    assert_eq!(harness.ledger.location_occupancy(WH_A, "A1-02").await, 10);
}

// =============================================================================
// Expiration calendar
// =============================================================================

#[tokio::test]
async fn test_expiration_calendar_is_sorted_and_banded() {
    let harness = Harness::new();
    harness.add_location(WH_A, "A1-01", None).await;
    let today = Utc::now().date_naive();

    let near = harness
        .lots
        .create_master_lot(CreateMasterLotInput {
            code: "LM-NEAR".to_string(),
            article_id: SKU_1,
            quantity: 50,
            production_date: None,
            expiration_date: Some(today + TimeDelta::days(10)),
        })
        .await
        .unwrap();
    harness
        .lots
        .create_master_lot(CreateMasterLotInput {
            code: "LM-FAR".to_string(),
            article_id: SKU_1,
            quantity: 50,
            production_date: None,
            expiration_date: Some(today + TimeDelta::days(200)),
        })
        .await
        .unwrap();
    harness
        .lots
        .create_master_lot(CreateMasterLotInput {
            code: "LM-PAST".to_string(),
            article_id: SKU_1,
            quantity: 50,
            production_date: None,
            expiration_date: Some(today - TimeDelta::days(3)),
        })
        .await
        .unwrap();

    let rows = harness.ledger.get_expiration_calendar(None).await;
    let codes: Vec<&str> = rows.iter().map(|row| row.lot_code.as_str()).collect();
    assert_eq!(codes, vec!["LM-PAST", "LM-NEAR", "LM-FAR"]);
    assert_eq!(rows[0].band, ExpirationBand::Expired);
    assert_eq!(rows[1].band, ExpirationBand::Expiring);
    assert_eq!(rows[2].band, ExpirationBand::Current);

    // With a warehouse filter only lots with on-hand stock appear.
    let mut entry = movement(MovementType::Entry, SKU_1, WH_A, "A1-01", 20);
    entry.lot_id = Some(near.id);
    harness.ledger.record_movement(entry).await.unwrap();

    let filtered = harness.ledger.get_expiration_calendar(Some(WH_A)).await;
    assert_eq!(filtered.len(), 1);
    assert_eq!(filtered[0].lot_code, "LM-NEAR");
    assert_eq!(filtered[0].on_hand, 20);
}

// =============================================================================
// Fixed-date calendar math
// =============================================================================

#[tokio::test]
async fn test_expiration_calendar_at_fixed_date() {
    let harness = Harness::new();
    let today = NaiveDate::from_ymd_opt(2026, 8, 1).unwrap();

    harness
        .lots
        .create_master_lot(CreateMasterLotInput {
            code: "LM-001".to_string(),
            article_id: SKU_1,
            quantity: 10,
            production_date: None,
            expiration_date: Some(NaiveDate::from_ymd_opt(2026, 10, 1).unwrap()),
        })
        .await
        .unwrap();

    let rows = harness.ledger.expiration_calendar_at(None, today).await;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].days_until_expiration, 61);
    assert_eq!(rows[0].band, ExpirationBand::ExpiringSoon);
}
