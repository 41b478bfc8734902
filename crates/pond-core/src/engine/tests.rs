use chrono::{DateTime, TimeZone, Utc};
use contracts::{
    EngineConfig, HarvestRequest, HarvestType, PondGeometry, PondUpdate, SaleRequest, StatusOrigin,
    StatusTier,
};

use super::*;
use crate::collaborators::{SaleLedger, SaleLedgerError};
use crate::error::EngineError;

struct RecordingSaleLedger {
    sales: Mutex<Vec<SaleRequest>>,
}

impl RecordingSaleLedger {
    fn new() -> Self {
        Self {
            sales: Mutex::new(Vec::new()),
        }
    }
}

impl SaleLedger for RecordingSaleLedger {
    fn record_sale(&self, request: SaleRequest) -> std::result::Result<String, SaleLedgerError> {
        let mut sales = self.sales.lock().expect("sale lock");
        sales.push(request);
        Ok(format!("sale_{:04}", sales.len()))
    }
}

struct RejectingSaleLedger;

impl SaleLedger for RejectingSaleLedger {
    fn record_sale(&self, _request: SaleRequest) -> std::result::Result<String, SaleLedgerError> {
        Err(SaleLedgerError("buyer account is closed".to_string()))
    }
}

struct FailingHook;

impl CommitHook for FailingHook {
    fn persist(&self, _staged: StagedMutation<'_>) -> std::result::Result<(), CommitHookError> {
        Err(CommitHookError("disk full".to_string()))
    }
}

fn at(day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, day, 9, 0, 0).unwrap()
}

fn hundred_m3() -> Option<PondGeometry> {
    Some(PondGeometry {
        length_m: 10.0,
        width_m: 5.0,
        depth_m: 2.0,
    })
}

fn engine_with_pond() -> (PondEngine, String) {
    let engine = PondEngine::new(EngineConfig::default());
    let record = engine
        .create_pond("farm_01", "kolam utara", hundred_m3())
        .expect("create pond");
    (engine, record.pond_id)
}

fn harvest_request(count: i64, weight_kg: f64, day: u32) -> HarvestRequest {
    HarvestRequest {
        weight_kg,
        count,
        price_per_kg: 25_000.0,
        harvest_type: HarvestType::Partial,
        note: None,
        recorded_at: at(day),
        buyer_id: None,
    }
}

#[test]
fn stocking_correction_harvest_keeps_running_totals() {
    let (engine, pond_id) = engine_with_pond();
    let sales = RecordingSaleLedger::new();

    engine
        .apply_delta(&pond_id, 5000, "stocking", at(1))
        .expect("stocking");
    engine
        .apply_delta(&pond_id, -200, "mortality correction", at(5))
        .expect("correction");
    engine
        .record_harvest(&pond_id, &harvest_request(800, 90.0, 10), &sales)
        .expect("harvest");

    let record = engine.get_pond(&pond_id).expect("pond");
    assert_eq!(record.population, 4000);

    let events = engine.population_events(&pond_id).expect("events");
    assert_eq!(events.len(), 3);
    // Newest first: harvest decrement, correction, stocking.
    assert_eq!(
        events.iter().map(|event| event.resulting_total).collect::<Vec<_>>(),
        vec![4000, 4800, 5000]
    );
    assert!(events.iter().all(|event| event.resulting_total >= 0));
    assert_eq!(
        events.iter().map(|event| event.delta).sum::<i64>(),
        record.population
    );
}

#[test]
fn harvest_exceeding_population_is_rejected_without_writes() {
    let (engine, pond_id) = engine_with_pond();
    let sales = RecordingSaleLedger::new();
    engine
        .apply_delta(&pond_id, 1000, "stocking", at(1))
        .expect("stocking");

    let err = engine
        .record_harvest(&pond_id, &harvest_request(1200, 100.0, 2), &sales)
        .expect_err("over-harvest");
    assert!(matches!(
        err,
        EngineError::OverHarvestCount {
            requested: 1200,
            available: 1000
        }
    ));

    assert_eq!(engine.get_pond(&pond_id).expect("pond").population, 1000);
    assert_eq!(engine.population_events(&pond_id).expect("events").len(), 1);
    assert!(engine.harvest_events(&pond_id).expect("harvests").is_empty());
}

#[test]
fn zero_delta_is_an_error_not_a_silent_noop() {
    let (engine, pond_id) = engine_with_pond();
    let err = engine
        .apply_delta(&pond_id, 0, "noop", at(1))
        .expect_err("zero delta");
    assert_eq!(err, EngineError::ZeroDelta);
    assert!(engine.population_events(&pond_id).expect("events").is_empty());
}

#[test]
fn correction_below_zero_is_rejected() {
    let (engine, pond_id) = engine_with_pond();
    engine
        .apply_delta(&pond_id, 300, "stocking", at(1))
        .expect("stocking");
    let err = engine
        .apply_delta(&pond_id, -400, "overcorrection", at(2))
        .expect_err("negative total");
    assert!(matches!(
        err,
        EngineError::PopulationWouldGoNegative {
            current: 300,
            delta: -400
        }
    ));
    assert_eq!(engine.get_pond(&pond_id).expect("pond").population, 300);
}

#[test]
fn first_stocking_fixes_the_stocking_date() {
    let (engine, pond_id) = engine_with_pond();
    assert!(engine.get_pond(&pond_id).expect("pond").stocked_at.is_none());

    engine
        .apply_delta(&pond_id, 2000, "stocking", at(3))
        .expect("stocking");
    let stocked_at = engine.get_pond(&pond_id).expect("pond").stocked_at;
    assert_eq!(stocked_at, Some(at(3).date_naive()));

    engine
        .apply_delta(&pond_id, 500, "restock", at(9))
        .expect("restock");
    assert_eq!(engine.get_pond(&pond_id).expect("pond").stocked_at, stocked_at);
}

#[test]
fn unknown_pond_is_reported_as_not_found() {
    let engine = PondEngine::new(EngineConfig::default());
    let err = engine
        .apply_delta("pond_9999", 10, "stocking", at(1))
        .expect_err("missing pond");
    assert!(matches!(err, EngineError::PondNotFound(_)));
}

#[test]
fn partial_geometry_update_keeps_other_dimensions() {
    let (engine, pond_id) = engine_with_pond();
    let update = PondUpdate {
        depth_m: Some(1.5),
        ..PondUpdate::default()
    };
    let record = engine.update_pond(&pond_id, &update).expect("update");
    let geometry = record.geometry.expect("geometry");
    assert_eq!(geometry.length_m, 10.0);
    assert_eq!(geometry.width_m, 5.0);
    assert_eq!(geometry.depth_m, 1.5);
}

#[test]
fn geometry_must_arrive_complete_on_an_unmeasured_pond() {
    let engine = PondEngine::new(EngineConfig::default());
    let record = engine
        .create_pond("farm_01", "kolam baru", None)
        .expect("create");
    let update = PondUpdate {
        length_m: Some(8.0),
        ..PondUpdate::default()
    };
    let err = engine
        .update_pond(&record.pond_id, &update)
        .expect_err("incomplete geometry");
    assert_eq!(err, EngineError::GeometryIncomplete);
}

#[test]
fn non_positive_dimensions_are_rejected() {
    let (engine, pond_id) = engine_with_pond();
    let update = PondUpdate {
        width_m: Some(0.0),
        ..PondUpdate::default()
    };
    let err = engine
        .update_pond(&pond_id, &update)
        .expect_err("bad width");
    assert!(matches!(err, EngineError::InvalidGeometry { .. }));
}

#[test]
fn manual_override_holds_until_the_next_automatic_recompute() {
    let (engine, pond_id) = engine_with_pond();
    let update = PondUpdate {
        manual_status: Some(StatusTier::Berisiko),
        ..PondUpdate::default()
    };
    let record = engine.update_pond(&pond_id, &update).expect("override");
    assert_eq!(record.status, StatusTier::Berisiko);
    assert_eq!(record.status_origin, StatusOrigin::ManualOverride);

    // The next ledger mutation recomputes the cached tier.
    engine
        .apply_delta(&pond_id, 100, "stocking", at(1))
        .expect("stocking");
    let record = engine.get_pond(&pond_id).expect("pond");
    assert_eq!(record.status, StatusTier::Aman);
    assert_eq!(record.status_origin, StatusOrigin::Computed);
}

#[test]
fn cached_tier_tracks_count_density_after_mutations() {
    let (engine, pond_id) = engine_with_pond();
    engine
        .apply_delta(&pond_id, 6000, "stocking", at(1))
        .expect("stocking");
    let record = engine.get_pond(&pond_id).expect("pond");
    // 6000 fish over 100 m3 sits in the caution band on the count basis.
    assert_eq!(record.status, StatusTier::Waspada);

    let classification = engine.classification(&pond_id).expect("classification");
    assert_eq!(classification.tier, record.status);
}

#[test]
fn sampling_with_non_positive_ratio_is_rejected() {
    let (engine, pond_id) = engine_with_pond();
    let err = engine
        .record_sampling(&pond_id, 0.0, None, at(1))
        .expect_err("bad ratio");
    assert!(matches!(err, EngineError::InvalidSampling(_)));
    assert!(engine.sampling_events(&pond_id).expect("events").is_empty());
}

#[test]
fn harvest_weight_beyond_sampled_biomass_is_rejected() {
    let (engine, pond_id) = engine_with_pond();
    let sales = RecordingSaleLedger::new();
    engine
        .apply_delta(&pond_id, 1000, "stocking", at(1))
        .expect("stocking");
    // 10 fish/kg: 100 g each, 100 kg of biomass on the same day.
    engine
        .record_sampling(&pond_id, 10.0, None, at(10))
        .expect("sampling");

    let err = engine
        .record_harvest(&pond_id, &harvest_request(900, 150.0, 10), &sales)
        .expect_err("over biomass");
    assert!(matches!(err, EngineError::OverHarvestBiomass { .. }));
    assert_eq!(engine.get_pond(&pond_id).expect("pond").population, 1000);

    engine
        .record_harvest(&pond_id, &harvest_request(900, 80.0, 10), &sales)
        .expect("within biomass");
    assert_eq!(engine.get_pond(&pond_id).expect("pond").population, 100);
}

#[test]
fn harvest_with_buyer_hands_off_a_matching_sale() {
    let (engine, pond_id) = engine_with_pond();
    let sales = RecordingSaleLedger::new();
    engine
        .apply_delta(&pond_id, 2000, "stocking", at(1))
        .expect("stocking");

    let mut request = harvest_request(500, 60.0, 12);
    request.buyer_id = Some("buyer_07".to_string());
    let harvest = engine
        .record_harvest(&pond_id, &request, &sales)
        .expect("harvest");

    assert_eq!(harvest.sale_id.as_deref(), Some("sale_0001"));
    let recorded = sales.sales.lock().expect("sale lock");
    assert_eq!(recorded.len(), 1);
    assert_eq!(recorded[0].buyer_id, "buyer_07");
    assert_eq!(recorded[0].weight_kg, harvest.weight_kg);
    assert_eq!(recorded[0].count, harvest.count);
    assert_eq!(recorded[0].price_per_kg, harvest.price_per_kg);

    let population_events = engine.population_events(&pond_id).expect("events");
    assert_eq!(population_events[0].event_id, harvest.population_event_id);
    assert_eq!(population_events[0].delta, -500);
}

#[test]
fn failed_sale_handoff_aborts_the_whole_harvest() {
    let (engine, pond_id) = engine_with_pond();
    engine
        .apply_delta(&pond_id, 2000, "stocking", at(1))
        .expect("stocking");

    let mut request = harvest_request(500, 60.0, 12);
    request.buyer_id = Some("buyer_07".to_string());
    let err = engine
        .record_harvest(&pond_id, &request, &RejectingSaleLedger)
        .expect_err("sale rejected");
    assert!(matches!(err, EngineError::SaleHandoffFailed(_)));

    assert_eq!(engine.get_pond(&pond_id).expect("pond").population, 2000);
    assert!(engine.harvest_events(&pond_id).expect("harvests").is_empty());
    assert_eq!(engine.population_events(&pond_id).expect("events").len(), 1);
}

#[test]
fn failed_commit_hook_leaves_memory_untouched() {
    let engine = PondEngine::with_commit_hook(EngineConfig::default(), Box::new(FailingHook));
    let err = engine
        .create_pond("farm_01", "kolam utara", hundred_m3())
        .expect_err("hook fails");
    assert!(matches!(err, EngineError::Storage(_)));
    assert!(engine.list_ponds(None).is_empty());
}

#[test]
fn restore_keeps_the_id_allocator_ahead() {
    let (engine, pond_id) = engine_with_pond();
    let snapshot = engine.snapshot_pond(&pond_id).expect("snapshot");

    let restored = PondEngine::new(EngineConfig::default());
    restored.restore_pond(snapshot);
    let next = restored
        .create_pond("farm_01", "kolam kedua", None)
        .expect("create");
    assert_eq!(next.pond_id, "pond_0002");
}

#[test]
fn list_ponds_filters_by_farm() {
    let engine = PondEngine::new(EngineConfig::default());
    engine
        .create_pond("farm_01", "kolam a", None)
        .expect("create");
    engine
        .create_pond("farm_02", "kolam b", None)
        .expect("create");

    assert_eq!(engine.list_ponds(None).len(), 2);
    let filtered = engine.list_ponds(Some("farm_02"));
    assert_eq!(filtered.len(), 1);
    assert_eq!(filtered[0].farm_id, "farm_02");
}
