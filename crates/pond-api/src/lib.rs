//! In-process API facade with role authorization, collaborator seams, and
//! SQLite write-through persistence.

mod persistence;
mod server;

use std::fmt;
use std::path::Path;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, NaiveDate, Utc};
use contracts::{
    Classification, EngineConfig, GrowthParams, GrowthProjection, HarvestEvent, HarvestRequest,
    PondGeometry, PondRecord, PondUpdate, PopulationEvent, Role, SamplingEvent, SaleRequest,
};
use pond_core::{
    EngineError, FeedRecords, FeedSizing, PondEngine, SaleLedger, SaleLedgerError,
};

pub use persistence::{PersistenceError, SqliteCommitHook, SqlitePondStore};
pub use server::{serve, ServerError};

#[derive(Debug)]
pub enum EngineApiError {
    /// The caller's role may not invoke mutating operations.
    Forbidden { role: Role },
    Engine(EngineError),
}

impl fmt::Display for EngineApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Forbidden { role } => {
                write!(f, "role {} is read-only", role.as_str())
            }
            Self::Engine(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for EngineApiError {}

impl From<EngineError> for EngineApiError {
    fn from(value: EngineError) -> Self {
        Self::Engine(value)
    }
}

/// Feed-record collaborator that reports no feed history.
pub struct NoFeedRecords;

impl FeedRecords for NoFeedRecords {
    fn total_feed_kg(&self, _pond_id: &str) -> f64 {
        0.0
    }
}

/// Static feed-sizing table: daily ration as a fraction of biomass, stepped
/// down as the fish grow.
pub struct StaticFeedTable;

impl FeedSizing for StaticFeedTable {
    fn daily_feed_kg(&self, current_weight_g: f64, biomass_kg: f64) -> f64 {
        let rate = if current_weight_g < 50.0 {
            0.05
        } else if current_weight_g < 100.0 {
            0.04
        } else if current_weight_g < 200.0 {
            0.03
        } else {
            0.025
        };
        biomass_kg * rate
    }
}

/// In-memory stand-in for the external sale ledger.
pub struct InMemorySaleLedger {
    sales: Mutex<Vec<SaleRequest>>,
}

impl InMemorySaleLedger {
    pub fn new() -> Self {
        Self {
            sales: Mutex::new(Vec::new()),
        }
    }

    pub fn sales(&self) -> Vec<SaleRequest> {
        match self.sales.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl Default for InMemorySaleLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl SaleLedger for InMemorySaleLedger {
    fn record_sale(&self, request: SaleRequest) -> Result<String, SaleLedgerError> {
        let mut sales = match self.sales.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        sales.push(request);
        Ok(format!("sale_{:04}", sales.len()))
    }
}

pub struct EngineApi {
    engine: PondEngine,
    feed_records: Box<dyn FeedRecords>,
    feed_sizing: Box<dyn FeedSizing>,
    sale_ledger: Box<dyn SaleLedger>,
}

impl EngineApi {
    /// Memory-only engine with the default collaborator stand-ins.
    pub fn from_config(config: EngineConfig) -> Self {
        Self {
            engine: PondEngine::new(config),
            feed_records: Box::new(NoFeedRecords),
            feed_sizing: Box::new(StaticFeedTable),
            sale_ledger: Box::new(InMemorySaleLedger::new()),
        }
    }

    /// Engine backed by a SQLite store: existing ponds are reloaded and every
    /// further mutation is committed write-through in one transaction.
    pub fn with_sqlite_store(
        config: EngineConfig,
        path: impl AsRef<Path>,
    ) -> Result<Self, PersistenceError> {
        let store = Arc::new(SqlitePondStore::open(path)?);
        let engine = PondEngine::with_commit_hook(
            config,
            Box::new(SqliteCommitHook::new(Arc::clone(&store))),
        );
        for state in store.load_all()? {
            engine.restore_pond(state);
        }

        Ok(Self {
            engine,
            feed_records: Box::new(NoFeedRecords),
            feed_sizing: Box::new(StaticFeedTable),
            sale_ledger: Box::new(InMemorySaleLedger::new()),
        })
    }

    /// Swap in real collaborator implementations.
    pub fn with_collaborators(
        mut self,
        feed_records: Box<dyn FeedRecords>,
        feed_sizing: Box<dyn FeedSizing>,
        sale_ledger: Box<dyn SaleLedger>,
    ) -> Self {
        self.feed_records = feed_records;
        self.feed_sizing = feed_sizing;
        self.sale_ledger = sale_ledger;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        self.engine.config()
    }

    pub fn create_pond(
        &self,
        role: Role,
        farm_id: &str,
        name: &str,
        geometry: Option<PondGeometry>,
    ) -> Result<PondRecord, EngineApiError> {
        require_writer(role)?;
        Ok(self.engine.create_pond(farm_id, name, geometry)?)
    }

    pub fn update_pond(
        &self,
        role: Role,
        pond_id: &str,
        update: &PondUpdate,
    ) -> Result<PondRecord, EngineApiError> {
        require_writer(role)?;
        Ok(self.engine.update_pond(pond_id, update)?)
    }

    pub fn get_pond(&self, pond_id: &str) -> Result<PondRecord, EngineApiError> {
        Ok(self.engine.get_pond(pond_id)?)
    }

    pub fn list_ponds(&self, farm_id: Option<&str>) -> Vec<PondRecord> {
        self.engine.list_ponds(farm_id)
    }

    pub fn apply_delta(
        &self,
        role: Role,
        pond_id: &str,
        delta: i64,
        reason: &str,
        recorded_at: DateTime<Utc>,
    ) -> Result<PopulationEvent, EngineApiError> {
        require_writer(role)?;
        Ok(self.engine.apply_delta(pond_id, delta, reason, recorded_at)?)
    }

    pub fn record_sampling(
        &self,
        role: Role,
        pond_id: &str,
        fish_per_kg: f64,
        note: Option<String>,
        recorded_at: DateTime<Utc>,
    ) -> Result<SamplingEvent, EngineApiError> {
        require_writer(role)?;
        Ok(self
            .engine
            .record_sampling(pond_id, fish_per_kg, note, recorded_at)?)
    }

    pub fn record_harvest(
        &self,
        role: Role,
        pond_id: &str,
        request: &HarvestRequest,
    ) -> Result<HarvestEvent, EngineApiError> {
        require_writer(role)?;
        Ok(self
            .engine
            .record_harvest(pond_id, request, self.sale_ledger.as_ref())?)
    }

    pub fn population_events(&self, pond_id: &str) -> Result<Vec<PopulationEvent>, EngineApiError> {
        Ok(self.engine.population_events(pond_id)?)
    }

    pub fn sampling_events(&self, pond_id: &str) -> Result<Vec<SamplingEvent>, EngineApiError> {
        Ok(self.engine.sampling_events(pond_id)?)
    }

    pub fn harvest_events(&self, pond_id: &str) -> Result<Vec<HarvestEvent>, EngineApiError> {
        Ok(self.engine.harvest_events(pond_id)?)
    }

    pub fn classification(&self, pond_id: &str) -> Result<Classification, EngineApiError> {
        Ok(self.engine.classification(pond_id)?)
    }

    /// Read-side projection. Growth rate and target weight default from the
    /// engine config; the sale price is always caller-supplied.
    pub fn projection(
        &self,
        pond_id: &str,
        growth_rate_g_per_day: Option<f64>,
        target_weight_g: Option<f64>,
        price_per_kg: f64,
        today: NaiveDate,
    ) -> Result<GrowthProjection, EngineApiError> {
        let config = self.engine.config();
        let params = GrowthParams {
            growth_rate_g_per_day: growth_rate_g_per_day
                .unwrap_or(config.default_growth_rate_g_per_day),
            target_weight_g: target_weight_g.unwrap_or(config.default_target_weight_g),
            price_per_kg,
            survival_rate: config.survival_rate,
        };
        let total_feed_kg = self.feed_records.total_feed_kg(pond_id);
        Ok(self.engine.projection(
            pond_id,
            &params,
            total_feed_kg,
            self.feed_sizing.as_ref(),
            today,
        )?)
    }
}

fn require_writer(role: Role) -> Result<(), EngineApiError> {
    if role.can_mutate() {
        Ok(())
    } else {
        Err(EngineApiError::Forbidden { role })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use contracts::HarvestType;

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, day, 9, 0, 0).unwrap()
    }

    fn geometry() -> Option<PondGeometry> {
        Some(PondGeometry {
            length_m: 10.0,
            width_m: 5.0,
            depth_m: 2.0,
        })
    }

    fn temp_db_path(name: &str) -> std::path::PathBuf {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("time should be monotonic")
            .as_nanos();

        std::env::temp_dir().join(format!("pond_kernel_{name}_{nanos}.sqlite"))
    }

    fn remove_db(path: &std::path::Path) {
        let _ = std::fs::remove_file(path);
        let _ = std::fs::remove_file(path.with_extension("sqlite-wal"));
        let _ = std::fs::remove_file(path.with_extension("sqlite-shm"));
    }

    #[test]
    fn viewer_is_blocked_from_every_mutation() {
        let api = EngineApi::from_config(EngineConfig::default());
        let err = api
            .create_pond(Role::Viewer, "farm_01", "kolam utara", geometry())
            .expect_err("viewer blocked");
        assert!(matches!(err, EngineApiError::Forbidden { role: Role::Viewer }));

        let record = api
            .create_pond(Role::Operator, "farm_01", "kolam utara", geometry())
            .expect("operator may create");
        let err = api
            .apply_delta(Role::Viewer, &record.pond_id, 100, "stocking", at(1))
            .expect_err("viewer blocked");
        assert!(matches!(err, EngineApiError::Forbidden { .. }));
        assert!(api
            .get_pond(&record.pond_id)
            .expect("viewer may read")
            .population
            == 0);
    }

    #[test]
    fn projection_defaults_come_from_config() {
        let api = EngineApi::from_config(EngineConfig::default());
        let record = api
            .create_pond(Role::Admin, "farm_01", "kolam utara", geometry())
            .expect("create");
        api.apply_delta(Role::Admin, &record.pond_id, 1000, "stocking", at(1))
            .expect("stocking");
        api.record_sampling(Role::Admin, &record.pond_id, 10.0, None, at(22))
            .expect("sampling");

        let projection = api
            .projection(&record.pond_id, None, None, 25_000.0, at(22).date_naive())
            .expect("projection");
        let estimate = projection.estimate().expect("estimated");
        assert_eq!(estimate.current_weight_g, 100.0);
        // 100 g fish feed at 3 percent of the 100 kg biomass.
        assert_eq!(estimate.daily_feed_kg, 3.0);
        assert_eq!(estimate.surviving_count, 850);
    }

    #[test]
    fn harvest_hands_off_to_the_configured_sale_ledger() {
        let api = EngineApi::from_config(EngineConfig::default());
        let record = api
            .create_pond(Role::Owner, "farm_01", "kolam utara", geometry())
            .expect("create");
        api.apply_delta(Role::Owner, &record.pond_id, 2000, "stocking", at(1))
            .expect("stocking");

        let request = HarvestRequest {
            weight_kg: 50.0,
            count: 400,
            price_per_kg: 25_000.0,
            harvest_type: HarvestType::Partial,
            note: Some("panen sebagian".to_string()),
            recorded_at: at(20),
            buyer_id: Some("buyer_03".to_string()),
        };
        let harvest = api
            .record_harvest(Role::Owner, &record.pond_id, &request)
            .expect("harvest");
        assert_eq!(harvest.sale_id.as_deref(), Some("sale_0001"));
        assert_eq!(api.get_pond(&record.pond_id).expect("pond").population, 1600);
    }

    #[test]
    fn sqlite_round_trip_restores_ponds_and_ledgers() {
        let db_path = temp_db_path("round_trip");

        let pond_id = {
            let api = EngineApi::with_sqlite_store(EngineConfig::default(), &db_path)
                .expect("open store");
            let record = api
                .create_pond(Role::Admin, "farm_01", "kolam utara", geometry())
                .expect("create");
            api.apply_delta(Role::Admin, &record.pond_id, 5000, "stocking", at(1))
                .expect("stocking");
            api.apply_delta(Role::Admin, &record.pond_id, -200, "mortality", at(5))
                .expect("correction");
            api.record_sampling(Role::Admin, &record.pond_id, 10.0, None, at(8))
                .expect("sampling");
            let request = HarvestRequest {
                weight_kg: 80.0,
                count: 800,
                price_per_kg: 25_000.0,
                harvest_type: HarvestType::Partial,
                note: None,
                recorded_at: at(10),
                buyer_id: None,
            };
            api.record_harvest(Role::Admin, &record.pond_id, &request)
                .expect("harvest");
            record.pond_id
        };

        let reopened = EngineApi::with_sqlite_store(EngineConfig::default(), &db_path)
            .expect("reopen store");
        let record = reopened.get_pond(&pond_id).expect("restored pond");
        assert_eq!(record.population, 4000);
        assert_eq!(record.stocked_at, Some(at(1).date_naive()));

        let events = reopened.population_events(&pond_id).expect("events");
        assert_eq!(events.len(), 3);
        assert_eq!(events[0].resulting_total, 4000);
        assert_eq!(reopened.sampling_events(&pond_id).expect("samplings").len(), 1);
        assert_eq!(reopened.harvest_events(&pond_id).expect("harvests").len(), 1);

        // The restored sequence allocator continues past the reloaded events.
        let event = reopened
            .apply_delta(Role::Admin, &pond_id, 100, "restock", at(12))
            .expect("delta after reload");
        assert!(events.iter().all(|prior| prior.event_id != event.event_id));

        remove_db(&db_path);
    }
}
