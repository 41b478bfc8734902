//! The engine aggregate: pond registry plus the append-only ledgers, with
//! per-pond locking and all-or-nothing mutation commits.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, RwLock};

use chrono::NaiveDate;
use contracts::{
    Classification, EngineConfig, GrowthParams, GrowthProjection, HarvestEvent, PondRecord,
    PopulationEvent, SamplingEvent,
};

use crate::classify::classify;
use crate::collaborators::FeedSizing;
use crate::error::{EngineError, Result};
use crate::projection::project;
use crate::sampling::latest_sampling;

mod harvest;
mod ledger;
mod registry;

/// Full state for one pond: the registry record plus the three ledgers in
/// append order. Event ids are drawn from a per-pond sequence so the audit
/// trail reads in one strict order across ledgers.
#[derive(Debug, Clone, PartialEq)]
pub struct PondState {
    pub record: PondRecord,
    pub population_events: Vec<PopulationEvent>,
    pub sampling_events: Vec<SamplingEvent>,
    pub harvest_events: Vec<HarvestEvent>,
    pub next_event_sequence: u64,
}

impl PondState {
    pub fn new(record: PondRecord) -> Self {
        Self {
            record,
            population_events: Vec::new(),
            sampling_events: Vec::new(),
            harvest_events: Vec::new(),
            next_event_sequence: 1,
        }
    }

    fn next_event_id(&mut self, kind: &str) -> String {
        let sequence = self.next_event_sequence;
        self.next_event_sequence += 1;
        format!("{kind}:{}:{sequence}", self.record.pond_id)
    }
}

/// The staged tail of a mutation, handed to the commit hook before the
/// in-memory swap. Events are append-only, so the new entries are exactly
/// the slices past the previously committed lengths.
#[derive(Debug, Clone, Copy)]
pub struct StagedMutation<'a> {
    pub record: &'a PondRecord,
    pub new_population_events: &'a [PopulationEvent],
    pub new_sampling_events: &'a [SamplingEvent],
    pub new_harvest_events: &'a [HarvestEvent],
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitHookError(pub String);

/// Durable write-through hook. `persist` must be atomic: either the whole
/// staged mutation lands or none of it does. A hook failure aborts the
/// in-memory commit as well.
pub trait CommitHook: Send + Sync {
    fn persist(&self, staged: StagedMutation<'_>) -> std::result::Result<(), CommitHookError>;
}

pub struct PondEngine {
    config: EngineConfig,
    ponds: RwLock<BTreeMap<String, Arc<Mutex<PondState>>>>,
    next_pond_number: Mutex<u64>,
    commit_hook: Option<Box<dyn CommitHook>>,
}

impl PondEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            ponds: RwLock::new(BTreeMap::new()),
            next_pond_number: Mutex::new(1),
            commit_hook: None,
        }
    }

    pub fn with_commit_hook(config: EngineConfig, hook: Box<dyn CommitHook>) -> Self {
        let mut engine = Self::new(config);
        engine.commit_hook = Some(hook);
        engine
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Always recomputed from ledger state; the cached tier on the record is
    /// only a display hint.
    pub fn classification(&self, pond_id: &str) -> Result<Classification> {
        self.read_pond(pond_id, |state| {
            classify(&state.record, latest_sampling(&state.sampling_events))
        })
    }

    /// Read-side projection; performs no writes and is never cached.
    pub fn projection(
        &self,
        pond_id: &str,
        params: &GrowthParams,
        total_feed_kg: f64,
        feed_sizing: &dyn FeedSizing,
        today: NaiveDate,
    ) -> Result<GrowthProjection> {
        self.read_pond(pond_id, |state| {
            project(
                &state.record,
                latest_sampling(&state.sampling_events),
                params,
                self.config.assumed_stocking_weight_g,
                total_feed_kg,
                self.config.assumed_feed_cost_per_kg,
                |weight_g, biomass_kg| feed_sizing.daily_feed_kg(weight_g, biomass_kg),
                today,
            )
        })?
    }

    fn pond_slot(&self, pond_id: &str) -> Result<Arc<Mutex<PondState>>> {
        let ponds = read_lock(&self.ponds);
        ponds
            .get(pond_id)
            .cloned()
            .ok_or_else(|| EngineError::PondNotFound(pond_id.to_string()))
    }

    fn read_pond<T>(&self, pond_id: &str, read: impl FnOnce(&PondState) -> T) -> Result<T> {
        let slot = self.pond_slot(pond_id)?;
        let state = lock_state(&slot);
        Ok(read(&state))
    }

    /// Read-validate-write with no interleaving per pond: the mutation runs
    /// against a working copy under this pond's lock and is swapped in only
    /// after it and the commit hook both succeed.
    fn mutate_pond<T>(
        &self,
        pond_id: &str,
        mutate: impl FnOnce(&mut PondState, &EngineConfig) -> Result<T>,
    ) -> Result<T> {
        let slot = self.pond_slot(pond_id)?;
        let mut state = lock_state(&slot);

        let mut working = state.clone();
        let value = mutate(&mut working, &self.config)?;
        self.persist_staged(&state, &working)?;

        *state = working;
        Ok(value)
    }

    fn persist_staged(&self, committed: &PondState, working: &PondState) -> Result<()> {
        let Some(hook) = &self.commit_hook else {
            return Ok(());
        };

        let staged = StagedMutation {
            record: &working.record,
            new_population_events: &working.population_events[committed.population_events.len()..],
            new_sampling_events: &working.sampling_events[committed.sampling_events.len()..],
            new_harvest_events: &working.harvest_events[committed.harvest_events.len()..],
        };
        hook.persist(staged)
            .map_err(|err| EngineError::Storage(err.0))
    }
}

fn refresh_cached_status(state: &mut PondState) {
    let classification = classify(&state.record, latest_sampling(&state.sampling_events));
    state.record.status = classification.tier;
    state.record.status_origin = contracts::StatusOrigin::Computed;
}

fn lock_state(slot: &Arc<Mutex<PondState>>) -> MutexGuard<'_, PondState> {
    match slot.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

fn read_lock<'a, T>(lock: &'a RwLock<T>) -> std::sync::RwLockReadGuard<'a, T> {
    match lock.read() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

fn write_lock<'a, T>(lock: &'a RwLock<T>) -> std::sync::RwLockWriteGuard<'a, T> {
    match lock.write() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

fn lock_counter(counter: &Mutex<u64>) -> MutexGuard<'_, u64> {
    match counter.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

#[cfg(test)]
mod tests;
