use chrono::{DateTime, Utc};
use contracts::{PopulationEvent, SamplingEvent, SCHEMA_VERSION_V1};

use super::*;

impl PondEngine {
    /// Append one signed head-count change. Rejects zero deltas and any
    /// delta that would take the running total below zero; on success the
    /// event and the cached population commit together.
    pub fn apply_delta(
        &self,
        pond_id: &str,
        delta: i64,
        reason: &str,
        recorded_at: DateTime<Utc>,
    ) -> Result<PopulationEvent> {
        self.mutate_pond(pond_id, |state, _config| {
            let event = append_population_event(state, delta, reason.to_string(), recorded_at)?;
            refresh_cached_status(state);
            Ok(event)
        })
    }

    pub fn record_sampling(
        &self,
        pond_id: &str,
        fish_per_kg: f64,
        note: Option<String>,
        recorded_at: DateTime<Utc>,
    ) -> Result<SamplingEvent> {
        if !(fish_per_kg.is_finite() && fish_per_kg > 0.0) {
            return Err(EngineError::InvalidSampling(fish_per_kg));
        }

        self.mutate_pond(pond_id, |state, _config| {
            let event = SamplingEvent {
                schema_version: SCHEMA_VERSION_V1.to_string(),
                event_id: state.next_event_id("se"),
                pond_id: state.record.pond_id.clone(),
                recorded_at,
                fish_per_kg,
                note,
            };
            state.sampling_events.push(event.clone());
            // A new sampling can flip the classifier onto the biomass basis.
            refresh_cached_status(state);
            Ok(event)
        })
    }

    /// Population ledger, newest first.
    pub fn population_events(&self, pond_id: &str) -> Result<Vec<PopulationEvent>> {
        self.read_pond(pond_id, |state| {
            state.population_events.iter().rev().cloned().collect()
        })
    }

    /// Sampling ledger, newest first.
    pub fn sampling_events(&self, pond_id: &str) -> Result<Vec<SamplingEvent>> {
        self.read_pond(pond_id, |state| {
            state.sampling_events.iter().rev().cloned().collect()
        })
    }

    pub fn latest_sampling_event(&self, pond_id: &str) -> Result<Option<SamplingEvent>> {
        self.read_pond(pond_id, |state| {
            latest_sampling(&state.sampling_events).cloned()
        })
    }
}

/// Shared ledger append used by manual corrections and the harvest
/// coordinator. The non-negativity check runs here regardless of what the
/// caller already verified.
pub(super) fn append_population_event(
    state: &mut PondState,
    delta: i64,
    reason: String,
    recorded_at: DateTime<Utc>,
) -> Result<PopulationEvent> {
    if delta == 0 {
        return Err(EngineError::ZeroDelta);
    }

    let current = state.record.population;
    let resulting_total = current + delta;
    if resulting_total < 0 {
        return Err(EngineError::PopulationWouldGoNegative { current, delta });
    }

    let event = PopulationEvent {
        schema_version: SCHEMA_VERSION_V1.to_string(),
        event_id: state.next_event_id("pe"),
        pond_id: state.record.pond_id.clone(),
        recorded_at,
        delta,
        resulting_total,
        reason,
    };

    // The first stocking fixes the pond's stocking date.
    if state.record.stocked_at.is_none() && delta > 0 {
        state.record.stocked_at = Some(recorded_at.date_naive());
    }

    state.record.population = resulting_total;
    state.population_events.push(event.clone());
    Ok(event)
}
