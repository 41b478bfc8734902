use contracts::{
    PondGeometry, PondRecord, PondUpdate, StatusOrigin, StatusTier, SCHEMA_VERSION_V1,
};

use super::*;

impl PondEngine {
    /// New ponds start empty: population zero, AMAN, no stocking date.
    pub fn create_pond(
        &self,
        farm_id: &str,
        name: &str,
        geometry: Option<PondGeometry>,
    ) -> Result<PondRecord> {
        if let Some(geometry) = &geometry {
            validate_geometry(geometry)?;
        }

        let mut ponds = write_lock(&self.ponds);
        let mut next_number = lock_counter(&self.next_pond_number);

        let pond_id = format!("pond_{:04}", *next_number);
        let record = PondRecord {
            schema_version: SCHEMA_VERSION_V1.to_string(),
            pond_id: pond_id.clone(),
            farm_id: farm_id.to_string(),
            name: name.to_string(),
            geometry,
            stocked_at: None,
            population: 0,
            status: StatusTier::Aman,
            status_origin: StatusOrigin::Computed,
        };

        let state = PondState::new(record.clone());
        if let Some(hook) = &self.commit_hook {
            let staged = StagedMutation {
                record: &state.record,
                new_population_events: &[],
                new_sampling_events: &[],
                new_harvest_events: &[],
            };
            hook.persist(staged)
                .map_err(|err| EngineError::Storage(err.0))?;
        }

        *next_number += 1;
        ponds.insert(pond_id, Arc::new(Mutex::new(state)));
        Ok(record)
    }

    /// Applies name/geometry/manual-status fields, then recomputes the cached
    /// tier through the classifier unless an explicit override was supplied.
    /// The override wins until the next automatic recompute.
    pub fn update_pond(&self, pond_id: &str, update: &PondUpdate) -> Result<PondRecord> {
        self.mutate_pond(pond_id, |state, _config| {
            if let Some(name) = &update.name {
                state.record.name = name.clone();
            }

            if update.touches_geometry() {
                state.record.geometry = Some(merge_geometry(state.record.geometry, update)?);
            }

            match update.manual_status {
                Some(tier) => {
                    state.record.status = tier;
                    state.record.status_origin = StatusOrigin::ManualOverride;
                }
                None => refresh_cached_status(state),
            }

            Ok(state.record.clone())
        })
    }

    pub fn get_pond(&self, pond_id: &str) -> Result<PondRecord> {
        self.read_pond(pond_id, |state| state.record.clone())
    }

    pub fn list_ponds(&self, farm_id: Option<&str>) -> Vec<PondRecord> {
        let ponds = read_lock(&self.ponds);
        ponds
            .values()
            .map(|slot| lock_state(slot).record.clone())
            .filter(|record| farm_id.map_or(true, |farm| record.farm_id == farm))
            .collect()
    }

    /// Point-in-time copy of a pond's full state, ledgers included.
    pub fn snapshot_pond(&self, pond_id: &str) -> Result<PondState> {
        self.read_pond(pond_id, Clone::clone)
    }

    /// Re-seats a pond loaded from durable storage, bypassing the commit
    /// hook. Keeps the id allocator ahead of every restored pond.
    pub fn restore_pond(&self, state: PondState) {
        let mut ponds = write_lock(&self.ponds);
        let mut next_number = lock_counter(&self.next_pond_number);

        if let Some(number) = state
            .record
            .pond_id
            .strip_prefix("pond_")
            .and_then(|raw| raw.parse::<u64>().ok())
        {
            *next_number = (*next_number).max(number + 1);
        }

        ponds.insert(
            state.record.pond_id.clone(),
            Arc::new(Mutex::new(state)),
        );
    }
}

fn validate_geometry(geometry: &PondGeometry) -> Result<()> {
    if geometry.is_valid() {
        Ok(())
    } else {
        Err(EngineError::InvalidGeometry {
            length_m: geometry.length_m,
            width_m: geometry.width_m,
            depth_m: geometry.depth_m,
        })
    }
}

fn merge_geometry(current: Option<PondGeometry>, update: &PondUpdate) -> Result<PondGeometry> {
    let merged = match current {
        Some(existing) => PondGeometry {
            length_m: update.length_m.unwrap_or(existing.length_m),
            width_m: update.width_m.unwrap_or(existing.width_m),
            depth_m: update.depth_m.unwrap_or(existing.depth_m),
        },
        None => {
            let (Some(length_m), Some(width_m), Some(depth_m)) =
                (update.length_m, update.width_m, update.depth_m)
            else {
                return Err(EngineError::GeometryIncomplete);
            };
            PondGeometry {
                length_m,
                width_m,
                depth_m,
            }
        }
    };
    validate_geometry(&merged)?;
    Ok(merged)
}
