use contracts::{HarvestEvent, HarvestRequest, SaleRequest, SCHEMA_VERSION_V1};

use super::ledger::append_population_event;
use super::*;
use crate::collaborators::SaleLedger;
use crate::projection::current_biomass_kg;

impl PondEngine {
    /// Validates the harvest against freshly read ledger state and applies
    /// harvest event + population decrement (+ optional sale hand-off) as
    /// one unit under the pond's lock. A rejected harvest leaves every
    /// ledger exactly as before the call.
    pub fn record_harvest(
        &self,
        pond_id: &str,
        request: &HarvestRequest,
        sale_ledger: &dyn SaleLedger,
    ) -> Result<HarvestEvent> {
        validate_positive("count", request.count as f64)?;
        validate_positive("weight_kg", request.weight_kg)?;
        validate_positive("price_per_kg", request.price_per_kg)?;

        self.mutate_pond(pond_id, |state, config| {
            let available = state.record.population;
            if request.count > available {
                return Err(EngineError::OverHarvestCount {
                    requested: request.count,
                    available,
                });
            }

            // When the pond has been sampled, the claimed weight must fit in
            // the biomass estimate recomputed at call time. Exceeding it is
            // the signal to re-sample, not to force the ledger.
            if let Some(sampling) = latest_sampling(&state.sampling_events) {
                let biomass_kg = current_biomass_kg(
                    &state.record,
                    sampling,
                    config.default_growth_rate_g_per_day,
                    request.recorded_at.date_naive(),
                );
                if request.weight_kg > biomass_kg {
                    return Err(EngineError::OverHarvestBiomass {
                        requested_kg: request.weight_kg,
                        biomass_kg,
                    });
                }
            }

            let sale_id = match &request.buyer_id {
                Some(buyer_id) => {
                    let sale = SaleRequest {
                        pond_id: state.record.pond_id.clone(),
                        buyer_id: buyer_id.clone(),
                        weight_kg: request.weight_kg,
                        price_per_kg: request.price_per_kg,
                        count: request.count,
                        note: request.note.clone(),
                    };
                    Some(
                        sale_ledger
                            .record_sale(sale)
                            .map_err(|err| EngineError::SaleHandoffFailed(err.0))?,
                    )
                }
                None => None,
            };

            let event_id = state.next_event_id("he");
            // The ledger append re-validates non-negativity as an
            // independent second guard.
            let population_event = append_population_event(
                state,
                -request.count,
                format!("harvest {event_id}"),
                request.recorded_at,
            )?;

            let event = HarvestEvent {
                schema_version: SCHEMA_VERSION_V1.to_string(),
                event_id,
                pond_id: state.record.pond_id.clone(),
                recorded_at: request.recorded_at,
                weight_kg: request.weight_kg,
                count: request.count,
                price_per_kg: request.price_per_kg,
                harvest_type: request.harvest_type,
                note: request.note.clone(),
                population_event_id: population_event.event_id,
                sale_id,
            };
            state.harvest_events.push(event.clone());
            refresh_cached_status(state);
            Ok(event)
        })
    }

    /// Harvest ledger, newest first.
    pub fn harvest_events(&self, pond_id: &str) -> Result<Vec<HarvestEvent>> {
        self.read_pond(pond_id, |state| {
            state.harvest_events.iter().rev().cloned().collect()
        })
    }
}

fn validate_positive(field: &'static str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(EngineError::NonPositiveHarvestField { field, value })
    }
}
