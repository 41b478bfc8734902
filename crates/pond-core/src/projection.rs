//! Growth and harvest projection.
//!
//! A read-side estimate recomputed on every call: current individual weight
//! from the latest sampling (or the stocking-weight fallback), biomass,
//! days to the target weight, projected revenue and profit, and the
//! collaborator-supplied daily feed recommendation. Nothing here is
//! persisted, so stale inputs never propagate.

use chrono::{Days, NaiveDate};
use contracts::{
    GrowthParams, GrowthProjection, PondRecord, ProjectionEstimate, SamplingEvent, GRAMS_PER_KG,
    SCHEMA_VERSION_V1,
};

use crate::error::{EngineError, Result};

/// Linear growth heuristic. `assumed_stocking_weight_g` anchors the
/// uncalibrated fallback; `total_feed_kg` comes from the external
/// feed-record collaborator and `daily_feed_kg` from the feed-sizing table.
#[allow(clippy::too_many_arguments)]
pub fn project(
    record: &PondRecord,
    latest_sampling: Option<&SamplingEvent>,
    params: &GrowthParams,
    assumed_stocking_weight_g: f64,
    total_feed_kg: f64,
    feed_cost_per_kg: f64,
    daily_feed_kg: impl FnOnce(f64, f64) -> f64,
    today: NaiveDate,
) -> Result<GrowthProjection> {
    if !(params.growth_rate_g_per_day.is_finite() && params.growth_rate_g_per_day > 0.0) {
        return Err(EngineError::InvalidGrowthRate(params.growth_rate_g_per_day));
    }

    let Some(stocked_at) = record.stocked_at else {
        return Ok(GrowthProjection::NotApplicable {
            reason: "pond has no stocking date".to_string(),
        });
    };

    let days_since_stocking = (today - stocked_at).num_days().max(0);

    let (current_weight_g, calibrated) = match latest_sampling {
        Some(sampling) => {
            let base_weight_g = GRAMS_PER_KG / sampling.fish_per_kg;
            let days_since_sampling =
                (today - sampling.recorded_at.date_naive()).num_days().max(0);
            (
                base_weight_g + days_since_sampling as f64 * params.growth_rate_g_per_day,
                true,
            )
        }
        None => (
            assumed_stocking_weight_g + days_since_stocking as f64 * params.growth_rate_g_per_day,
            false,
        ),
    };

    let biomass_kg = record.population as f64 * current_weight_g / GRAMS_PER_KG;

    let days_remaining = if current_weight_g >= params.target_weight_g {
        0
    } else {
        ((params.target_weight_g - current_weight_g) / params.growth_rate_g_per_day).ceil() as i64
    };
    let estimated_harvest_on = today
        .checked_add_days(Days::new(days_remaining as u64))
        .unwrap_or(today);

    let surviving_count = (record.population as f64 * params.survival_rate).floor() as i64;
    let projected_revenue =
        surviving_count as f64 * params.target_weight_g / GRAMS_PER_KG * params.price_per_kg;
    let feed_cost = total_feed_kg * feed_cost_per_kg;

    Ok(GrowthProjection::Estimated(ProjectionEstimate {
        current_weight_g,
        calibrated,
        biomass_kg,
        days_since_stocking,
        days_remaining,
        estimated_harvest_on,
        surviving_count,
        projected_revenue,
        feed_cost,
        projected_profit: projected_revenue - feed_cost,
        daily_feed_kg: daily_feed_kg(current_weight_g, biomass_kg),
    }))
}

/// Biomass estimate used by the harvest coordinator's over-harvest guard:
/// projection step 3 alone, recomputed at call time.
pub fn current_biomass_kg(
    record: &PondRecord,
    sampling: &SamplingEvent,
    growth_rate_g_per_day: f64,
    today: NaiveDate,
) -> f64 {
    let base_weight_g = GRAMS_PER_KG / sampling.fish_per_kg;
    let days_since_sampling = (today - sampling.recorded_at.date_naive()).num_days().max(0);
    let current_weight_g = base_weight_g + days_since_sampling as f64 * growth_rate_g_per_day;
    record.population as f64 * current_weight_g / GRAMS_PER_KG
}
