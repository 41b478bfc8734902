//! Density and status classification.
//!
//! Pure function over a pond record and its latest sampling. When a sampling
//! exists the biomass density is the selected basis; otherwise the head-count
//! density is used. The result is recomputed from current state on every
//! call and is never read back from the cached tier on the pond record.

use contracts::{
    Classification, DensitySource, PondRecord, SamplingEvent, StatusTier, DENSITY_BIOMASS_AT_RISK,
    DENSITY_BIOMASS_CAUTION, DENSITY_COUNT_AT_RISK, DENSITY_COUNT_CAUTION, GRAMS_PER_KG,
    SCHEMA_VERSION_V1,
};

pub fn classify(record: &PondRecord, latest_sampling: Option<&SamplingEvent>) -> Classification {
    let biomass_kg = latest_sampling.map(|sampling| {
        let avg_weight_kg = sampling.avg_weight_g() / GRAMS_PER_KG;
        record.population as f64 * avg_weight_kg
    });

    let Some(volume) = record.volume_m3() else {
        // Geometry unset: neither density is defined, so the tier defaults
        // to AMAN with the insufficient-data flag raised.
        return Classification {
            schema_version: SCHEMA_VERSION_V1.to_string(),
            tier: StatusTier::Aman,
            source: DensitySource::Count,
            density_count: None,
            density_biomass: None,
            biomass_kg,
            insufficient_data: true,
        };
    };

    let density_count = record.population as f64 / volume;
    let density_biomass = biomass_kg.map(|biomass| biomass / volume);

    let (source, tier) = match density_biomass {
        Some(density) => (
            DensitySource::Biomass,
            tier_for(density, DENSITY_BIOMASS_CAUTION, DENSITY_BIOMASS_AT_RISK),
        ),
        None => (
            DensitySource::Count,
            tier_for(density_count, DENSITY_COUNT_CAUTION, DENSITY_COUNT_AT_RISK),
        ),
    };

    Classification {
        schema_version: SCHEMA_VERSION_V1.to_string(),
        tier,
        source,
        density_count: Some(density_count),
        density_biomass,
        biomass_kg,
        insufficient_data: false,
    }
}

fn tier_for(density: f64, caution: f64, at_risk: f64) -> StatusTier {
    if density > at_risk {
        StatusTier::Berisiko
    } else if density > caution {
        StatusTier::Waspada
    } else {
        StatusTier::Aman
    }
}
