//! Sampling-size conversions and latest-sampling selection.
//!
//! A sampling is recorded as a fish-per-kilogram ratio. Converting an
//! observed average weight in grams keeps three decimals of ratio precision
//! so the reverse conversion lands within one gram across the practical
//! [1, 1000] gram range.

use contracts::{SamplingEvent, GRAMS_PER_KG};

/// Ratio from an observed average individual weight in grams.
pub fn fish_per_kg_from_grams(grams_per_fish: f64) -> f64 {
    round_to(GRAMS_PER_KG / grams_per_fish, 3)
}

/// Average individual weight in grams from a recorded ratio, to one decimal.
pub fn grams_from_fish_per_kg(fish_per_kg: f64) -> f64 {
    round_to(GRAMS_PER_KG / fish_per_kg, 1)
}

fn round_to(value: f64, decimals: u32) -> f64 {
    let scale = 10_f64.powi(decimals as i32);
    (value * scale).round() / scale
}

/// Latest sampling = greatest `recorded_at`; ledger order breaks ties in
/// favor of the later append.
pub fn latest_sampling(events: &[SamplingEvent]) -> Option<&SamplingEvent> {
    let mut latest: Option<&SamplingEvent> = None;
    for event in events {
        match latest {
            Some(current) if current.recorded_at > event.recorded_at => {}
            _ => latest = Some(event),
        }
    }
    latest
}
