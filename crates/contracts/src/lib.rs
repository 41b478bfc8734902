//! v1 cross-boundary contracts for the pond engine, API, persistence, and CLI.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

pub const SCHEMA_VERSION_V1: &str = "1.0";

/// Grams per kilogram, used by the sampling-size conversions.
pub const GRAMS_PER_KG: f64 = 1000.0;

/// Count-based density thresholds, fish per cubic meter.
pub const DENSITY_COUNT_CAUTION: f64 = 50.0;
pub const DENSITY_COUNT_AT_RISK: f64 = 100.0;

/// Biomass-based density thresholds, kilograms per cubic meter.
pub const DENSITY_BIOMASS_CAUTION: f64 = 10.0;
pub const DENSITY_BIOMASS_AT_RISK: f64 = 20.0;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct PondGeometry {
    pub length_m: f64,
    pub width_m: f64,
    pub depth_m: f64,
}

impl PondGeometry {
    pub fn volume_m3(&self) -> f64 {
        self.length_m * self.width_m * self.depth_m
    }

    pub fn is_valid(&self) -> bool {
        [self.length_m, self.width_m, self.depth_m]
            .iter()
            .all(|dim| dim.is_finite() && *dim > 0.0)
    }
}

/// Risk tier for a pond's stocking density.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StatusTier {
    Aman,
    Waspada,
    Berisiko,
}

/// Whether the cached tier on a pond record came from the classifier or from
/// an explicit operator override. Overrides win until the next automatic
/// recompute.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StatusOrigin {
    Computed,
    ManualOverride,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PondRecord {
    pub schema_version: String,
    pub pond_id: String,
    pub farm_id: String,
    pub name: String,
    pub geometry: Option<PondGeometry>,
    pub stocked_at: Option<NaiveDate>,
    /// Denormalized running total of the population ledger; >= 0 at every
    /// commit point. The ledger, not this cache, is authoritative.
    pub population: i64,
    /// Cached classification hint; decision logic always recomputes.
    pub status: StatusTier,
    pub status_origin: StatusOrigin,
}

impl PondRecord {
    pub fn volume_m3(&self) -> Option<f64> {
        self.geometry
            .as_ref()
            .map(PondGeometry::volume_m3)
            .filter(|volume| volume.is_finite() && *volume > 0.0)
    }
}

impl fmt::Display for PondRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "pond_id={} farm_id={} population={} status={:?}",
            self.pond_id, self.farm_id, self.population, self.status
        )
    }
}

/// Partial update for a pond. Individual dimensions may be patched on a pond
/// whose geometry is already valid; a pond without geometry must receive all
/// three dimensions together.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PondUpdate {
    pub name: Option<String>,
    pub length_m: Option<f64>,
    pub width_m: Option<f64>,
    pub depth_m: Option<f64>,
    pub manual_status: Option<StatusTier>,
}

impl PondUpdate {
    pub fn touches_geometry(&self) -> bool {
        self.length_m.is_some() || self.width_m.is_some() || self.depth_m.is_some()
    }
}

/// One append-only entry in a pond's population ledger.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PopulationEvent {
    pub schema_version: String,
    pub event_id: String,
    pub pond_id: String,
    pub recorded_at: DateTime<Utc>,
    /// Signed head-count change; never zero.
    pub delta: i64,
    /// Running total after applying `delta`; >= 0 for every ledger prefix.
    pub resulting_total: i64,
    pub reason: String,
}

/// One append-only entry in a pond's sampling ledger.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SamplingEvent {
    pub schema_version: String,
    pub event_id: String,
    pub pond_id: String,
    pub recorded_at: DateTime<Utc>,
    /// Observed size expressed as fish per kilogram; > 0.
    pub fish_per_kg: f64,
    pub note: Option<String>,
}

impl SamplingEvent {
    /// Derived average individual weight in grams.
    pub fn avg_weight_g(&self) -> f64 {
        GRAMS_PER_KG / self.fish_per_kg
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HarvestType {
    Partial,
    /// Caller declaration only; the engine does not force a TOTAL harvest to
    /// zero the population.
    Total,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HarvestEvent {
    pub schema_version: String,
    pub event_id: String,
    pub pond_id: String,
    pub recorded_at: DateTime<Utc>,
    pub weight_kg: f64,
    pub count: i64,
    pub price_per_kg: f64,
    pub harvest_type: HarvestType,
    pub note: Option<String>,
    /// The correlated population decrement emitted with this harvest.
    pub population_event_id: String,
    /// Set when the harvest was handed off to the external sale ledger.
    pub sale_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HarvestRequest {
    pub weight_kg: f64,
    pub count: i64,
    pub price_per_kg: f64,
    pub harvest_type: HarvestType,
    pub note: Option<String>,
    pub recorded_at: DateTime<Utc>,
    pub buyer_id: Option<String>,
}

/// Hand-off payload for the external sale ledger; mirrors the harvest by
/// convention (same weight, price, and count).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SaleRequest {
    pub pond_id: String,
    pub buyer_id: String,
    pub weight_kg: f64,
    pub price_per_kg: f64,
    pub count: i64,
    pub note: Option<String>,
}

/// Which measurement basis the classifier selected.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DensitySource {
    Count,
    Biomass,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Classification {
    pub schema_version: String,
    pub tier: StatusTier,
    pub source: DensitySource,
    /// Fish per cubic meter; `None` when the pond has no usable volume.
    pub density_count: Option<f64>,
    /// Kilograms per cubic meter; `None` without a sampling or usable volume.
    pub density_biomass: Option<f64>,
    /// Estimated total live weight; `None` without a sampling.
    pub biomass_kg: Option<f64>,
    /// Set when geometry is unset so no density could be computed.
    pub insufficient_data: bool,
}

/// Caller-supplied knobs for the growth projection. Survival and growth rates
/// are configuration, not constants baked into the engine.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct GrowthParams {
    pub growth_rate_g_per_day: f64,
    pub target_weight_g: f64,
    pub price_per_kg: f64,
    pub survival_rate: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProjectionEstimate {
    pub current_weight_g: f64,
    /// True when anchored to a sampling event; false for the stocking-weight
    /// fallback heuristic.
    pub calibrated: bool,
    pub biomass_kg: f64,
    pub days_since_stocking: i64,
    pub days_remaining: i64,
    pub estimated_harvest_on: NaiveDate,
    pub surviving_count: i64,
    pub projected_revenue: f64,
    pub feed_cost: f64,
    pub projected_profit: f64,
    /// Recommended daily feed quantity from the feed-sizing collaborator.
    pub daily_feed_kg: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum GrowthProjection {
    /// The pond has never been stocked, so there is nothing to project.
    NotApplicable { reason: String },
    Estimated(ProjectionEstimate),
}

impl GrowthProjection {
    pub fn estimate(&self) -> Option<&ProjectionEstimate> {
        match self {
            Self::Estimated(estimate) => Some(estimate),
            Self::NotApplicable { .. } => None,
        }
    }
}

/// Role resolved by the external farm-membership collaborator.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Owner,
    Admin,
    Operator,
    Viewer,
}

impl Role {
    pub fn can_mutate(self) -> bool {
        !matches!(self, Self::Viewer)
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "OWNER" => Some(Self::Owner),
            "ADMIN" => Some(Self::Admin),
            "OPERATOR" => Some(Self::Operator),
            "VIEWER" => Some(Self::Viewer),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Owner => "OWNER",
            Self::Admin => "ADMIN",
            Self::Operator => "OPERATOR",
            Self::Viewer => "VIEWER",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    InvalidInput,
    Unauthenticated,
    Forbidden,
    PondNotFound,
    InvariantViolation,
    InternalError,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ApiError {
    pub schema_version: String,
    pub error_code: ErrorCode,
    pub message: String,
    pub details: Option<String>,
}

impl ApiError {
    pub fn new(error_code: ErrorCode, message: impl Into<String>, details: Option<String>) -> Self {
        Self {
            schema_version: SCHEMA_VERSION_V1.to_string(),
            error_code,
            message: message.into(),
            details,
        }
    }
}

/// Global heuristics for the engine. Defaults reflect the empirical
/// assumptions of the source farm data; every value can be overridden.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EngineConfig {
    pub schema_version: String,
    /// Fallback individual weight in grams for ponds with no sampling yet.
    pub assumed_stocking_weight_g: f64,
    pub default_growth_rate_g_per_day: f64,
    pub default_target_weight_g: f64,
    /// Expected fraction of the population surviving to harvest.
    pub survival_rate: f64,
    /// Currency units per kilogram of feed, for the projected feed cost.
    pub assumed_feed_cost_per_kg: f64,
}

impl EngineConfig {
    pub fn growth_params(&self, price_per_kg: f64) -> GrowthParams {
        GrowthParams {
            growth_rate_g_per_day: self.default_growth_rate_g_per_day,
            target_weight_g: self.default_target_weight_g,
            price_per_kg,
            survival_rate: self.survival_rate,
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION_V1.to_string(),
            assumed_stocking_weight_g: 10.0,
            default_growth_rate_g_per_day: 2.0,
            default_target_weight_g: 150.0,
            survival_rate: 0.85,
            assumed_feed_cost_per_kg: 12_500.0,
        }
    }
}
