use std::fmt;

pub type Result<T> = std::result::Result<T, EngineError>;

/// Typed failures surfaced by the engine. Validation problems are the
/// caller's fault; invariant violations mean the requested mutation would
/// break the ledger's arithmetic and were rejected before any write.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineError {
    PondNotFound(String),
    InvalidGeometry {
        length_m: f64,
        width_m: f64,
        depth_m: f64,
    },
    /// Partial dimensions supplied for a pond that has no geometry yet.
    GeometryIncomplete,
    /// A zero delta would be a meaningless ledger entry.
    ZeroDelta,
    PopulationWouldGoNegative {
        current: i64,
        delta: i64,
    },
    InvalidSampling(f64),
    NonPositiveHarvestField {
        field: &'static str,
        value: f64,
    },
    OverHarvestCount {
        requested: i64,
        available: i64,
    },
    OverHarvestBiomass {
        requested_kg: f64,
        biomass_kg: f64,
    },
    InvalidGrowthRate(f64),
    SaleHandoffFailed(String),
    Storage(String),
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PondNotFound(pond_id) => write!(f, "pond not found: {pond_id}"),
            Self::InvalidGeometry {
                length_m,
                width_m,
                depth_m,
            } => write!(
                f,
                "every pond dimension must be a positive number of meters: \
                 length={length_m} width={width_m} depth={depth_m}"
            ),
            Self::GeometryIncomplete => write!(
                f,
                "a pond without geometry must receive length, width, and depth together"
            ),
            Self::ZeroDelta => write!(f, "population delta must be nonzero"),
            Self::PopulationWouldGoNegative { current, delta } => write!(
                f,
                "population cannot go negative: current={current} delta={delta}"
            ),
            Self::InvalidSampling(fish_per_kg) => {
                write!(f, "fish_per_kg must be positive: got {fish_per_kg}")
            }
            Self::NonPositiveHarvestField { field, value } => {
                write!(f, "harvest {field} must be positive: got {value}")
            }
            Self::OverHarvestCount {
                requested,
                available,
            } => write!(
                f,
                "harvest count {requested} exceeds current population {available}"
            ),
            Self::OverHarvestBiomass {
                requested_kg,
                biomass_kg,
            } => write!(
                f,
                "harvest weight {requested_kg} kg exceeds estimated biomass \
                 {biomass_kg} kg; re-sample before harvesting this much weight"
            ),
            Self::InvalidGrowthRate(rate) => {
                write!(f, "growth rate must be positive grams/day: got {rate}")
            }
            Self::SaleHandoffFailed(detail) => write!(f, "sale ledger hand-off failed: {detail}"),
            Self::Storage(detail) => write!(f, "storage commit failed: {detail}"),
        }
    }
}

impl std::error::Error for EngineError {}
