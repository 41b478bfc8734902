//! Contracts for the external systems the engine consumes but does not own.

use std::fmt;

use contracts::SaleRequest;

/// Aggregate feed history for a pond, kept by the external feed-record
/// system.
pub trait FeedRecords: Send + Sync {
    fn total_feed_kg(&self, pond_id: &str) -> f64;
}

/// Pure feed-sizing lookup: current individual weight and pond biomass in,
/// recommended daily feed quantity out.
pub trait FeedSizing: Send + Sync {
    fn daily_feed_kg(&self, current_weight_g: f64, biomass_kg: f64) -> f64;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaleLedgerError(pub String);

impl fmt::Display for SaleLedgerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sale ledger error: {}", self.0)
    }
}

impl std::error::Error for SaleLedgerError {}

/// The external sales/expense financial ledger. A harvest optionally hands
/// off one sale with the same weight, price, and count.
pub trait SaleLedger: Send + Sync {
    fn record_sale(&self, request: SaleRequest) -> Result<String, SaleLedgerError>;
}
