use serde::{Deserialize, Serialize};

pub mod journal;
pub mod ledger;
pub mod paper_trader;
pub mod position;
pub mod stats;
pub mod store;

/// Risk and cost settings injected into a ledger. Fixed for the life of the process.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TradingConfig {
    pub initial_balance: f64,
    /// Percent of balance risked per trade, `1.0` = 1 %.
    pub risk_pct: f64,
    /// Fraction of notional charged on entry and again on exit, `0.0004` = 0.04 %.
    pub fee_pct: f64,
    pub leverage: f64,
}

impl Default for TradingConfig {
    fn default() -> Self {
        Self {
            initial_balance: 100.0,
            risk_pct: 1.0,
            fee_pct: 0.0004,
            leverage: 3.0,
        }
    }
}
