use serde::{Deserialize, Serialize};
use ta::{
    indicators::{ExponentialMovingAverage, MovingAverageConvergenceDivergence},
    Next,
};

use crate::{error::MarketBotError, signal::rsi::WilderRsi};

pub const FAST_PERIOD: usize = 12;
pub const SLOW_PERIOD: usize = 26;
pub const RSI_PERIOD: usize = 14;
pub const MACD_SIGNAL_PERIOD: usize = 9;

/// Fewest closes the evaluator accepts.
pub const MIN_CLOSES: usize = if SLOW_PERIOD > RSI_PERIOD {
    SLOW_PERIOD + 1
} else {
    RSI_PERIOD + 1
};

/// Indicator values at the latest close of a series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSnapshot {
    pub ema_fast: f64,
    pub ema_slow: f64,
    pub macd: f64,
    pub macd_signal: f64,
    pub rsi: f64,
}

impl IndicatorSnapshot {
    /// Runs every indicator over the whole series and keeps the final values.
    pub fn compute(closes: &[f64]) -> Result<Self, MarketBotError> {
        if closes.len() < MIN_CLOSES {
            return Err(MarketBotError::InsufficientData {
                got: closes.len(),
                required: MIN_CLOSES,
            });
        }
        if let Some(bad) = closes.iter().find(|c| !c.is_finite()) {
            return Err(MarketBotError::TechnicalIndicatorError {
                indicator: "close series".to_string(),
                reason: format!("non-finite close {}", bad),
            });
        }

        let mut ema_fast = ExponentialMovingAverage::new(FAST_PERIOD)
            .map_err(|e| indicator_error("EMA fast", e))?;
        let mut ema_slow = ExponentialMovingAverage::new(SLOW_PERIOD)
            .map_err(|e| indicator_error("EMA slow", e))?;
        let mut macd =
            MovingAverageConvergenceDivergence::new(FAST_PERIOD, SLOW_PERIOD, MACD_SIGNAL_PERIOD)
                .map_err(|e| indicator_error("MACD", e))?;
        let mut rsi = WilderRsi::new(RSI_PERIOD).map_err(|e| indicator_error("RSI", e))?;

        let mut snapshot = Self {
            ema_fast: 0.0,
            ema_slow: 0.0,
            macd: 0.0,
            macd_signal: 0.0,
            rsi: 0.0,
        };
        for &close in closes {
            let macd_out = macd.next(close);
            snapshot = Self {
                ema_fast: ema_fast.next(close),
                ema_slow: ema_slow.next(close),
                macd: macd_out.macd,
                macd_signal: macd_out.signal,
                rsi: rsi.next(close),
            };
        }
        Ok(snapshot)
    }
}

fn indicator_error(indicator: &str, error: impl std::fmt::Debug) -> MarketBotError {
    MarketBotError::TechnicalIndicatorError {
        indicator: indicator.to_string(),
        reason: format!("{:?}", error),
    }
}
