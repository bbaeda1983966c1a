use binance::rest_model::{KlineSummaries, KlineSummary};
use chrono::{DateTime, TimeZone, Utc};
use derive_builder::Builder;
use serde::{Deserialize, Serialize};

use crate::error::MarketBotError;

/// One OHLCV bar. Candles are handed to the evaluator oldest first.
#[derive(Debug, Clone, PartialEq, Builder, Serialize, Deserialize)]
pub struct Candlestick {
    pub open_time: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    #[builder(default)]
    pub volume: f64,
}

impl Candlestick {
    /// Builds a candle from a millisecond open time and raw OHLCV values.
    pub fn from_parts(
        open_time_ms: i64,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: f64,
    ) -> Result<Self, MarketBotError> {
        let open_time = Utc.timestamp_millis_opt(open_time_ms).single().ok_or(
            MarketBotError::InvalidCandlestickDateTime {
                timestamp: open_time_ms,
            },
        )?;
        Ok(Self {
            open_time,
            open,
            high,
            low,
            close,
            volume,
        })
    }

    pub fn from_summary(summary: KlineSummary) -> Result<Self, MarketBotError> {
        Self::from_parts(
            summary.open_time,
            summary.open,
            summary.high,
            summary.low,
            summary.close,
            summary.volume,
        )
    }

    pub fn map_to_candlesticks(summaries: KlineSummaries) -> Result<Vec<Self>, MarketBotError> {
        match summaries {
            KlineSummaries::AllKlineSummaries(summaries) => summaries
                .into_iter()
                .map(Candlestick::from_summary)
                .collect(),
        }
    }

    /// Close prices of a candle slice, preserving order.
    pub fn closes(candles: &[Candlestick]) -> Vec<f64> {
        candles.iter().map(|c| c.close).collect()
    }
}
