use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    data::candlestick::Candlestick,
    error::MarketBotError,
    trading::position::Side,
};

use self::indicators::{IndicatorSnapshot, FAST_PERIOD, SLOW_PERIOD};

pub mod indicators;
pub mod rsi;

/// RSI must be above this for a long.
pub const RSI_LONG: f64 = 55.0;
/// RSI must be below this for a short.
pub const RSI_SHORT: f64 = 45.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Direction {
    Long,
    Short,
    NoTrade,
}

impl Direction {
    pub fn side(&self) -> Option<Side> {
        match self {
            Direction::Long => Some(Side::Long),
            Direction::Short => Some(Side::Short),
            Direction::NoTrade => None,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Long => write!(f, "LONG"),
            Direction::Short => write!(f, "SHORT"),
            Direction::NoTrade => write!(f, "NO TRADE"),
        }
    }
}

/// Entry, stop and the 1:1 / 1:2 targets proposed for a directional signal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TradeLevels {
    pub entry_price: f64,
    pub stop_loss: f64,
    pub take_profit_1: f64,
    pub take_profit_2: f64,
}

impl TradeLevels {
    fn propose(side: Side, entry_price: f64, stop_loss: f64) -> Self {
        let risk = (entry_price - stop_loss).abs();
        let (take_profit_1, take_profit_2) = match side {
            Side::Long => (entry_price + risk, entry_price + risk * 2.0),
            Side::Short => (entry_price - risk, entry_price - risk * 2.0),
        };
        Self {
            entry_price,
            stop_loss,
            take_profit_1,
            take_profit_2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub direction: Direction,
    pub reasons: Vec<String>,
    pub indicators: IndicatorSnapshot,
    /// `None` for `NoTrade`.
    pub levels: Option<TradeLevels>,
}

impl Signal {
    /// Side and levels to hand to the ledger, if the signal calls for a trade.
    pub fn trade(&self) -> Option<(Side, TradeLevels)> {
        self.direction.side().zip(self.levels)
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.direction)?;
        if let Some(levels) = &self.levels {
            write!(
                f,
                " | entry {:.2} | SL {:.2} | TP1 {:.2} | TP2 {:.2}",
                levels.entry_price, levels.stop_loss, levels.take_profit_1, levels.take_profit_2
            )?;
        }
        if !self.reasons.is_empty() {
            write!(f, " ({})", self.reasons.join(", "))?;
        }
        write!(
            f,
            " [EMA{} {:.2} EMA{} {:.2} MACD {:.2}/{:.2} RSI {:.1}]",
            FAST_PERIOD,
            self.indicators.ema_fast,
            SLOW_PERIOD,
            self.indicators.ema_slow,
            self.indicators.macd,
            self.indicators.macd_signal,
            self.indicators.rsi
        )
    }
}

/// Classifies the latest close of `closes`. The slow EMA doubles as the stop.
pub fn evaluate_signal(closes: &[f64]) -> Result<Signal, MarketBotError> {
    let ind = IndicatorSnapshot::compute(closes)?;
    let entry_price = closes[closes.len() - 1];

    let (direction, reasons) = if ind.ema_fast > ind.ema_slow
        && ind.macd > ind.macd_signal
        && ind.rsi > RSI_LONG
    {
        (
            Direction::Long,
            vec![
                format!("EMA{} > EMA{}", FAST_PERIOD, SLOW_PERIOD),
                "MACD bullish".to_string(),
                format!("RSI {:.1} > {}", ind.rsi, RSI_LONG),
            ],
        )
    } else if ind.ema_fast < ind.ema_slow && ind.macd < ind.macd_signal && ind.rsi < RSI_SHORT {
        (
            Direction::Short,
            vec![
                format!("EMA{} < EMA{}", FAST_PERIOD, SLOW_PERIOD),
                "MACD bearish".to_string(),
                format!("RSI {:.1} < {}", ind.rsi, RSI_SHORT),
            ],
        )
    } else {
        (Direction::NoTrade, Vec::new())
    };

    let levels = direction
        .side()
        .map(|side| TradeLevels::propose(side, entry_price, ind.ema_slow));

    debug!(%direction, ?levels, "Evaluated signal");
    Ok(Signal {
        direction,
        reasons,
        indicators: ind,
        levels,
    })
}

pub fn evaluate_candles(candles: &[Candlestick]) -> Result<Signal, MarketBotError> {
    evaluate_signal(&Candlestick::closes(candles))
}
