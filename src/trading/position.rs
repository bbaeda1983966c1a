use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    Long,
    Short,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Long => write!(f, "LONG"),
            Side::Short => write!(f, "SHORT"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CloseReason {
    #[serde(rename = "TP1")]
    TakeProfit1,
    #[serde(rename = "TP2")]
    TakeProfit2,
    #[serde(rename = "SL")]
    StopLoss,
    /// Closed on request rather than by a level being touched.
    #[serde(rename = "MANUAL")]
    Manual,
}

impl fmt::Display for CloseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CloseReason::TakeProfit1 => write!(f, "TP1"),
            CloseReason::TakeProfit2 => write!(f, "TP2"),
            CloseReason::StopLoss => write!(f, "SL"),
            CloseReason::Manual => write!(f, "MANUAL"),
        }
    }
}

/// The single open trade of an account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub side: Side,
    pub entry_price: f64,
    pub quantity: f64,
    pub stop_loss: f64,
    pub take_profit_1: f64,
    pub take_profit_2: f64,
    pub entry_fee: f64,
    pub peak_equity: f64,
    pub opened_at: DateTime<Utc>,
}

impl Position {
    /// Which level, if any, `price` has reached. TP2 beats TP1 beats SL.
    pub fn exit_trigger(&self, price: f64) -> Option<CloseReason> {
        let (hit_tp2, hit_tp1, hit_sl) = match self.side {
            Side::Long => (
                price >= self.take_profit_2,
                price >= self.take_profit_1,
                price <= self.stop_loss,
            ),
            Side::Short => (
                price <= self.take_profit_2,
                price <= self.take_profit_1,
                price >= self.stop_loss,
            ),
        };
        if hit_tp2 {
            Some(CloseReason::TakeProfit2)
        } else if hit_tp1 {
            Some(CloseReason::TakeProfit1)
        } else if hit_sl {
            Some(CloseReason::StopLoss)
        } else {
            None
        }
    }

    /// Price move times quantity, before fees.
    pub fn gross_pnl(&self, exit_price: f64) -> f64 {
        match self.side {
            Side::Long => (exit_price - self.entry_price) * self.quantity,
            Side::Short => (self.entry_price - exit_price) * self.quantity,
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} @ {:.2} (SL {:.2}, TP1 {:.2}, TP2 {:.2})",
            self.side,
            self.quantity,
            self.entry_price,
            self.stop_loss,
            self.take_profit_1,
            self.take_profit_2
        )
    }
}

/// A finished trade. Never modified once appended to the history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClosedTrade {
    #[serde(flatten)]
    pub position: Position,
    pub exit_price: f64,
    pub reason: CloseReason,
    pub exit_fee: f64,
    pub gross_pnl: f64,
    pub net_pnl: f64,
    pub closed_at: DateTime<Utc>,
}
