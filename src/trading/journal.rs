use std::path::Path;

use serde::Serialize;
use tracing::{info, instrument};

use crate::{
    error::MarketBotError,
    trading::position::{CloseReason, ClosedTrade, Side},
};

#[derive(Debug, Serialize)]
struct JournalRow {
    opened_at: String,
    closed_at: String,
    side: Side,
    reason: CloseReason,
    entry_price: f64,
    exit_price: f64,
    quantity: f64,
    stop_loss: f64,
    take_profit_1: f64,
    take_profit_2: f64,
    entry_fee: f64,
    exit_fee: f64,
    gross_pnl: f64,
    net_pnl: f64,
    peak_equity: f64,
}

impl From<&ClosedTrade> for JournalRow {
    fn from(trade: &ClosedTrade) -> Self {
        let p = &trade.position;
        Self {
            opened_at: p.opened_at.to_rfc3339(),
            closed_at: trade.closed_at.to_rfc3339(),
            side: p.side,
            reason: trade.reason,
            entry_price: p.entry_price,
            exit_price: trade.exit_price,
            quantity: p.quantity,
            stop_loss: p.stop_loss,
            take_profit_1: p.take_profit_1,
            take_profit_2: p.take_profit_2,
            entry_fee: p.entry_fee,
            exit_fee: trade.exit_fee,
            gross_pnl: trade.gross_pnl,
            net_pnl: trade.net_pnl,
            peak_equity: p.peak_equity,
        }
    }
}

/// Writes the closed-trade history to `path` as CSV, one row per trade.
#[instrument(level = "info", skip(trades), fields(trades = trades.len()))]
pub fn export_trades<P: AsRef<Path> + std::fmt::Debug>(
    trades: &[ClosedTrade],
    path: P,
) -> Result<(), MarketBotError> {
    let mut writer = csv::Writer::from_path(path.as_ref())?;
    for trade in trades {
        writer.serialize(JournalRow::from(trade))?;
    }
    writer.flush()?;
    info!(path = %path.as_ref().display(), "Exported trade journal");
    Ok(())
}
