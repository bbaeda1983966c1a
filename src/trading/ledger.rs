use std::fmt;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::{
    error::MarketBotError,
    trading::{
        position::{CloseReason, ClosedTrade, Position, Side},
        stats::Stats,
        TradingConfig,
    },
    util::math_utils::round_to,
};

const QUANTITY_DECIMALS: u32 = 6;
const CASH_DECIMALS: u32 = 2;

/// The durable simulation record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    /// Settled capital. Moves only when a trade closes.
    pub balance: f64,
    /// Balance less the entry fee of the open position.
    pub equity: f64,
    pub open: Option<Position>,
    pub trades: Vec<ClosedTrade>,
}

impl Account {
    pub fn new(initial_balance: f64) -> Self {
        Self {
            balance: initial_balance,
            equity: initial_balance,
            open: None,
            trades: Vec::new(),
        }
    }

    pub fn is_flat(&self) -> bool {
        self.open.is_none()
    }
}

/// What a close reports back to the caller. `net_pnl` is unrounded.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CloseOutcome {
    pub reason: CloseReason,
    pub net_pnl: f64,
}

impl fmt::Display for CloseOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "closed on {} for {:+.2}", self.reason, self.net_pnl)
    }
}

/// An account plus the settings it trades under. Every method is one atomic
/// step: on error the account is left exactly as it was.
#[derive(Debug, Clone, PartialEq)]
pub struct Ledger {
    config: TradingConfig,
    account: Account,
}

impl Ledger {
    pub fn new(config: TradingConfig) -> Self {
        Self::with_account(config, Account::new(config.initial_balance))
    }

    pub fn with_account(config: TradingConfig, account: Account) -> Self {
        Self { config, account }
    }

    pub fn account(&self) -> &Account {
        &self.account
    }

    pub fn into_account(self) -> Account {
        self.account
    }

    /// Opens a position risking `risk_pct` of the balance between entry and stop.
    #[instrument(level = "debug", skip(self))]
    pub fn open_position(
        &mut self,
        side: Side,
        entry_price: f64,
        take_profit_1: f64,
        take_profit_2: f64,
        stop_loss: f64,
    ) -> Result<&Position, MarketBotError> {
        finite("entry_price", entry_price)?;
        finite("take_profit_1", take_profit_1)?;
        finite("take_profit_2", take_profit_2)?;
        finite("stop_loss", stop_loss)?;
        if let Some(open) = &self.account.open {
            return Err(MarketBotError::PositionAlreadyOpen {
                side: open.side,
                entry_price: open.entry_price,
            });
        }

        let risk_amount = self.config.risk_pct / 100.0 * self.account.balance;
        let stop_distance = (entry_price - stop_loss).abs();
        if stop_distance == 0.0 {
            return Err(MarketBotError::InvalidStop {
                entry_price,
                stop_loss,
            });
        }

        let quantity = round_to(
            risk_amount / stop_distance * self.config.leverage,
            QUANTITY_DECIMALS,
        );
        if quantity <= 0.0 {
            return Err(MarketBotError::InvalidStop {
                entry_price,
                stop_loss,
            });
        }
        let entry_fee = entry_price * quantity * self.config.fee_pct;
        self.account.equity -= entry_fee;

        info!(
            %side,
            entry_price,
            stop_loss,
            take_profit_1,
            take_profit_2,
            quantity,
            entry_fee,
            "Opened paper position"
        );
        Ok(&*self.account.open.insert(Position {
            side,
            entry_price,
            quantity,
            stop_loss,
            take_profit_1,
            take_profit_2,
            entry_fee,
            peak_equity: self.account.equity,
            opened_at: Utc::now(),
        }))
    }

    /// Raises the open position's high-water mark to `equity` if it is higher.
    /// Non-finite figures are ignored.
    pub fn trail_peak(&mut self, equity: f64) {
        if let Some(open) = self.account.open.as_mut() {
            if equity.is_finite() && equity > open.peak_equity {
                debug!(from = open.peak_equity, to = equity, "Raised peak equity");
                open.peak_equity = equity;
            }
        }
    }

    /// Ratchets the peak with `reported_equity`, then closes the position if
    /// `current_price` reached one of its levels. A non-finite price never
    /// triggers a close.
    pub fn evaluate_tick(
        &mut self,
        current_price: f64,
        reported_equity: f64,
    ) -> Option<CloseOutcome> {
        self.trail_peak(reported_equity);
        if !current_price.is_finite() {
            return None;
        }
        let reason = self.account.open.as_ref()?.exit_trigger(current_price)?;
        self.close_position(current_price, reason).ok()
    }

    #[instrument(level = "debug", skip(self))]
    pub fn close_position(
        &mut self,
        exit_price: f64,
        reason: CloseReason,
    ) -> Result<CloseOutcome, MarketBotError> {
        finite("exit_price", exit_price)?;
        let position = self.account.open.take().ok_or(MarketBotError::NoOpenPosition)?;

        let gross_pnl = position.gross_pnl(exit_price);
        let exit_fee = exit_price * position.quantity * self.config.fee_pct;
        let net_pnl = gross_pnl - position.entry_fee - exit_fee;

        self.account.balance = round_to(self.account.balance + net_pnl, CASH_DECIMALS);
        self.account.equity = self.account.balance;

        info!(
            side = %position.side,
            %reason,
            exit_price,
            net_pnl,
            balance = self.account.balance,
            "Closed paper position"
        );
        self.account.trades.push(ClosedTrade {
            position,
            exit_price,
            reason,
            exit_fee,
            gross_pnl: round_to(gross_pnl, CASH_DECIMALS),
            net_pnl: round_to(net_pnl, CASH_DECIMALS),
            closed_at: Utc::now(),
        });
        Ok(CloseOutcome { reason, net_pnl })
    }

    pub fn stats(&self) -> Stats {
        Stats::compute(&self.account, self.config.initial_balance)
    }
}

fn finite(field: &'static str, value: f64) -> Result<(), MarketBotError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(MarketBotError::InvalidPrice { field, value })
    }
}
