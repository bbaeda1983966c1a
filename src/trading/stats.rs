use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{
    trading::{ledger::Account, position::Position},
    util::math_utils::{mean, round_to},
};

/// Performance summary over the closed-trade history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stats {
    pub balance: f64,
    pub equity: f64,
    pub open: Option<Position>,
    pub trade_count: usize,
    /// Percent of trades with a positive net P&L.
    pub win_rate: f64,
    /// Mean net P&L per trade.
    pub expectancy: f64,
    /// Percent, see [`max_drawdown`].
    pub max_drawdown: f64,
}

impl Stats {
    pub fn compute(account: &Account, initial_balance: f64) -> Self {
        let net: Vec<f64> = account.trades.iter().map(|t| t.net_pnl).collect();
        let wins = net.iter().filter(|&&n| n > 0.0).count();

        Self {
            balance: round_to(account.balance, 2),
            equity: account.equity,
            open: account.open.clone(),
            trade_count: net.len(),
            win_rate: wins as f64 / net.len().max(1) as f64 * 100.0,
            expectancy: round_to(mean(&net), 2),
            max_drawdown: round_to(max_drawdown(account, initial_balance) * 100.0, 1),
        }
    }
}

/// Largest `1 - (peak_equity + net) / running_peak` over the history, as a
/// fraction. The running peak starts at `initial_balance` and takes the max
/// of each trade's stored peak equity.
pub fn max_drawdown(account: &Account, initial_balance: f64) -> f64 {
    account
        .trades
        .iter()
        .fold((initial_balance, 0.0_f64), |(peak, dd), trade| {
            let peak = peak.max(trade.position.peak_equity);
            let drawdown = 1.0 - (trade.position.peak_equity + trade.net_pnl) / peak;
            (peak, dd.max(drawdown))
        })
        .1
}

impl fmt::Display for Stats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Balance: {:.2} | Trades: {} | Win rate: {:.1}% | Expectancy: {:.2} | Max DD: {:.1}%",
            self.balance, self.trade_count, self.win_rate, self.expectancy, self.max_drawdown
        )?;
        if let Some(open) = &self.open {
            write!(f, " | Open: {}", open)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::trading::position::{CloseReason, ClosedTrade, Side};

    fn trade(peak_equity: f64, net_pnl: f64) -> ClosedTrade {
        ClosedTrade {
            position: Position {
                side: Side::Long,
                entry_price: 100.0,
                quantity: 1.0,
                stop_loss: 95.0,
                take_profit_1: 105.0,
                take_profit_2: 110.0,
                entry_fee: 0.0,
                peak_equity,
                opened_at: Utc::now(),
            },
            exit_price: 100.0 + net_pnl,
            reason: CloseReason::TakeProfit1,
            exit_fee: 0.0,
            gross_pnl: net_pnl,
            net_pnl,
            closed_at: Utc::now(),
        }
    }

    fn account(trades: Vec<ClosedTrade>) -> Account {
        let balance = 100.0 + trades.iter().map(|t| t.net_pnl).sum::<f64>();
        Account {
            balance,
            equity: balance,
            open: None,
            trades,
        }
    }

    #[test]
    fn test_empty_history() {
        let stats = Stats::compute(&Account::new(100.0), 100.0);
        assert_eq!(stats.trade_count, 0);
        assert_eq!(stats.win_rate, 0.0);
        assert_eq!(stats.expectancy, 0.0);
        assert_eq!(stats.max_drawdown, 0.0);
        assert_eq!(stats.balance, 100.0);
    }

    #[test]
    fn test_win_rate_and_expectancy() {
        let stats = Stats::compute(
            &account(vec![trade(100.0, 4.0), trade(104.0, -1.0), trade(103.0, 0.0)]),
            100.0,
        );
        assert_eq!(stats.trade_count, 3);
        assert!((stats.win_rate - 100.0 / 3.0).abs() < 1e-9);
        assert_eq!(stats.expectancy, 1.0);
    }

    #[test]
    fn test_drawdown_uses_global_peak_and_trade_peak() {
        // peak 110 -> 1 - (110 - 11) / 110 = 0.1
        // peak stays 110 -> 1 - (99 - 4) / 110 = 0.13636..
        let trades = vec![trade(110.0, -11.0), trade(99.0, -4.0)];
        let fraction = max_drawdown(&account(trades.clone()), 100.0);
        assert!((fraction - (1.0 - 95.0 / 110.0)).abs() < 1e-12);
        let stats = Stats::compute(&account(trades), 100.0);
        assert_eq!(stats.max_drawdown, 13.6);
    }

    #[test]
    fn test_drawdown_can_go_negative_for_winners_only() {
        // Winning trades give negative per-trade values; the fold starts at 0.
        let fraction = max_drawdown(&account(vec![trade(100.0, 5.0)]), 100.0);
        assert_eq!(fraction, 0.0);
    }
}
