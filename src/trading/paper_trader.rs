use std::sync::{Mutex, MutexGuard};

use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::{
    data::{candlestick::Candlestick, market::MarketData},
    error::MarketBotError,
    signal::{evaluate_candles, Signal},
    trading::{
        ledger::{Account, CloseOutcome, Ledger},
        position::{CloseReason, Position, Side},
        stats::Stats,
        store::StateStore,
        TradingConfig,
    },
};

/// Everything one tick produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TickReport {
    pub price: f64,
    pub signal: Signal,
    pub closed: Option<CloseOutcome>,
    pub opened: Option<Position>,
    pub stats: Stats,
}

/// Serialises every operation on one account and keeps it persisted.
///
/// Each call works on a copy of the ledger, saves the copy, and only then
/// swaps it in. A failed save leaves both memory and disk as they were.
pub struct PaperTrader<S: StateStore> {
    ledger: Mutex<Ledger>,
    store: S,
}

impl<S: StateStore> PaperTrader<S> {
    #[instrument(level = "info", skip(store))]
    pub fn new(config: TradingConfig, store: S) -> Result<Self, MarketBotError> {
        let account = store.load(config.initial_balance)?;
        info!(
            balance = account.balance,
            trades = account.trades.len(),
            open = account.open.is_some(),
            "Loaded paper account"
        );
        Ok(Self {
            ledger: Mutex::new(Ledger::with_account(config, account)),
            store,
        })
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Runs one evaluation cycle: close on a touched level, then open on a
    /// directional signal if flat.
    #[instrument(level = "debug", skip(self, candles), fields(candles = candles.len()))]
    pub fn on_tick(
        &self,
        candles: &[Candlestick],
        price: f64,
    ) -> Result<TickReport, MarketBotError> {
        if !price.is_finite() {
            return Err(MarketBotError::InvalidPrice {
                field: "price",
                value: price,
            });
        }
        let signal = evaluate_candles(candles)?;
        debug!(%signal, "Evaluated signal");

        self.transact(|ledger| {
            let balance = ledger.account().balance;
            let closed = ledger.evaluate_tick(price, balance);

            let opened = match signal.trade() {
                Some((side, levels)) if ledger.account().is_flat() => {
                    match ledger.open_position(
                        side,
                        levels.entry_price,
                        levels.take_profit_1,
                        levels.take_profit_2,
                        levels.stop_loss,
                    ) {
                        Ok(position) => Some(position.clone()),
                        Err(e) => {
                            warn!("Signal not traded: {}", e);
                            None
                        }
                    }
                }
                _ => None,
            };

            Ok(TickReport {
                price,
                signal: signal.clone(),
                closed,
                opened,
                stats: ledger.stats(),
            })
        })
    }

    /// Fetches `limit` candles and the last price from `market`, then runs
    /// [`PaperTrader::on_tick`]. Nothing is locked while fetching.
    pub async fn tick_from<M: MarketData>(
        &self,
        market: &M,
        limit: u16,
    ) -> Result<TickReport, MarketBotError> {
        let (candles, price) = market.snapshot(limit).await?;
        self.on_tick(&candles, price)
    }

    pub fn open_position(
        &self,
        side: Side,
        entry_price: f64,
        take_profit_1: f64,
        take_profit_2: f64,
        stop_loss: f64,
    ) -> Result<Position, MarketBotError> {
        self.transact(|ledger| {
            ledger
                .open_position(side, entry_price, take_profit_1, take_profit_2, stop_loss)
                .cloned()
        })
    }

    /// Closes the open position at `price` regardless of its levels.
    pub fn force_close(&self, price: f64) -> Result<CloseOutcome, MarketBotError> {
        self.transact(|ledger| ledger.close_position(price, CloseReason::Manual))
    }

    pub fn stats(&self) -> Result<Stats, MarketBotError> {
        Ok(self.lock()?.stats())
    }

    pub fn account(&self) -> Result<Account, MarketBotError> {
        Ok(self.lock()?.account().clone())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Ledger>, MarketBotError> {
        self.ledger
            .lock()
            .map_err(|e| MarketBotError::persistence("ledger", e))
    }

    fn transact<T>(
        &self,
        apply: impl FnOnce(&mut Ledger) -> Result<T, MarketBotError>,
    ) -> Result<T, MarketBotError> {
        let mut guard = self.lock()?;
        let mut working = guard.clone();
        let value = apply(&mut working)?;
        if working != *guard {
            if let Err(e) = self.store.save(working.account()) {
                warn!("Discarding change, state could not be saved: {}", e);
                return Err(e);
            }
            *guard = working;
        }
        Ok(value)
    }
}
