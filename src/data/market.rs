use binance::{api::Binance, market::Market};
use tracing::{debug, instrument};

use crate::{
    config::MarketBotConfig,
    data::{candlestick::Candlestick, timeframe::Timeframe},
    error::MarketBotError,
};

/// Everything the paper trader needs from an exchange on a tick.
#[allow(async_fn_in_trait)]
pub trait MarketData {
    /// The most recent `limit` candles, oldest first.
    async fn candles(&self, limit: u16) -> Result<Vec<Candlestick>, MarketBotError>;

    /// The last traded price.
    async fn price(&self) -> Result<f64, MarketBotError>;

    /// Candles and price fetched together.
    async fn snapshot(&self, limit: u16) -> Result<(Vec<Candlestick>, f64), MarketBotError> {
        futures::try_join!(self.candles(limit), self.price())
    }
}

pub struct BinanceMarketData {
    market: Market,
    symbol: String,
    timeframe: Timeframe,
}

impl BinanceMarketData {
    pub fn new(config: &MarketBotConfig) -> Self {
        Self {
            market: config.get_binance::<Market>(),
            symbol: config.symbol.clone(),
            timeframe: config.timeframe,
        }
    }
}

impl MarketData for BinanceMarketData {
    #[instrument(skip(self), fields(symbol = %self.symbol, timeframe = %self.timeframe))]
    async fn candles(&self, limit: u16) -> Result<Vec<Candlestick>, MarketBotError> {
        let summaries = self
            .market
            .get_klines(
                self.symbol.as_str(),
                self.timeframe.to_string(),
                Some(limit),
                None::<u64>,
                None::<u64>,
            )
            .await
            .map_err(|e| MarketBotError::BinanceApiError(e.to_string()))?;

        let mut candles = Candlestick::map_to_candlesticks(summaries)?;
        candles.sort_by(|a, b| a.open_time.cmp(&b.open_time));
        candles.dedup_by_key(|c| c.open_time);
        debug!(count = candles.len(), "Loaded candles");
        Ok(candles)
    }

    #[instrument(skip(self), fields(symbol = %self.symbol))]
    async fn price(&self) -> Result<f64, MarketBotError> {
        let ticker = self
            .market
            .get_price(self.symbol.as_str())
            .await
            .map_err(|e| MarketBotError::BinanceApiError(e.to_string()))?;
        debug!(price = ticker.price, "Loaded last price");
        Ok(ticker.price)
    }
}
