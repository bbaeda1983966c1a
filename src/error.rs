use crate::trading::position::Side;

#[derive(Debug, thiserror::Error)]
pub enum MarketBotError {
    #[error("Insufficient candle history: got {got} closes, need at least {required}.")]
    InsufficientData { got: usize, required: usize },
    #[error("A {side} position is already open at {entry_price}.")]
    PositionAlreadyOpen { side: Side, entry_price: f64 },
    #[error("Stop loss {stop_loss} leaves no distance to entry price {entry_price}.")]
    InvalidStop { entry_price: f64, stop_loss: f64 },
    #[error("Price {field} must be a finite number, got {value}.")]
    InvalidPrice { field: &'static str, value: f64 },
    #[error("There is no open position to close.")]
    NoOpenPosition,
    #[error("State store at {path} is unavailable: {reason}")]
    PersistenceUnavailable { path: String, reason: String },
    #[error("Technical indicator error for {indicator}: {reason}")]
    TechnicalIndicatorError { indicator: String, reason: String },
    #[error("Invalid candlestick open time {timestamp}.")]
    InvalidCandlestickDateTime { timestamp: i64 },
    #[error("Parse Timeframe Error: {0}")]
    ParseTimeframeError(#[from] ParseTimeframeError),
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("Binance API Error: {0}")]
    BinanceApiError(String),
    #[error("IO Error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Serde YAML Error: {0}")]
    SerdeYamlError(#[from] serde_yaml::Error),
    #[error("Serde JSON Error: {0}")]
    SerdeJsonError(#[from] serde_json::Error),
    #[error("CSV Error: {0}")]
    CsvError(#[from] csv::Error),
}

impl MarketBotError {
    pub(crate) fn persistence(path: impl std::fmt::Display, reason: impl ToString) -> Self {
        MarketBotError::PersistenceUnavailable {
            path: path.to_string(),
            reason: reason.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParseTimeframeError {
    #[error("Failed to parse timeframe from string: {0}")]
    ParseStringError(String),
}
