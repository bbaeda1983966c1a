pub mod candlestick;
pub mod market;
pub mod timeframe;
