use std::path::Path;

use chrono::{Duration, TimeZone, Utc};
use tracing::{info, subscriber::set_default};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt;

use crate::data::candlestick::{Candlestick, CandlestickBuilder};

pub struct TracingGuards {
    _subscriber_guard: tracing::subscriber::DefaultGuard,
    _worker_guard: WorkerGuard,
}

/// Routes this thread's tracing output to `tests/logs/<test_name>.log`.
pub fn setup_test_tracing(test_name: &str) -> TracingGuards {
    let log_dir = Path::new("tests/logs");
    if !log_dir.exists() {
        std::fs::create_dir_all(log_dir).unwrap();
    }

    let file_appender = tracing_appender::rolling::never(log_dir, format!("{}.log", test_name));
    let (non_blocking, worker_guard) = tracing_appender::non_blocking(file_appender);

    let subscriber = fmt::Subscriber::builder()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_level(true)
        .with_target(true)
        .with_thread_ids(true)
        .with_thread_names(true)
        .with_max_level(tracing::Level::DEBUG)
        .finish();

    let subscriber_guard = set_default(subscriber);
    info!("-----------------");
    info!("Test: {}", test_name);
    info!("-----------------");

    TracingGuards {
        _subscriber_guard: subscriber_guard,
        _worker_guard: worker_guard,
    }
}

/// Five-minute candles closing at each of `closes`, oldest first.
pub fn candles_from_closes(closes: &[f64]) -> Vec<Candlestick> {
    let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            CandlestickBuilder::default()
                .open_time(start + Duration::minutes(5 * i as i64))
                .open(close)
                .high(close)
                .low(close)
                .close(close)
                .build()
                .unwrap()
        })
        .collect()
}

/// `count` closes moving by `step` per candle from `start`.
pub fn linear_closes(start: f64, step: f64, count: usize) -> Vec<f64> {
    (0..count).map(|i| start + step * i as f64).collect()
}

pub fn rising_candles(count: usize) -> Vec<Candlestick> {
    candles_from_closes(&linear_closes(100.0, 1.0, count))
}

pub fn falling_candles(count: usize) -> Vec<Candlestick> {
    candles_from_closes(&linear_closes(400.0, -1.0, count))
}

pub fn flat_candles(count: usize) -> Vec<Candlestick> {
    candles_from_closes(&vec![100.0; count])
}
