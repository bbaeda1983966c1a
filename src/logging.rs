use std::path::Path;

use chrono::Local;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, EnvFilter, Layer, Registry};

/// Installs the global subscriber: INFO+ to stdout, DEBUG+ from this crate to
/// a timestamped file under `log_dir` (default `logs`). `prefix` names the
/// binary in the file name.
///
/// Keep the returned guard alive for the life of the process or buffered file
/// lines are lost.
pub fn setup_tracing(
    log_dir: Option<&str>,
    prefix: &str,
) -> Result<WorkerGuard, Box<dyn std::error::Error>> {
    let log_dir_str = log_dir.unwrap_or("logs");
    let log_dir = Path::new(log_dir_str);
    if !log_dir.exists() {
        std::fs::create_dir_all(log_dir)?;
    }

    let timestamp = Local::now().format("%Y-%m-%d_%H-%M-%S").to_string();
    let file_appender =
        tracing_appender::rolling::never(log_dir, format!("{}_{}.log", prefix, timestamp));
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let console_layer = fmt::layer()
        .with_writer(std::io::stdout)
        .with_ansi(true)
        .with_level(true)
        .with_target(false)
        .with_filter(EnvFilter::from_default_env().add_directive("INFO".parse()?));

    let file_layer = fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_level(true)
        .with_target(true)
        .with_thread_ids(true)
        .with_thread_names(true)
        .with_filter(EnvFilter::from_default_env().add_directive("marketbot=DEBUG".parse()?));

    let subscriber = Registry::default().with(console_layer).with(file_layer);
    tracing::subscriber::set_global_default(subscriber)?;

    info!(log_dir = %log_dir.display(), "Tracing initialized");
    Ok(guard)
}
