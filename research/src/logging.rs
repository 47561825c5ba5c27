use crate::config::Config;
use crate::{Error, Result};
use tracing::level_filters::LevelFilter;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

const LOG_FILE: &str = "info.log";

/// Installs the global subscriber: an append-only `info.log` in the
/// configured directory plus human readable output on stderr.
///
/// The returned guard flushes the file writer when dropped and must be kept
/// alive for the lifetime of the process.
pub fn init(config: &Config) -> Result<WorkerGuard> {
    let level: tracing::Level = config
        .log_level
        .parse()
        .map_err(|e| Error::LoggingError(format!("{}", e)))?;

    let filter = || {
        EnvFilter::builder()
            .with_default_directive(LevelFilter::from_level(level).into())
            .from_env_lossy()
    };

    std::fs::create_dir_all(&config.log_dir)?;
    let (file_writer, guard) =
        tracing_appender::non_blocking(rolling::never(&config.log_dir, LOG_FILE));

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(file_writer)
        .with_ansi(false)
        .with_target(true)
        .with_filter(filter());

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(filter());

    tracing_subscriber::registry()
        .with(file_layer)
        .with(stderr_layer)
        .try_init()
        .map_err(|e| Error::LoggingError(e.to_string()))?;

    Ok(guard)
}
