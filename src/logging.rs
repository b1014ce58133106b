//! Tracing subscriber setup

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LoggingConfig;

/// File name prefix for rolling log files
pub const LOG_FILE_PREFIX: &str = "stateplay.log";

/// Build the filter: `RUST_LOG` wins over the configured directive
pub fn env_filter(config: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.filter))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install the global subscriber
///
/// Logs always go to stderr. With a `log_dir`, they also go to a
/// daily-rolling file; keep the returned guard alive until exit so the
/// file writer is flushed.
pub fn init_logging(config: &LoggingConfig) -> Option<WorkerGuard> {
    let stderr_layer = fmt::layer().with_writer(std::io::stderr);

    match &config.log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);

            let result = tracing_subscriber::registry()
                .with(env_filter(config))
                .with(stderr_layer)
                .with(fmt::layer().with_ansi(false).with_writer(writer))
                .try_init();

            if let Err(e) = result {
                eprintln!("Logging already initialized: {}", e);
                return None;
            }
            Some(guard)
        }
        None => {
            if let Err(e) = tracing_subscriber::registry()
                .with(env_filter(config))
                .with(stderr_layer)
                .try_init()
            {
                eprintln!("Logging already initialized: {}", e);
            }
            None
        }
    }
}
