//! Tracing setup for the kettle binaries.

use kettle_shared::errors::{KettleError, KettleResult};
use std::path::Path;
use std::sync::OnceLock;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

/// File name prefix of the daily-rolled log.
pub const LOG_FILE_NAME: &str = "kettle.log";

/// Keeps the non-blocking file writer alive for the process lifetime.
static FILE_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

/// Install the global subscriber.
///
/// Events go to stderr so stdout stays free for progress lines and
/// program output. `RUST_LOG` overrides the level (`debug` with `debug`,
/// `info` otherwise). With `log_dir`, events are also written to a
/// daily-rolled `kettle.log` there.
pub fn init_logging(debug: bool, log_dir: Option<&Path>) -> KettleResult<()> {
    let default_level = if debug { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true);

    let file_layer = match log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir).map_err(|e| {
                KettleError::Internal(format!(
                    "Failed to create log directory {}: {}",
                    dir.display(),
                    e
                ))
            })?;
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_NAME);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            if FILE_GUARD.set(guard).is_err() {
                return Err(KettleError::InvalidState(
                    "logging already initialized".to_string(),
                ));
            }
            Some(fmt::layer().with_writer(writer).with_ansi(false))
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| KettleError::Internal(format!("Failed to initialize logging: {}", e)))
}
