//! Logging setup for the `railwatch` binary
//!
//! Human-readable events go to stderr so stdout carries only command output;
//! the same events are appended as JSON lines to `railwatch.log.<date>`.

pub mod macros;

use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{DEFAULT_LOG_FILTER, log_dir_override};

const LOG_FILE_PREFIX: &str = "railwatch.log";

/// Install the global subscriber and return the directory logs are written to.
///
/// `RUST_LOG` overrides the level; `RAILWATCH_LOG_DIR` overrides the directory.
/// A subscriber already installed by the host (or a test) is left in place.
pub fn init_logging() -> Result<PathBuf> {
    let log_dir = log_directory(log_dir_override())?;
    std::fs::create_dir_all(&log_dir)
        .with_context(|| format!("Failed to create log directory {}", log_dir.display()))?;

    let file_layer = fmt::layer()
        .with_writer(RollingFileAppender::new(
            Rotation::DAILY,
            &log_dir,
            LOG_FILE_PREFIX,
        ))
        .with_ansi(false)
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .json();

    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact();

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(DEFAULT_LOG_FILTER))
        .context("Invalid log filter")?;

    if tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .is_ok()
    {
        tracing::info!("[LOGGING] Writing logs to {}", log_dir.display());
    }

    Ok(log_dir)
}

/// Explicit directory if given, otherwise `<local data dir>/railwatch/logs`.
fn log_directory(override_dir: Option<String>) -> Result<PathBuf> {
    if let Some(dir) = override_dir {
        return Ok(PathBuf::from(dir));
    }
    let base = dirs::data_local_dir().context("Could not find local data directory")?;
    Ok(base.join("railwatch").join("logs"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_log_directory_wins() {
        let dir = log_directory(Some("/var/log/railwatch".to_string()))
            .expect("override should resolve");
        assert_eq!(dir, PathBuf::from("/var/log/railwatch"));
    }

    #[test]
    fn default_log_directory_is_namespaced() {
        if let Ok(dir) = log_directory(None) {
            assert!(dir.ends_with("railwatch/logs"));
        }
    }
}
