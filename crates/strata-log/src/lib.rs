//! Structured logging setup for the strata engine.
//!
//! Thin wrapper around the `tracing` ecosystem: console output with module
//! paths and an uptime timer, filterable via `RUST_LOG`, plus an optional
//! plain-text log file for long model builds that run unattended.

use std::path::Path;

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the global tracing subscriber.
///
/// Filtering honors `RUST_LOG` when set and falls back to `info`
/// otherwise. When `log_dir` is given, log lines are also appended to
/// `strata.log` in that directory (created if missing), without ANSI
/// colors.
///
/// # Examples
///
/// ```no_run
/// strata_log::init_logging(None);
/// ```
pub fn init_logging(log_dir: Option<&Path>) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| default_env_filter());

    let console_layer = fmt::layer()
        .with_target(true)
        .with_level(true)
        .with_timer(fmt::time::uptime());

    let subscriber = tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer);

    if let Some(log_dir) = log_dir
        && std::fs::create_dir_all(log_dir).is_ok()
        && let Ok(log_file) = std::fs::File::create(log_dir.join("strata.log"))
    {
        let file_layer = fmt::layer()
            .with_writer(log_file)
            .with_ansi(false)
            .with_target(true)
            .with_timer(fmt::time::uptime());

        subscriber.with(file_layer).init();
        return;
    }

    subscriber.init();
}

/// The filter used when `RUST_LOG` is unset: `info` everywhere.
pub fn default_env_filter() -> EnvFilter {
    EnvFilter::new("info")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter_is_info() {
        let filter = default_env_filter();
        assert!(format!("{}", filter).contains("info"));
    }

    #[test]
    fn test_per_crate_filters_parse() {
        let valid_filters = [
            "info",
            "debug,strata_store=trace",
            "warn,strata_store=debug,strata_model=trace",
            "error",
        ];
        for filter_str in &valid_filters {
            assert!(
                EnvFilter::try_from(*filter_str).is_ok(),
                "failed to parse filter: {}",
                filter_str
            );
        }
    }

    #[test]
    fn test_log_file_path_shape() {
        let temp_dir = tempfile::tempdir().unwrap();
        let log_file_path = temp_dir.path().join("strata.log");
        assert_eq!(log_file_path.file_name().unwrap(), "strata.log");
    }
}
