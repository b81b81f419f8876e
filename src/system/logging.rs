//! Logging system initialization
//!
//! This module provides functions to initialize the tracing/logging system
//! based on SDK configuration. Hosts that already install a global tracing
//! subscriber should skip this and let SDK spans flow into their own setup.

use tracing_subscriber::EnvFilter;

use crate::config::SdkConfig;

/// Initialize logging system based on configuration
///
/// Debug logging enables `debug`-level output for the SDK's own targets;
/// `RUST_LOG` overrides the default filter. When `log_file` is given,
/// output is appended there without ANSI colors.
///
/// **Note**: This should be called only once during application startup.
///
/// # Returns
/// * `WorkerGuard` - Must be kept alive for the duration of the program
///   to ensure non-blocking log writes are flushed
///
/// # Panics
/// * If setting the global subscriber fails (e.g., already initialized)
pub fn init_logging(
    config: &SdkConfig,
    log_file: Option<&str>,
) -> tracing_appender::non_blocking::WorkerGuard {
    let writer: Box<dyn std::io::Write + Send + Sync> = match log_file {
        Some(path) if !path.is_empty() => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .expect("Failed to open log file");
            Box::new(file)
        }
        _ => Box::new(std::io::stdout()),
    };

    let (non_blocking_writer, guard) = tracing_appender::non_blocking(writer);

    let default_filter = if config.enable_debug_logging {
        "linktracker=debug"
    } else {
        "linktracker=info"
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter));

    let subscriber_builder = tracing_subscriber::fmt()
        .with_writer(non_blocking_writer)
        .with_env_filter(filter)
        .with_level(true)
        .with_ansi(log_file.is_none());

    if std::env::var("LINKTRACKER_LOG_FORMAT").as_deref() == Ok("json") {
        subscriber_builder.json().init();
    } else {
        subscriber_builder.init();
    }

    guard
}
