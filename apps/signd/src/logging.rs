// SPDX-FileCopyrightText: © 2025 SignKit Contributors
//
// SPDX-License-Identifier: MPL-2.0

use tracing_subscriber::{
    layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer, Registry,
};

use crate::config::LogConfig;

type DynLayer = Box<dyn Layer<Registry> + Send + Sync + 'static>;

/// `RUST_LOG` wins; the configured level is the fallback.
fn env_filter_or_level(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}

/// Initialize logging based on configuration.
///
/// Sets up a console subscriber and, when `LOG_FILE` is configured, an
/// additional non-blocking file writer. The returned guard must be kept
/// alive for the file writer to flush.
///
/// # Errors
///
/// Returns an error if the log file's directory cannot be created.
pub fn init_logging(
    config: &LogConfig,
) -> Result<Option<tracing_appender::non_blocking::WorkerGuard>, Box<dyn std::error::Error>> {
    let mut layers: Vec<DynLayer> = Vec::new();
    let mut guard = None;

    if let Some(file_path) = &config.file_path {
        let log_path = std::path::Path::new(file_path);
        let log_dir = log_path.parent().unwrap_or_else(|| std::path::Path::new("."));
        let log_filename =
            log_path.file_name().unwrap_or_else(|| std::ffi::OsStr::new("signd.log"));

        if let Err(e) = std::fs::create_dir_all(log_dir) {
            return Err(
                format!("Failed to create log directory {}: {e}", log_dir.display()).into()
            );
        }

        let file_appender = tracing_appender::rolling::never(log_dir, log_filename);
        let (non_blocking, file_guard) = tracing_appender::non_blocking(file_appender);
        guard = Some(file_guard);
        layers.push(
            tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_filter(env_filter_or_level(&config.level))
                .boxed(),
        );
    }

    layers.push(
        tracing_subscriber::fmt::layer().with_filter(env_filter_or_level(&config.level)).boxed(),
    );

    tracing_subscriber::registry().with(layers).init();

    Ok(guard)
}
