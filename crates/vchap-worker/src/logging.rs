//! Tracing setup and structured per-file logging.

use std::path::Path;

use tracing::{error, info, warn, Span};
use tracing_subscriber::{fmt, prelude::*, util::TryInitError, EnvFilter};
use vchap_models::{LogFormat, LoggingConfig};

const FALLBACK_FILTER: &str = "warn,vchap=info";

/// Filter for the vchap crates at `level`; `RUST_LOG` takes precedence.
pub fn build_env_filter(level: &str) -> EnvFilter {
    if std::env::var_os(EnvFilter::DEFAULT_ENV).is_some() {
        if let Ok(filter) = EnvFilter::try_from_default_env() {
            return filter;
        }
    }

    EnvFilter::try_new(format!("warn,vchap={}", level.trim().to_ascii_lowercase()))
        .unwrap_or_else(|_| EnvFilter::new(FALLBACK_FILTER))
}

/// Whether JSON output was requested by config or `LOG_FORMAT=json`.
pub fn use_json(config: &LoggingConfig) -> bool {
    config.format == LogFormat::Json
        || std::env::var("LOG_FORMAT")
            .map(|v| v.eq_ignore_ascii_case("json"))
            .unwrap_or(false)
}

/// Install the global subscriber: colored text by default, JSON lines for
/// log shippers.
pub fn init_tracing(config: &LoggingConfig) -> Result<(), TryInitError> {
    let env_filter = build_env_filter(&config.level);

    let result = if use_json(config) {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .try_init()
    };

    if result.is_ok() && config.format == LogFormat::Unrecognized {
        tracing::warn!("Unrecognized logging.format, expected \"text\" or \"json\"; using text");
    }
    result
}

/// Logger for one video in a batch.
///
/// Every event carries the file name and its position in the batch.
#[derive(Debug, Clone)]
pub struct FileLogger {
    file: String,
    position: usize,
    total: usize,
    show_progress: bool,
}

impl FileLogger {
    /// Create a logger for the `position`-th (1-based) of `total` files.
    pub fn new(path: &Path, position: usize, total: usize) -> Self {
        let file = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        Self {
            file,
            position,
            total,
            show_progress: true,
        }
    }

    /// Suppress the "Processing i/N" line.
    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    pub fn log_start(&self) {
        if self.show_progress {
            info!(
                file = %self.file,
                position = self.position,
                total = self.total,
                "Processing {}/{}: {}", self.position, self.total, self.file
            );
        }
    }

    pub fn log_progress(&self, message: &str) {
        info!(file = %self.file, "{}", message);
    }

    pub fn log_warning(&self, message: &str) {
        warn!(file = %self.file, "{}", message);
    }

    pub fn log_error(&self, message: &str) {
        error!(
            file = %self.file,
            position = self.position,
            total = self.total,
            "Failed: {}", message
        );
    }

    pub fn log_completion(&self, message: &str) {
        info!(file = %self.file, "Done: {}", message);
    }

    pub fn file(&self) -> &str {
        &self.file
    }

    pub fn position(&self) -> usize {
        self.position
    }

    /// Span covering all work on this file.
    pub fn create_span(&self) -> Span {
        tracing::info_span!("video", file = %self.file, position = self.position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_logger_creation() {
        let logger = FileLogger::new(Path::new("/videos/talk.mp4"), 2, 5);
        assert_eq!(logger.file(), "talk.mp4");
        assert_eq!(logger.position(), 2);
        assert!(logger.show_progress);
        assert!(!logger.with_progress(false).show_progress);
    }

    #[test]
    fn test_file_logger_methods() {
        // Must not panic without a subscriber
        let logger = FileLogger::new(Path::new("talk.mp4"), 1, 1);
        logger.log_start();
        logger.log_progress("3 chapters");
        logger.log_warning("no silences");
        logger.log_error("ffmpeg failed");
        logger.log_completion("wrote talk.chapter");
        let _span = logger.create_span();
    }

    #[test]
    fn test_use_json_from_config() {
        let config = LoggingConfig {
            format: LogFormat::Json,
            ..Default::default()
        };
        assert!(use_json(&config));
    }

    #[test]
    fn test_unrecognized_format_is_text() {
        if std::env::var_os("LOG_FORMAT").is_some() {
            return;
        }
        let config = LoggingConfig {
            format: LogFormat::Unrecognized,
            ..Default::default()
        };
        assert!(!use_json(&config));
    }

    #[test]
    fn test_filter_for_level() {
        if std::env::var_os(EnvFilter::DEFAULT_ENV).is_some() {
            return;
        }
        assert!(build_env_filter("DEBUG").to_string().contains("vchap=debug"));
        assert!(build_env_filter("loud").to_string().contains("vchap=info"));
    }
}
