//! Chapter extraction configuration document.
//!
//! Every recognized option and its default lives here. The document is read
//! once at startup (see `vchap-worker::config`) and passed around read-only.
//! Missing sections and keys fall back to their defaults, unknown keys are
//! ignored.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Largest accepted `chapters.start_index`; leaves room for every mark index.
pub const MAX_START_INDEX: u32 = u32::MAX / 2;

/// Invalid configuration value.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {message}")]
    InvalidValue { key: &'static str, message: String },

    #[error("Unsupported output encoding '{0}', only UTF-8 is supported")]
    UnsupportedEncoding(String),
}

impl ConfigError {
    fn invalid(key: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            key,
            message: message.into(),
        }
    }
}

/// Root configuration document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChapterConfig {
    pub input: InputConfig,
    pub detection: DetectionConfig,
    pub adaptive: AdaptiveConfig,
    pub chapters: ChaptersConfig,
    pub output: OutputConfig,
    pub logging: LoggingConfig,
    pub processing: ProcessingConfig,
}

/// Where to find input videos.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    /// Directory searched for videos
    pub path: String,
    /// Glob pattern relative to `path`, with `{a,b}` alternation
    pub pattern: String,
    /// Process every match (true) or only the first one (false)
    pub batch_mode: bool,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            path: ".".to_string(),
            pattern: "*.mp4".to_string(),
            batch_mode: true,
        }
    }
}

/// Silence detection and chapter timing parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Noise level in dB below which audio counts as silence (FFmpeg `noise=`)
    pub noise_threshold_db: f64,
    /// Minimum silence length in seconds (FFmpeg `d=`, threshold floor)
    pub min_silence: f64,
    /// Fraction of a silence pulled back from its end to place the cut
    pub safety_ratio: f64,
    /// No chapters in the first `skip_head` seconds
    pub skip_head: f64,
    /// No chapters in the last `skip_tail` seconds
    pub skip_tail: f64,
    /// Minimum spacing between chapter marks in seconds
    pub min_gap: f64,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            noise_threshold_db: -30.0,
            min_silence: 1.0,
            safety_ratio: 0.10,
            skip_head: 2.0,
            skip_tail: 2.0,
            min_gap: 5.0,
        }
    }
}

/// Adaptive threshold settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdaptiveConfig {
    pub enabled: bool,
    /// Multiplier on the reference silence duration, clamped to [0, 1] at use
    pub adaptive_ratio: f64,
}

impl Default for AdaptiveConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            adaptive_ratio: 0.7,
        }
    }
}

/// Chapter naming.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChaptersConfig {
    pub prefix: String,
    pub start_index: u32,
}

impl Default for ChaptersConfig {
    fn default() -> Self {
        Self {
            prefix: "Chapter".to_string(),
            start_index: 1,
        }
    }
}

/// Chapter file output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Replaces the video's extension, e.g. `movie.mp4` -> `movie.chapter`
    pub suffix: String,
    pub encoding: String,
    /// Rewrite chapter files that already exist
    pub overwrite: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            suffix: ".chapter".to_string(),
            encoding: "utf-8".to_string(),
            overwrite: true,
        }
    }
}

/// Log output style.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
    /// Any other value, such as a printf-style format string from an older
    /// config file. Logged as text.
    #[serde(other)]
    Unrecognized,
}

/// Logging settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Level directive for the vchap crates (`error`..`trace`)
    pub level: String,
    pub format: LogFormat,
    /// Log "Processing i/N" lines during batch runs
    pub show_progress: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Text,
            show_progress: true,
        }
    }
}

/// Batch processing limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingConfig {
    /// Files analysed in parallel
    pub max_concurrent_files: usize,
    /// Kill an FFmpeg run after this many seconds (0 = no limit)
    pub ffmpeg_timeout_secs: u64,
    /// Explicit FFmpeg binary, otherwise searched on `PATH`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ffmpeg_path: Option<String>,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            max_concurrent_files: 2,
            ffmpeg_timeout_secs: 0,
            ffmpeg_path: None,
        }
    }
}

impl ProcessingConfig {
    /// Timeout as an option, `None` when disabled.
    pub fn ffmpeg_timeout(&self) -> Option<u64> {
        (self.ffmpeg_timeout_secs > 0).then_some(self.ffmpeg_timeout_secs)
    }
}

impl ChapterConfig {
    /// Check values that would make a run meaningless.
    ///
    /// Synthesizer timing parameters are not range checked beyond
    /// `min_silence`; a zero or negative `min_gap` accepts every candidate.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.input.pattern.trim().is_empty() {
            return Err(ConfigError::invalid("input.pattern", "must not be empty"));
        }
        if self.detection.min_silence.is_nan() || self.detection.min_silence < 0.0 {
            return Err(ConfigError::invalid(
                "detection.min_silence",
                format!("must be a non-negative number, got {}", self.detection.min_silence),
            ));
        }
        if self.chapters.start_index == 0 {
            return Err(ConfigError::invalid("chapters.start_index", "must be at least 1"));
        }
        if self.chapters.start_index > MAX_START_INDEX {
            return Err(ConfigError::invalid(
                "chapters.start_index",
                format!("must be at most {}", MAX_START_INDEX),
            ));
        }
        if self.output.suffix.is_empty() {
            return Err(ConfigError::invalid("output.suffix", "must not be empty"));
        }
        if !is_utf8_label(&self.output.encoding) {
            return Err(ConfigError::UnsupportedEncoding(self.output.encoding.clone()));
        }
        if self.processing.max_concurrent_files == 0 {
            return Err(ConfigError::invalid(
                "processing.max_concurrent_files",
                "must be at least 1",
            ));
        }
        Ok(())
    }
}

fn is_utf8_label(encoding: &str) -> bool {
    matches!(encoding.to_ascii_lowercase().as_str(), "utf-8" | "utf8")
}
