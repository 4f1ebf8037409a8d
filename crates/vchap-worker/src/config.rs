//! Configuration loading.
//!
//! Sources, lowest precedence first: the JSON file, `VCHAP_*` environment
//! variables, command-line flags.

use std::path::{Path, PathBuf};

use clap::Parser;
use vchap_models::ChapterConfig;

use crate::error::{WorkerError, WorkerResult};

/// Config file used when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "config.json";

/// Command-line interface of the chapter worker.
#[derive(Debug, Clone, Default, Parser)]
#[command(name = "vchap-worker", version, about = "Generate chapter files from silences in videos")]
pub struct Cli {
    /// JSON configuration file
    #[arg(short, long, env = "VCHAP_CONFIG")]
    pub config: Option<PathBuf>,

    /// Directory containing the videos
    #[arg(short, long)]
    pub input: Option<String>,

    /// File pattern, e.g. "*.{mp4,mkv}"
    #[arg(short, long)]
    pub pattern: Option<String>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Only process the first matching file
    #[arg(long)]
    pub single: bool,
}

impl Cli {
    /// Apply flags on top of `config`.
    pub fn apply(&self, config: &mut ChapterConfig) {
        if let Some(input) = &self.input {
            config.input.path = input.clone();
        }
        if let Some(pattern) = &self.pattern {
            config.input.pattern = pattern.clone();
        }
        if let Some(level) = &self.log_level {
            config.logging.level = level.clone();
        }
        if self.single {
            config.input.batch_mode = false;
        }
    }
}

/// Where the base configuration came from.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigSource {
    File(PathBuf),
    /// Default file absent, built-in defaults used
    Defaults(PathBuf),
}

/// A validated configuration and its origin.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: ChapterConfig,
    pub source: ConfigSource,
}

/// Read a configuration file.
///
/// A missing file is only an error when it was asked for explicitly.
pub fn read_config_file(explicit: Option<&Path>) -> WorkerResult<(ChapterConfig, ConfigSource)> {
    let path = explicit.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_FILE));

    if !path.is_file() {
        if explicit.is_some() {
            return Err(WorkerError::ConfigNotFound(path.to_path_buf()));
        }
        return Ok((ChapterConfig::default(), ConfigSource::Defaults(path.to_path_buf())));
    }

    let text = std::fs::read_to_string(path)?;
    let config: ChapterConfig = serde_json::from_str(&text)?;
    Ok((config, ConfigSource::File(path.to_path_buf())))
}

/// Apply `VCHAP_*` overrides from the process environment.
pub fn apply_env_overrides(config: &mut ChapterConfig) {
    apply_overrides_from(config, |key| std::env::var(key).ok());
}

/// Apply `VCHAP_*` overrides from `lookup`. Unparsable values are ignored.
pub fn apply_overrides_from<F>(config: &mut ChapterConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(path) = lookup("VCHAP_INPUT_PATH") {
        config.input.path = path;
    }
    if let Some(pattern) = lookup("VCHAP_INPUT_PATTERN") {
        config.input.pattern = pattern;
    }
    if let Some(v) = lookup("VCHAP_MIN_SILENCE").and_then(|s| s.trim().parse().ok()) {
        config.detection.min_silence = v;
    }
    if let Some(v) = lookup("VCHAP_NOISE_DB").and_then(|s| s.trim().parse().ok()) {
        config.detection.noise_threshold_db = v;
    }
    if let Some(v) = lookup("VCHAP_ADAPTIVE_ENABLED").and_then(|s| parse_flag(&s)) {
        config.adaptive.enabled = v;
    }
    if let Some(v) = lookup("VCHAP_MAX_CONCURRENT").and_then(|s| s.trim().parse().ok()) {
        config.processing.max_concurrent_files = v;
    }
    if let Some(level) = lookup("VCHAP_LOG_LEVEL") {
        config.logging.level = level;
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Load, merge and validate the configuration for a run.
pub fn load_config(cli: &Cli) -> WorkerResult<LoadedConfig> {
    let (mut config, source) = read_config_file(cli.config.as_deref())?;
    apply_env_overrides(&mut config);
    cli.apply(&mut config);
    config.validate()?;
    Ok(LoadedConfig { config, source })
}
