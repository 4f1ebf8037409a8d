//! Shared data models for VChap.
//!
//! This crate provides Serde-serializable types for:
//! - Detected silence intervals
//! - Chapter marks and their chapter-file rendering
//! - The typed configuration document with every default
//! - Timecode formatting

pub mod chapter;
pub mod config;
pub mod silence;
pub mod timecode;

// Re-export common types
pub use chapter::ChapterMark;
pub use config::{
    AdaptiveConfig, ChapterConfig, ChaptersConfig, ConfigError, DetectionConfig, InputConfig,
    LogFormat, LoggingConfig, OutputConfig, ProcessingConfig,
};
pub use silence::SilenceSegment;
pub use timecode::format_timecode;
