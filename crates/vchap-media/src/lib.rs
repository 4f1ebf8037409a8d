//! FFmpeg-backed chapter detection.
//!
//! This crate provides:
//! - Type-safe FFmpeg command building and a supervised runner
//! - FFprobe duration lookup
//! - Silence event parsing, adaptive thresholds and chapter synthesis
//! - Chapter file rendering and atomic output
//! - H.264 re-encoding

pub mod chapter_file;
pub mod command;
pub mod error;
pub mod fs_utils;
pub mod probe;
pub mod progress;
pub mod reencode;
pub mod silence_detect;

pub use chapter_file::{chapter_file_path, render_chapter_file, write_chapter_file};
pub use command::{check_ffmpeg, check_ffprobe, FfmpegCommand, FfmpegRunner};
pub use error::{MediaError, MediaResult};
pub use probe::{probe_duration, probe_media, MediaInfo};
pub use progress::FfmpegProgress;
pub use reencode::{is_reencode_input, reencode_output_path, reencode_video};
pub use silence_detect::{
    detect_silences, estimate_threshold, parse_silence_events, plan_chapters, synthesize_chapters,
    ChapterPlan, SilenceEventParser, SynthesisParams, ThresholdEstimate, ThresholdParams,
};
