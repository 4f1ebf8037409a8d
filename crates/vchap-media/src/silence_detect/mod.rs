//! Silence-based chapter detection.
//!
//! Long pauses in speech are good chapter boundaries. FFmpeg finds the
//! pauses; this module decides which of them are long enough to matter for
//! the particular recording and where exactly to cut.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐    ┌──────────────┐    ┌──────────────┐
//! │ FFmpeg       │───►│ Event parser │───►│ Threshold    │
//! │ silencedetect│    │ (segments)   │    │ estimator    │
//! └──────────────┘    └──────────────┘    └──────────────┘
//!                                                │
//!                                                ▼
//!                     ┌──────────────┐    ┌──────────────┐
//!                     │ Chapter file │◄───│ Synthesizer  │
//!                     │ MM:SS.mmm    │    │ (marks)      │
//!                     └──────────────┘    └──────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use vchap_media::silence_detect::{detect_silences, plan_chapters};
//!
//! let segments = detect_silences(&video, &config.detection, &runner).await?;
//! let plan = plan_chapters(&segments, duration, &config);
//! ```
//!
//! Everything except [`detect_silences`] is pure and does no I/O.

mod detect;
mod parser;
mod planner;
mod synthesizer;
mod threshold;

pub use detect::{detect_silences, silence_detect_command, silencedetect_filter};
pub use parser::{classify_line, parse_silence_events, SilenceEventParser, SilenceLine, SilenceParseError};
pub use planner::{plan_chapters, ChapterPlan};
pub use synthesizer::{synthesize_chapters, SynthesisParams};
pub use threshold::{estimate_threshold, ReferenceMethod, ThresholdEstimate, ThresholdParams};
