//! Silence interval model.

use serde::{Deserialize, Serialize};

/// A detected interval of near-silence in the audio track.
///
/// Times are in seconds from the start of the media. `duration` is kept as
/// reported by the detector rather than recomputed from `end - start`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SilenceSegment {
    /// Start of the silence in seconds
    pub start: f64,
    /// End of the silence in seconds
    pub end: f64,
    /// Measured silence duration in seconds
    pub duration: f64,
}

impl SilenceSegment {
    /// Create a segment from explicit start, end and duration.
    pub fn new(start: f64, end: f64, duration: f64) -> Self {
        Self {
            start,
            end,
            duration,
        }
    }

    /// Create a segment from a detector report of end time and duration.
    ///
    /// FFmpeg reports silences as `silence_end` plus `silence_duration`, so the
    /// start is derived.
    pub fn from_end(end: f64, duration: f64) -> Self {
        Self {
            start: end - duration,
            end,
            duration,
        }
    }
}
