//! Chapter mark model.

use serde::{Deserialize, Serialize};

use crate::timecode::format_timecode;

/// A single chapter boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChapterMark {
    /// Chapter start in seconds
    pub time: f64,
    /// Display title
    pub title: String,
    /// Sequential chapter number
    pub index: u32,
}

impl ChapterMark {
    /// Create a chapter mark with an explicit title.
    pub fn new(time: f64, title: impl Into<String>, index: u32) -> Self {
        Self {
            time,
            title: title.into(),
            index,
        }
    }

    /// Create a chapter mark titled `"{prefix} {index}"`.
    pub fn numbered(time: f64, prefix: &str, index: u32) -> Self {
        Self::new(time, numbered_title(prefix, index), index)
    }

    /// Start time as `MM:SS.mmm`.
    pub fn timecode(&self) -> String {
        format_timecode(self.time)
    }

    /// Chapter-file line: timecode, one space, title.
    pub fn to_line(&self) -> String {
        format!("{} {}", self.timecode(), self.title)
    }
}

/// Build the default chapter title.
pub fn numbered_title(prefix: &str, index: u32) -> String {
    format!("{} {}", prefix, index)
}
