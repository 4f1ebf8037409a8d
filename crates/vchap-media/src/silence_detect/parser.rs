//! Parser for FFmpeg `silencedetect` diagnostics.
//!
//! The filter reports every silence on two stderr lines:
//!
//! ```text
//! [silencedetect @ 0x5581] silence_start: 10
//! [silencedetect @ 0x5581] silence_end: 12 | silence_duration: 2
//! ```
//!
//! Only the end line matters, since it carries both the end time and the
//! measured duration. Everything else FFmpeg prints is skipped.

use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;
use tracing::warn;
use vchap_models::SilenceSegment;

static SILENCE_START: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"silence_start:\s*\S+").unwrap());

static SILENCE_END: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"silence_end:\s*([^\s|]+)\s*\|\s*silence_duration:\s*(\S+)").unwrap()
});

static DECIMAL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[0-9]+(?:\.[0-9]+)?$").unwrap());

/// A matched end line whose numbers could not be read.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SilenceParseError {
    #[error("invalid {field} value '{value}'")]
    InvalidNumber { field: &'static str, value: String },
}

/// Classification of one diagnostic line.
#[derive(Debug, Clone, PartialEq)]
pub enum SilenceLine {
    /// `silence_start` marker, carries nothing we use
    Start,
    /// `silence_end` marker with the completed segment
    End(SilenceSegment),
    /// Any other output
    Ignored,
}

/// Classify a single line of FFmpeg stderr.
pub fn classify_line(line: &str) -> Result<SilenceLine, SilenceParseError> {
    if SILENCE_START.is_match(line) {
        return Ok(SilenceLine::Start);
    }

    let Some(caps) = SILENCE_END.captures(line) else {
        return Ok(SilenceLine::Ignored);
    };

    let end = parse_decimal("silence_end", &caps[1])?;
    let duration = parse_decimal("silence_duration", &caps[2])?;

    Ok(SilenceLine::End(SilenceSegment::from_end(end, duration)))
}

fn parse_decimal(field: &'static str, value: &str) -> Result<f64, SilenceParseError> {
    let invalid = || SilenceParseError::InvalidNumber {
        field,
        value: value.to_string(),
    };

    if !DECIMAL.is_match(value) {
        return Err(invalid());
    }
    value.parse::<f64>().map_err(|_| invalid())
}

/// Incremental fold of diagnostic lines into silence segments.
///
/// Feed lines as they arrive with [`push_line`](Self::push_line); the parser
/// keeps nothing but the segments found so far and a count of rejected lines.
#[derive(Debug, Default)]
pub struct SilenceEventParser {
    segments: Vec<SilenceSegment>,
    rejected: usize,
}

impl SilenceEventParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consume one line. Returns the segment if the line completed one.
    ///
    /// Malformed end lines are logged and dropped.
    pub fn push_line(&mut self, line: &str) -> Option<SilenceSegment> {
        match classify_line(line) {
            Ok(SilenceLine::End(segment)) => {
                self.segments.push(segment);
                Some(segment)
            }
            Ok(SilenceLine::Start | SilenceLine::Ignored) => None,
            Err(e) => {
                self.rejected += 1;
                warn!(line = %line.trim(), error = %e, "Skipping malformed silence line");
                None
            }
        }
    }

    /// Segments parsed so far, in arrival order.
    pub fn segments(&self) -> &[SilenceSegment] {
        &self.segments
    }

    /// Number of matched lines dropped because of bad numbers.
    pub fn rejected_lines(&self) -> usize {
        self.rejected
    }

    pub fn finish(self) -> Vec<SilenceSegment> {
        self.segments
    }
}

/// Parse a complete sequence of diagnostic lines.
pub fn parse_silence_events<I, S>(lines: I) -> Vec<SilenceSegment>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut parser = SilenceEventParser::new();
    for line in lines {
        parser.push_line(line.as_ref());
    }
    parser.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_end_line_yields_segment() {
        let line = "[silencedetect @ 0x55d0c8a1b2c0] silence_end: 12.5 | silence_duration: 2.25";
        match classify_line(line).unwrap() {
            SilenceLine::End(segment) => {
                assert!((segment.start - 10.25).abs() < 1e-9);
                assert_eq!(segment.end, 12.5);
                assert_eq!(segment.duration, 2.25);
            }
            other => panic!("expected end line, got {:?}", other),
        }
    }

    #[test]
    fn test_integer_fields() {
        let line = "silence_end: 40 | silence_duration: 1";
        assert_eq!(
            classify_line(line).unwrap(),
            SilenceLine::End(SilenceSegment::new(39.0, 40.0, 1.0))
        );
    }

    #[test]
    fn test_start_line() {
        let line = "[silencedetect @ 0x55d0c8a1b2c0] silence_start: 10.25";
        assert_eq!(classify_line(line).unwrap(), SilenceLine::Start);

        // FFmpeg can report slightly negative starts at the head of a file
        let line = "[silencedetect @ 0x55d0c8a1b2c0] silence_start: -0.00133333";
        assert_eq!(classify_line(line).unwrap(), SilenceLine::Start);
    }

    #[test]
    fn test_unrelated_lines_ignored() {
        for line in [
            "",
            "Input #0, mov,mp4,m4a,3gp,3g2,mj2, from 'talk.mp4':",
            "  Duration: 00:01:00.00, start: 0.000000, bitrate: 1205 kb/s",
            "size=N/A time=00:00:59.98 bitrate=N/A speed= 512x",
            "silence_end: 12.0",
        ] {
            assert_eq!(classify_line(line).unwrap(), SilenceLine::Ignored, "line: {line:?}");
        }
    }

    #[test]
    fn test_malformed_numbers() {
        let err = classify_line("silence_end: 12.0 | silence_duration: abc").unwrap_err();
        assert_eq!(
            err,
            SilenceParseError::InvalidNumber {
                field: "silence_duration",
                value: "abc".to_string()
            }
        );

        let err = classify_line("silence_end: 1e3 | silence_duration: 2").unwrap_err();
        assert!(matches!(err, SilenceParseError::InvalidNumber { field: "silence_end", .. }));

        assert!(classify_line("silence_end: 12. | silence_duration: 2").is_err());
        assert!(classify_line("silence_end: inf | silence_duration: 2").is_err());
    }

    #[test]
    fn test_parser_skips_bad_lines_and_continues() {
        let mut parser = SilenceEventParser::new();
        parser.push_line("silence_start: 1");
        parser.push_line("silence_end: 3 | silence_duration: 2");
        parser.push_line("silence_end: x | silence_duration: 2");
        parser.push_line("silence_start: 9");
        parser.push_line("silence_end: 11.5 | silence_duration: 2.5");

        assert_eq!(parser.rejected_lines(), 1);
        assert_eq!(parser.segments().len(), 2);

        let segments = parser.finish();
        assert_eq!(segments[0], SilenceSegment::new(1.0, 3.0, 2.0));
        assert_eq!(segments[1], SilenceSegment::new(9.0, 11.5, 2.5));
    }

    #[test]
    fn test_parse_silence_events_keeps_arrival_order() {
        let lines = vec![
            "silence_end: 50 | silence_duration: 5".to_string(),
            "silence_end: 20 | silence_duration: 1".to_string(),
        ];
        let segments = parse_silence_events(&lines);
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].end, 50.0);
        assert_eq!(segments[1].end, 20.0);
    }

    #[test]
    fn test_parse_empty_stream() {
        let segments = parse_silence_events(Vec::<&str>::new());
        assert!(segments.is_empty());
    }
}
