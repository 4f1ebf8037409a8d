//! Timecode formatting for chapter files.
//!
//! Chapter files use `MM:SS.mmm`. Minutes are not wrapped into hours, so a
//! two hour video produces `120:00.000`.

const MS_PER_MINUTE: u64 = 60_000;
const MS_PER_SECOND: u64 = 1_000;

/// Format seconds as `MM:SS.mmm`, rounding to the nearest millisecond.
///
/// Negative and non-finite inputs render as `00:00.000`.
///
/// # Examples
/// ```
/// use vchap_models::timecode::format_timecode;
/// assert_eq!(format_timecode(65.5005), "01:05.501");
/// assert_eq!(format_timecode(-3.0), "00:00.000");
/// ```
pub fn format_timecode(seconds: f64) -> String {
    let seconds = if seconds.is_finite() {
        seconds.max(0.0)
    } else {
        0.0
    };

    let total_ms = (seconds * 1000.0 + 0.5) as u64;
    let minutes = total_ms / MS_PER_MINUTE;
    let secs = (total_ms % MS_PER_MINUTE) / MS_PER_SECOND;
    let millis = total_ms % MS_PER_SECOND;

    format!("{:02}:{:02}.{:03}", minutes, secs, millis)
}
