//! Run FFmpeg's `silencedetect` filter over a media file.

use std::path::Path;

use tracing::{debug, info};
use vchap_models::{DetectionConfig, SilenceSegment};

use super::parser::SilenceEventParser;
use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};

/// Build the `silencedetect` filter expression.
pub fn silencedetect_filter(noise_threshold_db: f64, min_silence: f64) -> String {
    format!("silencedetect=noise={}dB:d={}", noise_threshold_db, min_silence)
}

/// Build the analysis command for `path`.
pub fn silence_detect_command(path: impl AsRef<Path>, config: &DetectionConfig) -> FfmpegCommand {
    FfmpegCommand::analysis(path).audio_filter(silencedetect_filter(
        config.noise_threshold_db,
        config.min_silence,
    ))
}

/// Detect silences in `path`.
///
/// FFmpeg's stderr is parsed line by line while the process runs.
pub async fn detect_silences(
    path: impl AsRef<Path>,
    config: &DetectionConfig,
    runner: &FfmpegRunner,
) -> MediaResult<Vec<SilenceSegment>> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(MediaError::FileNotFound(path.to_path_buf()));
    }

    let cmd = silence_detect_command(path, config);
    let mut parser = SilenceEventParser::new();

    runner
        .run_with_lines(&cmd, |line| {
            if let Some(segment) = parser.push_line(line) {
                debug!(end = segment.end, duration = segment.duration, "Silence detected");
            }
        })
        .await?;

    info!(
        path = %path.display(),
        segments = parser.segments().len(),
        rejected = parser.rejected_lines(),
        "Silence detection complete"
    );

    Ok(parser.finish())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_expression() {
        assert_eq!(silencedetect_filter(-30.0, 1.0), "silencedetect=noise=-30dB:d=1");
        assert_eq!(silencedetect_filter(-42.5, 0.75), "silencedetect=noise=-42.5dB:d=0.75");
    }

    #[test]
    fn test_detect_command() {
        let args = silence_detect_command("lecture.mkv", &DetectionConfig::default()).build_args();
        let joined = args.join(" ");
        assert!(joined.contains("-i lecture.mkv -af silencedetect=noise=-30dB:d=1 -f null -"));
    }

    #[tokio::test]
    async fn test_detect_missing_file() {
        let result = detect_silences(
            "/nonexistent/lecture.mkv",
            &DetectionConfig::default(),
            &FfmpegRunner::new(),
        )
        .await;
        assert!(matches!(result, Err(MediaError::FileNotFound(_))));
    }
}
