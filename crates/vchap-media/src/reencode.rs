//! H.264 re-encoding of video files.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};

/// Container extensions accepted as re-encode input (lowercase).
pub const REENCODE_EXTENSIONS: &[&str] = &["mp4", "avi", "mov", "mkv", "flv"];

const VIDEO_CODEC: &str = "libx264";
const PRESET: &str = "slow";

/// Whether `path` has one of [`REENCODE_EXTENSIONS`], ignoring case.
pub fn is_reencode_input(path: impl AsRef<Path>) -> bool {
    path.as_ref()
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| REENCODE_EXTENSIONS.iter().any(|x| x.eq_ignore_ascii_case(e)))
        .unwrap_or(false)
}

/// `<output_dir>/<stem>.mp4`.
pub fn reencode_output_path(input: impl AsRef<Path>, output_dir: impl AsRef<Path>) -> PathBuf {
    let mut name = input.as_ref().file_stem().unwrap_or_default().to_os_string();
    name.push(".mp4");
    output_dir.as_ref().join(name)
}

/// Build the re-encode command: H.264 video, audio stream copied.
///
/// Without `overwrite` FFmpeg fails when the output already exists.
pub fn reencode_command(input: impl AsRef<Path>, output: impl AsRef<Path>, overwrite: bool) -> FfmpegCommand {
    let cmd = FfmpegCommand::new(input, output)
        .video_codec(VIDEO_CODEC)
        .preset(PRESET)
        .audio_codec("copy");

    if overwrite {
        cmd
    } else {
        cmd.no_overwrite()
    }
}

/// Re-encode `input` to `output`.
pub async fn reencode_video(
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
    overwrite: bool,
    runner: &FfmpegRunner,
) -> MediaResult<()> {
    let input = input.as_ref();
    let output = output.as_ref();

    if !input.exists() {
        return Err(MediaError::FileNotFound(input.to_path_buf()));
    }

    let cmd = reencode_command(input, output, overwrite);
    runner
        .run_with_progress(&cmd, |p| {
            debug!(
                input = %input.display(),
                frame = p.frame,
                out_time_ms = p.out_time_ms,
                speed = p.speed,
                done = p.is_complete,
                "Re-encode progress"
            );
        })
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reencode_input_extensions() {
        assert!(is_reencode_input("a/b/clip.mp4"));
        assert!(is_reencode_input("clip.MKV"));
        assert!(is_reencode_input("clip.Flv"));
        assert!(!is_reencode_input("clip.webm"));
        assert!(!is_reencode_input("clip"));
        assert!(!is_reencode_input("clip.chapter"));
    }

    #[test]
    fn test_output_path() {
        assert_eq!(
            reencode_output_path("/in/sub/lecture.avi", "/out"),
            PathBuf::from("/out/lecture.mp4")
        );
        assert_eq!(
            reencode_output_path("/in/talk.v2.mov", "/out"),
            PathBuf::from("/out/talk.v2.mp4")
        );
    }

    #[test]
    fn test_reencode_command() {
        let args = reencode_command("in.avi", "/out/in.mp4", false).build_args();
        let joined = args.join(" ");
        assert!(joined.contains("-i in.avi -c:v libx264 -preset slow -c:a copy /out/in.mp4"));
        assert!(args.contains(&"-n".to_string()));

        let args = reencode_command("in.avi", "/out/in.mp4", true).build_args();
        assert!(args.contains(&"-y".to_string()));
    }

    #[tokio::test]
    async fn test_reencode_missing_input() {
        let result = reencode_video("/nonexistent/in.avi", "/tmp/out.mp4", false, &FfmpegRunner::new()).await;
        assert!(matches!(result, Err(MediaError::FileNotFound(_))));
    }
}
