//! Per-video processing.

use std::path::{Path, PathBuf};

use tracing::info;
use vchap_media::{
    chapter_file_path, detect_silences, plan_chapters, probe_media, write_chapter_file,
    FfmpegRunner, MediaError,
};
use vchap_models::ChapterConfig;

use crate::error::{WorkerError, WorkerResult};
use crate::logging::FileLogger;

/// Result of processing one video.
#[derive(Debug)]
pub enum FileOutcome {
    /// Chapter file written
    Written { output: PathBuf, chapters: usize },
    /// Chapter file already present and overwriting is off
    Skipped { output: PathBuf },
    Failed(WorkerError),
}

impl FileOutcome {
    /// Skipped files count as successes.
    pub fn is_success(&self) -> bool {
        !matches!(self, FileOutcome::Failed(_))
    }
}

/// Generate the chapter file for `video`.
///
/// Never returns [`FileOutcome::Failed`]; errors are returned instead.
pub async fn process_video(
    video: &Path,
    config: &ChapterConfig,
    runner: &FfmpegRunner,
    logger: &FileLogger,
) -> WorkerResult<FileOutcome> {
    logger.log_start();

    if !video.is_file() {
        return Err(MediaError::FileNotFound(video.to_path_buf()).into());
    }

    let output = chapter_file_path(video, &config.output.suffix);
    if !config.output.overwrite && output.exists() {
        logger.log_progress(&format!("Chapter file exists, skipping: {}", output.display()));
        return Ok(FileOutcome::Skipped { output });
    }

    let ffprobe = runner.ffprobe_path()?;
    let info = probe_media(&ffprobe, video).await?;
    logger.log_progress(&format!("Duration {:.3}s", info.duration));

    let segments = if info.has_audio {
        detect_silences(video, &config.detection, runner).await?
    } else {
        logger.log_warning("No audio stream");
        Vec::new()
    };
    if segments.is_empty() {
        logger.log_warning("No silences detected, writing a single chapter");
    }

    let plan = plan_chapters(&segments, info.duration, config);

    match write_chapter_file(&output, &plan.chapters, config.output.overwrite).await {
        Ok(()) => {}
        Err(MediaError::OutputExists(output)) => {
            logger.log_progress(&format!("Chapter file appeared, skipping: {}", output.display()));
            return Ok(FileOutcome::Skipped { output });
        }
        Err(e) => return Err(e.into()),
    }

    for chapter in &plan.chapters {
        info!(file = %logger.file(), "  {} - {}", chapter.timecode(), chapter.title);
    }
    logger.log_completion(&format!(
        "{} chapters written to {}",
        plan.chapters.len(),
        output.display()
    ));

    Ok(FileOutcome::Written {
        output,
        chapters: plan.chapters.len(),
    })
}
