//! Batch executor.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::{watch, Semaphore};
use tracing::{error, info, warn, Instrument};
use vchap_media::{FfmpegRunner, MediaError};
use vchap_models::ChapterConfig;

use crate::error::{WorkerError, WorkerResult};
use crate::logging::FileLogger;
use crate::processor::{process_video, FileOutcome};

/// Totals of a batch run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
}

impl BatchSummary {
    fn record(&mut self, outcome: &FileOutcome) {
        if outcome.is_success() {
            self.succeeded += 1;
        } else {
            self.failed += 1;
        }
    }

    /// A run counts as failed when nothing succeeded.
    pub fn is_failure(&self) -> bool {
        self.succeeded == 0
    }
}

/// Cancels a running batch from another task.
#[derive(Debug, Clone)]
pub struct ShutdownHandle(Arc<watch::Sender<bool>>);

impl ShutdownHandle {
    pub fn shutdown(&self) {
        self.0.send_replace(true);
    }
}

/// Runs chapter extraction over many files with bounded concurrency.
pub struct BatchExecutor {
    config: Arc<ChapterConfig>,
    file_semaphore: Arc<Semaphore>,
    shutdown: Arc<watch::Sender<bool>>,
}

impl BatchExecutor {
    pub fn new(config: ChapterConfig) -> Self {
        let file_semaphore = Arc::new(Semaphore::new(config.processing.max_concurrent_files.max(1)));
        let (shutdown, _) = watch::channel(false);

        Self {
            config: Arc::new(config),
            file_semaphore,
            shutdown: Arc::new(shutdown),
        }
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle(Arc::clone(&self.shutdown))
    }

    /// FFmpeg runner configured for this batch.
    pub fn runner(&self) -> FfmpegRunner {
        let mut runner = FfmpegRunner::new().with_cancel(self.shutdown.subscribe());
        if let Some(path) = &self.config.processing.ffmpeg_path {
            runner = runner.with_binary(path);
        }
        if let Some(secs) = self.config.processing.ffmpeg_timeout() {
            runner = runner.with_timeout(secs);
        }
        runner
    }

    fn is_cancelled(&self) -> bool {
        *self.shutdown.borrow()
    }

    /// Process `files` and summarize.
    ///
    /// Errors that are not specific to one file (FFmpeg missing) stop the
    /// batch and are returned.
    pub async fn run(&self, files: Vec<PathBuf>) -> WorkerResult<BatchSummary> {
        let runner = self.runner();
        runner.ffmpeg_path()?;
        runner.ffprobe_path()?;

        let total = files.len();
        info!(
            "Starting batch of {} files with {} max concurrent",
            total, self.config.processing.max_concurrent_files
        );

        let mut handles = Vec::with_capacity(total);
        for (i, file) in files.into_iter().enumerate() {
            let permit = Arc::clone(&self.file_semaphore)
                .acquire_owned()
                .await
                .map_err(|_| WorkerError::TaskFailed("Semaphore closed".to_string()))?;

            if self.is_cancelled() {
                handles.push(None);
                continue;
            }

            let config = Arc::clone(&self.config);
            let runner = runner.clone();
            let shutdown = Arc::clone(&self.shutdown);
            let logger = FileLogger::new(&file, i + 1, total).with_progress(config.logging.show_progress);
            let span = logger.create_span();

            let handle = tokio::spawn(
                async move {
                    let _permit = permit;
                    match process_video(&file, &config, &runner, &logger).await {
                        Ok(outcome) => outcome,
                        Err(e) => {
                            logger.log_error(&e.to_string());
                            if !e.is_per_file() {
                                shutdown.send_replace(true);
                            }
                            FileOutcome::Failed(e)
                        }
                    }
                }
                .instrument(span),
            );
            handles.push(Some(handle));
        }

        let mut summary = BatchSummary {
            total,
            ..Default::default()
        };
        let mut fatal = None;

        for handle in handles {
            let outcome = match handle {
                Some(handle) => handle.await.unwrap_or_else(|e| {
                    error!("File task panicked: {}", e);
                    FileOutcome::Failed(WorkerError::TaskFailed(e.to_string()))
                }),
                None => FileOutcome::Failed(MediaError::Cancelled.into()),
            };
            summary.record(&outcome);

            if let FileOutcome::Failed(e) = outcome {
                if !e.is_per_file() && fatal.is_none() {
                    fatal = Some(e);
                }
            }
        }

        if let Some(e) = fatal {
            return Err(e);
        }

        if self.is_cancelled() {
            warn!("Batch cancelled");
        }
        info!(
            "Processed {} files: {} succeeded, {} failed",
            summary.total, summary.succeeded, summary.failed
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_record() {
        let mut summary = BatchSummary {
            total: 3,
            ..Default::default()
        };
        summary.record(&FileOutcome::Written {
            output: PathBuf::from("a.chapter"),
            chapters: 2,
        });
        summary.record(&FileOutcome::Skipped {
            output: PathBuf::from("b.chapter"),
        });
        summary.record(&FileOutcome::Failed(MediaError::Cancelled.into()));

        assert_eq!(summary.succeeded, 2);
        assert_eq!(summary.failed, 1);
        assert!(!summary.is_failure());
        assert!(BatchSummary::default().is_failure());
    }

    #[test]
    fn test_runner_from_config() {
        let mut config = ChapterConfig::default();
        config.processing.ffmpeg_path = Some("/nonexistent/ffmpeg".to_string());
        let executor = BatchExecutor::new(config);

        assert!(matches!(
            executor.runner().ffmpeg_path(),
            Err(MediaError::FfmpegNotFound)
        ));
    }

    #[tokio::test]
    async fn test_missing_ffmpeg_stops_batch() {
        let mut config = ChapterConfig::default();
        config.processing.ffmpeg_path = Some("/nonexistent/ffmpeg".to_string());
        let executor = BatchExecutor::new(config);

        let result = executor.run(vec![PathBuf::from("talk.mp4")]).await;
        assert!(matches!(
            result,
            Err(WorkerError::Media(MediaError::FfmpegNotFound))
        ));
    }

    #[tokio::test]
    async fn test_shutdown_handle() {
        let executor = BatchExecutor::new(ChapterConfig::default());
        assert!(!executor.is_cancelled());
        executor.shutdown_handle().shutdown();
        assert!(executor.is_cancelled());
    }
}
