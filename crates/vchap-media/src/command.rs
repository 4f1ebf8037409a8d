//! FFmpeg command builder and runner.

use std::collections::VecDeque;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::error::{MediaError, MediaResult};
use crate::progress::FfmpegProgress;

/// Lines of stderr kept for error reports.
const STDERR_TAIL_LINES: usize = 20;

/// One raw stderr line without its terminator, invalid UTF-8 replaced.
fn decode_line(raw: &[u8]) -> String {
    let raw = raw.strip_suffix(b"\n").unwrap_or(raw);
    let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
    String::from_utf8_lossy(raw).into_owned()
}

/// Output target of an FFmpeg command.
#[derive(Debug, Clone, PartialEq)]
enum Output {
    /// Write to a file
    File(PathBuf),
    /// Decode and discard (`-f null -`), used for analysis filters
    Null,
}

/// Builder for FFmpeg commands.
#[derive(Debug, Clone)]
pub struct FfmpegCommand {
    /// Input file path
    input: PathBuf,
    /// Output target
    output: Output,
    /// Output arguments (after -i)
    output_args: Vec<String>,
    /// Whether to overwrite output
    overwrite: bool,
    /// Log level
    log_level: String,
    /// Emit `-progress pipe:2` key/value lines
    progress: bool,
}

impl FfmpegCommand {
    /// Create a new FFmpeg command writing to a file.
    pub fn new(input: impl AsRef<Path>, output: impl AsRef<Path>) -> Self {
        Self {
            input: input.as_ref().to_path_buf(),
            output: Output::File(output.as_ref().to_path_buf()),
            output_args: Vec::new(),
            overwrite: true,
            log_level: "error".to_string(),
            progress: true,
        }
    }

    /// Create an analysis command that decodes the input and discards output.
    ///
    /// Filters such as `silencedetect` report at info level, so the log level
    /// is raised and the periodic stats line is suppressed.
    pub fn analysis(input: impl AsRef<Path>) -> Self {
        Self {
            input: input.as_ref().to_path_buf(),
            output: Output::Null,
            output_args: Vec::new(),
            overwrite: false,
            log_level: "info".to_string(),
            progress: false,
        }
    }

    /// Add output arguments (after -i).
    pub fn output_arg(mut self, arg: impl Into<String>) -> Self {
        self.output_args.push(arg.into());
        self
    }

    /// Set audio filter.
    pub fn audio_filter(self, filter: impl Into<String>) -> Self {
        self.output_arg("-af").output_arg(filter)
    }

    /// Set video codec.
    pub fn video_codec(self, codec: impl Into<String>) -> Self {
        self.output_arg("-c:v").output_arg(codec)
    }

    /// Set audio codec.
    pub fn audio_codec(self, codec: impl Into<String>) -> Self {
        self.output_arg("-c:a").output_arg(codec)
    }

    /// Set preset.
    pub fn preset(self, preset: impl Into<String>) -> Self {
        self.output_arg("-preset").output_arg(preset)
    }

    /// Refuse to overwrite an existing output file.
    pub fn no_overwrite(mut self) -> Self {
        self.overwrite = false;
        self
    }

    /// Build the command arguments.
    pub fn build_args(&self) -> Vec<String> {
        let mut args = Vec::new();

        args.push("-hide_banner".to_string());

        match self.output {
            Output::File(_) => args.push(if self.overwrite { "-y" } else { "-n" }.to_string()),
            Output::Null => args.push("-nostats".to_string()),
        }

        args.push("-v".to_string());
        args.push(self.log_level.clone());

        if self.progress {
            args.push("-progress".to_string());
            args.push("pipe:2".to_string());
        }

        args.push("-i".to_string());
        args.push(self.input.to_string_lossy().to_string());

        args.extend(self.output_args.iter().cloned());

        match &self.output {
            Output::File(path) => args.push(path.to_string_lossy().to_string()),
            Output::Null => {
                args.push("-f".to_string());
                args.push("null".to_string());
                args.push("-".to_string());
            }
        }

        args
    }
}

/// How a supervised process wait ended.
enum Supervised<T> {
    Finished(T),
    TimedOut(u64),
    Cancelled,
}

/// Runner for FFmpeg commands with stderr streaming, timeout and cancellation.
#[derive(Debug, Clone, Default)]
pub struct FfmpegRunner {
    /// Explicit FFmpeg binary, otherwise looked up on PATH
    binary: Option<PathBuf>,
    /// Cancellation signal receiver
    cancel_rx: Option<watch::Receiver<bool>>,
    /// Timeout in seconds
    timeout_secs: Option<u64>,
}

impl FfmpegRunner {
    /// Create a new runner.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a specific FFmpeg binary.
    pub fn with_binary(mut self, binary: impl Into<PathBuf>) -> Self {
        self.binary = Some(binary.into());
        self
    }

    /// Set cancellation signal.
    pub fn with_cancel(mut self, cancel_rx: watch::Receiver<bool>) -> Self {
        self.cancel_rx = Some(cancel_rx);
        self
    }

    /// Set timeout.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    /// Resolve the FFmpeg executable.
    pub fn ffmpeg_path(&self) -> MediaResult<PathBuf> {
        match &self.binary {
            Some(binary) if binary.is_file() => Ok(binary.clone()),
            Some(binary) => which::which(binary).map_err(|_| MediaError::FfmpegNotFound),
            None => check_ffmpeg(),
        }
    }

    /// Resolve the FFprobe executable that belongs to this FFmpeg.
    ///
    /// With an explicit FFmpeg binary the sibling `ffprobe` in the same
    /// directory is preferred.
    pub fn ffprobe_path(&self) -> MediaResult<PathBuf> {
        if let Some(binary) = &self.binary {
            let sibling = ffprobe_sibling(binary);
            if sibling.is_file() {
                return Ok(sibling);
            }
        }
        check_ffprobe()
    }

    /// Run an FFmpeg command, discarding its diagnostics.
    pub async fn run(&self, cmd: &FfmpegCommand) -> MediaResult<()> {
        self.run_with_lines(cmd, |_| {}).await
    }

    /// Run an FFmpeg command with progress callback.
    pub async fn run_with_progress<F>(&self, cmd: &FfmpegCommand, progress_callback: F) -> MediaResult<()>
    where
        F: Fn(FfmpegProgress),
    {
        let mut current = FfmpegProgress::default();
        self.run_with_lines(cmd, |line| {
            if let Some(progress) = parse_progress_line(line, &mut current) {
                progress_callback(progress);
            }
        })
        .await
    }

    /// Run an FFmpeg command, handing every stderr line to `on_line` as it
    /// arrives.
    ///
    /// Lines are delivered in order while the process is still running. The
    /// last few lines are attached to the error when FFmpeg exits non-zero.
    pub async fn run_with_lines<F>(&self, cmd: &FfmpegCommand, mut on_line: F) -> MediaResult<()>
    where
        F: FnMut(&str),
    {
        let binary = self.ffmpeg_path()?;

        let args = cmd.build_args();
        debug!("Running FFmpeg: {} {}", binary.display(), args.join(" "));

        let mut child = Command::new(&binary)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| MediaError::ffmpeg_failed("stderr not captured", None, None))?;
        let mut reader = BufReader::new(stderr);
        let mut tail: VecDeque<String> = VecDeque::with_capacity(STDERR_TAIL_LINES);

        let outcome = {
            let pump = async {
                // Metadata tags and file names are printed verbatim, not
                // necessarily as UTF-8
                let mut buf = Vec::new();
                loop {
                    buf.clear();
                    if reader.read_until(b'\n', &mut buf).await? == 0 {
                        break;
                    }
                    let line = decode_line(&buf);
                    on_line(&line);
                    if tail.len() == STDERR_TAIL_LINES {
                        tail.pop_front();
                    }
                    tail.push_back(line);
                }
                child.wait().await
            };
            self.supervise(pump).await
        };

        match outcome {
            Supervised::Finished(status) => check_status(status?, &tail),
            Supervised::TimedOut(secs) => {
                warn!("FFmpeg timed out after {} seconds, killing process", secs);
                let _ = child.kill().await;
                Err(MediaError::Timeout(secs))
            }
            Supervised::Cancelled => {
                info!("FFmpeg cancelled, killing process");
                let _ = child.kill().await;
                Err(MediaError::Cancelled)
            }
        }
    }

    /// Drive `fut` to completion unless the timeout or cancellation fires first.
    async fn supervise<F: Future>(&self, fut: F) -> Supervised<F::Output> {
        let timeout_secs = self.timeout_secs;
        let deadline = async move {
            match timeout_secs {
                Some(secs) => {
                    tokio::time::sleep(Duration::from_secs(secs)).await;
                    secs
                }
                None => std::future::pending().await,
            }
        };

        tokio::select! {
            output = fut => Supervised::Finished(output),
            secs = deadline => Supervised::TimedOut(secs),
            _ = wait_for_cancel(self.cancel_rx.clone()) => Supervised::Cancelled,
        }
    }
}

/// Resolve once the cancel flag is set; never resolves without a receiver.
async fn wait_for_cancel(cancel_rx: Option<watch::Receiver<bool>>) {
    let Some(mut rx) = cancel_rx else {
        return std::future::pending().await;
    };

    loop {
        if *rx.borrow_and_update() {
            return;
        }
        if rx.changed().await.is_err() {
            // Sender gone without cancelling
            return std::future::pending().await;
        }
    }
}

fn check_status(status: ExitStatus, tail: &VecDeque<String>) -> MediaResult<()> {
    if status.success() {
        return Ok(());
    }

    let stderr = if tail.is_empty() {
        None
    } else {
        Some(tail.iter().cloned().collect::<Vec<_>>().join("\n"))
    };

    Err(MediaError::ffmpeg_failed(
        "FFmpeg exited with non-zero status",
        stderr,
        status.code(),
    ))
}

/// `ffprobe` next to the given `ffmpeg`, keeping any extension (`.exe`).
fn ffprobe_sibling(ffmpeg: &Path) -> PathBuf {
    let name = ffmpeg
        .file_name()
        .map(|n| n.to_string_lossy().replace("ffmpeg", "ffprobe"))
        .unwrap_or_else(|| "ffprobe".to_string());
    ffmpeg.with_file_name(name)
}

/// Parse a progress line from FFmpeg's -progress output.
fn parse_progress_line(line: &str, current: &mut FfmpegProgress) -> Option<FfmpegProgress> {
    let line = line.trim();

    if let Some((key, value)) = line.split_once('=') {
        match key {
            "out_time_ms" | "out_time_us" => {
                // Both keys carry microseconds in current FFmpeg builds
                if let Ok(us) = value.parse::<i64>() {
                    current.out_time_ms = us / 1000;
                }
            }
            "out_time" => {
                current.out_time = value.to_string();
            }
            "frame" => {
                if let Ok(frame) = value.parse() {
                    current.frame = frame;
                }
            }
            "speed" => {
                // Format: "1.5x" or "N/A"
                if let Some(speed) = value.strip_suffix('x').and_then(|s| s.trim().parse().ok()) {
                    current.speed = speed;
                }
            }
            "progress" => {
                if value == "end" {
                    current.is_complete = true;
                }
                return Some(current.clone());
            }
            _ => {}
        }
    }

    None
}

/// Check if FFmpeg is available.
pub fn check_ffmpeg() -> MediaResult<PathBuf> {
    which::which("ffmpeg").map_err(|_| MediaError::FfmpegNotFound)
}

/// Check if FFprobe is available.
pub fn check_ffprobe() -> MediaResult<PathBuf> {
    which::which("ffprobe").map_err(|_| MediaError::FfprobeNotFound)
}
