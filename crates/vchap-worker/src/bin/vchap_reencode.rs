//! Re-encode every video under a directory to H.264 MP4.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::sync::Semaphore;
use tracing::{error, info};
use vchap_media::{reencode_output_path, reencode_video, FfmpegRunner};
use vchap_models::LoggingConfig;
use vchap_worker::{find_reencode_inputs, init_tracing};

#[derive(Debug, Parser)]
#[command(name = "vchap-reencode", version, about = "Re-encode videos to H.264 MP4")]
struct Args {
    /// Directory searched recursively for videos
    input_dir: PathBuf,

    /// Directory receiving the re-encoded files
    output_dir: PathBuf,

    /// Files encoded in parallel
    #[arg(short, long, default_value_t = 4, value_parser = clap::value_parser!(u16).range(1..))]
    workers: u16,

    /// Replace existing output files
    #[arg(long)]
    overwrite: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    init_tracing(&LoggingConfig::default())?;

    let files = find_reencode_inputs(&args.input_dir)?;
    if files.is_empty() {
        info!("No videos found in {}", args.input_dir.display());
        return Ok(());
    }

    tokio::fs::create_dir_all(&args.output_dir).await?;

    let runner = FfmpegRunner::new();
    runner.ffmpeg_path()?;

    info!(
        "Re-encoding {} files with {} workers",
        files.len(),
        args.workers
    );

    let semaphore = Arc::new(Semaphore::new(usize::from(args.workers)));
    let mut handles = Vec::with_capacity(files.len());

    for input in files {
        let permit = Arc::clone(&semaphore).acquire_owned().await?;
        let output = reencode_output_path(&input, &args.output_dir);
        let runner = runner.clone();
        let overwrite = args.overwrite;

        handles.push(tokio::spawn(async move {
            let _permit = permit;
            match reencode_video(&input, &output, overwrite, &runner).await {
                Ok(()) => {
                    info!("Converted {} -> {}", input.display(), output.display());
                    true
                }
                Err(e) => {
                    error!("Failed to convert {}: {}", input.display(), e);
                    false
                }
            }
        }));
    }

    let total = handles.len();
    let mut succeeded = 0;
    for handle in handles {
        if handle.await.unwrap_or(false) {
            succeeded += 1;
        }
    }

    info!("Re-encode finished: {}/{} succeeded", succeeded, total);
    if succeeded < total {
        std::process::exit(1);
    }
    Ok(())
}
