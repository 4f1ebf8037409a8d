use std::process::Command;

use clap::Parser;
use vchap_media::FfmpegRunner;
use vchap_worker::{load_config, Cli, ConfigSource};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let loaded = load_config(&cli)?;
    match &loaded.source {
        ConfigSource::File(path) => println!("vchap-selfcheck: config {} ok", path.display()),
        ConfigSource::Defaults(path) => {
            println!("vchap-selfcheck: {} not found, defaults ok", path.display())
        }
    }

    let mut runner = FfmpegRunner::new();
    if let Some(path) = &loaded.config.processing.ffmpeg_path {
        runner = runner.with_binary(path);
    }

    let ffmpeg = runner.ffmpeg_path()?;
    ensure_runs(&ffmpeg, "ffmpeg")?;
    let ffprobe = runner.ffprobe_path()?;
    ensure_runs(&ffprobe, "ffprobe")?;

    println!("vchap-selfcheck: ok");
    Ok(())
}

fn ensure_runs(binary: &std::path::Path, name: &str) -> anyhow::Result<()> {
    let output = Command::new(binary)
        .arg("-version")
        .output()
        .map_err(|e| anyhow::anyhow!("{} not available: {}", name, e))?;

    if !output.status.success() {
        return Err(anyhow::anyhow!(
            "{} -version failed: {:?}",
            name,
            output.status
        ));
    }

    let version = String::from_utf8_lossy(&output.stdout);
    if let Some(first) = version.lines().next() {
        println!("vchap-selfcheck: {} at {}: {}", name, binary.display(), first);
    }
    Ok(())
}
