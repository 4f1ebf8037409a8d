//! Chapter extraction worker binary.

use anyhow::Context;
use clap::Parser;
use tracing::{error, info, warn};

use vchap_models::ChapterConfig;
use vchap_worker::{
    discover_inputs, init_tracing, load_config, BatchExecutor, BatchSummary, Cli, ConfigSource,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let loaded = load_config(&cli).context("Failed to load configuration")?;

    init_tracing(&loaded.config.logging).context("Failed to initialize logging")?;

    info!("Starting vchap-worker {}", env!("CARGO_PKG_VERSION"));
    match &loaded.source {
        ConfigSource::File(path) => info!("Using config file {}", path.display()),
        ConfigSource::Defaults(path) => {
            warn!("Config file {} not found, using defaults", path.display())
        }
    }

    let summary = match run(loaded.config).await {
        Ok(summary) => summary,
        Err(e) => {
            error!("{:#}", e);
            std::process::exit(1);
        }
    };

    if summary.is_failure() {
        error!("No file was processed successfully");
        std::process::exit(1);
    }

    info!("Worker finished");
    Ok(())
}

async fn run(config: ChapterConfig) -> anyhow::Result<BatchSummary> {
    info!(
        input = %config.input.path,
        pattern = %config.input.pattern,
        adaptive = config.adaptive.enabled,
        "Searching for videos"
    );

    let mut files = discover_inputs(&config.input)?;
    info!("Found {} matching files", files.len());

    if !config.input.batch_mode {
        files.truncate(1);
        if let Some(first) = files.first() {
            info!("Single mode, processing only {}", first.display());
        }
    }

    let executor = BatchExecutor::new(config);

    // Ctrl-C cancels the batch, running FFmpeg processes are killed
    let shutdown = executor.shutdown_handle();
    let signal_task = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received shutdown signal");
            shutdown.shutdown();
        }
    });

    let summary = executor.run(files).await;
    signal_task.abort();

    Ok(summary?)
}
