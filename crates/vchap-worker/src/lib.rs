//! Batch chapter extraction worker.
//!
//! This crate provides:
//! - Configuration loading (JSON file, environment, command line)
//! - Input discovery with glob patterns
//! - Per-file processing and a bounded batch executor
//! - Tracing setup and structured per-file logging

pub mod config;
pub mod discovery;
pub mod error;
pub mod executor;
pub mod logging;
pub mod processor;

pub use config::{load_config, Cli, ConfigSource, LoadedConfig};
pub use discovery::{discover_inputs, find_reencode_inputs, InputPattern};
pub use error::{WorkerError, WorkerResult};
pub use executor::{BatchExecutor, BatchSummary, ShutdownHandle};
pub use logging::{init_tracing, FileLogger};
pub use processor::{process_video, FileOutcome};
