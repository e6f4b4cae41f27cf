//! DemandCast Runner: request orchestration on top of `demandcast-core`.
//!
//! This crate provides:
//! - TOML pipeline configuration with defaults and validation
//! - A per-session dataset cache keyed by source identity
//! - Trend and forecast requests wiring filter, aggregate, forecast and alerts
//! - Artifact export (manifest, CSV, text and Markdown reports)
//! - Deterministic synthetic sales data

pub mod config;
pub mod export;
pub mod runner;
pub mod sample;
pub mod session;

pub use config::{ConfigError, PipelineConfig};
pub use export::{load_artifacts, save_artifacts};
pub use runner::{
    run_forecast, run_trend, ForecastOutcome, ForecastRequest, RunError, SCHEMA_VERSION,
};
pub use sample::{generate_sample_csv, write_sample_csv, SampleOptions};
pub use session::{DatasetSession, SourceKey};
