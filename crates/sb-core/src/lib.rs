//! Prediction loading and submission for the SWE-bench evaluation API.
//!
//! This crate provides:
//!
//! - Loading predictions from JSON or JSONL files
//! - Batch validation (single model, unique instance ids) and size limits
//! - Concurrent submission to the evaluation service with per-record results
//!
//! # Quick Start
//!
//! ```no_run
//! use sb_core::{PayloadBase, PredictionLoader, Subset, SubmitClient, SubmitConfig};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = SubmitConfig::from_env();
//! let loaded = PredictionLoader::from_config(&config)
//!     .load("preds.jsonl".as_ref(), &[])?;
//!
//! let base = PayloadBase {
//!     subset: Subset::SweBenchLite,
//!     split: "test".into(),
//!     run_id: "my-run".into(),
//!     instance_ids: vec![],
//! };
//! let client = SubmitClient::new(&config)?;
//! let report = client.submit_all(loaded.records, &base.to_template(), None).await;
//! println!("{} submitted", report.success_count());
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration
//!
//! | Environment Variable | Description |
//! |---------------------|-------------|
//! | `SWEBENCH_API_URL` | Service base URL (default: `https://api.swebench.com`) |
//! | `SWEBENCH_API_KEY` | API key sent as `x-api-key` |
//! | `SB_CLI_MAX_PREDICTION_SIZE_MB` | Per-prediction size limit in MB (default: 10) |

pub mod client;
pub mod config;
pub mod error;
pub mod prediction;
pub mod report;

pub use client::{ResponseVerifier, StatusVerifier, SubmitClient};
pub use config::{PayloadBase, Subset, SubmitConfig};
pub use error::{LoadError, LoadResult, ServiceError, ServiceResult};
pub use prediction::{
    check_prediction_size, format_size_warnings, read_predictions, validate_batch,
    LoadedPredictions, PredictionLoader, PredictionRecord, SizeCheck, SizeWarning,
    MAX_DETAILED_WARNINGS,
};
pub use report::{
    format_progress_line, stderr_progress_sink, ProgressEvent, ProgressSink, SubmissionOutcome,
    SubmissionReport,
};
pub use reqwest::StatusCode;

/// User-Agent sent with every request.
pub const SB_USER_AGENT: &str = concat!("sb-cli/", env!("CARGO_PKG_VERSION"));
