use clap::{Parser, Subcommand};
use sb_core::config::{ENV_API_KEY, ENV_API_URL, ENV_MAX_PREDICTION_SIZE_MB};
use sb_core::Subset;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "sb-cli",
    version,
    about = "Submit model predictions to the SWE-bench evaluation API"
)]
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Validate and submit predictions for evaluation
    Submit(SubmitArgs),
    /// Load and validate a predictions file without submitting
    Validate(ValidateArgs),
    Version,
}

/// Options shared by every command that reads a predictions file.
#[derive(clap::Args, Debug, Clone)]
pub struct PredictionArgs {
    /// Predictions file (.json document, otherwise JSON lines)
    #[arg(long)]
    pub predictions_path: PathBuf,

    /// Only process these instance ids (comma separated or repeated)
    #[arg(long, value_delimiter = ',')]
    pub instance_ids: Vec<String>,

    /// Skip predictions whose serialized size exceeds this many MB
    #[arg(
        long,
        env = ENV_MAX_PREDICTION_SIZE_MB,
        default_value_t = 10.0,
        value_parser = parse_size_limit
    )]
    pub max_prediction_size_mb: f64,
}

#[derive(clap::Args, Debug, Clone)]
pub struct SubmitArgs {
    /// Benchmark subset (swe-bench-m, swe-bench_lite, swe-bench_verified)
    pub subset: Subset,

    /// Dataset split (e.g. dev, test)
    pub split: String,

    #[command(flatten)]
    pub predictions: PredictionArgs,

    /// Run id for this submission (default: generated UUID)
    #[arg(long)]
    pub run_id: Option<String>,

    /// Number of concurrent submissions
    #[arg(long)]
    pub workers: Option<usize>,

    /// Evaluation service base URL
    #[arg(long, env = ENV_API_URL, default_value = "https://api.swebench.com")]
    pub api_url: String,

    /// API key sent as x-api-key
    #[arg(long, env = ENV_API_KEY, hide_env_values = true)]
    pub api_key: Option<String>,

    /// Extra request header, NAME:VALUE (repeatable)
    #[arg(long = "header", value_parser = parse_header)]
    pub headers: Vec<(String, String)>,

    /// Request timeout in seconds (default: no client-side timeout)
    #[arg(long)]
    pub timeout_secs: Option<u64>,
}

#[derive(clap::Args, Debug, Clone)]
pub struct ValidateArgs {
    #[command(flatten)]
    pub predictions: PredictionArgs,
}

fn parse_size_limit(raw: &str) -> Result<f64, String> {
    let value: f64 = raw
        .trim()
        .parse()
        .map_err(|_| format!("'{}' is not a number", raw))?;
    if !value.is_finite() || value < 0.0 {
        return Err(format!("size limit must be a finite number >= 0, got '{}'", raw));
    }
    Ok(value)
}

fn parse_header(raw: &str) -> Result<(String, String), String> {
    let (name, value) = raw
        .split_once(':')
        .ok_or_else(|| format!("expected NAME:VALUE, got '{}'", raw))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("empty header name in '{}'", raw));
    }
    Ok((name.to_string(), value.trim().to_string()))
}
