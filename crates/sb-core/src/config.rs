//! Client configuration and submission payload types.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use serde_json::{Map, Value};

/// Environment variable holding the service base URL.
pub const ENV_API_URL: &str = "SWEBENCH_API_URL";
/// Environment variable holding the API key.
pub const ENV_API_KEY: &str = "SWEBENCH_API_KEY";
/// Environment variable overriding the per-prediction size limit.
pub const ENV_MAX_PREDICTION_SIZE_MB: &str = "SB_CLI_MAX_PREDICTION_SIZE_MB";

/// Submission client configuration.
#[derive(Debug, Clone)]
pub struct SubmitConfig {
    /// Base URL for the evaluation service.
    pub api_url: String,

    /// API key sent as `x-api-key`.
    pub api_key: Option<String>,

    /// Maximum serialized size of a single prediction, in megabytes.
    pub max_prediction_size_mb: f64,

    /// Number of concurrent submissions.
    pub workers: usize,

    /// Request timeout in seconds. `None` keeps the HTTP client default.
    pub timeout_secs: Option<u64>,

    /// Additional headers sent with every request.
    pub extra_headers: Vec<(String, String)>,
}

fn default_api_url() -> String {
    "https://api.swebench.com".to_string()
}

fn default_max_prediction_size_mb() -> f64 {
    10.0
}

/// Worker pool default: available parallelism plus four, capped at 32.
pub fn default_workers() -> usize {
    let cpus = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    (cpus + 4).min(32)
}

impl Default for SubmitConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            api_key: None,
            max_prediction_size_mb: default_max_prediction_size_mb(),
            workers: default_workers(),
            timeout_secs: None,
            extra_headers: Vec::new(),
        }
    }
}

impl SubmitConfig {
    /// Create config from environment variables.
    ///
    /// | Variable | Description |
    /// |----------|-------------|
    /// | `SWEBENCH_API_URL` | Service base URL (default `https://api.swebench.com`) |
    /// | `SWEBENCH_API_KEY` | API key |
    /// | `SB_CLI_MAX_PREDICTION_SIZE_MB` | Size limit per prediction (default 10) |
    pub fn from_env() -> Self {
        Self {
            api_url: std::env::var(ENV_API_URL).unwrap_or_else(|_| default_api_url()),
            api_key: std::env::var(ENV_API_KEY).ok().filter(|k| !k.is_empty()),
            max_prediction_size_mb: std::env::var(ENV_MAX_PREDICTION_SIZE_MB)
                .ok()
                .and_then(|v| v.trim().parse().ok())
                .filter(|v: &f64| v.is_finite() && *v >= 0.0)
                .unwrap_or_else(default_max_prediction_size_mb),
            ..Self::default()
        }
    }

    /// Set the base URL.
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into();
        self
    }

    /// Set the API key.
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Set the size limit in megabytes.
    pub fn with_max_prediction_size_mb(mut self, max_mb: f64) -> Self {
        self.max_prediction_size_mb = max_mb;
        self
    }

    /// Set the worker count (clamped to at least one).
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// Add a header sent with every request.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra_headers.push((name.into(), value.into()));
        self
    }
}

/// Benchmark subsets accepted by the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Subset {
    #[serde(rename = "swe-bench-m")]
    SweBenchM,
    #[serde(rename = "swe-bench_lite")]
    SweBenchLite,
    #[serde(rename = "swe-bench_verified")]
    SweBenchVerified,
}

impl Subset {
    pub const ALL: [Subset; 3] = [Self::SweBenchM, Self::SweBenchLite, Self::SweBenchVerified];

    /// Wire name of the subset.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SweBenchM => "swe-bench-m",
            Self::SweBenchLite => "swe-bench_lite",
            Self::SweBenchVerified => "swe-bench_verified",
        }
    }
}

impl fmt::Display for Subset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Subset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|subset| subset.as_str() == s)
            .ok_or_else(|| {
                let names: Vec<&str> = Self::ALL.iter().map(Subset::as_str).collect();
                format!("unknown subset '{}' (expected one of: {})", s, names.join(", "))
            })
    }
}

/// Fields shared by every submission request of one run.
#[derive(Debug, Clone, Serialize)]
pub struct PayloadBase {
    pub subset: Subset,
    pub split: String,
    pub run_id: String,
    /// Allow-list forwarded to the service; empty means all instances.
    pub instance_ids: Vec<String>,
}

impl PayloadBase {
    /// Render as the JSON object template merged into each request.
    pub fn to_template(&self) -> Map<String, Value> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_config_from_env_defaults() {
        std::env::remove_var(ENV_API_URL);
        std::env::remove_var(ENV_API_KEY);
        std::env::remove_var(ENV_MAX_PREDICTION_SIZE_MB);

        let config = SubmitConfig::from_env();
        assert_eq!(config.api_url, "https://api.swebench.com");
        assert!(config.api_key.is_none());
        assert_eq!(config.max_prediction_size_mb, 10.0);
        assert!(config.workers >= 1 && config.workers <= 32);
    }

    #[test]
    #[serial]
    fn test_config_from_env_overrides() {
        std::env::set_var(ENV_API_URL, "http://localhost:9000");
        std::env::set_var(ENV_API_KEY, "secret");
        std::env::set_var(ENV_MAX_PREDICTION_SIZE_MB, "2.5");

        let config = SubmitConfig::from_env();
        assert_eq!(config.api_url, "http://localhost:9000");
        assert_eq!(config.api_key.as_deref(), Some("secret"));
        assert_eq!(config.max_prediction_size_mb, 2.5);

        std::env::set_var(ENV_MAX_PREDICTION_SIZE_MB, "lots");
        assert_eq!(SubmitConfig::from_env().max_prediction_size_mb, 10.0);

        std::env::remove_var(ENV_API_URL);
        std::env::remove_var(ENV_API_KEY);
        std::env::remove_var(ENV_MAX_PREDICTION_SIZE_MB);
    }

    #[test]
    fn test_config_builder() {
        let config = SubmitConfig::default()
            .with_url("http://127.0.0.1:8080")
            .with_api_key("k")
            .with_max_prediction_size_mb(1.0)
            .with_workers(0)
            .with_header("x-trace", "1");

        assert_eq!(config.api_url, "http://127.0.0.1:8080");
        assert_eq!(config.api_key, Some("k".to_string()));
        assert_eq!(config.max_prediction_size_mb, 1.0);
        assert_eq!(config.workers, 1);
        assert_eq!(
            config.extra_headers,
            vec![("x-trace".to_string(), "1".to_string())]
        );
    }

    #[test]
    fn test_subset_round_trip_names() {
        assert_eq!(
            "swe-bench_verified".parse::<Subset>(),
            Ok(Subset::SweBenchVerified)
        );
        assert_eq!(Subset::SweBenchM.to_string(), "swe-bench-m");
        let err = "swe-bench".parse::<Subset>().unwrap_err();
        assert!(err.contains("swe-bench_lite"));
    }

    #[test]
    fn test_payload_template() {
        let base = PayloadBase {
            subset: Subset::SweBenchLite,
            split: "dev".into(),
            run_id: "run-1".into(),
            instance_ids: vec!["a".into()],
        };
        let template = base.to_template();
        assert_eq!(template["subset"], "swe-bench_lite");
        assert_eq!(template["split"], "dev");
        assert_eq!(template["run_id"], "run-1");
        assert_eq!(template["instance_ids"], serde_json::json!(["a"]));
    }
}
