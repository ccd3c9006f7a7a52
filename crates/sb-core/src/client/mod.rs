//! Submission client for the evaluation service.
//!
//! Public API: no status code knowledge. All HTTP/status mapping in http.rs.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, USER_AGENT};
use serde_json::{Map, Value};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{info, warn};

use crate::config::SubmitConfig;
use crate::error::{ServiceError, ServiceResult};
use crate::prediction::PredictionRecord;
use crate::report::{ProgressEvent, ProgressSink, SubmissionOutcome, SubmissionReport};

mod helpers;
mod http;

pub use http::{ResponseVerifier, StatusVerifier};

use http::HttpBackend;

const API_KEY_HEADER: &str = "x-api-key";

/// Client submitting predictions through a bounded worker pool.
#[derive(Debug, Clone)]
pub struct SubmitClient {
    http: HttpBackend,
    workers: usize,
}

impl SubmitClient {
    pub fn new(config: &SubmitConfig) -> ServiceResult<Self> {
        Self::with_verifier(config, Arc::new(StatusVerifier))
    }

    pub fn with_verifier(
        config: &SubmitConfig,
        verifier: Arc<dyn ResponseVerifier>,
    ) -> ServiceResult<Self> {
        let headers = build_headers(config)?;

        let mut builder = reqwest::Client::builder().default_headers(headers);
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder.build().map_err(|e| ServiceError::Client {
            message: format!("failed to create HTTP client: {}", e),
        })?;

        Ok(Self {
            http: HttpBackend {
                client,
                submit_url: helpers::submit_url(&config.api_url),
                verifier,
            },
            workers: config.workers.clamp(1, Semaphore::MAX_PERMITS),
        })
    }

    pub fn from_env() -> ServiceResult<Self> {
        Self::new(&SubmitConfig::from_env())
    }

    /// Submit a single prediction and return the parsed response.
    pub async fn submit_prediction(
        &self,
        record: &PredictionRecord,
        template: &Map<String, Value>,
    ) -> ServiceResult<Value> {
        self.http.submit(template, record).await
    }

    /// Submit every record concurrently, at most `workers` at a time.
    ///
    /// Outcomes are collected in completion order. A failed submission never
    /// cancels the others; the call returns once every record has either
    /// succeeded or failed.
    pub async fn submit_all(
        &self,
        records: Vec<PredictionRecord>,
        template: &Map<String, Value>,
        progress: Option<ProgressSink>,
    ) -> SubmissionReport {
        let total = records.len();
        let sem = Arc::new(Semaphore::new(self.workers));
        let template = Arc::new(template.clone());
        let mut join_set = JoinSet::new();
        let mut task_ids = HashMap::with_capacity(total);

        for record in records {
            let sem = sem.clone();
            let http = self.http.clone();
            let template = template.clone();
            let instance_id = record.instance_id.clone();
            let handle = join_set.spawn(async move {
                let _permit = sem.acquire_owned().await;
                let result = http.submit(&template, &record).await;
                SubmissionOutcome {
                    instance_id: record.instance_id,
                    result,
                }
            });
            task_ids.insert(handle.id(), instance_id);
        }

        let mut report = SubmissionReport {
            outcomes: Vec::with_capacity(total),
        };
        while let Some(res) = join_set.join_next_with_id().await {
            let outcome = match res {
                Ok((_, outcome)) => outcome,
                Err(e) => {
                    let instance_id = task_ids
                        .remove(&e.id())
                        .unwrap_or_else(|| "unknown".into());
                    SubmissionOutcome {
                        result: Err(ServiceError::Task {
                            instance_id: instance_id.clone(),
                            message: format!("join error: {}", e),
                        }),
                        instance_id,
                    }
                }
            };
            if let Err(e) = &outcome.result {
                warn!(instance_id = %outcome.instance_id, error = %e, "submission failed");
            }
            report.outcomes.push(outcome);
            if let Some(ref sink) = progress {
                sink(ProgressEvent {
                    done: report.len(),
                    total,
                });
            }
        }

        info!(
            total,
            succeeded = report.success_count(),
            failed = total - report.success_count(),
            "submission run complete"
        );
        report
    }

    pub fn submit_url(&self) -> &str {
        &self.http.submit_url
    }

    pub fn workers(&self) -> usize {
        self.workers
    }
}

fn build_headers(config: &SubmitConfig) -> ServiceResult<HeaderMap> {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static(crate::SB_USER_AGENT));

    if let Some(key) = &config.api_key {
        let mut value = header_value(API_KEY_HEADER, key)?;
        value.set_sensitive(true);
        headers.insert(HeaderName::from_static(API_KEY_HEADER), value);
    }

    for (name, value) in &config.extra_headers {
        let header_name =
            HeaderName::from_bytes(name.as_bytes()).map_err(|e| ServiceError::Client {
                message: format!("invalid header name '{}': {}", name, e),
            })?;
        headers.insert(header_name, header_value(name, value)?);
    }

    Ok(headers)
}

fn header_value(name: &str, value: &str) -> ServiceResult<HeaderValue> {
    HeaderValue::from_str(value).map_err(|e| ServiceError::Client {
        message: format!("invalid value for header '{}': {}", name, e),
    })
}
