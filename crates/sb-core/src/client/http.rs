//! HTTP layer: request sending and response verification.
//!
//! This is the ONLY place for status code handling. client/mod.rs never
//! interprets status codes.

use std::fmt;
use std::sync::Arc;

use reqwest::StatusCode;
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{ServiceError, ServiceResult};
use crate::prediction::PredictionRecord;

use super::helpers::{build_payload, parse_error_message};

/// Decides whether a submission response is acceptable.
pub trait ResponseVerifier: Send + Sync {
    /// Return the parsed body on success, or the failure for `instance_id`.
    fn verify(&self, instance_id: &str, status: StatusCode, body: &str) -> ServiceResult<Value>;
}

/// Default verifier: any 2xx with a JSON body is accepted.
#[derive(Debug, Clone, Copy, Default)]
pub struct StatusVerifier;

impl ResponseVerifier for StatusVerifier {
    fn verify(&self, instance_id: &str, status: StatusCode, body: &str) -> ServiceResult<Value> {
        if !status.is_success() {
            let fallback = status
                .canonical_reason()
                .map(String::from)
                .unwrap_or_else(|| status.to_string());
            return Err(ServiceError::Rejected {
                instance_id: instance_id.to_string(),
                status: status.as_u16(),
                message: parse_error_message(body, &fallback),
            });
        }

        serde_json::from_str(body).map_err(|e| ServiceError::InvalidResponse {
            instance_id: instance_id.to_string(),
            message: format!("response body is not JSON: {}", e),
        })
    }
}

/// HTTP backend for making requests (holds reqwest client and verifier).
#[derive(Clone)]
pub(crate) struct HttpBackend {
    pub(crate) client: reqwest::Client,
    pub(crate) submit_url: String,
    pub(crate) verifier: Arc<dyn ResponseVerifier>,
}

impl fmt::Debug for HttpBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpBackend")
            .field("submit_url", &self.submit_url)
            .finish_non_exhaustive()
    }
}

impl HttpBackend {
    /// POST one prediction and verify the response.
    pub(crate) async fn submit(
        &self,
        template: &Map<String, Value>,
        record: &PredictionRecord,
    ) -> ServiceResult<Value> {
        let instance_id = record.instance_id.as_str();
        let payload = build_payload(template, record);
        debug!(url = %self.submit_url, instance_id, "submitting prediction");

        let response = self
            .client
            .post(&self.submit_url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| ServiceError::network(instance_id, e))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| ServiceError::Network {
            instance_id: instance_id.to_string(),
            message: format!("failed to read response body: {}", e),
        })?;

        debug!(instance_id, status = status.as_u16(), "submission response");
        self.verifier.verify(instance_id, status, &body)
    }
}
