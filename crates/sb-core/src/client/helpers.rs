//! Pure helpers: payload assembly and error body parsing (no HTTP, no status logic).

use serde_json::{Map, Value};

use crate::prediction::PredictionRecord;

/// Longest raw body excerpt kept in an error message.
const MAX_BODY_EXCERPT: usize = 200;

/// Merge one prediction into the run's payload template under `prediction`.
pub(crate) fn build_payload(template: &Map<String, Value>, record: &PredictionRecord) -> Value {
    let mut payload = template.clone();
    payload.insert(
        "prediction".to_string(),
        serde_json::json!({
            "instance_id": record.instance_id,
            "model_patch": record.model_patch,
            "model_name_or_path": record.model_name_or_path,
        }),
    );
    Value::Object(payload)
}

/// Submission endpoint for a base URL.
pub(crate) fn submit_url(base_url: &str) -> String {
    format!("{}/submit", base_url.trim_end_matches('/'))
}

/// Extract the server-reported reason from an error body.
///
/// Looks at `message`, `detail` and `error` in a JSON body; otherwise falls
/// back to a truncated raw body, then to `fallback`.
pub(crate) fn parse_error_message(body: &str, fallback: &str) -> String {
    if let Ok(json) = serde_json::from_str::<Value>(body) {
        let reason = ["message", "detail", "error"]
            .iter()
            .find_map(|key| json.get(*key))
            .map(|v| match v {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            });
        if let Some(reason) = reason {
            return reason;
        }
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        fallback.to_string()
    } else {
        trimmed.chars().take(MAX_BODY_EXCERPT).collect()
    }
}
