//! Loading, validating and size-filtering prediction files.
//!
//! A predictions file is either a single JSON document (path ends in `.json`)
//! or newline-delimited JSON. A JSON document may be a list of prediction
//! objects or a mapping of `instance_id` to prediction object. Both shapes
//! are resolved here into one ordered list of [`PredictionRecord`].

use std::collections::{BTreeSet, HashSet};
use std::path::Path;

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::debug;

use crate::config::SubmitConfig;
use crate::error::{LoadError, LoadResult};

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Size warnings shown in detail before the remainder is summarized.
pub const MAX_DETAILED_WARNINGS: usize = 10;

/// One prediction, normalized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PredictionRecord {
    pub instance_id: String,
    pub model_patch: String,
    pub model_name_or_path: String,
}

/// Serialized size of a prediction relative to a limit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SizeCheck {
    pub within_limit: bool,
    pub size_mb: f64,
}

/// A prediction dropped for exceeding the size limit.
#[derive(Debug, Clone, PartialEq)]
pub struct SizeWarning {
    pub instance_id: String,
    pub size_mb: f64,
    /// Patch length in characters.
    pub patch_length: usize,
}

/// Loader output: records ready to submit plus those skipped for size.
#[derive(Debug, Clone, Default)]
pub struct LoadedPredictions {
    pub records: Vec<PredictionRecord>,
    pub oversized: Vec<SizeWarning>,
}

impl LoadedPredictions {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Parsed file layout, resolved into records immediately.
enum PredictionSource {
    Sequence(Vec<Value>),
    Keyed(Map<String, Value>),
}

impl PredictionSource {
    fn from_document(doc: Value) -> LoadResult<Self> {
        match doc {
            Value::Array(items) => Ok(Self::Sequence(items)),
            Value::Object(map) => Ok(Self::Keyed(map)),
            other => Err(LoadError::InvalidShape {
                message: format!(
                    "expected a list or a mapping of predictions, found {}",
                    json_kind(&other)
                ),
            }),
        }
    }

    /// Resolve entries into records. Entries whose instance id is not in a
    /// non-empty `allowed` set are dropped before their other fields are read.
    fn into_records(self, allowed: &AllowList<'_>) -> LoadResult<Vec<PredictionRecord>> {
        let mut records = Vec::new();
        match self {
            Self::Sequence(items) => {
                for (idx, item) in items.into_iter().enumerate() {
                    let entry = format!("#{}", idx + 1);
                    let obj = as_object(item, &entry)?;
                    let instance_id = required_str(&obj, "instance_id", &entry)?;
                    if allowed.permits(&instance_id) {
                        records.push(record_from_object(instance_id, &obj)?);
                    }
                }
            }
            Self::Keyed(map) => {
                for (instance_id, item) in map {
                    if !allowed.permits(&instance_id) {
                        continue;
                    }
                    let obj = as_object(item, &instance_id)?;
                    records.push(record_from_object(instance_id, &obj)?);
                }
            }
        }
        Ok(records)
    }
}

/// Instance allow-list; empty admits everything.
struct AllowList<'a>(HashSet<&'a str>);

impl<'a> AllowList<'a> {
    fn new(instance_ids: &'a [String]) -> Self {
        Self(instance_ids.iter().map(String::as_str).collect())
    }

    fn permits(&self, instance_id: &str) -> bool {
        self.0.is_empty() || self.0.contains(instance_id)
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "a mapping",
    }
}

fn as_object(value: Value, entry: &str) -> LoadResult<Map<String, Value>> {
    match value {
        Value::Object(obj) => Ok(obj),
        other => Err(LoadError::InvalidShape {
            message: format!(
                "prediction {} must be an object, found {}",
                entry,
                json_kind(&other)
            ),
        }),
    }
}

fn required_str(obj: &Map<String, Value>, field: &'static str, entry: &str) -> LoadResult<String> {
    match obj.get(field) {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(_) => Err(LoadError::InvalidField {
            entry: entry.to_string(),
            field,
        }),
        None => Err(LoadError::MissingField {
            entry: entry.to_string(),
            field,
        }),
    }
}

fn record_from_object(instance_id: String, obj: &Map<String, Value>) -> LoadResult<PredictionRecord> {
    // null patch means the model produced no change
    let model_patch = match obj.get("model_patch") {
        Some(Value::Null) => String::new(),
        _ => required_str(obj, "model_patch", &instance_id)?,
    };
    let model_name_or_path = required_str(obj, "model_name_or_path", &instance_id)?;
    Ok(PredictionRecord {
        instance_id,
        model_patch,
        model_name_or_path,
    })
}

/// Parse a predictions file into records, without filtering or validation.
pub fn read_predictions(path: &Path) -> LoadResult<Vec<PredictionRecord>> {
    read_allowed_predictions(path, &[])
}

fn read_allowed_predictions(
    path: &Path,
    instance_ids: &[String],
) -> LoadResult<Vec<PredictionRecord>> {
    let content = std::fs::read_to_string(path).map_err(|source| LoadError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_predictions(path, &content, instance_ids)
}

fn parse_predictions(
    path: &Path,
    content: &str,
    instance_ids: &[String],
) -> LoadResult<Vec<PredictionRecord>> {
    let is_json_document = path
        .extension()
        .map(|ext| ext == "json")
        .unwrap_or(false);

    let source = if is_json_document {
        let doc: Value = serde_json::from_str(content).map_err(|e| LoadError::Parse {
            path: path.to_path_buf(),
            line: None,
            message: e.to_string(),
        })?;
        PredictionSource::from_document(doc)?
    } else {
        let items = content
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(idx, line)| {
                serde_json::from_str::<Value>(line).map_err(|e| LoadError::Parse {
                    path: path.to_path_buf(),
                    line: Some(idx + 1),
                    message: e.to_string(),
                })
            })
            .collect::<LoadResult<Vec<_>>>()?;
        PredictionSource::Sequence(items)
    };

    source.into_records(&AllowList::new(instance_ids))
}

/// Compute a prediction's serialized size against `max_size_mb`.
pub fn check_prediction_size(record: &PredictionRecord, max_size_mb: f64) -> SizeCheck {
    let size_bytes = serde_json::to_vec(record).map(|b| b.len()).unwrap_or(0);
    let size_mb = size_bytes as f64 / BYTES_PER_MB;
    SizeCheck {
        within_limit: size_mb <= max_size_mb,
        size_mb,
    }
}

/// Enforce the single-model and unique-instance rules on a batch.
pub fn validate_batch(records: &[PredictionRecord]) -> LoadResult<()> {
    let models: BTreeSet<&str> = records
        .iter()
        .map(|r| r.model_name_or_path.as_str())
        .collect();
    if models.len() > 1 {
        return Err(LoadError::MultipleModels {
            models: models.into_iter().map(String::from).collect(),
        });
    }

    let mut seen = HashSet::with_capacity(records.len());
    let mut duplicates = BTreeSet::new();
    for record in records {
        if !seen.insert(record.instance_id.as_str()) {
            duplicates.insert(record.instance_id.clone());
        }
    }
    if !duplicates.is_empty() {
        return Err(LoadError::DuplicateInstanceIds {
            ids: duplicates.into_iter().collect(),
        });
    }

    Ok(())
}

/// Human-readable lines describing oversized predictions.
///
/// At most [`MAX_DETAILED_WARNINGS`] entries are listed; the rest are
/// counted. Returns an empty list when nothing was skipped.
pub fn format_size_warnings(warnings: &[SizeWarning], max_size_mb: f64) -> Vec<String> {
    if warnings.is_empty() {
        return Vec::new();
    }

    let mut lines = vec![format!(
        "Warning: {} predictions exceed {}MB size limit and will be skipped:",
        warnings.len(),
        max_size_mb
    )];
    for w in warnings.iter().take(MAX_DETAILED_WARNINGS) {
        lines.push(format!(
            "  - {}: {:.2}MB (patch: {} chars)",
            w.instance_id,
            w.size_mb,
            group_thousands(w.patch_length)
        ));
    }
    if warnings.len() > MAX_DETAILED_WARNINGS {
        lines.push(format!(
            "  ... and {} more",
            warnings.len() - MAX_DETAILED_WARNINGS
        ));
    }
    lines.push(format!(
        "  Set {} environment variable to increase limit",
        crate::config::ENV_MAX_PREDICTION_SIZE_MB
    ));
    lines
}

fn group_thousands(n: usize) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Reads, filters, validates and size-checks prediction files.
#[derive(Debug, Clone)]
pub struct PredictionLoader {
    max_size_mb: f64,
}

impl PredictionLoader {
    pub fn new(max_size_mb: f64) -> Self {
        Self { max_size_mb }
    }

    pub fn from_config(config: &SubmitConfig) -> Self {
        Self::new(config.max_prediction_size_mb)
    }

    pub fn max_size_mb(&self) -> f64 {
        self.max_size_mb
    }

    /// Load predictions from `path`.
    ///
    /// A non-empty `instance_ids` restricts the result to those instances.
    /// Validation runs after filtering. Oversized predictions are excluded
    /// from `records` and listed in `oversized`.
    pub fn load(&self, path: &Path, instance_ids: &[String]) -> LoadResult<LoadedPredictions> {
        let records = read_allowed_predictions(path, instance_ids)?;
        debug!(path = %path.display(), count = records.len(), "parsed predictions");
        self.process(records, instance_ids)
    }

    /// Filter, validate and size-check already parsed records.
    pub fn process(
        &self,
        records: Vec<PredictionRecord>,
        instance_ids: &[String],
    ) -> LoadResult<LoadedPredictions> {
        let allowed = AllowList::new(instance_ids);
        let records: Vec<PredictionRecord> = records
            .into_iter()
            .filter(|r| allowed.permits(&r.instance_id))
            .collect();

        validate_batch(&records)?;

        let mut loaded = LoadedPredictions::default();
        for record in records {
            let check = check_prediction_size(&record, self.max_size_mb);
            if check.within_limit {
                loaded.records.push(record);
            } else {
                debug!(
                    instance_id = %record.instance_id,
                    size_mb = check.size_mb,
                    limit_mb = self.max_size_mb,
                    "prediction exceeds size limit, skipping"
                );
                loaded.oversized.push(SizeWarning {
                    patch_length: record.model_patch.chars().count(),
                    instance_id: record.instance_id,
                    size_mb: check.size_mb,
                });
            }
        }
        Ok(loaded)
    }
}

impl Default for PredictionLoader {
    fn default() -> Self {
        Self::from_config(&SubmitConfig::default())
    }
}
