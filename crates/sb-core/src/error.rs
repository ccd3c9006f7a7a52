//! Error types for loading and submitting predictions.

use std::path::PathBuf;

/// Errors raised while reading and validating a predictions file.
///
/// Every variant is fatal to the run and is raised before any request is sent.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// The predictions file could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file (or one of its lines) is not valid JSON.
    #[error(
        "invalid JSON in {}{}: {message}",
        path.display(),
        line.map(|l| format!(" (line {l})")).unwrap_or_default()
    )]
    Parse {
        path: PathBuf,
        line: Option<usize>,
        message: String,
    },

    /// The document is neither a list of predictions nor a mapping of them.
    #[error("unsupported predictions layout: {message}")]
    InvalidShape { message: String },

    /// A prediction entry lacks a required field.
    #[error("prediction {entry} is missing required field '{field}'")]
    MissingField { entry: String, field: &'static str },

    /// A prediction field has the wrong JSON type.
    #[error("prediction {entry} has invalid field '{field}': expected a string")]
    InvalidField { entry: String, field: &'static str },

    /// More than one model appears in the batch.
    #[error("all predictions must be for the same model, found: {}", models.join(", "))]
    MultipleModels { models: Vec<String> },

    /// Instance ids repeat after filtering.
    #[error("duplicate instance IDs found in predictions - please remove duplicates before submitting: {}", ids.join(", "))]
    DuplicateInstanceIds { ids: Vec<String> },
}

impl LoadError {
    /// Exit code for CLI.
    pub fn exit_code(&self) -> i32 {
        2
    }

    /// Whether the error is a batch validation failure rather than an I/O or
    /// format problem.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::MultipleModels { .. } | Self::DuplicateInstanceIds { .. }
        )
    }
}

/// Per-prediction submission failures.
///
/// These never abort sibling submissions; each one is reported against the
/// instance it belongs to.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ServiceError {
    /// The service answered with a non-conforming response.
    #[error("{instance_id}: rejected by service (HTTP {status}): {message}")]
    Rejected {
        instance_id: String,
        status: u16,
        message: String,
    },

    /// The request could not be completed.
    #[error("{instance_id}: network error: {message}")]
    Network {
        instance_id: String,
        message: String,
    },

    /// The service accepted the request but the body could not be understood.
    #[error("{instance_id}: invalid response: {message}")]
    InvalidResponse {
        instance_id: String,
        message: String,
    },

    /// The worker running the submission did not finish.
    #[error("{instance_id}: submission task failed: {message}")]
    Task {
        instance_id: String,
        message: String,
    },

    /// The HTTP client could not be built.
    #[error("client error: {message}")]
    Client { message: String },
}

impl ServiceError {
    /// Instance the failure belongs to, if any.
    pub fn instance_id(&self) -> Option<&str> {
        match self {
            Self::Rejected { instance_id, .. }
            | Self::Network { instance_id, .. }
            | Self::InvalidResponse { instance_id, .. }
            | Self::Task { instance_id, .. } => Some(instance_id),
            Self::Client { .. } => None,
        }
    }

    /// Exit code for CLI.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Client { .. } => 2,
            _ => 1,
        }
    }

    pub(crate) fn network(instance_id: &str, err: reqwest::Error) -> Self {
        Self::Network {
            instance_id: instance_id.to_string(),
            message: err.to_string(),
        }
    }
}

/// Result type for loader operations.
pub type LoadResult<T> = Result<T, LoadError>;

/// Result type for a single submission.
pub type ServiceResult<T> = Result<T, ServiceError>;
