//! Error types surfaced across module boundaries.
//!
//! Internals use `anyhow` with context; the types here exist where a caller
//! needs to branch on the failure (job conflicts, translator failures) or
//! where an error crosses the HTTP boundary.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Failures of the translation job registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateError {
    #[error("Translation already in progress for locale '{0}'")]
    Conflict(String),

    #[error("No translation job for locale '{0}'")]
    NotFound(String),

    #[error("Translation for locale '{locale}' is not {expected}")]
    InvalidTransition {
        locale: String,
        expected: &'static str,
    },
}

/// Failures of one external translator invocation.
#[derive(Debug, Error)]
pub enum TranslatorError {
    #[error("Failed to spawn translator '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Translator I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Translator exited with {status}: {stderr}")]
    ExitStatus { status: String, stderr: String },

    #[error("Translator timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("Translator output is not a JSON array of strings: {0}")]
    MalformedOutput(String),

    #[error("Translator returned {actual} translations for a batch of {expected}")]
    CountMismatch { expected: usize, actual: usize },
}

impl TranslatorError {
    /// Spawn, pipe and exit-status failures are retried. Timeouts and bad output are not.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            TranslatorError::Spawn { .. } | TranslatorError::Io(_) | TranslatorError::ExitStatus { .. }
        )
    }
}

/// Error returned by HTTP handlers, rendered as `{ "error": message }`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<StateError> for ApiError {
    fn from(err: StateError) -> Self {
        match err {
            StateError::Conflict(_) => ApiError::Conflict(err.to_string()),
            StateError::NotFound(_) => ApiError::NotFound(err.to_string()),
            StateError::InvalidTransition { .. } => ApiError::BadRequest(err.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            ApiError::Internal(e) => {
                error!("Request failed: {:#}", e);
                format!("{:#}", e)
            }
            other => other.to_string(),
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}
