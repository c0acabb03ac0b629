use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::{fmt, path::PathBuf};
use thiserror::Error;

use crate::models::result::PipelineFailure;

/// Failure of one pipeline stage. Exactly one of these is reported as the
/// cause of a failed run.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PipelineError {
    #[error("transfer failed: {0}")]
    Transfer(String),
    #[error("container provisioning failed: {0}")]
    Provisioning(String),
    #[error("thumbnail generation failed: {0}")]
    Transform(String),
    /// Part of the kind taxonomy only. A run never ends with this as its
    /// cause; cleanup trouble travels beside the cause as
    /// `PipelineFailure::cleanup` or `CreatedThumbnail::cleanup`.
    #[error(transparent)]
    Cleanup(CleanupError),
    #[error("unsupported operation `{0}`")]
    InvalidOperation(String),
    #[error("invalid object name `{0}`")]
    InvalidObjectName(String),
}

impl PipelineError {
    /// Stable name of the error kind, as exposed to callers.
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::Transfer(_) => "TransferError",
            PipelineError::Provisioning(_) => "ProvisioningError",
            PipelineError::Transform(_) => "TransformError",
            PipelineError::Cleanup(_) => "CleanupError",
            PipelineError::InvalidOperation(_) => "InvalidOperationError",
            PipelineError::InvalidObjectName(_) => "InvalidObjectNameError",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            PipelineError::InvalidOperation(_) | PipelineError::InvalidObjectName(_) => {
                StatusCode::BAD_REQUEST
            }
            PipelineError::Transfer(_) | PipelineError::Provisioning(_) => StatusCode::BAD_GATEWAY,
            PipelineError::Transform(_) => StatusCode::UNPROCESSABLE_ENTITY,
            PipelineError::Cleanup(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// A local file that could not be removed during cleanup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanupFailure {
    pub path: PathBuf,
    pub reason: String,
}

/// One or more temporary files survived a release attempt.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error(
    "failed to remove {count} temporary file(s): {summary}",
    count = .failures.len(),
    summary = summarize(.failures)
)]
pub struct CleanupError {
    pub failures: Vec<CleanupFailure>,
}

impl CleanupError {
    pub fn paths(&self) -> impl Iterator<Item = &PathBuf> {
        self.failures.iter().map(|f| &f.path)
    }
}

fn summarize(failures: &[CleanupFailure]) -> String {
    failures
        .iter()
        .map(|f| format!("{} ({})", f.path.display(), f.reason))
        .collect::<Vec<_>>()
        .join(", ")
}

/// A lightweight wrapper for general errors that keeps the message local.
#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
    pub kind: Option<&'static str>,
    pub cleanup: Option<String>,
}

impl AppError {
    /// Create a new AppError with a specific status and message.
    pub fn new(status: StatusCode, msg: impl Into<String>) -> Self {
        Self {
            status,
            message: msg.into(),
            kind: None,
            cleanup: None,
        }
    }

    /// Shortcut for a 500 Internal Server Error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, msg)
    }

    /// Shortcut for 401 Unauthorized
    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, msg)
    }

    pub fn body(&self) -> serde_json::Value {
        let mut body = json!({
            "error": self.message,
            "status": self.status.as_u16()
        });
        if let Some(kind) = self.kind {
            body["kind"] = json!(kind);
        }
        if let Some(cleanup) = &self.cleanup {
            body["cleanup"] = json!(cleanup);
        }
        body
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = Json(self.body());
        (self.status, body).into_response()
    }
}

impl From<PipelineFailure> for AppError {
    fn from(failure: PipelineFailure) -> Self {
        Self {
            status: failure.error.status_code(),
            message: failure.error.to_string(),
            kind: Some(failure.error.kind()),
            cleanup: failure.cleanup.map(|err| err.to_string()),
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cleanup_error_lists_every_path() {
        let err = CleanupError {
            failures: vec![
                CleanupFailure {
                    path: PathBuf::from("/tmp/a.jpg"),
                    reason: "permission denied".into(),
                },
                CleanupFailure {
                    path: PathBuf::from("/tmp/a_thumbnail.jpg"),
                    reason: "is a directory".into(),
                },
            ],
        };
        let msg = err.to_string();
        assert!(msg.starts_with("failed to remove 2 temporary file(s)"));
        assert!(msg.contains("/tmp/a.jpg (permission denied)"));
        assert!(msg.contains("/tmp/a_thumbnail.jpg (is a directory)"));
    }

    #[test]
    fn kinds_map_to_http_status() {
        let cases = [
            (PipelineError::Transfer("x".into()), StatusCode::BAD_GATEWAY),
            (PipelineError::Provisioning("x".into()), StatusCode::BAD_GATEWAY),
            (
                PipelineError::Transform("x".into()),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                PipelineError::InvalidOperation("POST".into()),
                StatusCode::BAD_REQUEST,
            ),
            (
                PipelineError::Cleanup(CleanupError { failures: vec![] }),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(err.status_code(), status, "{}", err.kind());
        }
    }

    #[test]
    fn app_error_body_carries_kind_and_cleanup() {
        let failure = PipelineFailure {
            error: PipelineError::Transfer("GET http://store/images/a.jpg returned 404".into()),
            cleanup: Some(CleanupError {
                failures: vec![CleanupFailure {
                    path: PathBuf::from("/tmp/a.jpg"),
                    reason: "busy".into(),
                }],
            }),
            failed_in: crate::services::pipeline::PipelineState::Fetched,
        };
        let err = AppError::from(failure);
        let body = err.body();
        assert_eq!(body["kind"], "TransferError");
        assert_eq!(body["status"], 502);
        assert!(body["cleanup"].as_str().unwrap().contains("/tmp/a.jpg"));
    }
}
