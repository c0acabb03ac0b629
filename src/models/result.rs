//! Outcome of a pipeline run and its wire representation.

use crate::errors::{CleanupError, PipelineError};
use crate::services::pipeline::PipelineState;
use serde::{Deserialize, Serialize};

pub const SUCCESS_MESSAGE: &str = "Thumbnail created successfully";
pub const NO_ACTION_MESSAGE: &str = "No action taken, image was deleted";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStatus {
    Success,
    NoAction,
    Failure,
}

/// A thumbnail that was stored remotely.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedThumbnail {
    /// `<container>/<object>` of the original.
    pub source: String,
    /// `<container>_thumbnails/<name>_thumbnail<ext>`.
    pub thumbnail: String,
    /// Set when the transfer stages succeeded but local files were left behind.
    pub cleanup: Option<CleanupError>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineFailure {
    /// The originating stage error.
    pub error: PipelineError,
    /// Cleanup attempted after the failure, if it also failed.
    pub cleanup: Option<CleanupError>,
    /// Last state reached before the failing stage.
    pub failed_in: PipelineState,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineResult {
    Success(CreatedThumbnail),
    NoAction,
    Failure(PipelineFailure),
}

impl PipelineResult {
    pub fn status(&self) -> PipelineStatus {
        match self {
            PipelineResult::Success(_) => PipelineStatus::Success,
            PipelineResult::NoAction => PipelineStatus::NoAction,
            PipelineResult::Failure(_) => PipelineStatus::Failure,
        }
    }

    /// Split into the caller-facing body or the rejected failure.
    pub fn into_response(self) -> Result<ActionResponse, PipelineFailure> {
        match self {
            PipelineResult::Success(created) => Ok(ActionResponse {
                result: ActionResult {
                    success: SUCCESS_MESSAGE.to_string(),
                    source: Some(created.source),
                    thumbnail: Some(created.thumbnail),
                    cleanup_warning: created.cleanup.map(|err| err.to_string()),
                },
            }),
            PipelineResult::NoAction => Ok(ActionResponse {
                result: ActionResult {
                    success: NO_ACTION_MESSAGE.to_string(),
                    source: None,
                    thumbnail: None,
                    cleanup_warning: None,
                },
            }),
            PipelineResult::Failure(failure) => Err(failure),
        }
    }
}

/// `{ "result": { ... } }`
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ActionResponse {
    pub result: ActionResult,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ActionResult {
    pub success: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cleanup_warning: Option<String>,
}
