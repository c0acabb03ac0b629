//! Webhook entry point: the object store posts a `swiftObj` notification
//! after every successful mutation, and the pipeline answers in the
//! `{ "result": { ... } }` shape.

use crate::{
    errors::AppError,
    models::{event::TriggerPayload, result::ActionResponse},
    services::pipeline::ThumbnailPipeline,
    state::AppState,
};
use axum::{
    Json,
    extract::State,
    http::{HeaderMap, header},
};
use base64::{Engine as _, engine::general_purpose};
use tracing::warn;

/// Run one pipeline for `payload` and map the outcome to the caller shape.
///
/// Shared by the HTTP handler and the one-shot CLI mode.
pub async fn invoke(
    pipeline: &ThumbnailPipeline,
    payload: &TriggerPayload,
) -> Result<ActionResponse, AppError> {
    pipeline
        .run(&payload.swift_obj)
        .await
        .into_response()
        .map_err(AppError::from)
}

/// `POST /thumbnail`
pub async fn thumbnail_action(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<TriggerPayload>,
) -> Result<Json<ActionResponse>, AppError> {
    if let Some(expected) = state.webhook_auth.as_deref() {
        if !basic_auth_matches(&headers, expected) {
            warn!("rejecting webhook call with missing or wrong credentials");
            return Err(AppError::unauthorized("invalid webhook credentials"));
        }
    }

    let response = invoke(&state.pipeline, &payload).await?;
    Ok(Json(response))
}

/// True when `Authorization: Basic <base64(expected)>` is present.
fn basic_auth_matches(headers: &HeaderMap, expected: &str) -> bool {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Basic "))
        .and_then(|encoded| general_purpose::STANDARD.decode(encoded.trim()).ok())
        .is_some_and(|decoded| decoded == expected.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn with_auth(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn basic_auth_is_checked_against_credentials() {
        let good = format!("Basic {}", general_purpose::STANDARD.encode("swift:secret"));
        let wrong = format!("Basic {}", general_purpose::STANDARD.encode("swift:nope"));

        assert!(basic_auth_matches(&with_auth(&good), "swift:secret"));
        assert!(!basic_auth_matches(&with_auth(&wrong), "swift:secret"));
        assert!(!basic_auth_matches(&with_auth("Bearer abc"), "swift:secret"));
        assert!(!basic_auth_matches(&HeaderMap::new(), "swift:secret"));
    }
}
