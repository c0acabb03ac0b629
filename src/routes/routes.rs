//! Defines the HTTP surface of the thumbnailer.
//!
//! - `POST /thumbnail`: webhook target; body is the `swiftObj` notification
//! - `GET  /healthz`: liveness
//! - `GET  /readyz`: readiness (temp directory probe)

use crate::{
    handlers::{
        action_handlers::thumbnail_action,
        health_handlers::{healthz, readyz},
    },
    state::AppState,
};
use axum::{
    Router,
    routing::{get, post},
};

/// Build the router; the caller attaches `AppState` with `.with_state`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/thumbnail", post(thumbnail_action))
}
