//! Thumbnail generator for Swift object-store uploads.
//!
//! An upload notification triggers a single pipeline run: fetch the
//! original, resize it, make sure `<container>_thumbnails` exists, store the
//! thumbnail there and remove the staged files.

pub mod config;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;

use axum::Router;

/// Router with state attached, ready to serve.
pub fn build_router(state: state::AppState) -> Router {
    routes::routes::routes().with_state(state)
}
