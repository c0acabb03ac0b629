use crate::{config::AppConfig, services::pipeline::ThumbnailPipeline};
use anyhow::Result;
use std::{path::PathBuf, sync::Arc};

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: ThumbnailPipeline,
    pub temp_dir: PathBuf,
    /// Expected `user:password` of the webhook caller, if any.
    pub webhook_auth: Option<Arc<str>>,
}

impl AppState {
    pub fn new(pipeline: ThumbnailPipeline, temp_dir: impl Into<PathBuf>) -> Self {
        Self {
            pipeline,
            temp_dir: temp_dir.into(),
            webhook_auth: None,
        }
    }

    pub fn with_webhook_auth(mut self, credentials: Option<String>) -> Self {
        self.webhook_auth = credentials.map(Arc::from);
        self
    }

    pub fn from_config(cfg: &AppConfig) -> Result<Self> {
        let pipeline = ThumbnailPipeline::from_config(cfg)?;
        Ok(Self::new(pipeline, cfg.temp_dir.clone()).with_webhook_auth(cfg.webhook_auth.clone()))
    }
}
