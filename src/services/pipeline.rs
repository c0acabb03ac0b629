//! ThumbnailPipeline: turns one object-store notification into a stored
//! thumbnail.
//!
//! A run walks `Start → Fetched → Thumbnailed → ContainerReady → Stored →
//! Cleaned`. The first failing stage moves it to `Failed`; nothing is
//! retried. A `DELETE` event ends in `NoAction` before any I/O, an unknown
//! method ends in `Failed` the same way.
//!
//! Local files are handed to a per-run `TempResourceManager` as soon as
//! they exist, so cleanup runs on every path that created something. A
//! cleanup failure is attached to the result and never replaces the error
//! that ended the run.

use crate::{
    config::AppConfig,
    errors::PipelineError,
    models::{
        event::{Operation, SourceReference, SwiftObject},
        result::{CreatedThumbnail, PipelineFailure, PipelineResult},
    },
    services::{
        container_provisioner::ContainerProvisioner, image_transformer::ImageTransformer,
        object_store_client::SwiftClient, temp_resources::TempResourceManager,
    },
};
use anyhow::{Context, Result};
use tracing::{Instrument, debug, error, info, info_span, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Start,
    Fetched,
    Thumbnailed,
    ContainerReady,
    Stored,
    Cleaned,
    NoAction,
    Failed,
}

/// Mutable bookkeeping of one CREATE run.
struct PipelineRun {
    state: PipelineState,
    temps: TempResourceManager,
}

impl PipelineRun {
    fn new() -> Self {
        Self {
            state: PipelineState::Start,
            temps: TempResourceManager::new(),
        }
    }

    fn transition(&mut self, next: PipelineState) {
        debug!(from = ?self.state, to = ?next, "pipeline state change");
        self.state = next;
    }
}

#[derive(Clone, Debug)]
pub struct ThumbnailPipeline {
    client: SwiftClient,
    provisioner: ContainerProvisioner,
    transformer: ImageTransformer,
}

impl ThumbnailPipeline {
    pub fn new(
        client: SwiftClient,
        provisioner: ContainerProvisioner,
        transformer: ImageTransformer,
    ) -> Self {
        Self {
            client,
            provisioner,
            transformer,
        }
    }

    /// Wire the stages from configuration.
    pub fn from_config(cfg: &AppConfig) -> Result<Self> {
        let client = SwiftClient::new(&cfg.temp_dir, cfg.request_timeout())
            .context("building object store HTTP client")?;
        let provisioner =
            ContainerProvisioner::new(client.clone()).strict(cfg.strict_container_create);
        let transformer = ImageTransformer::new(cfg.thumbnail_width);
        Ok(Self::new(client, provisioner, transformer))
    }

    /// Execute one run to a terminal state.
    pub async fn run(&self, event: &SwiftObject) -> PipelineResult {
        let span = info_span!(
            "thumbnail_run",
            run_id = %Uuid::new_v4(),
            method = %event.method,
            container = %event.container,
            object = %event.object
        );
        self.dispatch(event).instrument(span).await
    }

    async fn dispatch(&self, event: &SwiftObject) -> PipelineResult {
        let reference = match SourceReference::from_event(event) {
            Ok(reference) => reference,
            Err(error) => {
                warn!(%error, state = ?PipelineState::Failed, "rejecting event");
                return PipelineResult::Failure(PipelineFailure {
                    error,
                    cleanup: None,
                    failed_in: PipelineState::Start,
                });
            }
        };

        match reference.operation() {
            Operation::Delete => {
                info!(state = ?PipelineState::NoAction, "object was deleted; no action taken");
                PipelineResult::NoAction
            }
            Operation::Create => self.create_thumbnail(&reference).await,
        }
    }

    async fn create_thumbnail(&self, reference: &SourceReference) -> PipelineResult {
        let mut run = PipelineRun::new();

        match self.advance(reference, &mut run).await {
            Ok((source, thumbnail)) => {
                let cleanup = run.temps.release().await.err();
                run.transition(PipelineState::Cleaned);
                if let Some(err) = &cleanup {
                    warn!(error = %err, "thumbnail stored but temporary files remain");
                }
                info!(%source, %thumbnail, "thumbnail created successfully");
                PipelineResult::Success(CreatedThumbnail {
                    source,
                    thumbnail,
                    cleanup,
                })
            }
            Err(error) => {
                let failed_in = run.state;
                let cleanup = run.temps.release().await.err();
                run.transition(PipelineState::Failed);
                error!(
                    %error,
                    kind = error.kind(),
                    failed_in = ?failed_in,
                    cleanup_failed = cleanup.is_some(),
                    "thumbnail run failed"
                );
                PipelineResult::Failure(PipelineFailure {
                    error,
                    cleanup,
                    failed_in,
                })
            }
        }
    }

    /// Run the four transfer/transform stages, returning the remote source
    /// and thumbnail paths.
    async fn advance(
        &self,
        reference: &SourceReference,
        run: &mut PipelineRun,
    ) -> Result<(String, String), PipelineError> {
        let source = self.client.fetch(reference).await?;
        run.temps.track(source.clone());
        run.transition(PipelineState::Fetched);

        let thumbnail = self.transformer.resize(&source).await?;
        run.temps.track(thumbnail.clone());
        run.transition(PipelineState::Thumbnailed);

        let container = self.provisioner.ensure(reference).await?;
        run.transition(PipelineState::ContainerReady);

        self.client.store(&thumbnail, &container, reference).await?;
        run.transition(PipelineState::Stored);

        let thumbnail_name = thumbnail.file_name().unwrap_or_default();
        Ok((
            reference.source_path(),
            format!("{}/{}", container.name, thumbnail_name),
        ))
    }
}
