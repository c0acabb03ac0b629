use anyhow::{Context, Result};
use std::{io::ErrorKind, process::ExitCode};
use swift_thumbnailer::{
    build_router, config::AppConfig, handlers::action_handlers::invoke,
    models::event::TriggerPayload, state::AppState,
};
use tokio::{fs, io::AsyncReadExt, net::TcpListener};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // --- Logging setup ---
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // --- Parse config + invoke flag ---
    let (cfg, invoke_source) = AppConfig::from_env_and_args()?;

    tracing::info!("Starting swift-thumbnailer with config: {:?}", redacted(&cfg));

    // --- Ensure temp directory exists ---
    if !cfg.temp_dir.exists() {
        fs::create_dir_all(&cfg.temp_dir)
            .await
            .with_context(|| format!("creating temp directory {}", cfg.temp_dir.display()))?;
        tracing::info!("Created temp directory at {}", cfg.temp_dir.display());
    }

    let state = AppState::from_config(&cfg)?;

    // --- One-shot mode ---
    if let Some(source) = invoke_source {
        return run_once(&state, &source).await;
    }

    // --- Build router ---
    let app = build_router(state);

    // --- Start server ---
    let addr = cfg.addr();
    let listener = match TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(err)
            if err.kind() == ErrorKind::PermissionDenied
                && matches!(cfg.host.as_str(), "0.0.0.0" | "::") =>
        {
            let fallback_addr = format!("127.0.0.1:{}", cfg.port);
            tracing::warn!(
                "Permission denied binding to {} ({}). Falling back to {}",
                addr,
                err,
                fallback_addr
            );
            TcpListener::bind(&fallback_addr).await?
        }
        Err(err) => return Err(err.into()),
    };

    tracing::info!("Server listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(ExitCode::SUCCESS)
}

/// Run one pipeline for the payload read from `source` (`-` is stdin) and
/// print the outcome as JSON.
async fn run_once(state: &AppState, source: &str) -> Result<ExitCode> {
    let raw = if source == "-" {
        let mut buf = String::new();
        tokio::io::stdin()
            .read_to_string(&mut buf)
            .await
            .context("reading payload from stdin")?;
        buf
    } else {
        fs::read_to_string(source)
            .await
            .with_context(|| format!("reading payload file {}", source))?
    };
    let payload: TriggerPayload =
        serde_json::from_str(&raw).context("payload is not a swiftObj notification")?;

    match invoke(&state.pipeline, &payload).await {
        Ok(response) => {
            println!("{}", serde_json::to_string_pretty(&response)?);
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => {
            eprintln!("{}", serde_json::to_string_pretty(&err.body())?);
            Ok(ExitCode::FAILURE)
        }
    }
}

fn redacted(cfg: &AppConfig) -> AppConfig {
    let mut shown = cfg.clone();
    if shown.webhook_auth.is_some() {
        shown.webhook_auth = Some("<redacted>".into());
    }
    shown
}
