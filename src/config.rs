use anyhow::{Context, Result};
use clap::Parser;
use std::{env, path::PathBuf, str::FromStr, time::Duration};

use crate::services::image_transformer::DEFAULT_THUMBNAIL_WIDTH;

/// Centralized application configuration.
/// Combines environment variables and CLI arguments.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// Staging directory for downloaded originals and generated thumbnails.
    pub temp_dir: PathBuf,
    pub thumbnail_width: u32,
    pub request_timeout_secs: u64,
    /// `user:password` expected in the webhook's basic-auth header.
    pub webhook_auth: Option<String>,
    pub strict_container_create: bool,
}

/// Command-line + environment configuration.
#[derive(Parser, Debug)]
#[command(author, version, about = "Thumbnail generator for Swift object-store uploads")]
pub struct Args {
    /// Host to bind to (overrides THUMBNAILER_HOST)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to (overrides THUMBNAILER_PORT)
    #[arg(long)]
    pub port: Option<u16>,

    /// Temporary directory for staged files (overrides THUMBNAILER_TEMP_DIR)
    #[arg(long)]
    pub temp_dir: Option<PathBuf>,

    /// Maximum thumbnail width in pixels (overrides THUMBNAILER_THUMBNAIL_WIDTH)
    #[arg(long)]
    pub thumbnail_width: Option<u32>,

    /// Per-request timeout in seconds for object-store calls
    /// (overrides THUMBNAILER_REQUEST_TIMEOUT_SECS)
    #[arg(long)]
    pub request_timeout_secs: Option<u64>,

    /// Basic-auth credentials `user:password` required from the webhook
    /// (overrides THUMBNAILER_WEBHOOK_AUTH)
    #[arg(long)]
    pub webhook_auth: Option<String>,

    /// Fail when container creation answers anything but 201/202
    #[arg(long)]
    pub strict_container_create: bool,

    /// Run a single pipeline for the payload in FILE (`-` for stdin) and exit
    #[arg(long, value_name = "FILE")]
    pub invoke: Option<String>,
}

impl AppConfig {
    /// Parse environment variables + CLI args into AppConfig and the
    /// optional one-shot payload source.
    pub fn from_env_and_args() -> Result<(Self, Option<String>)> {
        Self::from_args(Args::parse())
    }

    pub fn from_args(args: Args) -> Result<(Self, Option<String>)> {
        // --- Environment fallback ---
        let env_host = env::var("THUMBNAILER_HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let env_port = env_or("THUMBNAILER_PORT", 3000u16)?;
        let env_temp = env::var("THUMBNAILER_TEMP_DIR").unwrap_or_else(|_| "/tmp".into());
        let env_width = env_or("THUMBNAILER_THUMBNAIL_WIDTH", DEFAULT_THUMBNAIL_WIDTH)?;
        let env_timeout = env_or("THUMBNAILER_REQUEST_TIMEOUT_SECS", 30u64)?;
        let env_auth = env::var("THUMBNAILER_WEBHOOK_AUTH").ok();
        let env_strict = env_or("THUMBNAILER_STRICT_CONTAINER_CREATE", false)?;

        // --- Merge ---
        let cfg = Self {
            host: args.host.unwrap_or(env_host),
            port: args.port.unwrap_or(env_port),
            temp_dir: args.temp_dir.unwrap_or_else(|| PathBuf::from(env_temp)),
            thumbnail_width: args.thumbnail_width.unwrap_or(env_width),
            request_timeout_secs: args.request_timeout_secs.unwrap_or(env_timeout),
            webhook_auth: args.webhook_auth.or(env_auth).filter(|s| !s.is_empty()),
            strict_container_create: args.strict_container_create || env_strict,
        };

        if cfg.thumbnail_width == 0 {
            anyhow::bail!("thumbnail width must be at least 1 pixel");
        }
        if cfg.request_timeout_secs == 0 {
            anyhow::bail!("request timeout must be at least 1 second");
        }

        Ok((cfg, args.invoke))
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn env_or<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(value) => value
            .parse::<T>()
            .with_context(|| format!("parsing {} value `{}`", name, value)),
        Err(env::VarError::NotPresent) => Ok(default),
        Err(err) => Err(err).with_context(|| format!("reading {}", name)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_arguments_override_environment() {
        let args = Args::try_parse_from([
            "swift-thumbnailer",
            "--host",
            "127.0.0.1",
            "--port",
            "8081",
            "--temp-dir",
            "/var/tmp/thumbs",
            "--thumbnail-width",
            "150",
            "--request-timeout-secs",
            "5",
            "--webhook-auth",
            "swift:secret",
            "--strict-container-create",
            "--invoke",
            "-",
        ])
        .unwrap();

        let (cfg, invoke) = AppConfig::from_args(args).unwrap();

        assert_eq!(cfg.addr(), "127.0.0.1:8081");
        assert_eq!(cfg.temp_dir, PathBuf::from("/var/tmp/thumbs"));
        assert_eq!(cfg.thumbnail_width, 150);
        assert_eq!(cfg.request_timeout(), Duration::from_secs(5));
        assert_eq!(cfg.webhook_auth.as_deref(), Some("swift:secret"));
        assert!(cfg.strict_container_create);
        assert_eq!(invoke.as_deref(), Some("-"));
    }

    #[test]
    fn zero_width_is_rejected() {
        let args =
            Args::try_parse_from(["swift-thumbnailer", "--thumbnail-width", "0"]).unwrap();
        assert!(AppConfig::from_args(args).is_err());
    }
}
