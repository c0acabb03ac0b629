//! src/services/object_store_client.rs
//!
//! SwiftClient: authenticated GET/PUT against an OpenStack Swift style
//! object store. Downloads stream straight to disk beneath `temp_root`;
//! uploads stream from disk with an explicit `Content-Length` and an MD5
//! `ETag` so the store can verify what it received.

use crate::{
    errors::PipelineError,
    models::{
        artifact::{ArtifactKind, LocalArtifact},
        container::DestinationContainer,
        event::SourceReference,
    },
};
use bytes::Bytes;
use futures::StreamExt;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use reqwest::{
    Body, Client, Response, StatusCode,
    header::{CONTENT_LENGTH, ETAG},
};
use std::{
    io::{self, ErrorKind},
    path::{Path, PathBuf},
    time::Duration,
};
use tokio::{
    fs::{self, File},
    io::AsyncWriteExt,
};
use tokio_util::io::ReaderStream;
use tracing::{debug, info, warn};

pub const AUTH_TOKEN_HEADER: &str = "X-Auth-Token";

/// Characters that must be percent-encoded inside a single path segment.
const SEGMENT_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

#[derive(Clone, Debug)]
pub struct SwiftClient {
    http: Client,
    /// Directory that receives downloaded source objects.
    temp_root: PathBuf,
}

impl SwiftClient {
    /// Build a client whose every request is bounded by `timeout`.
    pub fn new(temp_root: impl Into<PathBuf>, timeout: Duration) -> reqwest::Result<Self> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            temp_root: temp_root.into(),
        })
    }

    pub fn temp_root(&self) -> &Path {
        &self.temp_root
    }

    /// Download `ref.container/ref.object` to `<temp_root>/<basename(object)>`.
    ///
    /// Nothing is written before the store answers 2xx, and a body that fails
    /// mid-stream is removed before the error is returned.
    pub async fn fetch(&self, reference: &SourceReference) -> Result<LocalArtifact, PipelineError> {
        let file_name = local_file_name(reference.object_name())?;
        let destination = self.temp_root.join(file_name);
        let url = object_url(
            reference.endpoint_base(),
            reference.container_name(),
            reference.object_name(),
        );

        debug!(%url, path = %destination.display(), "fetching source object");

        let response = self
            .http
            .get(&url)
            .header(AUTH_TOKEN_HEADER, reference.auth_token())
            .send()
            .await
            .map_err(|err| PipelineError::Transfer(format!("GET {url} failed: {err}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PipelineError::Transfer(format!(
                "GET {url} returned {status}"
            )));
        }

        let size_bytes = match stream_to_file(response, &destination).await {
            Ok(size) => size,
            Err(err) => {
                discard_partial(&destination).await;
                return Err(PipelineError::Transfer(format!(
                    "downloading {url} to {} failed: {err}",
                    destination.display()
                )));
            }
        };

        info!(
            path = %destination.display(),
            size_bytes,
            "object downloaded"
        );
        Ok(LocalArtifact::new(destination, ArtifactKind::Source))
    }

    /// Upload `local` as `<container>/<basename(local)>`.
    ///
    /// Any 2xx counts as stored; the exact code is only logged.
    pub async fn store(
        &self,
        local: &LocalArtifact,
        container: &DestinationContainer,
        reference: &SourceReference,
    ) -> Result<(), PipelineError> {
        let object = local.file_name().ok_or_else(|| {
            PipelineError::Transfer(format!(
                "local file {} has no usable name",
                local.path().display()
            ))
        })?;
        let url = object_url(reference.endpoint_base(), &container.name, object);
        let local_err = |err: io::Error| {
            PipelineError::Transfer(format!("reading {} failed: {err}", local.path().display()))
        };

        let size_bytes = fs::metadata(local.path()).await.map_err(local_err)?.len();
        let etag = file_md5(local.path()).await.map_err(local_err)?;
        let file = File::open(local.path()).await.map_err(local_err)?;

        debug!(%url, size_bytes, %etag, "storing object");

        let response = self
            .http
            .put(&url)
            .header(AUTH_TOKEN_HEADER, reference.auth_token())
            .header(CONTENT_LENGTH, size_bytes)
            .header(ETAG, etag.as_str())
            .body(Body::wrap_stream(ReaderStream::new(file)))
            .send()
            .await
            .map_err(|err| PipelineError::Transfer(format!("PUT {url} failed: {err}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PipelineError::Transfer(format!(
                "PUT {url} returned {status}"
            )));
        }

        info!(
            container = %container.name,
            object,
            status = status.as_u16(),
            "object upload successful"
        );
        Ok(())
    }

    /// Issue the create-if-absent `PUT <endpoint>/<container>` and hand back
    /// the raw status; interpreting it is the provisioner's job.
    pub async fn create_container(
        &self,
        reference: &SourceReference,
        container: &str,
    ) -> reqwest::Result<StatusCode> {
        let url = container_url(reference.endpoint_base(), container);
        debug!(%url, "creating container");
        let response = self
            .http
            .put(&url)
            .header(AUTH_TOKEN_HEADER, reference.auth_token())
            .body(Bytes::new())
            .send()
            .await?;
        Ok(response.status())
    }
}

/// Base name of an object, validated for use as a local file name.
///
/// Swift object names may contain `/` (pseudo-directories); only the last
/// segment is used locally.
pub fn local_file_name(object_name: &str) -> Result<&str, PipelineError> {
    let base = object_name.rsplit('/').next().unwrap_or(object_name);
    if base.is_empty() || base == "." || base == ".." {
        return Err(PipelineError::InvalidObjectName(object_name.to_string()));
    }
    if base
        .bytes()
        .any(|b| b.is_ascii_control() || b == b'\\' || b == b'\0')
    {
        return Err(PipelineError::InvalidObjectName(object_name.to_string()));
    }
    Ok(base)
}

fn encode_segment(segment: &str) -> String {
    utf8_percent_encode(segment, SEGMENT_SET).to_string()
}

fn container_url(endpoint: &str, container: &str) -> String {
    format!("{}/{}", endpoint, encode_segment(container))
}

/// `<endpoint>/<container>/<object>`, keeping `/` inside the object name.
fn object_url(endpoint: &str, container: &str, object: &str) -> String {
    let object = object
        .split('/')
        .map(encode_segment)
        .collect::<Vec<_>>()
        .join("/");
    format!("{}/{}", container_url(endpoint, container), object)
}

async fn stream_to_file(response: Response, destination: &Path) -> io::Result<u64> {
    let mut file = File::create(destination).await?;
    let mut stream = response.bytes_stream();
    let mut size_bytes: u64 = 0;
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(io::Error::other)?;
        size_bytes += chunk.len() as u64;
        file.write_all(&chunk).await?;
    }
    file.flush().await?;
    file.sync_all().await?;
    Ok(size_bytes)
}

async fn discard_partial(path: &Path) {
    match fs::remove_file(path).await {
        Ok(_) => debug!("removed partial download {}", path.display()),
        Err(err) if err.kind() == ErrorKind::NotFound => {}
        Err(err) => warn!(
            "failed to remove partial download {}: {}",
            path.display(),
            err
        ),
    }
}

async fn file_md5(path: &Path) -> io::Result<String> {
    let mut stream = ReaderStream::new(File::open(path).await?);
    let mut digest = md5::Context::new();
    while let Some(chunk) = stream.next().await {
        digest.consume(&chunk?);
    }
    Ok(format!("{:x}", digest.compute()))
}
