//! Client for the remote test service.
//!
//! [`RemoteTestClient`] is the seam between the step logic and the network:
//! the runner and the poll loop only talk to the trait, and
//! [`HttpTestClient`] implements it over HTTP with `reqwest`. Every call is
//! a single request awaited to completion; there are no retries.
//!
//! # Example
//!
//! ```no_run
//! use vdtest_core::client::{HttpTestClient, RemoteTestClient};
//! use vdtest_core::config::ApiEndpoint;
//!
//! #[tokio::main]
//! async fn main() {
//!     let client = HttpTestClient::new(ApiEndpoint {
//!         base_url: "https://vdt.example.com/test".to_string(),
//!         app_slug: "app".to_string(),
//!         build_slug: "build".to_string(),
//!         api_token: "secret".to_string(),
//!     })
//!     .unwrap();
//!
//!     let listing = client.list_steps().await.unwrap();
//!     println!("{} steps", listing.steps.len());
//! }
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use reqwest::header::CONTENT_LENGTH;
use reqwest::{Body, Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio_util::io::ReaderStream;
use tracing::{debug, debug_span, Instrument};

use crate::config::ApiEndpoint;
use crate::matrix::TestMatrix;
use crate::step::ListStepsResponse;

/// Longest response body excerpt kept in a decode error.
const BODY_EXCERPT_LEN: usize = 512;

/// Transport and protocol failures talking to the test service.
#[derive(Error, Debug)]
pub enum ClientError {
    /// The request could not be built, sent, or its body read.
    #[error("Failed to {context}: {source}")]
    Transport {
        context: &'static str,
        #[source]
        source: reqwest::Error,
    },

    /// The service answered with a status other than 200.
    #[error("Failed to {context}, status code: {status}")]
    Status { context: &'static str, status: u16 },

    /// The response body was not the expected JSON.
    #[error("Failed to {context}, invalid response body: {source}, body: {body}")]
    Decode {
        context: &'static str,
        #[source]
        source: serde_json::Error,
        body: String,
    },

    /// A local file could not be read or written.
    #[error("Failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The asset listing contained a name that would escape the download directory.
    #[error("Refusing to download asset with unsafe name: {0}")]
    InvalidAssetName(String),
}

impl ClientError {
    /// Wraps a `reqwest` error without its URL, which carries the API token.
    pub(crate) fn transport(context: &'static str, source: reqwest::Error) -> Self {
        ClientError::Transport {
            context,
            source: source.without_url(),
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ClientError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Signed URLs returned by the upload-URL endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadUrls {
    #[serde(default)]
    pub app_url: String,
    #[serde(default)]
    pub test_app_url: String,
}

/// Operations the step performs against the test service.
#[async_trait]
pub trait RemoteTestClient: Send + Sync {
    /// Requests signed upload URLs for the app and test packages.
    async fn upload_urls(&self) -> Result<UploadUrls, ClientError>;

    /// Uploads a local file to a signed URL.
    async fn upload_file(&self, url: &str, path: &Path) -> Result<(), ClientError>;

    /// Submits the test matrix, starting the remote run.
    async fn start_test(&self, matrix: &TestMatrix) -> Result<(), ClientError>;

    /// Fetches the current state of every step of the run.
    async fn list_steps(&self) -> Result<ListStepsResponse, ClientError>;

    /// Lists produced assets as file name to download URL.
    async fn list_assets(&self) -> Result<BTreeMap<String, String>, ClientError>;

    /// Downloads a URL into a local file, creating or truncating it.
    async fn download_file(&self, url: &str, dest: &Path) -> Result<(), ClientError>;
}

/// [`RemoteTestClient`] over HTTP.
pub struct HttpTestClient {
    client: Client,
    endpoint: ApiEndpoint,
}

impl HttpTestClient {
    /// Creates a client with transport-default timeouts.
    pub fn new(endpoint: ApiEndpoint) -> Result<Self, ClientError> {
        let client = Client::builder()
            .user_agent(concat!("vdtest/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|source| ClientError::transport("create http client", source))?;
        Ok(Self { client, endpoint })
    }
}

async fn send(
    request: reqwest::RequestBuilder,
    context: &'static str,
) -> Result<Response, ClientError> {
    let response = request
        .send()
        .await
        .map_err(|source| ClientError::transport(context, source))?;
    let status = response.status();
    debug!(status = status.as_u16(), "{}", context);
    if status != StatusCode::OK {
        return Err(ClientError::Status {
            context,
            status: status.as_u16(),
        });
    }
    Ok(response)
}

async fn read_json<T: DeserializeOwned>(
    response: Response,
    context: &'static str,
) -> Result<T, ClientError> {
    let body = response
        .text()
        .await
        .map_err(|source| ClientError::transport(context, source))?;
    serde_json::from_str(&body).map_err(|source| ClientError::Decode {
        context,
        source,
        body: excerpt(&body),
    })
}

fn excerpt(body: &str) -> String {
    match body.char_indices().nth(BODY_EXCERPT_LEN) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}

#[async_trait]
impl RemoteTestClient for HttpTestClient {
    async fn upload_urls(&self) -> Result<UploadUrls, ClientError> {
        let context = "get upload urls";
        let response = send(self.client.post(self.endpoint.assets_url()), context).await?;
        read_json(response, context).await
    }

    async fn upload_file(&self, url: &str, path: &Path) -> Result<(), ClientError> {
        let context = "upload file";
        async {
            let file = tokio::fs::File::open(path)
                .await
                .map_err(|e| ClientError::io(path, e))?;
            let size = file
                .metadata()
                .await
                .map_err(|e| ClientError::io(path, e))?
                .len();
            debug!(size, "streaming upload");

            let request = self
                .client
                .put(url)
                .header(CONTENT_LENGTH, size)
                .body(Body::wrap_stream(ReaderStream::new(file)));
            let response = send(request, context).await?;
            response
                .bytes()
                .await
                .map_err(|source| ClientError::transport(context, source))?;
            Ok::<(), ClientError>(())
        }
        .instrument(debug_span!("upload_file", path = %path.display()))
        .await
    }

    async fn start_test(&self, matrix: &TestMatrix) -> Result<(), ClientError> {
        let context = "start test";
        send(self.client.post(self.endpoint.test_url()).json(matrix), context).await?;
        Ok(())
    }

    async fn list_steps(&self) -> Result<ListStepsResponse, ClientError> {
        let context = "get test status";
        let response = send(self.client.get(self.endpoint.test_url()), context).await?;
        read_json(response, context).await
    }

    async fn list_assets(&self) -> Result<BTreeMap<String, String>, ClientError> {
        let context = "list test assets";
        let response = send(self.client.get(self.endpoint.assets_url()), context).await?;
        read_json(response, context).await
    }

    async fn download_file(&self, url: &str, dest: &Path) -> Result<(), ClientError> {
        let context = "download file";
        async {
            let mut response = send(self.client.get(url), context).await?;
            let mut file = tokio::fs::File::create(dest)
                .await
                .map_err(|e| ClientError::io(dest, e))?;
            while let Some(chunk) = response
                .chunk()
                .await
                .map_err(|source| ClientError::transport(context, source))?
            {
                file.write_all(&chunk)
                    .await
                    .map_err(|e| ClientError::io(dest, e))?;
            }
            file.flush().await.map_err(|e| ClientError::io(dest, e))?;
            Ok::<(), ClientError>(())
        }
        .instrument(debug_span!("download_file", dest = %dest.display()))
        .await
    }
}
