//! reqwest implementation of the `Transport` trait
//!
//! Request bodies are streamed when the caller hands over a stream, and
//! response bodies are always returned as streams so downloads never need
//! to be buffered.

use async_trait::async_trait;
use futures::{StreamExt, TryStreamExt};
use reqwest::{Body, Client};
use tracing::debug;

use sw_core::{Error, HttpRequest, HttpResponse, RequestBody, Result, Transport};

const USER_AGENT: &str = concat!("swc/", env!("CARGO_PKG_VERSION"));

/// HTTP transport backed by a shared `reqwest::Client`
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Build a transport with the default client settings
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| Error::Transport(format!("Failed to create HTTP client: {e}")))?;
        Ok(Self { client })
    }

    /// Reuse an existing client, e.g. one configured with a proxy
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    pub fn inner(&self) -> &Client {
        &self.client
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        let HttpRequest {
            method,
            url,
            headers,
            body,
        } = request;

        let mut builder = self.client.request(method, &url).headers(headers);
        builder = match body {
            RequestBody::Empty => builder,
            RequestBody::Bytes(bytes) => builder.body(bytes),
            RequestBody::Stream(stream) => builder.body(Body::wrap_stream(stream)),
        };

        let response = builder.send().await.map_err(|e| {
            debug!(error = %e, "Request failed before a response");
            Error::Transport(format!("Request failed: {e}"))
        })?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .bytes_stream()
            .map_err(std::io::Error::other)
            .boxed();
        Ok(HttpResponse::new(status, headers, body))
    }
}
