//! Transport trait definition
//!
//! Every storage and identity call goes through [`Transport`], which keeps
//! the resource layer independent of any HTTP client library. The
//! production implementation lives in `sw-http`; tests provide their own.

use std::fmt;
use std::io;

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use futures::stream::{self, BoxStream, StreamExt};
use http::{HeaderMap, Method, StatusCode};

use crate::error::{Error, Result};

/// A stream of body chunks
pub type ByteStream = BoxStream<'static, io::Result<Bytes>>;

/// Body of an outgoing request
#[derive(Default)]
pub enum RequestBody {
    #[default]
    Empty,
    Bytes(Bytes),
    Stream(ByteStream),
}

impl RequestBody {
    /// Body length when it is known up front
    pub fn len_hint(&self) -> Option<u64> {
        match self {
            RequestBody::Empty => Some(0),
            RequestBody::Bytes(bytes) => Some(bytes.len() as u64),
            RequestBody::Stream(_) => None,
        }
    }
}

impl fmt::Debug for RequestBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestBody::Empty => f.write_str("Empty"),
            RequestBody::Bytes(bytes) => write!(f, "Bytes({} bytes)", bytes.len()),
            RequestBody::Stream(_) => f.write_str("Stream"),
        }
    }
}

/// An outgoing HTTP request
#[derive(Debug)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub headers: HeaderMap,
    pub body: RequestBody,
}

impl HttpRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: HeaderMap::new(),
            body: RequestBody::Empty,
        }
    }

    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers.extend(headers);
        self
    }

    pub fn with_body(mut self, body: RequestBody) -> Self {
        self.body = body;
        self
    }
}

/// A response whose body has not been read yet
pub struct HttpResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    body: ByteStream,
}

impl HttpResponse {
    pub fn new(status: StatusCode, headers: HeaderMap, body: ByteStream) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// Build a response around an already buffered body
    pub fn from_bytes(status: StatusCode, headers: HeaderMap, body: impl Into<Bytes>) -> Self {
        let body: Bytes = body.into();
        let stream = if body.is_empty() {
            stream::empty().boxed()
        } else {
            stream::once(async move { Ok(body) }).boxed()
        };
        Self::new(status, headers, stream)
    }

    /// Advertised body length, if any
    pub fn content_length(&self) -> Option<u64> {
        self.headers
            .get(http::header::CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse().ok())
    }

    /// Read the whole body into memory
    pub async fn bytes(self) -> Result<Bytes> {
        let mut body = self.body;
        let mut buf = BytesMut::new();
        while let Some(chunk) = body.next().await {
            let chunk = chunk.map_err(|e| Error::Transport(e.to_string()))?;
            buf.extend_from_slice(&chunk);
        }
        Ok(buf.freeze())
    }

    /// Read the whole body as (lossy) UTF-8 text
    pub async fn text(self) -> Result<String> {
        let bytes = self.bytes().await?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Split into headers and the unread body stream
    pub fn into_parts(self) -> (StatusCode, HeaderMap, ByteStream) {
        (self.status, self.headers, self.body)
    }
}

impl fmt::Debug for HttpResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpResponse")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .finish_non_exhaustive()
    }
}

/// Sends HTTP requests on behalf of the client
///
/// An `Err` means no status could be obtained (connection refused, DNS,
/// TLS, ...). Any status, including 4xx and 5xx, is an `Ok` response.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_response_bytes_collects_chunks() {
        let chunks = vec![Ok(Bytes::from_static(b"hello ")), Ok(Bytes::from_static(b"world"))];
        let response = HttpResponse::new(
            StatusCode::OK,
            HeaderMap::new(),
            stream::iter(chunks).boxed(),
        );
        assert_eq!(response.text().await.unwrap(), "hello world");
    }

    #[tokio::test]
    async fn test_response_stream_error_is_transport() {
        let chunks = vec![
            Ok(Bytes::from_static(b"partial")),
            Err(io::Error::new(io::ErrorKind::ConnectionReset, "reset")),
        ];
        let response = HttpResponse::new(
            StatusCode::OK,
            HeaderMap::new(),
            stream::iter(chunks).boxed(),
        );
        assert!(matches!(response.bytes().await, Err(Error::Transport(_))));
    }

    #[test]
    fn test_content_length() {
        let mut headers = HeaderMap::new();
        headers.insert(http::header::CONTENT_LENGTH, "42".parse().unwrap());
        let response = HttpResponse::from_bytes(StatusCode::OK, headers, Bytes::new());
        assert_eq!(response.content_length(), Some(42));
    }

    #[test]
    fn test_request_body_len_hint() {
        assert_eq!(RequestBody::Empty.len_hint(), Some(0));
        assert_eq!(RequestBody::Bytes(Bytes::from_static(b"abc")).len_hint(), Some(3));
        assert_eq!(RequestBody::Stream(stream::empty().boxed()).len_hint(), None);
    }
}
