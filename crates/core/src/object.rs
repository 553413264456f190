//! Object operations
//!
//! Uploads stream their body straight to the transport; downloads stream
//! the response body into a local file. Batch deletes validate every
//! path first, then run all deletes concurrently and report per path.

use std::io;
use std::path::Path;
use std::sync::{Arc, Mutex};

use bytes::Bytes;
use futures::future::join_all;
use futures::stream::StreamExt;
use http::header::{CONTENT_TYPE, HeaderMap};
use http::Method;
use jiff::Timestamp;
use tokio::io::AsyncWriteExt;
use tokio_util::io::ReaderStream;
use tracing::{debug, info, warn};

use crate::batch::{BatchDelete, BatchItem};
use crate::error::{Error, Result};
use crate::headers::{DestinationHeader, ExpiryHeader, HeaderSource, header_value};
use crate::metadata::{MetadataStore, ObjectScope, report};
use crate::path::ObjectPath;
use crate::request::Context;
use crate::traits::{ByteStream, RequestBody};
use crate::types::ObjectContent;

/// Body of an upload
pub enum ObjectBody {
    Bytes(Bytes),
    Stream(ByteStream),
}

impl ObjectBody {
    pub fn stream(stream: ByteStream) -> Self {
        ObjectBody::Stream(stream)
    }
}

impl From<Bytes> for ObjectBody {
    fn from(bytes: Bytes) -> Self {
        ObjectBody::Bytes(bytes)
    }
}

impl From<Vec<u8>> for ObjectBody {
    fn from(bytes: Vec<u8>) -> Self {
        ObjectBody::Bytes(bytes.into())
    }
}

impl From<String> for ObjectBody {
    fn from(text: String) -> Self {
        ObjectBody::Bytes(text.into())
    }
}

impl From<&'static str> for ObjectBody {
    fn from(text: &'static str) -> Self {
        ObjectBody::Bytes(Bytes::from_static(text.as_bytes()))
    }
}

/// First stream error seen while feeding an upload
type ErrorSlot = Arc<Mutex<Option<(io::ErrorKind, String)>>>;

fn watch(stream: ByteStream, slot: ErrorSlot) -> ByteStream {
    stream
        .map(move |chunk| {
            if let Err(e) = &chunk
                && let Ok(mut seen) = slot.lock()
                && seen.is_none()
            {
                *seen = Some((e.kind(), e.to_string()));
            }
            chunk
        })
        .boxed()
}

fn take_error(slot: &ErrorSlot) -> Option<io::Error> {
    let seen = slot.lock().ok()?.take()?;
    Some(io::Error::new(seen.0, seen.1))
}

/// Object level operations
#[derive(Clone)]
pub struct ObjectResource {
    ctx: Context,
}

impl ObjectResource {
    pub(crate) fn new(ctx: Context) -> Self {
        Self { ctx }
    }

    async fn require_container(&self, path: &ObjectPath) -> Result<()> {
        if !self.ctx.probe(&path.container().to_url_path()).await? {
            return Err(Error::NotFound(format!("container '{}'", path.container())));
        }
        Ok(())
    }

    async fn require_object(&self, path: &ObjectPath) -> Result<()> {
        if !self.ctx.probe(&path.to_url_path()).await? {
            return Err(Error::NotFound(describe(path)));
        }
        Ok(())
    }

    /// Upload a body to `path`; the container must exist
    pub async fn upload(&self, body: impl Into<ObjectBody>, path: &str) -> Result<HeaderMap> {
        self.upload_with(body, path, None).await
    }

    /// Upload with an explicit `Content-Type`
    pub async fn upload_with(
        &self,
        body: impl Into<ObjectBody>,
        path: &str,
        content_type: Option<&str>,
    ) -> Result<HeaderMap> {
        let path = ObjectPath::parse(path)?;
        self.require_container(&path).await?;
        self.put(&path, body.into(), content_type).await
    }

    pub async fn upload_bytes(&self, bytes: Bytes, path: &str) -> Result<HeaderMap> {
        self.upload(bytes, path).await
    }

    pub async fn upload_stream(&self, stream: ByteStream, path: &str) -> Result<HeaderMap> {
        self.upload(ObjectBody::Stream(stream), path).await
    }

    /// Stream a local file to `path`
    pub async fn upload_file(&self, local: impl AsRef<Path>, path: &str) -> Result<HeaderMap> {
        let object = ObjectPath::parse(path)?;
        self.require_container(&object).await?;
        let file = tokio::fs::File::open(local.as_ref()).await?;
        let stream = ReaderStream::new(file).boxed();
        self.put(&object, ObjectBody::Stream(stream), None).await
    }

    async fn put(
        &self,
        path: &ObjectPath,
        body: ObjectBody,
        content_type: Option<&str>,
    ) -> Result<HeaderMap> {
        let slot: ErrorSlot = Arc::default();
        let body = match body {
            ObjectBody::Bytes(bytes) => RequestBody::Bytes(bytes),
            ObjectBody::Stream(stream) => RequestBody::Stream(watch(stream, slot.clone())),
        };

        let mut request = self
            .ctx
            .request(Method::PUT, self.ctx.url(&path.to_url_path(), &[]), &[])?
            .with_body(body);
        if let Some(content_type) = content_type {
            request.headers.insert(CONTENT_TYPE, header_value(content_type)?);
        }

        debug!(path = %path, "Uploading object");
        let result = self.ctx.send_checked(request, &describe(path)).await;
        if let Some(e) = take_error(&slot) {
            return Err(Error::Io(e));
        }
        Ok(result?.headers)
    }

    /// Stream the object into a local file, returning the bytes written
    ///
    /// A partially written file is removed on failure.
    pub async fn download(&self, path: &str, destination: impl AsRef<Path>) -> Result<u64> {
        self.download_with(path, destination, |_| {}).await
    }

    /// Like [`download`](Self::download), reporting each written chunk's length
    pub async fn download_with<F>(
        &self,
        path: &str,
        destination: impl AsRef<Path>,
        mut progress: F,
    ) -> Result<u64>
    where
        F: FnMut(u64) + Send,
    {
        let path = ObjectPath::parse(path)?;
        let destination = destination.as_ref();

        let request = self
            .ctx
            .request(Method::GET, self.ctx.url(&path.to_url_path(), &[]), &[])?;
        let response = self.ctx.send_checked(request, &describe(&path)).await?;
        let (_, _, body) = response.into_parts();

        let mut file = tokio::fs::File::create(destination).await?;
        match write_body(&mut file, body, &mut progress).await {
            Ok(written) => {
                debug!(path = %path, bytes = written, "Downloaded object");
                Ok(written)
            }
            Err(e) => {
                drop(file);
                if let Err(rm) = tokio::fs::remove_file(destination).await {
                    debug!(file = %destination.display(), error = %rm, "Could not remove partial download");
                }
                Err(e)
            }
        }
    }

    /// Buffer the whole object in memory
    ///
    /// A body shorter than its `Content-Length` is fetched again, up to the
    /// retry policy's attempt count.
    pub async fn get(&self, path: &str) -> Result<ObjectContent> {
        let path = ObjectPath::parse(path)?;
        let attempts = self.ctx.retry.max_attempts.max(1);
        let mut last_error = None;

        for attempt in 1..=attempts {
            let request = self
                .ctx
                .request(Method::GET, self.ctx.url(&path.to_url_path(), &[]), &[])?;
            let response = self.ctx.send_checked(request, &describe(&path)).await?;
            let expected = response.content_length();
            let headers = response.headers.clone();

            let error = match response.bytes().await {
                Ok(content) => match expected {
                    Some(len) if (content.len() as u64) < len => io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        format!("received {} of {len} bytes", content.len()),
                    ),
                    _ => return Ok(ObjectContent { content, headers }),
                },
                Err(e) => io::Error::other(e.to_string()),
            };

            warn!(path = %path, attempt, attempts, error = %error, "Incomplete object body");
            last_error = Some(error);
        }

        Err(Error::Io(last_error.unwrap_or_else(|| {
            io::Error::new(io::ErrorKind::UnexpectedEof, "incomplete object body")
        })))
    }

    /// Server side copy; the destination must not exist yet
    pub async fn copy(&self, origin: &str, destination: &str) -> Result<HeaderMap> {
        let origin = ObjectPath::parse(origin)?;
        let destination = ObjectPath::parse(destination)?;

        self.require_object(&origin).await?;
        if self.ctx.probe(&destination.to_url_path()).await? {
            return Err(Error::Conflict(format!("{} already exists", describe(&destination))));
        }

        // Destination is percent-decoded server side, like the request path
        let target = destination.to_url_path();
        let header = DestinationHeader(&target);
        let extra: [&dyn HeaderSource; 1] = [&header];
        debug!(origin = %origin, destination = %destination, "Copying object");
        self.ctx
            .call(copy_method()?, &origin.to_url_path(), &extra, &describe(&origin))
            .await
    }

    /// Delete one object
    pub async fn delete(&self, path: &str) -> Result<HeaderMap> {
        let path = ObjectPath::parse(path)?;
        self.delete_parsed(&path).await
    }

    async fn delete_parsed(&self, path: &ObjectPath) -> Result<HeaderMap> {
        self.ctx
            .call(Method::DELETE, &path.to_url_path(), &[], &describe(path))
            .await
    }

    /// Delete several objects concurrently
    ///
    /// Any invalid path aborts the whole batch before a request is sent.
    /// Outcomes are reported per path, in input order.
    pub async fn delete_many<I, P>(&self, paths: I) -> Result<BatchDelete>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<str>,
    {
        let paths = paths
            .into_iter()
            .map(|p| ObjectPath::parse(p.as_ref()))
            .collect::<Result<Vec<_>>>()?;

        let outcomes = join_all(paths.iter().map(|path| self.delete_parsed(path))).await;
        let batch = BatchDelete::new(
            paths
                .iter()
                .zip(outcomes)
                .map(|(path, outcome)| BatchItem {
                    path: path.to_string(),
                    outcome,
                })
                .collect(),
        );

        info!(
            total = batch.len(),
            failed = batch.failed(),
            "Batch delete finished"
        );
        Ok(batch)
    }

    /// Whether the object exists; its container must
    pub async fn exist(&self, path: &str) -> Result<bool> {
        let path = ObjectPath::parse(path)?;
        self.require_container(&path).await?;
        self.ctx.probe(&path.to_url_path()).await
    }

    /// Object headers (size, etag, content type, metadata)
    pub async fn info(&self, path: &str) -> Result<HeaderMap> {
        let path = ObjectPath::parse(path)?;
        self.ctx
            .call(Method::HEAD, &path.to_url_path(), &[], &describe(&path))
            .await
    }

    /// Schedule deletion at an absolute time
    pub async fn expire_at(&self, path: &str, when: Timestamp) -> Result<HeaderMap> {
        self.expire(path, ExpiryHeader::At(when.as_second())).await
    }

    /// Schedule deletion after a delay in seconds
    pub async fn expire_after(&self, path: &str, seconds: u64) -> Result<HeaderMap> {
        self.expire(path, ExpiryHeader::After(seconds)).await
    }

    async fn expire(&self, path: &str, header: ExpiryHeader) -> Result<HeaderMap> {
        let path = ObjectPath::parse(path)?;
        let extra: [&dyn HeaderSource; 1] = [&header];
        self.ctx
            .call(Method::POST, &path.to_url_path(), &extra, &describe(&path))
            .await
    }

    pub fn metas(&self) -> MetadataStore<ObjectScope> {
        MetadataStore::new(self.ctx.clone())
    }

    pub async fn try_upload_file(&self, local: impl AsRef<Path>, path: &str) -> bool {
        report(self.upload_file(local, path).await)
    }

    pub async fn try_copy(&self, origin: &str, destination: &str) -> bool {
        report(self.copy(origin, destination).await)
    }

    pub async fn try_delete(&self, path: &str) -> bool {
        report(self.delete(path).await)
    }

    /// `true` only when every path was deleted
    pub async fn try_delete_many<I, P>(&self, paths: I) -> bool
    where
        I: IntoIterator<Item = P>,
        P: AsRef<str>,
    {
        match self.delete_many(paths).await {
            Ok(batch) => batch.is_complete(),
            Err(e) => {
                debug!(error = %e, "Operation failed");
                false
            }
        }
    }

    pub async fn try_expire_at(&self, path: &str, when: Timestamp) -> bool {
        report(self.expire_at(path, when).await)
    }

    pub async fn try_expire_after(&self, path: &str, seconds: u64) -> bool {
        report(self.expire_after(path, seconds).await)
    }
}

async fn write_body<F>(
    file: &mut tokio::fs::File,
    mut body: ByteStream,
    progress: &mut F,
) -> Result<u64>
where
    F: FnMut(u64) + Send,
{
    let mut written = 0u64;
    while let Some(chunk) = body.next().await {
        let chunk = chunk?;
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
        progress(chunk.len() as u64);
    }
    file.flush().await?;
    Ok(written)
}

fn copy_method() -> Result<Method> {
    Method::from_bytes(b"COPY").map_err(|e| Error::General(e.to_string()))
}

fn describe(path: &ObjectPath) -> String {
    format!("object '{path}'")
}
