//! In-memory Swift service used by the resource tests
//!
//! Speaks just enough of the identity and object storage APIs: token
//! issuing with a v3 catalog, account/container/object CRUD, metadata
//! headers, listings with prefix/marker/limit, and server-side COPY.
//! Faults can be injected per object.

#![allow(dead_code)]

use std::collections::{BTreeMap, BTreeSet};
use std::io;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use futures::stream::{self, StreamExt};
use http::header::{CONTENT_LENGTH, HeaderMap, HeaderName, HeaderValue};
use http::{Method, StatusCode};
use percent_encoding::percent_decode_str;
use serde_json::{Value, json};
use sw_core::{
    Credentials, Error, HttpRequest, HttpResponse, RequestBody, Result, StorageClient, Transport,
};

pub const AUTH_URL: &str = "https://auth.test/v3";
pub const STORAGE_URL: &str = "https://storage.test/v1/AUTH_t";
pub const USERNAME: &str = "user";
pub const PASSWORD: &str = "secret";

#[derive(Debug, Clone, Default)]
struct Object {
    data: Bytes,
    headers: BTreeMap<String, String>,
}

#[derive(Debug, Default)]
struct Container {
    headers: BTreeMap<String, String>,
    objects: BTreeMap<String, Object>,
}

#[derive(Debug, Default)]
struct State {
    issued: u32,
    valid_token: Option<String>,
    account_headers: BTreeMap<String, String>,
    containers: BTreeMap<String, Container>,
    truncated_gets: usize,
    broken_bodies: BTreeSet<String>,
    failing_deletes: BTreeSet<String>,
    listing_limit: Option<usize>,
    log: Vec<(Method, String)>,
}

/// The fake service; clone the `Arc` to inspect it after handing it out
#[derive(Debug, Default)]
pub struct SwiftDouble {
    state: Mutex<State>,
}

impl SwiftDouble {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn state(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    /// Connect a client with valid credentials for region `GRA`
    pub async fn client(self: &Arc<Self>) -> StorageClient {
        StorageClient::connect(self.clone(), credentials("GRA"))
            .await
            .unwrap()
    }

    pub fn requests(&self) -> Vec<(Method, String)> {
        self.state().log.clone()
    }

    pub fn request_count(&self) -> usize {
        self.state().log.len()
    }

    /// Invalidate every issued token
    pub fn revoke_tokens(&self) {
        self.state().valid_token = None;
    }

    /// The next `count` object GETs return a body shorter than Content-Length
    pub fn truncate_next_gets(&self, count: usize) {
        self.state().truncated_gets = count;
    }

    /// GETs of `container/key` fail halfway through the body
    pub fn break_body(&self, path: &str) {
        self.state().broken_bodies.insert(path.to_string());
    }

    /// Cap every listing page at `limit` entries, whatever the client asks
    pub fn set_listing_limit(&self, limit: usize) {
        self.state().listing_limit = Some(limit);
    }

    /// DELETEs of `container/key` answer 500
    pub fn fail_delete(&self, path: &str) {
        self.state().failing_deletes.insert(path.to_string());
    }

    pub fn has_container(&self, name: &str) -> bool {
        self.state().containers.contains_key(name)
    }

    pub fn object_names(&self, container: &str) -> Vec<String> {
        self.state()
            .containers
            .get(container)
            .map(|c| c.objects.keys().cloned().collect())
            .unwrap_or_default()
    }

    pub fn object_header(&self, path: &str, name: &str) -> Option<String> {
        let (container, key) = path.split_once('/')?;
        self.state()
            .containers
            .get(container)?
            .objects
            .get(key)?
            .headers
            .get(name)
            .cloned()
    }

    pub fn container_header(&self, container: &str, name: &str) -> Option<String> {
        self.state().containers.get(container)?.headers.get(name).cloned()
    }

    /// Seed an object without going through the client
    pub fn put_object(&self, container: &str, key: &str, data: &'static [u8]) {
        self.state()
            .containers
            .entry(container.to_string())
            .or_default()
            .objects
            .insert(
                key.to_string(),
                Object {
                    data: Bytes::from_static(data),
                    headers: BTreeMap::new(),
                },
            );
    }

    fn issue_token(&self, body: &[u8]) -> HttpResponse {
        let body: Value = serde_json::from_slice(body).unwrap_or(Value::Null);
        let user = body.pointer("/auth/identity/password/user/name");
        let password = body.pointer("/auth/identity/password/user/password");
        if user != Some(&json!(USERNAME)) || password != Some(&json!(PASSWORD)) {
            return respond(StatusCode::UNAUTHORIZED, HeaderMap::new(), Bytes::new());
        }

        let mut state = self.state();
        state.issued += 1;
        let token = format!("tok-{}", state.issued);
        state.valid_token = Some(token.clone());

        let catalog = json!({
            "token": {
                "catalog": [
                    {"type": "identity", "endpoints": [
                        {"url": AUTH_URL, "region_id": "GRA", "interface": "public"}
                    ]},
                    {"type": "object-store", "endpoints": [
                        {"url": STORAGE_URL, "region_id": "GRA", "region": "GRA", "interface": "public"},
                        {"url": "https://internal.test/v1/AUTH_t", "region_id": "GRA", "region": "GRA", "interface": "internal"},
                        {"url": "https://storage.sbg.test/v1/AUTH_t", "region_id": "SBG", "region": "SBG", "interface": "public"}
                    ]}
                ]
            }
        });
        let mut headers = HeaderMap::new();
        headers.insert("x-subject-token", HeaderValue::from_str(&token).unwrap());
        respond(StatusCode::CREATED, headers, catalog.to_string().into())
    }

    fn handle(&self, method: Method, url: &str, headers: &HeaderMap, body: Bytes) -> HttpResponse {
        let parsed = url::Url::parse(url).unwrap();
        let path = parsed.path().strip_prefix("/v1/AUTH_t").unwrap_or_default();
        let query: BTreeMap<String, String> = parsed.query_pairs().into_owned().collect();

        let token = headers.get("x-auth-token").and_then(|v| v.to_str().ok());
        let mut state = self.state();
        if token.is_none() || token != state.valid_token.as_deref() {
            return respond(StatusCode::UNAUTHORIZED, HeaderMap::new(), Bytes::new());
        }

        let path = path.trim_start_matches('/');
        let (container, key) = match path.split_once('/') {
            Some((c, k)) => (decode(c), Some(decode(k))),
            None => (decode(path), None),
        };

        match (container.is_empty(), key) {
            (true, _) => state.account(method, headers, &query),
            (false, None) => state.container(method, &container, headers, &query),
            (false, Some(key)) => state.object(method, &container, &key, headers, body),
        }
    }
}

#[async_trait]
impl Transport for SwiftDouble {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        let HttpRequest {
            method,
            url,
            headers,
            body,
        } = request;
        self.state().log.push((method.clone(), url.clone()));

        let body = match body {
            RequestBody::Empty => Bytes::new(),
            RequestBody::Bytes(bytes) => bytes,
            RequestBody::Stream(mut stream) => {
                let mut buf = BytesMut::new();
                while let Some(chunk) = stream.next().await {
                    let chunk = chunk.map_err(|e| Error::Transport(e.to_string()))?;
                    buf.extend_from_slice(&chunk);
                }
                buf.freeze()
            }
        };

        if url.starts_with(AUTH_URL) && url.ends_with("/tokens") {
            return Ok(self.issue_token(&body));
        }
        if !url.starts_with(STORAGE_URL) {
            return Err(Error::Transport(format!("unknown host in {url}")));
        }
        Ok(self.handle(method, &url, &headers, body))
    }
}

impl State {
    /// Requested `limit`, capped by the server side listing limit
    fn page_limit(&self, query: &BTreeMap<String, String>) -> usize {
        let requested = query
            .get("limit")
            .and_then(|l| l.parse().ok())
            .unwrap_or(10_000usize);
        requested.min(self.listing_limit.unwrap_or(10_000))
    }

    fn account(
        &mut self,
        method: Method,
        headers: &HeaderMap,
        query: &BTreeMap<String, String>,
    ) -> HttpResponse {
        match method {
            Method::GET | Method::HEAD => {
                let mut out = to_header_map(&self.account_headers);
                out.insert(
                    "x-account-container-count",
                    self.containers.len().to_string().parse().unwrap(),
                );
                let marker = query.get("marker").cloned();
                let limit = self.page_limit(query);
                let listing: Vec<Value> = self
                    .containers
                    .iter()
                    .filter(|(name, _)| marker.as_ref().is_none_or(|m| name.as_str() > m.as_str()))
                    .take(limit)
                    .map(|(name, c)| {
                        json!({
                            "name": name,
                            "count": c.objects.len(),
                            "bytes": c.objects.values().map(|o| o.data.len()).sum::<usize>(),
                        })
                    })
                    .collect();
                let body = if method == Method::GET && query.get("format").map(String::as_str) == Some("json") {
                    Value::Array(listing).to_string().into()
                } else {
                    Bytes::new()
                };
                respond(StatusCode::OK, out, body)
            }
            Method::POST => {
                apply_meta(&mut self.account_headers, headers, "account");
                respond(StatusCode::NO_CONTENT, HeaderMap::new(), Bytes::new())
            }
            _ => respond(StatusCode::METHOD_NOT_ALLOWED, HeaderMap::new(), Bytes::new()),
        }
    }

    fn container(
        &mut self,
        method: Method,
        name: &str,
        headers: &HeaderMap,
        query: &BTreeMap<String, String>,
    ) -> HttpResponse {
        if method == Method::PUT {
            let created = !self.containers.contains_key(name);
            let container = self.containers.entry(name.to_string()).or_default();
            for (header, value) in headers {
                let header = header.as_str();
                if header == "x-container-read" || header.starts_with("x-container-meta-") {
                    container
                        .headers
                        .insert(header.to_string(), value.to_str().unwrap_or_default().to_string());
                }
            }
            let status = if created {
                StatusCode::CREATED
            } else {
                StatusCode::ACCEPTED
            };
            return respond(status, HeaderMap::new(), Bytes::new());
        }

        let limit = self.page_limit(query);
        let Some(container) = self.containers.get_mut(name) else {
            return respond(StatusCode::NOT_FOUND, HeaderMap::new(), "Not Found".into());
        };

        match method {
            Method::GET | Method::HEAD => {
                let mut out = to_header_map(&container.headers);
                out.insert(
                    "x-container-object-count",
                    container.objects.len().to_string().parse().unwrap(),
                );
                if method == Method::HEAD {
                    return respond(StatusCode::NO_CONTENT, out, Bytes::new());
                }

                let prefix = query.get("prefix").cloned().unwrap_or_default();
                let marker = query.get("marker").cloned();
                let listing: Vec<Value> = container
                    .objects
                    .iter()
                    .filter(|(key, _)| key.starts_with(&prefix))
                    .filter(|(key, _)| marker.as_ref().is_none_or(|m| key.as_str() > m.as_str()))
                    .take(limit)
                    .map(|(key, object)| {
                        json!({
                            "name": key,
                            "bytes": object.data.len(),
                            "hash": "d41d8cd98f00b204e9800998ecf8427e",
                            "content_type": object.headers.get("content-type").cloned().unwrap_or_else(|| "application/octet-stream".into()),
                            "last_modified": "2024-01-01T00:00:00.000000",
                        })
                    })
                    .collect();
                if listing.is_empty() {
                    return respond(StatusCode::NO_CONTENT, out, Bytes::new());
                }
                respond(StatusCode::OK, out, Value::Array(listing).to_string().into())
            }
            Method::POST => {
                apply_meta(&mut container.headers, headers, "container");
                respond(StatusCode::NO_CONTENT, HeaderMap::new(), Bytes::new())
            }
            Method::DELETE => {
                if !container.objects.is_empty() {
                    return respond(StatusCode::CONFLICT, HeaderMap::new(), "Conflict".into());
                }
                self.containers.remove(name);
                respond(StatusCode::NO_CONTENT, HeaderMap::new(), Bytes::new())
            }
            _ => respond(StatusCode::METHOD_NOT_ALLOWED, HeaderMap::new(), Bytes::new()),
        }
    }

    fn object(
        &mut self,
        method: Method,
        container: &str,
        key: &str,
        headers: &HeaderMap,
        body: Bytes,
    ) -> HttpResponse {
        let full = format!("{container}/{key}");
        if !self.containers.contains_key(container) {
            return respond(StatusCode::NOT_FOUND, HeaderMap::new(), "Not Found".into());
        }

        if method == Method::PUT {
            let mut object = Object {
                data: body,
                headers: BTreeMap::new(),
            };
            if let Some(ct) = headers.get("content-type").and_then(|v| v.to_str().ok()) {
                object.headers.insert("content-type".into(), ct.to_string());
            }
            apply_meta(&mut object.headers, headers, "object");
            let etag = format!("{:x}", object.data.len());
            if let Some(c) = self.containers.get_mut(container) {
                c.objects.insert(key.to_string(), object);
            }
            let mut out = HeaderMap::new();
            out.insert("etag", etag.parse().unwrap());
            return respond(StatusCode::CREATED, out, Bytes::new());
        }

        let existing = self
            .containers
            .get(container)
            .and_then(|c| c.objects.get(key))
            .cloned();
        let Some(object) = existing else {
            return respond(StatusCode::NOT_FOUND, HeaderMap::new(), "Not Found".into());
        };

        match method {
            Method::GET => {
                let mut out = to_header_map(&object.headers);
                out.insert(CONTENT_LENGTH, object.data.len().to_string().parse().unwrap());
                if self.broken_bodies.contains(&full) {
                    let half = object.data.slice(..object.data.len() / 2);
                    let chunks = vec![
                        Ok(half),
                        Err(io::Error::new(io::ErrorKind::ConnectionReset, "connection reset")),
                    ];
                    return HttpResponse::new(StatusCode::OK, out, stream::iter(chunks).boxed());
                }
                if self.truncated_gets > 0 && !object.data.is_empty() {
                    self.truncated_gets -= 1;
                    let short = object.data.slice(..object.data.len() - 1);
                    return respond(StatusCode::OK, out, short);
                }
                respond(StatusCode::OK, out, object.data)
            }
            Method::HEAD => {
                let mut out = to_header_map(&object.headers);
                out.insert(CONTENT_LENGTH, object.data.len().to_string().parse().unwrap());
                respond(StatusCode::OK, out, Bytes::new())
            }
            Method::DELETE => {
                if self.failing_deletes.contains(&full) {
                    return respond(StatusCode::INTERNAL_SERVER_ERROR, HeaderMap::new(), "boom".into());
                }
                if let Some(c) = self.containers.get_mut(container) {
                    c.objects.remove(key);
                }
                respond(StatusCode::NO_CONTENT, HeaderMap::new(), Bytes::new())
            }
            Method::POST => {
                if let Some(c) = self.containers.get_mut(container)
                    && let Some(stored) = c.objects.get_mut(key)
                {
                    apply_meta(&mut stored.headers, headers, "object");
                    for name in ["x-delete-at", "x-delete-after"] {
                        if let Some(v) = headers.get(name).and_then(|v| v.to_str().ok()) {
                            stored.headers.insert(name.to_string(), v.to_string());
                        }
                    }
                }
                respond(StatusCode::ACCEPTED, HeaderMap::new(), Bytes::new())
            }
            m if m.as_str() == "COPY" => {
                let Some(destination) = headers.get("destination").and_then(|v| v.to_str().ok())
                else {
                    return respond(StatusCode::PRECONDITION_FAILED, HeaderMap::new(), Bytes::new());
                };
                let Some((dc, dk)) = destination.trim_start_matches('/').split_once('/') else {
                    return respond(StatusCode::PRECONDITION_FAILED, HeaderMap::new(), Bytes::new());
                };
                let Some(target) = self.containers.get_mut(&decode(dc)) else {
                    return respond(StatusCode::NOT_FOUND, HeaderMap::new(), Bytes::new());
                };
                target.objects.insert(decode(dk), object);
                respond(StatusCode::CREATED, HeaderMap::new(), Bytes::new())
            }
            _ => respond(StatusCode::METHOD_NOT_ALLOWED, HeaderMap::new(), Bytes::new()),
        }
    }
}

pub fn credentials(region: &str) -> Credentials {
    Credentials::new(USERNAME, PASSWORD, AUTH_URL, region)
}

fn decode(segment: &str) -> String {
    percent_decode_str(segment).decode_utf8_lossy().into_owned()
}

fn apply_meta(target: &mut BTreeMap<String, String>, headers: &HeaderMap, scope: &str) {
    let set = format!("x-{scope}-meta-");
    let remove = format!("x-remove-{scope}-meta-");
    for (name, value) in headers {
        let name = name.as_str();
        if let Some(key) = name.strip_prefix(&remove) {
            target.remove(&format!("{set}{key}"));
        } else if name.starts_with(&set) {
            target.insert(
                name.to_string(),
                String::from_utf8_lossy(value.as_bytes()).into_owned(),
            );
        }
    }
}

fn to_header_map(headers: &BTreeMap<String, String>) -> HeaderMap {
    let mut out = HeaderMap::new();
    for (name, value) in headers {
        out.insert(
            HeaderName::from_bytes(name.as_bytes()).unwrap(),
            HeaderValue::from_bytes(value.as_bytes()).unwrap(),
        );
    }
    out
}

fn respond(status: StatusCode, headers: HeaderMap, body: Bytes) -> HttpResponse {
    HttpResponse::from_bytes(status, headers, body)
}
