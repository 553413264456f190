//! Minimal Swift container for command tests
//!
//! Serves listings of a fixed key set, honoring `prefix` and `marker` but
//! never more than `page_cap` entries per page, and answers object GETs
//! with the key as body.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use http::{HeaderMap, Method, StatusCode};
use serde_json::{Value, json};
use sw_core::{
    Credentials, Endpoint, Error, HttpRequest, HttpResponse, Interface, Result, Session,
    StorageClient, Transport,
};

const STORAGE_URL: &str = "https://storage.test/v1/AUTH_t";

pub(crate) struct FakeSwift {
    keys: Vec<String>,
    page_cap: usize,
    deleted: Mutex<Vec<String>>,
}

impl FakeSwift {
    pub(crate) fn new(keys: &[&str], page_cap: usize) -> Arc<Self> {
        let mut keys: Vec<String> = keys.iter().map(|k| k.to_string()).collect();
        keys.sort();
        Arc::new(Self {
            keys,
            page_cap,
            deleted: Mutex::default(),
        })
    }

    pub(crate) fn client(self: &Arc<Self>) -> StorageClient {
        let session = Session::new(
            "tok",
            Endpoint {
                url: STORAGE_URL.into(),
                region: "GRA".into(),
                interface: Interface::Public,
            },
        );
        let credentials = Credentials::new("user", "secret", "https://auth.test/v3", "GRA");
        StorageClient::from_session(self.clone(), credentials, session)
    }

    pub(crate) fn deleted(&self) -> Vec<String> {
        self.deleted.lock().unwrap().clone()
    }

    fn listing(&self, query: &HashMap<String, String>) -> Value {
        let prefix = query.get("prefix").map(String::as_str).unwrap_or("");
        let marker = query.get("marker").map(String::as_str).unwrap_or("");
        let page: Vec<Value> = self
            .keys
            .iter()
            .filter(|k| k.starts_with(prefix) && k.as_str() > marker)
            .take(self.page_cap)
            .map(|k| json!({ "name": k, "bytes": k.len() }))
            .collect();
        Value::Array(page)
    }
}

#[async_trait]
impl Transport for FakeSwift {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        let url = url::Url::parse(&request.url).map_err(|e| Error::Transport(e.to_string()))?;
        let query: HashMap<String, String> = url.query_pairs().into_owned().collect();
        let path = url.path().trim_start_matches("/v1/AUTH_t/");
        let key = path.split_once('/').map(|(_, key)| {
            percent_encoding::percent_decode_str(key)
                .decode_utf8_lossy()
                .into_owned()
        });

        let ok = |body: String| -> Result<HttpResponse> {
            Ok(HttpResponse::from_bytes(StatusCode::OK, HeaderMap::new(), body))
        };
        match (request.method, key) {
            (Method::GET, None) => ok(self.listing(&query).to_string()),
            (Method::GET, Some(key)) if self.keys.contains(&key) => ok(key),
            (Method::DELETE, Some(key)) if self.keys.contains(&key) => {
                self.deleted.lock().unwrap().push(key);
                Ok(HttpResponse::from_bytes(
                    StatusCode::NO_CONTENT,
                    HeaderMap::new(),
                    String::new(),
                ))
            }
            _ => Ok(HttpResponse::from_bytes(
                StatusCode::NOT_FOUND,
                HeaderMap::new(),
                String::new(),
            )),
        }
    }
}
