//! Authentication against the identity service
//!
//! [`Authenticator::connect`] posts the configured credentials to
//! `{auth_url}/tokens`, extracts the token and picks the object-store
//! endpoint for the configured region out of the service catalog. The
//! resulting [`Session`] is immutable; a new one is negotiated on every
//! call.

use std::fmt;
use std::sync::Arc;

use http::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderValue};
use http::Method;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{debug, info};

use crate::error::{AuthError, Error, Result};
use crate::traits::{HttpRequest, RequestBody, Transport};

const DEFAULT_SERVICE_TYPE: &str = "object-store";
const DEFAULT_DOMAIN: &str = "Default";
const SUBJECT_TOKEN: &str = "x-subject-token";

/// Identity API flavour
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthScheme {
    /// Legacy password + tenant id body, token in the response body
    V2,
    /// Identity/password body, token in `X-Subject-Token`
    #[default]
    V3,
}

impl fmt::Display for AuthScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthScheme::V2 => f.write_str("v2"),
            AuthScheme::V3 => f.write_str("v3"),
        }
    }
}

/// Which endpoint of a catalog entry to use
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Interface {
    #[default]
    Public,
    Internal,
    Admin,
}

impl Interface {
    fn as_str(self) -> &'static str {
        match self {
            Interface::Public => "public",
            Interface::Internal => "internal",
            Interface::Admin => "admin",
        }
    }

    /// Field name of a v2 catalog endpoint
    fn v2_url_field(self) -> &'static str {
        match self {
            Interface::Public => "publicURL",
            Interface::Internal => "internalURL",
            Interface::Admin => "adminURL",
        }
    }
}

impl fmt::Display for Interface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything needed to negotiate a session
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
    pub auth_url: String,
    pub region: String,
    pub tenant_id: Option<String>,
    pub domain: String,
    pub scheme: AuthScheme,
    pub service_type: String,
    pub interface: Interface,
}

impl Credentials {
    pub fn new(
        username: impl Into<String>,
        password: impl Into<String>,
        auth_url: impl Into<String>,
        region: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            auth_url: auth_url.into(),
            region: region.into(),
            tenant_id: None,
            domain: DEFAULT_DOMAIN.to_string(),
            scheme: AuthScheme::default(),
            service_type: DEFAULT_SERVICE_TYPE.to_string(),
            interface: Interface::default(),
        }
    }

    pub fn with_tenant_id(mut self, tenant_id: impl Into<String>) -> Self {
        self.tenant_id = Some(tenant_id.into());
        self
    }

    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = domain.into();
        self
    }

    pub fn with_scheme(mut self, scheme: AuthScheme) -> Self {
        self.scheme = scheme;
        self
    }

    pub fn with_service_type(mut self, service_type: impl Into<String>) -> Self {
        self.service_type = service_type.into();
        self
    }

    pub fn with_interface(mut self, interface: Interface) -> Self {
        self.interface = interface;
        self
    }

    fn validate(&self) -> Result<()> {
        if self.username.is_empty() || self.password.is_empty() {
            return Err(Error::Validation("username and password are required".into()));
        }
        if self.auth_url.is_empty() {
            return Err(Error::Validation("auth url is required".into()));
        }
        if self.region.is_empty() {
            return Err(Error::Validation("region is required".into()));
        }
        if self.scheme == AuthScheme::V2 && self.tenant_id.is_none() {
            return Err(Error::Validation("v2 authentication requires a tenant id".into()));
        }
        Ok(())
    }

    fn request_body(&self) -> Value {
        match self.scheme {
            AuthScheme::V2 => json!({
                "auth": {
                    "passwordCredentials": {
                        "username": self.username,
                        "password": self.password,
                    },
                    "tenantId": self.tenant_id,
                }
            }),
            AuthScheme::V3 => {
                let mut body = json!({
                    "auth": {
                        "identity": {
                            "methods": ["password"],
                            "password": {
                                "user": {
                                    "name": self.username,
                                    "domain": { "name": self.domain },
                                    "password": self.password,
                                }
                            }
                        }
                    }
                });
                if let Some(tenant_id) = &self.tenant_id {
                    body["auth"]["scope"] = json!({ "project": { "id": tenant_id } });
                }
                body
            }
        }
    }

    fn tokens_url(&self) -> String {
        format!("{}/tokens", self.auth_url.trim_end_matches('/'))
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("auth_url", &self.auth_url)
            .field("region", &self.region)
            .field("tenant_id", &self.tenant_id)
            .field("domain", &self.domain)
            .field("scheme", &self.scheme)
            .field("service_type", &self.service_type)
            .field("interface", &self.interface)
            .finish()
    }
}

/// The storage endpoint chosen from the service catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    pub url: String,
    pub region: String,
    pub interface: Interface,
}

/// An authenticated session
#[derive(Clone)]
pub struct Session {
    token: String,
    endpoint: Endpoint,
    connected_at: Timestamp,
}

impl Session {
    pub fn new(token: impl Into<String>, endpoint: Endpoint) -> Self {
        Self {
            token: token.into(),
            endpoint,
            connected_at: Timestamp::now(),
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Storage base URL, without trailing slash
    pub fn endpoint_url(&self) -> &str {
        self.endpoint.url.trim_end_matches('/')
    }

    pub fn connected_at(&self) -> Timestamp {
        self.connected_at
    }

    pub fn details(&self) -> ConnectionDetails {
        ConnectionDetails {
            token: self.token.clone(),
            endpoint: self.endpoint.clone(),
            connected_at: self.connected_at.strftime("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("token", &"<redacted>")
            .field("endpoint", &self.endpoint)
            .field("connected_at", &self.connected_at)
            .finish()
    }
}

/// Serializable snapshot of a session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionDetails {
    pub token: String,
    pub endpoint: Endpoint,
    /// UTC, `YYYY-MM-DD HH:MM:SS`
    pub connected_at: String,
}

/// Negotiates sessions for one set of credentials
#[derive(Clone)]
pub struct Authenticator {
    transport: Arc<dyn Transport>,
    credentials: Credentials,
}

impl Authenticator {
    pub fn new(transport: Arc<dyn Transport>, credentials: Credentials) -> Self {
        Self {
            transport,
            credentials,
        }
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Negotiate a fresh session
    pub async fn connect(&self) -> Result<Session> {
        let creds = &self.credentials;
        creds.validate()?;

        let url = creds.tokens_url();
        debug!(url = %url, scheme = %creds.scheme, "Requesting auth token");

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let body = serde_json::to_vec(&creds.request_body())?;
        let request = HttpRequest::new(Method::POST, url)
            .with_headers(headers)
            .with_body(RequestBody::Bytes(body.into()));

        let response = self.transport.send(request).await.map_err(|e| match e {
            Error::Transport(msg) => AuthError::Transport(msg),
            other => AuthError::Transport(other.to_string()),
        })?;

        let status = response.status;
        if !status.is_success() {
            return Err(AuthError::HttpStatus {
                status: status.as_u16(),
            }
            .into());
        }

        let headers = response.headers.clone();
        let raw = response
            .bytes()
            .await
            .map_err(|e| AuthError::Transport(e.to_string()))?;
        let body = parse_body(&raw)?;

        if let Some(error) = body.get("error") {
            let message = error
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| error.to_string());
            return Err(AuthError::Api(message).into());
        }

        let (token, endpoint) = match creds.scheme {
            AuthScheme::V3 => {
                let token = headers
                    .get(SUBJECT_TOKEN)
                    .and_then(|v| v.to_str().ok())
                    .filter(|v| !v.is_empty())
                    .ok_or(AuthError::MissingToken)?
                    .to_string();
                (token, select_v3_endpoint(&body, creds)?)
            }
            AuthScheme::V2 => {
                let token = body
                    .pointer("/access/token/id")
                    .and_then(Value::as_str)
                    .filter(|v| !v.is_empty())
                    .ok_or(AuthError::MissingToken)?
                    .to_string();
                (token, select_v2_endpoint(&body, creds)?)
            }
        };

        info!(endpoint = %endpoint.url, region = %endpoint.region, "Connected");
        Ok(Session::new(token, endpoint))
    }
}

/// Parse the identity response, tolerating a JSON document sent as a JSON string
fn parse_body(raw: &[u8]) -> Result<Value> {
    let value: Value = serde_json::from_slice(raw)
        .map_err(|e| AuthError::MalformedResponse(e.to_string()))?;
    match value {
        Value::String(inner) => serde_json::from_str(&inner)
            .map_err(|e| AuthError::MalformedResponse(e.to_string()).into()),
        other => Ok(other),
    }
}

fn find_service<'a>(catalog: Option<&'a Value>, service_type: &str) -> Option<&'a Value> {
    catalog?
        .as_array()?
        .iter()
        .find(|entry| entry.get("type").and_then(Value::as_str) == Some(service_type))
}

fn no_endpoint(creds: &Credentials) -> Error {
    AuthError::NoMatchingEndpoint {
        service: creds.service_type.clone(),
        region: creds.region.clone(),
    }
    .into()
}

fn select_v3_endpoint(body: &Value, creds: &Credentials) -> Result<Endpoint> {
    let catalog = body.pointer("/token/catalog");
    if catalog.is_none() {
        return Err(AuthError::MalformedResponse("missing token.catalog".into()).into());
    }
    let service = find_service(catalog, &creds.service_type).ok_or_else(|| no_endpoint(creds))?;
    let endpoints = service
        .get("endpoints")
        .and_then(Value::as_array)
        .ok_or_else(|| no_endpoint(creds))?;

    endpoints
        .iter()
        .filter(|ep| {
            let region = ep
                .get("region_id")
                .or_else(|| ep.get("region"))
                .and_then(Value::as_str);
            region == Some(creds.region.as_str())
        })
        .find(|ep| match ep.get("interface").and_then(Value::as_str) {
            Some(interface) => interface == creds.interface.as_str(),
            None => true,
        })
        .and_then(|ep| ep.get("url").and_then(Value::as_str))
        .map(|url| Endpoint {
            url: url.to_string(),
            region: creds.region.clone(),
            interface: creds.interface,
        })
        .ok_or_else(|| no_endpoint(creds))
}

fn select_v2_endpoint(body: &Value, creds: &Credentials) -> Result<Endpoint> {
    let catalog = body.pointer("/access/serviceCatalog");
    if catalog.is_none() {
        return Err(AuthError::MalformedResponse("missing access.serviceCatalog".into()).into());
    }
    let service = find_service(catalog, &creds.service_type).ok_or_else(|| no_endpoint(creds))?;

    service
        .get("endpoints")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .find(|ep| ep.get("region").and_then(Value::as_str) == Some(creds.region.as_str()))
        .and_then(|ep| ep.get(creds.interface.v2_url_field()).and_then(Value::as_str))
        .map(|url| Endpoint {
            url: url.to_string(),
            region: creds.region.clone(),
            interface: creds.interface,
        })
        .ok_or_else(|| no_endpoint(creds))
}
