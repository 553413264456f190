//! Request plumbing shared by the resources
//!
//! All storage calls funnel through [`Context::send`], which applies the
//! single status rule: a transport error or a status outside [200, 300)
//! fails, 401/403 invalidate the session and 404 is reported as NotFound.

use std::sync::Arc;

use http::{HeaderMap, Method, StatusCode};
use tracing::debug;
use url::form_urlencoded;

use crate::auth::Session;
use crate::client::RetryPolicy;
use crate::error::{AuthError, Error, Result};
use crate::headers::{AuthHeaders, HeaderSource, merge};
use crate::traits::{HttpRequest, HttpResponse, Transport};

/// Everything a resource needs to issue requests
#[derive(Clone)]
pub(crate) struct Context {
    pub transport: Arc<dyn Transport>,
    pub session: Arc<Session>,
    pub retry: RetryPolicy,
}

impl Context {
    pub fn new(transport: Arc<dyn Transport>, session: Arc<Session>, retry: RetryPolicy) -> Self {
        Self {
            transport,
            session,
            retry,
        }
    }

    /// Absolute URL for an already encoded path relative to the endpoint
    pub fn url(&self, path: &str, query: &[(&str, String)]) -> String {
        let mut url = format!("{}{}", self.session.endpoint_url(), path);
        if !query.is_empty() {
            let encoded = form_urlencoded::Serializer::new(String::new())
                .extend_pairs(query.iter().map(|(k, v)| (*k, v.as_str())))
                .finish();
            url.push('?');
            url.push_str(&encoded);
        }
        url
    }

    /// Build an authenticated request carrying the extra header sources
    pub fn request(
        &self,
        method: Method,
        url: String,
        extra: &[&dyn HeaderSource],
    ) -> Result<HttpRequest> {
        let auth = AuthHeaders::new(self.session.token());
        let mut sources: Vec<&dyn HeaderSource> = Vec::with_capacity(extra.len() + 1);
        sources.push(&auth);
        sources.extend_from_slice(extra);
        Ok(HttpRequest::new(method, url).with_headers(merge(&sources)?))
    }

    /// Send and reject an invalidated session; any other status is returned
    pub async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        let method = request.method.clone();
        let url = request.url.clone();
        debug!(method = %method, url = %url, "Sending request");

        let response = self.transport.send(request).await?;
        debug!(method = %method, url = %url, status = response.status.as_u16(), "Received response");

        match response.status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(AuthError::Unauthorized {
                status: response.status.as_u16(),
            }
            .into()),
            _ => Ok(response),
        }
    }

    /// Send and require a 2xx status; 404 becomes NotFound(`what`)
    pub async fn send_checked(&self, request: HttpRequest, what: &str) -> Result<HttpResponse> {
        let response = self.send(request).await?;
        check_status(response, what).await
    }

    /// Convenience for bodiless calls that only need the response headers
    pub async fn call(
        &self,
        method: Method,
        path: &str,
        extra: &[&dyn HeaderSource],
        what: &str,
    ) -> Result<HeaderMap> {
        let request = self.request(method, self.url(path, &[]), extra)?;
        let response = self.send_checked(request, what).await?;
        Ok(response.headers)
    }

    /// Existence probe by GET: 404 is `false`, 2xx is `true`
    pub async fn probe(&self, path: &str) -> Result<bool> {
        let request = self.request(Method::GET, self.url(path, &[]), &[])?;
        let response = self.send(request).await?;
        match response.status {
            StatusCode::NOT_FOUND => Ok(false),
            status if status.is_success() => Ok(true),
            _ => Err(remote_error(response).await),
        }
    }
}

/// Map a non-2xx response into an error
pub(crate) async fn check_status(response: HttpResponse, what: &str) -> Result<HttpResponse> {
    match response.status {
        status if status.is_success() => Ok(response),
        StatusCode::NOT_FOUND => Err(Error::NotFound(what.to_string())),
        _ => Err(remote_error(response).await),
    }
}

async fn remote_error(response: HttpResponse) -> Error {
    let status = response.status;
    let reason = status.canonical_reason().unwrap_or_default();
    let body = response.text().await.unwrap_or_default();
    let body = body.trim();
    let message = if body.is_empty() {
        format!("{} {reason}", status.as_u16())
    } else {
        format!("{} {reason}: {body}", status.as_u16())
    };
    Error::Remote {
        status: status.as_u16(),
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{Endpoint, Interface};
    use crate::traits::MockTransport;

    fn context(mock: MockTransport) -> Context {
        let session = Session::new(
            "tok",
            Endpoint {
                url: "https://storage/v1/AUTH_x/".into(),
                region: "GRA".into(),
                interface: Interface::Public,
            },
        );
        Context::new(Arc::new(mock), Arc::new(session), RetryPolicy::default())
    }

    fn respond(status: StatusCode, body: &'static str) -> HttpResponse {
        HttpResponse::from_bytes(status, HeaderMap::new(), body)
    }

    #[test]
    fn test_url_with_query() {
        let ctx = context(MockTransport::new());
        let url = ctx.url(
            "/photos",
            &[("format", "json".into()), ("prefix", "a b&c".into())],
        );
        assert_eq!(url, "https://storage/v1/AUTH_x/photos?format=json&prefix=a+b%26c");
    }

    #[tokio::test]
    async fn test_request_carries_token() {
        let mut mock = MockTransport::new();
        mock.expect_send()
            .withf(|req| req.headers["x-auth-token"] == "tok" && req.method == Method::HEAD)
            .returning(|_| Ok(respond(StatusCode::NO_CONTENT, "")));
        let ctx = context(mock);
        ctx.call(Method::HEAD, "/photos", &[], "photos").await.unwrap();
    }

    #[tokio::test]
    async fn test_unauthorized_invalidates_session() {
        let mut mock = MockTransport::new();
        mock.expect_send()
            .returning(|_| Ok(respond(StatusCode::FORBIDDEN, "")));
        let ctx = context(mock);
        let err = ctx.probe("/photos").await.unwrap_err();
        assert!(matches!(
            err,
            Error::Auth(AuthError::Unauthorized { status: 403 })
        ));
    }

    #[tokio::test]
    async fn test_status_mapping() {
        let mut mock = MockTransport::new();
        let mut seq = mockall::Sequence::new();
        mock.expect_send()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(respond(StatusCode::NOT_FOUND, "")));
        mock.expect_send()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(respond(StatusCode::INTERNAL_SERVER_ERROR, "boom")));
        let ctx = context(mock);

        let err = ctx.call(Method::HEAD, "/a", &[], "a").await.unwrap_err();
        assert!(matches!(err, Error::NotFound(ref what) if what == "a"));

        let err = ctx.call(Method::HEAD, "/a", &[], "a").await.unwrap_err();
        match err {
            Error::Remote { status, message } => {
                assert_eq!(status, 500);
                assert_eq!(message, "500 Internal Server Error: boom");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_probe() {
        let mut mock = MockTransport::new();
        let mut seq = mockall::Sequence::new();
        mock.expect_send()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(respond(StatusCode::OK, "[]")));
        mock.expect_send()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(respond(StatusCode::NOT_FOUND, "")));
        mock.expect_send()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(respond(StatusCode::SERVICE_UNAVAILABLE, "")));
        let ctx = context(mock);

        assert!(ctx.probe("/a").await.unwrap());
        assert!(!ctx.probe("/a").await.unwrap());
        assert!(matches!(
            ctx.probe("/a").await,
            Err(Error::Remote { status: 503, .. })
        ));
    }

    #[tokio::test]
    async fn test_transport_error_propagates() {
        let mut mock = MockTransport::new();
        mock.expect_send()
            .returning(|_| Err(Error::Transport("reset".into())));
        let ctx = context(mock);
        assert!(matches!(ctx.probe("/a").await, Err(Error::Transport(_))));
    }
}
