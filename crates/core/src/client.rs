//! StorageClient facade
//!
//! Connects once, then hands out the account, container and object
//! resources bound to the negotiated session.

use std::sync::Arc;

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

use crate::account::AccountResource;
use crate::auth::{Authenticator, ConnectionDetails, Credentials, Session};
use crate::container::ContainerResource;
use crate::error::Result;
use crate::object::ObjectResource;
use crate::request::Context;
use crate::traits::Transport;

/// Bounded retry for GETs whose body came back shorter than advertised
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    pub max_attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_attempts: 3 }
    }
}

/// A connected client
pub struct StorageClient {
    authenticator: Authenticator,
    ctx: Context,
    account: AccountResource,
    containers: ContainerResource,
    objects: ObjectResource,
}

impl StorageClient {
    /// Authenticate and build the resources
    pub async fn connect(transport: Arc<dyn Transport>, credentials: Credentials) -> Result<Self> {
        let authenticator = Authenticator::new(transport.clone(), credentials);
        let session = authenticator.connect().await?;
        Ok(Self::assemble(
            authenticator,
            transport,
            Arc::new(session),
            RetryPolicy::default(),
        ))
    }

    /// Reuse an existing session
    pub fn from_session(
        transport: Arc<dyn Transport>,
        credentials: Credentials,
        session: Session,
    ) -> Self {
        let authenticator = Authenticator::new(transport.clone(), credentials);
        Self::assemble(authenticator, transport, Arc::new(session), RetryPolicy::default())
    }

    fn assemble(
        authenticator: Authenticator,
        transport: Arc<dyn Transport>,
        session: Arc<Session>,
        retry: RetryPolicy,
    ) -> Self {
        let ctx = Context::new(transport, session, retry);
        let objects = ObjectResource::new(ctx.clone());
        Self {
            authenticator,
            account: AccountResource::new(ctx.clone()),
            containers: ContainerResource::new(ctx.clone(), objects.clone()),
            objects,
            ctx,
        }
    }

    pub fn with_retry_policy(self, retry: RetryPolicy) -> Self {
        let Self {
            authenticator, ctx, ..
        } = self;
        Self::assemble(authenticator, ctx.transport, ctx.session, retry)
    }

    /// Negotiate a new session, e.g. after `AuthError::Unauthorized`
    pub async fn reconnect(&mut self) -> Result<()> {
        let session = self.authenticator.connect().await?;
        let rebuilt = Self::assemble(
            self.authenticator.clone(),
            self.ctx.transport.clone(),
            Arc::new(session),
            self.ctx.retry,
        );
        *self = rebuilt;
        Ok(())
    }

    pub fn session(&self) -> &Session {
        &self.ctx.session
    }

    pub fn connected_at(&self) -> Timestamp {
        self.ctx.session.connected_at()
    }

    pub fn connection_details(&self) -> ConnectionDetails {
        self.ctx.session.details()
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.ctx.retry
    }

    pub fn account(&self) -> &AccountResource {
        &self.account
    }

    pub fn containers(&self) -> &ContainerResource {
        &self.containers
    }

    pub fn objects(&self) -> &ObjectResource {
        &self.objects
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{Endpoint, Interface};
    use crate::traits::{HttpResponse, MockTransport};
    use http::header::HeaderValue;
    use http::{HeaderMap, StatusCode};
    use serde_json::json;

    fn catalog_response(token: &'static str) -> HttpResponse {
        let body = json!({
            "token": {"catalog": [{"type": "object-store", "endpoints": [
                {"url": "https://storage/v1/AUTH_x", "region_id": "GRA", "interface": "public"}
            ]}]}
        });
        let mut headers = HeaderMap::new();
        headers.insert("x-subject-token", HeaderValue::from_static(token));
        HttpResponse::from_bytes(StatusCode::CREATED, headers, body.to_string())
    }

    #[tokio::test]
    async fn test_reconnect_replaces_session() {
        let mut mock = MockTransport::new();
        let mut seq = mockall::Sequence::new();
        mock.expect_send()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(catalog_response("first")));
        mock.expect_send()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(catalog_response("second")));

        let creds = Credentials::new("user", "pass", "https://auth", "GRA");
        let mut client = StorageClient::connect(Arc::new(mock), creds).await.unwrap();
        assert_eq!(client.session().token(), "first");

        client.reconnect().await.unwrap();
        assert_eq!(client.session().token(), "second");
        assert_eq!(client.connection_details().token, "second");
    }

    #[test]
    fn test_retry_policy_carried_over() {
        let session = Session::new(
            "tok",
            Endpoint {
                url: "https://storage".into(),
                region: "GRA".into(),
                interface: Interface::Public,
            },
        );
        let creds = Credentials::new("user", "pass", "https://auth", "GRA");
        let client = StorageClient::from_session(Arc::new(MockTransport::new()), creds, session)
            .with_retry_policy(RetryPolicy { max_attempts: 5 });
        assert_eq!(client.retry_policy().max_attempts, 5);
        assert_eq!(RetryPolicy::default().max_attempts, 3);
    }
}
