//! Profile to connected client
//!
//! Bridges the configuration layer and the library: a stored `Profile`
//! becomes credentials plus a retry policy, negotiated over `HttpTransport`.

use std::sync::Arc;

use sw_core::{Profile, Result, StorageClient};
use tracing::debug;

use crate::transport::HttpTransport;

/// Authenticate with a profile's credentials and build a client
pub async fn connect_profile(profile: &Profile) -> Result<StorageClient> {
    let transport = HttpTransport::new()?;
    connect_with(Arc::new(transport), profile).await
}

/// Same as [`connect_profile`] over an existing transport
pub async fn connect_with(transport: Arc<HttpTransport>, profile: &Profile) -> Result<StorageClient> {
    debug!(profile = %profile.name, region = %profile.region, "Connecting profile");
    let client = StorageClient::connect(transport, profile.credentials()).await?;
    Ok(client.with_retry_policy(profile.retry_policy()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sw_core::{AuthError, AuthScheme, Error};
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn test_connect_profile_unreachable_identity() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let profile = Profile::new("ovh", format!("http://{addr}/v3"), "user", "secret", "GRA");
        let err = connect_profile(&profile).await.err().unwrap();
        assert!(matches!(err, Error::Auth(AuthError::Transport(_))));
    }

    #[tokio::test]
    async fn test_connect_profile_rejects_v2_without_tenant() {
        let mut profile = Profile::new("ovh", "http://127.0.0.1:1/v2.0", "user", "secret", "GRA");
        profile.auth_scheme = AuthScheme::V2;
        let err = connect_profile(&profile).await.err().unwrap();
        assert!(matches!(err, Error::Validation(_)));
    }
}
