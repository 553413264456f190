//! Profile management
//!
//! Profiles are named sets of identity credentials and region settings
//! stored in the configuration file.

use serde::{Deserialize, Serialize};

use crate::auth::{AuthScheme, Credentials, Interface};
use crate::client::RetryPolicy;
use crate::config::ConfigManager;
use crate::error::{Error, Result};

/// Retry configuration for a profile
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Attempts for a GET whose body came back incomplete
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

fn default_max_attempts() -> u32 {
    RetryPolicy::default().max_attempts
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
        }
    }
}

/// A named storage account
#[derive(Clone, Serialize, Deserialize)]
pub struct Profile {
    /// Unique name for this profile
    pub name: String,

    /// Identity service URL, `/tokens` is appended
    pub auth_url: String,

    pub username: String,

    pub password: String,

    /// Tenant (project) id, required by v2 authentication
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<String>,

    /// User domain for v3 authentication
    #[serde(default = "default_domain")]
    pub domain: String,

    /// Region of the storage endpoint, e.g. "GRA"
    pub region: String,

    #[serde(default)]
    pub auth_scheme: AuthScheme,

    #[serde(default)]
    pub interface: Interface,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry: Option<RetryConfig>,
}

fn default_domain() -> String {
    "Default".to_string()
}

impl Profile {
    /// Create a new profile with required fields
    pub fn new(
        name: impl Into<String>,
        auth_url: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
        region: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            auth_url: auth_url.into(),
            username: username.into(),
            password: password.into(),
            tenant_id: None,
            domain: default_domain(),
            region: region.into(),
            auth_scheme: AuthScheme::default(),
            interface: Interface::default(),
            retry: None,
        }
    }

    /// Get the effective retry configuration
    pub fn retry_config(&self) -> RetryConfig {
        self.retry.clone().unwrap_or_default()
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.retry_config().max_attempts,
        }
    }

    /// Credentials for the authenticator
    pub fn credentials(&self) -> Credentials {
        let mut creds = Credentials::new(
            self.username.clone(),
            self.password.clone(),
            self.auth_url.clone(),
            self.region.clone(),
        )
        .with_domain(self.domain.clone())
        .with_scheme(self.auth_scheme)
        .with_interface(self.interface);
        if let Some(tenant_id) = &self.tenant_id {
            creds = creds.with_tenant_id(tenant_id.clone());
        }
        creds
    }
}

impl std::fmt::Debug for Profile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Profile")
            .field("name", &self.name)
            .field("auth_url", &self.auth_url)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("tenant_id", &self.tenant_id)
            .field("region", &self.region)
            .field("auth_scheme", &self.auth_scheme)
            .finish_non_exhaustive()
    }
}

/// Manager for profile operations
pub struct ProfileManager {
    config_manager: ConfigManager,
}

impl ProfileManager {
    /// Create a new ProfileManager with a specific ConfigManager
    pub fn with_config_manager(config_manager: ConfigManager) -> Self {
        Self { config_manager }
    }

    /// Create a new ProfileManager using the default config location
    pub fn new() -> Result<Self> {
        let config_manager = ConfigManager::new()?;
        Ok(Self { config_manager })
    }

    /// List all configured profiles
    pub fn list(&self) -> Result<Vec<Profile>> {
        let config = self.config_manager.load()?;
        Ok(config.profiles)
    }

    /// Get a profile by name
    pub fn get(&self, name: &str) -> Result<Profile> {
        let config = self.config_manager.load()?;
        config
            .profiles
            .into_iter()
            .find(|p| p.name == name)
            .ok_or_else(|| Error::ProfileNotFound(name.to_string()))
    }

    /// Add or replace a profile
    pub fn set(&self, profile: Profile) -> Result<()> {
        let mut config = self.config_manager.load()?;
        config.profiles.retain(|p| p.name != profile.name);
        config.profiles.push(profile);
        self.config_manager.save(&config)
    }

    /// Add a profile, failing if the name is taken
    pub fn add(&self, profile: Profile) -> Result<()> {
        if self.exists(&profile.name)? {
            return Err(Error::ProfileExists(profile.name));
        }
        self.set(profile)
    }

    /// Remove a profile
    pub fn remove(&self, name: &str) -> Result<()> {
        let mut config = self.config_manager.load()?;
        let original_len = config.profiles.len();

        config.profiles.retain(|p| p.name != name);

        if config.profiles.len() == original_len {
            return Err(Error::ProfileNotFound(name.to_string()));
        }

        self.config_manager.save(&config)
    }

    /// Check if a profile exists
    pub fn exists(&self, name: &str) -> Result<bool> {
        let config = self.config_manager.load()?;
        Ok(config.profiles.iter().any(|p| p.name == name))
    }
}
