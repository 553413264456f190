//! Error types for sw-core
//!
//! Provides a unified error type that can be converted to appropriate exit codes.

use thiserror::Error;

/// Result type alias for sw-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Failures raised while negotiating or using an authenticated session
#[derive(Error, Debug)]
pub enum AuthError {
    /// The identity service could not be reached
    #[error("transport failure: {0}")]
    Transport(String),

    /// The identity service answered with a non-2xx status
    #[error("identity service answered HTTP {status}")]
    HttpStatus { status: u16 },

    /// The identity service answered with an application level error
    #[error("identity service error: {0}")]
    Api(String),

    /// No token could be found in the identity response
    #[error("identity response carries no token")]
    MissingToken,

    /// The service catalog has no endpoint for the configured region
    #[error("no '{service}' endpoint for region '{region}'")]
    NoMatchingEndpoint { service: String, region: String },

    /// The identity response could not be understood
    #[error("malformed identity response: {0}")]
    MalformedResponse(String),

    /// The storage service rejected the session token
    #[error("request rejected with HTTP {status}, reconnect required")]
    Unauthorized { status: u16 },
}

/// Error types for sw-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid caller input, detected before any network call
    #[error("Validation error: {0}")]
    Validation(String),

    /// Authentication error
    #[error("Authentication failed: {0}")]
    Auth(#[from] AuthError),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Conflict error
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Non-2xx answer from the storage service
    #[error("Remote error (HTTP {status}): {message}")]
    Remote { status: u16, message: String },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Network error before any status was received
    #[error("Network error: {0}")]
    Transport(String),

    /// Some members of a batch operation failed
    #[error("{failed} of {total} operations failed")]
    PartialFailure { failed: usize, total: usize },

    /// Configuration file error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Profile not found
    #[error("Profile not found: {0}")]
    ProfileNotFound(String),

    /// Profile already exists
    #[error("Profile already exists: {0}")]
    ProfileExists(String),

    /// TOML parsing error
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// TOML serialization error
    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL parsing error
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// General error
    #[error("{0}")]
    General(String),
}

impl Error {
    /// Get the appropriate exit code for this error
    pub const fn exit_code(&self) -> i32 {
        match self {
            Error::Validation(_) | Error::Config(_) => 2, // UsageError
            Error::Transport(_) => 3,                     // NetworkError
            Error::Auth(_) => 4,                          // AuthError
            Error::NotFound(_) | Error::ProfileNotFound(_) => 5, // NotFound
            Error::Conflict(_) | Error::ProfileExists(_) => 6, // Conflict
            _ => 1,                                       // GeneralError
        }
    }

    /// Whether this error reports an absent resource
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }
}
