//! sw-core: client library for OpenStack Swift compatible object storage
//!
//! This crate provides:
//! - Session negotiation against the identity service (v2 and v3)
//! - Account, container and object resources
//! - Scoped key/value metadata
//! - Configuration and profile management
//! - The `Transport` trait the resources send requests through
//!
//! No HTTP client is linked here; `sw-http` provides the production
//! transport.

pub mod account;
pub mod auth;
pub mod batch;
pub mod client;
pub mod config;
pub mod container;
pub mod error;
pub mod headers;
pub mod metadata;
pub mod object;
pub mod path;
pub mod profile;
mod request;
pub mod slug;
pub mod traits;
pub mod types;

pub use account::AccountResource;
pub use auth::{
    AuthScheme, Authenticator, ConnectionDetails, Credentials, Endpoint, Interface, Session,
};
pub use batch::{BatchDelete, BatchItem};
pub use client::{RetryPolicy, StorageClient};
pub use config::{ColorMode, Config, ConfigManager, Defaults, OutputFormat};
pub use container::{ContainerDeletion, ContainerResource, StaticPages, Visibility};
pub use error::{AuthError, Error, Result};
pub use metadata::{AccountScope, ContainerScope, MetaScope, MetadataStore, ObjectScope};
pub use object::{ObjectBody, ObjectResource};
pub use path::{ContainerName, ObjectPath, ParsedPath, RemotePath, parse_path, parse_remote};
pub use profile::{Profile, ProfileManager};
pub use traits::{ByteStream, HttpRequest, HttpResponse, RequestBody, Transport};
pub use types::{AccountListing, ContainerEntry, ListOptions, ObjectContent, ObjectEntry};
