//! sw-http: HTTP transport for the swc Swift client
//!
//! This crate provides the `reqwest` implementation of the `Transport`
//! trait from sw-core, and the helper turning a configured profile into a
//! connected `StorageClient`. It is the only crate that depends on an HTTP
//! client.

pub mod client;
pub mod transport;

pub use client::{connect_profile, connect_with};
pub use transport::HttpTransport;
