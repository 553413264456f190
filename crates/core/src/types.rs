//! Listing descriptors and value types returned by the resources

use bytes::Bytes;
use http::HeaderMap;
use serde::{Deserialize, Serialize};

/// One entry of a container listing
///
/// With a delimiter, pseudo-directories come back as `{"subdir": ...}`
/// entries that carry no other field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectEntry {
    #[serde(default)]
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,

    #[serde(default)]
    pub bytes: u64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subdir: Option<String>,
}

impl ObjectEntry {
    /// Whether this entry is a pseudo-directory
    pub fn is_dir(&self) -> bool {
        self.subdir.is_some()
    }

    /// Name of the object, or of the pseudo-directory
    pub fn display_name(&self) -> &str {
        self.subdir.as_deref().unwrap_or(&self.name)
    }

    /// Human-readable size
    pub fn size_human(&self) -> String {
        humansize::format_size(self.bytes, humansize::BINARY)
    }
}

/// One entry of an account listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerEntry {
    pub name: String,

    #[serde(default)]
    pub count: u64,

    #[serde(default)]
    pub bytes: u64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<String>,
}

/// Options for a single listing page
#[derive(Debug, Clone, Default)]
pub struct ListOptions {
    /// Only return names starting with this prefix
    pub prefix: Option<String>,

    /// Roll names up to this delimiter (usually "/")
    pub delimiter: Option<String>,

    /// Return names strictly after this one
    pub marker: Option<String>,

    /// Maximum number of entries in the page
    pub limit: Option<usize>,
}

impl ListOptions {
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    pub fn with_delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.delimiter = Some(delimiter.into());
        self
    }

    pub fn with_marker(mut self, marker: impl Into<String>) -> Self {
        self.marker = Some(marker.into());
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Query string pairs, `format=json` first
    pub(crate) fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![("format", "json".to_string())];
        if let Some(prefix) = &self.prefix {
            pairs.push(("prefix", prefix.clone()));
        }
        if let Some(delimiter) = &self.delimiter {
            pairs.push(("delimiter", delimiter.clone()));
        }
        if let Some(marker) = &self.marker {
            pairs.push(("marker", marker.clone()));
        }
        if let Some(limit) = self.limit {
            pairs.push(("limit", limit.to_string()));
        }
        pairs
    }
}

/// Account headers together with its containers
#[derive(Debug, Clone)]
pub struct AccountListing {
    pub details: HeaderMap,
    pub containers: Vec<ContainerEntry>,
}

/// A fully buffered object
#[derive(Debug, Clone)]
pub struct ObjectContent {
    pub content: Bytes,
    pub headers: HeaderMap,
}
