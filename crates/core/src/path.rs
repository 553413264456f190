//! Container names, object paths and CLI path parsing
//!
//! Library calls take `container` or `container/key` strings which are
//! validated and normalized here before any request is issued. The CLI
//! addresses storage as `profile[/container[/key]]`, local paths are
//! passed through as-is.

use std::fmt;

use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};

use crate::error::{Error, Result};
use crate::slug::slugify;

/// Characters escaped inside a single URL path segment
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}')
    .add(b'/');

/// Encode one path segment for use in a request URL
pub fn encode_segment(segment: &str) -> String {
    utf8_percent_encode(segment, SEGMENT).to_string()
}

/// A validated, normalized container name
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContainerName(String);

impl ContainerName {
    /// Validate and normalize a container name
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(Error::Validation("container name cannot be empty".into()));
        }
        if trimmed.contains('/') || trimmed.chars().any(char::is_whitespace) {
            return Err(Error::Validation(format!(
                "invalid container name '{trimmed}': no '/' or whitespace allowed"
            )));
        }

        let slug = slugify(trimmed);
        if slug.is_empty() {
            return Err(Error::Validation(format!(
                "container name '{trimmed}' has no usable characters"
            )));
        }
        Ok(Self(slug))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// URL path relative to the storage endpoint
    pub fn to_url_path(&self) -> String {
        format!("/{}", encode_segment(&self.0))
    }
}

impl fmt::Display for ContainerName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A validated `container/key` path
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectPath {
    container: ContainerName,
    key: String,
}

impl ObjectPath {
    /// Validate a `container/key[/key...]` path. A leading `/` is ignored.
    pub fn parse(raw: &str) -> Result<Self> {
        let path = raw.strip_prefix('/').unwrap_or(raw);
        let Some((container, key)) = path.split_once('/') else {
            return Err(Error::Validation(format!(
                "invalid object path '{raw}': expected container/key"
            )));
        };
        if key.is_empty() {
            return Err(Error::Validation(format!(
                "invalid object path '{raw}': object key cannot be empty"
            )));
        }

        Ok(Self {
            container: ContainerName::parse(container)?,
            key: key.to_string(),
        })
    }

    pub fn container(&self) -> &ContainerName {
        &self.container
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// URL path relative to the storage endpoint, key segments percent-encoded
    pub fn to_url_path(&self) -> String {
        let key = self
            .key
            .split('/')
            .map(encode_segment)
            .collect::<Vec<_>>()
            .join("/");
        format!("{}/{key}", self.container.to_url_path())
    }
}

impl fmt::Display for ObjectPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.container, self.key)
    }
}

/// A parsed remote CLI path pointing into a configured profile
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemotePath {
    /// Profile name
    pub profile: String,
    /// Container name (empty for the account root)
    pub container: String,
    /// Object key or prefix (empty for container root)
    pub key: String,
}

impl RemotePath {
    pub fn new(
        profile: impl Into<String>,
        container: impl Into<String>,
        key: impl Into<String>,
    ) -> Self {
        Self {
            profile: profile.into(),
            container: container.into(),
            key: key.into(),
        }
    }

    /// Whether the path names the account itself
    pub fn is_account(&self) -> bool {
        self.container.is_empty()
    }

    /// Whether the path names a container without a key
    pub fn is_container(&self) -> bool {
        !self.container.is_empty() && self.key.is_empty()
    }

    /// The `container/key` part used by library object calls
    pub fn object_path(&self) -> String {
        format!("{}/{}", self.container, self.key)
    }

    /// Join a child key component
    pub fn join(&self, child: &str) -> Self {
        let base = self.key.trim_end_matches('/');
        let key = if base.is_empty() {
            child.to_string()
        } else {
            format!("{base}/{child}")
        };
        Self {
            profile: self.profile.clone(),
            container: self.container.clone(),
            key,
        }
    }
}

impl fmt::Display for RemotePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.container.is_empty(), self.key.is_empty()) {
            (true, _) => write!(f, "{}", self.profile),
            (false, true) => write!(f, "{}/{}", self.profile, self.container),
            (false, false) => write!(f, "{}/{}/{}", self.profile, self.container, self.key),
        }
    }
}

/// Parsed path that can be either local or remote
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedPath {
    /// Local filesystem path
    Local(std::path::PathBuf),
    /// Remote storage path
    Remote(RemotePath),
}

impl ParsedPath {
    pub fn is_remote(&self) -> bool {
        matches!(self, ParsedPath::Remote(_))
    }

    pub fn is_local(&self) -> bool {
        matches!(self, ParsedPath::Local(_))
    }

    pub fn as_remote(&self) -> Option<&RemotePath> {
        match self {
            ParsedPath::Remote(p) => Some(p),
            ParsedPath::Local(_) => None,
        }
    }

    pub fn as_local(&self) -> Option<&std::path::PathBuf> {
        match self {
            ParsedPath::Local(p) => Some(p),
            ParsedPath::Remote(_) => None,
        }
    }
}

/// Parse a CLI path string into a ParsedPath
///
/// Remote paths have the format `profile[/container[/key]]`. Anything that
/// starts with `/`, `./` or `../`, or whose first segment is not a valid
/// profile name (so `file.txt` in the current directory), is local.
pub fn parse_path(path: &str) -> Result<ParsedPath> {
    if path.is_empty() {
        return Err(Error::Validation("Path cannot be empty".into()));
    }

    if path.starts_with('/') || path.starts_with("./") || path.starts_with("../") {
        return Ok(ParsedPath::Local(std::path::PathBuf::from(path)));
    }

    #[cfg(windows)]
    if path.len() >= 2 && path.chars().nth(1) == Some(':') {
        return Ok(ParsedPath::Local(std::path::PathBuf::from(path)));
    }

    let mut parts = path.splitn(3, '/');
    let profile = parts.next().unwrap_or_default();
    let container = parts.next().unwrap_or_default();
    let key = parts.next().unwrap_or_default();

    if !is_valid_profile_name(profile) {
        return Ok(ParsedPath::Local(std::path::PathBuf::from(path)));
    }

    Ok(ParsedPath::Remote(RemotePath::new(profile, container, key)))
}

/// Parse a path that must be remote
pub fn parse_remote(path: &str) -> Result<RemotePath> {
    match parse_path(path)? {
        ParsedPath::Remote(remote) => Ok(remote),
        ParsedPath::Local(_) => Err(Error::Validation(format!(
            "'{path}' is not a remote path. Use format: profile[/container[/key]]"
        ))),
    }
}

/// Check if a string is a valid profile name
pub fn is_valid_profile_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}
