//! Typed request header builders
//!
//! Each concern (authentication, metadata, expiration, copy destination,
//! container visibility) writes its own headers; a request merges them
//! into a single `HeaderMap`.

use http::header::{ACCEPT, HeaderMap, HeaderName, HeaderValue};

use crate::error::{Error, Result};
use crate::slug::slugify;

const AUTH_TOKEN: &str = "x-auth-token";
const DELETE_AT: &str = "x-delete-at";
const DELETE_AFTER: &str = "x-delete-after";
const DESTINATION: &str = "destination";

/// Something that contributes headers to a request
pub trait HeaderSource: Send + Sync {
    fn write_to(&self, headers: &mut HeaderMap) -> Result<()>;
}

/// Merge several header sources into one map, later sources win
pub fn merge(sources: &[&dyn HeaderSource]) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    for source in sources {
        source.write_to(&mut headers)?;
    }
    Ok(headers)
}

pub(crate) fn header_name(name: &str) -> Result<HeaderName> {
    HeaderName::from_bytes(name.as_bytes())
        .map_err(|_| Error::Validation(format!("invalid header name '{name}'")))
}

pub(crate) fn header_value(value: &str) -> Result<HeaderValue> {
    HeaderValue::from_bytes(value.as_bytes())
        .map_err(|_| Error::Validation(format!("invalid header value '{value}'")))
}

/// `X-Auth-Token` plus `Accept: application/json`
#[derive(Debug, Clone, Copy)]
pub struct AuthHeaders<'a> {
    token: &'a str,
}

impl<'a> AuthHeaders<'a> {
    pub fn new(token: &'a str) -> Self {
        Self { token }
    }
}

impl HeaderSource for AuthHeaders<'_> {
    fn write_to(&self, headers: &mut HeaderMap) -> Result<()> {
        let mut token = header_value(self.token)?;
        token.set_sensitive(true);
        headers.insert(HeaderName::from_static(AUTH_TOKEN), token);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        Ok(())
    }
}

/// Validate a metadata key and return its normalized header suffix
pub fn meta_key(key: &str) -> Result<String> {
    if key.is_empty() {
        return Err(Error::Validation("metadata key cannot be empty".into()));
    }
    if key.contains('/') || key.contains(' ') {
        return Err(Error::Validation(format!(
            "invalid metadata key '{key}': no '/' or space allowed"
        )));
    }
    let slug = slugify(&key.to_lowercase());
    if slug.is_empty() {
        return Err(Error::Validation(format!(
            "metadata key '{key}' has no usable characters"
        )));
    }
    Ok(slug)
}

/// Full metadata header name for a scope label (`Account`, `Container`, `Object`)
pub fn meta_header_name(label: &str, key: &str) -> Result<String> {
    Ok(format!("x-{}-meta-{}", label.to_lowercase(), meta_key(key)?))
}

/// Set or remove one metadata entry
#[derive(Debug, Clone)]
pub enum MetaHeader<'a> {
    Set {
        label: &'a str,
        key: &'a str,
        value: &'a str,
    },
    Remove {
        label: &'a str,
        key: &'a str,
    },
}

impl<'a> MetaHeader<'a> {
    pub fn set(label: &'a str, key: &'a str, value: &'a str) -> Self {
        MetaHeader::Set { label, key, value }
    }

    pub fn remove(label: &'a str, key: &'a str) -> Self {
        MetaHeader::Remove { label, key }
    }

    /// Check key and value without building anything
    pub fn validate(&self) -> Result<()> {
        match self {
            MetaHeader::Set { key, value, .. } => {
                meta_key(key)?;
                if value.is_empty() {
                    return Err(Error::Validation(format!(
                        "metadata value for '{key}' cannot be empty"
                    )));
                }
                header_value(value)?;
                Ok(())
            }
            MetaHeader::Remove { key, .. } => meta_key(key).map(|_| ()),
        }
    }
}

impl HeaderSource for MetaHeader<'_> {
    fn write_to(&self, headers: &mut HeaderMap) -> Result<()> {
        self.validate()?;
        match self {
            MetaHeader::Set { label, key, value } => {
                let name = header_name(&meta_header_name(label, key)?)?;
                headers.insert(name, header_value(value)?);
            }
            MetaHeader::Remove { label, key } => {
                let name = format!("x-remove-{}-meta-{}", label.to_lowercase(), meta_key(key)?);
                headers.insert(header_name(&name)?, HeaderValue::from_static("x"));
            }
        }
        Ok(())
    }
}

/// Scheduled deletion of an object
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpiryHeader {
    /// Unix timestamp in seconds
    At(i64),
    /// Seconds from now
    After(u64),
}

impl HeaderSource for ExpiryHeader {
    fn write_to(&self, headers: &mut HeaderMap) -> Result<()> {
        let (name, value) = match self {
            ExpiryHeader::At(ts) => {
                if *ts < 0 {
                    return Err(Error::Validation(format!(
                        "expiration timestamp {ts} is before the epoch"
                    )));
                }
                (DELETE_AT, ts.to_string())
            }
            ExpiryHeader::After(seconds) => (DELETE_AFTER, seconds.to_string()),
        };
        headers.insert(HeaderName::from_static(name), header_value(&value)?);
        Ok(())
    }
}

/// `Destination` of a server-side copy, already `/container/key` shaped
#[derive(Debug, Clone, Copy)]
pub struct DestinationHeader<'a>(pub &'a str);

impl HeaderSource for DestinationHeader<'_> {
    fn write_to(&self, headers: &mut HeaderMap) -> Result<()> {
        headers.insert(HeaderName::from_static(DESTINATION), header_value(self.0)?);
        Ok(())
    }
}
