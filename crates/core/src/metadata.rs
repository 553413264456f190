//! Key/value metadata on accounts, containers and objects
//!
//! The three scopes share one implementation; they only differ in the
//! header label (`X-<Label>-Meta-*`) and in how a target is turned into
//! a request path.

use std::collections::BTreeMap;
use std::fmt;
use std::marker::PhantomData;

use http::{HeaderMap, Method};
use tracing::debug;

use crate::error::{Error, Result};
use crate::headers::{HeaderSource, MetaHeader, meta_header_name};
use crate::path::{ContainerName, ObjectPath};
use crate::request::Context;

/// A kind of entity that carries metadata
pub trait MetaScope {
    /// Header label, e.g. `Container` in `X-Container-Meta-Color`
    const LABEL: &'static str;

    /// Validate a target and return its request path
    fn target_path(target: &str) -> Result<String>;
}

/// The account the session is bound to; its only target is `""`
#[derive(Debug, Clone, Copy)]
pub struct AccountScope;

/// A container, targeted by name
#[derive(Debug, Clone, Copy)]
pub struct ContainerScope;

/// An object, targeted by `container/key`
#[derive(Debug, Clone, Copy)]
pub struct ObjectScope;

impl MetaScope for AccountScope {
    const LABEL: &'static str = "Account";

    fn target_path(target: &str) -> Result<String> {
        if !target.is_empty() {
            return Err(Error::Validation(format!(
                "account metadata takes no target, got '{target}'"
            )));
        }
        Ok(String::new())
    }
}

impl MetaScope for ContainerScope {
    const LABEL: &'static str = "Container";

    fn target_path(target: &str) -> Result<String> {
        Ok(ContainerName::parse(target)?.to_url_path())
    }
}

impl MetaScope for ObjectScope {
    const LABEL: &'static str = "Object";

    fn target_path(target: &str) -> Result<String> {
        Ok(ObjectPath::parse(target)?.to_url_path())
    }
}

/// Metadata accessor for one scope
pub struct MetadataStore<S> {
    ctx: Context,
    _scope: PhantomData<fn() -> S>,
}

impl<S> Clone for MetadataStore<S> {
    fn clone(&self) -> Self {
        Self {
            ctx: self.ctx.clone(),
            _scope: PhantomData,
        }
    }
}

impl<S: MetaScope> fmt::Debug for MetadataStore<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MetadataStore")
            .field("scope", &S::LABEL)
            .finish()
    }
}

impl<S: MetaScope> MetadataStore<S> {
    pub(crate) fn new(ctx: Context) -> Self {
        Self {
            ctx,
            _scope: PhantomData,
        }
    }

    fn prefix() -> String {
        format!("x-{}-meta-", S::LABEL.to_lowercase())
    }

    fn describe(target: &str) -> String {
        if target.is_empty() {
            S::LABEL.to_lowercase()
        } else {
            format!("{} '{target}'", S::LABEL.to_lowercase())
        }
    }

    async fn post(&self, target: &str, header: MetaHeader<'_>) -> Result<HeaderMap> {
        header.validate()?;
        let path = S::target_path(target)?;
        let extra: [&dyn HeaderSource; 1] = [&header];
        self.ctx
            .call(Method::POST, &path, &extra, &Self::describe(target))
            .await
    }

    async fn head(&self, target: &str) -> Result<HeaderMap> {
        let path = S::target_path(target)?;
        self.ctx
            .call(Method::HEAD, &path, &[], &Self::describe(target))
            .await
    }

    /// Set `key` to `value`, returning the response headers
    pub async fn create(&self, target: &str, key: &str, value: &str) -> Result<HeaderMap> {
        self.post(target, MetaHeader::set(S::LABEL, key, value)).await
    }

    /// Same as [`create`](Self::create); the service overwrites in place
    pub async fn update(&self, target: &str, key: &str, value: &str) -> Result<HeaderMap> {
        self.create(target, key, value).await
    }

    /// Remove `key`
    pub async fn delete(&self, target: &str, key: &str) -> Result<HeaderMap> {
        self.post(target, MetaHeader::remove(S::LABEL, key)).await
    }

    /// Value of `key`, `None` when it is not set
    pub async fn get(&self, target: &str, key: &str) -> Result<Option<String>> {
        let name = meta_header_name(S::LABEL, key)?;
        let headers = self.head(target).await?;
        Ok(headers
            .get(name.as_str())
            .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned()))
    }

    pub async fn has(&self, target: &str, key: &str) -> Result<bool> {
        Ok(self.get(target, key).await?.is_some())
    }

    /// Every metadata entry, keyed by the lower-cased header suffix
    pub async fn all(&self, target: &str) -> Result<BTreeMap<String, String>> {
        let headers = self.head(target).await?;
        Ok(collect_meta(&headers, &Self::prefix()))
    }

    pub async fn try_create(&self, target: &str, key: &str, value: &str) -> bool {
        report(self.create(target, key, value).await)
    }

    pub async fn try_update(&self, target: &str, key: &str, value: &str) -> bool {
        report(self.update(target, key, value).await)
    }

    pub async fn try_delete(&self, target: &str, key: &str) -> bool {
        report(self.delete(target, key).await)
    }
}

fn collect_meta(headers: &HeaderMap, prefix: &str) -> BTreeMap<String, String> {
    let mut metas = BTreeMap::new();
    for (name, value) in headers {
        if let Some(key) = name.as_str().strip_prefix(prefix) {
            metas.insert(
                key.to_string(),
                String::from_utf8_lossy(value.as_bytes()).into_owned(),
            );
        }
    }
    metas
}

pub(crate) fn report<T>(result: Result<T>) -> bool {
    match result {
        Ok(_) => true,
        Err(e) => {
            debug!(error = %e, "Operation failed");
            false
        }
    }
}
