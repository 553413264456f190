//! Container operations
//!
//! A forced delete walks: list the container, batch-delete every object,
//! then delete the container. A non-forced delete of a non-empty
//! container fails with `Conflict` before anything is removed.

use http::header::{HeaderMap, HeaderName, HeaderValue};
use http::Method;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::batch::BatchDelete;
use crate::error::{Error, Result};
use crate::headers::{HeaderSource, header_value};
use crate::metadata::{ContainerScope, MetadataStore, report};
use crate::object::ObjectResource;
use crate::path::ContainerName;
use crate::request::{Context, check_status};
use crate::types::{ListOptions, ObjectEntry};

/// Page size used when walking a whole container
pub const LIST_PAGE_SIZE: usize = 10_000;

const READ_ACL: &str = "x-container-read";
const PUBLIC_READ: &str = ".r:*,.rlistings";

/// Static website settings of a container
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaticPages {
    pub index: String,
    pub error: String,
    pub listings_css: String,
}

impl Default for StaticPages {
    fn default() -> Self {
        Self {
            index: "index.html".to_string(),
            error: "error.html".to_string(),
            listings_css: "listing.css".to_string(),
        }
    }
}

/// Who can read a container
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Visibility {
    /// World readable, listings included
    Public,
    /// Token holders only
    #[default]
    Private,
    /// World readable and served as a static website
    Static(StaticPages),
}

impl HeaderSource for Visibility {
    fn write_to(&self, headers: &mut HeaderMap) -> Result<()> {
        let pages = match self {
            Visibility::Private => return Ok(()),
            Visibility::Public => None,
            Visibility::Static(pages) => Some(pages),
        };

        headers.insert(
            HeaderName::from_static(READ_ACL),
            HeaderValue::from_static(PUBLIC_READ),
        );
        if let Some(pages) = pages {
            headers.insert(
                HeaderName::from_static("x-container-meta-web-listings"),
                HeaderValue::from_static("true"),
            );
            headers.insert(
                HeaderName::from_static("x-container-meta-web-index"),
                header_value(&pages.index)?,
            );
            headers.insert(
                HeaderName::from_static("x-container-meta-web-error"),
                header_value(&pages.error)?,
            );
            headers.insert(
                HeaderName::from_static("x-container-meta-web-listings-css"),
                header_value(&pages.listings_css)?,
            );
        }
        Ok(())
    }
}

/// What a container delete did
#[derive(Debug)]
pub enum ContainerDeletion {
    /// The container was empty
    Empty { container: HeaderMap },
    /// Objects were removed first
    Forced {
        files: BatchDelete,
        container: HeaderMap,
    },
}

impl ContainerDeletion {
    /// Number of objects removed along with the container
    pub fn removed_objects(&self) -> usize {
        match self {
            ContainerDeletion::Empty { .. } => 0,
            ContainerDeletion::Forced { files, .. } => files.succeeded(),
        }
    }
}

/// Container level operations
#[derive(Clone)]
pub struct ContainerResource {
    ctx: Context,
    objects: ObjectResource,
}

impl ContainerResource {
    pub(crate) fn new(ctx: Context, objects: ObjectResource) -> Self {
        Self { ctx, objects }
    }

    /// Create (or update the ACL of) a container
    pub async fn create(&self, name: &str, visibility: Visibility) -> Result<HeaderMap> {
        let name = ContainerName::parse(name)?;
        debug!(container = %name, visibility = ?visibility, "Creating container");
        let extra: [&dyn HeaderSource; 1] = [&visibility];
        self.ctx
            .call(Method::PUT, &name.to_url_path(), &extra, &describe(&name))
            .await
    }

    /// Whether the container exists
    pub async fn exist(&self, name: &str) -> Result<bool> {
        let name = ContainerName::parse(name)?;
        self.ctx.probe(&name.to_url_path()).await
    }

    /// Every object of the container
    pub async fn list(&self, name: &str) -> Result<Vec<ObjectEntry>> {
        self.list_all_with(name, ListOptions::default()).await
    }

    /// Every entry matching `options`, following `marker` page by page
    ///
    /// Only an empty page ends the walk: servers may cap pages below the
    /// requested `limit`.
    pub async fn list_all_with(
        &self,
        name: &str,
        mut options: ListOptions,
    ) -> Result<Vec<ObjectEntry>> {
        options.limit.get_or_insert(LIST_PAGE_SIZE);
        let mut entries = Vec::new();
        loop {
            let page = self.list_with(name, options.clone()).await?;
            let Some(last) = page.last() else {
                break;
            };
            options.marker = Some(last.display_name().to_string());
            entries.extend(page);
        }
        Ok(entries)
    }

    /// One listing page
    pub async fn list_with(&self, name: &str, options: ListOptions) -> Result<Vec<ObjectEntry>> {
        let name = ContainerName::parse(name)?;
        let url = self.ctx.url(&name.to_url_path(), &options.query_pairs());
        let request = self.ctx.request(Method::GET, url, &[])?;
        let response = self.ctx.send(request).await?;
        let response = check_status(response, &describe(&name)).await?;

        let body = response.bytes().await?;
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_slice(&body)?)
    }

    /// Container headers (object count, bytes used, ACLs, metadata)
    pub async fn info(&self, name: &str) -> Result<HeaderMap> {
        let name = ContainerName::parse(name)?;
        self.ctx
            .call(Method::HEAD, &name.to_url_path(), &[], &describe(&name))
            .await
    }

    /// Delete every object of the container, concurrently
    pub async fn delete_objects(&self, name: &str) -> Result<BatchDelete> {
        let container = ContainerName::parse(name)?;
        let entries = self.list(name).await?;
        self.delete_listed(&container, entries).await
    }

    async fn delete_listed(
        &self,
        container: &ContainerName,
        entries: Vec<ObjectEntry>,
    ) -> Result<BatchDelete> {
        let paths: Vec<String> = entries
            .into_iter()
            .filter(|entry| !entry.is_dir())
            .map(|entry| format!("{container}/{}", entry.name))
            .collect();
        self.objects.delete_many(paths).await
    }

    /// Delete the container, emptying it first when `force` is set
    pub async fn delete(&self, name: &str, force: bool) -> Result<ContainerDeletion> {
        let container = ContainerName::parse(name)?;
        let entries = self.list(name).await?;

        let files = if entries.is_empty() {
            None
        } else if !force {
            return Err(Error::Conflict(format!(
                "container '{container}' is not empty ({} objects)",
                entries.len()
            )));
        } else {
            let files = self.delete_listed(&container, entries).await?;
            if !files.is_complete() {
                return Err(Error::PartialFailure {
                    failed: files.failed(),
                    total: files.len(),
                });
            }
            Some(files)
        };

        let headers = self
            .ctx
            .call(Method::DELETE, &container.to_url_path(), &[], &describe(&container))
            .await?;
        info!(container = %container, forced = files.is_some(), "Container deleted");

        Ok(match files {
            None => ContainerDeletion::Empty { container: headers },
            Some(files) => ContainerDeletion::Forced {
                files,
                container: headers,
            },
        })
    }

    pub fn metas(&self) -> MetadataStore<ContainerScope> {
        MetadataStore::new(self.ctx.clone())
    }

    pub async fn try_create(&self, name: &str, visibility: Visibility) -> bool {
        report(self.create(name, visibility).await)
    }

    pub async fn try_delete(&self, name: &str, force: bool) -> bool {
        report(self.delete(name, force).await)
    }

    /// `true` only when every object was removed
    pub async fn try_delete_objects(&self, name: &str) -> bool {
        match self.delete_objects(name).await {
            Ok(batch) => batch.is_complete(),
            Err(e) => {
                debug!(error = %e, "Operation failed");
                false
            }
        }
    }
}

fn describe(name: &ContainerName) -> String {
    format!("container '{name}'")
}
