//! Account details and container listing

use http::{HeaderMap, Method};

use crate::container::LIST_PAGE_SIZE;
use crate::error::Result;
use crate::metadata::{AccountScope, MetadataStore};
use crate::request::{Context, check_status};
use crate::types::{AccountListing, ContainerEntry, ListOptions};

/// Operations on the account the session is bound to
#[derive(Clone)]
pub struct AccountResource {
    ctx: Context,
}

impl AccountResource {
    pub(crate) fn new(ctx: Context) -> Self {
        Self { ctx }
    }

    /// Account headers and every container, paging by `marker` until an
    /// empty page
    pub async fn all(&self) -> Result<AccountListing> {
        let mut options = ListOptions::default().with_limit(LIST_PAGE_SIZE);
        let mut details = None;
        let mut containers = Vec::new();
        loop {
            let (headers, page) = self.page(&options).await?;
            details.get_or_insert(headers);
            let Some(last) = page.last() else {
                break;
            };
            options.marker = Some(last.name.clone());
            containers.extend(page);
        }

        Ok(AccountListing {
            details: details.unwrap_or_default(),
            containers,
        })
    }

    async fn page(&self, options: &ListOptions) -> Result<(HeaderMap, Vec<ContainerEntry>)> {
        let url = self.ctx.url("", &options.query_pairs());
        let request = self.ctx.request(Method::GET, url, &[])?;
        let response = self.ctx.send(request).await?;
        let response = check_status(response, "account").await?;

        let headers = response.headers.clone();
        let body = response.bytes().await?;
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok((headers, Vec::new()));
        }
        Ok((headers, serde_json::from_slice(&body)?))
    }

    /// Account headers (container count, bytes used, quotas, metadata)
    pub async fn details(&self) -> Result<HeaderMap> {
        Ok(self.all().await?.details)
    }

    pub async fn containers(&self) -> Result<Vec<ContainerEntry>> {
        Ok(self.all().await?.containers)
    }

    pub fn metas(&self) -> MetadataStore<AccountScope> {
        MetadataStore::new(self.ctx.clone())
    }
}
