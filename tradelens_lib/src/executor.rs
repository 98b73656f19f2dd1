//! Paginated query execution that never fails.
//!
//! Every network, status, or parse failure is logged and degraded to
//! [`PageResult::empty`], so a caller renders "no results" whether the
//! backend found nothing or could not be reached.

use std::sync::Arc;

use serde::Serialize;
use tradelens_api::types::{PageResult, Row};
use tradelens_api::{Client, NormalizedQueryParams};
use url::Url;

use crate::dataset::DatasetConfig;

/// The result of one query execution.
#[derive(Debug, Clone, Serialize)]
pub struct QueryOutcome {
    pub page: PageResult<Row>,
    /// The request URL without pagination parameters, for re-issuing the same
    /// query at another page size. `None` only if the URL could not be built.
    #[serde(serialize_with = "serialize_url")]
    pub query_url: Option<Url>,
}

fn serialize_url<S>(url: &Option<Url>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    match url {
        Some(url) => serializer.serialize_some(url.as_str()),
        None => serializer.serialize_none(),
    }
}

impl QueryOutcome {
    fn failed(query_url: Option<Url>) -> Self {
        Self {
            page: PageResult::empty(),
            query_url,
        }
    }
}

/// Runs normalized queries against one dataset's query endpoint.
#[derive(Clone)]
pub struct PaginatedQueryExecutor {
    client: Client,
    config: Arc<DatasetConfig>,
}

impl PaginatedQueryExecutor {
    pub fn new(client: Client, config: Arc<DatasetConfig>) -> Self {
        Self { client, config }
    }

    /// URL of the query endpoint carrying `params`, without pagination.
    pub fn query_url(&self, params: &NormalizedQueryParams) -> Result<Url, tradelens_api::Error> {
        self.client
            .get_url(&self.config.endpoints.query, Some(params))
    }

    /// Fetches page `page` of `page_size` rows. Both are clamped to at least 1.
    pub async fn execute(
        &self,
        params: &NormalizedQueryParams,
        page: u32,
        page_size: u32,
    ) -> QueryOutcome {
        let url = match self.query_url(params) {
            Ok(url) => url,
            Err(e) => {
                tracing::error!("Failed to build {} query URL: {}", self.config.id, e);
                return QueryOutcome::failed(None);
            }
        };
        let page = self.fetch_url(&url, page, page_size).await;
        QueryOutcome {
            page,
            query_url: Some(url),
        }
    }

    /// Re-issues a query URL previously returned in [`QueryOutcome`].
    pub async fn fetch_url(&self, query_url: &Url, page: u32, page_size: u32) -> PageResult<Row> {
        let request = self.config.page_request(page, page_size);
        match self.client.get_page(query_url, &request).await {
            Ok(envelope) => {
                let result = PageResult::from_envelope(envelope, request.page_size as usize);
                tracing::debug!(
                    "{} page {}/{}: {} rows of {}",
                    self.config.id,
                    request.page,
                    result.total_pages,
                    result.rows.len(),
                    result.total_records
                );
                result
            }
            Err(e) => {
                tracing::warn!("Failed to execute {} query: {}", self.config.id, e);
                PageResult::empty()
            }
        }
    }
}
