//! Per-dataset pipeline: resolver, normalizer, executor and suggestion search
//! behind one handle, with latest-request-wins sequencing per slot.

use std::sync::Arc;

use tokio::sync::OnceCell;
use tradelens_api::types::{PageResult, Row};
use tradelens_api::{Client, NormalizedQueryParams};

use crate::country::CountryCodeResolver;
use crate::dataset::DatasetConfig;
use crate::error::TradeLensError;
use crate::executor::{PaginatedQueryExecutor, QueryOutcome};
use crate::normalize::{ProductTypeFilter, QueryNormalizer, RawQuery};
use crate::search::SuggestionSearch;
use crate::sequence::RequestSlot;

/// Everything needed to work against one selected dataset.
///
/// Selecting another dataset means building a new session; the country
/// resolver is never carried across datasets.
pub struct DatasetSession {
    config: Arc<DatasetConfig>,
    client: Client,
    executor: PaginatedQueryExecutor,
    search: SuggestionSearch,
    resolver: OnceCell<Arc<CountryCodeResolver>>,
    product_slot: RequestSlot,
    country_slot: RequestSlot,
    query_slot: RequestSlot,
    bulk_slot: RequestSlot,
}

impl DatasetSession {
    /// Session using a client pointed at the dataset's `api_base`.
    pub fn new(config: Arc<DatasetConfig>) -> Result<Self, TradeLensError> {
        let client = Client::with_base_url(&config.api_base)?;
        Ok(Self::with_client(client, config))
    }

    pub fn with_client(client: Client, config: Arc<DatasetConfig>) -> Self {
        Self {
            executor: PaginatedQueryExecutor::new(client.clone(), Arc::clone(&config)),
            search: SuggestionSearch::new(client.clone(), Arc::clone(&config)),
            resolver: OnceCell::new(),
            product_slot: RequestSlot::new("product search"),
            country_slot: RequestSlot::new("country search"),
            query_slot: RequestSlot::new("query"),
            bulk_slot: RequestSlot::new("bulk fetch"),
            client,
            config,
        }
    }

    pub fn config(&self) -> &Arc<DatasetConfig> {
        &self.config
    }

    pub fn executor(&self) -> &PaginatedQueryExecutor {
        &self.executor
    }

    /// The dataset's country resolver, fetched on first use.
    ///
    /// Concurrent first callers share a single fetch.
    pub async fn resolver(&self) -> Arc<CountryCodeResolver> {
        self.resolver
            .get_or_init(|| async {
                Arc::new(CountryCodeResolver::build(&self.client, &self.config).await)
            })
            .await
            .clone()
    }

    pub async fn normalize(&self, query: &RawQuery) -> Result<NormalizedQueryParams, TradeLensError> {
        let resolver = self.resolver().await;
        QueryNormalizer::new(&self.config, &resolver).normalize(query)
    }

    /// Product suggestions, or `None` if a newer product search superseded this one.
    pub async fn search_products(
        &self,
        term: &str,
        type_filter: Option<ProductTypeFilter>,
    ) -> Option<Vec<Row>> {
        let ticket = self.product_slot.begin();
        ticket
            .run(self.search.search_products(term, type_filter))
            .await
    }

    /// Country suggestions, or `None` if a newer country search superseded this one.
    pub async fn search_countries(&self, term: &str) -> Option<Vec<Row>> {
        let ticket = self.country_slot.begin();
        ticket.run(self.search.search_countries(term)).await
    }

    /// Normalizes and runs `query`.
    ///
    /// `Ok(None)` means a newer query was started before this one landed.
    /// Backend failures surface as an empty page, never as `Err`.
    pub async fn run_query(
        &self,
        query: &RawQuery,
        page: u32,
        page_size: u32,
    ) -> Result<Option<QueryOutcome>, TradeLensError> {
        let ticket = self.query_slot.begin();
        let params = self.normalize(query).await?;
        tracing::info!(
            "Running {} query {} (page {}, {} per page)",
            self.config.id,
            query.id,
            page,
            page_size
        );
        Ok(ticket
            .run(self.executor.execute(&params, page, page_size))
            .await)
    }

    /// Re-fetches the first page of a finished query at the dataset's export
    /// page size, for charting or export.
    pub async fn fetch_large(&self, outcome: &QueryOutcome) -> Option<PageResult<Row>> {
        self.fetch_large_with(outcome, self.config.defaults.export_page_size)
            .await
    }

    pub async fn fetch_large_with(
        &self,
        outcome: &QueryOutcome,
        page_size: u32,
    ) -> Option<PageResult<Row>> {
        let Some(url) = outcome.query_url.as_ref() else {
            return Some(PageResult::empty());
        };
        let ticket = self.bulk_slot.begin();
        ticket.run(self.executor.fetch_url(url, 1, page_size)).await
    }

    /// Supersedes every in-flight request of this session.
    pub fn cancel_all(&self) {
        for slot in [
            &self.product_slot,
            &self.country_slot,
            &self.query_slot,
            &self.bulk_slot,
        ] {
            slot.cancel();
        }
        tracing::debug!("Cancelled outstanding {} requests", self.config.id);
    }
}
