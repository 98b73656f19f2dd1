//! Product and country suggestion lookups.
//!
//! Failures degrade to an empty suggestion list.

use std::sync::Arc;

use tradelens_api::types::Row;
use tradelens_api::{Client, NormalizedQueryParams};

use crate::dataset::DatasetConfig;
use crate::normalize::ProductTypeFilter;

/// Name of the parameter narrowing product suggestions by hierarchy level.
const TYPE_FILTER_PARAM: &str = "type";

#[derive(Clone)]
pub struct SuggestionSearch {
    client: Client,
    config: Arc<DatasetConfig>,
}

impl SuggestionSearch {
    pub fn new(client: Client, config: Arc<DatasetConfig>) -> Self {
        Self { client, config }
    }

    /// Products matching `term`. An empty term returns nothing without a request.
    pub async fn search_products(
        &self,
        term: &str,
        type_filter: Option<ProductTypeFilter>,
    ) -> Vec<Row> {
        if term.is_empty() {
            return Vec::new();
        }
        let mapping = &self.config.product;
        let mut params = NormalizedQueryParams::new();
        params.set(&mapping.search_param, term);
        params.set(&mapping.limit_param, mapping.default_limit.to_string());
        if let (Some(param), Some(value)) = (&mapping.product_type_param, &mapping.product_type) {
            params.set(param, value.as_str());
        }
        if let Some(filter) = type_filter {
            params.set(TYPE_FILTER_PARAM, filter.as_str());
        }
        self.fetch("products", &self.config.endpoints.products, &params)
            .await
    }

    /// Countries matching `term`; an empty term lists the first countries.
    /// Datasets without a country dimension always return nothing.
    pub async fn search_countries(&self, term: &str) -> Vec<Row> {
        let Some(mapping) = self.config.country.as_ref() else {
            return Vec::new();
        };
        let mut params = NormalizedQueryParams::new();
        params.set(&mapping.search_param, term);
        params.set(&mapping.limit_param, mapping.default_limit.to_string());
        self.fetch("countries", &self.config.endpoints.countries, &params)
            .await
    }

    async fn fetch(&self, what: &str, path: &str, params: &NormalizedQueryParams) -> Vec<Row> {
        let url = match self.client.get_url(path, Some(params)) {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!("Failed to search {}: {}", what, e);
                return Vec::new();
            }
        };
        match self.client.get_records(url).await {
            Ok(records) => records,
            Err(e) => {
                tracing::warn!("Failed to search {}: {}", what, e);
                Vec::new()
            }
        }
    }
}
