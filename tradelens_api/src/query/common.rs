//! Shared query infrastructure: the [`Query`] trait and [`PageRequest`] pagination.

use url::Url;

/// Trait implemented by everything that contributes query-string parameters.
pub trait Query {
    /// Appends this query's parameters to the given URL, returning the modified URL.
    fn add_to_url(&self, url: &Url) -> Url;
}

/// Pagination for a query endpoint.
///
/// Parameter names vary by dataset, so the request carries the key names
/// alongside the values. Both values are clamped to at least 1.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PageRequest {
    /// Page number (1-indexed).
    pub page: u32,
    /// Results per page.
    pub page_size: u32,
    page_param: String,
    page_size_param: String,
}

impl Default for PageRequest {
    fn default() -> PageRequest {
        PageRequest::new(1, 10)
    }
}

impl PageRequest {
    /// Creates a page request using the backend's default `page` / `page_size` keys.
    pub fn new(page: u32, page_size: u32) -> Self {
        Self {
            page: page.max(1),
            page_size: page_size.max(1),
            page_param: "page".to_string(),
            page_size_param: "page_size".to_string(),
        }
    }

    /// Overrides the parameter names used for the page number and page size.
    pub fn with_param_names(mut self, page_param: &str, page_size_param: &str) -> Self {
        self.page_param = page_param.to_string();
        self.page_size_param = page_size_param.to_string();
        self
    }

    pub fn page_param(&self) -> &str {
        &self.page_param
    }

    pub fn page_size_param(&self) -> &str {
        &self.page_size_param
    }
}

impl Query for PageRequest {
    fn add_to_url(&self, url: &Url) -> Url {
        let mut url = url.clone();
        url.query_pairs_mut()
            .append_pair(&self.page_param, &self.page.to_string())
            .append_pair(&self.page_size_param, &self.page_size.to_string());
        url
    }
}
