//! Per-dataset configuration tables.
//!
//! Each dataset (BACI trade flows, PRODCOM manufacturing measures, ...) is
//! described by a YAML table embedded at compile time: which JSON fields hold
//! product and country codes, which endpoints to call, and what the backend
//! calls each query parameter. Tables are validated once on load and shared
//! as `Arc<DatasetConfig>` for the rest of the session.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use serde::Deserialize;
use thiserror::Error;
use tradelens_api::PageRequest;

/// Error types for dataset configuration lookup and loading.
#[derive(Error, Debug)]
pub enum DatasetConfigError {
    #[error("Unknown dataset: {0}")]
    UnknownDataset(String),
    #[error("Failed to parse dataset YAML: {0}")]
    YamlParse(#[from] serde_yml::Error),
    #[error("Dataset {dataset} has no mapping for query parameter {param}")]
    MissingParam {
        dataset: String,
        param: &'static str,
    },
    #[error("Trade dataset {0} has no country mapping")]
    MissingCountryMapping(String),
    #[error("Dataset {0} must have a default page size of at least 1")]
    InvalidDefaults(String),
    #[error("Duplicate dataset id: {0}")]
    DuplicateDataset(String),
}

/// Which family of query a dataset answers.
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DatasetKind {
    /// Country-pair trade flows (BACI-style).
    Trade,
    /// Product measures without a country dimension (PRODCOM-style).
    Measure,
}

/// Canonical names of the parameters the normalizer produces. The dataset's
/// `query.params` table maps each one to the name the backend expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CanonicalParam {
    TradeType,
    ProductCodes,
    FromCountry,
    ToCountry,
    YearFrom,
    YearTo,
    Measure,
    Page,
    PageSize,
}

impl CanonicalParam {
    pub fn as_str(&self) -> &'static str {
        match self {
            CanonicalParam::TradeType => "trade_type",
            CanonicalParam::ProductCodes => "product_codes",
            CanonicalParam::FromCountry => "from_country",
            CanonicalParam::ToCountry => "to_country",
            CanonicalParam::YearFrom => "year_from",
            CanonicalParam::YearTo => "year_to",
            CanonicalParam::Measure => "measure",
            CanonicalParam::Page => "page",
            CanonicalParam::PageSize => "page_size",
        }
    }

    /// Parameters a dataset of `kind` must map.
    pub fn required_for(kind: DatasetKind) -> &'static [CanonicalParam] {
        match kind {
            DatasetKind::Trade => &[
                CanonicalParam::TradeType,
                CanonicalParam::ProductCodes,
                CanonicalParam::FromCountry,
                CanonicalParam::ToCountry,
                CanonicalParam::YearFrom,
                CanonicalParam::YearTo,
                CanonicalParam::Page,
                CanonicalParam::PageSize,
            ],
            DatasetKind::Measure => &[
                CanonicalParam::ProductCodes,
                CanonicalParam::YearFrom,
                CanonicalParam::YearTo,
                CanonicalParam::Measure,
                CanonicalParam::Page,
                CanonicalParam::PageSize,
            ],
        }
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct Endpoints {
    pub products: String,
    pub countries: String,
    pub query: String,
}

/// Where product suggestion records keep their code and name.
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct ProductMapping {
    pub code_field: String,
    pub name_field: String,
    pub search_param: String,
    pub limit_param: String,
    pub default_limit: u32,
    /// Extra parameter pinning the product nomenclature (e.g. `product_type=hs6_products`).
    #[serde(default)]
    pub product_type_param: Option<String>,
    #[serde(default)]
    pub product_type: Option<String>,
}

/// Where country records keep their code and name.
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct CountryMapping {
    pub code_field: String,
    pub name_field: String,
    pub search_param: String,
    pub limit_param: String,
    pub default_limit: u32,
    /// Limit used when fetching the full list for the name-to-code table.
    #[serde(default = "CountryMapping::default_lookup_limit")]
    pub lookup_limit: u32,
}

impl CountryMapping {
    const fn default_lookup_limit() -> u32 {
        1000
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct QueryMapping {
    /// Canonical parameter name to backend parameter name.
    pub params: HashMap<String, String>,
    /// Trade direction labels offered to the user, e.g. `"Trade: Imports"`.
    #[serde(default)]
    pub trade_type_options: Vec<String>,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct Defaults {
    pub page_size: u32,
    pub export_page_size: u32,
    pub start_year: i32,
    pub end_year: i32,
}

/// How a metric's values should be displayed.
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ValueFormat {
    Currency,
    #[default]
    Number,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct MetricOption {
    pub value: String,
    pub label: String,
    #[serde(default)]
    pub format: ValueFormat,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct GroupByOption {
    pub value: String,
    pub label: String,
    /// Row field holding the group value; differs from `value` for PRODCOM
    /// products, which group by `description`.
    pub field: String,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct ChartSettings {
    pub date_field: String,
    pub default_metric: String,
    pub default_group_by: String,
    pub metrics: Vec<MetricOption>,
    pub group_by: Vec<GroupByOption>,
}

impl ChartSettings {
    pub fn metric(&self, value: &str) -> Option<&MetricOption> {
        self.metrics.iter().find(|m| m.value == value)
    }

    pub fn group_by_option(&self, value: &str) -> Option<&GroupByOption> {
        self.group_by.iter().find(|g| g.value == value)
    }
}

/// One dataset's field-mapping table.
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct DatasetConfig {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub kind: DatasetKind,
    /// Filled from the global table unless a dataset pins its own.
    #[serde(default)]
    pub api_base: String,
    pub endpoints: Endpoints,
    pub product: ProductMapping,
    #[serde(default)]
    pub country: Option<CountryMapping>,
    pub query: QueryMapping,
    pub defaults: Defaults,
    pub chart: ChartSettings,
}

impl DatasetConfig {
    /// Backend name for a canonical parameter. Falls back to the canonical
    /// name, which only happens for parameters the dataset kind does not need.
    pub fn param_name(&self, param: CanonicalParam) -> &str {
        self.query
            .params
            .get(param.as_str())
            .map(String::as_str)
            .unwrap_or(param.as_str())
    }

    /// Page request carrying this dataset's pagination parameter names.
    pub fn page_request(&self, page: u32, page_size: u32) -> PageRequest {
        PageRequest::new(page, page_size).with_param_names(
            self.param_name(CanonicalParam::Page),
            self.param_name(CanonicalParam::PageSize),
        )
    }

    fn validate(&self) -> Result<(), DatasetConfigError> {
        for param in CanonicalParam::required_for(self.kind) {
            if !self.query.params.contains_key(param.as_str()) {
                return Err(DatasetConfigError::MissingParam {
                    dataset: self.id.clone(),
                    param: param.as_str(),
                });
            }
        }
        if self.kind == DatasetKind::Trade && self.country.is_none() {
            return Err(DatasetConfigError::MissingCountryMapping(self.id.clone()));
        }
        if self.defaults.page_size == 0 || self.defaults.export_page_size == 0 {
            return Err(DatasetConfigError::InvalidDefaults(self.id.clone()));
        }
        Ok(())
    }
}

/// Settings shared by every dataset.
#[derive(Deserialize, Debug, Clone)]
pub struct GlobalConfig {
    pub api_base: String,
}

/// Parse and validate a single dataset table.
pub fn parse_dataset_config(yaml_content: &str) -> Result<DatasetConfig, DatasetConfigError> {
    let config: DatasetConfig = serde_yml::from_str(yaml_content)?;
    config.validate()?;
    Ok(config)
}

/// All known datasets, keyed by id. Loaded once per process.
#[derive(Debug, Clone)]
pub struct DatasetRegistry {
    datasets: BTreeMap<String, Arc<DatasetConfig>>,
}

impl DatasetRegistry {
    /// Parses the global table and each dataset table. Datasets without their
    /// own `api_base` inherit the global one.
    pub fn parse(global_yaml: &str, dataset_yamls: &[&str]) -> Result<Self, DatasetConfigError> {
        let global: GlobalConfig = serde_yml::from_str(global_yaml)?;
        let mut datasets = BTreeMap::new();
        for yaml in dataset_yamls {
            let mut config = parse_dataset_config(yaml)?;
            if config.api_base.is_empty() {
                config.api_base = global.api_base.clone();
            }
            if datasets.contains_key(&config.id) {
                return Err(DatasetConfigError::DuplicateDataset(config.id));
            }
            datasets.insert(config.id.clone(), Arc::new(config));
        }
        Ok(Self { datasets })
    }

    /// Loads the tables embedded at compile time.
    pub fn load_embedded() -> Result<Self, DatasetConfigError> {
        let global = include_str!("../../seed_data/global.yml");
        let baci = include_str!("../../seed_data/datasets/baci.yml");
        let prodcom = include_str!("../../seed_data/datasets/prodcom.yml");
        Self::parse(global, &[baci, prodcom])
    }

    /// Points every dataset at `api_base`.
    pub fn with_api_base(self, api_base: &str) -> Self {
        let datasets = self
            .datasets
            .into_iter()
            .map(|(id, config)| {
                let mut config = Arc::unwrap_or_clone(config);
                config.api_base = api_base.trim_end_matches('/').to_string();
                (id, Arc::new(config))
            })
            .collect();
        Self { datasets }
    }

    pub fn get(&self, id: &str) -> Result<Arc<DatasetConfig>, DatasetConfigError> {
        self.datasets
            .get(id)
            .cloned()
            .ok_or_else(|| DatasetConfigError::UnknownDataset(id.to_string()))
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.datasets.keys().map(String::as_str)
    }
}
