//! Turns user-authored queries into the backend's canonical parameter set.
//!
//! A [`RawQuery`] carries filters the way the user picked them: direction
//! labels such as `"Trade: Imports"`, whole product records, and countries
//! in any [`CountryRef`] form. [`QueryNormalizer`] reduces that to a flat
//! [`NormalizedQueryParams`] whose key names come from the dataset table.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tradelens_api::types::{field_text, Row};
use tradelens_api::NormalizedQueryParams;

use crate::country::{CountryCodeResolver, CountryRef, Sentinel};
use crate::dataset::{CanonicalParam, DatasetConfig, DatasetKind};
use crate::error::TradeLensError;

/// Opaque query identifier (creation time in epoch milliseconds).
pub type QueryId = i64;

/// Measure requested from a manufacturing dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MeasureType {
    Value,
    Volume,
    /// Average price and other measures.
    Other,
}

impl MeasureType {
    /// Value sent in the `measure` parameter.
    pub fn as_param(&self) -> &'static str {
        match self {
            MeasureType::Value => "Value",
            MeasureType::Volume => "Volume",
            MeasureType::Other => "Other",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            MeasureType::Value => "Value",
            MeasureType::Volume => "Volume",
            MeasureType::Other => "Average price/Other",
        }
    }
}

impl FromStr for MeasureType {
    type Err = TradeLensError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "value" => Ok(MeasureType::Value),
            "volume" => Ok(MeasureType::Volume),
            "other" | "average price/other" | "average price" => Ok(MeasureType::Other),
            _ => Err(TradeLensError::InvalidInput(format!(
                "unknown measure type: {}",
                s
            ))),
        }
    }
}

/// Level of the product hierarchy a manufacturing search is restricted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ProductTypeFilter {
    Division,
    Industry,
    #[default]
    Product,
}

impl ProductTypeFilter {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductTypeFilter::Division => "Division",
            ProductTypeFilter::Industry => "Industry",
            ProductTypeFilter::Product => "Product",
        }
    }
}

impl fmt::Display for ProductTypeFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProductTypeFilter {
    type Err = TradeLensError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "division" => Ok(ProductTypeFilter::Division),
            "industry" => Ok(ProductTypeFilter::Industry),
            "product" => Ok(ProductTypeFilter::Product),
            _ => Err(TradeLensError::InvalidInput(format!(
                "unknown product type filter: {}",
                s
            ))),
        }
    }
}

/// Kind-specific part of a query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum QueryFilter {
    Trade {
        /// Direction label, with or without a `"Trade: "` prefix.
        trade_type: String,
        #[serde(default)]
        from_countries: Vec<CountryRef>,
        #[serde(default)]
        to_countries: Vec<CountryRef>,
    },
    Measure {
        measure_type: MeasureType,
        /// Only narrows product suggestions; not sent with the query.
        #[serde(default)]
        product_type_filter: ProductTypeFilter,
    },
}

impl QueryFilter {
    pub fn kind(&self) -> DatasetKind {
        match self {
            QueryFilter::Trade { .. } => DatasetKind::Trade,
            QueryFilter::Measure { .. } => DatasetKind::Measure,
        }
    }
}

/// A user-authored filter set. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawQuery {
    pub id: QueryId,
    pub dataset: String,
    #[serde(default)]
    pub name: Option<String>,
    /// Selected product records; each carries at least the dataset's code field.
    #[serde(default)]
    pub products: Vec<Row>,
    pub start_year: i32,
    pub end_year: i32,
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub filter: QueryFilter,
}

impl RawQuery {
    /// Starts a query against `config` with the dataset's default year range.
    pub fn new(config: &DatasetConfig, filter: QueryFilter) -> Self {
        let created_at = Utc::now();
        Self {
            id: created_at.timestamp_millis(),
            dataset: config.id.clone(),
            name: None,
            products: Vec::new(),
            start_year: config.defaults.start_year,
            end_year: config.defaults.end_year,
            created_at,
            filter,
        }
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    pub fn with_product(mut self, product: Row) -> Self {
        self.products.push(product);
        self
    }

    pub fn with_products(mut self, products: &[Row]) -> Self {
        self.products.extend_from_slice(products);
        self
    }

    /// Adds a product known only by its code.
    pub fn with_product_code(self, config: &DatasetConfig, code: &str) -> Self {
        let mut product = Row::new();
        product.insert(
            config.product.code_field.clone(),
            Value::String(code.to_string()),
        );
        self.with_product(product)
    }

    pub fn with_years(mut self, start_year: i32, end_year: i32) -> Self {
        self.start_year = start_year;
        self.end_year = end_year;
        self
    }

    /// Rebuilds a canonical query from previously normalized parameters.
    ///
    /// Product codes become bare code records and country codes become coded
    /// references, so normalizing the result reproduces `params` exactly.
    pub fn from_params(
        config: &DatasetConfig,
        params: &NormalizedQueryParams,
    ) -> Result<Self, TradeLensError> {
        let filter = match config.kind {
            DatasetKind::Trade => {
                let trade_type = require_param(config, params, CanonicalParam::TradeType)?;
                let from = require_param(config, params, CanonicalParam::FromCountry)?;
                let to = require_param(config, params, CanonicalParam::ToCountry)?;
                QueryFilter::Trade {
                    trade_type: trade_type.to_string(),
                    from_countries: split_countries(from),
                    to_countries: split_countries(to),
                }
            }
            DatasetKind::Measure => QueryFilter::Measure {
                measure_type: require_param(config, params, CanonicalParam::Measure)?.parse()?,
                product_type_filter: ProductTypeFilter::default(),
            },
        };

        let start_year = parse_year_param(config, params, CanonicalParam::YearFrom)?;
        let end_year = parse_year_param(config, params, CanonicalParam::YearTo)?;
        let mut query = RawQuery::new(config, filter).with_years(start_year, end_year);
        let codes = require_param(config, params, CanonicalParam::ProductCodes)?;
        if !codes.is_empty() {
            for code in codes.split(',') {
                query = query.with_product_code(config, code);
            }
        }
        Ok(query)
    }
}

fn require_param<'p>(
    config: &DatasetConfig,
    params: &'p NormalizedQueryParams,
    param: CanonicalParam,
) -> Result<&'p str, TradeLensError> {
    let key = config.param_name(param);
    params
        .get(key)
        .ok_or_else(|| TradeLensError::InvalidInput(format!("missing parameter {}", key)))
}

fn parse_year_param(
    config: &DatasetConfig,
    params: &NormalizedQueryParams,
    param: CanonicalParam,
) -> Result<i32, TradeLensError> {
    let raw = require_param(config, params, param)?;
    raw.trim().parse::<i32>().map_err(|_| {
        TradeLensError::InvalidInput(format!("{} is not a year: {}", param.as_str(), raw))
    })
}

fn split_countries(joined: &str) -> Vec<CountryRef> {
    joined
        .split(',')
        .map(|code| match Sentinel::parse(code) {
            Some(sentinel) => CountryRef::Sentinel(sentinel),
            None => CountryRef::coded(code, code),
        })
        .collect()
}

/// Strips an optional `"Trade:"` prefix and lowercases the rest.
///
/// `"Trade: Imports"`, `"imports"` and `"IMPORTS"` all become `"imports"`.
pub fn normalize_trade_direction(label: &str) -> String {
    let mut direction = label.trim().to_lowercase();
    while let Some(rest) = direction.strip_prefix("trade:") {
        direction = rest.trim_start().to_string();
    }
    direction
}

/// Produces [`NormalizedQueryParams`] for one dataset.
pub struct QueryNormalizer<'a> {
    config: &'a DatasetConfig,
    resolver: &'a CountryCodeResolver,
}

impl<'a> QueryNormalizer<'a> {
    pub fn new(config: &'a DatasetConfig, resolver: &'a CountryCodeResolver) -> Self {
        Self { config, resolver }
    }

    /// Joins the selected products' codes with `,` in selection order.
    /// Duplicates are kept.
    pub fn product_codes(&self, products: &[Row]) -> String {
        products
            .iter()
            .map(|p| field_text(p, &self.config.product.code_field))
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Resolves and joins countries with `,`; no selection means everywhere.
    pub fn country_codes(&self, countries: &[CountryRef]) -> String {
        if countries.is_empty() {
            return Sentinel::Everywhere.as_str().to_string();
        }
        countries
            .iter()
            .map(|c| self.resolver.resolve(c))
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Normalizes `query`. Fails only when the query targets another dataset
    /// or its filter kind does not match the dataset kind.
    pub fn normalize(&self, query: &RawQuery) -> Result<NormalizedQueryParams, TradeLensError> {
        if query.dataset != self.config.id {
            return Err(TradeLensError::InvalidInput(format!(
                "query for dataset {} normalized against {}",
                query.dataset, self.config.id
            )));
        }
        if query.filter.kind() != self.config.kind {
            return Err(TradeLensError::InvalidInput(format!(
                "{:?} query does not fit {:?} dataset {}",
                query.filter.kind(),
                self.config.kind,
                self.config.id
            )));
        }

        let name = |param: CanonicalParam| self.config.param_name(param);
        let mut params = NormalizedQueryParams::new();
        match &query.filter {
            QueryFilter::Trade {
                trade_type,
                from_countries,
                to_countries,
            } => {
                params.set(
                    name(CanonicalParam::TradeType),
                    normalize_trade_direction(trade_type),
                );
                params.set(
                    name(CanonicalParam::ProductCodes),
                    self.product_codes(&query.products),
                );
                params.set(
                    name(CanonicalParam::FromCountry),
                    self.country_codes(from_countries),
                );
                params.set(
                    name(CanonicalParam::ToCountry),
                    self.country_codes(to_countries),
                );
                params.set(name(CanonicalParam::YearFrom), query.start_year.to_string());
                params.set(name(CanonicalParam::YearTo), query.end_year.to_string());
            }
            QueryFilter::Measure { measure_type, .. } => {
                params.set(
                    name(CanonicalParam::ProductCodes),
                    self.product_codes(&query.products),
                );
                params.set(name(CanonicalParam::YearFrom), query.start_year.to_string());
                params.set(name(CanonicalParam::YearTo), query.end_year.to_string());
                params.set(name(CanonicalParam::Measure), measure_type.as_param());
            }
        }
        Ok(params)
    }
}
