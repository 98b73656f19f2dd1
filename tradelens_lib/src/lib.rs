//! Library layer for TradeLens: dataset tables, query normalization, paged
//! execution, chart aggregation and CSV flattening.
//!
//! Wraps the `tradelens_api` crate. Backend failures on the query and
//! suggestion paths degrade to empty results rather than errors.

pub mod chart;
pub mod country;
pub mod csv_export;
pub mod dataset;
pub mod error;
pub mod executor;
pub mod normalize;
pub mod search;
pub mod sequence;
pub mod session;

pub use tradelens_api;
pub use tradelens_api::types;
pub use tradelens_api::{Client, NormalizedQueryParams, PageRequest, Query};

pub use chart::{format_value, ChartAggregator, ChartPoint, ChartSummary, ChartType};
pub use country::{CountryCodeResolver, CountryRef, Sentinel};
pub use csv_export::{export_filename, to_csv, InferredSchema};
pub use dataset::{DatasetConfig, DatasetConfigError, DatasetKind, DatasetRegistry, ValueFormat};
pub use error::TradeLensError;
pub use executor::{PaginatedQueryExecutor, QueryOutcome};
pub use normalize::{
    normalize_trade_direction, MeasureType, ProductTypeFilter, QueryFilter, QueryNormalizer,
    RawQuery,
};
pub use search::SuggestionSearch;
pub use sequence::{RequestSlot, RequestTicket};
pub use session::DatasetSession;
