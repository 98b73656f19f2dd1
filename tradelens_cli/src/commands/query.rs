//! The `query` subcommand and the query filter flags shared with `chart`
//! and `export`.

use anyhow::{bail, Result};
use clap::Args;
use tradelens_lib::dataset::DatasetKind;
use tradelens_lib::{
    CountryRef, DatasetConfig, DatasetSession, MeasureType, ProductTypeFilter, QueryFilter,
    QueryOutcome, RawQuery,
};

use crate::output::{print_json, print_rows, OutputFormat};

/// Filter flags describing one query.
///
/// Trade datasets use `--trade-type`, `--from` and `--to`; measure datasets
/// use `--measure`. Flags for the other kind are ignored.
#[derive(Args, Debug, Clone)]
pub struct QueryArgs {
    /// Product codes (comma-separated, e.g. 950300,950490)
    #[arg(long)]
    pub products: Option<String>,

    /// Trade direction, e.g. imports, exports or "Trade: Imports"
    #[arg(long)]
    pub trade_type: Option<String>,

    /// Origin country name, code, or everywhere/world (repeatable)
    #[arg(long = "from")]
    pub from_countries: Vec<String>,

    /// Destination country name, code, or everywhere/world (repeatable)
    #[arg(long = "to")]
    pub to_countries: Vec<String>,

    /// Measure for manufacturing datasets: value, volume, other
    #[arg(long, default_value = "value")]
    pub measure: String,

    /// First year (defaults to the dataset's range)
    #[arg(long)]
    pub start_year: Option<i32>,

    /// Last year (defaults to the dataset's range)
    #[arg(long)]
    pub end_year: Option<i32>,

    /// Name to attach to the query
    #[arg(long)]
    pub name: Option<String>,
}

impl QueryArgs {
    pub fn to_raw_query(&self, config: &DatasetConfig) -> Result<RawQuery> {
        let filter = match config.kind {
            DatasetKind::Trade => {
                let trade_type = match (&self.trade_type, config.query.trade_type_options.first()) {
                    (Some(t), _) => t.clone(),
                    (None, Some(default)) => default.clone(),
                    (None, None) => bail!("--trade-type is required for dataset {}", config.id),
                };
                QueryFilter::Trade {
                    trade_type,
                    from_countries: country_refs(&self.from_countries),
                    to_countries: country_refs(&self.to_countries),
                }
            }
            DatasetKind::Measure => QueryFilter::Measure {
                measure_type: self.measure.parse::<MeasureType>()?,
                product_type_filter: ProductTypeFilter::default(),
            },
        };

        let mut query = RawQuery::new(config, filter).with_years(
            self.start_year.unwrap_or(config.defaults.start_year),
            self.end_year.unwrap_or(config.defaults.end_year),
        );
        if let Some(ref products) = self.products {
            for code in products.split(',').map(str::trim).filter(|c| !c.is_empty()) {
                query = query.with_product_code(config, code);
            }
        }
        if let Some(ref name) = self.name {
            query = query.with_name(name);
        }
        Ok(query)
    }
}

fn country_refs(values: &[String]) -> Vec<CountryRef> {
    values.iter().map(|v| CountryRef::parse(v.trim())).collect()
}

/// Runs `args` and returns the outcome, failing if a newer request
/// superseded it.
pub async fn execute(
    args: &QueryArgs,
    session: &DatasetSession,
    page: u32,
    page_size: u32,
) -> Result<QueryOutcome> {
    let query = args.to_raw_query(session.config())?;
    match session.run_query(&query, page, page_size).await? {
        Some(outcome) => Ok(outcome),
        None => bail!("query {} was superseded before it completed", query.id),
    }
}

#[derive(Args)]
pub struct QueryCommandArgs {
    #[command(flatten)]
    pub query: QueryArgs,

    /// Page number
    #[arg(long, default_value = "1")]
    pub page: u32,

    /// Results per page (defaults to the dataset's page size)
    #[arg(long)]
    pub page_size: Option<u32>,
}

pub async fn run(
    args: &QueryCommandArgs,
    session: &DatasetSession,
    format: &OutputFormat,
) -> Result<()> {
    let page_size = args
        .page_size
        .unwrap_or(session.config().defaults.page_size);
    let outcome = execute(&args.query, session, args.page, page_size).await?;
    let page = &outcome.page;

    if page.is_empty() {
        eprintln!("No results");
        return Ok(());
    }

    if let OutputFormat::Json = format {
        print_json(page);
        return Ok(());
    }

    eprintln!(
        "Page {}/{} ({} total records)",
        args.page.max(1),
        page.total_pages,
        page.total_records
    );
    print_rows(&page.rows, format)
}
