//! The `products` and `countries` suggestion subcommands.

use anyhow::{bail, Result};
use clap::Args;
use tradelens_lib::{DatasetSession, ProductTypeFilter};

use crate::output::{print_rows, OutputFormat};

#[derive(Args)]
pub struct ProductsArgs {
    /// Search term (code or description)
    pub term: String,

    /// Restrict manufacturing products to a hierarchy level: division, industry, product
    #[arg(long = "type")]
    pub product_type: Option<String>,
}

#[derive(Args)]
pub struct CountriesArgs {
    /// Search term; empty lists the first countries
    #[arg(default_value = "")]
    pub term: String,
}

pub async fn run_products(
    args: &ProductsArgs,
    session: &DatasetSession,
    format: &OutputFormat,
) -> Result<()> {
    let type_filter = args
        .product_type
        .as_deref()
        .map(str::parse::<ProductTypeFilter>)
        .transpose()?;
    let Some(rows) = session.search_products(&args.term, type_filter).await else {
        bail!("product search was superseded");
    };
    if rows.is_empty() {
        eprintln!("No matching products");
        return Ok(());
    }
    print_rows(&rows, format)
}

pub async fn run_countries(
    args: &CountriesArgs,
    session: &DatasetSession,
    format: &OutputFormat,
) -> Result<()> {
    if session.config().country.is_none() {
        bail!("dataset {} has no country dimension", session.config().id);
    }
    let Some(rows) = session.search_countries(&args.term).await else {
        bail!("country search was superseded");
    };
    if rows.is_empty() {
        eprintln!("No matching countries");
        return Ok(());
    }
    print_rows(&rows, format)
}
