mod commands;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tradelens_lib::{DatasetRegistry, DatasetSession};

use crate::output::OutputFormat;

/// Environment variable overriding the embedded API base URL.
const API_BASE_ENV: &str = "TRADELENS_API_BASE";

#[derive(Parser)]
#[command(name = "tradelens")]
#[command(about = "Query trade and manufacturing statistics from the TradeLens API")]
struct Cli {
    /// Output format: table, json, csv, or markdown
    #[arg(long, default_value = "table", global = true)]
    output: String,

    /// Dataset to work against (see `tradelens datasets`)
    #[arg(long, default_value = "baci", global = true)]
    dataset: String,

    /// Override the API base URL (also read from TRADELENS_API_BASE)
    #[arg(long, global = true)]
    api_base: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the available datasets
    Datasets,
    /// Search product suggestions
    Products(commands::search::ProductsArgs),
    /// Search country suggestions
    Countries(commands::search::CountriesArgs),
    /// Run a query and show one page of results
    Query(commands::query::QueryCommandArgs),
    /// Aggregate query results into chart series
    Chart(commands::chart::ChartArgs),
    /// Export query results to a CSV file
    Export(commands::export::ExportArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("tradelens=info".parse()?),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let format = match cli.output.as_str() {
        "json" => OutputFormat::Json,
        "csv" => OutputFormat::Csv,
        "markdown" | "md" => OutputFormat::Markdown,
        _ => OutputFormat::Table,
    };

    let mut registry = DatasetRegistry::load_embedded()?;
    let api_base = cli
        .api_base
        .clone()
        .or_else(|| std::env::var(API_BASE_ENV).ok());
    if let Some(api_base) = api_base {
        registry = registry.with_api_base(&api_base);
    }

    if let Commands::Datasets = &cli.command {
        return commands::datasets::run(&registry, &format);
    }

    let config = registry.get(&cli.dataset)?;
    let session = DatasetSession::new(config)?;

    match &cli.command {
        Commands::Datasets => {}
        Commands::Products(args) => commands::search::run_products(args, &session, &format).await?,
        Commands::Countries(args) => {
            commands::search::run_countries(args, &session, &format).await?
        }
        Commands::Query(args) => commands::query::run(args, &session, &format).await?,
        Commands::Chart(args) => commands::chart::run(args, &session, &format).await?,
        Commands::Export(args) => commands::export::run(args, &session).await?,
    }

    Ok(())
}
