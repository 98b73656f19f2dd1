//! The `export` subcommand: writes a query's results to a CSV file.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::Args;
use tradelens_lib::{export_filename, to_csv, DatasetSession};

use crate::commands::query::{execute, QueryArgs};

#[derive(Args)]
pub struct ExportArgs {
    #[command(flatten)]
    pub query: QueryArgs,

    /// File name stem (defaults to `<dataset>-data`)
    #[arg(long)]
    pub file_name: Option<String>,

    /// Directory to write into
    #[arg(long, default_value = ".")]
    pub out_dir: PathBuf,

    /// Rows to fetch (defaults to the dataset's export page size)
    #[arg(long)]
    pub limit: Option<u32>,
}

pub async fn run(args: &ExportArgs, session: &DatasetSession) -> Result<()> {
    let config = session.config();
    let outcome = execute(&args.query, session, 1, config.defaults.page_size).await?;
    let limit = args.limit.unwrap_or(config.defaults.export_page_size);
    let Some(page) = session.fetch_large_with(&outcome, limit).await else {
        bail!("export fetch was superseded");
    };
    if page.is_empty() {
        bail!("no rows to export");
    }

    let csv = to_csv(&page.rows)?;
    let path = args.out_dir.join(export_filename(
        &config.id,
        args.file_name.as_deref(),
        Utc::now(),
    ));
    std::fs::write(&path, csv).with_context(|| format!("writing {}", path.display()))?;

    tracing::info!("Exported {} rows to {}", page.rows.len(), path.display());
    if page.total_records > page.rows.len() as u64 {
        eprintln!(
            "Note: exported {} of {} records; raise --limit for more",
            page.rows.len(),
            page.total_records
        );
    }
    println!("{}", path.display());
    Ok(())
}
