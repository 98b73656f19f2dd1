//! The `chart` subcommand: aggregates a query's rows into per-year series.

use anyhow::{anyhow, bail, Result};
use clap::Args;
use tradelens_lib::{ChartAggregator, ChartSummary, ChartType, DatasetSession};

use crate::commands::query::{execute, QueryArgs};
use crate::output::{print_chart, print_chart_summary, OutputFormat};

#[derive(Args)]
pub struct ChartArgs {
    #[command(flatten)]
    pub query: QueryArgs,

    /// Metric to sum (defaults to the dataset's default metric)
    #[arg(long)]
    pub metric: Option<String>,

    /// Grouping dimension (defaults to the dataset's default grouping)
    #[arg(long)]
    pub group_by: Option<String>,

    /// Chart type: line, bar, area
    #[arg(long, default_value = "line")]
    pub chart_type: String,
}

pub async fn run(args: &ChartArgs, session: &DatasetSession, format: &OutputFormat) -> Result<()> {
    let settings = &session.config().chart;
    let metric_name = args.metric.as_deref().unwrap_or(&settings.default_metric);
    let group_name = args
        .group_by
        .as_deref()
        .unwrap_or(&settings.default_group_by);
    let chart_type: ChartType = args.chart_type.parse()?;

    let metric = settings.metric(metric_name).ok_or_else(|| {
        anyhow!(
            "unknown metric {} (available: {})",
            metric_name,
            settings
                .metrics
                .iter()
                .map(|m| m.value.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        )
    })?;
    let Some(aggregator) = ChartAggregator::from_settings(settings, metric_name, group_name) else {
        bail!(
            "unknown grouping {} (available: {})",
            group_name,
            settings
                .group_by
                .iter()
                .map(|g| g.value.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        );
    };

    let outcome = execute(&args.query, session, 1, session.config().defaults.page_size).await?;
    let Some(page) = session.fetch_large(&outcome).await else {
        bail!("chart fetch was superseded");
    };
    if page.is_empty() {
        eprintln!("No results");
        return Ok(());
    }

    let points = aggregator.aggregate(&page.rows);
    eprintln!("{} chart of {} by {}", chart_type, metric.label, group_name);
    print_chart_summary(&ChartSummary::from_points(&points), metric.format);
    print_chart(&points, metric.format, format)
}
