use anyhow::Result;
use serde::Serialize;
use tabled::builder::Builder;
use tabled::settings::Style;
use tabled::{Table, Tabled};
use tradelens_lib::dataset::DatasetConfig;
use tradelens_lib::types::Row;
use tradelens_lib::{format_value, ChartPoint, ChartSummary, InferredSchema, ValueFormat};

#[derive(Clone, Debug)]
pub enum OutputFormat {
    Table,
    Json,
    Csv,
    Markdown,
}

#[derive(Tabled, Serialize)]
struct ChartRow {
    #[tabled(rename = "Year")]
    #[serde(rename = "Year")]
    year: i32,
    #[tabled(rename = "Group")]
    #[serde(rename = "Group")]
    group: String,
    #[tabled(rename = "Value")]
    #[serde(rename = "Value")]
    value: String,
    #[tabled(rename = "Rows")]
    #[serde(rename = "Rows")]
    rows: usize,
}

#[derive(Tabled, Serialize)]
struct DatasetRow {
    #[tabled(rename = "ID")]
    #[serde(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    #[serde(rename = "Name")]
    name: String,
    #[tabled(rename = "Kind")]
    #[serde(rename = "Kind")]
    kind: String,
    #[tabled(rename = "Years")]
    #[serde(rename = "Years")]
    years: String,
    #[tabled(rename = "Description")]
    #[serde(rename = "Description")]
    description: String,
}

// -- Row builders --

fn build_chart_rows(points: &[ChartPoint], format: ValueFormat) -> Vec<ChartRow> {
    points
        .iter()
        .map(|p| ChartRow {
            year: p.year(),
            group: p.group_key.clone(),
            value: format_value(p.aggregate_value, format),
            rows: p.sample_count,
        })
        .collect()
}

fn build_dataset_rows(datasets: &[&DatasetConfig]) -> Vec<DatasetRow> {
    datasets
        .iter()
        .map(|d| DatasetRow {
            id: d.id.clone(),
            name: d.name.clone(),
            kind: format!("{:?}", d.kind).to_lowercase(),
            years: format!("{}-{}", d.defaults.start_year, d.defaults.end_year),
            description: d.description.clone(),
        })
        .collect()
}

/// Table over dynamic rows in `schema`'s column order.
fn build_row_table(schema: &InferredSchema, rows: &[Row]) -> Table {
    let mut builder = Builder::default();
    builder.push_record(schema.labels.clone());
    for row in rows {
        builder.push_record(schema.cells(row));
    }
    builder.build()
}

// -- Dynamic rows --

pub fn print_rows(rows: &[Row], format: &OutputFormat) -> Result<()> {
    let schema = InferredSchema::from_rows(rows);
    match format {
        OutputFormat::Table => println!("{}", build_row_table(&schema, rows)),
        OutputFormat::Markdown => {
            let mut table = build_row_table(&schema, rows);
            table.with(Style::markdown());
            println!("{}", table);
        }
        OutputFormat::Csv => println!("{}", schema.to_csv(rows)?),
        OutputFormat::Json => print_json(&rows),
    }
    Ok(())
}

// -- Chart output --

pub fn print_chart(
    points: &[ChartPoint],
    value_format: ValueFormat,
    format: &OutputFormat,
) -> Result<()> {
    match format {
        OutputFormat::Table => println!("{}", Table::new(build_chart_rows(points, value_format))),
        OutputFormat::Markdown => {
            let mut table = Table::new(build_chart_rows(points, value_format));
            table.with(Style::markdown());
            println!("{}", table);
        }
        OutputFormat::Csv => {
            let mut wtr = csv::Writer::from_writer(std::io::stdout());
            for row in build_chart_rows(points, value_format) {
                wtr.serialize(row)?;
            }
            wtr.flush()?;
        }
        OutputFormat::Json => print_json(&points),
    }
    Ok(())
}

pub fn print_chart_summary(summary: &ChartSummary, value_format: ValueFormat) {
    let years = match summary.year_range {
        Some((first, last)) if first == last => first.to_string(),
        Some((first, last)) => format!("{}-{}", first, last),
        None => "none".to_string(),
    };
    eprintln!(
        "{} points across {} series, years {}, total {}",
        summary.data_points,
        summary.series,
        years,
        format_value(summary.total_value, value_format)
    );
}

// -- Datasets --

pub fn print_datasets(datasets: &[&DatasetConfig], format: &OutputFormat) -> Result<()> {
    let rows = build_dataset_rows(datasets);
    match format {
        OutputFormat::Table => println!("{}", Table::new(rows)),
        OutputFormat::Markdown => {
            let mut table = Table::new(rows);
            table.with(Style::markdown());
            println!("{}", table);
        }
        OutputFormat::Csv => {
            let mut wtr = csv::Writer::from_writer(std::io::stdout());
            for row in rows {
                wtr.serialize(row)?;
            }
            wtr.flush()?;
        }
        OutputFormat::Json => print_json(&rows),
    }
    Ok(())
}

// -- JSON output --

pub fn print_json<T: serde::Serialize>(data: &T) {
    match serde_json::to_string_pretty(data) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Failed to serialize to JSON: {}", e),
    }
}
