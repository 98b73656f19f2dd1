//! Flattening of result rows to CSV text.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tradelens_api::types::{field_text, Row};

use crate::error::TradeLensError;

/// Column order and header labels derived from a result set.
///
/// Columns are the first row's keys in backend order; later rows are read
/// against those columns and any extra keys they carry are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InferredSchema {
    pub columns: Vec<String>,
    pub labels: Vec<String>,
}

impl InferredSchema {
    pub fn from_rows(rows: &[Row]) -> Self {
        let columns: Vec<String> = rows
            .first()
            .map(|row| row.keys().cloned().collect())
            .unwrap_or_default();
        let labels = columns.iter().map(|c| header_label(c)).collect();
        Self { columns, labels }
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Cell texts for `row` in column order.
    pub fn cells(&self, row: &Row) -> Vec<String> {
        self.columns
            .iter()
            .map(|column| field_text(row, column))
            .collect()
    }

    /// Renders `rows` against this schema. A record that is a single empty
    /// cell is written as an empty line.
    pub fn to_csv(&self, rows: &[Row]) -> Result<String, TradeLensError> {
        if self.is_empty() {
            return Ok(String::new());
        }

        let mut builder = csv::WriterBuilder::new();
        builder
            .terminator(csv::Terminator::Any(b'\n'))
            .quote_style(csv::QuoteStyle::Necessary);
        let mut writer = builder.from_writer(Vec::new());
        writer.write_record(&self.labels)?;
        for row in rows {
            let cells = self.cells(row);
            if let [only] = cells.as_slice() {
                if only.is_empty() {
                    writer.flush().map_err(csv::Error::from)?;
                    let mut buf = writer.into_inner().map_err(|e| {
                        TradeLensError::InvalidInput(format!("failed to flush CSV: {}", e))
                    })?;
                    buf.push(b'\n');
                    writer = builder.from_writer(buf);
                    continue;
                }
            }
            writer.write_record(cells)?;
        }

        let bytes = writer
            .into_inner()
            .map_err(|e| TradeLensError::InvalidInput(format!("failed to flush CSV: {}", e)))?;
        let mut text = String::from_utf8(bytes)
            .map_err(|e| TradeLensError::InvalidInput(format!("CSV output is not UTF-8: {}", e)))?;
        if text.ends_with('\n') {
            text.pop();
        }
        Ok(text)
    }
}

/// `product_description` becomes `Product Description`.
pub fn header_label(key: &str) -> String {
    key.split('_')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

/// Renders rows as CSV: one header line of labels, then one line per row,
/// joined by `\n` with no trailing newline. Empty input yields `""`.
pub fn to_csv(rows: &[Row]) -> Result<String, TradeLensError> {
    if rows.is_empty() {
        return Ok(String::new());
    }
    InferredSchema::from_rows(rows).to_csv(rows)
}

/// `<custom>-<epoch-ms>.csv`, or `<dataset>-data-<epoch-ms>.csv` when no
/// custom name (or a blank one) is given.
pub fn export_filename(dataset_id: &str, custom_name: Option<&str>, now: DateTime<Utc>) -> String {
    let stem = match custom_name.map(str::trim) {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => format!("{}-data", dataset_id),
    };
    format!("{}-{}.csv", stem, now.timestamp_millis())
}
