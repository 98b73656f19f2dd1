//! Regrouping of query rows into per-year chart series.
//!
//! Rows are bucketed by `(year, group)`, the metric is summed per bucket, and
//! buckets whose sum is not a positive finite number are dropped. The result
//! is sorted by year, then group label, so repeated aggregation of the same
//! rows draws identically.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::Serialize;
use serde_json::Value;
use tradelens_api::types::{value_text, Row};

use crate::dataset::{ChartSettings, ValueFormat};
use crate::error::TradeLensError;

/// Mark used to draw a series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartType {
    #[default]
    Line,
    Bar,
    Area,
}

impl fmt::Display for ChartType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ChartType::Line => "line",
            ChartType::Bar => "bar",
            ChartType::Area => "area",
        })
    }
}

impl FromStr for ChartType {
    type Err = TradeLensError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "line" => Ok(ChartType::Line),
            "bar" => Ok(ChartType::Bar),
            "area" => Ok(ChartType::Area),
            _ => Err(TradeLensError::InvalidInput(format!("unknown chart type: {}", s))),
        }
    }
}

/// One aggregated (year, group) bucket.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPoint {
    /// January 1st of the bucket's year.
    pub period_start: NaiveDate,
    pub group_key: String,
    pub aggregate_value: f64,
    pub sample_count: usize,
}

impl ChartPoint {
    pub fn year(&self) -> i32 {
        chrono::Datelike::year(&self.period_start)
    }
}

#[derive(Default)]
struct Bucket {
    sum: f64,
    count: usize,
}

/// Aggregates rows for one (metric, grouping) choice.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartAggregator {
    metric_field: String,
    group_field: String,
    group_label: String,
    period_field: String,
}

impl ChartAggregator {
    pub fn new(metric_field: &str, group_field: &str, group_label: &str, period_field: &str) -> Self {
        Self {
            metric_field: metric_field.to_string(),
            group_field: group_field.to_string(),
            group_label: group_label.to_string(),
            period_field: period_field.to_string(),
        }
    }

    /// Builds an aggregator from a dataset's chart options. `None` when the
    /// metric or group-by option is not offered by the dataset.
    pub fn from_settings(settings: &ChartSettings, metric: &str, group_by: &str) -> Option<Self> {
        let metric = settings.metric(metric)?;
        let group = settings.group_by_option(group_by)?;
        Some(Self::new(
            &metric.value,
            &group.field,
            &group.label,
            &settings.date_field,
        ))
    }

    /// Aggregator for the dataset's default metric and grouping.
    pub fn default_for(settings: &ChartSettings) -> Option<Self> {
        Self::from_settings(settings, &settings.default_metric, &settings.default_group_by)
    }

    /// Label substituted for rows without a group value.
    pub fn unknown_group(&self) -> String {
        format!("Unknown {}", self.group_label)
    }

    pub fn aggregate(&self, rows: &[Row]) -> Vec<ChartPoint> {
        let unknown = self.unknown_group();
        let mut buckets: BTreeMap<(i32, String), Bucket> = BTreeMap::new();

        for row in rows {
            let Some(year) = row.get(&self.period_field).and_then(parse_year) else {
                continue;
            };
            let group = match row.get(&self.group_field) {
                Some(value) if !is_blank(value) => value_text(value),
                _ => unknown.clone(),
            };
            let value = row
                .get(&self.metric_field)
                .and_then(parse_metric)
                .unwrap_or(0.0);

            let bucket = buckets.entry((year, group)).or_default();
            bucket.sum += value;
            bucket.count += 1;
        }

        buckets
            .into_iter()
            .filter(|(_, bucket)| bucket.sum.is_finite() && bucket.sum > 0.0)
            .filter_map(|((year, group_key), bucket)| {
                Some(ChartPoint {
                    period_start: NaiveDate::from_ymd_opt(year, 1, 1)?,
                    group_key,
                    aggregate_value: bucket.sum,
                    sample_count: bucket.count,
                })
            })
            .collect()
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

/// Whole year from an integer, integral float, or numeric string.
fn parse_year(value: &Value) -> Option<i32> {
    let year = match value {
        Value::Number(n) => match n.as_i64() {
            Some(i) => i,
            None => integral(n.as_f64()?)?,
        },
        Value::String(s) => {
            let s = s.trim();
            match s.parse::<i64>() {
                Ok(i) => i,
                Err(_) => integral(s.parse::<f64>().ok()?)?,
            }
        }
        _ => return None,
    };
    i32::try_from(year).ok()
}

fn integral(f: f64) -> Option<i64> {
    if f.is_finite() && f.fract() == 0.0 {
        Some(f as i64)
    } else {
        None
    }
}

/// Metric as `f64`; `None` (counted as zero) when missing or not a number.
fn parse_metric(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    if parsed.is_nan() {
        None
    } else {
        Some(parsed)
    }
}

/// Headline figures for a chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSummary {
    pub data_points: usize,
    pub series: usize,
    pub year_range: Option<(i32, i32)>,
    pub total_value: f64,
}

impl ChartSummary {
    pub fn from_points(points: &[ChartPoint]) -> Self {
        let series: BTreeSet<&str> = points.iter().map(|p| p.group_key.as_str()).collect();
        let first = points.iter().map(ChartPoint::year).min();
        let last = points.iter().map(ChartPoint::year).max();
        Self {
            data_points: points.len(),
            series: series.len(),
            year_range: first.zip(last),
            total_value: points.iter().map(|p| p.aggregate_value).sum(),
        }
    }
}

/// Formats a metric value for display: compact (`$1.2M`) from one million
/// up, whole numbers with thousands separators below.
pub fn format_value(value: f64, format: ValueFormat) -> String {
    if !value.is_finite() {
        return "N/A".to_string();
    }
    let prefix = match format {
        ValueFormat::Currency => "$",
        ValueFormat::Number => "",
    };
    let sign = if value < 0.0 { "-" } else { "" };
    let abs = value.abs();
    if abs >= 1_000_000_000_000.0 {
        format!("{}{}{:.1}T", sign, prefix, abs / 1_000_000_000_000.0)
    } else if abs >= 1_000_000_000.0 {
        format!("{}{}{:.1}B", sign, prefix, abs / 1_000_000_000.0)
    } else if abs >= 1_000_000.0 {
        format!("{}{}{:.1}M", sign, prefix, abs / 1_000_000.0)
    } else {
        format!("{}{}{}", sign, prefix, group_thousands(abs.round() as u64))
    }
}

fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rows(value: Value) -> Vec<Row> {
        serde_json::from_value(value).unwrap()
    }

    fn by_country() -> ChartAggregator {
        ChartAggregator::new("value", "country", "Country", "year")
    }

    #[test]
    fn test_sums_and_drops_zero_buckets() {
        let data = rows(json!([
            {"year": 2020, "country": "FR", "value": 100},
            {"year": 2020, "country": "FR", "value": 50},
            {"year": 2020, "country": "DE", "value": 0}
        ]));
        let points = by_country().aggregate(&data);
        assert_eq!(
            points,
            vec![ChartPoint {
                period_start: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
                group_key: "FR".to_string(),
                aggregate_value: 150.0,
                sample_count: 2,
            }]
        );
    }

    #[test]
    fn test_unparseable_period_skipped() {
        let data = rows(json!([
            {"year": "n/a", "country": "FR", "value": 10},
            {"country": "FR", "value": 10},
            {"year": null, "country": "FR", "value": 10},
            {"year": "2021", "country": "FR", "value": 10}
        ]));
        let points = by_country().aggregate(&data);
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].year(), 2021);
        assert_eq!(points[0].sample_count, 1);
    }

    #[test]
    fn test_bad_metric_counts_as_zero() {
        let data = rows(json!([
            {"year": 2020, "country": "FR", "value": "abc"},
            {"year": 2020, "country": "FR", "value": null},
            {"year": 2020, "country": "FR", "value": "12.5"}
        ]));
        let points = by_country().aggregate(&data);
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].aggregate_value, 12.5);
        assert_eq!(points[0].sample_count, 3);
    }

    #[test]
    fn test_missing_group_is_unknown() {
        let data = rows(json!([
            {"year": 2020, "value": 5},
            {"year": 2020, "country": "", "value": 5},
            {"year": 2020, "country": null, "value": 5}
        ]));
        let points = by_country().aggregate(&data);
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].group_key, "Unknown Country");
        assert_eq!(points[0].aggregate_value, 15.0);
    }

    #[test]
    fn test_negative_sum_dropped() {
        let data = rows(json!([
            {"year": 2020, "country": "FR", "value": -10},
            {"year": 2020, "country": "FR", "value": 4}
        ]));
        assert!(by_country().aggregate(&data).is_empty());
    }

    #[test]
    fn test_sorted_by_year_then_group() {
        let data = rows(json!([
            {"year": 2021, "country": "FR", "value": 1},
            {"year": 2020, "country": "FR", "value": 1},
            {"year": 2021, "country": "BE", "value": 1},
            {"year": 2020.0, "country": "DE", "value": 1}
        ]));
        let order: Vec<(i32, String)> = by_country()
            .aggregate(&data)
            .into_iter()
            .map(|p| (p.year(), p.group_key))
            .collect();
        assert_eq!(
            order,
            vec![
                (2020, "DE".to_string()),
                (2020, "FR".to_string()),
                (2021, "BE".to_string()),
                (2021, "FR".to_string()),
            ]
        );
    }

    #[test]
    fn test_reaggregation_is_pure() {
        let data = rows(json!([
            {"year": 2020, "country": "FR", "partner": "CHN", "value": 3, "quantity": 7},
            {"year": 2020, "country": "FR", "partner": "DEU", "value": 4, "quantity": 1}
        ]));
        let by_value = by_country().aggregate(&data);
        let by_partner = ChartAggregator::new("quantity", "partner", "Partner", "year").aggregate(&data);
        assert_eq!(by_value.len(), 1);
        assert_eq!(by_partner.len(), 2);
        assert_eq!(by_country().aggregate(&data), by_value);
    }

    #[test]
    fn test_numeric_group_values() {
        let data = rows(json!([{"year": 2020, "product": 950300, "value": 1}]));
        let points = ChartAggregator::new("value", "product", "Product", "year").aggregate(&data);
        assert_eq!(points[0].group_key, "950300");
    }

    #[test]
    fn test_summary() {
        let data = rows(json!([
            {"year": 2019, "country": "FR", "value": 10},
            {"year": 2021, "country": "DE", "value": 5},
            {"year": 2021, "country": "FR", "value": 1}
        ]));
        let summary = ChartSummary::from_points(&by_country().aggregate(&data));
        assert_eq!(summary.data_points, 3);
        assert_eq!(summary.series, 2);
        assert_eq!(summary.year_range, Some((2019, 2021)));
        assert_eq!(summary.total_value, 16.0);
    }

    #[test]
    fn test_summary_empty() {
        let summary = ChartSummary::from_points(&[]);
        assert_eq!(summary.data_points, 0);
        assert_eq!(summary.year_range, None);
    }

    #[test]
    fn test_format_value() {
        assert_eq!(format_value(1_234_567.0, ValueFormat::Currency), "$1.2M");
        assert_eq!(format_value(12_345.4, ValueFormat::Currency), "$12,345");
        assert_eq!(format_value(999.0, ValueFormat::Number), "999");
        assert_eq!(format_value(2_500_000_000.0, ValueFormat::Number), "2.5B");
        assert_eq!(format_value(f64::NAN, ValueFormat::Number), "N/A");
    }

    #[test]
    fn test_chart_type_parse() {
        assert_eq!("Bar".parse::<ChartType>().unwrap(), ChartType::Bar);
        assert!("pie".parse::<ChartType>().is_err());
    }

    #[test]
    fn test_from_settings_uses_group_field() {
        let registry = crate::dataset::DatasetRegistry::load_embedded().unwrap();
        let prodcom = registry.get("prodcom").unwrap();
        let agg = ChartAggregator::from_settings(&prodcom.chart, "value", "product").unwrap();
        assert_eq!(agg, ChartAggregator::new("value", "description", "Product", "year"));
        assert!(ChartAggregator::from_settings(&prodcom.chart, "tonnage", "product").is_none());
    }
}
