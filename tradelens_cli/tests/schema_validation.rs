use serde_json::Value;
use std::path::{Path, PathBuf};
use tradelens_lib::types::{PageEnvelope, PageResult, Row};
use tradelens_lib::ChartAggregator;

fn workspace_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .expect("CLI crate should be inside workspace")
        .to_path_buf()
}

fn load_fixture(name: &str) -> String {
    let path = workspace_root()
        .join("tradelens_api/tests/fixtures")
        .join(name);
    std::fs::read_to_string(&path).unwrap_or_else(|e| panic!("read fixture {}: {}", path.display(), e))
}

fn load_schema(name: &str) -> Value {
    let path = workspace_root().join("schema").join(name);
    let text = std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("read schema {}: {}", path.display(), e));
    serde_json::from_str(&text).expect("schema is valid JSON")
}

fn page_from_fixture(name: &str) -> PageResult<Row> {
    let envelope: PageEnvelope<Row> =
        serde_json::from_str(&load_fixture(name)).expect("fixture is a page envelope");
    PageResult::from_envelope(envelope, 10)
}

fn chart_points_json() -> Value {
    let page = page_from_fixture("trade_query.json");
    let points = ChartAggregator::new("value", "partner", "Partner", "year").aggregate(&page.rows);
    serde_json::to_value(points).unwrap()
}

// ---------------------------------------------------------------------------
// Positive validation: printed JSON conforms to its schema
// ---------------------------------------------------------------------------

#[test]
fn test_trade_page_conforms_to_schema() {
    let schema = load_schema("page_result.schema.json");
    let data = serde_json::to_value(page_from_fixture("trade_query.json")).unwrap();

    let validator = jsonschema::draft202012::new(&schema).expect("page schema compiles");
    if let Err(e) = validator.validate(&data) {
        panic!("trade page failed validation: {e}");
    }
}

#[test]
fn test_measure_page_conforms_to_schema() {
    let schema = load_schema("page_result.schema.json");
    let data = serde_json::to_value(page_from_fixture("prodcom_query.json")).unwrap();

    let validator = jsonschema::draft202012::new(&schema).expect("page schema compiles");
    if let Err(e) = validator.validate(&data) {
        panic!("measure page failed validation: {e}");
    }
}

#[test]
fn test_empty_page_conforms_to_schema() {
    let schema = load_schema("page_result.schema.json");
    let data = serde_json::to_value(page_from_fixture("trade_query_minimal.json")).unwrap();
    assert_eq!(data["total_pages"], 1);

    let validator = jsonschema::draft202012::new(&schema).expect("page schema compiles");
    assert!(validator.validate(&data).is_ok());
}

#[test]
fn test_chart_points_conform_to_schema() {
    let schema = load_schema("chart_point.schema.json");
    let data = chart_points_json();
    assert_eq!(data.as_array().unwrap().len(), 3);
    assert_eq!(data[0]["period_start"], "2020-01-01");

    let validator = jsonschema::draft202012::new(&schema).expect("chart schema compiles");
    if let Err(e) = validator.validate(&data) {
        panic!("chart points failed validation: {e}");
    }
}

// ---------------------------------------------------------------------------
// Negative validation: schemas reject invalid data
// ---------------------------------------------------------------------------

#[test]
fn test_page_schema_rejects_zero_total_pages() {
    let schema = load_schema("page_result.schema.json");
    let mut data = serde_json::to_value(page_from_fixture("trade_query.json")).unwrap();
    data["total_pages"] = Value::from(0);

    let validator = jsonschema::draft202012::new(&schema).expect("schema compiles");
    assert!(
        validator.validate(&data).is_err(),
        "schema should reject a page with total_pages 0"
    );
}

#[test]
fn test_page_schema_rejects_nested_row_values() {
    let schema = load_schema("page_result.schema.json");
    let mut data = serde_json::to_value(page_from_fixture("trade_query.json")).unwrap();
    data["rows"][0]["value"] = serde_json::json!({"amount": 100});

    let validator = jsonschema::draft202012::new(&schema).expect("schema compiles");
    assert!(validator.validate(&data).is_err());
}

#[test]
fn test_chart_schema_rejects_non_positive_value() {
    let schema = load_schema("chart_point.schema.json");
    let mut data = chart_points_json();
    data[0]["aggregate_value"] = Value::from(0.0);

    let validator = jsonschema::draft202012::new(&schema).expect("schema compiles");
    assert!(
        validator.validate(&data).is_err(),
        "schema should reject a zero aggregate"
    );
}

#[test]
fn test_chart_schema_rejects_missing_period() {
    let schema = load_schema("chart_point.schema.json");
    let mut data = chart_points_json();
    data[0]
        .as_object_mut()
        .expect("point is an object")
        .remove("period_start");

    let validator = jsonschema::draft202012::new(&schema).expect("schema compiles");
    assert!(validator.validate(&data).is_err());
}
