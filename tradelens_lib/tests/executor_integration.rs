use std::sync::Arc;

use serde_json::json;
use tradelens_lib::dataset::DatasetRegistry;
use tradelens_lib::{
    Client, CountryCodeResolver, CountryRef, DatasetConfig, NormalizedQueryParams,
    PaginatedQueryExecutor, SuggestionSearch,
};
use wiremock::matchers::{method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn dataset(server: &MockServer, id: &str) -> Arc<DatasetConfig> {
    DatasetRegistry::load_embedded()
        .unwrap()
        .with_api_base(&server.uri())
        .get(id)
        .unwrap()
}

fn client(server: &MockServer) -> Client {
    Client::with_base_url(&server.uri()).unwrap()
}

fn trade_params() -> NormalizedQueryParams {
    [
        ("trade_type", "imports"),
        ("product_codes", "950300"),
        ("from_country", "FRA"),
        ("to_country", "everywhere"),
        ("year_from", "2020"),
        ("year_to", "2022"),
    ]
    .into_iter()
    .collect()
}

// ============================================================================
// CountryCodeResolver
// ============================================================================

#[tokio::test]
async fn resolver_builds_from_country_list() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/countries"))
        .and(query_param("limit", "1000"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"country_code": "FRA", "country_name": "France"},
            {"country_code": "DEU", "country_name": "Germany"},
            {"country_name": "Atlantis"}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let config = dataset(&server, "baci");
    let resolver = CountryCodeResolver::build(&client(&server), &config).await;

    assert_eq!(resolver.len(), 2);
    assert_eq!(resolver.resolve(&CountryRef::parse("France")), "FRA");
    assert_eq!(resolver.resolve(&CountryRef::parse("Atlantis")), "Atlantis");
    assert_eq!(resolver.resolve(&CountryRef::parse("World")), "world");
}

#[tokio::test]
async fn resolver_failure_passes_names_through() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/countries"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let config = dataset(&server, "baci");
    let resolver = CountryCodeResolver::build(&client(&server), &config).await;

    assert!(resolver.is_empty());
    assert_eq!(resolver.resolve(&CountryRef::parse("France")), "France");
}

#[tokio::test]
async fn resolver_skips_fetch_without_country_dimension() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&server)
        .await;

    let config = dataset(&server, "prodcom");
    let resolver = CountryCodeResolver::build(&client(&server), &config).await;
    assert!(resolver.is_empty());
    assert_eq!(resolver.dataset_id(), "prodcom");
}

// ============================================================================
// PaginatedQueryExecutor
// ============================================================================

#[tokio::test]
async fn execute_returns_page() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/trade-query"))
        .and(query_param("from_country", "FRA"))
        .and(query_param("page", "2"))
        .and(query_param("page_size", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                {"year": 2020, "value": 1.0},
                {"year": 2021, "value": 2.0},
                {"year": 2022, "value": 3.0}
            ],
            "total_records": 5,
            "total_pages": 3
        })))
        .mount(&server)
        .await;

    let executor = PaginatedQueryExecutor::new(client(&server), dataset(&server, "baci"));
    let outcome = executor.execute(&trade_params(), 2, 2).await;

    assert_eq!(outcome.page.rows.len(), 2);
    assert_eq!(outcome.page.total_records, 5);
    assert_eq!(outcome.page.total_pages, 3);

    let query_url = outcome.query_url.unwrap();
    assert!(query_url.path().ends_with("/trade-query"));
    assert!(!query_url.query_pairs().any(|(k, _)| k == "page" || k == "page_size"));
}

#[tokio::test]
async fn execute_defaults_missing_envelope_fields() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/trade-query"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;

    let executor = PaginatedQueryExecutor::new(client(&server), dataset(&server, "baci"));
    let outcome = executor.execute(&trade_params(), 1, 10).await;

    assert!(outcome.page.rows.is_empty());
    assert_eq!(outcome.page.total_records, 0);
    assert_eq!(outcome.page.total_pages, 1);
}

#[tokio::test]
async fn execute_server_error_is_empty() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/trade-query"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let executor = PaginatedQueryExecutor::new(client(&server), dataset(&server, "baci"));
    let outcome = executor.execute(&trade_params(), 1, 10).await;

    assert!(outcome.page.is_empty());
    assert_eq!(outcome.page.total_records, 0);
    assert_eq!(outcome.page.total_pages, 1);
    assert!(outcome.query_url.is_some());
}

#[tokio::test]
async fn execute_malformed_json_is_empty() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/trade-query"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{not json"))
        .mount(&server)
        .await;

    let executor = PaginatedQueryExecutor::new(client(&server), dataset(&server, "baci"));
    let outcome = executor.execute(&trade_params(), 1, 10).await;
    assert!(outcome.page.is_empty());
}

#[tokio::test]
async fn execute_unreachable_host_is_empty() {
    let client = Client::with_base_url("http://127.0.0.1:1").unwrap();
    let config = DatasetRegistry::load_embedded()
        .unwrap()
        .with_api_base("http://127.0.0.1:1")
        .get("baci")
        .unwrap();

    let outcome = PaginatedQueryExecutor::new(client, config)
        .execute(&trade_params(), 1, 10)
        .await;
    assert!(outcome.page.is_empty());
    assert_eq!(outcome.page.total_pages, 1);
}

#[tokio::test]
async fn execute_clamps_page_and_size() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/trade-query"))
        .and(query_param("page", "1"))
        .and(query_param("page_size", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"year": 2020}, {"year": 2021}],
            "total_records": 2,
            "total_pages": 2
        })))
        .expect(1)
        .mount(&server)
        .await;

    let executor = PaginatedQueryExecutor::new(client(&server), dataset(&server, "baci"));
    let outcome = executor.execute(&trade_params(), 0, 0).await;
    assert_eq!(outcome.page.rows.len(), 1);
}

#[tokio::test]
async fn fetch_url_reissues_at_large_page_size() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/trade-query"))
        .and(query_param("page_size", "10"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"year": 2020}],
            "total_records": 40,
            "total_pages": 4
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/trade-query"))
        .and(query_param("product_codes", "950300"))
        .and(query_param("page_size", "1000"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"year": 2020}, {"year": 2021}, {"year": 2022}],
            "total_records": 3,
            "total_pages": 1
        })))
        .expect(1)
        .mount(&server)
        .await;

    let executor = PaginatedQueryExecutor::new(client(&server), dataset(&server, "baci"));
    let outcome = executor.execute(&trade_params(), 1, 10).await;
    let large = executor
        .fetch_url(outcome.query_url.as_ref().unwrap(), 1, 1000)
        .await;
    assert_eq!(large.rows.len(), 3);
}

#[tokio::test]
async fn execute_measure_dataset() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/prodcom-query"))
        .and(query_param("measure", "Volume"))
        .and(query_param_is_missing("trade_type"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"year": 2021, "description": "Toys", "volume": 12}],
            "total_records": 1,
            "total_pages": 1
        })))
        .mount(&server)
        .await;

    let params: NormalizedQueryParams = [
        ("product_codes", "32401000"),
        ("year_from", "2020"),
        ("year_to", "2024"),
        ("measure", "Volume"),
    ]
    .into_iter()
    .collect();
    let executor = PaginatedQueryExecutor::new(client(&server), dataset(&server, "prodcom"));
    let outcome = executor.execute(&params, 1, 10).await;
    assert_eq!(outcome.page.rows[0]["description"], "Toys");
}

// ============================================================================
// SuggestionSearch
// ============================================================================

#[tokio::test]
async fn product_search_sends_type_parameters() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/products"))
        .and(query_param("search", "toy"))
        .and(query_param("limit", "50"))
        .and(query_param("product_type", "prodcom"))
        .and(query_param("type", "division"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"code": "32", "description": "Other manufacturing"}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let search = SuggestionSearch::new(client(&server), dataset(&server, "prodcom"));
    let rows = search
        .search_products("toy", Some(tradelens_lib::ProductTypeFilter::Division))
        .await;
    assert_eq!(rows.len(), 1);
}

#[tokio::test]
async fn empty_product_term_makes_no_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&server)
        .await;

    let search = SuggestionSearch::new(client(&server), dataset(&server, "baci"));
    assert!(search.search_products("", None).await.is_empty());
}

#[tokio::test]
async fn country_search_degrades_to_empty() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/countries"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;

    let search = SuggestionSearch::new(client(&server), dataset(&server, "baci"));
    assert!(search.search_countries("fra").await.is_empty());
}
