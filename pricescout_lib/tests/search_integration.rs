use pricescout_lib::{AiBackend, BulkRow, SearchConfig, SearchService, Source};
use wiremock::matchers::{body_string_contains, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const LISTINGS: &str = include_str!("../../pricescout_api/tests/fixtures/listings.json");
const SEARCH_PAGE: &str = include_str!("../../pricescout_api/tests/fixtures/search_page.html");

async fn mount_sources(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/v1/listings"))
        .and(query_param("q", "Samsung Galaxy S24"))
        .and(query_param("country", "india"))
        .and(query_param("currency", "INR"))
        .respond_with(ResponseTemplate::new(200).set_body_string(LISTINGS))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("q", "Samsung Galaxy S24"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/html; charset=utf-8")
                .set_body_string(SEARCH_PAGE),
        )
        .mount(server)
        .await;
}

fn service_for(server: &MockServer, extra: Vec<Source>) -> SearchService {
    let mut sources = vec![
        Source::json_feed("ShopFeed", &format!("{}/v1/listings", server.uri())),
        Source::html_page("Market", &format!("{}/search?q=", server.uri())),
    ];
    sources.extend(extra);
    let config = SearchConfig {
        use_directory: false,
        retry_max: 0,
        sources,
        ..SearchConfig::default()
    };
    SearchService::new(config, AiBackend::Unavailable).unwrap()
}

#[tokio::test]
async fn search_merges_feed_and_page() {
    let server = MockServer::start().await;
    mount_sources(&server).await;
    let service = service_for(&server, vec![]);

    let outcome = service
        .search("Samsung Galaxy S24 in Mumbai", 20)
        .await
        .unwrap();

    assert!(outcome.success);
    assert_eq!(outcome.message, None);
    assert_eq!(outcome.location.country, "india");
    assert_eq!(outcome.currency.symbol, "₹");
    assert_eq!(outcome.decomposition.primary_query, "Samsung Galaxy S24");

    let prices: Vec<f64> = outcome.results.iter().map(|c| c.extracted_price).collect();
    assert_eq!(prices, vec![89999.0, 69999.0, 74999.0, 79999.0]);
    assert_eq!(outcome.results_count, 4);
    assert!(outcome.results.iter().all(|c| !c.name.contains("iPhone")));

    let agg = &outcome.aggregate;
    let min = agg.min.as_ref().unwrap();
    assert_eq!(min.price, 69999.0);
    assert_eq!(min.source, "ShopFeed");
    assert_eq!(min.url, "https://www.shopfeed.example/p/galaxy-s24-128");
    let median = agg.median.as_ref().unwrap();
    assert_eq!(median.price, 77499.0);
    assert_eq!(median.source, "Market");
    assert_eq!(agg.max_price(), Some(89999.0));
    assert_eq!(agg.all_sources, vec!["ShopFeed", "Market"]);

    assert_eq!(outcome.data_sources.len(), 2);
    assert!(outcome.sources_failed.is_empty());

    let analysis = outcome.analysis.as_ref().unwrap();
    assert_eq!(analysis.product_name, "Samsung Galaxy S24");
    assert_eq!(analysis.count, 4);
    assert_eq!(analysis.lowest, 69999.0);
    assert_eq!(analysis.average, 78749.0);
    assert_eq!(analysis.spread, 20000.0);
    assert_eq!(analysis.variation_pct, 25.4);
    assert!(analysis.best_value.is_some());
    assert!(outcome.local_stores_city.is_none());
}

#[tokio::test]
async fn failing_source_degrades_gracefully() {
    let server = MockServer::start().await;
    mount_sources(&server).await;
    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(500).set_body_string("oops"))
        .mount(&server)
        .await;
    let broken = Source::html_page("Broken", &format!("{}/broken?q=", server.uri()));
    let service = service_for(&server, vec![broken]);

    let outcome = service
        .search("Samsung Galaxy S24 in Mumbai", 20)
        .await
        .unwrap();

    assert!(outcome.success);
    assert_eq!(outcome.results_count, 4);
    assert_eq!(outcome.sources_failed, vec!["Broken"]);
    assert_eq!(outcome.data_sources.len(), 3);
}

#[tokio::test]
async fn results_truncate_but_aggregate_covers_all() {
    let server = MockServer::start().await;
    mount_sources(&server).await;
    let service = service_for(&server, vec![]);

    let outcome = service
        .search("Samsung Galaxy S24 in Mumbai", 2)
        .await
        .unwrap();

    assert_eq!(outcome.results.len(), 2);
    assert_eq!(outcome.results_count, 4);
    assert_eq!(outcome.aggregate.count, 4);
    assert_eq!(outcome.aggregate.max_price(), Some(89999.0));
}

#[tokio::test]
async fn price_ceiling_filters_candidates() {
    let server = MockServer::start().await;
    mount_sources(&server).await;
    let service = service_for(&server, vec![]);

    let outcome = service
        .search("Samsung Galaxy S24 under 80000 in Mumbai", 20)
        .await
        .unwrap();

    assert_eq!(outcome.decomposition.max_price, Some(80000.0));
    assert_eq!(outcome.aggregate.max_price(), Some(79999.0));
    assert_eq!(outcome.aggregate.median_price(), Some(74999.0));
    assert_eq!(outcome.aggregate.min_price(), Some(69999.0));
}

#[tokio::test]
async fn nothing_found_is_a_message_not_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/listings"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"data": []}"#))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html><body>No results</body></html>"))
        .mount(&server)
        .await;
    let service = service_for(&server, vec![]);

    let outcome = service.search("handmade brass lamp", 10).await.unwrap();

    assert!(outcome.success);
    assert_eq!(outcome.message.as_deref(), Some("No live prices available"));
    assert!(outcome.aggregate.is_empty());
    assert!(outcome.sources_failed.is_empty());
}

#[tokio::test]
async fn invalid_query_is_the_only_hard_error() {
    let server = MockServer::start().await;
    let service = service_for(&server, vec![]);
    let err = service.search("a", 10).await.unwrap_err();
    assert!(err.to_string().starts_with("Invalid input"));
}

#[tokio::test]
async fn global_search_reports_dollars() {
    let server = MockServer::start().await;
    mount_sources(&server).await;
    let service = service_for(&server, vec![]);

    let outcome = service.search("Samsung Galaxy S24", 20).await.unwrap();

    assert_eq!(outcome.location.country, "global");
    assert_eq!(outcome.currency.symbol, "$");
    // The feed only answers Indian searches.
    assert_eq!(outcome.sources_failed, vec!["ShopFeed"]);
    assert!(outcome.results.iter().all(|c| c.currency_symbol == "$"));
    assert_eq!(outcome.aggregate.min_price(), Some(899.99));
    assert_eq!(outcome.aggregate.max_price(), Some(959.99));
}

#[tokio::test]
async fn bulk_rows_search_the_bulk_country() {
    let server = MockServer::start().await;
    mount_sources(&server).await;
    let service = service_for(&server, vec![]);

    let report = service
        .bulk_compare(vec![BulkRow::new("Samsung Galaxy S24", 80000.0, 2.0)])
        .await
        .unwrap();

    let row = &report.rows[0];
    assert!(row.has_market_data());
    assert_eq!(row.aggregate.min_price(), Some(69999.0));
    assert_eq!(row.aggregate.median_price(), Some(77499.0));
    assert_eq!(report.totals.market_min, 139998.0);
}

const OVERPASS_STORES: &str = r#"{
  "elements": [
    { "type": "node", "id": 1, "lat": 12.97, "lon": 77.59,
      "tags": { "name": "Bangalore Bakery", "shop": "bakery" } },
    { "type": "node", "id": 2, "lat": 12.93, "lon": 77.62,
      "tags": { "name": "Sri Electricals", "shop": "electrical",
                "addr:housenumber": "14", "addr:street": "SP Road" } },
    { "type": "way", "id": 3, "center": { "lat": 12.95, "lon": 77.60 },
      "tags": { "shop": "electronics" } }
  ]
}"#;

fn store_service(server: &MockServer) -> SearchService {
    let config = SearchConfig {
        use_directory: false,
        retry_max: 0,
        map_endpoint: Some(format!("{}/api/interpreter", server.uri())),
        ..SearchConfig::default()
    };
    SearchService::new(config, AiBackend::Unavailable).unwrap()
}

#[tokio::test]
async fn city_search_lists_relevant_stores_first() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/interpreter"))
        .and(body_string_contains("electrical"))
        .and(body_string_contains("Bangalore"))
        .respond_with(ResponseTemplate::new(200).set_body_string(OVERPASS_STORES))
        .expect(1)
        .mount(&server)
        .await;
    let service = store_service(&server);

    let outcome = service.search("crompton fan in bangalore", 10).await.unwrap();

    assert_eq!(outcome.local_stores_city.as_deref(), Some("Bangalore"));
    let names: Vec<&str> = outcome.local_stores.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["Sri Electricals", "Bangalore Bakery"]);
    assert!(outcome.local_stores[0].is_relevant);
    assert_eq!(outcome.local_stores[0].address, "14, SP Road");
    assert!(!outcome.local_stores[1].is_relevant);
}

#[tokio::test]
async fn map_failure_leaves_search_intact() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/interpreter"))
        .respond_with(ResponseTemplate::new(504))
        .mount(&server)
        .await;
    let service = store_service(&server);

    let outcome = service.search("wall mirror in pune", 10).await.unwrap();
    assert!(outcome.success);
    assert_eq!(outcome.local_stores_city.as_deref(), Some("Pune"));
    assert!(outcome.local_stores.is_empty());
}

#[tokio::test]
async fn no_store_lookup_without_a_city() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string(OVERPASS_STORES))
        .expect(0)
        .mount(&server)
        .await;
    let service = store_service(&server);

    let outcome = service.search("crompton fan in india", 10).await.unwrap();
    assert!(outcome.local_stores_city.is_none());
    assert!(outcome.local_stores.is_empty());
}
