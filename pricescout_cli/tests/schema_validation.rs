use chrono::{TimeZone, Utc};
use pricescout_lib::aggregate::aggregate;
use pricescout_lib::ai::detect_product_by_rules;
use pricescout_lib::analysis::analyze;
use pricescout_lib::locale::LocaleTable;
use pricescout_lib::service::DataSource;
use pricescout_lib::{
    decompose, AiBackend, FilterCatalog, LocalStore, PriceCandidate, SearchConfig, SearchOutcome,
    SearchService,
};
use serde_json::Value;
use std::path::{Path, PathBuf};

fn workspace_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .expect("CLI crate should be inside workspace")
        .to_path_buf()
}

fn load_fixture(name: &str) -> Value {
    let path = workspace_root()
        .join("pricescout_api/tests/fixtures")
        .join(name);
    let text = std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("read fixture {}: {}", path.display(), e));
    serde_json::from_str(&text).expect("fixture is valid JSON")
}

fn load_schema(name: &str) -> Value {
    let path = workspace_root().join("schema").join(name);
    let text = std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("read schema {}: {}", path.display(), e));
    serde_json::from_str(&text).expect("schema is valid JSON")
}

fn candidate(price: f64, source: &str, url: &str) -> PriceCandidate {
    PriceCandidate {
        name: format!("Samsung Galaxy S24 ({})", source),
        raw_text: format!("₹{}", price),
        extracted_price: price,
        currency_symbol: "₹".to_string(),
        source_name: source.to_string(),
        source_url: url.to_string(),
        search_engine: "Samsung Galaxy S24".to_string(),
        direct_link: true,
        timestamp: Utc.with_ymd_and_hms(2026, 3, 2, 10, 15, 0).unwrap(),
    }
}

fn populated_outcome() -> Value {
    let locales = LocaleTable::load().expect("embedded locales parse");
    let location = locales.detect_location("samsung galaxy s24 in mumbai");
    let currency = locales.currency(&location.country);
    let conversion = locales.conversion(&location.country);
    let insight = detect_product_by_rules("samsung galaxy s24 phone");
    let results = vec![
        candidate(74999.0, "Amazon.in", "https://www.amazon.in/dp/B0CS5XW6TN"),
        candidate(69999.0, "Flipkart", "https://www.flipkart.com/p/itm6ac6485515ae4"),
    ];
    let outcome = SearchOutcome {
        success: true,
        query: "samsung galaxy s24 in mumbai".to_string(),
        message: None,
        location,
        currency,
        decomposition: decompose("samsung galaxy s24"),
        aggregate: aggregate(&results),
        analysis: analyze(&results, &insight, &conversion),
        available_filters: FilterCatalog::load()
            .expect("embedded filters parse")
            .available_filters("samsung galaxy s24 phone", &insight, &results),
        local_stores: vec![LocalStore {
            name: "Mumbai Mobile Hub".to_string(),
            address: "12, Linking Road".to_string(),
            city: "Mumbai".to_string(),
            categories: vec!["mobile phone".to_string()],
            business_type: "mobile_phone".to_string(),
            lat: Some(19.06),
            lon: Some(72.83),
            is_relevant: true,
        }],
        local_stores_city: Some("Mumbai".to_string()),
        results_count: results.len(),
        results,
        data_sources: vec![DataSource {
            name: "Amazon.in".to_string(),
            url: "https://www.amazon.in/s".to_string(),
            source_type: "Online Marketplace".to_string(),
            description: "Search results scraped from Amazon.in".to_string(),
        }],
        sources_failed: vec!["Croma".to_string()],
    };
    serde_json::to_value(&outcome).expect("outcome serializes")
}

// ---------------------------------------------------------------------------
// Positive validation
// ---------------------------------------------------------------------------

#[test]
fn test_listings_fixture_conforms_to_schema() {
    let fixture = load_fixture("listings.json");
    let schema = load_schema("listing.schema.json");

    let validator = jsonschema::draft202012::new(&schema).expect("listing schema compiles");
    let result = validator.validate(&fixture["data"]);
    if let Err(e) = &result {
        panic!("listings fixture failed validation: {e}");
    }
}

#[test]
fn test_populated_outcome_conforms_to_schema() {
    let schema = load_schema("search_outcome.schema.json");
    let validator = jsonschema::draft202012::new(&schema).expect("outcome schema compiles");
    let data = populated_outcome();
    assert_eq!(data["analysis"]["best_value"]["source"], "Amazon.in");
    assert!(data["available_filters"]["specifications"]["Camera"].is_array());
    if let Err(e) = validator.validate(&data) {
        panic!("populated outcome failed validation: {e}");
    }
}

#[tokio::test]
async fn test_no_data_outcome_conforms_to_schema() {
    let config = SearchConfig {
        use_directory: false,
        ..SearchConfig::default()
    };
    let service = SearchService::new(config, AiBackend::Unavailable).unwrap();
    let outcome = service.search("handmade brass lamp", 10).await.unwrap();
    let data = serde_json::to_value(&outcome).unwrap();
    assert_eq!(data["message"], "No live prices available");
    assert!(data["aggregate"]["min"].is_null());

    let schema = load_schema("search_outcome.schema.json");
    let validator = jsonschema::draft202012::new(&schema).expect("outcome schema compiles");
    if let Err(e) = validator.validate(&data) {
        panic!("no-data outcome failed validation: {e}");
    }
}

// ---------------------------------------------------------------------------
// Negative validation
// ---------------------------------------------------------------------------

#[test]
fn test_outcome_schema_rejects_missing_aggregate() {
    let schema = load_schema("search_outcome.schema.json");
    let mut data = populated_outcome();
    data.as_object_mut()
        .expect("outcome is an object")
        .remove("aggregate");

    let validator = jsonschema::draft202012::new(&schema).expect("schema compiles");
    assert!(
        validator.validate(&data).is_err(),
        "schema should reject outcome missing aggregate"
    );
}

#[test]
fn test_outcome_schema_rejects_non_positive_price() {
    let schema = load_schema("search_outcome.schema.json");
    let mut data = populated_outcome();
    data["results"][0]["extracted_price"] = Value::from(0);

    let validator = jsonschema::draft202012::new(&schema).expect("schema compiles");
    assert!(
        validator.validate(&data).is_err(),
        "schema should reject a zero price"
    );
}

#[test]
fn test_listing_schema_rejects_missing_url() {
    let schema = load_schema("listing.schema.json");
    let mut data = load_fixture("listings.json")["data"].clone();
    data[0]
        .as_object_mut()
        .expect("listing is an object")
        .remove("sourceUrl");

    let validator = jsonschema::draft202012::new(&schema).expect("schema compiles");
    assert!(
        validator.validate(&data).is_err(),
        "schema should reject listing without a URL"
    );
}

#[test]
fn test_outcome_schema_rejects_additional_properties() {
    let schema = load_schema("search_outcome.schema.json");
    let mut data = populated_outcome();
    data.as_object_mut()
        .expect("outcome is an object")
        .insert("bogusField".to_string(), Value::Number(123.into()));

    let validator = jsonschema::draft202012::new(&schema).expect("schema compiles");
    assert!(
        validator.validate(&data).is_err(),
        "schema should reject additional properties"
    );
}

#[test]
fn test_outcome_schema_rejects_store_without_relevance() {
    let schema = load_schema("search_outcome.schema.json");
    let mut data = populated_outcome();
    data["local_stores"][0]
        .as_object_mut()
        .expect("store is an object")
        .remove("is_relevant");

    let validator = jsonschema::draft202012::new(&schema).expect("schema compiles");
    assert!(
        validator.validate(&data).is_err(),
        "schema should reject a local store without is_relevant"
    );
}
