use pricescout_api::{ListingQuery, Query};
use url::Url;

fn base_url() -> Url {
    Url::parse("https://example.com/search").unwrap()
}

#[test]
fn listing_query_defaults() {
    let url = ListingQuery::new("laptop").add_to_url(&base_url());
    let query = url.query().unwrap();
    assert!(query.contains("page=1"));
    assert!(query.contains("q=laptop"));
    assert!(!query.contains("country="));
    assert!(!query.contains("pageSize="));
}

#[test]
fn listing_query_with_locale() {
    let url = ListingQuery::new("running shoes")
        .with_country("india")
        .with_currency("inr")
        .add_to_url(&base_url());
    let query = url.query().unwrap();
    assert!(query.contains("q=running+shoes"));
    assert!(query.contains("country=india"));
    assert!(query.contains("currency=INR"));
}

#[test]
fn listing_query_paging() {
    let url = ListingQuery::new("tv")
        .with_page(3)
        .with_page_size(50)
        .add_to_url(&base_url());
    let query = url.query().unwrap();
    assert!(query.contains("page=3"));
    assert!(query.contains("pageSize=50"));
}
