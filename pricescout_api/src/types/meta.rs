use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::RawListing;

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct Meta {
    #[serde(default)]
    pub paging: Option<Paging>,
    #[serde(default)]
    pub generated_at: Option<DateTime<Utc>>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Paging {
    pub page: i64,
    pub size: i64,
    pub total_items: i64,
    pub total_pages: i64,
}

/// Envelope returned by a JSON listing feed.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ListingsResponse {
    #[serde(default)]
    pub meta: Meta,
    pub data: Vec<RawListing>,
}
