use url::Url;

use super::{common::QueryCommon, Query};

/// Search parameters sent to a JSON listing feed.
#[derive(Clone, Debug, Default)]
pub struct ListingQuery {
    pub common: QueryCommon,
    pub search: String,
    pub country: Option<String>,
    pub currency: Option<String>,
}

impl Query for ListingQuery {
    fn get_common(&mut self) -> &mut QueryCommon {
        &mut self.common
    }

    fn add_to_url(&self, url: &Url) -> Url {
        let mut url = self.common.add_to_url(url);
        url.query_pairs_mut().append_pair("q", self.search.as_str());
        if let Some(country) = &self.country {
            url.query_pairs_mut().append_pair("country", country.as_str());
        };
        if let Some(currency) = &self.currency {
            url.query_pairs_mut()
                .append_pair("currency", currency.as_str());
        };
        url
    }
}

impl ListingQuery {
    pub fn new(search: &str) -> Self {
        Self {
            search: search.to_string(),
            ..Default::default()
        }
    }

    pub fn with_country(mut self, country: &str) -> Self {
        self.country = Some(country.to_string());
        self
    }

    pub fn with_currency(mut self, currency: &str) -> Self {
        self.currency = Some(currency.to_uppercase());
        self
    }
}
