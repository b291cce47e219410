//! Shared query infrastructure: the [`Query`] trait and [`QueryCommon`] paging fields.

use url::Url;

/// Trait implemented by all query builders. Provides URL serialization and
/// shared builder methods for pagination.
pub trait Query {
    /// Appends this query's parameters to the given URL, returning the modified URL.
    fn add_to_url(&self, url: &Url) -> Url;

    /// Returns a mutable reference to the common query fields.
    fn get_common(&mut self) -> &mut QueryCommon;

    /// Sets the page number (1-indexed).
    fn with_page(mut self, page: i64) -> Self
    where
        Self: Sized,
    {
        self.get_common().page = page;
        self
    }

    /// Sets the number of listings per page.
    fn with_page_size(mut self, page_size: i64) -> Self
    where
        Self: Sized,
    {
        self.get_common().page_size = Some(page_size);
        self
    }
}

/// Paging fields shared by all query types.
#[derive(Clone, Copy, Debug)]
pub struct QueryCommon {
    /// Page number (1-indexed). Defaults to 1.
    pub page: i64,
    /// Listings per page. `None` uses the feed default.
    pub page_size: Option<i64>,
}

impl Default for QueryCommon {
    fn default() -> QueryCommon {
        QueryCommon {
            page: 1,
            page_size: None,
        }
    }
}

impl QueryCommon {
    /// Appends the paging parameters to the URL.
    pub fn add_to_url(&self, url: &Url) -> Url {
        let mut url = url.clone();
        url.query_pairs_mut()
            .append_pair("page", &self.page.to_string());
        if let Some(page_size) = self.page_size {
            url.query_pairs_mut()
                .append_pair("pageSize", &page_size.to_string());
        };
        url
    }
}
