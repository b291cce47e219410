mod meta;
pub use self::meta::{ListingsResponse, Meta, Paging};

mod listing;
pub use self::listing::RawListing;
