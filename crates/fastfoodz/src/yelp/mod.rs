//! Yelp Fusion business search.
//!
//! Request parameters, lenient response decoding, and the HTTP client.

pub mod client;
pub mod params;
pub mod response;

pub use client::{SearchApi, YelpClient, SEARCH_PATH};
pub use params::{BusinessAttribute, LocationParam, PriceFilter, SearchParams, SortBy};
pub use response::SearchBusinessesResponse;
