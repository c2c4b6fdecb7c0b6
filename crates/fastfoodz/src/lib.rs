//! `fastfoodz` - Nearby fast food finder
//!
//! This library queries the Yelp business search API for nearby restaurants,
//! caches the most recent results as snapshots in a local `SQLite` database,
//! and keeps that cache bounded.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod model;
pub mod storage;
pub mod yelp;

pub use cache::{CacheHandle, CacheOptions, RefreshRequest, RetentionPolicy};
pub use config::Config;
pub use error::{Error, Result};
pub use logging::init_logging;
pub use model::{Business, Category, Coordinate, Location, SearchResponse};
pub use storage::{Storage, StorageStats};
pub use yelp::{SearchApi, YelpClient};
