//! HTTP client for the business search endpoint.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};
use url::Url;

use crate::config::ApiConfig;
use crate::error::{Error, Result};

use super::params::{LocationParam, SearchParams};
use super::response::SearchBusinessesResponse;

/// Path of the business search endpoint, relative to the API base URL.
pub const SEARCH_PATH: &str = "/v3/businesses/search";

/// A source of business search results.
///
/// [`YelpClient`] is the real implementation; the cache only depends on this
/// trait.
#[async_trait]
pub trait SearchApi: Send + Sync {
    /// Run a business search.
    ///
    /// # Errors
    ///
    /// Returns an error if the parameters are invalid, the request fails, or
    /// the body cannot be decoded.
    async fn search_businesses(
        &self,
        location: &LocationParam,
        params: &SearchParams,
    ) -> Result<SearchBusinessesResponse>;
}

/// Error envelope returned by the API on failure.
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    description: Option<String>,
}

/// Client for the Yelp Fusion business search API.
#[derive(Debug, Clone)]
pub struct YelpClient {
    client: Client,
    search_url: Url,
    api_key: String,
}

impl YelpClient {
    /// Build a client from API configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if no API key is configured, the base URL does not
    /// parse, or the HTTP client cannot be built.
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or(Error::MissingApiKey)?
            .to_string();

        let search_url = search_endpoint(&config.base_url)?;

        let client = Client::builder()
            .timeout(config.request_timeout())
            .user_agent(&config.user_agent)
            .build()?;

        Ok(Self {
            client,
            search_url,
            api_key,
        })
    }

    /// Full URL of the search endpoint.
    #[must_use]
    pub fn search_url(&self) -> &Url {
        &self.search_url
    }
}

#[async_trait]
impl SearchApi for YelpClient {
    async fn search_businesses(
        &self,
        location: &LocationParam,
        params: &SearchParams,
    ) -> Result<SearchBusinessesResponse> {
        params.validate(location)?;
        let query = params.to_query(location);

        debug!("GET {} with {} parameters", self.search_url, query.len());

        let response = self
            .client
            .get(self.search_url.clone())
            .bearer_auth(&self.api_key)
            .query(&query)
            .send()
            .await?;

        let status = response.status();
        let body = response.bytes().await?;

        if !status.is_success() {
            let message = api_error_message(&body)
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("unknown error").to_string());
            warn!("Business search failed with {}: {}", status, message);
            return Err(Error::ApiStatus {
                status: status.as_u16(),
                message,
            });
        }

        let decoded = SearchBusinessesResponse::from_slice(&body)?;
        debug!(
            "Business search returned {} businesses (total {:?})",
            decoded.len(),
            decoded.total
        );
        Ok(decoded)
    }
}

/// Append [`SEARCH_PATH`] to `base_url`, keeping any path prefix it has.
fn search_endpoint(base_url: &str) -> Result<Url> {
    let mut url = Url::parse(base_url)?;
    url.path_segments_mut()
        .map_err(|()| {
            Error::config_validation(format!("api.base_url cannot hold a path: {base_url}"))
        })?
        .pop_if_empty()
        .extend(SEARCH_PATH.split('/').filter(|segment| !segment.is_empty()));
    Ok(url)
}

/// Pull a readable message out of an API error body.
fn api_error_message(body: &[u8]) -> Option<String> {
    let envelope: ErrorEnvelope = serde_json::from_slice(body).ok()?;
    match (envelope.error.code, envelope.error.description) {
        (Some(code), Some(description)) => Some(format!("{code}: {description}")),
        (None, Some(description)) => Some(description),
        (Some(code), None) => Some(code),
        (None, None) => None,
    }
}
