//! Core data types for fastfoodz.
//!
//! These mirror the business search payload closely. Almost every field is
//! optional because the upstream API omits fields freely.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Metres in one statute mile.
const METERS_PER_MILE: f64 = 1609.344;

/// Number of symbols in the widest price bracket (`$$$$`).
const PRICE_SYMBOLS: usize = 4;

/// A latitude/longitude pair.
///
/// Only built when both components are known; a half-present coordinate is
/// treated as no coordinate at all.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
}

impl Coordinate {
    /// Create a coordinate.
    #[must_use]
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Build a coordinate only when both halves are present.
    #[must_use]
    pub fn from_parts(latitude: Option<f64>, longitude: Option<f64>) -> Option<Self> {
        Some(Self::new(latitude?, longitude?))
    }

    /// Whether both components are finite and inside their ranges.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

/// A category tag such as `pizza` / "Pizza".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    /// Machine alias, e.g. `pizza`.
    pub alias: Option<String>,
    /// Display title, e.g. "Pizza".
    pub title: Option<String>,
}

/// Postal address of a business.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    /// First street address line.
    pub address1: Option<String>,
    /// Second street address line.
    pub address2: Option<String>,
    /// Third street address line.
    pub address3: Option<String>,
    /// City.
    pub city: Option<String>,
    /// ISO country code.
    pub country: Option<String>,
    /// State or province code.
    pub state: Option<String>,
    /// Postal code.
    pub zip_code: Option<String>,
    /// Pre-formatted address lines.
    #[serde(default)]
    pub display_address: Vec<String>,
}

/// A single business record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Business {
    /// Upstream business id.
    pub id: Option<String>,
    /// Upstream business alias (slug).
    pub alias: Option<String>,
    /// Business name.
    pub name: Option<String>,
    /// Photo URL.
    pub image_url: Option<String>,
    /// Listing URL.
    pub url: Option<String>,
    /// Phone number in E.164 form.
    pub phone: Option<String>,
    /// Phone number formatted for display.
    pub display_phone: Option<String>,
    /// Price bracket as `$` symbols.
    pub price: Option<String>,
    /// Whether the business has permanently closed.
    pub is_closed: Option<bool>,
    /// Rating from 1 to 5.
    pub rating: Option<f64>,
    /// Number of reviews.
    pub review_count: Option<i64>,
    /// Distance from the search point in metres.
    pub distance: Option<f64>,
    /// Where the business is.
    pub coordinates: Option<Coordinate>,
    /// Postal address.
    pub location: Option<Location>,
    /// Category tags, in upstream order.
    #[serde(default)]
    pub categories: Vec<Category>,
    /// Supported transaction types, e.g. `delivery`, `pickup`.
    #[serde(default)]
    pub transactions: Vec<String>,
}

impl Business {
    /// Distance from the search point in statute miles.
    #[must_use]
    pub fn distance_miles(&self) -> Option<f64> {
        self.distance.map(|meters| meters / METERS_PER_MILE)
    }

    /// Price padded to the full four-symbol width using its own symbol.
    ///
    /// `"$$"` becomes `"$$$$"`. Prices already at or past full width are
    /// returned unchanged.
    #[must_use]
    pub fn padded_price(&self) -> Option<String> {
        let price = self.price.as_deref().filter(|p| !p.is_empty())?;
        let count = price.chars().count();
        if count >= PRICE_SYMBOLS {
            return Some(price.to_string());
        }
        let first = price.chars().next()?;
        let mut padded = price.to_string();
        padded.extend(std::iter::repeat(first).take(PRICE_SYMBOLS - count));
        Some(padded)
    }

    /// Summary line shown under the name in list views.
    ///
    /// Padded price and distance in miles, joined by a bullet. Either part
    /// may be missing.
    #[must_use]
    pub fn info_line(&self) -> String {
        let mut parts = Vec::new();
        if let Some(price) = self.padded_price() {
            parts.push(price);
        }
        if let Some(miles) = self.distance_miles() {
            parts.push(format!("{miles:.2} miles"));
        }
        parts.join(" • ")
    }

    /// Alias of the first category that has one, used to pick an icon.
    #[must_use]
    pub fn category_icon(&self) -> Option<&str> {
        self.categories.iter().find_map(|c| c.alias.as_deref())
    }

    /// Comma-separated category titles.
    #[must_use]
    pub fn category_titles(&self) -> String {
        self.categories
            .iter()
            .filter_map(|c| c.title.as_deref())
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// `tel://` URI for dialing the business.
    #[must_use]
    pub fn phone_uri(&self) -> Option<String> {
        self.phone
            .as_deref()
            .filter(|p| !p.is_empty())
            .map(|p| format!("tel://{p}"))
    }

    /// Listing URL suitable for sharing, if it parses.
    #[must_use]
    pub fn share_url(&self) -> Option<url::Url> {
        self.url.as_deref().and_then(|u| url::Url::parse(u).ok())
    }

    /// Name to show, falling back to the alias and then the id.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .or(self.alias.as_deref())
            .or(self.id.as_deref())
            .unwrap_or("(unnamed)")
    }
}

/// One cached search result: a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    /// Identifier assigned by the storage layer.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    /// When the search was made.
    pub request_date: DateTime<Utc>,
    /// Centre of the searched region.
    pub region_center: Coordinate,
    /// Businesses in the order the API returned them.
    pub businesses: Vec<Business>,
}

impl SearchResponse {
    /// Create an unsaved snapshot stamped with the current time.
    #[must_use]
    pub fn new(region_center: Coordinate, businesses: Vec<Business>) -> Self {
        Self {
            id: None,
            request_date: Utc::now(),
            region_center,
            businesses,
        }
    }

    /// Find a business in this snapshot by its upstream id.
    #[must_use]
    pub fn business(&self, business_id: &str) -> Option<&Business> {
        self.businesses
            .iter()
            .find(|b| b.id.as_deref() == Some(business_id))
    }

    /// Number of businesses in the snapshot.
    #[must_use]
    pub fn len(&self) -> usize {
        self.businesses.len()
    }

    /// Whether the snapshot holds no businesses.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.businesses.is_empty()
    }
}
