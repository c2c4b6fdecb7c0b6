//! Decoding of the business search response body.
//!
//! The upstream payload is loosely typed in practice: fields go missing or
//! change type between businesses. Decoding is therefore done field by field
//! over a [`serde_json::Value`], and a bad field only loses that field.

use serde_json::{Map, Value};
use tracing::trace;

use crate::error::{Error, Result};
use crate::model::{Business, Category, Coordinate, Location};

/// Decoded body of a business search.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchBusinessesResponse {
    /// Total number of matches upstream (not just this page).
    pub total: Option<i64>,
    /// Businesses on this page, `None` when the page is empty.
    pub businesses: Option<Vec<Business>>,
    /// Centre of the searched region.
    pub region_center: Option<Coordinate>,
}

impl SearchBusinessesResponse {
    /// Decode a response body.
    ///
    /// # Errors
    ///
    /// Returns an error only if the body is not JSON or not a JSON object.
    pub fn from_slice(body: &[u8]) -> Result<Self> {
        let value: Value = serde_json::from_slice(body)?;
        Self::from_value(&value)
    }

    /// Decode an already parsed body.
    ///
    /// # Errors
    ///
    /// Returns an error if `value` is not a JSON object.
    pub fn from_value(value: &Value) -> Result<Self> {
        let root = value
            .as_object()
            .ok_or_else(|| {
                Error::Json(serde::de::Error::custom(
                    "search response is not a JSON object",
                ))
            })?;

        Ok(Self {
            total: root.get("total").and_then(Value::as_i64),
            businesses: decode_businesses(root),
            region_center: root
                .get("region")
                .and_then(Value::as_object)
                .and_then(|region| region.get("center"))
                .and_then(decode_coordinate),
        })
    }

    /// Number of businesses on this page.
    #[must_use]
    pub fn len(&self) -> usize {
        self.businesses.as_ref().map_or(0, Vec::len)
    }

    /// Whether this page holds no businesses.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn decode_businesses(root: &Map<String, Value>) -> Option<Vec<Business>> {
    let entries = root.get("businesses")?.as_array()?;

    let businesses: Vec<Business> = entries
        .iter()
        .filter_map(|entry| {
            let decoded = entry.as_object().map(decode_business);
            if decoded.is_none() {
                trace!("Skipping business entry that is not an object");
            }
            decoded
        })
        .collect();

    if businesses.is_empty() {
        None
    } else {
        Some(businesses)
    }
}

fn decode_business(values: &Map<String, Value>) -> Business {
    Business {
        id: string(values, "id"),
        alias: string(values, "alias"),
        name: string(values, "name"),
        image_url: string(values, "image_url"),
        url: string(values, "url"),
        phone: string(values, "phone"),
        display_phone: string(values, "display_phone"),
        price: string(values, "price"),
        is_closed: values.get("is_closed").and_then(Value::as_bool),
        rating: values.get("rating").and_then(Value::as_f64),
        review_count: values.get("review_count").and_then(Value::as_i64),
        distance: values.get("distance").and_then(Value::as_f64),
        coordinates: values.get("coordinates").and_then(decode_coordinate),
        location: values
            .get("location")
            .and_then(Value::as_object)
            .map(decode_location),
        categories: values
            .get("categories")
            .and_then(Value::as_array)
            .map(|entries| {
                entries
                    .iter()
                    .filter_map(Value::as_object)
                    .map(|c| Category {
                        alias: string(c, "alias"),
                        title: string(c, "title"),
                    })
                    .collect()
            })
            .unwrap_or_default(),
        transactions: string_list(values, "transactions"),
    }
}

fn decode_location(values: &Map<String, Value>) -> Location {
    Location {
        address1: string(values, "address1"),
        address2: string(values, "address2"),
        address3: string(values, "address3"),
        city: string(values, "city"),
        country: string(values, "country"),
        state: string(values, "state"),
        zip_code: string(values, "zip_code"),
        display_address: string_list(values, "display_address"),
    }
}

fn decode_coordinate(value: &Value) -> Option<Coordinate> {
    let values = value.as_object()?;
    Coordinate::from_parts(
        values.get("latitude").and_then(Value::as_f64),
        values.get("longitude").and_then(Value::as_f64),
    )
}

fn string(values: &Map<String, Value>, key: &str) -> Option<String> {
    values.get(key).and_then(Value::as_str).map(str::to_string)
}

/// A list of strings; the whole list is dropped if any element is not a string.
fn string_list(values: &Map<String, Value>, key: &str) -> Vec<String> {
    values
        .get(key)
        .and_then(Value::as_array)
        .and_then(|items| {
            items
                .iter()
                .map(|v| v.as_str().map(str::to_string))
                .collect::<Option<Vec<_>>>()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_body() -> Value {
        json!({
            "total": 2,
            "region": { "center": { "latitude": 40.758896, "longitude": -73.98513 } },
            "businesses": [
                {
                    "id": "joes-id",
                    "alias": "joes-pizza-new-york",
                    "name": "Joe's Pizza",
                    "image_url": "https://example.com/joes.jpg",
                    "is_closed": false,
                    "url": "https://www.yelp.com/biz/joes-pizza-new-york",
                    "review_count": 1200,
                    "categories": [
                        { "alias": "pizza", "title": "Pizza" }
                    ],
                    "rating": 4.5,
                    "coordinates": { "latitude": 40.7546, "longitude": -73.9870 },
                    "transactions": ["pickup", "delivery"],
                    "price": "$",
                    "location": {
                        "address1": "1435 Broadway",
                        "address2": "",
                        "address3": null,
                        "city": "New York",
                        "zip_code": "10018",
                        "country": "US",
                        "state": "NY",
                        "display_address": ["1435 Broadway", "New York, NY 10018"]
                    },
                    "phone": "+16468337170",
                    "display_phone": "(646) 833-7170",
                    "distance": 512.3
                },
                {
                    "id": "tacos-id",
                    "name": "Los Tacos",
                    "rating": "excellent",
                    "coordinates": { "latitude": 40.7, "longitude": null },
                    "categories": [ "mexican", { "alias": "tacos", "title": "Tacos" } ],
                    "transactions": ["pickup", 7]
                }
            ]
        })
    }

    #[test]
    fn test_decode_full_business() {
        let response = SearchBusinessesResponse::from_value(&sample_body()).unwrap();
        assert_eq!(response.total, Some(2));
        assert_eq!(
            response.region_center,
            Some(Coordinate::new(40.758_896, -73.985_13))
        );

        let businesses = response.businesses.unwrap();
        assert_eq!(businesses.len(), 2);

        let joes = &businesses[0];
        assert_eq!(joes.id.as_deref(), Some("joes-id"));
        assert_eq!(joes.name.as_deref(), Some("Joe's Pizza"));
        assert_eq!(joes.is_closed, Some(false));
        assert_eq!(joes.review_count, Some(1200));
        assert_eq!(joes.rating, Some(4.5));
        assert_eq!(joes.distance, Some(512.3));
        assert_eq!(joes.coordinates, Some(Coordinate::new(40.7546, -73.9870)));
        assert_eq!(joes.transactions, vec!["pickup", "delivery"]);
        assert_eq!(joes.categories.len(), 1);
        assert_eq!(joes.category_icon(), Some("pizza"));

        let location = joes.location.as_ref().unwrap();
        assert_eq!(location.address1.as_deref(), Some("1435 Broadway"));
        assert_eq!(location.address3, None);
        assert_eq!(location.zip_code.as_deref(), Some("10018"));
        assert_eq!(location.display_address.len(), 2);
    }

    #[test]
    fn test_bad_fields_only_lose_themselves() {
        let response = SearchBusinessesResponse::from_value(&sample_body()).unwrap();
        let tacos = &response.businesses.unwrap()[1];

        assert_eq!(tacos.name.as_deref(), Some("Los Tacos"));
        assert!(tacos.rating.is_none());
        assert!(tacos.coordinates.is_none());
        assert!(tacos.location.is_none());
        assert_eq!(tacos.categories.len(), 1);
        assert_eq!(tacos.categories[0].alias.as_deref(), Some("tacos"));
        assert!(tacos.transactions.is_empty());
    }

    #[test]
    fn test_non_object_business_entries_are_skipped() {
        let body = json!({ "businesses": [ 42, "nope", { "id": "only" } ] });
        let response = SearchBusinessesResponse::from_value(&body).unwrap();
        let businesses = response.businesses.unwrap();
        assert_eq!(businesses.len(), 1);
        assert_eq!(businesses[0].id.as_deref(), Some("only"));
    }

    #[test]
    fn test_empty_business_list_is_none() {
        let body = json!({ "total": 0, "businesses": [], "region": { "center": { "latitude": 1.0, "longitude": 2.0 } } });
        let response = SearchBusinessesResponse::from_value(&body).unwrap();
        assert!(response.businesses.is_none());
        assert!(response.is_empty());
        assert!(response.region_center.is_some());
    }

    #[test]
    fn test_partial_region_center_is_none() {
        let body = json!({ "region": { "center": { "latitude": 1.0 } } });
        let response = SearchBusinessesResponse::from_value(&body).unwrap();
        assert!(response.region_center.is_none());
    }

    #[test]
    fn test_empty_object_decodes() {
        let response = SearchBusinessesResponse::from_slice(b"{}").unwrap();
        assert_eq!(response, SearchBusinessesResponse::default());
    }

    #[test]
    fn test_non_object_body_is_error() {
        assert!(matches!(
            SearchBusinessesResponse::from_slice(b"[1, 2]"),
            Err(Error::Json(_))
        ));
        assert!(matches!(
            SearchBusinessesResponse::from_value(&serde_json::json!("text")),
            Err(Error::Json(_))
        ));
        assert!(matches!(
            SearchBusinessesResponse::from_slice(b"<html>"),
            Err(Error::Json(_))
        ));
    }
}
