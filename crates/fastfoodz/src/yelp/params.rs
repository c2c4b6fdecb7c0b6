//! Query parameters for the business search endpoint.
//!
//! Every parameter is optional except the location. Only parameters that are
//! set end up on the query string.

use crate::error::{Error, Result};

/// Largest search radius the endpoint accepts, in metres.
pub const MAX_RADIUS_METERS: u32 = 40_000;

/// Largest page size the endpoint accepts.
pub const MAX_LIMIT: u32 = 50;

/// Where to search. The endpoint needs exactly one of these forms.
#[derive(Debug, Clone, PartialEq)]
pub enum LocationParam {
    /// Free-form address, e.g. "New York City".
    Address(String),
    /// Explicit coordinates.
    Coordinates {
        /// Latitude in degrees.
        latitude: f64,
        /// Longitude in degrees.
        longitude: f64,
    },
}

impl LocationParam {
    /// Search around a free-form address.
    #[must_use]
    pub fn address(location: impl Into<String>) -> Self {
        Self::Address(location.into())
    }

    /// Search around a point.
    #[must_use]
    pub fn coordinates(latitude: f64, longitude: f64) -> Self {
        Self::Coordinates {
            latitude,
            longitude,
        }
    }

    fn append_to(&self, query: &mut Vec<(&'static str, String)>) {
        match self {
            Self::Address(location) => query.push(("location", location.clone())),
            Self::Coordinates {
                latitude,
                longitude,
            } => {
                query.push(("latitude", latitude.to_string()));
                query.push(("longitude", longitude.to_string()));
            }
        }
    }
}

/// Result ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortBy {
    /// Upstream relevance ranking.
    BestMatch,
    /// Highest rated first.
    Rating,
    /// Most reviewed first.
    ReviewCount,
    /// Nearest first.
    Distance,
}

impl SortBy {
    /// Wire value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BestMatch => "best_match",
            Self::Rating => "rating",
            Self::ReviewCount => "review_count",
            Self::Distance => "distance",
        }
    }
}

/// Price bracket filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PriceFilter {
    /// `$`
    One,
    /// `$$`
    Two,
    /// `$$$`
    Three,
    /// `$$$$`
    Four,
}

impl PriceFilter {
    /// 1-based level sent on the wire.
    #[must_use]
    pub fn level(&self) -> u8 {
        match self {
            Self::One => 1,
            Self::Two => 2,
            Self::Three => 3,
            Self::Four => 4,
        }
    }
}

/// Business attribute filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusinessAttribute {
    /// Recently opened and popular.
    HotAndNew,
    /// Accepts quote requests.
    RequestAQuote,
    /// Takes reservations.
    Reservation,
    /// Takes waitlist reservations.
    WaitlistReservation,
    /// Offers cash back.
    Cashback,
    /// Offers deals.
    Deals,
    /// Has gender neutral restrooms.
    GenderNeutralRestrooms,
    /// Open to all.
    OpenToAll,
    /// Wheelchair accessible.
    WheelchairAccessible,
}

impl BusinessAttribute {
    /// Wire value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::HotAndNew => "hot_and_new",
            Self::RequestAQuote => "request_a_quote",
            Self::Reservation => "reservation",
            Self::WaitlistReservation => "waitlist_reservation",
            Self::Cashback => "cashback",
            Self::Deals => "deals",
            Self::GenderNeutralRestrooms => "gender_neutral_restrooms",
            Self::OpenToAll => "open_to_all",
            Self::WheelchairAccessible => "wheelchair_accessible",
        }
    }
}

/// Optional search parameters.
///
/// Built with chained setters; unset parameters are left off the request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchParams {
    /// Search term, e.g. "food".
    pub term: Option<String>,
    /// Search radius in metres.
    pub radius_meters: Option<u32>,
    /// Category aliases to include.
    pub categories: Option<Vec<String>>,
    /// Locale, e.g. `en_US`.
    pub locale: Option<String>,
    /// Page size.
    pub limit: Option<u32>,
    /// Page offset.
    pub offset: Option<u32>,
    /// Result ordering.
    pub sort_by: Option<SortBy>,
    /// Price brackets to include.
    pub price: Option<Vec<PriceFilter>>,
    /// Only businesses open now.
    pub open_now: Option<bool>,
    /// Only businesses open at this unix time.
    pub open_at: Option<i64>,
    /// Attribute filters.
    pub attributes: Option<Vec<BusinessAttribute>>,
}

impl SearchParams {
    /// Create an empty parameter set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the search term.
    #[must_use]
    pub fn term(mut self, term: impl Into<String>) -> Self {
        self.term = Some(term.into());
        self
    }

    /// Set the search radius in metres.
    #[must_use]
    pub fn radius_meters(mut self, radius: u32) -> Self {
        self.radius_meters = Some(radius);
        self
    }

    /// Set the category aliases.
    #[must_use]
    pub fn categories<I, S>(mut self, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.categories = Some(categories.into_iter().map(Into::into).collect());
        self
    }

    /// Set the locale.
    #[must_use]
    pub fn locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = Some(locale.into());
        self
    }

    /// Set the page size.
    #[must_use]
    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Set the page offset.
    #[must_use]
    pub fn offset(mut self, offset: u32) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Set the ordering.
    #[must_use]
    pub fn sort_by(mut self, sort_by: SortBy) -> Self {
        self.sort_by = Some(sort_by);
        self
    }

    /// Set the price brackets.
    #[must_use]
    pub fn price(mut self, price: impl IntoIterator<Item = PriceFilter>) -> Self {
        self.price = Some(price.into_iter().collect());
        self
    }

    /// Only return businesses open now.
    #[must_use]
    pub fn open_now(mut self, open_now: bool) -> Self {
        self.open_now = Some(open_now);
        self
    }

    /// Only return businesses open at the given unix time.
    #[must_use]
    pub fn open_at(mut self, unix_time: i64) -> Self {
        self.open_at = Some(unix_time);
        self
    }

    /// Set the attribute filters.
    #[must_use]
    pub fn attributes(mut self, attributes: impl IntoIterator<Item = BusinessAttribute>) -> Self {
        self.attributes = Some(attributes.into_iter().collect());
        self
    }

    /// Check the parameters against the endpoint's documented limits.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidParam`] for the first violation found.
    pub fn validate(&self, location: &LocationParam) -> Result<()> {
        match location {
            LocationParam::Address(address) if address.trim().is_empty() => {
                return Err(Error::invalid_param("location", "must not be empty"));
            }
            LocationParam::Coordinates {
                latitude,
                longitude,
            } => {
                if !crate::model::Coordinate::new(*latitude, *longitude).is_valid() {
                    return Err(Error::invalid_param(
                        "latitude/longitude",
                        format!("({latitude}, {longitude}) is out of range"),
                    ));
                }
            }
            LocationParam::Address(_) => {}
        }

        if let Some(radius) = self.radius_meters {
            if radius > MAX_RADIUS_METERS {
                return Err(Error::invalid_param(
                    "radius",
                    format!("{radius} exceeds the maximum of {MAX_RADIUS_METERS}"),
                ));
            }
        }

        if let Some(limit) = self.limit {
            if limit == 0 || limit > MAX_LIMIT {
                return Err(Error::invalid_param(
                    "limit",
                    format!("{limit} is outside 1..={MAX_LIMIT}"),
                ));
            }
        }

        if self.open_now.is_some() && self.open_at.is_some() {
            return Err(Error::invalid_param(
                "open_at",
                "cannot be combined with open_now",
            ));
        }

        Ok(())
    }

    /// Render the location and every set parameter as query pairs.
    ///
    /// List-valued parameters are comma-joined and dropped when empty.
    #[must_use]
    pub fn to_query(&self, location: &LocationParam) -> Vec<(&'static str, String)> {
        let mut query = Vec::new();

        if let Some(term) = &self.term {
            query.push(("term", term.clone()));
        }
        location.append_to(&mut query);
        if let Some(radius) = self.radius_meters {
            query.push(("radius", radius.to_string()));
        }
        push_list(&mut query, "categories", self.categories.as_deref(), |c| {
            c.clone()
        });
        if let Some(locale) = &self.locale {
            query.push(("locale", locale.clone()));
        }
        if let Some(limit) = self.limit {
            query.push(("limit", limit.to_string()));
        }
        if let Some(offset) = self.offset {
            query.push(("offset", offset.to_string()));
        }
        if let Some(sort_by) = self.sort_by {
            query.push(("sort_by", sort_by.as_str().to_string()));
        }
        push_list(&mut query, "price", self.price.as_deref(), |p| {
            p.level().to_string()
        });
        if let Some(open_now) = self.open_now {
            query.push(("open_now", open_now.to_string()));
        }
        if let Some(open_at) = self.open_at {
            query.push(("open_at", open_at.to_string()));
        }
        push_list(&mut query, "attributes", self.attributes.as_deref(), |a| {
            a.as_str().to_string()
        });

        query
    }
}

fn push_list<T>(
    query: &mut Vec<(&'static str, String)>,
    key: &'static str,
    values: Option<&[T]>,
    render: impl Fn(&T) -> String,
) {
    if let Some(values) = values.filter(|v| !v.is_empty()) {
        let joined = values.iter().map(render).collect::<Vec<_>>().join(",");
        query.push((key, joined));
    }
}
