//! Shop data collaborator contract.
//!
//! The map core never talks to the network itself. Whatever supplies shops
//! implements [`ShopSource`]; the HTTP client in `api` is one such supplier,
//! [`InMemorySource`] is another for demos and tests.

use crate::tracker::FetchRequest;
use geo::{Distance, Haversine, Point};
use shopmap_types::ShopPoint;
use thiserror::Error;

/// Parameters of one shop data request.
#[derive(Debug, Clone, PartialEq)]
pub struct ShopQuery {
    /// Requested center (x = longitude, y = latitude)
    pub center: Point<f64>,
    pub zoom: u8,
    /// Search radius in meters
    pub radius_m: u32,
    /// User location, used by the backend to fill `distance_from_user`
    pub user_location: Option<Point<f64>>,
    /// Comma-separated product id filter
    pub products: Option<String>,
}

impl ShopQuery {
    pub fn new(center: Point<f64>, zoom: u8, radius_m: u32) -> Self {
        Self {
            center,
            zoom,
            radius_m,
            user_location: None,
            products: None,
        }
    }

    pub fn from_request(request: &FetchRequest) -> Self {
        Self::new(request.center, request.zoom, request.radius_m)
    }

    pub fn with_user_location(mut self, location: Option<Point<f64>>) -> Self {
        self.user_location = location;
        self
    }

    pub fn with_products(mut self, products: Option<String>) -> Self {
        self.products = products.filter(|p| !p.trim().is_empty());
        self
    }
}

/// Failure of a shop data request.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Request never produced a response
    #[error("transport error: {0}")]
    Transport(String),

    #[error("server responded with status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("malformed response: {0}")]
    Malformed(String),
}

/// Supplier of shop snapshots for a region.
pub trait ShopSource {
    /// Fetch the shops for `query`. A failure leaves the caller's previous
    /// snapshot in place.
    fn fetch_shops(&mut self, query: &ShopQuery) -> Result<Vec<ShopPoint>, FetchError>;
}

impl<F> ShopSource for F
where
    F: FnMut(&ShopQuery) -> Result<Vec<ShopPoint>, FetchError>,
{
    fn fetch_shops(&mut self, query: &ShopQuery) -> Result<Vec<ShopPoint>, FetchError> {
        self(query)
    }
}

/// Source answering radius queries from a fixed shop list.
///
/// Results are sorted by distance from the requested center, with the
/// `distance` and `distance_from_user` fields filled in like the backend
/// does.
#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    shops: Vec<ShopPoint>,
}

impl InMemorySource {
    pub fn new(shops: Vec<ShopPoint>) -> Self {
        Self { shops }
    }

    pub fn len(&self) -> usize {
        self.shops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shops.is_empty()
    }
}

impl ShopSource for InMemorySource {
    fn fetch_shops(&mut self, query: &ShopQuery) -> Result<Vec<ShopPoint>, FetchError> {
        let product_ids = match &query.products {
            Some(list) => Some(parse_product_ids(list)?),
            None => None,
        };

        let mut found: Vec<ShopPoint> = self
            .shops
            .iter()
            .filter_map(|shop| {
                let distance = Haversine.distance(query.center, shop.position());
                (distance <= query.radius_m as f64).then(|| {
                    let mut shop = shop.clone();
                    shop.distance = Some(distance.round());
                    shop.distance_from_user = query
                        .user_location
                        .map(|user| Haversine.distance(user, shop.position()).round());
                    shop
                })
            })
            .filter(|shop| match &product_ids {
                Some(ids) => ids.iter().any(|&id| shop.has_product(id)),
                None => true,
            })
            .collect();

        found.sort_by(|a, b| a.distance.unwrap_or(0.0).total_cmp(&b.distance.unwrap_or(0.0)));
        Ok(found)
    }
}

fn parse_product_ids(list: &str) -> Result<Vec<u64>, FetchError> {
    list.split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(|id| {
            id.parse::<u64>()
                .map_err(|_| FetchError::Malformed(format!("invalid product id '{}'", id)))
        })
        .collect()
}
