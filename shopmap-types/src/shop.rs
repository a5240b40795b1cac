use geo::Point;
use serde::{Deserialize, Serialize};

/// A product stocked by a shop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub flavor: String,
    #[serde(default)]
    pub photo_url: String,
    #[serde(default)]
    pub category: String,
}

impl Product {
    pub fn new(id: u64, name: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            flavor: String::new(),
            photo_url: String::new(),
            category: category.into(),
        }
    }

    pub fn with_flavor(mut self, flavor: impl Into<String>) -> Self {
        self.flavor = flavor.into();
        self
    }
}

/// A retail location as delivered by the shop data service.
///
/// A `ShopPoint` is an immutable snapshot entry: every refresh replaces the
/// whole list, shops are never patched in place. Field names follow the
/// backend JSON so a response body deserializes directly.
///
/// # Examples
///
/// ```
/// use shopmap_types::shop::{Product, ShopPoint};
///
/// let shop = ShopPoint::new("Biedronka", "biedronka", "Prosta 2", 52.23, 20.99)
///     .with_products(vec![Product::new(7, "Energy", "energy_drink")]);
///
/// assert!(shop.has_product(7));
/// assert_eq!(shop.shop_id(), "52.23_20.99");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShopPoint {
    pub name: String,
    pub chain: String,
    #[serde(default)]
    pub address: String,
    pub lat: f64,
    pub lon: f64,
    /// Distance in meters from the requested center, filled in by the backend.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance: Option<f64>,
    /// Distance in meters from the user's location, when one was supplied.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance_from_user: Option<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub products: Vec<Product>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,
}

impl ShopPoint {
    pub fn new(
        name: impl Into<String>,
        chain: impl Into<String>,
        address: impl Into<String>,
        lat: f64,
        lon: f64,
    ) -> Self {
        Self {
            name: name.into(),
            chain: chain.into(),
            address: address.into(),
            lat,
            lon,
            distance: None,
            distance_from_user: None,
            products: Vec::new(),
            logo_url: None,
        }
    }

    pub fn with_products(mut self, products: Vec<Product>) -> Self {
        self.products = products;
        self
    }

    pub fn with_logo_url(mut self, url: impl Into<String>) -> Self {
        self.logo_url = Some(url.into());
        self
    }

    /// Shop location as a `geo` point (x = longitude, y = latitude).
    #[inline]
    pub fn position(&self) -> Point<f64> {
        Point::new(self.lon, self.lat)
    }

    /// Identifier derived from the coordinate, unique within one snapshot
    /// unless two shops share the exact same location.
    pub fn shop_id(&self) -> String {
        format!("{}_{}", self.lat, self.lon)
    }

    pub fn has_product(&self, product_id: u64) -> bool {
        self.products.iter().any(|p| p.id == product_id)
    }

    pub fn has_category(&self, category: &str) -> bool {
        self.products.iter().any(|p| p.category == category)
    }
}
