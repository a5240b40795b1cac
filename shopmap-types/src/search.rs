use geo::Point;
use serde::{Deserialize, Serialize};

/// A product suggestion returned by the product search service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductMatch {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub flavor: String,
    #[serde(default)]
    pub category: String,
    pub full_name: String,
    #[serde(default)]
    pub photo_url: Option<String>,
}

/// A geocoded place name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceMatch {
    #[serde(default)]
    pub city: String,
    pub lat: f64,
    pub lon: f64,
    #[serde(default)]
    pub display_name: String,
}

impl PlaceMatch {
    pub fn position(&self) -> Point<f64> {
        Point::new(self.lon, self.lat)
    }

    /// The display name, or the searched city when the service sent none.
    pub fn label(&self) -> &str {
        if self.display_name.is_empty() {
            &self.city
        } else {
            &self.display_name
        }
    }
}

/// Platform-wide counters shown on the project info panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformStats {
    pub shops: u64,
    pub products: u64,
    /// Unix timestamp (seconds) of the last refresh.
    pub last_updated: i64,
}
