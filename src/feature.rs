//! Map features produced by cluster queries.
//!
//! A query returns a flat list of [`ClusterFeature`]s: aggregated clusters and
//! single-shop leaves, told apart by the `cluster` flag when rendered as
//! GeoJSON.

use geo::Point;
use shopmap_types::ShopPoint;
use std::fmt;

/// Opaque identifier of a cluster within one index build.
///
/// Identifiers are only meaningful for the index that produced them; after a
/// rebuild the same number may denote a different cluster or none at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClusterId(usize);

impl ClusterId {
    /// Wrap a raw identifier, e.g. one round-tripped through a UI layer.
    pub const fn from_raw(raw: usize) -> Self {
        Self(raw)
    }

    pub const fn get(self) -> usize {
        self.0
    }
}

impl fmt::Display for ClusterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One visible map feature: a cluster or a single shop.
#[derive(Debug, Clone, PartialEq)]
pub enum ClusterFeature<'a> {
    Cluster {
        id: ClusterId,
        /// Number of shops aggregated in this cluster
        point_count: usize,
        /// Count-weighted centroid of the aggregated shops
        position: Point<f64>,
    },
    Leaf {
        shop: &'a ShopPoint,
    },
}

impl<'a> ClusterFeature<'a> {
    pub fn is_cluster(&self) -> bool {
        matches!(self, ClusterFeature::Cluster { .. })
    }

    pub fn position(&self) -> Point<f64> {
        match self {
            ClusterFeature::Cluster { position, .. } => *position,
            ClusterFeature::Leaf { shop } => shop.position(),
        }
    }

    /// Number of shops represented; 1 for a leaf.
    pub fn point_count(&self) -> usize {
        match self {
            ClusterFeature::Cluster { point_count, .. } => *point_count,
            ClusterFeature::Leaf { .. } => 1,
        }
    }

    pub fn cluster_id(&self) -> Option<ClusterId> {
        match self {
            ClusterFeature::Cluster { id, .. } => Some(*id),
            ClusterFeature::Leaf { .. } => None,
        }
    }

    pub fn shop(&self) -> Option<&'a ShopPoint> {
        match self {
            ClusterFeature::Cluster { .. } => None,
            ClusterFeature::Leaf { shop } => Some(shop),
        }
    }
}

/// Short label for a point count: `950`, `3.4k`, `12k`.
pub fn abbreviate_count(count: usize) -> String {
    if count >= 10_000 {
        format!("{}k", (count as f64 / 1000.0).round())
    } else if count >= 1000 {
        format!("{}k", (count as f64 / 100.0).round() / 10.0)
    } else {
        count.to_string()
    }
}

#[cfg(feature = "geojson")]
mod geojson_support {
    use super::{ClusterFeature, abbreviate_count};
    use geojson::{Feature, FeatureCollection, Geometry, JsonObject, JsonValue, Value};

    impl ClusterFeature<'_> {
        /// Render as a GeoJSON point feature keyed by the `cluster` flag.
        pub fn to_geojson(&self) -> Feature {
            let position = self.position();
            let geometry = Geometry::new(Value::Point(vec![position.x(), position.y()]));
            let mut properties = JsonObject::new();

            match self {
                ClusterFeature::Cluster {
                    id, point_count, ..
                } => {
                    properties.insert("cluster".to_string(), JsonValue::Bool(true));
                    properties.insert("cluster_id".to_string(), JsonValue::from(id.get()));
                    properties.insert("point_count".to_string(), JsonValue::from(*point_count));
                    properties.insert(
                        "point_count_abbreviated".to_string(),
                        JsonValue::String(abbreviate_count(*point_count)),
                    );
                }
                ClusterFeature::Leaf { shop } => {
                    properties.insert("cluster".to_string(), JsonValue::Bool(false));
                    properties.insert("shopId".to_string(), JsonValue::String(shop.shop_id()));
                    properties.insert("name".to_string(), JsonValue::String(shop.name.clone()));
                    properties.insert("chain".to_string(), JsonValue::String(shop.chain.clone()));
                    properties.insert(
                        "shop".to_string(),
                        serde_json::to_value(shop).unwrap_or(JsonValue::Null),
                    );
                }
            }

            Feature {
                bbox: None,
                geometry: Some(geometry),
                id: self
                    .cluster_id()
                    .map(|id| geojson::feature::Id::Number(id.get().into())),
                properties: Some(properties),
                foreign_members: None,
            }
        }
    }

    /// Collect a query result into a GeoJSON feature collection.
    pub fn to_feature_collection(features: &[ClusterFeature<'_>]) -> FeatureCollection {
        FeatureCollection {
            bbox: None,
            features: features.iter().map(ClusterFeature::to_geojson).collect(),
            foreign_members: None,
        }
    }
}

#[cfg(feature = "geojson")]
pub use geojson_support::to_feature_collection;
