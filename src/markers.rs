//! Marker descriptions for the map rendering layer.
//!
//! The core does not draw anything. It turns a cluster query result into one
//! [`Marker`] per feature and hands the list to a [`MarkerRenderer`], which
//! owns the actual map widget.

use crate::feature::{ClusterFeature, ClusterId};
use geo::Point;
use once_cell::sync::Lazy;
use rustc_hash::FxHashMap;
use shopmap_types::ShopPoint;

/// Background of cluster markers.
pub const CLUSTER_GRADIENT: &str = "linear-gradient(135deg, #11A7F3, #5380ff)";

/// How a chain's colours are combined on its marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillStyle {
    Solid,
    Gradient,
    /// Gradient when a secondary colour exists, solid otherwise
    Auto,
}

/// Colour scheme of one chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainStyle {
    pub primary: &'static str,
    pub secondary: Option<&'static str>,
    pub fill: FillStyle,
}

impl ChainStyle {
    const fn solid(primary: &'static str) -> Self {
        Self {
            primary,
            secondary: None,
            fill: FillStyle::Solid,
        }
    }

    const fn gradient(primary: &'static str, secondary: &'static str) -> Self {
        Self {
            primary,
            secondary: Some(secondary),
            fill: FillStyle::Gradient,
        }
    }

    /// CSS background for the marker badge.
    pub fn background(&self) -> String {
        match (self.fill, self.secondary) {
            (FillStyle::Solid, _) | (_, None) => self.primary.to_string(),
            (_, Some(secondary)) => {
                format!("linear-gradient(135deg, {}, {})", self.primary, secondary)
            }
        }
    }

    /// Second stop of the pin gradient; the primary colour when there is none.
    pub fn secondary_or_primary(&self) -> &'static str {
        self.secondary.unwrap_or(self.primary)
    }
}

const OTHER_STYLE: ChainStyle = ChainStyle {
    primary: "#808080",
    secondary: Some("#CCCCCC"),
    fill: FillStyle::Auto,
};

static CHAIN_STYLES: Lazy<FxHashMap<&'static str, ChainStyle>> = Lazy::new(|| {
    let mut styles = FxHashMap::default();
    styles.insert(
        "zabka",
        ChainStyle {
            primary: "#006420",
            secondary: None,
            fill: FillStyle::Auto,
        },
    );
    styles.insert("biedronka", ChainStyle::solid("#FFE600"));
    styles.insert("lidl", ChainStyle::gradient("#0050AA", "#FFC72C"));
    styles.insert("kaufland", ChainStyle::gradient("#E3000F", "#ffffff"));
    styles.insert("aldi", ChainStyle::gradient("#00B4DC", "#02346e"));
    styles.insert("inter", ChainStyle::gradient("#201B1D", "#FFD700"));
    styles.insert("dino", ChainStyle::gradient("#0F9A49", "#ff0000"));
    styles.insert("stokrotka", ChainStyle::solid("#75B726"));
    styles.insert("topaz", ChainStyle::solid("#EC1C24"));
    styles.insert("twoj_market", ChainStyle::gradient("#EC1C24", "#ffe000"));
    styles.insert("dealz", ChainStyle::solid("#00a2a9"));
    styles.insert("carrefour", ChainStyle::gradient("#004E9F", "#FF0000"));
    styles.insert("auchan", ChainStyle::gradient("#cc2131", "#2F9C5C"));
    styles.insert("bp", ChainStyle::gradient("#00A651", "#FFDA00"));
    styles.insert("selgros", ChainStyle::gradient("#ffffff", "#D30A1C"));
    styles.insert("circle_k", ChainStyle::gradient("#D61A0C", "#E08600"));
    styles.insert("eurocash", ChainStyle::gradient("#0D6822", "#D00024"));
    styles.insert("arhelan", ChainStyle::gradient("#E31E25", "#000000"));
    styles.insert("other", OTHER_STYLE);
    styles
});

/// Colour scheme for `chain`, falling back to the neutral `other` scheme.
pub fn chain_style(chain: &str) -> ChainStyle {
    CHAIN_STYLES.get(chain).copied().unwrap_or(OTHER_STYLE)
}

/// Size tier of a cluster marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClusterTier {
    /// Marker diameter in pixels
    pub size_px: u32,
    pub font_px: u32,
}

impl ClusterTier {
    pub fn for_count(point_count: usize) -> Self {
        match point_count {
            0..=9 => Self {
                size_px: 50,
                font_px: 14,
            },
            10..=99 => Self {
                size_px: 60,
                font_px: 16,
            },
            _ => Self {
                size_px: 70,
                font_px: 18,
            },
        }
    }
}

/// Content of a shop marker's round badge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Badge {
    Logo(String),
    /// Upper-cased first letter of the chain
    Initial(char),
}

#[derive(Debug, Clone, PartialEq)]
pub enum MarkerKind<'a> {
    Cluster {
        point_count: usize,
        tier: ClusterTier,
    },
    Shop {
        shop: &'a ShopPoint,
        style: ChainStyle,
        badge: Badge,
    },
}

/// What clicking a marker should do.
#[derive(Debug, Clone, PartialEq)]
pub enum MarkerAction<'a> {
    /// Zoom into the cluster, centering on its position
    ExpandCluster { id: ClusterId, position: Point<f64> },
    SelectShop(&'a ShopPoint),
}

/// One marker to place on the map.
#[derive(Debug, Clone, PartialEq)]
pub struct Marker<'a> {
    pub position: Point<f64>,
    pub kind: MarkerKind<'a>,
    pub action: MarkerAction<'a>,
}

impl<'a> Marker<'a> {
    pub fn from_feature(feature: &ClusterFeature<'a>) -> Self {
        match *feature {
            ClusterFeature::Cluster {
                id,
                point_count,
                position,
            } => Self {
                position,
                kind: MarkerKind::Cluster {
                    point_count,
                    tier: ClusterTier::for_count(point_count),
                },
                action: MarkerAction::ExpandCluster { id, position },
            },
            ClusterFeature::Leaf { shop } => Self {
                position: shop.position(),
                kind: MarkerKind::Shop {
                    shop,
                    style: chain_style(&shop.chain),
                    badge: badge_for(shop),
                },
                action: MarkerAction::SelectShop(shop),
            },
        }
    }

    /// Text shown on the marker: the count for clusters, the initial for shops
    /// without a logo.
    pub fn label(&self) -> Option<String> {
        match &self.kind {
            MarkerKind::Cluster { point_count, .. } => Some(point_count.to_string()),
            MarkerKind::Shop {
                badge: Badge::Initial(initial),
                ..
            } => Some(initial.to_string()),
            MarkerKind::Shop { .. } => None,
        }
    }
}

fn badge_for(shop: &ShopPoint) -> Badge {
    match shop.logo_url.as_deref() {
        Some(url) if !url.is_empty() => Badge::Logo(url.to_string()),
        _ => Badge::Initial(
            shop.chain
                .chars()
                .next()
                .and_then(|c| c.to_uppercase().next())
                .unwrap_or('?'),
        ),
    }
}

/// One marker per feature, in query order.
pub fn build_markers<'a>(features: &[ClusterFeature<'a>]) -> Vec<Marker<'a>> {
    features.iter().map(Marker::from_feature).collect()
}

/// Map widget integration.
pub trait MarkerRenderer {
    /// Replace every marker currently on the map with `markers`.
    fn render(&mut self, markers: &[Marker<'_>]);

    /// Remove all markers, e.g. when the map is torn down.
    fn clear(&mut self) {
        self.render(&[]);
    }
}

/// Renderer that discards everything, for headless sessions.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullRenderer;

impl MarkerRenderer for NullRenderer {
    fn render(&mut self, _markers: &[Marker<'_>]) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cluster_tiers() {
        assert_eq!(ClusterTier::for_count(9).size_px, 50);
        assert_eq!(ClusterTier::for_count(10).size_px, 60);
        assert_eq!(ClusterTier::for_count(99).font_px, 16);
        assert_eq!(ClusterTier::for_count(100).size_px, 70);
        assert_eq!(ClusterTier::for_count(5000).font_px, 18);
    }

    #[test]
    fn test_chain_backgrounds() {
        assert_eq!(chain_style("biedronka").background(), "#FFE600");
        assert_eq!(
            chain_style("lidl").background(),
            "linear-gradient(135deg, #0050AA, #FFC72C)"
        );
        assert_eq!(chain_style("zabka").background(), "#006420");
        assert_eq!(chain_style("zabka").secondary_or_primary(), "#006420");
        assert_eq!(
            chain_style("netto").background(),
            "linear-gradient(135deg, #808080, #CCCCCC)"
        );
    }

    #[test]
    fn test_markers_from_features() {
        let plain = ShopPoint::new("Dino", "dino", "", 52.4, 16.9);
        let branded = ShopPoint::new("Aldi", "aldi", "", 52.5, 16.8).with_logo_url("aldi.png");
        let features = vec![
            ClusterFeature::Cluster {
                id: ClusterId::from_raw(77),
                point_count: 42,
                position: Point::new(17.0, 52.0),
            },
            ClusterFeature::Leaf { shop: &plain },
            ClusterFeature::Leaf { shop: &branded },
        ];

        let markers = build_markers(&features);
        assert_eq!(markers.len(), 3);
        assert_eq!(markers[0].label().as_deref(), Some("42"));
        assert_eq!(
            markers[0].action,
            MarkerAction::ExpandCluster {
                id: ClusterId::from_raw(77),
                position: Point::new(17.0, 52.0),
            }
        );
        assert_eq!(markers[1].label().as_deref(), Some("D"));
        assert_eq!(markers[1].action, MarkerAction::SelectShop(&plain));
        assert!(markers[2].label().is_none());
        assert_eq!(markers[2].position, Point::new(16.8, 52.5));
    }

    #[test]
    fn test_default_clear_renders_nothing() {
        struct Counting(Vec<usize>);
        impl MarkerRenderer for Counting {
            fn render(&mut self, markers: &[Marker<'_>]) {
                self.0.push(markers.len());
            }
        }

        let mut renderer = Counting(Vec::new());
        renderer.clear();
        assert_eq!(renderer.0, vec![0]);
    }
}
