//! Cluster queries with the render-side limits applied.
//!
//! [`ShopIndex`] answers exact questions; the functions here wrap it with the
//! policies the map layer needs: a feature cap at low zoom and a
//! never-failing expansion zoom for cluster clicks.

use crate::config::QueryConfig;
use crate::feature::{ClusterFeature, ClusterId};
use crate::index::ShopIndex;
use shopmap_types::{Bounds, zoom_level};

/// Visible features for `bounds` at `zoom`.
///
/// Below [`QueryConfig::cap_below_zoom`] the result is truncated to
/// [`QueryConfig::feature_cap`] features. Zooming in shrinks the result
/// below the cap, so nothing stays hidden for good.
pub fn query_clusters<'a>(
    index: &'a ShopIndex,
    bounds: &Bounds,
    zoom: f64,
    config: &QueryConfig,
) -> Vec<ClusterFeature<'a>> {
    let mut features = index.clusters(bounds, zoom);

    if zoom_level(zoom) < config.cap_below_zoom && features.len() > config.feature_cap {
        log::debug!(
            "Truncating {} features to {} at zoom {}",
            features.len(),
            config.feature_cap,
            zoom
        );
        features.truncate(config.feature_cap);
    }

    features
}

/// Zoom to jump to when a cluster marker is clicked.
///
/// A known cluster yields its expansion zoom, capped at
/// [`QueryConfig::max_expansion_zoom`]. A missing or unknown id never fails:
/// it falls back to `current_zoom + fallback_zoom_step` under the same cap
/// and logs a warning.
pub fn resolve_expansion_zoom(
    index: &ShopIndex,
    id: Option<ClusterId>,
    current_zoom: u8,
    config: &QueryConfig,
) -> u8 {
    let fallback = current_zoom
        .saturating_add(config.fallback_zoom_step)
        .min(config.max_expansion_zoom);

    let Some(id) = id else {
        log::warn!(
            "Cluster click without a cluster id, zooming to {}",
            fallback
        );
        return fallback;
    };

    match index.expansion_zoom(id) {
        Ok(zoom) => zoom.min(config.max_expansion_zoom),
        Err(e) => {
            log::warn!("Could not resolve expansion zoom: {}, zooming to {}", e, fallback);
            fallback
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClusterConfig;
    use shopmap_types::ShopPoint;

    fn grid(n: usize, step: f64) -> Vec<ShopPoint> {
        let side = (n as f64).sqrt().ceil() as usize;
        (0..n)
            .map(|i| {
                ShopPoint::new(
                    format!("shop {i}"),
                    "biedronka",
                    "",
                    50.0 + (i / side) as f64 * step,
                    15.0 + (i % side) as f64 * step,
                )
            })
            .collect()
    }

    #[test]
    fn test_cap_applies_below_zoom_8() {
        // Far apart and min_points high enough that nothing clusters.
        let config = ClusterConfig::default().with_min_points(10_000);
        let index = ShopIndex::build(grid(1500, 0.05), &config);
        let bounds = Bounds::new(14.0, 49.0, 24.0, 55.0);

        let capped = query_clusters(&index, &bounds, 7.0, &QueryConfig::default());
        assert_eq!(capped.len(), 1000);

        let uncapped = query_clusters(&index, &bounds, 8.0, &QueryConfig::default());
        assert_eq!(uncapped.len(), 1500);
    }

    #[test]
    fn test_small_results_untouched() {
        let index = ShopIndex::build(grid(20, 0.5), &ClusterConfig::default());
        let bounds = Bounds::new(14.0, 49.0, 24.0, 55.0);
        let direct = index.clusters(&bounds, 3.0);
        let queried = query_clusters(&index, &bounds, 3.0, &QueryConfig::default());
        assert_eq!(direct, queried);
    }

    #[test]
    fn test_unknown_id_falls_back() {
        let index = ShopIndex::build(grid(12, 0.001), &ClusterConfig::default());
        let config = QueryConfig::default();

        let bogus = Some(ClusterId::from_raw(9_999_999));
        assert_eq!(resolve_expansion_zoom(&index, bogus, 10, &config), 12);
        assert_eq!(resolve_expansion_zoom(&index, bogus, 16, &config), 17);
        assert_eq!(resolve_expansion_zoom(&index, None, 4, &config), 6);
    }

    #[test]
    fn test_known_id_uses_suggestion() {
        let index = ShopIndex::build(grid(12, 0.001), &ClusterConfig::default());
        let bounds = Bounds::new(14.0, 49.0, 24.0, 55.0);
        let id = index.clusters(&bounds, 5.0)[0].cluster_id().unwrap();

        let expected = index.expansion_zoom(id).unwrap().min(17);
        let resolved = resolve_expansion_zoom(&index, Some(id), 5, &QueryConfig::default());
        assert_eq!(resolved, expected);
    }
}
