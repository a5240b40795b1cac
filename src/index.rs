//! Hierarchical point clustering index over a shop snapshot.
//!
//! The index keeps one R-tree per zoom level, from `min_zoom` up to
//! `max_zoom + 1`. The top level holds every shop as a projected point; each
//! lower level is derived from the one above by greedy radius merging:
//!
//! 1. **Visit**: walk the nodes of the level above in order, skipping nodes
//!    already absorbed at this zoom.
//! 2. **Gather**: collect the unabsorbed neighbours within
//!    `radius / (extent * 2^zoom)` in projected space using the R-tree.
//! 3. **Merge or carry**: if the gathered count reaches `min_points`, emit a
//!    cluster at the count-weighted centroid and tag every member with the
//!    new cluster id as parent; otherwise carry the nodes down unchanged.
//!
//! Cluster ids encode their origin so that children can be located without a
//! side table: `(slot << 5) + (zoom + 1) + shop_count`, where `slot` is the
//! position of the seed node in the level above.
//!
//! The index is immutable once built. A new shop snapshot means a new index;
//! there is no incremental insert or delete.
//!
//! ## Example
//!
//! ```rust
//! use shopmap::{ClusterConfig, ShopIndex};
//! use shopmap_types::{Bounds, ShopPoint};
//!
//! let shops: Vec<ShopPoint> = (0..12)
//!     .map(|i| ShopPoint::new(format!("shop {i}"), "zabka", "", 52.23 + i as f64 * 0.001, 21.01))
//!     .collect();
//!
//! let index = ShopIndex::build(shops, &ClusterConfig::default());
//! let features = index.clusters(&Bounds::new(20.5, 51.9, 21.5, 52.6), 10.0);
//!
//! assert_eq!(features.len(), 1);
//! assert_eq!(features[0].point_count(), 12);
//! ```

use crate::config::{ClusterConfig, MAX_CLUSTER_ZOOM};
use crate::error::{Result, ShopMapError};
use crate::feature::{ClusterFeature, ClusterId};
use crate::projection::{lat_y, lng_x, wrap_lng, x_lng, y_lat};
use geo::Point;
use rstar::primitives::GeomWithData;
use rstar::{AABB, RStarInsertionStrategy, RTree, RTreeParams};
use shopmap_types::{Bounds, ShopPoint, zoom_level};
use smallvec::SmallVec;

/// Maximum number of entries per R-tree node.
pub const NODE_SIZE: usize = 64;

/// Bits reserved for the origin zoom inside a cluster id.
const ZOOM_BITS: usize = 5;
const ZOOM_MASK: usize = (1 << ZOOM_BITS) - 1;

/// R-tree tuning for the per-zoom point trees.
pub struct ShopTreeParams;

impl RTreeParams for ShopTreeParams {
    const MIN_SIZE: usize = NODE_SIZE / 4;
    const MAX_SIZE: usize = NODE_SIZE;
    const REINSERTION_COUNT: usize = NODE_SIZE / 8;
    type DefaultInsertionStrategy = RStarInsertionStrategy;
}

/// Projected position tagged with the node slot it belongs to.
type TreeEntry = GeomWithData<[f64; 2], usize>;

/// A point or cluster at one zoom level, in projected coordinates.
#[derive(Debug, Clone)]
struct Node {
    x: f64,
    y: f64,
    /// Shop index for leaves, cluster id for clusters
    id: usize,
    num_points: usize,
    /// Cluster this node was merged into at the next lower zoom
    parent: Option<usize>,
    /// Already absorbed while building the next lower zoom
    visited: bool,
}

impl Node {
    fn leaf(x: f64, y: f64, shop: usize) -> Self {
        Self {
            x,
            y,
            id: shop,
            num_points: 1,
            parent: None,
            visited: false,
        }
    }

    fn cluster(x: f64, y: f64, id: usize, num_points: usize) -> Self {
        Self {
            x,
            y,
            id,
            num_points,
            parent: None,
            visited: false,
        }
    }

    /// Copy of this node for the next lower zoom.
    fn carried(&self) -> Self {
        Self {
            parent: None,
            visited: false,
            ..self.clone()
        }
    }

    #[inline]
    fn is_cluster(&self) -> bool {
        self.num_points > 1
    }
}

/// Slots of the entries within `radius` of `(x, y)`, in projected units.
fn slots_within(
    tree: &RTree<TreeEntry, ShopTreeParams>,
    x: f64,
    y: f64,
    radius: f64,
) -> SmallVec<[usize; 32]> {
    tree.locate_within_distance([x, y], radius * radius)
        .map(|entry| entry.data)
        .collect()
}

struct Level {
    nodes: Vec<Node>,
    tree: RTree<TreeEntry, ShopTreeParams>,
}

impl Level {
    fn new(nodes: Vec<Node>) -> Self {
        let entries = nodes
            .iter()
            .enumerate()
            .map(|(slot, node)| TreeEntry::new([node.x, node.y], slot))
            .collect();

        Self {
            tree: RTree::bulk_load_with_params(entries),
            nodes,
        }
    }

    fn within(&self, x: f64, y: f64, radius: f64) -> SmallVec<[usize; 32]> {
        slots_within(&self.tree, x, y, radius)
    }

    fn range(&self, min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Vec<usize> {
        let envelope = AABB::from_corners([min_x, min_y], [max_x, max_y]);
        self.tree
            .locate_in_envelope(&envelope)
            .map(|entry| entry.data)
            .collect()
    }
}

/// Clustering index over one snapshot of shops.
pub struct ShopIndex {
    shops: Vec<ShopPoint>,
    /// Levels indexed by `zoom - min_zoom`, the last one holding raw points
    levels: Vec<Level>,
    indexed: usize,
    config: ClusterConfig,
}

impl ShopIndex {
    /// Build the index for `shops`.
    ///
    /// Shops with non-finite coordinates are kept in the snapshot but left
    /// out of the index. Building from an empty list is valid and yields an
    /// index whose queries always return nothing.
    pub fn build(shops: Vec<ShopPoint>, config: &ClusterConfig) -> Self {
        let config = Self::effective_config(config);
        let shop_count = shops.len();

        let nodes: Vec<Node> = shops
            .iter()
            .enumerate()
            .filter(|(_, shop)| shop.lat.is_finite() && shop.lon.is_finite())
            .map(|(i, shop)| Node::leaf(lng_x(shop.lon), lat_y(shop.lat), i))
            .collect();

        let indexed = nodes.len();
        if indexed < shop_count {
            log::warn!(
                "Skipped {} shops with non-finite coordinates while indexing",
                shop_count - indexed
            );
        }

        let mut levels = Vec::with_capacity((config.max_zoom - config.min_zoom) as usize + 2);
        let mut upper = Level::new(nodes);

        for zoom in (config.min_zoom..=config.max_zoom).rev() {
            let lower = Level::new(Self::cluster_level(&mut upper, zoom, shop_count, &config));
            levels.push(upper);
            upper = lower;
        }
        levels.push(upper);
        levels.reverse();

        log::debug!(
            "Built cluster index over {} shops ({} zoom levels, {} top-level features)",
            indexed,
            levels.len(),
            levels.first().map_or(0, |level| level.nodes.len())
        );

        Self {
            shops,
            levels,
            indexed,
            config,
        }
    }

    /// An index with no shops.
    pub fn empty(config: &ClusterConfig) -> Self {
        Self::build(Vec::new(), config)
    }

    fn effective_config(config: &ClusterConfig) -> ClusterConfig {
        if let Err(e) = config.validate() {
            log::warn!("Clamping invalid cluster configuration: {}", e);
        }

        let max_zoom = config.max_zoom.min(MAX_CLUSTER_ZOOM);
        ClusterConfig {
            radius: if config.radius.is_finite() && config.radius > 0.0 {
                config.radius
            } else {
                ClusterConfig::default().radius
            },
            extent: if config.extent.is_finite() && config.extent > 0.0 {
                config.extent
            } else {
                ClusterConfig::default().extent
            },
            min_zoom: config.min_zoom.min(max_zoom),
            max_zoom,
            min_points: config.min_points.max(2),
        }
    }

    /// Derive the nodes of `zoom` from the level above it.
    fn cluster_level(
        upper: &mut Level,
        zoom: u8,
        shop_count: usize,
        config: &ClusterConfig,
    ) -> Vec<Node> {
        let radius = config.radius / (config.extent * 2f64.powi(zoom as i32));
        let Level { nodes, tree } = upper;
        let mut next = Vec::new();

        for slot in 0..nodes.len() {
            if nodes[slot].visited {
                continue;
            }
            nodes[slot].visited = true;

            let (x, y) = (nodes[slot].x, nodes[slot].y);
            let neighbors = slots_within(tree, x, y, radius);

            let origin_count = nodes[slot].num_points;
            let count = origin_count
                + neighbors
                    .iter()
                    .filter(|&&k| !nodes[k].visited)
                    .map(|&k| nodes[k].num_points)
                    .sum::<usize>();

            if count > origin_count && count >= config.min_points {
                let id = (slot << ZOOM_BITS) + (zoom as usize + 1) + shop_count;
                let mut wx = x * origin_count as f64;
                let mut wy = y * origin_count as f64;

                for &k in &neighbors {
                    let neighbor = &mut nodes[k];
                    if neighbor.visited {
                        continue;
                    }
                    neighbor.visited = true;
                    neighbor.parent = Some(id);
                    wx += neighbor.x * neighbor.num_points as f64;
                    wy += neighbor.y * neighbor.num_points as f64;
                }

                nodes[slot].parent = Some(id);
                next.push(Node::cluster(
                    wx / count as f64,
                    wy / count as f64,
                    id,
                    count,
                ));
            } else {
                next.push(nodes[slot].carried());

                if count > 1 {
                    for &k in &neighbors {
                        if nodes[k].visited {
                            continue;
                        }
                        nodes[k].visited = true;
                        next.push(nodes[k].carried());
                    }
                }
            }
        }

        next
    }

    /// Number of shops present in the index.
    pub fn len(&self) -> usize {
        self.indexed
    }

    pub fn is_empty(&self) -> bool {
        self.indexed == 0
    }

    /// The snapshot this index was built from, including unindexed shops.
    pub fn shops(&self) -> &[ShopPoint] {
        &self.shops
    }

    /// The configuration actually used for the build.
    pub fn config(&self) -> &ClusterConfig {
        &self.config
    }

    /// Clamp a map zoom to the levels this index holds.
    pub fn limit_zoom(&self, zoom: f64) -> u8 {
        zoom_level(zoom).clamp(self.config.min_zoom, self.config.max_zoom + 1)
    }

    fn level(&self, zoom: u8) -> Option<&Level> {
        zoom.checked_sub(self.config.min_zoom)
            .and_then(|i| self.levels.get(i as usize))
    }

    fn feature(&self, node: &Node) -> ClusterFeature<'_> {
        if node.is_cluster() {
            ClusterFeature::Cluster {
                id: ClusterId::from_raw(node.id),
                point_count: node.num_points,
                position: Point::new(x_lng(node.x), y_lat(node.y)),
            }
        } else {
            ClusterFeature::Leaf {
                shop: &self.shops[node.id],
            }
        }
    }

    /// Clusters and single shops visible in `bounds` at `zoom`.
    ///
    /// `zoom` is floored and clamped to the indexed range. A window of 360°
    /// or more covers the whole world, `west > east` is answered as a window
    /// crossing the antimeridian, and an inverted south/north pair is swapped.
    /// Non-finite bounds are rejected with a warning and yield no features.
    pub fn clusters(&self, bounds: &Bounds, zoom: f64) -> Vec<ClusterFeature<'_>> {
        if self.is_empty() {
            return Vec::new();
        }

        if !bounds.is_finite() {
            log::warn!("Rejecting cluster query with non-finite bounds {:?}", bounds);
            return Vec::new();
        }

        let (mut south, mut north) = (bounds.south, bounds.north);
        if south > north {
            std::mem::swap(&mut south, &mut north);
        }
        let south = south.clamp(-90.0, 90.0);
        let north = north.clamp(-90.0, 90.0);

        let mut west = wrap_lng(bounds.west);
        let mut east = if bounds.east == 180.0 {
            180.0
        } else {
            wrap_lng(bounds.east)
        };

        if bounds.east - bounds.west >= 360.0 {
            west = -180.0;
            east = 180.0;
        } else if west > east {
            let mut features = self.clusters_in_window(west, south, 180.0, north, zoom);
            features.extend(self.clusters_in_window(-180.0, south, east, north, zoom));
            return features;
        }

        self.clusters_in_window(west, south, east, north, zoom)
    }

    fn clusters_in_window(
        &self,
        west: f64,
        south: f64,
        east: f64,
        north: f64,
        zoom: f64,
    ) -> Vec<ClusterFeature<'_>> {
        let Some(level) = self.level(self.limit_zoom(zoom)) else {
            return Vec::new();
        };

        level
            .range(lng_x(west), lat_y(north), lng_x(east), lat_y(south))
            .into_iter()
            .map(|slot| self.feature(&level.nodes[slot]))
            .collect()
    }

    /// Decode the level and seed node a cluster id was created from.
    fn origin(&self, id: ClusterId) -> Result<(u8, &Level, &Node)> {
        let unknown = || ShopMapError::UnknownCluster(id.get());
        let encoded = id.get().checked_sub(self.shops.len()).ok_or_else(unknown)?;

        let origin_zoom = u8::try_from(encoded & ZOOM_MASK).map_err(|_| unknown())?;
        if origin_zoom <= self.config.min_zoom || origin_zoom > self.config.max_zoom + 1 {
            return Err(unknown());
        }

        let level = self.level(origin_zoom).ok_or_else(unknown)?;
        let node = level.nodes.get(encoded >> ZOOM_BITS).ok_or_else(unknown)?;
        Ok((origin_zoom, level, node))
    }

    /// The clusters and shops a cluster splits into one zoom level deeper.
    pub fn children(&self, id: ClusterId) -> Result<Vec<ClusterFeature<'_>>> {
        let (origin_zoom, level, origin) = self.origin(id)?;
        let radius =
            self.config.radius / (self.config.extent * 2f64.powi(origin_zoom as i32 - 1));

        let children: Vec<_> = level
            .within(origin.x, origin.y, radius)
            .into_iter()
            .map(|slot| &level.nodes[slot])
            .filter(|node| node.parent == Some(id.get()))
            .map(|node| self.feature(node))
            .collect();

        if children.is_empty() {
            return Err(ShopMapError::UnknownCluster(id.get()));
        }
        Ok(children)
    }

    /// Shops aggregated in a cluster, paginated by `limit` and `offset`.
    pub fn leaves(&self, id: ClusterId, limit: usize, offset: usize) -> Result<Vec<&ShopPoint>> {
        let mut leaves = Vec::new();
        if limit > 0 {
            self.append_leaves(&mut leaves, id, limit, offset, 0)?;
        }
        Ok(leaves)
    }

    fn append_leaves<'a>(
        &'a self,
        out: &mut Vec<&'a ShopPoint>,
        id: ClusterId,
        limit: usize,
        offset: usize,
        mut skipped: usize,
    ) -> Result<usize> {
        for child in self.children(id)? {
            match child {
                ClusterFeature::Cluster {
                    id: child_id,
                    point_count,
                    ..
                } => {
                    if skipped + point_count <= offset {
                        skipped += point_count;
                    } else {
                        skipped = self.append_leaves(out, child_id, limit, offset, skipped)?;
                    }
                }
                ClusterFeature::Leaf { shop } => {
                    if skipped < offset {
                        skipped += 1;
                    } else {
                        out.push(shop);
                    }
                }
            }

            if out.len() == limit {
                break;
            }
        }

        Ok(skipped)
    }

    /// Lowest zoom at which the cluster splits into more than one feature.
    ///
    /// Fails with [`ShopMapError::UnknownCluster`] when `id` does not belong
    /// to this index.
    pub fn expansion_zoom(&self, id: ClusterId) -> Result<u8> {
        let (origin_zoom, _, _) = self.origin(id)?;
        let mut expansion = origin_zoom - 1;
        let mut current = id;

        while expansion <= self.config.max_zoom {
            let children = self.children(current)?;
            expansion += 1;

            if children.len() != 1 {
                break;
            }
            match children[0].cluster_id() {
                Some(child) => current = child,
                None => break,
            }
        }

        Ok(expansion)
    }
}
