//! Map clustering and viewport core for a retail store locator.
//!
//! Shops are clustered per zoom level, the visible window is queried for
//! clusters and single shops, and map movement is debounced into shop data
//! refetches.
//!
//! ```rust
//! use shopmap::prelude::*;
//!
//! let shops: Vec<ShopPoint> = (0..12)
//!     .map(|i| ShopPoint::new(format!("Żabka {i}"), "zabka", "", 52.2297 + i as f64 * 0.001, 21.0122))
//!     .collect();
//!
//! let config = Config::default();
//! let index = ShopIndex::build(shops, &config.cluster);
//! let warsaw = Bounds::new(20.8, 52.0, 21.3, 52.4);
//!
//! let features = query_clusters(&index, &warsaw, 10.0, &config.query);
//! assert_eq!(features.len(), 1);
//!
//! let id = features[0].cluster_id();
//! let zoom = resolve_expansion_zoom(&index, id, 10, &config.query);
//! assert!(zoom > 10);
//! assert!(estimate_radius(zoom) <= estimate_radius(10));
//! ```

pub mod clock;
pub mod config;
pub mod error;
pub mod feature;
pub mod filter;
pub mod index;
pub mod markers;
pub mod projection;
pub mod query;
pub mod radius;
pub mod session;
pub mod source;
pub mod tracker;

#[cfg(feature = "http")]
pub mod api;

pub use config::{ClusterConfig, Config, QueryConfig, TrackerConfig};
pub use error::{Result, ShopMapError};

pub use geo::Point;

pub use feature::{ClusterFeature, ClusterId, abbreviate_count};
#[cfg(feature = "geojson")]
pub use feature::to_feature_collection;

pub use index::ShopIndex;
pub use query::{query_clusters, resolve_expansion_zoom};
pub use radius::estimate_radius;

pub use clock::{Clock, ManualClock, SystemClock};
pub use tracker::{
    FetchRequest, FetchTicket, FireOutcome, SettleOutcome, SkipReason, SubscriptionId,
    ViewportTracker,
};

pub use filter::{ChainFacet, FilterFacets, ShopFilter};
pub use markers::{Marker, MarkerAction, MarkerKind, MarkerRenderer, NullRenderer, build_markers};
pub use session::{FetchOutcome, MapSession, PendingFetch, ViewTarget};
pub use source::{FetchError, InMemorySource, ShopQuery, ShopSource};

#[cfg(feature = "http")]
pub use api::{ApiClient, ReportReceipt};

pub use shopmap_types::{
    Bounds, PlaceMatch, PlatformStats, Product, ProductMatch, ReportKind, ReportRequest,
    ShopPoint, Viewport, ViewportEvent,
};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Common imports
pub mod prelude {

    pub use crate::{Result, ShopMapError};

    pub use geo::Point;

    pub use crate::{ClusterConfig, Config, QueryConfig, TrackerConfig};

    pub use crate::{ClusterFeature, ClusterId, ShopIndex, query_clusters, resolve_expansion_zoom};

    pub use crate::{FireOutcome, SettleOutcome, ViewportTracker, estimate_radius};

    pub use crate::{MapSession, MarkerRenderer, ShopFilter, ShopSource};

    pub use shopmap_types::{Bounds, ShopPoint, ViewportEvent};

    #[cfg(feature = "http")]
    pub use crate::ApiClient;

    pub use std::time::Duration;
}
