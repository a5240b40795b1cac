//! One interactive map: tracker, snapshot, index and renderer wired together.
//!
//! [`MapSession`] runs the whole data flow of the map:
//!
//! ```text
//! settle event -> tracker (debounce) -> shop fetch -> index rebuild
//!              -> cluster query -> markers -> renderer
//! ```
//!
//! Fetching is split in two calls, [`MapSession::poll_fetch`] and
//! [`MapSession::complete_fetch`], so that an async driver can await the
//! network in between without the session holding any future. For blocking
//! sources [`MapSession::tick`] does both in one go.

use crate::clock::{Clock, SystemClock};
use crate::config::{Config, QueryConfig};
use crate::error::{Result, ShopMapError};
use crate::feature::{ClusterFeature, ClusterId};
use crate::filter::{FilterFacets, ShopFilter};
use crate::index::ShopIndex;
use crate::markers::{MarkerAction, MarkerRenderer, build_markers};
use crate::query::{query_clusters, resolve_expansion_zoom};
use crate::source::{FetchError, ShopQuery, ShopSource};
use crate::tracker::{
    FetchRequest, FetchTicket, FireOutcome, SettleOutcome, SubscriptionId, ViewportTracker,
};
use geo::Point;
use shopmap_types::{ShopPoint, Viewport, ViewportEvent};

/// Where the map should move after a cluster click.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewTarget {
    pub center: Point<f64>,
    pub zoom: u8,
}

/// A fetch the driver should perform before calling
/// [`MapSession::complete_fetch`].
#[derive(Debug, Clone, PartialEq)]
pub struct PendingFetch {
    pub ticket: FetchTicket,
    pub query: ShopQuery,
}

/// What happened to a completed fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The snapshot was replaced with this many shops
    Applied(usize),
    /// The result belonged to an outdated fetch or arrived after close
    Discarded,
}

pub struct MapSession<R: MarkerRenderer, C: Clock = SystemClock> {
    config: Config,
    tracker: ViewportTracker<C>,
    renderer: R,
    snapshot: Vec<ShopPoint>,
    filter: ShopFilter,
    index: ShopIndex,
    user_location: Option<Point<f64>>,
}

impl<R: MarkerRenderer> MapSession<R, SystemClock> {
    pub fn new(config: Config, renderer: R) -> Self {
        Self::with_clock(config, renderer, SystemClock)
    }
}

impl<R: MarkerRenderer, C: Clock> MapSession<R, C> {
    pub fn with_clock(config: Config, renderer: R, clock: C) -> Self {
        if let Err(e) = config.validate() {
            log::warn!("Map session configuration is invalid: {}", e);
        }

        let tracker = ViewportTracker::with_clock(config.tracker.clone(), clock);
        let index = ShopIndex::empty(&config.cluster);

        Self {
            config,
            tracker,
            renderer,
            snapshot: Vec::new(),
            filter: ShopFilter::default(),
            index,
            user_location: None,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn tracker(&self) -> &ViewportTracker<C> {
        &self.tracker
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn index(&self) -> &ShopIndex {
        &self.index
    }

    /// The current snapshot, before filtering.
    pub fn shops(&self) -> &[ShopPoint] {
        &self.snapshot
    }

    pub fn filter(&self) -> &ShopFilter {
        &self.filter
    }

    pub fn viewport(&self) -> Option<&Viewport> {
        self.tracker.viewport()
    }

    /// Chains and products selectable for the current snapshot.
    pub fn facets(&self) -> FilterFacets {
        FilterFacets::collect(&self.snapshot)
    }

    /// Register a callback for every settled viewport.
    pub fn subscribe<F>(&mut self, listener: F) -> SubscriptionId
    where
        F: FnMut(&Viewport) + Send + 'static,
    {
        self.tracker.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.tracker.unsubscribe(id)
    }

    /// Handle a "move/zoom ended" event: re-cluster for the new window and
    /// possibly schedule a fetch.
    pub fn viewport_settled(&mut self, event: &ViewportEvent) -> SettleOutcome {
        let outcome = self.tracker.on_settle(event);
        if outcome != SettleOutcome::Closed {
            self.render();
        }
        outcome
    }

    /// Features visible in the current viewport.
    pub fn visible_features(&self) -> Vec<ClusterFeature<'_>> {
        visible(&self.index, self.tracker.viewport(), &self.config.query)
    }

    fn render(&mut self) {
        let features = visible(&self.index, self.tracker.viewport(), &self.config.query);
        let markers = build_markers(&features);
        self.renderer.render(&markers);
    }

    fn pending(&self, request: &FetchRequest) -> PendingFetch {
        PendingFetch {
            ticket: request.ticket,
            query: ShopQuery::from_request(request)
                .with_user_location(self.user_location)
                .with_products(self.filter.product_query()),
        }
    }

    /// Fetch due now after the debounce, if any.
    pub fn poll_fetch(&mut self) -> Option<PendingFetch> {
        match self.tracker.poll() {
            FireOutcome::Fired(request) => Some(self.pending(&request)),
            _ => None,
        }
    }

    /// Fetch for an explicit jump, e.g. to a searched city, bypassing the
    /// debounce. `None` while another fetch is outstanding.
    pub fn refresh_now(&mut self, center: Point<f64>, zoom: u8) -> Option<PendingFetch> {
        let request = self.tracker.fetch_now(center, zoom)?;
        Some(self.pending(&request))
    }

    /// Apply the result of the fetch identified by `ticket`.
    ///
    /// The in-flight flag is cleared whatever the result. A failed fetch
    /// keeps the previous snapshot on the map and is returned as
    /// [`ShopMapError::Fetch`] so the UI can show a notice.
    pub fn complete_fetch(
        &mut self,
        ticket: FetchTicket,
        result: std::result::Result<Vec<ShopPoint>, FetchError>,
    ) -> Result<FetchOutcome> {
        if !self.tracker.complete_fetch(ticket) || self.tracker.is_closed() {
            return Ok(FetchOutcome::Discarded);
        }

        match result {
            Ok(shops) => {
                let count = shops.len();
                self.replace_shops(shops);
                Ok(FetchOutcome::Applied(count))
            }
            Err(e) => {
                log::warn!("Shop fetch failed, keeping {} shops: {}", self.snapshot.len(), e);
                Err(ShopMapError::Fetch(e))
            }
        }
    }

    /// Poll and, if a fetch is due, perform it with `source` and apply it.
    pub fn tick<S>(&mut self, source: &mut S) -> Result<Option<FetchOutcome>>
    where
        S: ShopSource + ?Sized,
    {
        let Some(fetch) = self.poll_fetch() else {
            return Ok(None);
        };
        let result = source.fetch_shops(&fetch.query);
        self.complete_fetch(fetch.ticket, result).map(Some)
    }

    /// Replace the snapshot wholesale and rebuild the index.
    pub fn replace_shops(&mut self, shops: Vec<ShopPoint>) {
        self.snapshot = shops;
        self.rebuild();
    }

    /// Change the active filter and rebuild the index from the snapshot.
    pub fn set_filter(&mut self, filter: ShopFilter) {
        if filter == self.filter {
            return;
        }
        self.filter = filter;
        self.rebuild();
    }

    /// Location sent with every fetch so distances to the user get filled.
    pub fn set_user_location(&mut self, location: Option<Point<f64>>) {
        self.user_location = location;
    }

    fn rebuild(&mut self) {
        let visible = if self.filter.is_empty() {
            self.snapshot.clone()
        } else {
            self.filter.apply(&self.snapshot)
        };
        log::debug!(
            "Rebuilding cluster index with {} of {} shops",
            visible.len(),
            self.snapshot.len()
        );
        self.index = ShopIndex::build(visible, &self.config.cluster);

        if !self.tracker.is_closed() {
            self.render();
        }
    }

    /// Target view for a click on a cluster at `position`.
    ///
    /// Never fails: an unknown or missing id falls back to a fixed zoom step.
    pub fn expand_cluster(&self, id: Option<ClusterId>, position: Point<f64>) -> ViewTarget {
        let current = self.tracker.viewport().map_or(0, |v| v.zoom);
        ViewTarget {
            center: position,
            zoom: resolve_expansion_zoom(&self.index, id, current, &self.config.query),
        }
    }

    /// Resolve a marker click. Only cluster clicks move the map.
    pub fn marker_clicked(&self, action: &MarkerAction<'_>) -> Option<ViewTarget> {
        match action {
            MarkerAction::ExpandCluster { id, position } => {
                Some(self.expand_cluster(Some(*id), *position))
            }
            MarkerAction::SelectShop(_) => None,
        }
    }

    /// Tear the map down: no pending fetch fires afterwards and the markers
    /// are removed.
    pub fn close(&mut self) {
        self.tracker.close();
        self.renderer.clear();
    }
}

fn visible<'a>(
    index: &'a ShopIndex,
    viewport: Option<&Viewport>,
    config: &QueryConfig,
) -> Vec<ClusterFeature<'a>> {
    match viewport {
        Some(viewport) => query_clusters(index, &viewport.bounds, viewport.zoom as f64, config),
        None => Vec::new(),
    }
}
