//! Viewport tracking with debounced refetching.
//!
//! [`ViewportTracker`] decides when a pan or zoom warrants new shop data. It
//! is a plain state object driven from outside:
//!
//! - [`ViewportTracker::on_settle`] is called for every "move/zoom ended"
//!   event from the map widget and may schedule a fetch.
//! - [`ViewportTracker::poll`] is called by the event loop (at the latest by
//!   [`ViewportTracker::next_deadline`]) and fires the scheduled fetch once
//!   the debounce window has passed quietly.
//! - [`ViewportTracker::complete_fetch`] is called when the fetch resolved,
//!   whatever the outcome.
//!
//! At most one fetch is in flight. A firing that finds a fetch outstanding is
//! dropped rather than queued; the next qualifying move tries again.

use crate::clock::{Clock, SystemClock};
use crate::config::TrackerConfig;
use crate::radius::estimate_radius;
use geo::Point;
use shopmap_types::{Viewport, ViewportEvent, zoom_level};
use std::time::{Duration, Instant};

/// Token identifying one issued fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FetchTicket(u64);

impl FetchTicket {
    pub fn get(self) -> u64 {
        self.0
    }
}

/// Parameters of a shop fetch the caller should now perform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FetchRequest {
    pub center: Point<f64>,
    pub zoom: u8,
    /// Search radius in meters
    pub radius_m: u32,
    pub ticket: FetchTicket,
}

/// Why a settle event did not schedule a fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Zoomed out beyond the level where shop data is requested
    BelowMinZoom,
    /// Center moved less than the threshold and the zoom is unchanged
    NotMoved,
    /// A fetch is outstanding
    FetchInFlight,
    /// Event carried a non-finite center or zoom
    InvalidEvent,
}

/// Result of [`ViewportTracker::on_settle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettleOutcome {
    /// A fetch is scheduled (or rescheduled) for the end of the debounce
    Scheduled,
    Skipped(SkipReason),
    /// The tracker was closed; the event was ignored
    Closed,
}

/// Result of [`ViewportTracker::poll`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FireOutcome {
    /// Nothing scheduled
    Idle,
    /// A fetch is scheduled and fires after the remaining duration
    Waiting(Duration),
    /// The debounce elapsed; perform this fetch
    Fired(FetchRequest),
    /// The debounce elapsed while another fetch was in flight
    Dropped,
    Closed,
}

/// Identifier returned by [`ViewportTracker::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type SettleListener = Box<dyn FnMut(&Viewport) + Send>;

#[derive(Debug, Clone, Copy, PartialEq)]
enum TrackerState {
    Idle,
    Pending {
        deadline: Instant,
        center: Point<f64>,
        zoom: u8,
    },
    Closed,
}

/// Debouncing observer of one map's viewport.
pub struct ViewportTracker<C: Clock = SystemClock> {
    config: TrackerConfig,
    clock: C,
    state: TrackerState,
    in_flight: Option<FetchTicket>,
    next_ticket: u64,
    last_center: Option<Point<f64>>,
    last_zoom: Option<u8>,
    viewport: Option<Viewport>,
    listeners: Vec<(SubscriptionId, SettleListener)>,
    next_subscription: u64,
}

impl ViewportTracker<SystemClock> {
    pub fn new(config: TrackerConfig) -> Self {
        Self::with_clock(config, SystemClock)
    }
}

impl<C: Clock> ViewportTracker<C> {
    pub fn with_clock(config: TrackerConfig, clock: C) -> Self {
        if let Err(e) = config.validate() {
            log::warn!("Tracker configuration is invalid: {}", e);
        }

        Self {
            config,
            clock,
            state: TrackerState::Idle,
            in_flight: None,
            next_ticket: 0,
            last_center: None,
            last_zoom: None,
            viewport: None,
            listeners: Vec::new(),
            next_subscription: 0,
        }
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// Most recent settled viewport, if any event arrived yet.
    pub fn viewport(&self) -> Option<&Viewport> {
        self.viewport.as_ref()
    }

    pub fn is_pending(&self) -> bool {
        matches!(self.state, TrackerState::Pending { .. })
    }

    pub fn is_closed(&self) -> bool {
        self.state == TrackerState::Closed
    }

    pub fn in_flight(&self) -> Option<FetchTicket> {
        self.in_flight
    }

    /// When the scheduled fetch becomes due.
    pub fn next_deadline(&self) -> Option<Instant> {
        match self.state {
            TrackerState::Pending { deadline, .. } => Some(deadline),
            _ => None,
        }
    }

    /// Register a callback invoked with every settled viewport.
    ///
    /// Listeners see every settle event, including those that do not lead
    /// to a fetch, so re-clustering can follow each pan and zoom.
    pub fn subscribe<F>(&mut self, listener: F) -> SubscriptionId
    where
        F: FnMut(&Viewport) + Send + 'static,
    {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        if !self.is_closed() {
            self.listeners.push((id, Box::new(listener)));
        }
        id
    }

    /// Remove a listener. Returns false if it was not registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(sub, _)| *sub != id);
        self.listeners.len() != before
    }

    /// Handle a "move/zoom ended" event from the map.
    pub fn on_settle(&mut self, event: &ViewportEvent) -> SettleOutcome {
        if self.is_closed() {
            return SettleOutcome::Closed;
        }

        let center = event.center;
        if !center.x().is_finite() || !center.y().is_finite() || !event.zoom.is_finite() {
            log::warn!("Ignoring settle event with invalid viewport {:?}", event);
            return SettleOutcome::Skipped(SkipReason::InvalidEvent);
        }

        let viewport = Viewport::from_event(event);
        self.viewport = Some(viewport);
        for (_, listener) in self.listeners.iter_mut() {
            listener(&viewport);
        }

        let zoom = zoom_level(event.zoom);
        if let Err(reason) = self.evaluate(center, zoom) {
            log::trace!("Settle at zoom {} skipped: {:?}", zoom, reason);
            return SettleOutcome::Skipped(reason);
        }

        self.last_center = Some(center);
        self.last_zoom = Some(zoom);
        self.state = TrackerState::Pending {
            deadline: self.clock.now() + self.config.debounce(),
            center,
            zoom,
        };
        SettleOutcome::Scheduled
    }

    fn evaluate(&self, center: Point<f64>, zoom: u8) -> Result<(), SkipReason> {
        if zoom < self.config.min_fetch_zoom {
            return Err(SkipReason::BelowMinZoom);
        }

        let moved = match (self.last_center, self.last_zoom) {
            (Some(last), Some(last_zoom)) => {
                let threshold = self.config.move_threshold_deg;
                (center.y() - last.y()).abs() > threshold
                    || (center.x() - last.x()).abs() > threshold
                    || zoom != last_zoom
            }
            _ => true,
        };
        if !moved {
            return Err(SkipReason::NotMoved);
        }

        if self.in_flight.is_some() {
            return Err(SkipReason::FetchInFlight);
        }

        Ok(())
    }

    /// Fire the scheduled fetch if its debounce window has elapsed.
    pub fn poll(&mut self) -> FireOutcome {
        let (deadline, center, zoom) = match self.state {
            TrackerState::Closed => return FireOutcome::Closed,
            TrackerState::Idle => return FireOutcome::Idle,
            TrackerState::Pending {
                deadline,
                center,
                zoom,
            } => (deadline, center, zoom),
        };

        let now = self.clock.now();
        if now < deadline {
            return FireOutcome::Waiting(deadline - now);
        }

        self.state = TrackerState::Idle;
        match self.issue(center, zoom) {
            Some(request) => FireOutcome::Fired(request),
            None => {
                log::debug!(
                    "Dropping debounced fetch at zoom {}: another fetch is in flight",
                    zoom
                );
                FireOutcome::Dropped
            }
        }
    }

    /// Issue a fetch immediately, bypassing the debounce.
    ///
    /// Used for explicit refreshes such as a city search or a product filter
    /// change. Returns `None` while another fetch is in flight or after
    /// [`close`](Self::close).
    pub fn fetch_now(&mut self, center: Point<f64>, zoom: u8) -> Option<FetchRequest> {
        if self.is_closed() {
            return None;
        }
        let request = self.issue(center, zoom)?;
        self.last_center = Some(center);
        self.last_zoom = Some(zoom);
        Some(request)
    }

    fn issue(&mut self, center: Point<f64>, zoom: u8) -> Option<FetchRequest> {
        if self.in_flight.is_some() {
            return None;
        }

        let ticket = FetchTicket(self.next_ticket);
        self.next_ticket += 1;
        self.in_flight = Some(ticket);

        Some(FetchRequest {
            center,
            zoom,
            radius_m: estimate_radius(zoom),
            ticket,
        })
    }

    /// Mark the fetch for `ticket` as resolved, successfully or not.
    ///
    /// Returns false when `ticket` is not the outstanding fetch; the in-flight
    /// flag is then left as it is.
    pub fn complete_fetch(&mut self, ticket: FetchTicket) -> bool {
        if self.in_flight == Some(ticket) {
            self.in_flight = None;
            true
        } else {
            log::warn!(
                "Ignoring completion of stale fetch {} (in flight: {:?})",
                ticket.get(),
                self.in_flight.map(FetchTicket::get)
            );
            false
        }
    }

    /// Tear the tracker down. The pending fetch is discarded, listeners are
    /// dropped and no later call fires again.
    pub fn close(&mut self) {
        if self.is_pending() {
            log::debug!("Discarding pending fetch on close");
        }
        self.state = TrackerState::Closed;
        self.listeners.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use shopmap_types::Bounds;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn event(lon: f64, lat: f64, zoom: f64) -> ViewportEvent {
        let center = Point::new(lon, lat);
        ViewportEvent::new(center, Bounds::around(center, 0.1, 0.05), zoom)
    }

    fn tracker() -> (ViewportTracker<ManualClock>, ManualClock) {
        let clock = ManualClock::new();
        (
            ViewportTracker::with_clock(TrackerConfig::default(), clock.clone()),
            clock,
        )
    }

    #[test]
    fn test_fires_after_debounce() {
        let (mut tracker, clock) = tracker();

        assert_eq!(tracker.on_settle(&event(21.0, 52.2, 12.0)), SettleOutcome::Scheduled);
        assert_eq!(
            tracker.poll(),
            FireOutcome::Waiting(Duration::from_millis(500))
        );

        clock.advance(Duration::from_millis(499));
        assert!(matches!(tracker.poll(), FireOutcome::Waiting(_)));

        clock.advance(Duration::from_millis(1));
        match tracker.poll() {
            FireOutcome::Fired(request) => {
                assert_eq!(request.zoom, 12);
                assert_eq!(request.radius_m, 80_000);
                assert_eq!(tracker.in_flight(), Some(request.ticket));
            }
            other => panic!("expected a fetch, got {:?}", other),
        }
        assert_eq!(tracker.poll(), FireOutcome::Idle);
    }

    #[test]
    fn test_burst_collapses_to_last_event() {
        let (mut tracker, clock) = tracker();

        for i in 0..5 {
            tracker.on_settle(&event(21.0 + i as f64 * 0.01, 52.2, 12.0));
            clock.advance(Duration::from_millis(200));
            assert!(matches!(tracker.poll(), FireOutcome::Waiting(_)));
        }

        clock.advance(Duration::from_millis(300));
        let FireOutcome::Fired(request) = tracker.poll() else {
            panic!("expected exactly one firing");
        };
        assert!((request.center.x() - 21.04).abs() < 1e-9);
        assert_eq!(tracker.poll(), FireOutcome::Idle);
    }

    #[test]
    fn test_small_moves_are_ignored() {
        let (mut tracker, clock) = tracker();
        tracker.on_settle(&event(21.0, 52.2, 12.0));
        clock.advance(Duration::from_millis(500));
        let FireOutcome::Fired(request) = tracker.poll() else {
            panic!("expected a fetch");
        };
        tracker.complete_fetch(request.ticket);

        assert_eq!(
            tracker.on_settle(&event(21.0005, 52.2005, 12.4)),
            SettleOutcome::Skipped(SkipReason::NotMoved)
        );
        assert_eq!(
            tracker.on_settle(&event(21.0005, 52.2005, 13.0)),
            SettleOutcome::Scheduled
        );
    }

    #[test]
    fn test_low_zoom_never_fetches() {
        let (mut tracker, _clock) = tracker();
        assert_eq!(
            tracker.on_settle(&event(19.0, 52.0, 6.9)),
            SettleOutcome::Skipped(SkipReason::BelowMinZoom)
        );
        assert_eq!(tracker.poll(), FireOutcome::Idle);
    }

    #[test]
    fn test_in_flight_blocks_scheduling() {
        let (mut tracker, clock) = tracker();
        tracker.on_settle(&event(21.0, 52.2, 12.0));
        clock.advance(Duration::from_millis(500));
        let FireOutcome::Fired(request) = tracker.poll() else {
            panic!("expected a fetch");
        };

        assert_eq!(
            tracker.on_settle(&event(19.9, 50.0, 12.0)),
            SettleOutcome::Skipped(SkipReason::FetchInFlight)
        );

        assert!(tracker.complete_fetch(request.ticket));
        assert_eq!(tracker.on_settle(&event(19.9, 50.0, 12.0)), SettleOutcome::Scheduled);
    }

    #[test]
    fn test_firing_dropped_while_in_flight() {
        let (mut tracker, clock) = tracker();
        tracker.on_settle(&event(21.0, 52.2, 12.0));

        let explicit = tracker
            .fetch_now(Point::new(16.9, 52.4), 13)
            .expect("no fetch in flight yet");

        clock.advance(Duration::from_millis(500));
        assert_eq!(tracker.poll(), FireOutcome::Dropped);
        assert_eq!(tracker.poll(), FireOutcome::Idle);

        tracker.complete_fetch(explicit.ticket);
        assert_eq!(tracker.on_settle(&event(21.5, 52.2, 12.0)), SettleOutcome::Scheduled);
    }

    #[test]
    fn test_stale_ticket_ignored() {
        let (mut tracker, _clock) = tracker();
        let first = tracker.fetch_now(Point::new(21.0, 52.2), 12).unwrap();
        assert!(tracker.complete_fetch(first.ticket));

        let second = tracker.fetch_now(Point::new(21.1, 52.2), 12).unwrap();
        assert!(!tracker.complete_fetch(first.ticket));
        assert_eq!(tracker.in_flight(), Some(second.ticket));
    }

    #[test]
    fn test_close_cancels_pending() {
        let (mut tracker, clock) = tracker();
        tracker.on_settle(&event(21.0, 52.2, 12.0));
        tracker.close();

        clock.advance(Duration::from_secs(5));
        assert_eq!(tracker.poll(), FireOutcome::Closed);
        assert_eq!(tracker.on_settle(&event(22.0, 52.2, 12.0)), SettleOutcome::Closed);
        assert!(tracker.fetch_now(Point::new(22.0, 52.2), 12).is_none());
        assert!(tracker.next_deadline().is_none());
    }

    #[test]
    fn test_listeners_see_every_settle() {
        let (mut tracker, _clock) = tracker();
        let seen = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&seen);
        let id = tracker.subscribe(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        tracker.on_settle(&event(21.0, 52.2, 4.0));
        tracker.on_settle(&event(21.0, 52.2, 12.0));
        tracker.on_settle(&event(21.0, 52.2, 12.0));
        assert_eq!(seen.load(Ordering::SeqCst), 3);
        assert_eq!(tracker.viewport().map(|v| v.zoom), Some(12));

        assert!(tracker.unsubscribe(id));
        assert!(!tracker.unsubscribe(id));
        tracker.on_settle(&event(22.0, 52.2, 12.0));
        assert_eq!(seen.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_invalid_event_rejected() {
        let (mut tracker, _clock) = tracker();
        assert_eq!(
            tracker.on_settle(&event(f64::NAN, 52.2, 12.0)),
            SettleOutcome::Skipped(SkipReason::InvalidEvent)
        );
        assert!(tracker.viewport().is_none());
    }
}
