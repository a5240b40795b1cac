use geo::{Point, Rect, coord};
use serde::{Deserialize, Serialize};

/// Highest zoom level a map client can report.
pub const MAX_ZOOM_LEVEL: u8 = 30;

/// Floor a fractional map zoom to an integer level.
///
/// Non-finite and negative zooms map to 0, very large ones saturate at
/// [`MAX_ZOOM_LEVEL`].
///
/// # Examples
///
/// ```
/// use shopmap_types::viewport::zoom_level;
///
/// assert_eq!(zoom_level(12.9), 12);
/// assert_eq!(zoom_level(-1.0), 0);
/// assert_eq!(zoom_level(f64::NAN), 0);
/// ```
pub fn zoom_level(zoom: f64) -> u8 {
    if !zoom.is_finite() || zoom <= 0.0 {
        return 0;
    }
    zoom.floor().min(MAX_ZOOM_LEVEL as f64) as u8
}

/// A geographic bounding box in degrees (west/south/east/north).
///
/// `west > east` is meaningful: it describes a window crossing the
/// antimeridian.
///
/// # Examples
///
/// ```
/// use shopmap_types::viewport::Bounds;
/// use geo::Point;
///
/// let warsaw = Bounds::new(20.85, 52.10, 21.27, 52.37);
/// assert!(warsaw.contains(&Point::new(21.01, 52.23)));
/// assert!(!warsaw.is_degenerate());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub west: f64,
    pub south: f64,
    pub east: f64,
    pub north: f64,
}

impl Bounds {
    pub fn new(west: f64, south: f64, east: f64, north: f64) -> Self {
        Self {
            west,
            south,
            east,
            north,
        }
    }

    /// The whole Web-Mercator world.
    pub fn world() -> Self {
        Self::new(-180.0, -85.0, 180.0, 85.0)
    }

    /// A box extending `half_width` degrees east/west and `half_height`
    /// degrees north/south of `center`.
    pub fn around(center: Point<f64>, half_width: f64, half_height: f64) -> Self {
        Self::new(
            center.x() - half_width,
            center.y() - half_height,
            center.x() + half_width,
            center.y() + half_height,
        )
    }

    pub fn is_finite(&self) -> bool {
        [self.west, self.south, self.east, self.north]
            .iter()
            .all(|v| v.is_finite())
    }

    /// True when the box has zero width or zero height.
    pub fn is_degenerate(&self) -> bool {
        self.west == self.east || self.south == self.north
    }

    /// True when the box wraps across the antimeridian.
    pub fn crosses_antimeridian(&self) -> bool {
        self.west > self.east
    }

    pub fn contains(&self, point: &Point<f64>) -> bool {
        let (x, y) = (point.x(), point.y());
        let in_lat = y >= self.south.min(self.north) && y <= self.south.max(self.north);
        let in_lon = if self.crosses_antimeridian() {
            x >= self.west || x <= self.east
        } else {
            x >= self.west && x <= self.east
        };
        in_lat && in_lon
    }

    pub fn center(&self) -> Point<f64> {
        Point::new(
            (self.west + self.east) / 2.0,
            (self.south + self.north) / 2.0,
        )
    }

    /// `[west, south, east, north]`, the order used by map libraries.
    pub fn as_array(&self) -> [f64; 4] {
        [self.west, self.south, self.east, self.north]
    }

    /// Convert to a normalized `geo::Rect` (min/max corners reordered).
    pub fn to_rect(&self) -> Rect<f64> {
        Rect::new(
            coord! { x: self.west, y: self.south },
            coord! { x: self.east, y: self.north },
        )
    }
}

impl From<Rect<f64>> for Bounds {
    fn from(rect: Rect<f64>) -> Self {
        Self::new(rect.min().x, rect.min().y, rect.max().x, rect.max().y)
    }
}

/// A raw "move/zoom settled" notification from the map widget.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportEvent {
    pub center: Point<f64>,
    pub bounds: Bounds,
    /// Map zoom as reported by the widget, possibly fractional.
    pub zoom: f64,
}

impl ViewportEvent {
    pub fn new(center: Point<f64>, bounds: Bounds, zoom: f64) -> Self {
        Self {
            center,
            bounds,
            zoom,
        }
    }
}

/// The settled map window with an integer zoom level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub center: Point<f64>,
    pub bounds: Bounds,
    pub zoom: u8,
}

impl Viewport {
    pub fn new(center: Point<f64>, bounds: Bounds, zoom: u8) -> Self {
        Self {
            center,
            bounds,
            zoom,
        }
    }

    pub fn from_event(event: &ViewportEvent) -> Self {
        Self::new(event.center, event.bounds, zoom_level(event.zoom))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_across_antimeridian() {
        let pacific = Bounds::new(170.0, -10.0, -170.0, 10.0);
        assert!(pacific.crosses_antimeridian());
        assert!(pacific.contains(&Point::new(175.0, 0.0)));
        assert!(pacific.contains(&Point::new(-175.0, 0.0)));
        assert!(!pacific.contains(&Point::new(0.0, 0.0)));
    }

    #[test]
    fn test_to_rect_normalizes_corners() {
        let rect = Bounds::new(10.0, 5.0, 0.0, -5.0).to_rect();
        assert_eq!(rect.min().x, 0.0);
        assert_eq!(rect.max().y, 5.0);
    }

    #[test]
    fn test_degenerate_and_finite() {
        assert!(Bounds::new(1.0, 1.0, 1.0, 2.0).is_degenerate());
        assert!(!Bounds::new(f64::NAN, 0.0, 1.0, 1.0).is_finite());
    }

    #[test]
    fn test_viewport_from_event_floors_zoom() {
        let event = ViewportEvent::new(Point::new(21.0, 52.2), Bounds::world(), 13.7);
        assert_eq!(Viewport::from_event(&event).zoom, 13);
    }

    #[test]
    fn test_zoom_level_saturates() {
        assert_eq!(zoom_level(1e9), MAX_ZOOM_LEVEL);
        assert_eq!(zoom_level(f64::INFINITY), 0);
    }
}
