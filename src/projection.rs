//! Spherical Web-Mercator projection onto the unit square.
//!
//! Clustering runs in projected space so that a pixel radius maps to the same
//! distance at every latitude. `x` grows eastwards and `y` grows southwards,
//! both in `[0, 1]`.

use std::f64::consts::PI;

/// Project a longitude in degrees to `x` in `[0, 1]`.
#[inline]
pub fn lng_x(lng: f64) -> f64 {
    lng / 360.0 + 0.5
}

/// Project a latitude in degrees to `y` in `[0, 1]`.
///
/// Latitudes beyond the Mercator limit (~85.05°) are clamped to the edge.
#[inline]
pub fn lat_y(lat: f64) -> f64 {
    let sin = lat.to_radians().sin();
    let y = 0.5 - 0.25 * ((1.0 + sin) / (1.0 - sin)).ln() / PI;
    y.clamp(0.0, 1.0)
}

/// Inverse of [`lng_x`].
#[inline]
pub fn x_lng(x: f64) -> f64 {
    (x - 0.5) * 360.0
}

/// Inverse of [`lat_y`].
#[inline]
pub fn y_lat(y: f64) -> f64 {
    let y2 = (180.0 - y * 360.0).to_radians();
    (y2.exp().atan() * 2.0 - PI / 2.0).to_degrees()
}

/// Normalize a longitude into `[-180, 180)`.
#[inline]
pub fn wrap_lng(lng: f64) -> f64 {
    ((lng + 180.0) % 360.0 + 360.0) % 360.0 - 180.0
}
