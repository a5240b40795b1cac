//! Fetch radius estimation from the map zoom.

/// Search radius in meters used when requesting shops around a center at
/// `zoom`. The deeper the zoom, the smaller the area fetched.
///
/// # Examples
///
/// ```
/// use shopmap::estimate_radius;
///
/// assert_eq!(estimate_radius(17), 5_000);
/// assert_eq!(estimate_radius(11), 100_000);
/// assert_eq!(estimate_radius(3), 10_000_000);
/// ```
pub const fn estimate_radius(zoom: u8) -> u32 {
    match zoom {
        17.. => 5_000,
        16 => 11_000,
        14..=15 => 30_000,
        12..=13 => 80_000,
        10..=11 => 100_000,
        8..=9 => 150_000,
        6..=7 => 300_000,
        _ => 10_000_000,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_radius_table() {
        assert_eq!(estimate_radius(0), 10_000_000);
        assert_eq!(estimate_radius(5), 10_000_000);
        assert_eq!(estimate_radius(6), 300_000);
        assert_eq!(estimate_radius(8), 150_000);
        assert_eq!(estimate_radius(12), 80_000);
        assert_eq!(estimate_radius(14), 30_000);
        assert_eq!(estimate_radius(16), 11_000);
        assert_eq!(estimate_radius(22), 5_000);
    }

    #[test]
    fn test_radius_non_increasing() {
        for zoom in 0..20u8 {
            assert!(
                estimate_radius(zoom + 1) <= estimate_radius(zoom),
                "radius grew between zoom {} and {}",
                zoom,
                zoom + 1
            );
        }
    }
}
