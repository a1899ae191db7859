//! Spherical distance and the bounding rectangle of a radius query.

use crate::types::{GeoPoint, GeoRect};

/// Fixed spherical Earth radius used for every metric conversion.
pub const EARTH_RADIUS_METERS: f64 = 6_367_000.0;

/// Great-circle distance in meters between two points.
///
/// # Examples
///
/// ```
/// use geokv::GeoPoint;
/// use geokv::compute::spatial::earth_distance;
///
/// let a = GeoPoint::new(40.7769, -73.9823);
/// let b = GeoPoint::new(40.7500, -74.0000);
/// let d = earth_distance(&a, &b);
/// assert!(d > 3_000.0 && d < 4_000.0);
/// ```
pub fn earth_distance(a: &GeoPoint, b: &GeoPoint) -> f64 {
    a.to_latlng().distance(&b.to_latlng()).rad() * EARTH_RADIUS_METERS
}

/// Axis-aligned rectangle enclosing the disk of `radius_meters` around `center`.
///
/// The metric length of one degree on each axis is measured at the center,
/// against a reference point one degree away towards the equator (latitude)
/// or towards the prime meridian (longitude). The rectangle over-approximates
/// the disk; callers post-filter by exact distance.
pub fn bounding_rect_for_radius(center: &GeoPoint, radius_meters: f64) -> GeoRect {
    let lat_step = if center.latitude > 0.0 { -1.0 } else { 1.0 };
    let lng_step = if center.longitude > 0.0 { -1.0 } else { 1.0 };

    let lat_ref = GeoPoint::new(center.latitude + lat_step, center.longitude);
    let lng_ref = GeoPoint::new(center.latitude, center.longitude + lng_step);

    let meters_per_lat_degree = earth_distance(center, &lat_ref);
    let meters_per_lng_degree = earth_distance(center, &lng_ref);

    let half_lat = radius_meters / meters_per_lat_degree;

    let min_lat = (center.latitude - half_lat).max(-90.0);
    let max_lat = (center.latitude + half_lat).min(90.0);

    // A degree of longitude shrinks to nothing at the poles, and a disk that
    // reaches a pole spans every meridian.
    let touches_pole = min_lat <= -90.0 || max_lat >= 90.0;
    let (min_lng, max_lng) = if touches_pole || meters_per_lng_degree < 1e-6 {
        (-180.0, 180.0)
    } else {
        let half_lng = radius_meters / meters_per_lng_degree;
        (
            (center.longitude - half_lng).max(-180.0),
            (center.longitude + half_lng).min(180.0),
        )
    };

    GeoRect::new(
        GeoPoint::new(min_lat, min_lng),
        GeoPoint::new(max_lat, max_lng),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance_to_self_is_zero() {
        let p = GeoPoint::new(51.5074, -0.1278);
        assert!(earth_distance(&p, &p).abs() < 1e-9);
    }

    #[test]
    fn test_one_degree_of_latitude() {
        let a = GeoPoint::new(0.0, 0.0);
        let b = GeoPoint::new(1.0, 0.0);
        let expected = EARTH_RADIUS_METERS * 1.0_f64.to_radians();
        assert!((earth_distance(&a, &b) - expected).abs() < 1e-6);
    }

    #[test]
    fn test_distance_is_symmetric() {
        let a = GeoPoint::new(40.7769, -73.9823);
        let c = GeoPoint::new(41.9000, -87.6500);
        let ac = earth_distance(&a, &c);
        assert!((ac - earth_distance(&c, &a)).abs() < 1e-6);
        assert!(ac > 1_000_000.0 && ac < 1_200_000.0);
    }

    #[test]
    fn test_bounding_rect_contains_the_disk() {
        let center = GeoPoint::new(40.7769, -73.9823);
        let radius = 5_000.0;
        let rect = bounding_rect_for_radius(&center, radius);

        assert!(rect.contains(&center));
        for bearing in 0..36 {
            let theta = (bearing as f64 * 10.0).to_radians();
            // Points slightly inside the circle along each bearing.
            let d_lat = (radius * 0.99 * theta.cos()) / 111_120.0;
            let d_lng = (radius * 0.99 * theta.sin())
                / (111_120.0 * center.latitude.to_radians().cos());
            let p = GeoPoint::new(center.latitude + d_lat, center.longitude + d_lng);
            if earth_distance(&center, &p) <= radius {
                assert!(rect.contains(&p), "{p} escaped the bounding rect");
            }
        }
    }

    #[test]
    fn test_bounding_rect_is_centered_with_half_size_extent() {
        let center = GeoPoint::new(-33.8688, 151.2093);
        let rect = bounding_rect_for_radius(&center, 10_000.0);

        let half_lat = 10_000.0 / (EARTH_RADIUS_METERS * 1.0_f64.to_radians());
        assert!((rect.max().latitude - center.latitude - half_lat).abs() < 1e-9);
        assert!((center.latitude - rect.min().latitude - half_lat).abs() < 1e-9);
        assert!((rect.center().longitude - center.longitude).abs() < 1e-9);
    }

    #[test]
    fn test_zero_radius_is_degenerate() {
        let center = GeoPoint::new(10.0, 10.0);
        let rect = bounding_rect_for_radius(&center, 0.0);
        assert_eq!(rect.min(), center);
        assert_eq!(rect.max(), center);
    }

    #[test]
    fn test_rect_is_clamped_near_the_pole() {
        let center = GeoPoint::new(89.99, 45.0);
        let rect = bounding_rect_for_radius(&center, 50_000.0);
        assert_eq!(rect.max().latitude, 90.0);
        assert_eq!(rect.min().longitude, -180.0);
        assert_eq!(rect.max().longitude, 180.0);
    }

    #[test]
    fn test_rect_is_clamped_at_the_antimeridian() {
        let center = GeoPoint::new(0.0, 179.99);
        let rect = bounding_rect_for_radius(&center, 10_000.0);
        assert_eq!(rect.max().longitude, 180.0);
        assert!(rect.min().longitude < 179.99);
    }
}
