//! Validation for geographic coordinates and query arguments.

use crate::error::{GeoKvError, Result};
use crate::types::GeoPoint;

/// Validates a point has a finite latitude in [-90, 90] and longitude in [-180, 180].
///
/// # Examples
///
/// ```
/// use geokv::GeoPoint;
/// use geokv::compute::validation::validate_geo_point;
///
/// let nyc = GeoPoint::new(40.7128, -74.0060);
/// assert!(validate_geo_point(&nyc).is_ok());
///
/// // Invalid longitude
/// assert!(validate_geo_point(&GeoPoint::new(40.0, 200.0)).is_err());
///
/// // Invalid latitude
/// assert!(validate_geo_point(&GeoPoint::new(95.0, -74.0)).is_err());
/// ```
pub fn validate_geo_point(point: &GeoPoint) -> Result<()> {
    let (lat, lng) = (point.latitude, point.longitude);

    if !lat.is_finite() {
        return Err(GeoKvError::InvalidInput(format!(
            "Latitude must be finite, got: {}",
            lat
        )));
    }

    if !lng.is_finite() {
        return Err(GeoKvError::InvalidInput(format!(
            "Longitude must be finite, got: {}",
            lng
        )));
    }

    if !(-90.0..=90.0).contains(&lat) {
        return Err(GeoKvError::InvalidInput(format!(
            "Latitude out of range [-90.0, 90.0]: {}",
            lat
        )));
    }

    if !(-180.0..=180.0).contains(&lng) {
        return Err(GeoKvError::InvalidInput(format!(
            "Longitude out of range [-180.0, 180.0]: {}",
            lng
        )));
    }

    Ok(())
}

/// Validates a query radius is finite and non-negative.
pub fn validate_radius(radius_meters: f64) -> Result<()> {
    if !radius_meters.is_finite() || radius_meters < 0.0 {
        return Err(GeoKvError::InvalidInput(format!(
            "Radius must be a finite non-negative number of meters, got: {}",
            radius_meters
        )));
    }
    Ok(())
}

/// Validates multiple points, reporting the index of the first invalid one.
pub fn validate_points<'a>(points: impl IntoIterator<Item = &'a GeoPoint>) -> Result<()> {
    for (idx, point) in points.into_iter().enumerate() {
        validate_geo_point(point).map_err(|e| {
            GeoKvError::InvalidInput(format!("Point at index {}: {}", idx, e))
        })?;
    }
    Ok(())
}
