//! # Geographic Utilities
//!
//! Core geographic computation utilities for connection-log analysis.
//!
//! This module provides the fundamental geographic operations used throughout
//! the residential-area inference pipeline. All functions are pure and hold
//! no state.
//!
//! ## Overview
//!
//! | Function | Description |
//! |----------|-------------|
//! | [`haversine_distance`] | Great-circle distance between two coordinates |
//! | [`to_unit_vector`] | Convert a coordinate to a unit Cartesian vector |
//! | [`from_unit_vector`] | Convert a Cartesian vector back to a coordinate |
//!
//! ## Algorithm Notes
//!
//! ### Haversine Formula
//!
//! The haversine formula calculates the great-circle distance between two
//! points on a sphere. It is the standard method for GPS distance
//! calculation, accurate to within 0.3% for most practical applications.
//!
//! Reference: [Haversine formula (Wikipedia)](https://en.wikipedia.org/wiki/Haversine_formula)
//!
//! ### Coordinate System
//!
//! All functions expect WGS84 coordinates (latitude/longitude in degrees),
//! which is the standard used by GPS receivers and cellular network logs.

use geo::{Distance, Haversine, Point};

// =============================================================================
// Distance Functions
// =============================================================================

/// Calculate the great-circle distance between two coordinates using the
/// Haversine formula.
///
/// Returns the distance in meters along the Earth's surface (assuming a
/// spherical Earth with radius 6,371 km).
///
/// # Example
///
/// ```rust
/// use residence_finder::geo_utils::haversine_distance;
///
/// // London to Paris is approximately 344 km
/// let distance = haversine_distance(51.5074, -0.1278, 48.8566, 2.3522);
/// assert!((distance - 343_560.0).abs() < 5000.0);
/// ```
#[inline]
pub fn haversine_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let p1 = Point::new(lon1, lat1);
    let p2 = Point::new(lon2, lat2);
    Haversine::distance(p1, p2)
}

// =============================================================================
// Spherical Vector Conversion
// =============================================================================

/// Convert a latitude/longitude pair (degrees) to a unit Cartesian vector.
///
/// Used by the spherical center-of-gravity midpoint: averaging unit vectors
/// and converting back handles longitude wraparound correctly, where naive
/// coordinate averaging does not.
#[inline]
pub fn to_unit_vector(lat: f64, lon: f64) -> [f64; 3] {
    let (lat_rad, lon_rad) = (lat.to_radians(), lon.to_radians());
    [
        lat_rad.cos() * lon_rad.cos(),
        lat_rad.cos() * lon_rad.sin(),
        lat_rad.sin(),
    ]
}

/// Convert a Cartesian vector back to a latitude/longitude pair in degrees.
///
/// The vector does not need to be normalized: latitude is recovered via
/// `atan2(z, sqrt(x² + y²))` and longitude via `atan2(y, x)`.
#[inline]
pub fn from_unit_vector(v: [f64; 3]) -> (f64, f64) {
    let [x, y, z] = v;
    let lat = z.atan2((x * x + y * y).sqrt()).to_degrees();
    let lon = y.atan2(x).to_degrees();
    (lat, lon)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f64, b: f64, epsilon: f64) -> bool {
        (a - b).abs() < epsilon
    }

    #[test]
    fn test_haversine_distance_same_point() {
        assert_eq!(haversine_distance(51.5074, -0.1278, 51.5074, -0.1278), 0.0);
    }

    #[test]
    fn test_haversine_distance_known_value() {
        // London to Paris is approximately 344 km
        let dist = haversine_distance(51.5074, -0.1278, 48.8566, 2.3522);
        assert!(approx_eq(dist, 343_560.0, 5000.0));
    }

    #[test]
    fn test_unit_vector_round_trip() {
        let (lat, lon) = from_unit_vector(to_unit_vector(25.0478, 121.5170));
        assert!(approx_eq(lat, 25.0478, 1e-9));
        assert!(approx_eq(lon, 121.5170, 1e-9));
    }

    #[test]
    fn test_unit_vector_poles() {
        let (lat, _) = from_unit_vector(to_unit_vector(90.0, 0.0));
        assert!(approx_eq(lat, 90.0, 1e-9));

        let (lat, _) = from_unit_vector(to_unit_vector(-90.0, 45.0));
        assert!(approx_eq(lat, -90.0, 1e-9));
    }
}
