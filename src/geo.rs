//! Great-circle geometry on a spherical Earth.
//!
//! Distances use the haversine formula with a mean radius of 6371 km,
//! accurate to a fraction of a percent. That is far tighter than the
//! city-scale perimeter this tool gates addresses against.

use serde::Serialize;
use std::f64::consts::PI;

const DEG: f64 = PI / 180.0;

/// Mean Earth radius in kilometers.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// A geographic point in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    /// True if latitude is within [-90, 90] and longitude within [-180, 180].
    pub fn in_bounds(&self) -> bool {
        (-90.0..=90.0).contains(&self.latitude) && (-180.0..=180.0).contains(&self.longitude)
    }
}

/// Great-circle distance between two points, in kilometers (haversine).
///
/// Symmetric and non-negative. Identical coordinates yield exactly 0:
/// both sine terms vanish.
pub fn distance_km(a: Coordinate, b: Coordinate) -> f64 {
    let dlat = (b.latitude - a.latitude) * DEG;
    let dlon = (b.longitude - a.longitude) * DEG;

    let h = (dlat / 2.0).sin().powi(2)
        + (a.latitude * DEG).cos() * (b.latitude * DEG).cos() * (dlon / 2.0).sin().powi(2);
    // Rounding can push h a hair outside [0, 1] near antipodal pairs.
    let h = h.clamp(0.0, 1.0);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_KM * c
}
