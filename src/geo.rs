//! Geographic primitives shared by the simulator, reconciler and globe

use crate::highlight::HighlightError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Mean earth radius used for great-circle distances
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// A (longitude, latitude) pair in degrees
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lon: f64,
    pub lat: f64,
}

impl Coordinate {
    pub const fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }

    /// True when both components are finite-range degrees inside the globe
    pub fn is_valid(&self) -> bool {
        !self.lon.is_nan()
            && !self.lat.is_nan()
            && (-180.0..=180.0).contains(&self.lon)
            && (-90.0..=90.0).contains(&self.lat)
    }

    pub fn checked(self) -> Result<Self, HighlightError> {
        if self.is_valid() {
            Ok(self)
        } else {
            Err(HighlightError::InvalidCoordinate(self))
        }
    }

    /// (lat, lon) in radians, the order the globe projection takes
    pub fn lat_lon_radians(self) -> (f32, f32) {
        (self.lat.to_radians() as f32, self.lon.to_radians() as f32)
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ns = if self.lat >= 0.0 { 'N' } else { 'S' };
        let ew = if self.lon >= 0.0 { 'E' } else { 'W' };
        write!(f, "{:.2}°{} {:.2}°{}", self.lat.abs(), ns, self.lon.abs(), ew)
    }
}

/// Wrap a longitude into [-180, 180)
#[inline]
pub fn normalize_longitude(lon: f64) -> f64 {
    (lon + 180.0).rem_euclid(360.0) - 180.0
}

/// Shortest signed delta between two longitudes, in (-180, 180]
#[inline]
pub fn longitude_delta(from: f64, to: f64) -> f64 {
    let mut delta = to - from;
    if delta > 180.0 {
        delta -= 360.0;
    } else if delta <= -180.0 {
        delta += 360.0;
    }
    delta
}

/// Great-circle distance in kilometres
pub fn haversine_km(a: Coordinate, b: Coordinate) -> f64 {
    let dlat = (b.lat - a.lat).to_radians();
    let dlon = (b.lon - a.lon).to_radians();
    let h = (dlat / 2.0).sin().powi(2)
        + a.lat.to_radians().cos() * b.lat.to_radians().cos() * (dlon / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());
    EARTH_RADIUS_KM * c
}

/// Total length of a polyline in kilometres
pub fn path_length_km(path: &[Coordinate]) -> f64 {
    path.windows(2).map(|w| haversine_km(w[0], w[1])).sum()
}
