//! Geographic primitives shared by every stage of the planner.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Mean Earth radius in kilometres.
pub const EARTH_RADIUS_KM: f64 = 6371.0088;

/// Segments shorter than this are ignored when computing bearings.
pub const MIN_BEARING_SEGMENT_KM: f64 = 0.001;

/// A geographic position in decimal degrees, latitude first.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Great-circle distance to another position in kilometres.
    pub fn distance_to(&self, other: &Self) -> f64 {
        haversine_km(self.lat, self.lng, other.lat, other.lng)
    }

    /// Initial bearing towards another position, in degrees `[0, 360)`.
    pub fn bearing_to(&self, other: &Self) -> f64 {
        initial_bearing_deg(self.lat, self.lng, other.lat, other.lng)
    }

    /// Returns `true` when both components are finite and within range.
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }

    /// Validate the coordinate, returning [`Error::InvalidCoordinates`] when it is unusable.
    pub fn validated(self) -> Result<Self> {
        if self.is_valid() {
            Ok(self)
        } else {
            Err(Error::InvalidCoordinates {
                lat: self.lat,
                lng: self.lng,
            })
        }
    }

    /// Position on the unit sphere, used by the spatial index.
    pub fn to_unit_vector(&self) -> [f64; 3] {
        let lat = self.lat.to_radians();
        let lng = self.lng.to_radians();
        [lat.cos() * lng.cos(), lat.cos() * lng.sin(), lat.sin()]
    }
}

impl std::fmt::Display for LatLng {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.5}, {:.5})", self.lat, self.lng)
    }
}

/// Haversine distance in kilometres.
pub fn haversine_km(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let d_phi = (lat2 - lat1).to_radians();
    let d_lambda = (lng2 - lng1).to_radians();

    let a = (d_phi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().min(1.0).asin();
    EARTH_RADIUS_KM * c
}

/// Initial great-circle bearing from the first position to the second, in degrees `[0, 360)`.
pub fn initial_bearing_deg(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let d_lambda = (lng2 - lng1).to_radians();

    let y = d_lambda.sin() * phi2.cos();
    let x = phi1.cos() * phi2.sin() - phi1.sin() * phi2.cos() * d_lambda.cos();
    (y.atan2(x).to_degrees() + 360.0) % 360.0
}

/// Absolute change between two bearings, in degrees `[0, 180]`.
pub fn bearing_change_deg(from: f64, to: f64) -> f64 {
    let diff = (to - from).rem_euclid(360.0);
    if diff > 180.0 {
        360.0 - diff
    } else {
        diff
    }
}

/// Total length of a polyline in kilometres.
pub fn polyline_length_km(points: &[LatLng]) -> f64 {
    points
        .windows(2)
        .map(|pair| pair[0].distance_to(&pair[1]))
        .sum()
}

/// Round a value to a fixed number of decimal places.
pub fn quantize(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}
