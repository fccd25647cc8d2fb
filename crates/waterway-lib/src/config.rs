//! Routing configuration.
//!
//! Every tunable of the planner lives in [`RoutingConfig`]. Values are read
//! from a JSON file when one is supplied (missing fields fall back to the
//! defaults below), then a small set of environment overrides is applied:
//!
//! - `WATERWAY_SNAP_RADIUS_KM`: maximum snap distance from a stop to the grid
//! - `WATERWAY_SPLINE_TENSION`: smoothing spline tension in `[0, 1]`
//! - `WATERWAY_LAT_STEP` / `WATERWAY_LNG_STEP`: lattice spacing in degrees
//! - `WATERWAY_CACHE_DIR`: directory used for persisted grid snapshots

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::coords::LatLng;
use crate::error::{Error, Result};

/// Default filename for the persisted grid snapshot.
pub const GRID_CACHE_FILENAME: &str = "grid.bin";

/// Geographic bounding box in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub south: f64,
    pub north: f64,
    pub west: f64,
    pub east: f64,
}

impl Bounds {
    /// Smallest box containing every supplied point.
    pub fn enclosing<'a>(points: impl IntoIterator<Item = &'a LatLng>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let mut bounds = Bounds {
            south: first.lat,
            north: first.lat,
            west: first.lng,
            east: first.lng,
        };
        for point in iter {
            bounds.include(point);
        }
        Some(bounds)
    }

    pub fn include(&mut self, point: &LatLng) {
        self.south = self.south.min(point.lat);
        self.north = self.north.max(point.lat);
        self.west = self.west.min(point.lng);
        self.east = self.east.max(point.lng);
    }

    pub fn union(&self, other: &Self) -> Self {
        Self {
            south: self.south.min(other.south),
            north: self.north.max(other.north),
            west: self.west.min(other.west),
            east: self.east.max(other.east),
        }
    }

    pub fn contains(&self, lat: f64, lng: f64) -> bool {
        lat >= self.south && lat <= self.north && lng >= self.west && lng <= self.east
    }

    fn validate(&self) -> Result<()> {
        let all_finite = [self.south, self.north, self.west, self.east]
            .iter()
            .all(|v| v.is_finite());
        if !all_finite || self.south > self.north || self.west > self.east {
            return Err(Error::InvalidConfig {
                message: format!("grid bounds are inverted or non-finite: {:?}", self),
            });
        }
        Ok(())
    }
}

/// Lattice settings used by the grid builder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// Region to rasterize. When unset, the union of all water body outlines is used.
    pub bounds: Option<Bounds>,
    /// Latitude spacing in degrees (0.0018° ≈ 200 m).
    pub lat_step: f64,
    /// Longitude spacing in degrees (0.0024° ≈ 200 m at 44°N).
    pub lng_step: f64,
    /// Decimal places grid coordinates are rounded to.
    pub precision: u32,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            bounds: None,
            lat_step: 0.0018,
            lng_step: 0.0024,
            precision: 6,
        }
    }
}

/// Additive search cost, in kilometres, for each bearing-change bucket.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TurnPenalties {
    /// Turns below 30°.
    pub gentle: f64,
    /// Turns between 30° and 60°.
    pub moderate: f64,
    /// Turns between 60° and 90°.
    pub large: f64,
    /// Turns above 90°.
    pub severe: f64,
}

impl Default for TurnPenalties {
    fn default() -> Self {
        Self {
            gentle: 0.01,
            moderate: 0.05,
            large: 0.2,
            severe: 0.5,
        }
    }
}

/// Pathfinder settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Requests farther than this from any grid point are not connected.
    pub max_snap_radius_km: f64,
    pub turn_penalties: TurnPenalties,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_snap_radius_km: 5.0,
            turn_penalties: TurnPenalties::default(),
        }
    }
}

/// Smoothing pipeline settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmoothingConfig {
    /// Douglas-Peucker tolerance in degrees.
    pub simplify_tolerance_deg: f64,
    /// Spline tension in `[0, 1]`; 1 follows the simplified path exactly.
    pub tension: f64,
    /// Target spacing between interpolated samples.
    pub sample_spacing_km: f64,
    pub min_samples_per_segment: usize,
    pub max_samples_per_segment: usize,
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self {
            simplify_tolerance_deg: 0.0005,
            tension: 0.5,
            sample_spacing_km: 0.05,
            min_samples_per_segment: 4,
            max_samples_per_segment: 400,
        }
    }
}

/// Turn analysis thresholds applied to finished routes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TurnConfig {
    /// Turns at or above this angle are listed in route results.
    pub report_min_deg: f64,
    /// Turns above this angle count as sharp and raise a warning.
    pub sharp_turn_deg: f64,
}

impl Default for TurnConfig {
    fn default() -> Self {
        Self {
            report_min_deg: 30.0,
            sharp_turn_deg: 90.0,
        }
    }
}

/// Complete planner configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutingConfig {
    pub grid: GridConfig,
    pub search: SearchConfig,
    pub smoothing: SmoothingConfig,
    pub turns: TurnConfig,
}

impl RoutingConfig {
    /// Load configuration from a JSON file; absent fields keep their defaults.
    pub fn from_path(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)?;
        let config: RoutingConfig = serde_json::from_str(&raw)?;
        debug!(path = %path.display(), "loaded routing configuration");
        config.validate()?;
        Ok(config)
    }

    /// Apply `WATERWAY_*` environment overrides. Unparseable values are ignored with a warning.
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(value) = env_f64("WATERWAY_SNAP_RADIUS_KM") {
            self.search.max_snap_radius_km = value;
        }
        if let Some(value) = env_f64("WATERWAY_SPLINE_TENSION") {
            self.smoothing.tension = value;
        }
        if let Some(value) = env_f64("WATERWAY_LAT_STEP") {
            self.grid.lat_step = value;
        }
        if let Some(value) = env_f64("WATERWAY_LNG_STEP") {
            self.grid.lng_step = value;
        }
        self
    }

    /// Check value ranges that would otherwise produce nonsensical grids or curves.
    pub fn validate(&self) -> Result<()> {
        if let Some(bounds) = &self.grid.bounds {
            bounds.validate()?;
        }
        if !positive(self.grid.lat_step) || !positive(self.grid.lng_step) {
            return Err(Error::InvalidConfig {
                message: "grid steps must be positive".to_string(),
            });
        }
        if self.grid.precision > 12 {
            return Err(Error::InvalidConfig {
                message: format!("grid precision {} exceeds 12 decimals", self.grid.precision),
            });
        }
        if !positive(self.search.max_snap_radius_km) {
            return Err(Error::InvalidConfig {
                message: "max_snap_radius_km must be positive".to_string(),
            });
        }
        if !(0.0..=1.0).contains(&self.smoothing.tension) {
            return Err(Error::InvalidConfig {
                message: format!("spline tension {} outside [0, 1]", self.smoothing.tension),
            });
        }
        if !positive(self.smoothing.sample_spacing_km)
            || self.smoothing.min_samples_per_segment == 0
            || self.smoothing.max_samples_per_segment < self.smoothing.min_samples_per_segment
        {
            return Err(Error::InvalidConfig {
                message: "smoothing sample settings are inconsistent".to_string(),
            });
        }
        Ok(())
    }
}

fn positive(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

fn env_f64(key: &str) -> Option<f64> {
    let raw = env::var(key).ok()?;
    match raw.trim().parse::<f64>() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(key, value = %raw, "ignoring unparseable environment override");
            None
        }
    }
}

/// Resolve the default directory for persisted grid snapshots.
///
/// `WATERWAY_CACHE_DIR` wins when set; otherwise the platform cache directory is used.
pub fn default_cache_dir() -> Option<PathBuf> {
    if let Ok(dir) = env::var("WATERWAY_CACHE_DIR") {
        if !dir.trim().is_empty() {
            return Some(PathBuf::from(dir));
        }
    }
    ProjectDirs::from("org", "waterway", "waterway").map(|dirs| dirs.cache_dir().to_path_buf())
}

/// Default location of the grid snapshot file.
pub fn default_grid_cache_path() -> Option<PathBuf> {
    default_cache_dir().map(|dir| dir.join(GRID_CACHE_FILENAME))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        RoutingConfig::default().validate().expect("defaults validate");
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config: RoutingConfig =
            serde_json::from_str(r#"{ "smoothing": { "tension": 0.8 } }"#).expect("parses");
        assert_eq!(config.smoothing.tension, 0.8);
        assert_eq!(config.smoothing.sample_spacing_km, 0.05);
        assert_eq!(config.search.max_snap_radius_km, 5.0);
        assert_eq!(config.grid.lat_step, 0.0018);
    }

    #[test]
    fn out_of_range_tension_is_rejected() {
        let mut config = RoutingConfig::default();
        config.smoothing.tension = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn inverted_bounds_are_rejected() {
        let mut config = RoutingConfig::default();
        config.grid.bounds = Some(Bounds {
            south: 45.0,
            north: 44.0,
            west: -73.5,
            east: -73.0,
        });
        assert!(config.validate().is_err());
    }

    #[test]
    fn enclosing_bounds_cover_points() {
        let points = [LatLng::new(44.0, -73.0), LatLng::new(44.5, -73.5)];
        let bounds = Bounds::enclosing(points.iter()).expect("non-empty");
        assert!(bounds.contains(44.25, -73.25));
        assert!(!bounds.contains(44.6, -73.25));
    }
}
