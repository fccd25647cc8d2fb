//! Sparse bathymetry samples.
//!
//! The bathymetry tooling emits a JSON document shaped like:
//!
//! ```text
//! {
//!   "metadata": { ... },
//!   "depth_grid": { "g0": { "lat": 44.1, "lng": -73.3, "depth": 12.5 }, ... },
//!   "depth_statistics": { "min": 0.9, "max": 120.4, "mean": 19.8, "count": 10342 }
//! }
//! ```
//!
//! Cell ids are producer-assigned sequence numbers, so samples are also
//! indexed by a quantized coordinate key for lattice lookups.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{error, info};

use crate::error::{Error, Result};
use crate::source::DataSource;

/// Decimal places used when matching lattice coordinates to samples.
const COORD_KEY_DECIMALS: i32 = 5;

/// A single depth sounding attached to a grid cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepthSample {
    pub cell_id: String,
    pub lat: f64,
    pub lng: f64,
    pub depth_meters: f64,
}

/// Summary statistics used for diagnostics only.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DepthStatistics {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub count: usize,
}

#[derive(Debug, Deserialize)]
struct DepthDocument {
    #[serde(default)]
    depth_grid: HashMap<String, RawSample>,
    #[serde(default)]
    depth_statistics: Option<DepthStatistics>,
}

#[derive(Debug, Deserialize)]
struct RawSample {
    lat: f64,
    lng: f64,
    #[serde(alias = "depth_meters")]
    depth: f64,
}

/// Immutable depth lookup keyed by cell id and by coordinate.
#[derive(Debug, Clone, Default)]
pub struct DepthStore {
    samples: HashMap<String, DepthSample>,
    by_coordinate: HashMap<(i64, i64), String>,
    source_statistics: Option<DepthStatistics>,
}

impl DepthStore {
    /// Store without samples; depth filtering is skipped.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_samples(samples: impl IntoIterator<Item = DepthSample>) -> Self {
        let mut store = Self::default();
        for sample in samples {
            store.insert(sample);
        }
        store
    }

    fn insert(&mut self, sample: DepthSample) {
        self.by_coordinate
            .insert(coordinate_key(sample.lat, sample.lng), sample.cell_id.clone());
        self.samples.insert(sample.cell_id.clone(), sample);
    }

    /// Parse a depth grid document.
    pub fn load(source: &dyn DataSource) -> Result<Self> {
        let source_name = source.describe();
        let raw = source.read_to_string()?;
        let document: DepthDocument =
            serde_json::from_str(&raw).map_err(|e| Error::DepthParse {
                source_name: source_name.clone(),
                message: e.to_string(),
            })?;

        let mut store = Self::default();
        let mut skipped = 0usize;
        for (cell_id, raw) in document.depth_grid {
            if !raw.lat.is_finite() || !raw.lng.is_finite() || !raw.depth.is_finite() {
                skipped += 1;
                continue;
            }
            store.insert(DepthSample {
                cell_id,
                lat: raw.lat,
                lng: raw.lng,
                depth_meters: raw.depth,
            });
        }
        store.source_statistics = document.depth_statistics;

        let stats = store.statistics();
        info!(
            source = %source_name,
            samples = store.len(),
            skipped,
            min_depth = stats.map(|s| s.min),
            max_depth = stats.map(|s| s.max),
            "loaded depth samples"
        );
        Ok(store)
    }

    /// Load depths, degrading to an empty store (no depth filtering) on failure.
    pub fn load_or_empty(source: &dyn DataSource) -> Self {
        match Self::load(source) {
            Ok(store) => store,
            Err(e) => {
                error!(
                    source = %source.describe(),
                    error = %e,
                    "failed to load depth data; depth filtering disabled"
                );
                Self::empty()
            }
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn sample(&self, cell_id: &str) -> Option<&DepthSample> {
        self.samples.get(cell_id)
    }

    pub fn depth_at(&self, cell_id: &str) -> Option<f64> {
        self.samples.get(cell_id).map(|s| s.depth_meters)
    }

    /// Depth of the sample sitting on this lattice coordinate, if any.
    pub fn depth_near(&self, lat: f64, lng: f64) -> Option<f64> {
        self.by_coordinate
            .get(&coordinate_key(lat, lng))
            .and_then(|cell_id| self.depth_at(cell_id))
    }

    /// Statistics from the source document, or computed from the samples.
    pub fn statistics(&self) -> Option<DepthStatistics> {
        if let Some(stats) = self.source_statistics {
            return Some(stats);
        }
        if self.samples.is_empty() {
            return None;
        }
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        let mut sum = 0.0;
        for sample in self.samples.values() {
            min = min.min(sample.depth_meters);
            max = max.max(sample.depth_meters);
            sum += sample.depth_meters;
        }
        Some(DepthStatistics {
            min,
            max,
            mean: sum / self.samples.len() as f64,
            count: self.samples.len(),
        })
    }

    /// SHA-256 over the samples in cell-id order.
    pub fn digest(&self) -> [u8; 32] {
        let mut ids: Vec<&String> = self.samples.keys().collect();
        ids.sort();
        let mut hasher = Sha256::new();
        for id in ids {
            let sample = &self.samples[id];
            hasher.update(id.as_bytes());
            hasher.update([0u8]);
            hasher.update(sample.lat.to_le_bytes());
            hasher.update(sample.lng.to_le_bytes());
            hasher.update(sample.depth_meters.to_le_bytes());
        }
        hasher.finalize().into()
    }
}

fn coordinate_key(lat: f64, lng: f64) -> (i64, i64) {
    let factor = 10f64.powi(COORD_KEY_DECIMALS);
    ((lat * factor).round() as i64, (lng * factor).round() as i64)
}
