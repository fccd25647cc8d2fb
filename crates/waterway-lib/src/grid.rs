//! Navigable-water lattice.
//!
//! The region is rasterized into a uniform lattice; every lattice coordinate
//! that lies in navigable water (and is deep enough, where a depth sample
//! exists) becomes a [`GridPoint`]. Points are addressed by `(row, col)` from
//! the south-west corner, which gives an implicit 8-connected graph with O(1)
//! neighbour lookups. A [`GridSnapshot`] is immutable once built; changing the
//! vessel profile or reloading data produces a new snapshot.

use std::collections::HashMap;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use crate::boundary::BoundaryStore;
use crate::config::{Bounds, GridConfig};
use crate::coords::{quantize, LatLng};
use crate::depth::DepthStore;
use crate::spatial::{KdPointIndex, PointIndex};
use crate::vessel::VesselProfile;

/// Identifier of a grid point, assigned in row-major order over accepted points.
pub type GridPointId = u32;

const NEIGHBOR_OFFSETS: [(i64, i64); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

/// A pre-validated navigable lattice coordinate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridPoint {
    pub id: GridPointId,
    pub lat: f64,
    pub lng: f64,
    pub row: u32,
    pub col: u32,
    pub depth_meters: Option<f64>,
}

impl GridPoint {
    pub fn position(&self) -> LatLng {
        LatLng::new(self.lat, self.lng)
    }
}

/// Lattice geometry a snapshot was generated with.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridLayout {
    pub bounds: Bounds,
    pub lat_step: f64,
    pub lng_step: f64,
    pub rows: u32,
    pub cols: u32,
    pub precision: u32,
}

impl GridLayout {
    /// Resolve the lattice for a configuration, falling back to the boundary outline.
    pub fn resolve(config: &GridConfig, boundaries: &BoundaryStore) -> Option<Self> {
        let bounds = config.bounds.or_else(|| boundaries.bounds())?;
        if !valid_step(config.lat_step) || !valid_step(config.lng_step) {
            warn!(
                lat_step = config.lat_step,
                lng_step = config.lng_step,
                "grid steps must be positive; no lattice"
            );
            return None;
        }
        let rows = lattice_count(bounds.north - bounds.south, config.lat_step);
        let cols = lattice_count(bounds.east - bounds.west, config.lng_step);
        Some(Self {
            bounds,
            lat_step: config.lat_step,
            lng_step: config.lng_step,
            rows,
            cols,
            precision: config.precision,
        })
    }

    /// Quantized coordinate of a lattice cell.
    pub fn coordinate(&self, row: u32, col: u32) -> LatLng {
        LatLng::new(
            quantize(
                self.bounds.south + row as f64 * self.lat_step,
                self.precision,
            ),
            quantize(self.bounds.west + col as f64 * self.lng_step, self.precision),
        )
    }
}

fn valid_step(step: f64) -> bool {
    step.is_finite() && step > 0.0
}

fn lattice_count(span: f64, step: f64) -> u32 {
    (((span / step) + 1e-9).floor().max(0.0) as u32).saturating_add(1)
}

/// Immutable grid of navigable points plus its spatial index.
pub struct GridSnapshot {
    layout: Option<GridLayout>,
    points: Vec<GridPoint>,
    cells: HashMap<(u32, u32), usize>,
    index: Option<Box<dyn PointIndex>>,
    minimum_safe_depth: f64,
    fingerprint: [u8; 32],
}

impl GridSnapshot {
    /// Assemble a snapshot from already-accepted points, indexing them.
    pub fn from_parts(
        layout: Option<GridLayout>,
        points: Vec<GridPoint>,
        minimum_safe_depth: f64,
        fingerprint: [u8; 32],
    ) -> Self {
        let cells = points
            .iter()
            .enumerate()
            .map(|(i, p)| ((p.row, p.col), i))
            .collect();
        let positions: Vec<LatLng> = points.iter().map(GridPoint::position).collect();
        let index: Box<dyn PointIndex> = Box::new(KdPointIndex::bulk_load(&positions));
        Self {
            layout,
            points,
            cells,
            index: Some(index),
            minimum_safe_depth,
            fingerprint,
        }
    }

    /// Drop the spatial index; nearest queries fall back to a linear scan.
    pub fn without_index(mut self) -> Self {
        self.index = None;
        self
    }

    pub fn layout(&self) -> Option<&GridLayout> {
        self.layout.as_ref()
    }

    pub fn points(&self) -> &[GridPoint] {
        &self.points
    }

    pub fn point(&self, index: usize) -> Option<&GridPoint> {
        self.points.get(index)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn has_index(&self) -> bool {
        self.index.is_some()
    }

    pub fn minimum_safe_depth(&self) -> f64 {
        self.minimum_safe_depth
    }

    /// Digest of every input that shaped this grid.
    pub fn fingerprint(&self) -> [u8; 32] {
        self.fingerprint
    }

    pub fn index_of_cell(&self, row: u32, col: u32) -> Option<usize> {
        self.cells.get(&(row, col)).copied()
    }

    pub fn contains_cell(&self, row: u32, col: u32) -> bool {
        self.cells.contains_key(&(row, col))
    }

    /// Slice positions of the up-to-8 points adjacent to the point at `index`.
    pub(crate) fn neighbor_indices(&self, index: usize) -> impl Iterator<Item = usize> + '_ {
        let point = &self.points[index];
        let (row, col) = (point.row as i64, point.col as i64);
        NEIGHBOR_OFFSETS.iter().filter_map(move |(dr, dc)| {
            let r = row + dr;
            let c = col + dc;
            if r < 0 || c < 0 {
                return None;
            }
            self.index_of_cell(r as u32, c as u32)
        })
    }

    /// Points reachable by a single step in any of the eight compass directions.
    pub fn neighbors(&self, point: &GridPoint) -> Vec<&GridPoint> {
        match self.index_of_cell(point.row, point.col) {
            Some(index) => self
                .neighbor_indices(index)
                .map(|i| &self.points[i])
                .collect(),
            None => Vec::new(),
        }
    }

    /// Closest grid point and its great-circle distance in kilometres.
    pub fn nearest(&self, lat: f64, lng: f64) -> Option<(&GridPoint, f64)> {
        self.nearest_index(LatLng::new(lat, lng))
            .map(|i| (&self.points[i], self.points[i].position().distance_to(&LatLng::new(lat, lng))))
    }

    pub(crate) fn nearest_index(&self, target: LatLng) -> Option<usize> {
        if self.points.is_empty() {
            return None;
        }
        if let Some(index) = &self.index {
            return index.nearest(target);
        }

        debug!("grid has no spatial index; scanning all points");
        self.points
            .iter()
            .enumerate()
            .min_by(|a, b| {
                a.1.position()
                    .distance_to(&target)
                    .total_cmp(&b.1.position().distance_to(&target))
            })
            .map(|(i, _)| i)
    }
}

impl std::fmt::Debug for GridSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GridSnapshot")
            .field("layout", &self.layout)
            .field("point_count", &self.points.len())
            .field("has_index", &self.index.is_some())
            .field("minimum_safe_depth", &self.minimum_safe_depth)
            .finish()
    }
}

/// Digest of the grid inputs, used to validate cached snapshots.
pub fn grid_fingerprint(
    config: &GridConfig,
    boundaries: &BoundaryStore,
    depths: &DepthStore,
    profile: &VesselProfile,
) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(b"waterway-grid-v1");
    match config.bounds {
        Some(b) => {
            hasher.update([1u8]);
            for v in [b.south, b.north, b.west, b.east] {
                hasher.update(v.to_le_bytes());
            }
        }
        None => hasher.update([0u8]),
    }
    hasher.update(config.lat_step.to_le_bytes());
    hasher.update(config.lng_step.to_le_bytes());
    hasher.update(config.precision.to_le_bytes());
    hasher.update(profile.minimum_safe_depth().to_le_bytes());
    hasher.update(boundaries.digest());
    hasher.update(depths.digest());
    hasher.finalize().into()
}

/// Rasterize the region into navigable grid points and index them.
///
/// Deterministic for identical inputs. A lattice coordinate is kept when it is
/// navigable and, if a depth sample sits on it, that depth meets the vessel's
/// minimum safe depth.
pub fn build_grid(
    config: &GridConfig,
    boundaries: &BoundaryStore,
    depths: &DepthStore,
    profile: &VesselProfile,
) -> GridSnapshot {
    let started = Instant::now();
    let minimum_safe_depth = profile.minimum_safe_depth();
    let fingerprint = grid_fingerprint(config, boundaries, depths, profile);

    let Some(layout) = GridLayout::resolve(config, boundaries) else {
        warn!("no grid bounds configured and no water bodies loaded; grid is empty");
        return GridSnapshot::from_parts(None, Vec::new(), minimum_safe_depth, fingerprint);
    };

    let mut points = Vec::new();
    let mut rejected_land = 0usize;
    let mut rejected_shallow = 0usize;

    for row in 0..layout.rows {
        for col in 0..layout.cols {
            let position = layout.coordinate(row, col);
            if !boundaries.is_navigable(position.lat, position.lng) {
                rejected_land += 1;
                continue;
            }

            let depth_meters = depths.depth_near(position.lat, position.lng);
            if let Some(depth) = depth_meters {
                if depth < minimum_safe_depth {
                    rejected_shallow += 1;
                    continue;
                }
            }

            points.push(GridPoint {
                id: points.len() as GridPointId,
                lat: position.lat,
                lng: position.lng,
                row,
                col,
                depth_meters,
            });
        }
    }

    info!(
        rows = layout.rows,
        cols = layout.cols,
        accepted = points.len(),
        rejected_land,
        rejected_shallow,
        minimum_safe_depth,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "built navigation grid"
    );

    GridSnapshot::from_parts(Some(layout), points, minimum_safe_depth, fingerprint)
}
