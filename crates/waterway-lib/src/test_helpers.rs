// Test-only helpers for `waterway-lib` unit tests
#![allow(dead_code)]

use crate::boundary::{BoundaryStore, Ring, WaterBody};
use crate::config::{Bounds, GridConfig};
use crate::coords::LatLng;
use crate::depth::DepthStore;
use crate::grid::{build_grid, GridSnapshot};
use crate::vessel::VesselProfile;

/// Axis-aligned rectangular ring.
pub fn rect_ring(south: f64, north: f64, west: f64, east: f64, body: &str) -> Ring {
    Ring::new(
        vec![
            LatLng::new(south, west),
            LatLng::new(south, east),
            LatLng::new(north, east),
            LatLng::new(north, west),
        ],
        body,
    )
    .expect("rectangle is a valid ring")
}

/// A 0.02° square lake with a 0.006° square island in the middle.
pub fn island_lake() -> BoundaryStore {
    let outer = rect_ring(0.0, 0.02, 0.0, 0.02, "pond");
    let island = rect_ring(0.007, 0.013, 0.007, 0.013, "pond");
    BoundaryStore::from_bodies(vec![WaterBody::new("pond", outer, vec![island])])
}

/// Lattice at 0.001° spacing covering [`island_lake`].
pub fn fine_grid_config() -> GridConfig {
    GridConfig {
        bounds: Some(Bounds {
            south: -0.0005,
            north: 0.0205,
            west: -0.0005,
            east: 0.0205,
        }),
        lat_step: 0.001,
        lng_step: 0.001,
        precision: 6,
    }
}

pub fn island_grid() -> GridSnapshot {
    build_grid(
        &fine_grid_config(),
        &island_lake(),
        &DepthStore::empty(),
        &VesselProfile::default(),
    )
}
