//! Common test utilities and fixture helpers.
//!
//! Fixtures live in `docs/fixtures` and describe a synthetic "Test Lake"
//! (lat 44.00–44.40, lng -73.40 to -73.20) with one rectangular island
//! (lat 44.15–44.25, lng -73.33 to -73.27), plus a separate "Mill Pond" that
//! no water path reaches.

use std::path::PathBuf;

use waterway_lib::{
    BoundaryStore, DepthStore, FileSource, LatLng, Ring, RoutingConfig, RoutingEngine,
    StopDirectory,
};

/// Path to fixtures directory used by tests.
#[allow(dead_code)]
pub fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../docs/fixtures")
}

#[allow(dead_code)]
pub fn lake_path() -> PathBuf {
    fixtures_dir().join("test_lake.geojson")
}

#[allow(dead_code)]
pub fn depths_path() -> PathBuf {
    fixtures_dir().join("test_depths.json")
}

#[allow(dead_code)]
pub fn load_lake() -> BoundaryStore {
    BoundaryStore::load(&FileSource::new(lake_path())).expect("fixture lake loads")
}

#[allow(dead_code)]
pub fn load_depths() -> DepthStore {
    DepthStore::load(&FileSource::new(depths_path())).expect("fixture depths load")
}

#[allow(dead_code)]
pub fn stop_directory() -> StopDirectory {
    StopDirectory::load(&FileSource::new(fixtures_dir().join("test_stops.json")))
        .expect("fixture stops load")
}

/// Engine over the fixture lake and depths with default settings.
#[allow(dead_code)]
pub fn lake_engine() -> RoutingEngine {
    RoutingEngine::new(RoutingConfig::default(), load_lake(), load_depths())
        .expect("default config is valid")
}

/// The island ring of the fixture lake.
#[allow(dead_code)]
pub fn island_ring(lake: &BoundaryStore) -> Ring {
    let body = lake
        .bodies()
        .iter()
        .find(|body| body.name == "Test Lake")
        .expect("Test Lake present");
    body.holes[0].clone()
}

#[allow(dead_code)]
pub fn stops(ids: &[&str]) -> Vec<String> {
    ids.iter().map(|id| id.to_string()).collect()
}

#[allow(dead_code)]
pub const SOUTH_LANDING: LatLng = LatLng::new(44.05, -73.38);
#[allow(dead_code)]
pub const NORTH_MARINA: LatLng = LatLng::new(44.3315, -73.38);
#[allow(dead_code)]
pub const ISLAND_SOUTH: LatLng = LatLng::new(44.12, -73.30);
#[allow(dead_code)]
pub const ISLAND_NORTH: LatLng = LatLng::new(44.28, -73.30);
