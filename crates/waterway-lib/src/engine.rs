//! The routing engine: explicit owner of the data a route depends on.
//!
//! A [`RoutingEngine`] holds the loaded boundaries and depths, the active
//! vessel profile and the grid built from them. The grid is built lazily on
//! first use and published as an `Arc<GridSnapshot>`. Anything that changes
//! its inputs (a new vessel profile, reloaded data) drops the published
//! snapshot so the next query builds a fresh one; snapshots already handed out
//! stay valid for the computations holding them.
//!
//! Locks are only held long enough to clone or replace `Arc`s. Grid builds
//! run without holding any lock, and a build whose inputs changed underneath
//! it is returned to its caller but not published.

use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::{debug, info, warn};

use crate::boundary::BoundaryStore;
use crate::config::RoutingConfig;
use crate::coords::LatLng;
use crate::depth::DepthStore;
use crate::error::Result;
use crate::grid::{build_grid, grid_fingerprint, GridSnapshot};
use crate::grid_cache::{save_grid, try_load_grid};
use crate::path::{self, GridPath, RouteAlgorithm, SearchOutcome};
use crate::routing::{RouteAssembler, RouteResult, StopResolver};
use crate::service::CancelToken;
use crate::vessel::VesselProfile;

#[derive(Debug)]
struct EngineState {
    boundaries: Arc<BoundaryStore>,
    depths: Arc<DepthStore>,
    profile: VesselProfile,
    grid: Option<Arc<GridSnapshot>>,
    /// Bumped whenever a grid input changes.
    generation: u64,
}

/// Grid inputs captured under the lock so a build can run without it.
struct BuildInputs {
    boundaries: Arc<BoundaryStore>,
    depths: Arc<DepthStore>,
    profile: VesselProfile,
    generation: u64,
}

/// Owns boundaries, depths, vessel profile and the cached grid.
#[derive(Debug)]
pub struct RoutingEngine {
    config: RoutingConfig,
    state: RwLock<EngineState>,
    grid_cache: Option<PathBuf>,
}

impl RoutingEngine {
    /// Create an engine, rejecting configurations that fail [`RoutingConfig::validate`].
    pub fn new(
        config: RoutingConfig,
        boundaries: BoundaryStore,
        depths: DepthStore,
    ) -> Result<Self> {
        config.validate()?;
        if boundaries.is_empty() {
            warn!("routing engine created without boundary data; every leg will fall back");
        }
        Ok(Self {
            config,
            state: RwLock::new(EngineState {
                boundaries: Arc::new(boundaries),
                depths: Arc::new(depths),
                profile: VesselProfile::default(),
                grid: None,
                generation: 0,
            }),
            grid_cache: None,
        })
    }

    pub fn with_vessel_profile(self, profile: VesselProfile) -> Self {
        self.write_state().profile = profile;
        self
    }

    /// Persist built grids at `path` and try it before building.
    pub fn with_grid_cache(mut self, path: impl Into<PathBuf>) -> Self {
        self.grid_cache = Some(path.into());
        self
    }

    pub fn config(&self) -> &RoutingConfig {
        &self.config
    }

    pub fn grid_cache_path(&self) -> Option<&Path> {
        self.grid_cache.as_deref()
    }

    pub fn vessel_profile(&self) -> VesselProfile {
        self.read_state().profile
    }

    pub fn boundaries(&self) -> Arc<BoundaryStore> {
        Arc::clone(&self.read_state().boundaries)
    }

    pub fn depths(&self) -> Arc<DepthStore> {
        Arc::clone(&self.read_state().depths)
    }

    /// Change the vessel and return its minimum safe depth.
    ///
    /// The grid is invalidated when the minimum safe depth changes.
    pub fn set_vessel_profile(&self, draft_meters: f64, safety_margin_meters: f64) -> Result<f64> {
        let profile = VesselProfile::new(draft_meters, safety_margin_meters)?;
        let minimum_safe_depth = profile.minimum_safe_depth();

        let mut state = self.write_state();
        let changed = state.profile.minimum_safe_depth() != minimum_safe_depth;
        state.profile = profile;
        if changed {
            invalidate(&mut state);
        }
        info!(
            draft_meters,
            safety_margin_meters,
            minimum_safe_depth,
            grid_invalidated = changed,
            "vessel profile updated"
        );
        Ok(minimum_safe_depth)
    }

    /// Swap in freshly loaded sources.
    pub fn replace_data(&self, boundaries: BoundaryStore, depths: DepthStore) {
        let mut state = self.write_state();
        state.boundaries = Arc::new(boundaries);
        state.depths = Arc::new(depths);
        invalidate(&mut state);
        info!(
            water_bodies = state.boundaries.len(),
            depth_samples = state.depths.len(),
            "routing data replaced"
        );
    }

    pub fn invalidate_grid(&self) {
        invalidate(&mut self.write_state());
    }

    pub fn is_grid_ready(&self) -> bool {
        self.read_state().grid.is_some()
    }

    /// Digest of the inputs the current grid is (or would be) built from.
    pub fn fingerprint(&self) -> [u8; 32] {
        let state = self.read_state();
        grid_fingerprint(
            &self.config.grid,
            &state.boundaries,
            &state.depths,
            &state.profile,
        )
    }

    /// The current grid, loading it from the cache or building it when needed.
    pub fn grid(&self) -> Arc<GridSnapshot> {
        self.current().0
    }

    /// Build a new grid regardless of any published snapshot or cache file.
    pub fn rebuild_grid(&self) -> Arc<GridSnapshot> {
        let inputs = self.capture_inputs();
        let grid = Arc::new(self.build(&inputs));
        self.store_cache(&grid);
        self.publish(&inputs, &grid);
        grid
    }

    pub fn is_navigable(&self, lat: f64, lng: f64) -> bool {
        self.read_state().boundaries.is_navigable(lat, lng)
    }

    pub fn water_body_at(&self, lat: f64, lng: f64) -> Option<String> {
        self.read_state()
            .boundaries
            .water_body_at(lat, lng)
            .map(str::to_string)
    }

    pub fn find_path(&self, start: LatLng, end: LatLng) -> Result<Option<GridPath>> {
        path::find_path(&self.grid(), &self.config.search, start, end)
    }

    pub fn search(
        &self,
        start: LatLng,
        end: LatLng,
        algorithm: RouteAlgorithm,
    ) -> Result<SearchOutcome> {
        path::search(&self.grid(), &self.config.search, start, end, algorithm)
    }

    pub fn plan_route(&self, stops: &[String], resolver: &dyn StopResolver) -> Result<RouteResult> {
        self.plan_route_with_cancel(stops, resolver, RouteAlgorithm::default(), &CancelToken::new())
    }

    /// Plan a trip that can be abandoned through `cancel`.
    pub fn plan_route_with_cancel(
        &self,
        stops: &[String],
        resolver: &dyn StopResolver,
        algorithm: RouteAlgorithm,
        cancel: &CancelToken,
    ) -> Result<RouteResult> {
        let (grid, boundaries) = self.current();
        RouteAssembler::new(&grid, &boundaries, &self.config)
            .with_algorithm(algorithm)
            .assemble(stops, resolver, cancel)
    }

    /// Published grid plus the boundaries it was built from.
    fn current(&self) -> (Arc<GridSnapshot>, Arc<BoundaryStore>) {
        {
            let state = self.read_state();
            if let Some(grid) = &state.grid {
                return (Arc::clone(grid), Arc::clone(&state.boundaries));
            }
        }

        let inputs = self.capture_inputs();
        let grid = match self.load_cache(&inputs) {
            Some(grid) => Arc::new(grid),
            None => {
                let grid = Arc::new(self.build(&inputs));
                self.store_cache(&grid);
                grid
            }
        };
        let grid = self.publish(&inputs, &grid);
        (grid, inputs.boundaries)
    }

    fn capture_inputs(&self) -> BuildInputs {
        let state = self.read_state();
        BuildInputs {
            boundaries: Arc::clone(&state.boundaries),
            depths: Arc::clone(&state.depths),
            profile: state.profile,
            generation: state.generation,
        }
    }

    fn build(&self, inputs: &BuildInputs) -> GridSnapshot {
        build_grid(
            &self.config.grid,
            &inputs.boundaries,
            &inputs.depths,
            &inputs.profile,
        )
    }

    fn load_cache(&self, inputs: &BuildInputs) -> Option<GridSnapshot> {
        let path = self.grid_cache.as_deref()?;
        let fingerprint = grid_fingerprint(
            &self.config.grid,
            &inputs.boundaries,
            &inputs.depths,
            &inputs.profile,
        );
        try_load_grid(path, &fingerprint)
    }

    fn store_cache(&self, grid: &GridSnapshot) {
        let Some(path) = self.grid_cache.as_deref() else {
            return;
        };
        if let Err(e) = save_grid(grid, path) {
            warn!(path = %path.display(), error = %e, "failed to write grid cache");
        }
    }

    /// Publish `grid` unless its inputs went stale meanwhile.
    ///
    /// When another caller already published a snapshot for the same inputs,
    /// that one is returned so every reader shares a single grid.
    fn publish(&self, inputs: &BuildInputs, grid: &Arc<GridSnapshot>) -> Arc<GridSnapshot> {
        let mut state = self.write_state();
        if state.generation != inputs.generation {
            debug!("grid inputs changed during build; not publishing");
            return Arc::clone(grid);
        }
        match &state.grid {
            Some(existing) if existing.fingerprint() == grid.fingerprint() => Arc::clone(existing),
            _ => {
                state.grid = Some(Arc::clone(grid));
                Arc::clone(grid)
            }
        }
    }

    fn read_state(&self) -> RwLockReadGuard<'_, EngineState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, EngineState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

fn invalidate(state: &mut EngineState) {
    state.grid = None;
    state.generation += 1;
    debug!(generation = state.generation, "grid invalidated");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::depth::DepthSample;
    use crate::grid::GridLayout;
    use crate::routing::CoordinateResolver;
    use crate::test_helpers::{fine_grid_config, island_lake};
    use tempfile::tempdir;

    fn engine() -> RoutingEngine {
        let config = RoutingConfig {
            grid: fine_grid_config(),
            ..RoutingConfig::default()
        };
        RoutingEngine::new(config, island_lake(), DepthStore::empty()).expect("valid config")
    }

    #[test]
    fn zero_grid_step_is_rejected_at_construction() {
        let mut config = RoutingConfig::default();
        config.grid.lat_step = 0.0;
        let err = RoutingEngine::new(config, island_lake(), DepthStore::empty()).unwrap_err();
        assert!(matches!(err, crate::error::Error::InvalidConfig { .. }));
    }

    #[test]
    fn grid_is_built_lazily_and_shared() {
        let engine = engine();
        assert!(!engine.is_grid_ready());
        let first = engine.grid();
        assert!(engine.is_grid_ready());
        let second = engine.grid();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn vessel_change_invalidates_and_filters_depths() {
        let layout = GridLayout::resolve(&fine_grid_config(), &island_lake()).unwrap();
        let cell = layout.coordinate(3, 3);
        let depths = DepthStore::from_samples(vec![DepthSample {
            cell_id: "g0".into(),
            lat: cell.lat,
            lng: cell.lng,
            depth_meters: 2.0,
        }]);
        let config = RoutingConfig {
            grid: fine_grid_config(),
            ..RoutingConfig::default()
        };
        let engine = RoutingEngine::new(config, island_lake(), depths).expect("valid config");

        assert_eq!(engine.set_vessel_profile(1.0, 0.5).unwrap(), 1.5);
        let shallow_ok = engine.grid();
        assert!(shallow_ok.contains_cell(3, 3));

        assert_eq!(engine.set_vessel_profile(1.8, 0.7).unwrap(), 2.5);
        assert!(!engine.is_grid_ready());
        let deep_only = engine.grid();
        assert!(!deep_only.contains_cell(3, 3));
        assert_eq!(shallow_ok.len(), deep_only.len() + 1);
    }

    #[test]
    fn invalid_profile_keeps_previous() {
        let engine = engine();
        engine.grid();
        assert!(engine.set_vessel_profile(-1.0, 0.0).is_err());
        assert!(engine.is_grid_ready());
        assert_eq!(engine.vessel_profile(), VesselProfile::default());
    }

    #[test]
    fn replacing_data_drops_grid() {
        let engine = engine();
        assert!(!engine.grid().is_empty());
        engine.replace_data(BoundaryStore::empty(), DepthStore::empty());
        assert!(!engine.is_grid_ready());
        assert!(!engine.is_navigable(0.0015, 0.0015));
        assert!(engine.grid().is_empty());
    }

    #[test]
    fn cached_grid_is_reused_across_engines() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cache").join("grid.bin");

        let built = engine().with_grid_cache(&path).grid();
        assert!(path.exists());

        let loaded = engine().with_grid_cache(&path).grid();
        assert_eq!(built.points(), loaded.points());
        assert_eq!(built.fingerprint(), loaded.fingerprint());
    }

    #[test]
    fn plans_through_published_grid() {
        let engine = engine();
        let stops = vec!["0.0035,0.0105".to_string(), "0.0165,0.0105".to_string()];
        let result = engine.plan_route(&stops, &CoordinateResolver).expect("plans");
        assert!(!result.is_partial());
        assert_eq!(engine.water_body_at(0.0015, 0.0015).as_deref(), Some("pond"));
        assert!(engine.water_body_at(0.01, 0.01).is_none());
    }
}
