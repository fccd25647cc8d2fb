//! Async front end for interactive callers.
//!
//! [`RouteService`] wraps a [`RoutingEngine`] for use from a tokio runtime.
//! Source loading and grid builds are CPU or disk bound, so they run on the
//! blocking pool. Route requests follow a latest-wins policy: starting a new
//! request cancels the one still in flight, and a cancelled request resolves
//! to [`Error::Cancelled`] instead of delivering a stale result.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tokio::task::{spawn_blocking, JoinError};
use tracing::{debug, error, info};

use crate::boundary::BoundaryStore;
use crate::config::RoutingConfig;
use crate::depth::DepthStore;
use crate::engine::RoutingEngine;
use crate::error::{Error, Result};
use crate::grid::GridSnapshot;
use crate::path::RouteAlgorithm;
use crate::routing::{RouteResult, StopResolver};
use crate::source::DataSource;

/// Shared cancellation flag for one route request.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Tokio-facing wrapper around a shared [`RoutingEngine`].
#[derive(Debug)]
pub struct RouteService {
    engine: Arc<RoutingEngine>,
    in_flight: Mutex<Option<CancelToken>>,
}

impl RouteService {
    pub fn new(engine: RoutingEngine) -> Self {
        Self {
            engine: Arc::new(engine),
            in_flight: Mutex::new(None),
        }
    }

    /// Load boundary and depth sources off the async runtime and wrap them in
    /// an engine with default vessel settings.
    ///
    /// A source that fails to load degrades to an empty store. Only an invalid
    /// `config` is an error.
    pub async fn load(
        config: RoutingConfig,
        boundary_source: Arc<dyn DataSource>,
        depth_source: Option<Arc<dyn DataSource>>,
    ) -> Result<Self> {
        let (boundaries, depths) = Self::load_stores(boundary_source, depth_source).await;
        Ok(Self::new(RoutingEngine::new(config, boundaries, depths)?))
    }

    /// Load both stores concurrently on the blocking pool.
    ///
    /// Callers that need to customise the engine (vessel profile, grid cache)
    /// build it from these stores and hand it to [`RouteService::new`].
    pub async fn load_stores(
        boundary_source: Arc<dyn DataSource>,
        depth_source: Option<Arc<dyn DataSource>>,
    ) -> (BoundaryStore, DepthStore) {
        let boundaries =
            spawn_blocking(move || BoundaryStore::load_or_empty(boundary_source.as_ref()));
        let depths = spawn_blocking(move || match depth_source {
            Some(source) => DepthStore::load_or_empty(source.as_ref()),
            None => DepthStore::empty(),
        });
        let (boundaries, depths) = tokio::join!(boundaries, depths);

        let boundaries = boundaries.unwrap_or_else(|e| {
            error!(error = %e, "boundary loading task failed");
            BoundaryStore::empty()
        });
        let depths = depths.unwrap_or_else(|e| {
            error!(error = %e, "depth loading task failed");
            DepthStore::empty()
        });

        info!(
            water_bodies = boundaries.len(),
            depth_samples = depths.len(),
            "sources loaded"
        );
        (boundaries, depths)
    }

    pub fn engine(&self) -> &Arc<RoutingEngine> {
        &self.engine
    }

    /// Build (or load) the grid on the blocking pool.
    pub async fn warm_grid(&self) -> Result<Arc<GridSnapshot>> {
        let engine = Arc::clone(&self.engine);
        spawn_blocking(move || engine.grid())
            .await
            .map_err(task_error)
    }

    /// Change the vessel; the next route request builds a matching grid.
    pub async fn set_vessel_profile(&self, draft_meters: f64, safety_margin_meters: f64) -> Result<f64> {
        let engine = Arc::clone(&self.engine);
        spawn_blocking(move || engine.set_vessel_profile(draft_meters, safety_margin_meters))
            .await
            .map_err(task_error)?
    }

    /// Plan a trip, superseding any request still in flight.
    pub async fn plan_route(
        &self,
        stops: Vec<String>,
        resolver: Arc<dyn StopResolver>,
        algorithm: RouteAlgorithm,
    ) -> Result<RouteResult> {
        let token = CancelToken::new();
        let previous = self
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(token.clone());
        if let Some(previous) = previous {
            debug!("superseding in-flight route request");
            previous.cancel();
        }

        let engine = Arc::clone(&self.engine);
        let task_token = token.clone();
        let result = spawn_blocking(move || {
            engine.plan_route_with_cancel(&stops, resolver.as_ref(), algorithm, &task_token)
        })
        .await
        .map_err(task_error)?;

        if token.is_cancelled() {
            return Err(Error::Cancelled);
        }
        result
    }
}

fn task_error(e: JoinError) -> Error {
    Error::BackgroundTask {
        message: e.to_string(),
    }
}
