//! Subcommand handlers.
//!
//! `main.rs` parses arguments and dispatches here. The helpers below turn the
//! global options into a loaded [`RouteService`].

pub mod check;
pub mod grid;
pub mod route;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use tracing::{debug, warn};
use waterway_lib::{
    default_grid_cache_path, DataSource, FileSource, RouteService, RoutingConfig, RoutingEngine,
    VesselProfile,
};

use crate::GlobalOptions;

/// Read `--config` (or the defaults), then apply environment overrides.
pub fn load_config(global: &GlobalOptions) -> Result<RoutingConfig> {
    let config = match &global.config {
        Some(path) => RoutingConfig::from_path(path)
            .with_context(|| format!("failed to load configuration from {}", path.display()))?,
        None => RoutingConfig::default(),
    };
    let config = config.with_env_overrides();
    config
        .validate()
        .context("invalid routing configuration after environment overrides")?;
    Ok(config)
}

/// Vessel profile from `--draft`/`--margin`, defaulting each value separately.
pub fn vessel_profile(global: &GlobalOptions) -> Result<VesselProfile> {
    let defaults = VesselProfile::default();
    VesselProfile::new(
        global.draft.unwrap_or(defaults.draft_meters),
        global.margin.unwrap_or(defaults.safety_margin_meters),
    )
    .context("invalid vessel settings")
}

/// Grid cache location, or `None` when caching is disabled.
pub fn grid_cache_path(global: &GlobalOptions) -> Option<PathBuf> {
    if global.no_cache {
        return None;
    }
    global.grid_cache.clone().or_else(default_grid_cache_path)
}

fn existing_file(path: &Path, flag: &str) -> Result<()> {
    if !path.is_file() {
        bail!("{} file {} does not exist", flag, path.display());
    }
    Ok(())
}

/// What a command does when no water body could be loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmptyBoundaries {
    /// Stop with an error; the command has nothing to report on.
    Fail,
    /// Warn and continue; every leg becomes a straight line.
    Degrade,
}

/// Load the sources named on the command line and wrap them in a service.
pub async fn load_service(
    global: &GlobalOptions,
    on_empty: EmptyBoundaries,
) -> Result<RouteService> {
    let Some(boundaries_path) = global.boundaries.as_deref() else {
        bail!("--boundaries is required for this command");
    };
    existing_file(boundaries_path, "--boundaries")?;
    let depth_source: Option<Arc<dyn DataSource>> = match global.depths.as_deref() {
        Some(path) => {
            existing_file(path, "--depths")?;
            Some(Arc::new(FileSource::new(path)))
        }
        None => None,
    };

    let config = load_config(global)?;
    let profile = vessel_profile(global)?;

    let (boundaries, depths) =
        RouteService::load_stores(Arc::new(FileSource::new(boundaries_path)), depth_source).await;
    if boundaries.is_empty() {
        match on_empty {
            EmptyBoundaries::Fail => bail!(
                "no water bodies could be loaded from {}",
                boundaries_path.display()
            ),
            EmptyBoundaries::Degrade => warn!(
                path = %boundaries_path.display(),
                "no water bodies loaded; legs will be drawn as straight lines"
            ),
        }
    }

    let mut engine = RoutingEngine::new(config, boundaries, depths)
        .context("invalid routing configuration")?
        .with_vessel_profile(profile);
    if let Some(cache) = grid_cache_path(global) {
        debug!(path = %cache.display(), "using grid cache");
        engine = engine.with_grid_cache(cache);
    }
    Ok(RouteService::new(engine))
}
