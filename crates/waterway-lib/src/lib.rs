//! Waterway library entry points.
//!
//! This crate plans vessel routes over navigable water. It loads water body
//! outlines and optional bathymetry, rasterizes them into a grid of safe
//! points, searches that grid with A*, smooths the result and assembles
//! multi-stop trips. Higher-level consumers (the CLI, interactive front ends)
//! should only depend on the items exported here instead of reimplementing
//! behavior.
//!
//! Most callers go through [`RoutingEngine`], or [`RouteService`] from async
//! code.

pub mod boundary;
pub mod config;
pub mod coords;
pub mod depth;
pub mod engine;
pub mod error;
pub mod grid;
pub mod grid_cache;
pub mod output;
pub mod path;
pub mod routing;
pub mod service;
pub mod smoothing;
pub mod source;
pub mod spatial;
pub mod turns;
pub mod vessel;

#[cfg(test)]
mod test_helpers;

pub use boundary::{BoundaryStore, Ring, WaterBody};
pub use config::{
    default_cache_dir, default_grid_cache_path, Bounds, GridConfig, RoutingConfig, SearchConfig,
    SmoothingConfig, TurnConfig, TurnPenalties,
};
pub use coords::LatLng;
pub use depth::{DepthSample, DepthStatistics, DepthStore};
pub use engine::RoutingEngine;
pub use error::{Error, Result};
pub use grid::{build_grid, GridLayout, GridPoint, GridPointId, GridSnapshot};
pub use grid_cache::{load_grid, save_grid, try_load_grid};
pub use output::{DistanceUnit, RouteRenderMode, RouteSummary};
pub use path::{find_path, search, GridPath, NoPathReason, RouteAlgorithm, SearchOutcome};
pub use routing::{
    AssemblyState, ChainResolver, CoordinateResolver, ResolvedStop, RouteAssembler, RouteLeg,
    RouteResult, SmoothingMetadata, StopDirectory, StopResolver,
};
pub use service::{CancelToken, RouteService};
pub use smoothing::{smooth, SmoothedPath};
pub use source::{DataSource, FileSource, InlineSource};
pub use spatial::{KdPointIndex, PointIndex};
pub use turns::{analyze_turns, Turn, TurnAnalysis, TurnSeverity};
pub use vessel::VesselProfile;
