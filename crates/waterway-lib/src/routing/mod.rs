//! Multi-stop route assembly.
//!
//! This module provides:
//! - [`StopResolver`] and its stock implementations, for turning stop ids into positions
//! - [`RouteAssembler`] - plans a trip leg by leg over a grid snapshot
//! - [`RouteResult`] / [`RouteLeg`] - the serializable outcome
//!
//! Each leg is searched on the grid and smoothed. A leg that cannot be routed
//! over water degrades to a straight line and is flagged as a fallback; the
//! trip as a whole still completes. Only an unplannable trip (fewer than two
//! usable stops) or invalid coordinates are reported as errors.

mod resolver;

pub use resolver::{ChainResolver, CoordinateResolver, ResolvedStop, StopDirectory, StopResolver};

use std::fmt;
use std::time::Instant;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::boundary::BoundaryStore;
use crate::config::RoutingConfig;
use crate::coords::{polyline_length_km, LatLng};
use crate::error::{format_suggestions, Error, Result};
use crate::grid::{GridPointId, GridSnapshot};
use crate::path::{search, NoPathReason, RouteAlgorithm, SearchOutcome};
use crate::service::CancelToken;
use crate::smoothing::{smooth, SmoothedPath};
use crate::turns::{analyze_turns, Turn};

/// Lifecycle of a single [`RouteAssembler::assemble`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AssemblyState {
    /// Fewer than two stops have been resolved; nothing can be planned.
    InsufficientStops,
    /// Legs are being planned.
    Assembling,
    /// Every leg has been planned.
    Complete,
}

impl fmt::Display for AssemblyState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = match self {
            AssemblyState::InsufficientStops => "insufficient_stops",
            AssemblyState::Assembling => "assembling",
            AssemblyState::Complete => "complete",
        };
        f.write_str(value)
    }
}

/// Point counts before and after smoothing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SmoothingMetadata {
    pub original_waypoints: usize,
    pub smoothed_waypoints: usize,
    pub land_corrections: usize,
}

impl SmoothingMetadata {
    fn from_path(path: &SmoothedPath) -> Self {
        Self {
            original_waypoints: path.original_count,
            smoothed_waypoints: path.points.len(),
            land_corrections: path.land_corrections,
        }
    }

    fn absorb(&mut self, other: &SmoothingMetadata) {
        self.original_waypoints += other.original_waypoints;
        self.smoothed_waypoints += other.smoothed_waypoints;
        self.land_corrections += other.land_corrections;
    }
}

/// One stop-to-stop segment of a trip.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteLeg {
    /// Stop id the leg starts from.
    pub from: String,
    /// Stop id the leg ends at.
    pub to: String,
    pub coordinates: Vec<LatLng>,
    pub distance_km: f64,
    /// Ids of the grid points the search visited, in order.
    pub grid_trail: Vec<GridPointId>,
    pub smoothing: Option<SmoothingMetadata>,
    pub warnings: Vec<String>,
    /// `true` when no water path was found and the leg is a straight line.
    pub is_fallback: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback_reason: Option<NoPathReason>,
}

/// A planned trip.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteResult {
    pub algorithm: RouteAlgorithm,
    pub stops: Vec<ResolvedStop>,
    pub coordinates: Vec<LatLng>,
    pub total_distance_km: f64,
    pub legs: Vec<RouteLeg>,
    pub smoothing: SmoothingMetadata,
    pub turns: Vec<Turn>,
    pub max_turn_angle: f64,
    pub sharp_turns: usize,
    pub warnings: Vec<String>,
}

impl RouteResult {
    pub fn fallback_legs(&self) -> usize {
        self.legs.iter().filter(|leg| leg.is_fallback).count()
    }

    /// `true` when at least one leg could not be routed over water.
    pub fn is_partial(&self) -> bool {
        self.fallback_legs() > 0
    }

    /// Fail with the first fallback leg's reason, for callers that reject
    /// straight-line legs.
    pub fn require_water_route(&self) -> Result<()> {
        let failed = self
            .legs
            .iter()
            .find_map(|leg| leg.fallback_reason.clone().map(|reason| (leg, reason)));
        match failed {
            Some((leg, reason)) => Err(reason.into_error(&leg.from, &leg.to)),
            None => Ok(()),
        }
    }
}

/// Plans trips against one immutable grid snapshot.
pub struct RouteAssembler<'a> {
    grid: &'a GridSnapshot,
    boundaries: &'a BoundaryStore,
    config: &'a RoutingConfig,
    algorithm: RouteAlgorithm,
    state: AssemblyState,
}

impl<'a> RouteAssembler<'a> {
    pub fn new(grid: &'a GridSnapshot, boundaries: &'a BoundaryStore, config: &'a RoutingConfig) -> Self {
        Self {
            grid,
            boundaries,
            config,
            algorithm: RouteAlgorithm::default(),
            state: AssemblyState::InsufficientStops,
        }
    }

    pub fn with_algorithm(mut self, algorithm: RouteAlgorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    pub fn state(&self) -> AssemblyState {
        self.state
    }

    fn transition(&mut self, state: AssemblyState) {
        debug!(from = %self.state, to = %state, "route assembly state change");
        self.state = state;
    }

    /// Resolve `stops` and plan a leg between each consecutive pair.
    ///
    /// `cancel` is checked before every leg; once it fires the call returns
    /// [`Error::Cancelled`] and no partial result is produced.
    pub fn assemble(
        &mut self,
        stops: &[String],
        resolver: &dyn StopResolver,
        cancel: &CancelToken,
    ) -> Result<RouteResult> {
        let started = Instant::now();
        self.state = AssemblyState::InsufficientStops;
        let mut warnings = Vec::new();

        if self.boundaries.is_empty() {
            warnings.push(Error::NoBoundaryData.to_string());
        }

        let mut resolved = Vec::with_capacity(stops.len());
        for stop_id in stops {
            match resolver.resolve(stop_id) {
                Some(stop) => resolved.push(stop),
                None => {
                    let suggestions = resolver.suggestions(stop_id);
                    warn!(stop = %stop_id, ?suggestions, "skipping unresolved stop");
                    warnings.push(format!(
                        "skipped unknown stop '{}'{}",
                        stop_id,
                        format_suggestions(&suggestions)
                    ));
                }
            }
        }

        if resolved.len() < 2 {
            return Err(Error::InsufficientStops {
                resolved: resolved.len(),
            });
        }
        for stop in &resolved {
            stop.position.validated()?;
        }

        self.transition(AssemblyState::Assembling);

        let mut legs = Vec::with_capacity(resolved.len() - 1);
        for pair in resolved.windows(2) {
            if cancel.is_cancelled() {
                debug!(planned_legs = legs.len(), "route assembly cancelled");
                return Err(Error::Cancelled);
            }
            legs.push(self.plan_leg(&pair[0], &pair[1])?);
        }

        let mut coordinates: Vec<LatLng> = Vec::new();
        let mut smoothing = SmoothingMetadata::default();
        let mut total_distance_km = 0.0;
        for (i, leg) in legs.iter().enumerate() {
            let skip = if i == 0 { 0 } else { 1 };
            coordinates.extend(leg.coordinates.iter().skip(skip).copied());
            total_distance_km += leg.distance_km;
            if let Some(meta) = &leg.smoothing {
                smoothing.absorb(meta);
            }
            warnings.extend(leg.warnings.iter().cloned());
        }

        let analysis = analyze_turns(&coordinates, &self.config.turns);
        warnings.extend(analysis.warnings(&self.config.turns));

        self.transition(AssemblyState::Complete);

        let result = RouteResult {
            algorithm: self.algorithm,
            stops: resolved,
            coordinates,
            total_distance_km,
            legs,
            smoothing,
            turns: analysis.turns,
            max_turn_angle: analysis.max_turn_angle,
            sharp_turns: analysis.sharp_turns,
            warnings,
        };

        info!(
            legs = result.legs.len(),
            fallback_legs = result.fallback_legs(),
            total_distance_km = result.total_distance_km,
            points = result.coordinates.len(),
            sharp_turns = result.sharp_turns,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "route assembled"
        );
        Ok(result)
    }

    fn plan_leg(&self, from: &ResolvedStop, to: &ResolvedStop) -> Result<RouteLeg> {
        let outcome = search(
            self.grid,
            &self.config.search,
            from.position,
            to.position,
            self.algorithm,
        )?;

        let path = match outcome {
            SearchOutcome::Found(path) => path,
            SearchOutcome::NoPath(reason) => {
                warn!(from = %from.id, to = %to.id, %reason, "no water path; using straight line");
                return Ok(RouteLeg {
                    from: from.id.clone(),
                    to: to.id.clone(),
                    coordinates: vec![from.position, to.position],
                    distance_km: from.position.distance_to(&to.position),
                    grid_trail: Vec::new(),
                    smoothing: None,
                    warnings: vec![format!(
                        "leg {} to {} is a straight line: {}",
                        from.name, to.name, reason
                    )],
                    is_fallback: true,
                    fallback_reason: Some(reason),
                });
            }
        };

        let raw = path.positions();
        let smoothed = smooth(&raw, self.boundaries, &self.config.smoothing);

        let start_spur = path
            .start()
            .map(|p| from.position.distance_to(&p.position()))
            .unwrap_or(0.0);
        let end_spur = path
            .end()
            .map(|p| p.position().distance_to(&to.position))
            .unwrap_or(0.0);
        let distance_km = start_spur + polyline_length_km(&smoothed.points) + end_spur;

        debug!(
            from = %from.id,
            to = %to.id,
            grid_km = path.distance_km,
            distance_km,
            start_spur_km = start_spur,
            end_spur_km = end_spur,
            "leg planned"
        );

        Ok(RouteLeg {
            from: from.id.clone(),
            to: to.id.clone(),
            smoothing: Some(SmoothingMetadata::from_path(&smoothed)),
            coordinates: smoothed.points,
            distance_km,
            grid_trail: path.waypoints.iter().map(|p| p.id).collect(),
            warnings: Vec::new(),
            is_fallback: false,
            fallback_reason: None,
        })
    }
}
