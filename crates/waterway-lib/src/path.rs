//! Grid search: A* and Dijkstra with turn penalties between grid points.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::fmt;
use std::str::FromStr;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::SearchConfig;
use crate::coords::{bearing_change_deg, polyline_length_km, LatLng};
use crate::error::{Error, Result};
use crate::grid::{GridPoint, GridSnapshot};

/// Search strategy used by [`search`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RouteAlgorithm {
    /// Great-circle heuristic towards the goal.
    #[default]
    AStar,
    /// Zero heuristic; explores uniformly and serves as a reference for A*.
    Dijkstra,
}

impl fmt::Display for RouteAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouteAlgorithm::AStar => write!(f, "a-star"),
            RouteAlgorithm::Dijkstra => write!(f, "dijkstra"),
        }
    }
}

impl FromStr for RouteAlgorithm {
    type Err = String;

    fn from_str(value: &str) -> std::result::Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "a-star" | "astar" | "a*" => Ok(RouteAlgorithm::AStar),
            "dijkstra" => Ok(RouteAlgorithm::Dijkstra),
            other => Err(format!("unknown routing algorithm '{}'", other)),
        }
    }
}

/// Sequence of grid points connecting two snapped endpoints.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GridPath {
    pub waypoints: Vec<GridPoint>,
    /// Geometric length of the waypoint polyline.
    pub distance_km: f64,
    /// Search cost, i.e. length plus turn penalties.
    pub cost: f64,
    /// Number of nodes expanded by the search.
    pub expanded: usize,
}

impl GridPath {
    pub fn positions(&self) -> Vec<LatLng> {
        self.waypoints.iter().map(GridPoint::position).collect()
    }

    pub fn start(&self) -> Option<&GridPoint> {
        self.waypoints.first()
    }

    pub fn end(&self) -> Option<&GridPoint> {
        self.waypoints.last()
    }
}

/// Why a search produced no path.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum NoPathReason {
    /// The grid has no navigable points.
    EmptyGrid,
    /// An endpoint is farther from the grid than the snap radius allows.
    EndpointTooFarFromWater {
        endpoint: LatLng,
        distance_km: f64,
        limit_km: f64,
    },
    /// The open set ran dry before the goal was reached.
    Exhausted { expanded: usize },
}

impl NoPathReason {
    /// Convert into the error reported when a caller insists on a water path.
    pub fn into_error(self, from: &str, to: &str) -> Error {
        match self {
            NoPathReason::EmptyGrid => Error::NoBoundaryData,
            NoPathReason::EndpointTooFarFromWater {
                endpoint,
                distance_km,
                limit_km,
            } => Error::EndpointTooFarFromWater {
                lat: endpoint.lat,
                lng: endpoint.lng,
                distance_km,
                limit_km,
            },
            NoPathReason::Exhausted { .. } => Error::NoPathFound {
                from: from.to_string(),
                to: to.to_string(),
            },
        }
    }
}

impl fmt::Display for NoPathReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NoPathReason::EmptyGrid => write!(f, "no navigable grid is available"),
            NoPathReason::EndpointTooFarFromWater {
                endpoint,
                distance_km,
                limit_km,
            } => write!(
                f,
                "{} is {:.2} km from navigable water (limit {:.2} km)",
                endpoint, distance_km, limit_km
            ),
            NoPathReason::Exhausted { expanded } => write!(
                f,
                "no connected water path (searched {} grid points)",
                expanded
            ),
        }
    }
}

/// Result of a single grid search.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    Found(GridPath),
    NoPath(NoPathReason),
}

impl SearchOutcome {
    pub fn into_path(self) -> Option<GridPath> {
        match self {
            SearchOutcome::Found(path) => Some(path),
            SearchOutcome::NoPath(_) => None,
        }
    }
}

/// Find a path between two positions with A*.
///
/// Returns `Ok(None)` when the positions cannot be connected over water and an
/// error only for unusable coordinates.
pub fn find_path(
    grid: &GridSnapshot,
    config: &SearchConfig,
    start: LatLng,
    end: LatLng,
) -> Result<Option<GridPath>> {
    Ok(search(grid, config, start, end, RouteAlgorithm::AStar)?.into_path())
}

/// Snap both positions to the grid and search between them.
///
/// Edge cost is the great-circle length of the step plus a penalty for the
/// course change relative to the step that reached the current point. State
/// is tracked per grid point only, so the turn term is a heuristic bias rather
/// than an exact optimum over (point, heading) pairs.
pub fn search(
    grid: &GridSnapshot,
    config: &SearchConfig,
    start: LatLng,
    end: LatLng,
    algorithm: RouteAlgorithm,
) -> Result<SearchOutcome> {
    let start = start.validated()?;
    let end = end.validated()?;

    if grid.is_empty() {
        return Ok(SearchOutcome::NoPath(NoPathReason::EmptyGrid));
    }

    let start_index = match snap(grid, start, config.max_snap_radius_km) {
        Ok(index) => index,
        Err(reason) => return Ok(SearchOutcome::NoPath(reason)),
    };
    let goal_index = match snap(grid, end, config.max_snap_radius_km) {
        Ok(index) => index,
        Err(reason) => return Ok(SearchOutcome::NoPath(reason)),
    };

    let started = Instant::now();
    let outcome = run_search(grid, config, start_index, goal_index, algorithm);
    match &outcome {
        SearchOutcome::Found(path) => debug!(
            %algorithm,
            waypoints = path.waypoints.len(),
            distance_km = path.distance_km,
            expanded = path.expanded,
            elapsed_us = started.elapsed().as_micros() as u64,
            "grid path found"
        ),
        SearchOutcome::NoPath(reason) => debug!(%algorithm, %reason, "grid search failed"),
    }
    Ok(outcome)
}

fn snap(
    grid: &GridSnapshot,
    position: LatLng,
    limit_km: f64,
) -> std::result::Result<usize, NoPathReason> {
    let index = grid.nearest_index(position).ok_or(NoPathReason::EmptyGrid)?;
    let distance_km = grid.points()[index].position().distance_to(&position);
    if distance_km > limit_km {
        return Err(NoPathReason::EndpointTooFarFromWater {
            endpoint: position,
            distance_km,
            limit_km,
        });
    }
    Ok(index)
}

fn run_search(
    grid: &GridSnapshot,
    config: &SearchConfig,
    start: usize,
    goal: usize,
    algorithm: RouteAlgorithm,
) -> SearchOutcome {
    let points = grid.points();
    if start == goal {
        return SearchOutcome::Found(GridPath {
            waypoints: vec![points[start].clone()],
            distance_km: 0.0,
            cost: 0.0,
            expanded: 0,
        });
    }

    let goal_position = points[goal].position();
    let heuristic = |index: usize| match algorithm {
        RouteAlgorithm::AStar => points[index].position().distance_to(&goal_position),
        RouteAlgorithm::Dijkstra => 0.0,
    };

    let mut g_score = vec![f64::INFINITY; points.len()];
    let mut parents: Vec<Option<usize>> = vec![None; points.len()];
    let mut closed = vec![false; points.len()];
    let mut queue = BinaryHeap::new();
    let mut sequence = 0u64;
    let mut expanded = 0usize;

    g_score[start] = 0.0;
    queue.push(AStarEntry::new(start, 0.0, heuristic(start), sequence));

    while let Some(entry) = queue.pop() {
        if closed[entry.node] || entry.cost.0 > g_score[entry.node] {
            continue;
        }
        closed[entry.node] = true;
        expanded += 1;

        if entry.node == goal {
            let waypoints: Vec<GridPoint> = reconstruct_path(&parents, start, goal)
                .into_iter()
                .map(|i| points[i].clone())
                .collect();
            let positions: Vec<LatLng> = waypoints.iter().map(GridPoint::position).collect();
            return SearchOutcome::Found(GridPath {
                distance_km: polyline_length_km(&positions),
                cost: g_score[goal],
                waypoints,
                expanded,
            });
        }

        let current = points[entry.node].position();
        let incoming_bearing = parents[entry.node].map(|p| points[p].position().bearing_to(&current));

        for next in grid.neighbor_indices(entry.node) {
            if closed[next] {
                continue;
            }
            let next_position = points[next].position();
            let step_km = current.distance_to(&next_position);
            let penalty = match incoming_bearing {
                Some(bearing) => config
                    .turn_penalties
                    .penalty(bearing_change_deg(bearing, current.bearing_to(&next_position))),
                None => 0.0,
            };

            let tentative_g = g_score[entry.node] + step_km + penalty;
            if tentative_g < g_score[next] {
                g_score[next] = tentative_g;
                parents[next] = Some(entry.node);
                sequence += 1;
                queue.push(AStarEntry::new(next, tentative_g, heuristic(next), sequence));
            }
        }
    }

    SearchOutcome::NoPath(NoPathReason::Exhausted { expanded })
}

fn reconstruct_path(parents: &[Option<usize>], start: usize, goal: usize) -> Vec<usize> {
    let mut path = Vec::new();
    let mut current = Some(goal);
    while let Some(node) = current {
        path.push(node);
        if node == start {
            break;
        }
        current = parents[node];
    }
    path.reverse();
    path
}

#[derive(Copy, Clone, Debug, Default)]
struct FloatOrd(f64);

impl PartialEq for FloatOrd {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for FloatOrd {}

impl PartialOrd for FloatOrd {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FloatOrd {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
struct AStarEntry {
    node: usize,
    cost: FloatOrd,
    estimate: FloatOrd,
    sequence: u64,
}

impl AStarEntry {
    fn new(node: usize, cost: f64, heuristic: f64, sequence: u64) -> Self {
        Self {
            node,
            cost: FloatOrd(cost),
            estimate: FloatOrd(cost + heuristic),
            sequence,
        }
    }
}

impl Ord for AStarEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering so BinaryHeap becomes a min-heap by estimate; equal
        // estimates pop in insertion order.
        other
            .estimate
            .cmp(&self.estimate)
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}

impl PartialOrd for AStarEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TurnPenalties;
    use crate::error::Error;
    use crate::test_helpers::{island_grid, island_lake};

    fn no_penalties() -> SearchConfig {
        SearchConfig {
            turn_penalties: TurnPenalties {
                gentle: 0.0,
                moderate: 0.0,
                large: 0.0,
                severe: 0.0,
            },
            ..SearchConfig::default()
        }
    }

    #[test]
    fn straight_run_along_open_water() {
        let grid = island_grid();
        let path = find_path(
            &grid,
            &SearchConfig::default(),
            LatLng::new(0.0015, 0.0015),
            LatLng::new(0.0015, 0.0185),
        )
        .expect("valid coordinates")
        .expect("path exists");

        assert_eq!(path.waypoints.len(), 18);
        let direct = LatLng::new(0.0015, 0.0015).distance_to(&LatLng::new(0.0015, 0.0185));
        assert!((path.distance_km - direct).abs() < 1e-6);
        assert!((path.cost - path.distance_km).abs() < 1e-9);
    }

    #[test]
    fn path_goes_around_the_island() {
        let grid = island_grid();
        let lake = island_lake();
        let path = find_path(
            &grid,
            &SearchConfig::default(),
            LatLng::new(0.0035, 0.0105),
            LatLng::new(0.0165, 0.0105),
        )
        .unwrap()
        .expect("path exists");

        for window in path.waypoints.windows(2) {
            assert!((window[0].row as i64 - window[1].row as i64).abs() <= 1);
            assert!((window[0].col as i64 - window[1].col as i64).abs() <= 1);
        }
        for point in &path.waypoints {
            assert!(lake.is_navigable(point.lat, point.lng));
        }
        let direct = LatLng::new(0.0035, 0.0105).distance_to(&LatLng::new(0.0165, 0.0105));
        assert!(path.distance_km > direct);
    }

    #[test]
    fn a_star_matches_dijkstra_cost() {
        let grid = island_grid();
        let config = no_penalties();
        let start = LatLng::new(0.0025, 0.0045);
        let end = LatLng::new(0.0185, 0.0155);

        let a_star = search(&grid, &config, start, end, RouteAlgorithm::AStar)
            .unwrap()
            .into_path()
            .expect("a* path");
        let dijkstra = search(&grid, &config, start, end, RouteAlgorithm::Dijkstra)
            .unwrap()
            .into_path()
            .expect("dijkstra path");

        assert!((a_star.cost - dijkstra.cost).abs() < 1e-9);
        assert!(a_star.expanded <= dijkstra.expanded);
    }

    #[test]
    fn turn_penalties_raise_cost_above_distance() {
        let grid = island_grid();
        let path = find_path(
            &grid,
            &SearchConfig::default(),
            LatLng::new(0.0035, 0.0105),
            LatLng::new(0.0165, 0.0105),
        )
        .unwrap()
        .expect("path exists");
        assert!(path.cost > path.distance_km);
    }

    #[test]
    fn same_cell_yields_single_waypoint() {
        let grid = island_grid();
        let path = find_path(
            &grid,
            &SearchConfig::default(),
            LatLng::new(0.0015, 0.0015),
            LatLng::new(0.00151, 0.00149),
        )
        .unwrap()
        .expect("path exists");
        assert_eq!(path.waypoints.len(), 1);
        assert_eq!(path.distance_km, 0.0);
    }

    #[test]
    fn far_endpoint_is_reported() {
        let grid = island_grid();
        let outcome = search(
            &grid,
            &SearchConfig::default(),
            LatLng::new(0.0015, 0.0015),
            LatLng::new(1.0, 1.0),
            RouteAlgorithm::AStar,
        )
        .unwrap();
        match outcome {
            SearchOutcome::NoPath(reason @ NoPathReason::EndpointTooFarFromWater { .. }) => {
                match reason.into_error("dock", "offshore") {
                    Error::EndpointTooFarFromWater { lat, limit_km, .. } => {
                        assert_eq!(lat, 1.0);
                        assert_eq!(limit_km, 5.0);
                    }
                    other => panic!("unexpected error: {other}"),
                }
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[test]
    fn invalid_coordinates_are_errors() {
        let grid = island_grid();
        let err = find_path(
            &grid,
            &SearchConfig::default(),
            LatLng::new(f64::NAN, 0.0),
            LatLng::new(0.0015, 0.0015),
        )
        .unwrap_err();
        assert!(matches!(err, Error::InvalidCoordinates { .. }));

        let err = find_path(
            &grid,
            &SearchConfig::default(),
            LatLng::new(0.0, 0.0),
            LatLng::new(91.0, 0.0),
        )
        .unwrap_err();
        assert!(matches!(err, Error::InvalidCoordinates { .. }));
    }

    #[test]
    fn empty_grid_has_no_path() {
        let grid = GridSnapshot::from_parts(None, Vec::new(), 2.5, [0u8; 32]);
        let outcome = search(
            &grid,
            &SearchConfig::default(),
            LatLng::new(0.0, 0.0),
            LatLng::new(0.01, 0.01),
            RouteAlgorithm::AStar,
        )
        .unwrap();
        assert_eq!(outcome, SearchOutcome::NoPath(NoPathReason::EmptyGrid));
    }

    #[test]
    fn disconnected_components_exhaust_the_search() {
        use crate::boundary::{BoundaryStore, WaterBody};
        use crate::depth::DepthStore;
        use crate::grid::build_grid;
        use crate::test_helpers::{fine_grid_config, rect_ring};
        use crate::vessel::VesselProfile;

        let lakes = BoundaryStore::from_bodies(vec![
            WaterBody::new("west", rect_ring(0.0, 0.02, 0.0, 0.008, "west"), Vec::new()),
            WaterBody::new("east", rect_ring(0.0, 0.02, 0.012, 0.02, "east"), Vec::new()),
        ]);
        let grid = build_grid(
            &fine_grid_config(),
            &lakes,
            &DepthStore::empty(),
            &VesselProfile::default(),
        );
        let outcome = search(
            &grid,
            &SearchConfig::default(),
            LatLng::new(0.0105, 0.0035),
            LatLng::new(0.0105, 0.0165),
            RouteAlgorithm::AStar,
        )
        .unwrap();
        match outcome {
            SearchOutcome::NoPath(NoPathReason::Exhausted { expanded }) => {
                assert_eq!(expanded, grid.len() / 2)
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[test]
    fn algorithm_names_round_trip_through_display() {
        for algorithm in [RouteAlgorithm::AStar, RouteAlgorithm::Dijkstra] {
            assert_eq!(algorithm.to_string().parse::<RouteAlgorithm>(), Ok(algorithm));
        }
    }
}
