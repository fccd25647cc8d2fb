mod common;

use common::{
    island_ring, lake_engine, load_lake, ISLAND_NORTH, ISLAND_SOUTH, NORTH_MARINA, SOUTH_LANDING,
};
use waterway_lib::{
    coords::polyline_length_km, find_path, search, smooth, LatLng, NoPathReason, RouteAlgorithm,
    SearchConfig, SearchOutcome, SmoothingConfig, TurnPenalties,
};

fn distance_only() -> SearchConfig {
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
fn open_water_run_of_31_km() {
    let engine = lake_engine();
    let direct = SOUTH_LANDING.distance_to(&NORTH_MARINA);
    assert!((direct - 31.3).abs() < 0.1, "fixture distance is {direct}");

    let path = engine
        .find_path(SOUTH_LANDING, NORTH_MARINA)
        .expect("valid coordinates")
        .expect("open water is connected");
    assert!(path.distance_km >= direct - 0.5);
    assert!(path.distance_km <= direct * 1.25);
    assert!(path.cost + 1e-9 >= path.distance_km);

    let raw = path.positions();
    let smoothed = smooth(&raw, &engine.boundaries(), &SmoothingConfig::default());
    assert!(smoothed.points.len() > raw.len());
    assert_eq!(smoothed.land_corrections, 0);
}

#[test]
fn island_crossing_goes_around() {
    let engine = lake_engine();
    let lake = load_lake();
    let island = island_ring(&lake);

    let path = engine
        .find_path(ISLAND_SOUTH, ISLAND_NORTH)
        .unwrap()
        .expect("both sides of the island are connected");

    for waypoint in &path.waypoints {
        assert!(
            !island.contains(waypoint.lat, waypoint.lng),
            "waypoint ({}, {}) inside island",
            waypoint.lat,
            waypoint.lng
        );
    }
    assert!(path.distance_km > ISLAND_SOUTH.distance_to(&ISLAND_NORTH) + 1.0);

    let smoothed = smooth(&path.positions(), &lake, &SmoothingConfig::default());
    for point in &smoothed.points {
        assert!(!island.contains(point.lat, point.lng));
        assert!(lake.is_navigable(point.lat, point.lng));
    }
}

#[test]
fn heuristic_never_overestimates_remaining_distance() {
    let grid = lake_engine().grid();
    let outcome = search(
        &grid,
        &distance_only(),
        ISLAND_SOUTH,
        ISLAND_NORTH,
        RouteAlgorithm::Dijkstra,
    )
    .unwrap();
    let path = outcome.into_path().expect("path exists");
    let positions = path.positions();
    let goal = *positions.last().unwrap();

    for i in 0..positions.len() {
        let remaining = polyline_length_km(&positions[i..]);
        let estimate = positions[i].distance_to(&goal);
        assert!(estimate <= remaining + 1e-9, "estimate {estimate} > remaining {remaining}");
    }
}

#[test]
fn a_star_is_optimal_without_turn_penalties() {
    let grid = lake_engine().grid();
    let config = distance_only();
    let a_star = search(&grid, &config, ISLAND_SOUTH, ISLAND_NORTH, RouteAlgorithm::AStar)
        .unwrap()
        .into_path()
        .unwrap();
    let dijkstra = search(&grid, &config, ISLAND_SOUTH, ISLAND_NORTH, RouteAlgorithm::Dijkstra)
        .unwrap()
        .into_path()
        .unwrap();
    assert!((a_star.cost - dijkstra.cost).abs() < 1e-6);
    assert!(a_star.expanded <= dijkstra.expanded);
}

#[test]
fn searches_are_near_symmetric() {
    let grid = lake_engine().grid();
    let config = SearchConfig::default();
    let forward = find_path(&grid, &config, ISLAND_SOUTH, ISLAND_NORTH).unwrap().unwrap();
    let backward = find_path(&grid, &config, ISLAND_NORTH, ISLAND_SOUTH).unwrap().unwrap();
    let ratio = forward.distance_km / backward.distance_km;
    assert!((0.95..=1.05).contains(&ratio), "ratio {ratio}");
}

#[test]
fn distant_endpoint_is_not_snapped() {
    let grid = lake_engine().grid();
    let outcome = search(
        &grid,
        &SearchConfig::default(),
        SOUTH_LANDING,
        LatLng::new(44.2, -72.9),
        RouteAlgorithm::AStar,
    )
    .unwrap();
    match outcome {
        SearchOutcome::NoPath(NoPathReason::EndpointTooFarFromWater { distance_km, limit_km, .. }) => {
            assert!(distance_km > limit_km);
        }
        other => panic!("unexpected outcome: {:?}", other),
    }
}

#[test]
fn disconnected_water_exhausts_search() {
    let grid = lake_engine().grid();
    let outcome = search(
        &grid,
        &SearchConfig::default(),
        SOUTH_LANDING,
        LatLng::new(44.525, -73.275),
        RouteAlgorithm::AStar,
    )
    .unwrap();
    assert!(matches!(
        outcome,
        SearchOutcome::NoPath(NoPathReason::Exhausted { .. })
    ));
}
