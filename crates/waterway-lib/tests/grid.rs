mod common;

use common::{lake_engine, load_depths, load_lake};
use waterway_lib::{build_grid, GridConfig, GridLayout, VesselProfile};

#[test]
fn every_grid_point_is_navigable_and_deep_enough() {
    let lake = load_lake();
    let depths = load_depths();
    let profile = VesselProfile::default();
    let grid = build_grid(&GridConfig::default(), &lake, &depths, &profile);

    assert!(!grid.is_empty());
    for point in grid.points() {
        assert!(lake.is_navigable(point.lat, point.lng), "({}, {})", point.lat, point.lng);
        if let Some(depth) = point.depth_meters {
            assert!(depth >= profile.minimum_safe_depth());
        }
        if let Some(depth) = depths.depth_near(point.lat, point.lng) {
            assert!(depth >= profile.minimum_safe_depth());
        }
    }
}

#[test]
fn lattice_follows_boundary_outline() {
    let lake = load_lake();
    let layout = GridLayout::resolve(&GridConfig::default(), &lake).expect("layout");
    assert_eq!(layout.rows, 306);
    assert_eq!(layout.cols, 84);
    let corner = layout.coordinate(50, 10);
    assert_eq!((corner.lat, corner.lng), (44.09, -73.376));
}

#[test]
fn shallow_soundings_follow_vessel_profile() {
    let engine = lake_engine();
    let layout = GridLayout::resolve(&engine.config().grid, &engine.boundaries()).unwrap();

    let grid = engine.grid();
    assert!(!grid.contains_cell(50, 10), "1.2 m sounding excluded for 2.5 m minimum");
    assert!(!grid.contains_cell(51, 10), "2.2 m sounding excluded for 2.5 m minimum");
    let deep = grid.point(grid.index_of_cell(50, 11).unwrap()).unwrap();
    assert_eq!(deep.depth_meters, Some(8.0));

    assert_eq!(engine.set_vessel_profile(1.0, 0.5).unwrap(), 1.5);
    let grid = engine.grid();
    assert!(!grid.contains_cell(50, 10));
    assert!(grid.contains_cell(51, 10));
    assert_eq!(grid.minimum_safe_depth(), 1.5);

    assert_eq!(engine.set_vessel_profile(0.5, 0.5).unwrap(), 1.0);
    let grid = engine.grid();
    assert!(grid.contains_cell(50, 10));
    assert_eq!(layout.coordinate(50, 10), grid.point(grid.index_of_cell(50, 10).unwrap()).unwrap().position());
}

#[test]
fn neighbours_are_adjacent_cells() {
    let grid = lake_engine().grid();
    for point in grid.points().iter().step_by(97) {
        let neighbours = grid.neighbors(point);
        assert!(neighbours.len() <= 8);
        for n in neighbours {
            assert!((n.row as i64 - point.row as i64).abs() <= 1);
            assert!((n.col as i64 - point.col as i64).abs() <= 1);
            assert_ne!((n.row, n.col), (point.row, point.col));
        }
    }
}

#[test]
fn nearest_uses_great_circle_distance() {
    let grid = lake_engine().grid();
    let (point, distance) = grid.nearest(44.05, -73.38).expect("grid not empty");
    assert_eq!((point.row, point.col), (28, 8));
    assert!(distance < 0.2);

    let brute = grid
        .points()
        .iter()
        .map(|p| p.position().distance_to(&waterway_lib::LatLng::new(44.05, -73.38)))
        .fold(f64::INFINITY, f64::min);
    assert!((brute - distance).abs() < 1e-9);
}
