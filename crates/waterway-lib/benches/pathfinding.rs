use criterion::{criterion_group, criterion_main, Criterion};
use once_cell::sync::Lazy;
use std::hint::black_box;
use std::path::PathBuf;
use std::sync::Arc;
use waterway_lib::{
    build_grid, search, BoundaryStore, DepthStore, FileSource, GridConfig, GridSnapshot, LatLng,
    RouteAlgorithm, RoutingConfig, RoutingEngine, SearchConfig, VesselProfile,
};

fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../../docs/fixtures")
        .join(name)
}

static LAKE: Lazy<BoundaryStore> = Lazy::new(|| {
    BoundaryStore::load(&FileSource::new(fixture_path("test_lake.geojson"))).expect("fixture loads")
});
static DEPTHS: Lazy<DepthStore> = Lazy::new(|| {
    DepthStore::load(&FileSource::new(fixture_path("test_depths.json"))).expect("fixture loads")
});
static GRID: Lazy<Arc<GridSnapshot>> = Lazy::new(|| {
    RoutingEngine::new(RoutingConfig::default(), LAKE.clone(), DEPTHS.clone())
        .expect("default config is valid")
        .grid()
});

const ISLAND_SOUTH: LatLng = LatLng::new(44.12, -73.30);
const ISLAND_NORTH: LatLng = LatLng::new(44.28, -73.30);

fn benchmark_pathfinding(c: &mut Criterion) {
    let grid = &**GRID;
    let config = SearchConfig::default();

    c.bench_function("astar_around_island", |b| {
        b.iter(|| {
            let outcome = search(grid, &config, ISLAND_SOUTH, ISLAND_NORTH, RouteAlgorithm::AStar)
                .expect("valid coordinates");
            black_box(outcome.into_path().map(|path| path.expanded))
        });
    });

    c.bench_function("dijkstra_around_island", |b| {
        b.iter(|| {
            let outcome = search(
                grid,
                &config,
                ISLAND_SOUTH,
                ISLAND_NORTH,
                RouteAlgorithm::Dijkstra,
            )
            .expect("valid coordinates");
            black_box(outcome.into_path().map(|path| path.expanded))
        });
    });

    c.bench_function("nearest_grid_point", |b| {
        b.iter(|| black_box(grid.nearest(44.2011, -73.3519).map(|(point, _)| point.id)));
    });
}

fn benchmark_grid_build(c: &mut Criterion) {
    let lake = &*LAKE;
    let depths = &*DEPTHS;
    let profile = VesselProfile::default();
    let config = GridConfig::default();

    let mut group = c.benchmark_group("grid");
    group.sample_size(10);
    group.bench_function("build_test_lake", |b| {
        b.iter(|| black_box(build_grid(&config, lake, depths, &profile).len()));
    });
    group.finish();
}

criterion_group!(benches, benchmark_pathfinding, benchmark_grid_build);
criterion_main!(benches);
