//! Nearest-point index over grid points.
//!
//! The grid builder only needs two operations from an index: bulk loading a
//! fixed set of positions and answering "which loaded position is closest to
//! this one". [`PointIndex`] captures exactly that so the backing structure
//! can change without touching the grid.
//!
//! [`KdPointIndex`] stores each position as a unit vector on the sphere and
//! queries with squared Euclidean distance. Chord length grows monotonically
//! with great-circle distance, so the closest chord is also the closest
//! position by great-circle distance.
//!
//! Lattice points on the same row share an identical `z` component, which the
//! immutable tree tolerates regardless of bucket size.

use kiddo::immutable::float::kdtree::ImmutableKdTree;
use kiddo::SquaredEuclidean;
use tracing::debug;

use crate::coords::LatLng;

/// KD-tree bucket size (kiddo default).
const BUCKET_SIZE: usize = 32;

/// Minimal bulk-load / nearest interface for grid lookups.
pub trait PointIndex: Send + Sync {
    /// Build an index over `points`; results refer to positions in this slice.
    fn bulk_load(points: &[LatLng]) -> Self
    where
        Self: Sized;

    /// Slice position of the indexed point closest to `point`.
    fn nearest(&self, point: LatLng) -> Option<usize>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// KD-tree backed [`PointIndex`].
pub struct KdPointIndex {
    tree: Option<ImmutableKdTree<f64, u64, 3, BUCKET_SIZE>>,
    len: usize,
}

impl PointIndex for KdPointIndex {
    fn bulk_load(points: &[LatLng]) -> Self {
        if points.is_empty() {
            return Self { tree: None, len: 0 };
        }

        let coords: Vec<[f64; 3]> = points.iter().map(LatLng::to_unit_vector).collect();
        let tree = ImmutableKdTree::new_from_slice(&coords);
        debug!(node_count = coords.len(), "built grid spatial index");

        Self {
            tree: Some(tree),
            len: coords.len(),
        }
    }

    fn nearest(&self, point: LatLng) -> Option<usize> {
        let tree = self.tree.as_ref()?;
        let query = point.to_unit_vector();
        let neighbour = tree.nearest_one::<SquaredEuclidean>(&query);
        Some(neighbour.item as usize)
    }

    fn len(&self) -> usize {
        self.len
    }
}

impl std::fmt::Debug for KdPointIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KdPointIndex")
            .field("node_count", &self.len)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_index_returns_none() {
        let index = KdPointIndex::bulk_load(&[]);
        assert!(index.is_empty());
        assert_eq!(index.nearest(LatLng::new(44.0, -73.0)), None);
    }

    #[test]
    fn nearest_matches_brute_force() {
        let mut points = Vec::new();
        for row in 0..40 {
            for col in 0..40 {
                points.push(LatLng::new(44.0 + row as f64 * 0.0018, -73.4 + col as f64 * 0.0024));
            }
        }
        let index = KdPointIndex::bulk_load(&points);
        assert_eq!(index.len(), points.len());

        for query in [
            LatLng::new(44.0101, -73.3712),
            LatLng::new(43.9, -73.5),
            LatLng::new(44.05, -73.31),
        ] {
            let expected = points
                .iter()
                .enumerate()
                .min_by(|a, b| {
                    a.1.distance_to(&query)
                        .total_cmp(&b.1.distance_to(&query))
                })
                .map(|(i, _)| i)
                .unwrap();
            let found = index.nearest(query).expect("non-empty");
            let d_expected = points[expected].distance_to(&query);
            let d_found = points[found].distance_to(&query);
            assert!((d_expected - d_found).abs() < 1e-9);
        }
    }
}
