//! Turning a stair-stepped grid path into a smooth line.
//!
//! Three stages run in order:
//!
//! 1. Douglas-Peucker simplification drops lattice jitter.
//! 2. A cardinal spline through the remaining points is sampled at a roughly
//!    constant spacing. The spline passes through every control point, so the
//!    first and last grid waypoints survive unchanged.
//! 3. Every sample is re-checked against the boundaries. A sample that drifted
//!    onto land is replaced by the closest raw grid waypoint.
//!
//! Smoothing never fails; at worst it hands back the raw waypoints.

use geo::{Coord, LineString, Simplify};
use serde::Serialize;
use tracing::debug;

use crate::boundary::BoundaryStore;
use crate::config::SmoothingConfig;
use crate::coords::LatLng;

/// Output of [`smooth`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SmoothedPath {
    pub points: Vec<LatLng>,
    /// Samples that landed on land and were pulled back to a raw waypoint.
    pub land_corrections: usize,
    pub original_count: usize,
    pub simplified_count: usize,
}

/// Simplify, spline and revalidate a raw grid path.
pub fn smooth(raw: &[LatLng], boundaries: &BoundaryStore, config: &SmoothingConfig) -> SmoothedPath {
    if raw.len() < 2 {
        return SmoothedPath {
            points: raw.to_vec(),
            land_corrections: 0,
            original_count: raw.len(),
            simplified_count: raw.len(),
        };
    }

    let simplified = simplify(raw, config.simplify_tolerance_deg);
    let samples = cardinal_spline(&simplified, config);
    let (points, land_corrections) = revalidate(samples, raw, boundaries);

    debug!(
        original = raw.len(),
        simplified = simplified.len(),
        smoothed = points.len(),
        land_corrections,
        "smoothed path"
    );

    SmoothedPath {
        points,
        land_corrections,
        original_count: raw.len(),
        simplified_count: simplified.len(),
    }
}

/// Douglas-Peucker simplification in degree space.
pub fn simplify(points: &[LatLng], tolerance_deg: f64) -> Vec<LatLng> {
    if points.len() < 3 || tolerance_deg <= 0.0 {
        return points.to_vec();
    }

    let line: LineString<f64> = points
        .iter()
        .map(|p| Coord { x: p.lng, y: p.lat })
        .collect();
    let simplified = line.simplify(&tolerance_deg);

    simplified
        .0
        .into_iter()
        .map(|c| LatLng::new(c.y, c.x))
        .collect()
}

/// Sample a cardinal spline through `controls`.
///
/// Tangents are `(1 - tension) * (next - previous) / 2`, with the endpoints
/// duplicated as phantom neighbours. Each segment gets
/// `ceil(length / sample_spacing_km)` steps, clamped to the configured range.
pub fn cardinal_spline(controls: &[LatLng], config: &SmoothingConfig) -> Vec<LatLng> {
    if controls.len() < 2 {
        return controls.to_vec();
    }

    let scale = (1.0 - config.tension.clamp(0.0, 1.0)) / 2.0;
    let last = controls.len() - 1;
    let tangent = |i: usize| {
        let prev = controls[i.saturating_sub(1)];
        let next = controls[(i + 1).min(last)];
        (
            scale * (next.lat - prev.lat),
            scale * (next.lng - prev.lng),
        )
    };

    let mut samples = Vec::new();
    for i in 0..last {
        let p0 = controls[i];
        let p1 = controls[i + 1];
        let m0 = tangent(i);
        let m1 = tangent(i + 1);

        let steps = segment_steps(p0.distance_to(&p1), config);
        for step in 0..steps {
            let t = step as f64 / steps as f64;
            let t2 = t * t;
            let t3 = t2 * t;
            let h00 = 2.0 * t3 - 3.0 * t2 + 1.0;
            let h10 = t3 - 2.0 * t2 + t;
            let h01 = -2.0 * t3 + 3.0 * t2;
            let h11 = t3 - t2;
            samples.push(LatLng::new(
                h00 * p0.lat + h10 * m0.0 + h01 * p1.lat + h11 * m1.0,
                h00 * p0.lng + h10 * m0.1 + h01 * p1.lng + h11 * m1.1,
            ));
        }
    }
    samples.push(controls[last]);
    samples
}

fn segment_steps(length_km: f64, config: &SmoothingConfig) -> usize {
    let wanted = (length_km / config.sample_spacing_km).ceil();
    let wanted = if wanted.is_finite() { wanted as usize } else { 0 };
    wanted.clamp(config.min_samples_per_segment, config.max_samples_per_segment)
}

fn revalidate(
    samples: Vec<LatLng>,
    raw: &[LatLng],
    boundaries: &BoundaryStore,
) -> (Vec<LatLng>, usize) {
    let mut points: Vec<LatLng> = Vec::with_capacity(samples.len());
    let mut corrections = 0usize;
    let mut last_good: Option<LatLng> = None;

    for sample in samples {
        let accepted = if boundaries.is_navigable(sample.lat, sample.lng) {
            last_good = Some(sample);
            Some(sample)
        } else {
            corrections += 1;
            nearest_of(raw, sample).or(last_good)
        };

        if let Some(point) = accepted {
            if points.last() != Some(&point) {
                points.push(point);
            }
        }
    }

    (points, corrections)
}

fn nearest_of(candidates: &[LatLng], target: LatLng) -> Option<LatLng> {
    candidates
        .iter()
        .min_by(|a, b| a.distance_to(&target).total_cmp(&b.distance_to(&target)))
        .copied()
}
