//! Water body outlines and the navigability test.
//!
//! Boundaries arrive as a GeoJSON `FeatureCollection` whose polygons use
//! `[longitude, latitude]` positions. Each polygon becomes a [`WaterBody`]:
//! the first ring is the shoreline, every following ring is an island. A
//! position is navigable when some body contains it in its outer ring and
//! none of that body's islands contain it.
//!
//! The store fails closed: when nothing loads, every position is land.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use tracing::{error, info, warn};

use crate::config::Bounds;
use crate::coords::LatLng;
use crate::error::{Error, Result};
use crate::source::DataSource;

/// Closed polygon ring stored as `(lat, lng)` vertices.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ring {
    points: Vec<LatLng>,
}

impl Ring {
    /// Build a ring from `(lat, lng)` vertices, closing it when needed.
    pub fn new(points: Vec<LatLng>, body: &str) -> Result<Self> {
        let mut points = points;
        if points.iter().any(|p| !p.lat.is_finite() || !p.lng.is_finite()) {
            return Err(Error::InvalidBoundary {
                body: body.to_string(),
                message: "ring contains non-finite coordinates".to_string(),
            });
        }

        if let (Some(first), Some(last)) = (points.first().copied(), points.last().copied()) {
            if first != last {
                points.push(first);
            }
        }

        let mut distinct: Vec<LatLng> = Vec::new();
        for point in &points {
            if !distinct.contains(point) {
                distinct.push(*point);
            }
        }
        if points.len() < 4 || distinct.len() < 3 {
            return Err(Error::InvalidBoundary {
                body: body.to_string(),
                message: format!(
                    "ring needs at least 3 distinct vertices (found {})",
                    distinct.len()
                ),
            });
        }

        Ok(Self { points })
    }

    /// Build a ring from GeoJSON positions (`[lng, lat, ...]`).
    fn from_positions(positions: &[Vec<f64>], body: &str) -> Result<Self> {
        let mut points = Vec::with_capacity(positions.len());
        for position in positions {
            if position.len() < 2 {
                return Err(Error::InvalidBoundary {
                    body: body.to_string(),
                    message: "position with fewer than two components".to_string(),
                });
            }
            points.push(LatLng::new(position[1], position[0]));
        }
        Self::new(points, body)
    }

    pub fn points(&self) -> &[LatLng] {
        &self.points
    }

    /// Ray-casting containment test. Points exactly on an edge may resolve either way.
    pub fn contains(&self, lat: f64, lng: f64) -> bool {
        let pts = &self.points;
        let mut inside = false;
        let mut j = pts.len() - 1;
        for i in 0..pts.len() {
            let (yi, xi) = (pts[i].lat, pts[i].lng);
            let (yj, xj) = (pts[j].lat, pts[j].lng);
            if (yi > lat) != (yj > lat) && lng < (xj - xi) * (lat - yi) / (yj - yi) + xi {
                inside = !inside;
            }
            j = i;
        }
        inside
    }

    fn bounds(&self) -> Bounds {
        // Rings always hold at least four points after validation.
        Bounds::enclosing(self.points.iter()).unwrap_or(Bounds {
            south: 0.0,
            north: 0.0,
            west: 0.0,
            east: 0.0,
        })
    }
}

/// A named navigable area: shoreline plus island holes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WaterBody {
    pub name: String,
    pub outer: Ring,
    pub holes: Vec<Ring>,
    bounds: Bounds,
}

impl WaterBody {
    pub fn new(name: impl Into<String>, outer: Ring, holes: Vec<Ring>) -> Self {
        let bounds = outer.bounds();
        Self {
            name: name.into(),
            outer,
            holes,
            bounds,
        }
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    /// Inside the shoreline and outside every island.
    pub fn accepts(&self, lat: f64, lng: f64) -> bool {
        if !self.bounds.contains(lat, lng) || !self.outer.contains(lat, lng) {
            return false;
        }
        !self.holes.iter().any(|hole| hole.contains(lat, lng))
    }
}

#[derive(Debug, Deserialize)]
struct FeatureCollection {
    #[serde(default)]
    features: Vec<Feature>,
}

#[derive(Debug, Deserialize)]
struct Feature {
    #[serde(default)]
    properties: Option<Map<String, Value>>,
    geometry: Option<Geometry>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum Geometry {
    Polygon {
        coordinates: Vec<Vec<Vec<f64>>>,
    },
    MultiPolygon {
        coordinates: Vec<Vec<Vec<Vec<f64>>>>,
    },
    #[serde(other)]
    Unsupported,
}

/// Immutable collection of water bodies.
#[derive(Debug, Clone)]
pub struct BoundaryStore {
    bodies: Vec<WaterBody>,
    digest: [u8; 32],
}

impl Default for BoundaryStore {
    fn default() -> Self {
        Self::empty()
    }
}

impl BoundaryStore {
    /// Store with no water bodies; every containment query returns `false`.
    pub fn empty() -> Self {
        Self::from_bodies(Vec::new())
    }

    pub fn from_bodies(bodies: Vec<WaterBody>) -> Self {
        let digest = digest_bodies(&bodies);
        Self { bodies, digest }
    }

    /// Parse a GeoJSON feature collection of polygons.
    ///
    /// Features without polygon geometry are skipped with a warning; a malformed
    /// ring rejects the whole source so a half-loaded shoreline never routes.
    pub fn load(source: &dyn DataSource) -> Result<Self> {
        let source_name = source.describe();
        let raw = source.read_to_string()?;
        let collection: FeatureCollection =
            serde_json::from_str(&raw).map_err(|e| Error::BoundaryParse {
                source_name: source_name.clone(),
                message: e.to_string(),
            })?;

        let mut bodies = Vec::new();
        for (index, feature) in collection.features.iter().enumerate() {
            let name = feature_name(feature.properties.as_ref(), index);
            match &feature.geometry {
                Some(Geometry::Polygon { coordinates }) => {
                    bodies.push(polygon_to_body(&name, coordinates)?);
                }
                Some(Geometry::MultiPolygon { coordinates }) => {
                    let multiple = coordinates.len() > 1;
                    for (part, polygon) in coordinates.iter().enumerate() {
                        let part_name = if multiple {
                            format!("{}#{}", name, part + 1)
                        } else {
                            name.clone()
                        };
                        bodies.push(polygon_to_body(&part_name, polygon)?);
                    }
                }
                Some(Geometry::Unsupported) | None => {
                    warn!(feature = %name, source = %source_name, "skipping non-polygon feature");
                }
            }
        }

        let store = Self::from_bodies(bodies);
        info!(
            source = %source_name,
            water_bodies = store.len(),
            islands = store.bodies.iter().map(|b| b.holes.len()).sum::<usize>(),
            "loaded water boundaries"
        );
        if store.is_empty() {
            warn!(source = %source_name, "boundary source contained no water bodies");
        }
        Ok(store)
    }

    /// Load boundaries, degrading to an empty store on failure.
    pub fn load_or_empty(source: &dyn DataSource) -> Self {
        match Self::load(source) {
            Ok(store) => store,
            Err(e) => {
                error!(
                    source = %source.describe(),
                    error = %e,
                    "failed to load water boundaries; all positions will be treated as land"
                );
                Self::empty()
            }
        }
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    pub fn bodies(&self) -> &[WaterBody] {
        &self.bodies
    }

    /// SHA-256 of the normalised bodies, used to fingerprint derived grids.
    pub fn digest(&self) -> [u8; 32] {
        self.digest
    }

    /// Union of all outer ring bounding boxes.
    pub fn bounds(&self) -> Option<Bounds> {
        self.bodies
            .iter()
            .map(WaterBody::bounds)
            .reduce(|acc, b| acc.union(&b))
    }

    pub fn is_navigable(&self, lat: f64, lng: f64) -> bool {
        self.water_body_at(lat, lng).is_some()
    }

    /// Name of the first water body accepting the position.
    pub fn water_body_at(&self, lat: f64, lng: f64) -> Option<&str> {
        if !lat.is_finite() || !lng.is_finite() {
            return None;
        }
        self.bodies
            .iter()
            .find(|body| body.accepts(lat, lng))
            .map(|body| body.name.as_str())
    }
}

fn feature_name(properties: Option<&Map<String, Value>>, index: usize) -> String {
    properties
        .and_then(|props| props.get("name").or_else(|| props.get("NAME")))
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| format!("water-body-{}", index))
}

fn polygon_to_body(name: &str, rings: &[Vec<Vec<f64>>]) -> Result<WaterBody> {
    let Some((outer, holes)) = rings.split_first() else {
        return Err(Error::InvalidBoundary {
            body: name.to_string(),
            message: "polygon has no rings".to_string(),
        });
    };
    let outer = Ring::from_positions(outer, name)?;
    let holes = holes
        .iter()
        .map(|hole| Ring::from_positions(hole, name))
        .collect::<Result<Vec<_>>>()?;
    Ok(WaterBody::new(name, outer, holes))
}

fn digest_bodies(bodies: &[WaterBody]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    for body in bodies {
        hasher.update(body.name.as_bytes());
        hasher.update([0u8]);
        for ring in std::iter::once(&body.outer).chain(body.holes.iter()) {
            hasher.update((ring.points.len() as u64).to_le_bytes());
            for point in &ring.points {
                hasher.update(point.lat.to_le_bytes());
                hasher.update(point.lng.to_le_bytes());
            }
        }
    }
    hasher.finalize().into()
}
