//! Turning stop identifiers into positions.
//!
//! The planner does not own a catalogue of places. Callers hand it a
//! [`StopResolver`]; the stock implementations cover a JSON stop directory,
//! literal `"lat,lng"` strings, and a chain that tries several in order.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::coords::LatLng;
use crate::error::{Error, Result};
use crate::source::DataSource;

/// Minimum Jaro-Winkler similarity for a name to be offered as a suggestion.
const SUGGESTION_THRESHOLD: f64 = 0.8;

/// A stop identifier resolved to a position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedStop {
    pub id: String,
    pub name: String,
    #[serde(flatten)]
    pub position: LatLng,
}

/// Lookup from stop identifier to position.
pub trait StopResolver: Send + Sync {
    fn resolve(&self, stop_id: &str) -> Option<ResolvedStop>;

    /// Close matches for an identifier that failed to resolve.
    fn suggestions(&self, _stop_id: &str) -> Vec<String> {
        Vec::new()
    }
}

/// Named stops loaded from a JSON array of `{ "id", "name", "lat", "lng" }`.
#[derive(Debug, Clone, Default)]
pub struct StopDirectory {
    stops: Vec<ResolvedStop>,
    by_id: HashMap<String, usize>,
    by_name: HashMap<String, usize>,
}

impl StopDirectory {
    pub fn from_stops(stops: Vec<ResolvedStop>) -> Self {
        let mut by_id = HashMap::new();
        let mut by_name = HashMap::new();
        for (index, stop) in stops.iter().enumerate() {
            by_id.insert(stop.id.clone(), index);
            by_name.entry(stop.name.to_lowercase()).or_insert(index);
        }
        Self {
            stops,
            by_id,
            by_name,
        }
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let stops: Vec<ResolvedStop> =
            serde_json::from_str(raw).map_err(|e| Error::StopDirectoryParse {
                message: e.to_string(),
            })?;
        Ok(Self::from_stops(stops))
    }

    pub fn load(source: &dyn DataSource) -> Result<Self> {
        let directory = Self::from_json(&source.read_to_string()?)?;
        info!(
            source = %source.describe(),
            stops = directory.len(),
            "loaded stop directory"
        );
        Ok(directory)
    }

    pub fn len(&self) -> usize {
        self.stops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stops.is_empty()
    }

    pub fn stops(&self) -> &[ResolvedStop] {
        &self.stops
    }

    /// Up to `limit` stop ids whose id or name resembles `query`, best first.
    pub fn fuzzy_matches(&self, query: &str, limit: usize) -> Vec<String> {
        let query = query.to_lowercase();
        let mut scored: Vec<(f64, &str)> = self
            .stops
            .iter()
            .map(|stop| {
                let by_id = strsim::jaro_winkler(&query, &stop.id.to_lowercase());
                let by_name = strsim::jaro_winkler(&query, &stop.name.to_lowercase());
                (by_id.max(by_name), stop.id.as_str())
            })
            .filter(|(score, _)| *score >= SUGGESTION_THRESHOLD)
            .collect();
        scored.sort_by(|a, b| b.0.total_cmp(&a.0).then_with(|| a.1.cmp(b.1)));
        scored
            .into_iter()
            .take(limit)
            .map(|(_, id)| id.to_string())
            .collect()
    }
}

impl StopResolver for StopDirectory {
    fn resolve(&self, stop_id: &str) -> Option<ResolvedStop> {
        self.by_id
            .get(stop_id)
            .or_else(|| self.by_name.get(&stop_id.to_lowercase()))
            .map(|&index| self.stops[index].clone())
    }

    fn suggestions(&self, stop_id: &str) -> Vec<String> {
        self.fuzzy_matches(stop_id, 3)
    }
}

/// Resolves literal `"lat,lng"` identifiers. Range checks are left to the planner.
#[derive(Debug, Clone, Copy, Default)]
pub struct CoordinateResolver;

impl CoordinateResolver {
    pub fn parse(stop_id: &str) -> Option<LatLng> {
        let (lat, lng) = stop_id.split_once(',')?;
        let lat = lat.trim().parse::<f64>().ok()?;
        let lng = lng.trim().parse::<f64>().ok()?;
        Some(LatLng::new(lat, lng))
    }
}

impl StopResolver for CoordinateResolver {
    fn resolve(&self, stop_id: &str) -> Option<ResolvedStop> {
        let position = Self::parse(stop_id)?;
        Some(ResolvedStop {
            id: stop_id.to_string(),
            name: position.to_string(),
            position,
        })
    }
}

/// Tries each resolver in turn; the first hit wins.
#[derive(Default)]
pub struct ChainResolver {
    resolvers: Vec<Box<dyn StopResolver>>,
}

impl ChainResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, resolver: impl StopResolver + 'static) -> Self {
        self.resolvers.push(Box::new(resolver));
        self
    }
}

impl StopResolver for ChainResolver {
    fn resolve(&self, stop_id: &str) -> Option<ResolvedStop> {
        self.resolvers.iter().find_map(|r| r.resolve(stop_id))
    }

    fn suggestions(&self, stop_id: &str) -> Vec<String> {
        let mut suggestions: Vec<String> = Vec::new();
        for resolver in &self.resolvers {
            for suggestion in resolver.suggestions(stop_id) {
                if !suggestions.contains(&suggestion) {
                    suggestions.push(suggestion);
                }
            }
        }
        suggestions
    }
}

impl std::fmt::Debug for ChainResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChainResolver")
            .field("resolvers", &self.resolvers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DIRECTORY: &str = r#"[
        { "id": "north-harbor", "name": "North Harbor", "lat": 0.0185, "lng": 0.0105 },
        { "id": "south-cove", "name": "South Cove", "lat": 0.0015, "lng": 0.0105 }
    ]"#;

    #[test]
    fn resolves_by_id_and_name() {
        let directory = StopDirectory::from_json(DIRECTORY).expect("parses");
        assert_eq!(directory.len(), 2);
        let by_id = directory.resolve("north-harbor").expect("by id");
        assert_eq!(by_id.position, LatLng::new(0.0185, 0.0105));
        let by_name = directory.resolve("south cove").expect("by name");
        assert_eq!(by_name.id, "south-cove");
        assert!(directory.resolve("east-point").is_none());
    }

    #[test]
    fn typos_produce_suggestions() {
        let directory = StopDirectory::from_json(DIRECTORY).expect("parses");
        assert_eq!(directory.suggestions("north-harbour"), vec!["north-harbor"]);
        assert!(directory.suggestions("zzzzzz").is_empty());
    }

    #[test]
    fn malformed_directory_is_an_error() {
        let err = StopDirectory::from_json(r#"[{ "id": 1 }]"#).unwrap_err();
        assert!(matches!(err, Error::StopDirectoryParse { .. }));
    }

    #[test]
    fn coordinate_literals_resolve() {
        let stop = CoordinateResolver.resolve(" 44.1 , -73.3 ").expect("parses");
        assert_eq!(stop.position, LatLng::new(44.1, -73.3));
        assert!(CoordinateResolver.resolve("north-harbor").is_none());
        assert!(CoordinateResolver.resolve("44.1").is_none());
    }

    #[test]
    fn chain_prefers_first_resolver() {
        let chain = ChainResolver::new()
            .with(StopDirectory::from_json(DIRECTORY).unwrap())
            .with(CoordinateResolver);
        assert_eq!(chain.resolve("south-cove").unwrap().id, "south-cove");
        assert_eq!(
            chain.resolve("0.01,0.01").unwrap().position,
            LatLng::new(0.01, 0.01)
        );
        assert_eq!(chain.suggestions("south-cov"), vec!["south-cove"]);
    }
}
