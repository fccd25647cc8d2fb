use std::fmt::{self, Write};
use std::str::FromStr;

use serde::Serialize;

use crate::path::RouteAlgorithm;
use crate::routing::RouteResult;

const KM_PER_NAUTICAL_MILE: f64 = 1.852;
const KM_PER_STATUTE_MILE: f64 = 1.609_344;

/// Unit used when displaying distances. Results are always computed in kilometres.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DistanceUnit {
    #[default]
    Kilometers,
    NauticalMiles,
    StatuteMiles,
}

impl DistanceUnit {
    pub fn from_km(self, km: f64) -> f64 {
        match self {
            DistanceUnit::Kilometers => km,
            DistanceUnit::NauticalMiles => km / KM_PER_NAUTICAL_MILE,
            DistanceUnit::StatuteMiles => km / KM_PER_STATUTE_MILE,
        }
    }

    pub fn suffix(self) -> &'static str {
        match self {
            DistanceUnit::Kilometers => "km",
            DistanceUnit::NauticalMiles => "nm",
            DistanceUnit::StatuteMiles => "mi",
        }
    }
}

impl fmt::Display for DistanceUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.suffix())
    }
}

impl FromStr for DistanceUnit {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "km" | "kilometers" | "kilometres" => Ok(DistanceUnit::Kilometers),
            "nm" | "nmi" | "nautical" => Ok(DistanceUnit::NauticalMiles),
            "mi" | "miles" => Ok(DistanceUnit::StatuteMiles),
            other => Err(format!("unknown distance unit '{}'", other)),
        }
    }
}

/// Presentation style for turning a [`RouteSummary`] into text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteRenderMode {
    /// Header, one line per leg, then warnings.
    PlainText,
    /// A single line.
    Compact,
}

/// Per-leg line of a [`RouteSummary`].
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct LegSummary {
    pub index: usize,
    pub from: String,
    pub to: String,
    pub distance: f64,
    pub points: usize,
    pub is_fallback: bool,
}

/// Display-oriented digest of a [`RouteResult`].
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RouteSummary {
    pub algorithm: RouteAlgorithm,
    pub unit: DistanceUnit,
    pub stops: Vec<String>,
    pub total_distance: f64,
    pub point_count: usize,
    pub legs: Vec<LegSummary>,
    pub max_turn_angle: f64,
    pub sharp_turns: usize,
    pub land_corrections: usize,
    pub warnings: Vec<String>,
}

impl RouteSummary {
    pub fn from_result(result: &RouteResult, unit: DistanceUnit) -> Self {
        let name_of = |id: &str| {
            result
                .stops
                .iter()
                .find(|stop| stop.id == id)
                .map(|stop| stop.name.clone())
                .unwrap_or_else(|| id.to_string())
        };

        let legs = result
            .legs
            .iter()
            .enumerate()
            .map(|(index, leg)| LegSummary {
                index: index + 1,
                from: name_of(&leg.from),
                to: name_of(&leg.to),
                distance: unit.from_km(leg.distance_km),
                points: leg.coordinates.len(),
                is_fallback: leg.is_fallback,
            })
            .collect();

        Self {
            algorithm: result.algorithm,
            unit,
            stops: result.stops.iter().map(|stop| stop.name.clone()).collect(),
            total_distance: unit.from_km(result.total_distance_km),
            point_count: result.coordinates.len(),
            legs,
            max_turn_angle: result.max_turn_angle,
            sharp_turns: result.sharp_turns,
            land_corrections: result.smoothing.land_corrections,
            warnings: result.warnings.clone(),
        }
    }

    pub fn render(&self, mode: RouteRenderMode) -> String {
        match mode {
            RouteRenderMode::PlainText => self.render_plain(),
            RouteRenderMode::Compact => self.render_compact(),
        }
    }

    fn render_plain(&self) -> String {
        let mut buffer = String::new();
        let _ = writeln!(
            buffer,
            "Route: {} ({:.2} {}, {} legs, algorithm: {})",
            self.stops.join(" -> "),
            self.total_distance,
            self.unit,
            self.legs.len(),
            self.algorithm
        );
        for leg in &self.legs {
            let marker = if leg.is_fallback { " [straight line]" } else { "" };
            let _ = writeln!(
                buffer,
                "{:>3}: {} -> {} {:.2} {} ({} points){}",
                leg.index, leg.from, leg.to, leg.distance, self.unit, leg.points, marker
            );
        }
        let _ = writeln!(
            buffer,
            "Points: {}  Max turn: {:.0}°  Sharp turns: {}  Land corrections: {}",
            self.point_count, self.max_turn_angle, self.sharp_turns, self.land_corrections
        );
        for warning in &self.warnings {
            let _ = writeln!(buffer, "warning: {}", warning);
        }
        buffer
    }

    fn render_compact(&self) -> String {
        let fallback = self.legs.iter().filter(|leg| leg.is_fallback).count();
        let mut line = format!(
            "{}: {:.2} {} over {} legs",
            self.stops.join(" -> "),
            self.total_distance,
            self.unit,
            self.legs.len()
        );
        if fallback > 0 {
            let _ = write!(line, " ({} unrouted)", fallback);
        }
        line
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::LatLng;
    use crate::path::NoPathReason;
    use crate::routing::{ResolvedStop, RouteLeg, SmoothingMetadata};

    fn result() -> RouteResult {
        let a = LatLng::new(44.0, -73.3);
        let b = LatLng::new(44.1, -73.3);
        RouteResult {
            algorithm: RouteAlgorithm::AStar,
            stops: vec![
                ResolvedStop {
                    id: "a".into(),
                    name: "Alpha Bay".into(),
                    position: a,
                },
                ResolvedStop {
                    id: "b".into(),
                    name: "Beta Point".into(),
                    position: b,
                },
            ],
            coordinates: vec![a, b],
            total_distance_km: 18.52,
            legs: vec![RouteLeg {
                from: "a".into(),
                to: "b".into(),
                coordinates: vec![a, b],
                distance_km: 18.52,
                grid_trail: Vec::new(),
                smoothing: None,
                warnings: vec!["leg a to b is a straight line".into()],
                is_fallback: true,
                fallback_reason: Some(NoPathReason::EmptyGrid),
            }],
            smoothing: SmoothingMetadata::default(),
            turns: Vec::new(),
            max_turn_angle: 0.0,
            sharp_turns: 0,
            warnings: vec!["leg a to b is a straight line".into()],
        }
    }

    #[test]
    fn plain_text_lists_legs_and_warnings() {
        let summary = RouteSummary::from_result(&result(), DistanceUnit::Kilometers);
        let text = summary.render(RouteRenderMode::PlainText);
        assert!(text.contains("Route: Alpha Bay -> Beta Point (18.52 km, 1 legs"));
        assert!(text.contains("Alpha Bay -> Beta Point 18.52 km (2 points) [straight line]"));
        assert!(text.contains("warning: leg a to b"));
    }

    #[test]
    fn nautical_miles_convert() {
        let summary = RouteSummary::from_result(&result(), DistanceUnit::NauticalMiles);
        assert!((summary.total_distance - 10.0).abs() < 1e-9);
        assert_eq!(
            summary.render(RouteRenderMode::Compact),
            "Alpha Bay -> Beta Point: 10.00 nm over 1 legs (1 unrouted)"
        );
    }

    #[test]
    fn units_parse() {
        assert_eq!("nm".parse::<DistanceUnit>(), Ok(DistanceUnit::NauticalMiles));
        assert!("furlongs".parse::<DistanceUnit>().is_err());
    }
}
