//! Turn classification shared by the search cost and route analysis.

use serde::Serialize;

use crate::config::{TurnConfig, TurnPenalties};
use crate::coords::{bearing_change_deg, LatLng, MIN_BEARING_SEGMENT_KM};

/// Course changes below this are treated as straight ahead.
const STRAIGHT_TOLERANCE_DEG: f64 = 1.0;

/// Bearing-change bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnSeverity {
    /// Below 30°.
    Gentle,
    /// 30° to 60°.
    Moderate,
    /// 60° to 90°.
    Large,
    /// Above 90°.
    Severe,
}

impl TurnSeverity {
    pub fn classify(angle_deg: f64) -> Self {
        if angle_deg < 30.0 {
            TurnSeverity::Gentle
        } else if angle_deg < 60.0 {
            TurnSeverity::Moderate
        } else if angle_deg <= 90.0 {
            TurnSeverity::Large
        } else {
            TurnSeverity::Severe
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TurnSeverity::Gentle => "gentle",
            TurnSeverity::Moderate => "moderate",
            TurnSeverity::Large => "large",
            TurnSeverity::Severe => "severe",
        }
    }
}

impl TurnPenalties {
    /// Search cost added for a course change of `angle_deg`.
    pub fn penalty(&self, angle_deg: f64) -> f64 {
        match TurnSeverity::classify(angle_deg) {
            TurnSeverity::Gentle if angle_deg < STRAIGHT_TOLERANCE_DEG => 0.0,
            TurnSeverity::Gentle => self.gentle,
            TurnSeverity::Moderate => self.moderate,
            TurnSeverity::Large => self.large,
            TurnSeverity::Severe => self.severe,
        }
    }
}

/// A reported course change along a finished route.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Turn {
    pub location: LatLng,
    pub angle_deg: f64,
    pub severity: TurnSeverity,
}

/// Turn statistics for a coordinate sequence.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TurnAnalysis {
    pub turns: Vec<Turn>,
    pub max_turn_angle: f64,
    pub sharp_turns: usize,
}

impl TurnAnalysis {
    /// Human-readable warning per sharp turn.
    pub fn warnings(&self, config: &TurnConfig) -> Vec<String> {
        self.turns
            .iter()
            .filter(|t| t.angle_deg > config.sharp_turn_deg)
            .map(|t| format!("sharp turn of {:.0}° at {}", t.angle_deg, t.location))
            .collect()
    }
}

/// Measure every course change along `points`.
///
/// Segments shorter than a metre carry no reliable bearing and are merged into
/// the following segment.
pub fn analyze_turns(points: &[LatLng], config: &TurnConfig) -> TurnAnalysis {
    let mut vertices: Vec<LatLng> = Vec::with_capacity(points.len());
    for point in points {
        match vertices.last() {
            Some(last) if last.distance_to(point) < MIN_BEARING_SEGMENT_KM => {}
            _ => vertices.push(*point),
        }
    }

    let mut analysis = TurnAnalysis::default();
    for window in vertices.windows(3) {
        let incoming = window[0].bearing_to(&window[1]);
        let outgoing = window[1].bearing_to(&window[2]);
        let angle = bearing_change_deg(incoming, outgoing);

        analysis.max_turn_angle = analysis.max_turn_angle.max(angle);
        if angle > config.sharp_turn_deg {
            analysis.sharp_turns += 1;
        }
        if angle >= config.report_min_deg {
            analysis.turns.push(Turn {
                location: window[1],
                angle_deg: angle,
                severity: TurnSeverity::classify(angle),
            });
        }
    }
    analysis
}
