//! Vessel draft and clearance, and the minimum water depth they require.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Draft and clearance of the vessel being routed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VesselProfile {
    pub draft_meters: f64,
    pub safety_margin_meters: f64,
}

impl Default for VesselProfile {
    fn default() -> Self {
        Self {
            draft_meters: 1.5,
            safety_margin_meters: 1.0,
        }
    }
}

impl VesselProfile {
    /// Validated constructor; both values must be finite and non-negative.
    pub fn new(draft_meters: f64, safety_margin_meters: f64) -> Result<Self> {
        for (label, value) in [("draft", draft_meters), ("safety margin", safety_margin_meters)] {
            if !value.is_finite() || value < 0.0 {
                return Err(Error::InvalidVesselProfile {
                    message: format!("{} must be a non-negative number (got {})", label, value),
                });
            }
        }
        Ok(Self {
            draft_meters,
            safety_margin_meters,
        })
    }

    /// Shallowest water the vessel may enter.
    pub fn minimum_safe_depth(&self) -> f64 {
        self.draft_meters + self.safety_margin_meters
    }
}
