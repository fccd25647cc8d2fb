use std::path::PathBuf;

use thiserror::Error;

/// Convenient result alias for the waterway library.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level library error type.
#[derive(Debug, Error)]
pub enum Error {
    /// Raised when a coordinate is non-finite or outside the valid lat/lng range.
    #[error("invalid coordinates: lat={lat}, lng={lng}")]
    InvalidCoordinates { lat: f64, lng: f64 },

    /// Raised when an operation requires boundary data but none was loaded.
    #[error("no boundary data loaded; every position is treated as land")]
    NoBoundaryData,

    /// Raised when the search space was exhausted without reaching the goal.
    #[error("no path found between {from} and {to}")]
    NoPathFound { from: String, to: String },

    /// Raised when a requested coordinate is too far from any grid point.
    #[error(
        "position ({lat:.5}, {lng:.5}) is {distance_km:.2} km from navigable water (limit {limit_km:.2} km)"
    )]
    EndpointTooFarFromWater {
        lat: f64,
        lng: f64,
        distance_km: f64,
        limit_km: f64,
    },

    /// Raised when fewer than two stops could be resolved for a trip.
    #[error("at least two resolvable stops are required (resolved {resolved})")]
    InsufficientStops { resolved: usize },

    /// Raised when a vessel profile contains negative or non-finite values.
    #[error("invalid vessel profile: {message}")]
    InvalidVesselProfile { message: String },

    /// Raised when a water body ring fails validation.
    #[error("invalid boundary for water body {body}: {message}")]
    InvalidBoundary { body: String, message: String },

    /// Raised when a boundary source cannot be parsed.
    #[error("failed to parse boundary data from {source_name}: {message}")]
    BoundaryParse {
        source_name: String,
        message: String,
    },

    /// Raised when a depth source cannot be parsed.
    #[error("failed to parse depth data from {source_name}: {message}")]
    DepthParse {
        source_name: String,
        message: String,
    },

    /// Raised when a stop directory cannot be parsed.
    #[error("failed to parse stop directory: {message}")]
    StopDirectoryParse { message: String },

    /// Raised when routing configuration values are out of range.
    #[error("invalid routing configuration: {message}")]
    InvalidConfig { message: String },

    /// Raised when serializing a grid snapshot fails.
    #[error("failed to serialize grid cache: {message}")]
    GridCacheSerialize { message: String },

    /// Raised when loading a grid snapshot from a file fails.
    #[error("failed to load grid cache from {path}: {message}")]
    GridCacheLoad { path: PathBuf, message: String },

    /// Raised when a cached grid was built from different inputs.
    #[error("grid cache at {path} was built from different inputs")]
    GridCacheStale { path: PathBuf },

    /// Raised when a background task panicked or was aborted.
    #[error("background task failed: {message}")]
    BackgroundTask { message: String },

    /// Raised when a route request was superseded before completion.
    #[error("route request was cancelled")]
    Cancelled,

    /// Wrapper for IO errors.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Wrapper for JSON errors.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Render a list of suggestions as a trailing hint for user-facing messages.
pub(crate) fn format_suggestions(suggestions: &[String]) -> String {
    if suggestions.is_empty() {
        String::new()
    } else if suggestions.len() == 1 {
        format!(". Did you mean '{}'?", suggestions[0])
    } else {
        format!(
            ". Did you mean one of: {}?",
            suggestions
                .iter()
                .map(|s| format!("'{}'", s))
                .collect::<Vec<_>>()
                .join(", ")
        )
    }
}
