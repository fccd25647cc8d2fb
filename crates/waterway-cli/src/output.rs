//! Output formatting for CLI reports.
//!
//! Route summaries come from the library's renderer; the grid and position
//! reports are assembled here. Every report can also be written as JSON.

use std::fmt::Write as _;
use std::io::{self, Write};
use std::path::Path;

use clap::ValueEnum;
use serde::Serialize;
use waterway_lib::{
    Bounds, DepthStatistics, GridPoint, GridSnapshot, RouteRenderMode, RouteSummary,
};

use crate::terminal::{format_with_separators, ColorPalette};

/// Output format selected with `--format`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable report.
    #[default]
    Text,
    /// One line per route.
    Compact,
    /// Pretty-printed JSON on stdout.
    Json,
}

impl OutputFormat {
    /// Text rendering mode for route summaries; `None` for JSON.
    pub fn route_mode(self) -> Option<RouteRenderMode> {
        match self {
            OutputFormat::Text => Some(RouteRenderMode::PlainText),
            OutputFormat::Compact => Some(RouteRenderMode::Compact),
            OutputFormat::Json => None,
        }
    }
}

/// Write any serializable report to stdout as pretty JSON.
pub fn render_json<T: Serialize>(value: &T) -> io::Result<()> {
    let mut stdout = io::stdout();
    serde_json::to_writer_pretty(&mut stdout, value).map_err(io::Error::other)?;
    stdout.write_all(b"\n")?;
    Ok(())
}

/// Render a route summary, highlighting straight-line legs and warnings.
pub fn render_route_text(
    summary: &RouteSummary,
    mode: RouteRenderMode,
    palette: &ColorPalette,
) -> String {
    let rendered = summary.render(mode);
    let mut out = String::with_capacity(rendered.len());
    for line in rendered.lines() {
        if line.starts_with("warning:") || line.ends_with("[straight line]") {
            let _ = writeln!(out, "{}{}{}", palette.warning, line, palette.reset);
        } else if line.starts_with("Route:") {
            let _ = writeln!(out, "{}{}{}", palette.name, line, palette.reset);
        } else {
            let _ = writeln!(out, "{}", line);
        }
    }
    out
}

/// Statistics about a built (or loaded) navigation grid.
#[derive(Debug, Clone, Serialize)]
pub struct GridReport {
    pub points: usize,
    pub rows: Option<u32>,
    pub cols: Option<u32>,
    pub bounds: Option<Bounds>,
    pub minimum_safe_depth: f64,
    pub depth_statistics: Option<DepthStatistics>,
    /// Hex SHA-256 of the grid inputs, as stored in the cache file.
    pub fingerprint: String,
    pub cache_path: Option<String>,
}

impl GridReport {
    pub fn new(
        grid: &GridSnapshot,
        depth_statistics: Option<DepthStatistics>,
        cache_path: Option<&Path>,
    ) -> Self {
        let layout = grid.layout();
        Self {
            points: grid.len(),
            rows: layout.map(|l| l.rows),
            cols: layout.map(|l| l.cols),
            bounds: layout.map(|l| l.bounds),
            minimum_safe_depth: grid.minimum_safe_depth(),
            depth_statistics,
            fingerprint: hex::encode(grid.fingerprint()),
            cache_path: cache_path.map(|p| p.display().to_string()),
        }
    }

    pub fn render_text(&self, palette: &ColorPalette) -> String {
        let mut out = String::new();
        let _ = write!(
            out,
            "Grid: {}{}{} navigable points",
            palette.water,
            format_with_separators(self.points as u64),
            palette.reset
        );
        if let (Some(rows), Some(cols)) = (self.rows, self.cols) {
            let _ = write!(out, " ({} rows x {} cols)", rows, cols);
        }
        out.push('\n');
        if let Some(b) = &self.bounds {
            let _ = writeln!(
                out,
                "Bounds: {:.4},{:.4} to {:.4},{:.4}",
                b.south, b.west, b.north, b.east
            );
        }
        let _ = writeln!(out, "Minimum safe depth: {:.2} m", self.minimum_safe_depth);
        match &self.depth_statistics {
            Some(stats) => {
                let _ = writeln!(
                    out,
                    "Depth samples: {} (min {:.1} m, max {:.1} m, mean {:.1} m)",
                    stats.count, stats.min, stats.max, stats.mean
                );
            }
            None => out.push_str("Depth samples: none\n"),
        }
        let _ = writeln!(
            out,
            "{}Fingerprint: {}{}",
            palette.detail, self.fingerprint, palette.reset
        );
        if let Some(path) = &self.cache_path {
            let _ = writeln!(out, "{}Cache: {}{}", palette.detail, path, palette.reset);
        }
        out
    }
}

/// Nearest grid point to a checked position.
#[derive(Debug, Clone, Serialize)]
pub struct NearestPoint {
    pub lat: f64,
    pub lng: f64,
    pub row: u32,
    pub col: u32,
    pub distance_km: f64,
    pub depth_meters: Option<f64>,
}

impl NearestPoint {
    pub fn new(point: &GridPoint, distance_km: f64) -> Self {
        Self {
            lat: point.lat,
            lng: point.lng,
            row: point.row,
            col: point.col,
            distance_km,
            depth_meters: point.depth_meters,
        }
    }
}

/// Navigability report for a single position.
#[derive(Debug, Clone, Serialize)]
pub struct CheckReport {
    pub lat: f64,
    pub lng: f64,
    pub navigable: bool,
    pub water_body: Option<String>,
    pub nearest: Option<NearestPoint>,
}

impl CheckReport {
    pub fn render_text(&self, palette: &ColorPalette) -> String {
        let mut out = String::new();
        let (color, verdict) = if self.navigable {
            (palette.water, "navigable")
        } else {
            (palette.land, "not navigable")
        };
        let _ = write!(
            out,
            "Position {:.5},{:.5} is {}{}{}",
            self.lat, self.lng, color, verdict, palette.reset
        );
        if let Some(name) = &self.water_body {
            let _ = write!(out, " ({}{}{})", palette.name, name, palette.reset);
        }
        out.push('\n');
        match &self.nearest {
            Some(p) => {
                let _ = write!(
                    out,
                    "Nearest grid point: {:.6},{:.6} (row {}, col {}) {:.3} km away",
                    p.lat, p.lng, p.row, p.col, p.distance_km
                );
                if let Some(depth) = p.depth_meters {
                    let _ = write!(out, ", depth {:.1} m", depth);
                }
                out.push('\n');
            }
            None => out.push_str("Nearest grid point: none (grid is empty)\n"),
        }
        out
    }
}
