//! Grid command handler: build or load the navigation grid and describe it.

use anyhow::{Context, Result};
use tracing::info;

use waterway_cli::output::{render_json, GridReport, OutputFormat};
use waterway_cli::terminal::ColorPalette;

use crate::commands::{load_service, EmptyBoundaries};
use crate::GlobalOptions;

pub async fn handle_grid_command(global: &GlobalOptions) -> Result<()> {
    let service = load_service(global, EmptyBoundaries::Fail).await?;
    let grid = service
        .warm_grid()
        .await
        .context("failed to build the navigation grid")?;
    let engine = service.engine();
    info!(points = grid.len(), "grid ready");

    let report = GridReport::new(
        &grid,
        engine.depths().statistics(),
        engine.grid_cache_path(),
    );
    match global.format {
        OutputFormat::Json => render_json(&report)?,
        OutputFormat::Text | OutputFormat::Compact => {
            print!("{}", report.render_text(&ColorPalette::detect()))
        }
    }
    Ok(())
}
