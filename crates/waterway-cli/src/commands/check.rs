//! Check command handler: is a position navigable, and where is the nearest
//! grid point?

use anyhow::{Context, Result};
use waterway_lib::LatLng;

use waterway_cli::output::{render_json, CheckReport, NearestPoint, OutputFormat};
use waterway_cli::terminal::ColorPalette;

use crate::commands::{load_service, EmptyBoundaries};
use crate::GlobalOptions;

pub async fn handle_check_command(global: &GlobalOptions, lat: f64, lng: f64) -> Result<()> {
    let position = LatLng::new(lat, lng)
        .validated()
        .context("invalid position")?;
    let service = load_service(global, EmptyBoundaries::Fail).await?;
    let grid = service
        .warm_grid()
        .await
        .context("failed to build the navigation grid")?;
    let engine = service.engine();

    let report = CheckReport {
        lat: position.lat,
        lng: position.lng,
        navigable: engine.is_navigable(position.lat, position.lng),
        water_body: engine.water_body_at(position.lat, position.lng),
        nearest: grid
            .nearest(position.lat, position.lng)
            .map(|(point, distance_km)| NearestPoint::new(point, distance_km)),
    };
    match global.format {
        OutputFormat::Json => render_json(&report)?,
        OutputFormat::Text | OutputFormat::Compact => {
            print!("{}", report.render_text(&ColorPalette::detect()))
        }
    }
    Ok(())
}
