//! Route command handler for planning multi-stop trips.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use waterway_lib::{
    ChainResolver, CoordinateResolver, DistanceUnit, Error as RouteError, FileSource,
    RouteAlgorithm, RouteSummary, StopDirectory, StopResolver,
};

use waterway_cli::output::{render_json, render_route_text};
use waterway_cli::terminal::ColorPalette;

use crate::commands::{load_service, EmptyBoundaries};
use crate::GlobalOptions;

/// Arguments for the route command.
#[derive(Debug, Clone)]
pub struct RouteCommandArgs {
    /// Stop ids or `lat,lng` positions, in travel order.
    pub stops: Vec<String>,
    /// JSON stop directory used to resolve ids and names.
    pub stops_file: Option<PathBuf>,
    pub unit: DistanceUnit,
    pub algorithm: RouteAlgorithm,
    /// Reject routes that contain straight-line legs.
    pub strict: bool,
}

/// Handle the route subcommand.
pub async fn handle_route_command(global: &GlobalOptions, args: &RouteCommandArgs) -> Result<()> {
    let resolver = build_resolver(args)?;
    let service = load_service(global, EmptyBoundaries::Degrade).await?;

    let result = service
        .plan_route(args.stops.clone(), resolver, args.algorithm)
        .await
        .map_err(route_failure)?;
    if args.strict {
        result.require_water_route().map_err(route_failure)?;
    }

    match global.format.route_mode() {
        None => render_json(&result)?,
        Some(mode) => {
            let summary = RouteSummary::from_result(&result, args.unit);
            print!(
                "{}",
                render_route_text(&summary, mode, &ColorPalette::detect())
            );
        }
    }
    Ok(())
}

/// Stop directory ids and names first, literal positions second.
fn build_resolver(args: &RouteCommandArgs) -> Result<Arc<dyn StopResolver>> {
    let mut chain = ChainResolver::new();
    if let Some(path) = &args.stops_file {
        let directory = StopDirectory::load(&FileSource::new(path))
            .with_context(|| format!("failed to load stops from {}", path.display()))?;
        chain = chain.with(directory);
    }
    Ok(Arc::new(chain.with(CoordinateResolver)))
}

fn route_failure(err: RouteError) -> anyhow::Error {
    match err {
        RouteError::InsufficientStops { resolved } => anyhow!(
            "A route needs at least two known stops ({} resolved). \
             Give positions as 'lat,lng' or pass --stops-file to use stop names.",
            resolved
        ),
        RouteError::NoPathFound { from, to } => anyhow!(
            "No water route between {} and {}. \
             The stops may be on separate water bodies, or try a smaller --draft.",
            from,
            to
        ),
        err @ RouteError::EndpointTooFarFromWater { .. } => anyhow!(
            "{}. Move the stop closer to the shore or raise search.max_snap_radius_km in --config.",
            err
        ),
        other => anyhow::Error::new(other),
    }
}
