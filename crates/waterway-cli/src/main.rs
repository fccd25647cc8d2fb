use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use waterway_cli::output::OutputFormat;
use waterway_lib::{DistanceUnit, RouteAlgorithm};

mod commands;

use commands::route::RouteCommandArgs;

#[derive(Parser, Debug)]
#[command(author, version, about = "Plan vessel routes that stay on navigable water")]
struct Cli {
    #[command(flatten)]
    global: GlobalOptions,

    #[command(subcommand)]
    command: Command,
}

/// Options shared by every subcommand.
#[derive(Args, Debug, Clone)]
pub struct GlobalOptions {
    /// GeoJSON file with water body outlines.
    #[arg(long, global = true)]
    pub boundaries: Option<PathBuf>,

    /// JSON file with depth soundings.
    #[arg(long, global = true)]
    pub depths: Option<PathBuf>,

    /// JSON routing configuration; missing fields keep their defaults.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Vessel draft in meters.
    #[arg(long, global = true)]
    pub draft: Option<f64>,

    /// Extra clearance below the keel in meters.
    #[arg(long, global = true)]
    pub margin: Option<f64>,

    /// Output format.
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Grid cache file (defaults to the platform cache directory).
    #[arg(long, global = true, conflicts_with = "no_cache")]
    pub grid_cache: Option<PathBuf>,

    /// Always build the grid from scratch and do not write a cache file.
    #[arg(long, global = true)]
    pub no_cache: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Plan a route through two or more stops.
    Route {
        /// Stop id, stop name or `lat,lng` position. Repeat for each stop in travel order.
        #[arg(long = "stop", required = true, allow_hyphen_values = true)]
        stops: Vec<String>,
        /// JSON array of `{ id, name, lat, lng }` stops.
        #[arg(long)]
        stops_file: Option<PathBuf>,
        /// Distance unit for the text report: km, nm or mi.
        #[arg(long, default_value = "km")]
        unit: DistanceUnit,
        /// Search algorithm: a-star or dijkstra.
        #[arg(long, default_value = "a-star")]
        algorithm: RouteAlgorithm,
        /// Fail instead of drawing a straight line for unreachable legs.
        #[arg(long)]
        strict: bool,
    },
    /// Build (or load) the navigation grid and report its statistics.
    Grid,
    /// Report whether a position is navigable and its nearest grid point.
    Check {
        #[arg(long, allow_negative_numbers = true)]
        lat: f64,
        #[arg(long, allow_negative_numbers = true)]
        lng: f64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing();

    match cli.command {
        Command::Route {
            stops,
            stops_file,
            unit,
            algorithm,
            strict,
        } => {
            let args = RouteCommandArgs {
                stops,
                stops_file,
                unit,
                algorithm,
                strict,
            };
            commands::route::handle_route_command(&cli.global, &args).await
        }
        Command::Grid => commands::grid::handle_grid_command(&cli.global).await,
        Command::Check { lat, lng } => {
            commands::check::handle_check_command(&cli.global, lat, lng).await
        }
    }
}

/// Logs go to stderr so stdout stays parseable.
fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .finish();

    let _ = tracing::subscriber::set_global_default(subscriber);
}
