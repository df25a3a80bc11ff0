//! Tileroute CLI library.
//!
//! Argument parsing, logging setup and the route runner behind the
//! `tileroute-cli` binary.

pub mod output;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::debug;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use tileroute_lib::{run_route, RouteConfig, RouteOptions, RouteRequest, RouteRun};

pub use output::{render_record, OutputFormat};

/// Filter used when neither `RUST_LOG` nor the configuration sets one.
const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Run one route request and report its search statistics"
)]
pub struct Cli {
    /// Configuration file (graph location, logging, costing options).
    pub config: PathBuf,

    /// Origin as `lat,lng,[through|break],[name],[street],[city],[state],[zip],[country]`.
    #[arg(
        short = 'o',
        long,
        allow_hyphen_values = true,
        required_unless_present = "json"
    )]
    pub origin: Option<String>,

    /// Destination, same form as the origin.
    #[arg(
        short = 'd',
        long,
        allow_hyphen_values = true,
        required_unless_present = "json"
    )]
    pub destination: Option<String>,

    /// Route type: auto, auto_shorter, bicycle, bus, pedestrian, truck or multimodal.
    #[arg(short = 't', long = "type", required_unless_present = "json")]
    pub route_type: Option<String>,

    /// Full JSON request; replaces --origin, --destination and --type.
    #[arg(short = 'j', long, conflicts_with_all = ["origin", "destination", "route_type"])]
    pub json: Option<String>,

    /// Check tile connectivity before searching.
    #[arg(long)]
    pub connectivity: bool,

    /// Re-run each successful search this many more times to time it.
    #[arg(long = "multi-run", value_name = "N", default_value_t = 0)]
    pub multi_run: u32,

    /// Statistics output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Csv)]
    pub format: OutputFormat,
}

impl Cli {
    /// The route request named by the arguments.
    pub fn request(&self) -> Result<RouteRequest> {
        if let Some(json) = &self.json {
            return RouteRequest::from_json(json).context("failed to parse JSON request");
        }
        match (&self.origin, &self.destination, &self.route_type) {
            (Some(origin), Some(destination), Some(route_type)) => {
                RouteRequest::from_csv(origin, destination, route_type)
                    .context("failed to parse route locations")
            }
            _ => anyhow::bail!("--origin, --destination and --type are required without --json"),
        }
    }

    pub fn options(&self) -> RouteOptions {
        RouteOptions {
            connectivity_check: self.connectivity,
            repeat: self.multi_run,
        }
    }
}

/// Load everything the arguments name and run the request.
pub fn run(cli: &Cli, config: &RouteConfig) -> Result<RouteRun> {
    let request = cli.request()?;
    debug!(request = %request.to_json(), "route request");
    let graph = config.load_graph().context("failed to load graph")?;
    let run = run_route(&graph, config, &request, &cli.options())?;
    Ok(run)
}

/// Install the stderr subscriber. `RUST_LOG` wins over `config_level`.
pub fn init_tracing(config_level: Option<&str>) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config_level.unwrap_or(DEFAULT_LOG_LEVEL)));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .finish();

    let _ = tracing::subscriber::set_global_default(subscriber);
}

#[cfg(test)]
mod tests {
    use super::*;
    use tileroute_lib::RouteType;

    #[test]
    fn csv_arguments_build_a_two_location_request() {
        let cli = Cli::parse_from([
            "tileroute-cli",
            "config.json",
            "-o",
            "40.0,-75.0",
            "-d",
            "-33.86,151.2,through",
            "-t",
            "Auto",
        ]);
        let request = cli.request().unwrap();
        assert_eq!(request.locations.len(), 2);
        assert_eq!(request.route_type, RouteType::Costing("auto".to_string()));
        assert_eq!(cli.options(), RouteOptions::default());
    }

    #[test]
    fn json_replaces_csv_arguments() {
        let cli = Cli::parse_from([
            "tileroute-cli",
            "config.json",
            "-j",
            r#"{"locations": [{"lat": 1.0, "lon": 1.0}, {"lat": 1.0, "lon": 1.1}], "costing": "multimodal"}"#,
            "--connectivity",
            "--multi-run",
            "4",
        ]);
        let request = cli.request().unwrap();
        assert!(request.route_type.is_multimodal());
        assert_eq!(
            cli.options(),
            RouteOptions {
                connectivity_check: true,
                repeat: 4
            }
        );
    }

    #[test]
    fn missing_locations_are_rejected_by_clap() {
        assert!(Cli::try_parse_from(["tileroute-cli", "config.json", "-t", "auto"]).is_err());
    }
}
