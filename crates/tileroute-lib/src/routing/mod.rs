//! Route request orchestration.
//!
//! This module provides:
//! - [`PathStrategy`] / [`select_algorithm`] - strategy choice per leg
//! - [`compute_leg`] - the escalating multi-pass search of one leg
//! - [`run_route`] - the whole request: costing, correlation, the optional
//!   connectivity preflight, every leg, and the statistics record
//!
//! # Example
//!
//! ```ignore
//! use tileroute_lib::{run_route, RouteConfig, RouteOptions, RouteRequest};
//!
//! let config = RouteConfig::load("config.json".as_ref())?;
//! let graph = config.load_graph()?;
//! let request = RouteRequest::from_csv("40.0,-75.0", "40.0,-74.95", "auto")?;
//! let run = run_route(&graph, &config, &request, &RouteOptions::default())?;
//! println!("{}", run.record);
//! ```

mod multipass;
mod planner;

pub use multipass::{
    compute_leg, LegSearch, DIRECT_EXPANSION_WITHIN_FACTOR, DIRECT_RELAX_FACTOR,
    EXPANSION_WITHIN_FACTOR, RELAX_FACTOR,
};
pub use planner::{select_algorithm, Algorithms, PathStrategy};

use std::time::Instant;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::RouteConfig;
use crate::connectivity::check_connectivity;
use crate::correlate::{Correlator, PathLocation};
use crate::costing::{resolve_costing, CostFactory, ModeCosting, TravelMode};
use crate::error::{Error, Result};
use crate::geo::KM_PER_METER;
use crate::graph::Graph;
use crate::request::{RouteRequest, RouteType};
use crate::stats::{classify_failure, Outcome, RunStatistics, StatisticsRecord};
use crate::trip::{TripDirections, TripPath};

/// Costings a multimodal request needs, in resolution order.
const MULTIMODAL_COSTINGS: [&str; 4] = ["auto", "pedestrian", "bicycle", "transit"];

/// Caller switches for one request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RouteOptions {
    /// Run the tile connectivity preflight before searching.
    pub connectivity_check: bool,
    /// Re-run each successful search this many times to time it.
    pub repeat: u32,
}

/// What happened on one leg.
#[derive(Debug, Clone, Serialize)]
pub struct LegReport {
    pub strategy: PathStrategy,
    pub passes: u32,
    pub outcome: Outcome,
    pub directions: Option<TripDirections>,
}

/// Result of a route request.
#[derive(Debug, Clone)]
pub struct RouteRun {
    pub record: StatisticsRecord,
    pub statistics: RunStatistics,
    pub legs: Vec<LegReport>,
}

impl RouteRun {
    /// The terminal outcome: the preflight result, or the last leg's.
    pub fn outcome(&self) -> Option<Outcome> {
        self.statistics.outcome()
    }
}

/// Build the cost models a request needs and name the active travel mode.
///
/// Multimodal requests resolve auto, pedestrian, bicycle and transit and
/// search as a pedestrian. Other requests resolve their one costing.
pub fn resolve_mode_costing(
    factory: &CostFactory,
    config: &RouteConfig,
    request: &RouteRequest,
) -> Result<(ModeCosting, TravelMode)> {
    let mut costing = ModeCosting::new();
    let mode = match &request.route_type {
        RouteType::Multimodal => {
            for name in MULTIMODAL_COSTINGS {
                costing.insert(resolve_costing(factory, config, request.raw(), name)?);
            }
            TravelMode::Pedestrian
        }
        RouteType::Costing(name) => {
            costing.insert(resolve_costing(factory, config, request.raw(), name)?)
        }
    };
    debug!(route_type = %request.route_type, %mode, "resolved costing");
    Ok((costing, mode))
}

/// Run a route request with the built-in costings.
pub fn run_route(
    graph: &Graph,
    config: &RouteConfig,
    request: &RouteRequest,
    options: &RouteOptions,
) -> Result<RouteRun> {
    run_route_with(&CostFactory::default(), graph, config, request, options)
}

/// Run a route request with the costings registered on `factory`.
///
/// Costing resolution and a request with fewer than two locations are
/// errors; every search outcome, including an uncorrelated waypoint, is
/// reported through the statistics record. Every leg is routed even after
/// one fails, and the last leg's classification is the request's outcome.
pub fn run_route_with(
    factory: &CostFactory,
    graph: &Graph,
    config: &RouteConfig,
    request: &RouteRequest,
    options: &RouteOptions,
) -> Result<RouteRun> {
    let started = Instant::now();
    let (mut costing, mode) = resolve_mode_costing(factory, config, request)?;

    let waypoints = &request.locations;
    let (first, last) = match waypoints.as_slice() {
        [first, .., last] => (first.latlng, last.latlng),
        _ => {
            return Err(Error::invalid_location(
                "locations",
                "a route needs at least two locations",
            ))
        }
    };
    let mut stats = RunStatistics::new(first, last);
    for waypoint in waypoints {
        debug!(location = %waypoint.to_json(), "waypoint");
    }

    let locate_started = Instant::now();
    let locations = match correlate(graph, &costing, mode, request) {
        Some(locations) => locations,
        None => {
            stats.set_outcome(Outcome::FailInvalidOrigin);
            return Ok(finish(stats, Vec::new()));
        }
    };

    if options.connectivity_check && !check_connectivity(graph, &locations) {
        info!("No tile connectivity between locations");
        stats.set_outcome(Outcome::FailNoConnectivity);
        return Ok(finish(stats, Vec::new()));
    }
    info!(
        "Location Processing took {} ms",
        locate_started.elapsed().as_millis()
    );

    let units = request.directions_options.units;
    let mut algorithms = Algorithms::new();
    let mut legs = Vec::with_capacity(locations.len() - 1);
    let (mut trip_time, mut trip_distance, mut maneuvers) = (0.0, 0.0, 0u32);

    for (i, pair) in locations.windows(2).enumerate() {
        let (origin, destination) = (&pair[0], &pair[1]);
        costing.reset_relaxation();

        let strategy = select_algorithm(origin, destination, &request.route_type);
        debug!(leg = i, strategy = strategy.as_str(), "routing leg");
        let search = compute_leg(
            graph,
            origin,
            destination,
            algorithms.get_mut(strategy),
            strategy,
            &mut costing,
            mode,
            &mut stats,
            options.repeat,
        );

        if !search.found() {
            algorithms.get_mut(strategy).clear();
            let outcome = classify_failure(origin, destination);
            log_way_ids(graph, origin, destination);
            stats.set_outcome(outcome);
            legs.push(LegReport {
                strategy,
                passes: search.passes,
                outcome,
                directions: None,
            });
            continue;
        }

        let trip_started = Instant::now();
        let trip = TripPath::build(graph, &search.path, origin, destination);
        let directions = TripDirections::build(&request.directions_options, &trip);
        directions.log_narrative(&origin.waypoint, &destination.waypoint);
        info!(
            "trip_processing_time (ms)::{}",
            trip_started.elapsed().as_millis()
        );
        info!("trip_time (secs)::{:.0}", directions.summary.time);
        info!("trip_length (meters)::{:.1}", trip.length());

        trip_time += directions.summary.time;
        trip_distance += directions.summary.length;
        maneuvers += directions.maneuvers.len() as u32;
        stats.set_trip_time(trip_time);
        stats.set_trip_distance(trip_distance);
        stats.set_maneuver_count(maneuvers);
        stats.set_outcome(Outcome::Success);
        legs.push(LegReport {
            strategy,
            passes: search.passes,
            outcome: Outcome::Success,
            directions: Some(directions),
        });
    }

    let straight_km: f64 = waypoints
        .windows(2)
        .map(|pair| pair[0].latlng.distance(&pair[1].latlng) * KM_PER_METER)
        .sum();
    stats.set_straight_line_distance(units.from_km(straight_km));

    let elapsed = started.elapsed();
    info!("Total time= {} ms", elapsed.as_millis());
    stats.add_runtime(elapsed);
    Ok(finish(stats, legs))
}

/// Correlate every waypoint with the active cost model's filters.
fn correlate(
    graph: &Graph,
    costing: &ModeCosting,
    mode: TravelMode,
    request: &RouteRequest,
) -> Option<Vec<PathLocation>> {
    let Some(cost) = costing.get(mode) else {
        warn!(%mode, "no cost model for the active mode");
        return None;
    };
    match Correlator::new(graph).correlate_all(&request.locations, cost) {
        Ok(locations) => Some(locations),
        Err(err) => {
            warn!(error = %err, "location correlation failed");
            None
        }
    }
}

fn log_way_ids(graph: &Graph, origin: &PathLocation, destination: &PathLocation) {
    for (label, location) in [("Origin", origin), ("Destination", destination)] {
        for candidate in &location.edges {
            let Some(edge) = graph.edge(candidate.id) else {
                continue;
            };
            if edge.unreachable {
                info!("{label} edge is unconnected: wayid = {}", edge.way_id);
            }
            info!("{label} wayId = {}", edge.way_id);
        }
    }
}

fn finish(stats: RunStatistics, legs: Vec<LegReport>) -> RouteRun {
    let record = stats.emit();
    RouteRun {
        record,
        statistics: stats,
        legs,
    }
}
