//! Tileroute library entry points.
//!
//! This crate loads a tiled road graph, resolves per-mode cost models from
//! layered configuration, correlates waypoints to candidate edges and drives
//! the adaptive multi-pass route search, reporting every request as one
//! statistics record. Higher-level consumers (the CLI, benches) should only
//! depend on the functions exported here instead of reimplementing behavior.

#![deny(warnings)]

pub mod config;
pub mod connectivity;
pub mod correlate;
pub mod costing;
pub mod error;
pub mod geo;
pub mod graph;
pub mod location;
pub mod path;
pub mod request;
pub mod routing;
pub mod spatial;
pub mod stats;
pub mod trip;

pub use config::RouteConfig;
pub use connectivity::{check_connectivity, ConnectivityMap};
pub use correlate::{Correlator, PathEdge, PathLocation};
pub use costing::{resolve_costing, CostFactory, DynamicCost, ModeCosting, TravelMode};
pub use error::{Error, Result};
pub use geo::LatLng;
pub use graph::{load_graph, parse_graph, EdgeSpec, Graph, GraphBuilder};
pub use location::{StopType, Waypoint};
pub use path::{
    AStarPathAlgorithm, BidirectionalAStar, MultiModalPathAlgorithm, PathAlgorithm, PathInfo,
};
pub use request::{DirectionsOptions, RouteRequest, RouteType, Units};
pub use routing::{
    compute_leg, resolve_mode_costing, run_route, run_route_with, select_algorithm, LegReport,
    LegSearch, PathStrategy, RouteOptions, RouteRun,
};
pub use stats::{classify_failure, Outcome, RunStatistics, StatisticsRecord};
pub use trip::{format_duration, TripDirections, TripPath};
