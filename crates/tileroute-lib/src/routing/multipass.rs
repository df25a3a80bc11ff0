//! Escalating search passes for one leg.

use std::time::Instant;

use tracing::{debug, info};

use super::planner::PathStrategy;
use crate::correlate::PathLocation;
use crate::costing::{ModeCosting, TravelMode};
use crate::graph::Graph;
use crate::path::{PathAlgorithm, PathInfo};
use crate::stats::RunStatistics;

/// Up-transition factor for the second pass of a direct search.
pub const DIRECT_RELAX_FACTOR: f64 = 16.0;
/// Expansion distance factor for the second pass of a direct search.
pub const DIRECT_EXPANSION_WITHIN_FACTOR: f64 = 4.0;
/// Up-transition factor for the second pass of other searches.
pub const RELAX_FACTOR: f64 = 8.0;
/// Expansion distance factor for the second pass of other searches.
pub const EXPANSION_WITHIN_FACTOR: f64 = 2.0;

fn relax_factors(strategy: PathStrategy) -> (f64, f64) {
    match strategy {
        PathStrategy::Direct => (DIRECT_RELAX_FACTOR, DIRECT_EXPANSION_WITHIN_FACTOR),
        PathStrategy::Bidirectional | PathStrategy::Multimodal => {
            (RELAX_FACTOR, EXPANSION_WITHIN_FACTOR)
        }
    }
}

/// Outcome of the passes run for one leg.
#[derive(Debug, Clone, Default)]
pub struct LegSearch {
    /// Edges of the best path; empty when every pass failed.
    pub path: Vec<PathInfo>,
    /// Passes run for this leg alone.
    pub passes: u32,
}

impl LegSearch {
    pub fn found(&self) -> bool {
        !self.path.is_empty()
    }
}

/// Compute the best path of one leg, escalating on empty results.
///
/// The first pass runs with the cost model as it stands. When it comes back
/// empty and the model allows multiple passes, the engine is cleared and the
/// hierarchy limits relaxed for a second pass. A direct search that still
/// fails gets a third pass with highway transitions disabled. Every pass is
/// recorded on `stats`.
///
/// On success the engine is cleared, then the search is re-run `repeat`
/// times purely to time it; those runs only feed the rerun timing.
#[allow(clippy::too_many_arguments)]
pub fn compute_leg(
    graph: &Graph,
    origin: &PathLocation,
    destination: &PathLocation,
    algorithm: &mut dyn PathAlgorithm,
    strategy: PathStrategy,
    costing: &mut ModeCosting,
    mode: TravelMode,
    stats: &mut RunStatistics,
    repeat: u32,
) -> LegSearch {
    let started = Instant::now();
    let passes_before = stats.passes();
    let path = escalate(
        graph,
        origin,
        destination,
        algorithm,
        strategy,
        costing,
        mode,
        stats,
    );
    let leg = LegSearch {
        path,
        passes: stats.passes() - passes_before,
    };
    if !leg.found() {
        return leg;
    }

    info!(
        algorithm = algorithm.name(),
        passes = leg.passes,
        "GetBestPath took {} ms",
        started.elapsed().as_millis()
    );
    algorithm.clear();

    if repeat > 0 {
        for _ in 0..repeat {
            let rerun = Instant::now();
            algorithm.get_best_path(graph, origin, destination, costing, mode);
            stats.record_rerun(rerun.elapsed());
            algorithm.clear();
        }
        let timing = stats.rerun();
        info!(
            algorithm = algorithm.name(),
            runs = timing.runs,
            "GetBestPath average: {} ms",
            timing.average_ms()
        );
    }
    leg
}

#[allow(clippy::too_many_arguments)]
fn escalate(
    graph: &Graph,
    origin: &PathLocation,
    destination: &PathLocation,
    algorithm: &mut dyn PathAlgorithm,
    strategy: PathStrategy,
    costing: &mut ModeCosting,
    mode: TravelMode,
    stats: &mut RunStatistics,
) -> Vec<PathInfo> {
    let path = run_pass(graph, origin, destination, algorithm, costing, mode, stats, 1);
    if !path.is_empty() {
        return path;
    }

    let eligible = costing.get(mode).is_some_and(|cost| cost.allow_multi_pass());
    if !eligible {
        debug!(algorithm = algorithm.name(), %mode, "multi-pass not allowed");
        return path;
    }

    algorithm.clear();
    let (relax, expansion) = relax_factors(strategy);
    if let Some(cost) = costing.get_mut(mode) {
        cost.relax_hierarchy_limits(relax, expansion);
    }
    let path = run_pass(graph, origin, destination, algorithm, costing, mode, stats, 2);
    if !path.is_empty() || strategy != PathStrategy::Direct {
        return path;
    }

    algorithm.clear();
    if let Some(cost) = costing.get_mut(mode) {
        cost.disable_highway_transitions();
    }
    run_pass(graph, origin, destination, algorithm, costing, mode, stats, 3)
}

#[allow(clippy::too_many_arguments)]
fn run_pass(
    graph: &Graph,
    origin: &PathLocation,
    destination: &PathLocation,
    algorithm: &mut dyn PathAlgorithm,
    costing: &ModeCosting,
    mode: TravelMode,
    stats: &mut RunStatistics,
    attempt: u32,
) -> Vec<PathInfo> {
    let path = algorithm.get_best_path(graph, origin, destination, costing, mode);
    stats.record_pass();
    debug!(
        algorithm = algorithm.name(),
        attempt,
        edges = path.len(),
        "search pass finished"
    );
    path
}
