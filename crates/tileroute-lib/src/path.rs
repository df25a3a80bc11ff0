//! Edge-based search engines.
//!
//! Three engines share the [`PathAlgorithm`] contract:
//! - [`AStarPathAlgorithm`] - forward A*, straight-line heuristic
//! - [`BidirectionalAStar`] - forward and reverse Dijkstra meeting at a node
//! - [`MultiModalPathAlgorithm`] - forward Dijkstra whose labels carry a
//!   travel mode, switching between walking and transit
//!
//! Labels are kept per directed edge. Every engine honours the hierarchy
//! limits of the cost model it expands with, so relaxing or resetting those
//! limits between calls changes what the next search can reach. Working
//! state survives a call until [`PathAlgorithm::clear`] is invoked.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, HashSet};

use serde::Serialize;
use tracing::{debug, warn};

use crate::correlate::PathLocation;
use crate::costing::{Cost, ModeCosting, RelaxationState, TravelMode};
use crate::geo::LatLng;
use crate::graph::{DirectedEdge, EdgeId, Graph};

/// Hierarchy levels whose up-transitions are counted per path.
const TRACKED_LEVELS: usize = 4;

/// One edge of a search result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PathInfo {
    pub edge: EdgeId,
    pub mode: TravelMode,
    /// Seconds elapsed at the end of this edge.
    pub elapsed: f64,
    /// Cost accumulated at the end of this edge.
    pub cost: f64,
}

/// Common contract of the search engines.
pub trait PathAlgorithm {
    fn name(&self) -> &'static str;

    /// Best path from any origin candidate to any destination candidate
    /// using the cost model registered for `mode`. Empty when none is found.
    fn get_best_path(
        &mut self,
        graph: &Graph,
        origin: &PathLocation,
        destination: &PathLocation,
        costing: &ModeCosting,
        mode: TravelMode,
    ) -> Vec<PathInfo>;

    /// Drop all working state (labels, queues, settled sets).
    fn clear(&mut self);
}

/// Forward A* over directed edges.
#[derive(Debug, Default)]
pub struct AStarPathAlgorithm {
    search: ForwardSearch,
}

impl AStarPathAlgorithm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_clear(&self) -> bool {
        self.search.is_clear()
    }
}

impl PathAlgorithm for AStarPathAlgorithm {
    fn name(&self) -> &'static str {
        "astar"
    }

    fn get_best_path(
        &mut self,
        graph: &Graph,
        origin: &PathLocation,
        destination: &PathLocation,
        costing: &ModeCosting,
        mode: TravelMode,
    ) -> Vec<PathInfo> {
        self.search
            .run(graph, origin, destination, costing, mode, SearchKind::AStar)
    }

    fn clear(&mut self) {
        self.search.clear();
    }
}

/// Forward Dijkstra with mode switching between walking and transit.
#[derive(Debug, Default)]
pub struct MultiModalPathAlgorithm {
    search: ForwardSearch,
}

impl MultiModalPathAlgorithm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_clear(&self) -> bool {
        self.search.is_clear()
    }
}

impl PathAlgorithm for MultiModalPathAlgorithm {
    fn name(&self) -> &'static str {
        "multimodal"
    }

    fn get_best_path(
        &mut self,
        graph: &Graph,
        origin: &PathLocation,
        destination: &PathLocation,
        costing: &ModeCosting,
        mode: TravelMode,
    ) -> Vec<PathInfo> {
        self.search
            .run(graph, origin, destination, costing, mode, SearchKind::MultiModal)
    }

    fn clear(&mut self) {
        self.search.clear();
    }
}

/// Bidirectional search: a forward tree from the origin candidates and a
/// reverse tree from the destination candidates, joined across a node.
#[derive(Debug, Default)]
pub struct BidirectionalAStar {
    forward: SearchTree,
    reverse: SearchTree,
}

impl BidirectionalAStar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_clear(&self) -> bool {
        self.forward.is_clear() && self.reverse.is_clear()
    }
}

impl PathAlgorithm for BidirectionalAStar {
    fn name(&self) -> &'static str {
        "bidirectional_astar"
    }

    fn get_best_path(
        &mut self,
        graph: &Graph,
        origin: &PathLocation,
        destination: &PathLocation,
        costing: &ModeCosting,
        mode: TravelMode,
    ) -> Vec<PathInfo> {
        if !self.is_clear() {
            warn!(engine = self.name(), "search state was not cleared");
            self.clear();
        }
        let Some(cost) = costing.get(mode) else {
            warn!(%mode, "no cost model registered");
            return Vec::new();
        };
        if let Some(trivial) = trivial_path(graph, origin, destination, costing, mode) {
            return trivial;
        }

        let ends = SearchEnds::new(origin, destination);
        let relaxation = cost.relaxation();

        for candidate in &origin.edges {
            if let Some(edge) = graph.edge(candidate.id).filter(|e| cost.allowed(e)) {
                let c = cost
                    .edge_cost(edge)
                    .scaled(1.0 - candidate.percent_along);
                self.forward.push(EdgeLabel::seed(edge.id, mode, c));
            }
        }
        for candidate in &destination.edges {
            if let Some(edge) = graph.edge(candidate.id).filter(|e| cost.allowed(e)) {
                let c = cost.edge_cost(edge).scaled(candidate.percent_along);
                self.reverse.push(EdgeLabel::seed(edge.id, mode, c));
            }
        }

        // (total cost, forward label, reverse label)
        let mut best: Option<(f64, usize, usize)> = None;
        let mut expansions = 0usize;

        loop {
            let top_f = self.forward.top_cost();
            let top_r = self.reverse.top_cost();
            let bound = best.map(|b| b.0).unwrap_or(f64::INFINITY);
            if top_f + top_r >= bound {
                break;
            }

            if top_f <= top_r {
                let Some(idx) = self.forward.pop_unsettled() else {
                    continue;
                };
                expansions += 1;
                let label = self.forward.labels[idx].clone();
                let Some(edge) = graph.edge(label.edge) else {
                    continue;
                };
                let Some(node) = graph.node(edge.to) else {
                    continue;
                };
                if !cost.allowed_node(node) {
                    continue;
                }
                for next in graph.outgoing(edge.to) {
                    if is_u_turn(edge, next) || !cost.allowed(next) {
                        continue;
                    }
                    let Some(transitions) =
                        up_transition(relaxation, edge, next, label.transitions)
                    else {
                        continue;
                    };
                    if !ends.within_expansion(relaxation, graph, next) {
                        continue;
                    }
                    let step = cost.transition_cost(edge, next);
                    if let Some(&r) = self.reverse.best.get(&next.id) {
                        let total = label.cost + step.cost + self.reverse.labels[r].cost;
                        if best.map_or(true, |b| total < b.0) {
                            best = Some((total, idx, r));
                        }
                    }
                    if self.forward.settled.contains(&next.id) {
                        continue;
                    }
                    let c = label.total() + step + cost.edge_cost(next);
                    self.forward.relax(EdgeLabel {
                        edge: next.id,
                        pred: Some(idx),
                        mode,
                        cost: c.cost,
                        secs: c.secs,
                        transitions,
                        destination: false,
                    });
                }
            } else {
                let Some(idx) = self.reverse.pop_unsettled() else {
                    continue;
                };
                expansions += 1;
                let label = self.reverse.labels[idx].clone();
                let Some(edge) = graph.edge(label.edge) else {
                    continue;
                };
                let Some(node) = graph.node(edge.from) else {
                    continue;
                };
                if !cost.allowed_node(node) {
                    continue;
                }
                for prev in graph.incoming(edge.from) {
                    if is_u_turn(prev, edge) || !cost.allowed(prev) {
                        continue;
                    }
                    let Some(transitions) =
                        up_transition(relaxation, prev, edge, label.transitions)
                    else {
                        continue;
                    };
                    if !ends.within_expansion(relaxation, graph, prev) {
                        continue;
                    }
                    let step = cost.transition_cost(prev, edge);
                    if let Some(&f) = self.forward.best.get(&prev.id) {
                        let total = self.forward.labels[f].cost + step.cost + label.cost;
                        if best.map_or(true, |b| total < b.0) {
                            best = Some((total, f, idx));
                        }
                    }
                    if self.reverse.settled.contains(&prev.id) {
                        continue;
                    }
                    let c = label.total() + step + cost.edge_cost(prev);
                    self.reverse.relax(EdgeLabel {
                        edge: prev.id,
                        pred: Some(idx),
                        mode,
                        cost: c.cost,
                        secs: c.secs,
                        transitions,
                        destination: false,
                    });
                }
            }
        }

        debug!(engine = self.name(), expansions, found = best.is_some(), "search finished");
        let Some((_, f, r)) = best else {
            return Vec::new();
        };

        let mut edges: Vec<(EdgeId, TravelMode)> = self
            .forward
            .chain(f)
            .into_iter()
            .rev()
            .map(|l| (l.edge, l.mode))
            .collect();
        edges.extend(self.reverse.chain(r).into_iter().map(|l| (l.edge, l.mode)));
        accumulate(graph, &edges, origin, destination, costing)
    }

    fn clear(&mut self) {
        self.forward.clear();
        self.reverse.clear();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SearchKind {
    AStar,
    MultiModal,
}

impl SearchKind {
    /// Modes a label in `mode` may continue in.
    fn next_modes(self, mode: TravelMode) -> &'static [TravelMode] {
        match (self, mode) {
            (SearchKind::MultiModal, TravelMode::Pedestrian) => {
                &[TravelMode::Pedestrian, TravelMode::PublicTransit]
            }
            (SearchKind::MultiModal, TravelMode::PublicTransit) => {
                &[TravelMode::PublicTransit, TravelMode::Pedestrian]
            }
            (_, TravelMode::Drive) => &[TravelMode::Drive],
            (_, TravelMode::Pedestrian) => &[TravelMode::Pedestrian],
            (_, TravelMode::Bicycle) => &[TravelMode::Bicycle],
            (_, TravelMode::PublicTransit) => &[TravelMode::PublicTransit],
        }
    }
}

/// Working state of a forward search.
#[derive(Debug, Default)]
struct ForwardSearch {
    labels: Vec<EdgeLabel>,
    best: HashMap<(EdgeId, TravelMode), usize>,
    settled: HashSet<(EdgeId, TravelMode)>,
    queue: BinaryHeap<AStarEntry>,
}

impl ForwardSearch {
    fn is_clear(&self) -> bool {
        self.labels.is_empty()
            && self.best.is_empty()
            && self.settled.is_empty()
            && self.queue.is_empty()
    }

    fn clear(&mut self) {
        self.labels.clear();
        self.best.clear();
        self.settled.clear();
        self.queue.clear();
    }

    fn push(&mut self, label: EdgeLabel, heuristic: f64) {
        let idx = self.labels.len();
        if !label.destination {
            self.best.insert((label.edge, label.mode), idx);
        }
        self.queue.push(AStarEntry::new(idx, label.cost, heuristic));
        self.labels.push(label);
    }

    fn run(
        &mut self,
        graph: &Graph,
        origin: &PathLocation,
        destination: &PathLocation,
        costing: &ModeCosting,
        mode: TravelMode,
        kind: SearchKind,
    ) -> Vec<PathInfo> {
        if !self.is_clear() {
            warn!(?kind, "search state was not cleared");
            self.clear();
        }
        let Some(cost) = costing.get(mode) else {
            warn!(%mode, "no cost model registered");
            return Vec::new();
        };
        if let Some(trivial) = trivial_path(graph, origin, destination, costing, mode) {
            return trivial;
        }

        let ends = SearchEnds::new(origin, destination);
        let target = destination.latlng();
        let factor = match kind {
            SearchKind::AStar => cost.astar_cost_factor(),
            SearchKind::MultiModal => 0.0,
        };
        let heuristic = |edge: &DirectedEdge| -> f64 {
            graph
                .latlng(edge.to)
                .map(|p| p.distance(&target) * factor)
                .unwrap_or(0.0)
        };
        let destinations: HashMap<EdgeId, f64> = destination
            .edges
            .iter()
            .map(|c| (c.id, c.percent_along))
            .collect();

        for candidate in &origin.edges {
            if let Some(edge) = graph.edge(candidate.id).filter(|e| cost.allowed(e)) {
                let c = cost
                    .edge_cost(edge)
                    .scaled(1.0 - candidate.percent_along);
                self.push(EdgeLabel::seed(edge.id, mode, c), heuristic(edge));
            }
        }

        let mut expansions = 0usize;
        while let Some(entry) = self.queue.pop() {
            let idx = entry.label;
            let label = self.labels[idx].clone();
            if label.destination {
                debug!(?kind, expansions, "search reached destination");
                let edges: Vec<_> = self
                    .chain(idx)
                    .into_iter()
                    .rev()
                    .map(|l| (l.edge, l.mode))
                    .collect();
                return accumulate(graph, &edges, origin, destination, costing);
            }
            if !self.settled.insert((label.edge, label.mode)) {
                continue;
            }
            expansions += 1;

            let Some(edge) = graph.edge(label.edge) else {
                continue;
            };
            let Some(node) = graph.node(edge.to) else {
                continue;
            };

            for next in graph.outgoing(edge.to) {
                if is_u_turn(edge, next) {
                    continue;
                }
                for &next_mode in kind.next_modes(label.mode) {
                    let Some(next_cost) = costing.get(next_mode) else {
                        continue;
                    };
                    if !next_cost.allowed(next) || !next_cost.allowed_node(node) {
                        continue;
                    }
                    let relaxation = next_cost.relaxation();
                    let Some(transitions) =
                        up_transition(relaxation, edge, next, label.transitions)
                    else {
                        continue;
                    };
                    if !ends.within_expansion(relaxation, graph, next) {
                        continue;
                    }

                    let mut step = next_cost.transition_cost(edge, next);
                    if next_mode != label.mode {
                        step = step + next_cost.mode_switch_cost();
                    }
                    let base = label.total() + step;

                    if let Some(&percent) = destinations.get(&next.id) {
                        let arrive = base + next_cost.edge_cost(next).scaled(percent);
                        self.push(
                            EdgeLabel {
                                edge: next.id,
                                pred: Some(idx),
                                mode: next_mode,
                                cost: arrive.cost,
                                secs: arrive.secs,
                                transitions,
                                destination: true,
                            },
                            0.0,
                        );
                    }

                    let key = (next.id, next_mode);
                    if self.settled.contains(&key) {
                        continue;
                    }
                    let full = base + next_cost.edge_cost(next);
                    let improves = self
                        .best
                        .get(&key)
                        .map_or(true, |&b| full.cost < self.labels[b].cost);
                    if improves {
                        self.push(
                            EdgeLabel {
                                edge: next.id,
                                pred: Some(idx),
                                mode: next_mode,
                                cost: full.cost,
                                secs: full.secs,
                                transitions,
                                destination: false,
                            },
                            heuristic(next),
                        );
                    }
                }
            }
        }

        debug!(?kind, expansions, "search exhausted without reaching destination");
        Vec::new()
    }

    fn chain(&self, idx: usize) -> Vec<&EdgeLabel> {
        chain(&self.labels, idx)
    }
}

/// One direction of the bidirectional search.
#[derive(Debug, Default)]
struct SearchTree {
    labels: Vec<EdgeLabel>,
    best: HashMap<EdgeId, usize>,
    settled: HashSet<EdgeId>,
    queue: BinaryHeap<QueueEntry>,
}

impl SearchTree {
    fn is_clear(&self) -> bool {
        self.labels.is_empty()
            && self.best.is_empty()
            && self.settled.is_empty()
            && self.queue.is_empty()
    }

    fn clear(&mut self) {
        self.labels.clear();
        self.best.clear();
        self.settled.clear();
        self.queue.clear();
    }

    fn push(&mut self, label: EdgeLabel) {
        let idx = self.labels.len();
        self.best.insert(label.edge, idx);
        self.queue.push(QueueEntry::new(idx, label.cost));
        self.labels.push(label);
    }

    fn relax(&mut self, label: EdgeLabel) {
        let improves = self
            .best
            .get(&label.edge)
            .map_or(true, |&b| label.cost < self.labels[b].cost);
        if improves {
            self.push(label);
        }
    }

    fn top_cost(&self) -> f64 {
        self.queue
            .peek()
            .map(|entry| entry.cost.0)
            .unwrap_or(f64::INFINITY)
    }

    /// Pop the cheapest label and settle its edge; `None` for stale entries.
    fn pop_unsettled(&mut self) -> Option<usize> {
        let entry = self.queue.pop()?;
        let edge = self.labels[entry.label].edge;
        if self.settled.insert(edge) {
            Some(entry.label)
        } else {
            None
        }
    }

    fn chain(&self, idx: usize) -> Vec<&EdgeLabel> {
        chain(&self.labels, idx)
    }
}

#[derive(Debug, Clone)]
struct EdgeLabel {
    edge: EdgeId,
    pred: Option<usize>,
    mode: TravelMode,
    cost: f64,
    secs: f64,
    transitions: UpTransitions,
    /// Label ends at the destination point part way along the edge.
    destination: bool,
}

impl EdgeLabel {
    fn seed(edge: EdgeId, mode: TravelMode, cost: Cost) -> Self {
        Self {
            edge,
            pred: None,
            mode,
            cost: cost.cost,
            secs: cost.secs,
            transitions: UpTransitions::default(),
            destination: false,
        }
    }

    fn total(&self) -> Cost {
        Cost::new(self.cost, self.secs)
    }
}

/// Up-transitions made so far, per source level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct UpTransitions([u32; TRACKED_LEVELS]);

impl UpTransitions {
    fn count(&self, level: u8) -> u32 {
        self.0.get(level as usize).copied().unwrap_or(0)
    }

    fn record(mut self, level: u8) -> Self {
        if let Some(count) = self.0.get_mut(level as usize) {
            *count = count.saturating_add(1);
        }
        self
    }
}

/// Check a move from `from` onto `to` against the up-transition limits.
fn up_transition(
    relaxation: &RelaxationState,
    from: &DirectedEdge,
    to: &DirectedEdge,
    transitions: UpTransitions,
) -> Option<UpTransitions> {
    if to.level >= from.level {
        return Some(transitions);
    }
    relaxation
        .allows_up_transition(from.level, to.level, transitions.count(from.level))
        .then(|| transitions.record(from.level))
}

struct SearchEnds {
    origin: LatLng,
    destination: LatLng,
}

impl SearchEnds {
    fn new(origin: &PathLocation, destination: &PathLocation) -> Self {
        Self {
            origin: origin.latlng(),
            destination: destination.latlng(),
        }
    }

    /// Whether `edge` starts close enough to either end to be expanded.
    fn within_expansion(
        &self,
        relaxation: &RelaxationState,
        graph: &Graph,
        edge: &DirectedEdge,
    ) -> bool {
        let Some(start) = graph.latlng(edge.from) else {
            return false;
        };
        let nearest = start
            .distance(&self.origin)
            .min(start.distance(&self.destination));
        relaxation.allows_expansion(edge.level, nearest)
    }
}

fn is_u_turn(from: &DirectedEdge, to: &DirectedEdge) -> bool {
    from.from == to.to && from.to == to.from && from.way_id == to.way_id
}

fn chain(labels: &[EdgeLabel], idx: usize) -> Vec<&EdgeLabel> {
    let mut out = Vec::new();
    let mut current = Some(idx);
    while let Some(i) = current {
        out.push(&labels[i]);
        current = labels[i].pred;
    }
    out
}

/// Cheapest single-edge path, when an origin and a destination candidate lie
/// on the same edge with the destination not behind the origin.
fn trivial_path(
    graph: &Graph,
    origin: &PathLocation,
    destination: &PathLocation,
    costing: &ModeCosting,
    mode: TravelMode,
) -> Option<Vec<PathInfo>> {
    let cost = costing.get(mode)?;
    let (edge, _) = origin
        .edges
        .iter()
        .filter_map(|o| {
            let d = destination.edge(o.id)?;
            if d.percent_along < o.percent_along {
                return None;
            }
            let edge = graph.edge(o.id).filter(|e| cost.allowed(e))?;
            let c = cost
                .edge_cost(edge)
                .scaled(d.percent_along - o.percent_along);
            Some((edge.id, c.cost))
        })
        .min_by(|a, b| a.1.total_cmp(&b.1))?;
    Some(accumulate(graph, &[(edge, mode)], origin, destination, costing))
}

/// Turn an edge sequence into [`PathInfo`] with cumulative time and cost,
/// trimming the first and last edges at the candidates' positions.
fn accumulate(
    graph: &Graph,
    edges: &[(EdgeId, TravelMode)],
    origin: &PathLocation,
    destination: &PathLocation,
    costing: &ModeCosting,
) -> Vec<PathInfo> {
    let last = edges.len().saturating_sub(1);
    let mut total = Cost::default();
    let mut prev: Option<(&DirectedEdge, TravelMode)> = None;
    let mut path = Vec::with_capacity(edges.len());

    for (i, &(id, mode)) in edges.iter().enumerate() {
        let (Some(edge), Some(cost)) = (graph.edge(id), costing.get(mode)) else {
            warn!(edge = %id, %mode, "path edge without graph entry or cost model");
            return Vec::new();
        };
        let start = if i == 0 {
            origin.edge(id).map_or(0.0, |c| c.percent_along)
        } else {
            0.0
        };
        let end = if i == last {
            destination.edge(id).map_or(1.0, |c| c.percent_along)
        } else {
            1.0
        };

        if let Some((p, p_mode)) = prev {
            total = total + cost.transition_cost(p, edge);
            if p_mode != mode {
                total = total + cost.mode_switch_cost();
            }
        }
        total = total + cost.edge_cost(edge).scaled((end - start).max(0.0));
        path.push(PathInfo {
            edge: id,
            mode,
            elapsed: total.secs,
            cost: total.cost,
        });
        prev = Some((edge, mode));
    }
    path
}

#[derive(Copy, Clone, Debug, Default)]
struct FloatOrd(f64);

impl PartialEq for FloatOrd {
    fn eq(&self, other: &Self) -> bool {
        self.0.eq(&other.0)
    }
}

impl Eq for FloatOrd {}

impl PartialOrd for FloatOrd {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FloatOrd {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
struct QueueEntry {
    label: usize,
    cost: FloatOrd,
}

impl QueueEntry {
    fn new(label: usize, cost: f64) -> Self {
        Self {
            label,
            cost: FloatOrd(cost),
        }
    }
}

impl Ord for QueueEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering so BinaryHeap becomes a min-heap by cost.
        other
            .cost
            .cmp(&self.cost)
            .then_with(|| other.label.cmp(&self.label))
    }
}

impl PartialOrd for QueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
struct AStarEntry {
    label: usize,
    cost: FloatOrd,
    estimate: FloatOrd,
}

impl AStarEntry {
    fn new(label: usize, cost: f64, heuristic: f64) -> Self {
        Self {
            label,
            cost: FloatOrd(cost),
            estimate: FloatOrd(cost + heuristic),
        }
    }
}

impl Ord for AStarEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .estimate
            .cmp(&self.estimate)
            .then_with(|| other.cost.cmp(&self.cost))
            .then_with(|| other.label.cmp(&self.label))
    }
}

impl PartialOrd for AStarEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::correlate::Correlator;
    use crate::costing::{create_auto_cost, create_pedestrian_cost, create_transit_cost};
    use crate::graph::{Access, AccessMask, EdgeSpec};
    use crate::location::Waypoint;
    use serde_json::json;

    /// A 4-node street along lat 40 plus a slower detour through node 5.
    fn street() -> Graph {
        Graph::builder()
            .node(1, 40.0, -75.0)
            .node(2, 40.0, -74.99)
            .node(3, 40.0, -74.98)
            .node(4, 40.0, -74.97)
            .node(5, 40.01, -74.98)
            .edge(EdgeSpec::new(1, 1, 2).two_way(2).name("Market Street").way_id(1))
            .edge(EdgeSpec::new(3, 2, 3).two_way(4).name("Market Street").way_id(1))
            .edge(EdgeSpec::new(5, 3, 4).two_way(6).name("Market Street").way_id(1))
            .edge(EdgeSpec::new(7, 2, 5).two_way(8).speed(20.0).way_id(2))
            .edge(EdgeSpec::new(9, 5, 4).two_way(10).speed(20.0).way_id(3))
            .build()
            .expect("graph")
    }

    fn auto_costing() -> ModeCosting {
        let mut costing = ModeCosting::new();
        costing.insert(create_auto_cost(&json!({})).expect("auto"));
        costing
    }

    fn locate(graph: &Graph, costing: &ModeCosting, lat: f64, lng: f64) -> PathLocation {
        let cost = costing.get(TravelMode::Drive).expect("drive");
        Correlator::new(graph)
            .correlate(&Waypoint::new(lat, lng), cost)
            .expect("correlates")
    }

    fn edge_ids(path: &[PathInfo]) -> Vec<u64> {
        path.iter().map(|p| p.edge.0).collect()
    }

    #[test]
    fn same_edge_ahead_is_trivial() {
        let graph = street();
        let costing = auto_costing();
        let origin = locate(&graph, &costing, 40.0, -74.998);
        let destination = locate(&graph, &costing, 40.0, -74.992);

        let mut astar = AStarPathAlgorithm::new();
        let path = astar.get_best_path(&graph, &origin, &destination, &costing, TravelMode::Drive);
        assert_eq!(edge_ids(&path), vec![1]);
        assert!(astar.is_clear());

        let full = costing
            .get(TravelMode::Drive)
            .unwrap()
            .edge_cost(graph.edge(EdgeId(1)).unwrap());
        assert!((path[0].elapsed - full.secs * 0.6).abs() < 0.5);
    }

    #[test]
    fn astar_and_bidirectional_agree() {
        let graph = street();
        let costing = auto_costing();
        let origin = locate(&graph, &costing, 40.0, -74.995);
        let destination = locate(&graph, &costing, 40.0, -74.975);

        let mut astar = AStarPathAlgorithm::new();
        let a = astar.get_best_path(&graph, &origin, &destination, &costing, TravelMode::Drive);
        let mut bidir = BidirectionalAStar::new();
        let b = bidir.get_best_path(&graph, &origin, &destination, &costing, TravelMode::Drive);

        assert_eq!(edge_ids(&a), vec![1, 3, 5]);
        assert_eq!(edge_ids(&b), vec![1, 3, 5]);
        let (ca, cb) = (a.last().unwrap().cost, b.last().unwrap().cost);
        assert!((ca - cb).abs() < 1e-6, "{ca} vs {cb}");
        assert!(!astar.is_clear());
        astar.clear();
        bidir.clear();
        assert!(astar.is_clear() && bidir.is_clear());
    }

    #[test]
    fn destination_behind_origin_on_one_way_fails() {
        let graph = Graph::builder()
            .node(1, 40.0, -75.0)
            .node(2, 40.0, -74.99)
            .edge(EdgeSpec::new(1, 1, 2))
            .build()
            .expect("graph");
        let costing = auto_costing();
        let origin = locate(&graph, &costing, 40.0, -74.992);
        let destination = locate(&graph, &costing, 40.0, -74.998);

        let mut astar = AStarPathAlgorithm::new();
        assert!(astar
            .get_best_path(&graph, &origin, &destination, &costing, TravelMode::Drive)
            .is_empty());
    }

    #[test]
    fn expansion_limit_blocks_distant_local_edges() {
        // 12 km of local road, no edge near the middle is within 5 km of an end.
        let mut builder = Graph::builder();
        for i in 0..=12u32 {
            builder = builder.node(i + 1, 0.0, i as f64 * 0.008_993);
        }
        for i in 0..12u32 {
            let forward = u64::from(i) * 2 + 1;
            builder = builder.edge(EdgeSpec::new(forward, i + 1, i + 2).two_way(forward + 1));
        }
        let graph = builder.build().expect("graph");
        let mut costing = auto_costing();
        let origin = locate(&graph, &costing, 0.0, 0.004);
        let destination = locate(&graph, &costing, 0.0, 0.1035);

        let mut bidir = BidirectionalAStar::new();
        assert!(bidir
            .get_best_path(&graph, &origin, &destination, &costing, TravelMode::Drive)
            .is_empty());

        bidir.clear();
        costing
            .get_mut(TravelMode::Drive)
            .unwrap()
            .relax_hierarchy_limits(8.0, 2.0);
        let path = bidir.get_best_path(&graph, &origin, &destination, &costing, TravelMode::Drive);
        assert_eq!(path.len(), 12);
    }

    #[test]
    fn disabled_highway_transitions_block_highway_entry() {
        // Local access road onto a highway, the only way to the destination.
        let graph = Graph::builder()
            .node(1, 40.0, -75.0)
            .node(2, 40.0, -74.99)
            .node(3, 40.0, -74.98)
            .edge(EdgeSpec::new(1, 1, 2).level(2))
            .edge(EdgeSpec::new(2, 2, 3).level(0).speed(100.0))
            .build()
            .expect("graph");
        let mut costing = auto_costing();
        let origin = locate(&graph, &costing, 40.0, -74.995);
        let destination = locate(&graph, &costing, 40.0, -74.985);

        let mut astar = AStarPathAlgorithm::new();
        let path = astar.get_best_path(&graph, &origin, &destination, &costing, TravelMode::Drive);
        assert_eq!(edge_ids(&path), vec![1, 2]);

        astar.clear();
        costing
            .get_mut(TravelMode::Drive)
            .unwrap()
            .disable_highway_transitions();
        assert!(astar
            .get_best_path(&graph, &origin, &destination, &costing, TravelMode::Drive)
            .is_empty());
    }

    #[test]
    fn multimodal_boards_transit_when_it_pays_off() {
        // 5 km walk, or a short walk to a stop and a fast transit line.
        let transit = AccessMask::only(Access::Transit);
        let graph = Graph::builder()
            .node(1, 40.0, -75.0)
            .node(2, 40.0, -74.995)
            .node(3, 40.0, -74.945)
            .node(4, 40.0, -74.94)
            .edge(EdgeSpec::new(1, 1, 2).two_way(2).name("Walk"))
            .edge(EdgeSpec::new(3, 2, 3).two_way(4).name("Walk"))
            .edge(EdgeSpec::new(5, 3, 4).two_way(6).name("Walk"))
            .edge(EdgeSpec::new(7, 2, 3).access(transit).speed(60.0).way_id(9))
            .build()
            .expect("graph");

        let mut costing = ModeCosting::new();
        costing.insert(create_pedestrian_cost(&json!({})).expect("pedestrian"));
        costing.insert(create_transit_cost(&json!({"transfer_penalty": 60.0})).expect("transit"));
        let walk = costing.get(TravelMode::Pedestrian).unwrap();
        let correlator = Correlator::new(&graph);
        let origin = correlator
            .correlate(&Waypoint::new(40.0, -74.999), walk)
            .expect("origin");
        let destination = correlator
            .correlate(&Waypoint::new(40.0, -74.941), walk)
            .expect("destination");

        let mut engine = MultiModalPathAlgorithm::new();
        let path = engine.get_best_path(
            &graph,
            &origin,
            &destination,
            &costing,
            TravelMode::Pedestrian,
        );
        let modes: Vec<_> = path.iter().map(|p| p.mode).collect();
        assert_eq!(edge_ids(&path), vec![1, 7, 5]);
        assert_eq!(
            modes,
            vec![
                TravelMode::Pedestrian,
                TravelMode::PublicTransit,
                TravelMode::Pedestrian
            ]
        );
    }

    #[test]
    fn unregistered_mode_returns_empty() {
        let graph = street();
        let costing = auto_costing();
        let origin = locate(&graph, &costing, 40.0, -74.995);
        let destination = locate(&graph, &costing, 40.0, -74.975);
        let mut astar = AStarPathAlgorithm::new();
        assert!(astar
            .get_best_path(&graph, &origin, &destination, &costing, TravelMode::Bicycle)
            .is_empty());
    }
}
