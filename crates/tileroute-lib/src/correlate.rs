//! Waypoint to candidate-edge correlation.
//!
//! A waypoint is snapped onto the admissible edges nearest to it. Every edge
//! whose projected distance is within [`TIE_TOLERANCE_M`] of the best one
//! becomes a candidate, so both directions of a two-way segment are always
//! returned together.

use std::collections::HashSet;

use serde::Serialize;
use tracing::{debug, warn};

use crate::costing::DynamicCost;
use crate::error::{Error, Result};
use crate::geo::{heading_delta, LatLng};
use crate::graph::{DirectedEdge, EdgeId, Graph};
use crate::location::Waypoint;
use crate::spatial::NodeIndex;

/// Number of nearby nodes whose incident edges are considered.
const NEAREST_NODES: usize = 16;

/// Candidates farther than this from the waypoint are ignored.
pub const SEARCH_RADIUS_M: f64 = 35_000.0;

/// Edges within this distance of the best candidate are kept as well.
pub const TIE_TOLERANCE_M: f64 = 1.0;

/// Maximum difference between the waypoint heading and an edge's heading.
pub const HEADING_TOLERANCE_DEG: f64 = 60.0;

/// One candidate edge for a waypoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PathEdge {
    pub id: EdgeId,
    /// Fraction along the edge, from its start node, of the snapped point.
    pub percent_along: f64,
    /// Distance in metres from the waypoint to the snapped point.
    pub distance: f64,
    /// The edge cannot reach, or be reached from, the wider network.
    pub unreachable: bool,
    #[serde(skip)]
    pub projected: LatLng,
}

/// A waypoint together with its candidate edges.
#[derive(Debug, Clone, PartialEq)]
pub struct PathLocation {
    pub waypoint: Waypoint,
    pub edges: Vec<PathEdge>,
}

impl PathLocation {
    pub fn latlng(&self) -> LatLng {
        self.waypoint.latlng
    }

    pub fn edge(&self, id: EdgeId) -> Option<&PathEdge> {
        self.edges.iter().find(|e| e.id == id)
    }
}

/// Snaps waypoints onto a graph.
pub struct Correlator<'a> {
    graph: &'a Graph,
    index: NodeIndex,
}

impl<'a> Correlator<'a> {
    pub fn new(graph: &'a Graph) -> Self {
        Self {
            graph,
            index: NodeIndex::build(graph),
        }
    }

    /// Candidate edges for `waypoint` admitted by `cost`.
    pub fn correlate(&self, waypoint: &Waypoint, cost: &dyn DynamicCost) -> Result<PathLocation> {
        let point = waypoint.latlng;
        let mut seen = HashSet::new();
        let mut candidates = Vec::new();

        for (node, _) in self.index.nearest(&point, NEAREST_NODES) {
            let incident = self.graph.outgoing(node).chain(self.graph.incoming(node));
            for edge in incident {
                if !seen.insert(edge.id) || !self.admissible(edge, cost) {
                    continue;
                }
                if let Some(candidate) = self.project(&point, edge) {
                    if candidate.distance <= SEARCH_RADIUS_M {
                        candidates.push((candidate, edge));
                    }
                }
            }
        }

        if let Some(heading) = waypoint.heading {
            let matching: Vec<_> = candidates
                .iter()
                .filter(|(_, edge)| self.heading_matches(edge, f64::from(heading)))
                .cloned()
                .collect();
            if matching.is_empty() {
                warn!(heading, "no candidate edge matches heading, ignoring it");
            } else {
                candidates = matching;
            }
        }

        let best = candidates
            .iter()
            .map(|(c, _)| c.distance)
            .fold(f64::INFINITY, f64::min);
        if !best.is_finite() {
            return Err(Error::NoCandidateEdges {
                lat: point.lat,
                lng: point.lng,
            });
        }

        let mut edges: Vec<PathEdge> = candidates
            .into_iter()
            .map(|(c, _)| c)
            .filter(|c| c.distance <= best + TIE_TOLERANCE_M)
            .collect();
        edges.sort_by_key(|e| e.id);

        debug!(
            lat = point.lat,
            lng = point.lng,
            candidates = edges.len(),
            distance = best,
            "correlated waypoint"
        );

        Ok(PathLocation {
            waypoint: waypoint.clone(),
            edges,
        })
    }

    /// Correlate every waypoint, failing on the first one without candidates.
    pub fn correlate_all(
        &self,
        waypoints: &[Waypoint],
        cost: &dyn DynamicCost,
    ) -> Result<Vec<PathLocation>> {
        waypoints
            .iter()
            .map(|waypoint| self.correlate(waypoint, cost))
            .collect()
    }

    fn admissible(&self, edge: &DirectedEdge, cost: &dyn DynamicCost) -> bool {
        if !cost.allowed(edge) {
            return false;
        }
        [edge.from, edge.to].iter().all(|id| {
            self.graph
                .node(*id)
                .map(|node| cost.allowed_node(node))
                .unwrap_or(false)
        })
    }

    fn project(&self, point: &LatLng, edge: &DirectedEdge) -> Option<PathEdge> {
        let a = self.graph.latlng(edge.from)?;
        let b = self.graph.latlng(edge.to)?;
        let (projected, percent_along) = point.project_onto(&a, &b);
        Some(PathEdge {
            id: edge.id,
            percent_along,
            distance: point.distance(&projected),
            unreachable: edge.unreachable,
            projected,
        })
    }

    fn heading_matches(&self, edge: &DirectedEdge, heading: f64) -> bool {
        match (self.graph.latlng(edge.from), self.graph.latlng(edge.to)) {
            (Some(a), Some(b)) => heading_delta(a.heading_to(&b), heading) <= HEADING_TOLERANCE_DEG,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::costing::{create_auto_cost, create_pedestrian_cost};
    use crate::graph::{Access, AccessMask, EdgeSpec};
    use serde_json::json;

    fn street() -> Graph {
        Graph::builder()
            .node(1, 40.0, -75.0)
            .node(2, 40.0, -74.99)
            .node(3, 40.0, -74.98)
            .edge(EdgeSpec::new(1, 1, 2).two_way(2).name("Market Street"))
            .edge(
                EdgeSpec::new(3, 2, 3)
                    .two_way(4)
                    .access(AccessMask::only(Access::Pedestrian)),
            )
            .build()
            .expect("graph")
    }

    #[test]
    fn both_directions_of_a_segment_are_candidates() {
        let graph = street();
        let correlator = Correlator::new(&graph);
        let cost = create_auto_cost(&json!({})).expect("auto");
        let location = correlator
            .correlate(&Waypoint::new(40.0001, -74.995), cost.as_ref())
            .expect("correlates");

        let ids: Vec<_> = location.edges.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![EdgeId(1), EdgeId(2)]);
        let forward = location.edge(EdgeId(1)).expect("forward");
        let reverse = location.edge(EdgeId(2)).expect("reverse");
        assert!((forward.percent_along - 0.5).abs() < 0.01);
        assert!((reverse.percent_along - 0.5).abs() < 0.01);
        assert!(forward.distance < 15.0);
    }

    #[test]
    fn access_filter_skips_footpaths_for_cars() {
        let graph = street();
        let correlator = Correlator::new(&graph);
        let auto = create_auto_cost(&json!({})).expect("auto");
        let walk = create_pedestrian_cost(&json!({})).expect("pedestrian");
        let near_footpath = Waypoint::new(40.0, -74.9849);

        let by_car = correlator
            .correlate(&near_footpath, auto.as_ref())
            .expect("car still snaps");
        assert!(by_car.edges.iter().all(|e| e.id == EdgeId(1) || e.id == EdgeId(2)));

        let on_foot = correlator
            .correlate(&near_footpath, walk.as_ref())
            .expect("walker snaps");
        assert!(on_foot.edge(EdgeId(3)).is_some());
    }

    #[test]
    fn heading_selects_matching_direction() {
        let graph = street();
        let correlator = Correlator::new(&graph);
        let cost = create_auto_cost(&json!({})).expect("auto");
        let mut westbound = Waypoint::new(40.0, -74.995);
        westbound.heading = Some(270);
        let location = correlator
            .correlate(&westbound, cost.as_ref())
            .expect("correlates");
        assert_eq!(location.edges.len(), 1);
        assert_eq!(location.edges[0].id, EdgeId(2));
    }

    #[test]
    fn far_away_waypoint_has_no_candidates() {
        let graph = street();
        let correlator = Correlator::new(&graph);
        let cost = create_auto_cost(&json!({})).expect("auto");
        let err = correlator
            .correlate(&Waypoint::new(10.0, 10.0), cost.as_ref())
            .expect_err("too far");
        assert!(matches!(err, Error::NoCandidateEdges { .. }));
    }

    #[test]
    fn unreachable_flag_is_copied_from_graph() {
        let graph = Graph::builder()
            .node(1, 0.0, 0.0)
            .node(2, 0.0, 0.01)
            .edge(EdgeSpec::new(1, 1, 2).unreachable())
            .build()
            .expect("graph");
        let correlator = Correlator::new(&graph);
        let cost = create_auto_cost(&json!({})).expect("auto");
        let location = correlator
            .correlate(&Waypoint::new(0.0, 0.005), cost.as_ref())
            .expect("correlates");
        assert!(!location.edges.is_empty());
        assert!(location.edges.iter().all(|e| e.unreachable));
    }
}
