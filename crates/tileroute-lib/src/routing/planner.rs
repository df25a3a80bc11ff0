//! Search strategy selection.
//!
//! This module provides the [`PathStrategy`] enum and [`select_algorithm`],
//! which picks the strategy for one leg from the two candidate edge sets and
//! the route type. [`Algorithms`] owns one engine per strategy so a request
//! can reuse them across legs.

use serde::Serialize;

use crate::correlate::PathLocation;
use crate::path::{
    AStarPathAlgorithm, BidirectionalAStar, MultiModalPathAlgorithm, PathAlgorithm,
};
use crate::request::RouteType;

/// Search strategy families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PathStrategy {
    /// Origin and destination share an edge: forward A*.
    Direct,
    Bidirectional,
    Multimodal,
}

impl PathStrategy {
    pub fn as_str(self) -> &'static str {
        match self {
            PathStrategy::Direct => "direct",
            PathStrategy::Bidirectional => "bidirectional",
            PathStrategy::Multimodal => "multimodal",
        }
    }
}

/// Choose the strategy for a leg.
///
/// Multimodal routes always use the multimodal engine and pedestrian routes
/// always use the bidirectional one. Otherwise a leg whose endpoints share a
/// candidate edge goes direct.
pub fn select_algorithm(
    origin: &PathLocation,
    destination: &PathLocation,
    route_type: &RouteType,
) -> PathStrategy {
    if route_type.is_multimodal() {
        return PathStrategy::Multimodal;
    }
    if route_type.is_pedestrian() {
        return PathStrategy::Bidirectional;
    }
    let shares_edge = origin
        .edges
        .iter()
        .any(|o| destination.edges.iter().any(|d| d.id == o.id));
    if shares_edge {
        PathStrategy::Direct
    } else {
        PathStrategy::Bidirectional
    }
}

/// One engine per strategy, owned by the request.
#[derive(Debug, Default)]
pub struct Algorithms {
    astar: AStarPathAlgorithm,
    bidirectional: BidirectionalAStar,
    multimodal: MultiModalPathAlgorithm,
}

impl Algorithms {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_mut(&mut self, strategy: PathStrategy) -> &mut dyn PathAlgorithm {
        match strategy {
            PathStrategy::Direct => &mut self.astar,
            PathStrategy::Bidirectional => &mut self.bidirectional,
            PathStrategy::Multimodal => &mut self.multimodal,
        }
    }

    /// Whether every engine has dropped its working state.
    pub fn is_clear(&self) -> bool {
        self.astar.is_clear() && self.bidirectional.is_clear() && self.multimodal.is_clear()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::correlate::PathEdge;
    use crate::geo::LatLng;
    use crate::graph::EdgeId;
    use crate::location::Waypoint;

    fn location(ids: &[u64]) -> PathLocation {
        PathLocation {
            waypoint: Waypoint::new(0.0, 0.0),
            edges: ids
                .iter()
                .map(|&id| PathEdge {
                    id: EdgeId(id),
                    percent_along: 0.5,
                    distance: 0.0,
                    unreachable: false,
                    projected: LatLng::new(0.0, 0.0),
                })
                .collect(),
        }
    }

    #[test]
    fn shared_edge_selects_direct() {
        let auto = RouteType::Costing("auto".to_string());
        assert_eq!(
            select_algorithm(&location(&[1, 2]), &location(&[7, 2]), &auto),
            PathStrategy::Direct
        );
        assert_eq!(
            select_algorithm(&location(&[1, 2]), &location(&[3, 4]), &auto),
            PathStrategy::Bidirectional
        );
    }

    #[test]
    fn pedestrian_never_goes_direct() {
        let walk = RouteType::Costing("pedestrian".to_string());
        assert_eq!(
            select_algorithm(&location(&[1]), &location(&[1]), &walk),
            PathStrategy::Bidirectional
        );
    }

    #[test]
    fn multimodal_wins_over_shared_edges() {
        assert_eq!(
            select_algorithm(&location(&[1]), &location(&[1]), &RouteType::Multimodal),
            PathStrategy::Multimodal
        );
    }

    #[test]
    fn engines_map_to_strategies() {
        let mut algorithms = Algorithms::new();
        assert_eq!(algorithms.get_mut(PathStrategy::Direct).name(), "astar");
        assert_eq!(
            algorithms.get_mut(PathStrategy::Bidirectional).name(),
            "bidirectional_astar"
        );
        assert_eq!(algorithms.get_mut(PathStrategy::Multimodal).name(), "multimodal");
        assert!(algorithms.is_clear());
    }
}
