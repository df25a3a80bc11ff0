use serde::Deserialize;
use serde_json::Value;

use super::{parse_options, travel_secs, Cost, DynamicCost, RelaxationState, TravelMode};
use crate::error::Result;
use crate::graph::{Access, DirectedEdge, GraphNode};

/// Scheduled transit profile. Edges are ridden at their own speed.
#[derive(Debug, Clone)]
pub struct TransitCost {
    transfer_penalty: f64,
    allow_multipass: bool,
    relaxation: RelaxationState,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct TransitOptions {
    transfer_penalty: f64,
    allow_multipass: bool,
}

impl Default for TransitOptions {
    fn default() -> Self {
        Self {
            transfer_penalty: 300.0,
            allow_multipass: false,
        }
    }
}

impl DynamicCost for TransitCost {
    fn name(&self) -> &'static str {
        "transit"
    }

    fn travel_mode(&self) -> TravelMode {
        TravelMode::PublicTransit
    }

    fn access(&self) -> Access {
        Access::Transit
    }

    fn allow_multi_pass(&self) -> bool {
        self.allow_multipass
    }

    fn edge_cost(&self, edge: &DirectedEdge) -> Cost {
        let secs = travel_secs(edge.length, edge.speed);
        Cost::new(secs, secs)
    }

    // Stops are not modelled; any node on a transit edge can be used.
    fn allowed_node(&self, _node: &GraphNode) -> bool {
        true
    }

    // Line changes are not modelled, only boarding.
    fn maneuver_penalty(&self) -> f64 {
        0.0
    }

    fn mode_switch_cost(&self) -> Cost {
        Cost::new(self.transfer_penalty, self.transfer_penalty)
    }

    fn astar_cost_factor(&self) -> f64 {
        // No useful lower bound on transit speed.
        0.0
    }

    fn relaxation(&self) -> &RelaxationState {
        &self.relaxation
    }

    fn relaxation_mut(&mut self) -> &mut RelaxationState {
        &mut self.relaxation
    }
}

pub fn create_transit_cost(options: &Value) -> Result<Box<dyn DynamicCost>> {
    let opts: TransitOptions = parse_options("transit", options)?;
    Ok(Box::new(TransitCost {
        transfer_penalty: opts.transfer_penalty.max(0.0),
        allow_multipass: opts.allow_multipass,
        relaxation: RelaxationState::default(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn boarding_costs_the_transfer_penalty() {
        let cost = create_transit_cost(&json!({"transfer_penalty": 60.0})).expect("transit");
        assert_eq!(cost.mode_switch_cost(), Cost::new(60.0, 60.0));
        assert!(!cost.allow_multi_pass());
        assert_eq!(cost.travel_mode(), TravelMode::PublicTransit);
    }
}
