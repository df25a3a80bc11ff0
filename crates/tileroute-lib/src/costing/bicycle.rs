use serde::Deserialize;
use serde_json::Value;

use super::{parse_options, travel_secs, Cost, DynamicCost, RelaxationState, TravelMode};
use crate::error::Result;
use crate::graph::{Access, DirectedEdge};

#[derive(Debug, Clone)]
pub struct BicycleCost {
    cycling_speed: f64,
    maneuver_penalty: f64,
    allow_multipass: bool,
    relaxation: RelaxationState,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct BicycleOptions {
    cycling_speed: f64,
    maneuver_penalty: f64,
    allow_multipass: bool,
}

impl Default for BicycleOptions {
    fn default() -> Self {
        Self {
            cycling_speed: 20.0,
            maneuver_penalty: 5.0,
            allow_multipass: true,
        }
    }
}

impl DynamicCost for BicycleCost {
    fn name(&self) -> &'static str {
        "bicycle"
    }

    fn travel_mode(&self) -> TravelMode {
        TravelMode::Bicycle
    }

    fn access(&self) -> Access {
        Access::Bicycle
    }

    fn allow_multi_pass(&self) -> bool {
        self.allow_multipass
    }

    fn edge_cost(&self, edge: &DirectedEdge) -> Cost {
        let secs = travel_secs(edge.length, self.cycling_speed.min(edge.speed));
        Cost::new(secs, secs)
    }

    fn maneuver_penalty(&self) -> f64 {
        self.maneuver_penalty
    }

    fn astar_cost_factor(&self) -> f64 {
        3.6 / self.cycling_speed
    }

    fn relaxation(&self) -> &RelaxationState {
        &self.relaxation
    }

    fn relaxation_mut(&mut self) -> &mut RelaxationState {
        &mut self.relaxation
    }
}

pub fn create_bicycle_cost(options: &Value) -> Result<Box<dyn DynamicCost>> {
    let opts: BicycleOptions = parse_options("bicycle", options)?;
    Ok(Box::new(BicycleCost {
        cycling_speed: opts.cycling_speed.max(1.0),
        maneuver_penalty: opts.maneuver_penalty.max(0.0),
        allow_multipass: opts.allow_multipass,
        relaxation: RelaxationState::default(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn bicycle_is_multipass_eligible() {
        let cost = create_bicycle_cost(&json!({"cycling_speed": 25.0})).expect("bicycle");
        assert!(cost.allow_multi_pass());
        assert_eq!(cost.access(), Access::Bicycle);
        assert!((cost.astar_cost_factor() - 3.6 / 25.0).abs() < 1e-12);
    }
}
