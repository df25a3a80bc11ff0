use serde::Deserialize;
use serde_json::Value;

use super::{parse_options, travel_secs, Cost, DynamicCost, RelaxationState, TravelMode};
use crate::error::Result;
use crate::graph::{Access, DirectedEdge};

/// Walking profile. Ignores edge speeds.
#[derive(Debug, Clone)]
pub struct PedestrianCost {
    walking_speed: f64,
    maneuver_penalty: f64,
    allow_multipass: bool,
    relaxation: RelaxationState,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct PedestrianOptions {
    walking_speed: f64,
    maneuver_penalty: f64,
    allow_multipass: bool,
}

impl Default for PedestrianOptions {
    fn default() -> Self {
        Self {
            walking_speed: 5.1,
            maneuver_penalty: 0.0,
            allow_multipass: false,
        }
    }
}

impl DynamicCost for PedestrianCost {
    fn name(&self) -> &'static str {
        "pedestrian"
    }

    fn travel_mode(&self) -> TravelMode {
        TravelMode::Pedestrian
    }

    fn access(&self) -> Access {
        Access::Pedestrian
    }

    fn allow_multi_pass(&self) -> bool {
        self.allow_multipass
    }

    fn edge_cost(&self, edge: &DirectedEdge) -> Cost {
        let secs = travel_secs(edge.length, self.walking_speed);
        Cost::new(secs, secs)
    }

    fn maneuver_penalty(&self) -> f64 {
        self.maneuver_penalty
    }

    fn astar_cost_factor(&self) -> f64 {
        3.6 / self.walking_speed
    }

    fn relaxation(&self) -> &RelaxationState {
        &self.relaxation
    }

    fn relaxation_mut(&mut self) -> &mut RelaxationState {
        &mut self.relaxation
    }
}

pub fn create_pedestrian_cost(options: &Value) -> Result<Box<dyn DynamicCost>> {
    let opts: PedestrianOptions = parse_options("pedestrian", options)?;
    Ok(Box::new(PedestrianCost {
        walking_speed: opts.walking_speed.max(0.5),
        maneuver_penalty: opts.maneuver_penalty.max(0.0),
        allow_multipass: opts.allow_multipass,
        relaxation: RelaxationState::default(),
    }))
}
