use serde::Deserialize;
use serde_json::Value;

use super::{parse_options, travel_secs, Cost, DynamicCost, RelaxationState, TravelMode};
use crate::error::Result;
use crate::graph::{Access, DirectedEdge};

/// Motor vehicle profile shared by `auto`, `auto_shorter`, `bus` and `truck`.
#[derive(Debug, Clone)]
pub struct AutoCost {
    name: &'static str,
    access: Access,
    top_speed: f64,
    maneuver_penalty: f64,
    shortest: bool,
    allow_multipass: bool,
    relaxation: RelaxationState,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct AutoOptions {
    top_speed: Option<f64>,
    maneuver_penalty: f64,
    allow_multipass: Option<bool>,
}

impl Default for AutoOptions {
    fn default() -> Self {
        Self {
            top_speed: None,
            maneuver_penalty: 5.0,
            allow_multipass: None,
        }
    }
}

impl AutoCost {
    fn from_options(
        name: &'static str,
        access: Access,
        default_top_speed: f64,
        shortest: bool,
        options: &Value,
    ) -> Result<Self> {
        let opts: AutoOptions = parse_options(name, options)?;
        Ok(Self {
            name,
            access,
            top_speed: opts.top_speed.unwrap_or(default_top_speed).max(1.0),
            maneuver_penalty: opts.maneuver_penalty.max(0.0),
            shortest,
            allow_multipass: opts.allow_multipass.unwrap_or(true),
            relaxation: RelaxationState::default(),
        })
    }
}

impl DynamicCost for AutoCost {
    fn name(&self) -> &'static str {
        self.name
    }

    fn travel_mode(&self) -> TravelMode {
        TravelMode::Drive
    }

    fn access(&self) -> Access {
        self.access
    }

    fn allow_multi_pass(&self) -> bool {
        self.allow_multipass
    }

    fn edge_cost(&self, edge: &DirectedEdge) -> Cost {
        let secs = travel_secs(edge.length, edge.speed.min(self.top_speed));
        if self.shortest {
            // Distance expressed as seconds at top speed keeps the heuristic admissible.
            Cost::new(travel_secs(edge.length, self.top_speed), secs)
        } else {
            Cost::new(secs, secs)
        }
    }

    fn maneuver_penalty(&self) -> f64 {
        self.maneuver_penalty
    }

    fn astar_cost_factor(&self) -> f64 {
        3.6 / self.top_speed
    }

    fn relaxation(&self) -> &RelaxationState {
        &self.relaxation
    }

    fn relaxation_mut(&mut self) -> &mut RelaxationState {
        &mut self.relaxation
    }
}

pub fn create_auto_cost(options: &Value) -> Result<Box<dyn DynamicCost>> {
    Ok(Box::new(AutoCost::from_options(
        "auto",
        Access::Auto,
        140.0,
        false,
        options,
    )?))
}

pub fn create_auto_shorter_cost(options: &Value) -> Result<Box<dyn DynamicCost>> {
    Ok(Box::new(AutoCost::from_options(
        "auto_shorter",
        Access::Auto,
        140.0,
        true,
        options,
    )?))
}

pub fn create_bus_cost(options: &Value) -> Result<Box<dyn DynamicCost>> {
    Ok(Box::new(AutoCost::from_options(
        "bus",
        Access::Bus,
        100.0,
        false,
        options,
    )?))
}

pub fn create_truck_cost(options: &Value) -> Result<Box<dyn DynamicCost>> {
    Ok(Box::new(AutoCost::from_options(
        "truck",
        Access::Truck,
        90.0,
        false,
        options,
    )?))
}
