//! Per-mode cost models.
//!
//! This module provides:
//! - [`DynamicCost`] - the cost model contract used by the search engines
//! - [`RelaxationState`] - the mutable hierarchy limits each cost model owns
//! - [`ModeCosting`] - the per-request registry of cost models, one per [`TravelMode`]
//! - [`CostFactory`] / [`resolve_costing`] - configuration overlay and construction
//!
//! Scoring is intentionally simple (time from length and speed, plus a street
//! name change penalty). The interesting state is the relaxation: the
//! multi-pass orchestrator loosens the hierarchy limits in place when a
//! search comes back empty, and resets them at each leg boundary.

mod auto;
mod bicycle;
mod factory;
mod pedestrian;
mod transit;

pub use auto::{
    create_auto_cost, create_auto_shorter_cost, create_bus_cost, create_truck_cost, AutoCost,
};
pub use bicycle::{create_bicycle_cost, BicycleCost};
pub use factory::{normalize_mode, overlay_options, resolve_costing, CostConstructor, CostFactory};
pub use pedestrian::{create_pedestrian_cost, PedestrianCost};
pub use transit::{create_transit_cost, TransitCost};

use std::fmt;
use std::ops::Add;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::{Error, Result};
use crate::graph::{Access, DirectedEdge, GraphNode};

/// Number of travel modes held by a [`ModeCosting`] registry.
pub const MODE_COUNT: usize = 4;

/// Marker for "no limit" on up-transitions.
pub const UNLIMITED_TRANSITIONS: u32 = u32::MAX;

/// Travel modes a route can use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TravelMode {
    Drive,
    Pedestrian,
    Bicycle,
    PublicTransit,
}

impl TravelMode {
    pub const ALL: [TravelMode; MODE_COUNT] = [
        TravelMode::Drive,
        TravelMode::Pedestrian,
        TravelMode::Bicycle,
        TravelMode::PublicTransit,
    ];

    pub fn index(self) -> usize {
        match self {
            TravelMode::Drive => 0,
            TravelMode::Pedestrian => 1,
            TravelMode::Bicycle => 2,
            TravelMode::PublicTransit => 3,
        }
    }
}

impl fmt::Display for TravelMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = match self {
            TravelMode::Drive => "drive",
            TravelMode::Pedestrian => "pedestrian",
            TravelMode::Bicycle => "bicycle",
            TravelMode::PublicTransit => "public_transit",
        };
        f.write_str(value)
    }
}

/// Cost of traversing an edge or transition.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Cost {
    /// Abstract cost minimised by the search.
    pub cost: f64,
    /// Elapsed time in seconds.
    pub secs: f64,
}

impl Cost {
    pub fn new(cost: f64, secs: f64) -> Self {
        Self { cost, secs }
    }

    pub fn scaled(self, factor: f64) -> Self {
        Self {
            cost: self.cost * factor,
            secs: self.secs * factor,
        }
    }
}

impl Add for Cost {
    type Output = Cost;

    fn add(self, rhs: Cost) -> Cost {
        Cost {
            cost: self.cost + rhs.cost,
            secs: self.secs + rhs.secs,
        }
    }
}

/// Limits applied to one hierarchy level.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HierarchyLimit {
    /// Up-transitions out of this level allowed along one path.
    pub max_up_transitions: u32,
    /// Distance in metres from the origin or destination within which edges
    /// of this level may be expanded.
    pub expansion_within: f64,
}

impl HierarchyLimit {
    pub const UNLIMITED: HierarchyLimit = HierarchyLimit {
        max_up_transitions: UNLIMITED_TRANSITIONS,
        expansion_within: f64::INFINITY,
    };

    fn relax(&mut self, factor: f64, expansion_within_factor: f64) {
        if self.max_up_transitions != UNLIMITED_TRANSITIONS {
            let relaxed = (self.max_up_transitions as f64 * factor).min(u32::MAX as f64 - 1.0);
            self.max_up_transitions = relaxed as u32;
        }
        if self.expansion_within.is_finite() {
            self.expansion_within *= expansion_within_factor;
        }
    }
}

/// Default limits: the coarsest level is unrestricted, arterial roads may
/// be used within 100 km of either end, local roads within 5 km.
pub fn default_hierarchy_limits() -> Vec<HierarchyLimit> {
    vec![
        HierarchyLimit::UNLIMITED,
        HierarchyLimit {
            max_up_transitions: 400,
            expansion_within: 100_000.0,
        },
        HierarchyLimit {
            max_up_transitions: 100,
            expansion_within: 5_000.0,
        },
    ]
}

/// Mutable hierarchy state of a cost model.
#[derive(Debug, Clone, PartialEq)]
pub struct RelaxationState {
    baseline: Vec<HierarchyLimit>,
    limits: Vec<HierarchyLimit>,
    highway_transitions: bool,
}

impl Default for RelaxationState {
    fn default() -> Self {
        Self::new(default_hierarchy_limits())
    }
}

impl RelaxationState {
    pub fn new(limits: Vec<HierarchyLimit>) -> Self {
        Self {
            baseline: limits.clone(),
            limits,
            highway_transitions: true,
        }
    }

    /// Limit for `level`; levels without an entry are unrestricted.
    pub fn limit(&self, level: u8) -> HierarchyLimit {
        self.limits
            .get(level as usize)
            .copied()
            .unwrap_or(HierarchyLimit::UNLIMITED)
    }

    pub fn highway_transitions(&self) -> bool {
        self.highway_transitions
    }

    /// Whether a path that already made `made` up-transitions out of
    /// `from_level` may make one more, into `to_level`.
    pub fn allows_up_transition(&self, from_level: u8, to_level: u8, made: u32) -> bool {
        if to_level == 0 && !self.highway_transitions {
            return false;
        }
        let limit = self.limit(from_level).max_up_transitions;
        limit == UNLIMITED_TRANSITIONS || made < limit
    }

    /// Whether an edge on `level` may be expanded `distance` metres from the
    /// nearer of origin and destination.
    pub fn allows_expansion(&self, level: u8, distance: f64) -> bool {
        distance <= self.limit(level).expansion_within
    }

    pub fn relax(&mut self, factor: f64, expansion_within_factor: f64) {
        for limit in &mut self.limits {
            limit.relax(factor, expansion_within_factor);
        }
    }

    pub fn disable_highway_transitions(&mut self) {
        self.highway_transitions = false;
    }

    pub fn reset(&mut self) {
        self.limits = self.baseline.clone();
        self.highway_transitions = true;
    }

    pub fn is_baseline(&self) -> bool {
        self.highway_transitions && self.limits == self.baseline
    }
}

/// Cost model contract shared by every travel mode.
pub trait DynamicCost: fmt::Debug {
    /// Costing name this model was created for (`auto`, `pedestrian`, ...).
    fn name(&self) -> &'static str;

    fn travel_mode(&self) -> TravelMode;

    /// Access class an edge or node must admit.
    fn access(&self) -> Access;

    /// Whether a failed search may be retried with relaxed limits.
    fn allow_multi_pass(&self) -> bool;

    /// Cost of traversing the full edge.
    fn edge_cost(&self, edge: &DirectedEdge) -> Cost;

    /// Penalty in seconds for changing street name between edges.
    fn maneuver_penalty(&self) -> f64;

    /// Lower bound of cost per metre, used to scale the A* heuristic.
    fn astar_cost_factor(&self) -> f64;

    fn relaxation(&self) -> &RelaxationState;

    fn relaxation_mut(&mut self) -> &mut RelaxationState;

    /// Edge admissibility.
    fn allowed(&self, edge: &DirectedEdge) -> bool {
        edge.access.contains(self.access())
    }

    /// Node admissibility.
    fn allowed_node(&self, node: &GraphNode) -> bool {
        node.access.contains(self.access())
    }

    /// Cost of moving from `from` onto `to` at their shared node.
    fn transition_cost(&self, from: &DirectedEdge, to: &DirectedEdge) -> Cost {
        match (&from.name, &to.name) {
            (Some(a), Some(b)) if a != b => {
                let penalty = self.maneuver_penalty();
                Cost::new(penalty, penalty)
            }
            _ => Cost::default(),
        }
    }

    /// Cost of switching into this mode mid-route (boarding).
    fn mode_switch_cost(&self) -> Cost {
        Cost::default()
    }

    fn relax_hierarchy_limits(&mut self, relax_factor: f64, expansion_within_factor: f64) {
        self.relaxation_mut()
            .relax(relax_factor, expansion_within_factor);
    }

    fn disable_highway_transitions(&mut self) {
        self.relaxation_mut().disable_highway_transitions();
    }

    fn reset_relaxation(&mut self) {
        self.relaxation_mut().reset();
    }
}

/// Seconds needed to cover `length` metres at `speed_kph`.
pub(crate) fn travel_secs(length: f64, speed_kph: f64) -> f64 {
    length / (speed_kph.max(1.0) / 3.6)
}

/// Deserialize mode options, reporting failures against the costing name.
pub(crate) fn parse_options<T: DeserializeOwned>(mode: &str, options: &Value) -> Result<T> {
    let value = if options.is_null() {
        Value::Object(Default::default())
    } else {
        options.clone()
    };
    serde_json::from_value(value).map_err(|e| Error::InvalidCostingOptions {
        mode: mode.to_string(),
        message: e.to_string(),
    })
}

/// Cost models of one request, indexed by travel mode.
#[derive(Debug, Default)]
pub struct ModeCosting {
    costs: [Option<Box<dyn DynamicCost>>; MODE_COUNT],
}

impl ModeCosting {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `cost` under its travel mode, replacing any previous model.
    pub fn insert(&mut self, cost: Box<dyn DynamicCost>) -> TravelMode {
        let mode = cost.travel_mode();
        self.costs[mode.index()] = Some(cost);
        mode
    }

    pub fn get(&self, mode: TravelMode) -> Option<&dyn DynamicCost> {
        self.costs[mode.index()].as_deref()
    }

    pub fn get_mut(&mut self, mode: TravelMode) -> Option<&mut (dyn DynamicCost + 'static)> {
        self.costs[mode.index()].as_deref_mut()
    }

    /// Modes with a registered cost model.
    pub fn modes(&self) -> impl Iterator<Item = TravelMode> + '_ {
        TravelMode::ALL
            .into_iter()
            .filter(|mode| self.costs[mode.index()].is_some())
    }

    /// Restore every cost model's baseline hierarchy limits.
    pub fn reset_relaxation(&mut self) {
        for cost in self.costs.iter_mut().flatten() {
            cost.reset_relaxation();
        }
    }
}
