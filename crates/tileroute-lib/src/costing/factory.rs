use std::collections::BTreeMap;

use serde_json::{Map, Value};
use tracing::debug;

use super::{
    create_auto_cost, create_auto_shorter_cost, create_bicycle_cost, create_bus_cost,
    create_pedestrian_cost, create_transit_cost, create_truck_cost, DynamicCost,
};
use crate::config::RouteConfig;
use crate::error::{Error, Result};

/// Constructor for one costing method.
pub type CostConstructor = fn(&Value) -> Result<Box<dyn DynamicCost>>;

/// Minimum Jaro-Winkler similarity for a registered name to be suggested.
const SUGGESTION_THRESHOLD: f64 = 0.8;

const MAX_SUGGESTIONS: usize = 3;

/// Registry of costing constructors keyed by mode name.
#[derive(Debug, Clone)]
pub struct CostFactory {
    constructors: BTreeMap<String, CostConstructor>,
}

impl Default for CostFactory {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl CostFactory {
    /// A factory with nothing registered.
    pub fn empty() -> Self {
        Self {
            constructors: BTreeMap::new(),
        }
    }

    /// A factory with every built-in costing registered.
    pub fn with_defaults() -> Self {
        let mut factory = Self::empty();
        factory.register("auto", create_auto_cost);
        factory.register("auto_shorter", create_auto_shorter_cost);
        factory.register("bus", create_bus_cost);
        factory.register("bicycle", create_bicycle_cost);
        factory.register("pedestrian", create_pedestrian_cost);
        factory.register("truck", create_truck_cost);
        factory.register("transit", create_transit_cost);
        factory
    }

    pub fn register(&mut self, name: &str, constructor: CostConstructor) {
        self.constructors.insert(normalize_mode(name), constructor);
    }

    /// Build the cost model registered under `name` from `options`.
    pub fn create(&self, name: &str, options: &Value) -> Result<Box<dyn DynamicCost>> {
        let key = normalize_mode(name);
        match self.constructors.get(&key) {
            Some(constructor) => constructor(options),
            None => Err(Error::UnknownCosting {
                suggestions: self.suggestions(&key),
                mode: key,
            }),
        }
    }

    fn suggestions(&self, name: &str) -> Vec<String> {
        let mut scored: Vec<(f64, &String)> = self
            .constructors
            .keys()
            .map(|candidate| (strsim::jaro_winkler(name, candidate), candidate))
            .filter(|(score, _)| *score >= SUGGESTION_THRESHOLD)
            .collect();
        scored.sort_by(|a, b| b.0.total_cmp(&a.0).then_with(|| a.1.cmp(b.1)));
        scored
            .into_iter()
            .take(MAX_SUGGESTIONS)
            .map(|(_, name)| name.clone())
            .collect()
    }
}

/// Lower-case a mode name and map `-` to `_`.
pub fn normalize_mode(name: &str) -> String {
    name.trim().to_ascii_lowercase().replace('-', "_")
}

/// Overlay `overrides` onto a copy of `base`, one top-level key at a time.
///
/// Override values replace same-named base values wholesale; unmatched keys
/// on either side are kept. A non-object override is ignored.
pub fn overlay_options(base: &Value, overrides: &Value) -> Value {
    let mut merged = match base {
        Value::Object(map) => map.clone(),
        _ => Map::new(),
    };
    if let Value::Object(extra) = overrides {
        for (key, value) in extra {
            merged.insert(key.clone(), value.clone());
        }
    }
    Value::Object(merged)
}

/// Resolve the cost model for `mode` from the base configuration and the
/// request's optional `costing_options`.
///
/// Fails with [`Error::ConfigMissing`] when the base configuration has no
/// `costing_options.<mode>` subtree, before any constructor runs.
pub fn resolve_costing(
    factory: &CostFactory,
    config: &RouteConfig,
    request: &Value,
    mode: &str,
) -> Result<Box<dyn DynamicCost>> {
    let key = normalize_mode(mode);
    let base = config
        .costing_options(&key)
        .ok_or_else(|| Error::ConfigMissing { mode: key.clone() })?;

    let merged = match request
        .get("costing_options")
        .and_then(|options| options.get(&key))
    {
        Some(overrides) => {
            debug!(mode = %key, "applying request costing overrides");
            overlay_options(base, overrides)
        }
        None => base.clone(),
    };

    factory.create(&key, &merged)
}
