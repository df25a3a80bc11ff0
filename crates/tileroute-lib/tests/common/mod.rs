#![allow(dead_code)]

use std::path::PathBuf;

use serde_json::json;
use tileroute_lib::graph::{Access, AccessMask};
use tileroute_lib::{EdgeSpec, Graph, RouteConfig};

/// Degrees of longitude per kilometre at the equator.
pub const KM_LNG: f64 = 0.008_993;

pub fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../docs/fixtures")
}

pub fn fixture_config() -> RouteConfig {
    RouteConfig::load(&fixtures_dir().join("config.json")).expect("fixture config loads")
}

pub fn fixture_graph() -> Graph {
    fixture_config().load_graph().expect("fixture graph loads")
}

/// Configuration with every costing the multimodal route needs.
pub fn inline_config() -> RouteConfig {
    RouteConfig::from_value(
        json!({
            "costing_options": {
                "auto": {},
                "pedestrian": {},
                "bicycle": {},
                "transit": {"transfer_penalty": 60.0}
            }
        }),
        fixtures_dir(),
    )
}

/// 12 km of two-way local road along the equator, 1 km per edge.
pub fn long_local_road() -> Graph {
    let mut builder = Graph::builder();
    for i in 0..=12u32 {
        builder = builder.node(i + 1, 0.0, f64::from(i) * KM_LNG);
    }
    for i in 0..12u32 {
        let id = u64::from(i) * 2 + 1;
        builder = builder.edge(
            EdgeSpec::new(id, i + 1, i + 2)
                .two_way(id + 1)
                .name("Equator Road")
                .way_id(7),
        );
    }
    builder.build().expect("long road builds")
}

/// A single one-way segment heading east.
pub fn one_way_segment() -> Graph {
    Graph::builder()
        .node(1, 40.0, -75.0)
        .node(2, 40.0, -74.99)
        .edge(EdgeSpec::new(1, 1, 2).name("One Way").way_id(42))
        .build()
        .expect("one-way builds")
}

/// A walking street with a faster transit line over its middle.
pub fn transit_corridor() -> Graph {
    Graph::builder()
        .node(1, 40.0, -75.0)
        .node(2, 40.0, -74.995)
        .node(3, 40.0, -74.945)
        .node(4, 40.0, -74.94)
        .edge(EdgeSpec::new(1, 1, 2).two_way(2).name("Walk"))
        .edge(EdgeSpec::new(3, 2, 3).two_way(4).name("Walk"))
        .edge(EdgeSpec::new(5, 3, 4).two_way(6).name("Walk"))
        .edge(
            EdgeSpec::new(7, 2, 3)
                .access(AccessMask::only(Access::Transit))
                .speed(60.0)
                .name("Line 1")
                .way_id(9),
        )
        .build()
        .expect("corridor builds")
}
