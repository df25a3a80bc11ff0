//! Trip paths and terse directions built from a search result.

use serde::Serialize;
use tracing::info;

use crate::correlate::PathLocation;
use crate::costing::TravelMode;
use crate::graph::{EdgeId, Graph};
use crate::location::Waypoint;
use crate::path::PathInfo;
use crate::request::{DirectionsOptions, Units};

const RULE: &str = "==============================================";
const SEPARATOR: &str = "----------------------------------------------";

/// One traversed edge, trimmed at the trip ends.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TripEdge {
    pub id: EdgeId,
    pub name: Option<String>,
    pub mode: TravelMode,
    /// Metres travelled on this edge.
    pub length: f64,
    /// Seconds spent on this edge.
    pub secs: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TripPath {
    pub edges: Vec<TripEdge>,
}

impl TripPath {
    pub fn build(
        graph: &Graph,
        path: &[PathInfo],
        origin: &PathLocation,
        destination: &PathLocation,
    ) -> Self {
        let last = path.len().saturating_sub(1);
        let mut elapsed = 0.0;
        let mut edges = Vec::with_capacity(path.len());

        for (i, info) in path.iter().enumerate() {
            let Some(edge) = graph.edge(info.edge) else {
                continue;
            };
            let start = if i == 0 {
                origin.edge(info.edge).map_or(0.0, |c| c.percent_along)
            } else {
                0.0
            };
            let end = if i == last {
                destination.edge(info.edge).map_or(1.0, |c| c.percent_along)
            } else {
                1.0
            };
            edges.push(TripEdge {
                id: edge.id,
                name: edge.name.clone(),
                mode: info.mode,
                length: edge.length * (end - start).max(0.0),
                secs: (info.elapsed - elapsed).max(0.0),
            });
            elapsed = info.elapsed;
        }
        Self { edges }
    }

    /// Total length in metres.
    pub fn length(&self) -> f64 {
        self.edges.iter().map(|e| e.length).sum()
    }

    /// Total time in seconds.
    pub fn time(&self) -> f64 {
        self.edges.iter().map(|e| e.secs).sum()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ManeuverKind {
    Start,
    Continue,
    ModeChange,
    Arrive,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Maneuver {
    pub kind: ManeuverKind,
    pub street: Option<String>,
    pub mode: TravelMode,
    /// Length in the requested units.
    pub length: f64,
    /// Seconds.
    pub time: f64,
    pub instruction: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Summary {
    /// Seconds.
    pub time: f64,
    /// Length in the requested units.
    pub length: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TripDirections {
    pub units: Units,
    pub maneuvers: Vec<Maneuver>,
    pub summary: Summary,
}

impl TripDirections {
    /// Group consecutive edges sharing a street name and travel mode into
    /// maneuvers, between a start and an arrive maneuver.
    pub fn build(options: &DirectionsOptions, trip: &TripPath) -> Self {
        let units = options.units;
        let mut maneuvers: Vec<Maneuver> = Vec::new();

        for edge in &trip.edges {
            let length = units.from_meters(edge.length);
            if let Some(current) = maneuvers.last_mut() {
                if current.street == edge.name && current.mode == edge.mode {
                    current.length += length;
                    current.time += edge.secs;
                    continue;
                }
            }
            let kind = match maneuvers.last() {
                None => ManeuverKind::Start,
                Some(prev) if prev.mode != edge.mode => ManeuverKind::ModeChange,
                Some(_) => ManeuverKind::Continue,
            };
            maneuvers.push(Maneuver {
                kind,
                street: edge.name.clone(),
                mode: edge.mode,
                length,
                time: edge.secs,
                instruction: instruction(kind, edge.name.as_deref(), edge.mode),
            });
        }

        if let Some(mode) = maneuvers.last().map(|m| m.mode) {
            maneuvers.push(Maneuver {
                kind: ManeuverKind::Arrive,
                street: None,
                mode,
                length: 0.0,
                time: 0.0,
                instruction: instruction(ManeuverKind::Arrive, None, mode),
            });
        }

        let summary = Summary {
            time: trip.time(),
            length: units.from_meters(trip.length()),
        };
        Self {
            units,
            maneuvers,
            summary,
        }
    }

    /// Log the narrative under the `narrative` target.
    pub fn log_narrative(&self, origin: &Waypoint, destination: &Waypoint) {
        let units = self.units.abbreviation();
        info!(target: "narrative", "From: {}", describe(origin));
        info!(target: "narrative", "To: {}", describe(destination));
        info!(target: "narrative", "{RULE}");
        for (i, maneuver) in self.maneuvers.iter().enumerate() {
            info!(
                target: "narrative",
                "{}: {} | {:.1} {}",
                i + 1,
                maneuver.instruction,
                maneuver.length,
                units
            );
            if i + 1 < self.maneuvers.len() {
                info!(target: "narrative", "{SEPARATOR}");
            }
        }
        info!(target: "narrative", "{RULE}");
        info!(
            target: "narrative",
            "Total time: {}",
            format_duration(self.summary.time.round().max(0.0) as u64)
        );
        info!(
            target: "narrative",
            "Total length: {:.1} {}",
            self.summary.length,
            units
        );
    }
}

fn instruction(kind: ManeuverKind, street: Option<&str>, mode: TravelMode) -> String {
    let street = street.unwrap_or("unnamed road");
    match kind {
        ManeuverKind::Start => format!("Start on {street}."),
        ManeuverKind::Continue => format!("Continue on {street}."),
        ManeuverKind::ModeChange => format!("Switch to {mode} on {street}."),
        ManeuverKind::Arrive => "Arrive at your destination.".to_string(),
    }
}

fn describe(waypoint: &Waypoint) -> String {
    let address = waypoint.address.to_string();
    if address.chars().all(|c| c == ',') {
        format!("{:.6},{:.6}", waypoint.latlng.lat, waypoint.latlng.lng)
    } else {
        address
    }
}

/// `N hours, M minutes`, singular where it applies.
pub fn format_duration(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds / 60) % 60;
    let plural = |n: u64, unit: &str| {
        if n == 1 {
            format!("{n} {unit}")
        } else {
            format!("{n} {unit}s")
        }
    };
    match (hours, minutes) {
        (0, m) => plural(m, "minute"),
        (h, 0) => plural(h, "hour"),
        (h, m) => format!("{}, {}", plural(h, "hour"), plural(m, "minute")),
    }
}
