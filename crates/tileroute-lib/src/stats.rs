//! Per-request diagnostics and the statistics record.

use std::fmt;
use std::time::Duration;

use serde::Serialize;
use tracing::info;

use crate::correlate::PathLocation;
use crate::geo::LatLng;

/// Terminal classification of a route request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Success,
    FailInvalidOrigin,
    FailNoConnectivity,
    FailUnreachableOrigin,
    FailUnreachableDest,
    FailUnreachableLocations,
    FailNoRoute,
}

impl Outcome {
    pub fn as_str(self) -> &'static str {
        match self {
            Outcome::Success => "success",
            Outcome::FailInvalidOrigin => "fail_invalid_origin",
            Outcome::FailNoConnectivity => "fail_no_connectivity",
            Outcome::FailUnreachableOrigin => "fail_unreachable_origin",
            Outcome::FailUnreachableDest => "fail_unreachable_dest",
            Outcome::FailUnreachableLocations => "fail_unreachable_locations",
            Outcome::FailNoRoute => "fail_no_route",
        }
    }

    /// Outcomes the command line reports with a failing exit status.
    pub fn is_fatal(self) -> bool {
        matches!(self, Outcome::FailInvalidOrigin | Outcome::FailNoConnectivity)
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify a failed leg from the reachability flags of its candidates.
pub fn classify_failure(origin: &PathLocation, destination: &PathLocation) -> Outcome {
    let unreachable_origin = origin.edges.iter().any(|e| e.unreachable);
    let unreachable_dest = destination.edges.iter().any(|e| e.unreachable);
    match (unreachable_origin, unreachable_dest) {
        (true, true) => Outcome::FailUnreachableLocations,
        (true, false) => Outcome::FailUnreachableOrigin,
        (false, true) => Outcome::FailUnreachableDest,
        (false, false) => Outcome::FailNoRoute,
    }
}

/// Timing of diagnostic re-runs. Kept apart from every correctness counter.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RerunTiming {
    pub runs: u32,
    pub total: Duration,
}

impl RerunTiming {
    pub fn record(&mut self, elapsed: Duration) {
        self.runs += 1;
        self.total += elapsed;
    }

    pub fn total_ms(&self) -> u64 {
        self.total.as_millis() as u64
    }

    pub fn average_ms(&self) -> u64 {
        if self.runs == 0 {
            0
        } else {
            self.total_ms() / u64::from(self.runs)
        }
    }
}

/// Counters accumulated over every leg of one request.
#[derive(Debug, Clone)]
pub struct RunStatistics {
    origin: LatLng,
    destination: LatLng,
    outcome: Option<Outcome>,
    passes: u32,
    runtime: Duration,
    trip_time: f64,
    trip_distance: f64,
    straight_line_distance: f64,
    maneuvers: u32,
    rerun: RerunTiming,
}

impl RunStatistics {
    /// Statistics for a request from `origin` to its final `destination`.
    pub fn new(origin: LatLng, destination: LatLng) -> Self {
        Self {
            origin,
            destination,
            outcome: None,
            passes: 0,
            runtime: Duration::ZERO,
            trip_time: 0.0,
            trip_distance: 0.0,
            straight_line_distance: 0.0,
            maneuvers: 0,
            rerun: RerunTiming::default(),
        }
    }

    pub fn record_pass(&mut self) {
        self.passes += 1;
    }

    pub fn add_runtime(&mut self, elapsed: Duration) {
        self.runtime += elapsed;
    }

    /// Trip time in seconds.
    pub fn set_trip_time(&mut self, secs: f64) {
        self.trip_time = secs;
    }

    /// Trip distance in the request's units.
    pub fn set_trip_distance(&mut self, distance: f64) {
        self.trip_distance = distance;
    }

    pub fn set_straight_line_distance(&mut self, distance: f64) {
        self.straight_line_distance = distance;
    }

    pub fn set_maneuver_count(&mut self, count: u32) {
        self.maneuvers = count;
    }

    pub fn set_outcome(&mut self, outcome: Outcome) {
        self.outcome = Some(outcome);
    }

    pub fn record_rerun(&mut self, elapsed: Duration) {
        self.rerun.record(elapsed);
    }

    pub fn passes(&self) -> u32 {
        self.passes
    }

    pub fn outcome(&self) -> Option<Outcome> {
        self.outcome
    }

    pub fn trip_time(&self) -> f64 {
        self.trip_time
    }

    pub fn trip_distance(&self) -> f64 {
        self.trip_distance
    }

    pub fn maneuvers(&self) -> u32 {
        self.maneuvers
    }

    pub fn rerun(&self) -> RerunTiming {
        self.rerun
    }

    pub fn record(&self) -> StatisticsRecord {
        StatisticsRecord {
            origin_lat: self.origin.lat,
            origin_lon: self.origin.lng,
            dest_lat: self.destination.lat,
            dest_lon: self.destination.lng,
            outcome: self
                .outcome
                .map_or(UNSET_OUTCOME, Outcome::as_str)
                .to_string(),
            pass_count: self.passes,
            runtime_ms: self.runtime.as_millis() as u64,
            trip_time_s: self.trip_time.round().max(0.0) as u64,
            trip_distance: self.trip_distance,
            straight_line_distance: self.straight_line_distance,
            maneuver_count: self.maneuvers,
        }
    }

    /// Build the record and log it under the `statistics` target.
    pub fn emit(&self) -> StatisticsRecord {
        let record = self.record();
        info!(target: "statistics", "{record}");
        record
    }
}

/// Rendered in place of an outcome that was never set.
const UNSET_OUTCOME: &str = "incomplete";

/// The 11-field statistics record, in output order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatisticsRecord {
    pub origin_lat: f64,
    pub origin_lon: f64,
    pub dest_lat: f64,
    pub dest_lon: f64,
    pub outcome: String,
    pub pass_count: u32,
    pub runtime_ms: u64,
    pub trip_time_s: u64,
    pub trip_distance: f64,
    pub straight_line_distance: f64,
    pub maneuver_count: u32,
}

impl StatisticsRecord {
    pub const FIELDS: [&'static str; 11] = [
        "origin_lat",
        "origin_lon",
        "dest_lat",
        "dest_lon",
        "outcome",
        "pass_count",
        "runtime_ms",
        "trip_time_s",
        "trip_distance",
        "straight_line_distance",
        "maneuver_count",
    ];
}

impl fmt::Display for StatisticsRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:.6},{:.6},{:.6},{:.6},{},{},{},{},{:.6},{:.6},{}",
            self.origin_lat,
            self.origin_lon,
            self.dest_lat,
            self.dest_lon,
            self.outcome,
            self.pass_count,
            self.runtime_ms,
            self.trip_time_s,
            self.trip_distance,
            self.straight_line_distance,
            self.maneuver_count
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::correlate::PathEdge;
    use crate::graph::EdgeId;
    use crate::location::Waypoint;

    fn location(flags: &[bool]) -> PathLocation {
        PathLocation {
            waypoint: Waypoint::new(0.0, 0.0),
            edges: flags
                .iter()
                .enumerate()
                .map(|(i, &unreachable)| PathEdge {
                    id: EdgeId(i as u64),
                    percent_along: 0.0,
                    distance: 0.0,
                    unreachable,
                    projected: LatLng::new(0.0, 0.0),
                })
                .collect(),
        }
    }

    #[test]
    fn failure_classification_uses_any_flag() {
        let clean = location(&[false, false]);
        let flagged = location(&[false, true]);
        assert_eq!(classify_failure(&clean, &clean), Outcome::FailNoRoute);
        assert_eq!(
            classify_failure(&flagged, &clean),
            Outcome::FailUnreachableOrigin
        );
        assert_eq!(
            classify_failure(&clean, &flagged),
            Outcome::FailUnreachableDest
        );
        assert_eq!(
            classify_failure(&flagged, &flagged),
            Outcome::FailUnreachableLocations
        );
    }

    #[test]
    fn failure_record_has_eleven_zeroed_fields() {
        let mut stats = RunStatistics::new(LatLng::new(40.0, -75.0), LatLng::new(40.0, -74.94));
        stats.set_outcome(Outcome::FailNoConnectivity);
        let line = stats.emit().to_string();
        let fields: Vec<_> = line.split(',').collect();
        assert_eq!(fields.len(), StatisticsRecord::FIELDS.len());
        assert_eq!(
            line,
            "40.000000,-75.000000,40.000000,-74.940000,fail_no_connectivity,0,0,0,0.000000,0.000000,0"
        );
    }

    #[test]
    fn json_record_uses_field_names() {
        let mut stats = RunStatistics::new(LatLng::new(1.0, 2.0), LatLng::new(3.0, 4.0));
        stats.record_pass();
        stats.set_trip_time(61.6);
        stats.set_trip_distance(1.5);
        stats.set_maneuver_count(2);
        stats.set_outcome(Outcome::Success);
        let value = serde_json::to_value(stats.record()).expect("serialises");
        assert_eq!(value["outcome"], "success");
        assert_eq!(value["pass_count"], 1);
        assert_eq!(value["trip_time_s"], 62);
        assert_eq!(value.as_object().map(|o| o.len()), Some(11));
    }

    #[test]
    fn reruns_do_not_touch_counters() {
        let mut stats = RunStatistics::new(LatLng::new(0.0, 0.0), LatLng::new(0.0, 0.0));
        stats.record_pass();
        stats.record_rerun(Duration::from_millis(10));
        stats.record_rerun(Duration::from_millis(30));
        assert_eq!(stats.passes(), 1);
        assert_eq!(stats.rerun().runs, 2);
        assert_eq!(stats.rerun().average_ms(), 20);
        assert_eq!(stats.record().outcome, "incomplete");
    }
}
