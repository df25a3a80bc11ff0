//! Route requests, from JSON or from plain CSV arguments.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;

use crate::costing::normalize_mode;
use crate::error::{Error, Result};
use crate::geo::{KM_PER_METER, METERS_PER_MILE, MILE_PER_KM};
use crate::location::{parse_date_time, TimeAnnotation, Waypoint};

/// Route type name that combines walking with transit.
pub const MULTIMODAL: &str = "multimodal";

/// What kind of route is requested: one costing, or multimodal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteType {
    Multimodal,
    Costing(String),
}

impl RouteType {
    pub fn parse(name: &str) -> Self {
        let name = normalize_mode(name);
        if name == MULTIMODAL {
            RouteType::Multimodal
        } else {
            RouteType::Costing(name)
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            RouteType::Multimodal => MULTIMODAL,
            RouteType::Costing(name) => name,
        }
    }

    pub fn is_multimodal(&self) -> bool {
        matches!(self, RouteType::Multimodal)
    }

    pub fn is_pedestrian(&self) -> bool {
        matches!(self, RouteType::Costing(name) if name == "pedestrian")
    }
}

impl fmt::Display for RouteType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Distance units for directions and statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Units {
    #[default]
    #[serde(alias = "mi")]
    Miles,
    #[serde(alias = "km")]
    Kilometers,
}

impl Units {
    pub fn abbreviation(self) -> &'static str {
        match self {
            Units::Miles => "mi",
            Units::Kilometers => "km",
        }
    }

    pub fn from_meters(self, meters: f64) -> f64 {
        match self {
            Units::Miles => meters / METERS_PER_MILE,
            Units::Kilometers => meters * KM_PER_METER,
        }
    }

    pub fn from_km(self, km: f64) -> f64 {
        match self {
            Units::Miles => km * MILE_PER_KM,
            Units::Kilometers => km,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectionsOptions {
    pub units: Units,
    pub language: String,
}

impl Default for DirectionsOptions {
    fn default() -> Self {
        Self {
            units: Units::Miles,
            language: "en-US".to_string(),
        }
    }
}

/// A parsed route request.
#[derive(Debug, Clone)]
pub struct RouteRequest {
    pub locations: Vec<Waypoint>,
    pub route_type: RouteType,
    pub directions_options: DirectionsOptions,
    /// The request tree, kept for per-mode `costing_options` overrides.
    raw: Value,
}

impl RouteRequest {
    /// Parse the JSON request form.
    pub fn from_json(json: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(json)?;
        Self::from_value(value)
    }

    pub fn from_value(raw: Value) -> Result<Self> {
        let mut locations = raw
            .get("locations")
            .and_then(Value::as_array)
            .ok_or_else(insufficient_locations)?
            .iter()
            .map(Waypoint::from_json)
            .collect::<Result<Vec<_>>>()?;
        if locations.len() < 2 {
            return Err(insufficient_locations());
        }

        let costing = raw
            .get("costing")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::invalid_request("no edge/node costing provided"))?;

        let directions_options = match raw.get("directions_options") {
            Some(options) => serde_json::from_value(options.clone()).map_err(|e| {
                Error::invalid_request(format!("invalid directions_options: {e}"))
            })?,
            None => DirectionsOptions::default(),
        };

        if let Some(date_time) = raw.get("date_time") {
            apply_date_time(&mut locations, date_time)?;
        }

        let request = Self {
            locations,
            route_type: RouteType::parse(costing),
            directions_options,
            raw,
        };
        debug!(
            route_type = %request.route_type,
            locations = request.locations.len(),
            "parsed route request"
        );
        Ok(request)
    }

    /// Build a two-location request from CSV waypoints and a route type.
    pub fn from_csv(origin: &str, destination: &str, route_type: &str) -> Result<Self> {
        Ok(Self {
            locations: vec![Waypoint::from_csv(origin)?, Waypoint::from_csv(destination)?],
            route_type: RouteType::parse(route_type),
            directions_options: DirectionsOptions::default(),
            raw: json!({}),
        })
    }

    /// The request tree consulted for `costing_options` overrides.
    pub fn raw(&self) -> &Value {
        &self.raw
    }

    /// Equivalent JSON request, as logged for reproduction.
    pub fn to_json(&self) -> Value {
        json!({
            "locations": self.locations.iter().map(Waypoint::to_json).collect::<Vec<_>>(),
            "costing": self.route_type.as_str(),
            "directions_options": self.directions_options,
        })
    }
}

fn insufficient_locations() -> Error {
    Error::invalid_location(
        "locations",
        "insufficiently specified required parameter 'locations'",
    )
}

fn apply_date_time(locations: &mut [Waypoint], date_time: &Value) -> Result<()> {
    let kind = date_time
        .get("type")
        .and_then(Value::as_i64)
        .ok_or_else(|| Error::invalid_request("date_time requires an integer 'type'"))?;
    let value = || -> Result<_> {
        let raw = date_time
            .get("value")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::invalid_request("date_time requires a 'value'"))?;
        parse_date_time(raw)
    };

    match kind {
        0 => {
            if let Some(first) = locations.first_mut() {
                first.date_time = Some(TimeAnnotation::Current);
            }
        }
        1 => {
            let at = value()?;
            if let Some(first) = locations.first_mut() {
                first.date_time = Some(TimeAnnotation::DepartAt(at));
            }
        }
        2 => {
            let by = value()?;
            if let Some(last) = locations.last_mut() {
                last.date_time = Some(TimeAnnotation::ArriveBy(by));
            }
        }
        other => {
            return Err(Error::invalid_request(format!(
                "unsupported date_time type {other}"
            )))
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_STOPS: &str = r#"[
        {"lat": 40.748174, "lon": -73.984984, "type": "break", "name": "Empire State Building"},
        {"lat": 40.749231, "lon": -73.968703, "type": "break"}
    ]"#;

    fn request(extra: &str) -> String {
        format!(r#"{{"locations": {TWO_STOPS}, "costing": "auto"{extra}}}"#)
    }

    #[test]
    fn defaults_to_miles_and_english() {
        let req = RouteRequest::from_json(&request("")).expect("parses");
        assert_eq!(req.route_type, RouteType::Costing("auto".to_string()));
        assert_eq!(req.directions_options, DirectionsOptions::default());
        assert_eq!(req.locations.len(), 2);
    }

    #[test]
    fn kilometers_are_accepted() {
        let req = RouteRequest::from_json(&request(
            r#", "directions_options": {"units": "kilometers", "language": "de-DE"}"#,
        ))
        .expect("parses");
        assert_eq!(req.directions_options.units, Units::Kilometers);
        assert_eq!(req.directions_options.language, "de-DE");
    }

    #[test]
    fn depart_at_lands_on_first_location() {
        let req = RouteRequest::from_json(&request(
            r#", "date_time": {"type": 1, "value": "2016-07-03T08:06"}"#,
        ))
        .expect("parses");
        assert!(matches!(
            req.locations[0].date_time,
            Some(TimeAnnotation::DepartAt(_))
        ));
        assert_eq!(req.locations[1].date_time, None);
    }

    #[test]
    fn arrive_by_lands_on_last_location() {
        let req = RouteRequest::from_json(&request(
            r#", "date_time": {"type": 2, "value": "2016-07-03T08:06"}"#,
        ))
        .expect("parses");
        assert_eq!(req.locations[0].date_time, None);
        assert!(matches!(
            req.locations[1].date_time,
            Some(TimeAnnotation::ArriveBy(_))
        ));
    }

    #[test]
    fn current_time_marks_first_location() {
        let req = RouteRequest::from_json(&request(r#", "date_time": {"type": 0}"#))
            .expect("parses");
        assert_eq!(req.locations[0].date_time, Some(TimeAnnotation::Current));
    }

    #[test]
    fn single_location_is_rejected() {
        let json = r#"{"locations": [{"lat": 1.0, "lon": 1.0}], "costing": "auto"}"#;
        let err = RouteRequest::from_json(json).expect_err("one location");
        assert!(matches!(err, Error::InvalidLocationSpec { .. }));
    }

    #[test]
    fn missing_costing_is_rejected() {
        let json = format!(r#"{{"locations": {TWO_STOPS}}}"#);
        let err = RouteRequest::from_json(&json).expect_err("no costing");
        assert!(matches!(err, Error::InvalidRequest { .. }));
    }

    #[test]
    fn route_type_names_are_normalised() {
        assert_eq!(RouteType::parse("Multimodal"), RouteType::Multimodal);
        assert_eq!(
            RouteType::parse("auto-shorter"),
            RouteType::Costing("auto_shorter".to_string())
        );
        assert!(RouteType::parse("pedestrian").is_pedestrian());
    }

    #[test]
    fn csv_request_has_two_locations() {
        let req = RouteRequest::from_csv("40.0,-75.0", "40.0,-74.95,through", "bicycle")
            .expect("parses");
        assert_eq!(req.locations.len(), 2);
        assert_eq!(req.raw(), &json!({}));
        assert_eq!(req.to_json()["costing"], "bicycle");
    }

    #[test]
    fn unit_conversions() {
        assert!((Units::Miles.from_meters(1_609.344) - 1.0).abs() < 1e-9);
        assert!((Units::Kilometers.from_meters(2_500.0) - 2.5).abs() < 1e-9);
        assert!((Units::Miles.from_km(10.0) - 6.21371).abs() < 1e-9);
    }
}
