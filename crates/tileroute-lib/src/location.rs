//! Waypoints as supplied by callers, in CSV or JSON form.

use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::geo::LatLng;

/// Format accepted for depart-at / arrive-by values.
pub const DATE_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M";

/// Whether the route may stop at a waypoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopType {
    #[default]
    Break,
    Through,
}

impl StopType {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "" | "break" | "stop" => Some(StopType::Break),
            "through" => Some(StopType::Through),
            _ => None,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            StopType::Break => "break",
            StopType::Through => "through",
        }
    }
}

/// Time annotation attached to the first or last waypoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeAnnotation {
    Current,
    DepartAt(NaiveDateTime),
    ArriveBy(NaiveDateTime),
}

/// Optional address metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Address {
    pub name: Option<String>,
    pub street: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts = [
            &self.name,
            &self.street,
            &self.city,
            &self.state,
            &self.postal_code,
            &self.country,
        ];
        let joined = parts
            .iter()
            .map(|p| p.as_deref().unwrap_or(""))
            .collect::<Vec<_>>()
            .join(",");
        f.write_str(&joined)
    }
}

/// A location the route must visit.
#[derive(Debug, Clone, PartialEq)]
pub struct Waypoint {
    pub latlng: LatLng,
    pub stop_type: StopType,
    /// Preferred direction of travel in degrees, when known.
    pub heading: Option<u16>,
    pub address: Address,
    pub date_time: Option<TimeAnnotation>,
}

impl Waypoint {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self {
            latlng: LatLng::new(lat, lng),
            stop_type: StopType::Break,
            heading: None,
            address: Address::default(),
            date_time: None,
        }
    }

    /// Parse `lat,lng,[through|break],[name],[street],[city],[state],[zip],[country]`.
    pub fn from_csv(input: &str) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(input.as_bytes());

        let record = match reader.records().next() {
            Some(record) => record?,
            None => return Err(Error::invalid_location(input, "empty location")),
        };

        let field = |idx: usize| -> Option<String> {
            record
                .get(idx)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };

        let lat = parse_coordinate(input, record.get(0), "latitude")?;
        let lng = parse_coordinate(input, record.get(1), "longitude")?;
        let stop_type = match record.get(2) {
            Some(value) => StopType::parse(value).ok_or_else(|| {
                Error::invalid_location(input, format!("unknown stop type '{value}'"))
            })?,
            None => StopType::Break,
        };

        let waypoint = Waypoint {
            latlng: LatLng::new(lat, lng),
            stop_type,
            heading: None,
            address: Address {
                name: field(3),
                street: field(4),
                city: field(5),
                state: field(6),
                postal_code: field(7),
                country: field(8),
            },
            date_time: None,
        };
        waypoint.validate(input)
    }

    /// Parse one entry of a request's `locations` array.
    pub fn from_json(value: &Value) -> Result<Self> {
        let record: LocationRecord = serde_json::from_value(value.clone())
            .map_err(|e| Error::invalid_location(value.to_string(), e.to_string()))?;

        let stop_type = match record.stop_type.as_deref() {
            Some(value_type) => StopType::parse(value_type).ok_or_else(|| {
                Error::invalid_location(
                    value.to_string(),
                    format!("unknown stop type '{value_type}'"),
                )
            })?,
            None => StopType::Break,
        };

        let waypoint = Waypoint {
            latlng: LatLng::new(record.lat, record.lon),
            stop_type,
            heading: record.heading.map(|h| h.rem_euclid(360) as u16),
            address: Address {
                name: record.name,
                street: record.street,
                city: record.city,
                state: record.state,
                postal_code: record.postal_code,
                country: record.country,
            },
            date_time: None,
        };
        waypoint.validate(&value.to_string())
    }

    /// JSON location form, as accepted by [`Waypoint::from_json`].
    pub fn to_json(&self) -> Value {
        let record = LocationRecord {
            lat: self.latlng.lat,
            lon: self.latlng.lng,
            stop_type: Some(self.stop_type.as_str().to_string()),
            heading: self.heading.map(i64::from),
            name: self.address.name.clone(),
            street: self.address.street.clone(),
            city: self.address.city.clone(),
            state: self.address.state.clone(),
            postal_code: self.address.postal_code.clone(),
            country: self.address.country.clone(),
        };
        serde_json::to_value(record).unwrap_or(Value::Null)
    }

    fn validate(self, input: &str) -> Result<Self> {
        if !self.latlng.is_valid() {
            return Err(Error::invalid_location(
                input,
                "coordinates out of range",
            ));
        }
        Ok(self)
    }
}

fn parse_coordinate(input: &str, value: Option<&str>, what: &str) -> Result<f64> {
    let value = value
        .filter(|v| !v.is_empty())
        .ok_or_else(|| Error::invalid_location(input, format!("missing {what}")))?;
    value
        .parse::<f64>()
        .map_err(|_| Error::invalid_location(input, format!("{what} '{value}' is not a number")))
}

/// Parse a depart-at / arrive-by value.
pub fn parse_date_time(value: &str) -> Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value, DATE_TIME_FORMAT).map_err(|e| {
        Error::invalid_request(format!(
            "date_time value '{value}' does not match {DATE_TIME_FORMAT}: {e}"
        ))
    })
}

#[derive(Debug, Serialize, Deserialize)]
struct LocationRecord {
    lat: f64,
    lon: f64,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    stop_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    heading: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    street: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    postal_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    country: Option<String>,
}
