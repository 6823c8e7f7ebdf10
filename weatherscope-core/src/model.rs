use std::fmt;

use chrono::TimeZone;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::WeatherscopeError;

/// Invocation event shared by both handlers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LookupRequest {
    pub longitude: f64,
    pub latitude: f64,
    /// Unix seconds. Deployed callers send either a number or a numeric string.
    #[serde(default, deserialize_with = "deserialize_timestamp")]
    pub timestamp: Option<i64>,
    #[serde(default)]
    pub unit: String,
    #[serde(default)]
    pub action: String,
}

impl LookupRequest {
    /// The weather observation this request asks for. A timestamp is mandatory here.
    pub fn observation(&self) -> Result<Observation, WeatherscopeError> {
        let timestamp = self.timestamp.ok_or_else(|| {
            WeatherscopeError::InvalidRequest("timestamp is required for a weather lookup".into())
        })?;

        Ok(Observation {
            longitude: self.longitude,
            latitude: self.latitude,
            timestamp,
            unit: self.unit.clone(),
        })
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawTimestamp {
    Number(i64),
    Text(String),
}

fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<RawTimestamp>::deserialize(deserializer)? {
        None => Ok(None),
        Some(RawTimestamp::Number(ts)) => Ok(Some(ts)),
        Some(RawTimestamp::Text(s)) if s.trim().is_empty() => Ok(None),
        Some(RawTimestamp::Text(s)) => s
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| serde::de::Error::custom(format!("invalid timestamp '{s}'"))),
    }
}

/// Notification event, read leniently: a timestamp that cannot be read as
/// seconds only affects the rendered time, never the invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct NotificationRequest {
    pub longitude: f64,
    pub latitude: f64,
    pub timestamp: EventTimestamp,
    pub action: String,
}

impl NotificationRequest {
    pub fn from_event(event: &Value) -> Result<Self, WeatherscopeError> {
        Ok(Self {
            longitude: coordinate(event, "longitude")?,
            latitude: coordinate(event, "latitude")?,
            timestamp: EventTimestamp::from_value(event.get("timestamp")),
            action: event.get("action").and_then(Value::as_str).unwrap_or_default().to_string(),
        })
    }
}

fn coordinate(event: &Value, field: &str) -> Result<f64, WeatherscopeError> {
    let value = event.get(field);
    value
        .and_then(Value::as_f64)
        .or_else(|| value.and_then(Value::as_str).and_then(|s| s.trim().parse().ok()))
        .ok_or_else(|| WeatherscopeError::InvalidRequest(format!("{field} must be a number")))
}

/// Timestamp as sent in a notification event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EventTimestamp {
    /// Absent, null, `0`, `false` or `""`.
    #[default]
    Missing,
    Seconds(i64),
    /// Present but with no leading integer, e.g. `"n/a"`.
    Unparsable,
}

impl EventTimestamp {
    /// Numbers are truncated; strings use their leading integer, so `"0"` is
    /// the epoch while numeric `0` counts as missing.
    pub fn from_value(value: Option<&Value>) -> Self {
        match value {
            None | Some(Value::Null) | Some(Value::Bool(false)) => Self::Missing,
            Some(Value::Number(n)) => match n.as_i64() {
                Some(0) => Self::Missing,
                Some(ts) => Self::Seconds(ts),
                None => match n.as_f64() {
                    Some(f) if f == 0.0 => Self::Missing,
                    Some(f) if f.is_finite() && f.abs() < i64::MAX as f64 => {
                        Self::Seconds(f.trunc() as i64)
                    }
                    _ => Self::Unparsable,
                },
            },
            Some(Value::String(s)) if s.is_empty() => Self::Missing,
            Some(Value::String(s)) => leading_integer(s).map_or(Self::Unparsable, Self::Seconds),
            Some(_) => Self::Unparsable,
        }
    }

    pub fn seconds(self) -> Option<i64> {
        match self {
            Self::Seconds(ts) => Some(ts),
            _ => None,
        }
    }
}

fn leading_integer(s: &str) -> Option<i64> {
    let s = s.trim_start();
    let digits_from = usize::from(s.starts_with(['+', '-']));
    let end = s[digits_from..]
        .find(|c: char| !c.is_ascii_digit())
        .map_or(s.len(), |i| i + digits_from);
    if end == digits_from {
        return None;
    }
    s[..end].parse().ok()
}

/// A single historical weather observation at a point.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub longitude: f64,
    pub latitude: f64,
    pub timestamp: i64,
    pub unit: String,
}

/// Cache key for one observation: `"{longitude},{latitude},{timestamp}"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn new(longitude: f64, latitude: f64, timestamp: i64) -> Self {
        Self(format!("{},{},{timestamp}", key_number(longitude), key_number(latitude)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Number rendering shared with keys already written by the deployed
/// functions: no negative zero, exponent form below 1e-6 and from 1e21.
fn key_number(value: f64) -> String {
    if value == 0.0 {
        return "0".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }

    let magnitude = value.abs();
    if magnitude < 1e-6 || magnitude >= 1e21 {
        let exp = format!("{value:e}");
        match exp.split_once('e') {
            Some((mantissa, power)) if !power.starts_with('-') => format!("{mantissa}e+{power}"),
            _ => exp,
        }
    } else {
        value.to_string()
    }
}

impl From<&Observation> for CacheKey {
    fn from(obs: &Observation) -> Self {
        Self::new(obs.longitude, obs.latitude, obs.timestamp)
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Output of the weather lookup handler. The payload is the provider's JSON, untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LookupResponse {
    #[serde(rename = "weatherData")]
    pub weather_data: Value,
}

pub const UNKNOWN_CITY: &str = "Unknown City";
pub const UNKNOWN_COUNTRY: &str = "Unknown Country";

/// City and country resolved from reverse geocoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceName {
    pub city: String,
    pub country: String,
}

impl PlaceName {
    /// Falls back to [`PlaceName::unknown`] unless both parts are present.
    pub fn from_parts(city: Option<String>, country: Option<String>) -> Self {
        match (city, country) {
            (Some(city), Some(country)) => Self { city, country },
            _ => Self::unknown(),
        }
    }

    pub fn unknown() -> Self {
        Self { city: UNKNOWN_CITY.to_string(), country: UNKNOWN_COUNTRY.to_string() }
    }
}

impl fmt::Display for PlaceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}", self.city, self.country)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Current,
    Timestamp,
    Other(String),
}

impl Action {
    pub fn parse(value: &str) -> Self {
        match value {
            "current" => Action::Current,
            "timestamp" => Action::Timestamp,
            other => Action::Other(other.to_string()),
        }
    }
}

pub const UNKNOWN_DATE_TIME: &str = "unknown date and time";

/// Render unix seconds as `DD/MM/YYYY HH:MM:SS` in `tz`.
pub fn format_timestamp<Tz: TimeZone>(timestamp: i64, tz: &Tz) -> Option<String>
where
    Tz::Offset: fmt::Display,
{
    let dt = tz.timestamp_opt(timestamp, 0).single()?;
    Some(dt.format("%d/%m/%Y %H:%M:%S").to_string())
}

/// Text published for one notification request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationMessage(String);

impl NotificationMessage {
    pub fn compose<Tz: TimeZone>(
        action: &Action,
        timestamp: EventTimestamp,
        place: &PlaceName,
        tz: &Tz,
    ) -> Self
    where
        Tz::Offset: fmt::Display,
    {
        let text = match action {
            Action::Current => format!(" Weatherscope API triggered for currentweather in {place}"),
            Action::Timestamp => {
                let when = timestamp
                    .seconds()
                    .and_then(|ts| format_timestamp(ts, tz))
                    .unwrap_or_else(|| UNKNOWN_DATE_TIME.to_string());
                format!(" Weatherscope API triggered for weather at {when} in {place}")
            }
            Action::Other(_) => " Invalid action specified".to_string(),
        };

        Self(text)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NotificationMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, Utc};
    use serde_json::json;

    fn paris() -> PlaceName {
        PlaceName { city: "Paris".into(), country: "France".into() }
    }

    #[test]
    fn request_accepts_numeric_and_string_timestamps() {
        let req: LookupRequest = serde_json::from_value(json!({
            "longitude": 10, "latitude": 20, "timestamp": 1000, "unit": "metric", "action": "current"
        }))
        .unwrap();
        assert_eq!(req.timestamp, Some(1000));
        assert_eq!(req.unit, "metric");

        let req: LookupRequest = serde_json::from_value(json!({
            "longitude": 10.5, "latitude": -20.25, "timestamp": "1700000000"
        }))
        .unwrap();
        assert_eq!(req.timestamp, Some(1_700_000_000));
        assert_eq!(req.action, "");
    }

    #[test]
    fn request_rejects_garbage_timestamp() {
        let res: Result<LookupRequest, _> = serde_json::from_value(json!({
            "longitude": 1, "latitude": 2, "timestamp": "yesterday"
        }));
        assert!(res.is_err());
    }

    #[test]
    fn observation_requires_timestamp() {
        let req: LookupRequest =
            serde_json::from_value(json!({ "longitude": 1, "latitude": 2 })).unwrap();
        let err = req.observation().unwrap_err();
        assert!(err.to_string().contains("timestamp is required"));
    }

    #[test]
    fn cache_key_joins_coordinates_and_time() {
        assert_eq!(CacheKey::new(10.0, 20.0, 1000).as_str(), "10,20,1000");
        assert_eq!(CacheKey::new(-73.9857, 40.7484, 1_700_000_000).as_str(), "-73.9857,40.7484,1700000000");
    }

    #[test]
    fn cache_key_numbers_match_existing_entries() {
        assert_eq!(CacheKey::new(-0.0, 1e-7, 5).as_str(), "0,1e-7,5");
        assert_eq!(CacheKey::new(0.000001, -1.5e-7, 5).as_str(), "0.000001,-1.5e-7,5");
        assert_eq!(CacheKey::new(1e21, 2.5, 0).as_str(), "1e+21,2.5,0");
    }

    #[test]
    fn cache_key_is_stable_and_distinguishes_triples() {
        assert_eq!(CacheKey::new(1.5, 2.0, 3), CacheKey::new(1.5, 2.0, 3));

        let keys = [
            CacheKey::new(1.0, 2.0, 3),
            CacheKey::new(2.0, 1.0, 3),
            CacheKey::new(1.0, 2.0, 4),
            CacheKey::new(1.0, 23.0, 0),
            CacheKey::new(12.0, 3.0, 0),
        ];
        for (i, a) in keys.iter().enumerate() {
            for b in &keys[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn lookup_response_uses_weather_data_field() {
        let resp = LookupResponse { weather_data: json!({ "temp": 21.5 }) };
        assert_eq!(serde_json::to_value(&resp).unwrap(), json!({ "weatherData": { "temp": 21.5 } }));
    }

    #[test]
    fn place_name_falls_back_when_part_missing() {
        assert_eq!(PlaceName::from_parts(Some("Paris".into()), Some("France".into())), paris());
        assert_eq!(
            PlaceName::from_parts(Some("Paris".into()), None).to_string(),
            "Unknown City, Unknown Country"
        );
        assert_eq!(PlaceName::from_parts(None, Some("France".into())), PlaceName::unknown());
    }

    #[test]
    fn formats_timestamp_in_zone() {
        assert_eq!(format_timestamp(1_700_000_000, &Utc).as_deref(), Some("14/11/2023 22:13:20"));

        let cet = FixedOffset::east_opt(3600).unwrap();
        assert_eq!(format_timestamp(1_700_000_000, &cet).as_deref(), Some("14/11/2023 23:13:20"));
        assert_eq!(format_timestamp(0, &Utc).as_deref(), Some("01/01/1970 00:00:00"));
    }

    #[test]
    fn current_message_keeps_deployed_wording() {
        let ts = EventTimestamp::Seconds(1);
        let msg = NotificationMessage::compose(&Action::Current, ts, &paris(), &Utc);
        assert_eq!(msg.as_str(), " Weatherscope API triggered for currentweather in Paris, France");
    }

    #[test]
    fn timestamp_message_includes_formatted_time() {
        let ts = EventTimestamp::Seconds(1_700_000_000);
        let msg = NotificationMessage::compose(&Action::Timestamp, ts, &paris(), &Utc);
        assert_eq!(
            msg.as_str(),
            " Weatherscope API triggered for weather at 14/11/2023 22:13:20 in Paris, France"
        );
    }

    #[test]
    fn timestamp_message_without_time() {
        for ts in [EventTimestamp::Missing, EventTimestamp::Unparsable] {
            let msg = NotificationMessage::compose(&Action::Timestamp, ts, &paris(), &Utc);
            assert_eq!(
                msg.as_str(),
                " Weatherscope API triggered for weather at unknown date and time in Paris, France"
            );
        }
    }

    #[test]
    fn unknown_action_yields_invalid_message() {
        let action = Action::parse("bogus");
        assert_eq!(action, Action::Other("bogus".into()));

        let ts = EventTimestamp::Unparsable;
        let msg = NotificationMessage::compose(&action, ts, &paris(), &Utc);
        assert_eq!(msg.as_str(), " Invalid action specified");
    }

    #[test]
    fn event_timestamp_reads_like_the_deployed_parser() {
        let read = |v: serde_json::Value| EventTimestamp::from_value(Some(&v));

        assert_eq!(EventTimestamp::from_value(None), EventTimestamp::Missing);
        assert_eq!(read(json!(null)), EventTimestamp::Missing);
        assert_eq!(read(json!(0)), EventTimestamp::Missing);
        assert_eq!(read(json!("")), EventTimestamp::Missing);
        assert_eq!(read(json!(1_700_000_000)), EventTimestamp::Seconds(1_700_000_000));
        assert_eq!(read(json!(1_700_000_000.5)), EventTimestamp::Seconds(1_700_000_000));
        assert_eq!(read(json!("1700000000")), EventTimestamp::Seconds(1_700_000_000));
        assert_eq!(read(json!(" -42abc")), EventTimestamp::Seconds(-42));
        assert_eq!(read(json!("0")), EventTimestamp::Seconds(0));
        assert_eq!(read(json!("n/a")), EventTimestamp::Unparsable);
        assert_eq!(read(json!("-")), EventTimestamp::Unparsable);
        assert_eq!(read(json!({ "ts": 1 })), EventTimestamp::Unparsable);
    }

    #[test]
    fn string_zero_timestamp_renders_the_epoch() {
        let ts = EventTimestamp::from_value(Some(&json!("0")));
        let msg = NotificationMessage::compose(&Action::Timestamp, ts, &paris(), &Utc);
        assert_eq!(
            msg.as_str(),
            " Weatherscope API triggered for weather at 01/01/1970 00:00:00 in Paris, France"
        );
    }

    #[test]
    fn notification_request_tolerates_bad_timestamp() {
        let req = NotificationRequest::from_event(&json!({
            "longitude": 2.3522, "latitude": "48.8566", "timestamp": "n/a", "action": "current"
        }))
        .unwrap();

        assert_eq!(req.latitude, 48.8566);
        assert_eq!(req.timestamp, EventTimestamp::Unparsable);
        assert_eq!(req.action, "current");
    }

    #[test]
    fn notification_request_requires_coordinates() {
        let err = NotificationRequest::from_event(&json!({ "latitude": 1, "action": "current" }))
            .unwrap_err();
        assert!(err.to_string().contains("longitude must be a number"));
    }
}
