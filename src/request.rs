//! Time-series request payloads
//!
//! The API accepts three request shapes, each posted to its own endpoint
//! under `/jobs/{jobId}/data/time`. [`TimeRequest`] serializes untagged, so the
//! body on the wire is exactly the inner struct.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::Attribute;

/// Which time-series endpoint a request targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeRequestKind {
    /// Historical samples between two instants
    Historical,
    /// Latest samples at a fixed frequency
    Current,
    /// Samples where a filter condition holds
    Events,
}

impl TimeRequestKind {
    /// Endpoint path below `/jobs/{jobId}`
    pub fn path(&self) -> &'static str {
        match self {
            TimeRequestKind::Historical => "data/time",
            TimeRequestKind::Current => "data/time/current",
            TimeRequestKind::Events => "data/time/events",
        }
    }
}

impl std::fmt::Display for TimeRequestKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TimeRequestKind::Historical => "historical",
            TimeRequestKind::Current => "current",
            TimeRequestKind::Events => "events",
        };
        write!(f, "{s}")
    }
}

impl FromStr for TimeRequestKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "historical" => Ok(TimeRequestKind::Historical),
            "current" => Ok(TimeRequestKind::Current),
            "events" => Ok(TimeRequestKind::Events),
            _ => Err(format!(
                "Invalid time request: {s}. Valid options: historical, current, events"
            )),
        }
    }
}

/// Historical data between `fromTime` and `toTime`, sampled every `interval` seconds
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HistoricalTimeRequest {
    /// Attributes to return
    pub attributes: Vec<Attribute>,
    /// Window start
    pub from_time: DateTime<Utc>,
    /// Window end
    pub to_time: DateTime<Utc>,
    /// Sampling interval in seconds
    pub interval: f64,
    /// Return deltas instead of values
    pub is_differential: bool,
}

/// Current data at `frequency` samples per `interval`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CurrentTimeRequest {
    /// Attributes to return
    pub attributes: Vec<Attribute>,
    /// Sampling frequency
    pub frequency: f64,
    /// Interval in seconds
    pub interval: f64,
    /// Return deltas instead of values
    pub is_differential: bool,
}

/// Closed time window used by event requests
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TimeRange {
    /// Window start
    pub from: DateTime<Utc>,
    /// Window end
    pub to: DateTime<Utc>,
}

/// Single numeric operand
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FilterValue {
    /// Operand
    pub value: i64,
}

/// Set operand for `isIn`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FilterIn {
    /// Accepted values
    pub values: Vec<i64>,
}

/// Inclusive range operand for `between`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FilterRange {
    /// Lower bound
    pub from: String,
    /// Upper bound
    pub to: String,
}

/// Wrapper for `between` so it serializes as `{"range": {...}}`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FilterBetween {
    /// Range operand
    pub range: FilterRange,
}

/// Condition applied to one attribute in an event request
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub enum FilterCondition {
    /// Value is one of the listed values
    IsIn(FilterIn),
    /// Value equals the operand
    Equals(FilterValue),
    /// Value is greater than the operand
    GreaterThan(FilterValue),
    /// Value is greater than or equal to the operand
    GreaterThanEqual(FilterValue),
    /// Value is less than the operand
    LessThan(FilterValue),
    /// Value is less than or equal to the operand
    LessThanEqual(FilterValue),
    /// Value lies in a range
    Between(FilterBetween),
    /// Attribute has any data
    HasData(serde_json::Map<String, serde_json::Value>),
    /// Attribute has no data
    IsNull(serde_json::Map<String, serde_json::Value>),
}

/// Event filter: `{"attributeId": "...", "<condition>": {...}}`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Filter {
    /// Attribute the condition applies to
    pub attribute_id: String,
    /// Condition, flattened next to `attributeId`
    #[serde(flatten)]
    pub condition: FilterCondition,
}

impl Filter {
    /// `attributeId >= value`
    pub fn greater_than_equal(attribute_id: impl Into<String>, value: i64) -> Self {
        Self {
            attribute_id: attribute_id.into(),
            condition: FilterCondition::GreaterThanEqual(FilterValue { value }),
        }
    }
}

/// Event data inside `timeRange` where `filter` holds
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EventTimeRequest {
    /// Attributes to return
    pub output_attributes: Vec<Attribute>,
    /// Window to search
    pub time_range: TimeRange,
    /// Event condition
    pub filter: Filter,
}

/// One of the three time-series request shapes
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(untagged)]
pub enum TimeRequest {
    /// `POST /jobs/{jobId}/data/time`
    Historical(HistoricalTimeRequest),
    /// `POST /jobs/{jobId}/data/time/current`
    Current(CurrentTimeRequest),
    /// `POST /jobs/{jobId}/data/time/events`
    Events(EventTimeRequest),
}

impl TimeRequest {
    /// Endpoint selector for this request
    pub fn kind(&self) -> TimeRequestKind {
        match self {
            TimeRequest::Historical(_) => TimeRequestKind::Historical,
            TimeRequest::Current(_) => TimeRequestKind::Current,
            TimeRequest::Events(_) => TimeRequestKind::Events,
        }
    }
}

/// Inputs shared by the three request builders
#[derive(Debug, Clone)]
pub struct TimeWindow {
    /// Window start
    pub from: DateTime<Utc>,
    /// Window end
    pub to: DateTime<Utc>,
}

impl TimeWindow {
    /// Window `[now - from_hours, now - to_hours]`
    ///
    /// Returns `None` when either end falls outside the representable range.
    pub fn hours_back(now: DateTime<Utc>, from_hours: i64, to_hours: i64) -> Option<Self> {
        let back = |hours| TimeDelta::try_hours(hours).and_then(|d| now.checked_sub_signed(d));
        Some(Self {
            from: back(from_hours)?,
            to: back(to_hours)?,
        })
    }
}

/// Build the request of `kind` for `attributes`
///
/// Returns `None` when `attributes` is empty; every shape needs at least one
/// attribute and the event filter is anchored on the first.
pub fn build_time_request(
    kind: TimeRequestKind,
    attributes: &[Attribute],
    window: &TimeWindow,
    historic_interval: f64,
    current_frequency: f64,
    current_interval: f64,
) -> Option<TimeRequest> {
    let first = attributes.first()?;

    let request = match kind {
        TimeRequestKind::Historical => TimeRequest::Historical(HistoricalTimeRequest {
            attributes: attributes.to_vec(),
            from_time: window.from,
            to_time: window.to,
            interval: historic_interval,
            is_differential: false,
        }),
        TimeRequestKind::Current => TimeRequest::Current(CurrentTimeRequest {
            attributes: attributes.to_vec(),
            frequency: current_frequency,
            interval: current_interval,
            is_differential: false,
        }),
        TimeRequestKind::Events => TimeRequest::Events(EventTimeRequest {
            output_attributes: attributes.to_vec(),
            time_range: TimeRange {
                from: window.from,
                to: window.to,
            },
            filter: Filter::greater_than_equal(first.id.clone(), 0),
        }),
    };

    Some(request)
}
