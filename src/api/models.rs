//! Typed views over War API payloads.
//!
//! Payloads are cached and persisted as raw JSON; these views are derived
//! from them on demand, so unknown fields survive a round trip.

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;

/// Decode a typed view out of a raw payload.
///
/// Returns `None` for `null`, empty objects, and shapes that don't match.
pub fn view<T: DeserializeOwned>(payload: &Value) -> Option<T> {
    match payload {
        Value::Null => None,
        Value::Object(map) if map.is_empty() => None,
        other => T::deserialize(other).ok(),
    }
}

/// Per-map war report.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WarReport {
    pub total_enlistments: i64,
    pub colonial_casualties: i64,
    pub warden_casualties: i64,
    pub day_of_war: Option<i64>,
    pub version: i64,
}

/// Dynamic map data: the icons currently placed on a map.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MapData {
    pub region_id: Option<i64>,
    pub map_items: Vec<MapItem>,
    pub last_updated: Option<i64>,
    pub version: Option<i64>,
}

/// A single icon on a map.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MapItem {
    pub team_id: String,
    pub icon_type: i64,
    pub x: f64,
    pub y: f64,
    pub flags: i64,
}

/// Global war status.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WarState {
    pub war_id: Option<String>,
    pub war_number: Option<i64>,
    pub winner: Option<String>,
    pub conquest_start_time: Option<i64>,
    pub conquest_end_time: Option<i64>,
    pub required_victory_towns: Option<i64>,
}
