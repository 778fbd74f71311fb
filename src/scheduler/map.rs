//! Selected map refresh.

use crate::api::{
    dynamic_map_endpoint, static_map_endpoint, war_report_endpoint, ApiError, FetchCache,
    WAR_ENDPOINT,
};

use chrono::{DateTime, Utc};
use serde_json::Value;
use tokio::sync::RwLock;

/// Latest data shown for the selected map, plus the global war state.
#[derive(Debug, Clone, Default)]
pub struct MapState {
    /// Canonical name of the selected map.
    pub selected: Option<String>,
    pub dynamic: Option<Value>,
    pub static_data: Option<Value>,
    pub war_report: Option<Value>,
    pub updated_at: Option<DateTime<Utc>>,
    pub war: Option<Value>,
}

/// Dynamic and static data of one map, fetched together.
#[derive(Debug, Clone)]
pub struct MapPayloads {
    pub dynamic: Value,
    pub static_data: Value,
}

/// Fetch dynamic and static data of `map`; either both arrive or neither.
pub async fn fetch_map(api: &FetchCache, map: &str) -> Result<MapPayloads, ApiError> {
    let dynamic_endpoint = dynamic_map_endpoint(map);
    let static_endpoint = static_map_endpoint(map);

    let (dynamic, static_data) = tokio::try_join!(
        api.fetch(&dynamic_endpoint),
        api.fetch(&static_endpoint),
    )?;

    Ok(MapPayloads {
        dynamic,
        static_data,
    })
}

impl MapState {
    /// Replace the shown map data with freshly fetched payloads for `map`.
    ///
    /// Switching to another map drops the previous map's war report.
    pub fn show(&mut self, map: &str, payloads: MapPayloads) {
        if self.selected.as_deref() != Some(map) {
            self.war_report = None;
        }
        self.selected = Some(map.to_string());
        self.dynamic = Some(payloads.dynamic);
        self.static_data = Some(payloads.static_data);
        self.updated_at = Some(Utc::now());
    }
}

/// Fetch the war report of `map` and show it if `map` is still selected.
///
/// On failure the previous report stays.
pub async fn refresh_war_report(api: &FetchCache, state: &RwLock<MapState>, map: &str) {
    match api.fetch(&war_report_endpoint(map)).await {
        Ok(report) => {
            let mut state = state.write().await;
            if state.selected.as_deref() == Some(map) {
                state.war_report = Some(report);
            }
        }
        Err(e) => tracing::warn!("Error updating war report for {}: {}", map, e),
    }
}

/// Refresh the war state, the selected map and its war report.
///
/// Each part is all-or-nothing: on failure the previous data stays in place.
pub async fn refresh_map(api: &FetchCache, state: &RwLock<MapState>) {
    match api.fetch(WAR_ENDPOINT).await {
        Ok(war) => state.write().await.war = Some(war),
        Err(e) => tracing::warn!("Error updating war state: {}", e),
    }

    let selected = state.read().await.selected.clone();
    let map = match selected {
        Some(m) => m,
        None => return,
    };

    match fetch_map(api, &map).await {
        Ok(payloads) => {
            let mut state = state.write().await;
            // Selection may have moved on while the requests were in flight.
            if state.selected.as_deref() == Some(map.as_str()) {
                state.show(&map, payloads);
                tracing::debug!("Refreshed map data for {}", map);
            }
        }
        Err(e) => tracing::warn!("Error updating map data for {}: {}", map, e),
    }

    refresh_war_report(api, state, &map).await;
}
