//! HTTP request handlers.

use super::AppState;
use crate::analysis::{casualty_rate, count_structures, ActivityTier, CasualtyRate, FactionControl, StructureCounts};
use crate::api::{view, MapData, WarReport, WarState};
use crate::history::ReportHistory;
use crate::scheduler::{MapState, SelectError};

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json},
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::SystemTime;
use tokio::io::AsyncReadExt;

// ============================================================================
// History file
// ============================================================================

/// Serve the persisted history verbatim, stamped with the file's mtime.
pub async fn handle_war_reports(State(state): State<AppState>) -> impl IntoResponse {
    let path = &state.config.reports_path;

    // Body and mtime come from one handle, so a concurrent rename cannot split them.
    let read = async {
        let mut file = tokio::fs::File::open(path).await?;
        let modified = file.metadata().await?.modified()?;
        let mut body = Vec::new();
        file.read_to_end(&mut body).await?;
        Ok::<_, std::io::Error>((body, modified))
    };

    match read.await {
        Ok((body, modified)) => (
            [
                (header::CONTENT_TYPE, "application/json".to_string()),
                (header::LAST_MODIFIED, http_date(modified)),
            ],
            body,
        )
            .into_response(),
        Err(e) => {
            tracing::error!("Error reading war reports: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                [(header::CONTENT_TYPE, "text/plain")],
                format!("Error reading war reports: {}", e),
            )
                .into_response()
        }
    }
}

/// Format a timestamp as an HTTP date, e.g. `Sun, 06 Nov 1994 08:49:37 GMT`.
pub fn http_date(t: SystemTime) -> String {
    DateTime::<Utc>::from(t)
        .format("%a, %d %b %Y %H:%M:%S GMT")
        .to_string()
}

// ============================================================================
// API: Activity
// ============================================================================

#[derive(Debug, Serialize)]
pub struct MapActivity {
    pub map: String,
    pub colonial_cph: u64,
    pub warden_cph: u64,
    pub total: u64,
    pub tier: ActivityTier,
    /// Unknown until a report tick has read the map's dynamic data.
    pub control: Option<FactionControl>,
}

#[derive(Debug, Serialize)]
pub struct ActivityResponse {
    pub snapshots: usize,
    /// Maps present in the most recent snapshot.
    pub maps_reporting: usize,
    pub maps: Vec<MapActivity>,
}

pub async fn handle_activity(State(state): State<AppState>) -> impl IntoResponse {
    let history = state.scheduler.history().read().await;
    let control = state.scheduler.control().read().await;

    let maps = state
        .scheduler
        .maps()
        .iter()
        .map(|map| {
            let rate = casualty_rate(&*history, map);
            MapActivity {
                map: map.clone(),
                colonial_cph: rate.colonial,
                warden_cph: rate.warden,
                total: rate.total(),
                tier: rate.tier(),
                control: control.get(map).copied(),
            }
        })
        .collect();

    Json(ActivityResponse {
        snapshots: history.len(),
        maps_reporting: history.latest().map_or(0, |s| s.len()),
        maps,
    })
}

// ============================================================================
// API: Selected map
// ============================================================================

#[derive(Debug, Default, Serialize)]
pub struct MapSummary {
    pub selected: Option<String>,
    pub region_id: Option<i64>,
    pub last_updated: Option<i64>,
    pub version: Option<i64>,
    pub total_items: usize,
    pub text_items: usize,
    pub structures: Option<StructureCounts>,
    pub control: Option<FactionControl>,
    pub war_report: Option<WarReport>,
    pub casualty_rate: Option<CasualtyRate>,
    pub activity: Option<ActivityTier>,
    pub war_number: Option<i64>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Summarize the selected map for consumers.
pub fn summarize(state: &MapState, history: &ReportHistory) -> MapSummary {
    let mut summary = MapSummary {
        selected: state.selected.clone(),
        updated_at: state.updated_at,
        war_number: state
            .war
            .as_ref()
            .and_then(view::<WarState>)
            .and_then(|w| w.war_number),
        ..Default::default()
    };

    if let Some(data) = state.dynamic.as_ref().and_then(view::<MapData>) {
        let counts = count_structures(&data);
        summary.region_id = data.region_id;
        summary.last_updated = data.last_updated;
        summary.version = data.version;
        summary.total_items = data.map_items.len();
        summary.structures = Some(counts);
        summary.control = Some(counts.control());
    }

    summary.text_items = state
        .static_data
        .as_ref()
        .and_then(|s| s.get("mapTextItems"))
        .and_then(|items| items.as_array())
        .map_or(0, Vec::len);

    summary.war_report = state.war_report.as_ref().and_then(view::<WarReport>);

    if let Some(map) = &state.selected {
        let rate = casualty_rate(history, map);
        summary.casualty_rate = Some(rate);
        summary.activity = Some(rate.tier());
    }

    summary
}

pub async fn handle_get_map(State(state): State<AppState>) -> impl IntoResponse {
    let map_state = state.scheduler.map_state().read().await;
    let history = state.scheduler.history().read().await;
    Json(summarize(&map_state, &history))
}

pub async fn handle_select_map(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> impl IntoResponse {
    match state.scheduler.select_map(&name).await {
        Ok(()) => {
            let map_state = state.scheduler.map_state().read().await;
            let history = state.scheduler.history().read().await;
            Json(summarize(&map_state, &history)).into_response()
        }
        Err(e @ SelectError::UnknownMap(_)) => (StatusCode::NOT_FOUND, e.to_string()).into_response(),
        Err(e @ SelectError::Fetch(_)) => {
            tracing::warn!("Error selecting map {}: {}", name, e);
            (StatusCode::BAD_GATEWAY, e.to_string()).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::FetchCache;
    use crate::config::Config;
    use crate::history::Snapshot;
    use crate::scheduler::Scheduler;
    use crate::testutil::{Canned, FakeApi};
    use axum::body::to_bytes;
    use axum::response::Response;
    use serde_json::json;
    use std::path::Path as FsPath;
    use std::sync::Arc;
    use std::time::Duration;
    use tempfile::TempDir;

    fn app_state(base_url: &str, reports_path: &FsPath, maps: &[&str]) -> AppState {
        let config = Config {
            api_base: base_url.to_string(),
            reports_path: reports_path.to_path_buf(),
            ..Default::default()
        };
        let cache = Arc::new(FetchCache::new(base_url, Duration::from_secs(5)).unwrap());
        let history = ReportHistory::new(reports_path, config.history_len);
        let scheduler = Scheduler::new(
            cache,
            history,
            maps.iter().map(|m| m.to_string()).collect(),
            config.map_interval,
            config.report_interval,
        );
        AppState {
            config,
            scheduler: Arc::new(scheduler),
        }
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn snap(map: &str, colonial: i64, warden: i64) -> Snapshot {
        [(map, json!({"colonialCasualties": colonial, "wardenCasualties": warden}))]
            .into_iter()
            .collect()
    }

    #[test]
    fn test_http_date() {
        let t = SystemTime::UNIX_EPOCH + Duration::from_secs(784111777);
        assert_eq!(http_date(t), "Sun, 06 Nov 1994 08:49:37 GMT");
    }

    #[tokio::test]
    async fn test_serves_history_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("war_reports.json");
        let state = app_state("http://127.0.0.1:1", &path, &["Origin"]);

        {
            let mut history = state.scheduler.history().write().await;
            history.append(snap("Origin", 1, 2));
            history.persist().await.unwrap();
        }

        let response = handle_war_reports(State(state)).await.into_response();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");
        let mtime = std::fs::metadata(&path).unwrap().modified().unwrap();
        assert_eq!(response.headers()[header::LAST_MODIFIED], http_date(mtime).as_str());

        assert_eq!(
            body_json(response).await,
            json!({"reports": [{"Origin": {"colonialCasualties": 1, "wardenCasualties": 2}}]})
        );
    }

    #[tokio::test]
    async fn test_missing_history_file_is_500() {
        let dir = TempDir::new().unwrap();
        let state = app_state("http://127.0.0.1:1", &dir.path().join("absent.json"), &["Origin"]);

        let response = handle_war_reports(State(state)).await.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "text/plain");

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(String::from_utf8_lossy(&bytes).starts_with("Error reading war reports:"));
    }

    #[tokio::test]
    async fn test_activity() {
        let dir = TempDir::new().unwrap();
        let state = app_state(
            "http://127.0.0.1:1",
            &dir.path().join("war_reports.json"),
            &["Origin", "Westgate"],
        );

        {
            let mut history = state.scheduler.history().write().await;
            history.append(snap("Origin", 100, 100));
            history.append(snap("Origin", 700, 200));
        }
        state
            .scheduler
            .control()
            .write()
            .await
            .insert("Westgate".to_string(), FactionControl::Wardens);

        let body = body_json(handle_activity(State(state)).await.into_response()).await;
        assert_eq!(body["snapshots"], json!(2));
        assert_eq!(body["maps_reporting"], json!(1));
        assert_eq!(
            body["maps"][0],
            json!({
                "map": "Origin",
                "colonial_cph": 600,
                "warden_cph": 100,
                "total": 700,
                "tier": "medium",
                "control": null
            })
        );
        assert_eq!(body["maps"][1]["tier"], json!("none"));
        assert_eq!(body["maps"][1]["control"], json!("wardens"));
    }

    #[tokio::test]
    async fn test_select_and_summarize() {
        let api = FakeApi::start().await;
        api.set(
            "maps/OriginHex/dynamic/public",
            Canned::json(
                json!({
                    "regionId": 5,
                    "version": 12,
                    "lastUpdated": 1700000000000i64,
                    "mapItems": [
                        {"teamId": "COLONIALS", "iconType": 56, "x": 0.1, "y": 0.2, "flags": 0},
                        {"teamId": "COLONIALS", "iconType": 45, "x": 0.3, "y": 0.4, "flags": 0},
                        {"teamId": "WARDENS", "iconType": 56, "x": 0.5, "y": 0.6, "flags": 0}
                    ]
                }),
                Some("\"d\""),
            ),
        );
        api.set(
            "maps/OriginHex/static",
            Canned::json(
                json!({"mapTextItems": [{"text": "Tine", "x": 0.4, "y": 0.6, "mapMarkerType": "Major"}]}),
                None,
            ),
        );
        api.set(
            "warReport/OriginHex",
            Canned::json(json!({"colonialCasualties": 50, "wardenCasualties": 60, "dayOfWar": 4}), None),
        );

        let dir = TempDir::new().unwrap();
        let state = app_state(&api.base_url, &dir.path().join("war_reports.json"), &["Origin"]);

        let response = handle_select_map(State(state.clone()), Path("Origin".to_string()))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(handle_get_map(State(state)).await.into_response()).await;
        assert_eq!(body["selected"], json!("Origin"));
        assert_eq!(body["region_id"], json!(5));
        assert_eq!(body["total_items"], json!(3));
        assert_eq!(body["text_items"], json!(1));
        assert_eq!(body["structures"], json!({"wardens": 1, "colonials": 2}));
        assert_eq!(body["control"], json!("colonials"));
        assert_eq!(body["war_report"]["dayOfWar"], json!(4));
        assert_eq!(body["activity"], json!("none"));
    }

    #[tokio::test]
    async fn test_select_errors() {
        let api = FakeApi::start().await;
        let dir = TempDir::new().unwrap();
        let state = app_state(&api.base_url, &dir.path().join("war_reports.json"), &["Origin"]);

        let response = handle_select_map(State(state.clone()), Path("Atlantis".to_string()))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        // No routes configured: the fake upstream answers 404.
        let response = handle_select_map(State(state), Path("Origin".to_string()))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_summarize_empty_state() {
        let summary = summarize(&MapState::default(), &ReportHistory::new("unused.json", 12));
        assert!(summary.selected.is_none());
        assert!(summary.control.is_none());
        assert!(summary.casualty_rate.is_none());
        assert_eq!(summary.total_items, 0);
    }
}
