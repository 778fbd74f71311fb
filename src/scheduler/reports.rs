//! War report fan-out: one snapshot per tick.

use crate::analysis::{count_structures, FactionControl};
use crate::api::{dynamic_map_endpoint, view, war_report_endpoint, FetchCache, MapData};
use crate::history::{ReportHistory, Snapshot};

use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::{RwLock, Semaphore};
use tokio::task::JoinSet;

/// Upper bound on concurrent map fetches within a tick.
const MAX_CONCURRENT_FETCHES: usize = 5;

/// Faction control per map, from the latest readable dynamic data.
pub type ControlBoard = BTreeMap<String, FactionControl>;

/// Everything gathered in one report tick.
#[derive(Debug, Default)]
pub struct ReportTick {
    pub snapshot: Snapshot,
    /// Maps whose dynamic data could be read this tick.
    pub control: ControlBoard,
}

/// Fetch the war report and dynamic data of every map.
///
/// Reports that arrive go into one snapshot; dynamic data yields faction
/// control. A failing map is logged and left out; it never aborts the others.
/// Dropping the returned future aborts all in-flight requests.
pub async fn collect_reports(api: &Arc<FetchCache>, maps: &[String]) -> ReportTick {
    let semaphore = Arc::new(Semaphore::new(MAX_CONCURRENT_FETCHES));
    let mut tasks = JoinSet::new();

    for map in maps {
        let api = api.clone();
        let map = map.clone();
        let semaphore = semaphore.clone();

        tasks.spawn(async move {
            let _permit = semaphore.acquire_owned().await.ok();
            let report = api.fetch(&war_report_endpoint(&map)).await;
            let dynamic = api.fetch(&dynamic_map_endpoint(&map)).await;
            (map, report, dynamic)
        });
    }

    let mut tick = ReportTick::default();
    let mut failed = 0usize;

    while let Some(joined) = tasks.join_next().await {
        let (map, report, dynamic) = match joined {
            Ok(result) => result,
            Err(e) => {
                failed += 1;
                tracing::error!("War report task failed: {}", e);
                continue;
            }
        };

        match dynamic {
            Ok(data) => match view::<MapData>(&data) {
                Some(data) => {
                    tick.control.insert(map.clone(), count_structures(&data).control());
                }
                None => tracing::debug!("No map items for {}", map),
            },
            Err(e) => tracing::warn!("Error fetching map data for {}: {}", map, e),
        }

        match report {
            Ok(report) if has_content(&report) => tick.snapshot.insert(map, report),
            Ok(_) => tracing::debug!("Empty war report for {}", map),
            Err(e) => {
                failed += 1;
                tracing::warn!("Error fetching war report for {}: {}", map, e);
            }
        }
    }

    if tick.snapshot.is_empty() && !maps.is_empty() {
        tracing::warn!("No war reports collected this tick");
    }

    tracing::info!(
        "Collected war reports for {}/{} maps ({} failed), control for {}",
        tick.snapshot.len(),
        maps.len(),
        failed,
        tick.control.len()
    );

    tick
}

/// Append a snapshot and write the history out, under one write lock.
///
/// Readers observe either the history before the tick or after it.
/// A failed write is logged; the in-memory history keeps the snapshot.
pub async fn commit_snapshot(history: &RwLock<ReportHistory>, snapshot: Snapshot) {
    let mut history = history.write().await;
    history.append(snapshot);

    match history.persist().await {
        Ok(()) => tracing::info!(
            "Stored {} reports in {}",
            history.len(),
            history.path().display()
        ),
        Err(e) => tracing::error!("Error saving war reports: {}", e),
    }
}

/// Merge this tick's control into the board. Maps missing from `control` keep
/// their previous value.
pub async fn commit_control(board: &RwLock<ControlBoard>, control: ControlBoard) {
    board.write().await.extend(control);
}

fn has_content(payload: &Value) -> bool {
    match payload {
        Value::Null => false,
        Value::Object(map) => !map.is_empty(),
        _ => true,
    }
}
