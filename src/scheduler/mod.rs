//! Scheduler driving the two polling cadences.

mod map;
mod reports;

pub use map::*;
pub use reports::*;

use crate::api::{canonical_map_name, ApiError, FetchCache};
use crate::history::ReportHistory;

use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{broadcast, Mutex, RwLock};
use tokio::task::JoinHandle;

/// Map selection error types.
#[derive(Error, Debug)]
pub enum SelectError {
    #[error("unknown map: {0}")]
    UnknownMap(String),
    #[error(transparent)]
    Fetch(#[from] ApiError),
}

/// Owns the fetch cache, the report history and the selected map, and runs
/// the report fan-out and the selected map refresh on independent timers.
pub struct Scheduler {
    api: Arc<FetchCache>,
    history: Arc<RwLock<ReportHistory>>,
    map_state: Arc<RwLock<MapState>>,
    control: Arc<RwLock<ControlBoard>>,
    maps: Arc<Vec<String>>,
    map_interval: Duration,
    report_interval: Duration,
    stop_tx: broadcast::Sender<()>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl Scheduler {
    /// Create a scheduler polling reports for `maps`.
    pub fn new(
        api: Arc<FetchCache>,
        history: ReportHistory,
        maps: Vec<String>,
        map_interval: Duration,
        report_interval: Duration,
    ) -> Self {
        let (stop_tx, _) = broadcast::channel(1);

        Self {
            api,
            history: Arc::new(RwLock::new(history)),
            map_state: Arc::new(RwLock::new(MapState::default())),
            control: Arc::new(RwLock::new(ControlBoard::new())),
            maps: Arc::new(maps),
            map_interval,
            report_interval,
            stop_tx,
            tasks: Mutex::new(Vec::new()),
        }
    }

    /// Start both polling loops. Calling it again while running is a no-op.
    pub async fn start(&self) {
        let mut tasks = self.tasks.lock().await;
        if !tasks.is_empty() {
            return;
        }

        tracing::info!(
            "Starting scheduler: {} maps, reports every {:?}, map data every {:?}",
            self.maps.len(),
            self.report_interval,
            self.map_interval
        );

        tasks.push(tokio::spawn(run_report_loop(
            self.api.clone(),
            self.maps.clone(),
            self.history.clone(),
            self.control.clone(),
            self.report_interval,
            self.stop_tx.subscribe(),
        )));

        tasks.push(tokio::spawn(run_map_loop(
            self.api.clone(),
            self.map_state.clone(),
            self.map_interval,
            self.stop_tx.subscribe(),
        )));
    }

    /// Stop both loops and wait for them to exit.
    ///
    /// In-flight requests are abandoned; a snapshot already gathered is
    /// committed before its loop exits.
    pub async fn stop(&self) {
        let mut tasks = self.tasks.lock().await;
        let _ = self.stop_tx.send(());

        for task in tasks.drain(..) {
            if let Err(e) = task.await {
                tracing::error!("Scheduler task ended abnormally: {}", e);
            }
        }

        tracing::info!("Scheduler stopped");
    }

    /// Select a map and fetch its data right away.
    ///
    /// If the map data cannot be fetched the current selection and data are
    /// left untouched. A failed war report only leaves the report empty.
    pub async fn select_map(&self, name: &str) -> Result<(), SelectError> {
        let canonical = canonical_map_name(name);
        let map = self
            .maps
            .iter()
            .find(|m| m.as_str() == canonical)
            .ok_or_else(|| SelectError::UnknownMap(name.to_string()))?;

        let payloads = fetch_map(&self.api, map).await?;
        self.map_state.write().await.show(map, payloads);
        refresh_war_report(&self.api, &self.map_state, map).await;

        tracing::info!("Selected map {}", map);
        Ok(())
    }

    pub fn history(&self) -> &Arc<RwLock<ReportHistory>> {
        &self.history
    }

    pub fn map_state(&self) -> &Arc<RwLock<MapState>> {
        &self.map_state
    }

    /// Faction control of every map seen so far.
    pub fn control(&self) -> &Arc<RwLock<ControlBoard>> {
        &self.control
    }

    pub fn maps(&self) -> &[String] {
        &self.maps
    }
}

/// Run the war report loop: one snapshot per tick.
async fn run_report_loop(
    api: Arc<FetchCache>,
    maps: Arc<Vec<String>>,
    history: Arc<RwLock<ReportHistory>>,
    control: Arc<RwLock<ControlBoard>>,
    period: Duration,
    mut stop_rx: broadcast::Receiver<()>,
) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = stop_rx.recv() => break,
            _ = interval.tick() => {
                let tick = tokio::select! {
                    _ = stop_rx.recv() => break,
                    tick = collect_reports(&api, &maps) => tick,
                };
                commit_snapshot(&history, tick.snapshot).await;
                commit_control(&control, tick.control).await;
            }
        }
    }
}

/// Run the selected map loop.
async fn run_map_loop(
    api: Arc<FetchCache>,
    state: Arc<RwLock<MapState>>,
    period: Duration,
    mut stop_rx: broadcast::Receiver<()>,
) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = stop_rx.recv() => break,
            _ = interval.tick() => {
                tokio::select! {
                    _ = stop_rx.recv() => break,
                    _ = refresh_map(&api, &state) => {}
                }
            }
        }
    }
}
