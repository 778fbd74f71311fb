//! warwatch - War API poller
//!
//! Polls the world conquest War API with ETag revalidation, keeps a bounded
//! history of war reports, and serves it together with casualty rates.

mod analysis;
mod api;
mod config;
mod history;
mod scheduler;
mod web;

#[cfg(test)]
mod testutil;

use api::FetchCache;
use config::Config;
use history::ReportHistory;
use scheduler::Scheduler;
use web::Server;

use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env()
            .add_directive("warwatch=info".parse()?))
        .init();

    // Load configuration
    let cfg = Config::load();
    tracing::info!("Starting warwatch on port {}...", cfg.http_port);
    tracing::info!("Polling {}", cfg.api_base);

    let api = Arc::new(FetchCache::new(&cfg.api_base, cfg.request_timeout)?);
    let history = ReportHistory::load(&cfg.reports_path, cfg.history_len);
    tracing::info!(
        "Keeping up to {} reports in {}",
        history.bound(),
        history.path().display()
    );
    if history.is_empty() {
        tracing::info!("No report history yet; casualty rates need two report ticks");
    }

    let scheduler = Arc::new(Scheduler::new(
        api,
        history,
        api::catalog(),
        cfg.map_interval,
        cfg.report_interval,
    ));

    if let Some(map) = &cfg.initial_map {
        if let Err(e) = scheduler.select_map(map).await {
            tracing::warn!("Could not select {}: {}", map, e);
        }
    }

    scheduler.start().await;

    let server = Server::new(cfg, scheduler.clone());
    tokio::select! {
        result = server.start() => {
            if let Err(e) = result {
                tracing::error!("Web server failed: {}", e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown requested");
        }
    }

    scheduler.stop().await;

    Ok(())
}
