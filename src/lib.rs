// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod api;
pub mod catalog;
pub mod config;
pub mod error;
pub mod ingest;
pub mod recommend;
pub mod tags;
pub mod telemetry;

use anyhow::Context;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;

// ---- Re-exports for stable public API ----
pub use crate::api::router;
pub use crate::catalog::{Catalog, CatalogStore};
pub use crate::config::AppConfig;
pub use crate::ingest::types::{ProgramRecord, SourceId};

/// A fully wired service: router over a populated catalog, plus the running
/// refresh scheduler and its shutdown switch.
pub struct App {
    pub router: axum::Router,
    pub context: ingest::RefreshContext,
    pub scheduler: JoinHandle<()>,
    pub shutdown: watch::Sender<bool>,
}

impl App {
    /// Flip the shutdown switch on Ctrl-C. Consumes the sender so the
    /// scheduler lives until then.
    pub fn shutdown_on_ctrl_c(shutdown: watch::Sender<bool>) {
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::warn!(error = %e, "cannot listen for ctrl-c; scheduler runs until exit");
                // keep the sender alive so the scheduler is not stopped by the drop
                std::future::pending::<()>().await;
            }
            let _ = shutdown.send(true);
        });
    }
}

/// Load rule/source config, run the eager first refresh, start the scheduler,
/// and build the router. The catalog is populated before this returns.
pub async fn app(cfg: AppConfig) -> anyhow::Result<App> {
    // Recorder first, so descriptions and the eager refresh land in it.
    let metrics = telemetry::Metrics::init().map(|m| m.handle);
    ingest::ensure_metrics_described();

    let rules = tags::TagRules::load_default().context("loading tag rules")?;
    let sources = ingest::config::load_sources_default().context("loading source table")?;
    let fetcher = ingest::fetch::HttpFetcher::new(&cfg.user_agent).context("building http client")?;

    let store = CatalogStore::new();
    let context = ingest::RefreshContext::new(
        Arc::new(fetcher),
        sources,
        rules,
        store.clone(),
        cfg.limits(),
    );

    let first = ingest::refresh(&context).await;
    tracing::info!(
        version = first.version(),
        programs = first.len(),
        "initial catalog ready"
    );

    let (shutdown, shutdown_rx) = watch::channel(false);
    let scheduler =
        ingest::scheduler::spawn_refresh_scheduler(context.clone(), cfg.refresh_interval, shutdown_rx);

    let mut state = api::AppState::new(store);
    state.metrics = metrics;

    Ok(App {
        router: api::router(state),
        context,
        scheduler,
        shutdown,
    })
}
