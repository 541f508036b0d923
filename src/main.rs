//! Broadcast Recommender — Binary Entrypoint
//! Loads config, populates the catalog once, starts the refresh scheduler,
//! and hands the Axum router to the Shuttle runtime.

use broadcast_recommender::{telemetry, App, AppConfig};
use shuttle_axum::ShuttleAxum;

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();

    let cfg = AppConfig::from_env();
    telemetry::init_tracing(cfg.log_format);
    tracing::info!(
        interval_secs = cfg.refresh_interval.as_secs(),
        timeout_secs = cfg.fetch_timeout.as_secs(),
        concurrency = cfg.refresh_concurrency,
        "starting broadcast recommender"
    );

    let app = broadcast_recommender::app(cfg).await?;
    App::shutdown_on_ctrl_c(app.shutdown);

    Ok(app.router.into())
}
