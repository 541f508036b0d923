use axum::{
    extract::{rejection::JsonRejection, State},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use metrics::counter;
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::CorsLayer;

use crate::catalog::CatalogStore;
use crate::error::InvalidRequest;
use crate::ingest::types::{ProgramRecord, SourceOutcome};
use crate::recommend::recommend;
use crate::telemetry::Metrics;

#[derive(Clone)]
pub struct AppState {
    pub store: CatalogStore,
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    pub fn new(store: CatalogStore) -> Self {
        Self {
            store,
            metrics: None,
        }
    }
}

pub fn router(state: AppState) -> Router {
    let mut app = Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/recommend", post(recommend_programs))
        .route("/catalog", get(catalog))
        .route("/catalog/status", get(catalog_status));

    if let Some(handle) = state.metrics.clone() {
        app = app.merge(Metrics::router(handle));
    }

    app.layer(CorsLayer::very_permissive()).with_state(state)
}

#[derive(Debug, serde::Deserialize)]
pub struct RecommendReq {
    #[serde(default)]
    pub tags: Option<Vec<String>>,
}

async fn recommend_programs(
    State(state): State<AppState>,
    body: Result<Json<RecommendReq>, JsonRejection>,
) -> Result<Response, InvalidRequest> {
    let Json(body) = body.inspect_err(|rejection| {
        counter!("recommend_invalid_total").increment(1);
        tracing::debug!(error = %rejection, "malformed recommend body");
    })?;
    let tags: Vec<String> = body
        .tags
        .unwrap_or_default()
        .into_iter()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect();
    if tags.is_empty() {
        counter!("recommend_invalid_total").increment(1);
        return Err(InvalidRequest::MissingTags);
    }
    counter!("recommend_requests_total").increment(1);

    // One snapshot for the whole request, even if a refresh publishes meanwhile.
    let snapshot = state.store.snapshot();
    let results = recommend(&tags, snapshot.programs());
    tracing::info!(
        tags = ?tags,
        version = snapshot.version(),
        results = results.len(),
        "recommendation served"
    );
    Ok(Json(results).into_response())
}

#[derive(serde::Serialize)]
struct CatalogOut<'a> {
    version: u64,
    refreshed_at: Option<DateTime<Utc>>,
    programs: &'a [ProgramRecord],
}

async fn catalog(State(state): State<AppState>) -> Response {
    let snapshot = state.store.snapshot();
    Json(CatalogOut {
        version: snapshot.version(),
        refreshed_at: snapshot.refreshed_at(),
        programs: snapshot.programs(),
    })
    .into_response()
}

#[derive(serde::Serialize)]
struct StatusOut<'a> {
    version: u64,
    refreshed_at: Option<DateTime<Utc>>,
    total: usize,
    duration_ms: u64,
    sources: &'a [SourceOutcome],
}

async fn catalog_status(State(state): State<AppState>) -> Response {
    let snapshot = state.store.snapshot();
    let report = snapshot.report();
    Json(StatusOut {
        version: snapshot.version(),
        refreshed_at: snapshot.refreshed_at(),
        total: snapshot.len(),
        duration_ms: report.duration_ms,
        sources: &report.sources,
    })
    .into_response()
}
