// src/ingest/mod.rs
//! Catalog refresh pipeline: fetch every source listing, extract and tag
//! titles, then publish the concatenation as one new catalog snapshot.

pub mod config;
pub mod extract;
pub mod fetch;
pub mod scheduler;
pub mod sources;
pub mod types;

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use once_cell::sync::OnceCell;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::catalog::{Catalog, CatalogStore};
use crate::error::FetchError;
use crate::ingest::extract::SourceExtractor;
use crate::ingest::sources::SourceSpec;
use crate::ingest::types::{DocumentFetcher, ProgramRecord, RefreshReport, SourceOutcome};
use crate::tags::TagRules;

/// One-time metrics registration (so series show up on /metrics).
pub(crate) fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("refresh_runs_total", "Completed catalog refresh cycles.");
        describe_counter!(
            "refresh_scheduled_runs_total",
            "Refresh cycles started by the periodic scheduler."
        );
        describe_counter!(
            "refresh_source_errors_total",
            "Source fetch/extraction failures, by source."
        );
        describe_counter!(
            "refresh_placeholder_total",
            "Placeholder records substituted, by source."
        );
        describe_counter!(
            "refresh_records_total",
            "Records published across all refreshes."
        );
        describe_histogram!("refresh_duration_ms", "Refresh cycle time in milliseconds.");
        describe_gauge!("catalog_version", "Version of the published catalog.");
        describe_gauge!(
            "catalog_last_refresh_ts",
            "Unix ts when the catalog was last published."
        );
        describe_counter!("recommend_requests_total", "Accepted /recommend requests.");
        describe_counter!("recommend_invalid_total", "Rejected /recommend requests.");
    });
}

/// Collapse whitespace runs (including NBSP) and trim.
pub fn normalize_text(s: &str) -> String {
    static RE_WS: OnceCell<regex::Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| regex::Regex::new(r"\s+").expect("whitespace regex"));
    re_ws.replace_all(s, " ").trim().to_string()
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RefreshLimits {
    /// Deadline for one listing fetch; exceeding it is a `FetchError::Timeout`.
    pub fetch_timeout: Duration,
    /// Max listing fetches in flight.
    pub concurrency: usize,
}

impl Default for RefreshLimits {
    fn default() -> Self {
        Self {
            fetch_timeout: Duration::from_secs(crate::config::DEFAULT_FETCH_TIMEOUT_SECS),
            concurrency: crate::config::DEFAULT_REFRESH_CONCURRENCY,
        }
    }
}

/// Everything a refresh needs. Cheap to clone.
#[derive(Clone)]
pub struct RefreshContext {
    pub fetcher: Arc<dyn DocumentFetcher>,
    pub sources: Arc<Vec<SourceSpec>>,
    pub rules: Arc<TagRules>,
    pub store: CatalogStore,
    pub limits: RefreshLimits,
}

impl RefreshContext {
    pub fn new(
        fetcher: Arc<dyn DocumentFetcher>,
        sources: Vec<SourceSpec>,
        rules: TagRules,
        store: CatalogStore,
        limits: RefreshLimits,
    ) -> Self {
        Self {
            fetcher,
            sources: Arc::new(sources),
            rules: Arc::new(rules),
            store,
            limits,
        }
    }
}

/// Fetch one URL under a deadline.
pub async fn fetch_with_timeout(
    fetcher: &dyn DocumentFetcher,
    url: &str,
    deadline: Duration,
) -> Result<String, FetchError> {
    match tokio::time::timeout(deadline, fetcher.fetch(url)).await {
        Ok(res) => res,
        Err(_) => Err(FetchError::Timeout {
            url: url.to_string(),
            timeout_ms: u64::try_from(deadline.as_millis()).unwrap_or(u64::MAX),
        }),
    }
}

/// Fetch all listings with bounded concurrency. Results come back in
/// `sources` order regardless of completion order. Dropping the returned
/// future aborts fetches still in flight.
pub async fn fetch_all(
    fetcher: &Arc<dyn DocumentFetcher>,
    sources: &[SourceSpec],
    limits: RefreshLimits,
) -> Vec<Result<String, FetchError>> {
    let permits = Arc::new(Semaphore::new(limits.concurrency.max(1)));
    let mut set = JoinSet::new();

    for (idx, spec) in sources.iter().enumerate() {
        let fetcher = Arc::clone(fetcher);
        let permits = Arc::clone(&permits);
        let url = spec.url.clone();
        let deadline = limits.fetch_timeout;
        set.spawn(async move {
            let _permit = permits.acquire_owned().await.ok();
            (idx, fetch_with_timeout(fetcher.as_ref(), &url, deadline).await)
        });
    }

    let mut slots: Vec<Option<Result<String, FetchError>>> = vec![None; sources.len()];
    while let Some(joined) = set.join_next().await {
        match joined {
            Ok((idx, res)) => slots[idx] = Some(res),
            Err(e) => tracing::error!(error = %e, "fetch task failed"),
        }
    }

    slots
        .into_iter()
        .zip(sources)
        .map(|(slot, spec)| {
            slot.unwrap_or_else(|| {
                Err(FetchError::Transport {
                    url: spec.url.clone(),
                    reason: "fetch task did not complete".to_string(),
                })
            })
        })
        .collect()
}

/// Fetch + extract every source. Never fails; each source contributes at
/// least its placeholder.
pub async fn harvest_all(ctx: &RefreshContext) -> (Vec<ProgramRecord>, RefreshReport) {
    let t0 = Instant::now();
    let fetched = fetch_all(&ctx.fetcher, &ctx.sources, ctx.limits).await;

    let mut records = Vec::new();
    let mut outcomes = Vec::with_capacity(ctx.sources.len());
    for (spec, body) in ctx.sources.iter().zip(fetched) {
        let harvest = SourceExtractor::new(spec, &ctx.rules).harvest(body);
        if harvest.is_placeholder() {
            counter!("refresh_source_errors_total", "source" => spec.source.key()).increment(1);
            counter!("refresh_placeholder_total", "source" => spec.source.key()).increment(1);
        }
        outcomes.push(SourceOutcome {
            source: spec.source,
            records: harvest.records.len(),
            placeholder: harvest.is_placeholder(),
            error: harvest.failure.as_ref().map(ToString::to_string),
        });
        records.extend(harvest.records);
    }

    let report = RefreshReport {
        sources: outcomes,
        duration_ms: u64::try_from(t0.elapsed().as_millis()).unwrap_or(u64::MAX),
    };
    (records, report)
}

/// Run one refresh cycle and publish the result atomically.
pub async fn refresh(ctx: &RefreshContext) -> Arc<Catalog> {
    ensure_metrics_described();
    tracing::info!(
        target: "ingest",
        sources = ctx.sources.len(),
        fetcher = ctx.fetcher.name(),
        "catalog refresh starting"
    );

    let (records, report) = harvest_all(ctx).await;
    let placeholders = report.placeholder_count();
    let duration_ms = report.duration_ms;
    let catalog = ctx.store.publish(records, report);

    counter!("refresh_runs_total").increment(1);
    counter!("refresh_records_total").increment(catalog.len() as u64);
    histogram!("refresh_duration_ms").record(duration_ms as f64);
    gauge!("catalog_version").set(catalog.version() as f64);
    if let Some(ts) = catalog.refreshed_at() {
        gauge!("catalog_last_refresh_ts").set(ts.timestamp() as f64);
    }

    tracing::info!(
        target: "ingest",
        version = catalog.version(),
        programs = catalog.len(),
        placeholders,
        duration_ms,
        "catalog refresh published"
    );
    catalog
}
