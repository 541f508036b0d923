// tests/api_http.rs
//
// HTTP-level tests for the public API Router without opening sockets.
// We exercise the router directly via tower::ServiceExt::oneshot.
//
// Covered:
// - GET /health
// - POST /recommend (ordering, filtering, client errors)
// - GET /catalog, GET /catalog/status

use axum::{
    body::{self, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::json;
use serde_json::Value as Json;
use tower::ServiceExt as _; // for `oneshot`

use broadcast_recommender::api::{self, AppState};
use broadcast_recommender::catalog::CatalogStore;
use broadcast_recommender::ingest::types::{ProgramRecord, RefreshReport, SourceId};

const BODY_LIMIT: usize = 1024 * 1024; // 1MB, safe for tests

fn seeded_store() -> CatalogStore {
    let store = CatalogStore::new();
    store.publish(
        vec![
            ProgramRecord::new(SourceId::Cbs, "새벽 기도", ["#기도"]),
            ProgramRecord::new(SourceId::Cts, "기도와 찬양", ["#기도", "#찬양"]),
            ProgramRecord::new(SourceId::GoodTv, "찬양의 밤", ["#찬양"]),
            ProgramRecord::new(SourceId::CChannel, "성지가 좋다", ["#기타"]),
        ],
        RefreshReport::default(),
    );
    store
}

/// Build the same Router the binary uses, over a fixed catalog.
fn test_router() -> Router {
    api::router(AppState::new(seeded_store()))
}

async fn post_json(app: Router, uri: &str, payload: String) -> (StatusCode, Json) {
    let req = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(payload))
        .expect("build POST");
    let resp = app.oneshot(req).await.expect("oneshot POST");
    let status = resp.status();
    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT)
        .await
        .expect("read body")
        .to_vec();
    let v = serde_json::from_slice(&bytes).unwrap_or(Json::Null);
    (status, v)
}

async fn get_json(app: Router, uri: &str) -> (StatusCode, Json) {
    let req = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .expect("build GET");
    let resp = app.oneshot(req).await.expect("oneshot GET");
    let status = resp.status();
    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT)
        .await
        .expect("read body")
        .to_vec();
    (status, serde_json::from_slice(&bytes).expect("json body"))
}

#[tokio::test]
async fn api_health_returns_200_and_ok_body() {
    let req = Request::builder()
        .method("GET")
        .uri("/health")
        .body(Body::empty())
        .expect("build GET /health");

    let resp = test_router().oneshot(req).await.expect("oneshot /health");
    assert_eq!(resp.status(), StatusCode::OK, "health should be 200");

    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT)
        .await
        .expect("read body")
        .to_vec();
    assert_eq!(String::from_utf8(bytes).expect("utf8"), "OK");
}

#[tokio::test]
async fn recommend_orders_by_overlap_then_catalog_order() {
    let (status, v) = post_json(
        test_router(),
        "/recommend",
        json!({ "tags": ["#기도", "#찬양"] }).to_string(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let arr = v.as_array().expect("array");
    let titles: Vec<&str> = arr.iter().map(|o| o["title"].as_str().unwrap()).collect();
    assert_eq!(titles, vec!["기도와 찬양", "새벽 기도", "찬양의 밤"]);

    // contract for UI consumers
    assert_eq!(arr[0]["source"], "CTS");
    assert_eq!(arr[0]["tags"], json!(["#기도", "#찬양"]));
}

#[tokio::test]
async fn recommend_with_no_match_is_empty_success() {
    let (status, v) = post_json(
        test_router(),
        "/recommend",
        json!({ "tags": ["#없는태그"] }).to_string(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v, json!([]));
}

#[tokio::test]
async fn recommend_rejects_missing_or_empty_tags() {
    for payload in [
        json!({}),
        json!({ "tags": [] }),
        json!({ "tags": null }),
        json!({ "tags": ["   "] }),
    ] {
        let (status, v) = post_json(test_router(), "/recommend", payload.to_string()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "payload {payload}");
        assert_eq!(v["error"], "태그가 전송되지 않았습니다.");
    }
}

#[tokio::test]
async fn recommend_rejects_malformed_body_with_json_error() {
    for payload in [
        "{not json".to_string(),
        json!({ "tags": "#기도" }).to_string(),
        json!({ "tags": [1] }).to_string(),
    ] {
        let (status, v) = post_json(test_router(), "/recommend", payload.clone()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "payload {payload}");
        let msg = v["error"].as_str().expect("json error body");
        assert!(msg.starts_with("잘못된 요청 본문입니다"), "got {msg}");
    }
}

#[tokio::test]
async fn recommend_on_empty_catalog_is_empty() {
    let app = api::router(AppState::new(CatalogStore::new()));
    let (status, v) = post_json(app, "/recommend", json!({ "tags": ["#기도"] }).to_string()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v, json!([]));
}

#[tokio::test]
async fn recommend_sees_the_latest_published_snapshot() {
    let store = seeded_store();
    let app = api::router(AppState::new(store.clone()));

    store.publish(
        vec![ProgramRecord::new(SourceId::Cgntv, "생명의 삶", ["#말씀묵상"])],
        RefreshReport::default(),
    );

    let (_, v) = post_json(app, "/recommend", json!({ "tags": ["#말씀묵상", "#기도"] }).to_string()).await;
    let titles: Vec<&str> = v
        .as_array()
        .unwrap()
        .iter()
        .map(|o| o["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["생명의 삶"]);
}

#[tokio::test]
async fn catalog_routes_expose_snapshot_and_status() {
    let (status, v) = get_json(test_router(), "/catalog").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["version"], 1);
    assert!(v["refreshed_at"].is_string());
    assert_eq!(v["programs"].as_array().unwrap().len(), 4);

    let (status, v) = get_json(test_router(), "/catalog/status").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["total"], 4);
    assert_eq!(v["sources"], json!([]));
}
