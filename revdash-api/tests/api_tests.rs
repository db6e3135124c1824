//! Integration tests for revdash-api endpoints
//!
//! Tests cover:
//! - Health endpoint
//! - Dashboard view: source fallback, filters, sorting, stats over the whole collection
//! - Approval action and the approved-only public view (both store backends)
//! - Hostaway and Google Places clients against local mock servers

use axum::{
    body::Body,
    extract::Query,
    http::{header, HeaderMap, Request, StatusCode},
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;
use tower::util::ServiceExt; // for `oneshot` method

use revdash_api::{build_router, AppState};
use revdash_common::approval::{ApprovalStore, JsonFileApprovalStore, SqliteApprovalStore};
use revdash_common::config::TomlConfig;

/// Test helper: copy the bundled dataset into a temp dir
fn setup_dataset() -> (TempDir, PathBuf) {
    let bundled = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("public")
        .join("mock_reviews.json");
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("mock_reviews.json");
    std::fs::copy(&bundled, &path).expect("bundled dataset should exist");
    (dir, path)
}

fn test_config(dataset: &Path) -> TomlConfig {
    let mut config = TomlConfig::default();
    config.dataset.path = dataset.to_path_buf();
    config
}

/// Test helper: app over the dataset file with the JSON-file approval store
fn setup_app(config: TomlConfig) -> Router {
    let store: Arc<dyn ApprovalStore> =
        Arc::new(JsonFileApprovalStore::new(config.dataset.path.clone()));
    build_router(AppState::new(config, store))
}

fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Test helper: Extract JSON body from response
async fn extract_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("Should read body");
    serde_json::from_slice(&bytes).expect("Should parse JSON")
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    (status, extract_json(response.into_body()).await)
}

fn ids(body: &Value) -> Vec<Value> {
    body["data"]
        .as_array()
        .expect("data should be an array")
        .iter()
        .map(|r| r["id"].clone())
        .collect()
}

/// Test helper: serve `router` on an ephemeral local port
async fn spawn_mock(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

// =============================================================================
// Health
// =============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let (_dir, path) = setup_dataset();
    let app = setup_app(test_config(&path));

    let (status, body) = send(&app, get_request("/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "revdash-api");
    assert!(body["version"].is_string());
    assert!(body["uptime_seconds"].as_i64().unwrap() >= 0);
}

// =============================================================================
// Dashboard view
// =============================================================================

#[tokio::test]
async fn test_reviews_from_fallback_dataset() {
    let (_dir, path) = setup_dataset();
    let app = setup_app(test_config(&path));

    let (status, body) = send(&app, get_request("/api/reviews/hostaway")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");
    assert_eq!(body["source"], "mock-data");
    assert_eq!(body["data"].as_array().unwrap().len(), 6);
    assert_eq!(body["stats"]["total"], 6);
    assert_eq!(body["stats"]["averageRating"], 8.17);
    assert_eq!(body["stats"]["approved"], 2);
    assert!(body["stats"]["recurringIssues"].is_object());
    assert!(body["timestamp"].is_string());

    // Default order: newest first
    assert_eq!(ids(&body)[0], json!(7458));
    assert_eq!(body["data"][0]["channel"], "Hostaway");
    assert_eq!(body["data"][0]["guestName"], "Anonymous");
}

#[tokio::test]
async fn test_reviews_filtered_view_keeps_full_stats() {
    let (_dir, path) = setup_dataset();
    let app = setup_app(test_config(&path));

    let (status, body) = send(
        &app,
        get_request("/api/reviews/hostaway?rating=7&category=cleanliness&sort=rating-desc"),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&body), vec![json!(7453), json!(7454), json!(7457), json!(7458)]);
    assert_eq!(body["stats"]["total"], 6);
    assert_eq!(
        body["facets"]["channels"],
        json!(["Airbnb", "Booking.com", "Hostaway"])
    );
}

#[tokio::test]
async fn test_reviews_split_sort_and_empty_params() {
    let (_dir, path) = setup_dataset();
    let app = setup_app(test_config(&path));

    let (status, body) = send(
        &app,
        get_request("/api/reviews/hostaway?channel=&property=&sortBy=submittedAt&order=asc"),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let order = ids(&body);
    assert_eq!(order.len(), 6);
    assert_eq!(order[0], json!(7453));
    assert_eq!(order[5], json!(7458));
}

#[tokio::test]
async fn test_reviews_channel_and_approval_filters() {
    let (_dir, path) = setup_dataset();
    let app = setup_app(test_config(&path));

    let (_, body) = send(&app, get_request("/api/reviews/hostaway?channel=Airbnb")).await;
    assert!(body["data"]
        .as_array()
        .unwrap()
        .iter()
        .all(|r| r["channel"] == "Airbnb"));

    let (_, body) = send(&app, get_request("/api/reviews/hostaway?approval=pending")).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 4);
    assert!(body["data"]
        .as_array()
        .unwrap()
        .iter()
        .all(|r| r["approved"] == false));
}

#[tokio::test]
async fn test_reviews_invalid_query_is_bad_request() {
    let (_dir, path) = setup_dataset();
    let app = setup_app(test_config(&path));

    for uri in [
        "/api/reviews/hostaway?rating=high",
        "/api/reviews/hostaway?sort=popularity-desc",
        "/api/reviews/hostaway?sortBy=rating&order=sideways",
        "/api/reviews/hostaway?approval=maybe",
    ] {
        let (status, body) = send(&app, get_request(uri)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", uri);
        assert_eq!(body["status"], "error");
    }
}

#[tokio::test]
async fn test_reviews_missing_dataset_is_server_error() {
    let dir = TempDir::new().unwrap();
    let app = setup_app(test_config(&dir.path().join("absent.json")));

    let (status, body) = send(&app, get_request("/api/reviews/hostaway")).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["status"], "error");
}

// =============================================================================
// Approval action and public view
// =============================================================================

#[tokio::test]
async fn test_public_view_lists_approved_only() {
    let (_dir, path) = setup_dataset();
    let app = setup_app(test_config(&path));

    let (status, body) = send(&app, get_request("/api/reviews/public")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&body), vec![json!(7456), json!(7454)]);
    assert_eq!(body["total"], 2);
}

#[tokio::test]
async fn test_approval_updates_public_view_and_dataset() {
    let (_dir, path) = setup_dataset();
    let app = setup_app(test_config(&path));

    let (status, body) = send(
        &app,
        json_request("POST", "/api/reviews/hostaway", json!({"id": 7453, "approved": true})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");
    assert_eq!(body["id"], 7453);
    assert_eq!(body["approved"], true);
    assert_eq!(body["message"], "Review approved successfully");

    let (_, body) = send(&app, get_request("/api/reviews/public")).await;
    assert_eq!(ids(&body), vec![json!(7456), json!(7454), json!(7453)]);

    // The flag is persisted in the dataset file itself
    let saved: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(saved["result"][0]["approved"], true);

    let (status, body) = send(
        &app,
        json_request("POST", "/api/reviews/hostaway", json!({"id": 7454, "approved": false})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Review unapproved successfully");

    let (_, body) = send(&app, get_request("/api/reviews/hostaway")).await;
    assert_eq!(body["stats"]["approved"], 2);
}

#[tokio::test]
async fn test_approval_unknown_id_not_found() {
    let (_dir, path) = setup_dataset();
    let app = setup_app(test_config(&path));

    let (status, body) = send(
        &app,
        json_request("POST", "/api/reviews/hostaway", json!({"id": 99999, "approved": true})),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["status"], "error");
    assert_eq!(body["message"], "Review not found");
}

#[tokio::test]
async fn test_approval_malformed_body_is_bad_request() {
    let (_dir, path) = setup_dataset();
    let app = setup_app(test_config(&path));

    let (status, body) = send(
        &app,
        json_request("POST", "/api/reviews/hostaway", json!({"approved": true})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "error");
}

#[tokio::test]
async fn test_sqlite_store_approval_flow() {
    let (_dir, path) = setup_dataset();
    let store: Arc<dyn ApprovalStore> = Arc::new(SqliteApprovalStore::in_memory().await.unwrap());
    let app = build_router(AppState::new(test_config(&path), store));

    // Reviews become known to the store on first read
    let (status, _) = send(
        &app,
        json_request("POST", "/api/reviews/hostaway", json!({"id": 7453, "approved": true})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, body) = send(&app, get_request("/api/reviews/public")).await;
    assert_eq!(ids(&body), vec![json!(7456), json!(7454)]);

    let (status, _) = send(
        &app,
        json_request("POST", "/api/reviews/hostaway", json!({"id": 7453, "approved": true})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = send(&app, get_request("/api/reviews/public")).await;
    assert_eq!(ids(&body), vec![json!(7456), json!(7454), json!(7453)]);

    // Dataset file is untouched by the sqlite backend
    let saved: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(saved["result"][0]["approved"], false);
}

// =============================================================================
// Hostaway API
// =============================================================================

async fn hostaway_reviews(headers: HeaderMap) -> (StatusCode, Json<Value>) {
    if headers.get(header::AUTHORIZATION).and_then(|v| v.to_str().ok()) != Some("Bearer test-key")
    {
        return (StatusCode::UNAUTHORIZED, Json(json!({"status": "fail"})));
    }

    (
        StatusCode::OK,
        Json(json!({
            "status": "success",
            "result": [
                {
                    "id": 501,
                    "listingName": "Camden Loft",
                    "guestName": "Ana",
                    "rating": 8,
                    "submittedAt": "2024-03-01 10:00:00",
                    "channel": "Airbnb"
                },
                {
                    "id": 502,
                    "listingName": "Camden Loft",
                    "reviewCategory": [
                        {"category": "cleanliness", "rating": 4},
                        {"category": "value", "rating": 6}
                    ],
                    "submittedAt": "2024-04-01 10:00:00"
                }
            ]
        })),
    )
}

fn hostaway_config(dataset: &Path, base_url: String, api_key: &str) -> TomlConfig {
    let mut config = test_config(dataset);
    config.hostaway.base_url = base_url;
    config.hostaway.api_key = Some(api_key.to_string());
    config
}

#[tokio::test]
async fn test_reviews_from_hostaway_api() {
    let base_url = spawn_mock(Router::new().route("/reviews", get(hostaway_reviews))).await;
    let (_dir, path) = setup_dataset();
    let app = setup_app(hostaway_config(&path, base_url, "test-key"));

    let (status, body) = send(&app, get_request("/api/reviews/hostaway")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["source"], "hostaway-api");
    assert_eq!(ids(&body), vec![json!(502), json!(501)]);
    // round((4 + 6) / 2)
    assert_eq!(body["data"][0]["rating"], 5.0);
    assert_eq!(body["data"][0]["channel"], "Hostaway");
    assert_eq!(body["stats"]["recurringIssues"]["cleanliness"], 1);
    assert_eq!(body["stats"]["recurringIssues"]["value"], 1);
}

#[tokio::test]
async fn test_hostaway_reviews_keep_their_own_approval_flags() {
    // Ids collide with fallback dataset records that are stored as unapproved
    let router = Router::new().route(
        "/reviews",
        get(|| async {
            Json(json!({
                "status": "success",
                "result": [
                    {"id": 7453, "rating": 9, "approved": true, "submittedAt": "2024-05-01 10:00:00"},
                    {"id": 7454, "rating": 8, "submittedAt": "2024-04-01 10:00:00"}
                ]
            }))
        }),
    );
    let base_url = spawn_mock(router).await;
    let (_dir, path) = setup_dataset();
    let app = setup_app(hostaway_config(&path, base_url, "test-key"));

    let (status, body) = send(&app, get_request("/api/reviews/hostaway")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["source"], "hostaway-api");
    assert_eq!(body["data"][0]["id"], 7453);
    assert_eq!(body["data"][0]["approved"], true);
    // 7454 is approved in the dataset file, but not in the API record
    assert_eq!(body["data"][1]["id"], 7454);
    assert_eq!(body["data"][1]["approved"], false);
    assert_eq!(body["stats"]["approved"], 1);
}

#[tokio::test]
async fn test_hostaway_rejection_falls_back_to_dataset() {
    let base_url = spawn_mock(Router::new().route("/reviews", get(hostaway_reviews))).await;
    let (_dir, path) = setup_dataset();
    let app = setup_app(hostaway_config(&path, base_url, "wrong-key"));

    let (status, body) = send(&app, get_request("/api/reviews/hostaway")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["source"], "mock-data");
    assert_eq!(body["stats"]["total"], 6);
}

#[tokio::test]
async fn test_hostaway_empty_result_falls_back_to_dataset() {
    let router = Router::new().route(
        "/reviews",
        get(|| async { Json(json!({"status": "success", "result": []})) }),
    );
    let base_url = spawn_mock(router).await;
    let (_dir, path) = setup_dataset();
    let app = setup_app(hostaway_config(&path, base_url, "test-key"));

    let (_, body) = send(&app, get_request("/api/reviews/hostaway")).await;

    assert_eq!(body["source"], "mock-data");
}

#[tokio::test]
async fn test_hostaway_unreachable_falls_back_to_dataset() {
    let (_dir, path) = setup_dataset();
    let app = setup_app(hostaway_config(
        &path,
        "http://127.0.0.1:1".to_string(),
        "test-key",
    ));

    let (status, body) = send(&app, get_request("/api/reviews/hostaway")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["source"], "mock-data");
}

// =============================================================================
// Google Places API
// =============================================================================

async fn place_details(Query(params): Query<HashMap<String, String>>) -> Json<Value> {
    if params.get("key").map(String::as_str) != Some("g-key") {
        return Json(json!({
            "status": "REQUEST_DENIED",
            "error_message": "The provided API key is invalid."
        }));
    }

    match params.get("place_id").map(String::as_str) {
        Some("ChIJshoreditch") => Json(json!({
            "status": "OK",
            "result": {
                "name": "Shoreditch Heights",
                "rating": 4.5,
                "user_ratings_total": 212,
                "reviews": [
                    {"author_name": "Jane", "rating": 5, "text": "Lovely", "time": 1700000000},
                    {"author_name": "Tom", "rating": 4, "text": "Good", "time": 1690000000}
                ]
            }
        })),
        _ => Json(json!({"status": "INVALID_REQUEST"})),
    }
}

async fn find_place(Query(params): Query<HashMap<String, String>>) -> Json<Value> {
    match params.get("input").map(String::as_str) {
        Some("Shoreditch Heights") => Json(json!({
            "status": "OK",
            "candidates": [{
                "place_id": "ChIJshoreditch",
                "name": "Shoreditch Heights",
                "formatted_address": "29 Shoreditch High St, London"
            }]
        })),
        _ => Json(json!({"status": "ZERO_RESULTS", "candidates": []})),
    }
}

async fn google_app(dataset: &Path) -> Router {
    let router = Router::new()
        .route("/details/json", get(place_details))
        .route("/findplacefromtext/json", get(find_place));
    let base_url = spawn_mock(router).await;

    let mut config = test_config(dataset);
    config.google.base_url = base_url;
    config.google.api_key = Some("g-key".to_string());
    setup_app(config)
}

#[tokio::test]
async fn test_google_not_configured() {
    let (_dir, path) = setup_dataset();
    let app = setup_app(test_config(&path));

    let (status, body) = send(&app, get_request("/api/reviews/google?placeId=abc")).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["message"], "Google Places API key not configured");
}

#[tokio::test]
async fn test_google_requires_place_id() {
    let (_dir, path) = setup_dataset();
    let app = google_app(&path).await;

    let (status, _) = send(&app, get_request("/api/reviews/google")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, get_request("/api/reviews/google?placeId=")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_google_reviews_normalized() {
    let (_dir, path) = setup_dataset();
    let app = google_app(&path).await;

    let (status, body) = send(&app, get_request("/api/reviews/google?placeId=ChIJshoreditch")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["source"], "google");
    assert_eq!(body["metadata"]["totalReviews"], 212);
    assert_eq!(body["metadata"]["averageRating"], 4.5);
    assert_eq!(body["metadata"]["placeName"], "Shoreditch Heights");

    let first = &body["data"][0];
    assert_eq!(first["id"], "google-1700000000");
    assert_eq!(first["guestName"], "Jane");
    assert_eq!(first["publicReview"], "Lovely");
    // 5-star scale rescaled to 10
    assert_eq!(first["rating"], 10.0);
    assert_eq!(first["listingName"], "Shoreditch Heights");
    assert_eq!(first["channel"], "Google Reviews");
    assert_eq!(first["submittedAt"], "2023-11-14T22:13:20.000Z");
    assert_eq!(first["approved"], false);
    assert_eq!(body["data"][1]["rating"], 8.0);
}

#[tokio::test]
async fn test_google_error_status_is_bad_request() {
    let (_dir, path) = setup_dataset();
    let app = google_app(&path).await;

    let (status, body) = send(&app, get_request("/api/reviews/google?placeId=unknown")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Google API Error: INVALID_REQUEST");
}

#[tokio::test]
async fn test_google_find_place() {
    let (_dir, path) = setup_dataset();
    let app = google_app(&path).await;

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/api/reviews/google",
            json!({"propertyName": "Shoreditch Heights", "address": "ignored"}),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["placeId"], "ChIJshoreditch");
    assert_eq!(body["address"], "29 Shoreditch High St, London");
}

#[tokio::test]
async fn test_google_find_place_errors() {
    let (_dir, path) = setup_dataset();
    let app = google_app(&path).await;

    let (status, _) = send(&app, json_request("POST", "/api/reviews/google", json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        &app,
        json_request("POST", "/api/reviews/google", json!({"address": "Nowhere"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Property not found on Google");
}
