//! End-to-end tests driving the router over in-memory and file-backed stores.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use kaul_core::{DocumentStore, MemoryStore, RewardConfig, RewardPolicy};
use kaul_server::routes::create_router;
use kaul_server::{AppState, KaulServer, ServerConfig};
use serde_json::{json, Value};
use test_case::test_case;

fn memory_app(config: ServerConfig) -> (Router, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::seeded());
    let state = Arc::new(AppState::new(config, store.clone()));
    (create_router(state), store)
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = tower::ServiceExt::oneshot(app.clone(), request)
        .await
        .unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

async fn get_subjects(app: &Router) -> (StatusCode, Value) {
    let request = Request::builder()
        .uri("/subjects")
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

async fn post_vote(app: &Router, body: &Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(Method::POST)
        .uri("/vote")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

fn vote(id: u64, vote_type: &str, user: &str) -> Value {
    json!({ "id": id, "voteType": vote_type, "userId": user })
}

fn approx(value: &Value, expected: f64) -> bool {
    value.as_f64().is_some_and(|v| (v - expected).abs() < 1e-9)
}

#[tokio::test]
async fn test_listing_is_seeded() {
    let (app, _) = memory_app(ServerConfig::default());

    let (status, body) = get_subjects(&app).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["subjects"].as_array().unwrap().len(), 4);
    assert_eq!(body["subjects"][0]["title"], "Kubernetes");
    assert_eq!(body["subjects"][0]["votes"], json!({ "up": 0, "down": 0 }));
    assert_eq!(body["userProfiles"].as_array().unwrap().len(), 4);
    assert_eq!(body["users"], json!({}));
}

#[tokio::test]
async fn test_first_vote_pays_cost_without_rewards() {
    let (app, _) = memory_app(ServerConfig::default());

    let (status, body) = post_vote(&app, &vote(1, "up", "u1")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(
        body["message"],
        "Vote recorded! Rewards distributed to previous voters."
    );
    assert!(approx(&body["user"]["points"], 90.0));
    assert_eq!(body["rewards"]["payouts"], json!([]));
    assert_eq!(body["subjects"][0]["votes"]["up"], 1);
    assert_eq!(body["subjects"][0]["voterHistory"][0]["userId"], "u1");
    assert_eq!(body["subjects"][0]["voterHistory"][0]["position"], 1);
}

#[tokio::test]
async fn test_second_voter_rewards_first() {
    let (app, _) = memory_app(ServerConfig::default());

    post_vote(&app, &vote(1, "up", "u1")).await;
    let (status, body) = post_vote(&app, &vote(1, "up", "u2")).await;

    assert_eq!(status, StatusCode::OK);
    assert!(approx(&body["user"]["points"], 90.0));
    assert_eq!(body["rewards"]["payouts"][0]["recipient"], "u1");
    assert!(approx(&body["rewards"]["total"], 5.0));

    let (_, listing) = get_subjects(&app).await;
    let u1 = &listing["users"]["u1"];
    assert!(approx(&u1["points"], 95.0));
    assert!(approx(&u1["upVoteRewards"]["1"], 5.0));
    assert_eq!(u1["rewardHistory"][0]["fromUser"], "u2");
    assert_eq!(u1["rewardHistory"][0]["voteType"], "up");
}

#[tokio::test]
async fn test_opposite_type_voters_are_not_rewarded() {
    let (app, _) = memory_app(ServerConfig::default());

    post_vote(&app, &vote(3, "down", "u1")).await;
    let (_, body) = post_vote(&app, &vote(3, "up", "u2")).await;

    assert_eq!(body["rewards"]["payouts"], json!([]));
    let (_, listing) = get_subjects(&app).await;
    assert!(approx(&listing["users"]["u1"]["points"], 90.0));
}

#[tokio::test]
async fn test_tiered_policy_pays_flat_rate() {
    let config =
        ServerConfig::default().with_reward(RewardConfig::new(RewardPolicy::Tiered));
    let (app, _) = memory_app(config);

    for user in ["u1", "u2", "u3"] {
        post_vote(&app, &vote(2, "up", user)).await;
    }

    let (_, listing) = get_subjects(&app).await;
    assert!(approx(&listing["users"]["u1"]["points"], 91.0));
    assert!(approx(&listing["users"]["u2"]["points"], 90.5));
    assert_eq!(listing["users"]["u1"]["rewardHistory"][0]["tier"], 1);
}

#[test_case(vote(1, "up", "u1"), "You have already voted this way on this subject" ; "same direction")]
#[test_case(vote(99, "up", "u1"), "Subject not found" ; "unknown subject")]
#[tokio::test]
async fn test_rejected_votes(second: Value, message: &str) {
    let (app, store) = memory_app(ServerConfig::default());
    post_vote(&app, &vote(1, "up", "u1")).await;
    let writes = store.subject_writes();

    let (status, body) = post_vote(&app, &second).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "success": false, "error": message }));
    assert_eq!(store.subject_writes(), writes);
}

#[tokio::test]
async fn test_opposite_direction_is_allowed() {
    let (app, _) = memory_app(ServerConfig::default());

    post_vote(&app, &vote(1, "up", "u1")).await;
    let (status, body) = post_vote(&app, &vote(1, "down", "u1")).await;

    assert_eq!(status, StatusCode::OK);
    assert!(approx(&body["user"]["points"], 80.0));
    assert_eq!(body["subjects"][0]["votes"], json!({ "up": 1, "down": 1 }));
}

#[tokio::test]
async fn test_balance_gate() {
    let (app, _) = memory_app(ServerConfig::default());

    for id in 1..=4 {
        post_vote(&app, &vote(id, "up", "u1")).await;
        post_vote(&app, &vote(id, "down", "u1")).await;
    }
    // Four subjects allow eight votes; u1 now sits at 20 points.
    let (_, listing) = get_subjects(&app).await;
    assert!(approx(&listing["users"]["u1"]["points"], 20.0));

    let config = ServerConfig::default()
        .with_rules(kaul_core::VoteRules::default().with_vote_cost(30.0));
    let store = Arc::new(MemoryStore::seeded());
    let app = create_router(Arc::new(AppState::new(config, store)));

    post_vote(&app, &vote(1, "up", "u9")).await;
    post_vote(&app, &vote(2, "up", "u9")).await;
    post_vote(&app, &vote(3, "up", "u9")).await;
    let (status, body) = post_vote(&app, &vote(4, "up", "u9")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Not enough points to vote");
}

#[tokio::test]
async fn test_invalid_vote_type() {
    let (app, _) = memory_app(ServerConfig::default());

    let (status, body) = post_vote(&app, &vote(1, "sideways", "u1")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_malformed_body() {
    let (app, _) = memory_app(ServerConfig::default());
    let request = Request::builder()
        .method(Method::POST)
        .uri("/vote")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"id\": \"one\""))
        .unwrap();

    let (status, body) = send(&app, request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_store_failure_is_generic_500() {
    let (app, store) = memory_app(ServerConfig::default());
    store.fail_user_writes(true);

    let (status, body) = post_vote(&app, &vote(1, "up", "u1")).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({ "success": false, "error": "Failed to record vote" }));

    let (_, listing) = get_subjects(&app).await;
    assert_eq!(listing["subjects"][0]["votes"]["up"], 0);
    assert_eq!(listing["users"], json!({}));
}

#[tokio::test]
async fn test_listing_is_idempotent() {
    let (app, store) = memory_app(ServerConfig::default());
    post_vote(&app, &vote(4, "down", "u1")).await;

    let (_, first) = get_subjects(&app).await;
    let (_, second) = get_subjects(&app).await;

    assert_eq!(first, second);
    assert_eq!(store.subject_writes(), 1);
}

#[tokio::test]
async fn test_file_store_persists_across_servers() {
    let dir = tempfile::tempdir().unwrap();
    let config = ServerConfig::default().with_data_dir(dir.path());

    let app = KaulServer::new(config.clone()).router();
    post_vote(&app, &vote(1, "up", "u1")).await;
    post_vote(&app, &vote(1, "up", "u2")).await;

    let app = KaulServer::new(config).router();
    let (status, listing) = get_subjects(&app).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(listing["subjects"][0]["votes"]["up"], 2);
    assert!(approx(&listing["users"]["u1"]["points"], 95.0));

    let raw: Value =
        serde_json::from_str(&std::fs::read_to_string(dir.path().join("users.json")).unwrap())
            .unwrap();
    assert!(approx(&raw["points"]["u2"]["points"], 90.0));
}

#[tokio::test]
async fn test_corrupt_document_is_read_failure() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("subjects.json"), "{ not json").unwrap();
    let app = KaulServer::new(ServerConfig::default().with_data_dir(dir.path())).router();

    let (status, body) = get_subjects(&app).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({ "success": false, "error": "Failed to read data" }));

    let (status, body) = post_vote(&app, &vote(1, "up", "u1")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Failed to record vote");
}

#[tokio::test]
async fn test_reset_restores_seed() {
    let store = Arc::new(MemoryStore::seeded());
    let app = create_router(Arc::new(AppState::new(
        ServerConfig::default(),
        store.clone(),
    )));
    post_vote(&app, &vote(1, "up", "u1")).await;

    kaul_core::store::reset(store.as_ref()).unwrap();

    let (_, listing) = get_subjects(&app).await;
    assert_eq!(listing["subjects"][0]["votes"]["up"], 0);
    assert_eq!(listing["users"], json!({}));
    assert!(store.load_users().unwrap().points.is_empty());
}
