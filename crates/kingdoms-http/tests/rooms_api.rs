//! Integration tests against a real Redis instance, driving the router
//! exactly as a client would (see `kingdoms-directory`'s tests for why
//! these are `#[ignore]`d by default).

use std::collections::HashMap;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use kingdoms_directory::{LobbyRepository, RedisManager, RoomKeyCodec, RoomRepo};
use kingdoms_http::{router, AppState};
use tower::ServiceExt;

async fn test_state() -> Arc<AppState> {
    let dsn = std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".into());
    let redis = RedisManager::connect(&dsn).await.expect("redis should be reachable");
    Arc::new(AppState {
        room_repo: RoomRepo::new(redis.clone(), RoomKeyCodec::default()),
        lobby: LobbyRepository::new(redis),
        room_ttl_secs: 60,
    })
}

fn sample_body() -> String {
    let mut poi = HashMap::new();
    poi.insert("spawn", vec![[0, 0], [3, 3]]);
    serde_json::json!({
        "map": vec![vec![serde_json::json!({}); 4]; 4],
        "meta": { "version": 1, "points_of_interest": poi },
    })
    .to_string()
}

#[tokio::test]
#[ignore]
async fn create_then_list_room() {
    let state = test_state().await;
    let app = router(state);

    let create_req = Request::builder()
        .method("POST")
        .uri("/api/v1/rooms/")
        .header("content-type", "application/json")
        .body(Body::from(sample_body()))
        .unwrap();
    let response = app.clone().oneshot(create_req).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let list_req = Request::builder()
        .method("GET")
        .uri("/api/v1/rooms/?limit=10")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(list_req).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
#[ignore]
async fn rejects_map_with_too_few_spawns() {
    let state = test_state().await;
    let app = router(state);

    let mut poi = HashMap::new();
    poi.insert("spawn", vec![[0, 0]]);
    let body = serde_json::json!({
        "map": vec![vec![serde_json::json!({}); 4]; 4],
        "meta": { "version": 1, "points_of_interest": poi },
    })
    .to_string();

    let req = Request::builder()
        .method("POST")
        .uri("/api/v1/rooms/")
        .header("content-type", "application/json")
        .body(Body::from(body))
        .unwrap();
    let response = app.oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}
