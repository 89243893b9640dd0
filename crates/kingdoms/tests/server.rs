//! End-to-end tests driving the real WebSocket transport, handler and
//! room stack together, the way an actual client would. These need a
//! reachable Redis instance (see `kingdoms-directory`'s tests for why
//! that makes them `#[ignore]`d by default — set `REDIS_URL` and pass
//! `--ignored` to run them).

use std::collections::HashMap;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use kingdoms::{AppConfig, Server};
use kingdoms_directory::{RedisManager, RoomKeyCodec, RoomRepo};
use kingdoms_map::{Cell, CellType, MapAndMeta, MapMeta, Point};
use kingdoms_protocol::{InMessage, OutMessage};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

fn redis_dsn() -> String {
    std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".into())
}

/// A tiny mock auth service: `POST /validate` accepts any bearer token
/// that parses as a `u64` and echoes it back as the player id.
async fn spawn_mock_auth_service() -> String {
    use axum::routing::post;
    use axum::{Json, Router};

    async fn validate(headers: axum::http::HeaderMap) -> Json<serde_json::Value> {
        let token = headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .unwrap_or("");
        match token.parse::<u64>() {
            Ok(id) => Json(serde_json::json!({ "valid": true, "player_id": id })),
            Err(_) => Json(serde_json::json!({ "valid": false, "player_id": 0 })),
        }
    }

    let router = Router::new().route("/validate", post(validate));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

async fn seed_two_player_room(room_repo: &RoomRepo) -> String {
    let map = vec![vec![Cell::empty(); 6]; 6];
    let mut poi = HashMap::new();
    poi.insert(CellType::Spawn, vec![Point::new(0, 0), Point::new(5, 5)]);
    let seed = MapAndMeta { map, meta: MapMeta { version: 1, points_of_interest: poi } };
    let (room_key, _pk) = room_repo.save_room(&seed, 60).await.expect("seed room");
    room_key
}

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

async fn connect_client(addr: &str, room_key: &str, user_id: u64, username: &str) -> Client {
    let url = format!("ws://{addr}/ws/rooms/{room_key}/?user_id={user_id}&username={username}");
    let (ws, _) = tokio_tungstenite::connect_async(&url).await.expect("client connects");
    ws
}

async fn send(client: &mut Client, msg: &InMessage) {
    let text = serde_json::to_string(msg).unwrap();
    client.send(Message::Text(text.into())).await.unwrap();
}

async fn recv(client: &mut Client) -> OutMessage {
    let msg = tokio::time::timeout(Duration::from_secs(2), client.next())
        .await
        .expect("message within timeout")
        .expect("stream not closed")
        .expect("no transport error");
    serde_json::from_slice(&msg.into_data()).expect("valid OutMessage")
}

/// Builds and runs a real [`Server`] on `bind_addr` (HTTP admin comes up
/// one port above it, per `Server`'s addressing), backed by a mock auth
/// service that accepts any numeric token. Returns a [`RoomRepo`] the
/// test can use to seed rooms exactly as the admin HTTP surface would.
async fn run_test_server(bind_addr: &str) -> RoomRepo {
    let dsn = redis_dsn();
    let redis = RedisManager::connect(&dsn).await.expect("redis reachable");
    let room_repo = RoomRepo::new(redis.clone(), RoomKeyCodec::default());

    let auth_service_url = spawn_mock_auth_service().await;
    let config = AppConfig {
        room_ttl_secs: 60,
        default_king_power: 1,
        default_castle_power: 1,
        colors_count: 6,
        replica_id: Some("test-replica".into()),
        alphabet: kingdoms_directory::DEFAULT_ALPHABET.to_string(),
        auth_service_url,
        redis_url: dsn,
        bind_addr: bind_addr.to_string(),
    };

    let server = Server::build(config).await.expect("server builds");
    tokio::spawn(server.run());
    // Give the accept loop a moment to bind before clients connect.
    tokio::time::sleep(Duration::from_millis(50)).await;

    room_repo
}

#[tokio::test]
#[ignore]
async fn two_players_join_ready_up_and_receive_start() {
    let bind_addr = "127.0.0.1:19901";
    let room_repo = run_test_server(bind_addr).await;
    let room_key = seed_two_player_room(&room_repo).await;

    let mut alice = connect_client(bind_addr, &room_key, 1, "alice").await;
    let mut bob = connect_client(bind_addr, &room_key, 2, "bob").await;

    send(&mut alice, &InMessage::Auth { token: "1".into() }).await;
    assert_eq!(recv(&mut alice).await, OutMessage::Auth { status: true });

    send(&mut bob, &InMessage::Auth { token: "2".into() }).await;
    assert_eq!(recv(&mut bob).await, OutMessage::Auth { status: true });

    // Both connects broadcast a roster; drain the ones each client sees.
    let _ = recv(&mut alice).await;
    let _ = recv(&mut bob).await;
    let _ = recv(&mut alice).await;

    send(&mut alice, &InMessage::Ready).await;
    send(&mut bob, &InMessage::Ready).await;

    // Readiness broadcasts roster updates, then the room transitions and
    // broadcasts `start`.
    let mut saw_start = false;
    for _ in 0..6 {
        match recv(&mut alice).await {
            OutMessage::Start => {
                saw_start = true;
                break;
            }
            _ => continue,
        }
    }
    assert!(saw_start, "expected a start message after both players readied up");
}

#[tokio::test]
#[ignore]
async fn wrong_first_message_closes_with_auth_flow_violation() {
    let bind_addr = "127.0.0.1:19902";
    let room_repo = run_test_server(bind_addr).await;
    let room_key = seed_two_player_room(&room_repo).await;

    let mut client = connect_client(bind_addr, &room_key, 1, "alice").await;
    send(&mut client, &InMessage::Ready).await;

    let close = tokio::time::timeout(Duration::from_secs(2), client.next())
        .await
        .expect("closes within timeout");
    match close {
        Some(Ok(Message::Close(Some(frame)))) => assert_eq!(u16::from(frame.code), 4031),
        other => panic!("expected a close frame with code 4031, got {other:?}"),
    }
}

#[tokio::test]
#[ignore]
async fn invalid_token_closes_with_token_not_valid() {
    let bind_addr = "127.0.0.1:19903";
    let room_repo = run_test_server(bind_addr).await;
    let room_key = seed_two_player_room(&room_repo).await;

    let mut client = connect_client(bind_addr, &room_key, 1, "alice").await;
    send(&mut client, &InMessage::Auth { token: "not-a-number".into() }).await;

    let close = tokio::time::timeout(Duration::from_secs(2), client.next())
        .await
        .expect("closes within timeout");
    match close {
        Some(Ok(Message::Close(Some(frame)))) => assert_eq!(u16::from(frame.code), 4030),
        other => panic!("expected a close frame with code 4030, got {other:?}"),
    }
}
