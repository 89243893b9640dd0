//! Integration tests against a real Redis instance.
//!
//! These require `REDIS_URL` (or `redis://127.0.0.1:6379` by default) to
//! point at a running server, so they're marked `#[ignore]` and run
//! explicitly (`cargo test -- --ignored`) rather than in the default
//! suite — the same reason the original service's repository tests ran
//! against a docker-compose Redis rather than mocks.

use kingdoms_directory::{LobbyRepository, RedisManager, RoomKeyCodec, RoomRepo, ShardingRepo};
use kingdoms_map::{Cell, CellType, MapAndMeta, MapMeta, Point};
use std::collections::HashMap;

async fn connect() -> RedisManager {
    let dsn = std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".into());
    RedisManager::connect(&dsn).await.expect("redis should be reachable")
}

fn sample_seed() -> MapAndMeta {
    let mut poi = HashMap::new();
    poi.insert(CellType::Spawn, vec![Point::new(0, 0), Point::new(3, 3)]);
    MapAndMeta {
        map: vec![vec![Cell::empty(); 4]; 4],
        meta: MapMeta { version: 1, points_of_interest: poi },
    }
}

#[tokio::test]
#[ignore]
async fn save_and_load_room_round_trips() {
    let redis = connect().await;
    let repo = RoomRepo::new(redis, RoomKeyCodec::default());

    let seed = sample_seed();
    let (room_key, _pk) = repo.save_room(&seed, 60).await.unwrap();
    let loaded = repo.load_room(&room_key).await.unwrap();
    assert_eq!(loaded, seed);

    repo.remove_room(&room_key).await.unwrap();
    assert!(repo.load_room(&room_key).await.is_err());
}

#[tokio::test]
#[ignore]
async fn sharding_repo_tracks_replica_ownership() {
    let redis = connect().await;
    let repo = ShardingRepo::new(redis);

    repo.set_room_replica("abc", "replica-1", 60).await.unwrap();
    assert_eq!(
        repo.get_room_replica("abc").await.unwrap(),
        Some("replica-1".to_string())
    );

    repo.remove_room_replica("abc").await.unwrap();
    assert_eq!(repo.get_room_replica("abc").await.unwrap(), None);
}

#[tokio::test]
#[ignore]
async fn lobby_lists_rooms_most_recent_first() {
    let redis = connect().await;
    let lobby = LobbyRepository::new(redis);

    lobby.add_room("room-a", 4, 1).await.unwrap();
    lobby.add_room("room-b", 6, 2).await.unwrap();
    lobby.adjust_players("room-b", 1).await.unwrap();

    let rooms = lobby.get_rooms(0, 10).await.unwrap();
    assert_eq!(rooms[0].room_key, "room-b");
    assert_eq!(rooms[0].current_players, 1);
    assert_eq!(rooms[1].room_key, "room-a");

    lobby.remove_room("room-a").await.unwrap();
    lobby.remove_room("room-b").await.unwrap();
}
