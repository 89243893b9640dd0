//! `/api/v1/rooms/` handlers: create a room blob, list joinable rooms.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::routing::post;
use axum::{Json, Router};
use kingdoms_directory::{LobbyRepository, RoomRepo, RoomSummary};
use kingdoms_map::MapAndMeta;
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;

use crate::error::HttpError;

pub struct AppState {
    pub room_repo: RoomRepo,
    pub lobby: LobbyRepository,
    pub room_ttl_secs: u64,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/v1/rooms/", post(create_room).get(list_rooms))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Debug, Deserialize)]
pub struct CreateRoomRequest {
    pub map: kingdoms_map::GameMap,
    pub meta: kingdoms_map::MapMeta,
}

#[derive(Debug, Serialize)]
pub struct CreateRoomResponse {
    pub room_key: String,
}

async fn create_room(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateRoomRequest>,
) -> Result<(axum::http::StatusCode, Json<CreateRoomResponse>), HttpError> {
    let seed = MapAndMeta { map: body.map, meta: body.meta };
    seed.validate()?;

    // The room is registered in the lobby once it's first materialized by
    // `RoomManager::get_or_create_room`, not here — a freshly posted blob
    // with nobody connected to it yet isn't a joinable room.
    let (room_key, _pk) = state.room_repo.save_room(&seed, state.room_ttl_secs).await?;

    tracing::info!(room_key, "room created");
    Ok((axum::http::StatusCode::CREATED, Json(CreateRoomResponse { room_key })))
}

#[derive(Debug, Deserialize)]
pub struct ListRoomsQuery {
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    50
}

async fn list_rooms(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListRoomsQuery>,
) -> Result<Json<Vec<RoomSummary>>, HttpError> {
    let limit = query.limit.clamp(1, 50) as isize;
    let rooms = state.lobby.get_rooms(0, limit).await?;
    Ok(Json(rooms))
}
