//! Admin HTTP surface for the Kingdoms room runtime: room creation and
//! lobby listing, served from `axum` alongside the WebSocket transport.

mod error;
mod routes;

pub use error::HttpError;
pub use routes::{router, AppState, CreateRoomRequest, CreateRoomResponse, ListRoomsQuery};
