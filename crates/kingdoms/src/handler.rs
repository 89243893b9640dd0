//! Per-connection handler: auth handshake, room resolution, and the
//! inbound/outbound message pumps for one player's socket.
//!
//! Each accepted connection gets its own Tokio task running
//! [`handle_connection`]. The flow mirrors spec §4.1/§4.3:
//!   1. First inbound message must be `{at: "auth", token}`.
//!   2. Validate the token against the external auth service.
//!   3. Resolve (or create) the room named in the connection URL.
//!   4. Join the room, then pump messages until the room or the
//!      transport ends the connection.

use std::sync::Arc;
use std::time::Duration;

use kingdoms_auth::{AuthError, Authenticator};
use kingdoms_protocol::{Codec, InMessage, JsonCodec, OutMessage};
use kingdoms_room::{RoomError, RoomManager};
use kingdoms_transport::{Connection, WebSocketConnection};
use tokio::sync::mpsc;

/// One poll of the inbound socket, with the 1-second timeout the spec's
/// inbound-loop contract calls for: a timeout is not an error, it only
/// exists so a caller can re-check whether it should keep looping.
enum Poll {
    Message(Vec<u8>),
    Closed,
    TimedOut,
}

async fn poll_once(conn: &WebSocketConnection) -> Poll {
    match tokio::time::timeout(Duration::from_secs(1), conn.recv()).await {
        Ok(Ok(Some(data))) => Poll::Message(data),
        Ok(Ok(None)) => Poll::Closed,
        Ok(Err(_)) => Poll::Closed,
        Err(_elapsed) => Poll::TimedOut,
    }
}

/// Reads messages until one of kind `auth` arrives or the connection
/// ends; any other first message is a protocol violation.
async fn read_auth_token(conn: &WebSocketConnection) -> Result<String, AuthError> {
    loop {
        match poll_once(conn).await {
            Poll::TimedOut => continue,
            Poll::Closed => return Err(AuthError::WrongAuthFlow),
            Poll::Message(data) => {
                return match JsonCodec.decode::<InMessage>(&data) {
                    Ok(InMessage::Auth { token }) => Ok(token),
                    _ => Err(AuthError::WrongAuthFlow),
                };
            }
        }
    }
}

struct CloseOutcome(u16, String);

impl From<RoomError> for CloseOutcome {
    fn from(err: RoomError) -> Self {
        CloseOutcome(err.close_code(), err.to_string())
    }
}

impl From<AuthError> for CloseOutcome {
    fn from(err: AuthError) -> Self {
        RoomError::Auth(err).into()
    }
}

/// Handles one accepted connection end to end. Never propagates an
/// error — every failure path maps to a close code and the socket is
/// closed accordingly, per the propagation policy in spec §7.
pub async fn handle_connection<A>(
    conn: WebSocketConnection,
    room_manager: Arc<RoomManager>,
    authenticator: Arc<A>,
) where
    A: Authenticator,
{
    let room_key = conn.connect_params().room_key.clone();
    if let Err(close) = run_connection(&conn, &room_manager, &authenticator).await {
        tracing::warn!(%room_key, code = close.0, reason = %close.1, "connection closed");
        let _ = conn.close_with(close.0, &close.1).await;
    }
}

async fn run_connection<A>(
    conn: &WebSocketConnection,
    room_manager: &RoomManager,
    authenticator: &A,
) -> Result<(), CloseOutcome>
where
    A: Authenticator,
{
    let room_key = conn.connect_params().room_key.clone();
    let username = conn.connect_params().username.clone();

    let token = read_auth_token(conn).await.map_err(CloseOutcome::from)?;
    let player_id = authenticator
        .authenticate(&token)
        .await
        .map_err(CloseOutcome::from)?;

    let ack = JsonCodec
        .encode(&OutMessage::Auth { status: true })
        .expect("OutMessage::Auth always encodes");
    conn.send(&ack)
        .await
        .map_err(|_| CloseOutcome(4999, "failed to send auth ack".into()))?;

    let room = room_manager
        .get_or_create_room(&room_key)
        .await
        .map_err(CloseOutcome::from)?;

    let (tx, mut rx) = mpsc::unbounded_channel::<OutMessage>();
    room.connect(player_id, username, tx)
        .await
        .map_err(CloseOutcome::from)?;

    tracing::info!(%room_key, %player_id, "player joined room");

    let outbound = async {
        while let Some(msg) = rx.recv().await {
            let Ok(bytes) = JsonCodec.encode(&msg) else { continue };
            if conn.send(&bytes).await.is_err() {
                break;
            }
        }
    };

    let inbound = async {
        loop {
            match poll_once(conn).await {
                Poll::TimedOut => continue,
                Poll::Closed => break,
                Poll::Message(data) => {
                    if let Ok(msg) = JsonCodec.decode::<InMessage>(&data) {
                        room.handle_message(player_id, msg).await;
                    }
                }
            }
        }
    };

    tokio::select! {
        _ = outbound => {}
        _ = inbound => {}
        result = room_manager.play_with_room(&room, player_id) => {
            if let Err(err) = result {
                tracing::debug!(%room_key, %player_id, error = %err, "room ended without reaching in-progress");
            }
        }
    }

    room_manager.cleanup(&room, player_id).await;
    tracing::info!(%room_key, %player_id, "player disconnected");
    Ok(())
}
