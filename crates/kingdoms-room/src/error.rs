//! Error taxonomy for the room layer, mirrored from the original
//! service's `exceptions/room.py` and `exceptions/player.py`. Each variant
//! maps to exactly one WebSocket close code at the connection boundary
//! (see `kingdoms`'s top-level error module).

use kingdoms_auth::AuthError;
use kingdoms_protocol::PlayerId;

#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// A room was requested by a key that's already taken (admin surface
    /// only — room keys are minted by the directory, this guards races).
    #[error("room {0} already exists")]
    AlreadyExists(String),

    /// No blob in the directory for this room key (expired or never
    /// created).
    #[error("room {0} not found")]
    NotFound(String),

    /// This replica's local cache disagrees with the directory's replica
    /// index — the caller connected to the wrong process instance.
    #[error("room {room_key} is owned by a different replica")]
    WrongReplica { room_key: String },

    /// Every spawn slot is already taken.
    #[error("room {0} has no free slots")]
    NoSlots(String),

    /// The room has already left the waiting state; new players can't
    /// join mid-game.
    #[error("room {0} already in progress")]
    InGame(String),

    /// A player action was attempted before `set_init_point` gave them a
    /// slot — mirrors the original's `PlayerNotInit`.
    #[error("player {0} has no assigned slot yet")]
    PlayerNotInit(PlayerId),

    /// The room isn't in a state that allows this operation (e.g. a
    /// message that only makes sense in `Waiting` arrives after
    /// `Finished`).
    #[error("room {0} is not in the right state for this operation")]
    NotReady(String),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Directory(#[from] kingdoms_directory::DirectoryError),

    /// A player's `initPoint` lost its owner entirely mid-game — the cell a
    /// kingdom's capital sits on can only ever belong to that kingdom's
    /// owner or its captor, never to nobody. Mirrors the original's
    /// `territory_manager.py` raising `ValueError("WrongGameState")` for the
    /// same condition. Fatal: the tick aborts and the room is torn down.
    #[error("room {room_key} invariant violated: init point for player {player} has no owner")]
    InvariantViolation { room_key: String, player: PlayerId },
}

impl RoomError {
    /// WebSocket close code for this error, per the connection close-code
    /// table.
    pub fn close_code(&self) -> u16 {
        match self {
            RoomError::WrongReplica { .. } => 1008,
            RoomError::NoSlots(_) => 4010,
            RoomError::InGame(_) => 4020,
            RoomError::Auth(AuthError::TokenNotValid) => 4030,
            RoomError::Auth(AuthError::WrongAuthFlow) => 4031,
            RoomError::Auth(AuthError::ServiceUnavailable(_)) => 4999,
            RoomError::NotFound(_) => 4040,
            RoomError::AlreadyExists(_)
            | RoomError::PlayerNotInit(_)
            | RoomError::NotReady(_)
            | RoomError::Directory(_)
            | RoomError::InvariantViolation { .. } => 4999,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn close_codes_match_the_wire_table() {
        assert_eq!(RoomError::WrongReplica { room_key: "a".into() }.close_code(), 1008);
        assert_eq!(RoomError::NoSlots("a".into()).close_code(), 4010);
        assert_eq!(RoomError::InGame("a".into()).close_code(), 4020);
        assert_eq!(RoomError::Auth(AuthError::TokenNotValid).close_code(), 4030);
        assert_eq!(RoomError::Auth(AuthError::WrongAuthFlow).close_code(), 4031);
        assert_eq!(RoomError::NotFound("a".into()).close_code(), 4040);
    }
}
