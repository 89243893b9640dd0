//! Parses a room connection URL: `/ws/rooms/{room_key}/?user_id=<int>&username=<str>`.
//!
//! The WebSocket upgrade request's path and query string are the only
//! place a fresh connection carries the room key and claimed identity
//! before a single protocol message has been exchanged — the `auth`
//! handshake message that follows still has to validate the token, but
//! the room key has to be known before that to even resolve which room's
//! handler should read it.

use crate::TransportError;

/// The three fields a client's connection URL must carry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectParams {
    pub room_key: String,
    pub user_id: u64,
    pub username: String,
}

impl ConnectParams {
    /// Parses `uri` (the raw request-target, e.g.
    /// `/ws/rooms/abc123/?user_id=7&username=alice`) into its parts.
    pub fn parse(uri: &str) -> Result<Self, TransportError> {
        // `Url::parse` needs an absolute URL; the request-target we get
        // from the handshake is relative, so anchor it against a
        // throwaway base purely to reuse `url`'s path/query parsing.
        let base = url::Url::parse("ws://connect.local").expect("static base url is valid");
        let parsed = base
            .join(uri)
            .map_err(|e| TransportError::ConnectionClosed(format!("invalid connection url: {e}")))?;

        let room_key = parsed
            .path_segments()
            .and_then(|mut segments| {
                if segments.next()? != "ws" || segments.next()? != "rooms" {
                    return None;
                }
                segments.next().filter(|s| !s.is_empty())
            })
            .ok_or_else(|| TransportError::ConnectionClosed("missing room_key in connection url".into()))?
            .to_string();

        let mut user_id = None;
        let mut username = None;
        for (key, value) in parsed.query_pairs() {
            match key.as_ref() {
                "user_id" => user_id = value.parse::<u64>().ok(),
                "username" => username = Some(value.into_owned()),
                _ => {}
            }
        }

        Ok(Self {
            room_key,
            user_id: user_id
                .ok_or_else(|| TransportError::ConnectionClosed("missing or invalid user_id".into()))?,
            username: username
                .filter(|u| !u.is_empty())
                .ok_or_else(|| TransportError::ConnectionClosed("missing username".into()))?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_well_formed_connection_url() {
        let params = ConnectParams::parse("/ws/rooms/abc123/?user_id=7&username=alice").unwrap();
        assert_eq!(params, ConnectParams { room_key: "abc123".into(), user_id: 7, username: "alice".into() });
    }

    #[test]
    fn decodes_percent_encoded_usernames() {
        let params = ConnectParams::parse("/ws/rooms/abc/?user_id=1&username=bob%20smith").unwrap();
        assert_eq!(params.username, "bob smith");
    }

    #[test]
    fn rejects_missing_room_key() {
        assert!(ConnectParams::parse("/ws/rooms/?user_id=1&username=a").is_err());
    }

    #[test]
    fn rejects_non_numeric_user_id() {
        assert!(ConnectParams::parse("/ws/rooms/abc/?user_id=nope&username=a").is_err());
    }

    #[test]
    fn rejects_missing_username() {
        assert!(ConnectParams::parse("/ws/rooms/abc/?user_id=1").is_err());
    }
}
