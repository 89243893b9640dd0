//! Error types for token validation.

/// Errors from validating a player's auth token against the external
/// auth service. There is no local session/reconnection state in this
/// layer — every connection re-validates its token once, at handshake
/// time (`PlayerWrongAuthFlow`/`PlayerTokenIsNotValid` from the wire
/// protocol map directly onto these two variants).
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The first message on a fresh connection wasn't `{at: "auth"}`.
    #[error("first message must be an auth message")]
    WrongAuthFlow,

    /// The auth service rejected the token (or it doesn't parse).
    #[error("token is not valid")]
    TokenNotValid,

    /// The auth service couldn't be reached after retrying.
    #[error("auth service unreachable: {0}")]
    ServiceUnavailable(String),
}
