//! Authentication hook for validating player identity.
//!
//! This layer defines the [`Authenticator`] trait: a single async method
//! that takes a token string and returns a `PlayerId` or an error. The
//! room connection handler calls it once, on the first message of a
//! fresh connection, before anything else is accepted.
//!
//! # Why a trait?
//!
//! Swapping in a mock authenticator in tests, or a dev "accept anything"
//! authenticator locally, shouldn't touch any connection-handling code.
//! The production implementation, [`HttpAuthenticator`](crate::HttpAuthenticator),
//! validates against an external auth service over HTTP.

use kingdoms_protocol::PlayerId;

use crate::AuthError;

/// Validates a client's auth token and returns their identity.
///
/// # Trait bounds
///
/// - `Send + Sync` → shared across the tasks handling concurrent
///   connections.
/// - `'static` → doesn't borrow temporary data; lives as long as the
///   server.
pub trait Authenticator: Send + Sync + 'static {
    /// Validates `token` and returns the player's identity.
    ///
    /// Called exactly once per connection, from the handshake state,
    /// before the connection is registered with a room.
    fn authenticate(
        &self,
        token: &str,
    ) -> impl std::future::Future<Output = Result<PlayerId, AuthError>> + Send;
}
