//! Token validation for the Kingdoms room runtime.
//!
//! There is no session or reconnection state here — a connection
//! authenticates exactly once, at handshake time, against the external
//! auth service:
//!
//! ```text
//! Room Layer (above)    ← calls authenticate() once per connection
//!     ↕
//! Auth Layer (this crate)  ← Authenticator trait + HTTP implementation
//!     ↕
//! Protocol Layer (below)   ← provides PlayerId
//! ```

#![allow(async_fn_in_trait)]

mod auth;
mod error;
mod http;

pub use auth::Authenticator;
pub use error::AuthError;
pub use http::HttpAuthenticator;
