//! Production [`Authenticator`]: validates a bearer token against the
//! external auth service over HTTP, retrying with exponential backoff.

use std::time::Duration;

use kingdoms_protocol::PlayerId;
use serde::Deserialize;

use crate::{AuthError, Authenticator};

const MAX_ATTEMPTS: u32 = 5;
const BASE_BACKOFF: Duration = Duration::from_secs(1);
const MAX_BACKOFF: Duration = Duration::from_secs(10);
/// Per-call deadline for the auth service request itself, separate from
/// the retry backoff between attempts.
const CALL_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Deserialize)]
struct TokenValidation {
    valid: bool,
    player_id: u64,
}

/// Calls `{base_url}/validate` with the bearer token and expects a JSON
/// body `{"valid": bool, "player_id": u64}`.
pub struct HttpAuthenticator {
    client: reqwest::Client,
    base_url: String,
}

impl HttpAuthenticator {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(CALL_TIMEOUT)
                .build()
                .expect("reqwest client with a fixed timeout always builds"),
            base_url: base_url.into(),
        }
    }

    async fn validate_once(&self, token: &str) -> Result<TokenValidation, AuthError> {
        let url = format!("{}/validate", self.base_url);
        let response = self
            .client
            .post(&url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| AuthError::ServiceUnavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AuthError::TokenNotValid);
        }

        response
            .json()
            .await
            .map_err(|e| AuthError::ServiceUnavailable(e.to_string()))
    }
}

impl Authenticator for HttpAuthenticator {
    async fn authenticate(&self, token: &str) -> Result<PlayerId, AuthError> {
        let mut last_err = AuthError::ServiceUnavailable("no attempts made".into());

        for attempt in 0..MAX_ATTEMPTS {
            if attempt > 0 {
                let backoff = BASE_BACKOFF.saturating_mul(2u32.pow(attempt - 1)).min(MAX_BACKOFF);
                tokio::time::sleep(backoff).await;
            }
            match self.validate_once(token).await {
                Ok(validation) if validation.valid => {
                    return Ok(PlayerId(validation.player_id));
                }
                Ok(_) => return Err(AuthError::TokenNotValid),
                Err(AuthError::TokenNotValid) => return Err(AuthError::TokenNotValid),
                Err(err) => {
                    tracing::warn!(attempt, error = %err, "auth service call failed, retrying");
                    last_err = err;
                }
            }
        }

        Err(last_err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::routing::post;
    use axum::{Json, Router};
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    async fn spawn_mock(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn valid_token_returns_player_id() {
        let router = Router::new().route(
            "/validate",
            post(|| async { Json(serde_json::json!({"valid": true, "player_id": 7})) }),
        );
        let base_url = spawn_mock(router).await;

        let auth = HttpAuthenticator::new(base_url);
        let player_id = auth.authenticate("some-token").await.unwrap();
        assert_eq!(player_id, PlayerId(7));
    }

    #[tokio::test]
    async fn rejected_token_fails_without_retrying() {
        let calls = Arc::new(AtomicU32::new(0));
        let calls_clone = calls.clone();
        let router = Router::new().route(
            "/validate",
            post(move || {
                let calls = calls_clone.clone();
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Json(serde_json::json!({"valid": false, "player_id": 0}))
                }
            }),
        );
        let base_url = spawn_mock(router).await;

        let auth = HttpAuthenticator::new(base_url);
        let result = auth.authenticate("bad-token").await;
        assert!(matches!(result, Err(AuthError::TokenNotValid)));
        assert_eq!(calls.load(Ordering::SeqCst), 1, "should not retry a definitive rejection");
    }

    #[tokio::test(start_paused = true)]
    async fn unreachable_service_retries_then_fails() {
        // Port 0 isn't connectable; the client should exhaust its
        // retries and return ServiceUnavailable rather than hang. Paused
        // time lets the backoff sleeps (up to 1+2+4+8s) resolve instantly.
        let auth = HttpAuthenticator::new("http://127.0.0.1:1".to_string());
        let result = auth.authenticate("token").await;
        assert!(matches!(result, Err(AuthError::ServiceUnavailable(_))));
    }
}
