//! Wires the directory, auth, room and transport layers together and
//! runs the WebSocket accept loop alongside the HTTP admin surface.

use std::sync::Arc;

use kingdoms_auth::HttpAuthenticator;
use kingdoms_directory::{LobbyRepository, RedisManager, RoomKeyCodec, RoomRepo, ShardingRepo};
use kingdoms_http::AppState as HttpAppState;
use kingdoms_room::RoomManager;
use kingdoms_transport::{Transport, WebSocketTransport};

use crate::config::AppConfig;
use crate::error::ServerError;
use crate::handler::handle_connection;

/// A built, not-yet-running Kingdoms process.
pub struct Server {
    room_manager: Arc<RoomManager>,
    authenticator: Arc<HttpAuthenticator>,
    transport: WebSocketTransport,
    http_router: axum::Router,
    http_addr: String,
}

impl Server {
    /// Constructs every layer from `config`: one Redis connection shared
    /// by the room-blob, shard and lobby repositories, the HTTP
    /// authenticator, the room manager, and both listeners.
    pub async fn build(config: AppConfig) -> Result<Self, ServerError> {
        let redis = RedisManager::connect(&config.redis_url).await?;
        let codec = RoomKeyCodec::new(&config.alphabet)
            .map_err(|e| ServerError::Config(e.to_string()))?;

        let room_repo = RoomRepo::new(redis.clone(), codec);
        let sharding = ShardingRepo::new(redis.clone());
        let lobby = LobbyRepository::new(redis.clone());

        let room_manager = Arc::new(RoomManager::new(
            config.room_config(),
            room_repo,
            sharding,
            lobby,
        ));

        let authenticator = Arc::new(HttpAuthenticator::new(config.auth_service_url.clone()));

        let http_codec = RoomKeyCodec::new(&config.alphabet)
            .map_err(|e| ServerError::Config(e.to_string()))?;
        let http_state = Arc::new(HttpAppState {
            room_repo: RoomRepo::new(redis.clone(), http_codec),
            lobby: LobbyRepository::new(redis.clone()),
            room_ttl_secs: config.room_ttl_secs,
        });
        let http_router = kingdoms_http::router(http_state);

        let transport = WebSocketTransport::bind(&config.bind_addr).await?;
        let http_addr = http_admin_addr(&config.bind_addr);

        Ok(Self {
            room_manager,
            authenticator,
            transport,
            http_router,
            http_addr,
        })
    }

    /// Runs the WebSocket accept loop and the HTTP admin surface
    /// concurrently until either one exits with an error.
    pub async fn run(self) -> Result<(), ServerError> {
        let Server {
            room_manager,
            authenticator,
            mut transport,
            http_router,
            http_addr,
        } = self;

        let ws_accept = async move {
            tracing::info!("WebSocket accept loop running");
            loop {
                match transport.accept().await {
                    Ok(conn) => {
                        let room_manager = Arc::clone(&room_manager);
                        let authenticator = Arc::clone(&authenticator);
                        tokio::spawn(async move {
                            handle_connection(conn, room_manager, authenticator).await;
                        });
                    }
                    Err(err) => tracing::error!(error = %err, "accept failed"),
                }
            }
        };

        let http_listener = tokio::net::TcpListener::bind(&http_addr)
            .await
            .map_err(ServerError::Http)?;
        tracing::info!(addr = %http_addr, "HTTP admin surface listening");
        let http_serve = async move {
            axum::serve(http_listener, http_router)
                .await
                .map_err(ServerError::Http)
        };

        tokio::select! {
            _ = ws_accept => Ok(()),
            result = http_serve => result,
        }
    }
}

/// The HTTP admin surface listens one port above the WebSocket port —
/// the two can't share a listener since the transport layer speaks raw
/// WebSocket handshakes rather than routing through `axum`, but both
/// still come up from the single configured `bind_addr`.
fn http_admin_addr(bind_addr: &str) -> String {
    match bind_addr.rsplit_once(':') {
        Some((host, port)) => {
            let port: u16 = port.parse().unwrap_or(8080);
            format!("{host}:{}", port.wrapping_add(1))
        }
        None => bind_addr.to_string(),
    }
}
