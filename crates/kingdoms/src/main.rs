use kingdoms::{AppConfig, Server};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = AppConfig::load()?;
    tracing::info!(replica_id = %config.replica_id(), bind_addr = %config.bind_addr, "starting kingdoms");

    let server = Server::build(config).await?;
    server.run().await?;
    Ok(())
}
