//! Main entry point for a registry session node.
//!
//! Serves the client-manager admin API and replicates zone commands to the
//! other session nodes listed in the configuration.

use std::sync::Arc;

use registry_backbone::server::{HttpPeerClient, create_router};
use registry_backbone::zone::{ClientManager, MemoryConnections, StaticMembership};
use registry_backbone::{PeerBroadcaster, Result, ServerConfig, VersionClock};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = ServerConfig::load()?;
    let addr = config.bind_addr()?;
    let local_host = config.local_host()?;

    info!("Starting registry session node in zone {}...", config.zone);

    let clock = Arc::new(VersionClock::with_options(config.clock)?);
    let membership = StaticMembership::new(
        config.zone.clone(),
        local_host,
        addr.port(),
        config.zone_servers.clone(),
    );
    let peer_client = HttpPeerClient::new(config.peer_connect_timeout())?;

    let manager = ClientManager::new(
        clock,
        Arc::new(MemoryConnections::new()),
        Arc::new(membership),
        PeerBroadcaster::new(config.broadcaster),
        Arc::new(peer_client),
        config.broadcast_timeout(),
    );

    let app = create_router(Arc::new(manager));

    info!("Server listening on http://{}", addr);
    info!("Available endpoints:");
    info!("  GET  /health");
    info!("  GET  /api/version/next");
    info!("  POST /api/clientManager/clientOff");
    info!("  POST /api/clientManager/clientOpen");
    info!("  POST /api/clientManager/zone/clientOff");
    info!("  POST /api/clientManager/zone/clientOpen");
    info!("  GET  /api/clientManager/connections.json");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
