//! Zone membership: which sibling nodes a command is replicated to.

use tracing::warn;

use crate::broadcast::PeerTarget;

/// Resolves the other nodes of the local zone.
pub trait ZoneMembership: Send + Sync {
    fn zone(&self) -> &str;

    /// Every node of the zone except this one.
    fn other_peers(&self) -> Vec<PeerTarget>;
}

/// Membership from a fixed server list.
///
/// Entries are `host` (served on the local admin port) or `host:port`.
#[derive(Debug, Clone)]
pub struct StaticMembership {
    zone: String,
    local_host: String,
    http_port: u16,
    servers: Vec<String>,
}

impl StaticMembership {
    pub fn new(
        zone: impl Into<String>,
        local_host: impl Into<String>,
        http_port: u16,
        servers: Vec<String>,
    ) -> Self {
        let zone: String = zone.into();
        StaticMembership {
            zone: zone.trim().to_uppercase(),
            local_host: local_host.into(),
            http_port,
            servers,
        }
    }
}

impl ZoneMembership for StaticMembership {
    fn zone(&self) -> &str {
        &self.zone
    }

    fn other_peers(&self) -> Vec<PeerTarget> {
        self.servers
            .iter()
            .map(|server| server.trim())
            .filter(|server| !server.is_empty())
            .filter_map(|server| {
                if server.contains(':') {
                    match server.parse::<PeerTarget>() {
                        Ok(peer) => Some(peer),
                        Err(err) => {
                            warn!(server, "skipping zone server: {}", err);
                            None
                        }
                    }
                } else {
                    Some(PeerTarget::new(server, self.http_port))
                }
            })
            .filter(|peer| !(peer.host == self.local_host && peer.port == self.http_port))
            .collect()
    }
}
