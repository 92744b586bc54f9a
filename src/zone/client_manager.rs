//! Client on/off commands, applied locally and replicated to the zone.

use std::sync::Arc;
use std::time::Duration;

use futures_util::future::BoxFuture;
use tracing::info;

use crate::broadcast::{BroadcastResult, PeerBroadcaster, PeerOutcome, PeerTarget};
use crate::clock::{VersionClock, VersionId};
use crate::error::ClientManagerError;
use crate::zone::connections::{ConnectId, ConnectionRegistry};
use crate::zone::membership::ZoneMembership;

/// A client command that can be replicated to peers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoneCommand {
    /// Drop the registrations of clients from the given IPs
    ClientOff,
    /// Let clients from the given IPs register again
    ClientOpen,
}

impl ZoneCommand {
    /// Admin API path the command is served on.
    pub fn path(self) -> &'static str {
        match self {
            ZoneCommand::ClientOff => "/api/clientManager/clientOff",
            ZoneCommand::ClientOpen => "/api/clientManager/clientOpen",
        }
    }
}

/// Sends a command to one peer and classifies the result.
pub trait PeerCommandClient: Send + Sync + 'static {
    fn send(
        &self,
        peer: PeerTarget,
        command: ZoneCommand,
        ips: String,
    ) -> BoxFuture<'static, PeerOutcome>;
}

/// Result of applying a command on this node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalCommand {
    pub version: VersionId,
    pub connects: Vec<ConnectId>,
}

/// Splits a `;`-separated IP list, dropping blanks.
pub fn parse_ips(ips: &str) -> Result<Vec<String>, ClientManagerError> {
    let parsed: Vec<String> = ips
        .trim()
        .split(';')
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
        .map(str::to_string)
        .collect();
    if parsed.is_empty() {
        return Err(ClientManagerError::EmptyIps);
    }
    Ok(parsed)
}

pub struct ClientManager {
    clock: Arc<VersionClock>,
    connections: Arc<dyn ConnectionRegistry>,
    membership: Arc<dyn ZoneMembership>,
    broadcaster: PeerBroadcaster,
    peer_client: Arc<dyn PeerCommandClient>,
    broadcast_timeout: Duration,
}

impl ClientManager {
    pub fn new(
        clock: Arc<VersionClock>,
        connections: Arc<dyn ConnectionRegistry>,
        membership: Arc<dyn ZoneMembership>,
        broadcaster: PeerBroadcaster,
        peer_client: Arc<dyn PeerCommandClient>,
        broadcast_timeout: Duration,
    ) -> Self {
        ClientManager {
            clock,
            connections,
            membership,
            broadcaster,
            peer_client,
            broadcast_timeout,
        }
    }

    pub fn clock(&self) -> &Arc<VersionClock> {
        &self.clock
    }

    pub fn connections(&self) -> &Arc<dyn ConnectionRegistry> {
        &self.connections
    }

    /// Removes the registrations of every connection from `ips` on this node.
    pub fn client_off(&self, ips: &str) -> Result<LocalCommand, ClientManagerError> {
        let ips = parse_ips(ips)?;
        let connects = self.connections.ip_connects(&ips)?;
        let version = self.clock.next_id()?;

        if !connects.is_empty() {
            let removed = self.connections.remove_registrations(&connects, version)?;
            info!(%version, removed, connects = ?connects, "clientOff");
        }

        Ok(LocalCommand { version, connects })
    }

    /// Closes the connections from `ips` so those clients register again.
    ///
    /// Connections carrying a newer version than the command are left open.
    pub fn client_open(&self, ips: &str) -> Result<LocalCommand, ClientManagerError> {
        let ips = parse_ips(ips)?;
        let version = self.clock.next_id()?;
        let connects = self.connections.close_ip_connects(&ips, version)?;
        info!(%version, connects = ?connects, "clientOpen");

        Ok(LocalCommand { version, connects })
    }

    /// [`client_off`](Self::client_off) here, then on every other node of the zone.
    pub async fn client_off_in_zone(
        &self,
        ips: &str,
    ) -> Result<BroadcastResult, ClientManagerError> {
        self.client_off(ips)?;
        Ok(self.replicate(ZoneCommand::ClientOff, ips).await)
    }

    /// [`client_open`](Self::client_open) here, then on every other node of the zone.
    pub async fn client_open_in_zone(
        &self,
        ips: &str,
    ) -> Result<BroadcastResult, ClientManagerError> {
        self.client_open(ips)?;
        Ok(self.replicate(ZoneCommand::ClientOpen, ips).await)
    }

    async fn replicate(&self, command: ZoneCommand, ips: &str) -> BroadcastResult {
        let peers = self.membership.other_peers();
        if peers.is_empty() {
            return BroadcastResult::Success;
        }

        info!(
            zone = self.membership.zone(),
            peers = peers.len(),
            ?command,
            "replicating command to zone"
        );
        let client = self.peer_client.clone();
        let ips = ips.to_string();
        self.broadcaster
            .broadcast(
                peers,
                move |peer| client.send(peer, command, ips.clone()),
                self.broadcast_timeout,
            )
            .await
    }
}
