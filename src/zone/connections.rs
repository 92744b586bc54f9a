//! Tracking of live client connections on a session node.

use std::fmt;
use std::sync::Arc;

use crossbeam_skiplist::SkipMap;
use parking_lot::RwLock;
use serde::Serialize;

use crate::clock::VersionId;
use crate::error::ClientManagerError;

/// Identifies one client connection on this node.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct ConnectId {
    pub client_ip: String,
    pub client_port: u16,
}

impl ConnectId {
    pub fn new(client_ip: impl Into<String>, client_port: u16) -> Self {
        ConnectId {
            client_ip: client_ip.into(),
            client_port,
        }
    }
}

impl fmt::Display for ConnectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.client_ip, self.client_port)
    }
}

/// Point-in-time view of one connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectionRecord {
    pub connect_id: ConnectId,
    /// Whether the connection's publishers and subscribers are registered
    pub registered: bool,
    pub version: VersionId,
}

/// The store that maps client IPs to their connections.
pub trait ConnectionRegistry: Send + Sync {
    /// Connections opened from any of `ips`.
    fn ip_connects(&self, ips: &[String]) -> Result<Vec<ConnectId>, ClientManagerError>;

    /// Drops the registrations carried by `connects`, keeping the
    /// connections open. Returns how many entries changed.
    fn remove_registrations(
        &self,
        connects: &[ConnectId],
        version: VersionId,
    ) -> Result<usize, ClientManagerError>;

    /// Closes every connection from `ips` older than `version` so the
    /// clients reconnect and register again.
    fn close_ip_connects(
        &self,
        ips: &[String],
        version: VersionId,
    ) -> Result<Vec<ConnectId>, ClientManagerError>;

    fn snapshot(&self) -> Vec<ConnectionRecord>;
}

struct ConnectionEntry {
    registered: bool,
    version: VersionId,
}

/// In-memory connection store, ordered by client address.
#[derive(Default)]
pub struct MemoryConnections {
    entries: SkipMap<ConnectId, Arc<RwLock<ConnectionEntry>>>,
}

impl MemoryConnections {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a newly registered connection.
    pub fn connect(&self, connect_id: ConnectId, version: VersionId) {
        self.entries.insert(
            connect_id,
            Arc::new(RwLock::new(ConnectionEntry {
                registered: true,
                version,
            })),
        );
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl ConnectionRegistry for MemoryConnections {
    fn ip_connects(&self, ips: &[String]) -> Result<Vec<ConnectId>, ClientManagerError> {
        Ok(self
            .entries
            .iter()
            .filter(|entry| ips.contains(&entry.key().client_ip))
            .map(|entry| entry.key().clone())
            .collect())
    }

    fn remove_registrations(
        &self,
        connects: &[ConnectId],
        version: VersionId,
    ) -> Result<usize, ClientManagerError> {
        let mut changed = 0;
        for connect_id in connects {
            let Some(entry) = self.entries.get(connect_id) else {
                continue;
            };
            let mut state = entry.value().write();
            // Stale commands never overwrite a newer mutation.
            if version > state.version && state.registered {
                state.registered = false;
                state.version = version;
                changed += 1;
            }
        }
        Ok(changed)
    }

    fn close_ip_connects(
        &self,
        ips: &[String],
        version: VersionId,
    ) -> Result<Vec<ConnectId>, ClientManagerError> {
        let mut closed = Vec::new();
        for connect_id in self.ip_connects(ips)? {
            let Some(entry) = self.entries.get(&connect_id) else {
                continue;
            };
            if entry.value().read().version < version {
                entry.remove();
                closed.push(connect_id);
            }
        }
        Ok(closed)
    }

    fn snapshot(&self) -> Vec<ConnectionRecord> {
        self.entries
            .iter()
            .map(|entry| {
                let state = entry.value().read();
                ConnectionRecord {
                    connect_id: entry.key().clone(),
                    registered: state.registered,
                    version: state.version,
                }
            })
            .collect()
    }
}
