//! Node configuration.
//!
//! Loaded from the JSON file named by `REGISTRY_CONFIG`; every field has a
//! default so a bare node starts without any file.

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use serde::Deserialize;

use crate::broadcast::BroadcasterConfig;
use crate::clock::ClockOptions;
use crate::error::ConfigError;

pub const CONFIG_ENV: &str = "REGISTRY_CONFIG";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address the admin API listens on
    pub bind: String,
    pub zone: String,
    /// Host peers know this node by; derived from `bind` when unset
    pub local_host: Option<String>,
    /// Hosts of every session node in the zone, this one included
    pub zone_servers: Vec<String>,
    pub clock: ClockOptions,
    pub broadcaster: BroadcasterConfig,
    pub broadcast_timeout_millis: u64,
    pub peer_connect_timeout_millis: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            bind: "127.0.0.1:9603".to_string(),
            zone: "DEFAULT_ZONE".to_string(),
            local_host: None,
            zone_servers: Vec::new(),
            clock: ClockOptions::default(),
            broadcaster: BroadcasterConfig::default(),
            broadcast_timeout_millis: 3000,
            peer_connect_timeout_millis: 1000,
        }
    }
}

impl ServerConfig {
    /// Reads the file named by `REGISTRY_CONFIG`, or returns the defaults.
    pub fn load() -> Result<Self, ConfigError> {
        match std::env::var(CONFIG_ENV) {
            Ok(path) => Self::from_file(&path),
            Err(_) => Ok(Self::default()),
        }
    }

    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_string(),
            source,
        })?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.bind
            .parse()
            .map_err(|_| ConfigError::Address(self.bind.clone()))
    }

    pub fn local_host(&self) -> Result<String, ConfigError> {
        if let Some(host) = &self.local_host {
            return Ok(host.clone());
        }
        let ip = self.bind_addr()?.ip();
        Ok(if ip.is_unspecified() {
            IpAddr::from([127, 0, 0, 1]).to_string()
        } else {
            ip.to_string()
        })
    }

    pub fn broadcast_timeout(&self) -> Duration {
        Duration::from_millis(self.broadcast_timeout_millis)
    }

    pub fn peer_connect_timeout(&self) -> Duration {
        Duration::from_millis(self.peer_connect_timeout_millis)
    }
}
