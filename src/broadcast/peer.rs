//! Addressing of sibling registry nodes.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// A sibling node in the same zone.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PeerTarget {
    pub host: String,
    pub port: u16,
}

impl PeerTarget {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        PeerTarget {
            host: host.into(),
            port,
        }
    }

    /// `http://host:port`, the root of the peer's admin API.
    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}

impl fmt::Display for PeerTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

impl FromStr for PeerTarget {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (host, port) = s
            .trim()
            .rsplit_once(':')
            .ok_or_else(|| ConfigError::Address(s.to_string()))?;
        if host.is_empty() {
            return Err(ConfigError::Address(s.to_string()));
        }
        let port = port
            .parse()
            .map_err(|_| ConfigError::Address(s.to_string()))?;
        Ok(PeerTarget::new(host, port))
    }
}
