//! Error types for the registry backbone.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayoutError {
    #[error("sequence field must be at least one bit wide")]
    EmptySequence,

    #[error("node ({node_bits}) and sequence ({sequence_bits}) bits exceed {max}")]
    TooManyLowBits {
        node_bits: u8,
        sequence_bits: u8,
        max: u8,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClockError {
    #[error("clock moved backwards: last issued at {last}ms, now {now}ms")]
    Regression { last: u64, now: u64 },

    #[error("wall clock {now}ms is before the version epoch {epoch}ms")]
    BeforeEpoch { now: u64, epoch: u64 },

    #[error("node id {node_id} does not fit the layout (max {max})")]
    NodeIdOutOfRange { node_id: u64, max: u64 },

    #[error(transparent)]
    Layout(#[from] LayoutError),
}

#[derive(Debug, Error)]
pub enum ClientManagerError {
    #[error("ips is empty")]
    EmptyIps,

    #[error("failed to stamp mutation: {0}")]
    Clock(#[from] ClockError),

    #[error("connection store error: {0}")]
    Connections(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid address {0}")]
    Address(String),
}

/// Top-level error for the crate.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Clock(#[from] ClockError),

    #[error(transparent)]
    ClientManager(#[from] ClientManagerError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("http client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
