//! Zone-wide client management built on the clock and the broadcaster.
//!
//! A session node applies a client command locally, stamping the mutation
//! with a version id, then replicates it to the other nodes of its zone.

pub mod client_manager;
pub mod connections;
pub mod membership;

pub use client_manager::{ClientManager, LocalCommand, PeerCommandClient, ZoneCommand, parse_ips};
pub use connections::{ConnectId, ConnectionRecord, ConnectionRegistry, MemoryConnections};
pub use membership::{StaticMembership, ZoneMembership};
