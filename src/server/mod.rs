//! Admin HTTP API of a session node.
//!
//! This module contains the Axum routes serving client commands and the
//! HTTP client that replicates them to peers.

pub mod peer_client;
pub mod routes;

pub use peer_client::HttpPeerClient;
pub use routes::*;
