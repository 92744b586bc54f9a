//! Per-peer outcomes and their aggregation.

use std::io;

use serde::Serialize;

/// What happened when a command was sent to one peer.
///
/// The transport decides the classification: an unreachable peer is
/// `Ignored`, a peer that answered with an error is `Failed`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PeerOutcome {
    Success,
    /// Peer presumed transiently offline; does not fail the broadcast
    Ignored(String),
    /// Peer rejected or errored on the command
    Failed(String),
}

impl PeerOutcome {
    /// Classifies a transport-level I/O error.
    ///
    /// Refused connections and timeouts mean the peer is unreachable; every
    /// other kind is a real failure.
    pub fn from_io_error(err: &io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::ConnectionRefused => {
                PeerOutcome::Ignored("ignored error: connection refused".to_string())
            }
            io::ErrorKind::TimedOut => {
                PeerOutcome::Ignored("ignored error: connect timeout".to_string())
            }
            _ => PeerOutcome::Failed(err.to_string()),
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, PeerOutcome::Failed(_))
    }
}

/// Aggregated result of one broadcast.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "message", rename_all = "snake_case")]
pub enum BroadcastResult {
    Success,
    Failure(String),
    /// The deadline passed before every peer answered. Peers may still have
    /// applied the command, so the cluster state is unknown.
    TimedOut,
}

impl BroadcastResult {
    /// Folds outcomes given in completion order: the first real failure wins,
    /// otherwise the broadcast succeeded.
    pub fn from_outcomes<'a, I>(outcomes: I) -> Self
    where
        I: IntoIterator<Item = &'a PeerOutcome>,
    {
        outcomes
            .into_iter()
            .find_map(|outcome| match outcome {
                PeerOutcome::Failed(message) => Some(BroadcastResult::Failure(message.clone())),
                _ => None,
            })
            .unwrap_or(BroadcastResult::Success)
    }

    pub fn is_success(&self) -> bool {
        matches!(self, BroadcastResult::Success)
    }
}
