//! Bounded fan-out of control-plane commands to same-zone peers.
//!
//! A [`PeerBroadcaster`] runs one action per [`PeerTarget`] under a shared
//! worker limit, waits up to a deadline and folds the per-peer
//! [`PeerOutcome`]s into a single [`BroadcastResult`].

pub mod broadcaster;
pub mod outcome;
pub mod peer;

pub use broadcaster::{BroadcasterConfig, PeerBroadcaster, SATURATED_MESSAGE};
pub use outcome::{BroadcastResult, PeerOutcome};
pub use peer::PeerTarget;
