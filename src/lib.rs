//! # Registry backbone
//!
//! Consistency primitives for a cluster of service registry session nodes.
//!
//! ## Features
//!
//! - **Version clock**: strictly increasing 64-bit version ids derived from
//!   wall-clock time, decodable back to the millisecond they were issued
//! - **Peer broadcast**: bounded-concurrency fan-out of admin commands to
//!   same-zone peers with a deadline, cancellation and typed outcomes
//! - **Zone client manager**: client on/off commands applied locally and
//!   replicated through the broadcaster
//!
//! ## Example
//!
//! ```rust
//! use registry_backbone::VersionClock;
//!
//! let clock = VersionClock::new();
//! let first = clock.next_id().unwrap();
//! let second = clock.next_id().unwrap();
//! assert!(first < second);
//! println!("issued at {}", clock.real_timestamp(second));
//! ```

pub mod broadcast;
pub mod clock;
pub mod config;
pub mod error;
pub mod server;
pub mod zone;

pub use broadcast::{BroadcastResult, BroadcasterConfig, PeerBroadcaster, PeerOutcome, PeerTarget};
pub use clock::{ClockOptions, TimeSource, VersionClock, VersionId, VersionLayout};
pub use config::ServerConfig;
pub use error::{ClockError, Error, Result};
