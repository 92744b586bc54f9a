//! Logical clock used to version registry records.
//!
//! This module contains the Snowflake-style [`VersionClock`] together with the
//! id layout, the id newtype and the wall-clock abstraction it samples.

pub mod generator;
pub mod layout;
pub mod source;
pub mod version;

pub use generator::{ClockOptions, VersionClock};
pub use layout::{DEFAULT_EPOCH_MILLIS, DEFAULT_SEQUENCE_BITS, VersionLayout};
pub use source::{ManualTimeSource, SystemTimeSource, TimeSource};
pub use version::VersionId;
