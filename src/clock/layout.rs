//! Bit layout of a version id.
//!
//! ```text
//! | timestamp - epoch | node (node_bits) | sequence (sequence_bits) |
//! ```
//!
//! With `node_bits = 0` the layout is the plain `(ts - epoch) << seq | seq`
//! format registry records have always carried.

use serde::{Deserialize, Serialize};

use crate::clock::version::VersionId;
use crate::error::LayoutError;

/// 2018-01-01T00:00:00+08:00
pub const DEFAULT_EPOCH_MILLIS: u64 = 1_514_736_000_000;
pub const DEFAULT_SEQUENCE_BITS: u8 = 12;

/// Node and sequence fields together may not eat more than this, leaving at
/// least 41 bits (about 69 years) for the timestamp.
const MAX_LOW_BITS: u8 = 22;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VersionLayout {
    /// Custom epoch in Unix milliseconds
    pub epoch_millis: u64,
    /// Width of the node discriminator, 0 disables it
    pub node_bits: u8,
    /// Width of the per-millisecond sequence counter
    pub sequence_bits: u8,
}

impl Default for VersionLayout {
    fn default() -> Self {
        VersionLayout {
            epoch_millis: DEFAULT_EPOCH_MILLIS,
            node_bits: 0,
            sequence_bits: DEFAULT_SEQUENCE_BITS,
        }
    }
}

impl VersionLayout {
    /// Layout with a node discriminator of `node_bits` width.
    pub fn with_node_bits(node_bits: u8) -> Self {
        VersionLayout {
            node_bits,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), LayoutError> {
        if self.sequence_bits == 0 {
            return Err(LayoutError::EmptySequence);
        }
        let low = self.node_bits as u16 + self.sequence_bits as u16;
        if low > MAX_LOW_BITS as u16 {
            return Err(LayoutError::TooManyLowBits {
                node_bits: self.node_bits,
                sequence_bits: self.sequence_bits,
                max: MAX_LOW_BITS,
            });
        }
        Ok(())
    }

    fn timestamp_shift(&self) -> u8 {
        self.node_bits + self.sequence_bits
    }

    pub fn sequence_mask(&self) -> u64 {
        (1u64 << self.sequence_bits) - 1
    }

    pub fn max_node_id(&self) -> u64 {
        (1u64 << self.node_bits) - 1
    }

    /// Packs the fields. Callers guarantee `timestamp >= epoch`, the node id
    /// fits `node_bits` and the sequence fits `sequence_bits`.
    pub(crate) fn encode(&self, timestamp: u64, node_id: u64, sequence: u64) -> VersionId {
        let elapsed = timestamp - self.epoch_millis;
        VersionId::from_raw(
            (elapsed << self.timestamp_shift()) | (node_id << self.sequence_bits) | sequence,
        )
    }

    /// Wall-clock milliseconds the id was issued at.
    pub fn real_timestamp(&self, id: VersionId) -> u64 {
        (id.as_u64() >> self.timestamp_shift()) + self.epoch_millis
    }

    pub fn node_of(&self, id: VersionId) -> u64 {
        (id.as_u64() >> self.sequence_bits) & self.max_node_id()
    }

    pub fn sequence_of(&self, id: VersionId) -> u64 {
        id.as_u64() & self.sequence_mask()
    }
}
