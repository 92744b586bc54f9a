//! The version id stamped on every registry mutation.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::clock::layout::VersionLayout;

/// An opaque, totally ordered version identifier.
///
/// Ids are compared with plain integer ordering. The embedded timestamp is for
/// diagnostics only and must never replace a direct comparison of two ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VersionId(u64);

impl VersionId {
    /// Rebuilds an id read back from storage or the wire.
    pub fn from_raw(raw: u64) -> Self {
        VersionId(raw)
    }

    pub fn as_u64(self) -> u64 {
        self.0
    }

    /// Decodes the issue time under `layout`, for log output.
    pub fn real_time(self, layout: &VersionLayout) -> Option<DateTime<Utc>> {
        let millis = i64::try_from(layout.real_timestamp(self)).ok()?;
        DateTime::from_timestamp_millis(millis)
    }
}

impl fmt::Display for VersionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<VersionId> for u64 {
    fn from(id: VersionId) -> Self {
        id.0
    }
}
