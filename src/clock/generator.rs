//! Thread-safe version id generator.
//!
//! Every call to [`VersionClock::next_id`] runs inside a single critical
//! section, including the spin that waits out an exhausted sequence, so ids
//! are strictly increasing in lock acquisition order.

use std::sync::{Arc, OnceLock};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use crate::clock::layout::VersionLayout;
use crate::clock::source::{SystemTimeSource, TimeSource};
use crate::clock::version::VersionId;
use crate::error::ClockError;

/// Construction options for a [`VersionClock`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClockOptions {
    pub layout: VersionLayout,
    /// Discriminator embedded in every id, must fit `layout.node_bits`
    pub node_id: u64,
    /// Largest backward jump that is waited out instead of rejected.
    /// Zero rejects every regression.
    pub max_backward_drift_millis: u64,
}

struct ClockState {
    last_timestamp: u64,
    sequence: u64,
}

/// Snowflake-style logical clock owned by one registry node.
pub struct VersionClock {
    source: Arc<dyn TimeSource>,
    layout: VersionLayout,
    node_id: u64,
    max_backward_drift: u64,
    state: Mutex<ClockState>,
}

impl VersionClock {
    /// Creates a clock over the system time with the default layout.
    pub fn new() -> Self {
        VersionClock {
            source: Arc::new(SystemTimeSource),
            layout: VersionLayout::default(),
            node_id: 0,
            max_backward_drift: 0,
            state: Mutex::new(ClockState {
                last_timestamp: 0,
                sequence: 0,
            }),
        }
    }

    pub fn with_options(options: ClockOptions) -> Result<Self, ClockError> {
        Self::with_source(Arc::new(SystemTimeSource), options)
    }

    /// Creates a clock sampling `source`, validating the layout and node id.
    pub fn with_source(
        source: Arc<dyn TimeSource>,
        options: ClockOptions,
    ) -> Result<Self, ClockError> {
        options.layout.validate()?;
        if options.node_id > options.layout.max_node_id() {
            return Err(ClockError::NodeIdOutOfRange {
                node_id: options.node_id,
                max: options.layout.max_node_id(),
            });
        }

        Ok(VersionClock {
            source,
            layout: options.layout,
            node_id: options.node_id,
            max_backward_drift: options.max_backward_drift_millis,
            state: Mutex::new(ClockState {
                last_timestamp: 0,
                sequence: 0,
            }),
        })
    }

    /// Process-wide clock with the default layout.
    ///
    /// Prefer passing an explicit clock around; this exists for call sites
    /// that have no handle to thread through.
    pub fn global() -> &'static VersionClock {
        static GLOBAL: OnceLock<VersionClock> = OnceLock::new();
        GLOBAL.get_or_init(VersionClock::new)
    }

    /// Issues the next version id.
    pub fn next_id(&self) -> Result<VersionId, ClockError> {
        let mut state = self.state.lock();
        let mut now = self.source.now_millis();

        if now < state.last_timestamp {
            let behind = state.last_timestamp - now;
            if behind > self.max_backward_drift {
                error!(
                    last = state.last_timestamp,
                    now, behind, "clock moved backwards, refusing to issue version id"
                );
                return Err(ClockError::Regression {
                    last: state.last_timestamp,
                    now,
                });
            }
            warn!(behind, "clock moved backwards, waiting for it to catch up");
            now = self.until_next_millis(state.last_timestamp - 1);
        }

        if now < self.layout.epoch_millis {
            return Err(ClockError::BeforeEpoch {
                now,
                epoch: self.layout.epoch_millis,
            });
        }

        if now == state.last_timestamp {
            state.sequence = (state.sequence + 1) & self.layout.sequence_mask();
            if state.sequence == 0 {
                now = self.until_next_millis(state.last_timestamp);
            }
        } else {
            state.sequence = 0;
        }

        state.last_timestamp = now;
        Ok(self.layout.encode(now, self.node_id, state.sequence))
    }

    /// Decodes the wall-clock millisecond an id was issued at.
    ///
    /// Diagnostics only; order ids by comparing them directly.
    pub fn real_timestamp(&self, id: VersionId) -> u64 {
        self.layout.real_timestamp(id)
    }

    /// Spins until the source reads strictly later than `reference`.
    pub fn until_next_millis(&self, reference: u64) -> u64 {
        let mut now = self.source.now_millis();
        while now <= reference {
            std::hint::spin_loop();
            now = self.source.now_millis();
        }
        now
    }

    pub fn layout(&self) -> VersionLayout {
        self.layout
    }

    pub fn node_id(&self) -> u64 {
        self.node_id
    }

    /// Millisecond of the most recently issued id, 0 before the first one.
    pub fn last_timestamp(&self) -> u64 {
        self.state.lock().last_timestamp
    }
}

impl Default for VersionClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::layout::DEFAULT_EPOCH_MILLIS;
    use crate::clock::source::ManualTimeSource;
    use std::collections::VecDeque;

    const T0: u64 = DEFAULT_EPOCH_MILLIS + 1_000_000;

    /// Replays fixed readings, then repeats the last one forever.
    struct ScriptedSource {
        readings: parking_lot::Mutex<VecDeque<u64>>,
    }

    impl ScriptedSource {
        fn new(readings: &[u64]) -> Arc<Self> {
            Arc::new(ScriptedSource {
                readings: parking_lot::Mutex::new(readings.iter().copied().collect()),
            })
        }
    }

    impl TimeSource for ScriptedSource {
        fn now_millis(&self) -> u64 {
            let mut readings = self.readings.lock();
            if readings.len() > 1 {
                readings.pop_front().unwrap()
            } else {
                readings[0]
            }
        }
    }

    fn manual_clock(source: &ManualTimeSource, options: ClockOptions) -> VersionClock {
        VersionClock::with_source(Arc::new(source.clone()), options).unwrap()
    }

    #[test]
    fn test_same_millisecond_increments_sequence() {
        let source = ManualTimeSource::new(T0);
        let clock = manual_clock(&source, ClockOptions::default());
        let layout = clock.layout();

        let first = clock.next_id().unwrap();
        let second = clock.next_id().unwrap();

        assert!(first < second);
        assert_eq!(layout.sequence_of(first), 0);
        assert_eq!(layout.sequence_of(second), 1);
        assert_eq!(clock.real_timestamp(second), T0);
    }

    #[test]
    fn test_new_millisecond_resets_sequence() {
        let source = ManualTimeSource::new(T0);
        let clock = manual_clock(&source, ClockOptions::default());

        clock.next_id().unwrap();
        clock.next_id().unwrap();
        source.advance(1);
        let id = clock.next_id().unwrap();

        assert_eq!(clock.layout().sequence_of(id), 0);
        assert_eq!(clock.real_timestamp(id), T0 + 1);
        assert_eq!(clock.last_timestamp(), T0 + 1);
    }

    #[test]
    fn test_exhausted_sequence_waits_for_next_millisecond() {
        // Two sequence bits: four ids fit in one millisecond.
        let options = ClockOptions {
            layout: VersionLayout {
                sequence_bits: 2,
                ..VersionLayout::default()
            },
            ..ClockOptions::default()
        };
        let source = ScriptedSource::new(&[T0, T0, T0, T0, T0, T0, T0, T0 + 1]);
        let clock = VersionClock::with_source(source, options).unwrap();

        let ids: Vec<_> = (0..5).map(|_| clock.next_id().unwrap()).collect();

        for pair in ids.windows(2) {
            assert!(pair[0] < pair[1]);
        }
        assert_eq!(clock.real_timestamp(ids[3]), T0);
        assert_eq!(clock.real_timestamp(ids[4]), T0 + 1);
        assert_eq!(clock.layout().sequence_of(ids[4]), 0);
    }

    #[test]
    fn test_regression_is_rejected_by_default() {
        let source = ManualTimeSource::new(T0);
        let clock = manual_clock(&source, ClockOptions::default());

        clock.next_id().unwrap();
        source.set(T0 - 5);

        assert_eq!(
            clock.next_id(),
            Err(ClockError::Regression {
                last: T0,
                now: T0 - 5
            })
        );
        // The failed call must not disturb the state.
        assert_eq!(clock.last_timestamp(), T0);
    }

    #[test]
    fn test_small_regression_is_waited_out() {
        let options = ClockOptions {
            max_backward_drift_millis: 10,
            ..ClockOptions::default()
        };
        let source = ScriptedSource::new(&[T0, T0 - 3, T0 - 2, T0 - 1, T0 + 1]);
        let clock = VersionClock::with_source(source, options).unwrap();

        let first = clock.next_id().unwrap();
        let second = clock.next_id().unwrap();

        assert!(first < second);
        assert_eq!(clock.real_timestamp(second), T0 + 1);
    }

    #[test]
    fn test_regression_beyond_drift_is_rejected() {
        let options = ClockOptions {
            max_backward_drift_millis: 10,
            ..ClockOptions::default()
        };
        let source = ManualTimeSource::new(T0);
        let clock = manual_clock(&source, options);

        let first = clock.next_id().unwrap();
        source.set(T0 - 11);

        assert_eq!(
            clock.next_id(),
            Err(ClockError::Regression {
                last: T0,
                now: T0 - 11
            })
        );

        source.set(T0 + 1);
        let next = clock.next_id().unwrap();
        assert!(next > first);
    }

    #[test]
    fn test_regression_landing_on_last_millisecond_continues_sequence() {
        let options = ClockOptions {
            max_backward_drift_millis: 10,
            ..ClockOptions::default()
        };
        let source = ScriptedSource::new(&[T0, T0 - 1, T0]);
        let clock = VersionClock::with_source(source, options).unwrap();

        let first = clock.next_id().unwrap();
        let second = clock.next_id().unwrap();

        assert!(first < second);
        assert_eq!(clock.layout().sequence_of(second), 1);
    }

    #[test]
    fn test_before_epoch_is_rejected() {
        let source = ManualTimeSource::new(DEFAULT_EPOCH_MILLIS - 1);
        let clock = manual_clock(&source, ClockOptions::default());
        assert!(matches!(
            clock.next_id(),
            Err(ClockError::BeforeEpoch { .. })
        ));
    }

    #[test]
    fn test_node_id_distinguishes_clocks() {
        let source = ManualTimeSource::new(T0);
        let layout = VersionLayout::with_node_bits(4);
        let a = manual_clock(
            &source,
            ClockOptions {
                layout,
                node_id: 1,
                ..ClockOptions::default()
            },
        );
        let b = manual_clock(
            &source,
            ClockOptions {
                layout,
                node_id: 2,
                ..ClockOptions::default()
            },
        );

        let id_a = a.next_id().unwrap();
        let id_b = b.next_id().unwrap();

        assert_ne!(id_a, id_b);
        assert_eq!(layout.node_of(id_a), 1);
        assert_eq!(layout.node_of(id_b), 2);
        assert_eq!(a.real_timestamp(id_a), b.real_timestamp(id_b));
    }

    #[test]
    fn test_node_id_out_of_range() {
        let result = VersionClock::with_options(ClockOptions {
            layout: VersionLayout::with_node_bits(2),
            node_id: 4,
            ..ClockOptions::default()
        });
        assert!(matches!(
            result,
            Err(ClockError::NodeIdOutOfRange { node_id: 4, max: 3 })
        ));
    }

    #[test]
    fn test_until_next_millis_with_stepping_source() {
        let source = ManualTimeSource::with_step(T0, 1);
        let clock = manual_clock(&source, ClockOptions::default());
        assert_eq!(clock.until_next_millis(T0 + 10), T0 + 11);
    }

    #[test]
    fn test_global_clock_is_shared() {
        let a = VersionClock::global().next_id().unwrap();
        let b = VersionClock::global().next_id().unwrap();
        assert!(a < b);
    }
}
