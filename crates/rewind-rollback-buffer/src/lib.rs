//! Rewind Rollback Buffer - Bounded state history for predicted bodies
//!
//! This crate provides the history every predicted body owns: a small,
//! timestamp-sorted collection of recorded states.
//!
//! # Features
//!
//! - **Bounded memory**: never holds more than `capacity` states
//! - **Sorted by time**: binary-search insertion, out-of-order inserts land in place
//! - **No duplicates**: a second state at an existing timestamp is rejected
//! - **Automatic eviction**: the oldest state (by time) is evicted when full
//! - **No silent drops**: a state older than everything in a full buffer is rejected
//!
//! # Example
//!
//! ```rust
//! use rewind_core::{Quat, StateHistory, TimedState, Vec3};
//! use rewind_rollback_buffer::HistoryBuffer;
//!
//! // 32 states at a 50ms record interval = 1.6 seconds of history
//! let mut buffer = HistoryBuffer::new(32);
//!
//! let at = |t: f64, x: f32| TimedState::new(t, Vec3::new(x, 0.0, 0.0), Quat::IDENTITY, Vec3::ZERO);
//! buffer.insert(at(0.00, 0.0)).unwrap();
//! buffer.insert(at(0.05, 0.5)).unwrap();
//! buffer.insert(at(0.10, 1.0)).unwrap();
//!
//! // Same timestamp twice is rejected
//! assert!(buffer.insert(at(0.05, 9.0)).is_err());
//!
//! // Bracketing pair for sampling
//! let neighbors = buffer.neighbors(0.07).unwrap();
//! assert_eq!(neighbors.before.timestamp, 0.05);
//! assert_eq!(neighbors.after.timestamp, 0.10);
//! ```

use rewind_core::{Error, Neighbors, Result, StateHistory, TimedState, Timestamp};
use std::collections::VecDeque;

/// A bounded history of recorded states, sorted by timestamp
///
/// Sized for a few dozen entries: every operation is at most linear in the
/// capacity.
#[derive(Debug, Clone)]
pub struct HistoryBuffer {
    /// Stored states, oldest first
    states: VecDeque<TimedState>,
    /// Capacity (max states)
    capacity: usize,
}

impl HistoryBuffer {
    /// Create a new history buffer with the given capacity
    ///
    /// # Arguments
    ///
    /// * `capacity` - Maximum number of states to store (typically 32)
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero. Validate user-supplied capacities
    /// beforehand (the netcode config does).
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "Capacity must be greater than 0");
        Self {
            states: VecDeque::with_capacity(capacity + 1),
            capacity,
        }
    }

    /// Get all stored states (oldest to newest)
    pub fn iter(&self) -> impl Iterator<Item = &TimedState> {
        self.states.iter()
    }

    /// Index of the state recorded exactly at `timestamp`
    pub fn position(&self, timestamp: Timestamp) -> Option<usize> {
        let index = self.states.partition_point(|s| s.timestamp < timestamp);
        self.states
            .get(index)
            .filter(|s| s.timestamp == timestamp)
            .map(|_| index)
    }

    /// Get statistics about the buffer
    pub fn stats(&self) -> BufferStats {
        let (oldest, newest) = self.time_range().unwrap_or((0.0, 0.0));
        BufferStats {
            capacity: self.capacity,
            count: self.states.len(),
            oldest_timestamp: oldest,
            newest_timestamp: newest,
        }
    }
}

impl StateHistory for HistoryBuffer {
    fn insert(&mut self, state: TimedState) -> Result<()> {
        if !state.timestamp.is_finite() {
            return Err(Error::NonFiniteTimestamp(state.timestamp));
        }

        let index = self
            .states
            .partition_point(|s| s.timestamp < state.timestamp);
        if matches!(self.states.get(index), Some(s) if s.timestamp == state.timestamp) {
            return Err(Error::DuplicateTimestamp {
                timestamp: state.timestamp,
            });
        }

        if index == 0 && self.states.len() >= self.capacity {
            // it would be the one evicted
            return Err(Error::TooOld {
                timestamp: state.timestamp,
                oldest: self.states[0].timestamp,
            });
        }

        self.states.insert(index, state);
        if self.states.len() > self.capacity {
            self.states.pop_front();
        }
        Ok(())
    }

    fn get(&self, index: usize) -> Option<&TimedState> {
        self.states.get(index)
    }

    fn truncate_from(&mut self, index: usize) {
        self.states.truncate(index);
    }

    fn clear(&mut self) {
        self.states.clear();
    }

    fn capacity(&self) -> Option<usize> {
        Some(self.capacity)
    }

    fn len(&self) -> usize {
        self.states.len()
    }

    fn oldest(&self) -> Option<&TimedState> {
        self.states.front()
    }

    fn newest(&self) -> Option<&TimedState> {
        self.states.back()
    }

    fn neighbors(&self, timestamp: Timestamp) -> Option<Neighbors> {
        let (oldest, newest) = self.time_range()?;
        if self.states.len() < 2 || !(timestamp >= oldest && timestamp <= newest) {
            return None;
        }

        let after_index = self
            .states
            .partition_point(|s| s.timestamp <= timestamp)
            .clamp(1, self.states.len() - 1);

        Some(Neighbors {
            before: self.states[after_index - 1],
            after: self.states[after_index],
            after_index,
        })
    }
}

impl Default for HistoryBuffer {
    fn default() -> Self {
        Self::new(32) // 1.6 seconds at the default 50ms record interval
    }
}

/// Statistics about the history buffer
#[derive(Debug, Clone, Copy)]
pub struct BufferStats {
    /// Maximum capacity
    pub capacity: usize,
    /// Current number of stored states
    pub count: usize,
    /// Oldest timestamp in the buffer
    pub oldest_timestamp: Timestamp,
    /// Newest timestamp in the buffer
    pub newest_timestamp: Timestamp,
}

impl BufferStats {
    /// Get the covered time span (newest - oldest)
    pub fn span(&self) -> Timestamp {
        if self.count == 0 {
            0.0
        } else {
            self.newest_timestamp - self.oldest_timestamp
        }
    }

    /// Get the fill percentage (0.0 to 1.0)
    pub fn fill_ratio(&self) -> f32 {
        self.count as f32 / self.capacity as f32
    }
}


#[cfg(test)]
mod prop_tests {
    use super::*;
    use proptest::prelude::*;
    use rewind_core::{Quat, Vec3};

    fn arb_timestamps() -> impl Strategy<Value = Vec<f64>> {
        // coarse grid so duplicates actually happen
        prop::collection::vec((0u32..200).prop_map(|t| t as f64 * 0.05), 0..120)
    }

    proptest! {
        #[test]
        fn length_never_exceeds_capacity(capacity in 1usize..40, stamps in arb_timestamps()) {
            let mut buffer = HistoryBuffer::new(capacity);
            for t in stamps {
                let _ = buffer.insert(TimedState::new(t, Vec3::ZERO, Quat::IDENTITY, Vec3::ZERO));
                prop_assert!(buffer.len() <= capacity);
            }
        }

        #[test]
        fn timestamps_strictly_increasing(capacity in 1usize..40, stamps in arb_timestamps()) {
            let mut buffer = HistoryBuffer::new(capacity);
            for t in stamps {
                let _ = buffer.insert(TimedState::new(t, Vec3::ZERO, Quat::IDENTITY, Vec3::ZERO));
                let stored: Vec<f64> = buffer.iter().map(|s| s.timestamp).collect();
                prop_assert!(stored.windows(2).all(|w| w[0] < w[1]), "not strictly increasing: {:?}", stored);
            }
        }

        #[test]
        fn duplicate_insert_leaves_history_unchanged(stamps in arb_timestamps(), pick in any::<prop::sample::Index>()) {
            let mut buffer = HistoryBuffer::new(64);
            for t in &stamps {
                let _ = buffer.insert(TimedState::new(*t, Vec3::ZERO, Quat::IDENTITY, Vec3::ZERO));
            }
            prop_assume!(!buffer.is_empty());

            let existing = *buffer.get(pick.index(buffer.len())).unwrap();
            let before: Vec<TimedState> = buffer.iter().copied().collect();
            let result = buffer.insert(TimedState::new(existing.timestamp, Vec3::ONE, Quat::IDENTITY, Vec3::ONE));

            prop_assert!(result.is_err());
            prop_assert_eq!(before, buffer.iter().copied().collect::<Vec<_>>());
        }

        #[test]
        fn ok_insert_is_stored(capacity in 1usize..40, stamps in arb_timestamps()) {
            let mut buffer = HistoryBuffer::new(capacity);
            for t in stamps {
                if buffer.insert(TimedState::new(t, Vec3::ZERO, Quat::IDENTITY, Vec3::ZERO)).is_ok() {
                    prop_assert!(buffer.position(t).is_some(), "accepted {} but not stored", t);
                }
            }
        }

        #[test]
        fn neighbors_bracket_the_query(stamps in arb_timestamps(), query in 0.0f64..10.0) {
            let mut buffer = HistoryBuffer::new(64);
            for t in stamps {
                let _ = buffer.insert(TimedState::new(t, Vec3::ZERO, Quat::IDENTITY, Vec3::ZERO));
            }

            match buffer.neighbors(query) {
                Some(n) => {
                    prop_assert!(n.before.timestamp <= query && query <= n.after.timestamp);
                    prop_assert_eq!(buffer.get(n.after_index).map(|s| s.timestamp), Some(n.after.timestamp));
                    prop_assert_eq!(buffer.get(n.after_index - 1).map(|s| s.timestamp), Some(n.before.timestamp));
                }
                None => {
                    let inside = buffer
                        .time_range()
                        .map_or(false, |(lo, hi)| buffer.len() >= 2 && lo <= query && query <= hi);
                    prop_assert!(!inside);
                }
            }
        }
    }
}
