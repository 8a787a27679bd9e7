//! State history trait for storing and querying recorded body states
//!
//! This trait is used by:
//! - `rewind-rollback-buffer` for the bounded, sorted history every predicted body owns
//! - `rewind-netcode` for recording, sampling and reconciliation
//!
//! Entries are ordered by timestamp, strictly increasing, and addressed by
//! index (`0` is the oldest).
//!
//! # Example
//!
//! ```rust,ignore
//! use rewind_core::{StateHistory, TimedState};
//!
//! struct MyHistory {
//!     states: Vec<TimedState>,
//! }
//!
//! impl StateHistory for MyHistory {
//!     fn insert(&mut self, state: TimedState) -> rewind_core::Result<()> {
//!         // keep `states` sorted, reject duplicates
//!     }
//!
//!     fn get(&self, index: usize) -> Option<&TimedState> {
//!         self.states.get(index)
//!     }
//!
//!     // ... other methods
//! }
//! ```

use crate::{Result, TimedState, Timestamp};

/// The tightest pair of recorded states around a timestamp
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbors {
    /// Latest state with `timestamp <= t`
    pub before: TimedState,
    /// Following state, `timestamp >= t`
    pub after: TimedState,
    /// Index of `after` in the history
    pub after_index: usize,
}

/// Trait for storing and retrieving recorded body states.
///
/// Implementations choose the storage; the ordering and uniqueness
/// guarantees are part of the contract:
/// - timestamps are strictly increasing by index
/// - no two entries share a timestamp
/// - `len() <= capacity()` when bounded, evicting the oldest entry first
pub trait StateHistory {
    /// Insert a state, keeping timestamp order.
    ///
    /// Fails with `DuplicateTimestamp` if a state with the same timestamp is
    /// already stored; the history is left unchanged in that case.
    fn insert(&mut self, state: TimedState) -> Result<()>;

    /// Get the state at the given index (`0` is the oldest).
    fn get(&self, index: usize) -> Option<&TimedState>;

    /// Remove every state at or after `index`.
    fn truncate_from(&mut self, index: usize);

    /// Clear all stored states.
    fn clear(&mut self);

    /// Get the capacity of this history.
    ///
    /// Returns `None` for unbounded histories.
    fn capacity(&self) -> Option<usize>;

    /// Get the number of states currently stored.
    fn len(&self) -> usize;

    /// Check if the history is empty.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The oldest stored state.
    fn oldest(&self) -> Option<&TimedState> {
        self.get(0)
    }

    /// The newest stored state.
    fn newest(&self) -> Option<&TimedState> {
        self.len().checked_sub(1).and_then(|index| self.get(index))
    }

    /// Empty the history and store exactly `state`.
    fn clear_and_seed(&mut self, state: TimedState) {
        self.clear();
        // an empty history has nothing to collide with
        let _ = self.insert(state);
    }

    /// Get the bracketing pair around `timestamp`.
    ///
    /// Returns `None` with fewer than two states, or when `timestamp` lies
    /// outside `[oldest, newest]`. When `timestamp` equals the newest
    /// timestamp the pair is the last two entries.
    fn neighbors(&self, timestamp: Timestamp) -> Option<Neighbors> {
        let len = self.len();
        if len < 2 {
            return None;
        }
        let (oldest, newest) = self.time_range()?;
        // written so that NaN falls outside
        if !(timestamp >= oldest && timestamp <= newest) {
            return None;
        }

        // first index with a timestamp strictly after `timestamp`
        let (mut lo, mut hi) = (0, len);
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            if self.get(mid)?.timestamp <= timestamp {
                lo = mid + 1;
            } else {
                hi = mid;
            }
        }
        let after_index = lo.clamp(1, len - 1);

        Some(Neighbors {
            before: *self.get(after_index - 1)?,
            after: *self.get(after_index)?,
            after_index,
        })
    }

    /// Get the timestamp range of stored states.
    ///
    /// Returns `None` if no states are stored.
    /// Returns `Some((oldest, newest))` otherwise.
    fn time_range(&self) -> Option<(Timestamp, Timestamp)> {
        Some((self.oldest()?.timestamp, self.newest()?.timestamp))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use glam::{Quat, Vec3};

    // Unbounded sorted vector relying on the provided methods
    struct SimpleHistory {
        states: Vec<TimedState>,
    }

    impl SimpleHistory {
        fn new() -> Self {
            Self { states: Vec::new() }
        }
    }

    impl StateHistory for SimpleHistory {
        fn insert(&mut self, state: TimedState) -> Result<()> {
            if self.states.iter().any(|s| s.timestamp == state.timestamp) {
                return Err(Error::DuplicateTimestamp {
                    timestamp: state.timestamp,
                });
            }
            self.states.push(state);
            self.states
                .sort_by(|a, b| a.timestamp.total_cmp(&b.timestamp));
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
            None
        }

        fn len(&self) -> usize {
            self.states.len()
        }
    }

    fn state(timestamp: f64) -> TimedState {
        TimedState::new(
            timestamp,
            Vec3::new(timestamp as f32, 0.0, 0.0),
            Quat::IDENTITY,
            Vec3::ZERO,
        )
    }

    fn history(timestamps: &[f64]) -> SimpleHistory {
        let mut history = SimpleHistory::new();
        for t in timestamps {
            history.insert(state(*t)).unwrap();
        }
        history
    }

    #[test]
    fn test_oldest_and_newest() {
        let history = history(&[20.0, 10.0, 30.0]);
        assert_eq!(history.oldest().unwrap().timestamp, 10.0);
        assert_eq!(history.newest().unwrap().timestamp, 30.0);
        assert_eq!(history.time_range(), Some((10.0, 30.0)));

        let empty = SimpleHistory::new();
        assert!(empty.oldest().is_none());
        assert!(empty.newest().is_none());
        assert!(empty.time_range().is_none());
    }

    #[test]
    fn test_neighbors_inside() {
        let history = history(&[10.0, 20.0, 30.0]);

        let n = history.neighbors(25.0).unwrap();
        assert_eq!(n.before.timestamp, 20.0);
        assert_eq!(n.after.timestamp, 30.0);
        assert_eq!(n.after_index, 2);

        let n = history.neighbors(11.0).unwrap();
        assert_eq!(n.before.timestamp, 10.0);
        assert_eq!(n.after_index, 1);
    }

    #[test]
    fn test_neighbors_on_entries() {
        let history = history(&[10.0, 20.0, 30.0]);

        let n = history.neighbors(10.0).unwrap();
        assert_eq!((n.before.timestamp, n.after.timestamp), (10.0, 20.0));

        let n = history.neighbors(20.0).unwrap();
        assert_eq!((n.before.timestamp, n.after.timestamp), (20.0, 30.0));

        let n = history.neighbors(30.0).unwrap();
        assert_eq!((n.before.timestamp, n.after.timestamp), (20.0, 30.0));
        assert_eq!(n.after_index, 2);
    }

    #[test]
    fn test_neighbors_outside() {
        let history = history(&[10.0, 20.0]);
        assert!(history.neighbors(9.0).is_none());
        assert!(history.neighbors(21.0).is_none());
        assert!(history.neighbors(f64::NAN).is_none());

        let single = self::history(&[10.0]);
        assert!(single.neighbors(10.0).is_none());
    }

    #[test]
    fn test_clear_and_seed() {
        let mut history = history(&[1.0, 2.0, 3.0]);
        history.clear_and_seed(state(0.5));
        assert_eq!(history.len(), 1);
        assert_eq!(history.oldest().unwrap().timestamp, 0.5);
    }

    #[test]
    fn test_truncate_from() {
        let mut history = history(&[1.0, 2.0, 3.0, 4.0]);
        history.truncate_from(2);
        assert_eq!(history.len(), 2);
        assert_eq!(history.newest().unwrap().timestamp, 2.0);
    }
}
