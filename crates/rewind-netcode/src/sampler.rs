//! Sampling recorded history at arbitrary instants

use rewind_core::{Error, Neighbors, StateHistory, TimedState, Timestamp};

/// Interpolate the recorded state at `timestamp`
///
/// Fails with `OutOfRange` when `timestamp` is not inside the recorded range
/// or fewer than two states are stored.
///
/// # Example
///
/// ```
/// use rewind_core::{Quat, StateHistory, TimedState, Vec3};
/// use rewind_netcode::sample;
/// use rewind_rollback_buffer::HistoryBuffer;
///
/// let mut history = HistoryBuffer::new(8);
/// history.insert(TimedState::new(0.0, Vec3::ZERO, Quat::IDENTITY, Vec3::ZERO)).unwrap();
/// history.insert(TimedState::new(1.0, Vec3::new(10.0, 0.0, 0.0), Quat::IDENTITY, Vec3::ZERO)).unwrap();
///
/// let mid = sample(&history, 0.5).unwrap();
/// assert_eq!(mid.position, Vec3::new(5.0, 0.0, 0.0));
/// assert!(sample(&history, 2.0).is_err());
/// ```
pub fn sample<H>(history: &H, timestamp: Timestamp) -> rewind_core::Result<TimedState>
where
    H: StateHistory + ?Sized,
{
    let neighbors = history.neighbors(timestamp).ok_or_else(|| Error::OutOfRange {
        timestamp,
        range: history.time_range().filter(|_| history.len() >= 2),
    })?;

    Ok(interpolate_neighbors(&neighbors, timestamp))
}

/// Interpolate inside an already found bracketing pair
pub fn interpolate_neighbors(neighbors: &Neighbors, timestamp: Timestamp) -> TimedState {
    let (before, after) = (&neighbors.before, &neighbors.after);
    let span = after.timestamp - before.timestamp;
    if span == 0.0 {
        return *before;
    }

    let t = ((timestamp - before.timestamp) / span).clamp(0.0, 1.0);
    TimedState::interpolate(before, after, t)
}
