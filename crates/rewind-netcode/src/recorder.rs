//! State recording
//!
//! Samples the live body into history at a fixed interval. Recording is
//! best effort: a skipped or rejected sample is never an error.

use crate::{ReconcileConfig, SimulatedBody};
use rewind_core::{StateHistory, TimedState, Timestamp};
use tracing::trace;

/// Slack on the record interval so ticks spaced exactly one interval apart
/// are not lost to accumulated float error
const INTERVAL_EPSILON: f64 = 1e-9;

/// Decides when the live body is written into history
///
/// Keeps a copy of the most recently recorded state so deltas and change
/// checks never need to search the history.
#[derive(Debug, Clone)]
pub struct Recorder {
    record_interval: f64,
    only_record_changes: bool,
    position_sensitivity: f32,
    rotation_sensitivity: f32,
    velocity_sensitivity: f32,
    /// Predicted time of the last insertion
    last_record_time: Option<Timestamp>,
    last_recorded: Option<TimedState>,
}

impl Recorder {
    /// Create a recorder from the recording part of `config`
    pub fn new(config: &ReconcileConfig) -> Self {
        Self {
            record_interval: config.record_interval,
            only_record_changes: config.only_record_changes,
            position_sensitivity: config.record_position_sensitivity,
            rotation_sensitivity: config.record_rotation_sensitivity,
            velocity_sensitivity: config.record_velocity_sensitivity,
            last_record_time: None,
            last_recorded: None,
        }
    }

    /// Record the body if the record interval has elapsed
    ///
    /// Called once per fixed tick. Returns whether a state was inserted.
    pub fn maybe_record<B, H>(&mut self, history: &mut H, body: &B, now: Timestamp) -> bool
    where
        B: SimulatedBody + ?Sized,
        H: StateHistory + ?Sized,
    {
        if let Some(last) = self.last_record_time {
            if now + INTERVAL_EPSILON < last + self.record_interval {
                return false;
            }
        }
        self.record(history, body, now)
    }

    /// Record the body now, ignoring the record interval
    ///
    /// Still skips a second state for the same timestamp, and unchanged
    /// bodies when only changes are recorded.
    pub fn record<B, H>(&mut self, history: &mut H, body: &B, now: Timestamp) -> bool
    where
        B: SimulatedBody + ?Sized,
        H: StateHistory + ?Sized,
    {
        let (position, rotation) = body.pose();
        let velocity = body.velocity();

        if let Some(last) = &self.last_recorded {
            // same tick fired twice
            if last.timestamp == now {
                return false;
            }

            // Not exact: a body that comes back to its last recorded pose
            // in between is treated as idle.
            if self.only_record_changes
                && last.position_distance(position) < self.position_sensitivity
                && last.rotation_angle_degrees(rotation) < self.rotation_sensitivity
                && last.velocity.distance(velocity) < self.velocity_sensitivity
            {
                return false;
            }
        }

        let state = TimedState::following(
            self.last_recorded.as_ref(),
            now,
            position,
            rotation,
            velocity,
        );
        match history.insert(state) {
            Ok(()) => {
                self.last_recorded = Some(state);
                self.last_record_time = Some(now);
                true
            }
            Err(err) => {
                trace!("state at {} not recorded: {}", now, err);
                false
            }
        }
    }

    /// Continue recording from `state`
    ///
    /// Used after a correction rewrote or reseeded history.
    pub fn reset_to(&mut self, state: TimedState) {
        self.last_recorded = Some(state);
    }

    /// The most recently recorded state
    pub fn last_recorded(&self) -> Option<&TimedState> {
        self.last_recorded.as_ref()
    }

    /// Predicted time of the last insertion
    pub fn last_record_time(&self) -> Option<Timestamp> {
        self.last_record_time
    }

    /// Forget everything recorded so far
    pub fn reset(&mut self) {
        self.last_record_time = None;
        self.last_recorded = None;
    }
}
