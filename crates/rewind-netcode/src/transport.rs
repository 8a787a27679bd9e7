//! Transport boundary
//!
//! Framing and delivery belong to the host's network stack. This module
//! covers what crosses it: the authority's outgoing body state, how often to
//! send it, and how a received timestamp is moved into predicted time.

use crate::SimulatedBody;
use rewind_core::{AuthoritativeSnapshot, Quat, Timestamp, Vec3};
use serde::{Deserialize, Serialize};

/// Body state sent by the authority
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OutgoingState {
    pub position: Vec3,
    pub rotation: Quat,
    pub velocity: Vec3,
    /// Seconds since the previous send (zero for the first one)
    pub dt_since_last_send: f64,
}

impl OutgoingState {
    /// Turn a received state into a snapshot at an already adjusted timestamp
    pub fn into_snapshot(self, timestamp: Timestamp) -> AuthoritativeSnapshot {
        AuthoritativeSnapshot::new(timestamp, self.position, self.rotation, self.velocity)
    }
}

/// Authority-side send policy
///
/// Sends every poll while the body moves. While its velocity is exactly zero
/// it falls back to a heartbeat of one send per `idle_send_interval`.
#[derive(Debug, Clone)]
pub struct StateSender {
    idle_send_interval: f64,
    last_send_time: Option<Timestamp>,
}

impl StateSender {
    pub fn new(idle_send_interval: f64) -> Self {
        Self {
            idle_send_interval,
            last_send_time: None,
        }
    }

    /// Serialize the body's state if it is due
    pub fn poll<B>(&mut self, body: &B, now: Timestamp) -> Option<OutgoingState>
    where
        B: SimulatedBody + ?Sized,
    {
        let velocity = body.velocity();
        if velocity == Vec3::ZERO {
            if let Some(last) = self.last_send_time {
                if now < last + self.idle_send_interval {
                    return None;
                }
            }
        }

        let dt_since_last_send = self.last_send_time.map_or(0.0, |last| now - last);
        self.last_send_time = Some(now);

        let (position, rotation) = body.pose();
        Some(OutgoingState {
            position,
            rotation,
            velocity,
            dt_since_last_send,
        })
    }

    /// Time of the last send
    pub fn last_send_time(&self) -> Option<Timestamp> {
        self.last_send_time
    }

    /// Send on the next poll regardless of motion
    pub fn reset(&mut self) {
        self.last_send_time = None;
    }
}

/// Move a remote timestamp into the receiver's predicted time
///
/// Adds the measured one-way delay, plus one tick of lead time when
/// `one_frame_ahead` is set.
pub fn adjust_remote_timestamp(
    remote_timestamp: Timestamp,
    one_way_delay: f64,
    tick_interval: f64,
    one_frame_ahead: bool,
) -> Timestamp {
    let lead = if one_frame_ahead { tick_interval } else { 0.0 };
    remote_timestamp + one_way_delay + lead
}
