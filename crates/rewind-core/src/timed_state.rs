//! Timestamped body states
//!
//! A [`TimedState`] is one entry of a body's recorded history: where the body
//! was, how it was oriented and how fast it moved at a given instant of
//! predicted (server-comparable) time.

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Simulation time in seconds
pub type Timestamp = f64;

/// A recorded physical state of a body at one instant
///
/// States are values: correction replaces them rather than mutating them in place.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimedState {
    /// Predicted time this state describes
    pub timestamp: Timestamp,
    pub position: Vec3,
    pub rotation: Quat,
    pub velocity: Vec3,
    /// `position - previous.position` at recording time (zero for the first entry)
    pub position_delta: Vec3,
    /// `previous.rotation⁻¹`-relative rotation change (identity for the first entry)
    pub rotation_delta: Quat,
    /// `velocity - previous.velocity` at recording time (zero for the first entry)
    pub velocity_delta: Vec3,
}

impl TimedState {
    /// Create a state with no deltas
    pub fn new(timestamp: Timestamp, position: Vec3, rotation: Quat, velocity: Vec3) -> Self {
        Self {
            timestamp,
            position,
            rotation,
            velocity,
            position_delta: Vec3::ZERO,
            rotation_delta: Quat::IDENTITY,
            velocity_delta: Vec3::ZERO,
        }
    }

    /// Create a state whose deltas are measured against `previous`
    ///
    /// With no previous state the deltas stay zero.
    pub fn following(
        previous: Option<&TimedState>,
        timestamp: Timestamp,
        position: Vec3,
        rotation: Quat,
        velocity: Vec3,
    ) -> Self {
        let state = Self::new(timestamp, position, rotation, velocity);
        match previous {
            Some(previous) => state.with_deltas_from(previous),
            None => state,
        }
    }

    /// Return a copy with deltas recomputed against `previous`
    pub fn with_deltas_from(mut self, previous: &TimedState) -> Self {
        self.position_delta = self.position - previous.position;
        self.rotation_delta = (self.rotation * previous.rotation.inverse()).normalize();
        self.velocity_delta = self.velocity - previous.velocity;
        self
    }

    /// Interpolate between `a` and `b`
    ///
    /// Position, velocity and deltas are interpolated linearly, rotation
    /// spherically. `t` is expected in `[0, 1]` and `b` not to be older than `a`.
    pub fn interpolate(a: &TimedState, b: &TimedState, t: f64) -> TimedState {
        let tf = t as f32;
        TimedState {
            timestamp: a.timestamp + t * (b.timestamp - a.timestamp),
            position: a.position.lerp(b.position, tf),
            rotation: a.rotation.slerp(b.rotation, tf),
            velocity: a.velocity.lerp(b.velocity, tf),
            position_delta: a.position_delta.lerp(b.position_delta, tf),
            rotation_delta: a.rotation_delta.slerp(b.rotation_delta, tf),
            velocity_delta: a.velocity_delta.lerp(b.velocity_delta, tf),
        }
    }

    /// Distance between the two positions
    pub fn position_distance(&self, position: Vec3) -> f32 {
        self.position.distance(position)
    }

    /// Angle in degrees between the two rotations
    pub fn rotation_angle_degrees(&self, rotation: Quat) -> f32 {
        self.rotation.angle_between(rotation).to_degrees()
    }
}

impl From<AuthoritativeSnapshot> for TimedState {
    fn from(snapshot: AuthoritativeSnapshot) -> Self {
        TimedState::new(
            snapshot.timestamp,
            snapshot.position,
            snapshot.rotation,
            snapshot.velocity,
        )
    }
}

/// The authority's view of a body at a past instant
///
/// `timestamp` is already expressed in the receiver's predicted time, i.e.
/// adjusted for the one-way transport delay.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AuthoritativeSnapshot {
    pub timestamp: Timestamp,
    pub position: Vec3,
    pub rotation: Quat,
    pub velocity: Vec3,
}

impl AuthoritativeSnapshot {
    /// Create a new snapshot
    pub fn new(timestamp: Timestamp, position: Vec3, rotation: Quat, velocity: Vec3) -> Self {
        Self {
            timestamp,
            position,
            rotation,
            velocity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interpolate_midpoint() {
        let a = TimedState::new(0.0, Vec3::ZERO, Quat::IDENTITY, Vec3::ZERO);
        let b = TimedState::new(
            1.0,
            Vec3::new(10.0, 0.0, 0.0),
            Quat::from_rotation_y(std::f32::consts::FRAC_PI_2),
            Vec3::new(4.0, 0.0, 0.0),
        );

        let mid = TimedState::interpolate(&a, &b, 0.5);
        assert_eq!(mid.timestamp, 0.5);
        assert!(mid.position.abs_diff_eq(Vec3::new(5.0, 0.0, 0.0), 1e-5));
        assert!(mid.velocity.abs_diff_eq(Vec3::new(2.0, 0.0, 0.0), 1e-5));
        assert!(mid
            .rotation
            .abs_diff_eq(Quat::from_rotation_y(std::f32::consts::FRAC_PI_4), 1e-5));
    }

    #[test]
    fn test_interpolate_endpoints() {
        let a = TimedState::new(2.0, Vec3::ONE, Quat::IDENTITY, Vec3::ZERO);
        let b = TimedState::new(4.0, Vec3::splat(3.0), Quat::IDENTITY, Vec3::X);

        assert_eq!(TimedState::interpolate(&a, &b, 0.0).timestamp, 2.0);
        assert_eq!(TimedState::interpolate(&a, &b, 1.0).timestamp, 4.0);
        assert!(TimedState::interpolate(&a, &b, 1.0)
            .position
            .abs_diff_eq(Vec3::splat(3.0), 1e-6));
    }

    #[test]
    fn test_following_computes_deltas() {
        let first = TimedState::following(None, 0.0, Vec3::ONE, Quat::IDENTITY, Vec3::X);
        assert_eq!(first.position_delta, Vec3::ZERO);
        assert_eq!(first.velocity_delta, Vec3::ZERO);

        let second = TimedState::following(
            Some(&first),
            0.05,
            Vec3::new(2.0, 1.0, 1.0),
            Quat::from_rotation_z(0.3),
            Vec3::new(3.0, 0.0, 0.0),
        );
        assert!(second.position_delta.abs_diff_eq(Vec3::X, 1e-6));
        assert!(second.velocity_delta.abs_diff_eq(Vec3::new(2.0, 0.0, 0.0), 1e-6));
        assert!((second.rotation_delta * first.rotation).abs_diff_eq(second.rotation, 1e-5));
    }

    #[test]
    fn test_angle_in_degrees() {
        let state = TimedState::new(0.0, Vec3::ZERO, Quat::IDENTITY, Vec3::ZERO);
        let turned = Quat::from_rotation_y(10f32.to_radians());
        assert!((state.rotation_angle_degrees(turned) - 10.0).abs() < 1e-3);
    }

    #[test]
    fn test_snapshot_serializes_with_ron() {
        let snapshot = AuthoritativeSnapshot::new(
            1.25,
            Vec3::new(1.0, 2.0, 3.0),
            Quat::IDENTITY,
            Vec3::ZERO,
        );
        let text = ron::to_string(&snapshot).unwrap();
        let back: AuthoritativeSnapshot = ron::from_str(&text).unwrap();
        assert_eq!(back, snapshot);

        let state = TimedState::from(back);
        assert_eq!(state.timestamp, 1.25);
        assert_eq!(state.position_delta, Vec3::ZERO);
    }
}
