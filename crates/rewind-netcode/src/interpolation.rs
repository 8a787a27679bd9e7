//! Visual smoothing for rendering
//!
//! The physics body may jump when it is corrected. The visual follower keeps
//! a separate transform that chases the body every render frame, so the
//! player sees gradual movement instead of pops.

use crate::ReconcileConfig;
use rewind_core::{Quat, Vec3};
use tracing::debug;

/// What a follower update did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowStep {
    /// Moved part of the way towards the target
    Interpolated,
    /// Too far behind, jumped onto the target
    Teleported,
}

/// Render-rate transform that chases a body's pose
///
/// Each frame it moves `distance * position_speed * dt` towards the target
/// position and slerps `rotation_speed * dt` of the way towards the target
/// rotation. When it lags more than the teleport distance it jumps.
#[derive(Debug, Clone)]
pub struct VisualFollower {
    position: Vec3,
    rotation: Quat,
    position_speed: f32,
    rotation_speed: f32,
    teleport_distance: f32,
}

impl VisualFollower {
    /// Create a follower starting at the given pose
    pub fn new(position: Vec3, rotation: Quat, config: &ReconcileConfig) -> Self {
        Self {
            position,
            rotation,
            position_speed: config.position_interpolation_speed,
            rotation_speed: config.rotation_interpolation_speed,
            teleport_distance: config.teleport_distance(),
        }
    }

    /// Advance the follower by `dt` seconds towards the target pose
    pub fn update(&mut self, target_position: Vec3, target_rotation: Quat, dt: f32) -> FollowStep {
        let distance = self.position.distance(target_position);
        if distance > self.teleport_distance {
            debug!(
                "visual teleported {:.3} units (limit {:.3})",
                distance, self.teleport_distance
            );
            self.snap_to(target_position, target_rotation);
            return FollowStep::Teleported;
        }

        let step = distance * self.position_speed * dt;
        self.position = move_towards(self.position, target_position, step);
        let alpha = (self.rotation_speed * dt).clamp(0.0, 1.0);
        self.rotation = self.rotation.slerp(target_rotation, alpha);
        FollowStep::Interpolated
    }

    /// Jump onto the given pose
    pub fn snap_to(&mut self, position: Vec3, rotation: Quat) {
        self.position = position;
        self.rotation = rotation;
    }

    /// Current visual pose
    pub fn pose(&self) -> (Vec3, Quat) {
        (self.position, self.rotation)
    }

    pub fn teleport_distance(&self) -> f32 {
        self.teleport_distance
    }
}

/// Move `current` towards `target` by at most `max_step`, without overshooting
pub fn move_towards(current: Vec3, target: Vec3, max_step: f32) -> Vec3 {
    let offset = target - current;
    let distance = offset.length();
    if distance <= max_step || distance == 0.0 {
        return target;
    }
    current + offset / distance * max_step
}
