//! Physics body seam
//!
//! The integrator owns the body's pose and velocity and advances them every
//! tick. Prediction only reads them and, when correcting, writes them back.

use rewind_core::{Quat, Vec3};

/// A simulated rigid body driven by an external physics integrator
pub trait SimulatedBody {
    /// Current position and rotation
    fn pose(&self) -> (Vec3, Quat);

    /// Current linear velocity
    fn velocity(&self) -> Vec3;

    /// Teleport the body
    fn set_pose(&mut self, position: Vec3, rotation: Quat);

    fn set_velocity(&mut self, velocity: Vec3);

    /// Move towards a pose using the integrator's continuous motion, so the
    /// next physics steps see the movement instead of a teleport.
    ///
    /// Bodies without such a primitive fall back to `set_pose`.
    fn move_towards(&mut self, position: Vec3, rotation: Quat) {
        self.set_pose(position, rotation);
    }

    fn position(&self) -> Vec3 {
        self.pose().0
    }

    fn rotation(&self) -> Quat {
        self.pose().1
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    /// Plain body recording how it was written to
    #[derive(Debug, Clone)]
    pub struct TestBody {
        pub position: Vec3,
        pub rotation: Quat,
        pub velocity: Vec3,
        pub set_pose_calls: usize,
        pub move_calls: usize,
        pub set_velocity_calls: usize,
    }

    impl TestBody {
        pub fn new(position: Vec3, velocity: Vec3) -> Self {
            Self {
                position,
                rotation: Quat::IDENTITY,
                velocity,
                set_pose_calls: 0,
                move_calls: 0,
                set_velocity_calls: 0,
            }
        }

        pub fn writes(&self) -> usize {
            self.set_pose_calls + self.move_calls + self.set_velocity_calls
        }

        /// Advance by `dt` at the current velocity
        pub fn step(&mut self, dt: f32) {
            self.position += self.velocity * dt;
        }
    }

    impl SimulatedBody for TestBody {
        fn pose(&self) -> (Vec3, Quat) {
            (self.position, self.rotation)
        }

        fn velocity(&self) -> Vec3 {
            self.velocity
        }

        fn set_pose(&mut self, position: Vec3, rotation: Quat) {
            self.set_pose_calls += 1;
            self.position = position;
            self.rotation = rotation;
        }

        fn set_velocity(&mut self, velocity: Vec3) {
            self.set_velocity_calls += 1;
            self.velocity = velocity;
        }

        fn move_towards(&mut self, position: Vec3, rotation: Quat) {
            self.move_calls += 1;
            self.position = position;
            self.rotation = rotation;
        }
    }
}
