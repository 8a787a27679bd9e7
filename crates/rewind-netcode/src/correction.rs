//! Applying resolved corrections to the live body

use crate::{CorrectionEvent, CorrectionMode, ReconcileConfig, Recorder, SimulatedBody};
use rewind_core::{StateHistory, TimedState};
use tracing::debug;

/// Writes corrected states into the physics body
///
/// Slow bodies are snapped: the jump is too small to notice and a clean
/// history baseline avoids correcting against stale states. Faster bodies
/// are corrected according to [`CorrectionMode`].
#[derive(Debug, Clone)]
pub struct Corrector {
    snap_velocity_threshold: f32,
    mode: CorrectionMode,
}

impl Corrector {
    pub fn new(config: &ReconcileConfig) -> Self {
        Self {
            snap_velocity_threshold: config.snap_velocity_threshold,
            mode: config.correction_mode,
        }
    }

    /// Apply `state` to `body`, choosing between a snap and a smoothed correction
    ///
    /// The choice is made on the body's velocity before correction. A snap
    /// reseeds `history` with `state` and continues recording from it.
    pub fn apply<B, H>(
        &self,
        body: &mut B,
        history: &mut H,
        recorder: &mut Recorder,
        state: &TimedState,
    ) -> CorrectionEvent
    where
        B: SimulatedBody + ?Sized,
        H: StateHistory + ?Sized,
    {
        let speed = body.velocity().length();

        if speed <= self.snap_velocity_threshold {
            body.set_pose(state.position, state.rotation);
            body.set_velocity(state.velocity);
            history.clear_and_seed(*state);
            recorder.reset_to(*state);
            debug!(
                "snapped into place at {} (speed {:.3} <= {:.3})",
                state.timestamp, speed, self.snap_velocity_threshold
            );
            return CorrectionEvent::SnappedIntoPlace {
                timestamp: state.timestamp,
            };
        }

        match self.mode {
            CorrectionMode::Set => body.set_pose(state.position, state.rotation),
            CorrectionMode::Move => body.move_towards(state.position, state.rotation),
        }
        // no continuous primitive for velocity
        body.set_velocity(state.velocity);
        debug!("corrected towards state at {} ({:?})", state.timestamp, self.mode);
        CorrectionEvent::Corrected {
            timestamp: state.timestamp,
        }
    }

    /// Assign `state` directly, bypassing snap selection and history
    pub fn hard_apply<B>(&self, body: &mut B, state: &TimedState)
    where
        B: SimulatedBody + ?Sized,
    {
        body.set_pose(state.position, state.rotation);
        body.set_velocity(state.velocity);
    }

    pub fn snap_velocity_threshold(&self) -> f32 {
        self.snap_velocity_threshold
    }

    pub fn mode(&self) -> CorrectionMode {
        self.mode
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::testing::TestBody;
    use rewind_core::{Quat, Vec3};
    use rewind_rollback_buffer::HistoryBuffer;

    fn filled_history() -> HistoryBuffer {
        let mut history = HistoryBuffer::new(32);
        for i in 0..5 {
            let t = i as f64 * 0.05;
            history
                .insert(TimedState::new(t, Vec3::ZERO, Quat::IDENTITY, Vec3::ZERO))
                .unwrap();
        }
        history
    }

    fn target() -> TimedState {
        TimedState::new(
            0.1,
            Vec3::new(3.0, 0.0, 0.0),
            Quat::from_rotation_y(0.2),
            Vec3::new(1.5, 0.0, 0.0),
        )
    }

    #[test]
    fn test_slow_body_snaps() {
        let config = ReconcileConfig::default();
        let corrector = Corrector::new(&config);
        let mut recorder = Recorder::new(&config);
        let mut history = filled_history();
        let mut body = TestBody::new(Vec3::ZERO, Vec3::new(1.0, 0.0, 0.0));

        let event = corrector.apply(&mut body, &mut history, &mut recorder, &target());

        assert_eq!(event, CorrectionEvent::SnappedIntoPlace { timestamp: 0.1 });
        assert_eq!(body.set_pose_calls, 1);
        assert_eq!(body.move_calls, 0);
        assert_eq!(body.position, Vec3::new(3.0, 0.0, 0.0));
        assert_eq!(body.velocity, Vec3::new(1.5, 0.0, 0.0));
        assert_eq!(history.len(), 1);
        assert_eq!(history.oldest().unwrap().timestamp, 0.1);
        assert_eq!(recorder.last_recorded().unwrap().timestamp, 0.1);
    }

    #[test]
    fn test_fast_body_moves() {
        let config = ReconcileConfig::default();
        let corrector = Corrector::new(&config);
        let mut recorder = Recorder::new(&config);
        let mut history = filled_history();
        let mut body = TestBody::new(Vec3::ZERO, Vec3::new(5.0, 0.0, 0.0));

        let event = corrector.apply(&mut body, &mut history, &mut recorder, &target());

        assert_eq!(event, CorrectionEvent::Corrected { timestamp: 0.1 });
        assert_eq!(body.move_calls, 1);
        assert_eq!(body.set_pose_calls, 0);
        assert_eq!(body.set_velocity_calls, 1);
        assert_eq!(body.velocity, Vec3::new(1.5, 0.0, 0.0));
        assert_eq!(history.len(), 5);
    }

    #[test]
    fn test_set_mode_assigns_pose() {
        let config = ReconcileConfig {
            correction_mode: CorrectionMode::Set,
            ..Default::default()
        };
        let corrector = Corrector::new(&config);
        let mut recorder = Recorder::new(&config);
        let mut history = filled_history();
        let mut body = TestBody::new(Vec3::ZERO, Vec3::new(5.0, 0.0, 0.0));

        corrector.apply(&mut body, &mut history, &mut recorder, &target());

        assert_eq!(body.set_pose_calls, 1);
        assert_eq!(body.move_calls, 0);
        assert_eq!(body.rotation, Quat::from_rotation_y(0.2));
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let config = ReconcileConfig::default();
        let corrector = Corrector::new(&config);
        let mut recorder = Recorder::new(&config);
        let mut history = filled_history();
        let mut body = TestBody::new(Vec3::ZERO, Vec3::new(2.0, 0.0, 0.0));

        let event = corrector.apply(&mut body, &mut history, &mut recorder, &target());
        assert!(matches!(event, CorrectionEvent::SnappedIntoPlace { .. }));
    }
}
