//! Client-side prediction for one body
//!
//! Ties the pieces together behind the three hooks a host loop calls, in
//! this order every frame:
//!
//! 1. `on_snapshot` / `on_remote_state` for each received authoritative state
//! 2. `on_fixed_tick` after each physics step
//! 3. `on_render` once per rendered frame

use crate::{
    adjust_remote_timestamp, CorrectionEvent, FollowStep, OutgoingState, ReconcileConfig,
    Reconciler, Reconciliation, Result, SimulatedBody, VisualFollower,
};
use rewind_core::{AuthoritativeSnapshot, Quat, StateHistory, Timestamp, Vec3};
use rewind_rollback_buffer::HistoryBuffer;

/// A predicted body with its history and visual follower
///
/// Generic over `H: StateHistory` to allow different storage backends.
pub struct PredictedBody<B: SimulatedBody, H: StateHistory = HistoryBuffer> {
    body: B,
    reconciler: Reconciler<H>,
    follower: VisualFollower,
}

impl<B: SimulatedBody> PredictedBody<B, HistoryBuffer> {
    /// Create a predicted body with a history of `config.state_history_limit` states
    pub fn new(body: B, config: ReconcileConfig) -> Result<Self> {
        config.validate()?;
        let history = HistoryBuffer::new(config.state_history_limit);
        Self::with_history(body, history, config)
    }
}

impl<B: SimulatedBody, H: StateHistory> PredictedBody<B, H> {
    /// Create a predicted body over a custom history
    pub fn with_history(body: B, history: H, config: ReconcileConfig) -> Result<Self> {
        let (position, rotation) = body.pose();
        let follower = VisualFollower::new(position, rotation, &config);
        Ok(Self {
            body,
            reconciler: Reconciler::new(history, config)?,
            follower,
        })
    }

    /// Reconcile against a snapshot already expressed in predicted time
    pub fn on_snapshot(
        &mut self,
        snapshot: &AuthoritativeSnapshot,
        now: Timestamp,
    ) -> Reconciliation {
        self.reconciler.reconcile(&mut self.body, snapshot, now)
    }

    /// Reconcile against a state as received from the transport
    ///
    /// `remote_timestamp` is moved into predicted time using the measured
    /// one-way delay and, if configured, one tick of lead time.
    pub fn on_remote_state(
        &mut self,
        state: OutgoingState,
        remote_timestamp: Timestamp,
        one_way_delay: f64,
        tick_interval: f64,
        now: Timestamp,
    ) -> Reconciliation {
        let timestamp = adjust_remote_timestamp(
            remote_timestamp,
            one_way_delay,
            tick_interval,
            self.reconciler.config().one_frame_ahead,
        );
        let snapshot = state.into_snapshot(timestamp);
        self.on_snapshot(&snapshot, now)
    }

    /// Record the body after a physics step
    pub fn on_fixed_tick(&mut self, now: Timestamp) -> bool {
        self.reconciler.record(&self.body, now)
    }

    /// Advance the visual follower by one render frame
    pub fn on_render(&mut self, dt: f32) -> FollowStep {
        let (position, rotation) = self.body.pose();
        self.follower.update(position, rotation, dt)
    }

    /// Pose of the corrected physics body
    pub fn corrected_pose(&self) -> (Vec3, Quat) {
        self.body.pose()
    }

    /// Pose to render
    pub fn visual_pose(&self) -> (Vec3, Quat) {
        self.follower.pose()
    }

    /// Take all pending correction events
    pub fn drain_events(&mut self) -> Vec<CorrectionEvent> {
        self.reconciler.drain_events()
    }

    pub fn body(&self) -> &B {
        &self.body
    }

    /// Mutable access for the physics step
    pub fn body_mut(&mut self) -> &mut B {
        &mut self.body
    }

    pub fn reconciler(&self) -> &Reconciler<H> {
        &self.reconciler
    }

    pub fn reconciler_mut(&mut self) -> &mut Reconciler<H> {
        &mut self.reconciler
    }

    /// Get access to the state history
    pub fn history(&self) -> &H {
        self.reconciler.history()
    }

    /// Forget history and put the visual back onto the body
    pub fn reset(&mut self) {
        self.reconciler.reset();
        let (position, rotation) = self.body.pose();
        self.follower.snap_to(position, rotation);
    }
}
