//! Server state reconciliation
//!
//! Compares an authoritative snapshot, which always describes a past
//! instant, against recorded history and corrects the body when they
//! diverge. Branches, in order:
//!
//! 1. live body already matches the snapshot: nothing to do
//! 2. record the live body so history is as fresh as possible
//! 3. fewer than two recorded states: drop the snapshot
//! 4. snapshot older than history: hard-correct and reseed history
//! 5. snapshot newer than history: hard-correct if the live body is off
//! 6. otherwise sample history at the snapshot time; if it diverges,
//!    rewrite history from a corrected anchor and correct the body

use crate::sampler::interpolate_neighbors;
use crate::{
    CorrectionEvent, Corrector, Error, HardCorrectReason, ReconcileConfig, Reconciliation,
    Recorder, Result, SimulatedBody, TailRewrite,
};
use rewind_core::{AuthoritativeSnapshot, Neighbors, Quat, StateHistory, TimedState, Timestamp};
use tracing::{debug, error, trace, warn};

/// Pending events kept when the host does not drain them
pub const MAX_PENDING_EVENTS: usize = 64;

/// Reconciler for applying server corrections
///
/// Owns a body's history and the recorder that fills it. All operations run
/// synchronously and are bounded by the history capacity.
pub struct Reconciler<H: StateHistory> {
    /// State history for rewinding
    history: H,
    recorder: Recorder,
    corrector: Corrector,
    config: ReconcileConfig,
    /// Corrections not yet drained by the host, at most `MAX_PENDING_EVENTS`
    events: Vec<CorrectionEvent>,
}

impl<H: StateHistory> Reconciler<H> {
    /// Create a new reconciler
    ///
    /// Fails if `config` is invalid or `history` cannot hold two states.
    pub fn new(history: H, config: ReconcileConfig) -> Result<Self> {
        config.validate()?;
        if let Some(capacity) = history.capacity() {
            if capacity < 2 {
                return Err(Error::invalid_config(
                    "state_history_limit",
                    format!("history capacity {} cannot hold two states", capacity),
                ));
            }
        }

        Ok(Self {
            history,
            recorder: Recorder::new(&config),
            corrector: Corrector::new(&config),
            config,
            events: Vec::new(),
        })
    }

    /// Record the body if the record interval has elapsed
    pub fn record<B>(&mut self, body: &B, now: Timestamp) -> bool
    where
        B: SimulatedBody + ?Sized,
    {
        self.recorder.maybe_record(&mut self.history, body, now)
    }

    /// Reconcile `body` against an authoritative snapshot
    ///
    /// `now` is the current predicted time; `snapshot.timestamp` is expected
    /// not to exceed it. Never fails: every branch is either a bounded
    /// correction or a no-op, reported through the return value.
    pub fn reconcile<B>(
        &mut self,
        body: &mut B,
        snapshot: &AuthoritativeSnapshot,
        now: Timestamp,
    ) -> Reconciliation
    where
        B: SimulatedBody + ?Sized,
    {
        if !snapshot.timestamp.is_finite() {
            warn!("dropping snapshot with timestamp {}", snapshot.timestamp);
            return Reconciliation::InvalidTimestamp;
        }

        // Cheap reject. Not exact: a body that revisited the snapshot's
        // pose since then is skipped as well.
        if self.config.compare_last_first {
            let (position, rotation) = body.pose();
            if !self.diverges(
                position.distance(snapshot.position),
                rotation.angle_between(snapshot.rotation).to_degrees(),
            ) {
                trace!("snapshot at {} matches live body", snapshot.timestamp);
                return Reconciliation::AlreadyConverged;
            }
        }

        self.recorder.record(&mut self.history, body, now);

        let Some((oldest, newest)) = self.history.time_range().filter(|_| self.history.len() >= 2)
        else {
            trace!(
                "snapshot at {} dropped, {} recorded states",
                snapshot.timestamp,
                self.history.len()
            );
            return Reconciliation::InsufficientHistory;
        };

        if snapshot.timestamp < oldest {
            warn!(
                "snapshot at {} is older than history [{}, {}], hard correcting",
                snapshot.timestamp, oldest, newest
            );
            return self.hard_correct_and_reseed(body, snapshot, HardCorrectReason::TooFarBehind);
        }

        if snapshot.timestamp > newest {
            if body.position().distance(snapshot.position)
                < self.config.position_correction_threshold
            {
                return Reconciliation::AheadWithinTolerance;
            }
            warn!(
                "snapshot at {} is newer than history [{}, {}], client running ahead",
                snapshot.timestamp, oldest, newest
            );
            let state = TimedState::from(*snapshot);
            self.corrector.hard_apply(body, &state);
            return self.emit_hard_corrected(snapshot.timestamp, HardCorrectReason::AheadOfServer);
        }

        let Some(neighbors) = self.history.neighbors(snapshot.timestamp) else {
            error!(
                "no recorded states around {} although history spans [{}, {}]",
                snapshot.timestamp, oldest, newest
            );
            return self.hard_correct_and_reseed(
                body,
                snapshot,
                HardCorrectReason::InternalSampleFailure,
            );
        };

        let interpolated = interpolate_neighbors(&neighbors, snapshot.timestamp);
        let position_diff = interpolated.position_distance(snapshot.position);
        let rotation_diff = interpolated.rotation_angle_degrees(snapshot.rotation);
        if !self.diverges(position_diff, rotation_diff) {
            return Reconciliation::WithinTolerance {
                position_diff,
                rotation_diff,
            };
        }

        let recomputed = self.rewrite_history(&neighbors, snapshot);
        debug!(
            "corrected history at {}: position off by {:.3}, rotation by {:.2} deg",
            snapshot.timestamp, position_diff, rotation_diff
        );

        let event = self
            .corrector
            .apply(body, &mut self.history, &mut self.recorder, &recomputed);
        self.push_event(event);
        match event {
            CorrectionEvent::SnappedIntoPlace { .. } => Reconciliation::Snapped {
                position_diff,
                rotation_diff,
            },
            _ => Reconciliation::Corrected {
                position_diff,
                rotation_diff,
            },
        }
    }

    fn diverges(&self, position_diff: f32, rotation_diff: f32) -> bool {
        position_diff >= self.config.position_correction_threshold
            || rotation_diff >= self.config.rotation_correction_threshold
    }

    fn hard_correct_and_reseed<B>(
        &mut self,
        body: &mut B,
        snapshot: &AuthoritativeSnapshot,
        reason: HardCorrectReason,
    ) -> Reconciliation
    where
        B: SimulatedBody + ?Sized,
    {
        let state = TimedState::from(*snapshot);
        self.corrector.hard_apply(body, &state);
        self.history.clear_and_seed(state);
        self.recorder.reset_to(state);
        self.emit_hard_corrected(snapshot.timestamp, reason)
    }

    fn emit_hard_corrected(
        &mut self,
        timestamp: Timestamp,
        reason: HardCorrectReason,
    ) -> Reconciliation {
        self.push_event(CorrectionEvent::HardCorrected { timestamp, reason });
        Reconciliation::HardCorrected(reason)
    }

    fn push_event(&mut self, event: CorrectionEvent) {
        if self.events.len() >= MAX_PENDING_EVENTS {
            let dropped = self.events.remove(0);
            trace!("event queue full, dropped {:?}", dropped);
        }
        self.events.push(event);
    }

    /// Replace history from the snapshot's instant onwards
    ///
    /// Returns the state the body should be corrected to: the anchor itself
    /// when truncating, the newest rebuilt state when reapplying deltas.
    fn rewrite_history(
        &mut self,
        neighbors: &Neighbors,
        snapshot: &AuthoritativeSnapshot,
    ) -> TimedState {
        let tail: Vec<TimedState> = match self.config.tail_rewrite {
            TailRewrite::Truncate => Vec::new(),
            TailRewrite::ReapplyDeltas => (neighbors.after_index..self.history.len())
                .filter_map(|index| self.history.get(index).copied())
                .filter(|state| state.timestamp > snapshot.timestamp)
                .collect(),
        };

        self.history.truncate_from(neighbors.after_index);
        if let Some(newest) = self.history.newest() {
            if newest.timestamp == snapshot.timestamp {
                self.history.truncate_from(self.history.len() - 1);
            }
        }

        let anchor = TimedState::from(*snapshot);
        let anchor = match self.history.newest() {
            Some(previous) => anchor.with_deltas_from(previous),
            None => anchor,
        };
        self.insert_rewritten(anchor);

        // deltas of the first tail entry were measured from `before`
        let mut last = anchor;
        let mut original_previous = neighbors.before.timestamp;
        for entry in tail {
            let recorded_span = entry.timestamp - original_previous;
            let scale = if recorded_span > 0.0 {
                ((entry.timestamp - last.timestamp) / recorded_span) as f32
            } else {
                1.0
            };

            let rotation_step = Quat::IDENTITY.slerp(entry.rotation_delta, scale);
            let rebuilt = TimedState::new(
                entry.timestamp,
                last.position + entry.position_delta * scale,
                (rotation_step * last.rotation).normalize(),
                last.velocity + entry.velocity_delta * scale,
            )
            .with_deltas_from(&last);

            self.insert_rewritten(rebuilt);
            original_previous = entry.timestamp;
            last = rebuilt;
        }

        self.recorder.reset_to(last);
        last
    }

    fn insert_rewritten(&mut self, state: TimedState) {
        // the slot was cleared by truncation, a failure means broken bookkeeping
        if let Err(err) = self.history.insert(state) {
            error!("rewritten state at {} rejected: {}", state.timestamp, err);
        }
    }

    /// Corrections since the last drain, oldest first
    pub fn events(&self) -> &[CorrectionEvent] {
        &self.events
    }

    /// Take all pending corrections
    ///
    /// Hosts should drain once per frame; past `MAX_PENDING_EVENTS` the
    /// oldest events are dropped.
    pub fn drain_events(&mut self) -> Vec<CorrectionEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn config(&self) -> &ReconcileConfig {
        &self.config
    }

    pub fn recorder(&self) -> &Recorder {
        &self.recorder
    }

    /// Get access to the history
    pub fn history(&self) -> &H {
        &self.history
    }

    /// Get mutable access to the history
    pub fn history_mut(&mut self) -> &mut H {
        &mut self.history
    }

    /// Forget all history, recording state and pending events
    pub fn reset(&mut self) {
        self.history.clear();
        self.recorder.reset();
        self.events.clear();
    }
}
