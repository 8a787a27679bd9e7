//! Observable outcomes of reconciliation

use rewind_core::Timestamp;
use serde::{Deserialize, Serialize};

/// Why a snapshot was applied directly instead of through history
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HardCorrectReason {
    /// Snapshot is older than anything left in history
    TooFarBehind,
    /// Snapshot is newer than the newest recorded state
    AheadOfServer,
    /// Sampling failed for a timestamp that should have been in range
    InternalSampleFailure,
}

/// Correction applied to a body, queued for telemetry and tests
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum CorrectionEvent {
    /// Slow body assigned directly and history reseeded
    SnappedIntoPlace { timestamp: Timestamp },
    /// Moving body corrected towards a recomputed state
    Corrected { timestamp: Timestamp },
    /// Snapshot applied directly to the body
    HardCorrected {
        timestamp: Timestamp,
        reason: HardCorrectReason,
    },
}

/// Branch taken by one reconciliation pass
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Reconciliation {
    /// Snapshot timestamp is NaN or infinite, snapshot dropped
    InvalidTimestamp,
    /// Live body already matches the snapshot
    AlreadyConverged,
    /// Fewer than two recorded states, snapshot dropped
    InsufficientHistory,
    /// Snapshot is ahead of history but close to the live body
    AheadWithinTolerance,
    /// Recorded history matches the snapshot
    WithinTolerance {
        position_diff: f32,
        rotation_diff: f32,
    },
    HardCorrected(HardCorrectReason),
    /// History rewritten; body snapped to the recomputed state
    Snapped {
        position_diff: f32,
        rotation_diff: f32,
    },
    /// History rewritten; body smoothly corrected to the recomputed state
    Corrected {
        position_diff: f32,
        rotation_diff: f32,
    },
}

impl Reconciliation {
    /// Whether the body or its history were touched
    pub fn is_correction(&self) -> bool {
        matches!(
            self,
            Reconciliation::HardCorrected(_)
                | Reconciliation::Snapped { .. }
                | Reconciliation::Corrected { .. }
        )
    }
}
