//! Prediction configuration
//!
//! One [`ReconcileConfig`] drives a predicted body: how often it records,
//! how much history it keeps, when a divergence is worth correcting and how
//! the correction and the visual follower behave.
//!
//! Thresholds on rotation are in degrees. Distances are in world units.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// How a smoothed (non-snap) correction reaches the body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum CorrectionMode {
    /// Assign position and rotation directly
    Set,
    /// Use the body's continuous-motion primitive
    #[default]
    Move,
}

/// What happens to history entries newer than a corrected anchor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum TailRewrite {
    /// Drop them; recording continues forward from the anchor
    #[default]
    Truncate,
    /// Rebuild them on top of the anchor from their recorded deltas
    ReapplyDeltas,
}

/// Configuration for prediction and reconciliation
///
/// # Example
///
/// ```
/// use rewind_netcode::{CorrectionMode, ReconcileConfig};
///
/// let config = ReconcileConfig::from_ron(
///     "(position_correction_threshold: 0.25, correction_mode: Set)",
/// ).unwrap();
/// assert_eq!(config.position_correction_threshold, 0.25);
/// assert_eq!(config.correction_mode, CorrectionMode::Set);
/// // everything else keeps its default
/// assert_eq!(config.state_history_limit, 32);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconcileConfig {
    /// Seconds between two recorded states
    pub record_interval: f64,
    /// Maximum number of recorded states
    pub state_history_limit: usize,
    /// Position divergence (units) that triggers a correction
    pub position_correction_threshold: f32,
    /// Rotation divergence (degrees) that triggers a correction
    pub rotation_correction_threshold: f32,
    /// Bodies at or below this speed are snapped instead of smoothed
    pub snap_velocity_threshold: f32,
    /// Add one tick of lead time to incoming snapshot timestamps
    pub one_frame_ahead: bool,
    /// Skip recording while the body does not change
    pub only_record_changes: bool,
    /// Compare the live body against a snapshot before touching history
    pub compare_last_first: bool,
    /// Minimum position change (units) worth recording
    pub record_position_sensitivity: f32,
    /// Minimum rotation change (degrees) worth recording
    pub record_rotation_sensitivity: f32,
    /// Minimum velocity change worth recording
    pub record_velocity_sensitivity: f32,
    pub correction_mode: CorrectionMode,
    pub tail_rewrite: TailRewrite,
    /// Visual teleports once it lags more than `collider_size * multiplier`
    pub teleport_distance_multiplier: f32,
    pub position_interpolation_speed: f32,
    pub rotation_interpolation_speed: f32,
    /// Characteristic size of the body's collider
    pub collider_size: f32,
    /// Seconds between sends while the body is at rest
    pub idle_send_interval: f64,
}

impl ReconcileConfig {
    /// Parse a configuration from RON text and validate it
    ///
    /// Missing fields take their default value.
    pub fn from_ron(text: &str) -> Result<Self> {
        let config: ReconcileConfig = ron::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to pretty RON text
    pub fn to_ron(&self) -> Result<String> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| Error::ConfigParse(e.to_string()))
    }

    /// Check every value is in its valid range
    pub fn validate(&self) -> Result<()> {
        positive("record_interval", self.record_interval)?;
        positive("idle_send_interval", self.idle_send_interval)?;

        if self.state_history_limit < 2 {
            return Err(Error::invalid_config(
                "state_history_limit",
                format!(
                    "need room for at least two states, got {}",
                    self.state_history_limit
                ),
            ));
        }

        non_negative(
            "position_correction_threshold",
            self.position_correction_threshold,
        )?;
        non_negative(
            "rotation_correction_threshold",
            self.rotation_correction_threshold,
        )?;
        non_negative("snap_velocity_threshold", self.snap_velocity_threshold)?;
        non_negative(
            "record_position_sensitivity",
            self.record_position_sensitivity,
        )?;
        non_negative(
            "record_rotation_sensitivity",
            self.record_rotation_sensitivity,
        )?;
        non_negative(
            "record_velocity_sensitivity",
            self.record_velocity_sensitivity,
        )?;
        non_negative(
            "position_interpolation_speed",
            self.position_interpolation_speed,
        )?;
        non_negative(
            "rotation_interpolation_speed",
            self.rotation_interpolation_speed,
        )?;
        positive(
            "teleport_distance_multiplier",
            self.teleport_distance_multiplier as f64,
        )?;
        positive("collider_size", self.collider_size as f64)?;

        Ok(())
    }

    /// Distance at which the visual follower gives up and teleports
    pub fn teleport_distance(&self) -> f32 {
        self.collider_size * self.teleport_distance_multiplier
    }
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            record_interval: 0.05,
            state_history_limit: 32,
            position_correction_threshold: 0.10,
            rotation_correction_threshold: 5.0,
            snap_velocity_threshold: 2.0,
            one_frame_ahead: true,
            only_record_changes: true,
            compare_last_first: true,
            record_position_sensitivity: 0.01,
            record_rotation_sensitivity: 0.1,
            record_velocity_sensitivity: 0.01,
            correction_mode: CorrectionMode::Move,
            tail_rewrite: TailRewrite::Truncate,
            teleport_distance_multiplier: 10.0,
            position_interpolation_speed: 15.0,
            rotation_interpolation_speed: 10.0,
            collider_size: 1.0,
            idle_send_interval: 1.0,
        }
    }
}

fn non_negative(field: &'static str, value: f32) -> Result<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(Error::invalid_config(
            field,
            format!("must be finite and >= 0, got {}", value),
        ));
    }
    Ok(())
}

fn positive(field: &'static str, value: f64) -> Result<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(Error::invalid_config(
            field,
            format!("must be finite and > 0, got {}", value),
        ));
    }
    Ok(())
}
