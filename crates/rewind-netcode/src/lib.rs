//! Rewind Netcode - Client-side prediction with server reconciliation
//!
//! This crate keeps a locally simulated body in step with an authoritative
//! server that only ever reports the past:
//!
//! - **Recording**: sample the live body into a bounded, time-indexed history
//! - **Sampling**: interpolate history at any recorded instant
//! - **Reconciliation**: compare late authoritative snapshots against history
//!   and correct the past and present
//! - **Correction**: snap slow bodies, smoothly correct fast ones
//! - **Visual following**: render a transform that eases towards the body
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                         Client                               │
//! │  ┌──────────────┐  ┌──────────────┐  ┌──────────────────┐    │
//! │  │   Physics    │─▶│   Recorder   │─▶│  State History   │    │
//! │  └──────────────┘  └──────────────┘  └──────────────────┘    │
//! │         ▲                                 ▲      │           │
//! │         │                                 │      ▼           │
//! │  ┌──────────────┐  ┌──────────────┐  ┌──────────────────┐    │
//! │  │  Corrector   │◀─│Reconciliation│◀─│     Network      │    │
//! │  └──────────────┘  └──────────────┘  └──────────────────┘    │
//! │         │                                                    │
//! │         ▼                                                    │
//! │  ┌──────────────┐  ┌──────────────┐                          │
//! │  │Visual Follow │─▶│    Render    │                          │
//! │  └──────────────┘  └──────────────┘                          │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use rewind_netcode::{PredictedBody, ReconcileConfig};
//!
//! let mut predicted = PredictedBody::new(my_body, ReconcileConfig::default())?;
//!
//! // Client loop
//! loop {
//!     // Reconcile against whatever the server sent
//!     while let Some(snapshot) = receive_snapshot() {
//!         predicted.on_snapshot(&snapshot, predicted_time());
//!     }
//!
//!     // Step physics, then record
//!     step_physics(predicted.body_mut());
//!     predicted.on_fixed_tick(predicted_time());
//!
//!     // Render the smoothed pose
//!     predicted.on_render(frame_dt);
//!     render(predicted.visual_pose());
//! }
//! ```

mod body;
mod config;
mod correction;
mod error;
mod event;
mod interpolation;
mod prediction;
mod reconciliation;
mod recorder;
mod sampler;
mod transport;

pub use body::SimulatedBody;
pub use config::{CorrectionMode, ReconcileConfig, TailRewrite};
pub use correction::Corrector;
pub use error::{Error, Result};
pub use event::{CorrectionEvent, HardCorrectReason, Reconciliation};
pub use interpolation::{move_towards, FollowStep, VisualFollower};
pub use prediction::PredictedBody;
pub use reconciliation::{Reconciler, MAX_PENDING_EVENTS};
pub use recorder::Recorder;
pub use sampler::{interpolate_neighbors, sample};
pub use transport::{adjust_remote_timestamp, OutgoingState, StateSender};

// Re-export core types for convenience
pub use rewind_core::{AuthoritativeSnapshot, StateHistory, TimedState};
