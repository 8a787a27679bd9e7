//! Rewind Core - Timed body states and the history they live in
//!
//! This crate provides the shared vocabulary for client-side prediction:
//! - `TimedState` - a body's pose and velocity at one instant, with deltas
//! - `AuthoritativeSnapshot` - the authority's state of a body at a past instant
//! - `StateHistory` - the ordered, time-indexed storage seam
//!
//! Math types come from `glam` and are re-exported so downstream crates
//! agree on a single version.

mod error;
mod state_history;
mod timed_state;

pub use error::{Error, Result};
pub use state_history::{Neighbors, StateHistory};
pub use timed_state::{AuthoritativeSnapshot, TimedState, Timestamp};

pub use glam::{Quat, Vec3};
