//! Trailhead Flow - Journey Controller State Layer
//!
//! This crate defines the **structural** aspects of the journey controller:
//! - `FlowState`: Unconfigured / Configured / Active / Terminal
//! - `FlowEvent`: what moves the controller between states
//! - guards: which operations are legal in which state
//!
//! **IMPORTANT**: This layer is Pure Rust - no IO, no Async.

pub mod state;
pub mod transition;

pub use state::FlowState;
pub use transition::{FlowEvent, ensure_accepts_input, ensure_configured};
