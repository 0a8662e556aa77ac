//! # Trailhead HTTP
//!
//! An [`OrchestrationEngine`](trailhead_core::OrchestrationEngine) for AM's
//! `/json/realms/.../authenticate` endpoint, plus the OIDC authorization-code
//! exchange that turns the resulting AM session into tokens.
//!
//! ```rust,ignore
//! let session = JourneySession::new(HttpConnector);
//! session.configure(&JourneyConfig::new("https://idp.example/am")).await?;
//! ```

pub mod am;
mod engine;
pub mod oidc;

pub use engine::{HttpConnector, HttpEngine};
