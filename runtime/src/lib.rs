//! Trailhead runtime: the async journey controller and the reactive client
//! built on top of it.

pub mod client;
pub mod session;

pub mod prelude {
    pub use crate::client::{ClientState, JourneyClient};
    pub use crate::session::JourneySession;
}

pub use client::{ClientState, JourneyClient};
pub use session::JourneySession;
