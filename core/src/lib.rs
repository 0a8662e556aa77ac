//! Trailhead core: the node model, callback model and bridge wire contract
//! of a resumable authentication journey.
//!
//! Nothing here talks to the network. Engines plug in through
//! [`OrchestrationEngine`] and are built by a [`Connector`].

pub mod callback;
pub mod config;
pub mod engine;
pub mod error;
pub mod input;
pub mod node;
pub mod resume;
pub mod session;
pub mod telemetry;
pub mod wire;

pub use callback::{Callback, CallbackType};
pub use config::{JourneyConfig, OidcConfig, ResolvedConfig};
pub use engine::{Connector, OrchestrationEngine, SharedEngine};
pub use error::{EngineError, JourneyError, JourneyResult};
pub use input::{CallbackInput, JourneyInput};
pub use node::{Node, NodeId, NodeKind, NodeState};
pub use resume::ResumeUri;
pub use session::{Session, SessionHandle, TokenBundle, UserInfo};
pub use telemetry::Traced;
pub use wire::{BridgeError, ContinueRequest, StartOptions, WireNode};

pub mod prelude {
    pub use crate::callback::{Callback, CallbackType};
    pub use crate::config::JourneyConfig;
    pub use crate::engine::{Connector, OrchestrationEngine};
    pub use crate::error::{EngineError, JourneyError, JourneyResult};
    pub use crate::input::JourneyInput;
    pub use crate::node::{Node, NodeId, NodeKind, NodeState};
    pub use crate::session::Session;
    pub use crate::wire::{StartOptions, WireNode};
}
