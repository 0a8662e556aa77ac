//! Trailhead facade crate.
//!
//! Re-exports the node model, the journey controller and (by default) the AM
//! HTTP engine and client storage behind a single entry point.
//!
//! ```rust,ignore
//! use trailhead::prelude::*;
//!
//! trailhead::observe::init_stdout_tracing();
//! let session = trailhead::http_session();
//! session.configure(&JourneyConfig::new("https://idp.example/am")).await?;
//! let node = session.start("Login", StartOptions::default()).await?;
//! ```

pub use trailhead_core as core;
pub use trailhead_flow as flow;
#[cfg(feature = "http")]
pub use trailhead_http as http;
pub use trailhead_runtime as runtime;
#[cfg(feature = "storage")]
pub use trailhead_storage as storage;

pub use trailhead_core::{
    Callback, CallbackType, JourneyConfig, JourneyError, JourneyInput, JourneyResult, Node,
    NodeId, NodeKind, Session, StartOptions,
};
pub use trailhead_runtime::{ClientState, JourneyClient, JourneySession};

pub mod observe;

/// A controller that talks to AM over HTTP.
#[cfg(feature = "http")]
pub fn http_session() -> JourneySession {
    JourneySession::new(trailhead_http::HttpConnector)
}

pub mod prelude {
    pub use trailhead_core::prelude::*;
    pub use trailhead_runtime::prelude::*;
    #[cfg(feature = "http")]
    pub use trailhead_http::HttpConnector;
    #[cfg(feature = "storage")]
    pub use trailhead_storage::{StorageClient, StorageConfig};
}
