use crate::config::ResolvedConfig;
use crate::error::EngineError;
use crate::resume::ResumeUri;
use crate::session::TokenBundle;
use crate::wire::{ContinueRequest, StartOptions, WireNode};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::sync::Arc;

/// The contract of an orchestration engine.
///
/// The engine owns the journey state machine; this trait is the boundary the
/// controller marshals across. Every call may block on network I/O, and
/// engine failures are reported verbatim.
#[async_trait]
pub trait OrchestrationEngine: Send + Sync + 'static {
    /// Begin the named journey.
    async fn start(&self, journey: &str, options: StartOptions) -> Result<WireNode, EngineError>;

    /// Submit the filled-in callbacks of a Continue node.
    async fn next(&self, request: ContinueRequest) -> Result<WireNode, EngineError>;

    /// Re-enter a suspended journey from an out-of-band link.
    async fn resume(&self, uri: &ResumeUri) -> Result<WireNode, EngineError>;

    /// Tokens for the established session. `Ok(None)` when there is no session.
    async fn token(&self) -> Result<Option<TokenBundle>, EngineError>;

    /// Raw user-info claims for the given tokens.
    async fn user_info(&self, tokens: &TokenBundle) -> Result<Map<String, Value>, EngineError>;

    /// End the session. Must succeed when there is none.
    async fn logout(&self) -> Result<(), EngineError>;
}

pub type SharedEngine = Arc<dyn OrchestrationEngine>;

/// Builds an engine from a validated configuration.
///
/// `configure` calls this once per configuration; the previous engine is
/// dropped when it is replaced.
pub trait Connector: Send + Sync + 'static {
    fn connect(&self, config: &ResolvedConfig) -> Result<SharedEngine, EngineError>;
}

impl<F> Connector for F
where
    F: Fn(&ResolvedConfig) -> Result<SharedEngine, EngineError> + Send + Sync + 'static,
{
    fn connect(&self, config: &ResolvedConfig) -> Result<SharedEngine, EngineError> {
        self(config)
    }
}
