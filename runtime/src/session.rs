//! # JourneySession: the journey controller
//!
//! Owns the engine built from the active configuration and the node the
//! journey currently sits on. Preconditions are checked against the pure
//! [`FlowState`] before anything is sent to the engine.
//!
//! ## Concurrency
//!
//! The state lock is held only to read or replace state, never across an
//! engine call. Two overlapping calls both reach the engine and the last
//! response to resolve becomes the held node. A response that resolves after
//! `configure` replaced the engine is discarded.

use parking_lot::Mutex;
use std::sync::Arc;
use tracing::Instrument;
use trailhead_core::config::{JourneyConfig, ResolvedConfig};
use trailhead_core::engine::{Connector, SharedEngine};
use trailhead_core::error::{JourneyError, JourneyResult};
use trailhead_core::input::JourneyInput;
use trailhead_core::node::{Node, NodeId};
use trailhead_core::resume::ResumeUri;
use trailhead_core::session::{Session, flatten_claims};
use trailhead_core::wire::{ContinueRequest, StartOptions, WireNode};
use trailhead_flow::{FlowEvent, FlowState, ensure_accepts_input, ensure_configured};

/// Engine plus the configuration it was built from.
#[derive(Clone)]
struct Binding {
    engine: SharedEngine,
    config: Arc<ResolvedConfig>,
    generation: u64,
}

#[derive(Default)]
struct Inner {
    state: FlowState,
    binding: Option<Binding>,
    generation: u64,
}

/// Stateful controller for one journey at a time.
///
/// Create one per application (or per account) and share it behind an `Arc`.
pub struct JourneySession {
    connector: Box<dyn Connector>,
    inner: Mutex<Inner>,
}

impl JourneySession {
    pub fn new(connector: impl Connector) -> Self {
        Self {
            connector: Box::new(connector),
            inner: Mutex::new(Inner::default()),
        }
    }

    /// Validate `config` and build a fresh engine from it.
    ///
    /// Replaces any previous configuration. The held node is dropped and calls
    /// still in flight against the old engine will not update state.
    pub async fn configure(&self, config: &JourneyConfig) -> JourneyResult<bool> {
        let span = tracing::info_span!("Journey", trailhead.op = "configure");
        async move {
            let resolved = config.resolve().inspect_err(|e| {
                tracing::error!(error = %e, "Rejected journey configuration");
            })?;
            let engine = self
                .connector
                .connect(&resolved)
                .map_err(|e| JourneyError::configuration(e.to_string()))?;

            let mut inner = self.inner.lock();
            inner.generation += 1;
            inner.binding = Some(Binding {
                engine,
                config: Arc::new(resolved),
                generation: inner.generation,
            });
            inner.state = std::mem::take(&mut inner.state).apply(FlowEvent::Configured);
            tracing::info!(generation = inner.generation, "Journey configured");
            Ok(true)
        }
        .instrument(span)
        .await
    }

    /// Start `journey` and hold the first node.
    pub async fn start(&self, journey: &str, options: StartOptions) -> JourneyResult<Arc<Node>> {
        let span = tracing::info_span!("Journey", trailhead.op = "start", journey);
        async move {
            let binding = {
                let inner = self.inner.lock();
                ensure_configured(&inner.state)?;
                bound(&inner)?
            };
            let wire = binding.engine.start(journey, options).await?;
            self.commit(binding.generation, wire)
        }
        .instrument(span)
        .await
    }

    /// Submit `input` for the held Continue node.
    ///
    /// `node_id` must echo the id of the held node. Input is applied to a
    /// detached copy of its callbacks, so a failed call leaves the held node
    /// exactly as it was.
    pub async fn next(&self, node_id: &NodeId, input: &JourneyInput) -> JourneyResult<Arc<Node>> {
        let span = tracing::info_span!("Journey", trailhead.op = "next", node.id = %node_id);
        async move {
            let (binding, held) = {
                let inner = self.inner.lock();
                let held = ensure_accepts_input(&inner.state, node_id).inspect_err(|e| {
                    tracing::warn!(error = %e, phase = inner.state.phase(), "Rejected next");
                })?;
                (bound(&inner)?, held)
            };
            let request = ContinueRequest {
                node_id: held.id().clone(),
                callbacks: input.apply(held.callbacks()),
            };
            let wire = binding.engine.next(request).await?;
            self.commit(binding.generation, wire)
        }
        .instrument(span)
        .await
    }

    /// Re-enter a suspended journey from an out-of-band link.
    ///
    /// Legal from any configured state.
    pub async fn resume(&self, uri: &str) -> JourneyResult<Arc<Node>> {
        let span = tracing::info_span!("Journey", trailhead.op = "resume");
        async move {
            let uri = ResumeUri::parse(uri)?;
            let binding = {
                let inner = self.inner.lock();
                ensure_configured(&inner.state)?;
                bound(&inner)?
            };
            let wire = binding.engine.resume(&uri).await?;
            self.commit(binding.generation, wire)
        }
        .instrument(span)
        .await
    }

    /// Tokens and user-info of the authenticated user.
    ///
    /// `Ok(None)` when there is no session. A rejected token fetch is
    /// [`JourneyError::NoSession`]; a failed user-info fetch only drops the
    /// claims.
    pub async fn session(&self) -> JourneyResult<Option<Session>> {
        let span = tracing::info_span!("Journey", trailhead.op = "session");
        async move {
            let Some(binding) = self.inner.lock().binding.clone() else {
                tracing::debug!("No session, journey not configured");
                return Ok(None);
            };
            let tokens = match binding.engine.token().await {
                Ok(Some(tokens)) => tokens,
                Ok(None) => {
                    tracing::debug!("No session available");
                    return Ok(None);
                }
                Err(e) => {
                    tracing::error!(error = %e, "Token fetch rejected");
                    return Err(JourneyError::NoSession(e.to_string()));
                }
            };
            let user_info = match binding.engine.user_info(&tokens).await {
                Ok(claims) => Some(flatten_claims(&claims)),
                Err(e) => {
                    tracing::warn!(error = %e, "Error fetching user info, returning tokens only");
                    None
                }
            };
            Ok(Some(Session::new(tokens, user_info)))
        }
        .instrument(span)
        .await
    }

    /// End the session. Succeeds as a no-op without a session or configuration.
    pub async fn logout(&self) -> JourneyResult<bool> {
        let span = tracing::info_span!("Journey", trailhead.op = "logout");
        async move {
            let Some(binding) = self.inner.lock().binding.clone() else {
                tracing::debug!("Logout without configuration, nothing to do");
                return Ok(true);
            };
            binding.engine.logout().await?;

            let mut inner = self.inner.lock();
            if inner.generation == binding.generation {
                inner.state = std::mem::take(&mut inner.state).apply(FlowEvent::LoggedOut);
            }
            tracing::info!("User logged out");
            Ok(true)
        }
        .instrument(span)
        .await
    }

    /// Drop the engine and configuration. The controller is unconfigured
    /// afterwards and late responses are discarded.
    pub fn dispose(&self) {
        let mut inner = self.inner.lock();
        inner.generation += 1;
        inner.binding = None;
        inner.state = FlowState::Unconfigured;
        tracing::debug!("Journey session disposed");
    }

    /// Snapshot of the held node.
    pub fn current(&self) -> Option<Arc<Node>> {
        self.inner.lock().state.node().cloned()
    }

    /// Snapshot of the controller state.
    pub fn state(&self) -> FlowState {
        self.inner.lock().state.clone()
    }

    pub fn is_configured(&self) -> bool {
        self.inner.lock().state.is_configured()
    }

    /// The active configuration.
    pub fn config(&self) -> Option<Arc<ResolvedConfig>> {
        self.inner.lock().binding.as_ref().map(|b| Arc::clone(&b.config))
    }

    /// Decode an engine response and make it the held node.
    fn commit(&self, generation: u64, wire: WireNode) -> JourneyResult<Arc<Node>> {
        let node = Node::decode(wire)?;
        let mut inner = self.inner.lock();
        if inner.generation != generation {
            tracing::warn!(node.id = %node.id(), "Discarding response from a replaced configuration");
            return Err(JourneyError::NoActiveJourney);
        }
        inner.state = std::mem::take(&mut inner.state).apply(FlowEvent::NodeReceived(node));
        let held = inner.state.node().cloned().ok_or(JourneyError::NoActiveJourney)?;
        tracing::info!(node.id = %held.id(), node.kind = %held.kind(), phase = inner.state.phase(), "Holding node");
        Ok(held)
    }
}

fn bound(inner: &Inner) -> JourneyResult<Binding> {
    inner.binding.clone().ok_or(JourneyError::NotConfigured)
}

impl std::fmt::Debug for JourneySession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("JourneySession")
            .field("phase", &inner.state.phase())
            .field("node", &inner.state.node().map(|n| n.id().clone()))
            .field("generation", &inner.generation)
            .finish()
    }
}
