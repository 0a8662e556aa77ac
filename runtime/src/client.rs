//! # JourneyClient: reactive journey state for a UI
//!
//! Wraps a shared [`JourneySession`] and publishes a [`ClientState`] snapshot
//! on a `watch` channel: the held node, a loading flag and the last error.
//! Every method still returns its own result, so callers that need failure
//! signalling can match on it while views just render the snapshot.

use crate::session::JourneySession;
use std::sync::Arc;
use tokio::sync::watch;
use trailhead_core::config::JourneyConfig;
use trailhead_core::error::{JourneyError, JourneyResult};
use trailhead_core::input::JourneyInput;
use trailhead_core::node::Node;
use trailhead_core::session::Session;
use trailhead_core::wire::StartOptions;

/// What a view renders.
#[derive(Debug, Clone, Default)]
pub struct ClientState {
    pub node: Option<Arc<Node>>,
    pub loading: bool,
    pub error: Option<JourneyError>,
}

/// Sets `loading` for its lifetime, so every exit path clears it.
struct Busy<'a>(&'a watch::Sender<ClientState>);

impl<'a> Busy<'a> {
    fn enter(tx: &'a watch::Sender<ClientState>) -> Self {
        tx.send_modify(|s| s.loading = true);
        Busy(tx)
    }
}

impl Drop for Busy<'_> {
    fn drop(&mut self) {
        self.0.send_modify(|s| s.loading = false);
    }
}

pub struct JourneyClient {
    session: Arc<JourneySession>,
    config: JourneyConfig,
    state: watch::Sender<ClientState>,
}

impl JourneyClient {
    /// `config` is applied on every `start`.
    pub fn new(session: Arc<JourneySession>, config: JourneyConfig) -> Self {
        let (state, _) = watch::channel(ClientState::default());
        Self {
            session,
            config,
            state,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<ClientState> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> ClientState {
        self.state.borrow().clone()
    }

    pub fn node(&self) -> Option<Arc<Node>> {
        self.state.borrow().node.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.state.borrow().loading
    }

    pub fn error(&self) -> Option<JourneyError> {
        self.state.borrow().error.clone()
    }

    pub fn session(&self) -> &Arc<JourneySession> {
        &self.session
    }

    /// Configure, then start `journey`. Clears the previous error.
    pub async fn start(&self, journey: &str) -> JourneyResult<Arc<Node>> {
        self.start_with(journey, StartOptions::default()).await
    }

    pub async fn start_with(&self, journey: &str, options: StartOptions) -> JourneyResult<Arc<Node>> {
        let _busy = Busy::enter(&self.state);
        self.state.send_modify(|s| s.error = None);
        let result = async {
            self.session.configure(&self.config).await?;
            self.session.start(journey, options).await
        }
        .await;
        self.settle(result)
    }

    /// Submit `input` for the node this client holds.
    ///
    /// `Ok(None)` without a held node; nothing is sent.
    pub async fn next(&self, input: &JourneyInput) -> JourneyResult<Option<Arc<Node>>> {
        let Some(held) = self.node() else {
            tracing::debug!("next without a held node, ignoring");
            return Ok(None);
        };
        let _busy = Busy::enter(&self.state);
        let result = self.session.next(held.id(), input).await;
        self.settle(result).map(Some)
    }

    pub async fn resume(&self, uri: &str) -> JourneyResult<Arc<Node>> {
        let _busy = Busy::enter(&self.state);
        let result = self.session.resume(uri).await;
        self.settle(result)
    }

    /// The authenticated user, or `None`. Failures are recorded, not returned.
    pub async fn user(&self) -> Option<Session> {
        let _busy = Busy::enter(&self.state);
        match self.session.session().await {
            Ok(session) => session,
            Err(e) => {
                tracing::warn!(error = %e, "Could not load user session");
                self.state.send_modify(|s| s.error = Some(e));
                None
            }
        }
    }

    /// End the session and drop the held node. Failures are recorded, not returned.
    pub async fn logout(&self) -> bool {
        let _busy = Busy::enter(&self.state);
        match self.session.logout().await {
            Ok(done) => {
                self.state.send_modify(|s| s.node = None);
                done
            }
            Err(e) => {
                tracing::warn!(error = %e, "Logout failed");
                self.state.send_modify(|s| s.error = Some(e));
                false
            }
        }
    }

    fn settle(&self, result: JourneyResult<Arc<Node>>) -> JourneyResult<Arc<Node>> {
        match &result {
            Ok(node) => self.state.send_modify(|s| s.node = Some(Arc::clone(node))),
            Err(e) => self.state.send_modify(|s| s.error = Some(e.clone())),
        }
        result
    }
}

impl std::fmt::Debug for JourneyClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JourneyClient")
            .field("session", &self.session)
            .field("state", &*self.state.borrow())
            .finish()
    }
}
