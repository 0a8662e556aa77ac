//! ScriptedEngine - an in-memory orchestration engine
//!
//! Each journey is a list of [`Step`]s. `start` emits the first step, every
//! `next` advances by one, and once the last step has been submitted the
//! collected values are checked against the expected credentials.

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{Map, Value, json};
use std::collections::HashMap;
use std::time::Duration;
use trailhead_core::callback::{Callback, CallbackType};
use trailhead_core::engine::OrchestrationEngine;
use trailhead_core::error::EngineError;
use trailhead_core::node::NodeId;
use trailhead_core::resume::ResumeUri;
use trailhead_core::session::{SessionHandle, TokenBundle};
use trailhead_core::wire::{ContinueRequest, StartOptions, WireNode};

/// One step of a scripted journey.
#[derive(Debug, Clone)]
pub enum Step {
    /// Emit a Continue node with these callbacks
    Collect(Vec<Callback>),
    /// Emit a suspended Continue node; continue only through `resume`
    Suspend { message: String },
}

impl Step {
    pub fn name(prompt: &str) -> Self {
        Step::Collect(vec![Callback::new(CallbackType::NAME).with_prompt(prompt)])
    }

    pub fn password(prompt: &str) -> Self {
        Step::Collect(vec![Callback::new(CallbackType::PASSWORD).with_prompt(prompt)])
    }
}

/// A named journey: its steps and the values that must be submitted.
#[derive(Debug, Clone, Default)]
pub struct Script {
    steps: Vec<Step>,
    expected: HashMap<String, String>,
}

impl Script {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn step(mut self, step: Step) -> Self {
        self.steps.push(step);
        self
    }

    /// Require `value` for callbacks of type `kind` for the journey to succeed.
    pub fn expect(mut self, kind: &str, value: &str) -> Self {
        self.expected.insert(kind.to_string(), value.to_string());
        self
    }
}

/// A call as the engine saw it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Start { journey: String, options: StartOptions },
    Next { node_id: String, values: Vec<(String, Option<String>)> },
    Resume { uri: String },
    Token,
    UserInfo,
    Logout,
}

#[derive(Debug, Default)]
struct Progress {
    journey: Option<String>,
    position: usize,
    last_node: Option<NodeId>,
    submitted: HashMap<String, String>,
    suspended_id: Option<String>,
    session: Option<SessionHandle>,
    no_session: bool,
}

/// In-memory engine driven by [`Script`]s.
#[derive(Debug, Default)]
pub struct ScriptedEngine {
    journeys: HashMap<String, Script>,
    claims: Map<String, Value>,
    latency: Option<Duration>,
    reject_token: bool,
    fail_user_info: bool,
    progress: Mutex<Progress>,
    calls: Mutex<Vec<Call>>,
}

impl ScriptedEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// `Login`: username, then password, then Success for the right pair.
    pub fn login(username: &str, password: &str) -> Self {
        Self::new()
            .journey(
                "Login",
                Script::new()
                    .step(Step::name("User Name"))
                    .step(Step::password("Password"))
                    .expect(CallbackType::NAME, username)
                    .expect(CallbackType::PASSWORD, password),
            )
            .claims(json!({
                "sub": username,
                "given_name": "Alice",
                "email": format!("{username}@example.com"),
                "email_verified": true,
            }))
    }

    pub fn journey(mut self, name: &str, script: Script) -> Self {
        self.journeys.insert(name.to_string(), script);
        self
    }

    /// User-info claims returned after success. Non-objects are ignored.
    pub fn claims(mut self, claims: Value) -> Self {
        if let Value::Object(map) = claims {
            self.claims = map;
        }
        self
    }

    /// Delay every journey call (start/next/resume) by `latency`.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Make `token` fail as if the engine rejected the refresh.
    pub fn rejecting_tokens(mut self) -> Self {
        self.reject_token = true;
        self
    }

    /// Make `user_info` fail.
    pub fn failing_user_info(mut self) -> Self {
        self.fail_user_info = true;
        self
    }

    /// Every call received so far, in order.
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    /// Values of each `next` call, in order.
    pub fn submissions(&self) -> Vec<Vec<(String, Option<String>)>> {
        self.calls
            .lock()
            .iter()
            .filter_map(|call| match call {
                Call::Next { values, .. } => Some(values.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn has_session(&self) -> bool {
        self.progress.lock().session.is_some()
    }

    /// Id a resume link must carry to re-enter the suspended journey.
    pub fn suspended_id(&self) -> Option<String> {
        self.progress.lock().suspended_id.clone()
    }

    fn record(&self, call: Call) {
        self.calls.lock().push(call);
    }

    async fn delay(&self) {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }

    /// Emit the node for the current position, or finish the journey.
    fn emit(&self, progress: &mut Progress) -> Result<WireNode, EngineError> {
        let journey = progress
            .journey
            .clone()
            .ok_or_else(|| EngineError::protocol("no journey in progress"))?;
        let script = self
            .journeys
            .get(&journey)
            .ok_or_else(|| EngineError::protocol("journey disappeared"))?;
        let id = NodeId::generate();
        progress.last_node = Some(id.clone());

        let wire = match script.steps.get(progress.position) {
            Some(Step::Collect(callbacks)) => WireNode::continue_with(id, callbacks.clone()),
            Some(Step::Suspend { message }) => {
                progress.suspended_id = Some(uuid::Uuid::new_v4().simple().to_string());
                WireNode::continue_with(
                    id,
                    vec![
                        Callback::new(CallbackType::SUSPENDED_TEXT_OUTPUT)
                            .with_message(message.clone()),
                    ],
                )
            }
            None => {
                let ok = script
                    .expected
                    .iter()
                    .all(|(kind, value)| progress.submitted.get(kind) == Some(value));
                progress.journey = None;
                if ok {
                    let handle = SessionHandle::new(format!("sso-{}", uuid::Uuid::new_v4()));
                    if !progress.no_session {
                        progress.session = Some(handle.clone());
                    }
                    WireNode::success(id, handle)
                } else {
                    WireNode::failure(id, "Login failure")
                }
            }
        };
        Ok(wire)
    }
}

#[async_trait]
impl OrchestrationEngine for ScriptedEngine {
    async fn start(&self, journey: &str, options: StartOptions) -> Result<WireNode, EngineError> {
        self.record(Call::Start {
            journey: journey.to_string(),
            options,
        });
        self.delay().await;

        if !self.journeys.contains_key(journey) {
            return Err(EngineError::Rejected {
                status: 400,
                message: format!("No configuration found for journey '{journey}'"),
            });
        }
        let mut progress = self.progress.lock();
        if progress.session.is_some() && !options.force_auth {
            let id = NodeId::generate();
            progress.last_node = Some(id.clone());
            let handle = progress.session.clone().unwrap_or_default();
            return Ok(WireNode::success(id, handle));
        }
        // force_auth drops whatever session the engine still held
        *progress = Progress {
            journey: Some(journey.to_string()),
            no_session: options.no_session,
            ..Progress::default()
        };
        self.emit(&mut progress)
    }

    async fn next(&self, request: ContinueRequest) -> Result<WireNode, EngineError> {
        self.record(Call::Next {
            node_id: request.node_id.to_string(),
            values: request
                .callbacks
                .iter()
                .map(|cb| (cb.kind().to_string(), cb.value().map(str::to_string)))
                .collect(),
        });
        self.delay().await;

        let mut progress = self.progress.lock();
        if progress.last_node.as_ref() != Some(&request.node_id) {
            return Err(EngineError::Rejected {
                status: 400,
                message: "Stale node submitted".to_string(),
            });
        }
        if let Some(empty) = request
            .callbacks
            .iter()
            .find(|cb| cb.accepts_input() && cb.value().unwrap_or_default().is_empty())
        {
            let id = NodeId::generate();
            progress.last_node = Some(id.clone());
            progress.journey = None;
            return Ok(WireNode::error(id, format!("{} is required", empty.label())));
        }
        for cb in &request.callbacks {
            if let Some(value) = cb.value() {
                progress
                    .submitted
                    .insert(cb.kind().to_string(), value.to_string());
            }
        }
        progress.position += 1;
        self.emit(&mut progress)
    }

    async fn resume(&self, uri: &ResumeUri) -> Result<WireNode, EngineError> {
        self.record(Call::Resume {
            uri: uri.to_string(),
        });
        self.delay().await;

        let mut progress = self.progress.lock();
        let presented = uri.query_param("suspendedId");
        match (&progress.suspended_id, presented) {
            (Some(expected), Some(presented)) if *expected == presented => {
                progress.suspended_id = None;
                progress.position += 1;
                self.emit(&mut progress)
            }
            _ => Err(EngineError::Rejected {
                status: 400,
                message: "Invalid or expired suspended id".to_string(),
            }),
        }
    }

    async fn token(&self) -> Result<Option<TokenBundle>, EngineError> {
        self.record(Call::Token);
        if self.progress.lock().session.is_none() {
            return Ok(None);
        }
        if self.reject_token {
            return Err(EngineError::Unauthenticated(
                "token exchange rejected".to_string(),
            ));
        }
        Ok(Some(TokenBundle {
            access_token: format!("at-{}", uuid::Uuid::new_v4().simple()),
            refresh_token: Some(format!("rt-{}", uuid::Uuid::new_v4().simple())),
            expires_in: Some(3600),
            id_token: None,
        }))
    }

    async fn user_info(&self, _tokens: &TokenBundle) -> Result<Map<String, Value>, EngineError> {
        self.record(Call::UserInfo);
        if self.fail_user_info {
            return Err(EngineError::Transport("userinfo endpoint unreachable".to_string()));
        }
        Ok(self.claims.clone())
    }

    async fn logout(&self) -> Result<(), EngineError> {
        self.record(Call::Logout);
        let mut progress = self.progress.lock();
        if progress.session.take().is_some() {
            tracing::debug!("Scripted session ended");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trailhead_core::node::{Node, NodeKind};

    fn submit(node: &Node, values: &[(&str, &str)]) -> ContinueRequest {
        let mut input = trailhead_core::input::JourneyInput::new();
        for (kind, value) in values {
            input = input.with(*kind, *value);
        }
        ContinueRequest {
            node_id: node.id().clone(),
            callbacks: input.apply(node.callbacks()),
        }
    }

    #[tokio::test]
    async fn test_login_script_succeeds() {
        let engine = ScriptedEngine::login("alice", "secret");
        let node = Node::decode(engine.start("Login", StartOptions::default()).await.unwrap()).unwrap();
        assert_eq!(node.callbacks()[0].kind(), CallbackType::NAME);

        let node = Node::decode(engine.next(submit(&node, &[("NameCallback", "alice")])).await.unwrap()).unwrap();
        assert_eq!(node.callbacks()[0].kind(), CallbackType::PASSWORD);

        let node = Node::decode(engine.next(submit(&node, &[("PasswordCallback", "secret")])).await.unwrap()).unwrap();
        assert_eq!(node.kind(), NodeKind::Success);
        assert!(engine.has_session());
    }

    #[tokio::test]
    async fn test_wrong_password_fails() {
        let engine = ScriptedEngine::login("alice", "secret");
        let node = Node::decode(engine.start("Login", StartOptions::default()).await.unwrap()).unwrap();
        let node = Node::decode(engine.next(submit(&node, &[("NameCallback", "alice")])).await.unwrap()).unwrap();
        let node = Node::decode(engine.next(submit(&node, &[("PasswordCallback", "nope")])).await.unwrap()).unwrap();
        assert_eq!(node.kind(), NodeKind::Failure);
        assert!(!engine.has_session());
    }

    #[tokio::test]
    async fn test_unknown_journey_is_rejected() {
        let engine = ScriptedEngine::login("alice", "secret");
        let err = engine.start("Register", StartOptions::default()).await.unwrap_err();
        assert!(matches!(err, EngineError::Rejected { status: 400, .. }));
    }

    #[tokio::test]
    async fn test_traced_engine_passes_results_through() {
        let engine = trailhead_core::telemetry::Traced::new(ScriptedEngine::login("alice", "secret"), "scripted");
        let node = Node::decode(engine.start("Login", StartOptions::default()).await.unwrap()).unwrap();
        assert_eq!(node.kind(), NodeKind::Continue);
        assert!(engine.token().await.unwrap().is_none());
        engine.logout().await.unwrap();
        assert_eq!(engine.inner().calls().len(), 3);
    }

    #[tokio::test]
    async fn test_empty_value_yields_error_node() {
        let engine = ScriptedEngine::login("alice", "secret");
        let node = Node::decode(engine.start("Login", StartOptions::default()).await.unwrap()).unwrap();
        let node = Node::decode(engine.next(submit(&node, &[])).await.unwrap()).unwrap();
        assert_eq!(node.kind(), NodeKind::Error);
        assert_eq!(node.message(), Some("User Name is required"));
    }
}
