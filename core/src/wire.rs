//! # Wire: the bridge serialization contract
//!
//! JSON shapes exchanged between the calling context and the orchestration
//! engine. Engines produce [`WireNode`]s, the controller decodes them into
//! [`Node`]s and hands [`WireNode`] snapshots back out to the caller.
//!
//! ```json
//! { "id": "3f2a…", "type": "ContinueNode",
//!   "callbacks": [{ "type": "NameCallback", "prompt": "User Name" }] }
//! ```

use crate::callback::Callback;
use crate::error::JourneyError;
use crate::node::{Node, NodeId, NodeState};
use crate::session::SessionHandle;
use serde::{Deserialize, Serialize};

/// A node as it crosses the bridge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireNode {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub callbacks: Option<Vec<Callback>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Engine-to-controller only; never present in caller-facing snapshots.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session: Option<SessionHandle>,
}

impl WireNode {
    fn bare(id: &NodeId, kind: &str) -> Self {
        Self {
            id: id.as_str().to_string(),
            kind: kind.to_string(),
            callbacks: None,
            message: None,
            session: None,
        }
    }

    pub fn continue_with(id: NodeId, callbacks: Vec<Callback>) -> Self {
        Self {
            callbacks: Some(callbacks),
            ..Self::bare(&id, "ContinueNode")
        }
    }

    pub fn success(id: NodeId, session: SessionHandle) -> Self {
        Self {
            session: Some(session),
            ..Self::bare(&id, "SuccessNode")
        }
    }

    pub fn error(id: NodeId, message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..Self::bare(&id, "ErrorNode")
        }
    }

    pub fn failure(id: NodeId, cause: impl Into<String>) -> Self {
        Self {
            message: Some(cause.into()),
            ..Self::bare(&id, "FailureNode")
        }
    }
}

impl From<Node> for WireNode {
    fn from(node: Node) -> Self {
        let kind = node.kind().wire_name();
        let mut wire = WireNode::bare(node.id(), kind);
        match node.state() {
            NodeState::Continue { callbacks } => wire.callbacks = Some(callbacks.clone()),
            NodeState::Error { message } => wire.message = Some(message.clone()),
            NodeState::Failure { cause } => wire.message = Some(cause.clone()),
            NodeState::Success { .. } | NodeState::Unknown { .. } => {}
        }
        wire
    }
}

/// Options of `start`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartOptions {
    /// Re-authenticate even when a valid session cookie exists.
    #[serde(default)]
    pub force_auth: bool,
    /// Do not establish a session on success.
    #[serde(default)]
    pub no_session: bool,
}

/// What the controller submits to the engine on `next`.
///
/// `callbacks` is the detached, filled-in copy of the held node's callbacks.
#[derive(Debug, Clone)]
pub struct ContinueRequest {
    pub node_id: NodeId,
    pub callbacks: Vec<Callback>,
}

/// Rejection envelope: `{ "code": "NOT_CONFIGURED", "message": "..." }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeError {
    pub code: String,
    pub message: String,
}

impl From<&JourneyError> for BridgeError {
    fn from(err: &JourneyError) -> Self {
        Self {
            code: err.code().to_string(),
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::callback::CallbackType;
    use crate::input::JourneyInput;
    use serde_json::json;

    #[test]
    fn test_start_options_defaults() {
        let opts: StartOptions = serde_json::from_str("{}").unwrap();
        assert_eq!(opts, StartOptions::default());
        let opts: StartOptions = serde_json::from_str(r#"{"forceAuth":true}"#).unwrap();
        assert!(opts.force_auth);
        assert!(!opts.no_session);
    }

    #[test]
    fn test_snapshot_never_exposes_password() {
        let wire = WireNode::continue_with(
            NodeId::new("n-1"),
            vec![
                Callback::new(CallbackType::NAME),
                Callback::new(CallbackType::PASSWORD),
            ],
        );
        let node = Node::decode(wire).unwrap();
        let filled = JourneyInput::new()
            .with(CallbackType::NAME, "alice")
            .with(CallbackType::PASSWORD, "secret")
            .apply(node.callbacks());

        let echoed = WireNode::continue_with(node.id().clone(), filled);
        let text = serde_json::to_string(&echoed).unwrap();
        assert!(text.contains("alice"));
        assert!(!text.contains("secret"));
    }

    #[test]
    fn test_failure_snapshot_shape() {
        let node = Node::decode(WireNode::failure(NodeId::new("f"), "Login failure")).unwrap();
        assert_eq!(
            serde_json::to_value(&node).unwrap(),
            json!({"id": "f", "type": "FailureNode", "message": "Login failure"})
        );
    }

    #[test]
    fn test_bridge_error_envelope() {
        let err = JourneyError::NotConfigured;
        let envelope = BridgeError::from(&err);
        assert_eq!(envelope.code, "NOT_CONFIGURED");
    }
}
