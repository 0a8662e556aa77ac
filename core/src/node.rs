use crate::callback::Callback;
use crate::error::EngineError;
use crate::session::SessionHandle;
use crate::wire::WireNode;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque identifier of one step instance.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Self {
        NodeId(id.into())
    }

    /// Fresh random id, for engines that have no natural step identifier.
    pub fn generate() -> Self {
        NodeId(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(value: &str) -> Self {
        NodeId::new(value)
    }
}

/// Variant tag of a [`Node`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    Continue,
    Success,
    Error,
    Failure,
    Unknown,
}

impl NodeKind {
    /// Name used on the wire (`ContinueNode`, `SuccessNode`, ...).
    pub fn wire_name(self) -> &'static str {
        match self {
            NodeKind::Continue => "ContinueNode",
            NodeKind::Success => "SuccessNode",
            NodeKind::Error => "ErrorNode",
            NodeKind::Failure => "FailureNode",
            NodeKind::Unknown => "UnknownNode",
        }
    }

    pub fn from_wire_name(name: &str) -> Self {
        match name {
            "ContinueNode" => NodeKind::Continue,
            "SuccessNode" => NodeKind::Success,
            "ErrorNode" => NodeKind::Error,
            "FailureNode" => NodeKind::Failure,
            _ => NodeKind::Unknown,
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NodeKind::Continue => "Continue",
            NodeKind::Success => "Success",
            NodeKind::Error => "Error",
            NodeKind::Failure => "Failure",
            NodeKind::Unknown => "Unknown",
        };
        f.write_str(name)
    }
}

/// Variant payload of a node.
///
/// Control flow as data: the controller and UI `match` on this instead of
/// calling behaviour on node subtypes.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeState {
    /// Needs input. Callback order is presentation and submission order.
    Continue { callbacks: Vec<Callback> },
    /// Authenticated. Tokens are fetched lazily through the session handle.
    Success { session: SessionHandle },
    /// Recoverable error; the flow may be continued or restarted.
    Error { message: String },
    /// Terminal failure; the flow must be restarted.
    Failure { cause: String },
    /// A node type the engine emitted that this layer does not understand.
    Unknown { kind: String },
}

/// The result of one orchestration step.
///
/// Nodes are only ever built by decoding a [`WireNode`]. Two nodes are equal
/// when their ids are equal, whatever their payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "WireNode", into = "WireNode")]
pub struct Node {
    id: NodeId,
    state: NodeState,
}

impl Node {
    pub fn id(&self) -> &NodeId {
        &self.id
    }

    pub fn state(&self) -> &NodeState {
        &self.state
    }

    pub fn kind(&self) -> NodeKind {
        match &self.state {
            NodeState::Continue { .. } => NodeKind::Continue,
            NodeState::Success { .. } => NodeKind::Success,
            NodeState::Error { .. } => NodeKind::Error,
            NodeState::Failure { .. } => NodeKind::Failure,
            NodeState::Unknown { .. } => NodeKind::Unknown,
        }
    }

    /// Callbacks of a Continue node; empty for every other kind.
    pub fn callbacks(&self) -> &[Callback] {
        match &self.state {
            NodeState::Continue { callbacks } => callbacks,
            _ => &[],
        }
    }

    /// Error message or failure cause.
    pub fn message(&self) -> Option<&str> {
        match &self.state {
            NodeState::Error { message } => Some(message),
            NodeState::Failure { cause } => Some(cause),
            _ => None,
        }
    }

    pub fn session_handle(&self) -> Option<&SessionHandle> {
        match &self.state {
            NodeState::Success { session } => Some(session),
            _ => None,
        }
    }

    /// Only Continue nodes accept input.
    pub fn accepts_input(&self) -> bool {
        matches!(self.state, NodeState::Continue { .. })
    }

    /// A Continue node waiting on an out-of-band action ("check your email").
    ///
    /// Such a node must not be submitted; the flow is re-entered via resume.
    pub fn is_suspended(&self) -> bool {
        self.callbacks().iter().any(|cb| cb.kind().is_suspended())
    }

    /// Success and Failure end forward progress.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self.state,
            NodeState::Success { .. } | NodeState::Failure { .. }
        )
    }

    pub fn decode(wire: WireNode) -> Result<Self, EngineError> {
        Self::try_from(wire)
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Node {}

impl TryFrom<WireNode> for Node {
    type Error = EngineError;

    fn try_from(wire: WireNode) -> Result<Self, Self::Error> {
        if wire.id.is_empty() {
            return Err(EngineError::protocol("node without id"));
        }
        let state = match NodeKind::from_wire_name(&wire.kind) {
            NodeKind::Continue => NodeState::Continue {
                callbacks: wire.callbacks.unwrap_or_default(),
            },
            NodeKind::Success => NodeState::Success {
                session: wire.session.unwrap_or_default(),
            },
            NodeKind::Error => NodeState::Error {
                message: wire.message.unwrap_or_default(),
            },
            NodeKind::Failure => NodeState::Failure {
                cause: wire.message.unwrap_or_default(),
            },
            NodeKind::Unknown => {
                tracing::warn!(node_type = %wire.kind, "Engine returned an unrecognised node type");
                NodeState::Unknown { kind: wire.kind }
            }
        };
        Ok(Node {
            id: NodeId::new(wire.id),
            state,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::callback::CallbackType;
    use serde_json::json;

    #[test]
    fn test_decode_continue_node() {
        let node: Node = serde_json::from_value(json!({
            "id": "n-1",
            "type": "ContinueNode",
            "callbacks": [
                {"type": "NameCallback", "prompt": "User Name"},
                {"type": "PasswordCallback", "prompt": "Password"}
            ]
        }))
        .unwrap();

        assert_eq!(node.kind(), NodeKind::Continue);
        assert!(node.accepts_input());
        assert!(!node.is_suspended());
        assert_eq!(node.callbacks().len(), 2);
        assert_eq!(node.callbacks()[1].kind(), CallbackType::PASSWORD);
    }

    #[test]
    fn test_unrecognised_type_degrades_to_unknown() {
        let node: Node =
            serde_json::from_value(json!({"id": "n-2", "type": "TimeoutNode"})).unwrap();
        assert_eq!(node.kind(), NodeKind::Unknown);
        assert_eq!(
            node.state(),
            &NodeState::Unknown {
                kind: "TimeoutNode".into()
            }
        );
        assert_eq!(serde_json::to_value(&node).unwrap()["type"], "UnknownNode");
    }

    #[test]
    fn test_missing_id_is_rejected() {
        let res: Result<Node, _> = serde_json::from_value(json!({"id": "", "type": "ErrorNode"}));
        assert!(res.is_err());
    }

    #[test]
    fn test_equality_is_by_id() {
        let a: Node = serde_json::from_value(json!({"id": "x", "type": "ErrorNode", "message": "a"})).unwrap();
        let b: Node = serde_json::from_value(json!({"id": "x", "type": "FailureNode"})).unwrap();
        let c: Node = serde_json::from_value(json!({"id": "y", "type": "ErrorNode", "message": "a"})).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_suspended_continue_node() {
        let node: Node = serde_json::from_value(json!({
            "id": "n-3",
            "type": "ContinueNode",
            "callbacks": [{"type": "SuspendedTextOutputCallback", "message": "Check your email"}]
        }))
        .unwrap();
        assert!(node.is_suspended());
        assert_eq!(node.callbacks()[0].prompt(), Some("Check your email"));
    }

    #[test]
    fn test_success_handle_not_exposed() {
        let node: Node = serde_json::from_value(json!({
            "id": "n-4",
            "type": "SuccessNode",
            "session": "sso-token"
        }))
        .unwrap();
        assert!(node.is_terminal());
        assert_eq!(node.session_handle().map(|h| h.as_str()), Some("sso-token"));
        let out = serde_json::to_string(&node).unwrap();
        assert!(!out.contains("sso-token"));
    }
}
