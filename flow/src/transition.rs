//! Transition - State Transition Contracts
//!
//! Guards decide whether an operation is legal in the current [`FlowState`]
//! before anything reaches the engine; [`FlowEvent`] describes the state
//! change once the engine has answered.
//!
//! Guards and events are pure. The async controller in the runtime layer
//! calls a guard, talks to the engine without holding any lock, then applies
//! the resulting event.

use crate::state::FlowState;
use std::sync::Arc;
use trailhead_core::error::{JourneyError, JourneyResult};
use trailhead_core::node::{Node, NodeId};

/// Something that changes the held state.
#[derive(Debug, Clone)]
pub enum FlowEvent {
    /// A configuration was accepted (replaces any held node)
    Configured,
    /// The engine answered start/next/resume with this node
    NodeReceived(Node),
    /// The session was ended
    LoggedOut,
}

impl FlowState {
    /// Apply an event, returning the new state.
    ///
    /// Events that are meaningless in the current state (a node arriving
    /// while unconfigured, logout before configure) leave it unchanged.
    pub fn apply(self, event: FlowEvent) -> FlowState {
        match (self, event) {
            (_, FlowEvent::Configured) => FlowState::Configured,
            (FlowState::Unconfigured, _) => FlowState::Unconfigured,
            (_, FlowEvent::NodeReceived(node)) => FlowState::holding(node),
            (_, FlowEvent::LoggedOut) => FlowState::Configured,
        }
    }
}

/// `start` and `resume` only need a configuration.
pub fn ensure_configured(state: &FlowState) -> JourneyResult<()> {
    if state.is_configured() {
        Ok(())
    } else {
        Err(JourneyError::NotConfigured)
    }
}

/// `next` needs a held Continue node whose id matches the one echoed by the caller.
///
/// Returns the held node so the caller can copy its callbacks.
pub fn ensure_accepts_input(state: &FlowState, node_id: &NodeId) -> JourneyResult<Arc<Node>> {
    let node = match state {
        FlowState::Unconfigured => return Err(JourneyError::NotConfigured),
        FlowState::Configured => return Err(JourneyError::NoActiveJourney),
        FlowState::Active(node) | FlowState::Terminal(node) => node,
    };
    if !node.accepts_input() {
        return Err(JourneyError::InvalidState(node.kind()));
    }
    if node.id() != node_id {
        return Err(JourneyError::NodeMismatch {
            expected: node.id().clone(),
            received: node_id.clone(),
        });
    }
    Ok(Arc::clone(node))
}

#[cfg(test)]
mod tests {
    use super::*;
    use trailhead_core::callback::{Callback, CallbackType};
    use trailhead_core::node::NodeKind;
    use trailhead_core::wire::WireNode;

    fn continue_node(id: &str) -> Node {
        Node::decode(WireNode::continue_with(
            NodeId::new(id),
            vec![Callback::new(CallbackType::NAME)],
        ))
        .unwrap()
    }

    #[test]
    fn test_next_before_configure() {
        let err = ensure_accepts_input(&FlowState::Unconfigured, &NodeId::new("x")).unwrap_err();
        assert_eq!(err, JourneyError::NotConfigured);
    }

    #[test]
    fn test_next_before_start() {
        let err = ensure_accepts_input(&FlowState::Configured, &NodeId::new("x")).unwrap_err();
        assert_eq!(err, JourneyError::NoActiveJourney);
    }

    #[test]
    fn test_next_on_non_continue_nodes() {
        for wire in [
            WireNode::success(NodeId::new("s"), Default::default()),
            WireNode::error(NodeId::new("e"), "oops"),
            WireNode::failure(NodeId::new("f"), "locked"),
        ] {
            let node = Node::decode(wire).unwrap();
            let id = node.id().clone();
            let kind = node.kind();
            let state = FlowState::Configured.apply(FlowEvent::NodeReceived(node));
            let err = ensure_accepts_input(&state, &id).unwrap_err();
            assert_eq!(err, JourneyError::InvalidState(kind));
        }
    }

    #[test]
    fn test_stale_node_id_is_rejected() {
        let state = FlowState::Configured.apply(FlowEvent::NodeReceived(continue_node("n-2")));
        let err = ensure_accepts_input(&state, &NodeId::new("n-1")).unwrap_err();
        assert!(matches!(err, JourneyError::NodeMismatch { .. }));

        let held = ensure_accepts_input(&state, &NodeId::new("n-2")).unwrap();
        assert_eq!(held.kind(), NodeKind::Continue);
    }

    #[test]
    fn test_configure_drops_held_node() {
        let state = FlowState::Configured.apply(FlowEvent::NodeReceived(continue_node("n-1")));
        let state = state.apply(FlowEvent::Configured);
        assert!(state.node().is_none());
        assert!(state.is_configured());
    }

    #[test]
    fn test_events_ignored_while_unconfigured() {
        let state = FlowState::Unconfigured.apply(FlowEvent::NodeReceived(continue_node("n-1")));
        assert!(!state.is_configured());
        let state = state.apply(FlowEvent::LoggedOut);
        assert!(!state.is_configured());
        assert_eq!(ensure_configured(&state), Err(JourneyError::NotConfigured));
    }

    #[test]
    fn test_logout_returns_to_configured() {
        let success = Node::decode(WireNode::success(NodeId::new("s"), Default::default())).unwrap();
        let state = FlowState::Configured.apply(FlowEvent::NodeReceived(success));
        assert!(state.is_terminal());
        let state = state.apply(FlowEvent::LoggedOut);
        assert!(matches!(state, FlowState::Configured));
    }
}
