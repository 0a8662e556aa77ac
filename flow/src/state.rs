//! FlowState - The Journey Controller State
//!
//! ```text
//! Unconfigured --configure--> Configured --start--> Active(node)
//! Active(Continue) --next--> Active(next) | Terminal(Success|Failure)
//! any configured   --resume--> Active(resumed) | Terminal(..)
//! Terminal(Success) --logout--> Configured
//! any configured   --start--> Active(..)
//! ```

use std::sync::Arc;
use trailhead_core::node::{Node, NodeKind};

/// Where the controller is in a journey.
///
/// The held node sits behind an `Arc` so that snapshots handed to the UI
/// share it without copying callbacks.
#[derive(Debug, Clone, Default)]
pub enum FlowState {
    /// `configure` has not succeeded yet
    #[default]
    Unconfigured,
    /// Configured, no node held
    Configured,
    /// Holding a node that allows forward progress (Continue, Error, Unknown)
    Active(Arc<Node>),
    /// Holding a Success or Failure node
    Terminal(Arc<Node>),
}

impl FlowState {
    /// State after receiving `node` from the engine.
    pub fn holding(node: Node) -> Self {
        if node.is_terminal() {
            FlowState::Terminal(Arc::new(node))
        } else {
            FlowState::Active(Arc::new(node))
        }
    }

    pub fn is_configured(&self) -> bool {
        !matches!(self, FlowState::Unconfigured)
    }

    pub fn is_active(&self) -> bool {
        matches!(self, FlowState::Active(_))
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, FlowState::Terminal(_))
    }

    /// The held node, if any.
    pub fn node(&self) -> Option<&Arc<Node>> {
        match self {
            FlowState::Active(node) | FlowState::Terminal(node) => Some(node),
            _ => None,
        }
    }

    pub fn node_kind(&self) -> Option<NodeKind> {
        self.node().map(|node| node.kind())
    }

    /// Short name for logs.
    pub fn phase(&self) -> &'static str {
        match self {
            FlowState::Unconfigured => "unconfigured",
            FlowState::Configured => "configured",
            FlowState::Active(_) => "active",
            FlowState::Terminal(_) => "terminal",
        }
    }
}
