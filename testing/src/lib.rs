//! Test utilities for Trailhead journeys.
//!
//! - [`ScriptedEngine`]: in-memory orchestration engine driven by scripts
//! - [`ScriptedConnector`]: hands the same engine to every `configure`
//! - [`assert_node_kind!`]: assert on a node's variant with a readable message

mod connector;
mod engine;

pub use connector::ScriptedConnector;
pub use engine::{Call, Script, ScriptedEngine, Step};

/// Assert that a `Node` or `Arc<Node>` has the given kind.
///
/// ```rust,ignore
/// assert_node_kind!(node, NodeKind::Continue);
/// ```
#[macro_export]
macro_rules! assert_node_kind {
    ($node:expr, $kind:expr) => {{
        let node = &$node;
        assert_eq!(
            node.kind(),
            $kind,
            "expected {} node, got {} node {}",
            $kind,
            node.kind(),
            node.id()
        );
    }};
}
