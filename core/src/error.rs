use crate::node::{NodeId, NodeKind};
use thiserror::Error;

pub type JourneyResult<T> = Result<T, JourneyError>;

/// Failure reported by an orchestration engine.
///
/// Engine failures cross the bridge untouched: the message is the one the
/// engine produced, never rewritten by the controller.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("{0}")]
    Transport(String),
    #[error("{message}")]
    Rejected { status: u16, message: String },
    #[error("malformed engine response: {0}")]
    Protocol(String),
    #[error("{0}")]
    Unauthenticated(String),
}

impl EngineError {
    pub fn transport(err: impl std::fmt::Display) -> Self {
        EngineError::Transport(err.to_string())
    }

    pub fn protocol(err: impl std::fmt::Display) -> Self {
        EngineError::Protocol(err.to_string())
    }
}

/// The error taxonomy of the journey bridge.
///
/// Everything except [`JourneyError::Engine`] is detected locally, before the
/// orchestration engine sees the call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum JourneyError {
    #[error("invalid journey configuration: {0}")]
    Configuration(String),
    #[error("journey has not been configured, call configure() first")]
    NotConfigured,
    #[error("there is no active journey in progress, call start() first")]
    NoActiveJourney,
    #[error("the current node is a {0} node and does not accept input")]
    InvalidState(NodeKind),
    #[error("submitted node {received} does not match the current node {expected}")]
    NodeMismatch { expected: NodeId, received: NodeId },
    #[error("invalid resume uri '{uri}': {reason}")]
    InvalidUri { uri: String, reason: String },
    #[error("no active session, complete a journey first: {0}")]
    NoSession(String),
    #[error(transparent)]
    Engine(#[from] EngineError),
}

impl JourneyError {
    /// Stable code carried across the bridge alongside the message.
    pub fn code(&self) -> &'static str {
        match self {
            JourneyError::Configuration(_) => "CONFIG_ERROR",
            JourneyError::NotConfigured => "NOT_CONFIGURED",
            JourneyError::NoActiveJourney => "NO_ACTIVE_JOURNEY",
            JourneyError::InvalidState(_) => "INVALID_STATE",
            JourneyError::NodeMismatch { .. } => "NODE_MISMATCH",
            JourneyError::InvalidUri { .. } => "INVALID_URI",
            JourneyError::NoSession(_) => "NO_SESSION",
            JourneyError::Engine(_) => "ENGINE_ERROR",
        }
    }

    pub fn configuration(msg: impl Into<String>) -> Self {
        JourneyError::Configuration(msg.into())
    }

    pub fn invalid_uri(uri: impl Into<String>, reason: impl Into<String>) -> Self {
        JourneyError::InvalidUri {
            uri: uri.into(),
            reason: reason.into(),
        }
    }
}
