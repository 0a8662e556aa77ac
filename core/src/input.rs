//! Detached caller input for a Continue node.
//!
//! The UI never mutates callbacks owned by the controller. It builds a
//! [`JourneyInput`] and hands it to `next`; the controller copies the held
//! callbacks and applies the input to that copy.

use crate::callback::{Callback, CallbackType};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One `{type, value}` pair submitted for a callback.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallbackInput {
    #[serde(rename = "type")]
    pub kind: CallbackType,
    #[serde(default)]
    pub value: String,
}

impl CallbackInput {
    pub fn new(kind: impl Into<CallbackType>, value: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            value: value.into(),
        }
    }
}

impl fmt::Debug for CallbackInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = if self.kind.is_secret() {
            "<redacted>"
        } else {
            self.value.as_str()
        };
        f.debug_struct("CallbackInput")
            .field("type", &self.kind)
            .field("value", &value)
            .finish()
    }
}

/// The payload of a `next` call: `{ "callbacks": [{ "type", "value" }] }`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JourneyInput {
    #[serde(default)]
    pub callbacks: Vec<CallbackInput>,
}

impl JourneyInput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a value for the given callback type.
    pub fn with(mut self, kind: impl Into<CallbackType>, value: impl Into<String>) -> Self {
        self.callbacks.push(CallbackInput::new(kind, value));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.callbacks.is_empty()
    }

    /// Apply this input to a copy of `callbacks`.
    ///
    /// Each entry updates the first callback of the same type (first match
    /// wins, so a node with two `NameCallback`s only ever gets the first one
    /// filled). Entries that target output-only callbacks or match nothing
    /// are skipped.
    pub fn apply(&self, callbacks: &[Callback]) -> Vec<Callback> {
        let mut detached = callbacks.to_vec();
        for entry in &self.callbacks {
            let slot = detached.iter_mut().find(|cb| cb.kind() == &entry.kind);
            match slot {
                Some(cb) if cb.accepts_input() => cb.set_value(entry.value.clone()),
                Some(cb) => {
                    tracing::warn!(callback = %cb.kind(), "Callback is output-only, input ignored");
                }
                None => {
                    tracing::warn!(callback = %entry.kind, "No callback of this type on node, input ignored");
                }
            }
        }
        detached
    }
}
