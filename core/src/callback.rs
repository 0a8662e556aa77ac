//! # Callback: typed input and output slots of a Continue node
//!
//! The orchestration engine owns the set of callback types, so
//! [`CallbackType`] is an open string rather than a closed enum. Types this
//! crate does not know about are carried through untouched, extra fields
//! included.

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};
use std::fmt;

/// Discriminator of a callback, e.g. `NameCallback`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CallbackType(String);

impl CallbackType {
    pub const NAME: &'static str = "NameCallback";
    pub const PASSWORD: &'static str = "PasswordCallback";
    pub const TEXT_INPUT: &'static str = "TextInputCallback";
    pub const TEXT_OUTPUT: &'static str = "TextOutputCallback";
    pub const SUSPENDED_TEXT_OUTPUT: &'static str = "SuspendedTextOutputCallback";

    pub fn new(name: impl Into<String>) -> Self {
        CallbackType(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Secret values are write-only: they are submitted but never serialized back.
    pub fn is_secret(&self) -> bool {
        self.0 == Self::PASSWORD
    }

    /// Output-only callbacks carry a message and have no value slot.
    pub fn is_output(&self) -> bool {
        self.0 == Self::TEXT_OUTPUT || self.0 == Self::SUSPENDED_TEXT_OUTPUT
    }

    pub fn is_suspended(&self) -> bool {
        self.0 == Self::SUSPENDED_TEXT_OUTPUT
    }

    /// Whether this crate has dedicated handling for the type.
    pub fn is_known(&self) -> bool {
        matches!(
            self.0.as_str(),
            Self::NAME
                | Self::PASSWORD
                | Self::TEXT_INPUT
                | Self::TEXT_OUTPUT
                | Self::SUSPENDED_TEXT_OUTPUT
        )
    }

    /// Fallback label when the engine sent no prompt.
    pub fn default_label(&self) -> &str {
        match self.0.as_str() {
            Self::NAME => "Username",
            Self::PASSWORD => "Password",
            Self::SUSPENDED_TEXT_OUTPUT => {
                "An email has been sent. Please check your inbox to continue."
            }
            other => other,
        }
    }
}

impl fmt::Display for CallbackType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl PartialEq<str> for CallbackType {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for CallbackType {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

impl From<&str> for CallbackType {
    fn from(value: &str) -> Self {
        CallbackType::new(value)
    }
}

/// One collectible input or informational output within a Continue node.
#[derive(Clone, PartialEq, Deserialize)]
pub struct Callback {
    #[serde(rename = "type")]
    kind: CallbackType,
    #[serde(default)]
    prompt: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    value: Option<String>,
    /// Fields of callback types we do not model, forwarded verbatim.
    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl Callback {
    pub fn new(kind: impl Into<CallbackType>) -> Self {
        Self {
            kind: kind.into(),
            prompt: None,
            message: None,
            value: None,
            extra: Map::new(),
        }
    }

    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = Some(prompt.into());
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }

    pub fn kind(&self) -> &CallbackType {
        &self.kind
    }

    /// The prompt as sent by the engine. Output callbacks fall back to their message.
    pub fn prompt(&self) -> Option<&str> {
        self.prompt
            .as_deref()
            .or_else(|| self.kind.is_output().then_some(self.message.as_deref()).flatten())
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Label to present: prompt, otherwise a per-type default.
    pub fn label(&self) -> &str {
        match self.prompt() {
            Some(prompt) if !prompt.is_empty() => prompt,
            _ => self.kind.default_label(),
        }
    }

    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    pub fn extra(&self) -> &Map<String, Value> {
        &self.extra
    }

    pub fn accepts_input(&self) -> bool {
        !self.kind.is_output()
    }

    pub(crate) fn set_value(&mut self, value: String) {
        self.value = Some(value);
    }
}

impl Serialize for Callback {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("type", &self.kind)?;
        if let Some(prompt) = self.prompt() {
            map.serialize_entry("prompt", prompt)?;
        }
        if let Some(message) = &self.message {
            map.serialize_entry("message", message)?;
        }
        if !self.kind.is_secret() {
            if let Some(value) = &self.value {
                map.serialize_entry("value", value)?;
            }
        }
        for (key, value) in &self.extra {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

impl fmt::Debug for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = match (&self.value, self.kind.is_secret()) {
            (Some(_), true) => Some("<redacted>"),
            (value, _) => value.as_deref(),
        };
        f.debug_struct("Callback")
            .field("type", &self.kind)
            .field("prompt", &self.prompt)
            .field("message", &self.message)
            .field("value", &value)
            .field("extra", &self.extra)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_password_value_never_serialized() {
        let cb = Callback::new(CallbackType::PASSWORD)
            .with_prompt("Password")
            .with_value("secret");
        let json = serde_json::to_value(&cb).unwrap();
        assert_eq!(json, json!({"type": "PasswordCallback", "prompt": "Password"}));
        assert!(!format!("{cb:?}").contains("secret"));
    }

    #[test]
    fn test_name_value_is_echoed() {
        let cb = Callback::new(CallbackType::NAME).with_value("alice");
        let json = serde_json::to_value(&cb).unwrap();
        assert_eq!(json["value"], "alice");
    }

    #[test]
    fn test_unknown_type_round_trips_extra_fields() {
        let raw = json!({
            "type": "KbaCreateCallback",
            "prompt": "Security question",
            "predefinedQuestions": ["Favourite colour?"]
        });
        let cb: Callback = serde_json::from_value(raw.clone()).unwrap();
        assert!(!cb.kind().is_known());
        assert!(cb.accepts_input());
        assert_eq!(serde_json::to_value(&cb).unwrap(), raw);
    }

    #[test]
    fn test_output_prompt_falls_back_to_message() {
        let cb = Callback::new(CallbackType::TEXT_OUTPUT).with_message("Welcome back");
        assert_eq!(cb.prompt(), Some("Welcome back"));
        assert!(!cb.accepts_input());
    }

    #[test]
    fn test_default_labels() {
        assert_eq!(Callback::new(CallbackType::NAME).label(), "Username");
        assert_eq!(
            Callback::new(CallbackType::PASSWORD).with_prompt("").label(),
            "Password"
        );
        assert_eq!(Callback::new("ChoiceCallback").label(), "ChoiceCallback");
    }
}
