//! AM `/authenticate` wire format and its mapping onto bridge nodes.
//!
//! Everything here is pure so it can be tested without a server.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use trailhead_core::callback::Callback;
use trailhead_core::error::EngineError;
use trailhead_core::node::NodeId;
use trailhead_core::session::SessionHandle;
use trailhead_core::wire::WireNode;

pub const API_VERSION_HEADER: &str = "Accept-API-Version";
pub const AUTHENTICATE_API_VERSION: &str = "resource=2.1, protocol=1.0";
pub const SESSIONS_API_VERSION: &str = "resource=3.1, protocol=1.0";

/// A `{name, value}` pair of a callback's `output` or `input` array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedValue {
    pub name: String,
    #[serde(default)]
    pub value: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmCallback {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub output: Vec<NamedValue>,
    #[serde(default)]
    pub input: Vec<NamedValue>,
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
}

/// Body of an `/authenticate` response or request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_id: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub callbacks: Vec<AmCallback>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage: Option<String>,
}

/// AM error body, e.g. `{"code":401,"reason":"Unauthorized","message":"Login failure"}`.
/// OAuth2 endpoints answer with `error`/`error_description` instead.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AmErrorBody {
    #[serde(default)]
    pub code: Option<u16>,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub error_description: Option<String>,
}

impl AmErrorBody {
    /// Best human-readable text, falling back to the HTTP reason phrase.
    pub fn describe(&self, status: http::StatusCode) -> String {
        [&self.message, &self.error_description, &self.reason, &self.error]
            .into_iter()
            .flatten()
            .find(|m| !m.is_empty())
            .cloned()
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("request failed").to_string())
    }
}

/// Path of a realm below `json/`: `root` is `realms/root`, `alpha/beta`
/// is `realms/root/realms/alpha/realms/beta`.
pub fn realm_path(realm: &str) -> String {
    let mut path = String::from("realms/root");
    for part in realm.split('/').filter(|p| !p.is_empty() && *p != "root") {
        path.push_str("/realms/");
        path.push_str(part);
    }
    path
}

impl AmCallback {
    /// Bridge callback: `prompt`/`message` outputs map to the same fields,
    /// every other output is kept under its own name.
    pub fn to_callback(&self) -> Callback {
        let mut callback = Callback::new(self.kind.as_str());
        let mut extra = Map::new();
        for output in &self.output {
            match (output.name.as_str(), &output.value) {
                ("prompt", Value::String(prompt)) => callback = callback.with_prompt(prompt.clone()),
                ("message", Value::String(message)) => {
                    callback = callback.with_message(message.clone())
                }
                (name, value) => {
                    extra.insert(name.to_string(), value.clone());
                }
            }
        }
        for (key, value) in extra {
            callback = callback.with_extra(key, value);
        }
        if !callback.kind().is_secret() {
            if let Some(Value::String(value)) = self.input.first().map(|i| &i.value) {
                if !value.is_empty() {
                    callback = callback.with_value(value.clone());
                }
            }
        }
        callback
    }

    /// Write a submitted value into the first input slot.
    ///
    /// The slot keeps the JSON type AM sent: Choice and Confirmation
    /// callbacks carry integer indexes, some vendor callbacks booleans.
    pub fn fill(&mut self, value: &str) -> Result<(), EngineError> {
        let kind = &self.kind;
        let slot = self
            .input
            .first_mut()
            .ok_or_else(|| EngineError::protocol(format!("{kind} has no input slot")))?;
        let mismatch = |expected: &str| {
            EngineError::protocol(format!("{kind} expects {expected}, got '{value}'"))
        };
        slot.value = match &slot.value {
            Value::Number(_) => value
                .trim()
                .parse::<i64>()
                .map(Value::from)
                .map_err(|_| mismatch("an integer"))?,
            Value::Bool(_) => value
                .trim()
                .parse::<bool>()
                .map(Value::Bool)
                .map_err(|_| mismatch("true or false"))?,
            _ => Value::String(value.to_string()),
        };
        Ok(())
    }
}

/// What an `/authenticate` answer means for the journey.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// More callbacks to answer, with the `authId` to send them back under
    Continue { auth_id: String, callbacks: Vec<AmCallback>, node: WireNode },
    /// Authenticated. `token_id` is absent when the journey ran with `noSession`
    Success { token_id: Option<String>, node: WireNode },
    /// The journey rejected the user
    Failure(WireNode),
    /// A recoverable problem with the submission
    Error(WireNode),
}

impl Step {
    pub fn node(&self) -> &WireNode {
        match self {
            Step::Continue { node, .. } | Step::Success { node, .. } => node,
            Step::Failure(node) | Step::Error(node) => node,
        }
    }
}

/// Interpret an `/authenticate` answer.
///
/// 2xx bodies carry callbacks or a token; 401 ends the journey; other 4xx
/// leave it recoverable; anything else is an engine failure.
pub fn interpret(status: http::StatusCode, body: &[u8]) -> Result<Step, EngineError> {
    let id = NodeId::generate();
    if status.is_success() {
        let response: AuthResponse =
            serde_json::from_slice(body).map_err(EngineError::protocol)?;
        if let Some(auth_id) = response.auth_id {
            if response.callbacks.is_empty() {
                return Err(EngineError::protocol("authId without callbacks"));
            }
            let node = WireNode::continue_with(
                id,
                response.callbacks.iter().map(AmCallback::to_callback).collect(),
            );
            return Ok(Step::Continue {
                auth_id,
                callbacks: response.callbacks,
                node,
            });
        }
        let handle = SessionHandle::new(response.token_id.clone().unwrap_or_default());
        return Ok(Step::Success {
            token_id: response.token_id,
            node: WireNode::success(id, handle),
        });
    }

    let error: AmErrorBody = serde_json::from_slice(body).unwrap_or_default();
    let message = error.describe(status);
    if status == http::StatusCode::UNAUTHORIZED {
        Ok(Step::Failure(WireNode::failure(id, message)))
    } else if status.is_client_error() {
        Ok(Step::Error(WireNode::error(id, message)))
    } else {
        Err(EngineError::Rejected {
            status: status.as_u16(),
            message,
        })
    }
}

/// Fill the held AM callbacks with the submitted bridge callbacks, by position.
pub fn answer(
    auth_id: &str,
    held: &[AmCallback],
    submitted: &[Callback],
) -> Result<AuthResponse, EngineError> {
    if held.len() != submitted.len() {
        return Err(EngineError::protocol(format!(
            "expected {} callbacks, got {}",
            held.len(),
            submitted.len()
        )));
    }
    let mut callbacks = held.to_vec();
    for (am, cb) in callbacks.iter_mut().zip(submitted) {
        if am.kind != cb.kind().as_str() {
            return Err(EngineError::protocol(format!(
                "callback order changed: expected {}, got {}",
                am.kind,
                cb.kind()
            )));
        }
        if let Some(value) = cb.value() {
            am.fill(value)?;
        }
    }
    Ok(AuthResponse {
        auth_id: Some(auth_id.to_string()),
        callbacks,
        ..AuthResponse::default()
    })
}
