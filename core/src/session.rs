//! Session data produced once a journey reaches Success.
//!
//! Nothing here is persisted. The token bundle is fetched from the engine on
//! demand and user-info claims are an optional second fetch.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

/// Opaque engine handle carried by a Success node (e.g. an SSO token id).
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionHandle(String);

impl SessionHandle {
    pub fn new(handle: impl Into<String>) -> Self {
        SessionHandle(handle.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// An empty handle means the engine keeps the session to itself.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionHandle(<redacted>)")
    }
}

/// Tokens issued by the engine's OIDC module.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenBundle {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
    #[serde(default)]
    pub id_token: Option<String>,
}

impl TokenBundle {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: None,
            expires_in: None,
            id_token: None,
        }
    }
}

impl fmt::Debug for TokenBundle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenBundle")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
            .field("expires_in", &self.expires_in)
            .finish()
    }
}

/// User-info claims flattened to scalar strings.
pub type UserInfo = BTreeMap<String, String>;

/// Flatten a claims object. Strings are kept as-is; every other JSON value
/// (numbers, booleans, arrays, nested objects) is rendered as JSON text.
pub fn flatten_claims(claims: &Map<String, Value>) -> UserInfo {
    claims
        .iter()
        .map(|(key, value)| {
            let scalar = match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            (key.clone(), scalar)
        })
        .collect()
}

/// The authenticated user's token state as handed to the caller.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_info: Option<UserInfo>,
}

impl Session {
    pub fn new(tokens: TokenBundle, user_info: Option<UserInfo>) -> Self {
        Self {
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
            expires_in: tokens.expires_in,
            user_info,
        }
    }

    pub fn claim(&self, name: &str) -> Option<&str> {
        self.user_info.as_ref()?.get(name).map(String::as_str)
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("access_token", &"<redacted>")
            .field("expires_in", &self.expires_in)
            .field("user_info", &self.user_info)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_flatten_claims() {
        let claims = json!({
            "sub": "u-1",
            "given_name": "Alice",
            "email_verified": true,
            "address": {"country": "NZ"}
        });
        let info = flatten_claims(claims.as_object().unwrap());
        assert_eq!(info["given_name"], "Alice");
        assert_eq!(info["email_verified"], "true");
        assert_eq!(info["address"], r#"{"country":"NZ"}"#);
    }

    #[test]
    fn test_session_wire_shape() {
        let mut tokens = TokenBundle::new("at-1");
        tokens.expires_in = Some(3599);
        let session = Session::new(tokens, None);
        let json = serde_json::to_value(&session).unwrap();
        assert_eq!(json, json!({"accessToken": "at-1", "expiresIn": 3599}));
        assert!(!format!("{session:?}").contains("at-1"));
    }
}
