//! # Journey configuration
//!
//! [`JourneyConfig`] is the raw, caller-supplied shape (camelCase JSON from a
//! bridge, or a TOML file). [`JourneyConfig::resolve`] validates it into a
//! [`ResolvedConfig`] that engines are built from.

use crate::error::{JourneyError, JourneyResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_REALM: &str = "root";
pub const DEFAULT_COOKIE: &str = "iPlanetDirectoryPro";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(30_000);
pub const DEFAULT_SCOPES: [&str; 5] = ["openid", "email", "address", "profile", "phone"];

/// Caller-supplied journey configuration.
///
/// ```toml
/// serverUrl = "https://idp.example/am"
/// realm = "alpha"
/// clientId = "mobile"
/// discoveryEndpoint = "https://idp.example/am/oauth2/alpha/.well-known/openid-configuration"
/// redirectUri = "com.example.app://oauth2redirect"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JourneyConfig {
    pub server_url: Option<String>,
    pub realm: Option<String>,
    /// Session cookie name.
    pub cookie: Option<String>,
    /// Request timeout in milliseconds.
    pub timeout: Option<u64>,
    pub client_id: Option<String>,
    pub discovery_endpoint: Option<String>,
    pub redirect_uri: Option<String>,
    pub scopes: Option<Vec<String>>,
}

impl JourneyConfig {
    pub fn new(server_url: impl Into<String>) -> Self {
        Self {
            server_url: Some(server_url.into()),
            ..Default::default()
        }
    }

    pub fn with_realm(mut self, realm: impl Into<String>) -> Self {
        self.realm = Some(realm.into());
        self
    }

    pub fn with_cookie(mut self, cookie: impl Into<String>) -> Self {
        self.cookie = Some(cookie.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX));
        self
    }

    pub fn with_oidc(
        mut self,
        client_id: impl Into<String>,
        discovery_endpoint: impl Into<String>,
        redirect_uri: impl Into<String>,
    ) -> Self {
        self.client_id = Some(client_id.into());
        self.discovery_endpoint = Some(discovery_endpoint.into());
        self.redirect_uri = Some(redirect_uri.into());
        self
    }

    pub fn with_scopes<I, S>(mut self, scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.scopes = Some(scopes.into_iter().map(Into::into).collect());
        self
    }

    pub fn from_json_str(raw: &str) -> JourneyResult<Self> {
        serde_json::from_str(raw).map_err(|e| JourneyError::configuration(e.to_string()))
    }

    pub fn from_toml_str(raw: &str) -> JourneyResult<Self> {
        toml::from_str(raw).map_err(|e| JourneyError::configuration(e.to_string()))
    }

    /// Load from a `.json` or `.toml` file (anything else is read as TOML).
    pub fn load(path: impl AsRef<Path>) -> JourneyResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            JourneyError::configuration(format!("cannot read {}: {e}", path.display()))
        })?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::from_json_str(&raw),
            _ => Self::from_toml_str(&raw),
        }
    }

    /// Validate and fill in defaults.
    pub fn resolve(&self) -> JourneyResult<ResolvedConfig> {
        let server_url = match self.server_url.as_deref().map(str::trim) {
            Some(url) if !url.is_empty() => url,
            _ => {
                return Err(JourneyError::configuration(
                    "missing required parameter: serverUrl",
                ));
            }
        };
        require_absolute_http(server_url, "serverUrl")?;

        let oidc = match (&self.client_id, &self.discovery_endpoint, &self.redirect_uri) {
            (Some(client_id), Some(discovery), Some(redirect_uri)) => {
                require_absolute_http(discovery, "discoveryEndpoint")?;
                Some(OidcConfig {
                    client_id: client_id.clone(),
                    discovery_endpoint: discovery.clone(),
                    redirect_uri: redirect_uri.clone(),
                    scopes: self
                        .scopes
                        .clone()
                        .unwrap_or_else(|| DEFAULT_SCOPES.iter().map(|s| s.to_string()).collect()),
                })
            }
            (None, None, None) => None,
            _ => {
                tracing::debug!("OIDC module not configured, clientId/discoveryEndpoint/redirectUri incomplete");
                None
            }
        };

        Ok(ResolvedConfig {
            server_url: server_url.trim_end_matches('/').to_string(),
            realm: self.realm.clone().unwrap_or_else(|| DEFAULT_REALM.to_string()),
            cookie: self.cookie.clone().unwrap_or_else(|| DEFAULT_COOKIE.to_string()),
            timeout: self
                .timeout
                .map(Duration::from_millis)
                .unwrap_or(DEFAULT_TIMEOUT),
            oidc,
        })
    }
}

fn require_absolute_http(raw: &str, field: &str) -> JourneyResult<()> {
    let uri: http::Uri = raw
        .parse()
        .map_err(|e| JourneyError::configuration(format!("{field} is not a valid url: {e}")))?;
    match (uri.scheme_str(), uri.authority()) {
        (Some("http" | "https"), Some(_)) => Ok(()),
        _ => Err(JourneyError::configuration(format!(
            "{field} must be an absolute http(s) url"
        ))),
    }
}

/// OIDC sub-configuration. Present only when fully specified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OidcConfig {
    pub client_id: String,
    pub discovery_endpoint: String,
    pub redirect_uri: String,
    pub scopes: Vec<String>,
}

/// Validated configuration with defaults applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedConfig {
    /// Base url without trailing slash.
    pub server_url: String,
    pub realm: String,
    pub cookie: String,
    /// Applied to every network call made under this configuration.
    pub timeout: Duration,
    pub oidc: Option<OidcConfig>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_server_url_is_rejected() {
        let err = JourneyConfig::default().resolve().unwrap_err();
        assert_eq!(err.code(), "CONFIG_ERROR");

        let err = JourneyConfig::new("   ").resolve().unwrap_err();
        assert_eq!(err.code(), "CONFIG_ERROR");
    }

    #[test]
    fn test_relative_server_url_is_rejected() {
        assert!(JourneyConfig::new("idp.example/am").resolve().is_err());
    }

    #[test]
    fn test_defaults() {
        let resolved = JourneyConfig::new("https://idp.example/am/").resolve().unwrap();
        assert_eq!(resolved.server_url, "https://idp.example/am");
        assert_eq!(resolved.realm, "root");
        assert_eq!(resolved.cookie, "iPlanetDirectoryPro");
        assert_eq!(resolved.timeout, Duration::from_secs(30));
        assert!(resolved.oidc.is_none());
    }

    #[test]
    fn test_partial_oidc_is_disabled() {
        let mut cfg = JourneyConfig::new("https://idp.example/am");
        cfg.client_id = Some("mobile".into());
        assert!(cfg.resolve().unwrap().oidc.is_none());
    }

    #[test]
    fn test_json_bridge_shape() {
        let cfg = JourneyConfig::from_json_str(
            r#"{
                "serverUrl": "https://idp.example/am",
                "realm": "alpha",
                "cookie": "5421aeddf91aa20",
                "clientId": "mobile",
                "discoveryEndpoint": "https://idp.example/am/oauth2/alpha/.well-known/openid-configuration",
                "redirectUri": "com.example.app://oauth2redirect"
            }"#,
        )
        .unwrap();
        let resolved = cfg.resolve().unwrap();
        assert_eq!(resolved.realm, "alpha");
        let oidc = resolved.oidc.unwrap();
        assert_eq!(oidc.scopes, DEFAULT_SCOPES.to_vec());
    }

    #[test]
    fn test_toml_shape() {
        let cfg = JourneyConfig::from_toml_str(
            r#"
            serverUrl = "https://idp.example/am"
            timeout = 5000
            scopes = ["openid"]
            "#,
        )
        .unwrap();
        let resolved = cfg.resolve().unwrap();
        assert_eq!(resolved.timeout, Duration::from_secs(5));
        assert_eq!(cfg.scopes, Some(vec!["openid".to_string()]));
    }

    #[test]
    fn test_timeout_saturates() {
        let cfg = JourneyConfig::new("https://idp.example/am").with_timeout(Duration::MAX);
        assert_eq!(cfg.timeout, Some(u64::MAX));

        let cfg = JourneyConfig::new("https://idp.example/am").with_timeout(Duration::from_millis(1500));
        assert_eq!(cfg.resolve().unwrap().timeout, Duration::from_millis(1500));
    }
}
