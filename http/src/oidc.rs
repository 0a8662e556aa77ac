//! OIDC authorization-code exchange against the AM session.

use reqwest::Url;
use serde::Deserialize;
use trailhead_core::config::OidcConfig;
use trailhead_core::error::EngineError;
use trailhead_core::session::TokenBundle;

/// The fields of the discovery document the exchange needs.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Discovery {
    pub authorization_endpoint: String,
    pub token_endpoint: String,
    #[serde(default)]
    pub userinfo_endpoint: Option<String>,
    #[serde(default)]
    pub end_session_endpoint: Option<String>,
    #[serde(default)]
    pub revocation_endpoint: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
    #[serde(default)]
    pub id_token: Option<String>,
}

impl From<TokenResponse> for TokenBundle {
    fn from(response: TokenResponse) -> Self {
        TokenBundle {
            access_token: response.access_token,
            refresh_token: response.refresh_token,
            expires_in: response.expires_in,
            id_token: response.id_token,
        }
    }
}

/// Authorize request for `response_type=code`.
pub fn authorize_url(
    discovery: &Discovery,
    oidc: &OidcConfig,
    state: &str,
) -> Result<Url, EngineError> {
    let mut url = Url::parse(&discovery.authorization_endpoint).map_err(EngineError::protocol)?;
    url.query_pairs_mut()
        .append_pair("client_id", &oidc.client_id)
        .append_pair("response_type", "code")
        .append_pair("redirect_uri", &oidc.redirect_uri)
        .append_pair("scope", &oidc.scopes.join(" "))
        .append_pair("state", state);
    Ok(url)
}

/// Pull the authorization code out of the authorize redirect.
///
/// `location` may be relative to the authorize endpoint. An `error`
/// parameter means the server refused to issue a code for this session.
pub fn code_from_redirect(authorize: &Url, location: &str, state: &str) -> Result<String, EngineError> {
    let redirect = authorize.join(location).map_err(EngineError::protocol)?;
    let mut code = None;
    let mut returned_state = None;
    let mut error = None;
    let mut description = None;
    for (key, value) in redirect.query_pairs() {
        match key.as_ref() {
            "code" => code = Some(value.into_owned()),
            "state" => returned_state = Some(value.into_owned()),
            "error" => error = Some(value.into_owned()),
            "error_description" => description = Some(value.into_owned()),
            _ => {}
        }
    }
    if let Some(error) = error {
        return Err(EngineError::Unauthenticated(description.unwrap_or(error)));
    }
    if returned_state.as_deref().is_some_and(|s| s != state) {
        return Err(EngineError::Unauthenticated("authorize state mismatch".to_string()));
    }
    code.ok_or_else(|| EngineError::Unauthenticated("authorize redirect carried no code".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn discovery() -> Discovery {
        serde_json::from_value(serde_json::json!({
            "issuer": "https://idp.example/am/oauth2",
            "authorization_endpoint": "https://idp.example/am/oauth2/authorize",
            "token_endpoint": "https://idp.example/am/oauth2/access_token",
            "userinfo_endpoint": "https://idp.example/am/oauth2/userinfo"
        }))
        .unwrap()
    }

    fn oidc() -> OidcConfig {
        OidcConfig {
            client_id: "mobile".into(),
            discovery_endpoint: "https://idp.example/am/oauth2/.well-known/openid-configuration".into(),
            redirect_uri: "com.example.app://oauth2redirect".into(),
            scopes: vec!["openid".into(), "profile".into()],
        }
    }

    #[test]
    fn test_authorize_url() {
        let url = authorize_url(&discovery(), &oidc(), "s1").unwrap();
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert!(pairs.contains(&("response_type".into(), "code".into())));
        assert!(pairs.contains(&("scope".into(), "openid profile".into())));
        assert!(pairs.contains(&("redirect_uri".into(), "com.example.app://oauth2redirect".into())));
    }

    #[test]
    fn test_code_from_redirect() {
        let authorize = Url::parse("https://idp.example/am/oauth2/authorize").unwrap();
        let code = code_from_redirect(
            &authorize,
            "com.example.app://oauth2redirect?code=abc123&state=s1&iss=x",
            "s1",
        )
        .unwrap();
        assert_eq!(code, "abc123");
    }

    #[test]
    fn test_redirect_error_and_state() {
        let authorize = Url::parse("https://idp.example/am/oauth2/authorize").unwrap();
        let err = code_from_redirect(
            &authorize,
            "com.example.app://oauth2redirect?error=access_denied&error_description=Consent+required",
            "s1",
        )
        .unwrap_err();
        assert_eq!(err, EngineError::Unauthenticated("Consent required".into()));

        let err = code_from_redirect(&authorize, "/callback?code=abc&state=other", "s1").unwrap_err();
        assert!(matches!(err, EngineError::Unauthenticated(_)));
    }
}
