use crate::am::{
    self, AUTHENTICATE_API_VERSION, API_VERSION_HEADER, AmCallback, AmErrorBody, AuthResponse,
    SESSIONS_API_VERSION,
};
use crate::oidc::{self, Discovery, TokenResponse};
use async_trait::async_trait;
use http::header::{COOKIE, LOCATION};
use parking_lot::Mutex;
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::{Duration, Instant};
use trailhead_core::config::{OidcConfig, ResolvedConfig};
use trailhead_core::engine::{Connector, OrchestrationEngine, SharedEngine};
use trailhead_core::error::EngineError;
use trailhead_core::resume::ResumeUri;
use trailhead_core::session::{SessionHandle, TokenBundle};
use trailhead_core::telemetry::Traced;
use trailhead_core::wire::{ContinueRequest, StartOptions, WireNode};

/// Callbacks AM is waiting on, keyed by the node id handed to the controller.
#[derive(Debug, Clone)]
struct Pending {
    node_id: String,
    auth_id: String,
    callbacks: Vec<AmCallback>,
}

#[derive(Debug, Clone)]
struct CachedTokens {
    bundle: TokenBundle,
    obtained: Instant,
}

impl CachedTokens {
    fn is_expired(&self) -> bool {
        self.bundle
            .expires_in
            .is_some_and(|secs| self.obtained.elapsed() >= Duration::from_secs(secs))
    }
}

#[derive(Debug, Default)]
struct State {
    pending: Option<Pending>,
    session: Option<SessionHandle>,
    tokens: Option<CachedTokens>,
    discovery: Option<Discovery>,
}

/// Orchestration engine speaking AM's `/authenticate` REST protocol.
///
/// The AM session token from a Success answer is kept here and exchanged for
/// OIDC tokens on demand.
pub struct HttpEngine {
    client: reqwest::Client,
    config: ResolvedConfig,
    state: Mutex<State>,
}

impl HttpEngine {
    pub fn new(config: &ResolvedConfig) -> Result<Self, EngineError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(EngineError::transport)?;
        Ok(Self {
            client,
            config: config.clone(),
            state: Mutex::new(State::default()),
        })
    }

    pub fn authenticate_url(&self) -> String {
        format!(
            "{}/json/{}/authenticate",
            self.config.server_url,
            am::realm_path(&self.config.realm)
        )
    }

    pub fn logout_url(&self) -> String {
        format!(
            "{}/json/{}/sessions?_action=logout",
            self.config.server_url,
            am::realm_path(&self.config.realm)
        )
    }

    fn session_cookie(&self, session: &SessionHandle) -> String {
        format!("{}={}", self.config.cookie, session.as_str())
    }

    async fn authenticate(
        &self,
        query: &[(String, String)],
        body: Option<AuthResponse>,
        session: Option<SessionHandle>,
    ) -> Result<WireNode, EngineError> {
        let mut request = self
            .client
            .post(self.authenticate_url())
            .header(API_VERSION_HEADER, AUTHENTICATE_API_VERSION)
            .query(query);
        request = match body {
            Some(body) => request.json(&body),
            None => request.json(&Map::new()),
        };
        if let Some(session) = session {
            request = request.header(COOKIE, self.session_cookie(&session));
        }

        let response = request.send().await.map_err(EngineError::transport)?;
        let status = response.status();
        let body = response.bytes().await.map_err(EngineError::transport)?;
        tracing::debug!(%status, bytes = body.len(), "authenticate answered");

        let mut state = self.state.lock();
        let node = match am::interpret(status, &body)? {
            am::Step::Continue {
                auth_id,
                callbacks,
                node,
            } => {
                state.pending = Some(Pending {
                    node_id: node.id.clone(),
                    auth_id,
                    callbacks,
                });
                node
            }
            am::Step::Success { token_id, node } => {
                state.pending = None;
                match token_id {
                    Some(token_id) => {
                        state.session = Some(SessionHandle::new(token_id));
                        state.tokens = None;
                    }
                    None => tracing::debug!("Journey completed without a session"),
                }
                node
            }
            am::Step::Failure(node) | am::Step::Error(node) => {
                state.pending = None;
                node
            }
        };
        Ok(node)
    }

    async fn discovery(&self, oidc: &OidcConfig) -> Result<Discovery, EngineError> {
        if let Some(discovery) = self.state.lock().discovery.clone() {
            return Ok(discovery);
        }
        let response = self
            .client
            .get(&oidc.discovery_endpoint)
            .send()
            .await
            .map_err(EngineError::transport)?;
        let status = response.status();
        if !status.is_success() {
            return Err(EngineError::Rejected {
                status: status.as_u16(),
                message: format!("OIDC discovery failed with {status}"),
            });
        }
        let discovery: Discovery = response.json().await.map_err(EngineError::protocol)?;
        self.state.lock().discovery = Some(discovery.clone());
        Ok(discovery)
    }

    /// Trade the AM session for an authorization code.
    async fn authorize(
        &self,
        discovery: &Discovery,
        oidc: &OidcConfig,
        session: &SessionHandle,
    ) -> Result<String, EngineError> {
        let csrf = uuid::Uuid::new_v4().simple().to_string();
        let url = oidc::authorize_url(discovery, oidc, &csrf)?;
        let response = self
            .client
            .get(url.clone())
            .header(COOKIE, self.session_cookie(session))
            .send()
            .await
            .map_err(EngineError::transport)?;
        let status = response.status();
        if !status.is_redirection() {
            return Err(EngineError::Unauthenticated(format!(
                "authorize answered {status} instead of a redirect"
            )));
        }
        let location = response
            .headers()
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| EngineError::protocol("authorize redirect without Location"))?;
        oidc::code_from_redirect(&url, location, &csrf)
    }

    async fn exchange(
        &self,
        discovery: &Discovery,
        form: &[(&str, &str)],
    ) -> Result<TokenBundle, EngineError> {
        let response = self
            .client
            .post(&discovery.token_endpoint)
            .form(form)
            .send()
            .await
            .map_err(EngineError::transport)?;
        let status = response.status();
        if !status.is_success() {
            let body = response.bytes().await.unwrap_or_default();
            let error: AmErrorBody = serde_json::from_slice(&body).unwrap_or_default();
            return Err(EngineError::Unauthenticated(error.describe(status)));
        }
        let tokens: TokenResponse = response.json().await.map_err(EngineError::protocol)?;
        Ok(tokens.into())
    }

    async fn fetch_tokens(
        &self,
        oidc: &OidcConfig,
        session: &SessionHandle,
        expired: Option<TokenBundle>,
    ) -> Result<TokenBundle, EngineError> {
        let discovery = self.discovery(oidc).await?;
        if let Some(refresh) = expired.and_then(|t| t.refresh_token) {
            let refreshed = self
                .exchange(
                    &discovery,
                    &[
                        ("grant_type", "refresh_token"),
                        ("refresh_token", refresh.as_str()),
                        ("client_id", oidc.client_id.as_str()),
                    ],
                )
                .await;
            match refreshed {
                Ok(tokens) => return Ok(tokens),
                Err(e) => tracing::debug!(error = %e, "Refresh failed, re-authorizing with session"),
            }
        }
        let code = self.authorize(&discovery, oidc, session).await?;
        self.exchange(
            &discovery,
            &[
                ("grant_type", "authorization_code"),
                ("code", code.as_str()),
                ("redirect_uri", oidc.redirect_uri.as_str()),
                ("client_id", oidc.client_id.as_str()),
            ],
        )
        .await
    }

    async fn revoke(&self, oidc: &OidcConfig, tokens: &TokenBundle) {
        let Some(endpoint) = self
            .state
            .lock()
            .discovery
            .as_ref()
            .and_then(|d| d.revocation_endpoint.clone())
        else {
            return;
        };
        let token = tokens.refresh_token.as_deref().unwrap_or(&tokens.access_token);
        let result = self
            .client
            .post(endpoint)
            .form(&[("token", token), ("client_id", oidc.client_id.as_str())])
            .send()
            .await;
        if let Err(e) = result {
            tracing::warn!(error = %e, "Token revocation failed");
        }
    }
}

#[async_trait]
impl OrchestrationEngine for HttpEngine {
    async fn start(&self, journey: &str, options: StartOptions) -> Result<WireNode, EngineError> {
        let mut query = vec![
            ("authIndexType".to_string(), "service".to_string()),
            ("authIndexValue".to_string(), journey.to_string()),
        ];
        if options.force_auth {
            query.push(("ForceAuth".to_string(), "true".to_string()));
        }
        if options.no_session {
            query.push(("noSession".to_string(), "true".to_string()));
        }
        let session = if options.force_auth {
            None
        } else {
            self.state.lock().session.clone()
        };
        self.authenticate(&query, None, session).await
    }

    async fn next(&self, request: ContinueRequest) -> Result<WireNode, EngineError> {
        let pending = self
            .state
            .lock()
            .pending
            .clone()
            .filter(|p| p.node_id == request.node_id.as_str())
            .ok_or_else(|| EngineError::Rejected {
                status: 400,
                message: format!("no pending callbacks for node {}", request.node_id),
            })?;
        let body = am::answer(&pending.auth_id, &pending.callbacks, &request.callbacks)?;
        self.authenticate(&[], Some(body), None).await
    }

    async fn resume(&self, uri: &ResumeUri) -> Result<WireNode, EngineError> {
        let query = uri.query_pairs();
        if !query.iter().any(|(key, _)| key == "suspendedId") {
            return Err(EngineError::Rejected {
                status: 400,
                message: "resume link carries no suspendedId".to_string(),
            });
        }
        self.authenticate(&query, None, None).await
    }

    async fn token(&self) -> Result<Option<TokenBundle>, EngineError> {
        let Some(oidc) = self.config.oidc.as_ref() else {
            tracing::debug!("OIDC not configured, no tokens");
            return Ok(None);
        };
        let (session, cached) = {
            let state = self.state.lock();
            (state.session.clone(), state.tokens.clone())
        };
        let Some(session) = session else {
            return Ok(None);
        };
        let expired = match cached {
            Some(cached) if !cached.is_expired() => return Ok(Some(cached.bundle)),
            Some(cached) => Some(cached.bundle),
            None => None,
        };

        let bundle = self.fetch_tokens(oidc, &session, expired).await?;
        self.state.lock().tokens = Some(CachedTokens {
            bundle: bundle.clone(),
            obtained: Instant::now(),
        });
        Ok(Some(bundle))
    }

    async fn user_info(&self, tokens: &TokenBundle) -> Result<Map<String, Value>, EngineError> {
        let oidc = self
            .config
            .oidc
            .as_ref()
            .ok_or_else(|| EngineError::protocol("OIDC not configured"))?;
        let discovery = self.discovery(oidc).await?;
        let endpoint = discovery
            .userinfo_endpoint
            .ok_or_else(|| EngineError::protocol("discovery document has no userinfo_endpoint"))?;
        let response = self
            .client
            .get(endpoint)
            .bearer_auth(&tokens.access_token)
            .send()
            .await
            .map_err(EngineError::transport)?;
        let status = response.status();
        if !status.is_success() {
            return Err(EngineError::Rejected {
                status: status.as_u16(),
                message: format!("userinfo failed with {status}"),
            });
        }
        response.json().await.map_err(EngineError::protocol)
    }

    async fn logout(&self) -> Result<(), EngineError> {
        let (session, tokens) = {
            let mut state = self.state.lock();
            state.pending = None;
            (state.session.take(), state.tokens.take())
        };
        if let (Some(oidc), Some(tokens)) = (self.config.oidc.as_ref(), tokens) {
            self.revoke(oidc, &tokens.bundle).await;
        }
        let Some(session) = session else {
            return Ok(());
        };

        let response = self
            .client
            .post(self.logout_url())
            .header(API_VERSION_HEADER, SESSIONS_API_VERSION)
            .header(COOKIE, self.session_cookie(&session))
            .json(&Map::new())
            .send()
            .await
            .map_err(EngineError::transport)?;
        let status = response.status();
        // 401: the session was already gone
        if status.is_success() || status == http::StatusCode::UNAUTHORIZED {
            Ok(())
        } else {
            Err(EngineError::Rejected {
                status: status.as_u16(),
                message: format!("logout failed with {status}"),
            })
        }
    }
}

/// Builds a traced [`HttpEngine`] for each configuration.
#[derive(Debug, Clone, Copy, Default)]
pub struct HttpConnector;

impl Connector for HttpConnector {
    fn connect(&self, config: &ResolvedConfig) -> Result<SharedEngine, EngineError> {
        let engine = HttpEngine::new(config)?;
        tracing::debug!(url = %engine.authenticate_url(), "Built AM engine");
        Ok(Arc::new(Traced::new(engine, "am")))
    }
}
