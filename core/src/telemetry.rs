//! # Telemetry: Observability Decorators
//!
//! [`Traced`] wraps any [`OrchestrationEngine`] and records a span plus an
//! outcome event for every bridge call.

use crate::engine::OrchestrationEngine;
use crate::error::EngineError;
use crate::node::NodeKind;
use crate::resume::ResumeUri;
use crate::session::TokenBundle;
use crate::wire::{ContinueRequest, StartOptions, WireNode};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::time::Instant;
use tracing::{Instrument, info_span};

/// A wrapper engine that adds tracing to any inner engine.
#[derive(Clone)]
pub struct Traced<E> {
    inner: E,
    name: String,
}

impl<E> Traced<E> {
    pub fn new(inner: E, name: &str) -> Self {
        Self {
            inner,
            name: name.to_string(),
        }
    }

    pub fn inner(&self) -> &E {
        &self.inner
    }
}

fn record_node(op: &str, result: &Result<WireNode, EngineError>, started: Instant) {
    let duration = started.elapsed();
    match result {
        Ok(node) => {
            let kind = NodeKind::from_wire_name(&node.kind);
            let callbacks = node.callbacks.as_ref().map_or(0, Vec::len);
            tracing::info!(op, node.id = %node.id, node.kind = %kind, callbacks, ?duration, "Engine returned node");
        }
        Err(e) => {
            tracing::error!(op, error = %e, ?duration, "Engine call failed");
        }
    }
}

#[async_trait]
impl<E: OrchestrationEngine> OrchestrationEngine for Traced<E> {
    async fn start(&self, journey: &str, options: StartOptions) -> Result<WireNode, EngineError> {
        let span = info_span!("Engine", trailhead.engine = %self.name, trailhead.op = "start", journey);
        async move {
            tracing::debug!(?options, "Starting journey");
            let started = Instant::now();
            let result = self.inner.start(journey, options).await;
            record_node("start", &result, started);
            result
        }
        .instrument(span)
        .await
    }

    async fn next(&self, request: ContinueRequest) -> Result<WireNode, EngineError> {
        let span = info_span!("Engine", trailhead.engine = %self.name, trailhead.op = "next", node.id = %request.node_id);
        async move {
            tracing::debug!(callbacks = request.callbacks.len(), "Submitting node");
            let started = Instant::now();
            let result = self.inner.next(request).await;
            record_node("next", &result, started);
            result
        }
        .instrument(span)
        .await
    }

    async fn resume(&self, uri: &ResumeUri) -> Result<WireNode, EngineError> {
        let span = info_span!("Engine", trailhead.engine = %self.name, trailhead.op = "resume");
        async move {
            let started = Instant::now();
            let result = self.inner.resume(uri).await;
            record_node("resume", &result, started);
            result
        }
        .instrument(span)
        .await
    }

    async fn token(&self) -> Result<Option<TokenBundle>, EngineError> {
        let span = info_span!("Engine", trailhead.engine = %self.name, trailhead.op = "token");
        async move {
            let result = self.inner.token().await;
            match &result {
                Ok(Some(tokens)) => tracing::info!(expires_in = ?tokens.expires_in, "Token available"),
                Ok(None) => tracing::info!("No token, no session"),
                Err(e) => tracing::error!(error = %e, "Token fetch failed"),
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn user_info(&self, tokens: &TokenBundle) -> Result<Map<String, Value>, EngineError> {
        let span = info_span!("Engine", trailhead.engine = %self.name, trailhead.op = "user_info");
        async move {
            let result = self.inner.user_info(tokens).await;
            if let Ok(claims) = &result {
                tracing::debug!(claims = claims.len(), "User info fetched");
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn logout(&self) -> Result<(), EngineError> {
        let span = info_span!("Engine", trailhead.engine = %self.name, trailhead.op = "logout");
        async move {
            let result = self.inner.logout().await;
            if let Err(e) = &result {
                tracing::error!(error = %e, "Logout failed");
            }
            result
        }
        .instrument(span)
        .await
    }
}
