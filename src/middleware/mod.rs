//! Observability middleware for `axum::Router`.
//!
//! This module provides the request-scoped interception layer:
//! - One server-kind span per request, parented on any propagated trace
//!   context found in the inbound headers
//! - Duration, request-size and response-size histograms plus an in-flight
//!   gauge, recorded once per request on a guaranteed teardown path
//! - The active span exposed to downstream handlers through the request
//!   extensions

mod interceptor;

use std::sync::Arc;

use axum::Router;
use axum::extract::Request;
use axum::middleware::{Next, from_fn};

use crate::config::OtelConfig;
use crate::middleware::interceptor::intercept;

/// Tracing target for diagnostics emitted by the middleware itself.
pub const TRACING_TARGET: &str = "axum_otel_http::middleware";

/// Extension trait for `axum::`[`Router`] installing the observability
/// layer.
pub trait RouterExt<S> {
    /// Layers the tracing-and-metrics middleware onto the router.
    ///
    /// Strategies in `config` are resolved once here; every request then
    /// reads the resolved configuration concurrently without locking. The
    /// layer applies to all routes added before this call, including the
    /// fallback.
    fn with_otel_observability(self, config: OtelConfig) -> Self;
}

impl<S> RouterExt<S> for Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    fn with_otel_observability(self, config: OtelConfig) -> Self {
        let shared = Arc::new(config.resolve());
        self.layer(from_fn(move |req: Request, next: Next| {
            let shared = Arc::clone(&shared);
            async move { intercept(shared, req, next).await }
        }))
    }
}
