//! Middleware configuration with pluggable strategies.
//!
//! Every strategy is resolved exactly once when the middleware is installed
//! and shared read-only across all concurrent requests. Strategies left
//! unset fall back to the process-wide OpenTelemetry registries; those
//! lookups happen at resolve time, with one exception: the propagator
//! registry is only reachable through [`global::get_text_map_propagator`],
//! so the unset-propagator fallback reads it per request.

use std::fmt;
use std::sync::Arc;

use axum::extract::Request;
use axum::http::Method;
use opentelemetry::KeyValue;
use opentelemetry::global::{self, BoxedTracer};
use opentelemetry::metrics::{Meter, MeterProvider};
use opentelemetry::propagation::TextMapPropagator;
use opentelemetry::trace::{Span, Tracer, TracerProvider};

use crate::instruments::ServerInstruments;
use crate::semconv;

/// Route information handed to a [`SpanNameFormatter`] after dispatch.
#[derive(Debug)]
pub struct RouteInfo<'a> {
    /// Request method.
    pub method: &'a Method,
    /// Literal request path (`/users/42`).
    pub path: &'a str,
    /// Route template matched by the router (`/users/{id}`), when the
    /// router matched one.
    pub route: Option<&'a str>,
}

/// Strategy producing the final span name once the route is known.
pub type SpanNameFormatter = Arc<dyn Fn(&RouteInfo<'_>) -> String + Send + Sync>;

/// Hook contributing extra request-phase attributes.
///
/// Providers run after the standard extraction and can only append; the
/// mandatory standardized tags are never removed.
pub type AttributeProvider = Arc<dyn Fn(&Request) -> Vec<KeyValue> + Send + Sync>;

/// Predicate deciding whether a request is instrumented at all.
pub type RequestFilter = Arc<dyn Fn(&Request) -> bool + Send + Sync>;

/// Configuration for [`RouterExt::with_otel_observability`].
///
/// [`RouterExt::with_otel_observability`]: crate::middleware::RouterExt::with_otel_observability
#[derive(Default)]
#[must_use = "config does nothing unless you use it"]
pub struct OtelConfig {
    tracer: Option<BoxedTracer>,
    meter: Option<Meter>,
    propagator: Option<Box<dyn TextMapPropagator + Send + Sync>>,
    span_name_formatter: Option<SpanNameFormatter>,
    attribute_providers: Vec<AttributeProvider>,
    filter: Option<RequestFilter>,
}

impl OtelConfig {
    /// Creates a configuration where every strategy uses its default.
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the tracer provider used to create request spans.
    ///
    /// Defaults to the process-wide global provider.
    pub fn with_tracer_provider<P, T, S>(mut self, provider: &P) -> Self
    where
        P: TracerProvider<Tracer = T>,
        T: Tracer<Span = S> + Send + Sync + 'static,
        S: Span + Send + Sync + 'static,
    {
        let tracer = provider.tracer(semconv::INSTRUMENTATION_NAME);
        self.tracer = Some(BoxedTracer::new(Box::new(tracer)));
        self
    }

    /// Overrides the meter provider used to create the metric instruments.
    ///
    /// Defaults to the process-wide global provider.
    pub fn with_meter_provider(mut self, provider: &impl MeterProvider) -> Self {
        self.meter = Some(provider.meter(semconv::INSTRUMENTATION_NAME));
        self
    }

    /// Overrides the propagator used to decode parent trace context from
    /// inbound headers.
    ///
    /// Defaults to the process-wide global registry.
    pub fn with_propagator(
        mut self,
        propagator: impl TextMapPropagator + Send + Sync + 'static,
    ) -> Self {
        self.propagator = Some(Box::new(propagator));
        self
    }

    /// Overrides the span naming strategy.
    ///
    /// The default returns the matched route template; requests the router
    /// did not match keep the literal request path as their span name.
    pub fn with_span_name_formatter<F>(mut self, formatter: F) -> Self
    where
        F: Fn(&RouteInfo<'_>) -> String + Send + Sync + 'static,
    {
        self.span_name_formatter = Some(Arc::new(formatter));
        self
    }

    /// Registers a hook appending custom request-phase attributes, e.g.
    /// user-agent or tenant dimensions. May be called multiple times.
    pub fn with_attribute_provider<F>(mut self, provider: F) -> Self
    where
        F: Fn(&Request) -> Vec<KeyValue> + Send + Sync + 'static,
    {
        self.attribute_providers.push(Arc::new(provider));
        self
    }

    /// Skips instrumentation entirely for requests the predicate rejects.
    pub fn with_filter<F>(mut self, filter: F) -> Self
    where
        F: Fn(&Request) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Arc::new(filter));
        self
    }

    /// Resolves all strategies into the immutable per-layer state.
    pub(crate) fn resolve(self) -> ResolvedConfig {
        let tracer = self
            .tracer
            .unwrap_or_else(|| global::tracer(semconv::INSTRUMENTATION_NAME));
        let meter = self
            .meter
            .unwrap_or_else(|| global::meter(semconv::INSTRUMENTATION_NAME));

        ResolvedConfig {
            tracer,
            instruments: ServerInstruments::new(&meter),
            propagator: self.propagator,
            span_name_formatter: self
                .span_name_formatter
                .unwrap_or_else(|| Arc::new(default_span_name)),
            attribute_providers: self.attribute_providers,
            filter: self.filter,
        }
    }
}

impl fmt::Debug for OtelConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OtelConfig")
            .field("tracer", &self.tracer.is_some())
            .field("meter", &self.meter.is_some())
            .field("propagator", &self.propagator.is_some())
            .field("span_name_formatter", &self.span_name_formatter.is_some())
            .field("attribute_providers", &self.attribute_providers.len())
            .field("filter", &self.filter.is_some())
            .finish()
    }
}

/// Per-layer state after strategy resolution; immutable and shared across
/// all concurrent request invocations.
pub(crate) struct ResolvedConfig {
    pub(crate) tracer: BoxedTracer,
    pub(crate) instruments: ServerInstruments,
    pub(crate) propagator: Option<Box<dyn TextMapPropagator + Send + Sync>>,
    pub(crate) span_name_formatter: SpanNameFormatter,
    pub(crate) attribute_providers: Vec<AttributeProvider>,
    pub(crate) filter: Option<RequestFilter>,
}

/// Default naming strategy: the matched route template, or the literal
/// path when the router matched nothing.
fn default_span_name(info: &RouteInfo<'_>) -> String {
    info.route.unwrap_or(info.path).to_owned()
}
