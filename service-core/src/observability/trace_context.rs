//! W3C Trace Context propagation for service-to-service calls.
//!
//! The trace context is carried as an explicit [`TraceContext`] value: it is
//! extracted once at the request boundary, handed to each step that starts a
//! span or performs I/O, and injected into outbound request headers as
//! `traceparent`/`tracestate`.
//!
//! See: https://www.w3.org/TR/trace-context/

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use opentelemetry::Context;
use opentelemetry::propagation::{Extractor, Injector, TextMapPropagator};
use opentelemetry::trace::{TraceContextExt, TraceId};
use opentelemetry_sdk::propagation::TraceContextPropagator;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use std::convert::Infallible;
use std::fmt::Display;
use std::time::Duration;
use tracing::{Span, field};
use tracing_opentelemetry::OpenTelemetrySpanExt;

/// Header name for W3C traceparent
pub const TRACEPARENT_HEADER: &str = "traceparent";

/// Header name for W3C tracestate
pub const TRACESTATE_HEADER: &str = "tracestate";

/// Header name for request correlation ID
pub const REQUEST_ID_HEADER: &str = "x-request-id";

struct HeaderExtractor<'a>(&'a HeaderMap);

impl Extractor for HeaderExtractor<'_> {
    fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(|v| v.to_str().ok())
    }

    fn keys(&self) -> Vec<&str> {
        self.0.keys().map(|k| k.as_str()).collect()
    }
}

struct HeaderInjector<'a>(&'a mut HeaderMap);

impl Injector for HeaderInjector<'_> {
    fn set(&mut self, key: &str, value: String) {
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(key.as_bytes()),
            HeaderValue::from_str(&value),
        ) {
            self.0.insert(name, value);
        }
    }
}

/// Immutable handle on the distributed trace a request belongs to.
#[derive(Clone, Debug, Default)]
pub struct TraceContext {
    cx: Context,
}

impl TraceContext {
    /// Extract the remote parent from inbound `traceparent`/`tracestate`.
    ///
    /// Missing or malformed headers yield an empty context, so the first span
    /// started under it becomes a new trace root.
    pub fn extract(headers: &HeaderMap) -> Self {
        let cx = TraceContextPropagator::new().extract(&HeaderExtractor(headers));
        Self { cx }
    }

    /// Context of an existing span, e.g. the per-request `http_request` span.
    pub fn from_span(span: &Span) -> Self {
        Self {
            cx: span.context(),
        }
    }

    /// Write this context into outbound headers. No-op when there is no
    /// valid span context to propagate.
    pub fn inject(&self, headers: &mut HeaderMap) {
        TraceContextPropagator::new().inject_context(&self.cx, &mut HeaderInjector(headers));
    }

    pub fn trace_id(&self) -> Option<TraceId> {
        let span = self.cx.span();
        let span_context = span.span_context();
        span_context.is_valid().then(|| span_context.trace_id())
    }

    /// `traceparent` header value for this context, if it is valid.
    pub fn traceparent(&self) -> Option<String> {
        let mut headers = HeaderMap::new();
        self.inject(&mut headers);
        extract_traceparent(&headers)
    }

    /// Start a child span for one logical step of the request.
    pub fn step(&self, name: &'static str) -> StepSpan {
        StepSpan::start(self, name)
    }
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for TraceContext
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // The request span made by `make_request_span` already carries the
        // inbound parent; fall back to the raw headers when there is none.
        let current = TraceContext::from_span(&Span::current());
        if current.trace_id().is_some() {
            Ok(current)
        } else {
            Ok(TraceContext::extract(&parts.headers))
        }
    }
}

/// Span covering one step (validation, lookup, outbound call).
///
/// Closed when consumed by [`StepSpan::succeed`] / [`StepSpan::fail`], or
/// when dropped on an early return.
pub struct StepSpan {
    name: &'static str,
    span: Span,
}

impl StepSpan {
    fn start(parent: &TraceContext, name: &'static str) -> Self {
        let span = tracing::info_span!(
            parent: None,
            "step",
            otel.name = name,
            step = name,
            otel.status_code = field::Empty,
            otel.status_message = field::Empty,
        );
        span.set_parent(parent.cx.clone());
        Self { name, span }
    }

    pub fn span(&self) -> &Span {
        &self.span
    }

    /// Context of this step, for child steps and outbound injection.
    pub fn context(&self) -> TraceContext {
        TraceContext::from_span(&self.span)
    }

    pub fn succeed(self) {
        self.span.record("otel.status_code", "OK");
    }

    /// Mark the step as failed. `message` is client-safe; `error` is the
    /// underlying cause and is only logged on the span.
    pub fn fail(self, message: &str, error: &dyn Display) {
        self.span.record("otel.status_code", "ERROR");
        self.span.record("otel.status_message", message);
        tracing::warn!(
            parent: &self.span,
            step = self.name,
            error = %error,
            "{}",
            message
        );
    }
}

/// Build the per-request span for `TraceLayer`, parented on the inbound
/// trace context.
pub fn make_request_span(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = extract_request_id(request.headers()).unwrap_or_else(|| "-".to_string());

    let span = tracing::info_span!(
        "http_request",
        request_id = %request_id,
        method = %request.method(),
        uri = %request.uri(),
        version = ?request.version(),
    );
    span.set_parent(TraceContext::extract(request.headers()).cx);
    span
}

/// Inject trace context and optional request ID into headers.
pub fn inject_trace_headers(headers: &mut HeaderMap, cx: &TraceContext, request_id: Option<&str>) {
    cx.inject(headers);

    if let Some(id) = request_id
        && let Ok(value) = id.parse()
    {
        headers.insert(REQUEST_ID_HEADER, value);
    }
}

/// Extract trace context from incoming request headers.
///
/// Returns the traceparent header value if present and valid.
pub fn extract_traceparent(headers: &HeaderMap) -> Option<String> {
    headers
        .get(TRACEPARENT_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
}

/// Extract request ID from incoming request headers.
pub fn extract_request_id(headers: &HeaderMap) -> Option<String> {
    headers
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
}

/// Outbound request that carries a [`TraceContext`] in its headers.
pub struct TracedRequest {
    request: reqwest::RequestBuilder,
    context: TraceContext,
}

impl TracedRequest {
    pub fn new(request: reqwest::RequestBuilder, context: &TraceContext) -> Self {
        Self {
            request,
            context: context.clone(),
        }
    }

    pub fn query<T: serde::Serialize + ?Sized>(self, query: &T) -> Self {
        Self {
            request: self.request.query(query),
            ..self
        }
    }

    /// Bound the whole call, connect through body.
    pub fn timeout(self, timeout: Duration) -> Self {
        Self {
            request: self.request.timeout(timeout),
            ..self
        }
    }

    /// Send the request with trace context headers injected.
    pub async fn send(self) -> Result<reqwest::Response, reqwest::Error> {
        let mut headers = HeaderMap::new();
        self.context.inject(&mut headers);

        self.request.headers(headers).send().await
    }

    /// Send the request with trace context and request ID.
    pub async fn send_with_request_id(
        self,
        request_id: Option<&str>,
    ) -> Result<reqwest::Response, reqwest::Error> {
        let mut headers = HeaderMap::new();
        inject_trace_headers(&mut headers, &self.context, request_id);

        self.request.headers(headers).send().await
    }
}

/// Extension trait for reqwest::Client to create traced requests.
pub trait TracedClientExt {
    fn traced_get(&self, url: &str, cx: &TraceContext) -> TracedRequest;
}

impl TracedClientExt for reqwest::Client {
    fn traced_get(&self, url: &str, cx: &TraceContext) -> TracedRequest {
        TracedRequest::new(self.get(url), cx)
    }
}
