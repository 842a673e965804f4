pub mod logging;
pub mod metrics;
pub mod trace_context;

pub use logging::{init_tracing, shutdown_tracing};
pub use trace_context::{
    REQUEST_ID_HEADER, StepSpan, TRACEPARENT_HEADER, TRACESTATE_HEADER, TraceContext,
    TracedClientExt, TracedRequest, extract_request_id, extract_traceparent,
    inject_trace_headers, make_request_span,
};
