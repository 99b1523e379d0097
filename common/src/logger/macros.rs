use tracing::{Level, Span, field};

use super::TraceId;

/// Create a root span for one transport session.
///
/// `subs` is left empty so callers can record it once known.
pub fn root_span(name: &'static str, trace_id: &TraceId) -> Span {
    tracing::span!(
        Level::INFO,
        "root",
        name = %name,
        trace_id = %trace_id.as_str(),
        subs = field::Empty
    )
}

/// Create a child span (inherits trace_id from the current root)
pub fn child_span(name: &'static str) -> Span {
    tracing::span!(Level::INFO, "child", name = %name)
}
