//! Tracing integration for structured logging and spans.

use crate::element::PadRef;
use tracing::{Level, Span, span};

/// Create a span for everything one element does.
///
/// The runner enters this span around each message it handles, so every
/// event logged by controllers and the action executor carries the element
/// name.
///
/// # Example
///
/// ```rust
/// use flowcore::observability::span_element;
///
/// let span = span_element("decoder");
/// span.in_scope(|| tracing::debug!("handled inside the element span"));
/// ```
#[inline]
pub fn span_element(element: &str) -> Span {
    span!(Level::DEBUG, "element", element = %element)
}

/// Log an executed action.
#[inline]
pub fn trace_action(element: &str, action: &str, pad: Option<&PadRef>) {
    tracing::trace!(
        element = %element,
        action = %action,
        pad = ?pad,
        "executing action"
    );
}

/// Log demand held back until the current supply pass unwinds.
#[inline]
pub fn trace_deferred_demand(element: &str, pad: &str, kind: &str) {
    tracing::debug!(
        element = %element,
        pad = %pad,
        kind = %kind,
        "demand deferred"
    );
}

/// Log an error that stops an element.
#[inline]
pub fn trace_error(element: &str, error: &dyn std::error::Error) {
    tracing::error!(
        element = %element,
        error = %error,
        "element failed"
    );
}

/// Log a playback state change.
#[inline]
pub fn trace_state_change(element: &str, from: &str, to: &str) {
    tracing::info!(
        element = %element,
        from = %from,
        to = %to,
        "playback state changed"
    );
}
