//! Observability features: metrics and tracing.
//!
//! - **Metrics**: Counters and gauges via `metrics-rs`
//! - **Tracing**: Structured logging and spans via `tracing`
//!
//! ## Metrics
//!
//! | Metric | Type | Description |
//! |--------|------|-------------|
//! | `flowcore_buffers_sent` | Counter | Buffers sent to peers |
//! | `flowcore_bytes_sent` | Counter | Payload bytes sent to peers |
//! | `flowcore_demand_requested` | Counter | Units requested from upstream |
//! | `flowcore_admission_overflow` | Counter | Admission buffer overflows |
//! | `flowcore_admission_queued` | Gauge | Units queued in an admission buffer |
//! | `flowcore_notifications` | Counter | Notifications sent to watchers |
//!
//! ## Tracing
//!
//! Every message an element handles runs inside an `element` span. Playback
//! changes log at `info`, deferred demand at `debug`, executed actions at
//! `trace`, and dropped inbound events and admission overflow at `warn`.
//!
//! ## Example
//!
//! ```rust
//! use flowcore::observability::init_metrics;
//!
//! // Describe metrics once at startup; install any metrics exporter to
//! // collect them.
//! init_metrics();
//! ```

mod metrics;
mod tracing_support;

pub use metrics::{
    ElementMetrics, init_metrics, record_admission_overflow, record_admission_queued,
};
pub use tracing_support::{
    span_element, trace_action, trace_deferred_demand, trace_error,
    trace_state_change,
};
