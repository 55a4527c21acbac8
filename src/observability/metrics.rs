//! Metrics collection using metrics-rs.

use metrics::{Counter, Unit, counter, gauge};
use std::sync::atomic::{AtomicBool, Ordering};

/// Whether metrics have been initialized.
static METRICS_INITIALIZED: AtomicBool = AtomicBool::new(false);

// Metric names as constants for consistency
const BUFFERS_SENT: &str = "flowcore_buffers_sent";
const BYTES_SENT: &str = "flowcore_bytes_sent";
const DEMAND_REQUESTED: &str = "flowcore_demand_requested";
const ADMISSION_OVERFLOW: &str = "flowcore_admission_overflow";
const ADMISSION_QUEUED: &str = "flowcore_admission_queued";
const NOTIFICATIONS: &str = "flowcore_notifications";

/// Initialize metrics descriptions.
///
/// Call this once at application startup before using any metrics.
/// Safe to call multiple times (subsequent calls are no-ops).
pub fn init_metrics() {
    if METRICS_INITIALIZED.swap(true, Ordering::SeqCst) {
        return;
    }

    metrics::describe_counter!(
        BUFFERS_SENT,
        Unit::Count,
        "Total number of buffers sent to peers"
    );
    metrics::describe_counter!(BYTES_SENT, Unit::Bytes, "Total payload bytes sent to peers");
    metrics::describe_counter!(
        DEMAND_REQUESTED,
        Unit::Count,
        "Units of demand requested from upstream peers"
    );
    metrics::describe_counter!(
        ADMISSION_OVERFLOW,
        Unit::Count,
        "Times an admission buffer rose above its high water mark"
    );
    metrics::describe_gauge!(
        ADMISSION_QUEUED,
        Unit::Count,
        "Units queued in an admission buffer"
    );
    metrics::describe_counter!(
        NOTIFICATIONS,
        Unit::Count,
        "Notifications delivered to watchers"
    );
}

/// Record an admission buffer overflow.
#[inline]
pub fn record_admission_overflow(element: &str, pad: &str) {
    counter!(ADMISSION_OVERFLOW, "element" => element.to_string(), "pad" => pad.to_string())
        .increment(1);
}

/// Record the fill level of an admission buffer.
#[inline]
pub fn record_admission_queued(element: &str, pad: &str, units: usize) {
    gauge!(ADMISSION_QUEUED, "element" => element.to_string(), "pad" => pad.to_string())
        .set(units as f64);
}

/// Metrics collector for a specific element.
///
/// Counters are registered once with the element label and reused for every
/// action the element executes.
#[derive(Clone)]
pub struct ElementMetrics {
    element: String,
    buffers_sent: Counter,
    bytes_sent: Counter,
    demand_requested: Counter,
    notifications: Counter,
}

impl ElementMetrics {
    /// Create a new element metrics collector.
    pub fn new(element: &str) -> Self {
        Self {
            element: element.to_string(),
            buffers_sent: counter!(BUFFERS_SENT, "element" => element.to_string()),
            bytes_sent: counter!(BYTES_SENT, "element" => element.to_string()),
            demand_requested: counter!(DEMAND_REQUESTED, "element" => element.to_string()),
            notifications: counter!(NOTIFICATIONS, "element" => element.to_string()),
        }
    }

    /// Record buffers sent through an output pad.
    #[inline]
    pub fn record_sent(&self, buffers: usize, bytes: usize) {
        self.buffers_sent.increment(buffers as u64);
        self.bytes_sent.increment(bytes as u64);
    }

    /// Record demand sent upstream.
    #[inline]
    pub fn record_demand(&self, units: i64) {
        self.demand_requested.increment(units.max(0) as u64);
    }

    /// Record a delivered notification.
    #[inline]
    pub fn record_notification(&self) {
        self.notifications.increment(1);
    }

    /// Get the element name.
    pub fn element(&self) -> &str {
        &self.element
    }
}

impl std::fmt::Debug for ElementMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ElementMetrics")
            .field("element", &self.element)
            .finish()
    }
}
