//! Admission buffer for pull-mode input pads.
//!
//! The admission buffer sits between a linked upstream peer and the element's
//! own demand on an input pad. It keeps up to a preferred number of units
//! either requested from upstream or already queued, and asks for more once
//! that total drains to the low water mark:
//!
//! ```text
//! upstream ──buffers──> [ admission buffer ] ──supply──> on_process
//!     ^                          │
//!     └──── demand(top-up) ──────┘  (requested + queued <= low mark)
//! ```
//!
//! A push-mode producer ignores demand and may send faster than the element
//! consumes. Once queued units rise above the high water mark the buffer
//! reports overflow. Overflowing data is still queued; dropping it would hide
//! the problem.

use crate::buffer::Buffer;
use crate::config::AdmissionConfig;
use crate::element::DemandUnit;
use crate::event::Event;
use crate::format::MediaFormat;
use smallvec::SmallVec;
use std::collections::VecDeque;

/// Water mark configuration for queue-based flow control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaterMarks {
    /// High water mark - queued units above this are an overflow.
    pub high: usize,
    /// Low water mark - demand is topped up at or below this.
    pub low: usize,
}

impl WaterMarks {
    /// Create water marks with explicit high and low values.
    pub fn new(high: usize, low: usize) -> Self {
        Self { high, low }
    }

    /// Derive water marks from an admission config.
    pub fn from_config(config: &AdmissionConfig) -> Self {
        Self {
            high: config.preferred_size * config.overflow_factor,
            low: (config.preferred_size * config.low_watermark_percent) / 100,
        }
    }

    /// Check if level is above the high water mark.
    #[inline]
    pub fn is_over(&self, level: usize) -> bool {
        level > self.high
    }

    /// Check if level is at or below the low water mark.
    #[inline]
    pub fn is_low(&self, level: usize) -> bool {
        level <= self.low
    }
}

/// An entry waiting in an admission buffer.
///
/// Events and formats queue behind buffers so that they reach the element in
/// the order they were sent.
#[derive(Debug, Clone)]
pub enum QueuedItem {
    /// A data buffer.
    Buffer(Buffer),
    /// A serialized event.
    Event(Event),
    /// A format change.
    Caps(MediaFormat),
}

/// Items handed out by one [`AdmissionBuffer::take`].
#[derive(Debug, Default)]
pub struct Taken {
    /// Items in arrival order.
    pub items: SmallVec<[QueuedItem; 8]>,
    /// Units consumed by the buffers among `items`.
    pub units: usize,
}

/// Bounded admission queue of a pull-mode input pad.
#[derive(Debug)]
pub struct AdmissionBuffer {
    queue: VecDeque<QueuedItem>,
    unit: DemandUnit,
    preferred_size: usize,
    marks: WaterMarks,
    queued_units: usize,
    requested: i64,
    overflows: u64,
}

impl AdmissionBuffer {
    /// Create an empty admission buffer.
    pub fn new(config: &AdmissionConfig, unit: DemandUnit) -> Self {
        Self {
            queue: VecDeque::new(),
            unit,
            preferred_size: config.preferred_size,
            marks: WaterMarks::from_config(config),
            queued_units: 0,
            requested: 0,
            overflows: 0,
        }
    }

    /// Units currently queued.
    pub fn queued_units(&self) -> usize {
        self.queued_units
    }

    /// Units requested from upstream and not yet received.
    pub fn requested(&self) -> i64 {
        self.requested
    }

    /// Number of items (buffers, events, formats) queued.
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Check if nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Check if an end of stream is waiting behind the queued data.
    pub fn holds_end_of_stream(&self) -> bool {
        self.queue
            .iter()
            .any(|item| matches!(item, QueuedItem::Event(event) if event.is_eos()))
    }

    /// The water marks in effect.
    pub fn watermarks(&self) -> WaterMarks {
        self.marks
    }

    /// How many times the high water mark was exceeded.
    pub fn overflow_count(&self) -> u64 {
        self.overflows
    }

    /// Queue arriving buffers.
    ///
    /// Returns `true` if the queue is now above the high water mark.
    pub fn store_buffers(&mut self, buffers: Vec<Buffer>) -> bool {
        for buffer in buffers {
            let units = buffer.units(self.unit);
            self.queued_units += units;
            self.requested -= units as i64;
            self.queue.push_back(QueuedItem::Buffer(buffer));
        }

        let overflow = self.marks.is_over(self.queued_units);
        if overflow {
            self.overflows += 1;
        }
        overflow
    }

    /// Queue an event or format change behind the buffered data.
    pub fn store(&mut self, item: QueuedItem) {
        if let QueuedItem::Buffer(buffer) = item {
            self.store_buffers(vec![buffer]);
        } else {
            self.queue.push_back(item);
        }
    }

    /// Take buffers worth up to `demand` units.
    ///
    /// Whole buffers are handed out, so in byte mode the last buffer may
    /// overshoot the demand. Events and formats that directly follow the last
    /// buffer taken are handed out too, since they need no demand.
    pub fn take(&mut self, demand: i64) -> Taken {
        let mut taken = Taken::default();
        let mut remaining = demand;

        while let Some(front) = self.queue.front() {
            if let QueuedItem::Buffer(buffer) = front {
                if remaining <= 0 {
                    break;
                }
                let units = buffer.units(self.unit);
                remaining -= units as i64;
                taken.units += units;
                self.queued_units -= units;
            }
            if let Some(item) = self.queue.pop_front() {
                taken.items.push(item);
            }
        }

        taken
    }

    /// Compute the demand to send upstream, if any.
    ///
    /// Once requested plus queued units are at or below the low water mark,
    /// requests enough to bring the total back to the preferred size and
    /// records the request as outstanding.
    pub fn top_up(&mut self) -> Option<i64> {
        let available = self.requested.max(0) as usize + self.queued_units;
        if !self.marks.is_low(available) {
            return None;
        }
        let size = self.preferred_size.saturating_sub(available);
        if size == 0 {
            return None;
        }
        self.requested = self.requested.max(0) + size as i64;
        Some(size as i64)
    }
}
