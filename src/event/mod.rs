//! Events that travel between pads alongside buffers.
//!
//! Events carry out-of-band signaling: stream boundaries, timeline segments,
//! seeking, flushing and quality feedback.
//!
//! # Direction
//!
//! Every event has a travel direction that decides which pads it may be sent
//! through:
//!
//! - **Downstream events** flow with data and leave through output pads
//!   (stream-start, segment, tags, EOS, gap)
//! - **Upstream events** flow against data and leave through input pads
//!   (seek, QoS)
//! - **Bidirectional events** may use either (flush, custom)
//!
//! # Example
//!
//! ```rust
//! use flowcore::event::{Event, SegmentEvent};
//! use flowcore::element::PadDirection;
//!
//! let event = Event::Segment(SegmentEvent::new_time(0, Some(1_000_000)));
//! assert!(event.is_downstream());
//! assert!(event.can_travel(PadDirection::Output));
//! assert!(!event.can_travel(PadDirection::Input));
//! assert!(event.validate().is_ok());
//! ```

use crate::element::PadDirection;
use crate::metadata::MetadataValue;
use std::time::Duration;

// ============================================================================
// Event Enum
// ============================================================================

/// Events that flow between elements.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    // ========== Downstream Events ==========
    /// Start of a new stream.
    StreamStart(StreamStartEvent),

    /// Defines a playback segment (timeline).
    Segment(SegmentEvent),

    /// Stream tags (title, language, encoder...).
    Tags(Vec<(String, MetadataValue)>),

    /// End of stream - no more data will be produced on this pad.
    Eos,

    /// Gap in data (silence, black frames).
    Gap(GapEvent),

    // ========== Upstream Events ==========
    /// Seek request.
    Seek(SeekEvent),

    /// Quality of Service feedback.
    Qos(QosEvent),

    // ========== Bidirectional Events ==========
    /// Flush start - discard buffered data.
    FlushStart,

    /// Flush stop - resume normal operation.
    FlushStop(FlushStopEvent),

    /// Custom application event.
    Custom(CustomEvent),
}

impl Event {
    /// Create a stream-start event.
    pub fn stream_start(stream_id: impl Into<String>) -> Self {
        Event::StreamStart(StreamStartEvent::new(stream_id))
    }

    /// Create a custom event flowing in the given direction.
    pub fn custom(name: impl Into<String>, direction: EventDirection) -> Self {
        Event::Custom(CustomEvent::new(name, direction))
    }

    /// Check if this is a downstream event (flows with data).
    pub fn is_downstream(&self) -> bool {
        match self {
            Event::StreamStart(_)
            | Event::Segment(_)
            | Event::Tags(_)
            | Event::Eos
            | Event::Gap(_) => true,
            Event::Custom(c) => c.direction == EventDirection::Downstream,
            _ => false,
        }
    }

    /// Check if this is an upstream event (flows against data).
    pub fn is_upstream(&self) -> bool {
        match self {
            Event::Seek(_) | Event::Qos(_) => true,
            Event::Custom(c) => c.direction == EventDirection::Upstream,
            _ => false,
        }
    }

    /// Check if this is a bidirectional event.
    pub fn is_bidirectional(&self) -> bool {
        !self.is_downstream() && !self.is_upstream()
    }

    /// Check if this is the end-of-stream event.
    #[inline]
    pub fn is_eos(&self) -> bool {
        matches!(self, Event::Eos)
    }

    /// Check if this event should be serialized with buffers.
    ///
    /// Serialized events keep their place relative to buffers, so they queue
    /// behind buffered data on pull-mode input pads. Flush events jump ahead.
    pub fn is_serialized(&self) -> bool {
        !matches!(self, Event::FlushStart | Event::FlushStop(_))
    }

    /// Check whether this event may leave through a pad of the given
    /// direction.
    ///
    /// Downstream events leave through output pads, upstream events through
    /// input pads. An event arriving at an element travels the opposite way:
    /// it comes in through a pad of the opposite direction.
    pub fn can_travel(&self, direction: PadDirection) -> bool {
        match direction {
            PadDirection::Output => !self.is_upstream(),
            PadDirection::Input => !self.is_downstream(),
        }
    }

    /// Check that this event is well-formed.
    pub fn validate(&self) -> std::result::Result<(), &'static str> {
        match self {
            Event::StreamStart(e) if e.stream_id.is_empty() => Err("empty stream id"),
            Event::Segment(e) => e.validate(),
            Event::Tags(tags) if tags.iter().any(|(k, _)| k.is_empty()) => Err("empty tag name"),
            Event::Gap(e) if e.duration.is_zero() => Err("zero-length gap"),
            Event::Seek(e) if !e.rate.is_finite() || e.rate == 0.0 => Err("invalid seek rate"),
            Event::Qos(e) if !e.proportion.is_finite() || e.proportion < 0.0 => {
                Err("invalid QoS proportion")
            }
            Event::Custom(e) if e.name.is_empty() => Err("empty custom event name"),
            _ => Ok(()),
        }
    }

    /// Get a human-readable name for this event type.
    pub fn name(&self) -> &str {
        match self {
            Event::StreamStart(_) => "stream-start",
            Event::Segment(_) => "segment",
            Event::Tags(_) => "tags",
            Event::Eos => "eos",
            Event::Gap(_) => "gap",
            Event::Seek(_) => "seek",
            Event::Qos(_) => "qos",
            Event::FlushStart => "flush-start",
            Event::FlushStop(_) => "flush-stop",
            Event::Custom(c) => &c.name,
        }
    }
}

/// Travel direction of a custom event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EventDirection {
    /// With the data, out of output pads.
    #[default]
    Downstream,
    /// Against the data, out of input pads.
    Upstream,
    /// Either way.
    Both,
}

// ============================================================================
// Stream Start Event
// ============================================================================

/// Stream start event - begins a new logical stream.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamStartEvent {
    /// Unique stream identifier.
    pub stream_id: String,
    /// Stream flags.
    pub flags: StreamFlags,
}

impl StreamStartEvent {
    /// Create a new stream start event.
    pub fn new(stream_id: impl Into<String>) -> Self {
        Self {
            stream_id: stream_id.into(),
            flags: StreamFlags::empty(),
        }
    }

    /// Create with flags.
    pub fn with_flags(stream_id: impl Into<String>, flags: StreamFlags) -> Self {
        Self {
            stream_id: stream_id.into(),
            flags,
        }
    }
}

/// Flags for stream start events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct StreamFlags(u32);

impl StreamFlags {
    /// No special flags.
    pub const NONE: Self = Self(0);
    /// Sparse stream (e.g., subtitles).
    pub const SPARSE: Self = Self(1 << 0);
    /// Live stream: data is produced in real time.
    pub const LIVE: Self = Self(1 << 1);

    /// Create empty flags.
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Check if contains a flag.
    pub const fn contains(self, other: Self) -> bool {
        (self.0 & other.0) == other.0
    }

    /// Union of flags.
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }
}

// ============================================================================
// Segment Event
// ============================================================================

/// Segment event - defines the playback timeline.
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentEvent {
    /// Segment format (time, bytes).
    pub format: SegmentFormat,
    /// Segment start position.
    pub start: u64,
    /// Segment stop position (`None` for unlimited).
    pub stop: Option<u64>,
    /// Playback rate (1.0 = normal speed).
    pub rate: f64,
}

impl SegmentEvent {
    /// Create a time-based segment, positions in nanoseconds.
    pub fn new_time(start: u64, stop: Option<u64>) -> Self {
        Self {
            format: SegmentFormat::Time,
            start,
            stop,
            rate: 1.0,
        }
    }

    /// Create a byte-based segment.
    pub fn new_bytes(start: u64, stop: Option<u64>) -> Self {
        Self {
            format: SegmentFormat::Bytes,
            start,
            stop,
            rate: 1.0,
        }
    }

    /// Set the playback rate.
    pub fn with_rate(mut self, rate: f64) -> Self {
        self.rate = rate;
        self
    }

    fn validate(&self) -> std::result::Result<(), &'static str> {
        if matches!(self.stop, Some(stop) if stop < self.start) {
            return Err("segment stop before start");
        }
        if !self.rate.is_finite() || self.rate == 0.0 {
            return Err("invalid segment rate");
        }
        Ok(())
    }
}

impl Default for SegmentEvent {
    fn default() -> Self {
        Self::new_time(0, None)
    }
}

/// Format of segment positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SegmentFormat {
    /// Positions in nanoseconds.
    #[default]
    Time,
    /// Positions in bytes.
    Bytes,
}

// ============================================================================
// Seek Event
// ============================================================================

/// Seek event - request to jump to a position.
#[derive(Debug, Clone, PartialEq)]
pub struct SeekEvent {
    /// Seek rate (1.0 = normal, 2.0 = 2x speed, -1.0 = reverse).
    pub rate: f64,
    /// Format of the position.
    pub format: SegmentFormat,
    /// Target position.
    pub position: u64,
    /// Flush before seeking.
    pub flush: bool,
}

impl SeekEvent {
    /// Create a flushing time-based seek, position in nanoseconds.
    pub fn new_time(position: u64) -> Self {
        Self {
            rate: 1.0,
            format: SegmentFormat::Time,
            position,
            flush: true,
        }
    }

    /// Set the seek rate.
    pub fn with_rate(mut self, rate: f64) -> Self {
        self.rate = rate;
        self
    }
}

// ============================================================================
// QoS / Gap / Flush / Custom
// ============================================================================

/// Quality of Service feedback from a consumer.
#[derive(Debug, Clone, PartialEq)]
pub struct QosEvent {
    /// Long-term processing proportion (1.0 = keeping up exactly).
    pub proportion: f64,
    /// Lateness of the buffer that triggered the report (negative = early).
    pub jitter_ns: i64,
    /// Timestamp of the buffer that triggered the report.
    pub timestamp: Duration,
}

/// Gap event - no data for a stretch of time.
#[derive(Debug, Clone, PartialEq)]
pub struct GapEvent {
    /// Start of the gap.
    pub timestamp: Duration,
    /// Length of the gap.
    pub duration: Duration,
}

/// Flush stop event.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FlushStopEvent {
    /// Whether running time should be reset.
    pub reset_time: bool,
}

/// Custom application event.
#[derive(Debug, Clone, PartialEq)]
pub struct CustomEvent {
    /// Event name.
    pub name: String,
    /// Travel direction.
    pub direction: EventDirection,
    /// Event payload.
    pub data: Vec<(String, MetadataValue)>,
}

impl CustomEvent {
    /// Create a custom event without payload.
    pub fn new(name: impl Into<String>, direction: EventDirection) -> Self {
        Self {
            name: name.into(),
            direction,
            data: Vec::new(),
        }
    }

    /// Add a payload field.
    pub fn with(mut self, key: impl Into<String>, value: MetadataValue) -> Self {
        self.data.push((key.into(), value));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_directions() {
        assert!(Event::Eos.is_downstream());
        assert!(Event::Seek(SeekEvent::new_time(0)).is_upstream());
        assert!(Event::FlushStart.is_bidirectional());

        assert!(Event::Eos.can_travel(PadDirection::Output));
        assert!(!Event::Eos.can_travel(PadDirection::Input));

        let seek = Event::Seek(SeekEvent::new_time(5));
        assert!(seek.can_travel(PadDirection::Input));
        assert!(!seek.can_travel(PadDirection::Output));

        assert!(Event::FlushStart.can_travel(PadDirection::Input));
        assert!(Event::FlushStart.can_travel(PadDirection::Output));

        let up = Event::custom("reconfigure", EventDirection::Upstream);
        assert!(up.is_upstream());
        assert_eq!(up.name(), "reconfigure");
    }

    #[test]
    fn test_event_serialization_flag() {
        assert!(Event::Eos.is_serialized());
        assert!(Event::Segment(SegmentEvent::default()).is_serialized());
        assert!(!Event::FlushStart.is_serialized());
        assert!(!Event::FlushStop(FlushStopEvent::default()).is_serialized());
    }

    #[test]
    fn test_event_validation() {
        assert!(Event::Eos.validate().is_ok());
        assert!(Event::stream_start("audio-0").validate().is_ok());

        assert_eq!(
            Event::stream_start("").validate(),
            Err("empty stream id")
        );
        assert_eq!(
            Event::Segment(SegmentEvent::new_time(10, Some(5))).validate(),
            Err("segment stop before start")
        );
        assert_eq!(
            Event::Gap(GapEvent {
                timestamp: Duration::from_secs(1),
                duration: Duration::ZERO,
            })
            .validate(),
            Err("zero-length gap")
        );
        assert_eq!(
            Event::Qos(QosEvent {
                proportion: f64::NAN,
                jitter_ns: 0,
                timestamp: Duration::ZERO,
            })
            .validate(),
            Err("invalid QoS proportion")
        );
        assert_eq!(
            Event::custom("", EventDirection::Both).validate(),
            Err("empty custom event name")
        );
    }

    #[test]
    fn test_stream_flags() {
        let flags = StreamFlags::SPARSE.union(StreamFlags::LIVE);
        assert!(flags.contains(StreamFlags::SPARSE));
        assert!(flags.contains(StreamFlags::LIVE));
        assert!(!StreamFlags::empty().contains(StreamFlags::LIVE));
    }
}
