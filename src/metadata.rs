//! Buffer metadata types.

use std::time::Duration;

/// Flags indicating buffer properties.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BufferFlags {
    /// Buffer contains a sync point (keyframe equivalent).
    pub sync_point: bool,
    /// Buffer follows a discontinuity in the stream.
    pub discont: bool,
    /// Buffer is corrupted or incomplete.
    pub corrupted: bool,
    /// Buffer should not be displayed/processed (e.g., decode-only).
    pub decode_only: bool,
    /// Buffer is a gap/discontinuity marker.
    pub gap: bool,
}

/// A key-value pair for extra metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtraField {
    /// Field name.
    pub key: String,
    /// Field value.
    pub value: MetadataValue,
}

/// Possible values for extra metadata fields.
///
/// Also used as the payload of watcher notifications.
#[derive(Debug, Clone, PartialEq)]
pub enum MetadataValue {
    /// String value.
    String(String),
    /// Integer value.
    Int(i64),
    /// Floating-point value.
    Float(f64),
    /// Boolean value.
    Bool(bool),
    /// Raw bytes.
    Bytes(Vec<u8>),
}

impl From<&str> for MetadataValue {
    fn from(value: &str) -> Self {
        MetadataValue::String(value.to_owned())
    }
}

impl From<String> for MetadataValue {
    fn from(value: String) -> Self {
        MetadataValue::String(value)
    }
}

impl From<i64> for MetadataValue {
    fn from(value: i64) -> Self {
        MetadataValue::Int(value)
    }
}

impl From<bool> for MetadataValue {
    fn from(value: bool) -> Self {
        MetadataValue::Bool(value)
    }
}

/// Metadata associated with a buffer.
///
/// Contains timing information, sequence numbers, flags, and extensible
/// key-value fields for domain-specific data.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Metadata {
    /// Presentation timestamp.
    pub pts: Option<Duration>,

    /// Decode timestamp. Never later than `pts` in a well-formed buffer.
    pub dts: Option<Duration>,

    /// Duration of this buffer's content.
    pub duration: Option<Duration>,

    /// Monotonic sequence number within a stream.
    pub sequence: u64,

    /// Byte offset in the original source.
    pub offset: Option<u64>,

    /// End byte offset in the original source.
    pub offset_end: Option<u64>,

    /// Buffer flags.
    pub flags: BufferFlags,

    /// Extra key-value metadata fields.
    pub extra: Vec<ExtraField>,
}

impl Metadata {
    /// Create new metadata with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create metadata with a sequence number.
    pub fn from_sequence(sequence: u64) -> Self {
        Self {
            sequence,
            ..Default::default()
        }
    }

    /// Set the presentation timestamp.
    pub fn with_pts(mut self, pts: Duration) -> Self {
        self.pts = Some(pts);
        self
    }

    /// Set the decode timestamp.
    pub fn with_dts(mut self, dts: Duration) -> Self {
        self.dts = Some(dts);
        self
    }

    /// Set the duration.
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = Some(duration);
        self
    }

    /// Set the byte range in the original source.
    pub fn with_offsets(mut self, offset: u64, offset_end: u64) -> Self {
        self.offset = Some(offset);
        self.offset_end = Some(offset_end);
        self
    }

    /// Add an extra field.
    pub fn with_extra(mut self, key: impl Into<String>, value: MetadataValue) -> Self {
        self.extra.push(ExtraField {
            key: key.into(),
            value,
        });
        self
    }

    /// Get an extra field by key.
    pub fn get_extra(&self, key: &str) -> Option<&MetadataValue> {
        self.extra.iter().find(|f| f.key == key).map(|f| &f.value)
    }

    /// Check the timing and offset invariants.
    pub fn validate(&self) -> std::result::Result<(), &'static str> {
        if let (Some(dts), Some(pts)) = (self.dts, self.pts) {
            if dts > pts {
                return Err("dts after pts");
            }
        }
        if let (Some(start), Some(end)) = (self.offset, self.offset_end) {
            if end < start {
                return Err("offset_end before offset");
            }
        }
        Ok(())
    }
}
