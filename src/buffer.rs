//! Buffer type exchanged between pads.

use crate::element::DemandUnit;
use crate::metadata::Metadata;
use bytes::Bytes;

/// A buffer containing data and metadata.
///
/// Buffers are the unit of data flowing between pads. The payload is a
/// reference-counted [`Bytes`], so cloning a buffer never copies the data.
///
/// # Example
///
/// ```rust
/// use flowcore::buffer::Buffer;
/// use flowcore::metadata::Metadata;
///
/// let buffer = Buffer::new(vec![0u8; 188], Metadata::from_sequence(0));
/// assert_eq!(buffer.len(), 188);
///
/// // Clone is O(1) - just a refcount increment
/// let buffer2 = buffer.clone();
/// assert_eq!(buffer2.as_bytes(), buffer.as_bytes());
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct Buffer {
    data: Bytes,
    metadata: Metadata,
}

impl Buffer {
    /// Create a new buffer.
    pub fn new(data: impl Into<Bytes>, metadata: Metadata) -> Self {
        Self {
            data: data.into(),
            metadata,
        }
    }

    /// Create a buffer with default metadata.
    pub fn from_bytes(data: impl Into<Bytes>) -> Self {
        Self::new(data, Metadata::default())
    }

    /// Get a reference to the buffer's metadata.
    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// Get a mutable reference to the buffer's metadata.
    pub fn metadata_mut(&mut self) -> &mut Metadata {
        &mut self.metadata
    }

    /// Get the payload.
    pub fn data(&self) -> &Bytes {
        &self.data
    }

    /// Get the buffer data as a byte slice.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Get the length of the buffer data.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Size of this buffer counted in the given demand unit.
    #[inline]
    pub fn units(&self, unit: DemandUnit) -> usize {
        match unit {
            DemandUnit::Buffers => 1,
            DemandUnit::Bytes => self.data.len(),
        }
    }

    /// Check that this buffer is well-formed.
    ///
    /// A buffer is malformed when its metadata contradicts itself: a decode
    /// timestamp after the presentation timestamp, or a byte range that ends
    /// before it starts.
    pub fn validate(&self) -> std::result::Result<(), &'static str> {
        self.metadata.validate()
    }

    /// Create a sub-buffer sharing the same memory and metadata.
    ///
    /// # Panics
    ///
    /// Panics if `offset + len > self.len()`.
    pub fn slice(&self, offset: usize, len: usize) -> Buffer {
        Buffer {
            data: self.data.slice(offset..offset + len),
            metadata: self.metadata.clone(),
        }
    }
}

/// Total size of a buffer list in the given unit.
pub fn units_of(buffers: &[Buffer], unit: DemandUnit) -> usize {
    buffers.iter().map(|b| b.units(unit)).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn make_test_buffer(size: usize) -> Buffer {
        Buffer::new(vec![7u8; size], Metadata::from_sequence(42))
    }

    #[test]
    fn test_buffer_creation() {
        let buffer = make_test_buffer(1024);
        assert_eq!(buffer.len(), 1024);
        assert!(!buffer.is_empty());
        assert_eq!(buffer.metadata().sequence, 42);
    }

    #[test]
    fn test_buffer_units() {
        let buffers = vec![make_test_buffer(100), make_test_buffer(28)];
        assert_eq!(units_of(&buffers, DemandUnit::Buffers), 2);
        assert_eq!(units_of(&buffers, DemandUnit::Bytes), 128);
    }

    #[test]
    fn test_buffer_slice() {
        let buffer = Buffer::new((0u8..10).collect::<Vec<_>>(), Metadata::new());
        let sub = buffer.slice(2, 3);
        assert_eq!(sub.as_bytes(), &[2, 3, 4]);
    }

    #[test]
    fn test_malformed_buffer() {
        let mut buffer = make_test_buffer(4);
        assert!(buffer.validate().is_ok());

        buffer.metadata_mut().pts = Some(Duration::from_millis(5));
        buffer.metadata_mut().dts = Some(Duration::from_millis(6));
        assert_eq!(buffer.validate(), Err("dts after pts"));
    }
}
