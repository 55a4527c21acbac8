//! Pad descriptors and the per-element pad registry.
//!
//! Pads are the connection points of elements. Each pad has a fixed direction,
//! a mode (push or pull) and, once linked, a peer pad on another element. The
//! registry holds the runtime state of every pad: demand counters, stream
//! flags, negotiated format and the admission buffer of pull-mode inputs.
//!
//! The registry itself never sends anything; controllers and the action
//! executor read and mutate descriptors through it.

use crate::error::ProtocolError;
use crate::flow::AdmissionBuffer;
use crate::format::{FormatCaps, MediaFormat};
use crate::link::Peer;
use std::collections::HashMap;
use std::fmt;

/// Identity of a pad within its element.
///
/// Static pads are identified by name. Dynamically instantiated pads (e.g. the
/// outputs of a demuxer) carry an instance id on top of their template name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PadRef {
    /// A statically declared pad.
    Static(String),
    /// A dynamically instantiated pad.
    Dynamic {
        /// Template name.
        name: String,
        /// Instance id.
        id: u32,
    },
}

impl PadRef {
    /// Create a reference to a static pad.
    pub fn new(name: impl Into<String>) -> Self {
        PadRef::Static(name.into())
    }

    /// Create a reference to a dynamic pad instance.
    pub fn dynamic(name: impl Into<String>, id: u32) -> Self {
        PadRef::Dynamic {
            name: name.into(),
            id,
        }
    }

    /// Template name of the pad.
    pub fn name(&self) -> &str {
        match self {
            PadRef::Static(name) => name,
            PadRef::Dynamic { name, .. } => name,
        }
    }
}

impl From<&str> for PadRef {
    fn from(name: &str) -> Self {
        PadRef::new(name)
    }
}

impl From<String> for PadRef {
    fn from(name: String) -> Self {
        PadRef::Static(name)
    }
}

impl fmt::Display for PadRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PadRef::Static(name) => f.write_str(name),
            PadRef::Dynamic { name, id } => write!(f, "{name}_{id}"),
        }
    }
}

/// Direction of a pad (input or output).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PadDirection {
    /// An input pad (receives buffers from upstream).
    Input,
    /// An output pad (sends buffers downstream).
    Output,
}

/// How data is driven through a pad.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PadMode {
    /// Data is sent as soon as it is produced.
    Push,
    /// Data is sent only against demand from the consumer.
    #[default]
    Pull,
}

/// How buffers are counted against demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DemandUnit {
    /// One unit per buffer.
    #[default]
    Buffers,
    /// One unit per payload byte.
    Bytes,
}

/// Runtime state of one pad.
#[derive(Debug)]
pub struct PadDescriptor {
    pub(crate) pad: PadRef,
    pub(crate) direction: PadDirection,
    pub(crate) mode: PadMode,
    pub(crate) demand_unit: Option<DemandUnit>,
    pub(crate) peer: Option<Peer>,
    pub(crate) demand: i64,
    pub(crate) start_of_stream: bool,
    pub(crate) end_of_stream: bool,
    pub(crate) format: Option<MediaFormat>,
    pub(crate) accepted_format: FormatCaps,
    pub(crate) admission: Option<AdmissionBuffer>,
}

impl PadDescriptor {
    /// Create a descriptor for an unlinked pad.
    pub fn new(pad: impl Into<PadRef>, direction: PadDirection, mode: PadMode) -> Self {
        Self {
            pad: pad.into(),
            direction,
            mode,
            demand_unit: None,
            peer: None,
            demand: 0,
            start_of_stream: false,
            end_of_stream: false,
            format: None,
            accepted_format: FormatCaps::Any,
            admission: None,
        }
    }

    /// Create an input pad descriptor.
    pub fn input(pad: impl Into<PadRef>, mode: PadMode) -> Self {
        Self::new(pad, PadDirection::Input, mode)
    }

    /// Create an output pad descriptor.
    pub fn output(pad: impl Into<PadRef>, mode: PadMode) -> Self {
        Self::new(pad, PadDirection::Output, mode)
    }

    /// Set the accepted format constraint.
    pub fn with_accepted_format(mut self, caps: FormatCaps) -> Self {
        self.accepted_format = caps;
        self
    }

    /// Set the demand unit, overriding the element default.
    pub fn with_demand_unit(mut self, unit: DemandUnit) -> Self {
        self.demand_unit = Some(unit);
        self
    }

    /// Identity of this pad.
    pub fn pad(&self) -> &PadRef {
        &self.pad
    }

    /// Direction of this pad.
    pub fn direction(&self) -> PadDirection {
        self.direction
    }

    /// Mode of this pad.
    pub fn mode(&self) -> PadMode {
        self.mode
    }

    /// Check if this is a pull-mode pad.
    #[inline]
    pub fn is_pull(&self) -> bool {
        self.mode == PadMode::Pull
    }

    /// Demand unit explicitly set on the pad, if any.
    pub fn demand_unit(&self) -> Option<DemandUnit> {
        self.demand_unit
    }

    /// The linked peer, if any.
    pub fn peer(&self) -> Option<&Peer> {
        self.peer.as_ref()
    }

    /// Outstanding demand on this pad.
    pub fn demand(&self) -> i64 {
        self.demand
    }

    /// Whether the stream on this pad has started.
    pub fn start_of_stream(&self) -> bool {
        self.start_of_stream
    }

    /// Whether the stream on this pad has ended.
    pub fn end_of_stream(&self) -> bool {
        self.end_of_stream
    }

    /// The negotiated format, if any.
    pub fn format(&self) -> Option<&MediaFormat> {
        self.format.as_ref()
    }

    /// The accepted format constraint.
    pub fn accepted_format(&self) -> &FormatCaps {
        &self.accepted_format
    }

    /// The admission buffer (pull-mode linked inputs only).
    pub fn admission(&self) -> Option<&AdmissionBuffer> {
        self.admission.as_ref()
    }

    pub(crate) fn expect_direction(
        &self,
        expected: PadDirection,
        operation: &'static str,
    ) -> Result<(), ProtocolError> {
        if self.direction != expected {
            return Err(ProtocolError::WrongDirection {
                pad: self.pad.clone(),
                operation,
                expected,
                actual: self.direction,
            });
        }
        Ok(())
    }

    pub(crate) fn expect_pull(&self, operation: &'static str) -> Result<(), ProtocolError> {
        if self.mode != PadMode::Pull {
            return Err(ProtocolError::WrongMode {
                pad: self.pad.clone(),
                operation,
                expected: PadMode::Pull,
                actual: self.mode,
            });
        }
        Ok(())
    }

    pub(crate) fn linked_peer(&self, operation: &'static str) -> Result<&Peer, ProtocolError> {
        self.peer.as_ref().ok_or_else(|| ProtocolError::NotLinked {
            pad: self.pad.clone(),
            operation,
        })
    }
}

/// All pads of one element.
#[derive(Debug, Default)]
pub struct PadRegistry {
    pads: HashMap<PadRef, PadDescriptor>,
}

impl PadRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a pad, replacing any previous descriptor with the same identity.
    pub fn add_pad(&mut self, descriptor: PadDescriptor) -> Option<PadDescriptor> {
        self.pads.insert(descriptor.pad.clone(), descriptor)
    }

    /// Remove a pad.
    pub fn remove_pad(&mut self, pad: &PadRef) -> Option<PadDescriptor> {
        self.pads.remove(pad)
    }

    /// Attach a peer to a pad.
    ///
    /// Relinking replaces the previous peer.
    pub fn link(&mut self, pad: &PadRef, peer: Peer) -> Result<&mut PadDescriptor, ProtocolError> {
        let descriptor = self.lookup_mut(pad)?;
        descriptor.peer = Some(peer);
        Ok(descriptor)
    }

    /// Get a pad by identity.
    pub fn get(&self, pad: &PadRef) -> Option<&PadDescriptor> {
        self.pads.get(pad)
    }

    /// Get a pad mutably by identity.
    pub fn get_mut(&mut self, pad: &PadRef) -> Option<&mut PadDescriptor> {
        self.pads.get_mut(pad)
    }

    /// Get a pad or fail with [`ProtocolError::UnknownPad`].
    pub fn lookup(&self, pad: &PadRef) -> Result<&PadDescriptor, ProtocolError> {
        self.pads
            .get(pad)
            .ok_or_else(|| ProtocolError::UnknownPad { pad: pad.clone() })
    }

    /// Get a pad mutably or fail with [`ProtocolError::UnknownPad`].
    pub fn lookup_mut(&mut self, pad: &PadRef) -> Result<&mut PadDescriptor, ProtocolError> {
        self.pads
            .get_mut(pad)
            .ok_or_else(|| ProtocolError::UnknownPad { pad: pad.clone() })
    }

    /// Get an output pad, failing on missing pad or wrong direction.
    pub fn output_mut(
        &mut self,
        pad: &PadRef,
        operation: &'static str,
    ) -> Result<&mut PadDescriptor, ProtocolError> {
        let descriptor = self.lookup_mut(pad)?;
        descriptor.expect_direction(PadDirection::Output, operation)?;
        Ok(descriptor)
    }

    /// Get an input pad, failing on missing pad or wrong direction.
    pub fn input_mut(
        &mut self,
        pad: &PadRef,
        operation: &'static str,
    ) -> Result<&mut PadDescriptor, ProtocolError> {
        let descriptor = self.lookup_mut(pad)?;
        descriptor.expect_direction(PadDirection::Input, operation)?;
        Ok(descriptor)
    }

    /// Get all input pads.
    pub fn inputs(&self) -> impl Iterator<Item = &PadDescriptor> {
        self.pads.values().filter(|p| p.direction == PadDirection::Input)
    }

    /// Get all output pads.
    pub fn outputs(&self) -> impl Iterator<Item = &PadDescriptor> {
        self.pads
            .values()
            .filter(|p| p.direction == PadDirection::Output)
    }

    /// Get all pads.
    pub fn iter(&self) -> impl Iterator<Item = &PadDescriptor> {
        self.pads.values()
    }

    /// Get the number of pads.
    pub fn len(&self) -> usize {
        self.pads.len()
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.pads.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pad_ref_display() {
        assert_eq!(PadRef::from("input").to_string(), "input");
        assert_eq!(PadRef::dynamic("src", 3).to_string(), "src_3");
        assert_eq!(PadRef::dynamic("src", 3).name(), "src");
        assert_ne!(PadRef::dynamic("src", 3), PadRef::dynamic("src", 4));
    }

    #[test]
    fn test_descriptor_defaults() {
        let pad = PadDescriptor::output("output", PadMode::Pull);
        assert_eq!(pad.direction(), PadDirection::Output);
        assert!(pad.is_pull());
        assert_eq!(pad.demand(), 0);
        assert!(!pad.start_of_stream());
        assert!(!pad.end_of_stream());
        assert!(pad.peer().is_none());
        assert!(pad.format().is_none());
        assert_eq!(pad.accepted_format(), &FormatCaps::Any);
    }

    #[test]
    fn test_registry_lookups() {
        let mut pads = PadRegistry::new();
        pads.add_pad(PadDescriptor::input("input", PadMode::Pull));
        pads.add_pad(PadDescriptor::output("output", PadMode::Push));

        assert_eq!(pads.len(), 2);
        assert_eq!(pads.inputs().count(), 1);
        assert_eq!(pads.outputs().count(), 1);

        assert!(pads.output_mut(&"output".into(), "buffer").is_ok());
        assert_eq!(
            pads.output_mut(&"input".into(), "buffer").unwrap_err(),
            ProtocolError::WrongDirection {
                pad: "input".into(),
                operation: "buffer",
                expected: PadDirection::Output,
                actual: PadDirection::Input,
            }
        );
        assert_eq!(
            pads.lookup(&"missing".into()).unwrap_err(),
            ProtocolError::UnknownPad {
                pad: "missing".into()
            }
        );
    }

    #[test]
    fn test_link_sets_peer() {
        let (mailbox, _inbox) = crate::link::mailbox();
        let mut pads = PadRegistry::new();
        pads.add_pad(PadDescriptor::output("output", PadMode::Pull));

        let pad = pads
            .link(&"output".into(), Peer::new("sink", "input", mailbox.clone()))
            .unwrap();
        assert_eq!(pad.peer().unwrap().element(), "sink");
        assert!(pad.linked_peer("buffer").is_ok());

        assert!(matches!(
            pads.link(&"other".into(), Peer::new("sink", "input", mailbox)),
            Err(ProtocolError::UnknownPad { .. })
        ));
        assert!(pads.remove_pad(&"output".into()).is_some());
        assert!(pads.is_empty());
    }

    #[test]
    fn test_mode_checks() {
        let pad = PadDescriptor::input("input", PadMode::Push);
        assert!(matches!(
            pad.expect_pull("demand"),
            Err(ProtocolError::WrongMode {
                expected: PadMode::Pull,
                actual: PadMode::Push,
                ..
            })
        ));
        assert!(matches!(
            pad.linked_peer("buffer"),
            Err(ProtocolError::NotLinked { .. })
        ));
    }
}
