//! Messages exchanged between elements.

use crate::buffer::Buffer;
use crate::element::PadRef;
use crate::event::Event;
use crate::flow::PlaybackState;
use crate::format::MediaFormat;
use crate::link::Peer;
use crate::metadata::MetadataValue;

/// Data and control flowing between linked pads.
///
/// The pad is always the pad of the *receiving* element.
#[derive(Debug, Clone)]
pub enum FlowMessage {
    /// Downstream asks for more units on an output pad.
    Demand {
        /// Output pad of the receiver.
        pad: PadRef,
        /// Units requested.
        size: i64,
    },
    /// Buffers arriving on an input pad.
    Buffer {
        /// Input pad of the receiver.
        pad: PadRef,
        /// The buffers, in order.
        buffers: Vec<Buffer>,
    },
    /// New format on an input pad.
    Caps {
        /// Input pad of the receiver.
        pad: PadRef,
        /// The format.
        format: MediaFormat,
    },
    /// An event arriving on either kind of pad.
    Event {
        /// Pad of the receiver.
        pad: PadRef,
        /// The event.
        event: Event,
    },
}

impl FlowMessage {
    /// Pad the message is addressed to.
    pub fn pad(&self) -> &PadRef {
        match self {
            FlowMessage::Demand { pad, .. }
            | FlowMessage::Buffer { pad, .. }
            | FlowMessage::Caps { pad, .. }
            | FlowMessage::Event { pad, .. } => pad,
        }
    }

    /// Short name of the message kind, for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            FlowMessage::Demand { .. } => "demand",
            FlowMessage::Buffer { .. } => "buffer",
            FlowMessage::Caps { .. } => "caps",
            FlowMessage::Event { .. } => "event",
        }
    }
}

/// Everything an element mailbox can receive.
#[derive(Debug, Clone)]
pub enum Message {
    /// Data or control from a linked peer.
    Flow(FlowMessage),
    /// Move to the target playback state right away.
    ChangePlayback(PlaybackState),
    /// Start a playback change but hold it until `ContinuePlaybackChange`.
    /// Flow messages arriving in between are deferred.
    BeginPlaybackChange(PlaybackState),
    /// Complete a held playback change.
    ContinuePlaybackChange,
    /// Link one of the element's pads to a peer.
    Link {
        /// Local pad.
        pad: PadRef,
        /// Remote pad.
        peer: Peer,
    },
    /// Drop one of the element's pads.
    Unlink {
        /// Local pad.
        pad: PadRef,
    },
    /// Stop the element.
    Shutdown,
}

impl From<FlowMessage> for Message {
    fn from(message: FlowMessage) -> Self {
        Message::Flow(message)
    }
}

/// Out-of-band notification sent to an element's watcher.
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    /// Name of the notifying element.
    pub element: String,
    /// Payload chosen by the element.
    pub value: MetadataValue,
}
