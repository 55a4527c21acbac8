//! Actions returned by element callbacks.
//!
//! An action describes one effect the element wants: send buffers, an event
//! or a format on a pad, ask for input, ask to be called for demand again,
//! or notify the watcher. The [`executor`] validates and performs them.

pub mod executor;

pub use executor::{handle_action, handle_actions};

use crate::buffer::Buffer;
use crate::element::PadRef;
use crate::event::Event;
use crate::format::MediaFormat;
use crate::metadata::MetadataValue;

/// One effect requested by a callback.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Send buffers through an output pad.
    Buffer {
        /// Output pad.
        pad: PadRef,
        /// Buffers in order. Sent all or none.
        buffers: Vec<Buffer>,
    },
    /// Send an event through a pad.
    Event {
        /// Pad whose direction fits the event.
        pad: PadRef,
        /// The event.
        event: Event,
    },
    /// Announce the format of an output pad.
    Caps {
        /// Output pad.
        pad: PadRef,
        /// The format.
        format: MediaFormat,
    },
    /// Ask for `size` more units on a pull-mode input pad.
    Demand {
        /// Input pad.
        pad: PadRef,
        /// Units, possibly negative to take demand back.
        size: i64,
    },
    /// Ask for `on_demand` to run again on a pull-mode output pad.
    ///
    /// Only further redemands may follow it in the same batch.
    Redemand {
        /// Output pad.
        pad: PadRef,
    },
    /// Send a value to the element's watcher.
    Notify(MetadataValue),
}

impl Action {
    /// Send one buffer.
    pub fn buffer(pad: impl Into<PadRef>, buffer: Buffer) -> Self {
        Action::Buffer {
            pad: pad.into(),
            buffers: vec![buffer],
        }
    }

    /// Send several buffers.
    pub fn buffers(pad: impl Into<PadRef>, buffers: Vec<Buffer>) -> Self {
        Action::Buffer {
            pad: pad.into(),
            buffers,
        }
    }

    /// Send an event.
    pub fn event(pad: impl Into<PadRef>, event: Event) -> Self {
        Action::Event {
            pad: pad.into(),
            event,
        }
    }

    /// End the stream on an output pad.
    pub fn end_of_stream(pad: impl Into<PadRef>) -> Self {
        Action::event(pad, Event::Eos)
    }

    /// Announce a format.
    pub fn caps(pad: impl Into<PadRef>, format: MediaFormat) -> Self {
        Action::Caps {
            pad: pad.into(),
            format,
        }
    }

    /// Ask for input.
    pub fn demand(pad: impl Into<PadRef>, size: i64) -> Self {
        Action::Demand {
            pad: pad.into(),
            size,
        }
    }

    /// Ask to be called for demand again.
    pub fn redemand(pad: impl Into<PadRef>) -> Self {
        Action::Redemand { pad: pad.into() }
    }

    /// Notify the watcher.
    pub fn notify(value: impl Into<MetadataValue>) -> Self {
        Action::Notify(value.into())
    }

    /// Short name of the action, used in errors and logs.
    pub fn name(&self) -> &'static str {
        match self {
            Action::Buffer { .. } => "buffer",
            Action::Event { .. } => "event",
            Action::Caps { .. } => "caps",
            Action::Demand { .. } => "demand",
            Action::Redemand { .. } => "redemand",
            Action::Notify(_) => "notify",
        }
    }

    /// Pad the action targets, if any.
    pub fn pad(&self) -> Option<&PadRef> {
        match self {
            Action::Buffer { pad, .. }
            | Action::Event { pad, .. }
            | Action::Caps { pad, .. }
            | Action::Demand { pad, .. }
            | Action::Redemand { pad } => Some(pad),
            Action::Notify(_) => None,
        }
    }
}
