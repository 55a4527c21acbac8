//! Inbound message handling.
//!
//! Each controller takes one kind of message from a linked peer, checks it
//! against the pads, updates them and invokes the matching callback. The
//! actions the callback returns go to the action executor.

pub mod buffer;
pub mod caps;
pub mod event;
pub mod link;

pub use buffer::handle_buffer;
pub use caps::handle_caps;
pub use event::handle_event;
pub use link::{handle_link, handle_unlink};

use crate::element::{Element, ElementState};
use crate::error::Result;
use crate::flow::handle_demand;
use crate::link::FlowMessage;

/// Route a flow message to its controller.
pub fn dispatch<E: Element>(state: &mut ElementState<E>, message: FlowMessage) -> Result<()> {
    match message {
        FlowMessage::Demand { pad, size } => handle_demand(state, &pad, size),
        FlowMessage::Buffer { pad, buffers } => handle_buffer(state, &pad, buffers),
        FlowMessage::Caps { pad, format } => handle_caps(state, &pad, format),
        FlowMessage::Event { pad, event } => handle_event(state, &pad, event),
    }
}
