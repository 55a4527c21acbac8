//! # flowcore
//!
//! The per-element flow-control core of a dataflow media pipeline.
//!
//! Elements are independent units linked pad to pad. Each one is driven by
//! messages arriving in its mailbox and reacts through user callbacks that
//! return [`Action`](action::Action)s. This crate sits between the two:
//!
//! - **Playback**: `Stopped <-> Prepared <-> Playing`, one step at a time,
//!   with inbound flow held while a change is in progress
//! - **Demand**: downstream asks, upstream supplies. Pull-mode inputs buffer
//!   what arrives and hand it to the element against its own demand
//! - **Actions**: every action a callback returns is checked against the pad
//!   and playback state before anything is sent
//!
//! ## Quick Start
//!
//! ```rust
//! use flowcore::prelude::*;
//! use flowcore::testing::linked_output;
//!
//! /// Answers demand with empty buffers.
//! struct Zeros;
//!
//! impl Element for Zeros {
//!     fn on_demand(
//!         &mut self,
//!         _ctx: &CallbackContext<'_>,
//!         pad: &PadRef,
//!         size: i64,
//!         _unit: DemandUnit,
//!     ) -> CallbackResult {
//!         let buffers = (0..size as u64)
//!             .map(|i| Buffer::new(vec![0u8; 16], Metadata::from_sequence(i)))
//!             .collect();
//!         Ok(vec![Action::buffers(pad.clone(), buffers)])
//!     }
//! }
//!
//! let (pad, downstream) = linked_output("output", PadMode::Pull);
//! let mut state = ElementState::new("zeros", Zeros).with_pad(pad);
//!
//! change_playback_state(&mut state, PlaybackState::Playing)?;
//! handle_demand(&mut state, &"output".into(), 3)?;
//!
//! assert_eq!(downstream.drain().len(), 1);
//! assert_eq!(state.pads().get(&"output".into()).map(|p| p.demand()), Some(0));
//! # Ok::<(), flowcore::Error>(())
//! ```
//!
//! To run elements concurrently, hand each state to
//! [`ElementRunner::spawn`](runner::ElementRunner::spawn) and link them with
//! [`Message::Link`](link::Message::Link).

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod action;
pub mod buffer;
pub mod config;
pub mod controller;
pub mod element;
pub mod error;
pub mod event;
pub mod flow;
pub mod format;
pub mod link;
pub mod metadata;
pub mod observability;
pub mod runner;
pub mod testing;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::action::{Action, handle_action, handle_actions};
    pub use crate::buffer::Buffer;
    pub use crate::config::{AdmissionConfig, ElementConfig};
    pub use crate::controller::{handle_buffer, handle_caps, handle_event};
    pub use crate::element::{
        Callback, CallbackContext, CallbackError, CallbackResult, DemandUnit, Element,
        ElementState, PadDescriptor, PadDirection, PadMode, PadRef,
    };
    pub use crate::error::{Error, ProtocolError, Result};
    pub use crate::event::Event;
    pub use crate::flow::{
        PlaybackState, begin_playback_change, change_playback_state, continue_playback_change,
        handle_demand,
    };
    pub use crate::format::{FormatCaps, MediaFormat};
    pub use crate::metadata::{Metadata, MetadataValue};
    pub use crate::runner::{ElementHandle, ElementRunner};
}

pub use error::{Error, Result};
