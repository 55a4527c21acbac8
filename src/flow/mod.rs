//! Flow control: playback lifecycle, demand and admission.
//!
//! - [`playback`]: the stopped / prepared / playing state machine and its
//!   transition API
//! - [`queue`]: inbound messages held while a playback change is pending
//! - [`demand`]: demand callbacks on output pads, input supply, and the
//!   delayed set
//! - [`admission`]: the bounded per-pad queue of pull-mode inputs

pub mod admission;
pub mod demand;
pub mod playback;
pub mod queue;

pub use admission::{AdmissionBuffer, QueuedItem, WaterMarks};
pub use demand::{DemandKind, drain_delayed_demands, handle_demand, supply_demand};
pub use playback::{
    Playback, PlaybackState, Transition, begin_playback_change, change_playback_state,
    continue_playback_change,
};
pub use queue::PlaybackQueue;
