//! Elements as seen by the flow-control core.
//!
//! - [`Element`]: the user callback trait
//! - [`ElementState`]: the state the core keeps per element
//! - [`PadDescriptor`] / [`PadRegistry`]: pads and their runtime state
//! - [`CallbackContext`]: read-only view handed to callbacks
//!
//! # Design
//!
//! Callbacks never touch the element state. They return actions, and the
//! action executor applies them after checking them against the playback
//! state and the pads. This keeps every invariant enforced in one place no
//! matter what the user logic does.

mod context;
mod pad;
mod state;
mod traits;

pub use context::CallbackContext;
pub use pad::{DemandUnit, PadDescriptor, PadDirection, PadMode, PadRef, PadRegistry};
pub use state::ElementState;
pub use traits::{Callback, CallbackError, CallbackOrigin, CallbackResult, Element};
