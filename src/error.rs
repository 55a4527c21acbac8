//! Error types for flowcore.

use crate::element::{Callback, CallbackError, PadDirection, PadMode, PadRef};
use crate::flow::PlaybackState;
use thiserror::Error;

/// Result type alias using flowcore's Error.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for element operations.
///
/// Every variant is fatal for the element that produced it: the runner stops
/// processing messages and hands the error to whoever joins the element.
#[derive(Error, Debug)]
pub enum Error {
    /// The element broke the pad protocol (bad action or bad inbound message).
    #[error("protocol violation: {0}")]
    Protocol(#[from] ProtocolError),

    /// A user callback returned an error. Passed through untouched.
    #[error("callback {callback} failed: {source}")]
    Callback {
        /// The callback that failed.
        callback: Callback,
        /// The error returned by the callback.
        #[source]
        source: CallbackError,
    },

    /// A peer or watcher mailbox is closed.
    #[error("transport error: {0}")]
    Transport(String),

    /// Invalid configuration.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Violations of the pad protocol.
///
/// Each variant names the offending pad and, where it matters, the action and
/// the playback state so the failing element can be diagnosed from the error
/// alone.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProtocolError {
    /// The pad does not exist on this element.
    #[error("unknown pad {pad}")]
    UnknownPad {
        /// The missing pad.
        pad: PadRef,
    },

    /// The pad has the wrong direction for the operation.
    #[error("{operation} on pad {pad} requires an {expected:?} pad, found {actual:?}")]
    WrongDirection {
        /// The pad.
        pad: PadRef,
        /// Operation that was attempted.
        operation: &'static str,
        /// Required direction.
        expected: PadDirection,
        /// Actual direction.
        actual: PadDirection,
    },

    /// The pad has the wrong mode for the operation.
    #[error("{operation} on pad {pad} requires a {expected:?} mode pad, found {actual:?}")]
    WrongMode {
        /// The pad.
        pad: PadRef,
        /// Operation that was attempted.
        operation: &'static str,
        /// Required mode.
        expected: PadMode,
        /// Actual mode.
        actual: PadMode,
    },

    /// The pad is not linked to a peer.
    #[error("{operation} on pad {pad}: pad is not linked")]
    NotLinked {
        /// The pad.
        pad: PadRef,
        /// Operation that was attempted.
        operation: &'static str,
    },

    /// The element is stopped.
    #[error("cannot {action}: element is stopped")]
    Stopped {
        /// The rejected action.
        action: &'static str,
    },

    /// The element is neither playing nor transitioning to playing.
    #[error("cannot {action}: element is not playing (state {state:?})")]
    NotPlaying {
        /// The rejected action.
        action: &'static str,
        /// The playback state at the time.
        state: PlaybackState,
    },

    /// The pad has already reached end of stream.
    #[error("cannot {action} on pad {pad}: end of stream already reached")]
    EndOfStreamSent {
        /// The pad.
        pad: PadRef,
        /// The rejected action.
        action: &'static str,
    },

    /// A buffer in a buffer action is malformed.
    #[error("invalid buffer #{index} for pad {pad}: {reason}")]
    InvalidBuffer {
        /// The pad.
        pad: PadRef,
        /// Position of the malformed buffer in the list.
        index: usize,
        /// Why the buffer is malformed.
        reason: &'static str,
    },

    /// An event is malformed.
    #[error("invalid event {event} for pad {pad}: {reason}")]
    InvalidEvent {
        /// The pad.
        pad: PadRef,
        /// Event name.
        event: String,
        /// Why the event is malformed.
        reason: &'static str,
    },

    /// An event cannot travel in the pad's direction.
    #[error("event {event} cannot be sent through {direction:?} pad {pad}")]
    EventDirection {
        /// The pad.
        pad: PadRef,
        /// Event name.
        event: String,
        /// Direction of the pad.
        direction: PadDirection,
    },

    /// The format does not satisfy the pad's accepted format.
    #[error("format {value} rejected by pad {pad}: does not satisfy {constraint}")]
    CapsRejected {
        /// The pad.
        pad: PadRef,
        /// Rendered constraint.
        constraint: String,
        /// Rendered format.
        value: String,
    },

    /// An action followed a redemand in the same batch.
    #[error("{action} after redemand: redemand must be the last action of a batch")]
    ActionAfterRedemand {
        /// The action that followed the redemand.
        action: &'static str,
    },

    /// A peer delivered buffers after end of stream.
    #[error("buffers received on pad {pad} after end of stream")]
    BufferAfterEndOfStream {
        /// The pad.
        pad: PadRef,
    },
}

impl Error {
    /// Check if this is a protocol violation.
    pub fn is_protocol(&self) -> bool {
        matches!(self, Error::Protocol(_))
    }

    /// Get the protocol violation, if this is one.
    pub fn as_protocol(&self) -> Option<&ProtocolError> {
        match self {
            Error::Protocol(e) => Some(e),
            _ => None,
        }
    }
}
