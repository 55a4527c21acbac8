//! The element callback trait.

use crate::action::Action;
use crate::buffer::Buffer;
use crate::element::{CallbackContext, DemandUnit, PadRef};
use crate::event::Event;
use crate::format::MediaFormat;
use std::fmt;
use thiserror::Error;

// ============================================================================
// Callback results
// ============================================================================

/// Error returned by element callbacks.
///
/// The core never inspects it: it is wrapped in
/// [`Error::Callback`](crate::Error::Callback) and stops the element.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{reason}")]
pub struct CallbackError {
    reason: String,
}

impl CallbackError {
    /// Create a callback error.
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    /// Why the callback failed.
    pub fn reason(&self) -> &str {
        &self.reason
    }
}

/// What a callback returns: the actions to execute, in order.
pub type CallbackResult = std::result::Result<Vec<Action>, CallbackError>;

// ============================================================================
// Callback identity
// ============================================================================

/// Identifies an element callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Callback {
    /// [`Element::on_process`]
    Process,
    /// [`Element::on_demand`]
    Demand,
    /// [`Element::on_event`]
    Event,
    /// [`Element::on_caps`]
    Caps,
    /// [`Element::on_end_of_stream`]
    EndOfStream,
    /// [`Element::on_stopped_to_prepared`]
    StoppedToPrepared,
    /// [`Element::on_prepared_to_playing`]
    PreparedToPlaying,
    /// [`Element::on_playing_to_prepared`]
    PlayingToPrepared,
    /// [`Element::on_prepared_to_stopped`]
    PreparedToStopped,
}

impl Callback {
    /// Method name of the callback.
    pub fn name(&self) -> &'static str {
        match self {
            Callback::Process => "on_process",
            Callback::Demand => "on_demand",
            Callback::Event => "on_event",
            Callback::Caps => "on_caps",
            Callback::EndOfStream => "on_end_of_stream",
            Callback::StoppedToPrepared => "on_stopped_to_prepared",
            Callback::PreparedToPlaying => "on_prepared_to_playing",
            Callback::PlayingToPrepared => "on_playing_to_prepared",
            Callback::PreparedToStopped => "on_prepared_to_stopped",
        }
    }

    /// How actions returned by this callback are validated.
    pub fn origin(&self) -> CallbackOrigin {
        match self {
            Callback::PreparedToPlaying => CallbackOrigin::PreparedToPlaying,
            Callback::PlayingToPrepared => CallbackOrigin::PlayingToPrepared,
            _ => CallbackOrigin::Ordinary,
        }
    }
}

impl fmt::Display for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Where a batch of actions comes from, as far as validation cares.
///
/// Two transition callbacks get extra rights: the one entering `Playing` may
/// already send data, and the one leaving it may still end its streams.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackOrigin {
    /// Any other callback.
    Ordinary,
    /// The prepared-to-playing transition callback.
    PreparedToPlaying,
    /// The playing-to-prepared transition callback.
    PlayingToPrepared,
}

// ============================================================================
// Element
// ============================================================================

/// User processing logic hosted by the flow-control core.
///
/// Every callback gets a read-only [`CallbackContext`] and returns the
/// [`Action`]s to perform. The core validates each action against the
/// playback state and the pads before executing it; an invalid action stops
/// the element with a protocol error.
///
/// All callbacks default to doing nothing.
///
/// # Example
///
/// ```rust
/// use flowcore::prelude::*;
///
/// /// Pull-mode filter that doubles each payload.
/// struct Doubler;
///
/// impl Element for Doubler {
///     fn on_demand(
///         &mut self,
///         _ctx: &CallbackContext<'_>,
///         _pad: &PadRef,
///         size: i64,
///         _unit: DemandUnit,
///     ) -> CallbackResult {
///         Ok(vec![Action::demand("input", size)])
///     }
///
///     fn on_process(
///         &mut self,
///         _ctx: &CallbackContext<'_>,
///         _pad: &PadRef,
///         buffers: Vec<Buffer>,
///     ) -> CallbackResult {
///         let doubled = buffers
///             .into_iter()
///             .map(|b| {
///                 let data: Vec<u8> = b.as_bytes().iter().map(|x| x.wrapping_mul(2)).collect();
///                 Buffer::new(data, b.metadata().clone())
///             })
///             .collect();
///         Ok(vec![Action::buffers("output", doubled)])
///     }
///
///     fn on_end_of_stream(&mut self, _ctx: &CallbackContext<'_>, _pad: &PadRef) -> CallbackResult {
///         Ok(vec![Action::end_of_stream("output")])
///     }
/// }
/// ```
pub trait Element: Send {
    /// Buffers arrived on an input pad.
    ///
    /// In pull mode these are taken from the admission buffer against the
    /// demand the element placed on the pad.
    fn on_process(
        &mut self,
        ctx: &CallbackContext<'_>,
        pad: &PadRef,
        buffers: Vec<Buffer>,
    ) -> CallbackResult {
        let _ = (ctx, pad, buffers);
        Ok(vec![])
    }

    /// A pull-mode output pad has positive demand.
    ///
    /// `size` is the total outstanding demand in `unit`s, not the increment.
    fn on_demand(
        &mut self,
        ctx: &CallbackContext<'_>,
        pad: &PadRef,
        size: i64,
        unit: DemandUnit,
    ) -> CallbackResult {
        let _ = (ctx, pad, size, unit);
        Ok(vec![])
    }

    /// An event arrived. Stream start and end of stream never get here.
    fn on_event(&mut self, ctx: &CallbackContext<'_>, pad: &PadRef, event: Event) -> CallbackResult {
        let _ = (ctx, pad, event);
        Ok(vec![])
    }

    /// A new format was accepted on an input pad.
    fn on_caps(
        &mut self,
        ctx: &CallbackContext<'_>,
        pad: &PadRef,
        format: &MediaFormat,
    ) -> CallbackResult {
        let _ = (ctx, pad, format);
        Ok(vec![])
    }

    /// The stream on an input pad ended.
    fn on_end_of_stream(&mut self, ctx: &CallbackContext<'_>, pad: &PadRef) -> CallbackResult {
        let _ = (ctx, pad);
        Ok(vec![])
    }

    /// Entering `Prepared` from `Stopped`.
    fn on_stopped_to_prepared(&mut self, ctx: &CallbackContext<'_>) -> CallbackResult {
        let _ = ctx;
        Ok(vec![])
    }

    /// Entering `Playing`. Buffers, events and formats may already be sent.
    fn on_prepared_to_playing(&mut self, ctx: &CallbackContext<'_>) -> CallbackResult {
        let _ = ctx;
        Ok(vec![])
    }

    /// Leaving `Playing`. End of stream may still be sent.
    fn on_playing_to_prepared(&mut self, ctx: &CallbackContext<'_>) -> CallbackResult {
        let _ = ctx;
        Ok(vec![])
    }

    /// Entering `Stopped` from `Prepared`.
    fn on_prepared_to_stopped(&mut self, ctx: &CallbackContext<'_>) -> CallbackResult {
        let _ = ctx;
        Ok(vec![])
    }
}

impl<T: Element + ?Sized> Element for Box<T> {
    fn on_process(
        &mut self,
        ctx: &CallbackContext<'_>,
        pad: &PadRef,
        buffers: Vec<Buffer>,
    ) -> CallbackResult {
        (**self).on_process(ctx, pad, buffers)
    }

    fn on_demand(
        &mut self,
        ctx: &CallbackContext<'_>,
        pad: &PadRef,
        size: i64,
        unit: DemandUnit,
    ) -> CallbackResult {
        (**self).on_demand(ctx, pad, size, unit)
    }

    fn on_event(&mut self, ctx: &CallbackContext<'_>, pad: &PadRef, event: Event) -> CallbackResult {
        (**self).on_event(ctx, pad, event)
    }

    fn on_caps(
        &mut self,
        ctx: &CallbackContext<'_>,
        pad: &PadRef,
        format: &MediaFormat,
    ) -> CallbackResult {
        (**self).on_caps(ctx, pad, format)
    }

    fn on_end_of_stream(&mut self, ctx: &CallbackContext<'_>, pad: &PadRef) -> CallbackResult {
        (**self).on_end_of_stream(ctx, pad)
    }

    fn on_stopped_to_prepared(&mut self, ctx: &CallbackContext<'_>) -> CallbackResult {
        (**self).on_stopped_to_prepared(ctx)
    }

    fn on_prepared_to_playing(&mut self, ctx: &CallbackContext<'_>) -> CallbackResult {
        (**self).on_prepared_to_playing(ctx)
    }

    fn on_playing_to_prepared(&mut self, ctx: &CallbackContext<'_>) -> CallbackResult {
        (**self).on_playing_to_prepared(ctx)
    }

    fn on_prepared_to_stopped(&mut self, ctx: &CallbackContext<'_>) -> CallbackResult {
        (**self).on_prepared_to_stopped(ctx)
    }
}
