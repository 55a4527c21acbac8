//! Helpers for testing elements and the flow-control core.
//!
//! [`ScriptedElement`] records every callback it receives and answers with
//! actions scripted per callback. [`linked_output`] and [`probe`] stand in
//! for the element on the other side of a link.
//!
//! # Example
//!
//! ```rust
//! use flowcore::prelude::*;
//! use flowcore::testing::{ScriptedElement, linked_output};
//!
//! let (pad, downstream) = linked_output("output", PadMode::Push);
//! let element = ScriptedElement::new().on(Callback::PreparedToPlaying, |_| {
//!     vec![Action::buffer("output", Buffer::from_bytes(vec![1, 2, 3]))]
//! });
//! let log = element.log();
//! let mut state = ElementState::new("src", element).with_pad(pad);
//!
//! change_playback_state(&mut state, PlaybackState::Playing).unwrap();
//! assert_eq!(log.len(), 2);
//! assert_eq!(downstream.drain().len(), 1);
//! ```

use crate::action::Action;
use crate::buffer::Buffer;
use crate::element::{
    Callback, CallbackContext, CallbackError, CallbackResult, DemandUnit, Element, PadDescriptor,
    PadMode, PadRef,
};
use crate::event::Event;
use crate::flow::PlaybackState;
use crate::format::MediaFormat;
use crate::link::{FlowMessage, Inbox, Message, Peer, mailbox};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

type Script = Box<dyn FnMut(&Invocation) -> Vec<Action> + Send>;

/// One recorded callback invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    /// Which callback ran.
    pub callback: Callback,
    /// Pad the callback was about, if any.
    pub pad: Option<PadRef>,
    /// Buffers handed to `on_process`.
    pub buffers: Vec<Buffer>,
    /// Size and unit handed to `on_demand`.
    pub demand: Option<(i64, DemandUnit)>,
    /// Event handed to `on_event`.
    pub event: Option<Event>,
    /// Format handed to `on_caps`.
    pub format: Option<MediaFormat>,
    /// Playback state seen by the callback.
    pub playback: PlaybackState,
}

impl Invocation {
    fn new(ctx: &CallbackContext<'_>, pad: Option<&PadRef>) -> Self {
        Self {
            callback: ctx.callback(),
            pad: pad.cloned(),
            buffers: Vec::new(),
            demand: None,
            event: None,
            format: None,
            playback: ctx.playback_state(),
        }
    }
}

/// Shared record of invocations, readable while the element is owned elsewhere.
#[derive(Debug, Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<Invocation>>>);

impl CallLog {
    fn lock(&self) -> MutexGuard<'_, Vec<Invocation>> {
        self.0.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn push(&self, invocation: Invocation) {
        self.lock().push(invocation);
    }

    /// Every invocation so far.
    pub fn all(&self) -> Vec<Invocation> {
        self.lock().clone()
    }

    /// The callbacks invoked so far, in order.
    pub fn callbacks(&self) -> Vec<Callback> {
        self.lock().iter().map(|i| i.callback).collect()
    }

    /// Invocations of one callback.
    pub fn of(&self, callback: Callback) -> Vec<Invocation> {
        self.lock()
            .iter()
            .filter(|i| i.callback == callback)
            .cloned()
            .collect()
    }

    /// Sequence numbers of every buffer handed to `on_process`, in order.
    pub fn processed_sequences(&self) -> Vec<u64> {
        self.lock()
            .iter()
            .filter(|i| i.callback == Callback::Process)
            .flat_map(|i| i.buffers.iter().map(|b| b.metadata().sequence))
            .collect()
    }

    /// Number of invocations.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Check if nothing was invoked.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

/// Element whose callbacks are scripted closures.
///
/// Unscripted callbacks return no actions.
#[derive(Default)]
pub struct ScriptedElement {
    scripts: HashMap<Callback, Script>,
    failures: HashMap<Callback, String>,
    log: CallLog,
}

impl ScriptedElement {
    /// Create an element that does nothing but record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `callback` with the actions returned by `script`.
    pub fn on<F>(mut self, callback: Callback, script: F) -> Self
    where
        F: FnMut(&Invocation) -> Vec<Action> + Send + 'static,
    {
        self.scripts.insert(callback, Box::new(script));
        self
    }

    /// Make `callback` fail with `reason`.
    pub fn failing(mut self, callback: Callback, reason: impl Into<String>) -> Self {
        self.failures.insert(callback, reason.into());
        self
    }

    /// Handle on the invocation log.
    pub fn log(&self) -> CallLog {
        self.log.clone()
    }

    fn respond(&mut self, invocation: Invocation) -> CallbackResult {
        let callback = invocation.callback;
        let actions = match self.scripts.get_mut(&callback) {
            Some(script) => script(&invocation),
            None => Vec::new(),
        };
        self.log.push(invocation);
        match self.failures.get(&callback) {
            Some(reason) => Err(CallbackError::new(reason.clone())),
            None => Ok(actions),
        }
    }
}

impl std::fmt::Debug for ScriptedElement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptedElement")
            .field("scripted", &self.scripts.keys().collect::<Vec<_>>())
            .field("invocations", &self.log.len())
            .finish()
    }
}

impl Element for ScriptedElement {
    fn on_process(
        &mut self,
        ctx: &CallbackContext<'_>,
        pad: &PadRef,
        buffers: Vec<Buffer>,
    ) -> CallbackResult {
        let mut invocation = Invocation::new(ctx, Some(pad));
        invocation.buffers = buffers;
        self.respond(invocation)
    }

    fn on_demand(
        &mut self,
        ctx: &CallbackContext<'_>,
        pad: &PadRef,
        size: i64,
        unit: DemandUnit,
    ) -> CallbackResult {
        let mut invocation = Invocation::new(ctx, Some(pad));
        invocation.demand = Some((size, unit));
        self.respond(invocation)
    }

    fn on_event(&mut self, ctx: &CallbackContext<'_>, pad: &PadRef, event: Event) -> CallbackResult {
        let mut invocation = Invocation::new(ctx, Some(pad));
        invocation.event = Some(event);
        self.respond(invocation)
    }

    fn on_caps(
        &mut self,
        ctx: &CallbackContext<'_>,
        pad: &PadRef,
        format: &MediaFormat,
    ) -> CallbackResult {
        let mut invocation = Invocation::new(ctx, Some(pad));
        invocation.format = Some(format.clone());
        self.respond(invocation)
    }

    fn on_end_of_stream(&mut self, ctx: &CallbackContext<'_>, pad: &PadRef) -> CallbackResult {
        self.respond(Invocation::new(ctx, Some(pad)))
    }

    fn on_stopped_to_prepared(&mut self, ctx: &CallbackContext<'_>) -> CallbackResult {
        self.respond(Invocation::new(ctx, None))
    }

    fn on_prepared_to_playing(&mut self, ctx: &CallbackContext<'_>) -> CallbackResult {
        self.respond(Invocation::new(ctx, None))
    }

    fn on_playing_to_prepared(&mut self, ctx: &CallbackContext<'_>) -> CallbackResult {
        self.respond(Invocation::new(ctx, None))
    }

    fn on_prepared_to_stopped(&mut self, ctx: &CallbackContext<'_>) -> CallbackResult {
        self.respond(Invocation::new(ctx, None))
    }
}

/// An output pad already linked to a fake downstream element.
///
/// Returns the descriptor and the downstream element's inbox.
pub fn linked_output(pad: impl Into<PadRef>, mode: PadMode) -> (PadDescriptor, Inbox) {
    let (peer, inbox) = probe("downstream", "input");
    let mut descriptor = PadDescriptor::output(pad, mode);
    descriptor.peer = Some(peer);
    (descriptor, inbox)
}

/// A fake peer and the inbox where its messages land.
pub fn probe(element: &str, pad: impl Into<PadRef>) -> (Peer, Inbox) {
    let (tx, rx) = mailbox();
    (Peer::new(element, pad, tx), rx)
}

/// Sizes of the demand messages among `messages`, in order.
pub fn demand_sizes(messages: &[Message]) -> Vec<i64> {
    messages
        .iter()
        .filter_map(|m| match m {
            Message::Flow(FlowMessage::Demand { size, .. }) => Some(*size),
            _ => None,
        })
        .collect()
}

/// Every buffer among `messages`, in order.
pub fn received_buffers(messages: &[Message]) -> Vec<Buffer> {
    messages
        .iter()
        .filter_map(|m| match m {
            Message::Flow(FlowMessage::Buffer { buffers, .. }) => Some(buffers.iter().cloned()),
            _ => None,
        })
        .flatten()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::ElementState;
    use crate::flow::change_playback_state;

    #[test]
    fn test_scripted_failure_still_logged() {
        let element = ScriptedElement::new().failing(Callback::StoppedToPrepared, "boom");
        let log = element.log();
        let mut state = ElementState::new("el", element);

        assert!(change_playback_state(&mut state, PlaybackState::Prepared).is_err());
        assert_eq!(log.callbacks(), vec![Callback::StoppedToPrepared]);
        assert_eq!(log.all()[0].playback, PlaybackState::Stopped);
    }

    #[test]
    fn test_message_filters() {
        let messages: Vec<Message> = vec![
            FlowMessage::Demand {
                pad: "output".into(),
                size: 3,
            }
            .into(),
            FlowMessage::Buffer {
                pad: "input".into(),
                buffers: vec![Buffer::from_bytes(vec![1]), Buffer::from_bytes(vec![2])],
            }
            .into(),
            Message::Shutdown,
        ];
        assert_eq!(demand_sizes(&messages), vec![3]);
        assert_eq!(received_buffers(&messages).len(), 2);
    }
}
