//! Playback queue: inbound flow messages held during a playback change.

use crate::controller;
use crate::element::{Element, ElementState};
use crate::error::Result;
use crate::link::FlowMessage;
use std::collections::VecDeque;

/// Flow messages waiting for a playback change to complete, in arrival
/// order.
#[derive(Debug, Default)]
pub struct PlaybackQueue {
    messages: VecDeque<FlowMessage>,
}

impl PlaybackQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message.
    pub fn push(&mut self, message: FlowMessage) {
        self.messages.push_back(message);
    }

    /// Number of held messages.
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Check if nothing is held.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Iterate over held messages in arrival order.
    pub fn iter(&self) -> impl Iterator<Item = &FlowMessage> {
        self.messages.iter()
    }

    fn take(&mut self) -> VecDeque<FlowMessage> {
        std::mem::take(&mut self.messages)
    }
}

/// Hand an inbound flow message to the element.
///
/// While a playback change is pending the message is held; otherwise it is
/// dispatched to its controller right away.
pub fn store<E: Element>(state: &mut ElementState<E>, message: FlowMessage) -> Result<()> {
    if state.playback.is_changing() {
        tracing::trace!(
            element = %state.name,
            kind = message.kind(),
            pad = %message.pad(),
            "message held until playback change completes"
        );
        state.playback_queue.push(message);
        return Ok(());
    }
    controller::dispatch(state, message)
}

/// Replay every held message in arrival order.
///
/// A replayed message is handled exactly as if it had just arrived, so one
/// that is illegal in the new state fails with the usual error. Replay stops
/// at the first error; the messages after it are dropped with the element.
pub fn flush<E: Element>(state: &mut ElementState<E>) -> Result<()> {
    let messages = state.playback_queue.take();
    if messages.is_empty() {
        return Ok(());
    }

    tracing::debug!(element = %state.name, count = messages.len(), "replaying held messages");
    for message in messages {
        controller::dispatch(state, message)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::Action;
    use crate::buffer::Buffer;
    use crate::element::{Callback, PadDescriptor, PadMode};
    use crate::error::ProtocolError;
    use crate::event::Event;
    use crate::flow::{PlaybackState, begin_playback_change, change_playback_state};
    use crate::metadata::Metadata;
    use crate::testing::{ScriptedElement, linked_output};

    fn buffer_message(seq: u64) -> FlowMessage {
        FlowMessage::Buffer {
            pad: "input".into(),
            buffers: vec![Buffer::new(vec![0u8; 8], Metadata::from_sequence(seq))],
        }
    }

    #[test]
    fn test_dispatches_directly_without_pending_change() {
        let element = ScriptedElement::new();
        let log = element.log();
        let mut state = ElementState::new("sink", element)
            .with_pad(PadDescriptor::input("input", PadMode::Push));

        store(&mut state, buffer_message(7)).unwrap();
        assert!(state.playback_queue().is_empty());
        assert_eq!(log.processed_sequences(), vec![7]);
    }

    #[test]
    fn test_flush_preserves_arrival_order() {
        let element = ScriptedElement::new();
        let log = element.log();
        let mut state = ElementState::new("sink", element)
            .with_pad(PadDescriptor::input("input", PadMode::Push));

        begin_playback_change(&mut state, PlaybackState::Playing).unwrap();
        store(&mut state, buffer_message(1)).unwrap();
        store(
            &mut state,
            FlowMessage::Event {
                pad: "input".into(),
                event: Event::custom("marker", crate::event::EventDirection::Downstream),
            },
        )
        .unwrap();
        store(&mut state, buffer_message(2)).unwrap();
        assert_eq!(state.playback_queue().len(), 3);
        assert!(log.is_empty());

        crate::flow::continue_playback_change(&mut state).unwrap();
        assert_eq!(
            log.callbacks(),
            vec![
                Callback::StoppedToPrepared,
                Callback::PreparedToPlaying,
                Callback::Process,
                Callback::Event,
                Callback::Process,
            ]
        );
        assert_eq!(log.processed_sequences(), vec![1, 2]);
    }

    #[test]
    fn test_replayed_message_fails_like_direct_one() {
        // A push filter forwards every buffer; replayed while only prepared,
        // the forward is rejected exactly as it would be on direct arrival.
        let (output, _peer) = linked_output("output", PadMode::Push);
        let element = ScriptedElement::new().on(Callback::Process, |call| {
            vec![Action::buffers("output", call.buffers.clone())]
        });
        let mut state = ElementState::new("filter", element)
            .with_pad(PadDescriptor::input("input", PadMode::Push))
            .with_pad(output);

        begin_playback_change(&mut state, PlaybackState::Prepared).unwrap();
        store(&mut state, buffer_message(1)).unwrap();
        store(&mut state, buffer_message(2)).unwrap();

        let err = crate::flow::continue_playback_change(&mut state).unwrap_err();
        assert_eq!(
            err.as_protocol(),
            Some(&ProtocolError::NotPlaying {
                action: "buffer",
                state: PlaybackState::Prepared,
            })
        );
        assert!(state.playback_queue().is_empty());

        // Same message delivered directly fails the same way
        let direct = store(&mut state, buffer_message(3)).unwrap_err();
        assert_eq!(direct.as_protocol(), err.as_protocol());

        change_playback_state(&mut state, PlaybackState::Stopped).unwrap();
    }
}
