//! Inbound events.
//!
//! Stream start and end of stream are bookkeeping for the pad and are handled
//! here; every other event goes to `on_event`. Inbound stream lifecycle is
//! handled permissively: an end of stream that arrives before the stream
//! started, or a second one, is logged and ignored.

use crate::action::handle_actions;
use crate::element::{Callback, Element, ElementState, PadDirection, PadRef};
use crate::error::{ProtocolError, Result};
use crate::event::Event;
use crate::flow::QueuedItem;

/// Handle an event arriving on a pad.
///
/// Events arriving on input pads must be able to travel downstream, those on
/// output pads upstream. Serialized events on a pull-mode input pad with
/// buffered data wait behind that data.
pub fn handle_event<E: Element>(
    state: &mut ElementState<E>,
    pad: &PadRef,
    event: Event,
) -> Result<()> {
    let descriptor = state.pads.lookup_mut(pad)?;
    let sent_from = match descriptor.direction {
        PadDirection::Input => PadDirection::Output,
        PadDirection::Output => PadDirection::Input,
    };
    if !event.can_travel(sent_from) {
        return Err(ProtocolError::EventDirection {
            pad: pad.clone(),
            event: event.name().to_string(),
            direction: descriptor.direction,
        }
        .into());
    }
    if let Err(reason) = event.validate() {
        return Err(ProtocolError::InvalidEvent {
            pad: pad.clone(),
            event: event.name().to_string(),
            reason,
        }
        .into());
    }

    if event.is_serialized() {
        if let Some(admission) = descriptor.admission.as_mut() {
            if !admission.is_empty() {
                admission.store(QueuedItem::Event(event));
                return Ok(());
            }
        }
    }
    deliver_event(state, pad, event)
}

/// Apply an event to the pad and, where it applies, invoke the element.
pub(crate) fn deliver_event<E: Element>(
    state: &mut ElementState<E>,
    pad: &PadRef,
    event: Event,
) -> Result<()> {
    match event {
        Event::StreamStart(start) => {
            let descriptor = state.pads.lookup_mut(pad)?;
            descriptor.start_of_stream = true;
            tracing::debug!(element = %state.name, %pad, stream_id = %start.stream_id, "stream started");
            Ok(())
        }
        Event::Eos => receive_end_of_stream(state, pad),
        event => {
            let actions = state.invoke(Callback::Event, |element, ctx| {
                element.on_event(ctx, pad, event)
            })?;
            handle_actions(state, actions, Callback::Event)
        }
    }
}

fn receive_end_of_stream<E: Element>(state: &mut ElementState<E>, pad: &PadRef) -> Result<()> {
    let descriptor = state.pads.lookup_mut(pad)?;
    if !descriptor.start_of_stream {
        tracing::warn!(element = %state.name, %pad, "end of stream before start of stream, ignoring");
        return Ok(());
    }
    if descriptor.end_of_stream {
        tracing::warn!(element = %state.name, %pad, "duplicate end of stream, ignoring");
        return Ok(());
    }
    descriptor.end_of_stream = true;
    tracing::debug!(element = %state.name, %pad, "end of stream received");

    let actions = state.invoke(Callback::EndOfStream, |element, ctx| {
        element.on_end_of_stream(ctx, pad)
    })?;
    handle_actions(state, actions, Callback::EndOfStream)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::Action;
    use crate::buffer::Buffer;
    use crate::controller::{handle_buffer, handle_link};
    use crate::element::{PadDescriptor, PadMode};
    use crate::event::{EventDirection, QosEvent, SeekEvent};
    use crate::flow::{PlaybackState, change_playback_state};
    use crate::metadata::Metadata;
    use crate::testing::{ScriptedElement, probe};
    use std::time::Duration;

    fn sink() -> (ElementState<ScriptedElement>, crate::testing::CallLog) {
        let element = ScriptedElement::new();
        let log = element.log();
        let state = ElementState::new("sink", element)
            .with_pad(PadDescriptor::input("input", PadMode::Push))
            .with_pad(PadDescriptor::output("output", PadMode::Push));
        (state, log)
    }

    #[test]
    fn test_stream_start_is_not_delivered() {
        let (mut state, log) = sink();
        handle_event(&mut state, &"input".into(), Event::stream_start("s0")).unwrap();

        assert!(state.pads().get(&"input".into()).unwrap().start_of_stream());
        assert!(log.is_empty());
    }

    #[test]
    fn test_end_of_stream_without_start_is_ignored() {
        let (mut state, log) = sink();
        handle_event(&mut state, &"input".into(), Event::Eos).unwrap();

        assert!(!state.pads().get(&"input".into()).unwrap().end_of_stream());
        assert!(log.is_empty());
    }

    #[test]
    fn test_end_of_stream_delivered_once() {
        let (mut state, log) = sink();
        handle_buffer(&mut state, &"input".into(), vec![Buffer::from_bytes(vec![0])]).unwrap();
        handle_event(&mut state, &"input".into(), Event::Eos).unwrap();
        handle_event(&mut state, &"input".into(), Event::Eos).unwrap();

        assert!(state.pads().get(&"input".into()).unwrap().end_of_stream());
        assert_eq!(log.of(Callback::EndOfStream).len(), 1);
    }

    #[test]
    fn test_other_events_reach_on_event() {
        let (mut state, log) = sink();
        let qos = Event::Qos(QosEvent {
            proportion: 1.5,
            jitter_ns: 200,
            timestamp: Duration::from_millis(40),
        });
        handle_event(&mut state, &"output".into(), qos.clone()).unwrap();
        handle_event(
            &mut state,
            &"input".into(),
            Event::custom("chapter", EventDirection::Downstream),
        )
        .unwrap();

        let calls = log.of(Callback::Event);
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].event, Some(qos));
        assert_eq!(calls[0].pad, Some("output".into()));
    }

    #[test]
    fn test_callback_result_returned_verbatim() {
        let element = ScriptedElement::new().failing(Callback::Event, "cannot seek");
        let mut state = ElementState::new("src", element)
            .with_pad(PadDescriptor::output("output", PadMode::Push));

        let err = handle_event(
            &mut state,
            &"output".into(),
            Event::Seek(SeekEvent::new_time(1_000)),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            crate::error::Error::Callback {
                callback: Callback::Event,
                ..
            }
        ));
    }

    #[test]
    fn test_wrong_way_event_rejected() {
        let (mut state, log) = sink();
        let err = handle_event(
            &mut state,
            &"input".into(),
            Event::Seek(SeekEvent::new_time(0)),
        )
        .unwrap_err();
        assert!(matches!(
            err.as_protocol(),
            Some(ProtocolError::EventDirection { .. })
        ));
        assert!(log.is_empty());
    }

    #[test]
    fn test_end_of_stream_waits_behind_buffered_data() {
        let element = ScriptedElement::new()
            .on(Callback::PreparedToPlaying, |_| vec![Action::demand("input", 1)]);
        let log = element.log();
        let mut state = ElementState::new("sink", element)
            .with_pad(PadDescriptor::input("input", PadMode::Pull));
        let (peer, _upstream) = probe("src", "output");
        handle_link(&mut state, &"input".into(), peer).unwrap();

        let data = (0..2)
            .map(|i| Buffer::new(vec![0u8; 4], Metadata::from_sequence(i)))
            .collect();
        handle_buffer(&mut state, &"input".into(), data).unwrap();
        handle_event(&mut state, &"input".into(), Event::Eos).unwrap();
        assert!(!state.pads().get(&"input".into()).unwrap().end_of_stream());

        change_playback_state(&mut state, PlaybackState::Playing).unwrap();
        assert_eq!(log.processed_sequences(), vec![0]);
        assert!(log.of(Callback::EndOfStream).is_empty());

        // Taking the last buffer also hands over the end of stream behind it
        crate::action::handle_action(&mut state, Action::demand("input", 1), Callback::Process)
            .unwrap();
        assert_eq!(log.processed_sequences(), vec![0, 1]);
        assert_eq!(log.of(Callback::EndOfStream).len(), 1);
    }
}
