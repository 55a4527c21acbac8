//! Inbound format announcements.

use crate::action::handle_actions;
use crate::element::{Callback, Element, ElementState, PadRef};
use crate::error::{ProtocolError, Result};
use crate::flow::QueuedItem;
use crate::format::MediaFormat;

/// Handle a format arriving on an input pad.
///
/// The format must satisfy the pad's accepted format. On a pull-mode pad
/// with buffered data it waits behind that data.
pub fn handle_caps<E: Element>(
    state: &mut ElementState<E>,
    pad: &PadRef,
    format: MediaFormat,
) -> Result<()> {
    let descriptor = state.pads.input_mut(pad, "receive caps")?;
    if !descriptor.accepted_format.accepts(&format) {
        return Err(ProtocolError::CapsRejected {
            pad: pad.clone(),
            constraint: descriptor.accepted_format.to_string(),
            value: format.to_string(),
        }
        .into());
    }

    if let Some(admission) = descriptor.admission.as_mut() {
        if !admission.is_empty() {
            admission.store(QueuedItem::Caps(format));
            return Ok(());
        }
    }
    deliver_caps(state, pad, format)
}

/// Store the format on the pad and invoke `on_caps`.
pub(crate) fn deliver_caps<E: Element>(
    state: &mut ElementState<E>,
    pad: &PadRef,
    format: MediaFormat,
) -> Result<()> {
    let descriptor = state.pads.lookup_mut(pad)?;
    tracing::debug!(element = %state.name, %pad, %format, "format received");
    descriptor.format = Some(format.clone());

    let actions = state.invoke(Callback::Caps, |element, ctx| {
        element.on_caps(ctx, pad, &format)
    })?;
    handle_actions(state, actions, Callback::Caps)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::Action;
    use crate::buffer::Buffer;
    use crate::controller::{handle_buffer, handle_link};
    use crate::element::{PadDescriptor, PadMode};
    use crate::flow::{PlaybackState, change_playback_state};
    use crate::format::{AudioCodec, CapsValue, FormatCaps};
    use crate::testing::{ScriptedElement, probe};

    fn opus() -> MediaFormat {
        MediaFormat::Audio(AudioCodec::Opus)
    }

    #[test]
    fn test_accepted_caps_stored_and_delivered() {
        let element = ScriptedElement::new();
        let log = element.log();
        let mut state = ElementState::new("dec", element).with_pad(
            PadDescriptor::input("input", PadMode::Push)
                .with_accepted_format(FormatCaps::Audio(CapsValue::List(vec![
                    AudioCodec::Opus,
                    AudioCodec::Aac,
                ]))),
        );

        handle_caps(&mut state, &"input".into(), opus()).unwrap();
        assert_eq!(
            state.pads().get(&"input".into()).unwrap().format(),
            Some(&opus())
        );
        let calls = log.of(Callback::Caps);
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].format, Some(opus()));
    }

    #[test]
    fn test_rejected_caps_leave_format_unchanged() {
        let element = ScriptedElement::new();
        let log = element.log();
        let mut state = ElementState::new("dec", element).with_pad(
            PadDescriptor::input("input", PadMode::Push).with_accepted_format(FormatCaps::Bytes),
        );

        let err = handle_caps(&mut state, &"input".into(), opus()).unwrap_err();
        assert_eq!(
            err.as_protocol(),
            Some(&ProtocolError::CapsRejected {
                pad: "input".into(),
                constraint: "bytes".into(),
                value: "audio/Opus".into(),
            })
        );
        assert!(state.pads().get(&"input".into()).unwrap().format().is_none());
        assert!(log.is_empty());
    }

    #[test]
    fn test_caps_wait_behind_buffered_data() {
        let element = ScriptedElement::new()
            .on(Callback::PreparedToPlaying, |_| vec![Action::demand("input", 1)])
            .on(Callback::Process, |_| vec![Action::demand("input", 1)]);
        let log = element.log();
        let mut state = ElementState::new("dec", element)
            .with_pad(PadDescriptor::input("input", PadMode::Pull));
        let (peer, _upstream) = probe("src", "output");
        handle_link(&mut state, &"input".into(), peer).unwrap();

        handle_buffer(&mut state, &"input".into(), vec![Buffer::from_bytes(vec![1])]).unwrap();
        handle_caps(&mut state, &"input".into(), opus()).unwrap();
        assert!(state.pads().get(&"input".into()).unwrap().format().is_none());

        change_playback_state(&mut state, PlaybackState::Playing).unwrap();
        assert_eq!(
            log.callbacks()[2..].to_vec(),
            vec![Callback::Process, Callback::Caps]
        );
        assert_eq!(
            state.pads().get(&"input".into()).unwrap().format(),
            Some(&opus())
        );
    }
}
