//! Inbound buffers.

use crate::action::handle_actions;
use crate::buffer::Buffer;
use crate::element::{Callback, Element, ElementState, PadRef};
use crate::error::{ProtocolError, Result};
use crate::flow::supply_demand;
use crate::observability::{record_admission_overflow, record_admission_queued};

/// Handle buffers arriving on an input pad.
///
/// Push-mode pads hand them to `on_process` straight away. Pull-mode pads
/// queue them in the admission buffer and supply the element against its own
/// demand. Buffers after end of stream are a protocol violation of the peer,
/// including one still queued behind earlier data.
///
/// Flow is not gated on playback here: a push-mode pad of a stopped element
/// still reaches `on_process` unless a playback change is in progress.
pub fn handle_buffer<E: Element>(
    state: &mut ElementState<E>,
    pad: &PadRef,
    buffers: Vec<Buffer>,
) -> Result<()> {
    let descriptor = state.pads.input_mut(pad, "receive buffers")?;
    let eos_queued = descriptor.start_of_stream
        && descriptor
            .admission
            .as_ref()
            .is_some_and(|admission| admission.holds_end_of_stream());
    if descriptor.end_of_stream || eos_queued {
        return Err(ProtocolError::BufferAfterEndOfStream { pad: pad.clone() }.into());
    }
    if buffers.is_empty() {
        return Ok(());
    }
    if !descriptor.start_of_stream {
        descriptor.start_of_stream = true;
        tracing::debug!(element = %state.name, %pad, "stream started");
    }

    let Some(admission) = descriptor.admission.as_mut() else {
        return deliver_buffers(state, pad, buffers);
    };

    let overflow = admission.store_buffers(buffers);
    let queued = admission.queued_units();
    let pad_name = pad.to_string();
    record_admission_queued(&state.name, &pad_name, queued);
    if overflow {
        tracing::warn!(
            element = %state.name,
            pad = %pad_name,
            queued,
            high = admission.watermarks().high,
            "admission buffer overflow: upstream ignores demand"
        );
        record_admission_overflow(&state.name, &pad_name);
    }

    supply_demand(state, pad)
}

/// Invoke `on_process` and execute its actions.
pub(crate) fn deliver_buffers<E: Element>(
    state: &mut ElementState<E>,
    pad: &PadRef,
    buffers: Vec<Buffer>,
) -> Result<()> {
    let actions = state.invoke(Callback::Process, |element, ctx| {
        element.on_process(ctx, pad, buffers)
    })?;
    handle_actions(state, actions, Callback::Process)
}
