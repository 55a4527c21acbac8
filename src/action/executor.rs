//! Action validation and execution.
//!
//! Actions run left to right, each checked against the state left behind by
//! the ones before it. The first invalid action fails the whole element:
//! it and everything after it are not executed, while earlier actions keep
//! their effect. A buffer action is the one exception that is atomic on its
//! own: if any buffer in its list is malformed, none is sent.
//!
//! Demand and redemand issued during a supply pass do not run right away.
//! They are recorded in the delayed set, which is drained once the outermost
//! batch completes.

use crate::action::Action;
use crate::buffer::{Buffer, units_of};
use crate::element::{Callback, CallbackOrigin, DemandUnit, Element, ElementState, PadRef};
use crate::error::{ProtocolError, Result};
use crate::event::Event;
use crate::flow::demand::{self, DemandKind, demand_unit_of};
use crate::flow::PlaybackState;
use crate::format::MediaFormat;
use crate::link::{FlowMessage, Notification};
use crate::metadata::MetadataValue;
use crate::observability::trace_action;

/// Execute a single action returned by `callback`.
pub fn handle_action<E: Element>(
    state: &mut ElementState<E>,
    action: Action,
    callback: Callback,
) -> Result<()> {
    execute(state, action, callback.origin())?;
    drain_if_idle(state)
}

/// Execute a batch of actions returned by `callback`, in order.
///
/// A redemand may only be followed by further redemands.
pub fn handle_actions<E: Element>(
    state: &mut ElementState<E>,
    actions: Vec<Action>,
    callback: Callback,
) -> Result<()> {
    let origin = callback.origin();
    let mut redemanded = false;

    for action in actions {
        let is_redemand = matches!(action, Action::Redemand { .. });
        if redemanded && !is_redemand {
            return Err(ProtocolError::ActionAfterRedemand {
                action: action.name(),
            }
            .into());
        }
        redemanded |= is_redemand;
        execute(state, action, origin)?;
    }

    drain_if_idle(state)
}

fn drain_if_idle<E: Element>(state: &mut ElementState<E>) -> Result<()> {
    if state.supplying_demand {
        return Ok(());
    }
    demand::drain_delayed_demands(state)
}

fn execute<E: Element>(
    state: &mut ElementState<E>,
    action: Action,
    origin: CallbackOrigin,
) -> Result<()> {
    trace_action(&state.name, action.name(), action.pad());

    match action {
        Action::Buffer { pad, buffers } => send_buffers(state, pad, buffers, origin),
        Action::Event { pad, event } => send_event(state, pad, event, origin),
        Action::Caps { pad, format } => send_caps(state, pad, format, origin),
        Action::Demand { pad, size } => request_input(state, pad, size),
        Action::Redemand { pad } => redemand(state, pad, origin),
        Action::Notify(value) => notify(state, value),
    }
}

// ============================================================================
// Flow actions
// ============================================================================

fn send_buffers<E: Element>(
    state: &mut ElementState<E>,
    pad: PadRef,
    buffers: Vec<Buffer>,
    origin: CallbackOrigin,
) -> Result<()> {
    let unit = demand_unit_of(state, &pad);
    let descriptor = state.pads.output_mut(&pad, "buffer")?;
    if descriptor.end_of_stream {
        return Err(ProtocolError::EndOfStreamSent {
            pad,
            action: "buffer",
        }
        .into());
    }
    if !state.playback.allows_flow(origin) {
        return Err(state.playback.flow_violation("buffer").into());
    }
    if buffers.is_empty() {
        return Ok(());
    }
    for (index, buffer) in buffers.iter().enumerate() {
        buffer
            .validate()
            .map_err(|reason| ProtocolError::InvalidBuffer {
                pad: pad.clone(),
                index,
                reason,
            })?;
    }
    let Some(peer) = descriptor.peer.as_ref() else {
        return Err(ProtocolError::NotLinked {
            pad,
            operation: "buffer",
        }
        .into());
    };

    let count = buffers.len();
    let units = units_of(&buffers, unit);
    let bytes = units_of(&buffers, DemandUnit::Bytes);
    peer.send(
        FlowMessage::Buffer {
            pad: peer.pad().clone(),
            buffers,
        }
        .into(),
    )?;

    descriptor.start_of_stream = true;
    if descriptor.is_pull() {
        descriptor.demand -= units as i64;
    }
    state.metrics.record_sent(count, bytes);
    Ok(())
}

fn send_event<E: Element>(
    state: &mut ElementState<E>,
    pad: PadRef,
    event: Event,
    origin: CallbackOrigin,
) -> Result<()> {
    let descriptor = state.pads.lookup_mut(&pad)?;
    if !event.can_travel(descriptor.direction) {
        return Err(ProtocolError::EventDirection {
            event: event.name().to_string(),
            direction: descriptor.direction,
            pad,
        }
        .into());
    }
    if descriptor.end_of_stream {
        return Err(ProtocolError::EndOfStreamSent {
            pad,
            action: "event",
        }
        .into());
    }
    let allowed = if event.is_eos() {
        state.playback.allows_end_of_stream(origin)
    } else {
        state.playback.allows_flow(origin)
    };
    if !allowed {
        return Err(state.playback.flow_violation("event").into());
    }
    if let Err(reason) = event.validate() {
        return Err(ProtocolError::InvalidEvent {
            event: event.name().to_string(),
            pad,
            reason,
        }
        .into());
    }
    let Some(peer) = descriptor.peer.as_ref() else {
        return Err(ProtocolError::NotLinked {
            pad,
            operation: "event",
        }
        .into());
    };

    match event {
        Event::Eos => {
            descriptor.end_of_stream = true;
            tracing::debug!(element = %state.name, %pad, "end of stream sent");
        }
        Event::StreamStart(_) => descriptor.start_of_stream = true,
        _ => {}
    }
    peer.send(
        FlowMessage::Event {
            pad: peer.pad().clone(),
            event,
        }
        .into(),
    )
}

fn send_caps<E: Element>(
    state: &mut ElementState<E>,
    pad: PadRef,
    format: MediaFormat,
    origin: CallbackOrigin,
) -> Result<()> {
    let descriptor = state.pads.output_mut(&pad, "caps")?;
    if !state.playback.allows_flow(origin) {
        return Err(state.playback.flow_violation("caps").into());
    }
    if !descriptor.accepted_format.accepts(&format) {
        return Err(ProtocolError::CapsRejected {
            constraint: descriptor.accepted_format.to_string(),
            value: format.to_string(),
            pad,
        }
        .into());
    }
    let Some(peer) = descriptor.peer.as_ref() else {
        return Err(ProtocolError::NotLinked {
            pad,
            operation: "caps",
        }
        .into());
    };

    peer.send(
        FlowMessage::Caps {
            pad: peer.pad().clone(),
            format: format.clone(),
        }
        .into(),
    )?;
    descriptor.format = Some(format);
    Ok(())
}

// ============================================================================
// Demand actions
// ============================================================================

fn request_input<E: Element>(state: &mut ElementState<E>, pad: PadRef, size: i64) -> Result<()> {
    let descriptor = state.pads.input_mut(&pad, "demand")?;
    descriptor.expect_pull("demand")?;
    if state.playback.state == PlaybackState::Stopped {
        return Err(ProtocolError::Stopped { action: "demand" }.into());
    }

    if state.supplying_demand {
        *state.pending_demand.entry(pad.clone()).or_insert(0) += size;
        demand::defer(state, &pad, DemandKind::Supply);
        return Ok(());
    }

    descriptor.demand += size;
    demand::run_supply_pass(state, &pad)
}

fn redemand<E: Element>(state: &mut ElementState<E>, pad: PadRef, origin: CallbackOrigin) -> Result<()> {
    let descriptor = state.pads.output_mut(&pad, "redemand")?;
    descriptor.expect_pull("redemand")?;
    if !state.playback.allows_flow(origin) {
        return Err(state.playback.flow_violation("redemand").into());
    }
    demand::defer(state, &pad, DemandKind::Redemand);
    Ok(())
}

// ============================================================================
// Notifications
// ============================================================================

fn notify<E: Element>(state: &mut ElementState<E>, value: MetadataValue) -> Result<()> {
    let Some(watcher) = state.watcher.as_ref() else {
        return Ok(());
    };
    let notification = Notification {
        element: state.name.clone(),
        value,
    };
    match watcher.notify(notification) {
        Ok(()) => state.metrics.record_notification(),
        Err(e) => tracing::warn!(element = %state.name, error = %e, "notification dropped"),
    }
    Ok(())
}
