//! Linking and unlinking pads.

use crate::element::{Element, ElementState, PadDirection, PadRef};
use crate::error::{ProtocolError, Result};
use crate::flow::AdmissionBuffer;
use crate::link::{FlowMessage, Peer};

/// Link a pad to a peer.
///
/// Linking a pull-mode input pad gives it a fresh admission buffer and sends
/// the initial demand upstream.
pub fn handle_link<E: Element>(state: &mut ElementState<E>, pad: &PadRef, peer: Peer) -> Result<()> {
    let default_unit = state.config.default_demand_unit;
    let descriptor = state.pads.link(pad, peer)?;
    if let Some(peer) = descriptor.peer.as_ref() {
        tracing::info!(
            element = %state.name,
            %pad,
            peer = %format_args!("{}:{}", peer.element(), peer.pad()),
            "pad linked"
        );
    }

    if descriptor.direction != PadDirection::Input || !descriptor.is_pull() {
        return Ok(());
    }

    if let Some(old) = descriptor.admission.as_ref() {
        if !old.is_empty() {
            tracing::warn!(element = %state.name, %pad, dropped = old.len(), "relink drops queued input");
        }
    }
    let unit = descriptor.demand_unit.unwrap_or(default_unit);
    let mut admission = AdmissionBuffer::new(&state.config.admission, unit);
    if let (Some(size), Some(peer)) = (admission.top_up(), descriptor.peer.as_ref()) {
        peer.send(
            FlowMessage::Demand {
                pad: peer.pad().clone(),
                size,
            }
            .into(),
        )?;
        state.metrics.record_demand(size);
    }
    descriptor.admission = Some(admission);
    Ok(())
}

/// Remove a pad together with any deferred work for it.
pub fn handle_unlink<E: Element>(state: &mut ElementState<E>, pad: &PadRef) -> Result<()> {
    let Some(descriptor) = state.pads.remove_pad(pad) else {
        return Err(ProtocolError::UnknownPad { pad: pad.clone() }.into());
    };
    state.pending_demand.remove(pad);
    state.delayed_demands.retain(|(p, _)| p != pad);

    let dropped = descriptor.admission.as_ref().map_or(0, |a| a.len());
    tracing::info!(element = %state.name, %pad, dropped, "pad unlinked");
    Ok(())
}
