//! Demand propagation.
//!
//! Demand flows upstream and buffers flow back against it. This module runs
//! the two places where accumulated demand turns into user callbacks:
//!
//! - On **output** pads, demand from downstream invokes `on_demand` while the
//!   pad has positive demand and has not ended.
//! - On pull-mode **input** pads, the element's own demand takes buffered
//!   data out of the admission buffer and hands it to `on_process`.
//!
//! Both run as *supply passes* guarded by `supplying_demand`. Demand and
//! redemand actions issued inside a pass are recorded in the delayed set and
//! handled after the pass by [`drain_delayed_demands`], which loops until no
//! deferred work is left instead of recursing.

use crate::action::handle_actions;
use crate::controller;
use crate::element::{Callback, DemandUnit, Element, ElementState, PadDirection, PadRef};
use crate::error::Result;
use crate::flow::admission::QueuedItem;
use crate::link::FlowMessage;
use crate::observability::record_admission_queued;

/// Kind of work held in the delayed set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DemandKind {
    /// Supply buffered input on an input pad.
    Supply,
    /// Re-run the demand decision on an output pad.
    Redemand,
}

impl DemandKind {
    /// Lowercase name for logging.
    pub fn as_str(&self) -> &'static str {
        match self {
            DemandKind::Supply => "supply",
            DemandKind::Redemand => "redemand",
        }
    }
}

/// Handle demand arriving from downstream on an output pad.
///
/// Adds `size` to the pad's demand and, if the pad is playing, open and still
/// in demand, invokes the demand callback. Demand on a push-mode pad is
/// ignored. Demand addressed to an input pad is a protocol violation.
pub fn handle_demand<E: Element>(
    state: &mut ElementState<E>,
    pad: &PadRef,
    size: i64,
) -> Result<()> {
    let descriptor = state.pads.output_mut(pad, "handle demand")?;
    if !descriptor.is_pull() {
        return Ok(());
    }
    descriptor.demand += size;
    tracing::trace!(element = %state.name, %pad, size, total = descriptor.demand, "demand received");

    if state.supplying_demand {
        defer(state, pad, DemandKind::Redemand);
        return Ok(());
    }
    run_demand_pass(state, pad)?;
    drain_delayed_demands(state)
}

/// Supply buffered input to the element on a pull-mode input pad.
///
/// Takes as many units from the admission buffer as the pad's demand allows
/// and hands them to the element, then drains the delayed set.
pub fn supply_demand<E: Element>(state: &mut ElementState<E>, pad: &PadRef) -> Result<()> {
    if state.supplying_demand {
        defer(state, pad, DemandKind::Supply);
        return Ok(());
    }
    run_supply_pass(state, pad)?;
    drain_delayed_demands(state)
}

/// Process the delayed set until it is empty.
///
/// Each round takes the whole set. Entries added while a round runs are
/// picked up by the next round.
pub fn drain_delayed_demands<E: Element>(state: &mut ElementState<E>) -> Result<()> {
    while !state.delayed_demands.is_empty() {
        let round = std::mem::take(&mut state.delayed_demands);
        for (pad, kind) in round {
            match kind {
                DemandKind::Supply => {
                    if let Some(delta) = state.pending_demand.remove(&pad) {
                        if let Some(descriptor) = state.pads.get_mut(&pad) {
                            descriptor.demand += delta;
                        }
                    }
                    run_supply_pass(state, &pad)?;
                }
                DemandKind::Redemand => run_demand_pass(state, &pad)?,
            }
        }
    }
    Ok(())
}

/// Record deferred work for after the current supply pass.
pub(crate) fn defer<E: Element>(state: &mut ElementState<E>, pad: &PadRef, kind: DemandKind) {
    crate::observability::trace_deferred_demand(&state.name, &pad.to_string(), kind.as_str());
    state.delayed_demands.insert((pad.clone(), kind));
}

/// Run demand-driven work left over from before the element was playing.
pub(crate) fn resume<E: Element>(state: &mut ElementState<E>) -> Result<()> {
    let mut waiting: Vec<(PadRef, PadDirection)> = state
        .pads
        .iter()
        .filter(|p| p.is_pull() && p.demand > 0)
        .map(|p| (p.pad.clone(), p.direction))
        .collect();
    waiting.sort();

    for (pad, direction) in waiting {
        match direction {
            PadDirection::Output => run_demand_pass(state, &pad)?,
            PadDirection::Input => run_supply_pass(state, &pad)?,
        }
    }
    drain_delayed_demands(state)
}

/// One invocation of the demand callback, without draining.
pub(crate) fn run_demand_pass<E: Element>(state: &mut ElementState<E>, pad: &PadRef) -> Result<()> {
    if !state.playback.allows_supply() {
        return Ok(());
    }
    let Some(descriptor) = state.pads.get(pad) else {
        return Ok(());
    };
    if descriptor.end_of_stream || descriptor.demand <= 0 {
        return Ok(());
    }
    let size = descriptor.demand;
    let unit = descriptor
        .demand_unit
        .unwrap_or(state.config.default_demand_unit);

    in_supply_pass(state, |state| {
        let actions = state.invoke(Callback::Demand, |element, ctx| {
            element.on_demand(ctx, pad, size, unit)
        })?;
        handle_actions(state, actions, Callback::Demand)
    })
}

/// One supply of buffered input, without draining.
pub(crate) fn run_supply_pass<E: Element>(state: &mut ElementState<E>, pad: &PadRef) -> Result<()> {
    if !state.playback.allows_supply() {
        return Ok(());
    }
    let Some(descriptor) = state.pads.get_mut(pad) else {
        return Ok(());
    };
    if descriptor.demand <= 0 {
        return Ok(());
    }
    let Some(admission) = descriptor.admission.as_mut() else {
        return Ok(());
    };

    let taken = admission.take(descriptor.demand);
    if taken.items.is_empty() {
        return Ok(());
    }
    descriptor.demand -= taken.units as i64;
    let queued = admission.queued_units();

    if let Some(size) = admission.top_up() {
        let peer = descriptor.linked_peer("demand")?;
        peer.send(
            FlowMessage::Demand {
                pad: peer.pad().clone(),
                size,
            }
            .into(),
        )?;
        state.metrics.record_demand(size);
        tracing::trace!(element = %state.name, %pad, size, "demand sent upstream");
    }
    record_admission_queued(&state.name, &pad.to_string(), queued);

    in_supply_pass(state, |state| {
        let mut batch = Vec::new();
        for item in taken.items {
            match item {
                QueuedItem::Buffer(buffer) => batch.push(buffer),
                QueuedItem::Event(event) => {
                    process_batch(state, pad, &mut batch)?;
                    controller::event::deliver_event(state, pad, event)?;
                }
                QueuedItem::Caps(format) => {
                    process_batch(state, pad, &mut batch)?;
                    controller::caps::deliver_caps(state, pad, format)?;
                }
            }
        }
        process_batch(state, pad, &mut batch)
    })
}

fn process_batch<E: Element>(
    state: &mut ElementState<E>,
    pad: &PadRef,
    batch: &mut Vec<crate::buffer::Buffer>,
) -> Result<()> {
    if batch.is_empty() {
        return Ok(());
    }
    controller::buffer::deliver_buffers(state, pad, std::mem::take(batch))
}

/// Run `f` with the re-entrancy guard set.
fn in_supply_pass<E: Element, F>(state: &mut ElementState<E>, f: F) -> Result<()>
where
    F: FnOnce(&mut ElementState<E>) -> Result<()>,
{
    let outer = std::mem::replace(&mut state.supplying_demand, true);
    let result = f(state);
    state.supplying_demand = outer;
    result
}

/// The unit demand on `pad` is counted in.
pub(crate) fn demand_unit_of<E: Element>(state: &ElementState<E>, pad: &PadRef) -> DemandUnit {
    state
        .pads
        .get(pad)
        .and_then(|p| p.demand_unit)
        .unwrap_or(state.config.default_demand_unit)
}
