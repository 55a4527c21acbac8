//! Playback lifecycle of an element.
//!
//! An element moves between three states, one step at a time:
//!
//! ```text
//! Stopped <──> Prepared <──> Playing
//! ```
//!
//! A change is requested with [`begin_playback_change`] and carried out by
//! [`continue_playback_change`]. In between, inbound flow messages are held in
//! the playback queue. Each step runs the matching transition callback while
//! the transition marker is set, then commits the new state. Once the target
//! is reached the held messages are replayed in arrival order.

use crate::action::handle_actions;
use crate::element::{Callback, CallbackOrigin, Element, ElementState};
use crate::error::{ProtocolError, Result};
use crate::flow::{demand, queue};
use crate::observability::trace_state_change;
use std::fmt;

/// Playback state of an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum PlaybackState {
    /// Initial state. No flow actions are allowed.
    #[default]
    Stopped,
    /// Resources are allocated but data does not flow yet.
    Prepared,
    /// Data flows.
    Playing,
}

impl PlaybackState {
    /// The neighbouring state on the way to `target`, if not already there.
    pub fn step_towards(self, target: PlaybackState) -> Option<PlaybackState> {
        use PlaybackState::*;
        match (self, target) {
            (a, b) if a == b => None,
            (Stopped, _) => Some(Prepared),
            (Playing, _) => Some(Prepared),
            (Prepared, Stopped) => Some(Stopped),
            (Prepared, _) => Some(Playing),
        }
    }
}

impl fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// A single step between two neighbouring states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    /// State being left.
    pub from: PlaybackState,
    /// State being entered.
    pub to: PlaybackState,
}

impl Transition {
    /// The step that starts data flow.
    pub const PREPARED_TO_PLAYING: Transition = Transition {
        from: PlaybackState::Prepared,
        to: PlaybackState::Playing,
    };

    /// The callback run while this transition is in progress.
    pub fn callback(&self) -> Callback {
        use PlaybackState::*;
        match (self.from, self.to) {
            (Stopped, _) => Callback::StoppedToPrepared,
            (Prepared, Playing) => Callback::PreparedToPlaying,
            (Playing, _) => Callback::PlayingToPrepared,
            (Prepared, _) => Callback::PreparedToStopped,
        }
    }
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}->{}", self.from, self.to)
    }
}

/// Current playback state plus any change in progress.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Playback {
    pub(crate) state: PlaybackState,
    pub(crate) pending: Option<PlaybackState>,
    pub(crate) transition: Option<Transition>,
}

impl Playback {
    /// Create a stopped playback.
    pub fn new() -> Self {
        Self::default()
    }

    /// The committed state.
    pub fn state(&self) -> PlaybackState {
        self.state
    }

    /// The requested target, while a change is pending.
    pub fn pending(&self) -> Option<PlaybackState> {
        self.pending
    }

    /// The step whose callback is running right now, if any.
    pub fn transition(&self) -> Option<Transition> {
        self.transition
    }

    /// Check if the element is playing.
    #[inline]
    pub fn is_playing(&self) -> bool {
        self.state == PlaybackState::Playing
    }

    /// Check if inbound flow messages are being held back.
    #[inline]
    pub fn is_changing(&self) -> bool {
        self.pending.is_some()
    }

    /// Check if flow actions (buffers, events, formats, redemand) are legal
    /// for a callback of the given origin.
    pub fn allows_flow(&self, origin: CallbackOrigin) -> bool {
        self.is_playing() || origin == CallbackOrigin::PreparedToPlaying
    }

    /// Check if an end-of-stream event is legal for the given origin.
    ///
    /// Besides the usual flow rules, an element may close its streams while
    /// leaving the playing state.
    pub fn allows_end_of_stream(&self, origin: CallbackOrigin) -> bool {
        self.allows_flow(origin) || origin == CallbackOrigin::PlayingToPrepared
    }

    /// Check if buffered input and demand callbacks may run.
    #[inline]
    pub fn allows_supply(&self) -> bool {
        self.is_playing()
    }

    /// The violation to report for a flow action that is not allowed now.
    pub(crate) fn flow_violation(&self, action: &'static str) -> ProtocolError {
        match self.state {
            PlaybackState::Stopped => ProtocolError::Stopped { action },
            state => ProtocolError::NotPlaying { action, state },
        }
    }
}

/// Request a playback change.
///
/// Until [`continue_playback_change`] completes it, inbound flow messages are
/// held in the playback queue. Requesting the current state with nothing
/// pending does nothing; a new request while one is pending retargets it.
pub fn begin_playback_change<E: Element>(
    state: &mut ElementState<E>,
    target: PlaybackState,
) -> Result<()> {
    if state.playback.pending.is_none() && state.playback.state == target {
        tracing::debug!(element = %state.name, %target, "already in requested playback state");
        return Ok(());
    }

    tracing::info!(
        element = %state.name,
        current = %state.playback.state,
        %target,
        "playback change requested"
    );
    state.playback.pending = Some(target);
    Ok(())
}

/// Carry out the pending playback change.
///
/// Walks towards the target one step at a time. Each step sets the transition
/// marker, runs the matching callback and its actions, then commits the new
/// state. Reaching `Playing` resumes demand accumulated while not playing.
/// Finally the playback queue is replayed.
pub fn continue_playback_change<E: Element>(state: &mut ElementState<E>) -> Result<()> {
    let Some(target) = state.playback.pending else {
        return Ok(());
    };

    while let Some(next) = state.playback.state.step_towards(target) {
        let transition = Transition {
            from: state.playback.state,
            to: next,
        };
        let callback = transition.callback();

        state.playback.transition = Some(transition);
        let result = state
            .invoke(callback, |element, ctx| match callback {
                Callback::StoppedToPrepared => element.on_stopped_to_prepared(ctx),
                Callback::PreparedToPlaying => element.on_prepared_to_playing(ctx),
                Callback::PlayingToPrepared => element.on_playing_to_prepared(ctx),
                _ => element.on_prepared_to_stopped(ctx),
            })
            .and_then(|actions| handle_actions(state, actions, callback));
        state.playback.transition = None;
        result?;

        state.playback.state = next;
        trace_state_change(
            &state.name,
            &transition.from.to_string(),
            &transition.to.to_string(),
        );

        if next == PlaybackState::Playing {
            demand::resume(state)?;
        }
    }

    state.playback.pending = None;
    queue::flush(state)
}

/// Request and carry out a playback change in one go.
pub fn change_playback_state<E: Element>(
    state: &mut ElementState<E>,
    target: PlaybackState,
) -> Result<()> {
    begin_playback_change(state, target)?;
    continue_playback_change(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::Action;
    use crate::buffer::Buffer;
    use crate::element::{PadDescriptor, PadMode};
    use crate::link::{FlowMessage, Message};
    use crate::testing::{ScriptedElement, linked_output};

    #[test]
    fn test_step_towards() {
        use PlaybackState::*;
        assert_eq!(Stopped.step_towards(Playing), Some(Prepared));
        assert_eq!(Prepared.step_towards(Playing), Some(Playing));
        assert_eq!(Playing.step_towards(Stopped), Some(Prepared));
        assert_eq!(Prepared.step_towards(Stopped), Some(Stopped));
        assert_eq!(Playing.step_towards(Playing), None);
    }

    #[test]
    fn test_transition_callbacks() {
        use PlaybackState::*;
        let t = |from, to| Transition { from, to }.callback();
        assert_eq!(t(Stopped, Prepared), Callback::StoppedToPrepared);
        assert_eq!(t(Prepared, Playing), Callback::PreparedToPlaying);
        assert_eq!(t(Playing, Prepared), Callback::PlayingToPrepared);
        assert_eq!(t(Prepared, Stopped), Callback::PreparedToStopped);
        assert_eq!(Transition::PREPARED_TO_PLAYING.to_string(), "Prepared->Playing");
    }

    #[test]
    fn test_flow_legality() {
        let mut playback = Playback::new();
        assert!(!playback.allows_flow(CallbackOrigin::Ordinary));
        assert!(playback.allows_flow(CallbackOrigin::PreparedToPlaying));
        assert_eq!(
            playback.flow_violation("buffer"),
            ProtocolError::Stopped { action: "buffer" }
        );

        playback.state = PlaybackState::Prepared;
        assert!(!playback.allows_flow(CallbackOrigin::Ordinary));
        assert!(!playback.allows_end_of_stream(CallbackOrigin::Ordinary));
        assert!(playback.allows_end_of_stream(CallbackOrigin::PlayingToPrepared));

        playback.state = PlaybackState::Playing;
        assert!(playback.allows_flow(CallbackOrigin::Ordinary));
        assert!(playback.allows_supply());
    }

    #[test]
    fn test_change_runs_each_step_in_order() {
        let element = ScriptedElement::new();
        let log = element.log();
        let mut state = ElementState::new("el", element);

        change_playback_state(&mut state, PlaybackState::Playing).unwrap();
        assert_eq!(state.playback().state(), PlaybackState::Playing);
        assert!(!state.playback().is_changing());

        change_playback_state(&mut state, PlaybackState::Stopped).unwrap();
        assert_eq!(state.playback().state(), PlaybackState::Stopped);

        assert_eq!(
            log.callbacks(),
            vec![
                Callback::StoppedToPrepared,
                Callback::PreparedToPlaying,
                Callback::PlayingToPrepared,
                Callback::PreparedToStopped,
            ]
        );
    }

    #[test]
    fn test_same_state_is_noop() {
        let element = ScriptedElement::new();
        let log = element.log();
        let mut state = ElementState::new("el", element);

        change_playback_state(&mut state, PlaybackState::Stopped).unwrap();
        assert!(log.is_empty());
    }

    #[test]
    fn test_first_buffer_during_prepared_to_playing() {
        let (pad, peer_inbox) = linked_output("output", PadMode::Push);
        let element = ScriptedElement::new().on(Callback::PreparedToPlaying, |_| {
            vec![Action::buffer("output", Buffer::from_bytes(vec![1, 2, 3]))]
        });
        let mut state = ElementState::new("src", element).with_pad(pad);

        change_playback_state(&mut state, PlaybackState::Playing).unwrap();

        let received = peer_inbox.drain();
        assert_eq!(received.len(), 1);
        assert!(matches!(
            &received[0],
            Message::Flow(FlowMessage::Buffer { buffers, .. }) if buffers.len() == 1
        ));
    }

    #[test]
    fn test_end_of_stream_while_leaving_playing() {
        let (pad, peer_inbox) = linked_output("output", PadMode::Push);
        let element = ScriptedElement::new()
            .on(Callback::PlayingToPrepared, |_| vec![Action::end_of_stream("output")]);
        let mut state = ElementState::new("src", element).with_pad(pad);

        change_playback_state(&mut state, PlaybackState::Playing).unwrap();
        change_playback_state(&mut state, PlaybackState::Prepared).unwrap();

        assert!(state.pads().get(&"output".into()).unwrap().end_of_stream());
        assert_eq!(peer_inbox.drain().len(), 1);
    }

    #[test]
    fn test_failed_callback_keeps_state() {
        let element = ScriptedElement::new().failing(Callback::StoppedToPrepared, "no device");
        let mut state = ElementState::new("src", element);

        let err = change_playback_state(&mut state, PlaybackState::Prepared).unwrap_err();
        assert!(err.to_string().contains("no device"));
        assert_eq!(state.playback().state(), PlaybackState::Stopped);
        assert!(state.playback().transition().is_none());
    }

    #[test]
    fn test_messages_held_until_change_completes() {
        let element = ScriptedElement::new();
        let log = element.log();
        let mut state = ElementState::new("sink", element)
            .with_pad(PadDescriptor::input("input", PadMode::Push));
        change_playback_state(&mut state, PlaybackState::Playing).unwrap();

        begin_playback_change(&mut state, PlaybackState::Prepared).unwrap();
        for seq in 0..3 {
            queue::store(
                &mut state,
                FlowMessage::Buffer {
                    pad: "input".into(),
                    buffers: vec![Buffer::new(
                        vec![0u8; 4],
                        crate::metadata::Metadata::from_sequence(seq),
                    )],
                },
            )
            .unwrap();
        }
        assert_eq!(state.playback_queue().len(), 3);
        assert_eq!(log.processed_sequences(), Vec::<u64>::new());

        // Retarget back to playing before continuing
        begin_playback_change(&mut state, PlaybackState::Playing).unwrap();
        continue_playback_change(&mut state).unwrap();

        assert!(state.playback_queue().is_empty());
        assert_eq!(log.processed_sequences(), vec![0, 1, 2]);
    }
}
