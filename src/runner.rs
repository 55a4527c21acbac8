//! Hosting an element on a tokio task.
//!
//! Each element gets one task and one mailbox. The task takes messages off
//! the mailbox strictly in arrival order and handles each one to completion
//! before looking at the next, so the element state never needs a lock.
//!
//! # Example
//!
//! ```rust,no_run
//! use flowcore::prelude::*;
//! use flowcore::link::Message;
//!
//! struct Silent;
//! impl Element for Silent {}
//!
//! # async fn run() -> flowcore::Result<()> {
//! let state = ElementState::new("silent", Silent);
//! let handle = ElementRunner::spawn(state);
//! handle.send(Message::ChangePlayback(PlaybackState::Playing))?;
//! let state = handle.shutdown().await?;
//! assert_eq!(state.playback().state(), PlaybackState::Playing);
//! # Ok(())
//! # }
//! ```

use crate::controller::{handle_link, handle_unlink};
use crate::element::{Element, ElementState, PadRef};
use crate::error::{Error, Result};
use crate::flow::{begin_playback_change, change_playback_state, continue_playback_change, queue};
use crate::link::{Inbox, Mailbox, Message, Peer, mailbox};
use crate::observability::{span_element, trace_error};
use tokio::task::JoinHandle;

/// Handle one mailbox message.
///
/// Flow messages go through the playback queue so that they wait while a
/// playback change is held. Returns `false` once the element should stop.
pub fn handle_message<E: Element>(state: &mut ElementState<E>, message: Message) -> Result<bool> {
    match message {
        Message::Flow(flow) => queue::store(state, flow)?,
        Message::ChangePlayback(target) => change_playback_state(state, target)?,
        Message::BeginPlaybackChange(target) => begin_playback_change(state, target)?,
        Message::ContinuePlaybackChange => continue_playback_change(state)?,
        Message::Link { pad, peer } => handle_link(state, &pad, peer)?,
        Message::Unlink { pad } => handle_unlink(state, &pad)?,
        Message::Shutdown => return Ok(false),
    }
    Ok(true)
}

/// Spawns elements onto the tokio runtime.
pub struct ElementRunner;

impl ElementRunner {
    /// Move `state` into a new task and start handling its mailbox.
    ///
    /// Must be called from within a tokio runtime. The task ends on
    /// [`Message::Shutdown`], when every mailbox is dropped, or on the first
    /// error.
    pub fn spawn<E: Element + 'static>(state: ElementState<E>) -> ElementHandle<E> {
        let (tx, rx) = mailbox();
        let name = state.name().to_string();
        let task = tokio::spawn(run(state, rx));
        ElementHandle {
            name,
            mailbox: tx,
            task,
        }
    }
}

async fn run<E: Element>(mut state: ElementState<E>, inbox: Inbox) -> Result<ElementState<E>> {
    let span = span_element(state.name());
    tracing::debug!(parent: &span, "element task started");

    while let Some(message) = inbox.recv_async().await {
        match span.in_scope(|| handle_message(&mut state, message)) {
            Ok(true) => {}
            Ok(false) => break,
            Err(e) => {
                trace_error(state.name(), &e);
                return Err(e);
            }
        }
    }

    tracing::debug!(parent: &span, "element task finished");
    Ok(state)
}

/// Owner's view of a running element.
pub struct ElementHandle<E: Element> {
    name: String,
    mailbox: Mailbox,
    task: JoinHandle<Result<ElementState<E>>>,
}

impl<E: Element> ElementHandle<E> {
    /// Name of the element.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The element's mailbox.
    pub fn mailbox(&self) -> &Mailbox {
        &self.mailbox
    }

    /// Send a message to the element.
    pub fn send(&self, message: Message) -> Result<()> {
        self.mailbox.send(message)
    }

    /// A peer reference to one of the element's pads, for linking.
    pub fn peer(&self, pad: impl Into<PadRef>) -> Peer {
        Peer::new(self.name.clone(), pad, self.mailbox.clone())
    }

    /// Check if the task has ended.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the task to end and take back the element state.
    ///
    /// The handle keeps its mailbox open while waiting, so the task must be
    /// stopped by a [`Message::Shutdown`] sent elsewhere or by an error.
    pub async fn join(self) -> Result<ElementState<E>> {
        let ElementHandle { name, mailbox, task } = self;
        let joined = task.await;
        drop(mailbox);
        joined.map_err(|e| Error::Transport(format!("element {name} task failed: {e}")))?
    }

    /// Stop the element and take back its state.
    pub async fn shutdown(self) -> Result<ElementState<E>> {
        // A task that already ended has dropped its inbox
        let _ = self.mailbox.send(Message::Shutdown);
        self.join().await
    }
}

impl<E: Element> std::fmt::Debug for ElementHandle<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ElementHandle")
            .field("name", &self.name)
            .field("mailbox", &self.mailbox)
            .field("finished", &self.task.is_finished())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::Action;
    use crate::buffer::Buffer;
    use crate::element::{Callback, PadDescriptor, PadMode};
    use crate::error::ProtocolError;
    use crate::flow::PlaybackState;
    use crate::link::FlowMessage;
    use crate::metadata::Metadata;
    use crate::testing::{ScriptedElement, demand_sizes, probe};

    #[test]
    fn test_handle_message_routes_control() {
        let element = ScriptedElement::new();
        let log = element.log();
        let mut state = ElementState::new("el", element)
            .with_pad(PadDescriptor::input("input", PadMode::Pull));
        let (peer, upstream) = probe("src", "output");

        assert!(handle_message(&mut state, Message::Link { pad: "input".into(), peer }).unwrap());
        assert_eq!(demand_sizes(&upstream.drain()), vec![40]);

        assert!(handle_message(&mut state, Message::BeginPlaybackChange(PlaybackState::Prepared)).unwrap());
        assert!(log.is_empty());
        assert!(handle_message(&mut state, Message::ContinuePlaybackChange).unwrap());
        assert_eq!(state.playback().state(), PlaybackState::Prepared);

        assert!(handle_message(&mut state, Message::Unlink { pad: "input".into() }).unwrap());
        assert!(state.pads().is_empty());
        assert!(!handle_message(&mut state, Message::Shutdown).unwrap());
    }

    #[tokio::test]
    async fn test_runner_processes_in_order() {
        let element = ScriptedElement::new();
        let log = element.log();
        let state = ElementState::new("sink", element)
            .with_pad(PadDescriptor::input("input", PadMode::Push));
        let handle = ElementRunner::spawn(state);

        handle.send(Message::ChangePlayback(PlaybackState::Playing)).unwrap();
        for seq in 0..5 {
            handle
                .send(
                    FlowMessage::Buffer {
                        pad: "input".into(),
                        buffers: vec![Buffer::new(vec![0u8; 4], Metadata::from_sequence(seq))],
                    }
                    .into(),
                )
                .unwrap();
        }

        let state = handle.shutdown().await.unwrap();
        assert_eq!(state.playback().state(), PlaybackState::Playing);
        assert_eq!(log.processed_sequences(), vec![0, 1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn test_runner_stops_on_first_error() {
        let element = ScriptedElement::new()
            .on(Callback::PreparedToPlaying, |_| vec![Action::redemand("output"), Action::notify("late")]);
        let state = ElementState::new("src", element)
            .with_pad(PadDescriptor::output("output", PadMode::Pull));
        let handle = ElementRunner::spawn(state);

        handle.send(Message::ChangePlayback(PlaybackState::Playing)).unwrap();
        let err = handle.join().await.unwrap_err();
        assert_eq!(
            err.as_protocol(),
            Some(&ProtocolError::ActionAfterRedemand { action: "notify" })
        );
    }

    #[tokio::test]
    async fn test_peer_reaches_mailbox() {
        let handle = ElementRunner::spawn(ElementState::new("el", ScriptedElement::new()));
        let peer = handle.peer("input");
        assert_eq!(peer.element(), "el");
        assert_eq!(peer.pad(), &PadRef::from("input"));
        peer.send(Message::Shutdown).unwrap();

        let state = handle.join().await.unwrap();
        assert_eq!(state.name(), "el");
    }
}
