//! Read-only view of an element handed to its callbacks.

use crate::element::{Callback, PadDescriptor, PadRef, PadRegistry};
use crate::flow::{Playback, PlaybackState};
use crate::format::MediaFormat;

/// What a callback may know about its element.
///
/// Callbacks cannot mutate the element state directly; they describe changes
/// as actions instead.
#[derive(Clone, Copy)]
pub struct CallbackContext<'a> {
    element: &'a str,
    callback: Callback,
    playback: &'a Playback,
    pads: &'a PadRegistry,
}

impl<'a> CallbackContext<'a> {
    pub(crate) fn new(
        element: &'a str,
        callback: Callback,
        playback: &'a Playback,
        pads: &'a PadRegistry,
    ) -> Self {
        Self {
            element,
            callback,
            playback,
            pads,
        }
    }

    /// Name of the element.
    pub fn name(&self) -> &'a str {
        self.element
    }

    /// The callback being invoked.
    pub fn callback(&self) -> Callback {
        self.callback
    }

    /// Committed playback state.
    pub fn playback_state(&self) -> PlaybackState {
        self.playback.state()
    }

    /// Full playback information, including any change in progress.
    pub fn playback(&self) -> &'a Playback {
        self.playback
    }

    /// Look up a pad.
    pub fn pad(&self, pad: &PadRef) -> Option<&'a PadDescriptor> {
        self.pads.get(pad)
    }

    /// All pads of the element.
    pub fn pads(&self) -> &'a PadRegistry {
        self.pads
    }

    /// Outstanding demand on a pad, 0 for unknown pads.
    pub fn demand(&self, pad: &PadRef) -> i64 {
        self.pads.get(pad).map_or(0, |p| p.demand())
    }

    /// Negotiated format of a pad.
    pub fn format(&self, pad: &PadRef) -> Option<&'a MediaFormat> {
        self.pads.get(pad).and_then(|p| p.format())
    }

    /// Identities of all output pads, sorted.
    pub fn output_pads(&self) -> Vec<PadRef> {
        let mut pads: Vec<PadRef> = self.pads.outputs().map(|p| p.pad().clone()).collect();
        pads.sort();
        pads
    }

    /// Identities of all input pads, sorted.
    pub fn input_pads(&self) -> Vec<PadRef> {
        let mut pads: Vec<PadRef> = self.pads.inputs().map(|p| p.pad().clone()).collect();
        pads.sort();
        pads
    }
}

impl std::fmt::Debug for CallbackContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallbackContext")
            .field("element", &self.element)
            .field("callback", &self.callback)
            .field("playback", &self.playback.state())
            .field("pads", &self.pads.len())
            .finish()
    }
}
