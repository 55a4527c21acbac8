//! Element state owned by the flow-control core.

use crate::action::Action;
use crate::config::ElementConfig;
use crate::element::{Callback, CallbackContext, CallbackResult, Element, PadDescriptor, PadRef, PadRegistry};
use crate::error::{Error, Result};
use crate::flow::{DemandKind, Playback, PlaybackQueue};
use crate::link::Watcher;
use crate::observability::ElementMetrics;
use std::collections::{BTreeMap, BTreeSet};

/// Everything the core tracks for one element, plus the element itself.
///
/// Only one logical operation mutates the state at a time: the runner hands
/// it to controllers as `&mut`, message by message.
///
/// # Example
///
/// ```rust
/// use flowcore::prelude::*;
///
/// struct Silent;
/// impl Element for Silent {}
///
/// let state = ElementState::new("silent", Silent)
///     .with_pad(PadDescriptor::output("output", PadMode::Pull));
/// assert_eq!(state.playback().state(), PlaybackState::Stopped);
/// assert_eq!(state.pads().len(), 1);
/// ```
pub struct ElementState<E: Element> {
    pub(crate) name: String,
    pub(crate) playback: Playback,
    pub(crate) pads: PadRegistry,
    pub(crate) supplying_demand: bool,
    pub(crate) delayed_demands: BTreeSet<(PadRef, DemandKind)>,
    pub(crate) pending_demand: BTreeMap<PadRef, i64>,
    pub(crate) playback_queue: PlaybackQueue,
    pub(crate) watcher: Option<Watcher>,
    pub(crate) config: ElementConfig,
    pub(crate) metrics: ElementMetrics,
    pub(crate) element: E,
}

impl<E: Element> ElementState<E> {
    /// Create a stopped element with no pads and the default config.
    pub fn new(name: impl Into<String>, element: E) -> Self {
        let name = name.into();
        Self {
            metrics: ElementMetrics::new(&name),
            name,
            playback: Playback::new(),
            pads: PadRegistry::new(),
            supplying_demand: false,
            delayed_demands: BTreeSet::new(),
            pending_demand: BTreeMap::new(),
            playback_queue: PlaybackQueue::new(),
            watcher: None,
            config: ElementConfig::default(),
            element,
        }
    }

    /// Set the configuration.
    pub fn with_config(mut self, config: ElementConfig) -> Result<Self> {
        config.validate()?;
        self.config = config;
        Ok(self)
    }

    /// Send notifications to `watcher`.
    pub fn with_watcher(mut self, watcher: Watcher) -> Self {
        self.watcher = Some(watcher);
        self
    }

    /// Add a pad.
    pub fn with_pad(mut self, pad: PadDescriptor) -> Self {
        self.pads.add_pad(pad);
        self
    }

    /// Name of the element.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Playback state.
    pub fn playback(&self) -> &Playback {
        &self.playback
    }

    /// The pads.
    pub fn pads(&self) -> &PadRegistry {
        &self.pads
    }

    /// The pads, for adding and removing them.
    pub fn pads_mut(&mut self) -> &mut PadRegistry {
        &mut self.pads
    }

    /// Messages held during a playback change.
    pub fn playback_queue(&self) -> &PlaybackQueue {
        &self.playback_queue
    }

    /// Check if a supply pass is running.
    pub fn is_supplying_demand(&self) -> bool {
        self.supplying_demand
    }

    /// Work deferred until the current supply pass ends.
    pub fn delayed_demands(&self) -> &BTreeSet<(PadRef, DemandKind)> {
        &self.delayed_demands
    }

    /// The configuration.
    pub fn config(&self) -> &ElementConfig {
        &self.config
    }

    /// The hosted element.
    pub fn element(&self) -> &E {
        &self.element
    }

    /// The hosted element, mutably.
    pub fn element_mut(&mut self) -> &mut E {
        &mut self.element
    }

    /// Consume the state and return the element.
    pub fn into_element(self) -> E {
        self.element
    }

    /// Invoke a callback with a fresh context.
    ///
    /// A callback error is wrapped with the callback's identity.
    pub(crate) fn invoke<F>(&mut self, callback: Callback, f: F) -> Result<Vec<Action>>
    where
        F: FnOnce(&mut E, &CallbackContext<'_>) -> CallbackResult,
    {
        let ctx = CallbackContext::new(&self.name, callback, &self.playback, &self.pads);
        tracing::trace!(element = %self.name, %callback, "invoking callback");
        f(&mut self.element, &ctx).map_err(|source| Error::Callback { callback, source })
    }
}

impl<E: Element> std::fmt::Debug for ElementState<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ElementState")
            .field("name", &self.name)
            .field("playback", &self.playback)
            .field("pads", &self.pads.len())
            .field("supplying_demand", &self.supplying_demand)
            .field("delayed_demands", &self.delayed_demands)
            .field("playback_queue", &self.playback_queue.len())
            .field("watcher", &self.watcher.is_some())
            .finish()
    }
}
