//! In-process mailboxes using kanal channels.

use crate::element::PadRef;
use crate::error::{Error, Result};
use crate::link::{Message, Notification};

/// Create a mailbox pair for one element.
///
/// # Example
///
/// ```rust
/// use flowcore::link::{FlowMessage, mailbox};
///
/// let (tx, rx) = mailbox();
/// tx.send(FlowMessage::Demand { pad: "output".into(), size: 4 }.into()).unwrap();
/// assert_eq!(rx.drain().len(), 1);
/// ```
pub fn mailbox() -> (Mailbox, Inbox) {
    let (tx, rx) = kanal::unbounded();
    (Mailbox { inner: tx }, Inbox { inner: rx })
}

/// Create a watcher pair.
pub fn watcher() -> (Watcher, WatcherReceiver) {
    let (tx, rx) = kanal::unbounded();
    (Watcher { inner: tx }, WatcherReceiver { inner: rx })
}

/// Sending half of an element mailbox.
#[derive(Clone)]
pub struct Mailbox {
    inner: kanal::Sender<Message>,
}

impl Mailbox {
    /// Send a message to the element.
    ///
    /// Never blocks: mailboxes are unbounded.
    pub fn send(&self, message: Message) -> Result<()> {
        self.inner
            .send(message)
            .map_err(|_| Error::Transport("mailbox closed".into()))
    }

    /// Check if the receiving element is gone.
    pub fn is_closed(&self) -> bool {
        self.inner.is_disconnected()
    }

    /// Get the number of pending messages.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Check if the mailbox is empty.
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl std::fmt::Debug for Mailbox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mailbox")
            .field("pending", &self.inner.len())
            .field("closed", &self.inner.is_disconnected())
            .finish()
    }
}

/// Receiving half of an element mailbox.
pub struct Inbox {
    inner: kanal::Receiver<Message>,
}

impl Inbox {
    /// Receive a message, blocking until one is available.
    ///
    /// Returns `None` once every mailbox is dropped and the inbox is empty.
    pub fn recv(&self) -> Option<Message> {
        self.inner.recv().ok()
    }

    /// Try to receive without blocking.
    pub fn try_recv(&self) -> Option<Message> {
        match self.inner.try_recv() {
            Ok(Some(message)) => Some(message),
            _ => None,
        }
    }

    /// Receive asynchronously.
    pub async fn recv_async(&self) -> Option<Message> {
        self.inner.as_async().recv().await.ok()
    }

    /// Take every message currently pending.
    pub fn drain(&self) -> Vec<Message> {
        std::iter::from_fn(|| self.try_recv()).collect()
    }

    /// Get the number of pending messages.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Check if the inbox is empty.
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

/// The pad at the other end of a link.
#[derive(Clone, Debug)]
pub struct Peer {
    element: String,
    pad: PadRef,
    mailbox: Mailbox,
}

impl Peer {
    /// Create a peer reference.
    pub fn new(element: impl Into<String>, pad: impl Into<PadRef>, mailbox: Mailbox) -> Self {
        Self {
            element: element.into(),
            pad: pad.into(),
            mailbox,
        }
    }

    /// Name of the peer element.
    pub fn element(&self) -> &str {
        &self.element
    }

    /// Pad on the peer element.
    pub fn pad(&self) -> &PadRef {
        &self.pad
    }

    /// Mailbox of the peer element.
    pub fn mailbox(&self) -> &Mailbox {
        &self.mailbox
    }

    /// Send a message to the peer element.
    pub fn send(&self, message: Message) -> Result<()> {
        self.mailbox.send(message).map_err(|_| {
            Error::Transport(format!(
                "peer {}:{} is gone",
                self.element, self.pad
            ))
        })
    }
}

/// Sending half of a notification channel.
#[derive(Clone)]
pub struct Watcher {
    inner: kanal::Sender<Notification>,
}

impl Watcher {
    /// Deliver a notification.
    pub fn notify(&self, notification: Notification) -> Result<()> {
        self.inner
            .send(notification)
            .map_err(|_| Error::Transport("watcher closed".into()))
    }
}

impl std::fmt::Debug for Watcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Watcher")
            .field("closed", &self.inner.is_disconnected())
            .finish()
    }
}

/// Receiving half of a notification channel.
pub struct WatcherReceiver {
    inner: kanal::Receiver<Notification>,
}

impl WatcherReceiver {
    /// Try to receive without blocking.
    pub fn try_recv(&self) -> Option<Notification> {
        match self.inner.try_recv() {
            Ok(Some(notification)) => Some(notification),
            _ => None,
        }
    }

    /// Receive asynchronously.
    pub async fn recv_async(&self) -> Option<Notification> {
        self.inner.as_async().recv().await.ok()
    }

    /// Take every notification currently pending.
    pub fn drain(&self) -> Vec<Notification> {
        std::iter::from_fn(|| self.try_recv()).collect()
    }
}
