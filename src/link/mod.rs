//! Message transport between linked pads.
//!
//! Every element owns one inbound mailbox. Peers and watchers hold the sending
//! half; the element runner drains the receiving half one message at a time,
//! in arrival order.
//!
//! - [`Mailbox`] / [`Inbox`]: In-process unbounded channel (using kanal)
//! - [`Peer`]: The pad on the other side of a link, plus its element's mailbox
//! - [`Watcher`]: Receiver of element notifications
//! - [`Message`] / [`FlowMessage`]: What travels through mailboxes
//!
//! Mailboxes are unbounded on purpose: flow between elements is bounded by
//! demand, not by channel capacity.

mod local;
mod message;

pub use local::{Inbox, Mailbox, Peer, Watcher, WatcherReceiver, mailbox, watcher};
pub use message::{FlowMessage, Message, Notification};
