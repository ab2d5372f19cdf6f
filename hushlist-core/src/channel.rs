//! ## hushlist-core::channel
//! **Fire-and-forget command transport between the control surface and the filter**
//!
//! Delivery contract:
//! - asynchronous, at most once, no acknowledgement back to the sender
//! - frames from one sender arrive in send order; no ordering across senders
//! - a frame sent while no receiver is registered, or while the receiver's
//!   queue is full, is dropped; the sender still sees a successful hand-off
//!
//! Only one receiver is registered at a time, mirroring a platform broadcast
//! receiver that the listener registers on start and unregisters on teardown.

use std::sync::Arc;

use bytes::Bytes;
use parking_lot::Mutex;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, warn};

use crate::command::Command;
use crate::error::ChannelError;

/// What happened to a dispatched frame on the sending side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Queued,
    Dropped,
}

struct BusInner {
    action: String,
    capacity: usize,
    slot: Mutex<Option<mpsc::Sender<Bytes>>>,
}

#[derive(Clone)]
pub struct CommandBus {
    inner: Arc<BusInner>,
}

impl CommandBus {
    /// Creates a bus for frames tagged with `action`. `capacity` bounds the
    /// receiver's queue and is clamped to at least one.
    pub fn new(action: impl Into<String>, capacity: usize) -> Self {
        Self {
            inner: Arc::new(BusInner {
                action: action.into(),
                capacity: capacity.max(1),
                slot: Mutex::new(None),
            }),
        }
    }

    pub fn action(&self) -> &str {
        &self.inner.action
    }

    /// Registers the live receiver, replacing any previous one.
    pub fn register(&self) -> CommandReceiver {
        let (tx, rx) = mpsc::channel(self.inner.capacity);
        if self.inner.slot.lock().replace(tx).is_some() {
            debug!("Replacing previously registered command receiver");
        }
        CommandReceiver { rx }
    }

    /// Drops the registered receiver's sending half. Frames already queued are
    /// still yielded; afterwards the receiver ends.
    pub fn unregister(&self) {
        self.inner.slot.lock().take();
    }

    pub fn is_registered(&self) -> bool {
        self.inner.slot.lock().is_some()
    }

    pub fn sender(&self) -> CommandSender {
        CommandSender {
            bus: self.clone(),
        }
    }
}

#[derive(Clone)]
pub struct CommandSender {
    bus: CommandBus,
}

impl CommandSender {
    /// Encodes `command` and hands it to the transport without waiting.
    pub fn dispatch(&self, command: &Command) -> Result<Delivery, ChannelError> {
        let frame = command.encode(self.bus.action())?;
        Ok(self.send_frame(frame))
    }

    /// Hands a pre-encoded frame to the transport.
    pub fn send_frame(&self, frame: Bytes) -> Delivery {
        let slot = self.bus.inner.slot.lock();
        let Some(tx) = slot.as_ref() else {
            debug!("No command receiver registered, frame dropped");
            return Delivery::Dropped;
        };
        match tx.try_send(frame) {
            Ok(()) => Delivery::Queued,
            Err(TrySendError::Full(_)) => {
                warn!("Command queue full, frame dropped");
                Delivery::Dropped
            }
            Err(TrySendError::Closed(_)) => {
                debug!("Command receiver gone, frame dropped");
                Delivery::Dropped
            }
        }
    }
}

pub struct CommandReceiver {
    rx: mpsc::Receiver<Bytes>,
}

impl CommandReceiver {
    /// Next frame, or `None` once unregistered and drained.
    pub async fn recv(&mut self) -> Option<Bytes> {
        self.rx.recv().await
    }

    pub fn try_recv(&mut self) -> Option<Bytes> {
        self.rx.try_recv().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::{Decoded, DEFAULT_ACTION};

    fn decode(frame: &[u8]) -> Command {
        match Command::decode(DEFAULT_ACTION, frame).unwrap() {
            Decoded::Command(cmd) => cmd,
            Decoded::Foreign => panic!("foreign frame"),
        }
    }

    #[test]
    fn dropped_without_receiver() {
        let bus = CommandBus::new(DEFAULT_ACTION, 8);
        let delivery = bus.sender().dispatch(&Command::block("com.a")).unwrap();
        assert_eq!(delivery, Delivery::Dropped);
    }

    #[tokio::test]
    async fn preserves_send_order() {
        let bus = CommandBus::new(DEFAULT_ACTION, 8);
        let mut rx = bus.register();
        let tx = bus.sender();

        tx.dispatch(&Command::block("com.a")).unwrap();
        tx.dispatch(&Command::unblock("com.a")).unwrap();
        tx.dispatch(&Command::block("com.b")).unwrap();

        assert_eq!(decode(&rx.recv().await.unwrap()), Command::block("com.a"));
        assert_eq!(decode(&rx.recv().await.unwrap()), Command::unblock("com.a"));
        assert_eq!(decode(&rx.recv().await.unwrap()), Command::block("com.b"));
    }

    #[test]
    fn full_queue_drops_frame() {
        let bus = CommandBus::new(DEFAULT_ACTION, 1);
        let mut rx = bus.register();
        let tx = bus.sender();

        assert_eq!(
            tx.dispatch(&Command::block("com.a")).unwrap(),
            Delivery::Queued
        );
        assert_eq!(
            tx.dispatch(&Command::block("com.b")).unwrap(),
            Delivery::Dropped
        );
        assert_eq!(decode(&rx.try_recv().unwrap()), Command::block("com.a"));
        assert!(rx.try_recv().is_none());
    }

    #[tokio::test]
    async fn unregister_drains_then_ends() {
        let bus = CommandBus::new(DEFAULT_ACTION, 4);
        let mut rx = bus.register();
        bus.sender().dispatch(&Command::block("com.a")).unwrap();
        bus.unregister();

        assert!(!bus.is_registered());
        assert!(rx.recv().await.is_some());
        assert!(rx.recv().await.is_none());
        assert_eq!(
            bus.sender().dispatch(&Command::block("com.b")).unwrap(),
            Delivery::Dropped
        );
    }

    #[tokio::test]
    async fn re_register_replaces_receiver() {
        let bus = CommandBus::new(DEFAULT_ACTION, 4);
        let mut old = bus.register();
        let mut new = bus.register();

        bus.sender().dispatch(&Command::block("com.a")).unwrap();

        assert!(old.recv().await.is_none());
        assert_eq!(decode(&new.recv().await.unwrap()), Command::block("com.a"));
    }
}
