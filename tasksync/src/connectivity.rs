//! Online/offline signal.
//!
//! Readable synchronously through [`Connectivity::is_online()`] and observable
//! through a broadcast of [`ConnectivityEvent`]s, one per actual transition.

use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::broadcast;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectivityEvent {
    BecameOnline,
    BecameOffline,
}

#[derive(Debug)]
pub struct Connectivity {
    online: AtomicBool,
    event_tx: broadcast::Sender<ConnectivityEvent>,
}

impl Connectivity {
    pub fn new(online: bool) -> Self {
        let (event_tx, _) = broadcast::channel(16);
        Self {
            online: AtomicBool::new(online),
            event_tx,
        }
    }

    pub fn is_online(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }

    /// Update the flag. Broadcasts an event only if the state changed, and
    /// returns whether it did.
    pub fn set_online(&self, online: bool) -> bool {
        let previous = self.online.swap(online, Ordering::SeqCst);
        if previous == online {
            return false;
        }
        let event = if online {
            ConnectivityEvent::BecameOnline
        } else {
            ConnectivityEvent::BecameOffline
        };
        log::info!("Connectivity changed: {event:?}");
        // No subscribers is fine.
        let _ = self.event_tx.send(event);
        true
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ConnectivityEvent> {
        self.event_tx.subscribe()
    }
}

impl Default for Connectivity {
    fn default() -> Self {
        Self::new(true)
    }
}
