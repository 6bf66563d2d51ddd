//! # Event bus for broadcasting runtime events.
//!
//! [`Bus`] is a thin wrapper around [`tokio::sync::broadcast`] providing
//! non-blocking publishing from many module actors to the bar's listener.
//!
//! ## Architecture
//! ```text
//! Publishers (many):                    Consumer (one):
//!   actor "volume"    ──┐
//!   actor "backlight" ──┼────► Bus ───► bar listener ──► StateTracker
//!   actor "notifier"  ──┤  (broadcast)                ──► ObserverSet
//!   Bar (coordinator) ──┘                             ──► redraw Notify
//! ```
//!
//! ## Rules
//! - **Non-blocking publish**: `publish()` never blocks or fails.
//! - **Bounded capacity**: a ring buffer of recent events; slow receivers
//!   observe `RecvError::Lagged(n)` and skip the `n` oldest items. Because
//!   only "something changed, re-render" semantics matter, a lagged
//!   listener simply re-renders — no payload is lost that cannot be
//!   recomputed from module state.
//! - **No persistence**: events published with no live receivers are
//!   dropped.

use tokio::sync::broadcast;

use super::event::Event;

/// Broadcast channel for runtime events.
///
/// Cheap to clone (the sender is `Arc`-backed internally); every module
/// actor holds a clone and publishes concurrently.
#[derive(Clone, Debug)]
pub struct Bus {
    tx: broadcast::Sender<Event>,
}

impl Bus {
    /// Creates a new bus with the given channel capacity (clamped to 1).
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel::<Event>(capacity.max(1));
        Self { tx }
    }

    /// Publishes an event to all active receivers.
    ///
    /// If there are no receivers the event is dropped; this function still
    /// returns immediately.
    pub fn publish(&self, ev: Event) {
        let _ = self.tx.send(ev);
    }

    /// Creates a new independent receiver observing subsequent events.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventKind;

    #[tokio::test]
    async fn subscribers_receive_published_events() {
        let bus = Bus::new(8);
        let mut rx = bus.subscribe();
        bus.publish(Event::new(EventKind::ModuleUpdated).with_module("volume"));
        let ev = rx.recv().await.expect("event");
        assert_eq!(ev.kind, EventKind::ModuleUpdated);
        assert_eq!(ev.module.as_deref(), Some("volume"));
    }

    #[tokio::test]
    async fn publish_without_receivers_does_not_block() {
        let bus = Bus::new(1);
        bus.publish(Event::new(EventKind::ShutdownRequested));
        bus.publish(Event::new(EventKind::ShutdownRequested));
    }
}
