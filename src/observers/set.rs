//! # Non-blocking event fan-out to observers.
//!
//! [`ObserverSet`] gives every observer a bounded queue and a dedicated
//! worker task, so emitting never blocks the bar's listener and one
//! misbehaving observer cannot affect the others.
//!
//! ## Rules
//! - **No cross-observer ordering**: observer A may process event N while
//!   B is still on N-3; each observer individually sees FIFO order.
//! - **Overflow**: the event is dropped for that observer only and an
//!   `ObserverOverflow` is published (never re-published for overflow
//!   events themselves, which would loop).
//! - **Panic isolation**: a panicking `on_event` is caught, reported as
//!   `ObserverPanicked`, and the worker keeps processing.

use std::sync::Arc;

use futures::FutureExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::events::{Bus, Event, EventKind};
use crate::observers::Observe;

struct ObserverChannel {
    name: &'static str,
    sender: mpsc::Sender<Arc<Event>>,
}

/// Fan-out coordinator for event observers.
pub struct ObserverSet {
    channels: Vec<ObserverChannel>,
    workers: Vec<JoinHandle<()>>,
    bus: Bus,
}

impl ObserverSet {
    /// Creates the set and spawns one worker task per observer.
    #[must_use]
    pub fn new(observers: Vec<Arc<dyn Observe>>, bus: Bus) -> Self {
        let mut channels = Vec::with_capacity(observers.len());
        let mut workers = Vec::with_capacity(observers.len());

        for observer in observers {
            let name = observer.name();
            let (tx, mut rx) = mpsc::channel::<Arc<Event>>(observer.queue_capacity().max(1));
            let worker_bus = bus.clone();

            let handle = tokio::spawn(async move {
                while let Some(ev) = rx.recv().await {
                    let work = observer.on_event(ev.as_ref());
                    if let Err(panic) = std::panic::AssertUnwindSafe(work).catch_unwind().await {
                        let info = if let Some(msg) = panic.downcast_ref::<&'static str>() {
                            (*msg).to_string()
                        } else if let Some(msg) = panic.downcast_ref::<String>() {
                            msg.clone()
                        } else {
                            "unknown panic".to_string()
                        };
                        worker_bus.publish(Event::observer_panicked(observer.name(), info));
                    }
                }
            });

            channels.push(ObserverChannel { name, sender: tx });
            workers.push(handle);
        }

        Self {
            channels,
            workers,
            bus,
        }
    }

    /// Emits an event to every observer without blocking.
    ///
    /// Queue-full and queue-closed conditions drop the event for that
    /// observer and report the drop (except for overflow events, which
    /// are never re-reported).
    pub fn emit(&self, event: &Event) {
        let is_overflow = matches!(event.kind, EventKind::ObserverOverflow);
        let shared = Arc::new(event.clone());

        for channel in &self.channels {
            match channel.sender.try_send(Arc::clone(&shared)) {
                Ok(()) => {}
                Err(mpsc::error::TrySendError::Full(_)) => {
                    if !is_overflow {
                        self.bus.publish(Event::observer_overflow(channel.name, "full"));
                    }
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    if !is_overflow {
                        self.bus.publish(Event::observer_overflow(channel.name, "closed"));
                    }
                }
            }
        }
    }

    /// Gracefully drains the workers: close the queues, await the tasks.
    pub async fn shutdown(self) {
        drop(self.channels);
        for worker in self.workers {
            let _ = worker.await;
        }
    }
}
