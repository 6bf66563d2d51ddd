//! # Runtime events emitted by module actors and the bar coordinator.
//!
//! [`EventKind`] classifies events across three categories:
//! - **Lifecycle events**: the module state machine (starting, stopping,
//!   stopped, failed) plus the redraw broadcast (`ModuleUpdated`).
//! - **Coordinator events**: shutdown progress and input dispatch.
//! - **Observer events**: fan-out worker diagnostics (overflow, panic).
//!
//! The [`Event`] struct carries optional metadata: the module name and a
//! human-readable reason.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases
//! monotonically; the `StateTracker` uses it to reject stale events when
//! delivery is reordered.
//!
//! ## Example
//! ```rust
//! use barvisor::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::ModuleFailed)
//!     .with_module("volume")
//!     .with_reason("Bad credentials");
//!
//! assert_eq!(ev.kind, EventKind::ModuleFailed);
//! assert_eq!(ev.module.as_deref(), Some("volume"));
//! assert_eq!(ev.reason.as_deref(), Some("Bad credentials"));
//! ```

use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;
use std::time::SystemTime;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Module lifecycle events ===
    /// A module's scheduling loop is starting.
    ///
    /// Sets: `module`.
    ModuleStarting,

    /// A module's rendered state changed — the broadcast that requests a
    /// redraw. Coalesced by the coordinator (latest wins).
    ///
    /// Sets: `module`.
    ModuleUpdated,

    /// A module observed the shutdown signal and is tearing down.
    ///
    /// Sets: `module`.
    ModuleStopping,

    /// A module's loop exited and its handles were released.
    ///
    /// Sets: `module`.
    ModuleStopped,

    /// A module hit a fatal error and is disabled for the rest of the
    /// process lifetime.
    ///
    /// Sets: `module`, `reason` (the error message).
    ModuleFailed,

    // === Coordinator events ===
    /// An interactive command was routed to a module that handled it.
    ///
    /// Sets: `module`, `reason` (the command).
    InputDispatched,

    /// Shutdown requested (OS signal observed).
    ShutdownRequested,

    /// All modules stopped within the configured grace period.
    AllStoppedWithin,

    /// Grace period exceeded; some modules did not stop in time.
    GraceExceeded,

    // === Observer events ===
    /// An observer's queue was full or closed; the event was dropped for
    /// that observer only.
    ///
    /// Sets: `module` (observer name), `reason`.
    ObserverOverflow,

    /// An observer panicked while processing an event.
    ///
    /// Sets: `module` (observer name), `reason` (panic info).
    ObserverPanicked,
}

/// Runtime event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - `module` / `reason`: set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,
    /// Module (or observer) name, if applicable.
    pub module: Option<Arc<str>>,
    /// Human-readable reason (error message, command, panic info).
    pub reason: Option<Arc<str>>,
}

impl Event {
    /// Creates a new event of the given kind with the current timestamp
    /// and the next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            module: None,
            reason: None,
        }
    }

    /// Attaches a module (or observer) name.
    #[inline]
    pub fn with_module(mut self, module: impl Into<Arc<str>>) -> Self {
        self.module = Some(module.into());
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Creates an observer overflow event.
    #[inline]
    pub(crate) fn observer_overflow(observer: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::ObserverOverflow)
            .with_module(observer)
            .with_reason(reason)
    }

    /// Creates an observer panic event.
    #[inline]
    pub(crate) fn observer_panicked(observer: &'static str, info: String) -> Self {
        Event::new(EventKind::ObserverPanicked)
            .with_module(observer)
            .with_reason(info)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_numbers_increase() {
        let a = Event::new(EventKind::ModuleStarting);
        let b = Event::new(EventKind::ModuleUpdated);
        assert!(b.seq > a.seq);
    }

    #[test]
    fn builders_attach_metadata() {
        let ev = Event::new(EventKind::InputDispatched)
            .with_module("backlight")
            .with_reason("backlight-inc");
        assert_eq!(ev.module.as_deref(), Some("backlight"));
        assert_eq!(ev.reason.as_deref(), Some("backlight-inc"));
    }
}
