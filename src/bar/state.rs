//! # Module lifecycle tracker with sequence-based ordering.
//!
//! Maintains the authoritative lifecycle state of every registered
//! module, derived from bus events and ordered by their sequence numbers
//! so reordered delivery cannot corrupt the state machine.
//!
//! ## State machine
//! ```text
//! Idle ──ModuleStarting──► Running ──ModuleStopping──► Stopping
//!                             │                            │
//!                        ModuleFailed                 ModuleStopped
//!                             ▼                            ▼
//!                           Error (terminal)            Stopped
//! ```
//!
//! ## Rules
//! - Events with `seq <= last_seq` for a module are rejected as stale.
//! - `Error` is terminal: a failed module never re-enters `Running`.
//! - Reads are eventually consistent with the actor loops.

use std::collections::HashMap;

use tokio::sync::RwLock;

use crate::events::{Event, EventKind};

/// Lifecycle states of one module.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModuleState {
    /// Constructed and registered; no scheduling loop yet.
    Idle,
    /// Scheduling loop active.
    Running,
    /// Shutdown observed; loop unwinding towards teardown.
    Stopping,
    /// Loop joined, handles released.
    Stopped,
    /// Fatal error; disabled for the remainder of the process lifetime.
    Error,
}

impl ModuleState {
    /// True while the module should contribute output to render passes.
    pub fn renderable(self) -> bool {
        matches!(self, ModuleState::Running | ModuleState::Stopping)
    }
}

/// Per-module entry with ordering validation.
#[derive(Debug, Clone)]
struct Entry {
    last_seq: u64,
    state: ModuleState,
}

/// Thread-safe tracker of module lifecycle states.
pub struct StateTracker {
    state: RwLock<HashMap<String, Entry>>,
}

impl StateTracker {
    /// Creates an empty tracker.
    pub fn new() -> Self {
        Self {
            state: RwLock::new(HashMap::new()),
        }
    }

    /// Registers a module in the `Idle` state.
    pub async fn register(&self, name: &str) {
        let mut state = self.state.write().await;
        state.entry(name.to_string()).or_insert(Entry {
            last_seq: 0,
            state: ModuleState::Idle,
        });
    }

    /// Applies a lifecycle event if it is newer than the last seen one.
    ///
    /// Returns true when the module's state changed. `Error` is sticky:
    /// later lifecycle events cannot resurrect a failed module.
    pub async fn apply(&self, ev: &Event) -> bool {
        let name = match ev.module.as_deref() {
            Some(n) => n,
            None => return false,
        };

        let next = match ev.kind {
            EventKind::ModuleStarting => ModuleState::Running,
            EventKind::ModuleStopping => ModuleState::Stopping,
            EventKind::ModuleStopped => ModuleState::Stopped,
            EventKind::ModuleFailed => ModuleState::Error,
            _ => {
                // other events only advance the sequence cursor
                let mut state = self.state.write().await;
                if let Some(entry) = state.get_mut(name) {
                    if ev.seq > entry.last_seq {
                        entry.last_seq = ev.seq;
                    }
                }
                return false;
            }
        };

        let mut state = self.state.write().await;
        let entry = state.entry(name.to_string()).or_insert(Entry {
            last_seq: 0,
            state: ModuleState::Idle,
        });

        if ev.seq <= entry.last_seq && entry.last_seq != 0 {
            return false;
        }
        entry.last_seq = ev.seq;
        if entry.state == ModuleState::Error {
            return false;
        }
        let changed = entry.state != next;
        entry.state = next;
        changed
    }

    /// Returns the current state of a module, if registered.
    pub async fn get(&self, name: &str) -> Option<ModuleState> {
        self.state.read().await.get(name).map(|e| e.state)
    }

    /// True while the module should contribute output to render passes.
    pub async fn is_renderable(&self, name: &str) -> bool {
        self.state
            .read()
            .await
            .get(name)
            .map(|e| e.state.renderable())
            .unwrap_or(false)
    }

    /// Returns the sorted names of modules that have not reached a
    /// terminal state — the "stuck" list when grace runs out.
    pub async fn snapshot_active(&self) -> Vec<String> {
        let state = self.state.read().await;
        let mut active: Vec<String> = state
            .iter()
            .filter(|(_, e)| !matches!(e.state, ModuleState::Stopped | ModuleState::Error))
            .map(|(name, _)| name.clone())
            .collect();
        active.sort_unstable();
        active
    }
}

impl Default for StateTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ev(kind: EventKind, module: &str) -> Event {
        Event::new(kind).with_module(module)
    }

    #[tokio::test]
    async fn full_lifecycle_transitions() {
        let tracker = StateTracker::new();
        tracker.register("volume").await;
        assert_eq!(tracker.get("volume").await, Some(ModuleState::Idle));
        assert!(!tracker.is_renderable("volume").await);

        tracker.apply(&ev(EventKind::ModuleStarting, "volume")).await;
        assert_eq!(tracker.get("volume").await, Some(ModuleState::Running));
        assert!(tracker.is_renderable("volume").await);

        tracker.apply(&ev(EventKind::ModuleStopping, "volume")).await;
        assert_eq!(tracker.get("volume").await, Some(ModuleState::Stopping));
        assert!(tracker.is_renderable("volume").await);

        tracker.apply(&ev(EventKind::ModuleStopped, "volume")).await;
        assert_eq!(tracker.get("volume").await, Some(ModuleState::Stopped));
        assert!(!tracker.is_renderable("volume").await);
    }

    #[tokio::test]
    async fn stale_events_are_rejected() {
        let tracker = StateTracker::new();
        tracker.register("volume").await;

        let starting = ev(EventKind::ModuleStarting, "volume");
        let stopped = ev(EventKind::ModuleStopped, "volume");
        // deliver out of order: stopped (newer) first
        assert!(tracker.apply(&stopped).await);
        assert!(!tracker.apply(&starting).await);
        assert_eq!(tracker.get("volume").await, Some(ModuleState::Stopped));
    }

    #[tokio::test]
    async fn error_state_is_terminal() {
        let tracker = StateTracker::new();
        tracker.register("notifier").await;
        tracker.apply(&ev(EventKind::ModuleStarting, "notifier")).await;
        tracker
            .apply(&ev(EventKind::ModuleFailed, "notifier").with_reason("Bad credentials"))
            .await;
        assert_eq!(tracker.get("notifier").await, Some(ModuleState::Error));

        // a later (buggy) start must not resurrect the module
        assert!(!tracker.apply(&ev(EventKind::ModuleStarting, "notifier")).await);
        assert_eq!(tracker.get("notifier").await, Some(ModuleState::Error));
    }

    #[tokio::test]
    async fn snapshot_lists_non_terminal_modules() {
        let tracker = StateTracker::new();
        for name in ["a", "b", "c"] {
            tracker.register(name).await;
            tracker.apply(&ev(EventKind::ModuleStarting, name)).await;
        }
        tracker.apply(&ev(EventKind::ModuleStopped, "b")).await;
        tracker.apply(&ev(EventKind::ModuleFailed, "c")).await;
        assert_eq!(tracker.snapshot_active().await, vec!["a".to_string()]);
    }

    #[tokio::test]
    async fn updates_advance_the_cursor_without_state_change() {
        let tracker = StateTracker::new();
        tracker.register("volume").await;
        tracker.apply(&ev(EventKind::ModuleStarting, "volume")).await;
        assert!(!tracker.apply(&ev(EventKind::ModuleUpdated, "volume")).await);
        assert_eq!(tracker.get("volume").await, Some(ModuleState::Running));
    }
}
