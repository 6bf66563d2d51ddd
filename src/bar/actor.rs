//! # ModuleActor: one module's scheduling loop.
//!
//! Drives a single [`Module`] through its lifecycle with the scheduling
//! strategy the module declares:
//!
//! ```text
//! ModuleActor::run(token)
//!   ├─► publish ModuleStarting                     (state → Running)
//!   ├─► Schedule::Interval(d):
//!   │      loop { update → broadcast if changed → cancellable sleep(d) }
//!   ├─► Schedule::Watch:
//!   │      update + broadcast once, then
//!   │      loop { has_event(quantum) → update → broadcast if changed }
//!   ├─► Schedule::OnNotify:
//!   │      broadcast once (state computed at construction), then
//!   │      loop { notification → accepts? → update → broadcast }
//!   │
//!   ├─ cancelled ──► publish ModuleStopping → teardown → ModuleStopped
//!   └─ Err(fatal) ─► publish ModuleFailed(reason)  → teardown
//! ```
//!
//! ## Rules
//! - `update()` calls are strictly sequential; a slow update delays the
//!   next trigger instead of overlapping it.
//! - Every suspension point observes cancellation within one quantum
//!   (interval sleeps and notification waits are `select!`ed against the
//!   token; readiness polls are bounded by the quantum).
//! - A fatal error disables only this module; the actor never retries.
//! - Broadcast policy: `ModuleUpdated` is published iff `update()`
//!   reported a change.

use std::time::Duration;

use tokio::select;
use tokio::sync::broadcast::error::RecvError;
use tokio::time;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use crate::error::{ModuleError, SourceError};
use crate::events::{Bus, Event, EventKind};
use crate::modules::{ModuleRef, Schedule};

/// Supervises the scheduling loop of a single module.
pub struct ModuleActor {
    /// Module to drive.
    pub module: ModuleRef,
    /// Event bus for lifecycle events and redraw broadcasts.
    pub bus: Bus,
    /// Wait slice for readiness polling.
    pub quantum: Duration,
}

impl ModuleActor {
    /// Creates a new actor.
    pub fn new(bus: Bus, module: ModuleRef, quantum: Duration) -> Self {
        Self {
            module,
            bus,
            quantum,
        }
    }

    /// Runs the module until cancellation or a fatal error.
    ///
    /// Publishes the lifecycle events the [`StateTracker`]
    /// (crate::bar::StateTracker) interprets, and calls `teardown()`
    /// exactly once after the loop has exited — never concurrently with
    /// `update()`.
    pub async fn run(self, token: CancellationToken) {
        let name = self.module.name().to_string();
        self.bus
            .publish(Event::new(EventKind::ModuleStarting).with_module(name.as_str()));

        let result = match self.module.schedule() {
            Schedule::Interval(every) => self.run_interval(every, &token).await,
            Schedule::Watch => self.run_watch(&token).await,
            Schedule::OnNotify => self.run_notify(&token).await,
        };

        match result {
            Ok(()) => {
                self.bus
                    .publish(Event::new(EventKind::ModuleStopping).with_module(name.as_str()));
                self.module.teardown();
                self.bus
                    .publish(Event::new(EventKind::ModuleStopped).with_module(name.as_str()));
            }
            Err(e) => {
                error!(module = %name, error = %e, label = e.as_label(), "module disabled");
                self.bus.publish(
                    Event::new(EventKind::ModuleFailed)
                        .with_module(name.as_str())
                        .with_reason(e.to_string()),
                );
                self.module.teardown();
            }
        }
    }

    /// Timer strategy: immediate first update, then fixed-interval ticks.
    async fn run_interval(
        &self,
        every: Duration,
        token: &CancellationToken,
    ) -> Result<(), ModuleError> {
        loop {
            if token.is_cancelled() {
                return Ok(());
            }
            if self.module.update().await? {
                self.broadcast();
            }
            select! {
                _ = time::sleep(every) => {}
                _ = token.cancelled() => return Ok(()),
            }
        }
    }

    /// Event strategy: readiness polling bounded by the wait quantum.
    ///
    /// Poll failures are non-fatal for that iteration; only an error
    /// escaping `update()` disables the module.
    async fn run_watch(&self, token: &CancellationToken) -> Result<(), ModuleError> {
        // the first render needs the initial state, changed or not
        self.module.update().await?;
        self.broadcast();

        loop {
            if token.is_cancelled() {
                return Ok(());
            }
            match self.module.has_event(self.quantum).await {
                Ok(true) => {
                    if self.module.update().await? {
                        self.broadcast();
                    }
                }
                Ok(false) => {}
                Err(e) => {
                    warn!(module = %self.module.name(), error = %e, "event poll failed");
                    // pace the loop so a hard-failing source cannot spin
                    select! {
                        _ = time::sleep(self.quantum) => {}
                        _ = token.cancelled() => return Ok(()),
                    }
                }
            }
        }
    }

    /// Static strategy: state was computed at construction; react only to
    /// notifications that pass the module's filter chain.
    async fn run_notify(&self, token: &CancellationToken) -> Result<(), ModuleError> {
        let mut notifications = self
            .module
            .notifications()
            .ok_or_else(|| SourceError::new("module declared OnNotify without a stream"))?;

        self.broadcast();

        loop {
            select! {
                _ = token.cancelled() => return Ok(()),
                received = notifications.recv() => match received {
                    Ok(event) => {
                        if self.module.accepts(&event) {
                            self.module.update().await?;
                            self.broadcast();
                        } else {
                            debug!(module = %self.module.name(), "ignoring notification");
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(module = %self.module.name(), skipped, "notification stream lagged");
                    }
                    Err(RecvError::Closed) => return Ok(()),
                },
            }
        }
    }

    /// Signals the coordinator that this module's output changed.
    fn broadcast(&self) {
        self.bus
            .publish(Event::new(EventKind::ModuleUpdated).with_module(self.module.name()));
    }
}
