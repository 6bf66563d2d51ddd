//! Runtime events: types and broadcast bus.
//!
//! This module groups the event **data model** and the **bus** used to
//! publish/subscribe to runtime events emitted by the module actors and
//! the bar coordinator.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] — event classification and payload metadata
//! - [`Bus`] — thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: `ModuleActor` (lifecycle + broadcast), `Bar`
//!   (shutdown, input dispatch), `ObserverSet` workers (overflow/panic).
//! - **Consumer**: the bar's bus listener, which updates the
//!   `StateTracker`, fans out to observers, and coalesces redraws.

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
