//! # Event observers for the bar runtime.
//!
//! Observers hook into the runtime event stream for logging, metrics or
//! alerting, without being able to slow down or crash the bar:
//!
//! ```text
//! Bus ──► bar listener ──► ObserverSet::emit(&Event)
//!                              ├──► [queue 1] ──► worker 1 ──► obs1.on_event()
//!                              ├──► [queue 2] ──► worker 2 ──► obs2.on_event()
//!                              └──► [queue N] ──► worker N ──► obsN.on_event()
//! ```
//!
//! - A slow observer only fills its own queue; overflow drops the event
//!   for that observer and publishes
//!   [`EventKind::ObserverOverflow`](crate::events::EventKind::ObserverOverflow).
//! - Panics are caught per worker and published as `ObserverPanicked`.

mod observe;
mod set;

#[cfg(feature = "logging")]
mod log;

pub use observe::Observe;
pub use set::ObserverSet;

#[cfg(feature = "logging")]
pub use log::LogWriter;
