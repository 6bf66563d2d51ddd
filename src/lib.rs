//! # barvisor
//!
//! **Barvisor** is the module scheduling and rendering core for status
//! bars: independently scheduled data producers ("modules") that poll or
//! listen for external state changes and render themselves into a
//! composed markup stream consumed by a bar renderer.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!     │ VolumeModule │   │ Backlight    │   │ Notifier     │
//!     │  (Watch)     │   │  (OnNotify)  │   │  (Interval)  │
//!     └──────┬───────┘   └──────┬───────┘   └──────┬───────┘
//!            ▼                  ▼                  ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Bar (coordinator)                                                │
//! │  - Bus (broadcast events)                                         │
//! │  - StateTracker (lifecycle states with sequence numbers)          │
//! │  - ObserverSet (fans out to user observers)                       │
//! │  - render loop (coalesced redraws → Render::draw)                 │
//! └──────┬──────────────────┬──────────────────┬──────────────────────┘
//!        ▼                  ▼                  ▼
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!     │ ModuleActor  │   │ ModuleActor  │   │ ModuleActor  │
//!     │ (sched loop) │   │ (sched loop) │   │ (sched loop) │
//!     └┬─────────────┘   └┬─────────────┘   └┬─────────────┘
//!      │ Publishes        │ Publishes        │ Publishes
//!      │ - ModuleStarting │ - ModuleUpdated  │ - ModuleFailed
//!      │ - ModuleUpdated  │ - ModuleStopped  │ - ...
//!      ▼                  ▼                  ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │                        Bus (broadcast channel)                    │
//! └─────────────────────────────────┬─────────────────────────────────┘
//!                                   ▼
//!                         bar listener ──► StateTracker
//!                                      ──► ObserverSet ──► observers
//!                                      ──► redraw Notify (coalescing)
//!                                              ▼
//!                              compose(): get_output() per module
//!                                              ▼
//!                                        Render::draw()
//! ```
//!
//! ### Lifecycle
//! Every module runs `Idle → Running → Stopping → Stopped`, with `Error`
//! terminal from `Running`: a fatal `update()` error disables exactly
//! that module for the rest of the process — the bar and every other
//! module keep running. Cancellation reaches every suspension point
//! within one wait quantum, so shutdown joins promptly.
//!
//! ## Features
//! | Area            | Description                                          | Key types / traits |
//! |-----------------|------------------------------------------------------|--------------------|
//! | **Modules**     | Scheduling variants + the shared module contract.    | [`Module`], [`Schedule`], [`ModuleActor`] |
//! | **Formatting**  | Tag-based conditional output assembly.               | [`Formatter`], [`Builder`], [`Label`], [`Ramp`], [`ProgressBar`] |
//! | **Coordination**| Broadcasts, lifecycle tracking, graceful shutdown.   | [`Bar`], [`Bus`], [`StateTracker`] |
//! | **Capabilities**| Contracts for external hardware/network backends.    | [`Mixer`], [`PollableSource`], [`HttpClient`], [`BacklightSource`] |
//! | **Errors**      | Typed errors with per-kind fatality policy.          | [`ModuleError`], [`ConfigError`], [`RuntimeError`] |
//! | **Observers**   | Isolated event hooks for logging/metrics.            | [`Observe`], [`ObserverSet`] |
//!
//! ## Optional features
//! - `logging`: exports a simple built-in [`LogWriter`] _(demo/reference only)_.
//! - `http`: exports a reqwest-backed [`Downloader`] for the network modules.
//!
//! ## Example
//! ```no_run
//! use std::sync::Arc;
//! use barvisor::{Bar, BarConfig, StdoutRender};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), barvisor::RuntimeError> {
//!     // Modules are constructed from Settings + capability handles and
//!     // registered here; a bar with no modules exits immediately.
//!     let bar = Bar::builder(BarConfig::default())
//!         .with_renderer(Arc::new(StdoutRender))
//!         .build();
//!     bar.run().await
//! }
//! ```

mod bar;
mod config;
mod error;
mod events;
mod format;
mod math;
mod modules;
mod observers;
mod sources;

// ---- Public re-exports ----

pub use bar::{Bar, BarBuilder, BarConfig, BarSettings, ModuleActor, ModuleState, Render,
    StateTracker, StdoutRender};
pub use config::Settings;
pub use error::{BuildError, ConfigError, HttpError, ModuleError, RuntimeError, SourceError};
pub use events::{Bus, Event, EventKind};
pub use format::{Builder, Format, Formatter, Label, MouseButton, ProgressBar, Ramp, Segment,
    DEFAULT_FORMAT};
pub use modules::{render_format, BacklightModule, Module, ModuleRef, NotifierModule,
    RedditModule, Schedule, VolumeModule};
pub use sources::{BacklightSource, Control, HttpClient, Mixer, MixerBackend, NotifyEvent,
    NotifySource, PollableSource};

// Optional: expose a reqwest-backed HTTP client.
// Enable with: `--features http`
#[cfg(feature = "http")]
pub use sources::Downloader;

// Optional: expose a simple built-in logger observer (demo/reference).
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use observers::LogWriter;

pub use observers::{Observe, ObserverSet};
