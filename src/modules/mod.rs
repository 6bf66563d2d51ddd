//! # Module abstractions and the concrete status-bar modules.
//!
//! A [`Module`] is an independently scheduled producer of renderable
//! content. The trait carries the full outward contract — `update`,
//! `build`, `get_format`, `get_output`, `input`, `teardown` — while the
//! *scheduling* of those calls lives in the bar's
//! [`ModuleActor`](crate::bar::ModuleActor), selected by [`Schedule`]:
//!
//! | Variant                | Trigger                          | Modules |
//! |------------------------|----------------------------------|---------|
//! | [`Schedule::Interval`] | fixed-interval timer             | [`NotifierModule`], [`RedditModule`] |
//! | [`Schedule::Watch`]    | `has_event()` readiness polling  | [`VolumeModule`] |
//! | [`Schedule::OnNotify`] | filtered notification stream     | [`BacklightModule`] |
//!
//! ## State discipline
//! Modules keep their render state behind a mutex and have `update()`
//! build a complete replacement snapshot before swapping it in — the
//! render pass never observes a half-written update. `update()` calls for
//! one module are strictly sequential (the actor never overlaps them),
//! and `teardown()` runs only after the scheduling loop has exited.

mod backlight;
mod notifier;
mod reddit;
mod volume;

pub use backlight::BacklightModule;
pub use notifier::NotifierModule;
pub use reddit::RedditModule;
pub use volume::VolumeModule;

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::error::{BuildError, ModuleError, SourceError};
use crate::format::{Builder, Formatter, Segment, DEFAULT_FORMAT};
use crate::sources::NotifyEvent;

/// Shared handle to a module.
pub type ModuleRef = Arc<dyn Module>;

/// Scheduling strategy driven by the module's actor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Schedule {
    /// Sleep for the interval, then `update()`; repeat until cancelled.
    Interval(Duration),
    /// Poll `has_event()` with a short quantum; `update()` on readiness.
    Watch,
    /// Wait for notifications accepted by the module's filter chain.
    OnNotify,
}

/// An independently scheduled, renderable status-bar unit.
///
/// Implementations own their capability handles exclusively and keep
/// render state behind interior mutability so `&self` methods can be
/// called from the actor loop, the render pass and input dispatch.
#[async_trait]
pub trait Module: Send + Sync + 'static {
    /// Returns the unique module name (also its settings section).
    fn name(&self) -> &str;

    /// Returns the scheduling strategy for this module.
    fn schedule(&self) -> Schedule;

    /// Returns the module's registered formats.
    fn formatter(&self) -> &Formatter;

    /// Returns the module's render buffer.
    fn builder(&self) -> &Mutex<Builder>;

    /// Refreshes internal state; returns whether rendered state changed.
    ///
    /// The actor broadcasts a redraw iff this returns `Ok(true)`; modules
    /// that cannot cheaply diff may always report `true` (always-redraw).
    /// Any `Err` is fatal: the module is disabled and never retried.
    async fn update(&self) -> Result<bool, ModuleError>;

    /// Renders one tag into the builder; false when the tag is unknown.
    fn build(&self, builder: &mut Builder, tag: &str) -> bool;

    /// Selects the active format name for the current display mode.
    fn get_format(&self) -> &str {
        DEFAULT_FORMAT
    }

    /// Renders the active format through [`Module::build`] and flushes
    /// the builder. Called by the bar once per render pass.
    ///
    /// Override to wrap the rendered format in command regions.
    fn get_output(&self) -> Result<String, BuildError> {
        let mut builder = lock(self.builder());
        match render_format(self, &mut builder) {
            Ok(()) => Ok(builder.flush()),
            Err(e) => {
                builder.flush();
                Err(e)
            }
        }
    }

    /// Polls the module's event sources for readiness (`Watch` only).
    ///
    /// Implementations bound each source poll by `quantum` so the actor
    /// observes cancellation promptly; per-source failures should be
    /// logged and reported as "no event".
    async fn has_event(&self, _quantum: Duration) -> Result<bool, SourceError> {
        Ok(false)
    }

    /// Returns the notification stream (`OnNotify` only).
    fn notifications(&self) -> Option<broadcast::Receiver<NotifyEvent>> {
        None
    }

    /// Returns whether a notification targets this module (`OnNotify`
    /// only). Every identity in the filter chain must match.
    fn accepts(&self, _event: &NotifyEvent) -> bool {
        false
    }

    /// Handles an interactive command; false when the command does not
    /// carry this module's prefix. Mutation errors are logged, never
    /// propagated.
    fn input(&self, _cmd: &str) -> bool {
        false
    }

    /// Releases capability handles. Runs once, after the scheduling loop
    /// has exited — never concurrently with `update()`.
    fn teardown(&self) {}
}

/// Renders the module's active format into `builder`.
///
/// Splices `build(tag)` results between literal template segments; a tag
/// the module does not recognize is a contract violation reported as
/// [`BuildError::UnrecognizedTag`].
pub fn render_format<M: Module + ?Sized>(
    module: &M,
    builder: &mut Builder,
) -> Result<(), BuildError> {
    let format = module.formatter().get(module.get_format())?;
    for segment in format.segments() {
        match segment {
            Segment::Literal(text) => builder.append(text),
            Segment::Tag(tag) => {
                if !module.build(builder, tag) {
                    return Err(BuildError::UnrecognizedTag { tag: tag.clone() });
                }
            }
        }
    }
    Ok(())
}

/// Locks a state mutex, ignoring poisoning (render state stays usable
/// even if a panicking thread held the lock).
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
}
