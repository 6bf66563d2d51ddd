//! # Readiness polling for event-driven sources.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::SourceError;

/// A handle that can report pending events and drain them.
///
/// `wait` is async at the trait boundary: backends wrapping blocking OS
/// calls are expected to keep each call bounded by `timeout` (for example
/// via `spawn_blocking`), so a module's event loop stays responsive to
/// cancellation within one wait quantum.
#[async_trait]
pub trait PollableSource: Send + Sync {
    /// Waits up to `timeout` for an event; true when one is pending.
    async fn wait(&self, timeout: Duration) -> Result<bool, SourceError>;

    /// Drains pending events, returning how many were consumed.
    async fn process_events(&self) -> Result<usize, SourceError>;
}
