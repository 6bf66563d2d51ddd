//! # Event observer trait.

use async_trait::async_trait;

use crate::events::Event;

/// An event observer with an isolated worker and bounded queue.
///
/// ### Implementation requirements
/// - Use async I/O; never block the executor.
/// - Handle errors internally; a panic is caught and reported but the
///   event that caused it is lost for this observer.
#[async_trait]
pub trait Observe: Send + Sync + 'static {
    /// Processes a single event, in FIFO order per observer.
    async fn on_event(&self, event: &Event);

    /// Name used in logs and overflow/panic events.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Queue capacity for this observer (clamped to a minimum of 1).
    ///
    /// When the queue is full the newest event is dropped for this
    /// observer only.
    fn queue_capacity(&self) -> usize {
        256
    }
}
