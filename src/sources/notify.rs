//! # Window-system notification streams.
//!
//! Statically scheduled modules register for asynchronous notifications
//! instead of polling. A backend delivers typed [`NotifyEvent`]s on a
//! broadcast channel; the module filters each one through a chain of
//! field-equality checks before acting, and silently ignores the rest.

use tokio::sync::broadcast;

use crate::error::SourceError;

/// One typed notification from a window-system event stream.
///
/// Field values mirror what the backend's protocol delivers; the module
/// compares them against the identities captured at construction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NotifyEvent {
    /// Event subtype.
    pub kind: u16,
    /// Status code carried by the event.
    pub status: u8,
    /// Window the event was routed through.
    pub window: u32,
    /// Output (monitor) the event concerns.
    pub output: u32,
    /// Property that changed.
    pub property: u32,
}

impl NotifyEvent {
    /// Subtype: an output property changed.
    pub const OUTPUT_PROPERTY: u16 = 2;
    /// Status: the property received a new value.
    pub const NEW_VALUE: u8 = 0;
}

/// A backend that delivers [`NotifyEvent`]s.
pub trait NotifySource: Send + Sync {
    /// Returns an independent receiver for subsequent notifications.
    fn subscribe(&self) -> broadcast::Receiver<NotifyEvent>;
}

/// A matched monitor output exposing backlight data and notifications.
///
/// The backend resolves the proxy window, output and property identities
/// when the handle is created; the module captures them for its
/// notification filter.
pub trait BacklightSource: NotifySource {
    /// Monitor name, matched against the module's `output` setting.
    fn output_name(&self) -> &str;

    /// Identity of the proxy window notifications are routed through.
    fn proxy(&self) -> u32;

    /// Identity of the monitor output.
    fn output(&self) -> u32;

    /// Identity of the backlight property.
    fn property(&self) -> u32;

    /// Raw backlight range `(min, max)`.
    fn range(&self) -> Result<(i64, i64), SourceError>;

    /// Current raw backlight value.
    fn value(&self) -> Result<i64, SourceError>;

    /// Writes a new raw backlight value.
    fn set_value(&self, raw: i64) -> Result<(), SourceError>;
}
