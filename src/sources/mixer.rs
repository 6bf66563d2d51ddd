//! # Audio value sources.
//!
//! [`Mixer`] models one mixer element: volume in `[0, 100]` (raw or
//! mapped/normalized), a mute switch, and the event polling inherited
//! from [`PollableSource`]. [`Control`] models a switch-like element that
//! reports jack state (headphones plugged). [`MixerBackend`] opens the
//! handles by name so module constructors can fail synchronously when a
//! configured element does not exist.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::SourceError;
use crate::sources::PollableSource;

/// One mixer element.
///
/// Value accessors are synchronous and cheap; any call may fail with a
/// [`SourceError`], which callers degrade or log per the module's error
/// policy.
#[async_trait]
pub trait Mixer: PollableSource {
    /// The element name this mixer was opened with.
    fn mixer_name(&self) -> &str;

    /// Raw volume as a percentage in `[0, 100]`.
    fn get_volume(&self) -> Result<f64, SourceError>;

    /// Perceptually mapped volume as a percentage in `[0, 100]`.
    fn get_normalized_volume(&self) -> Result<f64, SourceError>;

    /// Sets the raw volume (caller clamps to `[0, 100]`).
    fn set_volume(&self, volume: f64) -> Result<(), SourceError>;

    /// Sets the mapped volume (caller clamps to `[0, 100]`).
    fn set_normalized_volume(&self, volume: f64) -> Result<(), SourceError>;

    /// True when the element is muted.
    fn is_muted(&self) -> Result<bool, SourceError>;

    /// Mutes (`true`) or unmutes (`false`) the element.
    fn set_mute(&self, mute: bool) -> Result<(), SourceError>;
}

/// A switch-like control element reporting jack state.
#[async_trait]
pub trait Control: PollableSource {
    /// True when the monitored device (e.g. headphones) is plugged in.
    fn is_plugged(&self) -> Result<bool, SourceError>;
}

/// Opens mixer and control handles for module constructors.
pub trait MixerBackend: Send + Sync {
    /// Opens the mixer element with the given name.
    fn open_mixer(&self, name: &str) -> Result<Arc<dyn Mixer>, SourceError>;

    /// Opens the control element with the given numeric id.
    fn open_control(&self, numid: u32) -> Result<Arc<dyn Control>, SourceError>;
}
