//! # Bar runtime configuration.
//!
//! [`BarConfig`] centralizes coordinator settings; [`BarSettings`] is the
//! small read-only bundle every module receives a reference to at
//! construction (shared, externally owned data such as the monitor the
//! bar sits on).
//!
//! ## Sentinel values
//! - `grace = 0s` → no wait, stuck modules are reported immediately
//! - `bus_capacity` is clamped to a minimum of 1 by the bus

use std::time::Duration;

/// Global configuration for the bar coordinator.
///
/// ## Field semantics
/// - `grace`: maximum wait for modules to stop after shutdown is
///   requested before reporting them stuck
/// - `quantum`: wait slice handed to event-driven modules so every
///   suspension point observes cancellation promptly
/// - `bus_capacity`: event bus ring buffer size
/// - `separator`: literal spliced between module outputs in a frame
#[derive(Clone, Debug)]
pub struct BarConfig {
    /// Maximum time to wait for graceful shutdown.
    pub grace: Duration,

    /// Wait quantum for event-driven readiness polling.
    ///
    /// Cancellation latency is bounded by this value, so keep it small;
    /// 25ms is imperceptible while costing ~40 wakeups/s per source.
    pub quantum: Duration,

    /// Capacity of the event bus broadcast channel.
    pub bus_capacity: usize,

    /// Separator between module outputs in the composed frame.
    pub separator: String,
}

impl BarConfig {
    /// Returns the bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }
}

impl Default for BarConfig {
    /// Default configuration:
    ///
    /// - `grace = 5s` (bars restart fast; don't hang the session)
    /// - `quantum = 25ms`
    /// - `bus_capacity = 64`
    /// - `separator = " "`
    fn default() -> Self {
        Self {
            grace: Duration::from_secs(5),
            quantum: Duration::from_millis(25),
            bus_capacity: 64,
            separator: " ".to_string(),
        }
    }
}

/// Read-only settings shared with every module.
#[derive(Clone, Debug, Default)]
pub struct BarSettings {
    /// Name of the monitor the bar is placed on, when known; modules use
    /// it as the default for their `output` setting.
    pub monitor: Option<String>,
}
