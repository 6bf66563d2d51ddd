//! Error types used by the barvisor runtime and modules.
//!
//! This module defines the error taxonomy of the crate:
//!
//! - [`ConfigError`] — missing or invalid configuration; fatal at module
//!   construction, the module is never registered.
//! - [`SourceError`] — a hardware/backend handle failed; non-fatal at
//!   runtime (logged, the source degrades to a default value), fatal when
//!   raised while constructing a module.
//! - [`HttpError`] — a network request failed to complete (DNS, connect,
//!   timeout). Distinct from a non-2xx status, which callers inspect via
//!   [`HttpClient::response_code`](crate::sources::HttpClient::response_code).
//! - [`BuildError`] — a render-pass contract violation; the module skips
//!   one render pass but keeps running.
//! - [`ModuleError`] — the fatal kind interpreted by the lifecycle wrapper
//!   as "stop this module"; wraps the above where they escalate.
//! - [`RuntimeError`] — errors raised by the bar coordinator itself.
//!
//! All types provide `as_label` helpers for logs/metrics.

use std::time::Duration;
use thiserror::Error;

/// # Errors produced while reading module configuration.
///
/// Always fatal at construction time: a module with broken configuration
/// must never be registered with the bar.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A required key is absent from the module's section.
    #[error("missing required key `{key}` in section `{section}`")]
    Missing {
        /// Section (module name) the key was looked up in.
        section: String,
        /// The missing key.
        key: String,
    },

    /// A key is present but its value was rejected.
    #[error("invalid `{key}` in section `{section}`: {reason}")]
    Invalid {
        /// Section (module name) the key was looked up in.
        section: String,
        /// The offending key.
        key: String,
        /// Human-readable rejection reason.
        reason: String,
    },
}

impl ConfigError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            ConfigError::Missing { .. } => "config_missing",
            ConfigError::Invalid { .. } => "config_invalid",
        }
    }

    pub(crate) fn missing(section: &str, key: &str) -> Self {
        ConfigError::Missing {
            section: section.to_string(),
            key: key.to_string(),
        }
    }

    pub(crate) fn invalid(section: &str, key: &str, reason: impl Into<String>) -> Self {
        ConfigError::Invalid {
            section: section.to_string(),
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}

/// # Error raised by an external capability handle.
///
/// Mixer, control, backlight and notification handles report failures
/// through this type. A `SourceError` caught inside a module's `update()`
/// degrades that source to a default value; one escaping `update()` (or a
/// constructor) is fatal for the module.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct SourceError(pub String);

impl SourceError {
    /// Creates a new source error from any displayable message.
    pub fn new(message: impl Into<String>) -> Self {
        SourceError(message.into())
    }
}

/// # Transport-level network failure.
///
/// Raised when a request could not complete at all. HTTP status codes are
/// *not* transport errors; callers read them from the client after a
/// completed request.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("transport error: {0}")]
pub struct HttpError(pub String);

impl HttpError {
    /// Creates a new transport error from any displayable message.
    pub fn new(message: impl Into<String>) -> Self {
        HttpError(message.into())
    }
}

/// # Render-pass contract violations.
///
/// Reported by `get_output()`; the module contributes nothing for that
/// pass but is not disabled.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BuildError {
    /// `get_format()` selected a format that was never registered.
    #[error("unknown format `{name}`")]
    UnknownFormat {
        /// The requested format name.
        name: String,
    },

    /// `build()` did not recognize a tag that its format declares.
    #[error("unrecognized tag `{tag}`")]
    UnrecognizedTag {
        /// The tag that was not handled.
        tag: String,
    },
}

impl BuildError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            BuildError::UnknownFormat { .. } => "build_unknown_format",
            BuildError::UnrecognizedTag { .. } => "build_unrecognized_tag",
        }
    }
}

/// # Fatal module errors.
///
/// Any `ModuleError` escaping `update()` or a constructor disables exactly
/// that module: the scheduling loop exits, `ModuleFailed` is published and
/// the module is never retried for the remainder of the process lifetime.
/// Other modules and the bar coordinator are unaffected.
///
/// # Example
/// ```
/// use barvisor::ModuleError;
///
/// let err = ModuleError::protocol("Bad credentials");
/// assert_eq!(err.to_string(), "Bad credentials");
/// assert_eq!(err.as_label(), "module_protocol");
/// ```
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ModuleError {
    /// Configuration was missing or invalid (construction time only).
    #[error("{0}")]
    Config(#[from] ConfigError),

    /// A backend handle failed and the failure escaped the module.
    #[error("{0}")]
    Backend(#[from] SourceError),

    /// A network request failed to complete.
    #[error("{0}")]
    Transport(#[from] HttpError),

    /// A remote endpoint answered with an unexpected status; the message
    /// is human-readable and shown as-is.
    #[error("{message}")]
    Protocol {
        /// Human-readable description (e.g. "Bad credentials").
        message: String,
    },
}

impl ModuleError {
    /// Creates a protocol error with a human-readable message.
    pub fn protocol(message: impl Into<String>) -> Self {
        ModuleError::Protocol {
            message: message.into(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            ModuleError::Config(_) => "module_config",
            ModuleError::Backend(_) => "module_backend",
            ModuleError::Transport(_) => "module_transport",
            ModuleError::Protocol { .. } => "module_protocol",
        }
    }
}

/// # Errors produced by the bar coordinator.
///
/// These represent failures of the orchestration itself, not of any
/// individual module.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Shutdown grace period was exceeded; some modules remained stuck.
    #[error("shutdown grace {grace:?} exceeded; stuck: {stuck:?}")]
    GraceExceeded {
        /// The configured grace duration.
        grace: Duration,
        /// Names of the modules that did not stop in time.
        stuck: Vec<String>,
    },
}

impl RuntimeError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeError::GraceExceeded { .. } => "runtime_grace_exceeded",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn protocol_error_displays_bare_message() {
        let err = ModuleError::protocol("Bad credentials");
        assert_eq!(err.to_string(), "Bad credentials");
    }

    #[test]
    fn config_errors_carry_section_and_key() {
        let err = ConfigError::missing("volume", "headphone-id");
        assert_eq!(
            err.to_string(),
            "missing required key `headphone-id` in section `volume`"
        );
        assert_eq!(err.as_label(), "config_missing");
    }

    #[test]
    fn wrapped_errors_keep_their_message() {
        let err: ModuleError = HttpError::new("connect timed out").into();
        assert_eq!(err.to_string(), "transport error: connect timed out");
        assert_eq!(err.as_label(), "module_transport");
    }
}
