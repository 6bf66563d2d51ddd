//! # Keyed configuration provider.
//!
//! [`Settings`] holds the string-keyed, section-scoped configuration that
//! modules read at construction time. Parsing the configuration *file* is
//! out of scope; whoever assembles the bar fills a `Settings` and passes a
//! reference into each module constructor — there is no ambient global.
//!
//! ## Lookup rules
//! - Values are stored as strings and parsed on access via [`FromStr`].
//! - [`Settings::get`] fails with [`ConfigError::Missing`] when the key is
//!   absent; [`Settings::get_or`] falls back to a default instead.
//! - A present-but-unparsable value is always [`ConfigError::Invalid`],
//!   even when a default exists — a typo should not silently become the
//!   default.

use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;

use crate::error::ConfigError;

/// Section-scoped configuration store with typed accessors.
///
/// Sections are module names; keys are the per-module settings listed in
/// each module's documentation (`interval`, `master-mixer`, ...).
#[derive(Clone, Debug, Default)]
pub struct Settings {
    sections: HashMap<String, HashMap<String, String>>,
}

impl Settings {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a value, replacing any previous one.
    pub fn set(&mut self, section: &str, key: &str, value: impl Into<String>) {
        self.sections
            .entry(section.to_string())
            .or_default()
            .insert(key.to_string(), value.into());
    }

    /// Builder-style [`set`](Self::set), convenient in tests and wiring code.
    #[must_use]
    pub fn with(mut self, section: &str, key: &str, value: impl Into<String>) -> Self {
        self.set(section, key, value);
        self
    }

    /// Returns the raw string value, if present.
    pub fn raw(&self, section: &str, key: &str) -> Option<&str> {
        self.sections
            .get(section)
            .and_then(|s| s.get(key))
            .map(String::as_str)
    }

    /// Returns the parsed value of a required key.
    pub fn get<T: FromStr>(&self, section: &str, key: &str) -> Result<T, ConfigError> {
        match self.raw(section, key) {
            Some(raw) => Self::parse(section, key, raw),
            None => Err(ConfigError::missing(section, key)),
        }
    }

    /// Returns the parsed value, or `default` when the key is absent.
    pub fn get_or<T: FromStr>(&self, section: &str, key: &str, default: T) -> Result<T, ConfigError> {
        match self.raw(section, key) {
            Some(raw) => Self::parse(section, key, raw),
            None => Ok(default),
        }
    }

    /// Returns `Some(parsed)` when present, `None` when absent.
    pub fn get_opt<T: FromStr>(&self, section: &str, key: &str) -> Result<Option<T>, ConfigError> {
        match self.raw(section, key) {
            Some(raw) => Self::parse(section, key, raw).map(Some),
            None => Ok(None),
        }
    }

    /// Reads a duration expressed in whole seconds.
    pub fn get_seconds_or(
        &self,
        section: &str,
        key: &str,
        default: Duration,
    ) -> Result<Duration, ConfigError> {
        let secs = self.get_or::<u64>(section, key, default.as_secs())?;
        Ok(Duration::from_secs(secs))
    }

    fn parse<T: FromStr>(section: &str, key: &str, raw: &str) -> Result<T, ConfigError> {
        raw.parse::<T>().map_err(|_| {
            ConfigError::invalid(
                section,
                key,
                format!("cannot parse `{raw}` as {}", std::any::type_name::<T>()),
            )
        })
    }
}
