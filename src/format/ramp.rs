//! # Percentage-indexed icon ramp.
//!
//! A [`Ramp`] maps a percentage in `[0, 100]` onto an ordered list of
//! icons (`ramp-0`, `ramp-1`, ... in the module's section). The mapping
//! is a pure function of the percentage: deterministic, and monotonic in
//! the configured breakpoints.

use crate::config::Settings;
use crate::error::ConfigError;
use crate::math;

/// Ordered icon list selected by percentage.
#[derive(Clone, Debug)]
pub struct Ramp {
    icons: Vec<String>,
}

impl Ramp {
    /// Creates a ramp from an ordered icon list.
    ///
    /// Fails when the list is empty — an empty ramp has nothing to render.
    pub fn new(icons: Vec<String>) -> Result<Self, ConfigError> {
        if icons.is_empty() {
            return Err(ConfigError::invalid("<ramp>", "icons", "empty icon list"));
        }
        Ok(Self { icons })
    }

    /// Loads `<key>-0`, `<key>-1`, ... from the module's section.
    ///
    /// Fails with [`ConfigError::Missing`] when `<key>-0` is absent.
    pub fn from_settings(
        settings: &Settings,
        section: &str,
        key: &str,
    ) -> Result<Self, ConfigError> {
        match Self::load(settings, section, key) {
            Some(icons) => Ok(Self { icons }),
            None => Err(ConfigError::missing(section, &format!("{key}-0"))),
        }
    }

    /// Like [`from_settings`](Self::from_settings), but absent
    /// configuration yields `None` instead of an error.
    pub fn from_settings_opt(settings: &Settings, section: &str, key: &str) -> Option<Self> {
        Self::load(settings, section, key).map(|icons| Self { icons })
    }

    fn load(settings: &Settings, section: &str, key: &str) -> Option<Vec<String>> {
        let mut icons = Vec::new();
        for index in 0.. {
            match settings.raw(section, &format!("{key}-{index}")) {
                Some(icon) => icons.push(icon.to_string()),
                None => break,
            }
        }
        if icons.is_empty() {
            None
        } else {
            Some(icons)
        }
    }

    /// Returns the icon for the given percentage (clamped to `[0, 100]`).
    pub fn get_by_percentage(&self, percentage: u32) -> &str {
        let index = math::percentage_to_value(percentage, (self.icons.len() - 1) as i64) as usize;
        &self.icons[index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp() -> Ramp {
        Ramp::new(vec!["▁".into(), "▄".into(), "█".into()]).unwrap()
    }

    #[test]
    fn endpoints_map_to_first_and_last_icon() {
        let r = ramp();
        assert_eq!(r.get_by_percentage(0), "▁");
        assert_eq!(r.get_by_percentage(100), "█");
        assert_eq!(r.get_by_percentage(200), "█");
    }

    #[test]
    fn mapping_is_deterministic_and_monotonic() {
        let r = ramp();
        let mut prev_index = 0usize;
        for p in 0..=100 {
            let icon = r.get_by_percentage(p);
            let index = [&"▁", &"▄", &"█"]
                .iter()
                .position(|i| **i == icon)
                .unwrap();
            assert!(index >= prev_index, "ramp regressed at {p}%");
            assert_eq!(icon, r.get_by_percentage(p), "not deterministic at {p}%");
            prev_index = index;
        }
    }

    #[test]
    fn loads_indexed_keys_in_order() {
        let settings = Settings::new()
            .with("volume", "ramp-0", "low")
            .with("volume", "ramp-1", "high");
        let r = Ramp::from_settings(&settings, "volume", "ramp").unwrap();
        assert_eq!(r.get_by_percentage(0), "low");
        assert_eq!(r.get_by_percentage(100), "high");
    }

    #[test]
    fn optional_loader_returns_none_when_absent() {
        let settings = Settings::new();
        assert!(Ramp::from_settings_opt(&settings, "volume", "ramp-headphones").is_none());
        assert!(matches!(
            Ramp::from_settings(&settings, "volume", "ramp"),
            Err(ConfigError::Missing { .. })
        ));
    }
}
