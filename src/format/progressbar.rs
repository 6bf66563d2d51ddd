//! # Percentage-driven progress bar.
//!
//! Renders a fixed-width bar from fill/empty/indicator glyphs configured
//! in the module's section (`bar-width`, `bar-fill`, `bar-empty`,
//! `bar-indicator`). Like the ramp, the output is a pure function of the
//! percentage.

use crate::config::Settings;
use crate::error::ConfigError;
use crate::math;

/// Fixed-width progress bar renderer.
#[derive(Clone, Debug)]
pub struct ProgressBar {
    width: usize,
    fill: String,
    empty: String,
    indicator: String,
}

impl ProgressBar {
    /// Loads bar glyphs from the module's section with plain defaults.
    pub fn from_settings(settings: &Settings, section: &str) -> Result<Self, ConfigError> {
        let width = settings.get_or::<usize>(section, "bar-width", 10)?;
        if width == 0 {
            return Err(ConfigError::invalid(section, "bar-width", "must be > 0"));
        }
        Ok(Self {
            width,
            fill: settings.get_or::<String>(section, "bar-fill", "#".to_string())?,
            empty: settings.get_or::<String>(section, "bar-empty", "-".to_string())?,
            indicator: settings.get_or::<String>(section, "bar-indicator", "|".to_string())?,
        })
    }

    /// Renders the bar at the given percentage (clamped to `[0, 100]`).
    ///
    /// The indicator glyph marks the current position; at 0% the bar is
    /// all empty glyphs.
    pub fn output(&self, percentage: u32) -> String {
        let filled = math::percentage_to_value(percentage, self.width as i64) as usize;
        let mut out = String::with_capacity(self.width * 3);
        for _ in 1..filled {
            out.push_str(&self.fill);
        }
        if filled > 0 {
            out.push_str(&self.indicator);
        }
        for _ in filled..self.width {
            out.push_str(&self.empty);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bar() -> ProgressBar {
        ProgressBar::from_settings(&Settings::new(), "test").unwrap()
    }

    #[test]
    fn empty_and_full_ends() {
        let b = bar();
        assert_eq!(b.output(0), "----------");
        assert_eq!(b.output(100), "#########|");
    }

    #[test]
    fn midpoint_places_indicator() {
        let b = bar();
        assert_eq!(b.output(50), "####|-----");
    }

    #[test]
    fn fill_is_monotonic_in_percentage() {
        let b = bar();
        let mut prev = 0;
        for p in 0..=100 {
            let out = b.output(p);
            let filled = out.matches('#').count() + out.matches('|').count();
            assert!(filled >= prev, "bar regressed at {p}%");
            assert_eq!(out.chars().count(), 10);
            prev = filled;
        }
    }

    #[test]
    fn configured_glyphs_and_width() {
        let settings = Settings::new()
            .with("m", "bar-width", "4")
            .with("m", "bar-fill", "=")
            .with("m", "bar-empty", " ")
            .with("m", "bar-indicator", ">");
        let b = ProgressBar::from_settings(&settings, "m").unwrap();
        assert_eq!(b.output(100), "===>");
        assert_eq!(b.output(0), "    ");
    }

    #[test]
    fn zero_width_is_rejected() {
        let settings = Settings::new().with("m", "bar-width", "0");
        assert!(matches!(
            ProgressBar::from_settings(&settings, "m"),
            Err(ConfigError::Invalid { .. })
        ));
    }
}
