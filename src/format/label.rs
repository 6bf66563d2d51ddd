//! # Display text with named placeholder tokens.
//!
//! A [`Label`] keeps the configured template (e.g. `"Vol: %percentage%"`)
//! and the currently rendered text. `update()` implementations call
//! [`Label::reset_tokens`] followed by [`Label::replace_token`] so each
//! pass substitutes into a fresh template — reassigning without a reset
//! would concatenate stale values.

use crate::config::Settings;
use crate::error::ConfigError;

/// Text template with `%token%` placeholders.
///
/// A label instance is exclusively owned by one module; modules that need
/// a consistent render snapshot clone the template, substitute, and store
/// the clone in their state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Label {
    template: String,
    text: String,
}

impl Label {
    /// Creates a label from a template string.
    pub fn new(template: impl Into<String>) -> Self {
        let template = template.into();
        Self {
            text: template.clone(),
            template,
        }
    }

    /// Loads a label template from the module's section, falling back to
    /// `default` when the key is absent.
    pub fn from_settings(
        settings: &Settings,
        section: &str,
        key: &str,
        default: &str,
    ) -> Result<Self, ConfigError> {
        let template = settings.get_or::<String>(section, key, default.to_string())?;
        Ok(Self::new(template))
    }

    /// Restores the rendered text to the raw template.
    pub fn reset_tokens(&mut self) {
        self.text.clone_from(&self.template);
    }

    /// Substitutes every occurrence of `token` with `value`.
    pub fn replace_token(&mut self, token: &str, value: &str) {
        if self.text.contains(token) {
            self.text = self.text.replace(token, value);
        }
    }

    /// Returns the currently rendered text.
    pub fn text(&self) -> &str {
        &self.text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replace_substitutes_all_occurrences() {
        let mut label = Label::new("%p% of %p%");
        label.replace_token("%p%", "50");
        assert_eq!(label.text(), "50 of 50");
    }

    #[test]
    fn reset_then_replace_is_idempotent() {
        let mut label = Label::new("Notifications: %notifications%");
        label.reset_tokens();
        label.replace_token("%notifications%", "2");
        let once = label.text().to_string();

        label.reset_tokens();
        label.replace_token("%notifications%", "2");
        label.reset_tokens();
        label.replace_token("%notifications%", "2");

        assert_eq!(label.text(), once);
        assert_eq!(label.text(), "Notifications: 2");
    }

    #[test]
    fn replace_without_reset_loses_the_placeholder() {
        let mut label = Label::new("%percentage%");
        label.replace_token("%percentage%", "40%");
        // the placeholder is gone until the next reset
        label.replace_token("%percentage%", "60%");
        assert_eq!(label.text(), "40%");
        label.reset_tokens();
        label.replace_token("%percentage%", "60%");
        assert_eq!(label.text(), "60%");
    }

    #[test]
    fn from_settings_prefers_configured_template() {
        let settings = Settings::new().with("volume", "label-volume", "VOL %percentage%");
        let label =
            Label::from_settings(&settings, "volume", "label-volume", "%percentage%").unwrap();
        assert_eq!(label.text(), "VOL %percentage%");

        let fallback =
            Label::from_settings(&settings, "volume", "label-muted", "%percentage%").unwrap();
        assert_eq!(fallback.text(), "%percentage%");
    }
}
