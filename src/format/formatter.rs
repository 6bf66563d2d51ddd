//! # Named formats: ordered tag lists + literal templates.
//!
//! A [`Format`] declares which tags a module must be able to render for
//! one display mode, plus the literal template the tags are spliced into.
//! A [`Formatter`] holds one or more named formats (e.g. `format-volume`
//! vs `format-muted`) and answers [`has`](Formatter::has) queries so
//! module constructors can skip allocating label/ramp/bar resources for
//! tags the user's configuration omits.
//!
//! ## Template resolution
//! `add(settings, section, name, fallback, tags)` reads the template from
//! the `name` key of the module's section, defaulting to `fallback`
//! (usually the module's primary tag, e.g. `"<label>"`). The template is
//! compiled once into [`Segment`]s:
//! - `<tag>` placeholders registered in `tags` become [`Segment::Tag`],
//! - placeholders *not* registered are dropped with a warning (they are
//!   configuration mistakes, not render-time errors),
//! - everything else is passed through as [`Segment::Literal`].

use std::collections::HashMap;

use crate::config::Settings;
use crate::error::{BuildError, ConfigError};

/// Name of the default format key.
pub const DEFAULT_FORMAT: &str = "format";

/// One compiled piece of a format template.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Segment {
    /// Literal text, passed through unchanged.
    Literal(String),
    /// A registered tag placeholder, resolved via `Module::build`.
    Tag(String),
}

/// A named, compiled format: ordered tags + template segments.
#[derive(Clone, Debug)]
pub struct Format {
    tags: Vec<String>,
    segments: Vec<Segment>,
}

impl Format {
    /// Returns the compiled template segments in render order.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Returns true if `tag` is registered in this format's tag list.
    pub fn has(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

/// Registry of named formats for one module.
#[derive(Debug, Default)]
pub struct Formatter {
    formats: HashMap<String, Format>,
}

impl Formatter {
    /// Creates an empty formatter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a named format.
    ///
    /// - `name`: the settings key holding the template (`format`,
    ///   `format-muted`, ...).
    /// - `fallback`: template used when the key is absent.
    /// - `tags`: the ordered tag list this format may render.
    pub fn add(
        &mut self,
        settings: &Settings,
        section: &str,
        name: &str,
        fallback: &str,
        tags: &[&str],
    ) -> Result<(), ConfigError> {
        let template = settings.get_or::<String>(section, name, fallback.to_string())?;
        let tags: Vec<String> = tags.iter().map(|t| t.to_string()).collect();
        let segments = compile(section, name, &template, &tags);
        self.formats.insert(name.to_string(), Format { tags, segments });
        Ok(())
    }

    /// Returns true if `tag` is registered in *any* format.
    ///
    /// Constructors use this to decide whether a tag's resources (label,
    /// ramp, bar) need to be allocated at all.
    pub fn has(&self, tag: &str) -> bool {
        self.formats.values().any(|f| f.has(tag))
    }

    /// Returns true if `tag` is registered in the named format.
    pub fn has_in(&self, tag: &str, format: &str) -> bool {
        self.formats.get(format).is_some_and(|f| f.has(tag))
    }

    /// Returns the compiled format for `name`.
    pub fn get(&self, name: &str) -> Result<&Format, BuildError> {
        self.formats.get(name).ok_or_else(|| BuildError::UnknownFormat {
            name: name.to_string(),
        })
    }
}

/// Splits a template into literal and tag segments.
///
/// A `<...>` span with no nested `<` is a placeholder candidate; anything
/// else (dangling or nested `<`) stays literal text.
fn compile(section: &str, name: &str, template: &str, tags: &[String]) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut literal = String::new();
    let mut rest = template;

    while let Some(open) = rest.find('<') {
        literal.push_str(&rest[..open]);
        let tail = &rest[open..];
        match tail[1..].find(['<', '>']) {
            Some(i) if tail.as_bytes()[1 + i] == b'>' => {
                let candidate = &tail[..1 + i + 1];
                if tags.iter().any(|t| t == candidate) {
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(Segment::Tag(candidate.to_string()));
                } else {
                    tracing::warn!(
                        section,
                        format = name,
                        tag = candidate,
                        "dropping unregistered tag from format template"
                    );
                }
                rest = &tail[1 + i + 1..];
            }
            _ => {
                literal.push('<');
                rest = &tail[1..];
            }
        }
    }
    literal.push_str(rest);
    if !literal.is_empty() {
        segments.push(Segment::Literal(literal));
    }
    segments
}

#[cfg(test)]
mod tests {
    use super::*;

    const TAG_LABEL: &str = "<label>";
    const TAG_RAMP: &str = "<ramp>";
    const TAG_BAR: &str = "<bar>";

    fn formatter(settings: &Settings) -> Formatter {
        let mut f = Formatter::new();
        f.add(settings, "m", DEFAULT_FORMAT, TAG_LABEL, &[TAG_RAMP, TAG_LABEL])
            .unwrap();
        f
    }

    #[test]
    fn has_reflects_registration_regardless_of_order() {
        let settings = Settings::new();
        let mut f = Formatter::new();
        f.add(&settings, "m", "format-volume", TAG_LABEL, &[TAG_RAMP, TAG_LABEL, TAG_BAR])
            .unwrap();
        f.add(&settings, "m", "format-muted", TAG_LABEL, &[TAG_BAR, TAG_LABEL])
            .unwrap();

        assert!(f.has(TAG_LABEL));
        assert!(f.has(TAG_RAMP));
        assert!(f.has(TAG_BAR));
        assert!(!f.has("<unknown>"));

        assert!(f.has_in(TAG_RAMP, "format-volume"));
        assert!(!f.has_in(TAG_RAMP, "format-muted"));
        assert!(!f.has_in(TAG_LABEL, "format-missing"));
    }

    #[test]
    fn default_template_is_the_fallback_tag() {
        let settings = Settings::new();
        let f = formatter(&settings);
        let format = f.get(DEFAULT_FORMAT).unwrap();
        assert_eq!(format.segments(), &[Segment::Tag(TAG_LABEL.to_string())]);
    }

    #[test]
    fn configured_template_interleaves_literals_and_tags() {
        let settings = Settings::new().with("m", "format", "vol <ramp> [<label>]");
        let f = formatter(&settings);
        let format = f.get(DEFAULT_FORMAT).unwrap();
        assert_eq!(
            format.segments(),
            &[
                Segment::Literal("vol ".into()),
                Segment::Tag(TAG_RAMP.into()),
                Segment::Literal(" [".into()),
                Segment::Tag(TAG_LABEL.into()),
                Segment::Literal("]".into()),
            ]
        );
    }

    #[test]
    fn unregistered_placeholders_are_dropped() {
        let settings = Settings::new().with("m", "format", "<bar><label>");
        let f = formatter(&settings); // only ramp+label registered
        let format = f.get(DEFAULT_FORMAT).unwrap();
        assert_eq!(format.segments(), &[Segment::Tag(TAG_LABEL.to_string())]);
    }

    #[test]
    fn dangling_angle_bracket_is_literal() {
        let settings = Settings::new().with("m", "format", "a < b <label>");
        let f = formatter(&settings);
        let format = f.get(DEFAULT_FORMAT).unwrap();
        assert_eq!(
            format.segments(),
            &[
                Segment::Literal("a < b ".into()),
                Segment::Tag(TAG_LABEL.into()),
            ]
        );
    }

    #[test]
    fn unknown_format_is_a_build_error() {
        let settings = Settings::new();
        let f = formatter(&settings);
        assert!(matches!(
            f.get("format-muted"),
            Err(BuildError::UnknownFormat { .. })
        ));
    }
}
