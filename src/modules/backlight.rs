//! # Backlight module (externally notified).
//!
//! Computes its state once at construction, then reacts to window-system
//! property-change notifications routed through a proxy window. Each
//! notification passes a chain of equality checks — subtype, status,
//! proxy window, output, property — before triggering an update;
//! everything else is silently ignored.
//!
//! ## Commands
//! `backlight-inc` / `backlight-dec` step the brightness ±10 within
//! `[0, 100]`, writing the converted raw value back through the source.
//! Scroll regions are only emitted when `enable-scroll` is set.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tracing::{error, info};

use crate::bar::BarSettings;
use crate::config::Settings;
use crate::error::{BuildError, ConfigError, ModuleError};
use crate::format::{Builder, Formatter, Label, MouseButton, ProgressBar, Ramp, DEFAULT_FORMAT};
use crate::math;
use crate::modules::{lock, render_format, Module, Schedule};
use crate::sources::{BacklightSource, NotifyEvent};
use tokio::sync::broadcast;

/// Complete render snapshot, replaced wholesale by `update()`.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
struct BacklightState {
    percentage: u32,
    label: Option<Label>,
}

/// Notification-driven backlight module.
pub struct BacklightModule {
    name: String,
    formatter: Formatter,
    builder: Mutex<Builder>,
    source: Arc<dyn BacklightSource>,
    scroll: bool,
    min: i64,
    max: i64,
    label: Option<Label>,
    ramp: Option<Ramp>,
    progressbar: Option<ProgressBar>,
    state: Mutex<BacklightState>,
}

impl std::fmt::Debug for BacklightModule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BacklightModule")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl BacklightModule {
    pub const TAG_LABEL: &'static str = "<label>";
    pub const TAG_BAR: &'static str = "<bar>";
    pub const TAG_RAMP: &'static str = "<ramp>";

    pub const CMD_SCROLL_UP: &'static str = "backlight-inc";
    pub const CMD_SCROLL_DOWN: &'static str = "backlight-dec";

    /// Creates the module, matching the configured output against the
    /// available backlight sources and reading the initial value.
    pub fn new(
        settings: &Settings,
        bar: &BarSettings,
        name: &str,
        outputs: &[Arc<dyn BacklightSource>],
    ) -> Result<Self, ModuleError> {
        let fallback = bar.monitor.clone().unwrap_or_default();
        let configured = settings.get_or::<String>(name, "output", fallback)?;
        let strict = settings.get_or(name, "monitor-strict", false)?;

        let source = outputs
            .iter()
            .find(|o| output_matches(o.output_name(), &configured, strict))
            .cloned()
            .ok_or_else(|| {
                ConfigError::invalid(
                    name,
                    "output",
                    format!("No matching output found for \"{configured}\""),
                )
            })?;

        let scroll = settings.get_or(name, "enable-scroll", false)?;

        // Missing backlight data means this output cannot drive the module.
        let ((min, max), value) = match (source.range(), source.value()) {
            (Ok(range), Ok(value)) => (range, value),
            _ => {
                return Err(ConfigError::invalid(
                    name,
                    "output",
                    format!("No backlight data found for \"{configured}\""),
                )
                .into());
            }
        };

        let mut formatter = Formatter::new();
        formatter.add(
            settings,
            name,
            DEFAULT_FORMAT,
            Self::TAG_LABEL,
            &[Self::TAG_LABEL, Self::TAG_BAR, Self::TAG_RAMP],
        )?;

        let label = if formatter.has(Self::TAG_LABEL) {
            Some(Label::from_settings(settings, name, "label", "%percentage%")?)
        } else {
            None
        };
        let progressbar = if formatter.has(Self::TAG_BAR) {
            Some(ProgressBar::from_settings(settings, name)?)
        } else {
            None
        };
        // no default icons; an unconfigured ramp renders nothing
        let ramp = if formatter.has(Self::TAG_RAMP) {
            Ramp::from_settings_opt(settings, name, "ramp")
        } else {
            None
        };

        let module = Self {
            name: name.to_string(),
            formatter,
            builder: Mutex::new(Builder::new()),
            source,
            scroll,
            min,
            max,
            label,
            ramp,
            progressbar,
            state: Mutex::new(BacklightState::default()),
        };
        *lock(&module.state) = module.snapshot(value);
        Ok(module)
    }

    /// Builds a render snapshot from a raw backlight value.
    fn snapshot(&self, value: i64) -> BacklightState {
        let percentage = math::percentage(value, self.min, self.max);
        let label = self.label.clone().map(|mut label| {
            label.reset_tokens();
            label.replace_token("%percentage%", &format!("{percentage}%"));
            label
        });
        BacklightState { percentage, label }
    }
}

#[async_trait]
impl Module for BacklightModule {
    fn name(&self) -> &str {
        &self.name
    }

    fn schedule(&self) -> Schedule {
        Schedule::OnNotify
    }

    fn formatter(&self) -> &Formatter {
        &self.formatter
    }

    fn builder(&self) -> &Mutex<Builder> {
        &self.builder
    }

    async fn update(&self) -> Result<bool, ModuleError> {
        let value = self.source.value()?;
        let next = self.snapshot(value);
        let mut state = lock(&self.state);
        let changed = *state != next;
        *state = next;
        Ok(changed)
    }

    fn notifications(&self) -> Option<broadcast::Receiver<NotifyEvent>> {
        Some(self.source.subscribe())
    }

    fn accepts(&self, event: &NotifyEvent) -> bool {
        event.kind == NotifyEvent::OUTPUT_PROPERTY
            && event.status == NotifyEvent::NEW_VALUE
            && event.window == self.source.proxy()
            && event.output == self.source.output()
            && event.property == self.source.property()
    }

    fn build(&self, builder: &mut Builder, tag: &str) -> bool {
        let state = lock(&self.state);
        match tag {
            Self::TAG_BAR => {
                if let Some(bar) = &self.progressbar {
                    builder.append(&bar.output(state.percentage));
                }
            }
            Self::TAG_RAMP => {
                if let Some(ramp) = &self.ramp {
                    builder.append(ramp.get_by_percentage(state.percentage));
                }
            }
            Self::TAG_LABEL => {
                if let Some(label) = &state.label {
                    builder.node(label);
                }
            }
            _ => return false,
        }
        true
    }

    fn get_output(&self) -> Result<String, BuildError> {
        let percentage = lock(&self.state).percentage;
        let scroll_up = self.scroll && percentage < 100;
        let scroll_down = self.scroll && percentage > 0;

        let mut builder = lock(&self.builder);
        builder.cmd_if(MouseButton::ScrollUp, Self::CMD_SCROLL_UP, scroll_up);
        builder.cmd_if(MouseButton::ScrollDown, Self::CMD_SCROLL_DOWN, scroll_down);
        let result = render_format(self, &mut builder);
        builder.cmd_close_if(scroll_down);
        builder.cmd_close_if(scroll_up);
        match result {
            Ok(()) => Ok(builder.flush()),
            Err(e) => {
                builder.flush();
                Err(e)
            }
        }
    }

    fn input(&self, cmd: &str) -> bool {
        let delta: i64 = match cmd {
            Self::CMD_SCROLL_UP => 10,
            Self::CMD_SCROLL_DOWN => -10,
            _ => return false,
        };
        info!(module = %self.name, delta, "stepping backlight");

        let percentage = lock(&self.state).percentage;
        let next = math::cap(percentage as i64 + delta, 0, 100) as u32;
        let raw = math::percentage_to_value(next, self.max);
        if let Err(e) = self.source.set_value(raw) {
            error!(module = %self.name, error = %e, "failed to set backlight value");
        }
        true
    }
}

/// Matches an output name against the configured one.
///
/// Strict mode requires exact equality; non-strict additionally accepts
/// an empty configured name (first available output wins).
fn output_matches(name: &str, configured: &str, strict: bool) -> bool {
    if strict {
        name == configured
    } else {
        configured.is_empty() || name == configured
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicI64, Ordering};

    use crate::error::SourceError;
    use crate::sources::NotifySource;

    struct FakeOutput {
        name: String,
        value: AtomicI64,
        max: i64,
        tx: broadcast::Sender<NotifyEvent>,
        broken: bool,
    }

    impl FakeOutput {
        fn arc(name: &str, value: i64, max: i64) -> Arc<Self> {
            let (tx, _rx) = broadcast::channel(8);
            Arc::new(Self {
                name: name.to_string(),
                value: AtomicI64::new(value),
                max,
                tx,
                broken: false,
            })
        }

        fn broken(name: &str) -> Arc<Self> {
            let (tx, _rx) = broadcast::channel(8);
            Arc::new(Self {
                name: name.to_string(),
                value: AtomicI64::new(0),
                max: 100,
                tx,
                broken: true,
            })
        }

        fn matching_event(&self) -> NotifyEvent {
            NotifyEvent {
                kind: NotifyEvent::OUTPUT_PROPERTY,
                status: NotifyEvent::NEW_VALUE,
                window: self.proxy(),
                output: self.output(),
                property: self.property(),
            }
        }
    }

    impl NotifySource for FakeOutput {
        fn subscribe(&self) -> broadcast::Receiver<NotifyEvent> {
            self.tx.subscribe()
        }
    }

    impl BacklightSource for FakeOutput {
        fn output_name(&self) -> &str {
            &self.name
        }

        fn proxy(&self) -> u32 {
            7
        }

        fn output(&self) -> u32 {
            42
        }

        fn property(&self) -> u32 {
            99
        }

        fn range(&self) -> Result<(i64, i64), SourceError> {
            if self.broken {
                return Err(SourceError::new("no backlight property"));
            }
            Ok((0, self.max))
        }

        fn value(&self) -> Result<i64, SourceError> {
            if self.broken {
                return Err(SourceError::new("no backlight property"));
            }
            Ok(self.value.load(Ordering::SeqCst))
        }

        fn set_value(&self, raw: i64) -> Result<(), SourceError> {
            self.value.store(raw, Ordering::SeqCst);
            Ok(())
        }
    }

    fn module(settings: Settings, output: Arc<FakeOutput>) -> BacklightModule {
        let outputs: Vec<Arc<dyn BacklightSource>> = vec![output];
        BacklightModule::new(&settings, &BarSettings::default(), "backlight", &outputs).unwrap()
    }

    #[test]
    fn initial_state_is_computed_at_construction() {
        let output = FakeOutput::arc("eDP-1", 128, 255);
        let m = module(Settings::new(), output);
        assert_eq!(m.get_output().unwrap(), "50%");
    }

    #[test]
    fn accepts_requires_every_identity_to_match() {
        let output = FakeOutput::arc("eDP-1", 128, 255);
        let m = module(Settings::new(), output.clone());
        let matching = output.matching_event();
        assert!(m.accepts(&matching));

        assert!(!m.accepts(&NotifyEvent { kind: 9, ..matching }));
        assert!(!m.accepts(&NotifyEvent { status: 1, ..matching }));
        assert!(!m.accepts(&NotifyEvent { window: 8, ..matching }));
        assert!(!m.accepts(&NotifyEvent { output: 43, ..matching }));
        assert!(!m.accepts(&NotifyEvent { property: 100, ..matching }));
    }

    #[tokio::test]
    async fn update_tracks_the_raw_value() {
        let output = FakeOutput::arc("eDP-1", 0, 255);
        let m = module(Settings::new(), output.clone());
        output.value.store(255, Ordering::SeqCst);
        assert!(m.update().await.unwrap());
        assert_eq!(m.get_output().unwrap(), "100%");
        assert!(!m.update().await.unwrap());
    }

    #[test]
    fn scroll_regions_only_when_enabled() {
        let output = FakeOutput::arc("eDP-1", 128, 255);
        let plain = module(Settings::new(), output.clone());
        assert!(!plain.get_output().unwrap().contains("%{A"));

        let scrolling = module(
            Settings::new().with("backlight", "enable-scroll", "true"),
            output,
        );
        let out = scrolling.get_output().unwrap();
        assert!(out.contains("backlight-inc"));
        assert!(out.contains("backlight-dec"));
    }

    #[test]
    fn input_steps_and_clamps() {
        let output = FakeOutput::arc("eDP-1", 250, 255);
        let m = module(Settings::new(), output.clone());
        // 98% + 10 clamps to 100% -> raw 255
        assert!(m.input(BacklightModule::CMD_SCROLL_UP));
        assert_eq!(output.value.load(Ordering::SeqCst), 255);
        assert!(!m.input("volup"));
    }

    #[test]
    fn strict_matching_rejects_other_outputs() {
        let output = FakeOutput::arc("eDP-1", 128, 255);
        let outputs: Vec<Arc<dyn BacklightSource>> = vec![output];
        let settings = Settings::new()
            .with("backlight", "output", "HDMI-1")
            .with("backlight", "monitor-strict", "true");
        let err =
            BacklightModule::new(&settings, &BarSettings::default(), "backlight", &outputs)
                .unwrap_err();
        assert!(err.to_string().contains("No matching output found for \"HDMI-1\""));
    }

    #[test]
    fn missing_backlight_data_is_rejected() {
        let outputs: Vec<Arc<dyn BacklightSource>> = vec![FakeOutput::broken("eDP-1")];
        let err = BacklightModule::new(
            &Settings::new(),
            &BarSettings::default(),
            "backlight",
            &outputs,
        )
        .unwrap_err();
        assert!(err.to_string().contains("No backlight data found"));
    }
}
