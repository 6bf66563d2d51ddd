//! # Volume module (event-driven).
//!
//! Watches up to three mixer elements (master, speaker, headphone) plus an
//! optional headphone jack control. The effective volume is the product of
//! the active mixers' fractions — the headphone mixer replaces the speaker
//! mixer while headphones are plugged — and the module is muted when any
//! active mixer is muted.
//!
//! ## Error policy
//! Readiness polling and per-mixer queries degrade per source: a failing
//! mixer is logged with its role and contributes its default (full volume,
//! unmuted) for that pass while the other mixers are still honored.
//!
//! ## Commands
//! `vol` prefix: `volmute` toggles mute on the active mixers, `volup` /
//! `voldown` step the volume ±5 within `[0, 100]`.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tracing::{error, warn};

use crate::bar::BarSettings;
use crate::config::Settings;
use crate::error::{BuildError, ConfigError, ModuleError, SourceError};
use crate::format::{Builder, Formatter, Label, MouseButton, ProgressBar, Ramp};
use crate::math;
use crate::modules::{lock, render_format, Module, Schedule};
use crate::sources::{Control, Mixer, MixerBackend};

/// Mixer roles, used for logging source context.
#[derive(Clone, Copy, Debug)]
enum Role {
    Master,
    Speaker,
    Headphone,
}

impl Role {
    fn as_str(self) -> &'static str {
        match self {
            Role::Master => "master",
            Role::Speaker => "speaker",
            Role::Headphone => "headphone",
        }
    }
}

/// Complete render snapshot, replaced wholesale by `update()`.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
struct VolumeState {
    volume: u32,
    muted: bool,
    headphones: bool,
    label_volume: Option<Label>,
    label_muted: Option<Label>,
}

/// Event-driven volume module.
pub struct VolumeModule {
    name: String,
    formatter: Formatter,
    builder: Mutex<Builder>,
    mapped: bool,
    master: Option<Arc<dyn Mixer>>,
    speaker: Option<Arc<dyn Mixer>>,
    headphone: Option<Arc<dyn Mixer>>,
    headphone_ctrl: Option<Arc<dyn Control>>,
    label_volume: Option<Label>,
    label_muted: Option<Label>,
    ramp_volume: Option<Ramp>,
    ramp_headphones: Option<Ramp>,
    bar_volume: Option<ProgressBar>,
    state: Mutex<VolumeState>,
}

impl std::fmt::Debug for VolumeModule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VolumeModule")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl VolumeModule {
    pub const FORMAT_VOLUME: &'static str = "format-volume";
    pub const FORMAT_MUTED: &'static str = "format-muted";

    pub const TAG_RAMP_VOLUME: &'static str = "<ramp-volume>";
    pub const TAG_BAR_VOLUME: &'static str = "<bar-volume>";
    pub const TAG_LABEL_VOLUME: &'static str = "<label-volume>";
    pub const TAG_LABEL_MUTED: &'static str = "<label-muted>";

    pub const CMD_PREFIX: &'static str = "vol";
    pub const CMD_TOGGLE_MUTE: &'static str = "volmute";
    pub const CMD_VOLUME_UP: &'static str = "volup";
    pub const CMD_VOLUME_DOWN: &'static str = "voldown";

    /// Creates the module, opening every configured mixer.
    ///
    /// Fails synchronously on configuration or handle-construction
    /// errors so a non-functional module is never registered.
    pub fn new(
        settings: &Settings,
        _bar: &BarSettings,
        name: &str,
        backend: &dyn MixerBackend,
    ) -> Result<Self, ModuleError> {
        let mapped = settings.get_or(name, "mapped", false)?;

        let master_name = settings.get_or::<String>(name, "master-mixer", "Master".to_string())?;
        let speaker_name = settings.get_or::<String>(name, "speaker-mixer", String::new())?;
        let headphone_name = settings.get_or::<String>(name, "headphone-mixer", String::new())?;

        if speaker_name.eq_ignore_ascii_case("master") {
            return Err(ConfigError::invalid(
                name,
                "speaker-mixer",
                "Master mixer is already defined",
            )
            .into());
        }
        if headphone_name.eq_ignore_ascii_case("master") {
            return Err(ConfigError::invalid(
                name,
                "headphone-mixer",
                "Master mixer is already defined",
            )
            .into());
        }

        let headphone_id = if headphone_name.is_empty() {
            None
        } else {
            Some(settings.get::<u32>(name, "headphone-id")?)
        };

        let master = open_mixer(backend, &master_name)?;
        let speaker = open_mixer(backend, &speaker_name)?;
        let headphone = open_mixer(backend, &headphone_name)?;
        let headphone_ctrl = match headphone_id {
            Some(numid) if headphone.is_some() => Some(backend.open_control(numid)?),
            _ => None,
        };

        if master.is_none() && speaker.is_none() && headphone.is_none() {
            return Err(ConfigError::invalid(name, "master-mixer", "No configured mixers").into());
        }

        let mut formatter = Formatter::new();
        formatter.add(
            settings,
            name,
            Self::FORMAT_VOLUME,
            Self::TAG_LABEL_VOLUME,
            &[Self::TAG_RAMP_VOLUME, Self::TAG_LABEL_VOLUME, Self::TAG_BAR_VOLUME],
        )?;
        formatter.add(
            settings,
            name,
            Self::FORMAT_MUTED,
            Self::TAG_LABEL_MUTED,
            &[Self::TAG_RAMP_VOLUME, Self::TAG_LABEL_MUTED, Self::TAG_BAR_VOLUME],
        )?;

        let bar_volume = if formatter.has(Self::TAG_BAR_VOLUME) {
            Some(ProgressBar::from_settings(settings, name)?)
        } else {
            None
        };
        let label_volume = if formatter.has_in(Self::TAG_LABEL_VOLUME, Self::FORMAT_VOLUME) {
            Some(Label::from_settings(settings, name, "label-volume", "%percentage%")?)
        } else {
            None
        };
        let label_muted = if formatter.has_in(Self::TAG_LABEL_MUTED, Self::FORMAT_MUTED) {
            Some(Label::from_settings(settings, name, "label-muted", "%percentage%")?)
        } else {
            None
        };
        // Ramps have no usable default icons; a declared ramp tag with no
        // configured icons simply renders nothing.
        let (ramp_volume, ramp_headphones) = if formatter.has(Self::TAG_RAMP_VOLUME) {
            (
                Ramp::from_settings_opt(settings, name, "ramp-volume"),
                Ramp::from_settings_opt(settings, name, "ramp-headphones"),
            )
        } else {
            (None, None)
        };

        Ok(Self {
            name: name.to_string(),
            formatter,
            builder: Mutex::new(Builder::new()),
            mapped,
            master,
            speaker,
            headphone,
            headphone_ctrl,
            label_volume,
            label_muted,
            ramp_volume,
            ramp_headphones,
            bar_volume,
            state: Mutex::new(VolumeState::default()),
        })
    }

    /// Volume fraction and mute flag of one mixer, honoring `mapped`.
    fn query(&self, mixer: &dyn Mixer) -> Result<(f64, bool), SourceError> {
        let volume = if self.mapped {
            mixer.get_normalized_volume()?
        } else {
            mixer.get_volume()?
        };
        Ok((volume / 100.0, mixer.is_muted()?))
    }

    /// Folds one mixer into the accumulating volume/mute pair, degrading
    /// to a no-op on failure.
    fn fold(&self, mixer: &dyn Mixer, role: Role, volume: &mut f64, muted: &mut bool) {
        match self.query(mixer) {
            Ok((fraction, mixer_muted)) => {
                *volume *= fraction;
                *muted = *muted || mixer_muted;
            }
            Err(e) => {
                warn!(module = %self.name, source = role.as_str(), error = %e,
                    "failed to query mixer");
            }
        }
    }

    /// Configured mixers with their roles, for polling and draining.
    fn mixer_roles<'a>(&'a self) -> impl Iterator<Item = (&'static str, &'a dyn Mixer)> + 'a {
        [
            ("master", &self.master),
            ("speaker", &self.speaker),
            ("headphone", &self.headphone),
        ]
        .into_iter()
        .filter_map(|(role, mixer)| mixer.as_deref().map(|m| (role, m)))
    }

    /// The mixers a command applies to: master plus whichever of
    /// headphone/speaker is currently routed.
    fn active_mixers(&self, headphones: bool) -> Vec<Arc<dyn Mixer>> {
        let mut mixers = Vec::new();
        if let Some(master) = &self.master {
            mixers.push(master.clone());
        }
        if headphones {
            if let Some(headphone) = &self.headphone {
                mixers.push(headphone.clone());
            }
        } else if let Some(speaker) = &self.speaker {
            mixers.push(speaker.clone());
        }
        mixers
    }

    fn step_volume(&self, mixers: &[Arc<dyn Mixer>], delta: f64) -> Result<(), SourceError> {
        for mixer in mixers {
            if self.mapped {
                let next = math::cap(mixer.get_normalized_volume()? + delta, 0.0, 100.0);
                mixer.set_normalized_volume(next)?;
            } else {
                let next = math::cap(mixer.get_volume()? + delta, 0.0, 100.0);
                mixer.set_volume(next)?;
            }
        }
        Ok(())
    }

    fn toggle_mute(&self, mixers: &[Arc<dyn Mixer>]) -> Result<(), SourceError> {
        let Some(first) = mixers.first() else {
            return Ok(());
        };
        let target = !first.is_muted()?;
        for mixer in mixers {
            mixer.set_mute(target)?;
        }
        Ok(())
    }
}

#[async_trait]
impl Module for VolumeModule {
    fn name(&self) -> &str {
        &self.name
    }

    fn schedule(&self) -> Schedule {
        Schedule::Watch
    }

    fn formatter(&self) -> &Formatter {
        &self.formatter
    }

    fn builder(&self) -> &Mutex<Builder> {
        &self.builder
    }

    async fn has_event(&self, quantum: Duration) -> Result<bool, SourceError> {
        for (role, mixer) in self.mixer_roles() {
            if wait_ready(&self.name, role, mixer, quantum).await {
                return Ok(true);
            }
        }
        if let Some(ctrl) = &self.headphone_ctrl {
            if wait_ready(&self.name, "headphone-control", ctrl.as_ref(), quantum).await {
                return Ok(true);
            }
        }
        Ok(false)
    }

    async fn update(&self) -> Result<bool, ModuleError> {
        // Consume pending events on every handle, not just the one that
        // woke the wait — several sources multiplex on the same poll.
        for (role, mixer) in self.mixer_roles() {
            drain_events(&self.name, role, mixer).await;
        }
        if let Some(ctrl) = &self.headphone_ctrl {
            drain_events(&self.name, "headphone-control", ctrl.as_ref()).await;
        }

        let mut volume = 100.0_f64;
        let mut muted = false;
        let mut headphones = false;

        if let Some(master) = &self.master {
            self.fold(master.as_ref(), Role::Master, &mut volume, &mut muted);
        }

        if let (Some(ctrl), Some(headphone)) = (&self.headphone_ctrl, &self.headphone) {
            match ctrl.is_plugged() {
                Ok(true) => {
                    headphones = true;
                    self.fold(headphone.as_ref(), Role::Headphone, &mut volume, &mut muted);
                }
                Ok(false) => {}
                Err(e) => {
                    warn!(module = %self.name, source = "headphone-control", error = %e,
                        "failed to query jack state");
                }
            }
        }

        if !headphones {
            if let Some(speaker) = &self.speaker {
                self.fold(speaker.as_ref(), Role::Speaker, &mut volume, &mut muted);
            }
        }

        let volume = math::cap(volume.round() as i64, 0, 100) as u32;
        let percentage = format!("{volume}%");

        let render_label = |template: &Option<Label>| {
            template.clone().map(|mut label| {
                label.reset_tokens();
                label.replace_token("%percentage%", &percentage);
                label
            })
        };

        let next = VolumeState {
            volume,
            muted,
            headphones,
            label_volume: render_label(&self.label_volume),
            label_muted: render_label(&self.label_muted),
        };

        let mut state = lock(&self.state);
        let changed = *state != next;
        *state = next;
        Ok(changed)
    }

    fn get_format(&self) -> &str {
        if lock(&self.state).muted {
            Self::FORMAT_MUTED
        } else {
            Self::FORMAT_VOLUME
        }
    }

    fn build(&self, builder: &mut Builder, tag: &str) -> bool {
        let state = lock(&self.state);
        match tag {
            Self::TAG_BAR_VOLUME => {
                if let Some(bar) = &self.bar_volume {
                    builder.append(&bar.output(state.volume));
                }
            }
            Self::TAG_RAMP_VOLUME => {
                let ramp = if state.headphones {
                    self.ramp_headphones.as_ref().or(self.ramp_volume.as_ref())
                } else {
                    self.ramp_volume.as_ref()
                };
                if let Some(ramp) = ramp {
                    builder.append(ramp.get_by_percentage(state.volume));
                }
            }
            Self::TAG_LABEL_VOLUME => {
                if let Some(label) = &state.label_volume {
                    builder.node(label);
                }
            }
            Self::TAG_LABEL_MUTED => {
                if let Some(label) = &state.label_muted {
                    builder.node(label);
                }
            }
            _ => return false,
        }
        true
    }

    fn get_output(&self) -> Result<String, BuildError> {
        let (volume, muted) = {
            let state = lock(&self.state);
            (state.volume, state.muted)
        };

        let mut builder = lock(&self.builder);
        builder.cmd(MouseButton::Left, Self::CMD_TOGGLE_MUTE);
        builder.cmd_if(MouseButton::ScrollUp, Self::CMD_VOLUME_UP, !muted && volume < 100);
        builder.cmd_if(MouseButton::ScrollDown, Self::CMD_VOLUME_DOWN, !muted && volume > 0);
        match render_format(self, &mut builder) {
            Ok(()) => Ok(builder.flush()),
            Err(e) => {
                builder.flush();
                Err(e)
            }
        }
    }

    fn input(&self, cmd: &str) -> bool {
        if !cmd.starts_with(Self::CMD_PREFIX) {
            return false;
        }
        if self.master.is_none() {
            return false;
        }

        let headphones = lock(&self.state).headphones;
        let mixers = self.active_mixers(headphones);

        let result = match cmd {
            Self::CMD_TOGGLE_MUTE => self.toggle_mute(&mixers),
            Self::CMD_VOLUME_UP => self.step_volume(&mixers, 5.0),
            Self::CMD_VOLUME_DOWN => self.step_volume(&mixers, -5.0),
            _ => return false,
        };

        if let Err(e) = result {
            error!(module = %self.name, error = %e, "failed to handle command");
        }
        true
    }
}

fn open_mixer(
    backend: &dyn MixerBackend,
    name: &str,
) -> Result<Option<Arc<dyn Mixer>>, ModuleError> {
    if name.is_empty() {
        return Ok(None);
    }
    Ok(Some(backend.open_mixer(name)?))
}

/// Polls one source for readiness; failures are logged and count as idle.
async fn wait_ready<S>(module: &str, role: &'static str, source: &S, quantum: Duration) -> bool
where
    S: crate::sources::PollableSource + ?Sized,
{
    match source.wait(quantum).await {
        Ok(ready) => ready,
        Err(e) => {
            error!(module, source = role, error = %e, "wait failed");
            false
        }
    }
}

/// Drains one source's pending events; failures are logged and skipped.
async fn drain_events<S>(module: &str, role: &'static str, source: &S)
where
    S: crate::sources::PollableSource + ?Sized,
{
    if let Err(e) = source.process_events().await {
        warn!(module, source = role, error = %e, "failed to process events");
    }
}
