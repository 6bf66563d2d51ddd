//! # Bar: orchestrates module actors, redraws, and graceful shutdown.
//!
//! The [`Bar`] owns the event bus, the [`StateTracker`], an
//! [`ObserverSet`] and the renderer. It spawns one [`ModuleActor`] per
//! registered module, listens to the bus, and coalesces redraw requests
//! into render passes.
//!
//! ## High-level architecture
//! ```text
//! Bar::run()
//!   ├─ bus listener:  Bus ──► StateTracker::apply
//!   │                     ──► ObserverSet::emit          (fire-and-forget)
//!   │                     ──► redraw.notify_one()        (coalescing)
//!   ├─ actors:        one ModuleActor per module (JoinSet, child tokens)
//!   ├─ render loop:   redraw.notified() ──► compose() ──► Render::draw
//!   │                   compose(): get_output() of every renderable
//!   │                   module, joined with the separator
//!   └─ shutdown:      OS signal ──► publish ShutdownRequested
//!                                ──► cancel tokens
//!                                ──► join within grace
//!                                      ├─ Ok  ──► AllStoppedWithin
//!                                      └─ Err ──► GraceExceeded + stuck list
//! ```
//!
//! The redraw `Notify` deliberately coalesces: ten broadcasts while a
//! render pass is in flight produce a single follow-up pass, because the
//! signal carries no payload — modules are re-read at render time.
//!
//! ## Input routing
//! [`Bar::input`] offers the command to every renderable module in
//! registration order until one handles it; handled commands are
//! published as [`EventKind::InputDispatched`] for observability.

use std::sync::Arc;

use tokio::sync::Notify;
use tokio::task::{JoinHandle, JoinSet};
use tokio::time;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::bar::{shutdown, BarConfig, ModuleActor, Render, StateTracker, StdoutRender};
use crate::error::RuntimeError;
use crate::events::{Bus, Event, EventKind};
use crate::modules::ModuleRef;
use crate::observers::{Observe, ObserverSet};

/// Coordinates module actors, redraws and graceful shutdown.
pub struct Bar {
    cfg: BarConfig,
    bus: Bus,
    modules: Vec<ModuleRef>,
    states: Arc<StateTracker>,
    observers: Arc<ObserverSet>,
    renderer: Arc<dyn Render>,
    redraw: Arc<Notify>,
}

impl Bar {
    /// Starts building a bar with the given configuration.
    pub fn builder(cfg: BarConfig) -> BarBuilder {
        BarBuilder {
            cfg,
            modules: Vec::new(),
            observers: Vec::new(),
            renderer: None,
        }
    }

    /// Returns the bus, e.g. for wiring additional publishers in tests.
    pub fn bus(&self) -> &Bus {
        &self.bus
    }

    /// Runs the bar until all modules exit on their own or a termination
    /// signal arrives; then shuts down within the configured grace.
    pub async fn run(&self) -> Result<(), RuntimeError> {
        for module in &self.modules {
            self.states.register(module.name()).await;
        }

        let token = CancellationToken::new();
        let listener = self.spawn_listener();
        let render_loop = self.spawn_render_loop(token.clone());

        let mut set = JoinSet::new();
        for module in &self.modules {
            let actor = ModuleActor::new(self.bus.clone(), module.clone(), self.cfg.quantum);
            set.spawn(actor.run(token.child_token()));
        }

        let result = self.drive_shutdown(&mut set, &token).await;

        render_loop.abort();
        listener.abort();
        result
    }

    /// Routes an interactive command to the first module that takes it.
    ///
    /// Modules that are not renderable (failed, stopped) are skipped so a
    /// disabled module cannot act on stale clicks.
    pub async fn input(&self, cmd: &str) -> bool {
        for module in &self.modules {
            if !self.states.is_renderable(module.name()).await {
                continue;
            }
            if module.input(cmd) {
                self.bus.publish(
                    Event::new(EventKind::InputDispatched)
                        .with_module(module.name())
                        .with_reason(cmd),
                );
                return true;
            }
        }
        false
    }

    /// Forwards bus events to the tracker and observers, and coalesces
    /// redraw-relevant ones into the render notify.
    fn spawn_listener(&self) -> JoinHandle<()> {
        let mut rx = self.bus.subscribe();
        let states = Arc::clone(&self.states);
        let observers = Arc::clone(&self.observers);
        let redraw = Arc::clone(&self.redraw);

        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(ev) => {
                        states.apply(&ev).await;
                        observers.emit(&ev);
                        if redraw_relevant(ev.kind) {
                            redraw.notify_one();
                        }
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(_)) => {
                        // missed events can only mean "something changed"
                        redraw.notify_one();
                    }
                }
            }
        })
    }

    /// One render pass per coalesced redraw notification.
    fn spawn_render_loop(&self, token: CancellationToken) -> JoinHandle<()> {
        let bar = self.render_context();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = bar.redraw.notified() => {
                        let frame = bar.compose().await;
                        bar.renderer.draw(&frame).await;
                    }
                }
            }
        })
    }

    fn render_context(&self) -> RenderContext {
        RenderContext {
            modules: self.modules.clone(),
            states: Arc::clone(&self.states),
            renderer: Arc::clone(&self.renderer),
            redraw: Arc::clone(&self.redraw),
            separator: self.cfg.separator.clone(),
        }
    }

    /// Waits until all actors finish or a shutdown signal arrives.
    async fn drive_shutdown(
        &self,
        set: &mut JoinSet<()>,
        token: &CancellationToken,
    ) -> Result<(), RuntimeError> {
        tokio::select! {
            _ = shutdown::wait_for_shutdown_signal() => {
                self.bus.publish(Event::new(EventKind::ShutdownRequested));
                token.cancel();
                self.wait_all_with_grace(set).await
            }
            _ = async { while set.join_next().await.is_some() {} } => Ok(()),
        }
    }

    /// Joins all actors within the grace period; reports the stuck list
    /// from the tracker when it runs out.
    async fn wait_all_with_grace(&self, set: &mut JoinSet<()>) -> Result<(), RuntimeError> {
        let done = async { while set.join_next().await.is_some() {} };
        match time::timeout(self.cfg.grace, done).await {
            Ok(_) => {
                self.bus.publish(Event::new(EventKind::AllStoppedWithin));
                Ok(())
            }
            Err(_) => {
                self.bus.publish(Event::new(EventKind::GraceExceeded));
                let stuck = self.states.snapshot_active().await;
                Err(RuntimeError::GraceExceeded {
                    grace: self.cfg.grace,
                    stuck,
                })
            }
        }
    }
}

/// The render loop's view of the bar.
struct RenderContext {
    modules: Vec<ModuleRef>,
    states: Arc<StateTracker>,
    renderer: Arc<dyn Render>,
    redraw: Arc<Notify>,
    separator: String,
}

impl RenderContext {
    /// Composes one frame from every renderable module, in registration
    /// order. Build errors skip that module for this pass only.
    async fn compose(&self) -> String {
        let mut parts = Vec::new();
        for module in &self.modules {
            if !self.states.is_renderable(module.name()).await {
                continue;
            }
            match module.get_output() {
                Ok(output) if output.is_empty() => {}
                Ok(output) => parts.push(output),
                Err(e) => {
                    warn!(module = %module.name(), error = %e, label = e.as_label(),
                        "render pass skipped module");
                }
            }
        }
        parts.join(&self.separator)
    }
}

/// Events that invalidate the composed frame.
fn redraw_relevant(kind: EventKind) -> bool {
    matches!(
        kind,
        EventKind::ModuleUpdated
            | EventKind::ModuleStarting
            | EventKind::ModuleStopped
            | EventKind::ModuleFailed
    )
}

/// Builder for assembling a [`Bar`].
pub struct BarBuilder {
    cfg: BarConfig,
    modules: Vec<ModuleRef>,
    observers: Vec<Arc<dyn Observe>>,
    renderer: Option<Arc<dyn Render>>,
}

impl BarBuilder {
    /// Registers one module (render order = registration order).
    pub fn with_module(mut self, module: ModuleRef) -> Self {
        self.modules.push(module);
        self
    }

    /// Registers several modules at once.
    pub fn with_modules(mut self, modules: impl IntoIterator<Item = ModuleRef>) -> Self {
        self.modules.extend(modules);
        self
    }

    /// Adds event observers (logging, metrics, ...).
    pub fn with_observers(mut self, observers: Vec<Arc<dyn Observe>>) -> Self {
        self.observers = observers;
        self
    }

    /// Sets the renderer; defaults to [`StdoutRender`].
    pub fn with_renderer(mut self, renderer: Arc<dyn Render>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    /// Builds the bar and starts the observer workers.
    pub fn build(self) -> Bar {
        let bus = Bus::new(self.cfg.bus_capacity_clamped());
        let observers = Arc::new(ObserverSet::new(self.observers, bus.clone()));
        Bar {
            cfg: self.cfg,
            bus,
            modules: self.modules,
            states: Arc::new(StateTracker::new()),
            observers,
            renderer: self.renderer.unwrap_or_else(|| Arc::new(StdoutRender)),
            redraw: Arc::new(Notify::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use crate::error::{BuildError, ModuleError};
    use crate::format::{Builder, Formatter};
    use crate::modules::{Module, Schedule};

    struct FixedModule {
        name: String,
        output: String,
        formatter: Formatter,
        builder: Mutex<Builder>,
    }

    impl FixedModule {
        fn arc(name: &str, output: &str) -> Arc<Self> {
            Arc::new(Self {
                name: name.to_string(),
                output: output.to_string(),
                formatter: Formatter::new(),
                builder: Mutex::new(Builder::new()),
            })
        }
    }

    #[async_trait]
    impl Module for FixedModule {
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

        async fn update(&self) -> Result<bool, ModuleError> {
            Ok(false)
        }

        fn build(&self, _builder: &mut Builder, _tag: &str) -> bool {
            false
        }

        fn get_output(&self) -> Result<String, BuildError> {
            if self.output == "!" {
                Err(BuildError::UnrecognizedTag { tag: "<x>".into() })
            } else {
                Ok(self.output.clone())
            }
        }

        fn input(&self, cmd: &str) -> bool {
            cmd.starts_with(&self.name)
        }
    }

    fn bar_with(modules: Vec<ModuleRef>) -> Bar {
        Bar::builder(BarConfig::default()).with_modules(modules).build()
    }

    async fn mark_running(bar: &Bar, names: &[&str]) {
        for name in names {
            bar.states.register(name).await;
            bar.states
                .apply(&Event::new(EventKind::ModuleStarting).with_module(*name))
                .await;
        }
    }

    #[tokio::test]
    async fn compose_joins_renderable_modules_in_order() {
        let bar = bar_with(vec![
            FixedModule::arc("a", "A"),
            FixedModule::arc("b", "B"),
            FixedModule::arc("c", ""),
        ]);
        mark_running(&bar, &["a", "b", "c"]).await;
        assert_eq!(bar.render_context().compose().await, "A B");
    }

    #[tokio::test]
    async fn compose_skips_failed_and_erroring_modules() {
        let bar = bar_with(vec![
            FixedModule::arc("a", "A"),
            FixedModule::arc("bad", "!"),
            FixedModule::arc("dead", "D"),
        ]);
        mark_running(&bar, &["a", "bad", "dead"]).await;
        bar.states
            .apply(&Event::new(EventKind::ModuleFailed).with_module("dead"))
            .await;

        // "bad" fails its build this pass, "dead" is disabled
        assert_eq!(bar.render_context().compose().await, "A");
    }

    #[tokio::test]
    async fn input_routes_to_first_matching_renderable_module() {
        let bar = bar_with(vec![
            FixedModule::arc("vol", "V"),
            FixedModule::arc("backlight", "B"),
        ]);
        mark_running(&bar, &["vol", "backlight"]).await;

        let mut rx = bar.bus().subscribe();
        assert!(bar.input("backlight-inc").await);
        let ev = rx.recv().await.unwrap();
        assert_eq!(ev.kind, EventKind::InputDispatched);
        assert_eq!(ev.module.as_deref(), Some("backlight"));

        assert!(!bar.input("unknown").await);
    }

    #[tokio::test]
    async fn input_skips_disabled_modules() {
        let bar = bar_with(vec![FixedModule::arc("vol", "V")]);
        mark_running(&bar, &["vol"]).await;
        bar.states
            .apply(&Event::new(EventKind::ModuleFailed).with_module("vol"))
            .await;
        assert!(!bar.input("volup").await);
    }

    #[test]
    fn redraw_relevance_covers_lifecycle_edges() {
        assert!(redraw_relevant(EventKind::ModuleUpdated));
        assert!(redraw_relevant(EventKind::ModuleFailed));
        assert!(!redraw_relevant(EventKind::InputDispatched));
        assert!(!redraw_relevant(EventKind::ShutdownRequested));
    }
}
