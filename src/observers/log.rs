//! # LogWriter — simple event printer
//!
//! A minimal observer that prints incoming [`Event`]s to stdout.
//! Use it for tests or demos.
//!
//! ## Example output
//! ```text
//! [starting] module="volume"
//! [updated] module="volume"
//! [failed] module="notifier" reason="Bad credentials"
//! [input] module="backlight" cmd="backlight-inc"
//! [shutdown-requested]
//! [all-stopped-within-grace]
//! ```

use async_trait::async_trait;

use crate::events::{Event, EventKind};
use crate::observers::Observe;

/// Event printer observer.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Constructs a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Observe for LogWriter {
    async fn on_event(&self, e: &Event) {
        match e.kind {
            EventKind::ModuleStarting => {
                println!("[starting] module={:?}", e.module);
            }
            EventKind::ModuleUpdated => {
                println!("[updated] module={:?}", e.module);
            }
            EventKind::ModuleStopping => {
                println!("[stopping] module={:?}", e.module);
            }
            EventKind::ModuleStopped => {
                println!("[stopped] module={:?}", e.module);
            }
            EventKind::ModuleFailed => {
                println!("[failed] module={:?} reason={:?}", e.module, e.reason);
            }
            EventKind::InputDispatched => {
                println!("[input] module={:?} cmd={:?}", e.module, e.reason);
            }
            EventKind::ShutdownRequested => {
                println!("[shutdown-requested]");
            }
            EventKind::AllStoppedWithin => {
                println!("[all-stopped-within-grace]");
            }
            EventKind::GraceExceeded => {
                println!("[grace-exceeded]");
            }
            EventKind::ObserverOverflow => {
                println!("[observer-overflow] observer={:?} reason={:?}", e.module, e.reason);
            }
            EventKind::ObserverPanicked => {
                println!(
                    "[observer-panicked] observer={} info={}",
                    e.module.as_deref().unwrap_or("unknown"),
                    e.reason.as_deref().unwrap_or("unknown"),
                );
            }
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}
