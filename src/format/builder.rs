//! # Per-render-pass output buffer with command-region wrapping.
//!
//! [`Builder`] accumulates rendered fragments and wraps them in
//! click/scroll command regions (`%{A<button>:<action>:}` ... `%{A}`).
//! [`Builder::flush`] closes any still-open regions, returns the final
//! markup and clears the buffer — one flush per render pass.
//!
//! ## Rules
//! - Regions open with [`cmd`](Builder::cmd) / [`cmd_if`](Builder::cmd_if)
//!   and close with [`cmd_close`](Builder::cmd_close) /
//!   [`cmd_close_if`](Builder::cmd_close_if); conditional opens pair with
//!   equally-conditional closes.
//! - `flush()` output is always balanced: unmatched closes are ignored,
//!   unmatched opens are closed at the end.
//! - Colons inside actions are escaped so the markup stays parseable.

use crate::format::Label;

/// Mouse buttons addressable by command regions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MouseButton {
    Left,
    Middle,
    Right,
    ScrollUp,
    ScrollDown,
}

impl MouseButton {
    fn code(self) -> u8 {
        match self {
            MouseButton::Left => 1,
            MouseButton::Middle => 2,
            MouseButton::Right => 3,
            MouseButton::ScrollUp => 4,
            MouseButton::ScrollDown => 5,
        }
    }
}

/// Mutable accumulation buffer for one module's render pass.
#[derive(Debug, Default)]
pub struct Builder {
    out: String,
    open_regions: usize,
}

impl Builder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends literal text unchanged.
    pub fn append(&mut self, text: &str) {
        self.out.push_str(text);
    }

    /// Appends a label's rendered text.
    pub fn node(&mut self, label: &Label) {
        self.out.push_str(label.text());
    }

    /// Opens a command region for `button` running `action` on click.
    pub fn cmd(&mut self, button: MouseButton, action: &str) {
        self.cmd_if(button, action, true);
    }

    /// Opens a command region only when `condition` holds.
    ///
    /// Capability predicates gate regions this way, e.g. scroll-up only
    /// while the current value is below 100.
    pub fn cmd_if(&mut self, button: MouseButton, action: &str, condition: bool) {
        if !condition {
            return;
        }
        self.out.push_str("%{A");
        self.out.push((b'0' + button.code()) as char);
        self.out.push(':');
        self.out.push_str(&escape(action));
        self.out.push_str(":}");
        self.open_regions += 1;
    }

    /// Closes the innermost open command region.
    pub fn cmd_close(&mut self) {
        self.cmd_close_if(true);
    }

    /// Closes the innermost open command region when `condition` holds.
    ///
    /// A close without a matching open is ignored.
    pub fn cmd_close_if(&mut self, condition: bool) {
        if condition && self.open_regions > 0 {
            self.out.push_str("%{A}");
            self.open_regions -= 1;
        }
    }

    /// Closes dangling regions, returns the markup and resets the buffer.
    pub fn flush(&mut self) -> String {
        while self.open_regions > 0 {
            self.out.push_str("%{A}");
            self.open_regions -= 1;
        }
        std::mem::take(&mut self.out)
    }
}

/// Escapes `:` so actions cannot terminate the region prematurely.
fn escape(action: &str) -> String {
    action.replace(':', "\\:")
}
