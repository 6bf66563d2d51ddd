//! # Output formatting: labels, draw types, formats and the builder.
//!
//! Everything a module needs to turn its internal state into the markup
//! string handed to the bar renderer:
//!
//! - [`Label`] — display text with `%token%` placeholders
//! - [`Ramp`] / [`ProgressBar`] — percentage-driven draw types
//! - [`Format`] / [`Formatter`] — named tag lists + literal templates,
//!   selectable by a module's current display mode
//! - [`Builder`] — the per-render-pass accumulation buffer, including
//!   click/scroll command-region wrapping
//!
//! ## Render flow
//! ```text
//! get_output()
//!   ├─ get_format() ──► Formatter::get(name) ──► &Format
//!   ├─ for segment in format.segments():
//!   │     Literal(text) ──► Builder::append
//!   │     Tag(tag)      ──► Module::build(builder, tag)
//!   │                         (label text / ramp icon / bar output)
//!   └─ Builder::flush() ──► final markup, buffer reset
//! ```

mod builder;
mod formatter;
mod label;
mod progressbar;
mod ramp;

pub use builder::{Builder, MouseButton};
pub use formatter::{Format, Formatter, Segment, DEFAULT_FORMAT};
pub use label::Label;
pub use progressbar::ProgressBar;
pub use ramp::Ramp;
