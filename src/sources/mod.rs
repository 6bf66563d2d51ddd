//! # External capability contracts consumed by modules.
//!
//! Concrete hardware and network backends live outside this crate; the
//! core consumes them through the traits here and treats every call as
//! fallible. Handles are exclusively owned by the module that received
//! them at construction — nothing here is shared across modules.
//!
//! ## Contents
//! - [`PollableSource`] — readiness polling + event draining
//! - [`Mixer`], [`Control`], [`MixerBackend`] — audio value sources
//! - [`HttpClient`] — network requests (+ [`Downloader`] with the `http`
//!   feature)
//! - [`NotifySource`], [`BacklightSource`], [`NotifyEvent`] —
//!   window-system notification streams

mod http;
mod mixer;
mod notify;
mod pollable;

pub use http::HttpClient;
#[cfg(feature = "http")]
pub use http::Downloader;
pub use mixer::{Control, Mixer, MixerBackend};
pub use notify::{BacklightSource, NotifyEvent, NotifySource};
pub use pollable::PollableSource;
