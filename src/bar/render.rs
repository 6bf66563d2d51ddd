//! # The draw boundary.
//!
//! The bar composes one frame per render pass and hands it to a
//! [`Render`] implementation. Pixel work (fonts, windows, colors) lives
//! entirely behind this trait.

use async_trait::async_trait;

/// Consumes composed frames.
#[async_trait]
pub trait Render: Send + Sync {
    /// Draws one composed frame.
    ///
    /// Called from the render loop; keep it quick or buffer internally —
    /// a slow draw delays subsequent (coalesced) redraws.
    async fn draw(&self, frame: &str);
}

/// Prints frames to stdout. Use it for tests or demos.
#[derive(Default)]
pub struct StdoutRender;

#[async_trait]
impl Render for StdoutRender {
    async fn draw(&self, frame: &str) {
        println!("{frame}");
    }
}
