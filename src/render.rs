use std::sync::Arc;

use tracing::trace;

use crate::decode::DecodedImage;

/// One composed frame: the incoming slide blended over the outgoing one.
pub struct Frame<'a> {
    pub foreground: Option<&'a Arc<DecodedImage>>,
    pub background: Option<&'a Arc<DecodedImage>>,
    /// Blend factor in [0, 1]; 1.0 means the foreground is fully opaque.
    pub alpha: f32,
    pub edge_blend: f32,
    /// Transient label overlay (PLAY/PAUSE/...), if one is live.
    pub overlay: Option<&'a str>,
}

/// Render collaborator. `present` is assumed non-blocking once textures are
/// uploaded; `loop_running` goes false when the host wants to shut down.
pub trait FramePresenter: Send {
    fn present(&mut self, frame: &Frame<'_>);
    fn loop_running(&self) -> bool;
}

/// Presenter for running without a display backend: traces each frame and
/// never requests shutdown.
#[derive(Debug, Default)]
pub struct HeadlessPresenter;

impl FramePresenter for HeadlessPresenter {
    fn present(&mut self, frame: &Frame<'_>) {
        trace!(
            foreground = frame.foreground.map(|img| img.path.display().to_string()),
            alpha = frame.alpha,
            overlay = frame.overlay,
            "frame"
        );
    }

    fn loop_running(&self) -> bool {
        true
    }
}
