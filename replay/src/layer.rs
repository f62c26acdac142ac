use crate::{FrameStats, PlaybackController, RenderBackend};

/// The only things a host map needs to do with animated tracks.
pub trait LayerView {
    /// Register images and create a marker and polyline for every track known so far.
    fn attach(&mut self);
    /// Drop everything from the renderer. Nothing is drawn until the next attach.
    fn detach(&mut self);
    /// Called once per frame by the host.
    fn render_frame(&mut self) -> FrameStats;
}

impl<R: RenderBackend> LayerView for PlaybackController<R> {
    fn attach(&mut self) {
        self.attach_renderer();
    }

    fn detach(&mut self) {
        self.detach_renderer();
    }

    fn render_frame(&mut self) -> FrameStats {
        self.tick()
    }
}
