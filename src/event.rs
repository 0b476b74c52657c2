/// Events emitted by a [`RenderHost`](crate::host::RenderHost).
#[derive(Debug, Clone)]
pub enum RenderEvent {
    /// A frame was fully rendered and flushed to its surface.
    FrameRendered { width: u32, height: u32, frame_id: u64 },
    /// The host was disposed; no further events follow.
    HostDisposed,
}

/// Stats-free arguments handed to the `on_render_surface` callback once a
/// frame completes.
#[derive(Debug, Clone, Copy)]
pub struct RenderSurfaceArgs {
    pub width: u32,
    pub height: u32,
    pub frame_id: u64,
}
