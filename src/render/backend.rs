use crate::errors::RenderError;
use crate::render::target::{PixelFormat, RenderParams};

/// Narrow seam to the external rendering engine.
///
/// One operation: write `scene` into a destination byte buffer according to
/// `params`. The buffer is exclusively the caller's for the duration of the
/// call and at least as long as the negotiated descriptor requires; the
/// renderer must not retain a reference to it beyond the call.
pub trait Renderer: Send + Sync {
    /// Opaque scene type the embedding application builds.
    type Scene;

    fn name(&self) -> &str;

    /// Render the scene into the destination buffer.
    fn render(
        &mut self,
        scene: &Self::Scene,
        buffer: &mut [u8],
        params: &RenderParams,
    ) -> Result<(), RenderError>;
}

/// Null renderer that only clears the destination to the base color.
/// Useful for tests and headless hosts.
pub struct NullRenderer {
    frame_id: u64,
}

impl NullRenderer {
    pub fn new() -> Self {
        Self { frame_id: 0 }
    }

    /// Number of frames rendered so far.
    pub fn frame_id(&self) -> u64 {
        self.frame_id
    }
}

impl Default for NullRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer for NullRenderer {
    type Scene = ();

    fn name(&self) -> &str {
        "NullRenderer"
    }

    fn render(
        &mut self,
        _scene: &Self::Scene,
        buffer: &mut [u8],
        params: &RenderParams,
    ) -> Result<(), RenderError> {
        let rgba = params.base_color.to_rgba_bytes();
        let px = match params.format {
            PixelFormat::Bgra8 => [rgba[2], rgba[1], rgba[0], rgba[3]],
            PixelFormat::Rgba8 => rgba,
        };

        for chunk in buffer.chunks_exact_mut(4) {
            chunk.copy_from_slice(&px);
        }

        self.frame_id = self.frame_id.wrapping_add(1);
        Ok(())
    }
}
