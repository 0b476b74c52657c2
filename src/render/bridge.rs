use std::ptr::NonNull;
use std::slice;
use std::sync::{Arc, RwLock};

use crate::errors::RenderError;
use crate::render::backend::Renderer;
use crate::render::surface::{DirectPixels, HostSurface, MemorySurface};
use crate::render::target::{PixelFormat, RenderParams, RenderTargetDescriptor};

/// Bridges an opaque host surface and the external renderer.
///
/// Prefers the host's direct pixel memory. Hosts without direct access get
/// the frame rendered into an owned staging buffer and blitted back. Either
/// way, the frame is fully written and flushed or nothing is written at all.
pub struct SurfaceRenderBridge<R: Renderer> {
    renderer: Arc<RwLock<R>>,
}

impl<R: Renderer> SurfaceRenderBridge<R> {
    pub fn new(renderer: R) -> Self {
        Self::from_shared(Arc::new(RwLock::new(renderer)))
    }

    /// Wraps an already-shared renderer (e.g. one also held by a
    /// [`RenderHost`](crate::host::RenderHost)).
    pub fn from_shared(renderer: Arc<RwLock<R>>) -> Self {
        Self { renderer }
    }

    /// Shared handle to the renderer behind this bridge.
    pub fn renderer(&self) -> Arc<RwLock<R>> {
        self.renderer.clone()
    }

    /// Renders one frame onto `surface`.
    ///
    /// `requested` is caller intent; the actual buffer geometry reported by
    /// the surface wins wherever it is explicit (see
    /// [`RenderTargetDescriptor::negotiate`]).
    pub fn render_to_surface(
        &self,
        scene: &R::Scene,
        surface: &mut dyn HostSurface,
        requested: &RenderParams,
    ) -> Result<(), RenderError> {
        if let Some(px) = surface.try_direct_pixels() {
            return self.render_direct(scene, surface, px, requested);
        }

        let bounds = surface.bounds();
        if bounds.is_empty() {
            // Nothing to draw into.
            return Ok(());
        }

        // No direct access: render into a staging surface through the direct
        // path, then hand the pixels to the host.
        let mut staging = MemorySurface::new(bounds, PixelFormat::Rgba8)?;
        self.render_to_surface(scene, &mut staging, requested)?;

        surface.blit(&staging.into_image())?;
        surface.flush();
        Ok(())
    }

    fn render_direct(
        &self,
        scene: &R::Scene,
        surface: &mut dyn HostSurface,
        px: DirectPixels,
        requested: &RenderParams,
    ) -> Result<(), RenderError> {
        if px.width == 0 || px.height == 0 {
            return Ok(());
        }

        let ptr = NonNull::new(px.ptr).ok_or(RenderError::NullPixelBuffer)?;
        let format = PixelFormat::from_host(px.format)?;

        let descriptor = RenderTargetDescriptor::new(px.width, px.height, format, px.stride_bytes);
        let len = descriptor.required_buffer_size()?;

        // SAFETY: per the `DirectPixels` contract the host keeps `ptr` valid
        // for at least `height * stride_bytes` bytes until this call returns,
        // and `len` is exactly that product.
        let buffer = unsafe { slice::from_raw_parts_mut(ptr.as_ptr(), len) };

        let params = descriptor.negotiate(requested);
        self.renderer.write().unwrap().render(scene, buffer, &params)?;

        surface.flush();
        Ok(())
    }
}
