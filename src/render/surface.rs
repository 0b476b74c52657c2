use std::fmt;

use crate::errors::RenderError;
use crate::render::target::{HostPixelFormat, PixelFormat};

/// Size of a surface in pixels. It's a simple struct to hold width and height.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SurfaceSize {
    pub width: u32,
    pub height: u32,
}

impl SurfaceSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// A surface with no visible area. Rendering into it is a no-op.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Direct view into host-owned pixel memory, as claimed by the host.
///
/// UNSAFE contract: when the host hands this out, `ptr` must stay valid for
/// at least `height * stride_bytes` bytes until the render call on this
/// surface returns. The bridge checks the pointer for null before touching
/// it; a null claim is a [`RenderError::NullPixelBuffer`].
pub struct DirectPixels {
    pub ptr: *mut u8,
    pub width: u32,
    pub height: u32,
    pub stride_bytes: i32,
    pub format: HostPixelFormat,
}

/// Opaque host surface the bridge renders into.
///
/// Hosts with mappable pixel memory implement `try_direct_pixels`; hosts
/// that only expose a higher-level drawing surface return `None` from it and
/// receive the frame through `blit` instead.
pub trait HostSurface {
    /// Direct pixel memory and stride, if this surface supports it.
    fn try_direct_pixels(&mut self) -> Option<DirectPixels>;

    /// Visible bounds of the surface.
    fn bounds(&self) -> SurfaceSize;

    /// Draw a CPU pixel image onto the surface. Only used on the fallback
    /// path, after rendering into an intermediate buffer.
    fn blit(&mut self, image: &PixelImage) -> anyhow::Result<()>;

    /// Present/flush pending writes to the host compositor.
    fn flush(&mut self);
}

/// CPU pixel image handed to hosts on the blit fallback path.
#[derive(Clone)]
pub struct PixelImage {
    pub pixels: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub stride: u32,
    pub format: PixelFormat,
}

impl PixelImage {
    pub fn from_raw(pixels: Vec<u8>, width: u32, height: u32, stride: u32, format: PixelFormat) -> Self {
        assert!(
            pixels.len() >= (height as usize) * (stride as usize),
            "pixel buffer too small for image dimensions"
        );

        Self { pixels, width, height, stride, format }
    }
}

impl fmt::Debug for PixelImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PixelImage")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("len", &self.pixels.len())
            .finish()
    }
}

/// Owned staging surface used when a host surface has no direct pixel
/// access: the bridge renders into this, then blits the result onto the
/// host.
pub struct MemorySurface {
    buf: Vec<u8>,
    size: SurfaceSize,
    stride: u32,
    format: PixelFormat,
}

impl MemorySurface {
    /// Allocates a tightly packed staging buffer for the given bounds.
    pub fn new(size: SurfaceSize, format: PixelFormat) -> Result<Self, RenderError> {
        let stride = size.width * format.bytes_per_pixel();
        let len = (size.height as usize)
            .checked_mul(stride as usize)
            .ok_or(RenderError::BufferSizeOverflow {
                height: size.height,
                stride: stride as i32,
            })?;

        let mut buf = Vec::new();
        buf.try_reserve_exact(len)
            .map_err(|_| RenderError::AllocationFailed(len))?;
        buf.resize(len, 0);

        Ok(Self { buf, size, stride, format })
    }

    /// Consumes the surface, yielding the rendered pixels for a blit.
    pub fn into_image(self) -> PixelImage {
        PixelImage::from_raw(self.buf, self.size.width, self.size.height, self.stride, self.format)
    }
}

impl HostSurface for MemorySurface {
    fn try_direct_pixels(&mut self) -> Option<DirectPixels> {
        Some(DirectPixels {
            ptr: self.buf.as_mut_ptr(),
            width: self.size.width,
            height: self.size.height,
            stride_bytes: self.stride as i32,
            format: self.format.to_host(),
        })
    }

    fn bounds(&self) -> SurfaceSize {
        self.size
    }

    fn blit(&mut self, _image: &PixelImage) -> anyhow::Result<()> {
        anyhow::bail!("MemorySurface has direct pixel access; nothing blits onto it")
    }

    fn flush(&mut self) {
        // CPU memory, nothing to present.
    }
}
