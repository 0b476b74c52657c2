//! Render-target descriptors and format negotiation.
//!
//! A [`RenderTargetDescriptor`] captures the geometry and pixel format of a
//! concrete destination buffer, as reported by the host surface. It is the
//! authoritative side of negotiation: when the host has told us what the
//! buffer looks like, that wins over whatever the caller asked for. A
//! descriptor field of `0` means "unspecified, defer to caller intent".
//!
//! # Examples
//!
//! Sizing and validating a destination buffer:
//! ```
//! use lumen_engine::render::{PixelFormat, RenderTargetDescriptor};
//!
//! let desc = RenderTargetDescriptor::new(256, 128, PixelFormat::Bgra8, 1024);
//! assert_eq!(desc.required_buffer_size().unwrap(), 131072);
//!
//! let buf = vec![0u8; 131072];
//! desc.ensure_buffer(&buf).unwrap();
//! ```
//!
//! Merging a descriptor with caller intent:
//! ```
//! use lumen_engine::render::{PixelFormat, RenderParams, RenderTargetDescriptor};
//!
//! // The host did not report dimensions, so the caller's request wins.
//! let desc = RenderTargetDescriptor::new(0, 0, PixelFormat::Bgra8, 0);
//! let params = desc.negotiate(&RenderParams::sized(128, 64));
//! assert_eq!((params.width, params.height), (128, 64));
//! assert_eq!(params.format, PixelFormat::Bgra8);
//! ```

use crate::errors::RenderError;

/// RGBA color used for clear/base colors.
///
/// Channels are `f32` in the range `0.0 ..= 1.0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const TRANSPARENT: Color = Color { r: 0.0, g: 0.0, b: 0.0, a: 0.0 };

    /// Creates a new color from `f32` channel values in the range `0.0 ..= 1.0`.
    pub fn new(r: f32, g: f32, b: f32, a: f32) -> Color {
        Color { r, g, b, a }
    }

    /// Creates a new color from `u8` channel values in the range `0 ..= 255`.
    pub fn from_u8(r: u8, g: u8, b: u8, a: u8) -> Color {
        Color {
            r: r as f32 / 255.0,
            g: g as f32 / 255.0,
            b: b as f32 / 255.0,
            a: a as f32 / 255.0,
        }
    }

    pub(crate) fn to_rgba_bytes(self) -> [u8; 4] {
        [
            (self.r * 255.0) as u8,
            (self.g * 255.0) as u8,
            (self.b * 255.0) as u8,
            (self.a * 255.0) as u8,
        ]
    }
}

/// Pixel formats the renderer can write. Closed set; host formats outside
/// the mapping in [`PixelFormat::from_host`] are a hard error.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PixelFormat {
    Bgra8,
    Rgba8,
}

impl PixelFormat {
    /// Bytes per pixel for this format.
    pub fn bytes_per_pixel(self) -> u32 {
        match self {
            PixelFormat::Bgra8 | PixelFormat::Rgba8 => 4,
        }
    }

    /// Maps a host-native pixel format into the renderer's set.
    ///
    /// Partial over [`HostPixelFormat`]: anything outside the supported set
    /// fails with [`RenderError::UnsupportedFormat`] naming the offender,
    /// never a silent default.
    pub fn from_host(host: HostPixelFormat) -> Result<PixelFormat, RenderError> {
        match host {
            HostPixelFormat::Bgra8888 => Ok(PixelFormat::Bgra8),
            HostPixelFormat::Rgba8888 => Ok(PixelFormat::Rgba8),
            other => Err(RenderError::UnsupportedFormat(other.to_string())),
        }
    }

    /// Inverse of [`PixelFormat::from_host`] over the supported set.
    pub fn to_host(self) -> HostPixelFormat {
        match self {
            PixelFormat::Bgra8 => HostPixelFormat::Bgra8888,
            PixelFormat::Rgba8 => HostPixelFormat::Rgba8888,
        }
    }
}

/// Pixel formats as host toolkits report them.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HostPixelFormat {
    Bgra8888,
    Rgba8888,
    Rgb565,
    Gray8,
}

impl std::fmt::Display for HostPixelFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HostPixelFormat::Bgra8888 => write!(f, "Bgra8888"),
            HostPixelFormat::Rgba8888 => write!(f, "Rgba8888"),
            HostPixelFormat::Rgb565 => write!(f, "Rgb565"),
            HostPixelFormat::Gray8 => write!(f, "Gray8"),
        }
    }
}

/// Caller intent for one render pass: requested dimensions, clear color and
/// format. Distinct from [`RenderTargetDescriptor`], which reflects the
/// actual destination buffer; [`RenderTargetDescriptor::negotiate`] merges
/// the two.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderParams {
    pub width: u32,
    pub height: u32,
    pub base_color: Color,
    pub format: PixelFormat,
}

impl RenderParams {
    /// Params requesting the given dimensions with a transparent base color.
    pub fn sized(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            base_color: Color::TRANSPARENT,
            format: PixelFormat::Bgra8,
        }
    }
}

impl Default for RenderParams {
    fn default() -> Self {
        Self::sized(0, 0)
    }
}

/// Geometry/format contract of a concrete destination pixel buffer.
///
/// Immutable value; created per render call and never mutated. A width or
/// height of `0` means the host left that dimension unspecified.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RenderTargetDescriptor {
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
    pub stride_bytes: i32,
}

impl RenderTargetDescriptor {
    pub fn new(width: u32, height: u32, format: PixelFormat, stride_bytes: i32) -> Self {
        Self { width, height, format, stride_bytes }
    }

    /// Descriptor for a tightly packed buffer of the given dimensions.
    pub fn packed(width: u32, height: u32, format: PixelFormat) -> Self {
        Self::new(width, height, format, (width * format.bytes_per_pixel()) as i32)
    }

    /// Minimum byte length a destination buffer must have:
    /// `height * stride_bytes`.
    ///
    /// A negative stride or a product outside the addressable range fails
    /// with [`RenderError::BufferSizeOverflow`].
    pub fn required_buffer_size(&self) -> Result<usize, RenderError> {
        let overflow = || RenderError::BufferSizeOverflow {
            height: self.height,
            stride: self.stride_bytes,
        };

        let stride = usize::try_from(self.stride_bytes).map_err(|_| overflow())?;
        (self.height as usize).checked_mul(stride).ok_or_else(overflow)
    }

    /// Checks that `buffer` is large enough for this descriptor.
    pub fn ensure_buffer(&self, buffer: &[u8]) -> Result<(), RenderError> {
        let required = self.required_buffer_size()?;
        if buffer.len() < required {
            return Err(RenderError::BufferTooSmall {
                required,
                actual: buffer.len(),
            });
        }
        Ok(())
    }

    /// Merges this descriptor with the caller's requested params.
    ///
    /// Width and height come from `requested` only where the descriptor's
    /// field is zero; otherwise the descriptor's explicit value wins. The
    /// format is always the descriptor's: the destination buffer's layout is
    /// not negotiable by intent.
    pub fn negotiate(&self, requested: &RenderParams) -> RenderParams {
        RenderParams {
            width: if self.width == 0 { requested.width } else { self.width },
            height: if self.height == 0 { requested.height } else { self.height },
            base_color: requested.base_color,
            format: self.format,
        }
    }
}
