pub mod backend;
pub mod bridge;
pub mod surface;

pub mod target;
pub use target::*;

pub use backend::{NullRenderer, Renderer};
pub use bridge::SurfaceRenderBridge;
pub use surface::{DirectPixels, HostSurface, MemorySurface, PixelImage, SurfaceSize};
