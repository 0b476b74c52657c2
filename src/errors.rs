#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("Unsupported pixel format: {0}")]
    UnsupportedFormat(String),

    #[error("Destination buffer too small: need {required} bytes, got {actual}")]
    BufferTooSmall { required: usize, actual: usize },

    #[error("Buffer size out of addressable range ({height} rows x {stride} stride bytes)")]
    BufferSizeOverflow { height: u32, stride: i32 },

    #[error("Host surface claims direct pixel access but returned a null pointer")]
    NullPixelBuffer,

    #[error("Could not allocate intermediate buffer of {0} bytes")]
    AllocationFailed(usize),

    #[error("Host loop primitive unavailable: {0}")]
    PlatformUnsupported(&'static str),

    #[error("Host surface error: {0}")]
    Surface(anyhow::Error),

    #[error("Renderer error: {0}")]
    Renderer(String),
}

impl From<anyhow::Error> for RenderError {
    fn from(err: anyhow::Error) -> Self {
        RenderError::Surface(err)
    }
}
