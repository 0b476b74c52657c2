use std::time::Duration;

/// Configuration for the render loop and its diagnostics.
#[derive(Debug, Clone)]
pub struct RenderLoopConfig {
    /// Minimum spacing between two scheduler fires.
    pub target_frame_interval: Duration,
    /// Capacity of the frame-stats ring buffer and of each metric stream.
    pub diagnostics_capacity: usize,
}

impl Default for RenderLoopConfig {
    fn default() -> Self {
        Self {
            target_frame_interval: Duration::from_millis(16),   // ~60Hz
            diagnostics_capacity: 120,
        }
    }
}
