//! Frame timing diagnostics.
//!
//! A [`FrameDiagnosticsCollector`] keeps the last `N` [`FrameStats`] in a
//! fixed-capacity ring, plus per-name metric streams under the same
//! eviction discipline. The render thread records while a diagnostics UI
//! reads snapshots; entries are always observed whole.
//!
//! # Examples
//!
//! ```
//! use std::time::{Duration, Instant};
//! use lumen_engine::diagnostics::{FrameDiagnosticsCollector, FrameStats};
//!
//! let collector = FrameDiagnosticsCollector::new(120);
//! collector.record(FrameStats {
//!     cpu_time: Duration::from_millis(3),
//!     gpu_time: Duration::ZERO,
//!     queue_latency: Duration::from_millis(1),
//!     encoded_paths: 42,
//!     timestamp: Instant::now(),
//! });
//!
//! assert_eq!(collector.try_get_recent().unwrap().encoded_paths, 42);
//! ```

use std::collections::{HashMap, VecDeque};
use std::sync::RwLock;
use std::time::{Duration, Instant};

/// Timing sample for one rendered frame. Immutable, appended only.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameStats {
    pub cpu_time: Duration,
    pub gpu_time: Duration,
    pub queue_latency: Duration,
    pub encoded_paths: u32,
    pub timestamp: Instant,
}

/// One sample in a named metric stream.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricSample {
    pub value: f64,
    pub timestamp: Instant,
}

struct CollectorState {
    frames: VecDeque<FrameStats>,
    metrics: HashMap<String, VecDeque<MetricSample>>,
}

/// Fixed-capacity ring of recent frame stats plus named metric streams.
///
/// The collector exclusively owns its buffers; callers only get copies.
pub struct FrameDiagnosticsCollector {
    capacity: usize,
    state: RwLock<CollectorState>,
}

impl FrameDiagnosticsCollector {
    /// Collector keeping the last `capacity` entries per stream.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "diagnostics capacity must be non-zero");

        Self {
            capacity,
            state: RwLock::new(CollectorState {
                frames: VecDeque::with_capacity(capacity),
                metrics: HashMap::new(),
            }),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Appends a frame sample, evicting the oldest entry once full.
    pub fn record(&self, stats: FrameStats) {
        let mut state = self.state.write().unwrap();
        if state.frames.len() == self.capacity {
            state.frames.pop_front();
        }
        state.frames.push_back(stats);
    }

    /// The most recently recorded frame sample, if any.
    pub fn try_get_recent(&self) -> Option<FrameStats> {
        self.state.read().unwrap().frames.back().copied()
    }

    /// All retained frame samples, oldest first.
    pub fn frames(&self) -> Vec<FrameStats> {
        self.state.read().unwrap().frames.iter().copied().collect()
    }

    /// Appends a sample to the named metric stream, same eviction discipline
    /// as the frame ring.
    pub fn record_metric(&self, name: &str, value: f64, timestamp: Instant) {
        let mut state = self.state.write().unwrap();
        let stream = state.metrics.entry(name.to_string()).or_default();
        if stream.len() == self.capacity {
            stream.pop_front();
        }
        stream.push_back(MetricSample { value, timestamp });
    }

    /// Retained history for one metric, oldest first. Empty for names never
    /// recorded.
    pub fn metric_history(&self, name: &str) -> Vec<MetricSample> {
        self.state
            .read()
            .unwrap()
            .metrics
            .get(name)
            .map(|stream| stream.iter().copied().collect())
            .unwrap_or_default()
    }
}
