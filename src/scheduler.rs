//! Frame-tick scheduling: tick sources over host loop mechanisms and the
//! [`RenderScheduler`] that coalesces their requests into render cycles.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use crate::errors::RenderError;
use crate::scheduler::compositor::{CompositorClock, CompositorTickSource};
use crate::scheduler::dispatcher::{Dispatcher, DispatcherTickSource};

pub mod compositor;
pub mod dispatcher;

mod scheduler;
pub use scheduler::RenderScheduler;

const IDLE: u8 = 0;
const PENDING: u8 = 1;

/// Idle/Pending flag for one scheduler or tick-source instance.
///
/// `request_tick` may race between the render thread and a host loop thread,
/// so the Idle → Pending transition is a compare-and-swap: exactly one
/// contender wins a cycle, everyone else coalesces into it.
#[derive(Debug)]
pub struct FrameTickState {
    state: AtomicU8,
}

impl FrameTickState {
    pub fn new() -> Self {
        Self { state: AtomicU8::new(IDLE) }
    }

    /// Attempts Idle → Pending. True only for the single caller that won.
    pub fn try_begin(&self) -> bool {
        self.state
            .compare_exchange(IDLE, PENDING, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Pending → Idle.
    pub fn complete(&self) {
        self.state.store(IDLE, Ordering::Release);
    }

    pub fn is_pending(&self) -> bool {
        self.state.load(Ordering::Acquire) == PENDING
    }
}

impl Default for FrameTickState {
    fn default() -> Self {
        Self::new()
    }
}

/// Callback a tick source raises when its host loop says "render now".
pub type TickCallback = Arc<dyn Fn() + Send + Sync>;

/// A deduplicated "time to render" signal hooked into one host loop
/// mechanism.
///
/// Every variant honors the same contract: `request_tick` is non-blocking
/// and best-effort, reentrant requests while one is pending are no-ops, and
/// after `dispose` returns the source raises no further ticks. A racing
/// `request_tick` resolves to "no callback", never to "callback after
/// dispose", and requesting after dispose is a no-op rather than an error.
pub trait TickSource: Send + Sync {
    fn request_tick(&self);

    /// Idempotent, callable from any thread. Must not be called from inside
    /// the tick callback itself.
    fn dispose(&self);
}

/// Host loop mechanisms a tick source can hook. Selected by the embedding
/// application at construction time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickSourceKind {
    /// A UI-thread message loop that can run posted jobs.
    Dispatcher,
    /// A compositor that invokes per-frame callbacks.
    CompositorClock,
}

/// The loop primitives a host makes available for tick sources.
#[derive(Clone, Default)]
pub struct HostLoopHooks {
    pub dispatcher: Option<Arc<dyn Dispatcher>>,
    pub compositor: Option<Arc<dyn CompositorClock>>,
}

/// Creates a tick source of the requested kind, wired to `on_tick`.
///
/// A kind whose loop primitive the host did not provide is a
/// [`RenderError::PlatformUnsupported`] here, at construction, not a
/// deferred failure on first use.
pub fn create_tick_source(
    kind: TickSourceKind,
    hooks: &HostLoopHooks,
    on_tick: TickCallback,
) -> Result<Box<dyn TickSource>, RenderError> {
    match kind {
        TickSourceKind::Dispatcher => match hooks.dispatcher.clone() {
            Some(dispatcher) => Ok(Box::new(DispatcherTickSource::new(dispatcher, on_tick))),
            None => Err(RenderError::PlatformUnsupported("host exposes no dispatcher loop")),
        },
        TickSourceKind::CompositorClock => match hooks.compositor.clone() {
            Some(clock) => Ok(Box::new(CompositorTickSource::new(clock, on_tick))),
            None => Err(RenderError::PlatformUnsupported("host exposes no compositor clock")),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn try_begin_wins_exactly_once_until_completed() {
        let state = FrameTickState::new();
        assert!(state.try_begin());
        assert!(!state.try_begin());
        assert!(state.is_pending());

        state.complete();
        assert!(state.try_begin());
    }

    #[test]
    fn try_begin_races_have_a_single_winner() {
        let state = Arc::new(FrameTickState::new());
        let wins = Arc::new(AtomicUsize::new(0));

        let threads: Vec<_> = (0..8)
            .map(|_| {
                let state = state.clone();
                let wins = wins.clone();
                std::thread::spawn(move || {
                    if state.try_begin() {
                        wins.fetch_add(1, Ordering::SeqCst);
                    }
                })
            })
            .collect();
        for t in threads {
            t.join().unwrap();
        }

        assert_eq!(wins.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn missing_loop_primitive_fails_at_construction() {
        let hooks = HostLoopHooks::default();
        let on_tick: TickCallback = Arc::new(|| {});

        for kind in [TickSourceKind::Dispatcher, TickSourceKind::CompositorClock] {
            match create_tick_source(kind, &hooks, on_tick.clone()) {
                Err(RenderError::PlatformUnsupported(_)) => {}
                Err(other) => panic!("unexpected error {:?}", other),
                Ok(_) => panic!("{:?} must fail without its loop primitive", kind),
            }
        }
    }
}
