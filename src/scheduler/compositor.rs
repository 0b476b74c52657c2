use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use crate::scheduler::{FrameTickState, TickCallback, TickSource};

pub type FrameCallbackId = u64;

/// A compositor loop that invokes registered callbacks once, on its next
/// frame.
///
/// Cancelling an id that already fired (or was never issued) must be a
/// no-op.
pub trait CompositorClock: Send + Sync {
    fn request_frame_callback(&self, cb: Box<dyn FnOnce() + Send>) -> FrameCallbackId;
    fn cancel_frame_callback(&self, id: FrameCallbackId);
}

/// Tick source driven by per-frame compositor callbacks.
///
/// `request_tick` subscribes exactly once; the subscription is one-shot, so
/// it detaches on firing and is renewed only by the next `request_tick`.
pub struct CompositorTickSource {
    inner: Arc<Inner>,
}

struct Inner {
    clock: Arc<dyn CompositorClock>,
    state: FrameTickState,
    disposed: AtomicBool,
    pending: Mutex<Option<FrameCallbackId>>,
    fire: Mutex<()>,
    on_tick: TickCallback,
}

impl CompositorTickSource {
    pub fn new(clock: Arc<dyn CompositorClock>, on_tick: TickCallback) -> Self {
        Self {
            inner: Arc::new(Inner {
                clock,
                state: FrameTickState::new(),
                disposed: AtomicBool::new(false),
                pending: Mutex::new(None),
                fire: Mutex::new(()),
                on_tick,
            }),
        }
    }
}

impl TickSource for CompositorTickSource {
    fn request_tick(&self) {
        let inner = &self.inner;
        if inner.disposed.load(Ordering::Acquire) {
            return;
        }
        if !inner.state.try_begin() {
            return;
        }

        let frame = inner.clone();
        let id = inner.clock.request_frame_callback(Box::new(move || {
            let _guard = frame.fire.lock().unwrap();

            frame.pending.lock().unwrap().take();
            frame.state.complete();

            if frame.disposed.load(Ordering::Acquire) {
                return;
            }
            (frame.on_tick)();
        }));

        // If the clock fired synchronously the callback already cleared
        // `pending`; storing the id anyway is harmless because cancelling a
        // fired id is a no-op.
        *inner.pending.lock().unwrap() = Some(id);
    }

    fn dispose(&self) {
        self.inner.disposed.store(true, Ordering::Release);

        if let Some(id) = self.inner.pending.lock().unwrap().take() {
            self.inner.clock.cancel_frame_callback(id);
        }

        // Wait out a fire that already passed its disposed check.
        let _guard = self.inner.fire.lock().unwrap();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    /// Fake compositor: callbacks queue up until `fire_frame`.
    #[derive(Default)]
    struct ManualClock {
        next_id: Mutex<FrameCallbackId>,
        queued: Mutex<Vec<(FrameCallbackId, Box<dyn FnOnce() + Send>)>>,
        cancelled: Mutex<Vec<FrameCallbackId>>,
    }

    impl ManualClock {
        fn fire_frame(&self) {
            let queued: Vec<_> = self.queued.lock().unwrap().drain(..).collect();
            for (_, cb) in queued {
                cb();
            }
        }

        fn subscriptions(&self) -> usize {
            self.queued.lock().unwrap().len()
        }
    }

    impl CompositorClock for ManualClock {
        fn request_frame_callback(&self, cb: Box<dyn FnOnce() + Send>) -> FrameCallbackId {
            let mut next = self.next_id.lock().unwrap();
            *next += 1;
            let id = *next;
            self.queued.lock().unwrap().push((id, cb));
            id
        }

        fn cancel_frame_callback(&self, id: FrameCallbackId) {
            self.queued.lock().unwrap().retain(|(queued_id, _)| *queued_id != id);
            self.cancelled.lock().unwrap().push(id);
        }
    }

    fn counting_source(clock: Arc<ManualClock>) -> (CompositorTickSource, Arc<AtomicUsize>) {
        let ticks = Arc::new(AtomicUsize::new(0));
        let ticks_cb = ticks.clone();
        let source = CompositorTickSource::new(
            clock,
            Arc::new(move || {
                ticks_cb.fetch_add(1, Ordering::SeqCst);
            }),
        );
        (source, ticks)
    }

    #[test]
    fn subscribes_once_and_resubscribes_only_on_next_request() {
        let clock = Arc::new(ManualClock::default());
        let (source, ticks) = counting_source(clock.clone());

        source.request_tick();
        source.request_tick();
        assert_eq!(clock.subscriptions(), 1);

        clock.fire_frame();
        assert_eq!(ticks.load(Ordering::SeqCst), 1);
        assert_eq!(clock.subscriptions(), 0);

        // No re-subscription until asked again.
        clock.fire_frame();
        assert_eq!(ticks.load(Ordering::SeqCst), 1);

        source.request_tick();
        assert_eq!(clock.subscriptions(), 1);
    }

    #[test]
    fn dispose_cancels_the_pending_subscription() {
        let clock = Arc::new(ManualClock::default());
        let (source, ticks) = counting_source(clock.clone());

        source.request_tick();
        source.dispose();

        assert_eq!(clock.subscriptions(), 0);
        assert_eq!(clock.cancelled.lock().unwrap().len(), 1);

        clock.fire_frame();
        assert_eq!(ticks.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn request_after_dispose_is_a_noop() {
        let clock = Arc::new(ManualClock::default());
        let (source, ticks) = counting_source(clock.clone());

        source.dispose();
        source.dispose();
        source.request_tick();

        assert_eq!(clock.subscriptions(), 0);
        clock.fire_frame();
        assert_eq!(ticks.load(Ordering::SeqCst), 0);
    }
}
