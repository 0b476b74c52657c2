use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use crate::scheduler::{FrameTickState, TickCallback, TickSource};

/// A UI-thread message loop that can run posted jobs on its owning thread.
pub trait Dispatcher: Send + Sync {
    fn post(&self, job: Box<dyn FnOnce() + Send>);
}

/// Tick source for dispatcher-affine host loops.
///
/// `request_tick` posts one marshaled callback onto the owning thread;
/// further requests while that post is outstanding are no-ops. The detach on
/// dispose needs no thread affinity of its own: the already-posted job
/// observes the disposed flag on the owning thread and drops out there.
pub struct DispatcherTickSource {
    inner: Arc<Inner>,
}

struct Inner {
    dispatcher: Arc<dyn Dispatcher>,
    state: FrameTickState,
    disposed: AtomicBool,
    // Held across the disposed check and the tick invocation so dispose can
    // wait out an in-flight fire.
    fire: Mutex<()>,
    on_tick: TickCallback,
}

impl DispatcherTickSource {
    pub fn new(dispatcher: Arc<dyn Dispatcher>, on_tick: TickCallback) -> Self {
        Self {
            inner: Arc::new(Inner {
                dispatcher,
                state: FrameTickState::new(),
                disposed: AtomicBool::new(false),
                fire: Mutex::new(()),
                on_tick,
            }),
        }
    }
}

impl TickSource for DispatcherTickSource {
    fn request_tick(&self) {
        let inner = &self.inner;
        if inner.disposed.load(Ordering::Acquire) {
            return;
        }
        if !inner.state.try_begin() {
            // A callback is already posted; this request coalesces into it.
            return;
        }

        let job = inner.clone();
        inner.dispatcher.post(Box::new(move || {
            let _guard = job.fire.lock().unwrap();

            // Back to Idle first: a tick handler that requests again gets a
            // fresh post instead of being swallowed.
            job.state.complete();

            if job.disposed.load(Ordering::Acquire) {
                return;
            }
            (job.on_tick)();
        }));
    }

    fn dispose(&self) {
        self.inner.disposed.store(true, Ordering::Release);
        // Wait out a fire that already passed its disposed check.
        let _guard = self.inner.fire.lock().unwrap();
    }
}
