use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::time::Instant;

use crate::errors::RenderError;
use crate::scheduler::{
    create_tick_source, FrameTickState, HostLoopHooks, TickCallback, TickSource, TickSourceKind,
};

/// The cadence authority for one render surface.
///
/// Holds a target interval and a [`FrameTickState`]. Any number of
/// `request_tick` calls while a cycle is pending coalesce into that one
/// cycle; the tick fires no sooner than the interval after the previous
/// fire. The state returns to Idle before subscribers run, so a subscriber
/// that synchronously requests again starts a fresh cycle instead of being
/// swallowed. At most one render cycle is ever in flight per instance.
///
/// The scheduler owns no threads. Deferred fires run on the host-provided
/// tokio runtime handle.
pub struct RenderScheduler {
    inner: Arc<SchedulerInner>,
    sources: Mutex<Vec<Box<dyn TickSource>>>,
}

struct SchedulerInner {
    interval: Duration,
    state: FrameTickState,
    disposed: AtomicBool,
    handle: Handle,
    last_fire: Mutex<Option<Instant>>,
    // Lock is held across the disposed check and subscriber invocation;
    // dispose takes it to wait out an in-flight fire.
    subscribers: Mutex<Vec<Box<dyn Fn() + Send>>>,
}

impl RenderScheduler {
    pub fn new(interval: Duration, handle: Handle) -> Self {
        Self {
            inner: Arc::new(SchedulerInner {
                interval,
                state: FrameTickState::new(),
                disposed: AtomicBool::new(false),
                handle,
                last_fire: Mutex::new(None),
                subscribers: Mutex::new(Vec::new()),
            }),
            sources: Mutex::new(Vec::new()),
        }
    }

    /// Registers a tick subscriber. Subscribe before requesting ticks; the
    /// callback runs on the runtime the scheduler was given and must not
    /// call `subscribe` or `dispose` itself.
    pub fn subscribe(&self, callback: impl Fn() + Send + 'static) {
        self.inner.subscribers.lock().unwrap().push(Box::new(callback));
    }

    /// Requests a render cycle. Non-blocking; returns immediately whether or
    /// not a cycle was already pending.
    pub fn request_tick(&self) {
        SchedulerInner::request_tick(&self.inner);
    }

    /// Creates a tick source of the given kind, feeding this scheduler, and
    /// takes ownership of it for teardown.
    pub fn attach_source(
        &self,
        kind: TickSourceKind,
        hooks: &HostLoopHooks,
    ) -> Result<(), RenderError> {
        let inner = self.inner.clone();
        let on_tick: TickCallback = Arc::new(move || SchedulerInner::request_tick(&inner));

        let source = create_tick_source(kind, hooks, on_tick)?;
        self.sources.lock().unwrap().push(source);
        Ok(())
    }

    /// Tears the scheduler down: owned tick sources first, then the
    /// scheduler itself. After this returns no further tick fires, even for
    /// a `request_tick` that raced the dispose.
    pub fn dispose(&self) {
        for source in self.sources.lock().unwrap().iter() {
            source.dispose();
        }

        self.inner.disposed.store(true, Ordering::Release);
        // Wait out a fire that already passed its disposed check.
        let _guard = self.inner.subscribers.lock().unwrap();
    }
}

impl SchedulerInner {
    fn request_tick(this: &Arc<Self>) {
        if this.disposed.load(Ordering::Acquire) {
            return;
        }
        if !this.state.try_begin() {
            // A cycle is pending; this request coalesces into it.
            return;
        }

        let due = match *this.last_fire.lock().unwrap() {
            Some(previous) => previous + this.interval,
            None => Instant::now(),
        };

        let inner = this.clone();
        this.handle.spawn(async move {
            tokio::time::sleep_until(due).await;
            inner.fire();
        });
    }

    fn fire(&self) {
        let subscribers = self.subscribers.lock().unwrap();

        if self.disposed.load(Ordering::Acquire) {
            self.state.complete();
            return;
        }

        *self.last_fire.lock().unwrap() = Some(Instant::now());

        // Idle before invoking: a subscriber that requests synchronously
        // starts the next cycle rather than being coalesced into this one.
        self.state.complete();

        for callback in subscribers.iter() {
            callback();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn counting_scheduler(interval: Duration) -> (Arc<RenderScheduler>, Arc<AtomicUsize>) {
        let scheduler = Arc::new(RenderScheduler::new(interval, Handle::current()));
        let ticks = Arc::new(AtomicUsize::new(0));
        let ticks_cb = ticks.clone();
        scheduler.subscribe(move || {
            ticks_cb.fetch_add(1, Ordering::SeqCst);
        });
        (scheduler, ticks)
    }

    #[tokio::test(start_paused = true)]
    async fn burst_of_requests_coalesces_into_one_tick() {
        let (scheduler, ticks) = counting_scheduler(Duration::from_millis(16));

        scheduler.request_tick();
        scheduler.request_tick();
        scheduler.request_tick();

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), 1);

        // The next request starts a new cycle.
        scheduler.request_tick();
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn fires_no_sooner_than_the_interval_after_the_previous_fire() {
        let scheduler = Arc::new(RenderScheduler::new(
            Duration::from_millis(16),
            Handle::current(),
        ));
        let fire_times = Arc::new(Mutex::new(Vec::new()));

        let times = fire_times.clone();
        scheduler.subscribe(move || {
            times.lock().unwrap().push(Instant::now());
        });

        scheduler.request_tick();
        tokio::time::sleep(Duration::from_millis(1)).await;
        scheduler.request_tick();
        tokio::time::sleep(Duration::from_millis(100)).await;

        let times = fire_times.lock().unwrap();
        assert_eq!(times.len(), 2);
        assert!(times[1] - times[0] >= Duration::from_millis(16));
    }

    #[tokio::test(start_paused = true)]
    async fn subscriber_rerequesting_synchronously_starts_a_fresh_cycle() {
        let scheduler = Arc::new(RenderScheduler::new(
            Duration::from_millis(16),
            Handle::current(),
        ));
        let ticks = Arc::new(AtomicUsize::new(0));

        let ticks_cb = ticks.clone();
        let scheduler_cb = scheduler.clone();
        scheduler.subscribe(move || {
            if ticks_cb.fetch_add(1, Ordering::SeqCst) < 2 {
                scheduler_cb.request_tick();
            }
        });

        scheduler.request_tick();
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn no_tick_after_dispose() {
        let (scheduler, ticks) = counting_scheduler(Duration::from_millis(16));

        scheduler.request_tick();
        scheduler.dispose();

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), 0);

        // Requests after dispose are no-ops, not errors.
        scheduler.request_tick();
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn dispose_racing_requests_never_ticks_after_dispose_returns() {
        for _ in 0..100 {
            let scheduler = Arc::new(RenderScheduler::new(
                Duration::from_micros(50),
                Handle::current(),
            ));
            let after_dispose = Arc::new(AtomicBool::new(false));
            let violation = Arc::new(AtomicBool::new(false));

            let after = after_dispose.clone();
            let bad = violation.clone();
            scheduler.subscribe(move || {
                if after.load(Ordering::SeqCst) {
                    bad.store(true, Ordering::SeqCst);
                }
            });

            let requester = {
                let scheduler = scheduler.clone();
                std::thread::spawn(move || {
                    for _ in 0..64 {
                        scheduler.request_tick();
                        std::thread::yield_now();
                    }
                })
            };

            tokio::time::sleep(Duration::from_micros(200)).await;
            scheduler.dispose();
            after_dispose.store(true, Ordering::SeqCst);

            requester.join().unwrap();
            tokio::time::sleep(Duration::from_millis(1)).await;
            assert!(!violation.load(Ordering::SeqCst));
        }
    }
}
