use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::time::{Duration, Instant};

use bitflags::bitflags;
use tokio::runtime::Handle;
use tokio::sync::broadcast;

use crate::config::RenderLoopConfig;
use crate::diagnostics::{FrameDiagnosticsCollector, FrameStats};
use crate::errors::RenderError;
use crate::event::{RenderEvent, RenderSurfaceArgs};
use crate::render::backend::Renderer;
use crate::render::bridge::SurfaceRenderBridge;
use crate::render::surface::HostSurface;
use crate::render::target::RenderParams;
use crate::scheduler::{HostLoopHooks, RenderScheduler, TickSourceKind};

const DEFAULT_CHANNEL_CAPACITY: usize = 64;

bitflags! {
    /// What went stale since the last frame. Any set bit is grounds for a
    /// redraw request.
    pub struct InvalidationFlags: u8 {
        const CONTENTS = 0b0001;
        const GEOMETRY = 0b0010;
        const VIEWPORT = 0b0100;
    }
}

/// Embedding-facing front door for one surface's render loop: owns the
/// scheduler, the surface bridge and the diagnostics collector, and wires
/// them together.
pub struct RenderHost<R: Renderer> {
    bridge: SurfaceRenderBridge<R>,
    scheduler: RenderScheduler,
    diagnostics: Arc<FrameDiagnosticsCollector>,
    on_render_surface: Mutex<Option<Box<dyn Fn(&RenderSurfaceArgs) + Send>>>,
    event_tx: broadcast::Sender<RenderEvent>,
    frame_id: AtomicU64,
    pending_since: Mutex<Option<Instant>>,
}

impl<R: Renderer> RenderHost<R> {
    /// Builds a host around `renderer`. Deferred tick fires run on `handle`,
    /// which the embedding application provides.
    pub fn new(config: RenderLoopConfig, renderer: R, handle: Handle) -> Self {
        let (event_tx, _first_rx) = broadcast::channel::<RenderEvent>(DEFAULT_CHANNEL_CAPACITY);

        Self {
            bridge: SurfaceRenderBridge::new(renderer),
            scheduler: RenderScheduler::new(config.target_frame_interval, handle),
            diagnostics: Arc::new(FrameDiagnosticsCollector::new(config.diagnostics_capacity)),
            on_render_surface: Mutex::new(None),
            event_tx,
            frame_id: AtomicU64::new(0),
            pending_since: Mutex::new(None),
        }
    }

    /// Shared handle to the renderer behind this host.
    pub fn renderer(&self) -> Arc<RwLock<R>> {
        self.bridge.renderer()
    }

    pub fn scheduler(&self) -> &RenderScheduler {
        &self.scheduler
    }

    pub fn diagnostics(&self) -> Arc<FrameDiagnosticsCollector> {
        self.diagnostics.clone()
    }

    /// Subscribe to host events (frame completions, disposal).
    pub fn subscribe_events(&self) -> broadcast::Receiver<RenderEvent> {
        self.event_tx.subscribe()
    }

    /// Registers the tick callback; runs on the runtime given at
    /// construction.
    pub fn subscribe_ticks(&self, callback: impl Fn() + Send + 'static) {
        self.scheduler.subscribe(callback);
    }

    /// Single-slot callback invoked once a frame has been rendered and
    /// flushed. Replaces any previously registered callback.
    pub fn set_on_render_surface(&self, callback: impl Fn(&RenderSurfaceArgs) + Send + 'static) {
        *self.on_render_surface.lock().unwrap() = Some(Box::new(callback));
    }

    /// Hooks a host loop mechanism up as a tick source owned by the
    /// scheduler.
    pub fn attach_tick_source(
        &self,
        kind: TickSourceKind,
        hooks: &HostLoopHooks,
    ) -> Result<(), RenderError> {
        self.scheduler.attach_source(kind, hooks)
    }

    /// Explicitly requests a render cycle (the third tick mechanism next to
    /// dispatcher timers and compositor frames).
    pub fn request_render(&self) {
        let mut pending = self.pending_since.lock().unwrap();
        if pending.is_none() {
            *pending = Some(Instant::now());
        }
        drop(pending);

        self.scheduler.request_tick();
    }

    /// Requests a render cycle if anything is actually stale.
    pub fn invalidate(&self, flags: InvalidationFlags) {
        if !flags.is_empty() {
            self.request_render();
        }
    }

    /// Renders one frame onto `surface` and records its timing.
    ///
    /// Typically called from the tick callback with the scene the embedding
    /// application built for this frame.
    pub fn render_to_surface(
        &self,
        scene: &R::Scene,
        surface: &mut dyn HostSurface,
        requested: &RenderParams,
    ) -> Result<(), RenderError> {
        let queue_latency = self
            .pending_since
            .lock()
            .unwrap()
            .take()
            .map(|since| since.elapsed())
            .unwrap_or(Duration::ZERO);

        let bounds = surface.bounds();

        let started = Instant::now();
        self.bridge.render_to_surface(scene, surface, requested)?;
        let cpu_time = started.elapsed();

        let frame_id = self.frame_id.fetch_add(1, Ordering::AcqRel) + 1;

        self.diagnostics.record(FrameStats {
            cpu_time,
            gpu_time: Duration::ZERO,
            queue_latency,
            encoded_paths: 0,
            timestamp: Instant::now(),
        });
        self.diagnostics
            .record_metric("frame.cpu_ms", cpu_time.as_secs_f64() * 1000.0, Instant::now());

        let args = RenderSurfaceArgs {
            width: bounds.width,
            height: bounds.height,
            frame_id,
        };
        if let Some(callback) = self.on_render_surface.lock().unwrap().as_ref() {
            callback(&args);
        }

        let _ = self.event_tx.send(RenderEvent::FrameRendered {
            width: bounds.width,
            height: bounds.height,
            frame_id,
        });

        log::trace!(
            "frame {} rendered in {:?} ({}x{})",
            frame_id,
            cpu_time,
            bounds.width,
            bounds.height
        );

        Ok(())
    }

    /// Tears down the scheduler (and its tick sources) and announces
    /// disposal. No ticks fire after this returns.
    pub fn dispose(&self) {
        self.scheduler.dispose();
        let _ = self.event_tx.send(RenderEvent::HostDisposed);
    }
}
