use crate::audio::{self, FileTap, Microphone};
use crate::dom;
use crate::surface::CanvasSurface;
use crate::timers::Interval;
use heart_core::{ControlBus, HeartScene, SignalFusion, SourceKind, TimbralFeatures};
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use web_sys as web;

#[inline]
pub fn now_ms() -> f64 {
    instant::now()
}

/// Everything the render loop and the source timers share.
pub struct FrameContext {
    pub scene: HeartScene,
    pub fusion: SignalFusion,
    pub bus: Rc<ControlBus>,
    pub surface: CanvasSurface,
    pub canvas: web::HtmlCanvasElement,

    pub audio_ctx: Option<web::AudioContext>,
    pub file_tap: Option<FileTap>,
    pub microphone: Option<Microphone>,
    pub mic_timer: Option<Interval>,
    pub sim_timer: Option<Interval>,

    /// Handle to ourselves for timer callbacks.
    pub me: Weak<RefCell<FrameContext>>,
}

impl FrameContext {
    pub fn frame(&mut self) {
        let now = now_ms();
        self.sync_sources(now);

        if self.fusion.active() == SourceKind::LiveSpectral {
            if let Some(tap) = self.file_tap.as_mut() {
                self.fusion.ingest_spectrum(tap.read_bins(), now);
            }
        }

        let control = self.bus.latest();
        self.scene.tick(&control, &mut self.surface);
    }

    pub fn resize(&mut self) {
        self.surface.invalidate();
        let viewport = dom::sync_canvas_backing_size(&self.canvas, self.surface.context());
        if viewport != self.scene.viewport() {
            log::info!(
                "[frame] resize {}x{} @{}",
                viewport.width,
                viewport.height,
                viewport.device_pixel_ratio
            );
        }
        self.scene.resize(viewport, &mut self.surface);
    }

    pub fn audio_context(&mut self) -> anyhow::Result<web::AudioContext> {
        if let Some(ctx) = &self.audio_ctx {
            return Ok(ctx.clone());
        }
        let ctx = audio::create_context()?;
        self.audio_ctx = Some(ctx.clone());
        Ok(ctx)
    }

    /// Tap `element` for live spectral analysis. Re-attaching the element
    /// already tapped reconnects its analyser.
    pub fn attach_element(&mut self, element: web::HtmlMediaElement) -> anyhow::Result<()> {
        let audio_ctx = self.audio_context()?;
        let same = self.file_tap.as_ref().map_or(false, |t| t.is_for(&element));
        if same {
            if let Some(tap) = self.file_tap.as_mut() {
                tap.connect()?;
            }
        } else {
            if let Some(old) = self.file_tap.as_mut() {
                old.disconnect();
            }
            self.file_tap = Some(FileTap::new(&audio_ctx, element)?);
        }
        audio::resume(&audio_ctx);
        self.fusion.attach_live_spectral(now_ms());
        Ok(())
    }

    pub fn detach_element(&mut self) {
        if let Some(tap) = self.file_tap.as_mut() {
            tap.disconnect();
        }
        self.fusion.detach_live_spectral();
    }

    /// Re-run source selection and swap producers when the owner changes.
    /// Also drops analyzers the fusion layer retired on its time budget and
    /// capture that live file analysis has outranked.
    pub fn sync_sources(&mut self, now: f64) {
        let transition = self.fusion.reselect(now);

        if !self.fusion.live_spectral_attached() {
            if let Some(tap) = self.file_tap.as_mut() {
                tap.disconnect();
            }
        }
        if self.microphone.is_some()
            && (!self.fusion.microphone_attached()
                || self.fusion.outranked(SourceKind::Timbral, now))
        {
            self.stop_microphone();
        }

        if let Some(t) = transition {
            self.stop_producer(t.from);
            self.start_producer(t.to);
        }
    }

    fn stop_producer(&mut self, source: SourceKind) {
        match source {
            // pulled per frame, nothing scheduled
            SourceKind::LiveSpectral => {}
            SourceKind::Timbral => {
                if self.microphone.is_some() {
                    self.fusion.detach_microphone();
                    self.stop_microphone();
                }
            }
            SourceKind::TrackSimulation | SourceKind::TimeSimulation => {
                self.sim_timer = None;
            }
        }
    }

    fn start_producer(&mut self, source: SourceKind) {
        match source {
            SourceKind::LiveSpectral | SourceKind::Timbral => {}
            SourceKind::TrackSimulation | SourceKind::TimeSimulation => self.start_simulation(),
        }
    }

    pub fn start_simulation(&mut self) {
        self.sim_timer = None;
        let source = match self.fusion.active() {
            s @ (SourceKind::TrackSimulation | SourceKind::TimeSimulation) => s,
            SourceKind::LiveSpectral | SourceKind::Timbral => SourceKind::TimeSimulation,
        };
        let me = self.me.clone();
        match Interval::for_source(source, move || {
            with_context(&me, |ctx| {
                ctx.fusion.simulate(now_ms());
            });
        }) {
            Ok(timer) => self.sim_timer = Some(timer),
            Err(e) => log::warn!("[fusion] simulation timer unavailable: {:?}", e),
        }
    }

    /// Live file analysis outranks capture; a microphone started under it
    /// would only poll into a bus that drops every write.
    pub fn microphone_preempted(&self) -> bool {
        self.fusion.outranked(SourceKind::Timbral, now_ms())
    }

    pub fn start_microphone(&mut self, mic: Microphone) -> anyhow::Result<()> {
        self.stop_microphone();
        if !self.fusion.attach_microphone(now_ms()) {
            anyhow::bail!("a higher-priority source is active");
        }
        let me = self.me.clone();
        let timer = match Interval::for_source(SourceKind::Timbral, move || {
            with_context(&me, |ctx| ctx.poll_microphone(now_ms()));
        }) {
            Ok(timer) => timer,
            Err(e) => {
                self.fusion.detach_microphone();
                return Err(e);
            }
        };
        self.microphone = Some(mic);
        self.mic_timer = Some(timer);
        log::info!("[mic] capture started");
        Ok(())
    }

    fn poll_microphone(&mut self, now: f64) {
        let features: TimbralFeatures = match self.microphone.as_mut() {
            Some(mic) => mic.sample(),
            None => return,
        };
        self.fusion.ingest_timbral(&features, now);
    }

    pub fn stop_microphone(&mut self) {
        // Timer first so no poll can run against a dropped stream.
        self.mic_timer = None;
        if self.microphone.take().is_some() {
            self.fusion.detach_microphone();
        }
    }

    /// Release every timer, analyser and capture. The loop itself is
    /// cancelled by its owner.
    pub fn teardown(&mut self) {
        self.sim_timer = None;
        self.stop_microphone();
        self.detach_element();
        // A tapped element plays through our context; closing it would mute
        // the host's playback.
        if self.file_tap.is_none() {
            if let Some(ctx) = self.audio_ctx.take() {
                _ = ctx.close();
            }
        }
    }
}

/// Run `f` on the context if it is still alive and not already borrowed.
pub fn with_context(me: &Weak<RefCell<FrameContext>>, f: impl FnOnce(&mut FrameContext)) {
    if let Some(rc) = me.upgrade() {
        if let Ok(mut ctx) = rc.try_borrow_mut() {
            f(&mut ctx);
        }
    }
}

type TickSlot = Rc<RefCell<Option<Closure<dyn FnMut()>>>>;

/// Owner of the `requestAnimationFrame` chain.
pub struct FrameLoop {
    tick: TickSlot,
    pending: Rc<Cell<Option<i32>>>,
}

impl FrameLoop {
    /// Stop rescheduling and drop the tick closure.
    pub fn cancel(&self) {
        if let Some(id) = self.pending.take() {
            if let Some(w) = web::window() {
                _ = w.cancel_animation_frame(id);
            }
        }
        if self.tick.borrow_mut().take().is_some() {
            log::info!("[frame] loop cancelled");
        }
    }
}

impl Drop for FrameLoop {
    fn drop(&mut self) {
        self.cancel();
    }
}

fn request_frame(tick: &TickSlot, pending: &Cell<Option<i32>>) {
    let Some(w) = web::window() else {
        return;
    };
    if let Some(cb) = tick.borrow().as_ref() {
        match w.request_animation_frame(cb.as_ref().unchecked_ref()) {
            Ok(id) => pending.set(Some(id)),
            Err(e) => log::error!("[frame] requestAnimationFrame failed: {:?}", e),
        }
    }
}

pub fn start_loop(frame_ctx: Rc<RefCell<FrameContext>>) -> FrameLoop {
    let tick: TickSlot = Rc::new(RefCell::new(None));
    let pending: Rc<Cell<Option<i32>>> = Rc::new(Cell::new(None));

    let tick_clone = Rc::downgrade(&tick);
    let pending_clone = pending.clone();
    *tick.borrow_mut() = Some(Closure::wrap(Box::new(move || {
        pending_clone.set(None);
        if let Ok(mut ctx) = frame_ctx.try_borrow_mut() {
            ctx.frame();
        }
        if let Some(tick) = tick_clone.upgrade() {
            request_frame(&tick, &pending_clone);
        }
    }) as Box<dyn FnMut()>));

    request_frame(&tick, &pending);
    FrameLoop { tick, pending }
}
