#![cfg(target_arch = "wasm32")]
use crate::frame::{FrameContext, FrameLoop};
use crate::surface::CanvasSurface;
use heart_core::{HeartConfig, HeartScene, SignalFusion, TimbralFeatures, TrackMetrics, Viewport};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::cell::RefCell;
use std::rc::{Rc, Weak};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::spawn_local;
use web_sys as web;

mod audio;
mod constants;
mod dom;
mod frame;
mod surface;
mod timers;

#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();
    console_log::init_with_level(log::Level::Info).ok();
    log::info!("heart-web starting");
    Ok(())
}

fn load_config(options: &JsValue, viewport: &Viewport) -> HeartConfig {
    let fallback = || HeartConfig::for_viewport_width(viewport.width);
    if options.is_undefined() || options.is_null() {
        return fallback();
    }
    #[allow(deprecated)]
    let parsed = options.into_serde::<HeartConfig>();
    let config = match parsed {
        Ok(cfg) => cfg,
        Err(e) => {
            log::warn!("[config] ignoring options: {}", e);
            return fallback();
        }
    };
    match config.validate() {
        Ok(()) => config,
        Err(e) => {
            log::warn!("[config] ignoring options: {}", e);
            fallback()
        }
    }
}

fn wire_canvas_resize(ctx: &Rc<RefCell<FrameContext>>) -> Closure<dyn FnMut()> {
    let me = Rc::downgrade(ctx);
    let resize_closure = Closure::wrap(Box::new(move || {
        frame::with_context(&me, FrameContext::resize);
    }) as Box<dyn FnMut()>);
    if let Some(window) = web::window() {
        _ = window
            .add_event_listener_with_callback("resize", resize_closure.as_ref().unchecked_ref());
    }
    resize_closure
}

struct Mounted {
    ctx: Rc<RefCell<FrameContext>>,
    frame_loop: FrameLoop,
    resize: Closure<dyn FnMut()>,
}

fn mount(canvas_id: &str, options: &JsValue) -> anyhow::Result<Mounted> {
    let canvas = dom::find_canvas(canvas_id)?;
    let ctx2d = dom::context_2d(&canvas)?;
    let viewport = dom::sync_canvas_backing_size(&canvas, &ctx2d);
    let config = load_config(options, &viewport);
    let rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let scene = HeartScene::new(config, viewport, rng)?;

    let fusion = SignalFusion::new(frame::now_ms());
    let bus = fusion.bus();
    let ctx = Rc::new_cyclic(|me: &Weak<RefCell<FrameContext>>| {
        RefCell::new(FrameContext {
            scene,
            fusion,
            bus,
            surface: CanvasSurface::new(ctx2d),
            canvas,
            audio_ctx: None,
            file_tap: None,
            microphone: None,
            mic_timer: None,
            sim_timer: None,
            me: me.clone(),
        })
    });
    {
        let mut c = ctx.borrow_mut();
        c.resize();
        c.start_simulation();
    }
    let resize = wire_canvas_resize(&ctx);
    let frame_loop = frame::start_loop(ctx.clone());
    log::info!(
        "[frame] mounted on #{} ({}x{} @{})",
        canvas_id,
        viewport.width,
        viewport.height,
        viewport.device_pixel_ratio
    );
    Ok(Mounted {
        ctx,
        frame_loop,
        resize,
    })
}

/// Handle exported to the host UI. When mounting fails the handle is inert:
/// every method is a no-op and `status()` reports `loading`.
#[wasm_bindgen]
pub struct HeartVisualizer {
    mounted: Option<Mounted>,
}

impl HeartVisualizer {
    fn with_ctx(&self, f: impl FnOnce(&mut FrameContext)) {
        if let Some(m) = &self.mounted {
            frame::with_context(&Rc::downgrade(&m.ctx), f);
        }
    }
}

#[wasm_bindgen]
impl HeartVisualizer {
    #[wasm_bindgen(constructor)]
    pub fn new(canvas_id: Option<String>, options: JsValue) -> HeartVisualizer {
        let canvas_id = canvas_id.unwrap_or_else(|| constants::DEFAULT_CANVAS_ID.to_string());
        let mounted = match mount(&canvas_id, &options) {
            Ok(m) => Some(m),
            Err(e) => {
                log::error!("[frame] cannot mount on #{}: {:?}", canvas_id, e);
                None
            }
        };
        HeartVisualizer { mounted }
    }

    pub fn attach_audio_element(&self, element: web::HtmlMediaElement) {
        self.with_ctx(|c| {
            if let Err(e) = c.attach_element(element) {
                log::warn!("[audio] file analysis unavailable: {:?}", e);
            }
        });
    }

    pub fn detach_audio_element(&self) {
        self.with_ctx(FrameContext::detach_element);
    }

    pub fn set_playing(&self, playing: bool) {
        self.with_ctx(|c| {
            c.scene.set_playing(playing);
            c.fusion.set_playing(playing, frame::now_ms());
            if playing {
                if let Some(a) = &c.audio_ctx {
                    audio::resume(a);
                }
            }
        });
    }

    pub fn set_streamed_mode(&self, streamed: bool) {
        self.with_ctx(|c| c.fusion.set_streamed(streamed, frame::now_ms()));
    }

    pub fn set_playback_position(&self, position_ms: f64) {
        self.with_ctx(|c| c.fusion.set_playback_position(position_ms, frame::now_ms()));
    }

    pub fn set_track_metrics(
        &self,
        tempo: Option<f32>,
        energy: Option<f32>,
        danceability: Option<f32>,
        valence: Option<f32>,
    ) {
        let metrics = TrackMetrics {
            tempo,
            energy,
            danceability,
            valence,
        };
        self.with_ctx(|c| c.fusion.set_track_metrics(Some(metrics)));
    }

    pub fn clear_track_metrics(&self) {
        self.with_ctx(|c| c.fusion.set_track_metrics(None));
    }

    /// Feed one real-time feature object. An unreadable object still counts
    /// as a frame and is replaced by neutral features.
    pub fn push_timbral_features(&self, features: JsValue) {
        #[allow(deprecated)]
        let features = features.into_serde::<TimbralFeatures>().unwrap_or_else(|e| {
            log::debug!("[fusion] unreadable timbral frame: {}", e);
            TimbralFeatures::neutral()
        });
        self.with_ctx(|c| {
            c.fusion.ingest_timbral(&features, frame::now_ms());
        });
    }

    pub fn enable_microphone(&self) {
        let Some(m) = &self.mounted else {
            return;
        };
        let mut preempted = false;
        self.with_ctx(|c| preempted = c.microphone_preempted());
        if preempted {
            log::info!("[mic] not started, live file analysis is active");
            return;
        }
        let me = Rc::downgrade(&m.ctx);
        spawn_local(async move {
            let stream = match audio::request_microphone().await {
                Ok(s) => s,
                Err(e) => {
                    log::warn!("[mic] unavailable, keeping current source: {:?}", e);
                    return;
                }
            };
            frame::with_context(&me, |c| {
                let started = c.audio_context().and_then(|a| {
                    audio::resume(&a);
                    let mic = audio::Microphone::new(&a, stream)?;
                    c.start_microphone(mic)
                });
                if let Err(e) = started {
                    log::warn!("[mic] capture setup failed: {:?}", e);
                }
            });
        });
    }

    pub fn disable_microphone(&self) {
        self.with_ctx(FrameContext::stop_microphone);
    }

    pub fn status(&self) -> String {
        let mut status = heart_core::SourceStatus::Loading;
        self.with_ctx(|c| status = c.fusion.status());
        status.as_str().to_string()
    }

    /// Stop the render loop, clear every source timer and release capture.
    pub fn destroy(&mut self) {
        let Some(m) = self.mounted.take() else {
            return;
        };
        m.frame_loop.cancel();
        if let Some(window) = web::window() {
            _ = window.remove_event_listener_with_callback(
                "resize",
                m.resize.as_ref().unchecked_ref(),
            );
        }
        frame::with_context(&Rc::downgrade(&m.ctx), FrameContext::teardown);
        log::info!("[frame] destroyed");
    }
}
