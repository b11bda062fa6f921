use crate::constants::*;
use heart_core::{TimbralExtractor, TimbralFeatures};
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys as web;

pub fn create_context() -> anyhow::Result<web::AudioContext> {
    let ctx = web::AudioContext::new().map_err(|e| anyhow::anyhow!("{:?}", e))?;
    log::info!("[audio] context created at {} Hz", ctx.sample_rate());
    Ok(ctx)
}

pub fn resume(ctx: &web::AudioContext) {
    if ctx.state() == web::AudioContextState::Suspended {
        _ = ctx.resume();
    }
}

pub fn create_analyser(
    ctx: &web::AudioContext,
    fft_size: u32,
    smoothing: f64,
) -> anyhow::Result<web::AnalyserNode> {
    let analyser = web::AnalyserNode::new(ctx).map_err(|e| anyhow::anyhow!("{:?}", e))?;
    analyser.set_fft_size(fft_size);
    analyser.set_smoothing_time_constant(smoothing);
    Ok(analyser)
}

/// Frequency tap on a media element.
///
/// The element's source node is created once (browsers refuse a second one)
/// and stays wired to the destination so playback routing is unchanged;
/// only the analyser branch is connected and disconnected.
pub struct FileTap {
    element: web::HtmlMediaElement,
    source: web::MediaElementAudioSourceNode,
    analyser: web::AnalyserNode,
    bins: Vec<u8>,
    connected: bool,
}

impl FileTap {
    pub fn new(ctx: &web::AudioContext, element: web::HtmlMediaElement) -> anyhow::Result<Self> {
        let source = ctx
            .create_media_element_source(&element)
            .map_err(|e| anyhow::anyhow!("{:?}", e))?;
        source
            .connect_with_audio_node(&ctx.destination())
            .map_err(|e| anyhow::anyhow!("{:?}", e))?;
        let analyser = create_analyser(ctx, FILE_FFT_SIZE, FILE_SMOOTHING)?;
        let bins = vec![0u8; analyser.frequency_bin_count() as usize];
        let mut tap = Self {
            element,
            source,
            analyser,
            bins,
            connected: false,
        };
        tap.connect()?;
        Ok(tap)
    }

    pub fn is_for(&self, element: &web::HtmlMediaElement) -> bool {
        js_sys::Object::is(self.element.as_ref(), element.as_ref())
    }

    pub fn connect(&mut self) -> anyhow::Result<()> {
        if !self.connected {
            self.source
                .connect_with_audio_node(&self.analyser)
                .map_err(|e| anyhow::anyhow!("{:?}", e))?;
            self.connected = true;
            log::info!("[audio] file analyser connected ({} bins)", self.bins.len());
        }
        Ok(())
    }

    pub fn disconnect(&mut self) {
        if self.connected {
            if let Err(e) = self.source.disconnect_with_audio_node(&self.analyser) {
                log::warn!("[audio] analyser disconnect failed: {:?}", e);
            }
            self.connected = false;
            log::info!("[audio] file analyser disconnected");
        }
    }

    pub fn read_bins(&mut self) -> &[u8] {
        self.analyser.get_byte_frequency_data(&mut self.bins);
        &self.bins
    }
}

pub async fn request_microphone() -> anyhow::Result<web::MediaStream> {
    let window = web::window().ok_or_else(|| anyhow::anyhow!("no window"))?;
    let devices = window
        .navigator()
        .media_devices()
        .map_err(|e| anyhow::anyhow!("mediaDevices unavailable: {:?}", e))?;
    let constraints = web::MediaStreamConstraints::new();
    constraints.set_audio(&JsValue::TRUE);
    let promise = devices
        .get_user_media_with_constraints(&constraints)
        .map_err(|e| anyhow::anyhow!("{:?}", e))?;
    let stream = JsFuture::from(promise)
        .await
        .map_err(|e| anyhow::anyhow!("capture denied: {:?}", e))?;
    stream
        .dyn_into::<web::MediaStream>()
        .map_err(|e| anyhow::anyhow!("{:?}", e))
}

/// Live capture feeding the timbral extractor. Not routed to the speakers.
pub struct Microphone {
    stream: web::MediaStream,
    source: web::MediaStreamAudioSourceNode,
    analyser: web::AnalyserNode,
    spectrum: Vec<f32>,
    waveform: Vec<f32>,
    extractor: TimbralExtractor,
}

impl Microphone {
    pub fn new(ctx: &web::AudioContext, stream: web::MediaStream) -> anyhow::Result<Self> {
        let source = ctx
            .create_media_stream_source(&stream)
            .map_err(|e| anyhow::anyhow!("{:?}", e))?;
        let analyser = create_analyser(ctx, MIC_FFT_SIZE, MIC_SMOOTHING)?;
        analyser.set_min_decibels(MIC_MIN_DECIBELS);
        analyser.set_max_decibels(MIC_MAX_DECIBELS);
        source
            .connect_with_audio_node(&analyser)
            .map_err(|e| anyhow::anyhow!("{:?}", e))?;
        let sample_rate = match ctx.sample_rate() {
            r if r > 0.0 => r,
            _ => FALLBACK_SAMPLE_RATE,
        };
        Ok(Self {
            spectrum: vec![0.0; analyser.frequency_bin_count() as usize],
            waveform: vec![0.0; analyser.fft_size() as usize],
            extractor: TimbralExtractor::new(sample_rate),
            stream,
            source,
            analyser,
        })
    }

    pub fn sample(&mut self) -> TimbralFeatures {
        self.analyser.get_float_frequency_data(&mut self.spectrum);
        self.analyser.get_float_time_domain_data(&mut self.waveform);
        self.extractor.extract(&self.spectrum, &self.waveform)
    }
}

impl Drop for Microphone {
    fn drop(&mut self) {
        self.source.disconnect().ok();
        for track in self.stream.get_tracks().iter() {
            if let Ok(track) = track.dyn_into::<web::MediaStreamTrack>() {
                track.stop();
            }
        }
        log::info!("[mic] capture stopped");
    }
}
