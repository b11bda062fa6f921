//! Source selection and normalisation.
//!
//! `SignalFusion` tracks which upstream producers are currently available,
//! picks exactly one by priority, and lets only that one write the shared
//! [`ControlBus`]. Producers call the `ingest_*`/`simulate` methods on their
//! own cadence; the render loop only ever reads the bus.

pub mod clock;
pub mod simulation;
pub mod spectral;
pub mod timbral;

use crate::constants::{LIVE_ANALYZER_MAX_MS, TIMBRAL_STALE_MS};
use crate::control::{ControlBus, ControlVector, SourceKind, SourceStatus};
use clock::{AnalyzerBudget, PlaybackClock};
use simulation::{ResolvedMetrics, Simulator, TrackMetrics};
use spectral::SpectralAnalyzer;
use std::rc::Rc;
use timbral::{TimbralFeatures, TimbralMapper};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SourceTransition {
    pub from: SourceKind,
    pub to: SourceKind,
}

pub struct SignalFusion {
    bus: Rc<ControlBus>,
    active: SourceKind,
    clock: PlaybackClock,
    analyzer_limit_ms: f64,

    spectral: SpectralAnalyzer,
    spectral_tap: Option<AnalyzerBudget>,

    timbral: TimbralMapper,
    timbral_seen_ms: Option<f64>,
    microphone: Option<AnalyzerBudget>,

    metrics: Option<TrackMetrics>,
    simulator: Simulator,
}

impl SignalFusion {
    pub fn new(now_ms: f64) -> Self {
        Self::with_analyzer_limit(now_ms, LIVE_ANALYZER_MAX_MS)
    }

    pub fn with_analyzer_limit(now_ms: f64, analyzer_limit_ms: f64) -> Self {
        Self {
            bus: Rc::new(ControlBus::new(SourceKind::TimeSimulation)),
            active: SourceKind::TimeSimulation,
            clock: PlaybackClock::new(now_ms),
            analyzer_limit_ms,
            spectral: SpectralAnalyzer::default(),
            spectral_tap: None,
            timbral: TimbralMapper::default(),
            timbral_seen_ms: None,
            microphone: None,
            metrics: None,
            simulator: Simulator::default(),
        }
    }

    /// Shared read side for the render loop.
    pub fn bus(&self) -> Rc<ControlBus> {
        Rc::clone(&self.bus)
    }

    pub fn active(&self) -> SourceKind {
        self.active
    }

    pub fn status(&self) -> SourceStatus {
        self.active.status()
    }

    pub fn latest(&self) -> ControlVector {
        self.bus.latest()
    }

    // ---- availability inputs ----

    pub fn attach_live_spectral(&mut self, now_ms: f64) {
        self.spectral.reset();
        self.spectral_tap = Some(AnalyzerBudget::new(now_ms, self.analyzer_limit_ms));
    }

    pub fn detach_live_spectral(&mut self) {
        self.spectral_tap = None;
        self.spectral.reset();
    }

    pub fn live_spectral_attached(&self) -> bool {
        self.spectral_tap.is_some()
    }

    /// Start the capture budget. Refused while a higher-priority source is
    /// available, since nothing the microphone produces could be published.
    pub fn attach_microphone(&mut self, now_ms: f64) -> bool {
        if self.outranked(SourceKind::Timbral, now_ms) {
            log::info!("[fusion] microphone refused, {} is active", self.select(now_ms));
            return false;
        }
        self.microphone = Some(AnalyzerBudget::new(now_ms, self.analyzer_limit_ms));
        true
    }

    pub fn detach_microphone(&mut self) {
        self.microphone = None;
    }

    pub fn microphone_attached(&self) -> bool {
        self.microphone.is_some()
    }

    pub fn set_streamed(&mut self, streamed: bool, now_ms: f64) {
        self.clock.set_streamed(streamed, now_ms);
    }

    pub fn set_playing(&mut self, playing: bool, now_ms: f64) {
        self.clock.set_playing(playing, now_ms);
    }

    pub fn set_playback_position(&mut self, position_ms: f64, now_ms: f64) {
        self.clock.set_position(position_ms, now_ms);
    }

    /// `None` or an all-absent object clears the metrics.
    pub fn set_track_metrics(&mut self, metrics: Option<TrackMetrics>) {
        let metrics = metrics.filter(TrackMetrics::is_known);
        if metrics != self.metrics {
            log::info!(
                "[fusion] track metrics {}",
                if metrics.is_some() { "updated" } else { "cleared" }
            );
        }
        self.metrics = metrics;
    }

    fn timbral_fresh(&self, now_ms: f64) -> bool {
        self.timbral_seen_ms
            .map_or(false, |seen| now_ms - seen <= TIMBRAL_STALE_MS)
    }

    pub fn is_available(&self, source: SourceKind, now_ms: f64) -> bool {
        match source {
            SourceKind::LiveSpectral => self.spectral_tap.is_some() && !self.clock.is_streamed(),
            SourceKind::Timbral => self.timbral_fresh(now_ms),
            SourceKind::TrackSimulation => self.metrics.is_some(),
            SourceKind::TimeSimulation => true,
        }
    }

    /// True when a source ranked above `source` is available.
    pub fn outranked(&self, source: SourceKind, now_ms: f64) -> bool {
        self.select(now_ms) < source
    }

    /// Highest-priority available source.
    pub fn select(&self, now_ms: f64) -> SourceKind {
        SourceKind::ALL
            .into_iter()
            .find(|s| self.is_available(*s, now_ms))
            .unwrap_or(SourceKind::TimeSimulation)
    }

    fn expire_analyzers(&mut self, now_ms: f64) {
        if self.spectral_tap.map_or(false, |b| b.expired(now_ms)) {
            log::warn!("[fusion] live spectral analyzer hit its time limit, stopping");
            self.detach_live_spectral();
        }
        if self.microphone.map_or(false, |b| b.expired(now_ms)) {
            log::warn!("[fusion] microphone analyzer hit its time limit, stopping");
            self.microphone = None;
            self.timbral_seen_ms = None;
        }
    }

    /// Re-evaluate availability. On a change the departing source's state is
    /// reset and the bus is handed to the new owner, so any late write from
    /// the old producer is dropped. The caller tears down the old producer.
    pub fn reselect(&mut self, now_ms: f64) -> Option<SourceTransition> {
        self.expire_analyzers(now_ms);
        let next = self.select(now_ms);
        if next == self.active {
            return None;
        }
        let from = self.active;
        match from {
            SourceKind::LiveSpectral => self.spectral.reset(),
            SourceKind::Timbral => self.timbral.reset(),
            SourceKind::TrackSimulation | SourceKind::TimeSimulation => self.simulator.reset(),
        }
        self.active = next;
        self.bus.hand_over(next);
        log::info!("[fusion] source {} -> {} (status {})", from, next, next.status());
        Some(SourceTransition { from, to: next })
    }

    // ---- producers ----

    /// Byte spectrum from the file tap. Analysed only while live spectral
    /// owns the bus.
    pub fn ingest_spectrum(&mut self, bins: &[u8], now_ms: f64) -> bool {
        if self.active != SourceKind::LiveSpectral
            || !self.is_available(SourceKind::LiveSpectral, now_ms)
        {
            return false;
        }
        let v = self.spectral.analyze(bins, now_ms);
        self.bus.publish(SourceKind::LiveSpectral, v, now_ms)
    }

    /// Timbral frame from the host or the microphone. Always refreshes
    /// availability; publishes only while timbral owns the bus.
    pub fn ingest_timbral(&mut self, features: &TimbralFeatures, now_ms: f64) -> bool {
        self.timbral_seen_ms = Some(now_ms);
        if self.active != SourceKind::Timbral {
            return false;
        }
        let v = self.timbral.map(features);
        self.bus.publish(SourceKind::Timbral, v, now_ms)
    }

    /// One tick of whichever simulation is active.
    pub fn simulate(&mut self, now_ms: f64) -> bool {
        let metrics = match self.active {
            SourceKind::TrackSimulation => self
                .metrics
                .map(|m| m.resolve())
                .unwrap_or_default(),
            SourceKind::TimeSimulation => ResolvedMetrics::default(),
            SourceKind::LiveSpectral | SourceKind::Timbral => return false,
        };
        let t = self.clock.phase_sec(now_ms);
        let v = self.simulator.sample(&metrics, t);
        self.bus.publish(self.active, v, now_ms)
    }
}
