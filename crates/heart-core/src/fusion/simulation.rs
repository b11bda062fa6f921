//! Sinusoidal stand-in for real analysis.
//!
//! Band levels are slow sinusoids whose floor and swing grow with the track's
//! energy, danceability and valence; their rates follow the tempo, sped up
//! for danceable tracks. A faster
//! sinusoid at the beat rate flags a beat each time it rises through a
//! threshold. With no metrics the same model runs on fixed defaults, so the
//! animation never goes flat.

use crate::constants::*;
use crate::control::ControlVector;
use serde::Deserialize;
use std::f64::consts::TAU;

/// Descriptive metrics of the playing item; every field is optional.
#[derive(Clone, Copy, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct TrackMetrics {
    pub tempo: Option<f32>,
    pub energy: Option<f32>,
    pub danceability: Option<f32>,
    pub valence: Option<f32>,
}

/// Metrics with defaults filled in and values sanitized.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ResolvedMetrics {
    pub tempo: f32,
    pub energy: f32,
    pub danceability: f32,
    pub valence: f32,
}

impl Default for ResolvedMetrics {
    fn default() -> Self {
        TrackMetrics::default().resolve()
    }
}

fn level_or(v: Option<f32>, default: f32) -> f32 {
    match v {
        Some(x) if x.is_finite() => x.clamp(0.0, 1.0),
        _ => default,
    }
}

impl TrackMetrics {
    /// True when at least one metric is present.
    pub fn is_known(&self) -> bool {
        self.tempo.is_some()
            || self.energy.is_some()
            || self.danceability.is_some()
            || self.valence.is_some()
    }

    pub fn resolve(&self) -> ResolvedMetrics {
        ResolvedMetrics {
            tempo: match self.tempo {
                Some(t) if t.is_finite() && t > 0.0 => t.clamp(40.0, 240.0),
                _ => DEFAULT_TEMPO_BPM,
            },
            energy: level_or(self.energy, DEFAULT_ENERGY),
            danceability: level_or(self.danceability, DEFAULT_DANCEABILITY),
            valence: level_or(self.valence, DEFAULT_VALENCE),
        }
    }
}

#[inline]
fn wave(t: f64, hz: f64, phase: f64) -> f32 {
    (0.5 + 0.5 * (TAU * hz * t + phase).sin()) as f32
}

/// Multiplier on the band wave rates: danceable tracks swing faster.
#[inline]
pub fn band_rate_scale(m: &ResolvedMetrics) -> f64 {
    0.75 + 0.5 * m.danceability as f64
}

/// Band levels for metrics `m` at playback time `t_sec`; no beat state.
///
/// The floors grow faster with the metrics than the swings do, so a richer
/// track reads hotter than a plainer one at any instant even though their
/// waves run at different rates.
pub fn simulated_levels(m: &ResolvedMetrics, t_sec: f64) -> ControlVector {
    let band_hz = m.tempo as f64 / 60.0 * band_rate_scale(m);
    let w_bass = wave(t_sec, band_hz * 0.5, 0.0);
    let w_mid = wave(t_sec, band_hz * 0.25, 1.0);
    let w_treble = wave(t_sec, band_hz * 0.75, 2.0);

    let bass = 0.1 + 0.35 * m.energy + (0.15 + 0.15 * m.danceability) * m.energy * w_bass;
    let mid = 0.1 + 0.3 * m.valence + 0.1 * (m.energy + m.valence) * w_mid;
    let treble = 0.05 + 0.25 * m.danceability + 0.15 * m.danceability * m.energy * w_treble;
    let overall = 0.45 * bass + 0.35 * mid + 0.2 * treble;
    ControlVector::new(bass, mid, treble, overall, false)
}

#[derive(Clone, Debug, Default)]
pub struct Simulator {
    prev_beat_wave: Option<f32>,
}

impl Simulator {
    pub fn sample(&mut self, metrics: &ResolvedMetrics, t_sec: f64) -> ControlVector {
        let mut v = simulated_levels(metrics, t_sec);
        let beat_hz = metrics.tempo as f64 / 60.0;
        let beat_wave = (TAU * beat_hz * t_sec).sin() as f32;
        let threshold = SIM_BEAT_THRESHOLD - 0.2 * (metrics.danceability - 0.5);
        v.beat = matches!(self.prev_beat_wave, Some(prev) if prev <= threshold)
            && beat_wave > threshold;
        self.prev_beat_wave = Some(beat_wave);
        v
    }

    pub fn reset(&mut self) {
        self.prev_beat_wave = None;
    }
}
