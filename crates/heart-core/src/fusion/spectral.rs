//! Live frequency-domain analysis of a locally loaded file.
//!
//! Bins (byte magnitudes as delivered by an analyser node) are partitioned
//! into bass (first 10%), mid (next 30%) and treble (remaining 60%). Beats
//! are flagged when the overall level jumps above 1.5x its rolling average,
//! debounced to at most one every 200 ms.

use crate::constants::{
    BASS_BAND_FRACTION, BEAT_DEBOUNCE_MS, BEAT_HISTORY_LEN, BEAT_THRESHOLD_RATIO,
    MID_BAND_FRACTION,
};
use crate::control::ControlVector;
use std::collections::VecDeque;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct BandLevels {
    pub bass: f32,
    pub mid: f32,
    pub treble: f32,
    pub overall: f32,
}

/// Bin index ranges `(bass_end, mid_end)` for `len` bins.
pub fn band_edges(len: usize) -> (usize, usize) {
    if len == 0 {
        return (0, 0);
    }
    let bass_end = ((len as f32 * BASS_BAND_FRACTION).round() as usize).clamp(1, len);
    let mid_end = (bass_end + (len as f32 * MID_BAND_FRACTION).round() as usize).min(len);
    (bass_end, mid_end)
}

fn mean_unit(bins: &[u8]) -> f32 {
    if bins.is_empty() {
        return 0.0;
    }
    let sum: u32 = bins.iter().map(|&b| b as u32).sum();
    sum as f32 / (bins.len() as f32 * 255.0)
}

pub fn band_levels(bins: &[u8]) -> BandLevels {
    let (bass_end, mid_end) = band_edges(bins.len());
    BandLevels {
        bass: mean_unit(&bins[..bass_end]),
        mid: mean_unit(&bins[bass_end..mid_end]),
        treble: mean_unit(&bins[mid_end..]),
        overall: mean_unit(bins),
    }
}

/// Rolling-average beat detector with a wall-clock debounce.
#[derive(Clone, Debug)]
pub struct BeatDetector {
    history: VecDeque<f32>,
    capacity: usize,
    ratio: f32,
    debounce_ms: f64,
    last_beat_ms: Option<f64>,
}

impl Default for BeatDetector {
    fn default() -> Self {
        Self::new(BEAT_HISTORY_LEN, BEAT_THRESHOLD_RATIO, BEAT_DEBOUNCE_MS)
    }
}

impl BeatDetector {
    pub fn new(capacity: usize, ratio: f32, debounce_ms: f64) -> Self {
        Self {
            history: VecDeque::with_capacity(capacity.max(1)),
            capacity: capacity.max(1),
            ratio,
            debounce_ms,
            last_beat_ms: None,
        }
    }

    pub fn detect(&mut self, overall: f32, now_ms: f64) -> bool {
        if self.history.len() == self.capacity {
            self.history.pop_front();
        }
        self.history.push_back(overall);
        let average = self.history.iter().sum::<f32>() / self.history.len() as f32;

        let debounced = self
            .last_beat_ms
            .map_or(true, |last| now_ms - last >= self.debounce_ms);
        if overall > average * self.ratio && debounced {
            self.last_beat_ms = Some(now_ms);
            true
        } else {
            false
        }
    }

    pub fn reset(&mut self) {
        self.history.clear();
        self.last_beat_ms = None;
    }
}

#[derive(Clone, Debug, Default)]
pub struct SpectralAnalyzer {
    detector: BeatDetector,
}

impl SpectralAnalyzer {
    pub fn analyze(&mut self, bins: &[u8], now_ms: f64) -> ControlVector {
        let levels = band_levels(bins);
        let beat = self.detector.detect(levels.overall, now_ms);
        ControlVector::new(levels.bass, levels.mid, levels.treble, levels.overall, beat)
    }

    pub fn reset(&mut self) {
        self.detector.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn band_edges_follow_ten_thirty_sixty_split() {
        assert_eq!(band_edges(128), (13, 51));
        assert_eq!(band_edges(1024), (102, 409));
        assert_eq!(band_edges(4), (1, 2));
        assert_eq!(band_edges(0), (0, 0));
    }

    #[test]
    fn band_levels_average_each_partition() {
        let mut bins = vec![0u8; 100];
        bins[..10].fill(255);
        let levels = band_levels(&bins);
        assert_eq!(levels.bass, 1.0);
        assert_eq!(levels.mid, 0.0);
        assert_eq!(levels.treble, 0.0);
        assert!((levels.overall - 0.1).abs() < 1e-6);
    }

    #[test]
    fn steady_level_never_beats() {
        let mut det = BeatDetector::default();
        for i in 0..50 {
            assert!(!det.detect(0.4, i as f64 * 16.0));
        }
    }
}
