//! Real-time timbral features: the feature set itself, its mapping onto the
//! control vector, and an extractor that derives it from analyser buffers.

use crate::constants::*;
use crate::control::{unit, ControlVector};
use serde::{Deserialize, Deserializer};

/// Feature object delivered every ~50 ms by a live analyzer.
///
/// Field names match the camelCase keys hosts send. `loudness` accepts either
/// a bare number or an object carrying a `total`.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TimbralFeatures {
    pub rms: f32,
    pub spectral_centroid: f32,
    pub spectral_rolloff: f32,
    pub spectral_flux: f32,
    pub spectral_spread: f32,
    pub spectral_kurtosis: f32,
    #[serde(deserialize_with = "loudness_total")]
    pub loudness: f32,
    pub mfcc: Vec<f32>,
    pub chroma: Vec<f32>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum LoudnessRepr {
    Total(f32),
    Detailed { total: f32 },
}

fn loudness_total<'de, D: Deserializer<'de>>(d: D) -> Result<f32, D::Error> {
    Ok(match Option::<LoudnessRepr>::deserialize(d)? {
        Some(LoudnessRepr::Total(v)) | Some(LoudnessRepr::Detailed { total: v }) => v,
        None => 0.0,
    })
}

impl TimbralFeatures {
    /// Quiet, featureless frame used in place of a malformed one.
    pub fn neutral() -> Self {
        Self::default()
    }

    pub fn is_well_formed(&self) -> bool {
        let scalars = [
            self.rms,
            self.spectral_centroid,
            self.spectral_rolloff,
            self.spectral_flux,
            self.spectral_spread,
            self.spectral_kurtosis,
            self.loudness,
        ];
        scalars.iter().all(|v| v.is_finite())
            && self.rms >= 0.0
            && self.loudness >= 0.0
            && self.spectral_rolloff >= 0.0
            && self.spectral_centroid >= 0.0
            && self.mfcc.iter().chain(&self.chroma).all(|v| v.is_finite())
    }
}

/// Maps feature frames to control vectors. Keeps the previous energy so a
/// sustained loud passage beats once on its rising edge, not every frame.
#[derive(Clone, Debug, Default)]
pub struct TimbralMapper {
    prev_energy: f32,
}

impl TimbralMapper {
    pub fn map(&mut self, features: &TimbralFeatures) -> ControlVector {
        if !features.is_well_formed() {
            log::debug!("[fusion] malformed timbral frame, substituting neutral features");
            return self.map_checked(&TimbralFeatures::neutral());
        }
        self.map_checked(features)
    }

    fn map_checked(&mut self, f: &TimbralFeatures) -> ControlVector {
        let overall = unit(f.loudness / LOUDNESS_FULL_SCALE);
        let energy = unit(f.rms / RMS_FULL_SCALE);
        let treble = unit(f.spectral_rolloff / ROLLOFF_FULL_SCALE_HZ);
        let bass = unit(energy * (1.2 - treble));
        let mid = unit((energy + overall) * 0.5);

        let energy_onset =
            energy > ENERGY_BEAT_THRESHOLD && self.prev_energy <= ENERGY_BEAT_THRESHOLD;
        let beat = f.spectral_flux > FLUX_BEAT_THRESHOLD || energy_onset;
        self.prev_energy = energy;

        ControlVector::new(bass, mid, treble, overall, beat)
    }

    pub fn reset(&mut self) {
        self.prev_energy = 0.0;
    }
}

const BARK_BANDS: usize = 24;
const CHROMA_BINS: usize = 12;
const CHROMA_MIN_HZ: f32 = 27.5;

#[inline]
fn bark(hz: f32) -> f32 {
    13.0 * (0.00076 * hz).atan() + 3.5 * (hz / 7500.0).powi(2).atan()
}

/// Derives [`TimbralFeatures`] from an analyser's float frequency data (dB)
/// and time-domain samples. MFCCs are left empty.
#[derive(Clone, Debug)]
pub struct TimbralExtractor {
    sample_rate: f32,
    magnitudes: Vec<f32>,
    previous: Vec<f32>,
}

impl TimbralExtractor {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            sample_rate,
            magnitudes: Vec::new(),
            previous: Vec::new(),
        }
    }

    pub fn extract(&mut self, spectrum_db: &[f32], waveform: &[f32]) -> TimbralFeatures {
        let bins = spectrum_db.len();
        if bins == 0 {
            return TimbralFeatures::neutral();
        }
        self.magnitudes.clear();
        self.magnitudes.extend(spectrum_db.iter().map(|&db| {
            if db.is_finite() {
                10f32.powf(db / 20.0)
            } else {
                0.0
            }
        }));
        let mags = &self.magnitudes;
        let hz_per_bin = self.sample_rate * 0.5 / bins as f32;

        let rms = if waveform.is_empty() {
            0.0
        } else {
            (waveform.iter().map(|s| s * s).sum::<f32>() / waveform.len() as f32).sqrt()
        };

        let total: f32 = mags.iter().sum();
        let (centroid, spread, kurtosis) = if total > 0.0 {
            let centroid = mags.iter().enumerate().map(|(i, m)| i as f32 * m).sum::<f32>() / total;
            let var = mags
                .iter()
                .enumerate()
                .map(|(i, m)| (i as f32 - centroid).powi(2) * m)
                .sum::<f32>()
                / total;
            let spread = var.sqrt();
            let kurtosis = if var > 0.0 {
                mags.iter()
                    .enumerate()
                    .map(|(i, m)| (i as f32 - centroid).powi(4) * m)
                    .sum::<f32>()
                    / total
                    / (var * var)
            } else {
                0.0
            };
            (centroid, spread, kurtosis)
        } else {
            (0.0, 0.0, 0.0)
        };

        let rolloff = {
            let limit = total * ROLLOFF_ENERGY_FRACTION;
            let mut acc = 0.0;
            let mut idx = 0;
            for (i, m) in mags.iter().enumerate() {
                acc += m;
                idx = i;
                if acc >= limit {
                    break;
                }
            }
            if total > 0.0 {
                idx as f32 * hz_per_bin
            } else {
                0.0
            }
        };

        let flux: f32 = if self.previous.len() == bins {
            let norm = |v: &[f32]| v.iter().map(|x| x * x).sum::<f32>().sqrt().max(1e-9);
            let (a, b) = (norm(mags.as_slice()), norm(self.previous.as_slice()));
            mags.iter()
                .zip(&self.previous)
                .map(|(m, p)| (m / a - p / b).max(0.0))
                .sum()
        } else {
            0.0
        };

        let mut specific = [0.0f32; BARK_BANDS];
        let mut chroma = vec![0.0f32; CHROMA_BINS];
        for (i, m) in mags.iter().enumerate() {
            let hz = i as f32 * hz_per_bin;
            let band = (bark(hz) as usize).min(BARK_BANDS - 1);
            specific[band] += m * m;
            if hz >= CHROMA_MIN_HZ {
                let pitch = (12.0 * (hz / 440.0).log2()).round() as i32 + 9;
                chroma[pitch.rem_euclid(CHROMA_BINS as i32) as usize] += m * m;
            }
        }
        let loudness: f32 = specific.iter().map(|e| e.powf(0.23)).sum();
        let peak = chroma.iter().cloned().fold(0.0f32, f32::max);
        if peak > 0.0 {
            chroma.iter_mut().for_each(|c| *c /= peak);
        }

        std::mem::swap(&mut self.previous, &mut self.magnitudes);

        TimbralFeatures {
            rms,
            spectral_centroid: centroid,
            spectral_rolloff: rolloff,
            spectral_flux: flux,
            spectral_spread: spread,
            spectral_kurtosis: kurtosis,
            loudness,
            mfcc: Vec::new(),
            chroma,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_frame_maps_to_neutral() {
        let mut mapper = TimbralMapper::default();
        let bad = TimbralFeatures {
            rms: f32::NAN,
            loudness: 25.0,
            ..TimbralFeatures::default()
        };
        let v = mapper.map(&bad);
        assert_eq!(v, TimbralMapper::default().map(&TimbralFeatures::neutral()));
        assert_eq!(v.overall, 0.0);
    }

    #[test]
    fn high_flux_flags_a_beat() {
        let mut mapper = TimbralMapper::default();
        let f = TimbralFeatures {
            rms: 0.1,
            loudness: 12.0,
            spectral_flux: 0.8,
            ..TimbralFeatures::default()
        };
        assert!(mapper.map(&f).beat);
    }

    #[test]
    fn sustained_energy_beats_only_on_rising_edge() {
        let mut mapper = TimbralMapper::default();
        let loud = TimbralFeatures {
            rms: RMS_FULL_SCALE,
            loudness: 20.0,
            ..TimbralFeatures::default()
        };
        assert!(mapper.map(&loud).beat);
        assert!(!mapper.map(&loud).beat);
    }

    #[test]
    fn extractor_tracks_a_pure_tone() {
        let bins = 256;
        let sample_rate = 48_000.0;
        let mut spectrum = vec![-120.0f32; bins];
        // 440 Hz lands in bin 440 / (24000 / 256) ~= 4.7
        spectrum[5] = 0.0;
        let waveform: Vec<f32> = (0..512).map(|i| (i as f32 * 0.0576).sin() * 0.5).collect();
        let mut ex = TimbralExtractor::new(sample_rate);
        let f = ex.extract(&spectrum, &waveform);
        assert!((f.rms - 0.5 / 2f32.sqrt()).abs() < 0.02);
        assert!((f.spectral_centroid - 5.0).abs() < 0.5);
        assert!(f.loudness > 0.0);
        assert_eq!(f.chroma.len(), 12);
        assert!(f.is_well_formed());
        // identical second frame has no positive flux
        let g = ex.extract(&spectrum, &waveform);
        assert!(g.spectral_flux < 1e-4);
    }
}
