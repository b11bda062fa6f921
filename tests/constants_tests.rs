// Host-side tests for constants and their mathematical relationships.
// The main crate is wasm-only, so the browser constants are included directly.

#![allow(dead_code)]
mod web_constants {
    include!("../src/constants.rs");
}

use heart_core::constants::*;
use heart_core::SourceKind;
use web_constants::*;

#[test]
fn interval_sources_fit_browser_timers() {
    for source in SourceKind::ALL {
        if let Some(ms) = source.cadence().interval_ms() {
            assert!(ms > 0 && ms <= i32::MAX as u32);
            // stale cutoff spans several missed polls
            assert!(TIMBRAL_STALE_MS > 5.0 * ms as f64, "{source}");
        }
    }
}

#[test]
#[allow(clippy::assertions_on_constants)]
fn analyser_sizes_are_valid_fft_lengths() {
    for size in [FILE_FFT_SIZE, MIC_FFT_SIZE] {
        assert!(size.is_power_of_two());
        assert!((32..=32768).contains(&size));
    }
    assert!((0.0..1.0).contains(&FILE_SMOOTHING));
    assert!((0.0..1.0).contains(&MIC_SMOOTHING));
    assert!(MIC_MIN_DECIBELS < MIC_MAX_DECIBELS);
}

#[test]
#[allow(clippy::assertions_on_constants)]
fn band_split_leaves_room_for_treble() {
    assert!(BASS_BAND_FRACTION > 0.0);
    assert!(BASS_BAND_FRACTION + MID_BAND_FRACTION < 1.0);
    assert!(BEAT_THRESHOLD_RATIO > 1.0);
    assert!(BEAT_DEBOUNCE_MS > 0.0);
}

#[test]
#[allow(clippy::assertions_on_constants)]
fn motion_constants_keep_particles_stable() {
    // damping strictly below one so momentum always decays
    assert!(FORCE_MIN + FORCE_SPAN < 1.0);
    assert!(TRAIL_RELAX > 0.0 && TRAIL_RELAX <= 1.0);
    assert!(RESEED_PROBABILITY + FLIP_PROBABILITY < 1.0);
    assert!(TRAIL_LEN_COMPACT < TRAIL_LEN);
    assert!(CURVE_ANGLE_STEP_COMPACT > CURVE_ANGLE_STEP);
}

#[test]
#[allow(clippy::assertions_on_constants)]
fn pulse_range_brackets_the_natural_rhythm() {
    assert!(PULSE_MIN < 1.0 - NATURAL_AMPLITUDE);
    assert!(PULSE_MAX > 1.0 + NATURAL_AMPLITUDE);
    assert!(BEAT_ATTACK_BASE > 1.0);
    assert!(ALPHA_IDLE < ALPHA_MAX && ALPHA_MAX <= 1.0);
    assert!(FADE_ALPHA_BASE < FADE_ALPHA_MAX);
    assert!(IDLE_OVERALL > 0.0);
}
