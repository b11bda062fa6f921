//! Heartbeat envelope: turns the fused control vector into the scale factor
//! applied to the curve, and advances the non-linear phase clock.

use crate::constants::*;
use crate::control::ControlVector;
use serde::Deserialize;

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct PulseParams {
    pub overall_gain: f32,
    pub bass_gain: f32,
    pub beat_attack_base: f32,
    pub beat_attack_bass: f32,
    pub beat_decay_per_phase: f32,
    pub natural_amplitude: f32,
    pub radians_per_phase: f32,
    pub min: f32,
    pub max: f32,
    pub phase_step_fast: f32,
    pub phase_step_hold: f32,
    pub phase_step_normal: f32,
    pub phase_hold_threshold: f32,
    pub phase_audio_gain: f32,
}

impl Default for PulseParams {
    fn default() -> Self {
        Self {
            overall_gain: PULSE_OVERALL_GAIN,
            bass_gain: PULSE_BASS_GAIN,
            beat_attack_base: BEAT_ATTACK_BASE,
            beat_attack_bass: BEAT_ATTACK_BASS,
            beat_decay_per_phase: BEAT_DECAY_PER_PHASE,
            natural_amplitude: NATURAL_AMPLITUDE,
            radians_per_phase: RADIANS_PER_PHASE,
            min: PULSE_MIN,
            max: PULSE_MAX,
            phase_step_fast: PHASE_STEP_FAST,
            phase_step_hold: PHASE_STEP_HOLD,
            phase_step_normal: PHASE_STEP_NORMAL,
            phase_hold_threshold: PHASE_HOLD_THRESHOLD,
            phase_audio_gain: PHASE_AUDIO_GAIN,
        }
    }
}

/// Carried across frames; only reset on full reinitialization.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PulseState {
    /// Phase accumulator, monotonic.
    pub time: f32,
    pub last_beat_time: f32,
    /// Envelope height recorded at the last beat.
    pub beat_peak: f32,
    pub clamped_pulse: f32,
}

impl Default for PulseState {
    fn default() -> Self {
        Self {
            time: 0.0,
            last_beat_time: 0.0,
            beat_peak: 1.0,
            clamped_pulse: 1.0,
        }
    }
}

/// Everything computed for one tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PulseFrame {
    pub pulse: f32,
    pub unclamped: f32,
    pub natural: f32,
    pub beat_envelope: f32,
    /// Phase advance applied after this frame.
    pub phase_step: f32,
}

/// Pure transition `(params, state, control) -> (frame, next state)`.
pub fn step_pulse(
    params: &PulseParams,
    state: &PulseState,
    control: &ControlVector,
) -> (PulseFrame, PulseState) {
    let mut next = *state;
    let angle = state.time * params.radians_per_phase;
    let n = -angle.cos();

    let base = 1.0 + control.overall * params.overall_gain;
    let bass = 1.0 + control.bass * params.bass_gain;
    let natural = 1.0 + n * params.natural_amplitude;

    let beat_envelope = if control.beat {
        next.last_beat_time = state.time;
        next.beat_peak = params.beat_attack_base + control.bass * params.beat_attack_bass;
        next.beat_peak
    } else {
        let since = (state.time - state.last_beat_time).max(0.0);
        (state.beat_peak - since * params.beat_decay_per_phase).max(1.0)
    };

    let unclamped = base * bass * beat_envelope * natural;
    let pulse = if unclamped.is_finite() {
        unclamped.clamp(params.min, params.max)
    } else {
        params.max
    };
    next.clamped_pulse = pulse;

    let rhythm_step = if angle.sin() < 0.0 {
        params.phase_step_fast
    } else if n > params.phase_hold_threshold {
        params.phase_step_hold
    } else {
        params.phase_step_normal
    };
    let phase_step = rhythm_step * (1.0 + control.overall * params.phase_audio_gain);
    next.time = state.time + phase_step;

    (
        PulseFrame {
            pulse,
            unclamped,
            natural,
            beat_envelope,
            phase_step,
        },
        next,
    )
}

#[derive(Clone, Debug, Default)]
pub struct PulseController {
    params: PulseParams,
    state: PulseState,
}

impl PulseController {
    pub fn new(params: PulseParams) -> Self {
        Self {
            params,
            state: PulseState::default(),
        }
    }

    pub fn advance(&mut self, control: &ControlVector) -> PulseFrame {
        let (frame, next) = step_pulse(&self.params, &self.state, control);
        self.state = next;
        frame
    }

    pub fn state(&self) -> &PulseState {
        &self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn silent_input_leaves_only_natural_rhythm() {
        let params = PulseParams::default();
        let (frame, _) = step_pulse(&params, &PulseState::default(), &ControlVector::silent());
        assert!((frame.pulse - frame.natural).abs() < 1e-6);
        assert_eq!(frame.beat_envelope, 1.0);
    }

    #[test]
    fn beat_records_phase_and_peak() {
        let params = PulseParams::default();
        let state = PulseState {
            time: 42.0,
            ..PulseState::default()
        };
        let control = ControlVector::new(1.0, 0.0, 0.0, 0.0, true);
        let (frame, next) = step_pulse(&params, &state, &control);
        assert_eq!(next.last_beat_time, 42.0);
        assert!((frame.beat_envelope - (BEAT_ATTACK_BASE + BEAT_ATTACK_BASS)).abs() < 1e-6);
        assert!(next.time > state.time);
    }

    #[test]
    fn loud_audio_speeds_up_phase() {
        let params = PulseParams::default();
        let s = PulseState::default();
        let (quiet, _) = step_pulse(&params, &s, &ControlVector::silent());
        let (loud, _) = step_pulse(&params, &s, &ControlVector::new(0.0, 0.0, 0.0, 1.0, false));
        assert!(loud.phase_step > quiet.phase_step);
    }
}
