//! Runtime configuration for the heart scene.
//!
//! Every field defaults to the matching value in [`crate::constants`], so a
//! host may pass a partial options object and only override what it needs.

use crate::constants::*;
use crate::error::ConfigError;
use crate::pulse::PulseParams;
use serde::Deserialize;
use std::f32::consts::TAU;

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct HeartConfig {
    /// Radians between consecutive samples on one tier.
    pub angle_step: f32,
    /// `(sx, sy)` per tier, outer first.
    pub tiers: Vec<[f32; 2]>,
    pub trail_len: usize,
    pub trail_relax: f32,
    pub arrival_distance: f32,
    pub reseed_probability: f32,
    pub flip_probability: f32,
    pub speed_min: f32,
    pub speed_span: f32,
    pub force_min: f32,
    pub force_span: f32,
    pub pulse: PulseParams,
    pub fade_alpha_base: f32,
    pub fade_alpha_overall: f32,
    pub fade_alpha_max: f32,
    /// Fixed RNG seed; `None` draws from entropy.
    pub seed: Option<u64>,
}

impl Default for HeartConfig {
    fn default() -> Self {
        Self {
            angle_step: CURVE_ANGLE_STEP,
            tiers: TIER_SCALES.to_vec(),
            trail_len: TRAIL_LEN,
            trail_relax: TRAIL_RELAX,
            arrival_distance: ARRIVAL_DISTANCE,
            reseed_probability: RESEED_PROBABILITY,
            flip_probability: FLIP_PROBABILITY,
            speed_min: SPEED_MIN,
            speed_span: SPEED_SPAN,
            force_min: FORCE_MIN,
            force_span: FORCE_SPAN,
            pulse: PulseParams::default(),
            fade_alpha_base: FADE_ALPHA_BASE,
            fade_alpha_overall: FADE_ALPHA_OVERALL,
            fade_alpha_max: FADE_ALPHA_MAX,
            seed: None,
        }
    }
}

impl HeartConfig {
    /// Low-density variant for narrow screens: fewer curve samples, shorter trails.
    pub fn compact() -> Self {
        Self {
            angle_step: CURVE_ANGLE_STEP_COMPACT,
            trail_len: TRAIL_LEN_COMPACT,
            ..Self::default()
        }
    }

    /// Pick the variant for a viewport width in CSS pixels.
    pub fn for_viewport_width(width: f64) -> Self {
        if width < COMPACT_VIEWPORT_WIDTH {
            Self::compact()
        } else {
            Self::default()
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.angle_step > 0.0 && self.angle_step < TAU) {
            return Err(ConfigError::AngleStep(self.angle_step));
        }
        if self.tiers.is_empty() {
            return Err(ConfigError::NoTiers);
        }
        if self.trail_len == 0 {
            return Err(ConfigError::EmptyTrail);
        }
        check_range("trail_relax", self.trail_relax, 0.0, 1.0)?;
        check_range("reseed_probability", self.reseed_probability, 0.0, 1.0)?;
        check_range("flip_probability", self.flip_probability, 0.0, 1.0)?;
        check_range("arrival_distance", self.arrival_distance, 0.0, f32::MAX)?;
        check_range("speed_min", self.speed_min, 0.0, f32::MAX)?;
        check_range("speed_span", self.speed_span, 0.0, f32::MAX)?;
        // Damping must stay below 1 so momentum always decays.
        check_range("force_min", self.force_min, 0.0, 1.0)?;
        check_range(
            "force_min + force_span",
            self.force_min + self.force_span,
            0.0,
            0.999,
        )?;
        check_range("fade_alpha_max", self.fade_alpha_max, 0.0, 1.0)?;
        if self.pulse.min > self.pulse.max {
            return Err(ConfigError::PulseRange {
                min: self.pulse.min,
                max: self.pulse.max,
            });
        }
        Ok(())
    }
}

fn check_range(name: &'static str, value: f32, min: f32, max: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value >= min && value <= max {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            name,
            value,
            min,
            max,
        })
    }
}
