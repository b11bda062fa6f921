//! One render-loop tick over the whole heart: pulse, projection, fade and
//! particles, in that order.

use crate::config::HeartConfig;
use crate::constants::{BACKGROUND_FILL, HEART_FIT_EXTENT};
use crate::control::ControlVector;
use crate::curve::{HeartCurve, TargetPoints};
use crate::error::HeartError;
use crate::particles::ParticleField;
use crate::pulse::{PulseController, PulseFrame};
use crate::surface::{Surface, Viewport};
use rand::rngs::StdRng;

/// What one tick did, for logging and tests.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameStats {
    pub pulse: PulseFrame,
    /// Scale actually applied to the curve (pulse times viewport fit).
    pub scale: f32,
    pub fade_alpha: f32,
    pub particles: usize,
}

/// Shrink factor so the outer tier stays on small screens.
pub fn viewport_fit(viewport: &Viewport) -> f32 {
    let short_side = viewport.width.min(viewport.height) as f32;
    (short_side / HEART_FIT_EXTENT).min(1.0)
}

pub fn fade_style(alpha: f32) -> String {
    format!("rgba(0,0,0,{:.3})", alpha)
}

pub struct HeartScene {
    config: HeartConfig,
    curve: HeartCurve,
    targets: TargetPoints,
    field: ParticleField,
    pulse: PulseController,
    viewport: Viewport,
    fit: f32,
    playing: bool,
}

impl HeartScene {
    pub fn new(config: HeartConfig, viewport: Viewport, rng: StdRng) -> Result<Self, HeartError> {
        config.validate()?;
        let curve = HeartCurve::sample(config.angle_step, &config.tiers);
        let targets = TargetPoints::for_curve(&curve);
        let field = ParticleField::new(curve.len(), &config, &viewport, rng);
        let pulse = PulseController::new(config.pulse.clone());
        log::info!(
            "[scene] {} particles on {} tiers, trail {}",
            field.len(),
            config.tiers.len(),
            config.trail_len
        );
        Ok(Self {
            fit: viewport_fit(&viewport),
            config,
            curve,
            targets,
            field,
            pulse,
            viewport,
            playing: false,
        })
    }

    pub fn config(&self) -> &HeartConfig {
        &self.config
    }

    pub fn curve(&self) -> &HeartCurve {
        &self.curve
    }

    pub fn targets(&self) -> &TargetPoints {
        &self.targets
    }

    pub fn field(&self) -> &ParticleField {
        &self.field
    }

    pub fn pulse(&self) -> &PulseController {
        &self.pulse
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn set_playing(&mut self, playing: bool) {
        self.playing = playing;
    }

    /// New canvas size. Only the projection changes; particles are kept.
    pub fn resize<S: Surface + ?Sized>(&mut self, viewport: Viewport, surface: &mut S) {
        self.viewport = viewport;
        self.fit = viewport_fit(&viewport);
        surface.set_fill_style(BACKGROUND_FILL);
        surface.fill_rect(0.0, 0.0, viewport.width, viewport.height);
    }

    pub fn tick<S: Surface + ?Sized>(
        &mut self,
        control: &ControlVector,
        surface: &mut S,
    ) -> FrameStats {
        let control = if self.playing {
            *control
        } else {
            ControlVector::silent()
        };

        let pulse = self.pulse.advance(&control);
        let scale = pulse.pulse * self.fit;
        self.targets.project(&self.curve, scale, self.viewport.center());

        let fade_alpha = (self.config.fade_alpha_base
            + control.overall * self.config.fade_alpha_overall)
            .min(self.config.fade_alpha_max);
        surface.set_fill_style(&fade_style(fade_alpha));
        surface.fill_rect(0.0, 0.0, self.viewport.width, self.viewport.height);

        let audio = self.playing.then_some(&control);
        self.field.step_and_draw(&self.targets, audio, surface);

        FrameStats {
            pulse,
            scale,
            fade_alpha,
            particles: self.field.len(),
        }
    }
}
