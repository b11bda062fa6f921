//! Homing particle swarm with decaying trails.
//!
//! Each particle chases one target point on the projected curve. On arrival
//! it either jumps to a random target, reverses its wander direction, or
//! walks to the neighbouring index in that direction, so the swarm
//! circulates around the outline instead of settling.

use crate::config::HeartConfig;
use crate::constants::*;
use crate::control::ControlVector;
use crate::curve::TargetPoints;
use crate::surface::{Surface, Viewport};
use glam::Vec2;
use rand::rngs::StdRng;
use rand::Rng;
use smallvec::SmallVec;
use std::fmt;

// Inline capacity covers the default trail length without heap spill.
pub type Trail = SmallVec<[Vec2; 64]>;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ParticleColor {
    pub hue: f32,
    pub saturation: f32,
    pub lightness: f32,
    pub alpha: f32,
}

impl fmt::Display for ParticleColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "hsla({:.0},{:.0}%,{:.0}%,{:.2})",
            self.hue, self.saturation, self.lightness, self.alpha
        )
    }
}

#[derive(Clone, Debug)]
pub struct Particle {
    /// Most recent position first; length never changes.
    pub trail: Trail,
    pub velocity: Vec2,
    pub target: usize,
    /// +1 or -1.
    pub direction: i32,
    pub speed: f32,
    /// Velocity damping per tick, < 1.
    pub force: f32,
    color: ParticleColor,
    fill: String,
}

impl Particle {
    pub fn lead(&self) -> Vec2 {
        self.trail[0]
    }

    pub fn color(&self) -> ParticleColor {
        self.color
    }

    pub fn fill_style(&self) -> &str {
        &self.fill
    }

    /// Rebuilds the cached style string only when the visible alpha changes.
    fn set_alpha(&mut self, alpha: f32) {
        let alpha = (alpha * 100.0).round() / 100.0;
        if alpha != self.color.alpha {
            self.color.alpha = alpha;
            self.fill = self.color.to_string();
        }
    }
}

/// Per-tick behaviour knobs copied out of [`HeartConfig`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FieldParams {
    pub trail_relax: f32,
    pub arrival_distance: f32,
    pub reseed_probability: f32,
    pub flip_probability: f32,
}

impl From<&HeartConfig> for FieldParams {
    fn from(cfg: &HeartConfig) -> Self {
        Self {
            trail_relax: cfg.trail_relax,
            arrival_distance: cfg.arrival_distance,
            reseed_probability: cfg.reseed_probability,
            flip_probability: cfg.flip_probability,
        }
    }
}

/// Speed-up applied to the homing force while audio is active.
#[inline]
pub fn audio_speed_multiplier(control: &ControlVector) -> f32 {
    1.0 + control.overall * SPEED_OVERALL_WEIGHT
        + control.bass * SPEED_BASS_WEIGHT
        + control.beat_level() * SPEED_BEAT_BOOST
}

#[inline]
pub fn reactive_alpha(control: &ControlVector) -> f32 {
    (ALPHA_IDLE
        + control.overall * ALPHA_OVERALL_WEIGHT
        + control.bass * ALPHA_BASS_WEIGHT
        + control.beat_level() * ALPHA_BEAT_FLASH)
        .min(ALPHA_MAX)
}

pub struct ParticleField {
    particles: Vec<Particle>,
    params: FieldParams,
    rng: StdRng,
}

impl ParticleField {
    /// One particle per target point, scattered over the viewport.
    pub fn new(
        count: usize,
        config: &HeartConfig,
        viewport: &Viewport,
        mut rng: StdRng,
    ) -> Self {
        let trail_len = config.trail_len.max(1);
        let particles = (0..count)
            .map(|_| {
                let start = Vec2::new(
                    rng.gen::<f32>() * viewport.width as f32,
                    rng.gen::<f32>() * viewport.height as f32,
                );
                let color = ParticleColor {
                    hue: PARTICLE_HUE,
                    saturation: (SATURATION_MIN + rng.gen::<f32>() * SATURATION_SPAN).floor(),
                    lightness: (LIGHTNESS_MIN + rng.gen::<f32>() * LIGHTNESS_SPAN).floor(),
                    alpha: ALPHA_IDLE,
                };
                Particle {
                    trail: SmallVec::from_elem(start, trail_len),
                    velocity: Vec2::ZERO,
                    target: if count > 0 { rng.gen_range(0..count) } else { 0 },
                    direction: if rng.gen_bool(0.5) { 1 } else { -1 },
                    speed: config.speed_min + rng.gen::<f32>() * config.speed_span,
                    force: config.force_min + rng.gen::<f32>() * config.force_span,
                    fill: color.to_string(),
                    color,
                }
            })
            .collect();
        Self {
            particles,
            params: FieldParams::from(config),
            rng,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.particles.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    /// Step and paint every particle in one pass. `audio` is `None` when no
    /// reactive input should be applied.
    pub fn step_and_draw<S: Surface + ?Sized>(
        &mut self,
        targets: &TargetPoints,
        audio: Option<&ControlVector>,
        surface: &mut S,
    ) {
        let n = targets.len();
        if n == 0 {
            return;
        }
        let speed_mult = audio.map(audio_speed_multiplier).unwrap_or(1.0);
        let alpha = audio.map(reactive_alpha).unwrap_or(ALPHA_IDLE);
        let params = self.params;

        for p in self.particles.iter_mut() {
            if p.target >= n {
                p.target %= n;
            }
            let lead = p.trail[0];
            let mut delta = lead - targets.get(p.target);
            let mut dist = delta.length();

            // Re-target before dividing by the distance.
            if dist < params.arrival_distance {
                retarget(p, n, &params, &mut self.rng);
                delta = lead - targets.get(p.target);
                dist = delta.length();
            }
            let dist = dist.max(MIN_HOMING_DISTANCE);

            p.velocity += -delta / dist * p.speed * speed_mult;
            p.trail[0] += p.velocity;
            p.velocity *= p.force;

            for k in 1..p.trail.len() {
                let prev = p.trail[k - 1];
                let cur = p.trail[k];
                p.trail[k] = cur - (cur - prev) * params.trail_relax;
            }

            p.set_alpha(alpha);

            surface.set_fill_style(&p.fill);
            for point in p.trail.iter() {
                surface.fill_rect(point.x as f64, point.y as f64, 1.0, 1.0);
            }
        }
    }
}

fn retarget(p: &mut Particle, n: usize, params: &FieldParams, rng: &mut StdRng) {
    if rng.gen::<f32>() < params.reseed_probability {
        p.target = rng.gen_range(0..n);
    } else if rng.gen::<f32>() < params.flip_probability {
        p.direction = -p.direction;
    } else {
        p.target = (p.target as i64 + p.direction as i64).rem_euclid(n as i64) as usize;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curve::HeartCurve;
    use crate::surface::RecordingSurface;
    use glam::Vec2;
    use rand::SeedableRng;

    fn field(count: usize) -> ParticleField {
        ParticleField::new(
            count,
            &HeartConfig::default(),
            &Viewport::new(800.0, 600.0, 1.0),
            StdRng::seed_from_u64(7),
        )
    }

    #[test]
    fn color_formats_as_css_hsla() {
        let c = ParticleColor {
            hue: 0.0,
            saturation: 72.0,
            lightness: 41.0,
            alpha: 0.3,
        };
        assert_eq!(c.to_string(), "hsla(0,72%,41%,0.30)");
    }

    /// Single-particle field parked on `target`, with fixed retarget odds.
    fn arrived_at(target: usize, reseed: f32, flip: f32) -> (ParticleField, TargetPoints) {
        let mut f = field(1);
        f.params = FieldParams {
            reseed_probability: reseed,
            flip_probability: flip,
            ..f.params
        };
        let curve = HeartCurve::sample(0.5, &[[100.0, 6.0]]);
        let mut targets = TargetPoints::for_curve(&curve);
        targets.project(&curve, 1.0, Vec2::new(400.0, 300.0));

        let p = &mut f.particles[0];
        p.target = target;
        p.direction = 1;
        let at = targets.get(target);
        for point in p.trail.iter_mut() {
            *point = at;
        }
        (f, targets)
    }

    #[test]
    fn arrived_particle_walks_to_neighbour() {
        let last = HeartCurve::sample(0.5, &[[100.0, 6.0]]).len() - 1;
        let (mut f, targets) = arrived_at(last, 0.0, 0.0);
        f.step_and_draw(&targets, None, &mut RecordingSurface::new());
        assert_eq!(f.particles[0].target, 0);
        assert_eq!(f.particles[0].direction, 1);
    }

    #[test]
    fn flip_reverses_direction_without_moving_target() {
        let (mut f, targets) = arrived_at(5, 0.0, 1.0);
        f.step_and_draw(&targets, None, &mut RecordingSurface::new());
        assert_eq!(f.particles[0].direction, -1);
        assert_eq!(f.particles[0].target, 5);
    }

    #[test]
    fn reseed_keeps_direction_and_stays_in_range() {
        let n = HeartCurve::sample(0.5, &[[100.0, 6.0]]).len();
        let (mut f, targets) = arrived_at(5, 1.0, 1.0);
        let mut surface = RecordingSurface::new();
        for _ in 0..20 {
            let at = targets.get(f.particles[0].target);
            for point in f.particles[0].trail.iter_mut() {
                *point = at;
            }
            f.step_and_draw(&targets, None, &mut surface);
            assert_eq!(f.particles[0].direction, 1);
            assert!(f.particles[0].target < n);
        }
    }

    #[test]
    fn draws_one_rect_per_trail_point() {
        let mut f = field(4);
        let curve = HeartCurve::sample(0.5, &[[100.0, 6.0]]);
        let mut targets = TargetPoints::for_curve(&curve);
        targets.project(&curve, 1.0, Vec2::new(400.0, 300.0));
        let mut surface = RecordingSurface::new();
        f.step_and_draw(&targets, None, &mut surface);
        assert_eq!(surface.rect_count(), 4 * TRAIL_LEN);
        assert_eq!(surface.fill_styles().count(), 4);
    }

    #[test]
    fn loud_audio_raises_alpha_up_to_cap() {
        let loud = ControlVector::new(1.0, 1.0, 1.0, 1.0, true);
        assert_eq!(reactive_alpha(&loud), ALPHA_MAX);
        assert_eq!(reactive_alpha(&ControlVector::silent()), ALPHA_IDLE);
        assert!(audio_speed_multiplier(&loud) > audio_speed_multiplier(&ControlVector::silent()));
    }
}
