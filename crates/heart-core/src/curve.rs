//! Heart-curve skeleton that the particle swarm homes toward.
//!
//! The unscaled [`HeartCurve`] is sampled once; every frame it is projected
//! into a parallel [`TargetPoints`] buffer by the current pulse factor and the
//! canvas centre.

use glam::Vec2;
use std::f32::consts::TAU;

/// Closed heart outline built from sin/cos harmonics up to 4θ.
#[inline]
pub fn heart_position(theta: f32) -> Vec2 {
    let (s, c) = theta.sin_cos();
    Vec2::new(
        s * s * s,
        -(15.0 * c - 5.0 * (2.0 * theta).cos() - 2.0 * (3.0 * theta).cos() - (4.0 * theta).cos()),
    )
}

/// Number of samples per tier for a given angular step over one full turn.
#[inline]
pub fn samples_per_tier(angle_step: f32) -> usize {
    (TAU / angle_step).ceil().max(1.0) as usize
}

/// Immutable tiered samples of the heart curve, outer tier first.
#[derive(Clone, Debug)]
pub struct HeartCurve {
    points: Vec<Vec2>,
    per_tier: usize,
}

impl HeartCurve {
    pub fn sample(angle_step: f32, tiers: &[[f32; 2]]) -> Self {
        let per_tier = samples_per_tier(angle_step);
        let mut points = Vec::with_capacity(per_tier * tiers.len());
        for &[sx, sy] in tiers {
            for i in 0..per_tier {
                let p = heart_position(i as f32 * angle_step);
                points.push(Vec2::new(p.x * sx, p.y * sy));
            }
        }
        Self { points, per_tier }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn per_tier(&self) -> usize {
        self.per_tier
    }

    pub fn points(&self) -> &[Vec2] {
        &self.points
    }

    /// Tier index of a point (0 = outer).
    pub fn tier_of(&self, index: usize) -> usize {
        index / self.per_tier.max(1)
    }
}

/// Canvas-space targets, same length and order as the curve.
#[derive(Clone, Debug, Default)]
pub struct TargetPoints {
    points: Vec<Vec2>,
}

impl TargetPoints {
    pub fn for_curve(curve: &HeartCurve) -> Self {
        Self {
            points: vec![Vec2::ZERO; curve.len()],
        }
    }

    /// Re-project every curve point: `p * k + center`.
    pub fn project(&mut self, curve: &HeartCurve, k: f32, center: Vec2) {
        self.points.resize(curve.len(), Vec2::ZERO);
        for (dst, src) in self.points.iter_mut().zip(curve.points()) {
            *dst = *src * k + center;
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    #[inline]
    pub fn get(&self, index: usize) -> Vec2 {
        self.points[index]
    }

    pub fn as_slice(&self) -> &[Vec2] {
        &self.points
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn curve_is_mirror_symmetric() {
        for i in 0..32 {
            let t = i as f32 * 0.19;
            let a = heart_position(t);
            let b = heart_position(-t);
            assert!((a.x + b.x).abs() < 1e-5);
            assert!((a.y - b.y).abs() < 1e-4);
        }
    }

    #[test]
    fn tiers_are_concatenated_outer_first() {
        let curve = HeartCurve::sample(0.1, &[[210.0, 13.0], [150.0, 9.0], [90.0, 5.0]]);
        let n = curve.per_tier();
        assert_eq!(n, 63);
        assert_eq!(curve.len(), 3 * n);
        let widest = |tier: usize| {
            curve.points()[tier * n..(tier + 1) * n]
                .iter()
                .map(|p| p.x.abs())
                .fold(0.0_f32, f32::max)
        };
        assert!(widest(0) > widest(1));
        assert!(widest(1) > widest(2));
        assert_eq!(curve.tier_of(n), 1);
    }

    #[test]
    fn projection_scales_and_translates() {
        let curve = HeartCurve::sample(1.0, &[[10.0, 10.0]]);
        let mut targets = TargetPoints::for_curve(&curve);
        let center = Vec2::new(400.0, 300.0);
        targets.project(&curve, 0.5, center);
        for (t, p) in targets.as_slice().iter().zip(curve.points()) {
            assert!((*t - (*p * 0.5 + center)).length() < 1e-4);
        }
    }
}
