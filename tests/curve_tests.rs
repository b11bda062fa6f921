// Host-side tests for curve sampling and per-frame projection.

use glam::Vec2;
use heart_core::constants::TIER_SCALES;
use heart_core::curve::{heart_position, samples_per_tier};
use heart_core::{HeartConfig, HeartCurve, TargetPoints};

#[test]
fn sample_count_follows_angle_step() {
    let full = HeartConfig::default();
    let compact = HeartConfig::compact();
    assert_eq!(samples_per_tier(full.angle_step), 63);
    assert_eq!(samples_per_tier(compact.angle_step), 21);
    assert_eq!(HeartCurve::sample(full.angle_step, &full.tiers).len(), 189);
    assert_eq!(HeartCurve::sample(compact.angle_step, &compact.tiers).len(), 63);
}

#[test]
fn outline_is_single_lobed_with_top_dip_and_bottom_tip() {
    // θ = 0 is the dip between the lobes, θ = π the bottom tip (y grows down).
    let dip = heart_position(0.0);
    let tip = heart_position(std::f32::consts::PI);
    assert!(dip.x.abs() < 1e-6 && tip.x.abs() < 1e-5);
    assert!(tip.y > 0.0 && dip.y < 0.0);
    let lowest = (0..628)
        .map(|i| heart_position(i as f32 * 0.01).y)
        .fold(f32::MIN, f32::max);
    assert!((lowest - tip.y).abs() < 1e-3);
}

#[test]
fn projection_is_reused_across_resizes() {
    let curve = HeartCurve::sample(0.1, &TIER_SCALES);
    let unscaled: Vec<Vec2> = curve.points().to_vec();
    let mut targets = TargetPoints::for_curve(&curve);

    targets.project(&curve, 1.0, Vec2::new(400.0, 300.0));
    let a = targets.get(70);
    targets.project(&curve, 1.0, Vec2::new(960.0, 540.0));
    let b = targets.get(70);
    assert!((b - a - Vec2::new(560.0, 240.0)).length() < 1e-3);

    targets.project(&curve, 1.8, Vec2::ZERO);
    assert!((targets.get(5) - curve.points()[5] * 1.8).length() < 1e-3);
    assert_eq!(curve.points(), unscaled.as_slice());
    assert_eq!(targets.len(), curve.len());
}

#[test]
fn tiers_are_nested_and_indexed_in_order() {
    let curve = HeartCurve::sample(0.1, &TIER_SCALES);
    let n = curve.per_tier();
    let pts = curve.points();
    // The same angle on an inner tier lies strictly inside the outer one.
    for i in 1..n {
        assert!(pts[i].length() > pts[n + i].length());
        assert!(pts[n + i].length() > pts[2 * n + i].length());
    }
    assert_eq!(curve.tier_of(n - 1), 0);
    assert_eq!(curve.tier_of(n), 1);
    assert_eq!(curve.tier_of(3 * n - 1), 2);
}
