// Host-side tests for source selection, the shared control bus and the
// individual signal sources.

use heart_core::fusion::simulation::{simulated_levels, ResolvedMetrics};
use heart_core::fusion::spectral::SpectralAnalyzer;
use heart_core::{
    ControlVector, SignalFusion, Simulator, SourceKind, SourceStatus, TimbralFeatures,
    TimbralMapper, TrackMetrics,
};

fn hot_metrics() -> TrackMetrics {
    TrackMetrics {
        tempo: None,
        energy: Some(1.0),
        danceability: Some(1.0),
        valence: Some(1.0),
    }
}

fn sample_features() -> TimbralFeatures {
    TimbralFeatures {
        rms: 0.2,
        spectral_centroid: 40.0,
        spectral_rolloff: 4_000.0,
        spectral_flux: 0.1,
        loudness: 15.0,
        ..TimbralFeatures::default()
    }
}

#[test]
fn idle_fallback_never_flatlines() {
    let mut f = SignalFusion::new(0.0);
    let mut nonzero = 0;
    for i in 0..200 {
        let now = i as f64 * 50.0;
        assert_eq!(f.reselect(now), None);
        assert!(f.simulate(now));
        let v = f.latest();
        assert!(v.overall.is_finite());
        if v.overall > 0.0 {
            nonzero += 1;
        }
    }
    assert_eq!(f.status(), SourceStatus::Loading);
    assert!(nonzero > 0);
}

#[test]
fn timbral_features_win_over_track_metrics() {
    let mut f = SignalFusion::new(0.0);
    f.set_track_metrics(Some(hot_metrics()));
    assert_eq!(f.reselect(0.0).map(|t| t.to), Some(SourceKind::TrackSimulation));
    assert!(f.simulate(10.0));

    let features = sample_features();
    f.ingest_timbral(&features, 20.0);
    let t = f.reselect(20.0).expect("timbral should take over");
    assert_eq!((t.from, t.to), (SourceKind::TrackSimulation, SourceKind::Timbral));
    assert_eq!(f.status(), SourceStatus::RealAnalysis);

    assert!(f.ingest_timbral(&features, 70.0));
    // the simulation can no longer write
    assert!(!f.simulate(80.0));

    let expected = TimbralMapper::default().map(&features);
    assert_eq!(f.latest(), expected);
    let simulated = simulated_levels(&hot_metrics().resolve(), 0.08);
    assert_ne!(f.latest().overall, simulated.overall);
}

#[test]
fn second_crossing_inside_debounce_window_is_ignored() {
    let quiet = [51u8; 128]; // 0.2
    let loud = [204u8; 128]; // 0.8
    let mut a = SpectralAnalyzer::default();
    for i in 0..10 {
        assert!(!a.analyze(&quiet, i as f64 * 16.0).beat);
    }
    assert!(a.analyze(&loud, 160.0).beat);
    assert!(!a.analyze(&quiet, 176.0).beat);
    // crosses the threshold again 32 ms later
    assert!(!a.analyze(&loud, 192.0).beat);
    // and once more after the window has passed
    assert!(a.analyze(&loud, 400.0).beat);
}

#[test]
fn spectral_beats_reach_the_bus_debounced() {
    let mut f = SignalFusion::new(0.0);
    f.attach_live_spectral(0.0);
    f.reselect(0.0);
    assert_eq!(f.status(), SourceStatus::LocalFileAnalysis);
    let mut beats = Vec::new();
    for i in 0..40 {
        let now = i as f64 * 16.0;
        let level = if i % 2 == 0 { 20u8 } else { 250u8 };
        assert!(f.ingest_spectrum(&[level; 128], now));
        if f.latest().beat {
            beats.push(now);
        }
    }
    assert!(!beats.is_empty());
    for pair in beats.windows(2) {
        assert!(pair[1] - pair[0] >= 200.0, "beats too close: {:?}", pair);
    }
}

#[test]
fn rich_metrics_drive_a_livelier_simulation() {
    let hot = hot_metrics().resolve();
    let base = ResolvedMetrics::default();
    for i in 0..400 {
        let t = i as f64 * 0.037;
        let a = simulated_levels(&hot, t);
        let b = simulated_levels(&base, t);
        assert!(a.overall > b.overall, "t={t}: {} <= {}", a.overall, b.overall);
    }

    let mut rich = SignalFusion::new(0.0);
    rich.set_track_metrics(Some(hot_metrics()));
    rich.reselect(0.0);
    let mut plain = SignalFusion::new(0.0);
    for i in 1..100 {
        let now = i as f64 * 50.0;
        rich.simulate(now);
        plain.simulate(now);
        assert!(rich.latest().overall > plain.latest().overall);
    }
}

#[test]
fn switching_sources_never_mixes_vectors() {
    let mut f = SignalFusion::new(0.0);
    let bus = f.bus();
    f.attach_live_spectral(0.0);
    f.reselect(0.0);

    let mut bins = [0u8; 128];
    bins[..13].fill(255);
    bins[13..51].fill(40);
    assert!(f.ingest_spectrum(&bins, 16.0));
    let spectral = bus.latest();
    assert_eq!(spectral, SpectralAnalyzer::default().analyze(&bins, 16.0));

    // File analysis stops; track metrics arrive.
    f.set_track_metrics(Some(hot_metrics()));
    f.detach_live_spectral();
    let t = f.reselect(32.0).expect("fallback to track simulation");
    assert_eq!((t.from, t.to), (SourceKind::LiveSpectral, SourceKind::TrackSimulation));

    // A late spectral write is rejected outright.
    let late = ControlVector::new(1.0, 1.0, 1.0, 1.0, true);
    assert!(!bus.publish(SourceKind::LiveSpectral, late, 40.0));
    assert!(!f.ingest_spectrum(&bins, 40.0));
    assert_eq!(bus.latest(), spectral);

    assert!(f.simulate(50.0));
    let simulated = Simulator::default().sample(&hot_metrics().resolve(), 0.05);
    assert_eq!(bus.latest(), simulated);
    assert_eq!(bus.last().map(|p| p.source), Some(SourceKind::TrackSimulation));

    for i in 2..40 {
        let now = i as f64 * 25.0;
        if i % 2 == 0 {
            f.simulate(now);
        } else {
            f.ingest_spectrum(&bins, now);
        }
        let v = bus.latest();
        assert_eq!(bus.last().map(|p| p.source), Some(SourceKind::TrackSimulation));
        assert_ne!(v, spectral);
    }
}

#[test]
fn streamed_playback_position_phases_the_simulation() {
    let metrics = hot_metrics();
    let mut a = SignalFusion::new(0.0);
    a.set_track_metrics(Some(metrics));
    a.set_streamed(true, 0.0);
    a.reselect(0.0);
    a.set_playback_position(61_250.0, 1_000.0);
    a.simulate(1_000.0);

    let expected = simulated_levels(&metrics.resolve(), 61.25);
    let got = a.latest();
    assert!((got.bass - expected.bass).abs() < 1e-6);
    assert!((got.overall - expected.overall).abs() < 1e-6);
}

#[test]
fn malformed_timbral_frame_is_neutralised_without_stopping() {
    let mut f = SignalFusion::new(0.0);
    f.ingest_timbral(&sample_features(), 0.0);
    f.reselect(0.0);
    let bad = TimbralFeatures {
        loudness: f32::NAN,
        ..sample_features()
    };
    assert!(f.ingest_timbral(&bad, 50.0));
    assert_eq!(f.latest(), TimbralMapper::default().map(&TimbralFeatures::neutral()));
    assert!(f.ingest_timbral(&sample_features(), 100.0));
    assert!(f.latest().overall > 0.0);
    assert_eq!(f.active(), SourceKind::Timbral);
}
