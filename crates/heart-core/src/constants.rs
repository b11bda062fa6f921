// Shared tuning constants for the heart simulation and signal fusion.

// Curve sampling
pub const CURVE_ANGLE_STEP: f32 = 0.1; // radians between samples on one tier
pub const CURVE_ANGLE_STEP_COMPACT: f32 = 0.3;
pub const TIER_SCALES: [[f32; 2]; 3] = [
    [210.0, 13.0], // outer
    [150.0, 9.0],  // middle
    [90.0, 5.0],   // inner
];

// Particle trails
pub const TRAIL_LEN: usize = 50;
pub const TRAIL_LEN_COMPACT: usize = 20;
pub const TRAIL_RELAX: f32 = 0.4; // fraction each trail point moves toward its predecessor
pub const COMPACT_VIEWPORT_WIDTH: f64 = 600.0;

// Homing and wander
pub const ARRIVAL_DISTANCE: f32 = 10.0; // px; closer than this counts as "arrived"
pub const RESEED_PROBABILITY: f32 = 0.05;
pub const FLIP_PROBABILITY: f32 = 0.01;
pub const SPEED_MIN: f32 = 5.0;
pub const SPEED_SPAN: f32 = 1.0;
pub const FORCE_MIN: f32 = 0.7; // velocity damping per tick, always < 1
pub const FORCE_SPAN: f32 = 0.2;
pub const MIN_HOMING_DISTANCE: f32 = 1e-3;

// Audio speed multiplier weights
pub const SPEED_OVERALL_WEIGHT: f32 = 0.8;
pub const SPEED_BASS_WEIGHT: f32 = 0.6;
pub const SPEED_BEAT_BOOST: f32 = 0.5;

// Particle colour (hsla, hue fixed at red)
pub const PARTICLE_HUE: f32 = 0.0;
pub const SATURATION_MIN: f32 = 60.0;
pub const SATURATION_SPAN: f32 = 40.0;
pub const LIGHTNESS_MIN: f32 = 20.0;
pub const LIGHTNESS_SPAN: f32 = 60.0;
pub const ALPHA_IDLE: f32 = 0.3;
pub const ALPHA_OVERALL_WEIGHT: f32 = 0.4;
pub const ALPHA_BASS_WEIGHT: f32 = 0.2;
pub const ALPHA_BEAT_FLASH: f32 = 0.2;
pub const ALPHA_MAX: f32 = 0.9;

// Pulse envelope
pub const PULSE_OVERALL_GAIN: f32 = 0.3; // k1
pub const PULSE_BASS_GAIN: f32 = 0.2; // k2
pub const BEAT_ATTACK_BASE: f32 = 1.2;
pub const BEAT_ATTACK_BASS: f32 = 0.3;
pub const BEAT_DECAY_PER_PHASE: f32 = 0.03;
pub const NATURAL_AMPLITUDE: f32 = 0.1;
pub const RADIANS_PER_PHASE: f32 = 0.01;
pub const PULSE_MIN: f32 = 0.5;
pub const PULSE_MAX: f32 = 1.8;

// Phase advance per tick
pub const PHASE_STEP_FAST: f32 = 9.0; // natural sinusoid in its negative half
pub const PHASE_STEP_HOLD: f32 = 0.2; // near the crest of the natural beat
pub const PHASE_STEP_NORMAL: f32 = 1.0;
pub const PHASE_HOLD_THRESHOLD: f32 = 0.8;
pub const PHASE_AUDIO_GAIN: f32 = 1.5; // overall level speeds up phase advance

// Background fade (motion blur)
pub const FADE_ALPHA_BASE: f32 = 0.1;
pub const FADE_ALPHA_OVERALL: f32 = 0.15;
pub const FADE_ALPHA_MAX: f32 = 0.35;
pub const BACKGROUND_FILL: &str = "rgb(0,0,0)"; // opaque repaint on resize

// Outer tier fits in this square (CSS px) at pulse 1; smaller viewports shrink it
pub const HEART_FIT_EXTENT: f32 = 600.0;

// Live spectral analysis
pub const BASS_BAND_FRACTION: f32 = 0.1;
pub const MID_BAND_FRACTION: f32 = 0.3;
pub const BEAT_HISTORY_LEN: usize = 10;
pub const BEAT_THRESHOLD_RATIO: f32 = 1.5;
pub const BEAT_DEBOUNCE_MS: f64 = 200.0;

// Timbral features
pub const TIMBRAL_INTERVAL_MS: u32 = 50;
pub const TIMBRAL_STALE_MS: f64 = 500.0;
pub const LOUDNESS_FULL_SCALE: f32 = 30.0;
pub const RMS_FULL_SCALE: f32 = 0.35;
pub const ROLLOFF_FULL_SCALE_HZ: f32 = 10_000.0;
pub const FLUX_BEAT_THRESHOLD: f32 = 0.3;
pub const ENERGY_BEAT_THRESHOLD: f32 = 0.75;
pub const ROLLOFF_ENERGY_FRACTION: f32 = 0.85;

// Simulation defaults when no metrics are known
pub const DEFAULT_TEMPO_BPM: f32 = 120.0;
pub const DEFAULT_ENERGY: f32 = 0.5;
pub const DEFAULT_DANCEABILITY: f32 = 0.5;
pub const DEFAULT_VALENCE: f32 = 0.5;
pub const SIM_BEAT_THRESHOLD: f32 = 0.9;
pub const SIMULATION_INTERVAL_MS: u32 = 50;

// Resource guard for live analyzers (file tap, microphone)
pub const LIVE_ANALYZER_MAX_MS: f64 = 30.0 * 60.0 * 1000.0;

// Neutral vector substituted before anything has been published
pub const IDLE_OVERALL: f32 = 0.05;
