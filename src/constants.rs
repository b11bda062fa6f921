// Browser-side tuning: analyser sizes, decibel range and element ids.
//
// Simulation and fusion constants, including producer cadences, live in
// `heart_core::constants`.

// Canvas looked up when the host passes no id
pub const DEFAULT_CANVAS_ID: &str = "heart-canvas";

// File tap: 256-point FFT -> 128 byte bins
pub const FILE_FFT_SIZE: u32 = 256;
pub const FILE_SMOOTHING: f64 = 0.8;

// Microphone: larger FFT for the timbral extractor
pub const MIC_FFT_SIZE: u32 = 2048;
pub const MIC_SMOOTHING: f64 = 0.3;
pub const MIC_MIN_DECIBELS: f64 = -100.0;
pub const MIC_MAX_DECIBELS: f64 = -10.0;

// Sample rate assumed until an AudioContext reports its own
pub const FALLBACK_SAMPLE_RATE: f32 = 48_000.0;
