pub mod config;
pub mod constants;
pub mod control;
pub mod curve;
pub mod error;
pub mod fusion;
pub mod particles;
pub mod pulse;
pub mod scene;
pub mod surface;

pub use config::HeartConfig;
pub use control::{Cadence, ControlBus, ControlVector, Publication, SourceKind, SourceStatus};
pub use curve::{HeartCurve, TargetPoints};
pub use error::{ConfigError, HeartError};
pub use fusion::clock::{AnalyzerBudget, PlaybackClock};
pub use fusion::simulation::{Simulator, TrackMetrics};
pub use fusion::spectral::{BeatDetector, SpectralAnalyzer};
pub use fusion::timbral::{TimbralExtractor, TimbralFeatures, TimbralMapper};
pub use fusion::{SignalFusion, SourceTransition};
pub use particles::{Particle, ParticleField};
pub use pulse::{PulseController, PulseFrame, PulseParams, PulseState};
pub use scene::{FrameStats, HeartScene};
pub use surface::{RecordingSurface, Surface, Viewport};
