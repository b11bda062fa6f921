use thiserror::Error;

/// Rejected configuration values.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("angle step must be in (0, 2π), got {0}")]
    AngleStep(f32),
    #[error("at least one curve tier is required")]
    NoTiers,
    #[error("trail length must be at least 1")]
    EmptyTrail,
    #[error("{name} must lie in [{min}, {max}], got {value}")]
    OutOfRange {
        name: &'static str,
        value: f32,
        min: f32,
        max: f32,
    },
    #[error("pulse range is inverted: min {min} > max {max}")]
    PulseRange { min: f32, max: f32 },
}

#[derive(Debug, Error)]
pub enum HeartError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
}
