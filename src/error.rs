// Error types for configuration, hardware acquisition and runtime writes

use crate::motor::Motion;

/// Configuration rejected before any hardware request is made
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("{name} must be non-negative, got {value}")]
    Negative { name: &'static str, value: i32 },

    #[error("{name} = {value} is out of range (max {max})")]
    OutOfRange {
        name: &'static str,
        value: i32,
        max: i32,
    },

    #[error("{name} reuses identifier {value}, already assigned to {other}")]
    Duplicate {
        name: &'static str,
        other: &'static str,
        value: i32,
    },

    #[error("PWM frequency must be a positive number of Hz, got {0}")]
    Frequency(f32),

    #[error("0x{0:02X} is not a PCA9685 address (expected 0x40..=0x7F)")]
    Address(u8),
}

/// Failures reported by the GPIO / I2C / PWM capabilities
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum HardwareError {
    #[error("Failed to open {device}: {reason}")]
    Open { device: String, reason: String },

    #[error("Failed to request line {line}: {reason}")]
    LineRequest { line: u32, reason: String },

    #[error("PWM driver not initialised: {reason}")]
    ChipNotInitialized { reason: String },

    #[error("Failed to set PWM frequency to {hz} Hz: {reason}")]
    Frequency { hz: f32, reason: String },

    #[error("Write to {output} failed: {reason}")]
    Write { output: String, reason: String },
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Hardware error: {0}")]
    Hardware(#[from] HardwareError),

    #[error("Speed must be within 0..=100 percent, got {0}")]
    InvalidSpeed(f32),

    #[error("{0:?} needs speed-scaled motors")]
    UnsupportedMotion(Motion),

    #[error("Controller has been shut down")]
    ShutDown,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config file error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
