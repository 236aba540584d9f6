// Output capabilities consumed by the motors
//
// Binary outputs are GPIO lines requested as a group; proportional outputs
// are channels on a shared PWM driver chip. Backends live in `crate::hal`
// and `super::pca9685`.

use serde::{Deserialize, Serialize};

use crate::error::HardwareError;

/// Logical level of a binary output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Level {
    Active,
    Inactive,
}

/// Exclusively held set of output lines, released on drop
pub trait LineGroup {
    fn set(&mut self, offset: u32, level: Level) -> Result<(), HardwareError>;
}

/// Source of line groups
pub trait GpioChip {
    type Lines: LineGroup;

    /// Request every offset as an output, initially inactive, in one call.
    /// Either all lines are claimed or none are.
    fn request_lines(&mut self, offsets: &[u32]) -> Result<Self::Lines, HardwareError>;
}

/// PWM driver chip shared by all proportional outputs
///
/// Every method takes `&mut self`: callers must hold exclusive access to
/// the chip for as long as a multi-channel update is in progress.
pub trait PwmChip {
    /// Wake the chip; a failure here means the chip is unusable
    fn initialize(&mut self) -> Result<(), HardwareError>;

    fn set_pwm_frequency(&mut self, hz: f32) -> Result<(), HardwareError>;

    /// Drive one channel to `percent` duty, 0.0..=100.0
    fn set_duty(&mut self, channel: u8, percent: f32) -> Result<(), HardwareError>;

    /// Put the chip into low-power mode with all outputs off
    fn sleep(&mut self) -> Result<(), HardwareError>;
}
