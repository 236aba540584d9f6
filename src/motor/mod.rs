// Motor control module for the four-wheel skid-steer base
//
// Provides:
// - Output capabilities (GPIO line groups, PWM driver chips)
// - Single-wheel motors for direction-only and speed-scaled drivers
// - Skid-steer mapping from vehicle motions to wheel commands
// - High-level vehicle controller API

mod driver;
mod drivetrain;
pub mod kinematics;
pub mod output;
pub mod pca9685;
mod wheel;

pub use driver::VehicleController;
pub use drivetrain::{Drivetrain, GpioDrivetrain, PwmDrivetrain};
pub use kinematics::{Motion, Wheel, WheelCommand};
pub use output::{GpioChip, Level, LineGroup, PwmChip};
pub use wheel::{LineMotor, PwmMotor};
