//! Motion control for a four-wheel skid-steer vehicle.
//!
//! Two binding modes are supported:
//! - direction-only motors on GPIO lines, with an optional driver standby line
//! - speed-scaled motors on a PCA9685 PWM driver (speed, A and B channel per motor)
//!
//! [`motor::VehicleController`] is the entry point; [`hal`] provides the
//! hardware backends it runs on.

pub mod config;
pub mod error;
pub mod hal;
pub mod motor;
pub mod runtime;

pub use error::{Error, Result};
