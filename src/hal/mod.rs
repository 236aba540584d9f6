//! Hardware backends for the output capabilities.
//!
//! - [`mock`]: simulated GPIO and PWM chips (tests, `--dry-run`)
//! - `rpi`: Raspberry Pi GPIO lines and I2C bus via rppal (feature `rpi`)
//!
//! The PCA9685 itself is driven through [`crate::motor::pca9685`] on top of
//! any `embedded_hal::i2c::I2c` bus.

pub mod mock;

#[cfg(feature = "rpi")]
pub mod rpi;
