//! Raspberry Pi GPIO lines and I2C bus, via rppal.
//!
//! Line offsets are BCM GPIO numbers. Pins return to their previous mode
//! when the [`RpiLines`] holding them is dropped.

use pwm_pca9685::{Address as PwmAddress, Pca9685};
use rppal::gpio::{Gpio, OutputPin};
use rppal::i2c::I2c;
use tracing::{debug, info};

use crate::config::ChannelConfig;
use crate::error::HardwareError;
use crate::motor::{GpioChip, Level, LineGroup};

/// The Pi's GPIO peripheral
pub struct RpiGpio {
    gpio: Gpio,
}

impl RpiGpio {
    pub fn open() -> Result<Self, HardwareError> {
        let gpio = Gpio::new().map_err(|e| HardwareError::Open {
            device: "/dev/gpiomem".to_string(),
            reason: e.to_string(),
        })?;
        info!("Opened Raspberry Pi GPIO");
        Ok(Self { gpio })
    }
}

/// Output pins claimed by one request
pub struct RpiLines {
    pins: Vec<(u32, OutputPin)>,
}

impl GpioChip for RpiGpio {
    type Lines = RpiLines;

    fn request_lines(&mut self, offsets: &[u32]) -> Result<RpiLines, HardwareError> {
        // Pins claimed before a failure are dropped with `pins`, releasing them
        let mut pins = Vec::with_capacity(offsets.len());
        for &line in offsets {
            let bcm = u8::try_from(line).map_err(|_| HardwareError::LineRequest {
                line,
                reason: "not a BCM GPIO number".to_string(),
            })?;
            let pin = self.gpio.get(bcm).map_err(|e| HardwareError::LineRequest {
                line,
                reason: e.to_string(),
            })?;
            pins.push((line, pin.into_output_low()));
        }
        debug!("Claimed GPIO lines {:?}", offsets);
        Ok(RpiLines { pins })
    }
}

impl LineGroup for RpiLines {
    fn set(&mut self, offset: u32, level: Level) -> Result<(), HardwareError> {
        let (_, pin) = self
            .pins
            .iter_mut()
            .find(|(line, _)| *line == offset)
            .ok_or_else(|| HardwareError::Write {
                output: format!("GPIO {}", offset),
                reason: "line not part of this request".to_string(),
            })?;

        match level {
            Level::Active => pin.set_high(),
            Level::Inactive => pin.set_low(),
        }
        Ok(())
    }
}

/// Open the configured I2C bus and bind a PCA9685 driver to it
pub fn open_pca9685(config: &ChannelConfig) -> Result<Pca9685<I2c>, HardwareError> {
    let device = config.i2c_device();
    let i2c = I2c::with_bus(config.i2c_bus).map_err(|e| HardwareError::Open {
        device: device.clone(),
        reason: e.to_string(),
    })?;

    let pwm = Pca9685::new(i2c, PwmAddress::from(config.i2c_address)).map_err(|e| {
        HardwareError::ChipNotInitialized {
            reason: format!("{:?}", e),
        }
    })?;
    info!(
        "Opened PCA9685 at 0x{:02X} on {}",
        config.i2c_address, device
    );
    Ok(pwm)
}
