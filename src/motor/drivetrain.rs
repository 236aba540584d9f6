// Four motors plus the shared hardware they hang off
//
// A drivetrain owns every hardware handle of one binding mode. Dropping it
// releases them; `park` brings the hardware to its safe state first.

use tracing::{info, warn};

use crate::config::{ChannelConfig, DriverLines, PinConfig};
use crate::error::{Error, Result};

use super::kinematics::{Wheel, WheelCommand};
use super::output::{GpioChip, Level, LineGroup, PwmChip};
use super::wheel::{LineMotor, PwmMotor};

/// Hardware behind a [`VehicleController`](super::VehicleController)
pub trait Drivetrain {
    /// Whether wheel speeds are honoured (and combined move+turn is possible)
    const SPEED_SCALED: bool;

    fn drive(&mut self, wheel: Wheel, command: WheelCommand) -> Result<()>;

    /// Last command rendered to a wheel
    fn state(&self, wheel: Wheel) -> WheelCommand;

    /// Stop every motor, then disable the driver.
    ///
    /// Every step is attempted even if an earlier one fails; the first
    /// error is returned.
    fn park(&mut self) -> Result<()>;
}

/// Keep the first error, log the rest
fn first_error(first: &mut Option<Error>, result: Result<()>) {
    if let Err(e) = result {
        match first {
            None => *first = Some(e),
            Some(_) => warn!("Additional failure while parking: {}", e),
        }
    }
}

/// Direction-only drivetrain on GPIO lines, with an optional standby line
pub struct GpioDrivetrain<C: GpioChip> {
    motors: [LineMotor<C::Lines>; 4],
    standby: Option<(C::Lines, u32)>,
    // Dropped last, after every line it handed out
    _chip: C,
}

impl<C: GpioChip> GpioDrivetrain<C> {
    /// Validate the pins, enable the driver and arm the four motors.
    ///
    /// Nothing is requested from the chip if the config is invalid. If a
    /// later request fails, standby is driven inactive again and every line
    /// claimed so far is released.
    pub fn open(mut chip: C, config: &PinConfig) -> Result<Self> {
        let lines = config.validate()?;

        let mut standby = match lines.standby {
            Some(offset) => {
                let mut group = chip.request_lines(&[offset])?;
                group.set(offset, Level::Active)?;
                info!("Standby line {} active", offset);
                Some((group, offset))
            }
            None => None,
        };

        let motors = match Self::arm_motors(&mut chip, &lines) {
            Ok(motors) => motors,
            Err(e) => {
                if let Some((group, offset)) = standby.as_mut() {
                    if let Err(e) = group.set(*offset, Level::Inactive) {
                        warn!("Failed to disable standby after failed init: {}", e);
                    }
                }
                return Err(e);
            }
        };

        info!("GPIO drivetrain ready");
        Ok(Self {
            motors,
            standby,
            _chip: chip,
        })
    }

    fn arm_motors(chip: &mut C, lines: &DriverLines) -> Result<[LineMotor<C::Lines>; 4]> {
        let mut arm = |wheel: Wheel| -> Result<LineMotor<C::Lines>> {
            let pins = lines.wheel(wheel);
            let group = chip.request_lines(&[pins.a, pins.b])?;
            LineMotor::new(group, pins)
        };

        Ok([
            arm(Wheel::FrontLeft)?,
            arm(Wheel::FrontRight)?,
            arm(Wheel::BackLeft)?,
            arm(Wheel::BackRight)?,
        ])
    }
}

impl<C: GpioChip> Drivetrain for GpioDrivetrain<C> {
    const SPEED_SCALED: bool = false;

    fn drive(&mut self, wheel: Wheel, command: WheelCommand) -> Result<()> {
        self.motors[wheel.index()].drive(command)
    }

    fn state(&self, wheel: Wheel) -> WheelCommand {
        self.motors[wheel.index()].state()
    }

    fn park(&mut self) -> Result<()> {
        let mut first = None;
        for motor in &mut self.motors {
            first_error(&mut first, motor.stop());
        }
        if let Some((group, offset)) = self.standby.as_mut() {
            first_error(&mut first, group.set(*offset, Level::Inactive).map_err(Error::from));
        }
        first.map_or(Ok(()), Err)
    }
}

/// Speed-scaled drivetrain on a PCA9685-style PWM chip
pub struct PwmDrivetrain<C: PwmChip> {
    motors: [PwmMotor; 4],
    chip: C,
}

impl<C: PwmChip> PwmDrivetrain<C> {
    /// Validate the channels, wake the chip, program the PWM frequency and
    /// arm the four motors. The chip is dropped (bus released) on failure.
    pub fn open(mut chip: C, config: &ChannelConfig) -> Result<Self> {
        let channels = config.validate()?;

        chip.initialize()?;
        chip.set_pwm_frequency(channels.pwm_frequency_hz)?;
        info!("PWM frequency set to {} Hz", channels.pwm_frequency_hz);

        let motors = [
            PwmMotor::new(&mut chip, channels.wheel(Wheel::FrontLeft))?,
            PwmMotor::new(&mut chip, channels.wheel(Wheel::FrontRight))?,
            PwmMotor::new(&mut chip, channels.wheel(Wheel::BackLeft))?,
            PwmMotor::new(&mut chip, channels.wheel(Wheel::BackRight))?,
        ];

        info!("PWM drivetrain ready");
        Ok(Self { motors, chip })
    }
}

impl<C: PwmChip> Drivetrain for PwmDrivetrain<C> {
    const SPEED_SCALED: bool = true;

    fn drive(&mut self, wheel: Wheel, command: WheelCommand) -> Result<()> {
        self.motors[wheel.index()].drive(&mut self.chip, command)
    }

    fn state(&self, wheel: Wheel) -> WheelCommand {
        self.motors[wheel.index()].state()
    }

    fn park(&mut self) -> Result<()> {
        let mut first = None;
        for motor in &mut self.motors {
            first_error(&mut first, motor.stop(&mut self.chip));
        }
        first_error(&mut first, self.chip.sleep().map_err(Error::from));
        first.map_or(Ok(()), Err)
    }
}
