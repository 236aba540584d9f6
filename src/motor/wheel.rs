// Single-wheel motors
//
// Neither motor locks anything: the vehicle controller holds its guard for
// the whole of every multi-output update.

use crate::config::{MotorChannels, MotorLines, SPEED_FULL};
use crate::error::{Error, Result};

use super::kinematics::WheelCommand;
use super::output::{Level, LineGroup, PwmChip};

/// Direction-only motor on two H-bridge lines
pub struct LineMotor<L> {
    lines: L,
    pins: MotorLines,
    state: WheelCommand,
}

impl<L: LineGroup> LineMotor<L> {
    /// Take ownership of the line group and drive it to the stop state
    pub fn new(lines: L, pins: MotorLines) -> Result<Self> {
        let mut motor = Self {
            lines,
            pins,
            state: WheelCommand::Stop,
        };
        motor.stop()?;
        Ok(motor)
    }

    pub fn forward(&mut self) -> Result<()> {
        self.lines.set(self.pins.b, Level::Inactive)?;
        self.lines.set(self.pins.a, Level::Active)?;
        self.state = WheelCommand::Forward(SPEED_FULL);
        Ok(())
    }

    pub fn reverse(&mut self) -> Result<()> {
        self.lines.set(self.pins.a, Level::Inactive)?;
        self.lines.set(self.pins.b, Level::Active)?;
        self.state = WheelCommand::Reverse(SPEED_FULL);
        Ok(())
    }

    pub fn stop(&mut self) -> Result<()> {
        self.lines.set(self.pins.a, Level::Inactive)?;
        self.lines.set(self.pins.b, Level::Inactive)?;
        self.state = WheelCommand::Stop;
        Ok(())
    }

    /// Apply a wheel command; the speed is ignored, lines are either on or off
    pub fn drive(&mut self, command: WheelCommand) -> Result<()> {
        match command {
            WheelCommand::Forward(_) => self.forward(),
            WheelCommand::Reverse(_) => self.reverse(),
            WheelCommand::Stop => self.stop(),
        }
    }

    /// Last command rendered to the lines
    pub fn state(&self) -> WheelCommand {
        self.state
    }
}

/// Speed-scaled motor on three PWM channels
///
/// The motor only stores channel numbers. The chip is borrowed from the
/// owning controller for the duration of each call.
#[derive(Debug)]
pub struct PwmMotor {
    channels: MotorChannels,
    state: WheelCommand,
}

impl PwmMotor {
    pub fn new<C: PwmChip + ?Sized>(chip: &mut C, channels: MotorChannels) -> Result<Self> {
        let mut motor = Self {
            channels,
            state: WheelCommand::Stop,
        };
        motor.stop(chip)?;
        Ok(motor)
    }

    /// Speed channel at `speed` percent, A fully on, B off
    pub fn forward<C: PwmChip + ?Sized>(&mut self, chip: &mut C, speed: f32) -> Result<()> {
        let speed = check_speed(speed)?;
        chip.set_duty(self.channels.b, 0.0)?;
        chip.set_duty(self.channels.a, 100.0)?;
        chip.set_duty(self.channels.speed, speed)?;
        self.state = WheelCommand::Forward(speed);
        Ok(())
    }

    /// Speed channel at `speed` percent, B fully on, A off
    pub fn reverse<C: PwmChip + ?Sized>(&mut self, chip: &mut C, speed: f32) -> Result<()> {
        let speed = check_speed(speed)?;
        chip.set_duty(self.channels.a, 0.0)?;
        chip.set_duty(self.channels.b, 100.0)?;
        chip.set_duty(self.channels.speed, speed)?;
        self.state = WheelCommand::Reverse(speed);
        Ok(())
    }

    pub fn stop<C: PwmChip + ?Sized>(&mut self, chip: &mut C) -> Result<()> {
        chip.set_duty(self.channels.speed, 0.0)?;
        chip.set_duty(self.channels.a, 0.0)?;
        chip.set_duty(self.channels.b, 0.0)?;
        self.state = WheelCommand::Stop;
        Ok(())
    }

    pub fn drive<C: PwmChip + ?Sized>(&mut self, chip: &mut C, command: WheelCommand) -> Result<()> {
        match command {
            WheelCommand::Forward(speed) => self.forward(chip, speed),
            WheelCommand::Reverse(speed) => self.reverse(chip, speed),
            WheelCommand::Stop => self.stop(chip),
        }
    }

    pub fn state(&self) -> WheelCommand {
        self.state
    }
}

fn check_speed(speed: f32) -> Result<f32> {
    if (0.0..=100.0).contains(&speed) {
        Ok(speed)
    } else {
        Err(Error::InvalidSpeed(speed))
    }
}
