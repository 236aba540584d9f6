// High-level vehicle controller for the four-wheel base
//
// Wraps a drivetrain behind one mutex so every motion renders to the motors
// as a single uninterrupted sequence of writes.

use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::{debug, info, warn};

use crate::config::{ChannelConfig, PinConfig};
use crate::error::{Error, Result};

use super::drivetrain::{Drivetrain, GpioDrivetrain, PwmDrivetrain};
use super::kinematics::{Motion, Wheel, WheelCommand};
use super::output::{GpioChip, PwmChip};

/// Whole-vehicle motion control
///
/// Every command and the teardown run under the controller's guard, so a
/// controller can be shared between threads (e.g. behind an `Arc`). Motors
/// and chip are reachable only through that guard.
///
/// Teardown happens once: on the first [`shutdown`](Self::shutdown) or on
/// drop. After that every command returns [`Error::ShutDown`].
pub struct VehicleController<D: Drivetrain> {
    // None once torn down
    drivetrain: Mutex<Option<D>>,
}

impl<C: GpioChip> VehicleController<GpioDrivetrain<C>> {
    /// Direction-only controller on GPIO lines
    pub fn with_gpio(chip: C, pins: &PinConfig) -> Result<Self> {
        info!("Initializing GPIO vehicle controller");
        Ok(Self::new(GpioDrivetrain::open(chip, pins)?))
    }
}

impl<C: PwmChip> VehicleController<PwmDrivetrain<C>> {
    /// Speed-scaled controller on a PWM driver chip
    pub fn with_pwm(chip: C, channels: &ChannelConfig) -> Result<Self> {
        info!("Initializing PWM vehicle controller");
        Ok(Self::new(PwmDrivetrain::open(chip, channels)?))
    }
}

impl<D: Drivetrain> VehicleController<D> {
    /// Wrap an already opened drivetrain
    pub fn new(drivetrain: D) -> Self {
        Self {
            drivetrain: Mutex::new(Some(drivetrain)),
        }
    }

    // Commands always re-issue complete state, so a guard poisoned by a
    // panicking caller is still safe to reuse.
    fn guard(&self) -> MutexGuard<'_, Option<D>> {
        self.drivetrain.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Whether wheel speeds (and combined move+turn motions) are available
    pub fn is_speed_scaled(&self) -> bool {
        D::SPEED_SCALED
    }

    /// Render a motion to all four wheels as one atomic update
    ///
    /// On a write error the remaining wheels are not touched and the error
    /// is returned; issue [`stop_all`](Self::stop_all) to recover.
    pub fn execute(&self, motion: Motion) -> Result<()> {
        if motion.needs_speed_control() && !D::SPEED_SCALED {
            return Err(Error::UnsupportedMotion(motion));
        }

        let mut guard = self.guard();
        let drivetrain = guard.as_mut().ok_or(Error::ShutDown)?;

        debug!("Executing {:?}", motion);
        for (wheel, command) in Wheel::ALL.into_iter().zip(motion.plan()) {
            drivetrain.drive(wheel, command)?;
        }
        Ok(())
    }

    pub fn move_forward(&self) -> Result<()> {
        self.execute(Motion::Forward)
    }

    pub fn move_backward(&self) -> Result<()> {
        self.execute(Motion::Backward)
    }

    /// Spin left in place: left side reverses, right side drives forward
    pub fn turn_left(&self) -> Result<()> {
        self.execute(Motion::TurnLeft)
    }

    /// Spin right in place: right side reverses, left side drives forward
    pub fn turn_right(&self) -> Result<()> {
        self.execute(Motion::TurnRight)
    }

    pub fn move_forward_and_turn_left(&self) -> Result<()> {
        self.execute(Motion::ForwardLeft)
    }

    pub fn move_forward_and_turn_right(&self) -> Result<()> {
        self.execute(Motion::ForwardRight)
    }

    pub fn move_backward_and_turn_left(&self) -> Result<()> {
        self.execute(Motion::BackwardLeft)
    }

    pub fn move_backward_and_turn_right(&self) -> Result<()> {
        self.execute(Motion::BackwardRight)
    }

    pub fn stop_all(&self) -> Result<()> {
        self.execute(Motion::Stop)
    }

    /// Last command rendered to each wheel, indexed by [`Wheel::index`]
    pub fn snapshot(&self) -> Result<[WheelCommand; 4]> {
        let guard = self.guard();
        let drivetrain = guard.as_ref().ok_or(Error::ShutDown)?;
        Ok(Wheel::ALL.map(|wheel| drivetrain.state(wheel)))
    }

    pub fn is_shut_down(&self) -> bool {
        self.guard().is_none()
    }

    /// Stop all motors, disable the driver and release the hardware
    ///
    /// Only the first call does anything. The hardware is released even if
    /// parking fails; the failure is returned.
    pub fn shutdown(&self) -> Result<()> {
        let mut guard = self.guard();
        let Some(mut drivetrain) = guard.take() else {
            return Ok(());
        };

        info!("Shutting down vehicle controller");
        let result = drivetrain.park();
        drop(drivetrain);
        info!("Hardware released");
        result
    }
}

impl<D: Drivetrain> Drop for VehicleController<D> {
    fn drop(&mut self) {
        // Try to leave the motors stopped (safety measure)
        if let Err(e) = self.shutdown() {
            warn!("Failed to park drivetrain on drop: {}", e);
        }
    }
}
