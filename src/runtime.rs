// Interactive and scripted drivers for a vehicle controller
// Note: the teleop watchdog stops the vehicle if key input stops arriving,
// e.g. the operator lets go of the key or the terminal stalls.

use std::thread::sleep;
use std::time::{Duration, Instant};

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use tracing::{info, warn};

use crate::config::{INPUT_TIMEOUT, LOOP_HZ};
use crate::error::{Error, Result};
use crate::motor::{Drivetrain, Motion, VehicleController};

/// Watchdog status of the teleop loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Health {
    Ok,
    InputStale,
}

/// Keyboard layout: WASD drives, Q/E and Z/C combine a move with a turn
pub fn motion_for_key(key: char) -> Option<Motion> {
    match key.to_ascii_lowercase() {
        'w' => Some(Motion::Forward),
        's' => Some(Motion::Backward),
        'a' => Some(Motion::TurnLeft),
        'd' => Some(Motion::TurnRight),
        'q' => Some(Motion::ForwardLeft),
        'e' => Some(Motion::ForwardRight),
        'z' => Some(Motion::BackwardLeft),
        'c' => Some(Motion::BackwardRight),
        ' ' => Some(Motion::Stop),
        _ => None,
    }
}

/// Teleop state: the requested motion plus the input watchdog
pub struct Teleop {
    requested: Motion,
    input_at: Instant,
    applied: Option<Motion>,
    health: Health,
}

impl Teleop {
    pub fn new(now: Instant) -> Self {
        Self {
            requested: Motion::Stop,
            input_at: now,
            applied: None,
            health: Health::InputStale, // Stale until the first key
        }
    }

    pub fn on_input(&mut self, motion: Motion, now: Instant) {
        self.requested = motion;
        self.input_at = now;
    }

    /// Motion to send this tick, or None if the vehicle already does it
    pub fn tick(&mut self, now: Instant) -> Option<Motion> {
        let input_age = now.saturating_duration_since(self.input_at);

        let motion = if input_age > INPUT_TIMEOUT {
            if self.health != Health::InputStale {
                warn!("Input stale ({:?} old), stopping vehicle", input_age);
            }
            self.health = Health::InputStale;
            Motion::Stop
        } else {
            self.health = Health::Ok;
            self.requested
        };

        if self.applied == Some(motion) {
            return None;
        }
        self.applied = Some(motion);
        Some(motion)
    }

    pub fn health(&self) -> Health {
        self.health
    }
}

/// Run a motion, logging instead of failing when the driver lacks speed control
fn try_execute<D: Drivetrain>(car: &VehicleController<D>, motion: Motion) -> Result<()> {
    match car.execute(motion) {
        Err(Error::UnsupportedMotion(motion)) => {
            warn!("{:?} needs a speed-scaled driver, ignoring", motion);
            Ok(())
        }
        other => other,
    }
}

/// Keyboard teleop until Esc is pressed; the vehicle is stopped on exit
pub fn run_teleop<D: Drivetrain>(car: &VehicleController<D>) -> Result<()> {
    info!("Controls: W/S=forward/back, A/D=turn, Q/E/Z/C=move+turn, Space=stop, Esc=quit");
    info!(
        "Teleop started: {}Hz loop, {}ms watchdog timeout",
        LOOP_HZ,
        INPUT_TIMEOUT.as_millis()
    );

    enable_raw_mode()?;
    let result = teleop_loop(car);
    disable_raw_mode()?;

    car.stop_all()?;
    result
}

fn teleop_loop<D: Drivetrain>(car: &VehicleController<D>) -> Result<()> {
    let mut teleop = Teleop::new(Instant::now());
    let period = Duration::from_millis(1000 / LOOP_HZ);

    loop {
        if event::poll(period)? {
            if let Event::Key(KeyEvent { code, kind, .. }) = event::read()? {
                let pressed = kind == KeyEventKind::Press || kind == KeyEventKind::Repeat;
                match code {
                    KeyCode::Esc => break,
                    KeyCode::Char(c) if pressed => {
                        if let Some(motion) = motion_for_key(c) {
                            teleop.on_input(motion, Instant::now());
                        }
                    }
                    _ => {}
                }
            }
        }

        if let Some(motion) = teleop.tick(Instant::now()) {
            try_execute(car, motion)?;
        }
    }

    Ok(())
}

/// Run every motion the driver supports for `step`, stopping in between
pub fn run_demo<D: Drivetrain>(car: &VehicleController<D>, step: Duration) -> Result<()> {
    for motion in Motion::ALL {
        if motion == Motion::Stop {
            continue;
        }
        if motion.needs_speed_control() && !car.is_speed_scaled() {
            info!("Skipping {:?} (direction-only driver)", motion);
            continue;
        }

        info!("{:?} for {}ms", motion, step.as_millis());
        car.execute(motion)?;
        sleep(step);

        car.stop_all()?;
        sleep(step / 2);
    }

    info!("Demo complete");
    Ok(())
}
