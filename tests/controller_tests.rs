use std::sync::Arc;
use std::thread;
use std::time::Duration;

use rover_drive::Error;
use rover_drive::config::{ChannelConfig, DEFAULT_CHANNELS, DEFAULT_PINS, PinConfig};
use rover_drive::error::{ConfigError, HardwareError};
use rover_drive::hal::mock::{MockChip, MockHardware, Write};
use rover_drive::motor::{Level, Motion, PwmDrivetrain, VehicleController, Wheel, WheelCommand};

const PWM_SPEED_CHANNELS: [u8; 4] = [0, 3, 6, 9];

fn pwm_car(hw: &MockHardware) -> VehicleController<PwmDrivetrain<MockChip>> {
    VehicleController::with_pwm(hw.pwm_chip(), &DEFAULT_CHANNELS).unwrap()
}

/// Writes a single motion produces on fresh hardware
fn pwm_pattern(motion: Motion) -> Vec<Write> {
    let hw = MockHardware::new();
    let car = pwm_car(&hw);
    hw.clear_writes();
    car.execute(motion).unwrap();
    hw.writes()
}

#[test]
fn test_new_controller_is_stopped() {
    let hw = MockHardware::new();
    let car = pwm_car(&hw);

    assert!(car.snapshot().unwrap().iter().all(|c| c.is_stopped()));
    for channel in 0..12 {
        assert_eq!(hw.duty(channel), Some(0.0), "channel {}", channel);
    }
}

#[test]
fn test_exact_speed_values() {
    let hw = MockHardware::new();
    let car = pwm_car(&hw);

    car.move_forward().unwrap();
    for ch in PWM_SPEED_CHANNELS {
        assert_eq!(hw.duty(ch), Some(50.0));
        assert_eq!(hw.duty(ch + 1), Some(100.0));
        assert_eq!(hw.duty(ch + 2), Some(0.0));
    }

    car.move_backward_and_turn_right().unwrap();
    // Right side is inner
    assert_eq!(hw.duty(0), Some(50.0));
    assert_eq!(hw.duty(3), Some(25.0));
    assert_eq!(hw.duty(6), Some(50.0));
    assert_eq!(hw.duty(9), Some(25.0));
    for ch in PWM_SPEED_CHANNELS {
        assert_eq!(hw.duty(ch + 1), Some(0.0));
        assert_eq!(hw.duty(ch + 2), Some(100.0));
    }
}

#[test]
fn test_turn_polarity() {
    let hw = MockHardware::new();
    let car = pwm_car(&hw);

    car.turn_left().unwrap();
    let state = car.snapshot().unwrap();
    assert_eq!(state[Wheel::FrontLeft.index()], WheelCommand::Reverse(50.0));
    assert_eq!(state[Wheel::BackLeft.index()], WheelCommand::Reverse(50.0));
    assert_eq!(state[Wheel::FrontRight.index()], WheelCommand::Forward(50.0));
    assert_eq!(state[Wheel::BackRight.index()], WheelCommand::Forward(50.0));
}

#[test]
fn test_forward_then_stop_all() {
    let hw = MockHardware::new();
    let car = VehicleController::with_gpio(hw.gpio(), &DEFAULT_PINS).unwrap();

    car.move_forward().unwrap();
    car.stop_all().unwrap();

    assert!(car.snapshot().unwrap().iter().all(|c| c.is_stopped()));
    for line in [17, 27, 22, 23, 24, 25, 5, 6] {
        assert_eq!(hw.line_level(line), Some(Level::Inactive), "line {}", line);
    }
    // Driver stays enabled until teardown
    assert_eq!(hw.line_level(26), Some(Level::Active));
}

#[test]
fn test_stop_is_idempotent() {
    let hw = MockHardware::new();
    let car = pwm_car(&hw);

    car.stop_all().unwrap();
    let once = hw.writes();
    car.stop_all().unwrap();
    let twice = hw.writes();

    assert_eq!(&twice[once.len()..], &once[once.len() - 12..]);
    assert!(car.snapshot().unwrap().iter().all(|c| c.is_stopped()));
}

#[test]
fn test_turn_left_twice_equals_once() {
    let hw = MockHardware::new();
    let car = VehicleController::with_gpio(hw.gpio(), &DEFAULT_PINS).unwrap();

    car.turn_left().unwrap();
    let once = car.snapshot().unwrap();
    let levels: Vec<_> = (0..32).map(|l| hw.line_level(l)).collect();

    car.turn_left().unwrap();
    assert_eq!(car.snapshot().unwrap(), once);
    let again: Vec<_> = (0..32).map(|l| hw.line_level(l)).collect();
    assert_eq!(again, levels);
}

#[test]
fn test_negative_standby_rejected_before_requests() {
    let hw = MockHardware::new();
    let pins = PinConfig {
        standby: Some(-1),
        ..DEFAULT_PINS
    };

    let result = VehicleController::with_gpio(hw.gpio(), &pins);
    assert!(matches!(
        result,
        Err(Error::Config(ConfigError::Negative { name: "standby", value: -1 }))
    ));
    assert!(hw.requests().is_empty());
    assert!(hw.writes().is_empty());
    assert!(!hw.gpio_open());
}

#[test]
fn test_failed_line_request_releases_everything() {
    let hw = MockHardware::new();
    // Back-right A line is held elsewhere
    hw.set_unavailable(5);

    let result = VehicleController::with_gpio(hw.gpio(), &DEFAULT_PINS);
    assert!(matches!(
        result,
        Err(Error::Hardware(HardwareError::LineRequest { line: 5, .. }))
    ));
    assert!(hw.claimed().is_empty());
    assert!(!hw.gpio_open());
    assert_eq!(hw.line_level(26), Some(Level::Inactive));
}

#[test]
fn test_frequency_failure_releases_chip() {
    let hw = MockHardware::new();
    hw.set_fail_frequency(true);

    let result = VehicleController::with_pwm(hw.pwm_chip(), &DEFAULT_CHANNELS);
    assert!(matches!(
        result,
        Err(Error::Hardware(HardwareError::Frequency { .. }))
    ));
    assert!(!hw.chip_open());
    // No motor was armed
    assert!(hw.writes().is_empty());
}

#[test]
fn test_missing_chip_fails_construction() {
    let hw = MockHardware::new();
    hw.set_fail_init(true);

    let result = VehicleController::with_pwm(hw.pwm_chip(), &DEFAULT_CHANNELS);
    assert!(matches!(
        result,
        Err(Error::Hardware(HardwareError::ChipNotInitialized { .. }))
    ));
    assert!(!hw.chip_open());
}

#[test]
fn test_duplicate_channel_rejected() {
    let hw = MockHardware::new();
    let mut channels: ChannelConfig = DEFAULT_CHANNELS;
    channels.back_right.b = 0;

    let result = VehicleController::with_pwm(hw.pwm_chip(), &channels);
    assert!(matches!(
        result,
        Err(Error::Config(ConfigError::Duplicate { .. }))
    ));
    assert!(hw.writes().is_empty());
}

#[test]
fn test_write_failure_then_recover() {
    let hw = MockHardware::new();
    let car = pwm_car(&hw);

    hw.set_fail_writes(true);
    assert!(matches!(car.move_forward(), Err(Error::Hardware(_))));

    hw.set_fail_writes(false);
    car.stop_all().unwrap();
    assert!(car.snapshot().unwrap().iter().all(|c| c.is_stopped()));
}

#[test]
fn test_teardown_once() {
    let hw = MockHardware::new();
    let car = VehicleController::with_gpio(hw.gpio(), &DEFAULT_PINS).unwrap();
    car.move_backward().unwrap();

    car.shutdown().unwrap();
    let writes = hw.writes().len();
    assert!(hw.claimed().is_empty());

    car.shutdown().unwrap();
    assert!(matches!(car.stop_all(), Err(Error::ShutDown)));
    drop(car);
    assert_eq!(hw.writes().len(), writes);
}

#[test]
fn test_concurrent_commands_never_interleave() {
    let forward = pwm_pattern(Motion::Forward);
    let left = pwm_pattern(Motion::TurnLeft);
    assert_eq!(forward.len(), 12);

    let hw = MockHardware::new();
    let car = Arc::new(pwm_car(&hw));
    hw.clear_writes();
    hw.set_write_delay(Duration::from_micros(200));

    let handles: Vec<_> = [Motion::Forward, Motion::TurnLeft]
        .into_iter()
        .map(|motion| {
            let car = Arc::clone(&car);
            thread::spawn(move || {
                for _ in 0..10 {
                    car.execute(motion).unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let writes = hw.writes();
    assert_eq!(writes.len(), 20 * 12);
    for chunk in writes.chunks(12) {
        assert!(chunk == forward.as_slice() || chunk == left.as_slice());
    }
}

#[test]
fn test_concurrent_gpio_commands_never_interleave() {
    let hw = MockHardware::new();
    let car = Arc::new(VehicleController::with_gpio(hw.gpio(), &DEFAULT_PINS).unwrap());
    hw.set_write_delay(Duration::from_micros(200));

    let handles: Vec<_> = [Motion::Backward, Motion::TurnRight]
        .into_iter()
        .map(|motion| {
            let car = Arc::clone(&car);
            thread::spawn(move || {
                for _ in 0..10 {
                    car.execute(motion).unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let final_state = car.snapshot().unwrap();
    let backward = [WheelCommand::Reverse(100.0); 4];
    let right = [
        WheelCommand::Forward(100.0),
        WheelCommand::Reverse(100.0),
        WheelCommand::Forward(100.0),
        WheelCommand::Reverse(100.0),
    ];
    assert!(final_state == backward || final_state == right);
}

#[test]
fn test_end_to_end_default_pwm() {
    let hw = MockHardware::new();
    let car = pwm_car(&hw);

    car.move_forward_and_turn_left().unwrap();
    // Left side is inner
    assert_eq!(hw.duty(0), Some(25.0));
    assert_eq!(hw.duty(6), Some(25.0));
    assert_eq!(hw.duty(3), Some(50.0));
    assert_eq!(hw.duty(9), Some(50.0));
    for ch in PWM_SPEED_CHANNELS {
        assert_eq!(hw.duty(ch + 1), Some(100.0));
        assert_eq!(hw.duty(ch + 2), Some(0.0));
    }

    car.stop_all().unwrap();
    for channel in 0..12 {
        assert_eq!(hw.duty(channel), Some(0.0));
    }

    drop(car);
    assert_eq!(hw.writes().last(), Some(&Write::Sleep));
    assert!(!hw.chip_open());
}
