// Pin/channel configuration, drive speeds and hardware defaults
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{ConfigError, Result};
use crate::motor::Wheel;

// Drive speeds (percent duty on the speed channel)
pub const SPEED_NORMAL: f32 = 50.0; // base / outer wheel speed
pub const SPEED_TURN_INNER: f32 = 25.0; // inner wheels during a combined move+turn
pub const SPEED_FULL: f32 = 100.0;

// PCA9685 defaults
pub const DEFAULT_I2C_BUS: u8 = 1; // /dev/i2c-1
pub const DEFAULT_PCA9685_ADDRESS: u8 = 0x40;
pub const DEFAULT_PWM_FREQUENCY_HZ: f32 = 1000.0;
pub const PCA9685_CHANNELS: u8 = 16;

// Teleop loop
pub const LOOP_HZ: u64 = 50;

// Stop the vehicle if no key input arrives within this window. Must exceed
// the keyboard auto-repeat delay (typically 500-660 ms) or a held key stalls
// between the first press and the first repeat.
pub const INPUT_TIMEOUT: Duration = Duration::from_millis(750);

// Highest GPIO line offset accepted by the configuration
pub const MAX_GPIO_LINE: i32 = 255;

/// Direction lines for one wheel on an H-bridge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinePair {
    pub a: i32,
    pub b: i32,
}

/// GPIO lines for direction-only mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PinConfig {
    pub front_left: LinePair,
    pub front_right: LinePair,
    pub back_left: LinePair,
    pub back_right: LinePair,
    /// Standby line of the H-bridge, held active while the controller lives
    pub standby: Option<i32>,
}

pub const DEFAULT_PINS: PinConfig = PinConfig {
    front_left: LinePair { a: 17, b: 27 },
    front_right: LinePair { a: 22, b: 23 },
    back_left: LinePair { a: 24, b: 25 },
    back_right: LinePair { a: 5, b: 6 },
    standby: Some(26),
};

impl Default for PinConfig {
    fn default() -> Self {
        DEFAULT_PINS
    }
}

/// PCA9685 channels for one wheel: speed PWM plus two direction enables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelTriple {
    pub speed: i32,
    pub a: i32,
    pub b: i32,
}

/// PCA9685 channels and bus settings for speed-scaled mode
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelConfig {
    pub front_left: ChannelTriple,
    pub front_right: ChannelTriple,
    pub back_left: ChannelTriple,
    pub back_right: ChannelTriple,
    pub i2c_bus: u8,
    pub i2c_address: u8,
    pub pwm_frequency_hz: f32,
}

pub const DEFAULT_CHANNELS: ChannelConfig = ChannelConfig {
    front_left: ChannelTriple { speed: 0, a: 1, b: 2 },
    front_right: ChannelTriple { speed: 3, a: 4, b: 5 },
    back_left: ChannelTriple { speed: 6, a: 7, b: 8 },
    back_right: ChannelTriple { speed: 9, a: 10, b: 11 },
    i2c_bus: DEFAULT_I2C_BUS,
    i2c_address: DEFAULT_PCA9685_ADDRESS,
    pwm_frequency_hz: DEFAULT_PWM_FREQUENCY_HZ,
};

impl Default for ChannelConfig {
    fn default() -> Self {
        DEFAULT_CHANNELS
    }
}

/// Everything a config file may override
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DriveConfig {
    pub gpio: PinConfig,
    pub pwm: ChannelConfig,
}

/// Validated line offsets for one wheel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MotorLines {
    pub a: u32,
    pub b: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriverLines {
    pub wheels: [MotorLines; 4],
    pub standby: Option<u32>,
}

impl DriverLines {
    pub fn wheel(&self, wheel: Wheel) -> MotorLines {
        self.wheels[wheel.index()]
    }
}

/// Validated PCA9685 channels for one wheel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MotorChannels {
    pub speed: u8,
    pub a: u8,
    pub b: u8,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DriverChannels {
    pub wheels: [MotorChannels; 4],
    pub pwm_frequency_hz: f32,
}

impl DriverChannels {
    pub fn wheel(&self, wheel: Wheel) -> MotorChannels {
        self.wheels[wheel.index()]
    }
}

/// Range and uniqueness checks shared by both binding modes
struct IdCheck {
    max: i32,
    seen: HashMap<i32, &'static str>,
}

impl IdCheck {
    fn new(max: i32) -> Self {
        Self {
            max,
            seen: HashMap::new(),
        }
    }

    fn check(&mut self, name: &'static str, value: i32) -> std::result::Result<i32, ConfigError> {
        if value < 0 {
            return Err(ConfigError::Negative { name, value });
        }
        if value > self.max {
            return Err(ConfigError::OutOfRange {
                name,
                value,
                max: self.max,
            });
        }
        if let Some(&other) = self.seen.get(&value) {
            return Err(ConfigError::Duplicate { name, other, value });
        }
        self.seen.insert(value, name);
        Ok(value)
    }
}

impl PinConfig {
    /// Check every identifier and convert to line offsets
    ///
    /// The standby line is checked first so that a bad enable pin is
    /// reported even when the wheel pins are also wrong.
    pub fn validate(&self) -> std::result::Result<DriverLines, ConfigError> {
        let mut ids = IdCheck::new(MAX_GPIO_LINE);

        let standby = match self.standby {
            Some(pin) => Some(ids.check("standby", pin)? as u32),
            None => None,
        };

        let names = [
            ("front_left.a", "front_left.b"),
            ("front_right.a", "front_right.b"),
            ("back_left.a", "back_left.b"),
            ("back_right.a", "back_right.b"),
        ];
        let pairs = [
            self.front_left,
            self.front_right,
            self.back_left,
            self.back_right,
        ];

        let mut wheels = [MotorLines { a: 0, b: 0 }; 4];
        for ((slot, pair), (name_a, name_b)) in wheels.iter_mut().zip(pairs).zip(names) {
            slot.a = ids.check(name_a, pair.a)? as u32;
            slot.b = ids.check(name_b, pair.b)? as u32;
        }

        Ok(DriverLines { wheels, standby })
    }
}

impl ChannelConfig {
    /// Check channel identifiers, bus address and frequency
    pub fn validate(&self) -> std::result::Result<DriverChannels, ConfigError> {
        if !(0x40..=0x7F).contains(&self.i2c_address) {
            return Err(ConfigError::Address(self.i2c_address));
        }
        if !self.pwm_frequency_hz.is_finite() || self.pwm_frequency_hz <= 0.0 {
            return Err(ConfigError::Frequency(self.pwm_frequency_hz));
        }

        let mut ids = IdCheck::new(PCA9685_CHANNELS as i32 - 1);
        let names = [
            ("front_left.speed", "front_left.a", "front_left.b"),
            ("front_right.speed", "front_right.a", "front_right.b"),
            ("back_left.speed", "back_left.a", "back_left.b"),
            ("back_right.speed", "back_right.a", "back_right.b"),
        ];
        let triples = [
            self.front_left,
            self.front_right,
            self.back_left,
            self.back_right,
        ];

        let mut wheels = [MotorChannels { speed: 0, a: 0, b: 0 }; 4];
        for ((slot, triple), (name_s, name_a, name_b)) in wheels.iter_mut().zip(triples).zip(names)
        {
            slot.speed = ids.check(name_s, triple.speed)? as u8;
            slot.a = ids.check(name_a, triple.a)? as u8;
            slot.b = ids.check(name_b, triple.b)? as u8;
        }

        Ok(DriverChannels {
            wheels,
            pwm_frequency_hz: self.pwm_frequency_hz,
        })
    }

    /// Device path of the configured I2C bus
    pub fn i2c_device(&self) -> String {
        format!("/dev/i2c-{}", self.i2c_bus)
    }
}

/// Load a JSON config file; missing sections and fields keep their defaults
pub fn load(path: impl AsRef<Path>) -> Result<DriveConfig> {
    let path = path.as_ref();
    info!("Loading drive config from {}", path.display());
    let text = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}
