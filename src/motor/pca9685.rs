// PCA9685 16-channel PWM driver as a PwmChip
//
// Register programming is left to the pwm-pca9685 crate; this module only
// converts percent duty and Hz into its counts and prescale values.

use embedded_hal::i2c::I2c;
use pwm_pca9685::{Channel, Pca9685};

use crate::error::HardwareError;

use super::output::PwmChip;

/// Internal oscillator frequency
const OSCILLATOR_HZ: f32 = 25_000_000.0;

/// Counter steps per PWM period
const COUNTS: f32 = 4096.0;

/// Prescale limits accepted by the chip
const PRESCALE_MIN: f32 = 3.0;
const PRESCALE_MAX: f32 = 255.0;

/// How a duty cycle maps onto the channel registers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DutyCounts {
    FullOff,
    FullOn,
    /// Output turns on at count 0 and off at this count
    Off(u16),
}

impl DutyCounts {
    pub fn from_percent(percent: f32) -> Self {
        if percent <= 0.0 {
            DutyCounts::FullOff
        } else if percent >= 100.0 {
            DutyCounts::FullOn
        } else {
            let counts = (percent / 100.0 * COUNTS).round().clamp(1.0, COUNTS - 1.0);
            DutyCounts::Off(counts as u16)
        }
    }
}

/// Prescale register value for a PWM frequency, if the chip can produce it
pub fn prescale_for(hz: f32) -> Option<u8> {
    let prescale = (OSCILLATOR_HZ / (COUNTS * hz)).round() - 1.0;
    (PRESCALE_MIN..=PRESCALE_MAX)
        .contains(&prescale)
        .then_some(prescale as u8)
}

fn channel(index: u8) -> Option<Channel> {
    let channel = match index {
        0 => Channel::C0,
        1 => Channel::C1,
        2 => Channel::C2,
        3 => Channel::C3,
        4 => Channel::C4,
        5 => Channel::C5,
        6 => Channel::C6,
        7 => Channel::C7,
        8 => Channel::C8,
        9 => Channel::C9,
        10 => Channel::C10,
        11 => Channel::C11,
        12 => Channel::C12,
        13 => Channel::C13,
        14 => Channel::C14,
        15 => Channel::C15,
        _ => return None,
    };
    Some(channel)
}

impl<I2C, E> PwmChip for Pca9685<I2C>
where
    I2C: I2c<Error = E>,
    E: core::fmt::Debug,
{
    fn initialize(&mut self) -> Result<(), HardwareError> {
        self.enable()
            .map_err(|e| HardwareError::ChipNotInitialized {
                reason: format!("{:?}", e),
            })
    }

    fn set_pwm_frequency(&mut self, hz: f32) -> Result<(), HardwareError> {
        let prescale = prescale_for(hz).ok_or_else(|| HardwareError::Frequency {
            hz,
            reason: "outside the range the oscillator can divide to".to_string(),
        })?;

        self.set_prescale(prescale)
            .map_err(|e| HardwareError::Frequency {
                hz,
                reason: format!("{:?}", e),
            })
    }

    fn set_duty(&mut self, index: u8, percent: f32) -> Result<(), HardwareError> {
        let output = format!("PWM channel {}", index);
        let Some(channel) = channel(index) else {
            return Err(HardwareError::Write {
                output,
                reason: "no such channel".to_string(),
            });
        };

        // Full-off in the OFF register overrides any ON setting, so full-on
        // must clear it; it stays off until the second write lands.
        let result = match DutyCounts::from_percent(percent) {
            DutyCounts::FullOff => self.set_channel_full_off(channel),
            DutyCounts::FullOn => self
                .set_channel_full_on(channel, 0)
                .and_then(|_| self.set_channel_off(channel, 0)),
            DutyCounts::Off(off) => self.set_channel_on_off(channel, 0, off),
        };

        result.map_err(|e| HardwareError::Write {
            output,
            reason: format!("{:?}", e),
        })
    }

    fn sleep(&mut self) -> Result<(), HardwareError> {
        self.disable().map_err(|e| HardwareError::Write {
            output: "PCA9685 MODE1".to_string(),
            reason: format!("{:?}", e),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal_mock::eh1::i2c::{Mock as I2cMock, Transaction as I2cTrans};
    use pwm_pca9685::Address as PwmAddress;

    const ADDRESS: u8 = 0x40;

    #[test]
    fn test_duty_counts() {
        assert_eq!(DutyCounts::from_percent(0.0), DutyCounts::FullOff);
        assert_eq!(DutyCounts::from_percent(100.0), DutyCounts::FullOn);
        assert_eq!(DutyCounts::from_percent(50.0), DutyCounts::Off(2048));
        assert_eq!(DutyCounts::from_percent(25.0), DutyCounts::Off(1024));
        // Tiny but non-zero duty must still produce an edge
        assert_eq!(DutyCounts::from_percent(0.001), DutyCounts::Off(1));
        assert_eq!(DutyCounts::from_percent(99.999), DutyCounts::Off(4095));
    }

    #[test]
    fn test_prescale() {
        // 25 MHz / (4096 * 1000 Hz) = 6.1 -> 6 - 1
        assert_eq!(prescale_for(1000.0), Some(5));
        assert_eq!(prescale_for(60.0), Some(101));
        assert_eq!(prescale_for(10.0), None);
        assert_eq!(prescale_for(5000.0), None);
    }

    #[test]
    fn test_channel_lookup() {
        assert!(matches!(channel(0), Some(Channel::C0)));
        assert!(matches!(channel(15), Some(Channel::C15)));
        assert!(channel(16).is_none());
    }

    #[test]
    fn test_initialize_and_frequency_transactions() {
        // Wake, then sleep / write prescale / wake again
        let expectations = [
            I2cTrans::write(ADDRESS, vec![0x00, 0x01]),
            I2cTrans::write(ADDRESS, vec![0x00, 0x11]),
            I2cTrans::write(ADDRESS, vec![0xFE, 5]),
            I2cTrans::write(ADDRESS, vec![0x00, 0x01]),
        ];

        let mut mock = I2cMock::new(&expectations);
        {
            let mut pwm = Pca9685::new(&mut mock, PwmAddress::from(ADDRESS)).unwrap();
            pwm.initialize().unwrap();
            pwm.set_pwm_frequency(1000.0).unwrap();
        }
        mock.done();
    }

    #[test]
    fn test_duty_register_writes() {
        // Channel 1: ON_L = 0x0A, OFF_L = 0x0C; bit 4 of the _H byte is full on/off
        let expectations = [
            // initialize
            I2cTrans::write(ADDRESS, vec![0x00, 0x01]),
            // 0%: auto-increment enabled on first register write, then full off
            I2cTrans::write(ADDRESS, vec![0x00, 0x21]),
            I2cTrans::write(ADDRESS, vec![0x0C, 0x00, 0x10]),
            // 100%: full on, then clear full off
            I2cTrans::write(ADDRESS, vec![0x0A, 0x00, 0x10]),
            I2cTrans::write(ADDRESS, vec![0x0C, 0x00, 0x00]),
            // 50%: ON = 0, OFF = 2048
            I2cTrans::write(ADDRESS, vec![0x0A, 0x00, 0x00, 0x00, 0x08]),
            // 0% again
            I2cTrans::write(ADDRESS, vec![0x0C, 0x00, 0x10]),
            // sleep
            I2cTrans::write(ADDRESS, vec![0x00, 0x31]),
        ];

        let mut mock = I2cMock::new(&expectations);
        {
            let mut pwm = Pca9685::new(&mut mock, PwmAddress::from(ADDRESS)).unwrap();
            pwm.initialize().unwrap();
            pwm.set_duty(1, 0.0).unwrap();
            pwm.set_duty(1, 100.0).unwrap();
            pwm.set_duty(1, 50.0).unwrap();
            pwm.set_duty(1, 0.0).unwrap();
            pwm.sleep().unwrap();
        }
        mock.done();
    }

    #[test]
    fn test_rejects_without_touching_bus() {
        let mut mock = I2cMock::new(&[] as &[I2cTrans]);
        {
            let mut pwm = Pca9685::new(&mut mock, PwmAddress::from(ADDRESS)).unwrap();
            assert!(matches!(
                pwm.set_pwm_frequency(10.0),
                Err(HardwareError::Frequency { .. })
            ));
            assert!(matches!(
                pwm.set_duty(16, 50.0),
                Err(HardwareError::Write { .. })
            ));
        }
        mock.done();
    }
}
