//! Mock GPIO and PWM hardware for testing and dry runs.
//!
//! All mocks created from one [`MockHardware`] share a single state: the
//! ordered log of every output write, the set of claimed lines, and the
//! failure switches. Keep a clone of the `MockHardware` handle to inspect
//! what a controller did after the mocks have been moved into it.
//!
//! ```rust
//! use rover_drive::hal::mock::{MockHardware, Write};
//! use rover_drive::motor::{Level, VehicleController};
//! use rover_drive::config::DEFAULT_PINS;
//!
//! let hw = MockHardware::new();
//! let car = VehicleController::with_gpio(hw.gpio(), &DEFAULT_PINS).unwrap();
//! car.move_forward().unwrap();
//! assert_eq!(hw.line_level(17), Some(Level::Active));
//! ```

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tracing::debug;

use crate::config::PCA9685_CHANNELS;
use crate::error::HardwareError;
use crate::motor::{GpioChip, Level, LineGroup, PwmChip};

/// One observable hardware side effect
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Write {
    Line { offset: u32, level: Level },
    Duty { channel: u8, percent: f32 },
    Frequency(f32),
    Sleep,
}

#[derive(Debug, Default)]
struct State {
    writes: Vec<Write>,
    requests: Vec<Vec<u32>>,
    claimed: HashSet<u32>,
    unavailable: HashSet<u32>,
    gpio_open: usize,
    chip_open: usize,
    fail_writes: bool,
    fail_init: bool,
    fail_frequency: bool,
    write_delay: Option<Duration>,
}

/// Shared handle onto the simulated hardware
#[derive(Debug, Clone, Default)]
pub struct MockHardware {
    state: Arc<Mutex<State>>,
}

impl MockHardware {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Open a mock GPIO chip
    pub fn gpio(&self) -> MockGpio {
        self.lock().gpio_open += 1;
        MockGpio { hw: self.clone() }
    }

    /// Open a mock PWM driver chip
    pub fn pwm_chip(&self) -> MockChip {
        self.lock().chip_open += 1;
        MockChip { hw: self.clone() }
    }

    /// Every write so far, in the order hardware saw them
    pub fn writes(&self) -> Vec<Write> {
        self.lock().writes.clone()
    }

    pub fn clear_writes(&self) {
        self.lock().writes.clear();
    }

    /// Offsets of every line request made, including failed ones
    pub fn requests(&self) -> Vec<Vec<u32>> {
        self.lock().requests.clone()
    }

    /// Lines currently held, sorted
    pub fn claimed(&self) -> Vec<u32> {
        let mut lines: Vec<u32> = self.lock().claimed.iter().copied().collect();
        lines.sort_unstable();
        lines
    }

    pub fn gpio_open(&self) -> bool {
        self.lock().gpio_open > 0
    }

    pub fn chip_open(&self) -> bool {
        self.lock().chip_open > 0
    }

    /// Last level written to a line
    pub fn line_level(&self, offset: u32) -> Option<Level> {
        self.lock().writes.iter().rev().find_map(|w| match *w {
            Write::Line { offset: o, level } if o == offset => Some(level),
            _ => None,
        })
    }

    /// Last duty written to a channel
    pub fn duty(&self, channel: u8) -> Option<f32> {
        self.lock().writes.iter().rev().find_map(|w| match *w {
            Write::Duty { channel: c, percent } if c == channel => Some(percent),
            _ => None,
        })
    }

    /// Make requests for `offset` fail as if another consumer held it
    pub fn set_unavailable(&self, offset: u32) {
        self.lock().unavailable.insert(offset);
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.lock().fail_writes = fail;
    }

    pub fn set_fail_init(&self, fail: bool) {
        self.lock().fail_init = fail;
    }

    pub fn set_fail_frequency(&self, fail: bool) {
        self.lock().fail_frequency = fail;
    }

    /// Sleep before each write lands, to widen race windows in tests
    pub fn set_write_delay(&self, delay: Duration) {
        self.lock().write_delay = Some(delay);
    }

    fn record(&self, output: String, write: Write) -> Result<(), HardwareError> {
        let delay = {
            let state = self.lock();
            if state.fail_writes {
                return Err(HardwareError::Write {
                    output,
                    reason: "simulated bus failure".to_string(),
                });
            }
            state.write_delay
        };
        if let Some(delay) = delay {
            std::thread::sleep(delay);
        }
        debug!("Mock write to {}: {:?}", output, write);
        self.lock().writes.push(write);
        Ok(())
    }
}

/// Mock GPIO chip handing out [`MockLines`]
#[derive(Debug)]
pub struct MockGpio {
    hw: MockHardware,
}

impl GpioChip for MockGpio {
    type Lines = MockLines;

    fn request_lines(&mut self, offsets: &[u32]) -> Result<MockLines, HardwareError> {
        let mut state = self.hw.lock();
        state.requests.push(offsets.to_vec());

        let mut seen = HashSet::new();
        for &line in offsets {
            let reason = if state.unavailable.contains(&line) {
                "line unavailable"
            } else if state.claimed.contains(&line) || !seen.insert(line) {
                "line already claimed"
            } else {
                continue;
            };
            return Err(HardwareError::LineRequest {
                line,
                reason: reason.to_string(),
            });
        }

        state.claimed.extend(offsets.iter().copied());
        debug!("Mock lines {:?} claimed", offsets);
        Ok(MockLines {
            hw: self.hw.clone(),
            offsets: offsets.to_vec(),
        })
    }
}

impl Drop for MockGpio {
    fn drop(&mut self) {
        self.hw.lock().gpio_open -= 1;
    }
}

/// Claimed group of mock lines, released on drop
#[derive(Debug)]
pub struct MockLines {
    hw: MockHardware,
    offsets: Vec<u32>,
}

impl LineGroup for MockLines {
    fn set(&mut self, offset: u32, level: Level) -> Result<(), HardwareError> {
        let output = format!("line {}", offset);
        if !self.offsets.contains(&offset) {
            return Err(HardwareError::Write {
                output,
                reason: "line not part of this request".to_string(),
            });
        }
        self.hw.record(output, Write::Line { offset, level })
    }
}

impl Drop for MockLines {
    fn drop(&mut self) {
        let mut state = self.hw.lock();
        for offset in &self.offsets {
            state.claimed.remove(offset);
        }
        debug!("Mock lines {:?} released", self.offsets);
    }
}

/// Mock PWM driver chip
#[derive(Debug)]
pub struct MockChip {
    hw: MockHardware,
}

impl PwmChip for MockChip {
    fn initialize(&mut self) -> Result<(), HardwareError> {
        if self.hw.lock().fail_init {
            return Err(HardwareError::ChipNotInitialized {
                reason: "simulated missing chip".to_string(),
            });
        }
        Ok(())
    }

    fn set_pwm_frequency(&mut self, hz: f32) -> Result<(), HardwareError> {
        if self.hw.lock().fail_frequency {
            return Err(HardwareError::Frequency {
                hz,
                reason: "simulated prescale write failure".to_string(),
            });
        }
        self.hw.record("prescale".to_string(), Write::Frequency(hz))
    }

    fn set_duty(&mut self, channel: u8, percent: f32) -> Result<(), HardwareError> {
        let output = format!("channel {}", channel);
        if channel >= PCA9685_CHANNELS || !(0.0..=100.0).contains(&percent) {
            return Err(HardwareError::Write {
                output,
                reason: format!("invalid duty {}", percent),
            });
        }
        self.hw.record(output, Write::Duty { channel, percent })
    }

    fn sleep(&mut self) -> Result<(), HardwareError> {
        self.hw.record("mode".to_string(), Write::Sleep)
    }
}

impl Drop for MockChip {
    fn drop(&mut self) {
        self.hw.lock().chip_open -= 1;
    }
}
