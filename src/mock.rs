//! Recording test doubles for the PWM device, the I2C bus and delays.

use std::vec::Vec;

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::{self, ErrorKind, ErrorType, I2c, Operation, SevenBitAddress};

use crate::port::PwmDevice;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MockError;

impl i2c::Error for MockError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PwmCall {
    Reset,
    Frequency(u16),
    Pwm { channel: u8, on: u16, off: u16 },
}

/// Fake [`PwmDevice`] that logs every call. Optionally starts failing after
/// a number of successful calls.
#[derive(Debug, Default)]
pub struct RecordingPwm {
    pub calls: Vec<PwmCall>,
    fail_after: Option<usize>,
}

impl RecordingPwm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_after(successes: usize) -> Self {
        Self {
            calls: Vec::new(),
            fail_after: Some(successes),
        }
    }

    /// Only the channel writes, as `(channel, on, off)`.
    pub fn pwm_writes(&self) -> Vec<(u8, u16, u16)> {
        self.calls
            .iter()
            .filter_map(|call| match *call {
                PwmCall::Pwm { channel, on, off } => Some((channel, on, off)),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&mut self) {
        self.calls.clear();
    }

    fn record(&mut self, call: PwmCall) -> Result<(), MockError> {
        if let Some(limit) = self.fail_after {
            if self.calls.len() >= limit {
                return Err(MockError);
            }
        }
        self.calls.push(call);
        Ok(())
    }
}

impl PwmDevice for RecordingPwm {
    type Error = MockError;

    fn reset(&mut self) -> Result<(), Self::Error> {
        self.record(PwmCall::Reset)
    }

    fn set_pwm_frequency(&mut self, frequency_hz: u16) -> Result<(), Self::Error> {
        self.record(PwmCall::Frequency(frequency_hz))
    }

    fn set_pwm(&mut self, channel: u8, on: u16, off: u16) -> Result<(), Self::Error> {
        self.record(PwmCall::Pwm { channel, on, off })
    }
}

/// Fake I2C bus backed by a 256-byte register file with auto-increment.
/// Every write is logged as `(address, bytes)`.
pub struct FakeI2c {
    pub registers: [u8; 256],
    pub writes: Vec<(u8, Vec<u8>)>,
    pointer: u8,
}

impl FakeI2c {
    pub fn new() -> Self {
        Self {
            registers: [0; 256],
            writes: Vec::new(),
            pointer: 0,
        }
    }
}

impl ErrorType for FakeI2c {
    type Error = MockError;
}

impl I2c<SevenBitAddress> for FakeI2c {
    fn transaction(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        for op in operations {
            match op {
                Operation::Write(bytes) => {
                    self.writes.push((address, bytes.to_vec()));
                    if let Some((&register, data)) = bytes.split_first() {
                        self.pointer = register;
                        for &byte in data {
                            self.registers[self.pointer as usize] = byte;
                            self.pointer = self.pointer.wrapping_add(1);
                        }
                    }
                }
                Operation::Read(buffer) => {
                    for byte in buffer.iter_mut() {
                        *byte = self.registers[self.pointer as usize];
                        self.pointer = self.pointer.wrapping_add(1);
                    }
                }
            }
        }
        Ok(())
    }
}

/// Delay that returns immediately and remembers how long it was asked to wait.
#[derive(Debug, Default)]
pub struct NoDelay {
    pub total_ns: u64,
}

impl DelayNs for NoDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.total_ns += u64::from(ns);
    }
}
