//! Low-level PCA9685 driver.
//!
//! Implements the register sequences the motor shield needs from its PWM
//! chip: reset, carrier frequency programming (which requires a trip
//! through sleep mode) and per-channel on/off counter writes.
//!
//! Consumers normally go through [`MotorShield`](crate::MotorShield), which
//! wraps this driver in a [`PwmPort`](crate::PwmPort).

use embassy_time::Delay;
use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;

use crate::port::PwmDevice;
use crate::registers::{
    prescale_for, LED0_ON_L, MODE1, MODE1_AI, MODE1_ALLCALL, MODE1_RESTART, MODE1_SLEEP,
    OSCILLATOR_SETTLE_US, PRE_SCALE,
};

/// Blocking PCA9685 driver.
///
/// Owns an I2C peripheral and a delay provider. The delay is only used
/// while the oscillator restarts after a frequency change.
pub struct Pca9685<I2C, D = Delay> {
    i2c: I2C,
    delay: D,
    address: u8,
}

impl<I2C> Pca9685<I2C, Delay>
where
    I2C: I2c,
{
    /// Create a new driver using the Embassy time driver for delays.
    ///
    /// # Arguments
    /// * `i2c`: I2C peripheral (takes ownership for exclusive access)
    /// * `address`: 7-bit I2C device address (the shield defaults to 0x60)
    pub fn new(i2c: I2C, address: u8) -> Self {
        Self::with_delay(i2c, address, Delay)
    }
}

impl<I2C, D> Pca9685<I2C, D>
where
    I2C: I2c,
    D: DelayNs,
{
    /// Create a new driver with an explicit delay provider.
    pub fn with_delay(i2c: I2C, address: u8, delay: D) -> Self {
        Self {
            i2c,
            delay,
            address,
        }
    }

    /// The 7-bit I2C address this driver talks to.
    pub fn address(&self) -> u8 {
        self.address
    }

    /// Give back the I2C peripheral and the delay provider.
    pub fn release(self) -> (I2C, D) {
        (self.i2c, self.delay)
    }

    fn write_register(&mut self, register: u8, value: u8) -> Result<(), I2C::Error> {
        self.i2c.write(self.address, &[register, value])
    }

    fn read_register(&mut self, register: u8) -> Result<u8, I2C::Error> {
        let mut buf = [0u8; 1];
        self.i2c.write_read(self.address, &[register], &mut buf)?;
        Ok(buf[0])
    }
}

impl<I2C, D> PwmDevice for Pca9685<I2C, D>
where
    I2C: I2c,
    D: DelayNs,
{
    type Error = I2C::Error;

    fn reset(&mut self) -> Result<(), Self::Error> {
        self.write_register(MODE1, 0x00)
    }

    /// PRE_SCALE can only be written while the oscillator is asleep, so
    /// the chip is put to sleep, reprogrammed, woken, and restarted once
    /// the oscillator has settled.
    fn set_pwm_frequency(&mut self, frequency_hz: u16) -> Result<(), Self::Error> {
        let prescale = prescale_for(frequency_hz);

        #[cfg(feature = "defmt")]
        defmt::debug!("PCA9685 {=u8:#x}: {} Hz -> prescale {}", self.address, frequency_hz, prescale);

        let old_mode = self.read_register(MODE1)?;
        let sleep_mode = (old_mode & !MODE1_RESTART) | MODE1_SLEEP;

        self.write_register(MODE1, sleep_mode)?;
        self.write_register(PRE_SCALE, prescale)?;
        self.write_register(MODE1, old_mode)?;

        self.delay.delay_us(OSCILLATOR_SETTLE_US);

        self.write_register(MODE1, old_mode | MODE1_RESTART | MODE1_AI | MODE1_ALLCALL)
    }

    fn set_pwm(&mut self, channel: u8, on: u16, off: u16) -> Result<(), Self::Error> {
        debug_assert!(channel < crate::registers::CHANNEL_COUNT);

        // Relies on MODE1_AI, set by `set_pwm_frequency`.
        let register = LED0_ON_L.wrapping_add(channel.wrapping_mul(4));
        let [on_l, on_h] = on.to_le_bytes();
        let [off_l, off_h] = off.to_le_bytes();

        self.i2c
            .write(self.address, &[register, on_l, on_h, off_l, off_h])
    }
}
