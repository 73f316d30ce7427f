//! PWM output port.
//!
//! [`PwmDevice`] is the capability the rest of the crate needs from the PWM
//! chip: 16 channels, each programmable with an (on-time, off-time) pair of
//! 12-bit counter values, plus reset and carrier frequency control.
//! [`PwmPort`] turns that into the two operations the motor code uses:
//! a proportional duty write and a binary rail write.

use crate::error::ShieldError;
use crate::registers::{CHANNEL_COUNT, FULL_ON, MAX_DUTY};

/// A PWM output device with 16 independently addressable channels.
///
/// Implemented by [`Pca9685`](crate::Pca9685); tests substitute a recording
/// fake.
pub trait PwmDevice {
    /// Bus-level error reported by the device.
    type Error;

    /// Return the device to its power-on mode.
    fn reset(&mut self) -> Result<(), Self::Error>;

    /// Program the PWM carrier frequency.
    fn set_pwm_frequency(&mut self, frequency_hz: u16) -> Result<(), Self::Error>;

    /// Write the raw on/off counter values of one channel.
    ///
    /// An `on` value of [`FULL_ON`] latches the channel permanently high.
    fn set_pwm(&mut self, channel: u8, on: u16, off: u16) -> Result<(), Self::Error>;
}

/// Channel-level access to a [`PwmDevice`].
///
/// # Precondition
///
/// [`init()`](Self::init) must be called once before [`set_duty()`](Self::set_duty)
/// or [`set_rail()`](Self::set_rail). This is not checked.
pub struct PwmPort<D> {
    device: D,
}

impl<D> PwmPort<D>
where
    D: PwmDevice,
{
    /// Wrap a PWM device. No bus traffic is generated.
    pub fn new(device: D) -> Self {
        Self { device }
    }

    /// Reset the device, program the carrier frequency and zero all 16
    /// channels.
    ///
    /// # Errors
    /// * [`ShieldError::InvalidFrequency`] if `frequency_hz` is 0
    /// * [`ShieldError::Pwm`] on communication failure
    pub fn init(&mut self, frequency_hz: u16) -> Result<(), ShieldError<D::Error>> {
        if frequency_hz == 0 {
            return Err(ShieldError::InvalidFrequency);
        }

        self.device.reset()?;
        self.device.set_pwm_frequency(frequency_hz)?;
        for channel in 0..CHANNEL_COUNT {
            self.device.set_pwm(channel, 0, 0)?;
        }

        #[cfg(feature = "defmt")]
        defmt::info!("PWM port initialised at {} Hz", frequency_hz);

        Ok(())
    }

    /// Set a channel to a proportional duty value.
    ///
    /// Values above [`MAX_DUTY`] are not clamped: they write
    /// `(FULL_ON, 0)`, latching the channel fully on. This is the shield's
    /// hardware convention and callers rely on it.
    ///
    /// # Errors
    /// * [`ShieldError::InvalidChannel`] if `channel >= 16`
    /// * [`ShieldError::Pwm`] on communication failure
    pub fn set_duty(&mut self, channel: u8, value: u16) -> Result<(), ShieldError<D::Error>> {
        check_channel::<D::Error>(channel)?;

        if value > MAX_DUTY {
            #[cfg(feature = "defmt")]
            defmt::trace!("duty {} on channel {} saturates to full on", value, channel);
            self.device.set_pwm(channel, FULL_ON, 0)?;
        } else {
            self.device.set_pwm(channel, 0, value)?;
        }
        Ok(())
    }

    /// Drive a channel fully high or fully low.
    ///
    /// # Errors
    /// * [`ShieldError::InvalidChannel`] if `channel >= 16`
    /// * [`ShieldError::Pwm`] on communication failure
    pub fn set_rail(&mut self, channel: u8, high: bool) -> Result<(), ShieldError<D::Error>> {
        check_channel::<D::Error>(channel)?;

        if high {
            self.device.set_pwm(channel, FULL_ON, 0)?;
        } else {
            self.device.set_pwm(channel, 0, 0)?;
        }
        Ok(())
    }

    /// Borrow the wrapped device.
    pub fn device(&self) -> &D {
        &self.device
    }

    /// Mutably borrow the wrapped device.
    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }

    /// Give back the wrapped device.
    pub fn into_inner(self) -> D {
        self.device
    }
}

fn check_channel<E>(channel: u8) -> Result<(), ShieldError<E>> {
    if channel >= CHANNEL_COUNT {
        return Err(ShieldError::InvalidChannel);
    }
    Ok(())
}
