//! Error types for the motor shield driver.

use core::fmt;

/// Errors that can occur when driving the motor shield.
///
/// Generic over the PWM device's own error type, which for the PCA9685 is
/// the underlying I2C bus error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShieldError<E> {
    /// Underlying PWM device (bus) error.
    Pwm(E),

    /// PWM channel out of valid range (must be 0-15).
    InvalidChannel,

    /// PWM carrier frequency of 0 Hz.
    InvalidFrequency,
}

// Allow ergonomic `?` propagation from raw device errors.
impl<E> From<E> for ShieldError<E> {
    fn from(error: E) -> Self {
        ShieldError::Pwm(error)
    }
}

impl<E: fmt::Debug> fmt::Display for ShieldError<E> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ShieldError::Pwm(e) => write!(f, "PWM device error: {:?}", e),
            ShieldError::InvalidChannel => write!(f, "Invalid PWM channel (must be 0-15)"),
            ShieldError::InvalidFrequency => write!(f, "Invalid PWM frequency (must be non-zero)"),
        }
    }
}

#[cfg(feature = "defmt")]
impl<E: defmt::Format> defmt::Format for ShieldError<E> {
    fn format(&self, f: defmt::Formatter) {
        match self {
            ShieldError::Pwm(e) => defmt::write!(f, "PWM device error: {}", e),
            ShieldError::InvalidChannel => defmt::write!(f, "Invalid PWM channel"),
            ShieldError::InvalidFrequency => defmt::write!(f, "Invalid PWM frequency"),
        }
    }
}
