//! Blocking driver for the SkyPointer motor shield.
//!
//! The shield carries a PCA9685 16-channel PWM chip on I2C and two dual
//! H-bridges, one per stepper motor, plus a laser output. This crate turns
//! "move motor 1 one microstep forward" into the coil currents and bridge
//! inputs that make a two-phase stepper turn smoothly.
//!
//! # Architecture
//!
//! - **`driver`**: [`Pca9685`], register-level chip access over any
//!   `embedded-hal` blocking I2C bus.
//! - **`port`**: [`PwmDevice`] (what the motor code needs from a PWM chip)
//!   and [`PwmPort`] (duty and rail writes with the shield's saturation
//!   rule).
//! - **`curve`**: sine-weighted excitation tables and the per-phase
//!   [`Excitation`] computation.
//! - **`stepper`**: per-slot [`MicroStepper`] state and the [`Stepper`]
//!   handle that advances it.
//! - **[`MotorShield`]**: owns the port and both slots.
//!
//! # Quick start
//!
//! ```no_run
//! use skypointer_motorshield::{Direction, MotorShield, DEFAULT_ADDRESS, DEFAULT_FREQUENCY_HZ};
//!
//! # fn example(i2c: impl embedded_hal::i2c::I2c) {
//! let mut shield = MotorShield::new(i2c, DEFAULT_ADDRESS);
//! shield.init(DEFAULT_FREQUENCY_HZ).unwrap();
//!
//! let mut elevation = shield.claim_slot(200, 2).unwrap();
//! elevation.advance(800, Direction::Backward).unwrap();
//! elevation.release().unwrap();
//! # }
//! ```
//!
//! All operations are synchronous bus transactions. The shield is meant to
//! be driven from a single execution context; nothing here guards against
//! concurrent use from an interrupt handler.
//!
//! # Features
//!
//! - **`defmt`**: structured logging and [`defmt::Format`] implementations
//!   for embedded targets.
//! - **`laser-active-low`**: laser on channel 14, lit by driving it low
//!   (default: channel 15, lit by driving it high).

#![cfg_attr(not(test), no_std)]

pub use curve::{Excitation, MicrostepCurve, MicrostepResolution};
pub use driver::Pca9685;
pub use error::ShieldError;
pub use pins::{StepperPins, LASER_PIN, MOTOR_COUNT, MOTOR_PINS};
pub use port::{PwmDevice, PwmPort};
pub use registers::{CHANNEL_COUNT, DEFAULT_ADDRESS, DEFAULT_FREQUENCY_HZ, FULL_ON, MAX_DUTY};
pub use shield::MotorShield;
pub use stepper::{Direction, MicroStepper, Stepper};

pub mod curve;
mod driver;
mod error;
pub mod pins;
mod port;
mod registers;
mod shield;
mod stepper;

#[cfg(test)]
mod mock;
